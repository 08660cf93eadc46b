//! Thin façade over collective reduction for serial, intra-process (threads)
//! or inter-process (MPI) execution.
//!
//! The interface state cache only needs one collective: a blocking sum over a
//! fixed-size `f64` buffer that leaves every rank with the identical result.
//! Every rank must issue the same sequence of collectives with the same buffer
//! lengths; nothing here can detect a rank that skips a call.

use crate::mesh_error::SlidingMeshError;
use bytes::Bytes;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};

/// Collective communication interface.
pub trait Communicator {
    /// Rank of the calling process.
    fn rank(&self) -> usize;

    /// Number of ranks taking part in collectives.
    fn size(&self) -> usize;

    /// Sum `buf` element-wise across all ranks, in place.
    ///
    /// Blocks until every rank has contributed.
    fn allreduce_sum(&self, buf: &mut [f64]) -> Result<(), SlidingMeshError>;

    /// Terminate every rank. Used for fatal interface errors.
    fn abort(&self, code: i32) -> ! {
        std::process::exit(code)
    }
}

/// Single-process communicator: reductions are the identity.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn allreduce_sum(&self, _buf: &mut [f64]) -> Result<(), SlidingMeshError> {
        Ok(())
    }
}

// --- RayonComm: intra-process / multi-thread ---
type Key = (u64, usize, usize, u64); // (world, src, dst, seq)

static MAILBOX: Lazy<DashMap<Key, Bytes>> = Lazy::new(DashMap::new);
static NEXT_WORLD: AtomicU64 = AtomicU64::new(1);

/// Several ranks living in one process, one thread per rank.
///
/// Ranks built with [`RayonComm::new`] share world `0`; [`RayonComm::world`]
/// hands out a private world so concurrent tests cannot see each other's
/// messages.
#[derive(Debug)]
pub struct RayonComm {
    world: u64,
    rank: usize,
    size: usize,
    seq: AtomicU64,
}

impl RayonComm {
    pub fn new(rank: usize, size: usize) -> Result<Self, SlidingMeshError> {
        if rank >= size {
            return Err(SlidingMeshError::CommInit(format!(
                "rank {rank} outside world of size {size}"
            )));
        }
        Ok(Self::in_world(0, rank, size))
    }

    /// Build all `size` ranks of a fresh, isolated world.
    pub fn world(size: usize) -> Vec<Self> {
        let world = NEXT_WORLD.fetch_add(1, Relaxed);
        (0..size).map(|rank| Self::in_world(world, rank, size)).collect()
    }

    fn in_world(world: u64, rank: usize, size: usize) -> Self {
        Self {
            world,
            rank,
            size,
            seq: AtomicU64::new(0),
        }
    }

    fn recv_blocking(&self, src: usize, seq: u64) -> Bytes {
        let key = (self.world, src, self.rank, seq);
        loop {
            if let Some((_, bytes)) = MAILBOX.remove(&key) {
                return bytes;
            }
            std::thread::yield_now();
        }
    }
}

impl Communicator for RayonComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn allreduce_sum(&self, buf: &mut [f64]) -> Result<(), SlidingMeshError> {
        let seq = self.seq.fetch_add(1, Relaxed);
        let payload = Bytes::copy_from_slice(bytemuck::cast_slice(&buf[..]));
        for peer in (0..self.size).filter(|&p| p != self.rank) {
            MAILBOX.insert((self.world, self.rank, peer, seq), payload.clone());
        }

        // Every rank adds the contributions in rank order, so all ranks end
        // with bit-identical sums.
        let local = buf.to_vec();
        buf.iter_mut().for_each(|v| *v = 0.0);
        for src in 0..self.size {
            if src == self.rank {
                for (acc, v) in buf.iter_mut().zip(&local) {
                    *acc += v;
                }
                continue;
            }
            let bytes = self.recv_blocking(src, seq);
            let remote: Vec<f64> = bytemuck::pod_collect_to_vec(&bytes[..]);
            if remote.len() != local.len() {
                return Err(SlidingMeshError::CollectiveLengthMismatch {
                    peer: src,
                    expected: local.len(),
                    found: remote.len(),
                });
            }
            for (acc, v) in buf.iter_mut().zip(&remote) {
                *acc += v;
            }
        }
        Ok(())
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::Communicator;
    use crate::mesh_error::SlidingMeshError;
    use mpi::collective::{CommunicatorCollectives, SystemOperation};
    use mpi::environment::Universe;
    use mpi::topology::Communicator as MpiCommunicator;
    use mpi::topology::SimpleCommunicator;

    /// World communicator; finalizes MPI when dropped.
    pub struct MpiComm {
        pub world: SimpleCommunicator,
        rank: usize,
        size: usize,
        _universe: Universe,
    }

    impl MpiComm {
        pub fn new() -> Result<Self, SlidingMeshError> {
            let universe = mpi::initialize()
                .ok_or_else(|| SlidingMeshError::CommInit("MPI already initialized".into()))?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Ok(Self {
                world,
                rank,
                size,
                _universe: universe,
            })
        }
    }

    impl Communicator for MpiComm {
        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn allreduce_sum(&self, buf: &mut [f64]) -> Result<(), SlidingMeshError> {
            let send = buf.to_vec();
            self.world
                .all_reduce_into(&send[..], &mut *buf, SystemOperation::sum());
            Ok(())
        }

        fn abort(&self, code: i32) -> ! {
            self.world.abort(code)
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
