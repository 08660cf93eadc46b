//! Per-rank sliding-interface partition artifacts.
//!
//! Each rank reads one JSON file holding its interface topology and the
//! ownership of every interface node. The files are produced by the
//! partitioner (or by [`write_partition`] in tests) and never change during a
//! run.

use crate::algs::communicator::Communicator;
use crate::mesh_error::SlidingMeshError;
use crate::topology::{InterfaceNodes, LocalInterface};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const PARTITION_FORMAT_VERSION: u32 = 1;

/// Sliding-interface data of one partition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterfacePartition {
    /// Format version.
    pub version: u32,
    /// Rank this piece belongs to.
    pub rank: usize,
    /// Number of ranks the run was partitioned for.
    pub size: usize,
    /// Solution values per node.
    pub dof_sol: usize,
    pub topology: LocalInterface,
    /// Fixed and rotated node ownership, one entry per interface.
    pub nodes: Vec<InterfaceNodes>,
}

impl InterfacePartition {
    pub fn new(
        rank: usize,
        size: usize,
        dof_sol: usize,
        topology: LocalInterface,
        nodes: Vec<InterfaceNodes>,
    ) -> Self {
        Self {
            version: PARTITION_FORMAT_VERSION,
            rank,
            size,
            dof_sol,
            topology,
            nodes,
        }
    }

    /// Structural checks: version, rank range, node lists and connectivity.
    pub fn validate(&self) -> Result<(), SlidingMeshError> {
        if self.version != PARTITION_FORMAT_VERSION {
            return Err(SlidingMeshError::MalformedPartition(format!(
                "unsupported partition format version {} (expected {})",
                self.version, PARTITION_FORMAT_VERSION
            )));
        }
        if self.rank >= self.size {
            return Err(SlidingMeshError::MalformedPartition(format!(
                "rank {} outside partition of size {}",
                self.rank, self.size
            )));
        }
        if self.dof_sol == 0 {
            return Err(SlidingMeshError::MalformedPartition(
                "dof_sol must be positive".into(),
            ));
        }
        for (itf, n) in self.nodes.iter().enumerate() {
            n.validate(itf, self.size)?;
        }
        self.topology.validate(&self.nodes)
    }
}

/// Path of the artifact for `rank`: `<dir>/<prefix>_p<rank:05>.json`.
pub fn partition_path(dir: impl AsRef<Path>, prefix: &str, rank: usize) -> PathBuf {
    dir.as_ref().join(format!("{prefix}_p{rank:05}.json"))
}

/// Write `part` to its per-rank path, creating `dir` if needed.
pub fn write_partition(
    dir: impl AsRef<Path>,
    prefix: &str,
    part: &InterfacePartition,
) -> Result<PathBuf, SlidingMeshError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = partition_path(dir, prefix, part.rank);
    let bytes = serde_json::to_vec_pretty(part)?;
    fs::write(&path, bytes)?;
    Ok(path)
}

/// Read and validate the artifact for `rank`.
pub fn read_partition(
    dir: impl AsRef<Path>,
    prefix: &str,
    rank: usize,
) -> Result<InterfacePartition, SlidingMeshError> {
    let path = partition_path(dir, prefix, rank);
    let bytes = fs::read(&path)
        .map_err(|e| SlidingMeshError::Io(format!("{}: {e}", path.display())))?;
    let part: InterfacePartition = serde_json::from_slice(&bytes)?;
    if part.rank != rank {
        return Err(SlidingMeshError::MalformedPartition(format!(
            "{} holds rank {}, expected {rank}",
            path.display(),
            part.rank
        )));
    }
    part.validate()?;
    log::debug!(
        "loaded {} with {} interfaces",
        path.display(),
        part.nodes.len()
    );
    Ok(part)
}

/// Read this rank's artifact and check it was partitioned for `comm`.
pub fn read_partition_for<C: Communicator>(
    dir: impl AsRef<Path>,
    prefix: &str,
    comm: &C,
) -> Result<InterfacePartition, SlidingMeshError> {
    let part = read_partition(dir, prefix, comm.rank())?;
    if part.size != comm.size() {
        return Err(SlidingMeshError::MalformedPartition(format!(
            "partitioned for {} ranks, running on {}",
            part.size,
            comm.size()
        )));
    }
    Ok(part)
}
