//! Interface state cache: a complete, rank-replicated copy of the nodal state
//! needed to evaluate the opposite side of every sliding interface.
//!
//! Interface nodes are owned by arbitrary ranks. A refresh zeroes a dense
//! per-interface buffer, lets each rank write the nodes it owns, and sums the
//! buffer over all ranks. Each slot has exactly one nonzero contribution, so the
//! reduced buffer is exact and bit-identical on every rank.
//!
//! Refreshes are collective: every rank must call them in the same order with
//! the same field kinds, or the run deadlocks.

use crate::algs::communicator::Communicator;
use crate::data::field::{DistributedField, FieldKind};
use crate::geometry::Point3;
use crate::mesh_error::SlidingMeshError;
use crate::topology::{InterfaceNodes, NodeSide, RotatedElement};
use std::collections::BTreeMap;

/// Gathered nodal values for every interface, side and field kind.
#[derive(Clone, Debug)]
pub struct InterfaceStateCache {
    dof_sol: usize,
    nodes: Vec<InterfaceNodes>,
    buffers: Vec<BTreeMap<(NodeSide, FieldKind), Vec<f64>>>,
    motion_epoch: u64,
}

impl InterfaceStateCache {
    /// Build an empty (all-zero) cache from the partition's node ownership.
    ///
    /// `dof_sol` is the number of solution values per node.
    pub fn new<C: Communicator>(
        nodes: Vec<InterfaceNodes>,
        dof_sol: usize,
        comm: &C,
    ) -> Result<Self, SlidingMeshError> {
        if dof_sol == 0 {
            return Err(SlidingMeshError::MalformedPartition(
                "solution must carry at least one dof per node".into(),
            ));
        }
        for (itf, n) in nodes.iter().enumerate() {
            n.validate(itf, comm.size())?;
        }
        let buffers = nodes
            .iter()
            .map(|n| {
                let mut per_itf = BTreeMap::new();
                for side in [NodeSide::Fixed, NodeSide::Rotated] {
                    for kind in FieldKind::ALL {
                        let len = field_dof(kind, dof_sol) * n.side(side).len();
                        per_itf.insert((side, kind), vec![0.0; len]);
                    }
                }
                per_itf
            })
            .collect();
        Ok(Self {
            dof_sol,
            nodes,
            buffers,
            motion_epoch: 0,
        })
    }

    pub fn num_interfaces(&self) -> usize {
        self.nodes.len()
    }

    pub fn dof_sol(&self) -> usize {
        self.dof_sol
    }

    /// Values per node for `kind`.
    pub fn field_dof(&self, kind: FieldKind) -> usize {
        field_dof(kind, self.dof_sol)
    }

    /// Counter advanced by every rotated-side displacement refresh.
    pub fn motion_epoch(&self) -> u64 {
        self.motion_epoch
    }

    pub fn nodes(&self, itf: usize) -> Result<&InterfaceNodes, SlidingMeshError> {
        self.nodes.get(itf).ok_or(SlidingMeshError::InterfaceOutOfRange {
            interface: itf,
            count: self.nodes.len(),
        })
    }

    /// Gather `field` for the `side` node set of every interface.
    pub fn refresh<C, F>(
        &mut self,
        comm: &C,
        kind: FieldKind,
        field: &F,
        side: NodeSide,
    ) -> Result<(), SlidingMeshError>
    where
        C: Communicator,
        F: DistributedField + ?Sized,
    {
        let dof = self.field_dof(kind);
        if field.dof_per_node() != dof {
            return Err(SlidingMeshError::FieldDofMismatch {
                field: kind,
                expected: dof,
                found: field.dof_per_node(),
            });
        }
        let local = field.local_array();
        let n_local = local.len() / dof;
        let rank = comm.rank();

        // Validate every owned slot before entering any collective.
        for (itf, n) in self.nodes.iter().enumerate() {
            if let Some(bad) = n.side(side).owned_by(rank).find(|r| r.local_pos >= n_local) {
                return Err(SlidingMeshError::LocalPositionOutOfRange {
                    interface: itf,
                    side,
                    node: bad.slot,
                    position: bad.local_pos,
                    len: n_local,
                });
            }
        }

        // Bumped up front: a collective failing midway leaves the rotated
        // geometry partly updated, and correspondences must not survive that.
        if side == NodeSide::Rotated && kind == FieldKind::MeshDisplacement {
            self.motion_epoch += 1;
        }

        for (itf, n) in self.nodes.iter().enumerate() {
            let len = dof * n.side(side).len();
            let buf = self.buffers[itf]
                .entry((side, kind))
                .or_insert_with(|| vec![0.0; len]);
            buf.fill(0.0);
            for rec in n.side(side).owned_by(rank) {
                let src = &local[dof * rec.local_pos..dof * (rec.local_pos + 1)];
                buf[dof * rec.slot..dof * (rec.slot + 1)].copy_from_slice(src);
            }
            comm.allreduce_sum(buf)?;
        }

        log::debug!(
            "rank {rank}: refreshed {kind:?} on {side:?} side of {} interfaces",
            self.nodes.len()
        );
        Ok(())
    }

    /// Solution on both sides.
    pub fn update_solution<C, F>(&mut self, comm: &C, solution: &F) -> Result<(), SlidingMeshError>
    where
        C: Communicator,
        F: DistributedField + ?Sized,
    {
        self.refresh(comm, FieldKind::Solution, solution, NodeSide::Fixed)?;
        self.refresh(comm, FieldKind::Solution, solution, NodeSide::Rotated)
    }

    /// Mesh velocity on the rotated side.
    pub fn update_mesh_velocity<C, F>(&mut self, comm: &C, mvelo: &F) -> Result<(), SlidingMeshError>
    where
        C: Communicator,
        F: DistributedField + ?Sized,
    {
        self.refresh(comm, FieldKind::MeshVelocity, mvelo, NodeSide::Rotated)
    }

    /// Mesh displacement on the rotated side; invalidates correspondences.
    pub fn update_mesh_displacement<C, F>(
        &mut self,
        comm: &C,
        mdisp: &F,
    ) -> Result<(), SlidingMeshError>
    where
        C: Communicator,
        F: DistributedField + ?Sized,
    {
        self.refresh(comm, FieldKind::MeshDisplacement, mdisp, NodeSide::Rotated)
    }

    /// Gathered values of one field on one side, node-major over interface slots.
    pub fn node_values(
        &self,
        itf: usize,
        side: NodeSide,
        kind: FieldKind,
    ) -> Result<&[f64], SlidingMeshError> {
        self.nodes(itf)?;
        Ok(&self.buffers[itf][&(side, kind)])
    }

    /// Element-local gather: values of the nodes `ien`, node-major.
    pub fn element_values(
        &self,
        itf: usize,
        side: NodeSide,
        kind: FieldKind,
        ien: &[usize],
    ) -> Result<Vec<f64>, SlidingMeshError> {
        let values = self.node_values(itf, side, kind)?;
        let dof = self.field_dof(kind);
        let count = values.len() / dof;
        let mut out = Vec::with_capacity(dof * ien.len());
        for &node in ien {
            if node >= count {
                return Err(SlidingMeshError::ConnectivityOutOfRange {
                    interface: itf,
                    side,
                    node,
                    count,
                });
            }
            out.extend_from_slice(&values[dof * node..dof * (node + 1)]);
        }
        Ok(out)
    }

    /// Current control points of a rotated element: reference plus displacement.
    pub fn current_rotated_ctrl_pts(
        &self,
        itf: usize,
        element: &RotatedElement,
    ) -> Result<Vec<Point3>, SlidingMeshError> {
        let disp = self.element_values(
            itf,
            NodeSide::Rotated,
            FieldKind::MeshDisplacement,
            &element.ien,
        )?;
        Ok(element
            .ctrl_pts
            .iter()
            .zip(disp.chunks_exact(3))
            .map(|(x, u)| [x[0] + u[0], x[1] + u[1], x[2] + u[2]])
            .collect())
    }
}

fn field_dof(kind: FieldKind, dof_sol: usize) -> usize {
    match kind {
        FieldKind::Solution => dof_sol,
        FieldKind::MeshVelocity | FieldKind::MeshDisplacement => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::NoComm;
    use crate::data::field::LocalField;
    use crate::topology::InterfaceNodeSet;

    fn nodes() -> Vec<InterfaceNodes> {
        vec![InterfaceNodes {
            fixed: InterfaceNodeSet {
                node_map: vec![7, 8],
                part_tag: vec![0, 0],
                loc_pos: vec![1, 0],
            },
            rotated: InterfaceNodeSet {
                node_map: vec![20, 21, 22],
                part_tag: vec![0, 0, 0],
                loc_pos: vec![2, 3, 0],
            },
        }]
    }

    #[test]
    fn solution_is_gathered_into_interface_slots() {
        let comm = NoComm;
        let mut cache = InterfaceStateCache::new(nodes(), 2, &comm).unwrap();
        let sol = LocalField::new(2, vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5]).unwrap();
        cache.update_solution(&comm, &sol).unwrap();
        assert_eq!(
            cache.node_values(0, NodeSide::Fixed, FieldKind::Solution).unwrap(),
            &[1.0, 1.5, 0.0, 0.5]
        );
        assert_eq!(
            cache.node_values(0, NodeSide::Rotated, FieldKind::Solution).unwrap(),
            &[2.0, 2.5, 3.0, 3.5, 0.0, 0.5]
        );
        assert_eq!(
            cache
                .element_values(0, NodeSide::Rotated, FieldKind::Solution, &[2, 0])
                .unwrap(),
            vec![0.0, 0.5, 2.0, 2.5]
        );
        assert_eq!(cache.motion_epoch(), 0);
    }

    // Single-rank communicator whose second reduction fails.
    struct FlakyComm(std::cell::Cell<usize>);

    impl Communicator for FlakyComm {
        fn rank(&self) -> usize {
            0
        }

        fn size(&self) -> usize {
            1
        }

        fn allreduce_sum(&self, buf: &mut [f64]) -> Result<(), SlidingMeshError> {
            let calls = self.0.get() + 1;
            self.0.set(calls);
            if calls == 2 {
                return Err(SlidingMeshError::CollectiveLengthMismatch {
                    peer: 0,
                    expected: buf.len(),
                    found: 0,
                });
            }
            Ok(())
        }
    }

    #[test]
    fn failed_displacement_refresh_still_advances_the_epoch() {
        let comm = FlakyComm(std::cell::Cell::new(0));
        let two = [nodes(), nodes()].concat();
        let mut cache = InterfaceStateCache::new(two, 1, &comm).unwrap();
        let disp = LocalField::zeros(3, 4);
        assert!(matches!(
            cache.update_mesh_displacement(&comm, &disp),
            Err(SlidingMeshError::CollectiveLengthMismatch { .. })
        ));
        assert_eq!(cache.motion_epoch(), 1);
    }

    #[test]
    fn displacement_moves_control_points_and_bumps_epoch() {
        let comm = NoComm;
        let mut cache = InterfaceStateCache::new(nodes(), 1, &comm).unwrap();
        let mut disp = LocalField::zeros(3, 4);
        disp.node_mut(2).copy_from_slice(&[1.0, 0.0, 0.0]);
        disp.node_mut(0).copy_from_slice(&[0.0, 0.0, -1.0]);
        cache.update_mesh_displacement(&comm, &disp).unwrap();
        assert_eq!(cache.motion_epoch(), 1);

        let elem = RotatedElement {
            ctrl_pts: vec![[0.0; 3], [1.0; 3], [2.0; 3]],
            face: 0,
            ien: vec![0, 1, 2],
        };
        let cur = cache.current_rotated_ctrl_pts(0, &elem).unwrap();
        assert_eq!(cur, vec![[1.0, 0.0, 0.0], [1.0; 3], [2.0, 2.0, 1.0]]);
    }

    #[test]
    fn wrong_dof_and_short_local_array_fail() {
        let comm = NoComm;
        let mut cache = InterfaceStateCache::new(nodes(), 1, &comm).unwrap();
        let bad = LocalField::zeros(2, 4);
        assert!(matches!(
            cache.update_mesh_velocity(&comm, &bad).unwrap_err(),
            SlidingMeshError::FieldDofMismatch { expected: 3, found: 2, .. }
        ));
        let short = LocalField::zeros(3, 3);
        assert!(matches!(
            cache.update_mesh_velocity(&comm, &short).unwrap_err(),
            SlidingMeshError::LocalPositionOutOfRange { position: 3, len: 3, .. }
        ));
    }

    #[test]
    fn unknown_interface_is_out_of_range() {
        let cache = InterfaceStateCache::new(nodes(), 1, &NoComm).unwrap();
        assert!(matches!(
            cache.node_values(1, NodeSide::Fixed, FieldKind::Solution),
            Err(SlidingMeshError::InterfaceOutOfRange { interface: 1, count: 1 })
        ));
    }
}
