//! Ownership metadata for interface nodes.
//!
//! Every node adjacent to a sliding interface is owned by exactly one rank and
//! sits at a fixed position in that rank's local field arrays. The mapping is
//! built at partition time and is immutable for the run.

use super::NodeSide;
use crate::mesh_error::SlidingMeshError;
use serde::{Deserialize, Serialize};

/// One interface node as seen from any rank.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct InterfaceNodeRecord {
    /// Slot of the node in the interface node list.
    pub slot: usize,
    /// Global node number.
    pub global: usize,
    /// Owning rank.
    pub owner: usize,
    /// Position of the node in the owner's local arrays.
    pub local_pos: usize,
}

/// The nodes of one side of one interface.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceNodeSet {
    /// Global node numbers.
    pub node_map: Vec<usize>,
    /// Owning rank of each node.
    pub part_tag: Vec<usize>,
    /// Local position of each node on its owning rank.
    pub loc_pos: Vec<usize>,
}

impl InterfaceNodeSet {
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    /// Check that the three per-node lists agree and owners fit in `size` ranks.
    pub fn validate(
        &self,
        interface: usize,
        side: NodeSide,
        size: usize,
    ) -> Result<(), SlidingMeshError> {
        let expected = self.node_map.len();
        for (what, found) in [
            ("part_tag", self.part_tag.len()),
            ("loc_pos", self.loc_pos.len()),
        ] {
            if found != expected {
                return Err(SlidingMeshError::NodeCountMismatch {
                    interface,
                    side,
                    what,
                    expected,
                    found,
                });
            }
        }
        if let Some((node, &owner)) = self
            .part_tag
            .iter()
            .enumerate()
            .find(|&(_, &owner)| owner >= size)
        {
            return Err(SlidingMeshError::OwnerOutOfRange {
                interface,
                side,
                node,
                owner,
                size,
            });
        }
        Ok(())
    }

    /// Iterate over every node record.
    pub fn records(&self) -> impl Iterator<Item = InterfaceNodeRecord> + '_ {
        self.node_map
            .iter()
            .zip(&self.part_tag)
            .zip(&self.loc_pos)
            .enumerate()
            .map(|(slot, ((&global, &owner), &local_pos))| InterfaceNodeRecord {
                slot,
                global,
                owner,
                local_pos,
            })
    }

    /// Iterate over the nodes owned by `rank`.
    pub fn owned_by(&self, rank: usize) -> impl Iterator<Item = InterfaceNodeRecord> + '_ {
        self.records().filter(move |r| r.owner == rank)
    }
}

/// Fixed and rotated node sets of one interface.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceNodes {
    pub fixed: InterfaceNodeSet,
    pub rotated: InterfaceNodeSet,
}

impl InterfaceNodes {
    pub fn side(&self, side: NodeSide) -> &InterfaceNodeSet {
        match side {
            NodeSide::Fixed => &self.fixed,
            NodeSide::Rotated => &self.rotated,
        }
    }

    pub fn validate(&self, interface: usize, size: usize) -> Result<(), SlidingMeshError> {
        self.fixed.validate(interface, NodeSide::Fixed, size)?;
        self.rotated.validate(interface, NodeSide::Rotated, size)
    }
}
