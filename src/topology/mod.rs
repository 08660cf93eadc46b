//! Static description of the sliding interfaces on one partition.
//!
//! The topology is produced by preprocessing and never changes during a run:
//! which fixed-side elements carry interface quadrature, which rotated-side
//! elements sit in each angular tag bin, their reference control points and
//! their connectivity into the interface node lists.

pub mod interface;
pub mod ownership;

pub use interface::{FixedElement, InterfaceData, LocalInterface, RotatedElement};
pub use ownership::{InterfaceNodeRecord, InterfaceNodeSet, InterfaceNodes};

use crate::discretization::ElementKind;
use serde::{Deserialize, Serialize};

/// Which side of a sliding interface a node set belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeSide {
    /// Stationary zone.
    Fixed,
    /// Rotating zone.
    Rotated,
}

/// Read-only accessors over the interface topology of one partition.
///
/// Indices passed in must be in range; implementations may panic otherwise.
/// Range checks on user-supplied indices happen in the caches.
pub trait InterfaceTopology {
    /// Element type of every interface element.
    fn element_kind(&self) -> ElementKind;

    fn num_interfaces(&self) -> usize;

    /// Number of angular tag bins of interface `itf`.
    fn num_tags(&self, itf: usize) -> usize;

    /// Fixed-side elements of interface `itf`, in partition-local order.
    fn fixed_elements(&self, itf: usize) -> &[FixedElement];

    /// Rotated-side elements in tag bin `tag` of interface `itf`.
    fn rotated_elements(&self, itf: usize, tag: usize) -> &[RotatedElement];

    /// Tag bin boundaries in radians, `num_tags + 1` ascending values.
    fn tag_bounds(&self, itf: usize) -> Vec<f64>;
}
