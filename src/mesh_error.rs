//! SlidingMeshError: Unified error type for sliding-mesh public APIs
//!
//! Every failure in this crate is fatal for the run: there is no retry path and
//! no degraded mode. Errors are raised where they are detected and carry the
//! interface / element / quadrature indices needed for the diagnostic.

use crate::topology::NodeSide;
use crate::data::field::FieldKind;
use thiserror::Error;

/// Unified error type for sliding-mesh operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SlidingMeshError {
    /// The 3-bin search found no rotated-side element containing the point.
    #[error(
        "cannot find opposite point: interface {interface}, fixed element {element}, \
         quadrature point {quad} (searched tags {tried:?})"
    )]
    NoOppositePoint {
        interface: usize,
        element: usize,
        quad: usize,
        tried: Vec<usize>,
    },
    /// Interface index outside `0..count`.
    #[error("interface {interface} out of range (partition has {count})")]
    InterfaceOutOfRange { interface: usize, count: usize },
    /// Fixed-side element index outside the interface's element list.
    #[error("fixed element {element} out of range on interface {interface} ({count} elements)")]
    FixedElementOutOfRange {
        interface: usize,
        element: usize,
        count: usize,
    },
    /// Angular tag outside `0..num_tag`.
    #[error("tag {tag} out of range on interface {interface} ({num_tag} tags)")]
    TagOutOfRange {
        interface: usize,
        tag: usize,
        num_tag: usize,
    },
    /// Rotated element index outside the tag bin.
    #[error(
        "rotated element {element} out of range in tag {tag} of interface {interface} ({count} elements)"
    )]
    RotatedElementOutOfRange {
        interface: usize,
        tag: usize,
        element: usize,
        count: usize,
    },
    /// Quadrature index outside the per-face rule.
    #[error(
        "correspondence index out of range: interface {interface}, fixed element {element}, quadrature point {quad}"
    )]
    CorrespondenceIndexOutOfRange {
        interface: usize,
        element: usize,
        quad: usize,
    },
    /// Cache read before any refresh wrote the slot.
    #[error(
        "correspondence read before refresh: interface {interface}, fixed element {element}, quadrature point {quad}"
    )]
    CorrespondenceUnset {
        interface: usize,
        element: usize,
        quad: usize,
    },
    /// Opposite-side evaluation requested before any complete refresh.
    #[error("correspondences have not been refreshed since construction or a failed refresh")]
    CorrespondenceNotRefreshed,
    /// Correspondences were computed against an older rotated geometry.
    #[error("stale correspondences: computed for motion epoch {computed}, current epoch is {current}")]
    StaleCorrespondence { computed: u64, current: u64 },
    /// Node list lengths in the partition artifact disagree.
    #[error(
        "{side:?} node count mismatch on interface {interface}: {what} has {found} entries, expected {expected}"
    )]
    NodeCountMismatch {
        interface: usize,
        side: NodeSide,
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// Interface node owned by a rank the communicator does not have.
    #[error("{side:?} node {node} on interface {interface} owned by rank {owner}, but only {size} ranks exist")]
    OwnerOutOfRange {
        interface: usize,
        side: NodeSide,
        node: usize,
        owner: usize,
        size: usize,
    },
    /// Local slot of an owned node lies outside the local field array.
    #[error(
        "{side:?} node {node} on interface {interface} has local position {position}, local array holds {len} nodes"
    )]
    LocalPositionOutOfRange {
        interface: usize,
        side: NodeSide,
        node: usize,
        position: usize,
        len: usize,
    },
    /// Element connectivity points outside the interface node list.
    #[error("element connectivity of interface {interface} references {side:?} node {node}, only {count} exist")]
    ConnectivityOutOfRange {
        interface: usize,
        side: NodeSide,
        node: usize,
        count: usize,
    },
    /// Field degrees of freedom disagree with what the cache expects.
    #[error("{field:?} field has {found} dofs per node, expected {expected}")]
    FieldDofMismatch {
        field: FieldKind,
        expected: usize,
        found: usize,
    },
    /// Local field array that does not split into whole nodes.
    #[error("local array of length {len} is not a whole number of {dof}-value nodes")]
    RaggedField { len: usize, dof: usize },
    /// Degenerate or inconsistent element geometry.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// Quadrature rule name not available for the face kind.
    #[error("unsupported quadrature rule '{rule}' for {face} faces")]
    UnsupportedQuadrature { rule: String, face: &'static str },
    /// A rotation step would skip past a whole tag bin.
    #[error(
        "rotation step {step:.6} rad exceeds narrowest tag bin {bin_width:.6} rad on interface {interface}"
    )]
    RotationStepTooLarge {
        interface: usize,
        step: f64,
        bin_width: f64,
    },
    /// Ranks disagree on the length of a collective buffer.
    #[error("collective buffer from rank {peer} has {found} values, expected {expected}")]
    CollectiveLengthMismatch {
        peer: usize,
        expected: usize,
        found: usize,
    },
    /// MPI could not be brought up.
    #[error("communicator initialization failed: {0}")]
    CommInit(String),
    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Partition artifact could not be parsed or is structurally invalid.
    #[error("malformed partition data: {0}")]
    MalformedPartition(String),
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SlidingMeshError {
    fn from(err: std::io::Error) -> Self {
        SlidingMeshError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SlidingMeshError {
    fn from(err: serde_json::Error) -> Self {
        SlidingMeshError::MalformedPartition(err.to_string())
    }
}
