#![cfg_attr(docsrs, feature(doc_cfg))]
//! # sliding-mesh
//!
//! sliding-mesh is the sliding-interface correspondence layer for parallel finite-element solvers with a rotating mesh zone. Every time step it locates, for each quadrature point on the stationary side of a non-conforming interface, the matching point on the rotated side, and serves the opposite side's solution and mesh-motion state to residual and tangent assembly.
//!
//! ## Features
//! - Rank-replicated interface state gathered by a dense collective sum
//! - Per-quadrature-point correspondence cache with warm-started three-bin search
//! - Motion-epoch tracking so stale correspondences are never read
//! - Pluggable communication backends (serial, in-process threads, MPI)
//! - JSON partition artifacts and configuration through serde
//!
//! ## Usage
//! Add `sliding-mesh` as a dependency in your `Cargo.toml` and enable features as needed:
//!
//! ```toml
//! [dependencies]
//! sliding-mesh = "0.3"
//! # Optional features:
//! # features = ["mpi-support"]
//! ```
//!
//! A time-stepping loop drives one [`driver::SlidingInterface`] per run:
//! `advance` once per step before the nonlinear loop, `update_solution` once
//! per nonlinear iteration, and `evaluate_opposite` from the assembler. Every
//! refresh is collective and must be issued by all ranks in the same order.
//!
//! ## Errors
//!
//! All operations return [`mesh_error::SlidingMeshError`]. None of them is
//! recoverable; [`driver::SlidingInterface::abort_on_error`] logs the
//! diagnostic and aborts every rank.

pub mod algs;
pub mod config;
pub mod data;
pub mod discretization;
pub mod driver;
pub mod geometry;
pub mod io;
pub mod mesh_error;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::assembly::{
        InterfacePoint, OppositeEvaluator, OppositeState, for_each_interface_point,
        integrate_opposite,
    };
    pub use crate::algs::communicator::{Communicator, NoComm, RayonComm};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::search::{SearchAttempt, SearchHit, search_opposite_point};
    pub use crate::config::{RotationConfig, SlidingConfig};
    pub use crate::data::correspondence::{Correspondence, CorrespondenceCache, RefreshStats};
    pub use crate::data::field::{DistributedField, FieldKind, LocalField};
    pub use crate::data::interface_state::InterfaceStateCache;
    pub use crate::discretization::{ElementKind, FaceKind, QuadratureRule};
    pub use crate::driver::SlidingInterface;
    pub use crate::geometry::projection::{ClosestPointProjector, SurfaceProjector};
    pub use crate::geometry::{FacePatch, Point3};
    pub use crate::io::{InterfacePartition, read_partition, write_partition};
    pub use crate::mesh_error::SlidingMeshError;
    pub use crate::topology::{
        FixedElement, InterfaceData, InterfaceNodeSet, InterfaceNodes, InterfaceTopology,
        LocalInterface, NodeSide, RotatedElement,
    };
}
