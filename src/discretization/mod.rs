//! Reference elements, faces and quadrature used on the sliding surface.

pub mod runtime;

pub use runtime::{ElementKind, FaceKind, FaceShape, QuadratureRule};
