//! Surface geometry on the sliding interface.
//!
//! [`FacePatch`] is the face of one interface element in physical space; the
//! [`projection`] module locates points on such patches.

pub mod projection;

use crate::discretization::{ElementKind, FaceKind};
use crate::mesh_error::SlidingMeshError;
use itertools::izip;

/// Point or vector in physical space.
pub type Point3 = [f64; 3];

#[inline]
pub fn sub(a: &Point3, b: &Point3) -> Point3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn dot(a: &Point3, b: &Point3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn cross(a: &Point3, b: &Point3) -> Point3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn norm(a: &Point3) -> f64 {
    dot(a, a).sqrt()
}

#[inline]
pub fn distance(a: &Point3, b: &Point3) -> f64 {
    norm(&sub(a, b))
}

/// One element face in physical space.
#[derive(Clone, Debug, PartialEq)]
pub struct FacePatch {
    kind: FaceKind,
    nodes: Vec<Point3>,
}

impl FacePatch {
    pub fn new(kind: FaceKind, nodes: Vec<Point3>) -> Result<Self, SlidingMeshError> {
        if nodes.len() != kind.num_nodes() {
            return Err(SlidingMeshError::InvalidGeometry(format!(
                "{} face needs {} nodes, got {}",
                kind.name(),
                kind.num_nodes(),
                nodes.len()
            )));
        }
        Ok(Self { kind, nodes })
    }

    /// Extract face `face` of a volume element from its control points.
    pub fn from_element(
        element: ElementKind,
        face: usize,
        ctrl_pts: &[Point3],
    ) -> Result<Self, SlidingMeshError> {
        if ctrl_pts.len() != element.num_nodes() {
            return Err(SlidingMeshError::InvalidGeometry(format!(
                "{element:?} needs {} control points, got {}",
                element.num_nodes(),
                ctrl_pts.len()
            )));
        }
        let nodes = element
            .face_nodes(face)?
            .iter()
            .map(|&n| ctrl_pts[n])
            .collect();
        Self::new(element.face_kind(), nodes)
    }

    #[inline]
    pub fn kind(&self) -> FaceKind {
        self.kind
    }

    #[inline]
    pub fn nodes(&self) -> &[Point3] {
        &self.nodes
    }

    /// The same face with every node expressed relative to `origin`.
    pub fn relative_to(&self, origin: &Point3) -> FacePatch {
        FacePatch {
            kind: self.kind,
            nodes: self.nodes.iter().map(|n| sub(n, origin)).collect(),
        }
    }

    /// Physical position at parametric `(xi, eta)`.
    pub fn point_at(&self, xi: f64, eta: f64) -> Point3 {
        let shape = self.kind.shape(xi, eta);
        let mut x = [0.0; 3];
        for (node, n) in self.nodes.iter().zip(&shape.values) {
            for d in 0..3 {
                x[d] += n * node[d];
            }
        }
        x
    }

    /// Parametric tangents `(dx/dxi, dx/deta)`.
    pub fn tangents(&self, xi: f64, eta: f64) -> (Point3, Point3) {
        let shape = self.kind.shape(xi, eta);
        let mut t1 = [0.0; 3];
        let mut t2 = [0.0; 3];
        for (node, a, b) in izip!(&self.nodes, &shape.d_xi, &shape.d_eta) {
            for d in 0..3 {
                t1[d] += a * node[d];
                t2[d] += b * node[d];
            }
        }
        (t1, t2)
    }

    /// Unit normal and surface Jacobian `|t1 x t2|` at `(xi, eta)`.
    pub fn normal_at(&self, xi: f64, eta: f64) -> Result<(Point3, f64), SlidingMeshError> {
        let (t1, t2) = self.tangents(xi, eta);
        let n = cross(&t1, &t2);
        let jac = norm(&n);
        if jac <= f64::EPSILON * (dot(&t1, &t1) + dot(&t2, &t2)) {
            return Err(SlidingMeshError::InvalidGeometry(format!(
                "degenerate {} face at ({xi}, {eta})",
                self.kind.name()
            )));
        }
        Ok(([n[0] / jac, n[1] / jac, n[2] / jac], jac))
    }

    /// Largest node-to-node distance.
    pub fn diameter(&self) -> f64 {
        let mut d: f64 = 0.0;
        for (i, a) in self.nodes.iter().enumerate() {
            for b in &self.nodes[i + 1..] {
                d = d.max(distance(a, b));
            }
        }
        d
    }
}
