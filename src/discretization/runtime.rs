//! Element and face descriptions, face shape functions and face quadrature.
//!
//! Interface elements are volume elements touching the sliding surface through
//! exactly one face. Only the face is ever evaluated here: its shape functions
//! place quadrature points on the fixed side and interpolate nodal state on the
//! rotated side.

use crate::mesh_error::SlidingMeshError;
use serde::{Deserialize, Serialize};

/// Volume element types that may touch a sliding interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// Trilinear hexahedron; faces are bilinear quadrilaterals.
    Hex8,
    /// Linear tetrahedron; faces are linear triangles.
    Tet4,
}

// Faces ordered so the reference normal points out of the element.
static HEX8_FACES: [[usize; 4]; 6] = [
    [0, 3, 2, 1],
    [4, 5, 6, 7],
    [0, 1, 5, 4],
    [1, 2, 6, 5],
    [2, 3, 7, 6],
    [3, 0, 4, 7],
];

static TET4_FACES: [[usize; 3]; 4] = [[1, 2, 3], [0, 3, 2], [0, 1, 3], [0, 2, 1]];

impl ElementKind {
    /// Number of control points per element.
    pub fn num_nodes(&self) -> usize {
        match self {
            ElementKind::Hex8 => 8,
            ElementKind::Tet4 => 4,
        }
    }

    pub fn num_faces(&self) -> usize {
        match self {
            ElementKind::Hex8 => HEX8_FACES.len(),
            ElementKind::Tet4 => TET4_FACES.len(),
        }
    }

    /// Shape of every face of this element.
    pub fn face_kind(&self) -> FaceKind {
        match self {
            ElementKind::Hex8 => FaceKind::Quad4,
            ElementKind::Tet4 => FaceKind::Tri3,
        }
    }

    /// Local node numbers of face `face`, in face-local order.
    pub fn face_nodes(&self, face: usize) -> Result<&'static [usize], SlidingMeshError> {
        let nodes: Option<&'static [usize]> = match self {
            ElementKind::Hex8 => HEX8_FACES.get(face).map(|f| &f[..]),
            ElementKind::Tet4 => TET4_FACES.get(face).map(|f| &f[..]),
        };
        nodes.ok_or_else(|| {
            SlidingMeshError::InvalidGeometry(format!(
                "face id {face} out of range for {self:?} ({} faces)",
                self.num_faces()
            ))
        })
    }
}

/// Reference face shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceKind {
    /// Bilinear quadrilateral on `[-1, 1]^2`.
    Quad4,
    /// Linear triangle on `xi, eta >= 0, xi + eta <= 1`.
    Tri3,
}

/// Face shape function values and parametric derivatives at one point.
#[derive(Clone, Debug)]
pub struct FaceShape {
    pub values: Vec<f64>,
    pub d_xi: Vec<f64>,
    pub d_eta: Vec<f64>,
}

impl FaceKind {
    pub fn num_nodes(&self) -> usize {
        match self {
            FaceKind::Quad4 => 4,
            FaceKind::Tri3 => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FaceKind::Quad4 => "quadrilateral",
            FaceKind::Tri3 => "triangle",
        }
    }

    /// Parametric centre, used as the Newton starting guess.
    pub fn centroid(&self) -> [f64; 2] {
        match self {
            FaceKind::Quad4 => [0.0, 0.0],
            FaceKind::Tri3 => [1.0 / 3.0, 1.0 / 3.0],
        }
    }

    /// Whether `(xi, eta)` lies in the reference face, widened by `tol`.
    pub fn contains(&self, xi: f64, eta: f64, tol: f64) -> bool {
        match self {
            FaceKind::Quad4 => xi.abs() <= 1.0 + tol && eta.abs() <= 1.0 + tol,
            FaceKind::Tri3 => xi >= -tol && eta >= -tol && xi + eta <= 1.0 + tol,
        }
    }

    /// Evaluate shape functions and their parametric derivatives.
    pub fn shape(&self, xi: f64, eta: f64) -> FaceShape {
        match self {
            FaceKind::Quad4 => FaceShape {
                values: vec![
                    0.25 * (1.0 - xi) * (1.0 - eta),
                    0.25 * (1.0 + xi) * (1.0 - eta),
                    0.25 * (1.0 + xi) * (1.0 + eta),
                    0.25 * (1.0 - xi) * (1.0 + eta),
                ],
                d_xi: vec![
                    -0.25 * (1.0 - eta),
                    0.25 * (1.0 - eta),
                    0.25 * (1.0 + eta),
                    -0.25 * (1.0 + eta),
                ],
                d_eta: vec![
                    -0.25 * (1.0 - xi),
                    -0.25 * (1.0 + xi),
                    0.25 * (1.0 + xi),
                    0.25 * (1.0 - xi),
                ],
            },
            FaceKind::Tri3 => FaceShape {
                values: vec![1.0 - xi - eta, xi, eta],
                d_xi: vec![-1.0, 1.0, 0.0],
                d_eta: vec![-1.0, 0.0, 1.0],
            },
        }
    }
}

/// Quadrature rule on a reference face.
#[derive(Clone, Debug)]
pub struct QuadratureRule {
    /// Name for diagnostics.
    pub name: String,
    /// Face kind the rule integrates over.
    pub face: FaceKind,
    /// Quadrature points in reference coordinates.
    pub points: Vec<[f64; 2]>,
    /// Quadrature weights.
    pub weights: Vec<f64>,
}

impl QuadratureRule {
    /// Construct a face rule from a label.
    ///
    /// Quadrilaterals accept `gauss1`, `gauss2` and `gauss3` (tensor Gauss-Legendre);
    /// triangles accept `tri1`/`centroid` and `tri3`. The `gaussN` labels on a
    /// triangle map to the closest triangle rule so one label can drive mixed meshes.
    pub fn from_name(name: &str, face: FaceKind) -> Result<Self, SlidingMeshError> {
        let normalized = name.to_lowercase();
        let unsupported = || SlidingMeshError::UnsupportedQuadrature {
            rule: name.to_string(),
            face: face.name(),
        };
        match face {
            FaceKind::Quad4 => {
                let order = match normalized.as_str() {
                    "gauss1" | "midpoint" | "gauss1x1" => 1,
                    "gauss2" | "gauss2x2" => 2,
                    "gauss3" | "gauss3x3" => 3,
                    _ => return Err(unsupported()),
                };
                let line = gauss_legendre_1d(order);
                Ok(tensor_product_quadrature(&line, &format!("gauss{order}x{order}")))
            }
            FaceKind::Tri3 => match normalized.as_str() {
                "tri1" | "centroid" | "gauss1" | "midpoint" => Ok(Self {
                    name: "tri1".to_string(),
                    face,
                    points: vec![[1.0 / 3.0, 1.0 / 3.0]],
                    weights: vec![0.5],
                }),
                "tri3" | "gauss2" | "gauss3" => Ok(Self {
                    name: "tri3".to_string(),
                    face,
                    points: vec![
                        [1.0 / 6.0, 1.0 / 6.0],
                        [2.0 / 3.0, 1.0 / 6.0],
                        [1.0 / 6.0, 2.0 / 3.0],
                    ],
                    weights: vec![1.0 / 6.0; 3],
                }),
                _ => Err(unsupported()),
            },
        }
    }

    /// Number of quadrature points per face.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn gauss_legendre_1d(order: usize) -> Vec<(f64, f64)> {
    match order {
        1 => vec![(0.0, 2.0)],
        2 => {
            let pt = 1.0_f64 / 3.0_f64.sqrt();
            vec![(-pt, 1.0), (pt, 1.0)]
        }
        _ => {
            let pt = (3.0_f64 / 5.0).sqrt();
            vec![(-pt, 5.0 / 9.0), (0.0, 8.0 / 9.0), (pt, 5.0 / 9.0)]
        }
    }
}

fn tensor_product_quadrature(line: &[(f64, f64)], name: &str) -> QuadratureRule {
    let mut points = Vec::with_capacity(line.len() * line.len());
    let mut weights = Vec::with_capacity(line.len() * line.len());
    for &(pb, wb) in line {
        for &(pa, wa) in line {
            points.push([pa, pb]);
            weights.push(wa * wb);
        }
    }
    QuadratureRule {
        name: name.to_string(),
        face: FaceKind::Quad4,
        points,
        weights,
    }
}
