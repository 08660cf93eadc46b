//! In-memory interface topology loaded from the partition artifact.

use super::{InterfaceNodes, InterfaceTopology, NodeSide};
use crate::discretization::ElementKind;
use crate::geometry::Point3;
use crate::mesh_error::SlidingMeshError;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// A fixed-side element carrying interface quadrature on one face.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixedElement {
    /// Reference control points (the fixed zone does not move).
    pub ctrl_pts: Vec<Point3>,
    /// Local face id lying on the interface.
    pub face: usize,
    /// Tag bin facing this element at the reference position.
    pub tag: usize,
    /// Element nodes as slots in the interface's fixed node set.
    pub ien: Vec<usize>,
}

/// A rotated-side element in one tag bin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotatedElement {
    /// Reference control points; current positions add the mesh displacement.
    pub ctrl_pts: Vec<Point3>,
    /// Local face id lying on the interface.
    pub face: usize,
    /// Element nodes as slots in the interface's rotated node set.
    pub ien: Vec<usize>,
}

/// One sliding interface on this partition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceData {
    pub fixed_elements: Vec<FixedElement>,
    /// Rotated elements grouped by tag bin; the outer length is the tag count.
    pub rotated_elements: Vec<Vec<RotatedElement>>,
    /// Optional bin boundaries in radians; uniform over a full turn when absent.
    #[serde(default)]
    pub tag_angles: Option<Vec<f64>>,
}

impl InterfaceData {
    pub fn num_tags(&self) -> usize {
        self.rotated_elements.len()
    }
}

/// Interface topology of one partition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalInterface {
    pub element: ElementKind,
    pub interfaces: Vec<InterfaceData>,
}

impl LocalInterface {
    pub fn new(element: ElementKind, interfaces: Vec<InterfaceData>) -> Self {
        Self {
            element,
            interfaces,
        }
    }

    /// Structural checks against the element type and the interface node sets.
    pub fn validate(&self, nodes: &[InterfaceNodes]) -> Result<(), SlidingMeshError> {
        if nodes.len() != self.interfaces.len() {
            return Err(SlidingMeshError::MalformedPartition(format!(
                "{} interfaces in topology but {} node descriptions",
                self.interfaces.len(),
                nodes.len()
            )));
        }
        let n_loc = self.element.num_nodes();
        let n_faces = self.element.num_faces();
        for (itf, (data, node_sets)) in self.interfaces.iter().zip(nodes).enumerate() {
            let num_tags = data.num_tags();
            if num_tags == 0 {
                return Err(SlidingMeshError::MalformedPartition(format!(
                    "interface {itf} has no rotated tag bins"
                )));
            }
            if let Some(angles) = &data.tag_angles {
                if angles.len() != num_tags + 1 || angles.windows(2).any(|w| w[1] <= w[0]) {
                    return Err(SlidingMeshError::MalformedPartition(format!(
                        "interface {itf}: tag angles must be {} ascending values",
                        num_tags + 1
                    )));
                }
            }
            for (ee, elem) in data.fixed_elements.iter().enumerate() {
                check_element(itf, ee, &elem.ctrl_pts, elem.face, &elem.ien, n_loc, n_faces)?;
                check_ien(itf, NodeSide::Fixed, &elem.ien, node_sets.fixed.len())?;
                if elem.tag >= num_tags {
                    return Err(SlidingMeshError::TagOutOfRange {
                        interface: itf,
                        tag: elem.tag,
                        num_tag: num_tags,
                    });
                }
            }
            for bin in &data.rotated_elements {
                for (ee, elem) in bin.iter().enumerate() {
                    check_element(itf, ee, &elem.ctrl_pts, elem.face, &elem.ien, n_loc, n_faces)?;
                    check_ien(itf, NodeSide::Rotated, &elem.ien, node_sets.rotated.len())?;
                }
            }
        }
        Ok(())
    }
}

fn check_element(
    itf: usize,
    ee: usize,
    ctrl_pts: &[Point3],
    face: usize,
    ien: &[usize],
    n_loc: usize,
    n_faces: usize,
) -> Result<(), SlidingMeshError> {
    if ctrl_pts.len() != n_loc || ien.len() != n_loc {
        return Err(SlidingMeshError::MalformedPartition(format!(
            "interface {itf}, element {ee}: expected {n_loc} control points and nodes, got {} and {}",
            ctrl_pts.len(),
            ien.len()
        )));
    }
    if face >= n_faces {
        return Err(SlidingMeshError::MalformedPartition(format!(
            "interface {itf}, element {ee}: face id {face} out of range"
        )));
    }
    Ok(())
}

fn check_ien(
    itf: usize,
    side: NodeSide,
    ien: &[usize],
    count: usize,
) -> Result<(), SlidingMeshError> {
    match ien.iter().find(|&&n| n >= count) {
        Some(&node) => Err(SlidingMeshError::ConnectivityOutOfRange {
            interface: itf,
            side,
            node,
            count,
        }),
        None => Ok(()),
    }
}

impl InterfaceTopology for LocalInterface {
    fn element_kind(&self) -> ElementKind {
        self.element
    }

    fn num_interfaces(&self) -> usize {
        self.interfaces.len()
    }

    fn num_tags(&self, itf: usize) -> usize {
        self.interfaces[itf].num_tags()
    }

    fn fixed_elements(&self, itf: usize) -> &[FixedElement] {
        &self.interfaces[itf].fixed_elements
    }

    fn rotated_elements(&self, itf: usize, tag: usize) -> &[RotatedElement] {
        &self.interfaces[itf].rotated_elements[tag]
    }

    fn tag_bounds(&self, itf: usize) -> Vec<f64> {
        let data = &self.interfaces[itf];
        match &data.tag_angles {
            Some(angles) => angles.clone(),
            None => {
                let n = data.num_tags();
                (0..=n).map(|i| TAU * i as f64 / n as f64).collect()
            }
        }
    }
}
