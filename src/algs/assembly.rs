//! Opposite-side evaluation for interface residual and tangent assembly.
//!
//! This module provides helpers to:
//! 1. evaluate the rotated-side state facing a fixed-side quadrature point,
//! 2. walk every fixed-side quadrature point with its surface weight, and
//! 3. integrate a pointwise quantity over the interface across all ranks.
//!
//! Evaluation only reads the two caches; it can be repeated any number of
//! times within one assembly pass.

use crate::algs::communicator::Communicator;
use crate::data::correspondence::{Correspondence, CorrespondenceCache};
use crate::data::field::FieldKind;
use crate::data::interface_state::InterfaceStateCache;
use crate::discretization::{ElementKind, QuadratureRule};
use crate::geometry::{FacePatch, Point3};
use crate::mesh_error::SlidingMeshError;
use crate::topology::{InterfaceTopology, NodeSide};

/// Rotated-side state at the match of one fixed-side quadrature point.
#[derive(Clone, Debug, PartialEq)]
pub struct OppositeState {
    pub correspondence: Correspondence,
    /// Current physical position of the match.
    pub point: Point3,
    /// Unit normal of the rotated face at the match.
    pub normal: Point3,
    /// Interpolated solution, `dof_sol` values.
    pub solution: Vec<f64>,
    pub mesh_velocity: Point3,
    pub mesh_displacement: Point3,
}

/// Read-only view over topology and both caches.
///
/// Construction fails if the correspondences are stale, so every evaluation
/// through a live evaluator sees records that match the rotated geometry.
pub struct OppositeEvaluator<'a, T: InterfaceTopology + ?Sized> {
    topology: &'a T,
    state: &'a InterfaceStateCache,
    cache: &'a CorrespondenceCache,
}

impl<'a, T: InterfaceTopology + ?Sized> OppositeEvaluator<'a, T> {
    pub fn new(
        topology: &'a T,
        state: &'a InterfaceStateCache,
        cache: &'a CorrespondenceCache,
    ) -> Result<Self, SlidingMeshError> {
        cache.ensure_current(state)?;
        Ok(Self {
            topology,
            state,
            cache,
        })
    }

    pub fn topology(&self) -> &'a T {
        self.topology
    }

    pub fn state(&self) -> &'a InterfaceStateCache {
        self.state
    }

    pub fn cache(&self) -> &'a CorrespondenceCache {
        self.cache
    }

    /// State on the rotated side facing quadrature point `quad` of fixed element `element`.
    pub fn evaluate_opposite(
        &self,
        itf: usize,
        element: usize,
        quad: usize,
    ) -> Result<OppositeState, SlidingMeshError> {
        let c = self.cache.get(itf, element, quad)?;
        let num_tag = self.topology.num_tags(itf);
        if c.tag >= num_tag {
            return Err(SlidingMeshError::TagOutOfRange {
                interface: itf,
                tag: c.tag,
                num_tag,
            });
        }
        let bin = self.topology.rotated_elements(itf, c.tag);
        let elem = bin
            .get(c.element)
            .ok_or(SlidingMeshError::RotatedElementOutOfRange {
                interface: itf,
                tag: c.tag,
                element: c.element,
                count: bin.len(),
            })?;

        let kind = self.topology.element_kind();
        let ctrl = self.state.current_rotated_ctrl_pts(itf, elem)?;
        let face = FacePatch::from_element(kind, elem.face, &ctrl)?;
        let (normal, _) = face.normal_at(c.xi, c.eta)?;
        let face_ien = face_slots(itf, NodeSide::Rotated, kind, elem.face, &elem.ien)?;
        let shape = kind.face_kind().shape(c.xi, c.eta).values;

        let solution = interpolate(
            &self
                .state
                .element_values(itf, NodeSide::Rotated, FieldKind::Solution, &face_ien)?,
            &shape,
            self.state.dof_sol(),
        );
        let mvelo = interpolate(
            &self
                .state
                .element_values(itf, NodeSide::Rotated, FieldKind::MeshVelocity, &face_ien)?,
            &shape,
            3,
        );
        let mdisp = interpolate(
            &self.state.element_values(
                itf,
                NodeSide::Rotated,
                FieldKind::MeshDisplacement,
                &face_ien,
            )?,
            &shape,
            3,
        );

        Ok(OppositeState {
            correspondence: c,
            point: face.point_at(c.xi, c.eta),
            normal,
            solution,
            mesh_velocity: [mvelo[0], mvelo[1], mvelo[2]],
            mesh_displacement: [mdisp[0], mdisp[1], mdisp[2]],
        })
    }

    /// Gathered fixed-side solution of `element`, node-major over its face nodes.
    pub fn fixed_element_values(
        &self,
        itf: usize,
        element: usize,
    ) -> Result<Vec<f64>, SlidingMeshError> {
        let fixed = self.topology.fixed_elements(itf);
        let elem = fixed
            .get(element)
            .ok_or(SlidingMeshError::FixedElementOutOfRange {
                interface: itf,
                element,
                count: fixed.len(),
            })?;
        let kind = self.topology.element_kind();
        let face_ien = face_slots(itf, NodeSide::Fixed, kind, elem.face, &elem.ien)?;
        self.state
            .element_values(itf, NodeSide::Fixed, FieldKind::Solution, &face_ien)
    }
}

/// One fixed-side quadrature point with everything an interface term needs.
#[derive(Clone, Debug, PartialEq)]
pub struct InterfacePoint {
    pub interface: usize,
    pub fixed_element: usize,
    pub quad: usize,
    /// Physical position on the fixed face.
    pub point: Point3,
    /// Unit normal of the fixed face.
    pub normal: Point3,
    /// Quadrature weight times surface Jacobian.
    pub weight: f64,
    pub fixed_solution: Vec<f64>,
    pub opposite: OppositeState,
}

/// Visit every fixed-side quadrature point owned by this partition.
pub fn for_each_interface_point<T, F>(
    evaluator: &OppositeEvaluator<'_, T>,
    rule: &QuadratureRule,
    mut f: F,
) -> Result<(), SlidingMeshError>
where
    T: InterfaceTopology + ?Sized,
    F: FnMut(&InterfacePoint) -> Result<(), SlidingMeshError>,
{
    let topology = evaluator.topology();
    let kind = topology.element_kind();
    let dof = evaluator.state().dof_sol();
    for itf in 0..topology.num_interfaces() {
        for (ee, elem) in topology.fixed_elements(itf).iter().enumerate() {
            let face = FacePatch::from_element(kind, elem.face, &elem.ctrl_pts)?;
            let fixed_values = evaluator.fixed_element_values(itf, ee)?;
            for (qq, (&[xi, eta], &w)) in rule.points.iter().zip(&rule.weights).enumerate() {
                let (normal, jac) = face.normal_at(xi, eta)?;
                let shape = kind.face_kind().shape(xi, eta).values;
                let ip = InterfacePoint {
                    interface: itf,
                    fixed_element: ee,
                    quad: qq,
                    point: face.point_at(xi, eta),
                    normal,
                    weight: w * jac,
                    fixed_solution: interpolate(&fixed_values, &shape, dof),
                    opposite: evaluator.evaluate_opposite(itf, ee, qq)?,
                };
                f(&ip)?;
            }
        }
    }
    Ok(())
}

/// Integrate `f` over every interface and sum the result across ranks.
///
/// Collective: every rank must call it.
pub fn integrate_opposite<T, C, F>(
    evaluator: &OppositeEvaluator<'_, T>,
    rule: &QuadratureRule,
    comm: &C,
    mut f: F,
) -> Result<f64, SlidingMeshError>
where
    T: InterfaceTopology + ?Sized,
    C: Communicator,
    F: FnMut(&InterfacePoint) -> f64,
{
    let mut local = 0.0;
    for_each_interface_point(evaluator, rule, |ip| {
        local += ip.weight * f(ip);
        Ok(())
    })?;
    let mut total = [local];
    comm.allreduce_sum(&mut total)?;
    Ok(total[0])
}

// Interface node slots of the face nodes, in face order.
fn face_slots(
    itf: usize,
    side: NodeSide,
    kind: ElementKind,
    face: usize,
    ien: &[usize],
) -> Result<Vec<usize>, SlidingMeshError> {
    kind.face_nodes(face)?
        .iter()
        .map(|&n| {
            ien.get(n).copied().ok_or(SlidingMeshError::ConnectivityOutOfRange {
                interface: itf,
                side,
                node: n,
                count: ien.len(),
            })
        })
        .collect()
}

fn interpolate(values: &[f64], shape: &[f64], dof: usize) -> Vec<f64> {
    let mut out = vec![0.0; dof];
    for (nodal, &n) in values.chunks_exact(dof).zip(shape) {
        for (o, v) in out.iter_mut().zip(nodal) {
            *o += n * v;
        }
    }
    out
}
