//! Per-run owner of the sliding-interface caches.
//!
//! [`SlidingInterface`] holds the topology, both caches, the projector, the face
//! quadrature and the communicator for one run, and sequences the refresh
//! protocol every rank must follow:
//!
//! 1. once per time step, before the nonlinear loop: [`SlidingInterface::advance`]
//!    (mesh displacement, mesh velocity, solution, then correspondences);
//! 2. once per nonlinear iteration: [`SlidingInterface::update_solution`];
//! 3. during assembly: [`SlidingInterface::evaluate_opposite`] or
//!    [`SlidingInterface::evaluator`], any number of times.

use crate::algs::assembly::{OppositeEvaluator, OppositeState};
use crate::algs::communicator::Communicator;
use crate::config::{RotationConfig, SlidingConfig};
use crate::data::correspondence::{CorrespondenceCache, RefreshStats};
use crate::data::field::DistributedField;
use crate::data::interface_state::InterfaceStateCache;
use crate::discretization::QuadratureRule;
use crate::geometry::projection::{ClosestPointProjector, SurfaceProjector};
use crate::io::read_partition_for;
use crate::mesh_error::SlidingMeshError;
use crate::topology::{InterfaceNodes, InterfaceTopology, LocalInterface};

pub struct SlidingInterface<C, P = ClosestPointProjector, T = LocalInterface>
where
    C: Communicator,
    P: SurfaceProjector,
    T: InterfaceTopology,
{
    comm: C,
    topology: T,
    projector: P,
    rule: QuadratureRule,
    state: InterfaceStateCache,
    correspondence: CorrespondenceCache,
}

impl<C: Communicator> SlidingInterface<C> {
    /// Load this rank's partition artifact as described by `config`.
    pub fn open(config: &SlidingConfig, comm: C) -> Result<Self, SlidingMeshError> {
        config.validate()?;
        let part = read_partition_for(&config.partition_dir, &config.partition_prefix, &comm)?;
        let rule =
            QuadratureRule::from_name(&config.face_quadrature, part.topology.element.face_kind())?;
        let this = Self::from_parts(
            comm,
            part.topology,
            part.nodes,
            part.dof_sol,
            config.projection.clone(),
            rule,
        )?;
        if let Some(rot) = &config.rotation {
            rot.validate_against(&this.topology)?;
        }
        log::info!(
            "rank {}/{}: opened {} sliding interfaces ({:?}, {} points per face)",
            this.comm.rank(),
            this.comm.size(),
            this.topology.num_interfaces(),
            this.topology.element,
            this.rule.len()
        );
        Ok(this)
    }
}

impl<C, P, T> SlidingInterface<C, P, T>
where
    C: Communicator,
    P: SurfaceProjector,
    T: InterfaceTopology,
{
    /// Assemble from already-loaded pieces.
    pub fn from_parts(
        comm: C,
        topology: T,
        nodes: Vec<InterfaceNodes>,
        dof_sol: usize,
        projector: P,
        rule: QuadratureRule,
    ) -> Result<Self, SlidingMeshError> {
        if nodes.len() != topology.num_interfaces() {
            return Err(SlidingMeshError::MalformedPartition(format!(
                "{} interfaces in topology but {} node descriptions",
                topology.num_interfaces(),
                nodes.len()
            )));
        }
        let face = topology.element_kind().face_kind();
        if rule.face != face {
            return Err(SlidingMeshError::UnsupportedQuadrature {
                rule: rule.name.clone(),
                face: face.name(),
            });
        }
        let state = InterfaceStateCache::new(nodes, dof_sol, &comm)?;
        let correspondence = CorrespondenceCache::new(&topology, rule.len());
        Ok(Self {
            comm,
            topology,
            projector,
            rule,
            state,
            correspondence,
        })
    }

    /// Check a prescribed rotation against the tag bins of this partition.
    pub fn with_rotation(self, rotation: &RotationConfig) -> Result<Self, SlidingMeshError> {
        rotation.validate_against(&self.topology)?;
        Ok(self)
    }

    /// Per-step refresh: motion, velocity and solution, then correspondences.
    ///
    /// Collective.
    ///
    /// # Errors
    ///
    /// Tag bins do not wrap around. The search from bin 0 never looks in the
    /// last bin and vice versa, so a fixed quadrature point whose match crosses
    /// the seam between the last bin and bin 0 fails with
    /// [`SlidingMeshError::NoOppositePoint`]. A fixed-element boundary on the
    /// seam keeps the reference position valid, but a rotor turning
    /// continuously still carries the last bin past the seam within one
    /// revolution. Treat the error as fatal (see [`Self::abort_on_error`]).
    pub fn advance<S, V, D>(
        &mut self,
        solution: &S,
        mesh_velocity: &V,
        mesh_displacement: &D,
    ) -> Result<RefreshStats, SlidingMeshError>
    where
        S: DistributedField + ?Sized,
        V: DistributedField + ?Sized,
        D: DistributedField + ?Sized,
    {
        self.state
            .update_mesh_displacement(&self.comm, mesh_displacement)?;
        self.state.update_mesh_velocity(&self.comm, mesh_velocity)?;
        self.state.update_solution(&self.comm, solution)?;
        self.refresh_correspondence()
    }

    /// Solution-only refresh for nonlinear iterations; correspondences stay valid.
    ///
    /// Collective.
    pub fn update_solution<S>(&mut self, solution: &S) -> Result<(), SlidingMeshError>
    where
        S: DistributedField + ?Sized,
    {
        self.state.update_solution(&self.comm, solution)
    }

    /// Re-search every fixed-side quadrature point against the current geometry.
    pub fn refresh_correspondence(&mut self) -> Result<RefreshStats, SlidingMeshError> {
        self.correspondence
            .refresh_all(&self.topology, &self.state, &self.projector, &self.rule)
    }

    /// Read-only evaluator for an assembly pass.
    pub fn evaluator(&self) -> Result<OppositeEvaluator<'_, T>, SlidingMeshError> {
        OppositeEvaluator::new(&self.topology, &self.state, &self.correspondence)
    }

    pub fn evaluate_opposite(
        &self,
        itf: usize,
        element: usize,
        quad: usize,
    ) -> Result<OppositeState, SlidingMeshError> {
        self.evaluator()?.evaluate_opposite(itf, element, quad)
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    pub fn topology(&self) -> &T {
        &self.topology
    }

    pub fn projector(&self) -> &P {
        &self.projector
    }

    pub fn quadrature(&self) -> &QuadratureRule {
        &self.rule
    }

    pub fn state(&self) -> &InterfaceStateCache {
        &self.state
    }

    /// Direct access for solvers that refresh individual fields themselves.
    pub fn state_mut(&mut self) -> &mut InterfaceStateCache {
        &mut self.state
    }

    pub fn correspondence(&self) -> &CorrespondenceCache {
        &self.correspondence
    }

    /// Unwrap `result`, or log the diagnostic and abort every rank.
    pub fn abort_on_error<R>(&self, result: Result<R, SlidingMeshError>) -> R {
        match result {
            Ok(v) => v,
            Err(e) => {
                log::error!("rank {}: fatal sliding-interface error: {e}", self.comm.rank());
                self.comm.abort(1)
            }
        }
    }
}
