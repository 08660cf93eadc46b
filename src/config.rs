//! Run configuration for the sliding-interface subsystem.

use crate::discretization::{FaceKind, QuadratureRule};
use crate::geometry::projection::ClosestPointProjector;
use crate::mesh_error::SlidingMeshError;
use crate::topology::InterfaceTopology;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlidingConfig {
    /// Directory holding the per-rank partition artifacts.
    pub partition_dir: PathBuf,
    /// File prefix of the artifacts.
    pub partition_prefix: String,
    /// Face quadrature label, see [`QuadratureRule::from_name`].
    pub face_quadrature: String,
    pub projection: ClosestPointProjector,
    /// Prescribed rotation, used to rule out bin skipping before the run.
    pub rotation: Option<RotationConfig>,
}

impl Default for SlidingConfig {
    fn default() -> Self {
        Self {
            partition_dir: PathBuf::from("."),
            partition_prefix: "part".to_string(),
            face_quadrature: "gauss2".to_string(),
            projection: ClosestPointProjector::default(),
            rotation: None,
        }
    }
}

impl SlidingConfig {
    pub fn from_json_str(s: &str) -> Result<Self, SlidingMeshError> {
        let cfg: Self =
            serde_json::from_str(s).map_err(|e| SlidingMeshError::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SlidingMeshError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SlidingMeshError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Range checks that do not need the mesh.
    pub fn validate(&self) -> Result<(), SlidingMeshError> {
        if self.partition_prefix.is_empty() {
            return Err(SlidingMeshError::InvalidConfig(
                "partition_prefix must not be empty".into(),
            ));
        }
        let p = &self.projection;
        if !(p.param_tol >= 0.0 && p.param_tol < 0.5) {
            return Err(SlidingMeshError::InvalidConfig(format!(
                "projection.param_tol {} outside [0, 0.5)",
                p.param_tol
            )));
        }
        if p.max_iters == 0 {
            return Err(SlidingMeshError::InvalidConfig(
                "projection.max_iters must be positive".into(),
            ));
        }
        if !(p.step_tol > 0.0) {
            return Err(SlidingMeshError::InvalidConfig(format!(
                "projection.step_tol {} must be positive",
                p.step_tol
            )));
        }
        if !(p.gap_ratio > 0.0) {
            return Err(SlidingMeshError::InvalidConfig(format!(
                "projection.gap_ratio {} must be positive",
                p.gap_ratio
            )));
        }
        // The label must name a rule for at least one face kind.
        if QuadratureRule::from_name(&self.face_quadrature, FaceKind::Quad4).is_err()
            && QuadratureRule::from_name(&self.face_quadrature, FaceKind::Tri3).is_err()
        {
            return Err(SlidingMeshError::InvalidConfig(format!(
                "unknown face quadrature '{}'",
                self.face_quadrature
            )));
        }
        if let Some(rot) = &self.rotation {
            rot.validate()?;
        }
        Ok(())
    }
}

/// Rigid rotation of the rotated zone at a constant rate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Angular velocity in rad/s; the sign gives the direction.
    pub angular_velocity: f64,
    /// Time step in seconds.
    pub time_step: f64,
}

impl RotationConfig {
    /// Angle swept in one time step.
    pub fn step_angle(&self) -> f64 {
        (self.angular_velocity * self.time_step).abs()
    }

    pub fn validate(&self) -> Result<(), SlidingMeshError> {
        if !self.angular_velocity.is_finite() {
            return Err(SlidingMeshError::InvalidConfig(
                "rotation.angular_velocity must be finite".into(),
            ));
        }
        if !(self.time_step > 0.0 && self.time_step.is_finite()) {
            return Err(SlidingMeshError::InvalidConfig(format!(
                "rotation.time_step {} must be positive",
                self.time_step
            )));
        }
        Ok(())
    }

    /// Reject a step that could carry a match past a whole tag bin.
    ///
    /// The search only looks one bin to either side of the cached tag, so the
    /// angle swept per step must not exceed the narrowest bin of any interface.
    pub fn validate_against<T: InterfaceTopology + ?Sized>(
        &self,
        topology: &T,
    ) -> Result<(), SlidingMeshError> {
        self.validate()?;
        let step = self.step_angle();
        for itf in 0..topology.num_interfaces() {
            let bin_width = topology
                .tag_bounds(itf)
                .windows(2)
                .map(|w| w[1] - w[0])
                .fold(f64::INFINITY, f64::min);
            if step > bin_width {
                return Err(SlidingMeshError::RotationStepTooLarge {
                    interface: itf,
                    step,
                    bin_width,
                });
            }
        }
        Ok(())
    }
}
