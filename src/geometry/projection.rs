//! Closest-point projection of a physical point onto a face patch.
//!
//! This is the geometric primitive behind the correspondence search: it knows
//! nothing about interfaces, tags or caches. A projection succeeds when
//! Gauss-Newton converges to parametric coordinates inside the reference face
//! and the remaining gap is small compared to the face itself.

use super::{FacePatch, Point3, distance, dot, norm, sub};
use serde::{Deserialize, Serialize};

/// Geometric projection primitive.
pub trait SurfaceProjector {
    /// Parametric coordinates of the match of `point` on `face`, if any.
    fn project(&self, point: &Point3, face: &FacePatch) -> Option<[f64; 2]>;
}

/// Gauss-Newton closest-point search on linear and bilinear faces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosestPointProjector {
    /// Slack on the reference-face bounds; points on a shared edge match both sides.
    pub param_tol: f64,
    /// Iteration cap for Gauss-Newton.
    pub max_iters: usize,
    /// Converged once the parametric update is below this, or once the
    /// projected residual is at rounding level.
    pub step_tol: f64,
    /// Maximum accepted gap as a fraction of the face diameter.
    pub gap_ratio: f64,
}

impl Default for ClosestPointProjector {
    fn default() -> Self {
        Self {
            param_tol: 1e-8,
            max_iters: 25,
            step_tol: 1e-13,
            gap_ratio: 0.5,
        }
    }
}

// Iterates are kept inside a box around the reference face; anything that
// wants to leave it is not a match anyway.
const PARAM_LIMIT: f64 = 4.0;

// Multiple of machine epsilon below which the projected residual counts as zero.
const STATIONARY_ULPS: f64 = 64.0;

impl SurfaceProjector for ClosestPointProjector {
    fn project(&self, point: &Point3, face: &FacePatch) -> Option<[f64; 2]> {
        let kind = face.kind();
        // Work relative to the first node so rounding scales with the face, not
        // with its distance from the origin.
        let origin = *face.nodes().first()?;
        let local = face.relative_to(&origin);
        let target = sub(point, &origin);
        let scale = local.diameter() + norm(&target);

        let [mut xi, mut eta] = kind.centroid();
        let mut converged = false;

        for iter in 0..=self.max_iters {
            let r = sub(&local.point_at(xi, eta), &target);
            let (t1, t2) = local.tangents(xi, eta);
            let a11 = dot(&t1, &t1);
            let a12 = dot(&t1, &t2);
            let a22 = dot(&t2, &t2);
            let b1 = -dot(&t1, &r);
            let b2 = -dot(&t2, &r);

            // J^T r at rounding level in both directions: nothing left to gain.
            let noise = STATIONARY_ULPS * f64::EPSILON * (norm(&r) + scale);
            if b1.abs() <= noise * a11.sqrt() && b2.abs() <= noise * a22.sqrt() {
                converged = true;
                break;
            }
            if iter == self.max_iters {
                break;
            }

            let det = a11 * a22 - a12 * a12;
            if det <= f64::EPSILON * a11 * a22 {
                return None;
            }
            let dxi = (b1 * a22 - b2 * a12) / det;
            let deta = (a11 * b2 - a12 * b1) / det;
            xi = (xi + dxi).clamp(-PARAM_LIMIT, PARAM_LIMIT);
            eta = (eta + deta).clamp(-PARAM_LIMIT, PARAM_LIMIT);
            if dxi.abs().max(deta.abs()) < self.step_tol {
                converged = true;
                break;
            }
        }

        if !converged || !kind.contains(xi, eta, self.param_tol) {
            return None;
        }
        let gap = distance(&local.point_at(xi, eta), &target);
        if gap > self.gap_ratio * local.diameter() {
            return None;
        }
        Some([xi, eta])
    }
}
