//! Three-bin search for the rotated-side element facing a fixed-side point.
//!
//! The rotated elements of an interface are grouped into angular tag bins.
//! Starting from a guessed bin, the search tries that bin, then the one below,
//! then the one above, and accepts the first element whose face the point
//! projects onto. There is no wrap-around between the first and the last bin.

use crate::data::interface_state::InterfaceStateCache;
use crate::geometry::projection::SurfaceProjector;
use crate::geometry::{FacePatch, Point3};
use crate::mesh_error::SlidingMeshError;
use crate::topology::InterfaceTopology;

/// Where a search was issued from; used in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchSite {
    pub interface: usize,
    pub element: usize,
    pub quad: usize,
}

/// Which of the three bins produced the hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchAttempt {
    Guess,
    Lower,
    Upper,
}

/// Result of a successful search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchHit {
    pub tag: usize,
    pub element: usize,
    pub xi: f64,
    pub eta: f64,
    pub attempt: SearchAttempt,
}

/// Bins tried for `guess`, in order.
pub fn candidate_tags(guess: usize, num_tags: usize) -> Vec<(usize, SearchAttempt)> {
    let mut out = vec![(guess, SearchAttempt::Guess)];
    if guess > 0 {
        out.push((guess - 1, SearchAttempt::Lower));
    }
    if guess + 1 < num_tags {
        out.push((guess + 1, SearchAttempt::Upper));
    }
    out
}

/// Locate `point` on the current rotated surface of `site.interface`.
///
/// Elements within a bin are scanned in stored order; the first accepted
/// projection wins. Fails with [`SlidingMeshError::NoOppositePoint`] when
/// none of the candidate bins matches.
pub fn search_opposite_point<T, P>(
    point: &Point3,
    guess: usize,
    site: SearchSite,
    topology: &T,
    state: &InterfaceStateCache,
    projector: &P,
) -> Result<SearchHit, SlidingMeshError>
where
    T: InterfaceTopology + ?Sized,
    P: SurfaceProjector + ?Sized,
{
    let itf = site.interface;
    if itf >= topology.num_interfaces() {
        return Err(SlidingMeshError::InterfaceOutOfRange {
            interface: itf,
            count: topology.num_interfaces(),
        });
    }
    let num_tags = topology.num_tags(itf);
    if guess >= num_tags {
        return Err(SlidingMeshError::TagOutOfRange {
            interface: itf,
            tag: guess,
            num_tag: num_tags,
        });
    }
    let kind = topology.element_kind();
    let candidates = candidate_tags(guess, num_tags);

    for &(tag, attempt) in &candidates {
        for (ee, elem) in topology.rotated_elements(itf, tag).iter().enumerate() {
            let ctrl = state.current_rotated_ctrl_pts(itf, elem)?;
            let face = FacePatch::from_element(kind, elem.face, &ctrl)?;
            if let Some([xi, eta]) = projector.project(point, &face) {
                if attempt != SearchAttempt::Guess {
                    log::trace!(
                        "interface {itf}, element {}, quad {}: {attempt:?} bin {tag} used (guess {guess})",
                        site.element,
                        site.quad
                    );
                }
                return Ok(SearchHit {
                    tag,
                    element: ee,
                    xi,
                    eta,
                    attempt,
                });
            }
        }
    }

    Err(SlidingMeshError::NoOppositePoint {
        interface: itf,
        element: site.element,
        quad: site.quad,
        tried: candidates.into_iter().map(|(t, _)| t).collect(),
    })
}
