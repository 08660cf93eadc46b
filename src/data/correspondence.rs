//! Per-quadrature-point correspondence cache.
//!
//! For every interface, fixed-side element and face quadrature point the cache
//! holds the last match found on the rotated side. [`CorrespondenceCache::refresh_all`]
//! is the only bulk mutator and runs once per mesh-motion update; assembly
//! reads through [`CorrespondenceCache::get`] as often as it likes.

use crate::algs::search::{SearchAttempt, SearchSite, search_opposite_point};
use crate::data::interface_state::InterfaceStateCache;
use crate::discretization::QuadratureRule;
use crate::geometry::FacePatch;
use crate::geometry::projection::SurfaceProjector;
use crate::mesh_error::SlidingMeshError;
use crate::topology::{InterfaceTopology, NodeSide};

/// Match of one fixed-side quadrature point on the rotated side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correspondence {
    /// Tag bin holding the rotated element; warm start for the next refresh.
    pub tag: usize,
    /// Element index within the bin.
    pub element: usize,
    pub xi: f64,
    pub eta: f64,
}

/// Counters returned by a full refresh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub points: usize,
    pub warm_hits: usize,
    pub lower_hits: usize,
    pub upper_hits: usize,
}

impl RefreshStats {
    pub fn fallback_hits(&self) -> usize {
        self.lower_hits + self.upper_hits
    }

    fn record(&mut self, attempt: SearchAttempt) {
        self.points += 1;
        match attempt {
            SearchAttempt::Guess => self.warm_hits += 1,
            SearchAttempt::Lower => self.lower_hits += 1,
            SearchAttempt::Upper => self.upper_hits += 1,
        }
    }

    fn merge(&mut self, other: RefreshStats) {
        self.points += other.points;
        self.warm_hits += other.warm_hits;
        self.lower_hits += other.lower_hits;
        self.upper_hits += other.upper_hits;
    }
}

#[derive(Clone, Debug)]
pub struct CorrespondenceCache {
    nqp: usize,
    records: Vec<Vec<Option<Correspondence>>>,
    epoch: Option<u64>,
}

impl CorrespondenceCache {
    /// Empty cache sized for `topology` with `nqp` quadrature points per face.
    pub fn new<T: InterfaceTopology + ?Sized>(topology: &T, nqp: usize) -> Self {
        let records = (0..topology.num_interfaces())
            .map(|itf| vec![None; topology.fixed_elements(itf).len() * nqp])
            .collect();
        Self {
            nqp,
            records,
            epoch: None,
        }
    }

    pub fn num_interfaces(&self) -> usize {
        self.records.len()
    }

    pub fn quad_points_per_face(&self) -> usize {
        self.nqp
    }

    /// Number of fixed elements cached for interface `itf`.
    pub fn num_fixed_elements(&self, itf: usize) -> Result<usize, SlidingMeshError> {
        self.records
            .get(itf)
            .map(|r| if self.nqp == 0 { 0 } else { r.len() / self.nqp })
            .ok_or(SlidingMeshError::InterfaceOutOfRange {
                interface: itf,
                count: self.records.len(),
            })
    }

    fn slot(&self, itf: usize, element: usize, quad: usize) -> Result<usize, SlidingMeshError> {
        let count = self.num_fixed_elements(itf)?;
        if element >= count || quad >= self.nqp {
            return Err(SlidingMeshError::CorrespondenceIndexOutOfRange {
                interface: itf,
                element,
                quad,
            });
        }
        Ok(element * self.nqp + quad)
    }

    /// Overwrite one record.
    pub fn set(
        &mut self,
        itf: usize,
        element: usize,
        quad: usize,
        value: Correspondence,
    ) -> Result<(), SlidingMeshError> {
        let slot = self.slot(itf, element, quad)?;
        self.records[itf][slot] = Some(value);
        Ok(())
    }

    /// Read one record; errors if it was never written.
    pub fn get(
        &self,
        itf: usize,
        element: usize,
        quad: usize,
    ) -> Result<Correspondence, SlidingMeshError> {
        let slot = self.slot(itf, element, quad)?;
        self.records[itf][slot].ok_or(SlidingMeshError::CorrespondenceUnset {
            interface: itf,
            element,
            quad,
        })
    }

    /// Motion epoch the records were computed against, if a refresh completed.
    pub fn epoch(&self) -> Option<u64> {
        self.epoch
    }

    /// Error unless the records match the current rotated geometry.
    pub fn ensure_current(&self, state: &InterfaceStateCache) -> Result<(), SlidingMeshError> {
        let current = state.motion_epoch();
        match self.epoch {
            Some(e) if e == current => Ok(()),
            Some(e) => Err(SlidingMeshError::StaleCorrespondence {
                computed: e,
                current,
            }),
            None => Err(SlidingMeshError::CorrespondenceNotRefreshed),
        }
    }

    /// Re-search every fixed-side quadrature point.
    ///
    /// Each search starts from the tag cached by the previous refresh, or from
    /// the fixed element's own tag on the first one. A failure leaves the
    /// cache without a valid epoch.
    pub fn refresh_all<T, P>(
        &mut self,
        topology: &T,
        state: &InterfaceStateCache,
        projector: &P,
        rule: &QuadratureRule,
    ) -> Result<RefreshStats, SlidingMeshError>
    where
        T: InterfaceTopology + ?Sized,
        P: SurfaceProjector + ?Sized,
    {
        let kind = topology.element_kind();
        if rule.face != kind.face_kind() {
            return Err(SlidingMeshError::UnsupportedQuadrature {
                rule: rule.name.clone(),
                face: kind.face_kind().name(),
            });
        }
        if rule.len() != self.nqp {
            return Err(SlidingMeshError::InvalidConfig(format!(
                "quadrature rule '{}' has {} points, cache was built for {}",
                rule.name,
                rule.len(),
                self.nqp
            )));
        }
        if topology.num_interfaces() != self.records.len() {
            return Err(SlidingMeshError::InterfaceOutOfRange {
                interface: topology.num_interfaces(),
                count: self.records.len(),
            });
        }
        for itf in 0..topology.num_interfaces() {
            let cached = self.num_fixed_elements(itf)?;
            let found = topology.fixed_elements(itf).len();
            if found != cached {
                return Err(SlidingMeshError::NodeCountMismatch {
                    interface: itf,
                    side: NodeSide::Fixed,
                    what: "fixed elements",
                    expected: cached,
                    found,
                });
            }
        }

        self.epoch = None;
        let mut total = RefreshStats::default();
        for itf in 0..topology.num_interfaces() {
            let mut stats = RefreshStats::default();
            for (ee, elem) in topology.fixed_elements(itf).iter().enumerate() {
                let face = FacePatch::from_element(kind, elem.face, &elem.ctrl_pts)?;
                for (qq, &[qx, qe]) in rule.points.iter().enumerate() {
                    let point = face.point_at(qx, qe);
                    let guess = self.get(itf, ee, qq).map_or(elem.tag, |c| c.tag);
                    let site = SearchSite {
                        interface: itf,
                        element: ee,
                        quad: qq,
                    };
                    let hit =
                        search_opposite_point(&point, guess, site, topology, state, projector)?;
                    stats.record(hit.attempt);
                    self.set(
                        itf,
                        ee,
                        qq,
                        Correspondence {
                            tag: hit.tag,
                            element: hit.element,
                            xi: hit.xi,
                            eta: hit.eta,
                        },
                    )?;
                }
            }
            log::debug!(
                "interface {itf}: {} points, {} fallback hits",
                stats.points,
                stats.fallback_hits()
            );
            total.merge(stats);
        }
        self.epoch = Some(state.motion_epoch());
        log::info!(
            "correspondence refresh at motion epoch {}: {} points, {} warm, {} lower, {} upper",
            state.motion_epoch(),
            total.points,
            total.warm_hits,
            total.lower_hits,
            total.upper_hits
        );
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::ElementKind;
    use crate::topology::{FixedElement, InterfaceData, LocalInterface};

    fn topo(n_fixed: usize) -> LocalInterface {
        let fixed = FixedElement {
            ctrl_pts: vec![[0.0; 3]; 8],
            face: 0,
            tag: 0,
            ien: vec![0; 8],
        };
        LocalInterface::new(
            ElementKind::Hex8,
            vec![InterfaceData {
                fixed_elements: vec![fixed; n_fixed],
                rotated_elements: vec![vec![]],
                tag_angles: None,
            }],
        )
    }

    fn rec(tag: usize) -> Correspondence {
        Correspondence {
            tag,
            element: 1,
            xi: 0.25,
            eta: -0.5,
        }
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut cache = CorrespondenceCache::new(&topo(2), 4);
        cache.set(0, 1, 3, rec(0)).unwrap();
        assert_eq!(cache.get(0, 1, 3).unwrap(), rec(0));
        cache.set(0, 1, 3, rec(5)).unwrap();
        assert_eq!(cache.get(0, 1, 3).unwrap().tag, 5);
    }

    #[test]
    fn get_before_set_is_an_error() {
        let cache = CorrespondenceCache::new(&topo(2), 4);
        assert_eq!(
            cache.get(0, 0, 0).unwrap_err(),
            SlidingMeshError::CorrespondenceUnset {
                interface: 0,
                element: 0,
                quad: 0
            }
        );
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        let mut cache = CorrespondenceCache::new(&topo(2), 4);
        assert!(matches!(
            cache.set(0, 2, 0, rec(0)),
            Err(SlidingMeshError::CorrespondenceIndexOutOfRange { element: 2, .. })
        ));
        assert!(matches!(
            cache.get(0, 0, 4),
            Err(SlidingMeshError::CorrespondenceIndexOutOfRange { quad: 4, .. })
        ));
        assert!(matches!(
            cache.get(1, 0, 0),
            Err(SlidingMeshError::InterfaceOutOfRange { interface: 1, count: 1 })
        ));
    }

    #[test]
    fn stats_merge_and_count_fallbacks() {
        let mut s = RefreshStats::default();
        s.record(SearchAttempt::Guess);
        s.record(SearchAttempt::Upper);
        let mut t = RefreshStats::default();
        t.record(SearchAttempt::Lower);
        s.merge(t);
        assert_eq!(s.points, 3);
        assert_eq!(s.fallback_hits(), 2);
    }
}
