//! Restricted-area index: a cached snapshot of no-fly polygons and the
//! membership queries the planner runs for every candidate move.

use crate::geofence::{contains_point, validate_ring};
use crate::models::{Position, RestrictedArea};
use std::sync::{Arc, PoisonError, RwLock};

/// Segments are checked at `t = i / SEGMENT_SAMPLES` for `i = 1..SEGMENT_SAMPLES`,
/// plus both endpoints.
pub const SEGMENT_SAMPLES: usize = 20;

/// Supplier of restricted-area polygons. Returns an empty list when the
/// upstream is unavailable.
pub trait RestrictedAreaSource: Send + Sync {
    fn fetch_restricted_areas(&self) -> Vec<RestrictedArea>;
}

/// Immutable set of valid restricted areas.
#[derive(Debug, Clone, Default)]
pub struct AreaSnapshot {
    areas: Vec<RestrictedArea>,
}

impl AreaSnapshot {
    /// Build a snapshot, skipping areas whose polygon cannot be evaluated.
    pub fn new(areas: Vec<RestrictedArea>) -> Self {
        let areas = areas
            .into_iter()
            .filter(|area| {
                if area.vertices.is_empty() {
                    tracing::debug!("Skipping restricted area '{}' without vertices", area.name);
                    return false;
                }
                match validate_ring(&area.vertices) {
                    Ok(()) => true,
                    Err(err) => {
                        tracing::warn!("Skipping restricted area '{}': {}", area.name, err);
                        false
                    }
                }
            })
            .collect();
        Self { areas }
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn area_names(&self) -> Vec<String> {
        self.areas.iter().map(|area| area.name.clone()).collect()
    }

    /// True if `pos` is inside (or on the edge of) any restricted area.
    pub fn is_in_restricted_area(&self, pos: Position) -> bool {
        self.area_containing(pos).is_some()
    }

    fn area_containing(&self, pos: Position) -> Option<&RestrictedArea> {
        self.areas
            .iter()
            .find(|area| contains_point(pos, &area.vertices))
    }

    /// True if the straight segment `a -> b` touches a restricted area.
    ///
    /// Sampling approximation: both endpoints plus 19 evenly spaced interior
    /// points. A zone thinner than the sample spacing can slip through.
    pub fn segment_crosses_restricted_area(&self, a: Position, b: Position) -> bool {
        if self.areas.is_empty() {
            return false;
        }
        if self.is_in_restricted_area(a) || self.is_in_restricted_area(b) {
            return true;
        }
        (1..SEGMENT_SAMPLES).any(|i| self.is_in_restricted_area(lerp(a, b, i)))
    }

    /// True if any consecutive pair of waypoints crosses a restricted area.
    pub fn path_crosses_restricted_area(&self, waypoints: &[Position]) -> bool {
        waypoints
            .windows(2)
            .any(|pair| self.segment_crosses_restricted_area(pair[0], pair[1]))
    }

    /// Name of the first restricted area hit along `a -> b`, walking from `a`.
    pub fn restricted_area_for_segment(&self, a: Position, b: Position) -> Option<&str> {
        (0..=SEGMENT_SAMPLES)
            .find_map(|i| self.area_containing(lerp(a, b, i)))
            .map(|area| area.name.as_str())
    }
}

fn lerp(a: Position, b: Position, i: usize) -> Position {
    let t = i as f64 / SEGMENT_SAMPLES as f64;
    Position::new(a.lng + t * (b.lng - a.lng), a.lat + t * (b.lat - a.lat))
}

/// Read-through cache of restricted areas.
///
/// Readers get a shared snapshot that never changes under them; invalidation
/// drops the cached snapshot as a whole and the next reader refetches.
pub struct RestrictedAreaIndex {
    source: Arc<dyn RestrictedAreaSource>,
    cached: RwLock<Option<Arc<AreaSnapshot>>>,
}

impl RestrictedAreaIndex {
    pub fn new(source: Arc<dyn RestrictedAreaSource>) -> Self {
        Self {
            source,
            cached: RwLock::new(None),
        }
    }

    /// Current snapshot, fetching from the source on a cold cache.
    pub fn get(&self) -> Arc<AreaSnapshot> {
        if let Some(snapshot) = self
            .cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return snapshot.clone();
        }

        let fetched = Arc::new(AreaSnapshot::new(self.source.fetch_restricted_areas()));
        tracing::info!("Loaded {} restricted areas", fetched.len());

        let mut slot = self.cached.write().unwrap_or_else(PoisonError::into_inner);
        // Another reader may have filled the slot while we were fetching.
        slot.get_or_insert(fetched).clone()
    }

    /// Drop the cached snapshot. Snapshots already handed out stay valid.
    pub fn invalidate(&self) {
        let mut slot = self.cached.write().unwrap_or_else(PoisonError::into_inner);
        if slot.take().is_some() {
            tracing::info!("Restricted area cache invalidated");
        }
    }

    pub fn is_cached(&self) -> bool {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn square(name: &str, min: f64, max: f64) -> RestrictedArea {
        RestrictedArea {
            name: name.to_string(),
            id: None,
            limits: None,
            vertices: vec![
                Position::new(min, min),
                Position::new(min, max),
                Position::new(max, max),
                Position::new(max, min),
                Position::new(min, min),
            ],
        }
    }

    struct CountingSource {
        calls: AtomicUsize,
        areas: Vec<RestrictedArea>,
    }

    impl RestrictedAreaSource for CountingSource {
        fn fetch_restricted_areas(&self) -> Vec<RestrictedArea> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.areas.clone()
        }
    }

    #[test]
    fn malformed_areas_are_skipped() {
        let mut open = square("open", 0.0, 1.0);
        open.vertices.pop();
        let snapshot = AreaSnapshot::new(vec![open, square("ok", 2.0, 3.0)]);
        assert_eq!(snapshot.area_names(), vec!["ok".to_string()]);
        assert!(!snapshot.is_in_restricted_area(Position::new(0.5, 0.5)));
        assert!(snapshot.is_in_restricted_area(Position::new(2.5, 2.5)));
    }

    #[test]
    fn segment_through_area_is_detected_by_interior_samples() {
        let snapshot = AreaSnapshot::new(vec![square("block", 0.4, 0.6)]);
        let a = Position::new(0.0, 0.5);
        let b = Position::new(1.0, 0.5);
        assert!(snapshot.segment_crosses_restricted_area(a, b));
        assert_eq!(snapshot.restricted_area_for_segment(a, b), Some("block"));
        assert!(!snapshot.segment_crosses_restricted_area(a, Position::new(0.0, 1.0)));
    }

    #[test]
    fn thin_area_between_samples_is_missed() {
        // Samples fall on multiples of 0.05; the sliver sits between two of them.
        let snapshot = AreaSnapshot::new(vec![square("sliver", 0.51, 0.52)]);
        let a = Position::new(0.0, 0.515);
        let b = Position::new(1.0, 0.515);
        assert!(!snapshot.segment_crosses_restricted_area(a, b));
    }

    #[test]
    fn path_check_walks_every_segment() {
        let snapshot = AreaSnapshot::new(vec![square("block", 0.4, 0.6)]);
        let clear = [Position::new(0.0, 0.0), Position::new(0.0, 1.0)];
        let blocked = [
            Position::new(0.0, 0.0),
            Position::new(0.0, 1.0),
            Position::new(1.0, 0.5),
        ];
        assert!(!snapshot.path_crosses_restricted_area(&clear));
        assert!(snapshot.path_crosses_restricted_area(&blocked));
    }

    #[test]
    fn index_fetches_once_until_invalidated() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            areas: vec![square("a", 0.0, 1.0)],
        });
        let index = RestrictedAreaIndex::new(source.clone());
        assert!(!index.is_cached());

        let first = index.get();
        let second = index.get();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));

        index.invalidate();
        assert!(!index.is_cached());
        let third = index.get();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert!(!Arc::ptr_eq(&first, &third));
        // The old snapshot is still usable by whoever holds it.
        assert_eq!(first.len(), 1);
    }
}
