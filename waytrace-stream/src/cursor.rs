//! Monotonic segment search.
//!
//! Consecutive samples of a trip that follows its plan land on the same or
//! a nearby segment, so the cursor first searches a short window ahead of the
//! last match. Only when nothing in that window is within the threshold does
//! it scan every segment. The result is interchangeable with
//! [`nearest_segment`] for classification: a window hit within the threshold
//! means the global nearest is within it too, and every miss is settled by
//! the full scan itself.

use geo::Coord;
use waytrace_core::PlannedRoutePoint;
use waytrace_core::deviation::{SegmentMatch, nearest_in_range, nearest_segment};

/// How a [`SegmentCursor::locate`] call was answered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lookup {
    /// The segment used for classification, if the route has any.
    pub hit: Option<SegmentMatch>,
    /// Whether the window missed and every segment was scanned.
    pub full_scan: bool,
}

/// Remembers the last on-corridor segment of one trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentCursor {
    position: usize,
    window: usize,
}

impl SegmentCursor {
    /// A cursor at the first segment that searches `window` segments ahead.
    #[must_use]
    pub const fn new(window: usize) -> Self {
        Self {
            position: 0,
            window: if window == 0 { 1 } else { window },
        }
    }

    /// Segment index the next search starts from.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Find the segment that decides whether `point` deviates.
    ///
    /// When the returned match is within `threshold` it may be a local rather
    /// than the global nearest; beyond the threshold it is always the global
    /// nearest, lowest index first.
    pub fn locate(
        &mut self,
        point: Coord<f64>,
        route: &[PlannedRoutePoint],
        threshold: f64,
    ) -> Lookup {
        let end = self.position.saturating_add(self.window);
        if let Some(local) = nearest_in_range(point, route, self.position, end)
            && !local.exceeds(threshold)
        {
            self.position = local.index;
            return Lookup {
                hit: Some(local),
                full_scan: false,
            };
        }
        if route.len() < 2 {
            return Lookup {
                hit: None,
                full_scan: false,
            };
        }

        let global = nearest_segment(point, route);
        if let Some(found) = global.filter(|found| !found.exceeds(threshold)) {
            log::trace!("cursor jumped from segment {} to {}", self.position, found.index);
            self.position = found.index;
        }
        Lookup {
            hit: global,
            full_scan: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn long_route() -> Vec<PlannedRoutePoint> {
        (0..40)
            .map(|i| PlannedRoutePoint::new(0.0, f64::from(i) * 0.01, i64::from(i)))
            .collect()
    }

    #[rstest]
    fn follows_the_trip_without_full_scans(long_route: Vec<PlannedRoutePoint>) {
        let mut cursor = SegmentCursor::new(4);
        for step in 0..39 {
            let lookup = cursor.locate(
                Coord {
                    x: f64::from(step) * 0.01 + 0.005,
                    y: 0.0,
                },
                &long_route,
                200.0,
            );
            assert!(!lookup.full_scan, "step {step} needed a full scan");
        }
        assert_eq!(cursor.position(), 38);
    }

    #[rstest]
    fn jump_ahead_falls_back_and_repositions(long_route: Vec<PlannedRoutePoint>) {
        let mut cursor = SegmentCursor::new(4);
        let lookup = cursor.locate(Coord { x: 0.305, y: 0.0 }, &long_route, 200.0);
        assert!(lookup.full_scan);
        assert_eq!(lookup.hit.map(|hit| hit.index), Some(30));
        assert_eq!(cursor.position(), 30);
    }

    #[rstest]
    fn off_route_match_equals_full_scan(long_route: Vec<PlannedRoutePoint>) {
        let mut cursor = SegmentCursor::new(4);
        let point = Coord { x: 0.125, y: 0.02 };
        let lookup = cursor.locate(point, &long_route, 200.0);
        assert!(lookup.full_scan);
        assert_eq!(lookup.hit, nearest_segment(point, &long_route));
        // Off-route samples do not move the cursor.
        assert_eq!(cursor.position(), 0);
    }

    #[rstest]
    fn routes_without_segments_never_scan() {
        let mut cursor = SegmentCursor::new(8);
        let single = vec![PlannedRoutePoint::new(0.0, 0.0, 1)];
        let lookup = cursor.locate(Coord { x: 1.0, y: 1.0 }, &single, 200.0);
        assert_eq!(
            lookup,
            Lookup {
                hit: None,
                full_scan: false
            }
        );
    }
}
