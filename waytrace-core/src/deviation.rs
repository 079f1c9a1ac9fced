//! Per-sample deviation detection against the planned route.

use geo::Coord;

use crate::geodesy::distance_to_segment;
use crate::{ActualPosition, Deviation, PlannedRoutePoint, analysis::round_meters};

/// Default distance beyond which a sample counts as off-route, in metres.
pub const DEFAULT_THRESHOLD_METERS: f64 = 200.0;

/// The planned segment closest to a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentMatch {
    /// Segment index `i`, covering `route[i]`–`route[i + 1]`.
    pub index: usize,
    /// Distance to that segment in metres.
    pub distance: f64,
}

impl SegmentMatch {
    /// Whether the match lies farther than `threshold` metres away.
    #[must_use]
    pub const fn exceeds(&self, threshold: f64) -> bool {
        self.distance > threshold
    }
}

/// Find the nearest segment of `route` to `point` by scanning every segment.
///
/// Ties go to the lowest index. Returns `None` for routes with fewer than two
/// points.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waytrace_core::PlannedRoutePoint;
/// use waytrace_core::deviation::nearest_segment;
///
/// let route = vec![
///     PlannedRoutePoint::new(0.0, 0.0, 1),
///     PlannedRoutePoint::new(0.0, 0.01, 2),
///     PlannedRoutePoint::new(0.0, 0.02, 3),
/// ];
/// let hit = nearest_segment(Coord { x: 0.015, y: 0.0 }, &route).unwrap();
/// assert_eq!(hit.index, 1);
/// assert!(hit.distance < 1.0);
/// ```
#[must_use]
pub fn nearest_segment(point: Coord<f64>, route: &[PlannedRoutePoint]) -> Option<SegmentMatch> {
    nearest_in_range(point, route, 0, route.len())
}

/// Nearest segment among indices `from..to`, clipped to the route.
///
/// Returns `None` when the range holds no segment.
#[must_use]
pub fn nearest_in_range(
    point: Coord<f64>,
    route: &[PlannedRoutePoint],
    from: usize,
    to: usize,
) -> Option<SegmentMatch> {
    let mut best: Option<SegmentMatch> = None;
    let segments = route
        .windows(2)
        .enumerate()
        .skip(from)
        .take(to.saturating_sub(from));
    for (offset, pair) in segments {
        let [start, end] = pair else { continue };
        let candidate = SegmentMatch {
            index: offset,
            distance: distance_to_segment(point, start.coord(), end.coord()),
        };
        // Strict comparison keeps the first of equidistant segments; a NaN
        // distance never beats a measurable one.
        let closer = |current: SegmentMatch| {
            current.distance.is_nan() || candidate.distance < current.distance
        };
        if best.is_none_or(closer) {
            best = Some(candidate);
        }
    }
    best
}

/// Flag a sample whose nearest segment lies beyond `threshold`.
#[must_use]
pub fn classify_sample(
    sample: &ActualPosition,
    nearest: Option<SegmentMatch>,
    threshold: f64,
) -> Option<Deviation> {
    let hit = nearest.filter(|hit| hit.exceeds(threshold))?;
    Some(Deviation {
        timestamp: sample.timestamp,
        lat: sample.lat,
        lng: sample.lng,
        distance_meters: round_meters(hit.distance),
        segment_index: hit.index,
    })
}

/// Detect every sample lying beyond `threshold` from its nearest segment.
///
/// Both slices must already be in traversal order. This is the full
/// `samples x segments` scan; the streaming worker narrows it with a cursor.
#[must_use]
pub fn detect_deviations(
    route: &[PlannedRoutePoint],
    samples: &[ActualPosition],
    threshold: f64,
) -> Vec<Deviation> {
    samples
        .iter()
        .filter_map(|sample| {
            classify_sample(sample, nearest_segment(sample.coord(), route), threshold)
        })
        .collect()
}
