//! Divergent segment aggregation.
//!
//! A sample is off-corridor when it lies farther than the threshold from
//! *every* planned segment. Consecutive off-corridor samples form a run; the
//! next on-corridor sample closes it. Closed runs are resolved against the
//! planned route by proportional index mapping: the run's position within
//! the trace is projected onto the planned point indices. This is a
//! heuristic rather than a nearest-point match; runs are by construction far
//! from the route, so no exact correspondence exists.

use geo::Coord;

use crate::analysis::{round_meters, round_signed};
use crate::geodesy::{distance, distance_to_segment, polyline_length};
use crate::{ActualPosition, DivergentSegment, PlannedRoutePoint};

/// Whether `point` is beyond `threshold` from every segment of `route`.
///
/// Stops at the first segment within reach. Routes without segments have no
/// corridor to leave, so nothing is off-corridor.
#[must_use]
pub fn is_off_corridor(point: Coord<f64>, route: &[PlannedRoutePoint], threshold: f64) -> bool {
    let mut segments = route.windows(2).peekable();
    if segments.peek().is_none() {
        return false;
    }
    segments.all(|pair| match pair {
        [start, end] => distance_to_segment(point, start.coord(), end.coord()) > threshold,
        _ => true,
    })
}

/// A finished off-corridor run, in trace indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedRun {
    /// Trace index of the first off-corridor sample.
    pub start_index: usize,
    /// Trace index of the last off-corridor sample.
    pub end_index: usize,
    /// Polyline length of the run's samples in metres.
    pub actual_distance: f64,
}

impl ClosedRun {
    /// Map the run onto the planned route and compare lengths.
    ///
    /// `sample_count` is the length of the whole trace the run indices refer
    /// to. Returns `None` for routes without segments or an empty trace.
    #[must_use]
    pub fn resolve(
        &self,
        route: &[PlannedRoutePoint],
        sample_count: usize,
    ) -> Option<DivergentSegment> {
        let last_point = route.len().checked_sub(1)?;
        let last_segment = last_point.checked_sub(1)?;
        let planned_start =
            proportional_index(self.start_index, sample_count, route.len())?.min(last_segment);
        let planned_end =
            proportional_index(self.end_index, sample_count, route.len())?.min(last_point);
        let planned_distance = route
            .get(planned_start..=planned_end)
            .map_or(0.0, |span| polyline_length(span.iter().map(PlannedRoutePoint::coord)));

        Some(DivergentSegment {
            planned_start_index: planned_start,
            planned_end_index: planned_end,
            planned_distance_meters: round_meters(planned_distance),
            actual_distance_meters: round_meters(self.actual_distance),
            deviation_meters: signed_difference(self.actual_distance, planned_distance),
        })
    }
}

#[expect(clippy::float_arithmetic, reason = "signed metre difference")]
fn signed_difference(actual: f64, planned: f64) -> i64 {
    round_signed(actual - planned)
}

/// `floor(index / count * points)`, computed exactly in integers.
fn proportional_index(index: usize, count: usize, points: usize) -> Option<usize> {
    index.checked_mul(points)?.checked_div(count)
}

#[derive(Debug, Clone, PartialEq)]
struct OpenRun {
    start_index: usize,
    end_index: usize,
    last: Coord<f64>,
    distance: f64,
}

/// Incremental run builder.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waytrace_core::divergence::DivergenceTracker;
///
/// let mut tracker = DivergenceTracker::default();
/// assert!(tracker.observe(0, Coord { x: 0.0, y: 0.0 }, false).is_none());
/// assert!(tracker.observe(1, Coord { x: 0.0, y: 0.01 }, true).is_none());
/// assert!(tracker.observe(2, Coord { x: 0.0, y: 0.02 }, true).is_none());
/// let run = tracker.observe(3, Coord { x: 0.0, y: 0.0 }, false).unwrap();
/// assert_eq!((run.start_index, run.end_index), (1, 2));
/// assert!((run.actual_distance - 1_111.95).abs() < 1.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DivergenceTracker {
    open: Option<OpenRun>,
}

impl DivergenceTracker {
    /// Feed the sample at trace `index`; returns a run when this sample
    /// closes one.
    #[expect(clippy::float_arithmetic, reason = "running polyline length")]
    pub fn observe(
        &mut self,
        index: usize,
        point: Coord<f64>,
        off_corridor: bool,
    ) -> Option<ClosedRun> {
        if !off_corridor {
            let run = self.open.take()?;
            return Some(ClosedRun {
                start_index: run.start_index,
                end_index: run.end_index,
                actual_distance: run.distance,
            });
        }

        match &mut self.open {
            Some(run) => {
                run.distance += distance(run.last, point);
                run.last = point;
                run.end_index = index;
            }
            None => {
                self.open = Some(OpenRun {
                    start_index: index,
                    end_index: index,
                    last: point,
                    distance: 0.0,
                });
            }
        }
        None
    }

    /// Whether an off-corridor run is currently open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open.is_some()
    }
}

/// Find and resolve every closed off-corridor run in a trace.
///
/// Both slices must already be in traversal order.
#[must_use]
pub fn find_divergent_segments(
    route: &[PlannedRoutePoint],
    samples: &[ActualPosition],
    threshold: f64,
) -> Vec<DivergentSegment> {
    let mut tracker = DivergenceTracker::default();
    let runs: Vec<ClosedRun> = samples
        .iter()
        .enumerate()
        .filter_map(|(index, sample)| {
            let point = sample.coord();
            tracker.observe(index, point, is_off_corridor(point, route, threshold))
        })
        .collect();
    if tracker.is_open() {
        log::debug!("trace ended off-corridor; open run not reported");
    }
    runs.iter()
        .filter_map(|run| run.resolve(route, samples.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use rstest::{fixture, rstest};

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0)
            .single()
            .unwrap_or_default()
    }

    #[fixture]
    fn route() -> Vec<PlannedRoutePoint> {
        (0..5)
            .map(|i| PlannedRoutePoint::new(0.0, f64::from(i) * 0.01, i64::from(i)))
            .collect()
    }

    fn sample(index: i64, lat: f64, lng: f64) -> ActualPosition {
        ActualPosition::new(lat, lng, at(index * 30))
    }

    #[rstest]
    fn off_corridor_requires_every_segment_beyond_threshold(route: Vec<PlannedRoutePoint>) {
        assert!(!is_off_corridor(Coord { x: 0.015, y: 0.001 }, &route, 200.0));
        assert!(is_off_corridor(Coord { x: 0.015, y: 0.01 }, &route, 200.0));
    }

    #[rstest]
    fn routes_without_segments_have_no_corridor() {
        let single = vec![PlannedRoutePoint::new(0.0, 0.0, 1)];
        assert!(!is_off_corridor(Coord { x: 5.0, y: 5.0 }, &single, 200.0));
        assert!(!is_off_corridor(Coord { x: 5.0, y: 5.0 }, &[], 200.0));
    }

    #[rstest]
    fn two_sample_excursion_measures_exactly_those_samples(route: Vec<PlannedRoutePoint>) {
        let away_a = sample(2, 0.01, 0.015);
        let away_b = sample(3, 0.01, 0.025);
        let samples = vec![
            sample(0, 0.0, 0.0),
            sample(1, 0.0, 0.01),
            away_a.clone(),
            away_b.clone(),
            sample(4, 0.0, 0.03),
            sample(5, 0.0, 0.04),
        ];
        let segments = find_divergent_segments(&route, &samples, 200.0);
        assert_eq!(segments.len(), 1);
        let segment = segments.first().expect("one segment");
        let expected = round_meters(distance(away_a.coord(), away_b.coord()));
        assert_eq!(segment.actual_distance_meters, expected);
        // floor(2 / 6 * 5) = 1 and floor(3 / 6 * 5) = 2.
        assert_eq!(segment.planned_start_index, 1);
        assert_eq!(segment.planned_end_index, 2);
    }

    #[rstest]
    fn shortcut_yields_negative_deviation(route: Vec<PlannedRoutePoint>) {
        // Two off-corridor samples ~11 m apart stand in for planned points
        // 1..=2, which are ~1.1 km apart.
        let samples = vec![
            sample(0, 0.0, 0.0),
            sample(1, 0.01, 0.015),
            sample(2, 0.01, 0.0151),
            sample(3, 0.0, 0.02),
        ];
        let segments = find_divergent_segments(&route, &samples, 200.0);
        let segment = segments.first().expect("one segment");
        assert_eq!(segment.actual_distance_meters, 11);
        assert_eq!(segment.planned_distance_meters, 1_112);
        assert_eq!(segment.deviation_meters, -1_101);
    }

    #[rstest]
    fn run_open_at_end_is_not_reported(route: Vec<PlannedRoutePoint>) {
        let samples = vec![sample(0, 0.0, 0.0), sample(1, 0.02, 0.01)];
        assert!(find_divergent_segments(&route, &samples, 200.0).is_empty());
    }

    #[rstest]
    fn planned_start_is_clamped_to_last_segment() {
        let route = vec![
            PlannedRoutePoint::new(0.0, 0.0, 1),
            PlannedRoutePoint::new(0.0, 0.01, 2),
        ];
        let run = ClosedRun {
            start_index: 9,
            end_index: 9,
            actual_distance: 10.0,
        };
        let segment = run.resolve(&route, 10).expect("route has a segment");
        assert_eq!(segment.planned_start_index, 0);
        assert_eq!(segment.planned_end_index, 1);
    }

    #[rstest]
    fn resolve_needs_a_segment_and_samples() {
        let run = ClosedRun {
            start_index: 0,
            end_index: 0,
            actual_distance: 0.0,
        };
        assert!(run.resolve(&[PlannedRoutePoint::new(0.0, 0.0, 1)], 3).is_none());
        let two_points = vec![
            PlannedRoutePoint::new(0.0, 0.0, 1),
            PlannedRoutePoint::new(0.0, 0.01, 2),
        ];
        assert!(run.resolve(&two_points, 0).is_none());
    }
}
