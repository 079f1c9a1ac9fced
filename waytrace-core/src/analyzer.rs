//! Batch trajectory analysis.
//!
//! The analyzer sorts private copies of both inputs, measures them and runs
//! the three detectors over the sorted copies. It is a pure function of its
//! inputs: no I/O, no shared state, and no failure path. Malformed
//! coordinates propagate as `NaN` and round to zero.

use crate::analysis::{Totals, elapsed_minutes};
use crate::divergence::find_divergent_segments;
use crate::geodesy::polyline_length;
use crate::stops::detect_unplanned_stops;
use crate::{
    ActualPosition, AnalysisConfig, PlannedRoutePoint, TrajectoryAnalysis,
    deviation::detect_deviations, position::sorted_positions, route::sorted_route,
};

/// Compares planned routes with recorded traces.
///
/// # Examples
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use waytrace_core::{ActualPosition, AnalysisConfig, PlannedRoutePoint, TrajectoryAnalyzer};
///
/// let start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
/// let route = vec![
///     PlannedRoutePoint::new(0.0, 0.0, 1),
///     PlannedRoutePoint::new(0.0, 0.01, 2),
/// ];
/// let trace = vec![
///     ActualPosition::new(0.0, 0.0, start).with_speed(10.0),
///     ActualPosition::new(0.0, 0.01, start + Duration::minutes(2)).with_speed(10.0),
/// ];
/// let analysis = TrajectoryAnalyzer::new(AnalysisConfig::default()).analyze(&route, &trace);
/// assert_eq!(analysis.conformity_percentage, 100.0);
/// assert_eq!(analysis.total_time_actual, 2);
/// assert!(analysis.deviations.is_empty());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrajectoryAnalyzer {
    config: AnalysisConfig,
}

impl TrajectoryAnalyzer {
    /// Create an analyzer with the given parameters.
    #[must_use]
    pub const fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Parameters this analyzer applies.
    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyse one trip.
    ///
    /// Neither input needs to be sorted and neither is modified.
    #[must_use]
    pub fn analyze(
        &self,
        planned: &[PlannedRoutePoint],
        actual: &[ActualPosition],
    ) -> TrajectoryAnalysis {
        let route = sorted_route(planned);
        let samples = sorted_positions(actual);
        let threshold = self.config.threshold_meters;

        let totals = Totals {
            planned_distance: polyline_length(route.iter().map(PlannedRoutePoint::coord)),
            actual_distance: polyline_length(samples.iter().map(ActualPosition::coord)),
            planned_minutes: planned_minutes(&route),
            actual_minutes: actual_minutes(&samples),
        };
        let analysis = TrajectoryAnalysis::from_parts(
            totals,
            detect_deviations(&route, &samples, threshold),
            detect_unplanned_stops(&samples),
            find_divergent_segments(&route, &samples, threshold),
        );
        log::debug!(
            "analysed {} samples against {} waypoints: {}% conformity, {} deviations, {} stops, {} divergent segments",
            samples.len(),
            route.len(),
            analysis.conformity_percentage,
            analysis.deviations.len(),
            analysis.unplanned_stops.len(),
            analysis.divergent_segments.len(),
        );
        analysis
    }
}

/// Analyse one trip with an explicit threshold in metres.
///
/// Shorthand for `TrajectoryAnalyzer::new(AnalysisConfig { threshold_meters })`.
#[must_use]
pub fn analyze(
    planned: &[PlannedRoutePoint],
    actual: &[ActualPosition],
    threshold_meters: f64,
) -> TrajectoryAnalysis {
    TrajectoryAnalyzer::new(AnalysisConfig { threshold_meters }).analyze(planned, actual)
}

/// Scheduled duration of a route sorted by `order`, in minutes.
///
/// Zero unless the route has at least two points and both its first and last
/// points carry an estimated time.
#[must_use]
pub fn planned_minutes(route: &[PlannedRoutePoint]) -> f64 {
    if route.len() < 2 {
        return 0.0;
    }
    match (
        route.first().and_then(|point| point.estimated_time),
        route.last().and_then(|point| point.estimated_time),
    ) {
        (Some(first), Some(last)) => elapsed_minutes(first, last),
        _ => 0.0,
    }
}

/// Observed duration of a timestamp-ordered trace, in minutes.
#[must_use]
pub fn actual_minutes(samples: &[ActualPosition]) -> f64 {
    match (samples.first(), samples.last()) {
        (Some(first), Some(last)) if samples.len() >= 2 => {
            elapsed_minutes(first.timestamp, last.timestamp)
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rstest::{fixture, rstest};

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0)
            .single()
            .unwrap_or_default()
    }

    #[fixture]
    fn belo_horizonte() -> Vec<PlannedRoutePoint> {
        vec![
            PlannedRoutePoint::new(-19.916_681, -43.934_493, 1),
            PlannedRoutePoint::new(-19.917_681, -43.935_493, 2),
            PlannedRoutePoint::new(-19.918_681, -43.936_493, 3),
        ]
    }

    #[rstest]
    fn retracing_the_plan_is_fully_conforming(belo_horizonte: Vec<PlannedRoutePoint>) {
        let trace: Vec<_> = belo_horizonte
            .iter()
            .zip(0..)
            .map(|(point, step)| {
                ActualPosition::new(point.lat, point.lng, at(step * 60)).with_speed(8.0)
            })
            .collect();
        let analysis = analyze(&belo_horizonte, &trace, 200.0);
        assert_eq!(analysis.conformity_percentage, 100.0);
        assert!(analysis.deviations.is_empty());
        assert!(analysis.divergent_segments.is_empty());
        assert_eq!(analysis.extra_distance_meters, 0);
        assert_eq!(analysis.total_distance_planned, analysis.total_distance_actual);
        assert_eq!(analysis.total_time_actual, 2);
    }

    #[rstest]
    fn off_path_point_is_flagged(belo_horizonte: Vec<PlannedRoutePoint>) {
        let trace = vec![
            ActualPosition::new(-19.916_681, -43.934_493, at(0)).with_speed(8.0),
            ActualPosition::new(-19.920_681, -43.940_493, at(60)).with_speed(8.0),
            ActualPosition::new(-19.918_681, -43.936_493, at(120)).with_speed(8.0),
        ];
        let analysis = analyze(&belo_horizonte, &trace, 200.0);
        let deviation = analysis.deviations.first().expect("off-path sample");
        assert_eq!(deviation.segment_index, 1);
        assert!(analysis.conformity_percentage < 80.0);
        assert!(analysis.extra_distance_meters > 900);
    }

    #[rstest]
    fn empty_inputs_yield_defaults() {
        let analysis = analyze(&[], &[], 200.0);
        assert_eq!(analysis, TrajectoryAnalysis::default());
        assert_eq!(analysis.conformity_percentage, 100.0);
    }

    #[rstest]
    fn empty_trace_is_fully_conforming(belo_horizonte: Vec<PlannedRoutePoint>) {
        let analysis = analyze(&belo_horizonte, &[], 200.0);
        assert!(analysis.total_distance_planned > 0);
        assert_eq!(analysis.total_distance_actual, 0);
        assert_eq!(analysis.total_time_actual, 0);
        assert_eq!(analysis.conformity_percentage, 100.0);
    }

    #[rstest]
    fn inputs_are_sorted_before_analysis(belo_horizonte: Vec<PlannedRoutePoint>) {
        let mut shuffled_route = belo_horizonte.clone();
        shuffled_route.reverse();
        let trace = vec![
            ActualPosition::new(-19.918_681, -43.936_493, at(120)),
            ActualPosition::new(-19.916_681, -43.934_493, at(0)),
            ActualPosition::new(-19.917_681, -43.935_493, at(60)),
        ];
        let analysis = analyze(&shuffled_route, &trace, 200.0);
        assert_eq!(analysis, analyze(&belo_horizonte, &trace, 200.0));
        assert_eq!(analysis.total_time_actual, 2);
        assert_eq!(analysis.conformity_percentage, 100.0);
        // Caller's slices are untouched.
        assert_eq!(shuffled_route.first().map(|p| p.order), Some(3));
    }

    #[rstest]
    fn shared_timestamps_do_not_depend_on_input_order() {
        let route = vec![
            PlannedRoutePoint::new(0.0, 0.0, 1),
            PlannedRoutePoint::new(0.0, 0.02, 2),
        ];
        let start = ActualPosition::new(0.0, 0.0, at(0));
        let middle = ActualPosition::new(0.0, 0.01, at(60));
        let end = ActualPosition::new(0.0, 0.02, at(60));

        let forward = analyze(&route, &[start.clone(), middle.clone(), end.clone()], 200.0);
        let swapped = analyze(&route, &[start, end, middle], 200.0);
        assert_eq!(forward, swapped);
        assert_eq!(forward.total_distance_actual, forward.total_distance_planned);
        assert_eq!(forward.conformity_percentage, 100.0);
    }

    #[rstest]
    fn planned_time_needs_both_endpoint_estimates(belo_horizonte: Vec<PlannedRoutePoint>) {
        assert_eq!(planned_minutes(&belo_horizonte), 0.0);

        let mut scheduled = belo_horizonte;
        if let Some(first) = scheduled.first_mut() {
            first.estimated_time = Some(at(0));
        }
        assert_eq!(planned_minutes(&scheduled), 0.0);
        if let Some(last) = scheduled.last_mut() {
            last.estimated_time = Some(at(0) + Duration::minutes(25));
        }
        assert_eq!(planned_minutes(&scheduled), 25.0);
    }

    #[rstest]
    fn delay_is_measured_against_schedule(belo_horizonte: Vec<PlannedRoutePoint>) {
        let mut scheduled = belo_horizonte;
        if let Some(first) = scheduled.first_mut() {
            first.estimated_time = Some(at(0));
        }
        if let Some(last) = scheduled.last_mut() {
            last.estimated_time = Some(at(600));
        }
        let trace = vec![
            ActualPosition::new(-19.916_681, -43.934_493, at(0)).with_speed(5.0),
            ActualPosition::new(-19.918_681, -43.936_493, at(1_080)).with_speed(5.0),
        ];
        let analysis = analyze(&scheduled, &trace, 200.0);
        assert_eq!(analysis.total_time_planned, 10);
        assert_eq!(analysis.total_time_actual, 18);
        assert_eq!(analysis.time_delay_minutes, 8);
    }

    #[rstest]
    fn single_sample_has_no_duration() {
        assert_eq!(actual_minutes(&[ActualPosition::new(0.0, 0.0, at(0))]), 0.0);
    }

    #[rstest]
    fn analyzer_applies_configured_threshold(belo_horizonte: Vec<PlannedRoutePoint>) {
        let trace = vec![ActualPosition::new(-19.920_681, -43.940_493, at(0))];
        let strict = TrajectoryAnalyzer::new(AnalysisConfig::default());
        let lenient =
            TrajectoryAnalyzer::new(AnalysisConfig::default().with_threshold_meters(1_000.0));
        assert_eq!(strict.analyze(&belo_horizonte, &trace).deviations.len(), 1);
        assert!(lenient.analyze(&belo_horizonte, &trace).deviations.is_empty());
        assert_eq!(lenient.config().threshold_meters, 1_000.0);
    }
}
