//! Incremental per-trip analysis state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use waytrace_core::analysis::{Totals, elapsed_minutes};
use waytrace_core::analyzer::planned_minutes;
use waytrace_core::deviation::classify_sample;
use waytrace_core::divergence::{ClosedRun, DivergenceTracker};
use waytrace_core::geodesy::{distance, polyline_length};
use waytrace_core::route::sorted_route;
use waytrace_core::stops::StopTracker;
use waytrace_core::{
    ActualPosition, AnalysisConfig, Deviation, PlannedRoutePoint, TrajectoryAnalysis,
    UnplannedStop,
};

use crate::cursor::SegmentCursor;

/// Everything a worker knows about one trip.
///
/// Feeding samples in timestamp order and taking a [`snapshot`] yields the
/// same analysis as the batch analyzer over those samples. Cloning is the
/// checkpoint mechanism.
///
/// [`snapshot`]: TripState::snapshot
#[derive(Debug, Clone)]
pub struct TripState {
    route: Arc<[PlannedRoutePoint]>,
    threshold: f64,
    planned_distance: f64,
    planned_minutes: f64,
    cursor: SegmentCursor,
    sample_count: usize,
    first_timestamp: Option<DateTime<Utc>>,
    last: Option<ActualPosition>,
    actual_distance: f64,
    stops: StopTracker,
    divergence: DivergenceTracker,
    deviations: Vec<Deviation>,
    unplanned_stops: Vec<UnplannedStop>,
    closed_runs: Vec<ClosedRun>,
}

impl TripState {
    /// Start a trip against `planned`, which need not be sorted.
    #[must_use]
    pub fn new(
        planned: &[PlannedRoutePoint],
        analysis: AnalysisConfig,
        search_window: usize,
    ) -> Self {
        let route: Arc<[PlannedRoutePoint]> = sorted_route(planned).into();
        Self {
            planned_distance: polyline_length(route.iter().map(PlannedRoutePoint::coord)),
            planned_minutes: planned_minutes(&route),
            route,
            threshold: analysis.threshold_meters,
            cursor: SegmentCursor::new(search_window),
            sample_count: 0,
            first_timestamp: None,
            last: None,
            actual_distance: 0.0,
            stops: StopTracker::default(),
            divergence: DivergenceTracker::default(),
            deviations: Vec::new(),
            unplanned_stops: Vec::new(),
            closed_runs: Vec::new(),
        }
    }

    /// Apply the next sample in timestamp order.
    ///
    /// Returns whether locating the sample needed a full segment scan.
    #[expect(clippy::float_arithmetic, reason = "running polyline length")]
    pub fn observe(&mut self, sample: &ActualPosition) -> bool {
        let point = sample.coord();
        let lookup = self.cursor.locate(point, &self.route, self.threshold);

        if let Some(deviation) = classify_sample(sample, lookup.hit, self.threshold) {
            self.deviations.push(deviation);
        }
        let off_corridor = lookup.hit.is_some_and(|hit| hit.exceeds(self.threshold));
        if let Some(run) = self.divergence.observe(self.sample_count, point, off_corridor) {
            self.closed_runs.push(run);
        }
        if let Some(stop) = self.stops.observe(sample) {
            self.unplanned_stops.push(stop);
        }

        if let Some(previous) = &self.last {
            self.actual_distance += distance(previous.coord(), point);
        }
        self.first_timestamp.get_or_insert(sample.timestamp);
        self.last = Some(sample.clone());
        self.sample_count += 1;
        lookup.full_scan
    }

    /// Samples applied so far.
    #[must_use]
    pub const fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Timestamp of the most recent sample.
    #[must_use]
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.last.as_ref().map(|sample| sample.timestamp)
    }

    /// Drop any open stop run. Trips that end mid-stop never report it.
    pub fn discard_open_stop(&mut self) -> bool {
        self.stops.discard()
    }

    /// The analysis over every sample applied so far.
    ///
    /// Open stop and divergence runs are not included, matching the batch
    /// analyzer at the end of a trace.
    #[must_use]
    pub fn snapshot(&self) -> TrajectoryAnalysis {
        let actual_minutes = match (self.first_timestamp, self.last_timestamp()) {
            (Some(first), Some(last)) if self.sample_count >= 2 => elapsed_minutes(first, last),
            _ => 0.0,
        };
        let totals = Totals {
            planned_distance: self.planned_distance,
            actual_distance: self.actual_distance,
            planned_minutes: self.planned_minutes,
            actual_minutes,
        };
        let divergent_segments = self
            .closed_runs
            .iter()
            .filter_map(|run| run.resolve(&self.route, self.sample_count))
            .collect();
        TrajectoryAnalysis::from_parts(
            totals,
            self.deviations.clone(),
            self.unplanned_stops.clone(),
            divergent_segments,
        )
    }
}
