//! In-memory sources and a recording sink for unit and behaviour tests.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

use crate::{
    ActualPosition, AnalysisSink, PlannedRoutePoint, PositionSource, RouteSource, SourceError,
    TrajectoryAnalysis, TripId,
};

/// `RouteSource` backed by a map of trips.
#[derive(Debug, Default, Clone)]
pub struct MemoryRouteSource {
    routes: HashMap<TripId, Vec<PlannedRoutePoint>>,
}

impl MemoryRouteSource {
    /// Register the planned route for `trip`.
    #[must_use]
    pub fn with_route(mut self, trip: TripId, route: Vec<PlannedRoutePoint>) -> Self {
        self.routes.insert(trip, route);
        self
    }
}

impl RouteSource for MemoryRouteSource {
    fn planned_route(&self, trip: &TripId) -> Result<Vec<PlannedRoutePoint>, SourceError> {
        self.routes
            .get(trip)
            .cloned()
            .ok_or_else(|| SourceError::UnknownTrip(trip.clone()))
    }
}

/// `PositionSource` backed by a map of trips.
#[derive(Debug, Default, Clone)]
pub struct MemoryPositionSource {
    positions: HashMap<TripId, Vec<ActualPosition>>,
}

impl MemoryPositionSource {
    /// Register the recorded samples for `trip`.
    #[must_use]
    pub fn with_positions(mut self, trip: TripId, positions: Vec<ActualPosition>) -> Self {
        self.positions.insert(trip, positions);
        self
    }
}

impl PositionSource for MemoryPositionSource {
    fn positions(&self, trip: &TripId) -> Result<Vec<ActualPosition>, SourceError> {
        self.positions
            .get(trip)
            .cloned()
            .ok_or_else(|| SourceError::UnknownTrip(trip.clone()))
    }
}

/// `AnalysisSink` that keeps every published analysis in arrival order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    published: Mutex<Vec<(TripId, TrajectoryAnalysis)>>,
}

impl RecordingSink {
    /// Everything published so far.
    #[must_use]
    pub fn published(&self) -> Vec<(TripId, TrajectoryAnalysis)> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent analysis published for `trip`.
    #[must_use]
    pub fn latest(&self, trip: &TripId) -> Option<TrajectoryAnalysis> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|(id, _)| id == trip)
            .map(|(_, analysis)| analysis.clone())
    }
}

impl AnalysisSink for RecordingSink {
    fn publish(&self, trip: &TripId, analysis: &TrajectoryAnalysis) {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((trip.clone(), analysis.clone()));
    }
}

/// One sample per waypoint, `interval` apart from `start`, all at `speed`.
#[must_use]
pub fn retrace(
    route: &[PlannedRoutePoint],
    start: DateTime<Utc>,
    interval: Duration,
    speed: f64,
) -> Vec<ActualPosition> {
    let mut at = start;
    route
        .iter()
        .map(|point| {
            let sample = ActualPosition::new(point.lat, point.lng, at).with_speed(speed);
            at += interval;
            sample
        })
        .collect()
}
