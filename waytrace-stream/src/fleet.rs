//! Registry of running trips.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use waytrace_core::{
    ActualPosition, AnalysisSink, PlannedRoutePoint, TrajectoryAnalysis, TripId,
};

use crate::{MetricsSummary, PushOutcome, StreamConfig, StreamError, StreamMetrics, TripHandle};

/// Owns one [`TripHandle`] per active trip and the counters they share.
///
/// # Examples
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use waytrace_core::{ActualPosition, PlannedRoutePoint, TripId};
/// use waytrace_stream::{Fleet, StreamConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), waytrace_stream::StreamError> {
/// let trip = TripId::from("bus-42");
/// let route = vec![
///     PlannedRoutePoint::new(0.0, 0.0, 1),
///     PlannedRoutePoint::new(0.0, 0.01, 2),
/// ];
/// let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
///
/// let mut fleet = Fleet::new(StreamConfig::default());
/// fleet.start_trip(trip.clone(), &route)?;
/// fleet.push(&trip, ActualPosition::new(0.0, 0.0, t0).with_speed(9.0))?;
/// let later = t0 + Duration::minutes(2);
/// fleet.push(&trip, ActualPosition::new(0.0, 0.01, later).with_speed(9.0))?;
/// let analysis = fleet.finish(&trip).await?;
/// assert_eq!(analysis.conformity_percentage, 100.0);
/// assert_eq!(fleet.metrics().accepted_samples, 2);
/// # Ok(())
/// # }
/// ```
pub struct Fleet {
    config: StreamConfig,
    sink: Option<Arc<dyn AnalysisSink>>,
    metrics: StreamMetrics,
    trips: HashMap<TripId, TripHandle>,
}

impl fmt::Debug for Fleet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fleet")
            .field("config", &self.config)
            .field("has_sink", &self.sink.is_some())
            .field("trips", &self.trips.len())
            .finish_non_exhaustive()
    }
}

impl Fleet {
    /// An empty fleet without a sink.
    #[must_use]
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            sink: None,
            metrics: StreamMetrics::new(),
            trips: HashMap::new(),
        }
    }

    /// Forward every snapshot to `sink`. Applies to trips started afterwards.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn AnalysisSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Begin tracking `trip` against `planned`.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// [`StreamError::TripAlreadyActive`] if the trip is running.
    pub fn start_trip(
        &mut self,
        trip: TripId,
        planned: &[PlannedRoutePoint],
    ) -> Result<(), StreamError> {
        if self.trips.contains_key(&trip) {
            return Err(StreamError::TripAlreadyActive(trip));
        }
        let handle = TripHandle::spawn(
            trip.clone(),
            planned,
            &self.config,
            self.sink.clone(),
            self.metrics.clone(),
        );
        self.trips.insert(trip, handle);
        Ok(())
    }

    fn handle(&self, trip: &TripId) -> Result<&TripHandle, StreamError> {
        self.trips
            .get(trip)
            .ok_or_else(|| StreamError::UnknownTrip(trip.clone()))
    }

    /// Queue a sample for `trip` without waiting.
    ///
    /// # Errors
    /// [`StreamError::UnknownTrip`] or [`StreamError::TripClosed`].
    pub fn push(
        &self,
        trip: &TripId,
        sample: ActualPosition,
    ) -> Result<PushOutcome, StreamError> {
        self.handle(trip)?.push(sample)
    }

    /// Queue a sample for `trip`, waiting while its channel is full.
    ///
    /// # Errors
    /// [`StreamError::UnknownTrip`] or [`StreamError::TripClosed`].
    pub async fn send(&self, trip: &TripId, sample: ActualPosition) -> Result<(), StreamError> {
        self.handle(trip)?.send(sample).await
    }

    /// The latest snapshot for `trip`.
    ///
    /// # Errors
    /// [`StreamError::UnknownTrip`].
    pub fn latest(&self, trip: &TripId) -> Result<Arc<TrajectoryAnalysis>, StreamError> {
        self.handle(trip).map(TripHandle::latest)
    }

    /// Watch snapshots for `trip`.
    ///
    /// # Errors
    /// [`StreamError::UnknownTrip`].
    pub fn subscribe(
        &self,
        trip: &TripId,
    ) -> Result<watch::Receiver<Arc<TrajectoryAnalysis>>, StreamError> {
        self.handle(trip).map(TripHandle::subscribe)
    }

    /// Close `trip`, drain its queue and return the final analysis.
    ///
    /// # Errors
    /// [`StreamError::UnknownTrip`] or [`StreamError::WorkerFailed`].
    pub async fn finish(&mut self, trip: &TripId) -> Result<Arc<TrajectoryAnalysis>, StreamError> {
        let handle = self
            .trips
            .remove(trip)
            .ok_or_else(|| StreamError::UnknownTrip(trip.clone()))?;
        handle.finish().await
    }

    /// Stop `trip` without draining its queue and return the final analysis.
    ///
    /// # Errors
    /// As for [`finish`](Self::finish).
    pub async fn cancel(&mut self, trip: &TripId) -> Result<Arc<TrajectoryAnalysis>, StreamError> {
        let handle = self
            .trips
            .remove(trip)
            .ok_or_else(|| StreamError::UnknownTrip(trip.clone()))?;
        handle.cancel().await
    }

    /// Identifiers of running trips, sorted.
    #[must_use]
    pub fn active_trips(&self) -> Vec<TripId> {
        let mut trips: Vec<TripId> = self.trips.keys().cloned().collect();
        trips.sort();
        trips
    }

    /// Current counter values across all trips.
    #[must_use]
    pub fn metrics(&self) -> MetricsSummary {
        self.metrics.summary()
    }
}
