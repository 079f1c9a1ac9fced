//! Collaborator seams: where routes and traces come from and where analyses
//! go.

use std::fmt;

use thiserror::Error;

use crate::{ActualPosition, PlannedRoutePoint, TrajectoryAnalysis, TrajectoryAnalyzer};

/// Opaque identifier for one vehicle trip.
///
/// # Examples
/// ```
/// use waytrace_core::TripId;
///
/// let trip = TripId::from("bus-42/2024-05-01");
/// assert_eq!(trip.as_str(), "bus-42/2024-05-01");
/// assert_eq!(trip.to_string(), "bus-42/2024-05-01");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct TripId(String);

impl TripId {
    /// Wrap an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TripId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TripId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Errors surfaced by route and position sources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The source has no data for the trip.
    #[error("unknown trip {0}")]
    UnknownTrip(TripId),
    /// The source could not be reached or read.
    #[error("source unavailable: {reason}")]
    Unavailable {
        /// Human-readable cause.
        reason: String,
    },
}

/// Supplies the planned waypoints of a trip.
///
/// Implementations may return points in any order; the analyzer sorts by
/// `order`.
pub trait RouteSource: Send + Sync {
    /// Fetch the planned route for `trip`.
    ///
    /// # Errors
    /// [`SourceError::UnknownTrip`] when no route exists, or
    /// [`SourceError::Unavailable`] when the backing store fails.
    fn planned_route(&self, trip: &TripId) -> Result<Vec<PlannedRoutePoint>, SourceError>;
}

/// Supplies the recorded GPS samples of a trip.
pub trait PositionSource: Send + Sync {
    /// Fetch every recorded sample for `trip`, in any order.
    ///
    /// # Errors
    /// As for [`RouteSource::planned_route`].
    fn positions(&self, trip: &TripId) -> Result<Vec<ActualPosition>, SourceError>;
}

/// Receives finished analyses and streaming snapshots.
///
/// The sink owns alerting policy; the engine only classifies.
pub trait AnalysisSink: Send + Sync {
    /// Deliver an analysis for `trip`.
    fn publish(&self, trip: &TripId, analysis: &TrajectoryAnalysis);
}

/// Fetch a trip's route and trace from their sources and analyse them.
///
/// # Errors
/// Propagates the first [`SourceError`] from either source.
pub fn analyze_trip<R, P>(
    routes: &R,
    positions: &P,
    trip: &TripId,
    analyzer: &TrajectoryAnalyzer,
) -> Result<TrajectoryAnalysis, SourceError>
where
    R: RouteSource + ?Sized,
    P: PositionSource + ?Sized,
{
    let route = routes.planned_route(trip)?;
    let samples = positions.positions(trip)?;
    log::debug!(
        "trip {trip}: {} waypoints, {} samples",
        route.len(),
        samples.len()
    );
    Ok(analyzer.analyze(&route, &samples))
}
