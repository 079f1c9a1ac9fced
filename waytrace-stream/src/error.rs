//! Errors surfaced by the streaming fleet.

use thiserror::Error;
use waytrace_core::TripId;

/// Errors returned by [`Fleet`](crate::Fleet) and
/// [`TripHandle`](crate::TripHandle).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// `start_trip` was called for a trip that is still running.
    #[error("trip {0} is already active")]
    TripAlreadyActive(TripId),
    /// No running trip has this identifier.
    #[error("trip {0} is not active")]
    UnknownTrip(TripId),
    /// The trip's worker has stopped reading samples.
    #[error("trip {0} no longer accepts samples")]
    TripClosed(TripId),
    /// The worker kept panicking and the restart budget ran out.
    #[error("trip worker failed after {restarts} restarts")]
    WorkerFailed {
        /// Restarts attempted before giving up.
        restarts: u32,
    },
}
