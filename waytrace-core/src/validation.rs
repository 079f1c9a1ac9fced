//! Opt-in input checks for callers that ingest untrusted data.
//!
//! The analyzer itself accepts anything and lets bad coordinates surface as
//! `NaN`; these helpers let an ingest boundary reject such input up front.

use std::collections::HashSet;

use thiserror::Error;

use crate::{ActualPosition, PlannedRoutePoint};

/// Reasons a route or trace is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputValidationError {
    /// A waypoint lies outside the valid coordinate range or is not finite.
    #[error("waypoint {index} has invalid coordinates ({lat}, {lng})")]
    InvalidWaypoint {
        /// Position of the waypoint in the supplied slice.
        index: usize,
        /// Offending latitude.
        lat: f64,
        /// Offending longitude.
        lng: f64,
    },
    /// Two waypoints share the same `order`.
    #[error("waypoint order {order} is used more than once")]
    DuplicateOrder {
        /// The repeated order value.
        order: i64,
    },
    /// A sample lies outside the valid coordinate range or is not finite.
    #[error("sample {index} has invalid coordinates ({lat}, {lng})")]
    InvalidSample {
        /// Position of the sample in the supplied slice.
        index: usize,
        /// Offending latitude.
        lat: f64,
        /// Offending longitude.
        lng: f64,
    },
    /// A sample reports a negative or non-finite speed.
    #[error("sample {index} has invalid speed {speed}")]
    InvalidSpeed {
        /// Position of the sample in the supplied slice.
        index: usize,
        /// Offending speed in m/s.
        speed: f64,
    },
}

/// Whether `lat`/`lng` are finite and within `[-90, 90]` x `[-180, 180]`.
///
/// # Examples
/// ```
/// use waytrace_core::validation::is_valid_coordinate;
///
/// assert!(is_valid_coordinate(-19.9, -43.9));
/// assert!(!is_valid_coordinate(91.0, 0.0));
/// assert!(!is_valid_coordinate(f64::NAN, 0.0));
/// ```
#[must_use]
pub fn is_valid_coordinate(lat: f64, lng: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}

/// Check every waypoint's coordinates and the uniqueness of `order`.
///
/// # Errors
/// Returns the first problem found, scanning in slice order.
pub fn validate_route(route: &[PlannedRoutePoint]) -> Result<(), InputValidationError> {
    let mut seen = HashSet::with_capacity(route.len());
    for (index, point) in route.iter().enumerate() {
        if !is_valid_coordinate(point.lat, point.lng) {
            return Err(InputValidationError::InvalidWaypoint {
                index,
                lat: point.lat,
                lng: point.lng,
            });
        }
        if !seen.insert(point.order) {
            return Err(InputValidationError::DuplicateOrder { order: point.order });
        }
    }
    Ok(())
}

/// Check every sample's coordinates and speed.
///
/// A missing speed is valid; it is read as stopped during analysis.
///
/// # Errors
/// Returns the first problem found, scanning in slice order.
pub fn validate_positions(samples: &[ActualPosition]) -> Result<(), InputValidationError> {
    for (index, sample) in samples.iter().enumerate() {
        if !is_valid_coordinate(sample.lat, sample.lng) {
            return Err(InputValidationError::InvalidSample {
                index,
                lat: sample.lat,
                lng: sample.lng,
            });
        }
        if let Some(speed) = sample.speed
            && !(speed.is_finite() && speed >= 0.0)
        {
            return Err(InputValidationError::InvalidSpeed { index, speed });
        }
    }
    Ok(())
}
