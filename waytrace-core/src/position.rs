//! Recorded GPS samples supplied by a position source.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use geo::Coord;

/// Speed below which a vehicle counts as stopped, in metres per second
/// (roughly 5 km/h).
pub const STOPPED_SPEED_MPS: f64 = 1.4;

/// A single timestamped GPS sample.
///
/// `speed` is in metres per second; `None` means the feed did not report one.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use waytrace_core::ActualPosition;
///
/// let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
/// let sample = ActualPosition::new(-19.9, -43.9, at).with_speed(0.5);
/// assert!(sample.is_stopped());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ActualPosition {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Moment the sample was recorded.
    pub timestamp: DateTime<Utc>,
    /// Reported ground speed in m/s.
    #[cfg_attr(feature = "serde", serde(default))]
    pub speed: Option<f64>,
}

impl ActualPosition {
    /// Construct a sample without a speed reading.
    #[must_use]
    pub const fn new(lat: f64, lng: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            lat,
            lng,
            timestamp,
            speed: None,
        }
    }

    /// Attach a speed reading in m/s.
    #[must_use]
    pub const fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// The sample as a `geo` coordinate (`x = lng`, `y = lat`).
    #[must_use]
    pub const fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.lng,
            y: self.lat,
        }
    }

    /// Whether the sample counts as stopped.
    ///
    /// Missing or non-finite speeds are treated as stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.speed
            .is_none_or(|speed| !speed.is_finite() || speed < STOPPED_SPEED_MPS)
    }
}

/// Total order over samples: timestamp first, then position, then speed.
///
/// Samples sharing a timestamp are common in GPS feeds; breaking the tie on
/// content makes the processing order independent of arrival order.
#[must_use]
pub fn sample_order(a: &ActualPosition, b: &ActualPosition) -> Ordering {
    a.timestamp
        .cmp(&b.timestamp)
        .then_with(|| a.lat.total_cmp(&b.lat))
        .then_with(|| a.lng.total_cmp(&b.lng))
        .then_with(|| match (a.speed, b.speed) {
            (Some(left), Some(right)) => left.total_cmp(&right),
            (left, right) => left.is_some().cmp(&right.is_some()),
        })
}

/// Return a copy of `positions` sorted by [`sample_order`].
#[must_use]
pub fn sorted_positions(positions: &[ActualPosition]) -> Vec<ActualPosition> {
    let mut sorted = positions.to_vec();
    sorted.sort_by(sample_order);
    sorted
}
