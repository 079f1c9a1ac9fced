//! Planned routes: ordered waypoints supplied by a route source.

use chrono::{DateTime, Utc};
use geo::Coord;

/// A waypoint on the planned route.
///
/// `order` defines the traversal sequence. Values are unique within a route
/// but need not be contiguous.
///
/// # Examples
/// ```
/// use waytrace_core::PlannedRoutePoint;
///
/// let point = PlannedRoutePoint::new(-19.916_681, -43.934_493, 1);
/// assert_eq!(point.order, 1);
/// assert!(point.estimated_time.is_none());
/// assert_eq!(point.coord().y, -19.916_681);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PlannedRoutePoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Position of the waypoint in the traversal sequence.
    pub order: i64,
    /// Estimated arrival time at this waypoint, if scheduled.
    #[cfg_attr(feature = "serde", serde(default, alias = "estimated_time"))]
    pub estimated_time: Option<DateTime<Utc>>,
}

impl PlannedRoutePoint {
    /// Construct an unscheduled waypoint.
    #[must_use]
    pub const fn new(lat: f64, lng: f64, order: i64) -> Self {
        Self {
            lat,
            lng,
            order,
            estimated_time: None,
        }
    }

    /// Attach an estimated arrival time.
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use waytrace_core::PlannedRoutePoint;
    ///
    /// let eta = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
    /// let point = PlannedRoutePoint::new(0.0, 0.0, 1).with_estimated_time(eta);
    /// assert_eq!(point.estimated_time, Some(eta));
    /// ```
    #[must_use]
    pub const fn with_estimated_time(mut self, estimated_time: DateTime<Utc>) -> Self {
        self.estimated_time = Some(estimated_time);
        self
    }

    /// The waypoint as a `geo` coordinate (`x = lng`, `y = lat`).
    #[must_use]
    pub const fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.lng,
            y: self.lat,
        }
    }
}

/// Return a copy of `route` sorted by `order`.
///
/// The caller's slice is left untouched.
#[must_use]
pub fn sorted_route(route: &[PlannedRoutePoint]) -> Vec<PlannedRoutePoint> {
    let mut sorted = route.to_vec();
    sorted.sort_by_key(|point| point.order);
    sorted
}

/// Number of segments (consecutive waypoint pairs) in a route.
#[must_use]
pub const fn segment_count(route: &[PlannedRoutePoint]) -> usize {
    route.len().saturating_sub(1)
}
