//! Great-circle distance helpers.
//!
//! All functions take WGS84 coordinates as [`geo::Coord`] with
//! `x = longitude` and `y = latitude`, in degrees, and return metres.
//! They are total: non-finite input propagates as `NaN` rather than failing,
//! so callers wanting strict input should run [`crate::validation`] first.

use geo::Coord;

/// Spherical Earth radius used by every distance calculation, in metres.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Segments shorter than this are measured against their endpoints only.
pub const MIN_SEGMENT_LENGTH_METERS: f64 = 10.0;

/// Haversine distance between two coordinates.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waytrace_core::geodesy::distance;
///
/// let a = Coord { x: 0.0, y: 0.0 };
/// let b = Coord { x: 0.0, y: 1.0 };
/// let metres = distance(a, b);
/// assert!((metres - 111_195.0).abs() < 1.0);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "haversine is inherently floating-point trigonometry"
)]
pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let lat_a = a.y.to_radians();
    let lat_b = b.y.to_radians();
    let half_dlat = (b.y - a.y).to_radians() / 2.0;
    let half_dlng = (b.x - a.x).to_radians() / 2.0;

    let h = half_dlat.sin().powi(2) + lat_a.cos() * lat_b.cos() * half_dlng.sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Total length of a polyline, summing consecutive pairs.
///
/// Empty and single-point inputs have zero length.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waytrace_core::geodesy::polyline_length;
///
/// assert_eq!(polyline_length(std::iter::empty()), 0.0);
/// assert_eq!(polyline_length([Coord { x: 1.0, y: 1.0 }]), 0.0);
/// ```
#[must_use]
pub fn polyline_length<I>(points: I) -> f64
where
    I: IntoIterator<Item = Coord<f64>>,
{
    let mut iter = points.into_iter();
    let Some(mut previous) = iter.next() else {
        return 0.0;
    };
    iter.map(|current| {
        let leg = distance(previous, current);
        previous = current;
        leg
    })
    .sum()
}

/// Approximate distance from `point` to the segment `start`–`end`.
///
/// The triangle's sides are measured with [`distance`] and the law of
/// cosines yields the angle at `start`. When the perpendicular foot falls
/// outside the segment, or the segment is shorter than
/// [`MIN_SEGMENT_LENGTH_METERS`], the nearer endpoint distance is returned.
/// Accurate at the sub-kilometre scale the engine works at.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waytrace_core::geodesy::{distance, distance_to_segment};
///
/// let start = Coord { x: 0.0, y: 0.0 };
/// let end = Coord { x: 0.01, y: 0.0 };
/// let beyond = Coord { x: 0.02, y: 0.0 };
/// assert!((distance_to_segment(beyond, start, end) - distance(beyond, end)).abs() < 1e-6);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "law of cosines over haversine side lengths"
)]
pub fn distance_to_segment(point: Coord<f64>, start: Coord<f64>, end: Coord<f64>) -> f64 {
    let to_start = distance(point, start);
    let to_end = distance(point, end);
    let segment = distance(start, end);
    let nearest_endpoint = to_start.min(to_end);

    if segment < MIN_SEGMENT_LENGTH_METERS {
        return nearest_endpoint;
    }
    if to_start == 0.0 {
        return 0.0;
    }

    let cosine = ((to_start.powi(2) + segment.powi(2) - to_end.powi(2))
        / (2.0 * to_start * segment))
        .clamp(-1.0, 1.0);
    let angle = cosine.acos();
    if angle > std::f64::consts::FRAC_PI_2 || to_start * cosine > segment {
        return nearest_endpoint;
    }
    to_start * angle.sin()
}
