//! Encoded polyline decoding.
//!
//! Planned routes are often stored in the compact polyline encoding used by
//! common routing services: each coordinate is the zig-zag encoded delta from
//! the previous one, split into 5-bit chunks and offset into printable ASCII.

use thiserror::Error;

use crate::PlannedRoutePoint;

/// Precision of the classic five-decimal encoding.
pub const DEFAULT_PRECISION: u32 = 5;

/// Highest supported number of decimal places.
pub const MAX_PRECISION: u32 = 10;

const CHUNK_OFFSET: u8 = 63;
const CONTINUATION: u64 = 0x20;
const CHUNK_MASK: u64 = 0x1f;

/// Errors returned by [`decode_polyline`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    /// A byte outside the printable range used by the encoding.
    #[error("invalid polyline byte {byte:#04x} at offset {offset}")]
    InvalidByte {
        /// Byte offset into the input.
        offset: usize,
        /// The offending byte.
        byte: u8,
    },
    /// The input ends part-way through a value or between a latitude and
    /// its longitude.
    #[error("polyline ends part-way through a coordinate")]
    Truncated,
    /// A value does not fit in 64 bits.
    #[error("polyline value starting at offset {offset} overflows")]
    Overflow {
        /// Byte offset where the value starts.
        offset: usize,
    },
    /// Requested precision exceeds [`MAX_PRECISION`].
    #[error("unsupported polyline precision {0}")]
    UnsupportedPrecision(u32),
}

/// Decode `encoded` into planned points with `order` equal to their index.
///
/// `precision` is the number of decimal places the encoder used: 5 for the
/// classic format, 6 for several open-source routers. Decoded points carry no
/// estimated times.
///
/// # Errors
/// Fails on bytes outside the encoding alphabet, truncated input, overflowing
/// values or an unsupported precision.
///
/// # Examples
/// ```
/// use waytrace_core::polyline::decode_polyline;
///
/// let route = decode_polyline("_p~iF~ps|U_ulLnnqC", 5).unwrap();
/// assert_eq!(route.len(), 2);
/// assert_eq!((route[0].lat, route[0].lng), (38.5, -120.2));
/// assert_eq!((route[1].order, route[1].lat), (1, 40.7));
/// ```
pub fn decode_polyline(
    encoded: &str,
    precision: u32,
) -> Result<Vec<PlannedRoutePoint>, PolylineError> {
    let exponent = i32::try_from(precision)
        .ok()
        .filter(|_| precision <= MAX_PRECISION)
        .ok_or(PolylineError::UnsupportedPrecision(precision))?;
    let factor = 10_f64.powi(exponent);

    let bytes = encoded.as_bytes();
    let mut cursor = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut points = Vec::new();
    while cursor < bytes.len() {
        let lat_offset = cursor;
        let lat_delta = next_value(bytes, &mut cursor)?;
        if cursor >= bytes.len() {
            return Err(PolylineError::Truncated);
        }
        let lng_offset = cursor;
        let lng_delta = next_value(bytes, &mut cursor)?;
        lat = lat
            .checked_add(lat_delta)
            .ok_or(PolylineError::Overflow { offset: lat_offset })?;
        lng = lng
            .checked_add(lng_delta)
            .ok_or(PolylineError::Overflow { offset: lng_offset })?;
        let order = i64::try_from(points.len())
            .map_err(|_| PolylineError::Overflow { offset: lat_offset })?;
        points.push(PlannedRoutePoint::new(
            scale(lat, factor),
            scale(lng, factor),
            order,
        ));
    }
    log::trace!("decoded {} polyline points", points.len());
    Ok(points)
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "fixed-point coordinates are far below 2^53"
)]
fn scale(value: i64, factor: f64) -> f64 {
    value as f64 / factor
}

fn next_value(bytes: &[u8], cursor: &mut usize) -> Result<i64, PolylineError> {
    let offset = *cursor;
    let mut accumulated: u64 = 0;
    let mut shift: u32 = 0;
    loop {
        let byte = *bytes.get(*cursor).ok_or(PolylineError::Truncated)?;
        let chunk = byte
            .checked_sub(CHUNK_OFFSET)
            .filter(|_| byte <= b'~')
            .map(u64::from)
            .ok_or(PolylineError::InvalidByte {
                offset: *cursor,
                byte,
            })?;
        *cursor += 1;
        if shift > 60 {
            return Err(PolylineError::Overflow { offset });
        }
        accumulated |= (chunk & CHUNK_MASK) << shift;
        shift += 5;
        if chunk < CONTINUATION {
            break;
        }
    }
    let magnitude =
        i64::try_from(accumulated >> 1).map_err(|_| PolylineError::Overflow { offset })?;
    // Zig-zag: the low bit carries the sign.
    Ok(if accumulated & 1 == 1 {
        !magnitude
    } else {
        magnitude
    })
}
