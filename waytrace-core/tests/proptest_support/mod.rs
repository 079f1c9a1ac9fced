//! Strategies shared by the analyzer property tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use waytrace_core::{ActualPosition, PlannedRoutePoint};

/// Fixed trace origin so failures replay deterministically.
pub fn origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0)
        .single()
        .expect("valid origin")
}

/// A coordinate within roughly 5 km of central Belo Horizonte.
pub fn coordinate() -> impl Strategy<Value = (f64, f64)> {
    (-19.96_f64..-19.87, -43.98_f64..-43.89)
}

/// A planned route of `min..=max` points with `order` equal to the index.
pub fn route_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<PlannedRoutePoint>> {
    prop::collection::vec(coordinate(), min..=max).prop_map(|coords| {
        coords
            .into_iter()
            .zip(0_i64..)
            .map(|((lat, lng), order)| PlannedRoutePoint::new(lat, lng, order))
            .collect()
    })
}

/// A timestamp-ordered trace with strictly increasing timestamps.
///
/// Speeds mix missing, stopped and moving readings so every detector sees
/// work.
pub fn trace_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<ActualPosition>> {
    let sample = (
        coordinate(),
        1_i64..=240,
        prop_oneof![Just(None), (0.0_f64..1.4).prop_map(Some), (1.4_f64..25.0).prop_map(Some)],
    );
    prop::collection::vec(sample, min..=max).prop_map(|samples| {
        let mut at = origin();
        samples
            .into_iter()
            .map(|((lat, lng), step, speed)| {
                at += Duration::seconds(step);
                ActualPosition {
                    speed,
                    ..ActualPosition::new(lat, lng, at)
                }
            })
            .collect()
    })
}

/// A trace whose samples often share a timestamp, as bursty feeds do.
pub fn clustered_trace_strategy(
    min: usize,
    max: usize,
) -> impl Strategy<Value = Vec<ActualPosition>> {
    let sample = (
        coordinate(),
        0_i64..=2,
        prop_oneof![Just(None), (0.0_f64..25.0).prop_map(Some)],
    );
    prop::collection::vec(sample, min..=max).prop_map(|samples| {
        let mut at = origin();
        samples
            .into_iter()
            .map(|((lat, lng), step, speed)| {
                at += Duration::seconds(step * 30);
                ActualPosition {
                    speed,
                    ..ActualPosition::new(lat, lng, at)
                }
            })
            .collect()
    })
}
