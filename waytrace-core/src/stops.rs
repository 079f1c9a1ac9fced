//! Unplanned stop detection.
//!
//! A stop is a run of consecutive stopped samples (see
//! [`ActualPosition::is_stopped`]) closed by a moving sample. Runs of two
//! minutes or less are discarded. A run still open when the trace ends is
//! never reported: without a moving sample there is no closing time.
//!
//! Every qualifying run is reported as unplanned. Runs are not matched
//! against scheduled stop waypoints, so a long boarding stop at a planned
//! stop point is reported too.

use chrono::{DateTime, Utc};

use crate::analysis::{elapsed_minutes, round_meters};
use crate::{ActualPosition, UnplannedStop};

/// A run must last strictly longer than this to be reported.
pub const MIN_STOP_MILLIS: i64 = 120_000;

#[derive(Debug, Clone, PartialEq)]
struct OpenStop {
    timestamp: DateTime<Utc>,
    lat: f64,
    lng: f64,
}

/// Incremental stop detector holding at most one open run.
///
/// Feed samples in timestamp order.
///
/// # Examples
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use waytrace_core::ActualPosition;
/// use waytrace_core::stops::StopTracker;
///
/// let start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
/// let mut tracker = StopTracker::default();
/// assert!(tracker.observe(&ActualPosition::new(0.0, 0.0, start)).is_none());
/// let moving = ActualPosition::new(0.0, 0.0, start + Duration::minutes(3)).with_speed(8.0);
/// let stop = tracker.observe(&moving).unwrap();
/// assert_eq!(stop.duration_minutes, 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopTracker {
    open: Option<OpenStop>,
}

impl StopTracker {
    /// Feed the next sample, returning a stop when this sample closes one.
    pub fn observe(&mut self, sample: &ActualPosition) -> Option<UnplannedStop> {
        if sample.is_stopped() {
            if self.open.is_none() {
                self.open = Some(OpenStop {
                    timestamp: sample.timestamp,
                    lat: sample.lat,
                    lng: sample.lng,
                });
            }
            return None;
        }

        let run = self.open.take()?;
        let elapsed = (sample.timestamp - run.timestamp).num_milliseconds();
        if elapsed <= MIN_STOP_MILLIS {
            log::trace!("discarding {elapsed} ms stop starting at {}", run.timestamp);
            return None;
        }
        Some(UnplannedStop {
            start_timestamp: run.timestamp,
            lat: run.lat,
            lng: run.lng,
            duration_minutes: round_meters(elapsed_minutes(run.timestamp, sample.timestamp)),
        })
    }

    /// Whether a stopped run is currently open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Drop any open run, returning whether one was open.
    pub fn discard(&mut self) -> bool {
        self.open.take().is_some()
    }
}

/// Detect unplanned stops across a timestamp-ordered trace.
#[must_use]
pub fn detect_unplanned_stops(samples: &[ActualPosition]) -> Vec<UnplannedStop> {
    let mut tracker = StopTracker::default();
    let stops = samples
        .iter()
        .filter_map(|sample| tracker.observe(sample))
        .collect();
    if tracker.is_open() {
        log::debug!("trace ended during a stop; open run not reported");
    }
    stops
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0)
            .single()
            .unwrap_or_default()
    }

    fn stopped(seconds: i64, speed: Option<f64>) -> ActualPosition {
        ActualPosition {
            speed,
            ..ActualPosition::new(-19.9, -43.9, at(seconds))
        }
    }

    fn moving(seconds: i64) -> ActualPosition {
        ActualPosition::new(-19.9, -43.9, at(seconds)).with_speed(10.0)
    }

    #[rstest]
    fn three_minute_stop_is_reported() {
        let samples = vec![
            moving(0),
            stopped(60, Some(0.0)),
            stopped(120, None),
            stopped(240, Some(0.0)),
            moving(240),
        ];
        let stops = detect_unplanned_stops(&samples);
        assert_eq!(stops.len(), 1);
        let stop = stops.first().expect("one stop");
        assert_eq!(stop.duration_minutes, 3);
        assert_eq!(stop.start_timestamp, at(60));
    }

    #[rstest]
    fn one_minute_stop_is_discarded() {
        let samples = vec![stopped(0, Some(0.0)), stopped(60, None), moving(60)];
        assert!(detect_unplanned_stops(&samples).is_empty());
    }

    #[rstest]
    #[case(120, 0)]
    #[case(121, 1)]
    fn exactly_two_minutes_is_not_enough(#[case] seconds: i64, #[case] expected: usize) {
        let samples = vec![stopped(0, None), moving(seconds)];
        assert_eq!(detect_unplanned_stops(&samples).len(), expected);
    }

    #[rstest]
    fn open_run_at_end_is_not_reported() {
        let samples = vec![moving(0), stopped(10, None), stopped(600, None)];
        assert!(detect_unplanned_stops(&samples).is_empty());
    }

    #[rstest]
    fn separate_runs_are_reported_separately() {
        let samples = vec![
            stopped(0, None),
            moving(180),
            stopped(300, Some(0.2)),
            moving(300 + Duration::minutes(10).num_seconds()),
        ];
        let durations: Vec<u64> = detect_unplanned_stops(&samples)
            .iter()
            .map(|stop| stop.duration_minutes)
            .collect();
        assert_eq!(durations, vec![3, 10]);
    }

    #[rstest]
    fn discard_clears_open_run() {
        let mut tracker = StopTracker::default();
        assert!(tracker.observe(&stopped(0, None)).is_none());
        assert!(tracker.discard());
        assert!(!tracker.is_open());
        assert!(tracker.observe(&moving(600)).is_none());
    }
}
