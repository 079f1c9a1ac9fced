//! Analysis results handed to the alerting/presentation sink.
//!
//! Every type here is a plain value: produced once per analysis (or per
//! streaming snapshot) and never mutated afterwards. With the `serde` feature
//! the JSON field names follow the shape consumers already expect
//! (`conformityPercentage`, `extraDistance`, `timeDelay`, ...).

use chrono::{DateTime, Utc};

/// A sample farther than the threshold from its nearest planned segment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct Deviation {
    /// When the sample was recorded.
    pub timestamp: DateTime<Utc>,
    /// Sample latitude.
    pub lat: f64,
    /// Sample longitude.
    pub lng: f64,
    /// Distance to the nearest planned segment, rounded to metres.
    #[cfg_attr(feature = "serde", serde(rename = "distance"))]
    pub distance_meters: u64,
    /// Index of the nearest planned segment (`route[i]`–`route[i + 1]`).
    pub segment_index: usize,
}

/// A sustained low-speed interval longer than two minutes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct UnplannedStop {
    /// Timestamp of the first stopped sample.
    #[cfg_attr(feature = "serde", serde(rename = "timestamp"))]
    pub start_timestamp: DateTime<Utc>,
    /// Latitude of the first stopped sample.
    pub lat: f64,
    /// Longitude of the first stopped sample.
    pub lng: f64,
    /// Stop length, rounded to whole minutes.
    #[cfg_attr(feature = "serde", serde(rename = "duration"))]
    pub duration_minutes: u64,
}

/// A contiguous off-corridor excursion compared with the planned span it
/// replaced.
///
/// `deviation_meters` is signed: a detour shorter than the skipped planned
/// span yields a negative value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct DivergentSegment {
    /// First planned point of the corresponding planned span.
    #[cfg_attr(feature = "serde", serde(rename = "startIndex"))]
    pub planned_start_index: usize,
    /// Last planned point of the corresponding planned span.
    #[cfg_attr(feature = "serde", serde(rename = "endIndex"))]
    pub planned_end_index: usize,
    /// Length of the planned span, rounded to metres.
    #[cfg_attr(feature = "serde", serde(rename = "plannedDistance"))]
    pub planned_distance_meters: u64,
    /// Length travelled during the excursion, rounded to metres.
    #[cfg_attr(feature = "serde", serde(rename = "actualDistance"))]
    pub actual_distance_meters: u64,
    /// `actual - planned`, rounded to metres.
    #[cfg_attr(feature = "serde", serde(rename = "deviation"))]
    pub deviation_meters: i64,
}

/// Coarse conformity band.
///
/// Classification only; the sink decides what, if anything, to alert on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum ConformityGrade {
    /// At least 90 %.
    Good,
    /// At least 70 %.
    Fair,
    /// Below 70 %, or not a number.
    Poor,
}

impl ConformityGrade {
    /// Classify a conformity percentage.
    ///
    /// # Examples
    /// ```
    /// use waytrace_core::ConformityGrade;
    ///
    /// assert_eq!(ConformityGrade::from_percentage(95.0), ConformityGrade::Good);
    /// assert_eq!(ConformityGrade::from_percentage(70.0), ConformityGrade::Fair);
    /// assert_eq!(ConformityGrade::from_percentage(12.5), ConformityGrade::Poor);
    /// ```
    #[must_use]
    pub const fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            Self::Good
        } else if percentage >= 70.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

/// Unrounded totals feeding [`TrajectoryAnalysis::from_parts`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    /// Planned route length in metres.
    pub planned_distance: f64,
    /// Travelled length in metres.
    pub actual_distance: f64,
    /// Planned duration in minutes.
    pub planned_minutes: f64,
    /// Observed duration in minutes.
    pub actual_minutes: f64,
}

/// Conformity of one trip against its planned route.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct TrajectoryAnalysis {
    /// Planned route length in metres.
    pub total_distance_planned: u64,
    /// Travelled length in metres.
    pub total_distance_actual: u64,
    /// Planned duration in minutes; zero without estimated times.
    pub total_time_planned: i64,
    /// Observed duration in minutes.
    pub total_time_actual: i64,
    /// Score in `[0, 100]`, one decimal place.
    pub conformity_percentage: f64,
    /// Metres travelled beyond the planned length.
    #[cfg_attr(feature = "serde", serde(rename = "extraDistance"))]
    pub extra_distance_meters: u64,
    /// Minutes beyond the planned duration.
    #[cfg_attr(feature = "serde", serde(rename = "timeDelay"))]
    pub time_delay_minutes: u64,
    /// Samples beyond the threshold from their nearest segment.
    pub deviations: Vec<Deviation>,
    /// Sustained low-speed intervals.
    pub unplanned_stops: Vec<UnplannedStop>,
    /// Off-corridor excursions.
    pub divergent_segments: Vec<DivergentSegment>,
}

impl Default for TrajectoryAnalysis {
    fn default() -> Self {
        Self::from_parts(Totals::default(), Vec::new(), Vec::new(), Vec::new())
    }
}

impl TrajectoryAnalysis {
    /// Assemble an analysis from unrounded totals and detected events.
    ///
    /// Distances and times are rounded to integers, conformity to one decimal.
    ///
    /// # Examples
    /// ```
    /// use waytrace_core::{Totals, TrajectoryAnalysis};
    ///
    /// let totals = Totals {
    ///     planned_distance: 1_000.0,
    ///     actual_distance: 1_250.4,
    ///     planned_minutes: 10.0,
    ///     actual_minutes: 12.6,
    /// };
    /// let analysis = TrajectoryAnalysis::from_parts(totals, vec![], vec![], vec![]);
    /// assert_eq!(analysis.conformity_percentage, 75.0);
    /// assert_eq!(analysis.extra_distance_meters, 250);
    /// assert_eq!(analysis.time_delay_minutes, 3);
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "extra distance and delay are differences of float totals"
    )]
    pub fn from_parts(
        totals: Totals,
        deviations: Vec<Deviation>,
        unplanned_stops: Vec<UnplannedStop>,
        divergent_segments: Vec<DivergentSegment>,
    ) -> Self {
        let extra = (totals.actual_distance - totals.planned_distance).max(0.0);
        let delay = (totals.actual_minutes - totals.planned_minutes).max(0.0);
        Self {
            total_distance_planned: round_meters(totals.planned_distance),
            total_distance_actual: round_meters(totals.actual_distance),
            total_time_planned: round_signed(totals.planned_minutes),
            total_time_actual: round_signed(totals.actual_minutes),
            conformity_percentage: round_one_decimal(conformity_percentage(
                totals.planned_distance,
                totals.actual_distance,
            )),
            extra_distance_meters: round_meters(extra),
            time_delay_minutes: round_meters(delay),
            deviations,
            unplanned_stops,
            divergent_segments,
        }
    }

    /// Conformity band for this analysis.
    #[must_use]
    pub fn grade(&self) -> ConformityGrade {
        ConformityGrade::from_percentage(self.conformity_percentage)
    }
}

/// Unrounded conformity score in `[0, 100]`.
///
/// Without a planned distance there is nothing to deviate from, so the score
/// is 100.
#[must_use]
#[expect(clippy::float_arithmetic, reason = "ratio of float distances")]
pub fn conformity_percentage(planned: f64, actual: f64) -> f64 {
    if planned > 0.0 {
        (100.0 * (1.0 - (actual - planned) / planned)).clamp(0.0, 100.0)
    } else {
        100.0
    }
}

/// Round a non-negative metre or minute value. `NaN` and negatives map to 0.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "float-to-int casts saturate; NaN becomes 0"
)]
pub(crate) fn round_meters(value: f64) -> u64 {
    value.round() as u64
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "float-to-int casts saturate; NaN becomes 0"
)]
pub(crate) fn round_signed(value: f64) -> i64 {
    value.round() as i64
}

#[expect(clippy::float_arithmetic, reason = "decimal rounding")]
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Minutes elapsed between two instants, negative when `end` precedes `start`.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "millisecond spans comfortably fit an f64 mantissa"
)]
pub fn elapsed_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 60_000.0
}
