//! Analysis parameters.

use crate::deviation::DEFAULT_THRESHOLD_METERS;

/// Tunables for one [`TrajectoryAnalyzer`](crate::TrajectoryAnalyzer).
///
/// # Examples
/// ```
/// use waytrace_core::AnalysisConfig;
///
/// let config = AnalysisConfig::default().with_threshold_meters(150.0);
/// assert_eq!(config.threshold_meters, 150.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, rename_all = "camelCase")
)]
pub struct AnalysisConfig {
    /// Distance beyond which a sample counts as off-route, in metres.
    pub threshold_meters: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold_meters: DEFAULT_THRESHOLD_METERS,
        }
    }
}

impl AnalysisConfig {
    /// Replace the deviation threshold.
    #[must_use]
    pub const fn with_threshold_meters(mut self, threshold_meters: f64) -> Self {
        self.threshold_meters = threshold_meters;
        self
    }
}
