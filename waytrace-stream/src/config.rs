//! Streaming parameters.

use std::time::Duration;

use waytrace_core::AnalysisConfig;

/// Default bounded-channel capacity per trip.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;
/// Default event-time reorder window.
pub const DEFAULT_REORDER_WINDOW: Duration = Duration::from_secs(5);
/// Default number of segments the cursor inspects before a full scan.
pub const DEFAULT_SEARCH_WINDOW: usize = 8;
/// Default number of worker respawns before a trip is abandoned.
pub const DEFAULT_MAX_RESTARTS: u32 = 3;

/// Tunables shared by every trip in a [`Fleet`](crate::Fleet).
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use waytrace_stream::StreamConfig;
///
/// let config = StreamConfig::default()
///     .with_reorder_window(Duration::from_secs(2))
///     .with_channel_capacity(64);
/// assert_eq!(config.channel_capacity, 64);
/// assert_eq!(config.search_window, 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamConfig {
    /// Threshold used by every detector.
    pub analysis: AnalysisConfig,
    /// Samples queued per trip before pushes are dropped.
    pub channel_capacity: usize,
    /// How far behind the newest sample a sample may arrive and still be
    /// placed in order. Also the idle period after which buffered samples
    /// are flushed.
    pub reorder_window: Duration,
    /// Segments searched ahead of the cursor before falling back to a full
    /// scan.
    pub search_window: usize,
    /// Worker panics tolerated per trip.
    pub max_restarts: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            reorder_window: DEFAULT_REORDER_WINDOW,
            search_window: DEFAULT_SEARCH_WINDOW,
            max_restarts: DEFAULT_MAX_RESTARTS,
        }
    }
}

impl StreamConfig {
    /// Replace the analysis parameters.
    #[must_use]
    pub const fn with_analysis(mut self, analysis: AnalysisConfig) -> Self {
        self.analysis = analysis;
        self
    }

    /// Replace the per-trip channel capacity. Zero is raised to one.
    #[must_use]
    pub const fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = if capacity == 0 { 1 } else { capacity };
        self
    }

    /// Replace the reorder window.
    #[must_use]
    pub const fn with_reorder_window(mut self, window: Duration) -> Self {
        self.reorder_window = window;
        self
    }

    /// Replace the cursor search window.
    #[must_use]
    pub const fn with_search_window(mut self, window: usize) -> Self {
        self.search_window = window;
        self
    }

    /// Replace the restart budget.
    #[must_use]
    pub const fn with_max_restarts(mut self, restarts: u32) -> Self {
        self.max_restarts = restarts;
        self
    }
}
