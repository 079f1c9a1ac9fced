//! Fleet-wide counters.
//!
//! Cheap to clone: every clone shares the same atomics, so workers update
//! them without locking and callers read a consistent-enough snapshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

/// Shared streaming counters.
#[derive(Debug, Clone)]
pub struct StreamMetrics {
    /// Samples admitted to a reorder buffer.
    pub accepted_samples: Arc<AtomicU64>,
    /// Samples at or behind the watermark when they arrived.
    pub late_samples: Arc<AtomicU64>,
    /// Samples rejected because a trip's channel was full.
    pub dropped_samples: Arc<AtomicU64>,
    /// Cursor misses that required a scan of every segment.
    pub full_scans: Arc<AtomicU64>,
    /// Worker respawns after a panic.
    pub worker_restarts: Arc<AtomicU64>,
    /// Snapshots published across all trips.
    pub snapshots_published: Arc<AtomicU64>,
    /// When the counters were created.
    pub started_at: Instant,
}

impl Default for StreamMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamMetrics {
    /// Zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accepted_samples: Arc::new(AtomicU64::new(0)),
            late_samples: Arc::new(AtomicU64::new(0)),
            dropped_samples: Arc::new(AtomicU64::new(0)),
            full_scans: Arc::new(AtomicU64::new(0)),
            worker_restarts: Arc::new(AtomicU64::new(0)),
            snapshots_published: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    /// Increment one counter.
    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter.
    #[must_use]
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            accepted_samples: self.accepted_samples.load(Ordering::Relaxed),
            late_samples: self.late_samples.load(Ordering::Relaxed),
            dropped_samples: self.dropped_samples.load(Ordering::Relaxed),
            full_scans: self.full_scans.load(Ordering::Relaxed),
            worker_restarts: self.worker_restarts.load(Ordering::Relaxed),
            snapshots_published: self.snapshots_published.load(Ordering::Relaxed),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

/// Point-in-time copy of [`StreamMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    /// See [`StreamMetrics::accepted_samples`].
    pub accepted_samples: u64,
    /// See [`StreamMetrics::late_samples`].
    pub late_samples: u64,
    /// See [`StreamMetrics::dropped_samples`].
    pub dropped_samples: u64,
    /// See [`StreamMetrics::full_scans`].
    pub full_scans: u64,
    /// See [`StreamMetrics::worker_restarts`].
    pub worker_restarts: u64,
    /// See [`StreamMetrics::snapshots_published`].
    pub snapshots_published: u64,
    /// Seconds since the counters were created.
    pub elapsed_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn clones_share_counters() {
        let metrics = StreamMetrics::new();
        let worker_view = metrics.clone();
        worker_view.inc(&worker_view.late_samples);
        worker_view.inc(&worker_view.late_samples);
        metrics.inc(&metrics.dropped_samples);
        let summary = metrics.summary();
        assert_eq!(summary.late_samples, 2);
        assert_eq!(summary.dropped_samples, 1);
        assert_eq!(summary.accepted_samples, 0);
    }
}
