//! Incremental, per-trip trajectory analysis on Tokio.
//!
//! A [`Fleet`] runs one supervised worker per active trip. Samples are pushed
//! without blocking, reordered within an event-time window, located with a
//! monotonic [`SegmentCursor`](cursor::SegmentCursor), and folded into a
//! [`TripState`]. Every processed batch publishes an immutable
//! `TrajectoryAnalysis` snapshot equal to the batch analyzer's result over
//! the samples accepted so far.

#![forbid(unsafe_code)]

pub mod config;
pub mod cursor;
pub mod error;
pub mod fleet;
pub mod metrics;
pub mod reorder;
pub mod state;
pub mod worker;

pub use config::StreamConfig;
pub use error::StreamError;
pub use fleet::Fleet;
pub use metrics::{MetricsSummary, StreamMetrics};
pub use state::TripState;
pub use worker::{PushOutcome, TripHandle};
