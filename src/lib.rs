//! Facade crate for the waytrace trajectory analysis engine.
//!
//! This crate re-exports the core analysis types and, behind the `stream`
//! feature, the streaming fleet.

#![forbid(unsafe_code)]

pub use waytrace_core::{
    ActualPosition, AnalysisConfig, AnalysisSink, ConformityGrade, DEFAULT_THRESHOLD_METERS,
    Deviation, DivergentSegment, InputValidationError, PlannedRoutePoint, PolylineError,
    PositionSource, RouteSource, SourceError, TrajectoryAnalysis, TrajectoryAnalyzer, TripId,
    UnplannedStop, analyze, analyze_trip, decode_polyline, validate_positions, validate_route,
};

#[cfg(feature = "test-support")]
pub use waytrace_core::test_support;

#[cfg(feature = "stream")]
pub use waytrace_stream::{
    Fleet, MetricsSummary, PushOutcome, StreamConfig, StreamError, StreamMetrics, TripHandle,
    TripState,
};
