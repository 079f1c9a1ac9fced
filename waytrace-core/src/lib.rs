//! Core domain types and algorithms for the Waytrace engine.
//!
//! Waytrace compares a vehicle's planned route with its recorded GPS trace.
//! This crate holds the geodesy primitives, the three detectors (deviations,
//! unplanned stops and divergent segments), the batch
//! [`TrajectoryAnalyzer`], and the trait seams for route sources, position
//! sources and analysis sinks. Everything here is synchronous and free of
//! I/O; the `waytrace-stream` crate builds incremental evaluation on top of
//! the same detectors.

#![forbid(unsafe_code)]

pub mod analysis;
pub mod analyzer;
pub mod config;
pub mod deviation;
pub mod divergence;
pub mod geodesy;
pub mod polyline;
pub mod position;
pub mod route;
pub mod source;
pub mod stops;
pub mod validation;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use analysis::{
    ConformityGrade, Deviation, DivergentSegment, Totals, TrajectoryAnalysis, UnplannedStop,
};
pub use analyzer::{TrajectoryAnalyzer, analyze};
pub use config::AnalysisConfig;
pub use deviation::DEFAULT_THRESHOLD_METERS;
pub use polyline::{PolylineError, decode_polyline};
pub use position::ActualPosition;
pub use route::PlannedRoutePoint;
pub use source::{
    AnalysisSink, PositionSource, RouteSource, SourceError, TripId, analyze_trip,
};
pub use validation::{InputValidationError, validate_positions, validate_route};
