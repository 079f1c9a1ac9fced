//! Error types emitted by the waytrace CLI.
//!
//! Keep this error type reasonably small, as every CLI helper returns
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use waytrace_core::{InputValidationError, PolylineError};
use waytrace_stream::StreamError;

/// Errors emitted by the waytrace CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name without the leading dashes.
        field: &'static str,
        /// Environment variable that also supplies it.
        env: &'static str,
    },
    /// Two mutually exclusive options were both supplied.
    #[error("--{first} and --{second} cannot be combined")]
    ConflictingArguments {
        /// The first option.
        first: &'static str,
        /// The option it conflicts with.
        second: &'static str,
    },
    /// The deviation threshold is not a positive, finite distance.
    #[error("threshold must be a positive number of metres, got {value}")]
    InvalidThreshold {
        /// The rejected value.
        value: f64,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Which input the path was given for.
        field: &'static str,
        /// The missing path.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Which input the path was given for.
        field: &'static str,
        /// The offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Which input the path was given for.
        field: &'static str,
        /// The path being inspected.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// Opening an input file failed.
    #[error("failed to open {field} at {path:?}: {source}")]
    OpenInput {
        /// Which input was being opened.
        field: &'static str,
        /// The path being opened.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// An input file is not the expected JSON.
    #[error("failed to parse {field} JSON at {path:?}: {source}")]
    ParseInput {
        /// Which input was being parsed.
        field: &'static str,
        /// The path being parsed.
        path: Utf8PathBuf,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// The planned route contains invalid waypoints.
    #[error("planned route failed validation: {0}")]
    InvalidRoute(#[source] InputValidationError),
    /// The position trace contains invalid samples.
    #[error("positions failed validation: {0}")]
    InvalidPositions(#[source] InputValidationError),
    /// The encoded polyline could not be decoded.
    #[error("failed to decode polyline: {0}")]
    DecodePolyline(#[from] PolylineError),
    /// The async runtime for `replay` could not be started.
    #[error("failed to start the replay runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The streaming fleet rejected the replay.
    #[error("replay failed: {0}")]
    Stream(#[from] StreamError),
    /// Serializing the analysis failed.
    #[error("failed to serialize analysis: {0}")]
    SerializeAnalysis(#[source] serde_json::Error),
    /// Writing the analysis failed.
    #[error("failed to write analysis output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
