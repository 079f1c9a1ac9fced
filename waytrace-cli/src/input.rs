//! Loading and checking the files a command reads, and writing its output.

use std::io::{BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use serde::Serialize;
use serde::de::DeserializeOwned;
use waytrace_core::{
    ActualPosition, AnalysisConfig, PlannedRoutePoint, decode_polyline, polyline,
    validate_positions, validate_route,
};

use crate::{
    ARG_POLYLINE, ARG_POSITIONS, ARG_ROUTE, ARG_THRESHOLD_METERS, CliError, ENV_POSITIONS,
    ENV_ROUTE,
};

/// Where the planned route comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RouteInput {
    /// A JSON array of planned route points.
    File(Utf8PathBuf),
    /// A Google encoded polyline.
    Polyline {
        /// The encoded string.
        encoded: String,
        /// Decimal digits of coordinate precision.
        precision: u32,
    },
}

impl RouteInput {
    /// Pick exactly one of `--route` and `--polyline`.
    pub(crate) fn resolve(
        route: Option<Utf8PathBuf>,
        encoded: Option<String>,
        precision: Option<u32>,
    ) -> Result<Self, CliError> {
        match (route, encoded) {
            (Some(_), Some(_)) => Err(CliError::ConflictingArguments {
                first: ARG_ROUTE,
                second: ARG_POLYLINE,
            }),
            (Some(path), None) => Ok(Self::File(path)),
            (None, Some(encoded)) => Ok(Self::Polyline {
                encoded,
                precision: precision.unwrap_or(polyline::DEFAULT_PRECISION),
            }),
            (None, None) => Err(CliError::MissingArgument {
                field: ARG_ROUTE,
                env: ENV_ROUTE,
            }),
        }
    }

    /// Check that a route file, if any, exists.
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        match self {
            Self::File(path) => require_existing(path, ARG_ROUTE),
            Self::Polyline { .. } => Ok(()),
        }
    }

    /// Read and validate the planned route.
    pub(crate) fn load(&self) -> Result<Vec<PlannedRoutePoint>, CliError> {
        let route = match self {
            Self::File(path) => load_json(path, ARG_ROUTE)?,
            Self::Polyline { encoded, precision } => decode_polyline(encoded, *precision)?,
        };
        validate_route(&route).map_err(CliError::InvalidRoute)?;
        Ok(route)
    }
}

/// The positions path is required after layering.
pub(crate) fn require_positions(path: Option<Utf8PathBuf>) -> Result<Utf8PathBuf, CliError> {
    path.ok_or(CliError::MissingArgument {
        field: ARG_POSITIONS,
        env: ENV_POSITIONS,
    })
}

/// Build the analysis parameters, rejecting unusable thresholds.
pub(crate) fn analysis_config(threshold_meters: Option<f64>) -> Result<AnalysisConfig, CliError> {
    let config = AnalysisConfig::default();
    let Some(value) = threshold_meters else {
        return Ok(config);
    };
    if value.is_finite() && value > 0.0 {
        Ok(config.with_threshold_meters(value))
    } else {
        log::debug!("rejected --{ARG_THRESHOLD_METERS} {value}");
        Err(CliError::InvalidThreshold { value })
    }
}

/// Confirm `path` names an existing regular file.
pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn file_is_file(path: &Utf8Path) -> std::io::Result<bool> {
    let name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "path has no file name")
    })?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    dir.metadata(name).map(|meta| meta.is_file())
}

/// Decode a JSON document from `path`.
pub(crate) fn load_json<T: DeserializeOwned>(
    path: &Utf8Path,
    field: &'static str,
) -> Result<T, CliError> {
    let file = fs_utf8::File::open_ambient(path, ambient_authority()).map_err(|source| {
        CliError::OpenInput {
            field,
            path: path.to_path_buf(),
            source,
        }
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ParseInput {
        field,
        path: path.to_path_buf(),
        source,
    })
}

/// Read and validate the recorded positions.
pub(crate) fn load_positions(path: &Utf8Path) -> Result<Vec<ActualPosition>, CliError> {
    let positions: Vec<ActualPosition> = load_json(path, ARG_POSITIONS)?;
    validate_positions(&positions).map_err(CliError::InvalidPositions)?;
    log::debug!("loaded {} positions from {path}", positions.len());
    Ok(positions)
}

/// Pretty-print `value` as JSON followed by a newline.
pub(crate) fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerializeAnalysis)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}
