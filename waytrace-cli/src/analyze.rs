//! Analyze command implementation for the waytrace CLI.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use waytrace_core::{AnalysisConfig, TrajectoryAnalysis, TrajectoryAnalyzer};

use crate::input::{
    RouteInput, analysis_config, load_positions, require_existing, require_positions, write_json,
};
use crate::{
    ARG_POLYLINE, ARG_POLYLINE_PRECISION, ARG_POSITIONS, ARG_ROUTE, ARG_THRESHOLD_METERS, CliError,
};

/// CLI arguments for the `analyze` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Compare a recorded GPS trace with its planned route and \
                 print the conformity analysis as JSON. Positions are a \
                 JSON array of {lat, lng, timestamp, speed} samples; the \
                 route is a JSON array of planned points or an encoded \
                 polyline.",
    about = "Analyse a recorded trip against its planned route"
)]
#[ortho_config(prefix = "WAYTRACE")]
pub(crate) struct AnalyzeArgs {
    /// Path to a JSON array of recorded positions.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) positions: Option<Utf8PathBuf>,
    /// Path to a JSON array of planned route points.
    #[arg(long = ARG_ROUTE, value_name = "path")]
    #[serde(default)]
    pub(crate) route: Option<Utf8PathBuf>,
    /// Planned route as a Google encoded polyline.
    #[arg(long = ARG_POLYLINE, value_name = "encoded")]
    #[serde(default)]
    pub(crate) polyline: Option<String>,
    /// Decimal precision of `--polyline` (default 5).
    #[arg(long = ARG_POLYLINE_PRECISION, value_name = "digits")]
    #[serde(default)]
    pub(crate) polyline_precision: Option<u32>,
    /// Distance from the route beyond which a sample deviates (default 200).
    #[arg(long = ARG_THRESHOLD_METERS, value_name = "metres")]
    #[serde(default)]
    pub(crate) threshold_meters: Option<f64>,
}

impl AnalyzeArgs {
    pub(crate) fn into_config(self) -> Result<AnalyzeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        AnalyzeConfig::try_from(merged)
    }
}

/// Resolved `analyze` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AnalyzeConfig {
    /// Path to the positions file.
    pub(crate) positions: Utf8PathBuf,
    /// Source of the planned route.
    pub(crate) route: RouteInput,
    /// Detector parameters.
    pub(crate) analysis: AnalysisConfig,
}

impl AnalyzeConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.positions, ARG_POSITIONS)?;
        self.route.validate_sources()
    }
}

impl TryFrom<AnalyzeArgs> for AnalyzeConfig {
    type Error = CliError;

    fn try_from(args: AnalyzeArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            positions: require_positions(args.positions)?,
            route: RouteInput::resolve(args.route, args.polyline, args.polyline_precision)?,
            analysis: analysis_config(args.threshold_meters)?,
        })
    }
}

pub(crate) fn run_analyze_with(args: AnalyzeArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let analysis = execute_analyze(args)?;
    write_json(writer, &analysis)
}

fn execute_analyze(args: AnalyzeArgs) -> Result<TrajectoryAnalysis, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let route = config.route.load()?;
    let positions = load_positions(&config.positions)?;
    Ok(TrajectoryAnalyzer::new(config.analysis).analyze(&route, &positions))
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<AnalyzeConfig, CliError> {
    let merged = AnalyzeArgs::merge_from_layers(layers).map_err(CliError::from)?;
    AnalyzeConfig::try_from(merged)
}
