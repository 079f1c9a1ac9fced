//! Replay command: feed a recorded trace through the streaming fleet.
//!
//! Samples are sent in file order, so the result shows what a live
//! deployment would have reported, including samples that arrive too late
//! for the reorder window.

use std::io::Write;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use waytrace_core::{ActualPosition, PlannedRoutePoint, TrajectoryAnalysis, TripId};
use waytrace_stream::{Fleet, MetricsSummary, StreamConfig, StreamError};

use crate::input::{
    RouteInput, analysis_config, load_positions, require_existing, require_positions, write_json,
};
use crate::{
    ARG_CHANNEL_CAPACITY, ARG_POLYLINE, ARG_POLYLINE_PRECISION, ARG_POSITIONS,
    ARG_REORDER_WINDOW_SECS, ARG_ROUTE, ARG_THRESHOLD_METERS, CliError,
};

/// CLI arguments for the `replay` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Stream a recorded GPS trace through the live analysis \
                 pipeline in file order and print the final analysis as \
                 JSON. Out-of-order samples are reordered within the \
                 reorder window; older ones are counted and skipped.",
    about = "Replay a recorded trip through the streaming pipeline"
)]
#[ortho_config(prefix = "WAYTRACE")]
pub(crate) struct ReplayArgs {
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
    /// Event-time reorder window in seconds (default 5).
    #[arg(long = ARG_REORDER_WINDOW_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) reorder_window_secs: Option<u64>,
    /// Samples queued per trip (default 256).
    #[arg(long = ARG_CHANNEL_CAPACITY, value_name = "samples")]
    #[serde(default)]
    pub(crate) channel_capacity: Option<usize>,
}

impl ReplayArgs {
    pub(crate) fn into_config(self) -> Result<ReplayConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ReplayConfig::try_from(merged)
    }
}

/// Resolved `replay` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReplayConfig {
    /// Path to the positions file.
    pub(crate) positions: Utf8PathBuf,
    /// Source of the planned route.
    pub(crate) route: RouteInput,
    /// Fleet parameters.
    pub(crate) stream: StreamConfig,
}

impl ReplayConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.positions, ARG_POSITIONS)?;
        self.route.validate_sources()
    }

    /// Trip identifier reported in logs: the positions file stem.
    pub(crate) fn trip(&self) -> TripId {
        TripId::from(self.positions.file_stem().unwrap_or("replay"))
    }
}

impl TryFrom<ReplayArgs> for ReplayConfig {
    type Error = CliError;

    fn try_from(args: ReplayArgs) -> Result<Self, Self::Error> {
        let analysis = analysis_config(args.threshold_meters)?;
        let mut stream = StreamConfig::default().with_analysis(analysis);
        if let Some(seconds) = args.reorder_window_secs {
            stream = stream.with_reorder_window(Duration::from_secs(seconds));
        }
        if let Some(capacity) = args.channel_capacity {
            stream = stream.with_channel_capacity(capacity);
        }
        Ok(Self {
            positions: require_positions(args.positions)?,
            route: RouteInput::resolve(args.route, args.polyline, args.polyline_precision)?,
            stream,
        })
    }
}

pub(crate) fn run_replay_with(args: ReplayArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let analysis = execute_replay(args)?;
    write_json(writer, &analysis)
}

fn execute_replay(args: ReplayArgs) -> Result<TrajectoryAnalysis, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let route = config.route.load()?;
    let positions = load_positions(&config.positions)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(CliError::Runtime)?;
    let (analysis, metrics) =
        runtime.block_on(replay(config.trip(), &config.stream, &route, positions))?;
    log::info!(
        "replay finished: {} accepted, {} late, {} full scans, {} snapshots in {:.3}s",
        metrics.accepted_samples,
        metrics.late_samples,
        metrics.full_scans,
        metrics.snapshots_published,
        metrics.elapsed_secs
    );
    Ok(analysis)
}

/// Send every sample with backpressure, then finish the trip.
pub(crate) async fn replay(
    trip: TripId,
    config: &StreamConfig,
    route: &[PlannedRoutePoint],
    positions: Vec<ActualPosition>,
) -> Result<(TrajectoryAnalysis, MetricsSummary), StreamError> {
    let mut fleet = Fleet::new(*config);
    fleet.start_trip(trip.clone(), route)?;
    for sample in positions {
        fleet.send(&trip, sample).await?;
    }
    let analysis = fleet.finish(&trip).await?;
    Ok((TrajectoryAnalysis::clone(&analysis), fleet.metrics()))
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ReplayConfig, CliError> {
    let merged = ReplayArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ReplayConfig::try_from(merged)
}
