//! Command-line interface for analysing recorded trips.
//!
//! `waytrace analyze` runs the batch analyzer over a recorded trace;
//! `waytrace replay` streams the same files through the live pipeline.
//! Options layer CLI flags over `WAYTRACE_*` environment variables and
//! configuration files.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};

mod analyze;
mod error;
mod input;
mod replay;

pub use error::CliError;

use analyze::AnalyzeArgs;
use replay::ReplayArgs;

pub(crate) const ARG_POSITIONS: &str = "positions";
pub(crate) const ARG_ROUTE: &str = "route";
pub(crate) const ARG_POLYLINE: &str = "polyline";
pub(crate) const ARG_POLYLINE_PRECISION: &str = "polyline-precision";
pub(crate) const ARG_THRESHOLD_METERS: &str = "threshold-meters";
pub(crate) const ARG_REORDER_WINDOW_SECS: &str = "reorder-window-secs";
pub(crate) const ARG_CHANNEL_CAPACITY: &str = "channel-capacity";
pub(crate) const ENV_POSITIONS: &str = "WAYTRACE_POSITIONS";
pub(crate) const ENV_ROUTE: &str = "WAYTRACE_ROUTE";

/// Run the waytrace CLI with the current process arguments and environment.
///
/// The analysis is written to standard output as pretty-printed JSON.
///
/// # Errors
/// Any [`CliError`]: argument parsing, configuration layering, unreadable or
/// invalid inputs, or a failed replay.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    dispatch(cli.command, &mut stdout)
}

fn dispatch(command: Command, writer: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Analyze(args) => analyze::run_analyze_with(args, writer),
        Command::Replay(args) => replay::run_replay_with(args, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "waytrace",
    about = "Trajectory conformity analysis for planned transit routes",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyse a recorded trip against its planned route.
    Analyze(AnalyzeArgs),
    /// Replay a recorded trip through the streaming pipeline.
    Replay(ReplayArgs),
}

#[cfg(test)]
mod tests;
