//! Focused unit tests covering analyze configuration and input loading.

use super::analyze::{AnalyzeArgs, AnalyzeConfig, config_from_layers_for_test, run_analyze_with};
use super::helpers::{REFERENCE_POLYLINE, Workspace, retraced, route};
use super::input::{RouteInput, load_json, load_positions};
use super::*;
use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use waytrace_core::{ActualPosition, AnalysisConfig, TrajectoryAnalysis, analyze};

#[fixture]
fn workspace() -> Workspace {
    Workspace::new()
}

fn args(positions: Option<Utf8PathBuf>, route: Option<Utf8PathBuf>) -> AnalyzeArgs {
    AnalyzeArgs {
        positions,
        route,
        ..AnalyzeArgs::default()
    }
}

#[rstest]
fn converting_without_positions_errors() {
    let err = AnalyzeConfig::try_from(args(None, Some("route.json".into())))
        .expect_err("missing positions should error");
    assert!(
        matches!(
            err,
            CliError::MissingArgument {
                field: ARG_POSITIONS,
                env: ENV_POSITIONS
            }
        ),
        "unexpected error {err:?}"
    );
}

#[rstest]
fn converting_without_route_errors() {
    let err = AnalyzeConfig::try_from(args(Some("positions.json".into()), None))
        .expect_err("missing route should error");
    assert!(
        matches!(
            err,
            CliError::MissingArgument {
                field: ARG_ROUTE,
                env: ENV_ROUTE
            }
        ),
        "unexpected error {err:?}"
    );
}

#[rstest]
fn route_and_polyline_conflict() {
    let conflicting = AnalyzeArgs {
        polyline: Some(REFERENCE_POLYLINE.to_owned()),
        ..args(Some("positions.json".into()), Some("route.json".into()))
    };
    let err = AnalyzeConfig::try_from(conflicting).expect_err("conflict should error");
    assert!(
        matches!(err, CliError::ConflictingArguments { .. }),
        "unexpected error {err:?}"
    );
}

#[rstest]
fn polyline_precision_defaults_to_five() {
    let polyline = AnalyzeArgs {
        polyline: Some(REFERENCE_POLYLINE.to_owned()),
        ..args(Some("positions.json".into()), None)
    };
    let config = AnalyzeConfig::try_from(polyline).expect("config should build");
    assert_eq!(
        config.route,
        RouteInput::Polyline {
            encoded: REFERENCE_POLYLINE.to_owned(),
            precision: 5
        }
    );
    assert_eq!(config.analysis, AnalysisConfig::default());
}

#[rstest]
#[case(0.0)]
#[case(-5.0)]
#[case(f64::NAN)]
#[case(f64::INFINITY)]
fn unusable_thresholds_are_rejected(#[case] threshold: f64) {
    let with_threshold = AnalyzeArgs {
        threshold_meters: Some(threshold),
        ..args(Some("positions.json".into()), Some("route.json".into()))
    };
    let err = AnalyzeConfig::try_from(with_threshold).expect_err("threshold should error");
    assert!(
        matches!(err, CliError::InvalidThreshold { .. }),
        "unexpected error {err:?}"
    );
}

#[rstest]
fn validate_sources_reports_missing_positions(workspace: Workspace) {
    let route_path = workspace.write_json("route.json", &route());
    let config = AnalyzeConfig {
        positions: workspace.path("absent.json"),
        route: RouteInput::File(route_path),
        analysis: AnalysisConfig::default(),
    };
    let err = config.validate_sources().expect_err("expected failure");
    assert!(
        matches!(err, CliError::MissingSourceFile { field: ARG_POSITIONS, .. }),
        "unexpected error {err:?}"
    );
}

#[rstest]
fn validate_sources_rejects_directories(workspace: Workspace) {
    let positions = workspace.write_json("positions.json", &retraced(&route()));
    let directory = workspace.path("routes");
    std::fs::create_dir(&directory).expect("route directory");
    let config = AnalyzeConfig {
        positions,
        route: RouteInput::File(directory),
        analysis: AnalysisConfig::default(),
    };
    let err = config.validate_sources().expect_err("expected failure");
    assert!(
        matches!(err, CliError::SourcePathNotFile { field: ARG_ROUTE, .. }),
        "unexpected error {err:?}"
    );
}

#[rstest]
fn malformed_json_reports_the_field(workspace: Workspace) {
    let path = workspace.write_raw("positions.json", b"[{ not json");
    let err = load_json::<Vec<ActualPosition>>(&path, ARG_POSITIONS)
        .expect_err("malformed JSON should error");
    assert!(
        matches!(
            &err,
            CliError::ParseInput { field: ARG_POSITIONS, path: failed, .. } if *failed == path
        ),
        "unexpected error {err:?}"
    );
}

#[rstest]
fn out_of_range_positions_fail_validation(workspace: Workspace) {
    let mut positions = retraced(&route());
    if let Some(sample) = positions.get_mut(2) {
        sample.lat = 95.0;
    }
    let path = workspace.write_json("positions.json", &positions);
    let err = load_positions(&path).expect_err("invalid latitude should error");
    assert!(
        matches!(err, CliError::InvalidPositions(_)),
        "unexpected error {err:?}"
    );
}

#[rstest]
fn polyline_routes_decode_with_sequential_order() {
    let input = RouteInput::Polyline {
        encoded: REFERENCE_POLYLINE.to_owned(),
        precision: 5,
    };
    let decoded = input.load().expect("reference polyline decodes");
    let orders: Vec<i64> = decoded.iter().map(|point| point.order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
}

#[rstest]
fn analyze_prints_the_batch_analysis(workspace: Workspace) {
    let planned = route();
    let mut trace = retraced(&planned);
    if let Some(sample) = trace.get_mut(2) {
        sample.lat = 0.01;
    }
    let analyze_args = args(
        Some(workspace.write_json("positions.json", &trace)),
        Some(workspace.write_json("route.json", &planned)),
    );
    let mut stdout = Vec::new();
    run_analyze_with(analyze_args, &mut stdout).expect("analysis succeeds");

    let printed: TrajectoryAnalysis = serde_json::from_slice(&stdout).expect("JSON analysis");
    assert_eq!(printed, analyze(&planned, &trace, 200.0));
    assert_eq!(printed.deviations.len(), 1);
    assert!(stdout.ends_with(b"\n"));
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "threshold_meters": "far" }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    assert!(
        matches!(err, CliError::Configuration(_)),
        "unexpected error {err:?}"
    );
}

#[rstest]
fn merge_layers_honours_precedence(workspace: Workspace) {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let file_route = workspace.path("from-file-route.json");
    let env_positions = workspace.path("from-env-positions.json");
    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "route": file_route.as_str(),
            "threshold_meters": 50.0,
        }),
        None,
    );
    composer.push_environment(json!({
        "positions": env_positions.as_str(),
        "threshold_meters": 60.0,
    }));
    composer.push_cli(json!({ "threshold_meters": 75.0 }));

    let config =
        config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.positions, env_positions);
    assert_eq!(config.route, RouteInput::File(file_route));
    assert_eq!(config.analysis, AnalysisConfig::default().with_threshold_meters(75.0));
}
