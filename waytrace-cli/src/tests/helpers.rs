//! Temporary workspaces holding route and position files.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;
use tempfile::TempDir;
use waytrace_core::test_support::retrace;
use waytrace_core::{ActualPosition, PlannedRoutePoint};

/// Encoded form of (38.5, -120.2), (40.7, -120.95), (43.252, -126.453).
pub(super) const REFERENCE_POLYLINE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    pub(super) fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Utf8PathBuf {
        let payload = serde_json::to_vec_pretty(value).expect("serialize fixture");
        self.write_raw(name, &payload)
    }

    pub(super) fn write_raw(&self, name: &str, contents: &[u8]) -> Utf8PathBuf {
        let path = self.path(name);
        write_utf8(&path, contents);
        path
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path, contents).expect("write fixture file");
}

pub(super) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0)
        .single()
        .expect("valid start time")
}

/// Five waypoints about 1.1 km apart along the equator.
pub(super) fn route() -> Vec<PlannedRoutePoint> {
    (0..5)
        .map(|i| {
            PlannedRoutePoint::new(0.0, f64::from(i) * 0.01, i64::from(i))
                .with_estimated_time(start() + Duration::minutes(i64::from(i) * 2))
        })
        .collect()
}

/// One sample per waypoint, two minutes apart.
pub(super) fn retraced(route: &[PlannedRoutePoint]) -> Vec<ActualPosition> {
    retrace(route, start(), Duration::minutes(2), 9.0)
}
