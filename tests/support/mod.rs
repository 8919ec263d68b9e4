//! Shared fixtures for integration tests: a fake tuner served by wiremock,
//! JSON builders for device records, and runner setup over in-memory catalogs.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use dvrsync_core::config::LibrariesConfig;
use dvrsync_core::{Catalog, HttpClient, RecordingCategory, SyncConfig, SyncRunner};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Unix seconds at which recordings in these tests finished.
pub const RECORDED_AT: i64 = 1_700_000_000;

/// A time comfortably after every fixture recording ended.
pub fn after_recording() -> DateTime<Utc> {
    Utc.timestamp_opt(RECORDED_AT + 3600, 0).single().unwrap()
}

/// A tuner with DVR storage, served from its own mock server.
pub struct FakeTuner {
    pub server: MockServer,
    pub device_id: String,
}

impl FakeTuner {
    pub async fn start(device_id: &str) -> Self {
        let server = MockServer::start().await;
        let tuner = Self {
            server,
            device_id: device_id.to_string(),
        };
        tuner.mount_discover().await;
        tuner
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Address as written in the config file (`host:port`).
    pub fn address(&self) -> String {
        self.uri().trim_start_matches("http://").to_string()
    }

    pub async fn mount_discover(&self) {
        let base = self.uri();
        Mock::given(method("GET"))
            .and(path("/discover.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "FriendlyName": "HDHomeRun FLEX 4K",
                "ModelNumber": "HDFX-4K",
                "FirmwareName": "hdhomerun_dvr_atsc3",
                "FirmwareVersion": "20240101",
                "DeviceID": self.device_id,
                "DeviceAuth": "auth-token",
                "BaseURL": base,
                "LineupURL": format!("{base}/lineup.json"),
                "TunerCount": 4,
                "StorageID": format!("{}-STORAGE", self.device_id),
                "StorageURL": format!("{base}/recorded_files.json"),
                "TotalSpace": 1_000_000_000_u64,
                "FreeSpace": 400_000_000_u64,
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_groups(&self, groups: Value) {
        Mock::given(method("GET"))
            .and(path("/recorded_files.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(groups))
            .mount(&self.server)
            .await;
    }

    /// Serves the episodes list of one group; `expected_calls` is verified
    /// when the server drops.
    pub async fn mount_episodes(&self, series_id: &str, episodes: Value, expected_calls: Option<u64>) {
        let mock = Mock::given(method("GET"))
            .and(path(format!("/episodes/{series_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(episodes));
        let mock = match expected_calls {
            Some(n) => mock.expect(n),
            None => mock,
        };
        mock.mount(&self.server).await;
    }

    /// Serves a recording's bytes for both the size probe and the transfer.
    pub async fn mount_file(&self, filename: &str, content: &[u8]) {
        Mock::given(path(format!("/play/{filename}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_failing_file(&self, filename: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/play/{filename}")))
            .respond_with(ResponseTemplate::new(500))
            .mount(&self.server)
            .await;
        Mock::given(method("HEAD"))
            .and(path(format!("/play/{filename}")))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.server)
            .await;
    }

    /// Accepts delete commands for a recording with `status`.
    pub async fn mount_delete(&self, filename: &str, status: u16, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(format!("/cmd/{filename}")))
            .respond_with(ResponseTemplate::new(status))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_image(&self, name: &str, content: &[u8]) {
        Mock::given(method("GET"))
            .and(path(format!("/images/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
            .mount(&self.server)
            .await;
    }

    /// Recording group JSON whose episodes are served by this tuner.
    pub fn group(&self, series_id: &str, title: &str, category: &str) -> Value {
        json!({
            "SeriesID": series_id,
            "Title": title,
            "Category": category,
            "ImageURL": format!("{}/images/{series_id}.jpg", self.uri()),
            "StartTime": RECORDED_AT - 7200,
            "New": 1,
            "EpisodesURL": format!("{}/episodes/{series_id}", self.uri()),
        })
    }

    /// Recording JSON for a finished program of `series_id`.
    pub fn episode(&self, series_id: &str, title: &str, filename: &str, designator: Option<&str>) -> Value {
        let base = self.uri();
        let mut value = json!({
            "Category": "series",
            "ChannelName": "KTVU",
            "ChannelNumber": "2.1",
            "EndTime": RECORDED_AT,
            "EpisodeTitle": "Pilot",
            "FirstAiring": 1,
            "ImageURL": format!("{base}/images/ep.jpg"),
            "OriginalAirdate": RECORDED_AT - 86_400,
            "ProgramID": "EP012345670001",
            "RecordEndTime": RECORDED_AT,
            "RecordStartTime": RECORDED_AT - 1800,
            "RecordSuccess": 1,
            "SeriesID": series_id,
            "StartTime": RECORDED_AT - 1800,
            "Synopsis": "Things happen.",
            "Title": title,
            "Filename": filename,
            "PlayURL": format!("{base}/play/{filename}"),
            "CmdURL": format!("{base}/cmd/{filename}?id=1"),
        });
        if let Some(designator) = designator {
            value["EpisodeNumber"] = json!(designator);
        }
        value
    }
}

/// Config syncing `tuners` into a series library at `series_root`.
pub fn series_config(tuners: &[&FakeTuner], series_root: &Path) -> SyncConfig {
    SyncConfig {
        tuners: tuners.iter().map(|t| t.address()).collect(),
        libraries: LibrariesConfig {
            movie: None,
            series: Some(series_root.to_string_lossy().into_owned()),
        },
        ..SyncConfig::default()
    }
}

/// Runner over an in-memory series catalog; the returned catalog shares its
/// pool with the runner.
pub async fn series_runner(config: SyncConfig) -> (SyncRunner, Catalog) {
    let catalog = Catalog::open_in_memory().await.unwrap();
    let mut catalogs = BTreeMap::new();
    catalogs.insert(RecordingCategory::Series, catalog.clone());
    (SyncRunner::new(config, HttpClient::new(), catalogs), catalog)
}
