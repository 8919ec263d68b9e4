//! End-to-end CLI tests for the dvrsync binary.

mod support;

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use support::FakeTuner;
use tempfile::TempDir;

fn dvrsync() -> Command {
    let mut cmd = Command::cargo_bin("dvrsync").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, body).unwrap();
    path
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    dvrsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sync recordings from networked DVR tuners"))
        .stdout(predicate::str::contains("scrub"));
}

#[test]
fn test_binary_version_displays_version() {
    dvrsync()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dvrsync"));
}

#[test]
fn test_binary_requires_subcommand() {
    dvrsync().assert().failure().stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_binary_invalid_flag_returns_error() {
    dvrsync()
        .args(["sync", "--invalid-flag"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_sync_with_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    dvrsync()
        .args(["--config"])
        .arg(dir.path().join("absent.toml"))
        .arg("sync")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read config file"));
}

#[test]
fn test_sync_rejects_unknown_config_keys() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "tuners = []\nconcurrency = 4\n");
    dvrsync()
        .arg("--config")
        .arg(config)
        .arg("sync")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to parse config file"));
}

#[test]
fn test_sync_without_tuners_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "tuners = []\n");
    dvrsync()
        .arg("-q")
        .arg("--config")
        .arg(config)
        .arg("sync")
        .assert()
        .success();
}

#[test]
fn test_scrub_reports_library_without_catalog() {
    let dir = TempDir::new().unwrap();
    let library = dir.path().join("tv");
    std::fs::create_dir_all(&library).unwrap();
    let config = write_config(
        dir.path(),
        &format!("[libraries]\nseries = {:?}\n", library.to_string_lossy()),
    );
    dvrsync()
        .arg("--config")
        .arg(config)
        .arg("scrub")
        .assert()
        .success()
        .stdout(predicate::str::contains("series: no catalog"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tuners_lists_discovered_device() {
    let tuner = FakeTuner::start("1010ABCD").await;
    wiremock::Mock::given(wiremock::matchers::path("/lineup.json"))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!([
            {"GuideNumber": "2.1", "GuideName": "KTVU", "VideoCodec": "MPEG2", "AudioCodec": "AC3", "HD": 1, "URL": "http://x/auto/v2.1"},
            {"GuideNumber": "4.1", "GuideName": "KRON", "VideoCodec": "MPEG2", "AudioCodec": "AC3", "URL": "http://x/auto/v4.1"},
        ])))
        .mount(&tuner.server)
        .await;
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &format!("tuners = [{:?}]\n", tuner.address()));

    dvrsync()
        .arg("-q")
        .arg("--config")
        .arg(config)
        .args(["tuners", "--lineup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("HDHomeRun FLEX 4K (1010ABCD)"))
        .stdout(predicate::str::contains("storage 1010ABCD-STORAGE"))
        .stdout(predicate::str::contains("lineup: 2 channel(s), 1 HD"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tuners_guide_uses_configured_guide_url() {
    let tuner = FakeTuner::start("1010ABCD").await;
    wiremock::Mock::given(wiremock::matchers::path("/api/guide.php"))
        .and(wiremock::matchers::query_param("DeviceAuth", "auth-token"))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!([{
            "GuideNumber": "2.1",
            "GuideName": "KTVU",
            "Guide": [
                {"StartTime": 1_700_000_000, "EndTime": 1_700_003_600, "Title": "News", "SeriesID": "C1", "RecordingRule": 1},
                {"StartTime": 1_700_003_600, "EndTime": 1_700_007_200, "Title": "Movie", "SeriesID": "C2"}
            ]
        }])))
        .expect(1)
        .mount(&tuner.server)
        .await;
    let dir = TempDir::new().unwrap();
    let config = write_config(
        dir.path(),
        &format!(
            "tuners = [{:?}]\nguide_url = {:?}\n",
            tuner.address(),
            format!("{}/api/guide.php", tuner.uri())
        ),
    );

    dvrsync()
        .arg("-q")
        .arg("--config")
        .arg(config)
        .args(["tuners", "--guide"])
        .assert()
        .success()
        .stdout(predicate::str::contains("guide: 1 channel(s), 2 program(s), 1 scheduled to record"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sync_downloads_into_configured_library() {
    let tuner = FakeTuner::start("1010ABCD").await;
    tuner.mount_groups(json!([tuner.group("C1", "Show", "series")])).await;
    tuner
        .mount_episodes("C1", json!([tuner.episode("C1", "Show", "show_1.mpg", Some("S03E07"))]), None)
        .await;
    tuner.mount_file("show_1.mpg", b"recorded bytes").await;
    tuner.mount_image("C1.jpg", b"jpeg").await;
    let dir = TempDir::new().unwrap();
    let library = dir.path().join("tv");
    let config = write_config(
        dir.path(),
        &format!(
            "tuners = [{:?}]\n\n[libraries]\nseries = {:?}\n",
            tuner.address(),
            library.to_string_lossy()
        ),
    );

    dvrsync()
        .arg("-q")
        .arg("--config")
        .arg(&config)
        .arg("sync")
        .assert()
        .success();

    let file = library.join("Show [C1]").join("Season 03").join("Show S03E07.mpg");
    assert_eq!(std::fs::read(file).unwrap(), b"recorded bytes");
    assert!(library.join(".dvrsync").join("catalog.db").exists());

    dvrsync()
        .arg("--config")
        .arg(&config)
        .arg("scrub")
        .assert()
        .success()
        .stdout(predicate::str::contains("untracked").not());
}
