//! End-to-end transfer tests
//!
//! A configuration file drives a full run against mocked Tenable.io and
//! Tenable.sc APIs.

use mockito::{Matcher, Server};
use scan_smuggler::app::startup::run_transfer;
use scan_smuggler::transfer::{TransferError, TransferOutcome};
use std::path::Path;
use tempfile::TempDir;

use crate::common::NESSUS_BODY;

fn write_config(dir: &Path, io_url: &str, sc_url: &str, staging: &Path) -> std::path::PathBuf {
    let config = serde_json::json!({
        "downloads": {
            "tenable_io": [{
                "enabled": true,
                "id": "io-source",
                "url": io_url,
                "access_key": "io-key",
                "secret_key": "io-secret",
                "proxies": null,
                "ssl_verify": true,
                "scan_ids": [100, 200]
            }],
            "tenable_sc": [],
            "completed_within_days": 1,
            "nessus_files": []
        },
        "uploads": {
            "tenable_io": [{
                "enabled": true,
                "id": "io-source-again",
                "url": io_url,
                "access_key": "io-key",
                "secret_key": "io-secret",
                "proxies": null,
                "ssl_verify": true,
                "folder_id": 5,
                "dashboards": false
            }],
            "tenable_sc": [{
                "enabled": true,
                "id": "sc-dest",
                "host": sc_url,
                "access_key": "sc-key",
                "secret_key": "sc-secret",
                "proxies": null,
                "ssl_verify": true,
                "repository_id": 2,
                "dhcp": true,
                "virtual_hosts": false,
                "dead_hosts_wait": 30
            }]
        },
        "settings": {
            "staging_dir": staging,
            "request_timeout_secs": 5,
            "export_poll_interval_secs": 0,
            "export_poll_attempts": 2
        }
    });
    let path = dir.join("tenable.json");
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path
}

#[tokio::test]
async fn test_io_scan_moves_to_sc_and_not_back_to_io() {
    let mut io = Server::new_async().await;
    let mut sc = Server::new_async().await;
    let now = chrono::Utc::now().timestamp();

    // scan 100: fresh and completed
    let _history_100 = io
        .mock("GET", "/scans/100/history")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(format!(
            r#"{{"history": [{{"id": 11, "status": "completed", "time_end": {}}}]}}"#,
            now - 3600
        ))
        .create_async()
        .await;
    // scan 200: two days old
    let _history_200 = io
        .mock("GET", "/scans/200/history")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(format!(
            r#"{{"history": [{{"id": 22, "status": "completed", "time_end": {}}}]}}"#,
            now - 172_800
        ))
        .create_async()
        .await;
    let _export = io
        .mock("POST", "/scans/100/export")
        .match_query(Matcher::UrlEncoded("history_id".into(), "11".into()))
        .with_status(200)
        .with_body(r#"{"file": 900}"#)
        .create_async()
        .await;
    let _status = io
        .mock("GET", "/scans/100/export/900/status")
        .with_status(200)
        .with_body(r#"{"status": "ready"}"#)
        .create_async()
        .await;
    let _download = io
        .mock("GET", "/scans/100/export/900/download")
        .with_status(200)
        .with_body(NESSUS_BODY)
        .create_async()
        .await;
    let no_export_200 = io
        .mock("POST", "/scans/200/export")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let no_upload_back = io
        .mock("POST", "/file/upload")
        .expect(0)
        .create_async()
        .await;

    let sc_upload = sc
        .mock("POST", "/rest/file/upload")
        .match_header("x-apikey", "accesskey=sc-key; secretkey=sc-secret;")
        .with_status(200)
        .with_body(r#"{"response": {"filename": "tmp100"}, "error_code": 0, "error_msg": ""}"#)
        .create_async()
        .await;
    let sc_import = sc
        .mock("POST", "/rest/scanResult/import")
        .match_body(Matcher::Json(serde_json::json!({
            "filename": "tmp100",
            "repository": {"id": "2"},
            "dhcpTracking": "true",
            "scanningVirtualHosts": "false",
            "classifyMitigatedAge": "30"
        })))
        .with_status(200)
        .with_body(r#"{"response": "", "error_code": 0, "error_msg": ""}"#)
        .create_async()
        .await;

    let workdir = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    let config = write_config(workdir.path(), &io.url(), &sc.url(), staging.path());

    let summary = run_transfer(&config).await.unwrap();

    assert_eq!(summary.outcome, TransferOutcome::Completed);
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.uploaded, 1);
    assert_eq!(summary.skipped_loopback, 1);
    assert_eq!(summary.removed, 1);
    assert_eq!(summary.upload_failures, 0);

    sc_upload.assert_async().await;
    sc_import.assert_async().await;
    no_export_200.assert_async().await;
    no_upload_back.assert_async().await;

    // staging root holds nothing once the run is over
    assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_missing_config_is_fatal() {
    let workdir = TempDir::new().unwrap();
    let result = run_transfer(&workdir.path().join("tenable.json")).await;

    assert!(matches!(result, Err(TransferError::Config(_))));
}

#[tokio::test]
async fn test_default_config_moves_nothing() {
    let workdir = TempDir::new().unwrap();
    let path = workdir.path().join("tenable.json");
    std::fs::write(&path, scan_smuggler::config::DEFAULT_CONFIG_DOCUMENT).unwrap();

    let summary = run_transfer(&path).await.unwrap();

    assert_eq!(summary.outcome, TransferOutcome::NothingToUpload);
}
