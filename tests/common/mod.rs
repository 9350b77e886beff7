//! Common test utilities and helpers
//!
//! In-memory sources and destinations standing in for Tenable accounts, plus
//! small file fixtures.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use scan_smuggler::endpoint::{EndpointError, EndpointResult, ScanDestination, ScanSource};
use scan_smuggler::staging::StagingArea;
use scan_smuggler::transfer::AccountIdentity;

pub const NESSUS_BODY: &str = "<NessusClientData_v2></NessusClientData_v2>";

/// Source that "downloads" fixed scan ids by writing them into its staging area
pub struct FakeSource {
    label: String,
    identity: AccountIdentity,
    scan_ids: Vec<String>,
    fail: bool,
    cutoffs: Arc<Mutex<Vec<i64>>>,
}

impl FakeSource {
    pub fn new(label: &str, access_key: &str, scan_ids: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            identity: AccountIdentity::new(access_key),
            scan_ids: scan_ids.iter().map(|id| id.to_string()).collect(),
            fail: false,
            cutoffs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Source whose whole download fails, as when its API is unreachable
    pub fn failing(label: &str, access_key: &str) -> Self {
        Self {
            fail: true,
            ..Self::new(label, access_key, &[])
        }
    }

    pub fn cutoffs(&self) -> Arc<Mutex<Vec<i64>>> {
        Arc::clone(&self.cutoffs)
    }
}

#[async_trait]
impl ScanSource for FakeSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn identity(&self) -> &AccountIdentity {
        &self.identity
    }

    async fn download(&self, staging: &StagingArea, cutoff: i64) -> EndpointResult<Vec<PathBuf>> {
        self.cutoffs.lock().unwrap().push(cutoff);
        if self.fail {
            return Err(EndpointError::Status {
                operation: format!("history of scans on {}", self.label),
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        let mut files = Vec::new();
        for id in &self.scan_ids {
            let path = staging.path_for(id, "nessus");
            std::fs::write(&path, NESSUS_BODY).unwrap();
            files.push(path);
        }
        Ok(files)
    }
}

/// Everything a destination was asked to upload
#[derive(Debug, Default)]
pub struct UploadLog {
    pub attempts: Vec<PathBuf>,
    pub accepted: Vec<PathBuf>,
}

impl UploadLog {
    pub fn accepted_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .accepted
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

/// Destination recording uploads; files named in `reject` fail every attempt
pub struct FakeDestination {
    label: String,
    identity: AccountIdentity,
    reject: HashSet<String>,
    log: Arc<Mutex<UploadLog>>,
}

impl FakeDestination {
    pub fn new(label: &str, access_key: &str) -> Self {
        Self {
            label: label.to_string(),
            identity: AccountIdentity::new(access_key),
            reject: HashSet::new(),
            log: Arc::new(Mutex::new(UploadLog::default())),
        }
    }

    pub fn rejecting(mut self, file_name: &str) -> Self {
        self.reject.insert(file_name.to_string());
        self
    }

    pub fn log(&self) -> Arc<Mutex<UploadLog>> {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl ScanDestination for FakeDestination {
    fn label(&self) -> &str {
        &self.label
    }

    fn identity(&self) -> &AccountIdentity {
        &self.identity
    }

    async fn upload(&self, file: &Path) -> EndpointResult<()> {
        let mut log = self.log.lock().unwrap();
        log.attempts.push(file.to_path_buf());

        // files must still exist while uploads run
        assert!(file.is_file(), "{} missing during upload", file.display());

        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.reject.contains(&name) {
            return Err(EndpointError::Status {
                operation: format!("import of {}", name),
                status: 500,
                body: "ingest failed".to_string(),
            });
        }
        log.accepted.push(file.to_path_buf());
        Ok(())
    }
}

/// Write a static `.nessus` fixture
pub fn write_nessus(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, NESSUS_BODY).unwrap();
    path
}
