//! Staging Store
//!
//! Transient on-disk home for downloaded scan files. Each run gets its own
//! directory under the staging root, and each source endpoint gets its own
//! area inside it so equal scan ids on different accounts never collide.

use std::path::{Path, PathBuf};

use crate::core::cleanup::Cleanup;

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("Unable to create staging directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl crate::core::error_handling::ContextualError for StagingError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<String> {
        None
    }
}

pub type StagingResult<T> = Result<T, StagingError>;

/// Run-scoped staging directory
#[derive(Debug)]
pub struct StagingStore {
    run_dir: PathBuf,
}

impl StagingStore {
    /// Create a fresh run directory under `root`
    pub fn create(root: &Path) -> StagingResult<Self> {
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let run_dir = root.join(format!("scan-smuggler-{}-{}", stamp, std::process::id()));
        create_dir(&run_dir)?;
        log::debug!("Staging files under {}", run_dir.display());
        Ok(Self { run_dir })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Create (or reuse) a named area inside the run directory
    pub fn area(&self, name: &str) -> StagingResult<StagingArea> {
        let dir = self.run_dir.join(sanitize_file_stem(name));
        create_dir(&dir)?;
        Ok(StagingArea { dir })
    }
}

impl Cleanup for StagingStore {
    /// Remove the run directory tree once it no longer holds files.
    /// Files still present (an earlier delete failed) keep their directories.
    fn cleanup(&self) {
        prune_empty_dirs(&self.run_dir);
        if self.run_dir.exists() {
            log::warn!(
                "Staging directory {} still contains files and was left in place",
                self.run_dir.display()
            );
        }
    }
}

/// One endpoint's slice of the staging store
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<area>/<id>.<extension>`, with the id made safe for the file system
    pub fn path_for(&self, id: &str, extension: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", sanitize_file_stem(id), extension))
    }

    /// Sub-directory for the contents of one archive
    pub fn subdir(&self, id: &str) -> StagingResult<PathBuf> {
        let dir = self.dir.join(sanitize_file_stem(id));
        create_dir(&dir)?;
        Ok(dir)
    }
}

/// Outcome of deleting staged files
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RemovalReport {
    pub removed: usize,
    pub failed: Vec<PathBuf>,
}

/// Delete each file, logging failures as warnings
pub fn remove_staged_files<'a>(files: impl IntoIterator<Item = &'a PathBuf>) -> RemovalReport {
    let mut report = RemovalReport::default();
    for file in files {
        match std::fs::remove_file(file) {
            Ok(()) => {
                log::debug!("Removed {}", file.display());
                report.removed += 1;
            }
            Err(e) => {
                log::warn!("Unable to delete {}: {}", file.display(), e);
                report.failed.push(file.clone());
            }
        }
    }
    report
}

fn create_dir(path: &Path) -> StagingResult<()> {
    std::fs::create_dir_all(path).map_err(|source| StagingError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Depth-first removal of empty directories; non-empty ones are left alone
fn prune_empty_dirs(dir: &Path) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                prune_empty_dirs(&path);
            }
        }
    }
    // fails harmlessly when files remain
    let _ = std::fs::remove_dir(dir);
}

/// Replace anything outside `[A-Za-z0-9._-]` so ids can't escape the area
pub fn sanitize_file_stem(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}
