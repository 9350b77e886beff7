//! Extraction of `.nessus` files from Tenable.sc result archives

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use super::error::{EndpointError, EndpointResult};

const NESSUS_EXTENSION: &str = "nessus";

/// Extract every `.nessus` entry of `archive` into `destination`.
///
/// Entries keep their relative directory path so same-named files in
/// different folders stay apart; other entries are ignored. On failure the
/// files written so far are removed again.
pub fn extract_nessus(archive: &Path, destination: &Path) -> EndpointResult<Vec<PathBuf>> {
    let mut extracted = Vec::new();
    match extract_entries(archive, destination, &mut extracted) {
        Ok(()) => Ok(extracted),
        Err(e) => {
            for partial in &extracted {
                if let Err(remove_error) = std::fs::remove_file(partial) {
                    log::warn!("Unable to delete {}: {}", partial.display(), remove_error);
                }
            }
            Err(e)
        }
    }
}

// Pushes each target before writing it so a half-written file is removed too
fn extract_entries(
    archive: &Path,
    destination: &Path,
    extracted: &mut Vec<PathBuf>,
) -> EndpointResult<()> {
    let file = File::open(archive).map_err(|e| EndpointError::io("open archive", archive, e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| archive_error(archive, e))?;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|e| archive_error(archive, e))?;
        if entry.is_dir() {
            continue;
        }

        let relative = match entry.enclosed_name() {
            Some(path) => path.to_path_buf(),
            None => {
                log::warn!(
                    "Skipping unsafe entry '{}' in {}",
                    entry.name(),
                    archive.display()
                );
                continue;
            }
        };
        if relative.extension().and_then(|ext| ext.to_str()) != Some(NESSUS_EXTENSION) {
            log::debug!("Ignoring archive entry {}", entry.name());
            continue;
        }

        let target = destination.join(&relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| EndpointError::io("extract archive", parent, e))?;
        }
        let mut out =
            File::create(&target).map_err(|e| EndpointError::io("extract archive", &target, e))?;
        extracted.push(target.clone());
        io::copy(&mut entry, &mut out)
            .map_err(|e| EndpointError::io("extract archive", &target, e))?;
    }

    Ok(())
}

/// Blocking extraction moved off the async runtime
pub async fn extract_nessus_async(archive: PathBuf, destination: PathBuf) -> EndpointResult<Vec<PathBuf>> {
    let archive_path = archive.clone();
    tokio::task::spawn_blocking(move || extract_nessus(&archive, &destination))
        .await
        .map_err(|e| EndpointError::Archive {
            path: archive_path,
            message: e.to_string(),
        })?
}

fn archive_error(archive: &Path, error: zip::result::ZipError) -> EndpointError {
    EndpointError::Archive {
        path: archive.to_path_buf(),
        message: error.to_string(),
    }
}
