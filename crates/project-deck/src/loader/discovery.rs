//! Locating the source file and fingerprinting it for the cache.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, info, warn};

use crate::config::LoaderConfig;
use crate::error::{LoadError, Result};

/// Prefix of the lock files office suites leave next to an open workbook.
const LOCK_FILE_PREFIX: &str = "~$";

/// Find the file to load.
///
/// The hinted name wins when it exists (relative hints are looked up in the
/// working directory). Otherwise the directory listing, sorted by name, is
/// scanned for the first workbook, then the first delimited-text file.
pub fn resolve_source(config: &LoaderConfig) -> Result<PathBuf> {
    let hinted = config.working_dir.join(&config.source_hint);
    if hinted.is_file() {
        debug!("Using hinted source file {}", hinted.display());
        return Ok(hinted);
    }

    let listing = match fs::read_dir(&config.working_dir) {
        Ok(listing) => listing,
        Err(e) => {
            warn!("Cannot list {}: {}", config.working_dir.display(), e);
            return Err(LoadError::NoFileFound {
                directory: config.working_dir.clone(),
                listing: Vec::new(),
            });
        }
    };

    let mut entries: Vec<PathBuf> = listing
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    entries.sort();

    let candidates: Vec<&PathBuf> = entries
        .iter()
        .filter(|path| path.is_file())
        .filter(|path| !file_name(path).starts_with(LOCK_FILE_PREFIX))
        .collect();

    let found = find_with_extension(&candidates, &config.spreadsheet_extensions)
        .or_else(|| find_with_extension(&candidates, &config.delimited_extensions));

    match found {
        Some(path) => {
            info!(
                "'{}' not found, falling back to {}",
                config.source_hint,
                path.display()
            );
            Ok(path.clone())
        }
        None => Err(LoadError::NoFileFound {
            directory: config.working_dir.clone(),
            listing: entries.iter().map(|p| file_name(p)).collect(),
        }),
    }
}

fn find_with_extension<'a>(candidates: &[&'a PathBuf], extensions: &[String]) -> Option<&'a PathBuf> {
    candidates.iter().copied().find(|path| {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// What the cache compares to decide whether a stored dataset is still current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    pub path: PathBuf,
    /// `None` when the platform cannot report modification times.
    pub modified: Option<SystemTime>,
}

impl FileIdentity {
    pub fn of(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            modified: metadata.modified().ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir) -> LoaderConfig {
        LoaderConfig::builder()
            .working_dir(dir.path())
            .build()
            .unwrap()
    }

    fn touch(dir: &TempDir, name: &str) {
        fs::write(dir.path().join(name), b"x").unwrap();
    }

    #[test]
    fn test_hinted_file_wins() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "data.csv");
        touch(&dir, "a.xlsx");
        let path = resolve_source(&config_for(&dir)).unwrap();
        assert_eq!(path, dir.path().join("data.csv"));
    }

    #[test]
    fn test_spreadsheet_preferred_over_text() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "a_projects.csv");
        touch(&dir, "z_projects.XLSX");
        let path = resolve_source(&config_for(&dir)).unwrap();
        assert_eq!(path, dir.path().join("z_projects.XLSX"));
    }

    #[test]
    fn test_lock_files_and_other_extensions_are_skipped() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "~$projects.xlsx");
        touch(&dir, "notes.md");
        touch(&dir, "projects.tsv");
        let path = resolve_source(&config_for(&dir)).unwrap();
        assert_eq!(path, dir.path().join("projects.tsv"));
    }

    #[test]
    fn test_no_file_found_carries_listing() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "app.py");
        touch(&dir, "README.md");
        match resolve_source(&config_for(&dir)) {
            Err(LoadError::NoFileFound { directory, listing }) => {
                assert_eq!(directory, dir.path());
                assert_eq!(listing, vec!["README.md".to_string(), "app.py".to_string()]);
            }
            other => panic!("expected NoFileFound, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_directory_is_no_file_found() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("not_here");
        let config = LoaderConfig::builder()
            .working_dir(&missing)
            .build()
            .unwrap();
        match resolve_source(&config) {
            Err(LoadError::NoFileFound { directory, listing }) => {
                assert_eq!(directory, missing);
                assert!(listing.is_empty());
            }
            other => panic!("expected NoFileFound, got {other:?}"),
        }
    }

    #[test]
    fn test_file_identity_tracks_path() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "data.csv");
        let path = dir.path().join("data.csv");
        let a = FileIdentity::of(&path).unwrap();
        let b = FileIdentity::of(&path).unwrap();
        assert_eq!(a, b);
    }
}
