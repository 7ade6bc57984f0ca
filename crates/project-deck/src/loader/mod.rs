//! Tolerant loading of a single project sheet.
//!
//! A file is read once into memory and handed to an ordered list of attempts:
//! first as a workbook, then as delimited text in each configured encoding.
//! The first attempt that yields a header and at least one data row wins; the
//! failures before it are kept in the [`LoadReport`].
//!
//! ```rust,ignore
//! use project_deck::{Loader, LoaderConfig};
//!
//! let loader = Loader::new(LoaderConfig::default());
//! let loaded = loader.load()?;
//! println!("{} rows from {}", loaded.table.height(), loaded.source.path.display());
//! ```

mod cache;
mod delimited;
mod discovery;
mod normalize;
mod spreadsheet;

pub use cache::{DatasetCache, load_dataset};
pub use discovery::{FileIdentity, resolve_source};

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::LoaderConfig;
use crate::error::{AttemptError, LoadError, Result};
use crate::table::NormalizedTable;
use crate::types::{AttemptFailure, AttemptKind, LoadReport, RawTable, SourceFile, SourceFormat};

/// A successfully loaded and normalized table.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub source: SourceFile,
    pub table: NormalizedTable,
    pub report: LoadReport,
}

/// Reads the project sheet described by a [`LoaderConfig`].
#[derive(Debug, Clone, Default)]
pub struct Loader {
    config: LoaderConfig,
}

impl Loader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Find the file this loader would read.
    pub fn resolve_source(&self) -> Result<std::path::PathBuf> {
        resolve_source(&self.config)
    }

    /// Resolve the source file and load it.
    pub fn load(&self) -> Result<LoadedTable> {
        let path = self.resolve_source()?;
        self.load_from(&path)
    }

    /// Load a specific file, skipping discovery.
    pub fn load_from(&self, path: &Path) -> Result<LoadedTable> {
        let bytes = fs::read(path)?;
        let mut failures = Vec::new();

        for attempt in self.attempt_plan(&bytes) {
            match self.run_attempt(attempt, &bytes) {
                Ok((raw, format)) => return self.finish(path, raw, format, failures),
                Err(e) => {
                    debug!("{} attempt on {} failed: {}", attempt, path.display(), e);
                    failures.push(AttemptFailure {
                        attempt,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(LoadError::AllAttemptsFailed {
            path: path.to_path_buf(),
            attempts: failures,
        })
    }

    /// Order in which the formats are tried for these bytes.
    ///
    /// A byte-order mark moves its encoding to the front of the text attempts.
    fn attempt_plan(&self, bytes: &[u8]) -> Vec<AttemptKind> {
        let mut encodings = self.config.encodings.clone();
        if let Some(bom) = delimited::bom_encoding(bytes) {
            encodings.retain(|e| *e != bom);
            encodings.insert(0, bom);
        }

        std::iter::once(AttemptKind::Spreadsheet)
            .chain(encodings.into_iter().map(AttemptKind::Delimited))
            .collect()
    }

    fn run_attempt(
        &self,
        attempt: AttemptKind,
        bytes: &[u8],
    ) -> std::result::Result<(RawTable, SourceFormat), AttemptError> {
        match attempt {
            AttemptKind::Spreadsheet => {
                spreadsheet::parse_workbook(bytes).map(|raw| (raw, SourceFormat::Spreadsheet))
            }
            AttemptKind::Delimited(encoding) => {
                let text = delimited::decode(bytes, encoding)?;
                let delimiter =
                    delimited::sniff_delimiter(&text, &self.config.delimiter_candidates);
                let raw = delimited::parse_delimited(&text, delimiter)?;
                Ok((
                    raw,
                    SourceFormat::Delimited {
                        encoding,
                        delimiter,
                    },
                ))
            }
        }
    }

    fn finish(
        &self,
        path: &Path,
        raw: RawTable,
        format: SourceFormat,
        failed_attempts: Vec<AttemptFailure>,
    ) -> Result<LoadedTable> {
        let skipped_lines = raw.skipped_lines;
        let (table, stats) = normalize::normalize(raw, &self.config.name_header)?;

        if table.is_empty() {
            return Err(LoadError::EmptyAfterNormalization {
                path: path.to_path_buf(),
                format,
            });
        }

        if skipped_lines > 0 {
            warn!(
                "Skipped {} malformed lines while reading {}",
                skipped_lines,
                path.display()
            );
        }
        info!(
            "Loaded {} as {}: {} rows x {} columns",
            path.display(),
            format,
            table.height(),
            table.width()
        );

        Ok(LoadedTable {
            source: SourceFile {
                path: path.to_path_buf(),
                format,
            },
            table,
            report: LoadReport {
                failed_attempts,
                skipped_lines,
                duplicate_columns_dropped: stats.duplicate_columns,
                empty_columns_dropped: stats.empty_columns,
                empty_rows_dropped: stats.empty_rows,
                header_rows_dropped: stats.header_rows,
            },
        })
    }
}
