//! Error types for loading a project sheet.
//!
//! [`LoadError`] is the tagged failure value returned across the crate boundary.
//! Every variant carries enough context (attempted formats, underlying error text,
//! directory listing) for a presentation layer to explain what went wrong instead
//! of showing an empty dataset.
//!
//! [`AttemptError`] describes why a single format/encoding attempt failed. It never
//! escapes the loader on its own; failed attempts are collected into
//! [`LoadError::AllAttemptsFailed`] as [`AttemptFailure`] values.

use std::path::PathBuf;

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::types::{AttemptFailure, SourceFormat, TextEncoding};

/// Failure of a whole load request.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Neither the hinted file nor any file with an accepted extension exists.
    #[error(
        "No tabular file found in '{}' (directory contains: {})",
        .directory.display(),
        describe_listing(.listing)
    )]
    NoFileFound {
        directory: PathBuf,
        listing: Vec<String>,
    },

    /// Every format/encoding combination failed or produced an empty table.
    #[error(
        "Could not read '{}': {} attempts failed ({})",
        .path.display(),
        .attempts.len(),
        describe_attempts(.attempts)
    )]
    AllAttemptsFailed {
        path: PathBuf,
        attempts: Vec<AttemptFailure>,
    },

    /// The file parsed, but nothing usable was left after cleanup.
    #[error(
        "'{}' was read as {format} but has no usable rows or columns after cleanup",
        .path.display()
    )]
    EmptyAfterNormalization { path: PathBuf, format: SourceFormat },

    /// IO error wrapper (directory listing, file read, metadata).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper for the normalized table.
    #[error("Table error: {0}")]
    Table(#[from] polars::error::PolarsError),
}

impl LoadError {
    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoFileFound { .. } => "NO_FILE_FOUND",
            Self::AllAttemptsFailed { .. } => "ALL_ATTEMPTS_FAILED",
            Self::EmptyAfterNormalization { .. } => "EMPTY_AFTER_NORMALIZATION",
            Self::Io(_) => "IO_ERROR",
            Self::Table(_) => "TABLE_ERROR",
        }
    }

    /// Attempts that were tried before giving up, if any.
    pub fn attempts(&self) -> &[AttemptFailure] {
        match self {
            Self::AllAttemptsFailed { attempts, .. } => attempts,
            _ => &[],
        }
    }

    /// Directory listing captured when no file could be found.
    pub fn listing(&self) -> &[String] {
        match self {
            Self::NoFileFound { listing, .. } => listing,
            _ => &[],
        }
    }
}

/// Errors are serialized as `{code, message, attempts, listing}` so a UI can render
/// the diagnostic details without parsing the message.
impl Serialize for LoadError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("LoadError", 4)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.serialize_field("attempts", self.attempts())?;
        state.serialize_field("listing", self.listing())?;
        state.end()
    }
}

/// Result type alias for load operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Why a single load attempt did not produce a table.
#[derive(Error, Debug)]
pub enum AttemptError {
    #[error("not a readable workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook has no worksheets")]
    NoWorksheet,

    #[error("bytes are not valid {0}")]
    Decode(TextEncoding),

    #[error("decoded text contains NUL characters (likely a wider encoding)")]
    NulCharacters,

    #[error("no header row found")]
    NoHeader,

    #[error("header row found but no data rows")]
    NoDataRows,
}

fn describe_listing(listing: &[String]) -> String {
    if listing.is_empty() {
        "nothing".to_string()
    } else {
        listing.join(", ")
    }
}

fn describe_attempts(attempts: &[AttemptFailure]) -> String {
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.attempt, a.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttemptKind;

    fn failed_chain() -> LoadError {
        LoadError::AllAttemptsFailed {
            path: PathBuf::from("data.csv"),
            attempts: vec![
                AttemptFailure {
                    attempt: AttemptKind::Spreadsheet,
                    reason: "not a workbook".to_string(),
                },
                AttemptFailure {
                    attempt: AttemptKind::Delimited(TextEncoding::Utf8),
                    reason: "bytes are not valid utf-8".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_error_code() {
        assert_eq!(failed_chain().error_code(), "ALL_ATTEMPTS_FAILED");
        let err = LoadError::NoFileFound {
            directory: PathBuf::from("."),
            listing: vec![],
        };
        assert_eq!(err.error_code(), "NO_FILE_FOUND");
    }

    #[test]
    fn test_message_names_every_attempt() {
        let msg = failed_chain().to_string();
        assert!(msg.contains("2 attempts failed"));
        assert!(msg.contains("spreadsheet: not a workbook"));
        assert!(msg.contains("delimited text (utf-8)"));
    }

    #[test]
    fn test_no_file_message_lists_directory() {
        let err = LoadError::NoFileFound {
            directory: PathBuf::from("/srv/app"),
            listing: vec!["app.py".to_string(), "notes.md".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("/srv/app"));
        assert!(msg.contains("app.py, notes.md"));

        let empty = LoadError::NoFileFound {
            directory: PathBuf::from("/srv/app"),
            listing: vec![],
        };
        assert!(empty.to_string().contains("contains: nothing"));
    }

    #[test]
    fn test_error_serialization() {
        let json = serde_json::to_value(failed_chain()).unwrap();
        assert_eq!(json["code"], "ALL_ATTEMPTS_FAILED");
        assert_eq!(json["attempts"].as_array().unwrap().len(), 2);
        assert_eq!(json["attempts"][0]["attempt"], "spreadsheet");
        assert!(json["listing"].as_array().unwrap().is_empty());
    }
}
