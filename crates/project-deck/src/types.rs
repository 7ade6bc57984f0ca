use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

// ============================================================================
// Raw input
// ============================================================================

/// A loosely-typed cell as it came out of the source file.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl Cell {
    /// Whether the cell carries no usable content (null or whitespace-only text).
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    /// Display-ready text for the cell, `None` when blank.
    ///
    /// Integral numbers drop the fractional part (`2025.0` → `2025`) and dates
    /// only show a time component when it is not midnight.
    pub fn display(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.trim().to_string()),
            Cell::Number(n) => Some(format_number(*n)),
            Cell::Bool(b) => Some(b.to_string()),
            Cell::Date(dt) => {
                if dt.time().num_seconds_from_midnight() == 0 {
                    Some(dt.format("%Y-%m-%d").to_string())
                } else {
                    Some(dt.format("%Y-%m-%d %H:%M").to_string())
                }
            }
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Table as produced by one successful load attempt, before any cleanup.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Header text exactly as found (may contain newlines and padding).
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// Lines dropped by the parser because they could not be aligned to the header.
    pub skipped_lines: usize,
}

// ============================================================================
// Source description
// ============================================================================

/// Text encodings tried by the delimited-text attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "windows-1252")]
    Windows1252,
    #[serde(rename = "latin-1")]
    Latin1,
    /// UTF-16, endianness taken from the byte-order mark (little-endian without one).
    #[serde(rename = "utf-16")]
    Utf16,
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Windows1252 => "windows-1252",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Utf16 => "utf-16",
        };
        f.write_str(label)
    }
}

/// One entry in the loader's fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptKind {
    Spreadsheet,
    Delimited(TextEncoding),
}

impl fmt::Display for AttemptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptKind::Spreadsheet => f.write_str("spreadsheet"),
            AttemptKind::Delimited(encoding) => write!(f, "delimited text ({encoding})"),
        }
    }
}

impl Serialize for AttemptKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// A failed attempt, kept for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptFailure {
    pub attempt: AttemptKind,
    pub reason: String,
}

/// How the source file was successfully read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceFormat {
    Spreadsheet,
    Delimited {
        encoding: TextEncoding,
        delimiter: char,
    },
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Spreadsheet => f.write_str("spreadsheet"),
            SourceFormat::Delimited {
                encoding,
                delimiter,
            } => write!(f, "delimited text ({encoding}, {delimiter:?})"),
        }
    }
}

/// The file a dataset was loaded from.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub format: SourceFormat,
}

/// What the loader had to do to get a clean table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    /// Attempts that failed before the successful one.
    pub failed_attempts: Vec<AttemptFailure>,
    pub skipped_lines: usize,
    pub duplicate_columns_dropped: Vec<String>,
    pub empty_columns_dropped: Vec<String>,
    pub empty_rows_dropped: usize,
    pub header_rows_dropped: usize,
}

// ============================================================================
// Field roles
// ============================================================================

/// Semantic role a column can play on a project card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    Name,
    Developer,
    Area,
    HandoverDate,
    LaunchDate,
    Link,
}

impl FieldRole {
    pub const ALL: [FieldRole; 6] = [
        FieldRole::Name,
        FieldRole::Developer,
        FieldRole::Area,
        FieldRole::HandoverDate,
        FieldRole::LaunchDate,
        FieldRole::Link,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FieldRole::Name => "Project Name",
            FieldRole::Developer => "Developer",
            FieldRole::Area => "Area",
            FieldRole::HandoverDate => "Handover Date",
            FieldRole::LaunchDate => "Launch Date",
            FieldRole::Link => "Link",
        }
    }
}

/// How a role ended up attached to a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ColumnResolution {
    /// The column name contains one of the role's keywords.
    Keyword {
        column: String,
        index: usize,
        keyword: String,
    },
    /// No keyword matched; the role's default position was used.
    Positional { column: String, index: usize },
    Unresolved,
}

impl ColumnResolution {
    pub fn index(&self) -> Option<usize> {
        match self {
            ColumnResolution::Keyword { index, .. } | ColumnResolution::Positional { index, .. } => {
                Some(*index)
            }
            ColumnResolution::Unresolved => None,
        }
    }

    pub fn column(&self) -> Option<&str> {
        match self {
            ColumnResolution::Keyword { column, .. }
            | ColumnResolution::Positional { column, .. } => Some(column),
            ColumnResolution::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, ColumnResolution::Unresolved)
    }
}

static UNRESOLVED: ColumnResolution = ColumnResolution::Unresolved;

/// Role → column mapping for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRoleMap {
    roles: BTreeMap<FieldRole, ColumnResolution>,
}

impl FieldRoleMap {
    pub(crate) fn new(roles: BTreeMap<FieldRole, ColumnResolution>) -> Self {
        Self { roles }
    }

    pub fn get(&self, role: FieldRole) -> &ColumnResolution {
        self.roles.get(&role).unwrap_or(&UNRESOLVED)
    }

    /// Column index for a role, `None` when unresolved.
    pub fn index(&self, role: FieldRole) -> Option<usize> {
        self.get(role).index()
    }

    pub fn column(&self, role: FieldRole) -> Option<&str> {
        self.get(role).column()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldRole, &ColumnResolution)> {
        FieldRole::ALL.into_iter().map(move |role| (role, self.get(role)))
    }
}

// ============================================================================
// Records
// ============================================================================

/// External document link for a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "url", rename_all = "snake_case")]
pub enum Link {
    /// Absolute URL.
    Present(String),
    /// No cell in the row holds anything that looks like a link.
    Absent,
}

impl Link {
    pub fn url(&self) -> Option<&str> {
        match self {
            Link::Present(url) => Some(url),
            Link::Absent => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Link::Present(_))
    }
}

/// One displayable project card.
///
/// Missing values stay `None`; the presentation layer picks the placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Row index in the normalized table.
    pub row: usize,
    pub name: String,
    pub developer: Option<String>,
    pub area: Option<String>,
    pub handover_date: Option<String>,
    pub launch_date: Option<String>,
    pub link: Link,
}

impl Record {
    /// Display value of a text role, or the given placeholder.
    pub fn display_or<'a>(&'a self, role: FieldRole, placeholder: &'a str) -> &'a str {
        let value = match role {
            FieldRole::Name => Some(self.name.as_str()),
            FieldRole::Developer => self.developer.as_deref(),
            FieldRole::Area => self.area.as_deref(),
            FieldRole::HandoverDate => self.handover_date.as_deref(),
            FieldRole::LaunchDate => self.launch_date.as_deref(),
            FieldRole::Link => self.link.url(),
        };
        value.unwrap_or(placeholder)
    }
}
