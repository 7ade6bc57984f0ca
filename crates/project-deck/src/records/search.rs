//! Search and filter predicates over records.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::table::NormalizedTable;
use crate::types::Record;

/// Free-text search plus exact developer/area filters.
///
/// Blank values mean "no filter". All present criteria must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    /// Case-insensitive substring matched against every cell of the row.
    pub text: String,
    pub developer: Option<String>,
    pub area: Option<String>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_developer(mut self, developer: impl Into<String>) -> Self {
        self.developer = Some(developer.into());
        self
    }

    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }

    /// Whether no criterion is set.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
            && active(self.developer.as_deref()).is_none()
            && active(self.area.as_deref()).is_none()
    }

    /// Test a record. Free text is matched against the raw row, not only the
    /// resolved fields, so notes and unmapped columns are searchable too.
    pub fn matches(&self, table: &NormalizedTable, record: &Record) -> bool {
        let needle = self.text.trim().to_lowercase();
        let text_ok = needle.is_empty()
            || table
                .row_values(record.row)
                .flatten()
                .any(|value| value.to_lowercase().contains(&needle));

        text_ok
            && exact(active(self.developer.as_deref()), record.developer.as_deref())
            && exact(active(self.area.as_deref()), record.area.as_deref())
    }
}

fn active(filter: Option<&str>) -> Option<&str> {
    filter.map(str::trim).filter(|f| !f.is_empty())
}

fn exact(filter: Option<&str>, value: Option<&str>) -> bool {
    match filter {
        Some(wanted) => value.is_some_and(|v| v.trim() == wanted),
        None => true,
    }
}

/// Distinct values offered by the developer and area filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub developers: Vec<String>,
    pub areas: Vec<String>,
}

impl FilterOptions {
    /// Sorted, de-duplicated developer and area values of `records`.
    pub fn collect<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let mut developers = BTreeSet::new();
        let mut areas = BTreeSet::new();
        for record in records {
            if let Some(developer) = &record.developer {
                developers.insert(developer.clone());
            }
            if let Some(area) = &record.area {
                areas.insert(area.clone());
            }
        }
        Self {
            developers: developers.into_iter().collect(),
            areas: areas.into_iter().collect(),
        }
    }
}
