//! Header normalization and removal of degenerate rows and columns.

use std::collections::HashSet;

use polars::prelude::*;
use tracing::debug;

use crate::table::NormalizedTable;
use crate::types::{Cell, RawTable};
use crate::utils::{normalize_header, unnamed_header};

/// What normalization removed, merged into the load report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct NormalizeStats {
    pub duplicate_columns: Vec<String>,
    pub empty_columns: Vec<String>,
    pub empty_rows: usize,
    pub header_rows: usize,
}

/// Turn a raw table into a [`NormalizedTable`].
///
/// 1. Header text: line breaks become spaces, then trim; blank headers are named
///    `Unnamed: {index}`.
/// 2. Duplicate names keep the first column and drop the later ones.
/// 3. Rows repeating `name_header` inside the `name_header` column are dropped.
/// 4. All-null rows are dropped, then all-null columns.
///
/// Header rows go first so a column that only held a repeated header ends up
/// empty and is dropped in step 4.
pub(crate) fn normalize(
    raw: RawTable,
    name_header: &str,
) -> PolarsResult<(NormalizedTable, NormalizeStats)> {
    let mut stats = NormalizeStats::default();

    let mut seen = HashSet::new();
    let mut kept: Vec<(usize, String)> = Vec::with_capacity(raw.columns.len());
    for (index, header) in raw.columns.iter().enumerate() {
        let mut name = normalize_header(header);
        if name.is_empty() {
            name = unnamed_header(index);
        }
        if seen.insert(name.clone()) {
            kept.push((index, name));
        } else {
            debug!("Dropping duplicate column '{}' at position {}", name, index);
            stats.duplicate_columns.push(name);
        }
    }

    let columns = kept
        .into_iter()
        .map(|(index, name)| {
            let values = raw
                .rows
                .iter()
                .map(|row| row.get(index).and_then(Cell::display))
                .collect();
            (name, values)
        })
        .collect();

    let table = NormalizedTable::from_string_columns(columns)?;
    let mut df = table.as_dataframe().clone();

    // Re-embedded header rows
    if let Ok(column) = df.column(name_header) {
        let values = column.str()?;
        let keep: Vec<bool> = values
            .into_iter()
            .map(|v| v.is_none_or(|v| v.trim() != name_header))
            .collect();
        let dropped = keep.iter().filter(|k| !**k).count();
        if dropped > 0 {
            let mask = BooleanChunked::from_slice("keep".into(), &keep);
            df = df.filter(&mask)?;
            stats.header_rows = dropped;
            debug!("Removed {} repeated header rows", dropped);
        }
    }

    // Rows without a single value
    let before_rows = df.height();
    let mut has_value = vec![false; before_rows];
    for column in df.get_columns() {
        for (row, value) in column.str()?.into_iter().enumerate() {
            if value.is_some() {
                has_value[row] = true;
            }
        }
    }
    if has_value.iter().any(|v| !v) {
        let mask = BooleanChunked::from_slice("has_value".into(), &has_value);
        df = df.filter(&mask)?;
    }
    stats.empty_rows = before_rows - df.height();

    // Columns without a single value
    let empty_columns: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| c.null_count() == c.len())
        .map(|c| c.name().to_string())
        .collect();
    if !empty_columns.is_empty() {
        let names: Vec<PlSmallStr> = empty_columns.iter().map(|s| s.as_str().into()).collect();
        df = df.drop_many(names);
        debug!("Dropped {} empty columns", empty_columns.len());
    }
    stats.empty_columns = empty_columns;

    Ok((NormalizedTable::from_dataframe(df), stats))
}
