//! The normalized, read-only table handed from the loader to the resolver.

use polars::prelude::*;

/// A cleaned table backed by a polars [`DataFrame`] of nullable string columns.
///
/// Only the loader builds these. Once built, a table is never mutated; callers
/// read cells through [`NormalizedTable::value`] or borrow the frame directly.
///
/// Invariants after [`crate::loader::Loader::load`]:
/// - column names are unique and trimmed,
/// - no row and no column is entirely null,
/// - blank cells are stored as null, never as empty strings.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    df: DataFrame,
    columns: Vec<String>,
}

impl NormalizedTable {
    /// Build a table from named string columns of equal length.
    pub(crate) fn from_string_columns(
        columns: Vec<(String, Vec<Option<String>>)>,
    ) -> PolarsResult<Self> {
        let columns: Vec<Column> = columns
            .into_iter()
            .map(|(name, values)| Column::new(name.as_str().into(), values))
            .collect();
        Ok(Self::from_dataframe(DataFrame::new(columns)?))
    }

    pub(crate) fn from_dataframe(df: DataFrame) -> Self {
        let columns = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        Self { df, columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn width(&self) -> usize {
        self.df.width()
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0 || self.width() == 0
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell text at `(row, col)`; `None` for null cells and out-of-range positions.
    pub fn value(&self, row: usize, col: usize) -> Option<&str> {
        if row >= self.height() {
            return None;
        }
        let column = self.df.get_columns().get(col)?;
        column.str().ok()?.get(row)
    }

    /// All cells of a row in column order.
    pub fn row_values(&self, row: usize) -> impl Iterator<Item = Option<&str>> + '_ {
        (0..self.width()).map(move |col| self.value(row, col))
    }

    pub fn as_dataframe(&self) -> &DataFrame {
        &self.df
    }
}
