//! Workbook attempt.
//!
//! The format is detected from the bytes, not the file name: sheets are often
//! saved as a workbook under a `.csv` name.

use std::io::Cursor;

use calamine::{Data, DataType, Reader, open_workbook_auto_from_rs};

use crate::error::AttemptError;
use crate::types::{Cell, RawTable};

/// Read the first worksheet of a workbook held in memory.
pub(crate) fn parse_workbook(bytes: &[u8]) -> Result<RawTable, AttemptError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(AttemptError::NoWorksheet)??;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(to_cell).collect::<Vec<_>>());

    let header = rows
        .by_ref()
        .find(|row| row.iter().any(|c| !c.is_blank()))
        .ok_or(AttemptError::NoHeader)?;

    let columns: Vec<String> = header
        .iter()
        .map(|c| c.display().unwrap_or_default())
        .collect();
    let rows: Vec<Vec<Cell>> = rows.collect();

    if rows.is_empty() {
        return Err(AttemptError::NoDataRows);
    }

    Ok(RawTable {
        columns,
        rows,
        skipped_lines: 0,
    })
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        other => other
            .as_datetime()
            .map(Cell::Date)
            .unwrap_or_else(|| Cell::Text(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_workbook() {
        let result = parse_workbook(b"Project Name,Developer\nMarina View,Emaar\n");
        assert!(matches!(result, Err(AttemptError::Workbook(_))));
    }

    #[test]
    fn test_cell_conversion() {
        assert_eq!(to_cell(&Data::Empty), Cell::Empty);
        assert_eq!(to_cell(&Data::Int(2025)), Cell::Number(2025.0));
        assert_eq!(
            to_cell(&Data::String("Emaar".into())),
            Cell::Text("Emaar".to_string())
        );
        assert_eq!(to_cell(&Data::Bool(true)), Cell::Bool(true));
    }
}
