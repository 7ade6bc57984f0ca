//! Project cards built from a loaded table and its resolved roles.

mod search;

pub use search::{FilterOptions, SearchQuery};

use crate::loader::LoadedTable;
use crate::resolver::FieldResolver;
use crate::table::NormalizedTable;
use crate::types::{FieldRole, FieldRoleMap, LoadReport, Record, SourceFile};
use crate::utils::is_nan_text;

/// A loaded table together with its role map; the unit the cache stores.
///
/// Roles are resolved once, when the dataset is built. Records are derived on
/// demand and never stored.
#[derive(Debug)]
pub struct Dataset {
    source: SourceFile,
    table: NormalizedTable,
    roles: FieldRoleMap,
    report: LoadReport,
    resolver: FieldResolver,
}

impl Dataset {
    pub fn new(loaded: LoadedTable, resolver: FieldResolver) -> Self {
        let roles = resolver.resolve(&loaded.table);
        Self {
            source: loaded.source,
            table: loaded.table,
            roles,
            report: loaded.report,
            resolver,
        }
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn table(&self) -> &NormalizedTable {
        &self.table
    }

    pub fn roles(&self) -> &FieldRoleMap {
        &self.roles
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn resolver(&self) -> &FieldResolver {
        &self.resolver
    }

    /// The card for a table row, or `None` when the row fails the name check.
    pub fn record(&self, row: usize) -> Option<Record> {
        let name_col = self.roles.index(FieldRole::Name)?;
        let name = self.table.value(row, name_col);
        if !self.resolver.is_renderable_name(name) {
            return None;
        }

        Some(Record {
            row,
            name: name?.trim().to_string(),
            developer: self.role_value(row, FieldRole::Developer),
            area: self.role_value(row, FieldRole::Area),
            handover_date: self.role_value(row, FieldRole::HandoverDate),
            launch_date: self.role_value(row, FieldRole::LaunchDate),
            link: self.resolver.links().rescue(&self.table, &self.roles, row),
        })
    }

    /// Valid records in table order.
    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        (0..self.table.height()).filter_map(move |row| self.record(row))
    }

    /// Valid records that satisfy `query`, in table order.
    pub fn search<'a>(&'a self, query: &'a SearchQuery) -> impl Iterator<Item = Record> + 'a {
        self.records()
            .filter(move |record| query.matches(&self.table, record))
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions::collect(&self.records().collect::<Vec<_>>())
    }

    fn role_value(&self, row: usize, role: FieldRole) -> Option<String> {
        let col = self.roles.index(role)?;
        self.table
            .value(row, col)
            .map(str::trim)
            .filter(|v| !v.is_empty() && !is_nan_text(v))
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Link, SourceFormat, TextEncoding};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn dataset(columns: &[&str], rows: &[&[&str]]) -> Dataset {
        let columns = columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let values = rows
                    .iter()
                    .map(|row| Some(row[i]).filter(|v| !v.is_empty()).map(str::to_string))
                    .collect();
                (name.to_string(), values)
            })
            .collect();
        let loaded = LoadedTable {
            source: SourceFile {
                path: PathBuf::from("data.csv"),
                format: SourceFormat::Delimited {
                    encoding: TextEncoding::Utf8,
                    delimiter: ',',
                },
            },
            table: NormalizedTable::from_string_columns(columns).unwrap(),
            report: LoadReport::default(),
        };
        Dataset::new(loaded, FieldResolver::default())
    }

    const HEADER: [&str; 5] = [
        "Project Name",
        "Developer",
        "Community/Area",
        "Handover Date",
        "Agent Pack   (Google Drive)",
    ];

    #[test]
    fn test_marina_view_card() {
        let data = dataset(
            &HEADER,
            &[&[
                "Marina View",
                "Emaar",
                "Dubai Marina",
                "Q4 2025",
                "https://drive.google.com/x",
            ]],
        );

        let records: Vec<Record> = data.records().collect();
        assert_eq!(
            records,
            vec![Record {
                row: 0,
                name: "Marina View".to_string(),
                developer: Some("Emaar".to_string()),
                area: Some("Dubai Marina".to_string()),
                handover_date: Some("Q4 2025".to_string()),
                launch_date: None,
                link: Link::Present("https://drive.google.com/x".to_string()),
            }]
        );
    }

    #[test]
    fn test_invalid_names_are_not_cards() {
        let data = dataset(
            &HEADER,
            &[
                &["Marina View", "Emaar", "Dubai Marina", "Q4 2025", ""],
                &["project name", "Developer", "Area", "Handover", "Pack"],
                &["nan", "Emaar", "Downtown", "", ""],
                &["", "Nakheel", "Palm", "", ""],
                &["X", "Nakheel", "Palm", "", ""],
            ],
        );
        let names: Vec<String> = data.records().map(|r| r.name).collect();
        assert_eq!(names, vec!["Marina View"]);
    }

    #[test]
    fn test_nan_role_values_become_missing() {
        let data = dataset(&HEADER, &[&["Marina View", "NaN", "", "Q4 2025", ""]]);
        let record = data.record(0).unwrap();
        assert_eq!(record.developer, None);
        assert_eq!(record.area, None);
        assert_eq!(record.link, Link::Absent);
    }

    #[test]
    fn test_unresolved_name_yields_no_records() {
        let data = dataset(&[], &[]);
        assert_eq!(data.records().count(), 0);
        assert_eq!(data.record(0), None);
    }

    #[test]
    fn test_search_for_developer_text() {
        let rows: Vec<Vec<String>> = (0..10)
            .map(|i| {
                let developer = if i == 3 { "Emaar" } else { "Sobha" };
                vec![
                    format!("Tower {i}"),
                    developer.to_string(),
                    "JVC".to_string(),
                    "2026".to_string(),
                    String::new(),
                ]
            })
            .collect();
        let borrowed: Vec<Vec<&str>> = rows
            .iter()
            .map(|r| r.iter().map(String::as_str).collect())
            .collect();
        let slices: Vec<&[&str]> = borrowed.iter().map(Vec::as_slice).collect();
        let data = dataset(&HEADER, &slices);

        let query = SearchQuery::new().with_text("Emaar");
        let hits: Vec<Record> = data.search(&query).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Tower 3");
    }

    #[test]
    fn test_filter_options_skip_invalid_rows() {
        let data = dataset(
            &HEADER,
            &[
                &["Marina View", "Emaar", "Dubai Marina", "", ""],
                &["nan", "Ghost Dev", "Nowhere", "", ""],
                &["Creek Rise", "Emaar", "Creek Harbour", "", ""],
            ],
        );
        let options = data.filter_options();
        assert_eq!(options.developers, vec!["Emaar"]);
        assert_eq!(options.areas, vec!["Creek Harbour", "Dubai Marina"]);
    }
}
