//! Field resolution: attaching semantic roles to whatever columns a sheet has.
//!
//! Each role is resolved independently in three tiers:
//!
//! 1. **Keyword**: the leftmost column whose lowercased name contains one of
//!    the role's keywords.
//! 2. **Positional**: the role's default column index, if the table is wide
//!    enough.
//! 3. **Unresolved**.
//!
//! Resolution never fails. An unresolved role simply yields no values.

mod link;

pub use link::LinkDetector;

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::table::NormalizedTable;
use crate::types::{ColumnResolution, FieldRole, FieldRoleMap};
use crate::utils::{is_nan_text, same_text};

/// Maps semantic roles onto table columns and decides which rows are cards.
#[derive(Debug, Clone, Default)]
pub struct FieldResolver {
    config: ResolverConfig,
    links: LinkDetector,
}

impl FieldResolver {
    pub fn new(config: ResolverConfig) -> Self {
        let links = LinkDetector::new(&config.link_hosts);
        Self { config, links }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn links(&self) -> &LinkDetector {
        &self.links
    }

    /// Resolve every role against the table's columns.
    pub fn resolve(&self, table: &NormalizedTable) -> FieldRoleMap {
        self.resolve_columns(table.columns())
    }

    /// Resolve every role against a list of column names.
    pub fn resolve_columns(&self, columns: &[String]) -> FieldRoleMap {
        let roles: BTreeMap<FieldRole, ColumnResolution> = FieldRole::ALL
            .into_iter()
            .map(|role| (role, self.resolve_role(role, columns)))
            .collect();

        for (role, resolution) in &roles {
            debug!("Role {:?} -> {:?}", role, resolution);
        }
        if !roles[&FieldRole::Name].is_resolved() {
            warn!("No column could be used as the project name; no cards will be shown");
        }

        FieldRoleMap::new(roles)
    }

    /// Resolve a single role.
    pub fn resolve_role(&self, role: FieldRole, columns: &[String]) -> ColumnResolution {
        let rule = self.config.rule(role);
        let keywords: Vec<String> = rule
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        for (index, column) in columns.iter().enumerate() {
            let lower = column.to_lowercase();
            if let Some(keyword) = keywords.iter().find(|k| lower.contains(k.as_str())) {
                return ColumnResolution::Keyword {
                    column: column.clone(),
                    index,
                    keyword: keyword.clone(),
                };
            }
        }

        match rule.position.and_then(|i| columns.get(i).map(|c| (i, c))) {
            Some((index, column)) => ColumnResolution::Positional {
                column: column.clone(),
                index,
            },
            None => ColumnResolution::Unresolved,
        }
    }

    /// Whether a name value qualifies its row as a card.
    ///
    /// Rejects missing and blank values, values shorter than
    /// `min_name_length` characters, the `nan` artifact and leftover copies of
    /// the name header.
    pub fn is_renderable_name(&self, value: Option<&str>) -> bool {
        let Some(value) = value.map(str::trim) else {
            return false;
        };
        !value.is_empty()
            && value.chars().count() >= self.config.min_name_length
            && !is_nan_text(value)
            && !same_text(value, &self.config.name_header)
    }
}
