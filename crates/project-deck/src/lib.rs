//! Project Sheet Loader Library
//!
//! Turns one hand-maintained real-estate project sheet into a searchable list of
//! project cards, without assuming the sheet is clean.
//!
//! # Overview
//!
//! - **Loader**: finds the sheet, reads it as a workbook or as delimited text in
//!   several encodings, and normalizes headers, rows and columns
//! - **Field Resolver**: maps semantic roles (name, developer, area, dates,
//!   link) onto whatever columns the sheet has, by keyword and then by position
//! - **Records**: valid project cards with link rescue, free-text search and
//!   exact developer/area filters
//! - **Cache**: a process-wide, modification-time-aware memo of the last load
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use project_deck::{FieldRole, LoaderConfig, ResolverConfig, SearchQuery, load_dataset};
//!
//! let loader = LoaderConfig::builder()
//!     .working_dir("/srv/dashboard")
//!     .build()?;
//!
//! let dataset = load_dataset(&loader, &ResolverConfig::default())?;
//!
//! let query = SearchQuery::new().with_text("marina").with_developer("Emaar");
//! for record in dataset.search(&query) {
//!     println!("{} ({})", record.name, record.display_or(FieldRole::Area, "N/A"));
//! }
//! ```
//!
//! # Errors
//!
//! Loading fails with a [`LoadError`] that says why: no file in the directory
//! (with the listing), every format attempt failed (with each attempt's
//! reason), or nothing was left after cleanup. Resolution never fails; a role
//! that cannot be placed is reported as unresolved.

pub mod config;
pub mod error;
pub mod loader;
pub mod records;
pub mod resolver;
pub mod table;
pub mod types;
pub mod utils;

pub use config::{ConfigError, LoaderConfig, ResolverConfig, RoleRule};
pub use error::{AttemptError, LoadError, Result};
pub use loader::{DatasetCache, FileIdentity, LoadedTable, Loader, load_dataset};
pub use records::{Dataset, FilterOptions, SearchQuery};
pub use resolver::{FieldResolver, LinkDetector};
pub use table::NormalizedTable;
pub use types::{
    AttemptFailure, AttemptKind, Cell, ColumnResolution, FieldRole, FieldRoleMap, Link,
    LoadReport, Record, SourceFile, SourceFormat, TextEncoding,
};
