//! Configuration types for loading and resolving a project sheet.
//!
//! Both configs use the builder pattern and derive serde so they can be built
//! from CLI flags or read from JSON. Resolver keyword lists are configuration,
//! not constants: real-world header text varies too much to hard-code them.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::types::{FieldRole, TextEncoding};

/// Canonical header of the project-name column.
pub const DEFAULT_NAME_HEADER: &str = "Project Name";

// ============================================================================
// Loader configuration
// ============================================================================

/// Configuration for [`crate::loader::Loader`].
///
/// # Example
///
/// ```rust,ignore
/// use project_deck::config::LoaderConfig;
///
/// let config = LoaderConfig::builder()
///     .source_hint("projects.csv")
///     .working_dir("/srv/dashboard")
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Exact file name to look for first.
    /// Default: "data.csv"
    pub source_hint: String,

    /// Directory searched when the hint does not exist.
    /// Default: "."
    pub working_dir: PathBuf,

    /// Encodings tried by the delimited-text attempts, most likely first.
    /// Default: utf-8, windows-1252, latin-1, utf-16
    pub encodings: Vec<TextEncoding>,

    /// Workbook extensions (preferred during directory scans).
    pub spreadsheet_extensions: Vec<String>,

    /// Delimited-text extensions.
    pub delimited_extensions: Vec<String>,

    /// Delimiters considered when sniffing delimited text.
    /// Default: `,` `;` tab `|`
    pub delimiter_candidates: Vec<char>,

    /// Header of the name column; rows repeating it as a value are dropped.
    /// [`crate::load_dataset`] sets it from [`ResolverConfig::name_header`].
    /// Default: "Project Name"
    pub name_header: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            source_hint: "data.csv".to_string(),
            working_dir: PathBuf::from("."),
            encodings: vec![
                TextEncoding::Utf8,
                TextEncoding::Windows1252,
                TextEncoding::Latin1,
                TextEncoding::Utf16,
            ],
            spreadsheet_extensions: ["xlsx", "xlsm", "xlsb", "xls", "ods"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            delimited_extensions: ["csv", "tsv", "txt"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            delimiter_candidates: vec![',', ';', '\t', '|'],
            name_header: DEFAULT_NAME_HEADER.to_string(),
        }
    }
}

impl LoaderConfig {
    pub fn builder() -> LoaderConfigBuilder {
        LoaderConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.encodings.is_empty() {
            return Err(ConfigError::EmptyList("encodings".to_string()));
        }
        if self.delimiter_candidates.is_empty() {
            return Err(ConfigError::EmptyList("delimiter_candidates".to_string()));
        }
        if let Some(bad) = self.delimiter_candidates.iter().find(|c| !c.is_ascii()) {
            return Err(ConfigError::InvalidDelimiter(*bad));
        }
        if self.name_header.trim().is_empty() {
            return Err(ConfigError::EmptyNameHeader);
        }
        Ok(())
    }
}

/// Builder for [`LoaderConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct LoaderConfigBuilder {
    source_hint: Option<String>,
    working_dir: Option<PathBuf>,
    encodings: Option<Vec<TextEncoding>>,
    delimiter_candidates: Option<Vec<char>>,
    name_header: Option<String>,
}

impl LoaderConfigBuilder {
    /// Set the file name looked up before scanning the directory.
    pub fn source_hint(mut self, hint: impl Into<String>) -> Self {
        self.source_hint = Some(hint.into());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set the encodings tried for delimited text, in order.
    pub fn encodings(mut self, encodings: impl IntoIterator<Item = TextEncoding>) -> Self {
        self.encodings = Some(encodings.into_iter().collect());
        self
    }

    pub fn delimiter_candidates(mut self, delimiters: impl IntoIterator<Item = char>) -> Self {
        self.delimiter_candidates = Some(delimiters.into_iter().collect());
        self
    }

    pub fn name_header(mut self, header: impl Into<String>) -> Self {
        self.name_header = Some(header.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `LoaderConfig` or an error if validation fails.
    pub fn build(self) -> Result<LoaderConfig, ConfigError> {
        let defaults = LoaderConfig::default();
        let config = LoaderConfig {
            source_hint: self.source_hint.unwrap_or(defaults.source_hint),
            working_dir: self.working_dir.unwrap_or(defaults.working_dir),
            encodings: self.encodings.unwrap_or(defaults.encodings),
            spreadsheet_extensions: defaults.spreadsheet_extensions,
            delimited_extensions: defaults.delimited_extensions,
            delimiter_candidates: self
                .delimiter_candidates
                .unwrap_or(defaults.delimiter_candidates),
            name_header: self.name_header.unwrap_or(defaults.name_header),
        };

        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Resolver configuration
// ============================================================================

/// Keyword and positional rule for one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RoleRule {
    /// Case-insensitive substrings matched against column names.
    pub keywords: Vec<String>,
    /// Column index used when no keyword matches.
    pub position: Option<usize>,
}

impl RoleRule {
    pub fn new(keywords: &[&str], position: Option<usize>) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            position,
        }
    }

    /// Built-in rule for a role.
    pub fn default_for(role: FieldRole) -> Self {
        match role {
            FieldRole::Name => Self::new(&["project", "name"], Some(0)),
            FieldRole::Developer => Self::new(&["developer", "dev"], Some(1)),
            FieldRole::Area => Self::new(&["area", "community", "location"], Some(2)),
            FieldRole::HandoverDate => Self::new(&["handover", "completion"], Some(3)),
            FieldRole::LaunchDate => Self::new(&["launch"], None),
            FieldRole::Link => Self::new(&["agent pack", "drive", "pack", "link"], Some(4)),
        }
    }
}

/// Configuration for [`crate::resolver::FieldResolver`].
///
/// Roles missing from `roles` fall back to their built-in rule, and a listed
/// role keeps the built-in value of any field it leaves out, so a JSON file
/// only needs to list what it overrides:
///
/// ```json
/// { "roles": { "link": { "keywords": ["brochure", "drive"] } } }
/// ```
///
/// `"position": null` switches the positional fallback off for a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    #[serde(deserialize_with = "deserialize_roles")]
    pub roles: BTreeMap<FieldRole, RoleRule>,

    /// Substrings that mark a value as a document link even without a scheme.
    pub link_hosts: Vec<String>,

    /// Names shorter than this (in characters, after trimming) are not rendered.
    /// Default: 2
    pub min_name_length: usize,

    /// Rows whose name equals this header are leftover header rows.
    /// Also used by [`crate::load_dataset`] for the loader's header-row drop.
    /// Default: "Project Name"
    pub name_header: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            roles: FieldRole::ALL
                .into_iter()
                .map(|role| (role, RoleRule::default_for(role)))
                .collect(),
            link_hosts: [
                "drive.google.com",
                "docs.google.com",
                "dropbox.com",
                "onedrive.live.com",
                "1drv.ms",
                "sharepoint.com",
                "box.com",
                "bit.ly",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            min_name_length: 2,
            name_header: DEFAULT_NAME_HEADER.to_string(),
        }
    }
}

impl ResolverConfig {
    pub fn builder() -> ResolverConfigBuilder {
        ResolverConfigBuilder::default()
    }

    /// Rule for a role, falling back to the built-in one.
    pub fn rule(&self, role: FieldRole) -> RoleRule {
        self.roles
            .get(&role)
            .cloned()
            .unwrap_or_else(|| RoleRule::default_for(role))
    }

    /// Read a resolver configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ResolverConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (role, rule) in &self.roles {
            if rule.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(ConfigError::EmptyKeyword(*role));
            }
        }
        if self.min_name_length == 0 {
            return Err(ConfigError::InvalidMinNameLength(self.min_name_length));
        }
        if self.name_header.trim().is_empty() {
            return Err(ConfigError::EmptyNameHeader);
        }
        Ok(())
    }
}

/// A role rule as written in JSON: absent fields keep the built-in value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RoleRuleOverride {
    keywords: Option<Vec<String>>,
    /// Outer `None` when the field is absent, `Some(None)` for an explicit null.
    #[serde(deserialize_with = "present")]
    position: Option<Option<usize>>,
}

impl RoleRuleOverride {
    fn apply(self, role: FieldRole) -> RoleRule {
        let mut rule = RoleRule::default_for(role);
        if let Some(keywords) = self.keywords {
            rule.keywords = keywords;
        }
        if let Some(position) = self.position {
            rule.position = position;
        }
        rule
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn deserialize_roles<'de, D>(deserializer: D) -> Result<BTreeMap<FieldRole, RoleRule>, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = BTreeMap::<FieldRole, RoleRuleOverride>::deserialize(deserializer)?;
    let mut roles = ResolverConfig::default().roles;
    roles.extend(
        overrides
            .into_iter()
            .map(|(role, rule)| (role, rule.apply(role))),
    );
    Ok(roles)
}

/// Builder for [`ResolverConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ResolverConfigBuilder {
    roles: BTreeMap<FieldRole, RoleRule>,
    link_hosts: Option<Vec<String>>,
    min_name_length: Option<usize>,
    name_header: Option<String>,
}

impl ResolverConfigBuilder {
    /// Replace the keyword list of a role, keeping its default position.
    pub fn keywords<I, S>(mut self, role: FieldRole, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rule = self
            .roles
            .entry(role)
            .or_insert_with(|| RoleRule::default_for(role));
        rule.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the positional fallback of a role.
    pub fn position(mut self, role: FieldRole, position: Option<usize>) -> Self {
        let rule = self
            .roles
            .entry(role)
            .or_insert_with(|| RoleRule::default_for(role));
        rule.position = position;
        self
    }

    pub fn link_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.link_hosts = Some(hosts.into_iter().map(Into::into).collect());
        self
    }

    pub fn min_name_length(mut self, len: usize) -> Self {
        self.min_name_length = Some(len);
        self
    }

    pub fn name_header(mut self, header: impl Into<String>) -> Self {
        self.name_header = Some(header.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<ResolverConfig, ConfigError> {
        let mut config = ResolverConfig::default();
        config.roles.extend(self.roles);
        if let Some(hosts) = self.link_hosts {
            config.link_hosts = hosts;
        }
        if let Some(len) = self.min_name_length {
            config.min_name_length = len;
        }
        if let Some(header) = self.name_header {
            config.name_header = header;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Errors that can occur while building or reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("'{0}' must not be empty")]
    EmptyList(String),

    #[error("Invalid delimiter {0:?} (must be a single ASCII character)")]
    InvalidDelimiter(char),

    #[error("Empty keyword configured for role {0:?}")]
    EmptyKeyword(FieldRole),

    #[error("Invalid minimum name length: {0} (must be at least 1)")]
    InvalidMinNameLength(usize),

    #[error("Name header must not be blank")]
    EmptyNameHeader,

    #[error("Failed to read config '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}
