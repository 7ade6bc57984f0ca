//! Link detection and per-row link rescue.
//!
//! Sheets are maintained by hand, so document links end up in the wrong
//! column, wrapped in prose, or pasted without a scheme.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ResolverConfig;
use crate::table::NormalizedTable;
use crate::types::{FieldRole, FieldRoleMap, Link};

static ABSOLUTE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bhttps?://[^\s<>"']+"#).expect("Invalid regex: absolute URL")
});

/// Characters that end a sentence rather than a URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '>'];
const LEADING_PUNCTUATION: &[char] = &['(', '[', '{', '<', '"', '\''];

/// Finds document links in cell text.
#[derive(Debug, Clone)]
pub struct LinkDetector {
    hosts: Vec<String>,
}

impl LinkDetector {
    /// `hosts` are domains (e.g. `drive.google.com`) that mark a token as a
    /// link even without a scheme. A token matches when its host is the domain
    /// or a subdomain of it.
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| h.as_ref().trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// Extract an absolute URL from `value`.
    ///
    /// An explicit `http(s)://` URL anywhere in the text wins. Otherwise the
    /// first whitespace-separated token containing a known host marker is
    /// returned with `https://` prepended.
    pub fn extract(&self, value: &str) -> Option<String> {
        if let Some(found) = ABSOLUTE_URL.find(value) {
            let url = found.as_str().trim_end_matches(TRAILING_PUNCTUATION);
            return Some(url.to_string());
        }

        value.split_whitespace().find_map(|token| {
            let token = token
                .trim_start_matches(LEADING_PUNCTUATION)
                .trim_end_matches(TRAILING_PUNCTUATION);
            // E-mail addresses on a host domain are not documents.
            if token.contains('@') {
                return None;
            }
            let token = token.trim_start_matches('/');
            if !self.is_known_host(token) {
                return None;
            }
            Some(format!("https://{}", token))
        })
    }

    /// Whether the host part of `token` (up to the first `/`, `?`, `#` or `:`)
    /// is one of the markers or a subdomain of one.
    fn is_known_host(&self, token: &str) -> bool {
        let host = token
            .split(['/', '?', '#', ':'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        self.hosts.iter().any(|marker| {
            host == *marker
                || host
                    .strip_suffix(marker.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// Link for one table row.
    ///
    /// The resolved link column is checked first; when it has nothing usable,
    /// the remaining cells are scanned left to right. No match is
    /// [`Link::Absent`].
    pub fn rescue(&self, table: &NormalizedTable, roles: &FieldRoleMap, row: usize) -> Link {
        let link_col = roles.index(FieldRole::Link);

        let from_link_column = link_col
            .and_then(|col| table.value(row, col))
            .and_then(|value| self.extract(value));
        if let Some(url) = from_link_column {
            return Link::Present(url);
        }

        table
            .row_values(row)
            .enumerate()
            .filter(|(col, _)| Some(*col) != link_col)
            .find_map(|(_, value)| value.and_then(|v| self.extract(v)))
            .map_or(Link::Absent, Link::Present)
    }
}

impl Default for LinkDetector {
    fn default() -> Self {
        Self::new(ResolverConfig::default().link_hosts)
    }
}
