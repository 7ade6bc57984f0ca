//! Shared text helpers for headers and cell values.

/// Normalize header text: every embedded line break becomes one space, then the
/// result is trimmed.
///
/// The operation is idempotent.
///
/// ```rust,ignore
/// assert_eq!(normalize_header("Agent Pack\n(Google Drive) "), "Agent Pack (Google Drive)");
/// ```
pub fn normalize_header(raw: &str) -> String {
    raw.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

/// Placeholder name for a blank header at `index`.
pub fn unnamed_header(index: usize) -> String {
    format!("Unnamed: {index}")
}

/// Whether a value is the stringified-null artifact `nan` (any case).
pub fn is_nan_text(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("nan")
}

/// Case-insensitive, whitespace-trimmed equality.
pub fn same_text(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
