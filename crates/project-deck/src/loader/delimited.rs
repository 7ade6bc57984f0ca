//! Delimited-text attempts: decoding, delimiter sniffing and best-effort parsing.

use csv::{ReaderBuilder, StringRecord};
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use tracing::debug;

use crate::error::AttemptError;
use crate::types::{Cell, RawTable, TextEncoding};

/// Records parsed per candidate when sniffing the delimiter.
const SNIFF_RECORDS: usize = 20;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Bytes Windows-1252 leaves unassigned; encoding_rs would map them to C1 controls.
const WINDOWS_1252_UNASSIGNED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// Encoding announced by a byte-order mark, if any.
pub(crate) fn bom_encoding(bytes: &[u8]) -> Option<TextEncoding> {
    let (encoding, _) = Encoding::for_bom(bytes)?;
    if encoding == UTF_8 {
        Some(TextEncoding::Utf8)
    } else {
        Some(TextEncoding::Utf16)
    }
}

/// Strictly decode `bytes`; malformed input fails the attempt instead of being
/// replaced.
pub(crate) fn decode(bytes: &[u8], encoding: TextEncoding) -> Result<String, AttemptError> {
    let text = match encoding {
        TextEncoding::Utf8 => {
            let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
            UTF_8
                .decode_without_bom_handling_and_without_replacement(body)
                .ok_or(AttemptError::Decode(encoding))?
                .into_owned()
        }
        TextEncoding::Windows1252 => {
            if bytes.iter().any(|b| WINDOWS_1252_UNASSIGNED.contains(b)) {
                return Err(AttemptError::Decode(encoding));
            }
            WINDOWS_1252
                .decode_without_bom_handling_and_without_replacement(bytes)
                .ok_or(AttemptError::Decode(encoding))?
                .into_owned()
        }
        TextEncoding::Latin1 => encoding_rs::mem::decode_latin1(bytes).into_owned(),
        TextEncoding::Utf16 => {
            let (utf16, body) = match Encoding::for_bom(bytes) {
                Some((found, bom_len)) if found == UTF_16BE || found == UTF_16LE => {
                    (found, &bytes[bom_len..])
                }
                _ => (UTF_16LE, bytes),
            };
            utf16
                .decode_without_bom_handling_and_without_replacement(body)
                .ok_or(AttemptError::Decode(encoding))?
                .into_owned()
        }
    };

    // A UTF-16 file read as an 8-bit encoding is full of NULs.
    if text.contains('\0') {
        return Err(AttemptError::NulCharacters);
    }
    Ok(text)
}

/// Pick the candidate delimiter whose first records have the most consistent
/// field count. Falls back to the first candidate when nothing splits the text.
pub(crate) fn sniff_delimiter(text: &str, candidates: &[char]) -> char {
    let fallback = candidates.first().copied().unwrap_or(',');
    let mut best = (fallback, 0.0f64);

    for &candidate in candidates {
        let Ok(delimiter) = u8::try_from(candidate) else {
            continue;
        };

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let counts: Vec<f64> = reader
            .records()
            .take(SNIFF_RECORDS)
            .filter_map(Result::ok)
            .filter(|r| r.iter().any(|f| !f.trim().is_empty()))
            .map(|r| r.len() as f64)
            .collect();

        if counts.is_empty() {
            continue;
        }

        let avg = counts.iter().sum::<f64>() / counts.len() as f64;
        if avg <= 1.0 {
            continue;
        }
        let variance = counts.iter().map(|c| (c - avg).powi(2)).sum::<f64>() / counts.len() as f64;
        let score = avg / (1.0 + variance.sqrt());

        if score > best.1 {
            best = (candidate, score);
        }
    }

    best.0
}

/// Parse delimited text with pandas-style `on_bad_lines="skip"` semantics.
///
/// The header is the first record with any non-blank field. Records with more
/// non-blank fields than the header are skipped, short records are padded, and
/// records the reader cannot decode are skipped.
pub(crate) fn parse_delimited(text: &str, delimiter: char) -> Result<RawTable, AttemptError> {
    let delimiter = u8::try_from(delimiter).unwrap_or(b',');
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut columns: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    let mut skipped_lines = 0;

    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping unreadable record {}: {}", index + 1, e);
                skipped_lines += 1;
                continue;
            }
        };

        let Some(width) = columns.as_ref().map(Vec::len) else {
            if record.iter().any(|f| !f.trim().is_empty()) {
                columns = Some(record.iter().map(str::to_string).collect());
            }
            continue;
        };

        match align_record(&record, width) {
            Some(cells) => rows.push(cells),
            None => {
                debug!(
                    "Skipping record {}: {} fields for {} columns",
                    index + 1,
                    record.len(),
                    width
                );
                skipped_lines += 1;
            }
        }
    }

    let columns = columns.ok_or(AttemptError::NoHeader)?;
    if rows.is_empty() {
        return Err(AttemptError::NoDataRows);
    }

    Ok(RawTable {
        columns,
        rows,
        skipped_lines,
    })
}

/// Fit a record to `width` cells. Trailing blank overflow (a stray delimiter at
/// the end of a line) is tolerated; real overflow means the line is malformed.
fn align_record(record: &StringRecord, width: usize) -> Option<Vec<Cell>> {
    if record.iter().skip(width).any(|f| !f.trim().is_empty()) {
        return None;
    }
    let mut cells: Vec<Cell> = record
        .iter()
        .take(width)
        .map(|f| {
            if f.trim().is_empty() {
                Cell::Empty
            } else {
                Cell::Text(f.to_string())
            }
        })
        .collect();
    cells.resize(width, Cell::Empty);
    Some(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le_with_bom(text: &str) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_decode_utf8_strips_bom() {
        let bytes = b"\xEF\xBB\xBFProject Name\nCaf\xC3\xA9 Tower\n";
        let text = decode(bytes, TextEncoding::Utf8).unwrap();
        assert!(text.starts_with("Project Name"));
        assert!(text.contains("Café Tower"));
    }

    #[test]
    fn test_decode_utf8_rejects_windows_1252_bytes() {
        let bytes = b"Caf\xE9 Tower";
        assert!(matches!(
            decode(bytes, TextEncoding::Utf8),
            Err(AttemptError::Decode(TextEncoding::Utf8))
        ));
        assert_eq!(
            decode(bytes, TextEncoding::Windows1252).unwrap(),
            "Café Tower"
        );
    }

    #[test]
    fn test_decode_windows_1252_specials() {
        // 0x80 is the euro sign in windows-1252 but a control code in latin-1.
        assert_eq!(decode(b"\x80 5m", TextEncoding::Windows1252).unwrap(), "€ 5m");
        assert_eq!(
            decode(b"\x80 5m", TextEncoding::Latin1).unwrap(),
            "\u{80} 5m"
        );
    }

    #[test]
    fn test_unassigned_windows_1252_bytes_fall_through_to_latin1() {
        let bytes = b"Caf\xE9 \x81 Tower";
        assert!(matches!(
            decode(bytes, TextEncoding::Windows1252),
            Err(AttemptError::Decode(TextEncoding::Windows1252))
        ));
        assert_eq!(
            decode(bytes, TextEncoding::Latin1).unwrap(),
            "Café \u{81} Tower"
        );
    }

    #[test]
    fn test_decode_utf16_with_bom() {
        let bytes = utf16le_with_bom("Project Name\nMarina View\n");
        assert_eq!(bom_encoding(&bytes), Some(TextEncoding::Utf16));
        let text = decode(&bytes, TextEncoding::Utf16).unwrap();
        assert_eq!(text, "Project Name\nMarina View\n");
    }

    #[test]
    fn test_eight_bit_decode_of_utf16_fails() {
        let bytes = utf16le_with_bom("Project Name\n");
        assert!(matches!(
            decode(&bytes, TextEncoding::Windows1252),
            Err(AttemptError::NulCharacters)
        ));
    }

    #[test]
    fn test_bom_encoding_absent() {
        assert_eq!(bom_encoding(b"Project Name"), None);
        assert_eq!(bom_encoding(b"\xEF\xBB\xBFx"), Some(TextEncoding::Utf8));
    }

    #[test]
    fn test_sniff_delimiter() {
        let candidates = [',', ';', '\t', '|'];
        assert_eq!(sniff_delimiter("a,b,c\nd,e,f", &candidates), ',');
        assert_eq!(sniff_delimiter("a;b;c\nd;e;f", &candidates), ';');
        assert_eq!(sniff_delimiter("a\tb\nc\td", &candidates), '\t');
        assert_eq!(sniff_delimiter("just one column\nanother", &candidates), ',');
    }

    #[test]
    fn test_sniff_delimiter_ignores_quoted_commas() {
        let text = "Project Name;Price\n\"Marina View\";\"1,200,000\"\n\"Creek Rise\";\"950,000\"\n";
        assert_eq!(sniff_delimiter(text, &[',', ';']), ';');
    }

    #[test]
    fn test_parse_skips_overlong_lines() {
        let text = "Project Name,Developer\nMarina View,Emaar\nBroken,Row,Extra\nCreek Rise,Nakheel\n";
        let table = parse_delimited(text, ',').unwrap();
        assert_eq!(table.columns, vec!["Project Name", "Developer"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.skipped_lines, 1);
    }

    #[test]
    fn test_parse_pads_short_lines_and_tolerates_trailing_delimiters() {
        let text = "Project Name,Developer,Area\nMarina View\nCreek Rise,Nakheel,Creek,,\n";
        let table = parse_delimited(text, ',').unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][2], Cell::Empty);
        assert_eq!(table.rows[1][2], Cell::Text("Creek".to_string()));
        assert_eq!(table.skipped_lines, 0);
    }

    #[test]
    fn test_parse_quoted_multiline_header() {
        let text = "Project Name,\"Agent Pack \n (Google Drive)\"\nMarina View,https://drive.google.com/x\n";
        let table = parse_delimited(text, ',').unwrap();
        assert_eq!(table.columns[1], "Agent Pack \n (Google Drive)");
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_parse_skips_leading_blank_rows() {
        let text = ",,\nProject Name,Developer\nMarina View,Emaar\n";
        let table = parse_delimited(text, ',').unwrap();
        assert_eq!(table.columns[0], "Project Name");
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_parse_header_only_fails() {
        assert!(matches!(
            parse_delimited("Project Name,Developer\n", ','),
            Err(AttemptError::NoDataRows)
        ));
        assert!(matches!(parse_delimited("", ','), Err(AttemptError::NoHeader)));
    }
}
