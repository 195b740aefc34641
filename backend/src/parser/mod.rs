//! CSV reader with encoding and delimiter auto-detection.
//!
//! Produces a [`RawTable`] of string cells keyed by header name. No campaign
//! semantics here; those live in [`crate::transform`].

use std::path::Path;

pub use crate::error::CsvError;
use crate::error::CsvResult;

/// One day's export as read from disk, before any typing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Column headers, trimmed
    pub headers: Vec<String>,
    /// Data rows, each padded to `headers.len()`
    pub rows: Vec<Vec<String>>,
    /// File line on which each row starts (the header is line 1)
    pub lines: Vec<u64>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

impl RawTable {
    /// Position of `name` in the header row.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string. Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let text = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

/// Detect the delimiter by counting occurrences in the header line.
///
/// Daily exports are comma-separated, so a tie (or no separator at all)
/// resolves to `,`.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text with an explicit delimiter.
///
/// Quoted fields may contain the delimiter. Rows whose cells are all blank
/// are skipped; short rows are padded with empty cells.
pub fn parse_csv(content: &str, delimiter: char) -> CsvResult<RawTable> {
    parse_with_metadata(content, delimiter, "utf-8".to_string())
}

/// Parse CSV file with auto-detection of encoding and delimiter.
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<RawTable> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<RawTable> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    parse_with_metadata(&content, delimiter, encoding)
}

fn parse_with_metadata(content: &str, delimiter: char, encoding: String) -> CsvResult<RawTable> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| malformed(&e, 1))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();
    let mut lines = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let fallback_line = idx as u64 + 2;
        let record = result.map_err(|e| malformed(&e, fallback_line))?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let mut row: Vec<String> = record.iter().map(|cell| cell.to_string()).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
        lines.push(record.position().map_or(fallback_line, |p| p.line()));
    }

    Ok(RawTable {
        headers,
        rows,
        lines,
        encoding,
        delimiter,
    })
}

fn malformed(err: &csv::Error, fallback_line: u64) -> CsvError {
    CsvError::Malformed {
        line: err.position().map(|p| p.line()).unwrap_or(fallback_line),
        message: err.to_string(),
    }
}
