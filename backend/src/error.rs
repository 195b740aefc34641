//! Error types for the campaign review pipeline.
//!
//! One enum per layer, mirroring the data flow:
//!
//! - [`CsvError`] - reading and decoding a daily export
//! - [`TransformError`] - schema and value errors while normalizing a day
//! - [`SessionError`] - multi-day ingestion and query errors
//! - [`ExportError`] - workbook / CSV serialization errors
//! - [`ReviewError`] - top-level union used by the CLI and HTTP adapters
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use chrono::NaiveDate;
use thiserror::Error;

// =============================================================================
// CSV Reading Errors
// =============================================================================

/// Errors while reading a raw CSV export.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,

    /// The CSV reader rejected a line.
    #[error("Invalid CSV at line {line}: {message}")]
    Malformed { line: u64, message: String },
}

// =============================================================================
// Row Transformer Errors
// =============================================================================

/// Errors while turning one raw export into a day table.
#[derive(Debug, Error)]
pub enum TransformError {
    /// One or more required columns are absent from the header row.
    #[error("Missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// A value does not match its column's expected format.
    ///
    /// `line` is the line of the file the row starts on (the header is line 1).
    #[error("Line {line}, column '{column}' (value '{value}'): {message}")]
    Parse {
        line: u64,
        column: String,
        value: String,
        message: String,
    },

    /// Underlying CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),
}

impl TransformError {
    pub fn parse(
        line: u64,
        column: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Parse {
            line,
            column: column.into(),
            value: value.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Session Errors
// =============================================================================

/// Errors from the multi-day aggregator.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Wrong number of day tables supplied to ingest.
    #[error("Expected {expected} daily tables, got {got}")]
    Arity { expected: usize, got: usize },

    /// Two tables were keyed by the same date.
    #[error("Date {0} was supplied more than once")]
    DuplicateDate(NaiveDate),

    /// Degenerate search input.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// More than one record of a single day matches the campaign query.
    #[error(
        "Campaign query '{query}' matches {} records on {date}: {}",
        .campaigns.len(),
        .campaigns.join(", ")
    )]
    AmbiguousMatch {
        query: String,
        date: NaiveDate,
        campaigns: Vec<String>,
    },

    /// Query against an empty session.
    #[error("No campaign data loaded; upload all 3 daily files first")]
    NotLoaded,

    /// Date is not one of the loaded days.
    #[error("No table loaded for {0}")]
    UnknownDate(NaiveDate),

    /// Annotation target does not exist.
    #[error("Record {index} out of range for {date} ({len} records)")]
    RecordOutOfRange {
        date: NaiveDate,
        index: usize,
        len: usize,
    },
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while serializing day tables.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Workbook writer failure.
    #[error("Workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    /// CSV writer failure.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Review Errors (top-level)
// =============================================================================

/// Top-level error returned by the adapters.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// CSV reading error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Transformation error not tied to a specific day.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Transformation error for one of the three daily files.
    #[error("File for {date}: {source}")]
    Day {
        date: NaiveDate,
        #[source]
        source: TransformError,
    },

    /// Session error.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for transformation operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for adapter-level operations.
pub type ReviewResult<T> = Result<T, ReviewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let csv_err = CsvError::EmptyFile;
        let transform_err: TransformError = csv_err.into();
        let review_err: ReviewError = transform_err.into();
        assert!(review_err.to_string().contains("empty"));

        let session_err = SessionError::Arity { expected: 3, got: 2 };
        let review_err: ReviewError = session_err.into();
        assert!(review_err.to_string().contains("got 2"));
    }

    #[test]
    fn test_schema_error_names_every_missing_column() {
        let err = TransformError::Schema {
            missing: vec!["Impressions".into(), "ACOS".into()],
        };
        assert_eq!(err.to_string(), "Missing required column(s): Impressions, ACOS");
    }

    #[test]
    fn test_parse_error_format() {
        let err = TransformError::parse(4, "Start date", "13/40/99", "expected MM/DD/YY");
        let msg = err.to_string();
        assert!(msg.contains("Line 4"));
        assert!(msg.contains("column 'Start date'"));
        assert!(msg.contains("value '13/40/99'"));
    }

    #[test]
    fn test_ambiguous_match_lists_campaigns() {
        let err = SessionError::AmbiguousMatch {
            query: "brand".into(),
            date: NaiveDate::from_ymd_opt(2024, 6, 5).unwrap(),
            campaigns: vec!["BrandX".into(), "BrandY".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("matches 2 records on 2024-06-05"));
        assert!(msg.contains("BrandX, BrandY"));
    }
}
