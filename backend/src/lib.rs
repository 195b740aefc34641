//! # Campaign Review - three days of advertising exports side by side
//!
//! Campaign review turns the daily campaign CSV exports of an advertising
//! console into ranked, categorized tables and compares one campaign across
//! three consecutive days.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  3 CSV days │────▶│   Parser    │────▶│  Transform  │────▶│   Session   │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ (rank+tier) │     │ (3 tables)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                 filter / compare / export
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use campaign_review::{consecutive_days, transform_file, AggregatorSession};
//!
//! let dates = consecutive_days(target);
//! let days = dates
//!     .into_iter()
//!     .zip(["day0.csv", "day1.csv", "day2.csv"])
//!     .map(|(date, path)| Ok((date, transform_file(path)?)))
//!     .collect::<Result<Vec<_>, campaign_review::TransformError>>()?;
//! let session = AggregatorSession::ingest(days)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (CampaignRecord, Category, DayTable, Metric)
//! - [`parser`] - CSV parsing with auto-detection
//! - [`transform`] - Column projection, typed parsing and ranking
//! - [`session`] - Multi-day aggregator and comparison series
//! - [`export`] - Workbook and CSV output
//! - [`config`] - Server settings from the environment
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Aggregation
pub mod session;

// Output
pub mod export;

// Configuration
pub mod config;

// HTTP API
pub mod api;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CsvError,
    TransformError,
    SessionError,
    ExportError,
    ReviewError,
    ReviewResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CampaignRecord,
    Category,
    CategorySelection,
    DayTable,
    Metric,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    parse_csv,
    parse_csv_file_auto,
    parse_bytes_auto,
    detect_encoding,
    detect_delimiter,
    decode_content,
    RawTable,
};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    transform,
    transform_bytes,
    transform_file,
    OUTPUT_COLUMNS,
    REQUIRED_COLUMNS,
};

// =============================================================================
// Re-exports - Session
// =============================================================================

pub use session::{
    consecutive_days,
    sheet_label,
    AggregatorSession,
    CampaignMatch,
    Comparison,
    DayEntry,
    DaySummary,
    MatchPolicy,
    Session,
    TimeSeries,
    DAYS_PER_SESSION,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{
    day_table_to_csv,
    save_workbook,
    write_workbook,
    DEFAULT_WORKBOOK_NAME,
};

// =============================================================================
// Re-exports - Config
// =============================================================================

pub use config::ServerConfig;

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
