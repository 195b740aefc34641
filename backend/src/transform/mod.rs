//! Row transformer: normalize, rank and categorize one day's export.
//!
//! - [`columns`] - required columns and header resolution
//! - [`fields`] - typed parsing of individual cells
//! - [`pipeline`] - the end-to-end transform

pub mod columns;
pub mod fields;
pub mod pipeline;

pub use columns::{OUTPUT_COLUMNS, REQUIRED_COLUMNS};
pub use pipeline::{transform, transform_bytes, transform_file};
