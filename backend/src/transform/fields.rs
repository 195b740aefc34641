//! Typed parsing of individual export cells.
//!
//! Every parser returns the failure reason as a `String`; the caller attaches
//! row and column context.

use chrono::NaiveDate;

/// Fixed two-digit-year format of the `Start date` column.
pub const START_DATE_FORMAT: &str = "%m/%d/%y";

/// Parse a `MM/DD/YY` start date. No fallback formats.
pub fn parse_start_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), START_DATE_FORMAT)
        .map_err(|e| format!("expected a MM/DD/YY date ({e})"))
}

/// Parse a decimal amount such as `12.5`, `$1,204.10` or `18.2%`.
pub fn parse_decimal(raw: &str) -> Result<f64, String> {
    let cleaned = normalize_number(raw).ok_or_else(|| "expected a number, found an empty cell".to_string())?;
    let value: f64 = cleaned
        .parse()
        .map_err(|_| "expected a number".to_string())?;
    if !value.is_finite() {
        return Err("expected a finite number".to_string());
    }
    Ok(value)
}

/// Parse a non-negative count. `"12.0"` is accepted, `"12.5"` and `"-3"` are not.
pub fn parse_count(raw: &str) -> Result<u64, String> {
    let cleaned = normalize_number(raw).ok_or_else(|| "expected a count, found an empty cell".to_string())?;
    if let Ok(value) = cleaned.parse::<u64>() {
        return Ok(value);
    }

    let value: f64 = cleaned
        .parse()
        .map_err(|_| "expected a whole number".to_string())?;
    if value < 0.0 {
        return Err("count must not be negative".to_string());
    }
    if !value.is_finite() || value.fract() != 0.0 || value > u64::MAX as f64 {
        return Err("expected a whole number".to_string());
    }
    Ok(value as u64)
}

/// Parse ACOS. Blank cells and `-` mean the campaign had no sales.
pub fn parse_acos(raw: &str) -> Result<Option<f64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" || trimmed == "--" {
        return Ok(None);
    }
    parse_decimal(trimmed).map(Some)
}

/// Strip a leading `$`, a trailing `%` and thousands separators.
fn normalize_number(raw: &str) -> Option<String> {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix('$') {
        s = rest.trim_start();
    }
    if let Some(rest) = s.strip_suffix('%') {
        s = rest.trim_end();
    }
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
