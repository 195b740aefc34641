//! REST API types for the review UI.
//!
//! Responses are camelCase JSON; records and series serialize with the same
//! shapes the library uses.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;

use crate::error::{ReviewError, SessionError};
use crate::models::{CategorySelection, Metric, UnknownCategory, UnknownMetric};
use crate::session::{AggregatorSession, Comparison, DayEntry, DaySummary, MatchPolicy};

/// Returned after a successful upload and by `GET /api/session`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Changes on every upload
    pub session_id: String,
    /// Always "loaded"
    pub status: String,
    pub days: Vec<DaySummary>,
}

impl From<&AggregatorSession> for SessionResponse {
    fn from(session: &AggregatorSession) -> Self {
        SessionResponse {
            session_id: session.id().to_string(),
            status: "loaded".to_string(),
            days: session.summary(),
        }
    }
}

/// Filtered day tables, oldest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaysResponse {
    pub session_id: String,
    pub days: Vec<DayEntry>,
}

/// Cross-day comparison: every matching row plus the chart series
/// (`series` is null with a `seriesError` when one day is ambiguous).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub session_id: String,
    #[serde(flatten)]
    pub comparison: Comparison,
}

/// `GET /api/days` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DaysQuery {
    /// Comma-separated category labels
    pub categories: Option<String>,
    /// Shortcut for "Select all"
    pub all: Option<bool>,
}

impl DaysQuery {
    pub fn selection(&self) -> Result<CategorySelection, UnknownCategory> {
        if self.all.unwrap_or(false) {
            return Ok(CategorySelection::All);
        }
        let raw = self.categories.as_deref().unwrap_or("");
        CategorySelection::from_labels(raw.split(','))
    }
}

/// `GET /api/compare` query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareQuery {
    pub campaign: Option<String>,
    /// Comma-separated optional metrics (Orders, SpendUSD, ACOS)
    pub metrics: Option<String>,
    pub policy: Option<MatchPolicy>,
    pub case_sensitive: Option<bool>,
}

impl CompareQuery {
    pub fn metrics(&self) -> Result<BTreeSet<Metric>, UnknownMetric> {
        self.metrics
            .as_deref()
            .unwrap_or("")
            .split(',')
            .filter(|m| !m.trim().is_empty())
            .map(str::parse)
            .collect()
    }
}

/// `PUT /api/annotations` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRequest {
    pub date: NaiveDate,
    /// Position of the record in that day's ranked table
    pub index: usize,
    pub note: Option<String>,
    pub action: Option<String>,
}

/// Error body shared by every endpoint.
pub fn error_response(message: &str) -> Value {
    json!({
        "status": "error",
        "error": message,
    })
}

/// Handler error: a status code plus a message rendered with [`error_response`].
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(error_response(&self.message))).into_response()
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        let status = match &err {
            ReviewError::Csv(_) | ReviewError::Transform(_) | ReviewError::Day { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ReviewError::Session(SessionError::NotLoaded) => StatusCode::CONFLICT,
            ReviewError::Session(SessionError::AmbiguousMatch { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            ReviewError::Session(_) => StatusCode::BAD_REQUEST,
            ReviewError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ReviewError::from(err).into()
    }
}

impl From<crate::error::ExportError> for ApiError {
    fn from(err: crate::error::ExportError) -> Self {
        ReviewError::from(err).into()
    }
}

impl From<UnknownCategory> for ApiError {
    fn from(err: UnknownCategory) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<UnknownMetric> for ApiError {
    fn from(err: UnknownMetric) -> Self {
        ApiError::bad_request(err.to_string())
    }
}
