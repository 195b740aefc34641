//! HTTP Server for the review UI.
//!
//! Holds one [`Session`] per process. Every request that changes it builds
//! the complete next value first and swaps it in under the write lock, so a
//! failed upload or edit leaves the loaded days untouched.
//!
//! # API Endpoints
//!
//! | Method | Path               | Description                               |
//! |--------|--------------------|-------------------------------------------|
//! | GET    | `/health`          | Health check                              |
//! | POST   | `/api/session`     | Upload `date` + `file0..file2` (multipart) |
//! | GET    | `/api/session`     | Per-day row and category counts           |
//! | DELETE | `/api/session`     | Drop the loaded days                      |
//! | GET    | `/api/days`        | Category-filtered day tables              |
//! | GET    | `/api/compare`     | Campaign search + chart series            |
//! | PUT    | `/api/annotations` | Set Note / Action on one record           |
//! | GET    | `/api/export`      | Three-sheet `.xlsx` download              |
//! | GET    | `/api/logs`        | SSE stream for real-time logs             |

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, Method},
    response::{sse::Event, IntoResponse, Json, Sse},
    routing::{get, put},
    Router,
};
use chrono::NaiveDate;
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, log_info_indent, log_success, LOG_BROADCASTER};
use super::types::{
    AnnotationRequest, ApiError, CompareQuery, CompareResponse, DaysQuery, DaysResponse,
    SessionResponse,
};
use crate::config::ServerConfig;
use crate::error::{ReviewError, SessionError};
use crate::export::{write_workbook, DEFAULT_WORKBOOK_NAME, XLSX_CONTENT_TYPE};
use crate::models::CampaignRecord;
use crate::session::{consecutive_days, sheet_label, Session, DAYS_PER_SESSION};
use crate::transform::transform_bytes;

/// Multipart field names of the three daily files, most recent day first.
const FILE_FIELDS: [&str; DAYS_PER_SESSION] = ["file0", "file1", "file2"];

/// Shared server state.
#[derive(Clone, Default)]
pub struct AppState {
    session: Arc<RwLock<Session>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
        }
    }
}

/// Build the router (also used by tests).
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route(
            "/api/session",
            get(get_session).post(upload_session).delete(delete_session),
        )
        .route("/api/days", get(get_days))
        .route("/api/compare", get(get_compare))
        .route("/api/annotations", put(put_annotation))
        .route("/api/export", get(get_export))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(AppState::new(), &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    println!("🚀 Campaign review server running on http://localhost:{}", config.port);
    println!("   POST /api/session     - Upload 3 daily CSV files");
    println!("   GET  /api/days        - Filter by category");
    println!("   GET  /api/compare     - Compare a campaign across days");
    println!("   GET  /api/export      - Download {}", DEFAULT_WORKBOOK_NAME);
    println!("   GET  /api/logs        - SSE log stream");
    println!("   GET  /health          - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "campaign-review",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload the three daily exports for a target date.
async fn upload_session(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SessionResponse>, ApiError> {
    let mut target: Option<NaiveDate> = None;
    let mut files: [Option<(String, Vec<u8>)>; DAYS_PER_SESSION] = Default::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "date" {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::bad_request(format!("Read error: {}", e)))?;
            let parsed = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| {
                ApiError::bad_request(format!("Invalid date '{}': expected YYYY-MM-DD", text.trim()))
            })?;
            target = Some(parsed);
        } else if let Some(slot) = FILE_FIELDS.iter().position(|f| *f == name) {
            let file_name = field.file_name().unwrap_or(name.as_str()).to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Read error: {}", e)))?;
            files[slot] = Some((file_name, bytes.to_vec()));
        }
    }

    let target = target.ok_or_else(|| ApiError::bad_request("Missing 'date' field"))?;
    let supplied = files.iter().filter(|f| f.is_some()).count();
    if supplied != DAYS_PER_SESSION {
        return Err(SessionError::Arity {
            expected: DAYS_PER_SESSION,
            got: supplied,
        }
        .into());
    }

    log_info(format!("📄 New upload for {}", target));
    let mut days = Vec::with_capacity(DAYS_PER_SESSION);
    for (date, file) in consecutive_days(target).into_iter().zip(files) {
        let Some((file_name, bytes)) = file else {
            continue;
        };
        log_info_indent(
            format!("{} → sheet {} ({} bytes)", file_name, sheet_label(date), bytes.len()),
            1,
        );
        let table = transform_bytes(&bytes).map_err(|source| {
            log_error(format!("{}: {}", file_name, source));
            ReviewError::Day { date, source }
        })?;
        days.push((date, table));
    }

    let mut session = state.session.write().await;
    let loaded = session.ingest(days)?;
    log_success(format!("Session {} loaded", loaded.id()));

    Ok(Json(SessionResponse::from(loaded)))
}

async fn get_session(State(state): State<AppState>) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.session.read().await;
    Ok(Json(SessionResponse::from(session.loaded()?)))
}

async fn delete_session(State(state): State<AppState>) -> Json<Value> {
    state.session.write().await.reset();
    log_info("Session cleared");
    Json(json!({ "status": "empty" }))
}

async fn get_days(
    State(state): State<AppState>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<DaysResponse>, ApiError> {
    let selection = query.selection()?;
    let session = state.session.read().await;
    let loaded = session.loaded()?;

    Ok(Json(DaysResponse {
        session_id: loaded.id().to_string(),
        days: loaded.filter_by_category(&selection),
    }))
}

async fn get_compare(
    State(state): State<AppState>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<CompareResponse>, ApiError> {
    let metrics = query.metrics()?;
    let campaign = query.campaign.clone().unwrap_or_default();
    let session = state.session.read().await;
    let loaded = session.loaded()?;

    let comparison = loaded.compare(
        &campaign,
        &metrics,
        query.policy.unwrap_or_default(),
        !query.case_sensitive.unwrap_or(false),
    )?;

    Ok(Json(CompareResponse {
        session_id: loaded.id().to_string(),
        comparison,
    }))
}

async fn put_annotation(
    State(state): State<AppState>,
    Json(request): Json<AnnotationRequest>,
) -> Result<Json<CampaignRecord>, ApiError> {
    let mut session = state.session.write().await;
    let next = session
        .loaded()?
        .annotate(request.date, request.index, request.note, request.action)?;

    let day = next.day(request.date)?;
    let record = day
        .table
        .records()
        .get(request.index)
        .cloned()
        .ok_or(SessionError::RecordOutOfRange {
            date: request.date,
            index: request.index,
            len: day.table.len(),
        })?;

    session.replace(next);
    Ok(Json(record))
}

async fn get_export(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let session = state.session.read().await;
    let bytes = write_workbook(&session.loaded()?.export())?;
    let disposition = format!("attachment; filename=\"{}\"", DEFAULT_WORKBOOK_NAME);

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
