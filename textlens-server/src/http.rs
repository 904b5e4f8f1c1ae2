//! Textlens HTTP API
//!
//! Axum-based HTTP server that forwards submitted text to the model service
//! and keeps an in-memory history of the results.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to a pure
//! inner function. The inner functions are directly testable without axum dispatch
//! machinery.
//!
//! Endpoints:
//! - GET  /         - welcome message
//! - POST /process  - summarize, extract keywords, classify sentiment
//! - GET  /history  - every processed record, oldest first
//! - GET  /health   - liveness plus record count
//! - GET  /version  - server version info

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use textlens_core::{
    AnalyzerError, HistoryStore, ProcessRequest, ProcessedRecord, TextAnalyzer, TextlensConfig,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use uuid::Uuid;

pub const WELCOME_MESSAGE: &str = "Welcome to the Text Processing API";

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub analyzer: Arc<dyn TextAnalyzer>,
    pub history: HistoryStore,
    pub config: TextlensConfig,
}

impl HttpState {
    pub fn new(analyzer: Arc<dyn TextAnalyzer>, config: TextlensConfig) -> Self {
        Self {
            analyzer,
            history: HistoryStore::new(),
            config,
        }
    }
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/process", post(process_handler))
        .route("/history", get(history_handler))
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    state: Arc<HttpState>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = state.config.http_addr();
    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Textlens HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

/// Failures a `/process` call can report to the client.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Upstream(#[from] AnalyzerError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(AnalyzerError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Upstream(AnalyzerError::MissingApiKey) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::Upstream(AnalyzerError::Parse(_)) => "parse_failure",
            ApiError::Upstream(_) => "upstream_failure",
        }
    }

    pub fn into_parts(self) -> (StatusCode, serde_json::Value) {
        let status = self.status_code();
        let body = serde_json::to_value(ErrorResponse::new(self.to_string()))
            .unwrap_or_else(|_| serde_json::json!({ "status": "error" }));
        (status, body)
    }
}

/// Standard HTTP error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            status: "error".to_string(),
        }
    }
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

/// Inner root - static welcome payload.
pub fn root_inner() -> serde_json::Value {
    serde_json::json!({ "message": WELCOME_MESSAGE })
}

/// Inner version - returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "service": "textlens",
    })
}

/// Inner health - reports model name and history size, never the credential.
pub async fn health_inner(state: &HttpState) -> (StatusCode, serde_json::Value) {
    (
        StatusCode::OK,
        serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "model": state.config.model.model,
            "records": state.history.len().await,
        }),
    )
}

/// Validate the submitted text. Whitespace-only counts as empty.
pub fn validate_text(req: ProcessRequest) -> Result<String, ApiError> {
    match req.text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        Some(_) => Err(ApiError::InvalidInput("Text cannot be empty.".to_string())),
        None => Err(ApiError::InvalidInput("text field is required".to_string())),
    }
}

/// Analyze the text and append the result to history.
///
/// Nothing is appended unless the model call and parse both succeed.
pub async fn process_text(
    state: &HttpState,
    req: ProcessRequest,
) -> Result<ProcessedRecord, ApiError> {
    let text = validate_text(req)?;
    let request_id = Uuid::new_v4();
    let start = Instant::now();

    tracing::info!(
        %request_id,
        analyzer = state.analyzer.name(),
        text_len = text.len(),
        "Processing text"
    );

    let analysis = state.analyzer.analyze(&text).await?;
    let record = ProcessedRecord::from_analysis(text, analysis);
    let records = state.history.append(record.clone()).await;

    tracing::info!(
        %request_id,
        took_ms = start.elapsed().as_millis() as u64,
        keywords = record.keywords.len(),
        records,
        "Text processed"
    );

    Ok(record)
}

/// Inner process - maps the outcome of [`process_text`] to (status, body).
pub async fn process_inner(
    state: &HttpState,
    req: ProcessRequest,
) -> (StatusCode, serde_json::Value) {
    match process_text(state, req).await {
        Ok(record) => match serde_json::to_value(&record) {
            Ok(body) => (StatusCode::OK, body),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": e.to_string(), "status": "error" }),
            ),
        },
        Err(e) => {
            tracing::warn!(kind = e.kind(), error = %e, "Process request failed");
            e.into_parts()
        }
    }
}

/// Inner history - full snapshot in append order.
pub async fn history_inner(state: &HttpState) -> (StatusCode, serde_json::Value) {
    let records = state.history.list_all().await;
    match serde_json::to_value(&records) {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({ "error": e.to_string(), "status": "error" }),
        ),
    }
}

// ============================================================================
// Axum handler wrappers (thin - delegate to inner functions)
// ============================================================================

pub async fn root_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(root_inner()))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state).await;
    (status, Json(body))
}

pub async fn process_handler(
    State(state): State<Arc<HttpState>>,
    payload: std::result::Result<Json<ProcessRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (status, body) = match payload {
        Ok(Json(req)) => process_inner(&state, req).await,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Rejected malformed process body");
            ApiError::InvalidInput(rejection.body_text()).into_parts()
        }
    };
    (status, Json(body))
}

pub async fn history_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = history_inner(&state).await;
    (status, Json(body))
}

// ============================================================================
// Unit Tests - call inner functions directly
// ============================================================================
