//! axum routes for the upload-and-ask web app.
//!
//! One [`AnswerEngine`] serves the whole process. Failures are returned as
//! `{"error": ...}` bodies with a status derived from the [`RagError`] kind.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use pdfqa_rag::{AnswerEngine, EngineState, IngestSummary, RagError, extract::extract_pages};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

/// Maximum accepted upload size.
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Message shown when an upload contains no extractable text.
pub const EMPTY_DOCUMENT_MESSAGE: &str = "Could not load any text from this PDF.";

/// Shared handle to the session's single engine.
///
/// Every request takes the lock for its whole duration, so uploads and
/// questions are processed strictly one at a time.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<Mutex<AnswerEngine>>,
}

impl AppState {
    pub fn new(engine: AnswerEngine) -> Self {
        Self { engine: Arc::new(Mutex::new(engine)) }
    }

    pub fn engine(&self) -> &Arc<Mutex<AnswerEngine>> {
        &self.engine
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080 }
    }
}

impl ServerConfig {
    /// Read `PDFQA_HOST` and `PDFQA_PORT`, keeping defaults for unset or
    /// unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = std::env::var("PDFQA_HOST").unwrap_or(defaults.host);
        let port = std::env::var("PDFQA_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(defaults.port);
        Self { host, port }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub source: String,
    pub pages: usize,
    pub chunks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error returned by the API handlers.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Rag(RagError),
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        Self::Rag(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Rag(RagError::Extraction(detail)) => {
                warn!(detail = %detail, "rejected upload without text");
                (StatusCode::UNPROCESSABLE_ENTITY, EMPTY_DOCUMENT_MESSAGE.to_string())
            }
            ApiError::Rag(err) if err.is_provider_error() => {
                error!(error = %err, "model service failed");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            ApiError::Rag(err) => {
                error!(error = %err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/ask", post(ask))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: ServerConfig, engine: AnswerEngine) -> anyhow::Result<()> {
    let app = app_router(AppState::new(engine));
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for pdfqa server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("pdfqa listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> impl IntoResponse {
    Html(include_str!("../ui/index.html"))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let engine_state = state.engine.lock().await.state();
    Json(json!({
        "status": "ok",
        "service": "pdfqa",
        "ready": engine_state == EngineState::Ready,
    }))
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) =
        multipart.next_field().await.map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("file") {
            let source = field.file_name().unwrap_or("upload.pdf").to_string();
            let bytes = field.bytes().await.map_err(|e| ApiError::BadRequest(e.to_string()))?;
            upload = Some((source, bytes));
            break;
        }
    }
    let (source, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("missing multipart field 'file'".into()))?;

    info!(source = %source, bytes = bytes.len(), "received upload");
    let pages = extract_pages(bytes.to_vec(), source.clone()).await?;

    let IngestSummary { pages, chunks } = state.engine.lock().await.ingest(&pages).await?;
    Ok(Json(UploadResponse { source, pages, chunks }))
}

async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    if request.question.trim().is_empty() {
        return Err(ApiError::BadRequest("question must not be empty".into()));
    }

    let answer = state.engine.lock().await.answer(&request.question).await?;
    Ok(Json(AskResponse { answer }))
}
