//! HTTP server for the RAG chatbot backend.
//!
//! Exposes the upload, query, and chat-history API consumed by the chat
//! frontend. Handlers are thin request/response adapters: each one invokes
//! the chunker, the embedding client, the vector index client, and the chat
//! store in sequence, with no orchestration state of its own.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version) |
//! | `POST`   | `/upload-pdf` | Upload a PDF (multipart), chunk + embed + index it |
//! | `POST`   | `/query` | Similarity search over indexed chunks |
//! | `POST`   | `/save-message` | Persist a question/answer pair |
//! | `GET`    | `/chat-history` | List messages, optionally by session |
//! | `DELETE` | `/chat-history/{session_id}` | Delete a session's messages |
//! | `POST`   | `/sessions` | Create a chat session |
//! | `GET`    | `/sessions` | List sessions |
//! | `GET`    | `/sessions/{session_id}/messages` | A session's messages |
//! | `DELETE` | `/sessions/{session_id}` | Delete a session and its messages |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "Only PDF files are allowed" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `upstream_error`
//! (502, embedding API or vector index failed), `internal` (500). Failures
//! are converted at this boundary and never retried.

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::{chat, db, migrate, query, sessions, upload, vector_index};

/// Shared application state passed to all route handlers via Axum's
/// `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// One pool reused across requests; SQLite serializes writers.
    pub pool: SqlitePool,
    /// One HTTP client for both the embedding API and the vector index.
    pub http: reqwest::Client,
    /// Resolved Pinecone data-plane host (scheme included).
    pub index_host: String,
}

/// Build the application router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    // Leave headroom above the configured file cap so oversize uploads get
    // our 400 with a message instead of a bare 413 from the body limit.
    let body_limit = DefaultBodyLimit::max(state.config.max_file_size + 1024 * 1024);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/upload-pdf", post(upload::handle_upload_pdf))
        .route("/query", post(query::handle_query))
        .route("/save-message", post(chat::handle_save_message))
        .route("/chat-history", get(chat::handle_get_history))
        .route("/chat-history/{session_id}", delete(chat::handle_delete_history))
        .route(
            "/sessions",
            post(sessions::handle_create_session).get(sessions::handle_list_sessions),
        )
        .route(
            "/sessions/{session_id}/messages",
            get(sessions::handle_session_messages),
        )
        .route("/sessions/{session_id}", delete(sessions::handle_delete_session))
        .layer(body_limit)
        .layer(cors)
        .with_state(state)
}

/// Start the server: connect storage, run migrations, resolve the vector
/// index host, then serve until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let config = Arc::new(config.clone());

    std::fs::create_dir_all(&config.upload_dir)?;

    let pool = db::connect(&config).await?;
    migrate::run_migrations(&pool).await?;
    tracing::info!(path = %config.database_path.display(), "Chat store ready");

    let http = reqwest::Client::new();
    let index_host =
        vector_index::ensure_index(&http, &config.pinecone, config.embedding.dims).await?;
    tracing::info!(index = %config.pinecone.index_name, host = %index_host, "Vector index ready");

    let bind_addr = config.bind_addr();
    let state = AppState {
        config,
        pool,
        http,
        index_host,
    };

    let app = router(state);
    tracing::info!(%bind_addr, "RAG backend listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.cors_origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer.allow_origin(origins)
    }
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Route-boundary error type that converts into an HTTP response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// 400 for invalid input (bad file type/size, malformed query).
pub fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// 404 for unknown resources (sessions).
pub fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

/// 502 for embedding-API or vector-index failures.
pub fn upstream_error(context: &str, err: anyhow::Error) -> AppError {
    tracing::warn!(error = %err, "{} failed", context);
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "upstream_error".to_string(),
        message: format!("{}: {}", context, err),
    }
}

/// 500 for storage and other internal failures.
pub fn internal_error(context: &str, err: anyhow::Error) -> AppError {
    tracing::error!(error = %err, "{} failed", context);
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: format!("{}: {}", context, err),
    }
}

// ============ GET / and GET /health ============

#[derive(Serialize)]
struct RootResponse {
    message: String,
    version: String,
    status: String,
}

async fn handle_root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Paperchat RAG backend".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Health check used by load balancers and monitoring.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
