//! Chat HTTP server.
//!
//! Serves one [`Session`] over a small JSON API so a browser or script can
//! upload a PDF and hold a conversation about it.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/session` | Phase, indexed document and turn count |
//! | `POST` | `/document?filename=x.pdf` | Upload raw PDF bytes and index them |
//! | `POST` | `/ask` | `{"question": "..."}` → answer plus source chunks |
//! | `GET`  | `/messages` | Conversation history |
//! | `POST` | `/reset` | Forget the document and the history |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_ready", "message": "no document has been indexed yet" } }
//! ```
//!
//! Error codes: `bad_request` (400), `ingestion_failed` (422), `not_ready`,
//! `already_indexed` and `busy` (409), `provider_error` (502),
//! `internal` (500).
//!
//! Mutating endpoints refuse to queue behind an in-flight upload or question
//! and answer `409 busy` instead.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::error::DocqaError;
use crate::models::{Answer, DocumentInfo, Turn};
use crate::qa::{Providers, QaSettings};
use crate::session::{Phase, Session, SessionSnapshot};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    session: Arc<Mutex<Session>>,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }

    fn try_session(&self) -> Result<MutexGuard<'_, Session>, AppError> {
        self.session.try_lock().map_err(|_| AppError {
            status: StatusCode::CONFLICT,
            code: "busy".to_string(),
            message: "the session is still processing a previous request".to_string(),
        })
    }
}

/// Build the router. Split out from [`run_server`] so tests can serve it
/// on an ephemeral port.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/session", get(handle_session))
        .route("/document", post(handle_upload))
        .route("/ask", post(handle_ask))
        .route("/messages", get(handle_messages))
        .route("/reset", post(handle_reset))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

/// Start the chat server on `[server].bind` with a fresh session.
pub async fn run_server(config: &Config, api_key: &str) -> anyhow::Result<()> {
    let providers = Providers::from_config(config, api_key)?;
    let session = Session::new(providers, QaSettings::from(config));
    let app = router(AppState::new(session), config.server.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(bind = %config.server.bind, "chat server listening");
    println!("Chat server listening on http://{}", config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub(crate) async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown requested");
    }
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
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

impl From<DocqaError> for AppError {
    fn from(e: DocqaError) -> Self {
        let status = match &e {
            DocqaError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DocqaError::Ingestion(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DocqaError::NotReady | DocqaError::AlreadyIndexed => StatusCode::CONFLICT,
            DocqaError::Provider(_) => StatusCode::BAD_GATEWAY,
            DocqaError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let code = match &e {
            DocqaError::Config(_) => "internal",
            other => other.code(),
        };
        AppError {
            status,
            code: code.to_string(),
            message: e.to_string(),
        }
    }
}

// ============ GET /session ============

async fn handle_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.lock().await.snapshot())
}

// ============ POST /document ============

#[derive(Deserialize)]
struct UploadQuery {
    filename: Option<String>,
}

#[derive(Serialize)]
struct UploadResponse {
    phase: Phase,
    document: DocumentInfo,
}

async fn handle_upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<UploadResponse>, AppError> {
    let filename = query.filename.unwrap_or_else(|| "upload.pdf".to_string());
    let mut session = state.try_session()?;
    let document = session.upload(&filename, &body).await?;
    Ok(Json(UploadResponse {
        phase: session.phase(),
        document,
    }))
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

async fn handle_ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<Answer>, AppError> {
    let mut session = state.try_session()?;
    let answer = session.ask(&req.question).await?;
    Ok(Json(answer))
}

// ============ GET /messages ============

#[derive(Serialize)]
struct MessagesResponse {
    messages: Vec<Turn>,
}

async fn handle_messages(State(state): State<AppState>) -> Json<MessagesResponse> {
    let session = state.session.lock().await;
    Json(MessagesResponse {
        messages: session.messages().to_vec(),
    })
}

// ============ POST /reset ============

async fn handle_reset(State(state): State<AppState>) -> Result<Json<SessionSnapshot>, AppError> {
    let mut session = state.try_session()?;
    session.reset();
    Ok(Json(session.snapshot()))
}
