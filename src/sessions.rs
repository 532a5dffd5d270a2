//! Session routes: create, list, fetch messages, delete.
//!
//! Sessions are a grouping layer over the message log; message routes in
//! [`crate::chat`] work without them, matching the original API surface.

use axum::extract::{Path, State};
use axum::Json;

use crate::models::{CreateSessionRequest, MessagesResponse, Session, SessionsResponse};
use crate::server::{bad_request, internal_error, not_found, AppError, AppState};
use crate::store;

/// `POST /sessions`: create a session with a fresh v4 UUID.
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<Session>, AppError> {
    if request.name.trim().is_empty() {
        return Err(bad_request("name must not be empty"));
    }

    let session = store::create_session(
        &state.pool,
        &request.name,
        &request.mode,
        request.pdf_id.as_deref(),
    )
    .await
    .map_err(|e| internal_error("Creating session", e))?;

    Ok(Json(session))
}

/// `GET /sessions`: all sessions, most recently updated first.
pub async fn handle_list_sessions(
    State(state): State<AppState>,
) -> Result<Json<SessionsResponse>, AppError> {
    let sessions = store::list_sessions(&state.pool)
        .await
        .map_err(|e| internal_error("Listing sessions", e))?;
    Ok(Json(SessionsResponse { sessions }))
}

/// `GET /sessions/{session_id}/messages`: the session's messages oldest
/// first; 404 for an unknown session.
pub async fn handle_session_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<MessagesResponse>, AppError> {
    ensure_session_exists(&state, &session_id).await?;

    let messages = store::get_history(&state.pool, Some(&session_id), None)
        .await
        .map_err(|e| internal_error("Retrieving messages", e))?;
    Ok(Json(MessagesResponse { messages }))
}

/// `DELETE /sessions/{session_id}`: remove the session and its messages.
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    ensure_session_exists(&state, &session_id).await?;

    store::delete_session(&state.pool, &session_id)
        .await
        .map_err(|e| internal_error("Deleting session", e))?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("Session {} deleted successfully", session_id),
    })))
}

async fn ensure_session_exists(state: &AppState, session_id: &str) -> Result<(), AppError> {
    let session = store::get_session(&state.pool, session_id)
        .await
        .map_err(|e| internal_error("Looking up session", e))?;
    if session.is_none() {
        return Err(not_found("Session not found"));
    }
    Ok(())
}
