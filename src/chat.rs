//! Chat-history routes: save a question/answer pair, list messages,
//! delete a session's messages.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::models::{
    ChatHistoryResponse, DeleteHistoryResponse, MessageType, SaveMessageRequest,
    SaveMessageResponse,
};
use crate::server::{bad_request, internal_error, AppError, AppState};
use crate::store;

/// `POST /save-message`: persist one conversation turn as two rows,
/// the user question and the assistant answer. Retrieved chunks (if any)
/// are stored as opaque JSON metadata on the answer row.
pub async fn handle_save_message(
    State(state): State<AppState>,
    Json(request): Json<SaveMessageRequest>,
) -> Result<Json<SaveMessageResponse>, AppError> {
    if request.session_id.trim().is_empty() {
        return Err(bad_request("session_id must not be empty"));
    }

    store::save_message(
        &state.pool,
        &request.session_id,
        MessageType::User,
        &request.question,
        None,
    )
    .await
    .map_err(|e| internal_error("Saving message", e))?;

    let metadata = request
        .retrieved_chunks
        .map(|chunks| serde_json::json!({ "retrieved_chunks": chunks }));
    store::save_message(
        &state.pool,
        &request.session_id,
        MessageType::Assistant,
        &request.answer,
        metadata.as_ref(),
    )
    .await
    .map_err(|e| internal_error("Saving message", e))?;

    Ok(Json(SaveMessageResponse {
        success: true,
        message: "Message saved successfully".to_string(),
    }))
}

#[derive(Deserialize)]
pub struct HistoryParams {
    pub session_id: Option<String>,
    pub limit: Option<i64>,
}

/// `GET /chat-history?session_id=&limit=`: a session's messages oldest
/// first, or all recent messages when no session is given.
pub async fn handle_get_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<ChatHistoryResponse>, AppError> {
    let messages = store::get_history(&state.pool, params.session_id.as_deref(), params.limit)
        .await
        .map_err(|e| internal_error("Retrieving chat history", e))?;

    Ok(Json(ChatHistoryResponse {
        success: true,
        messages,
        session_id: params.session_id,
    }))
}

/// `DELETE /chat-history/{session_id}`: drop every message in the session.
pub async fn handle_delete_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteHistoryResponse>, AppError> {
    let deleted_count = store::delete_session_messages(&state.pool, &session_id)
        .await
        .map_err(|e| internal_error("Deleting chat history", e))?;

    Ok(Json(DeleteHistoryResponse {
        success: true,
        message: format!("Deleted {} messages", deleted_count),
        deleted_count,
    }))
}
