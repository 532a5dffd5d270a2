//! Core data models used throughout Paperchat.
//!
//! These types represent the chunks, vector records, and chat messages that
//! flow through the upload, query, and chat-history pipelines, plus the JSON
//! request/response bodies of the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bounded window of a source document's text, the retrieval unit.
///
/// Produced by the chunker; immutable once created. Consumed exactly once to
/// produce an embedding and a vector-store record.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    /// Contiguous within one document, starting at 0.
    pub chunk_index: usize,
    /// Original filename of the uploaded PDF.
    pub filename: String,
}

/// A vector record upserted into the hosted vector index.
///
/// Owned by the index once written: created on upload, read on query,
/// never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: serde_json::Value,
}

/// A similarity-search match returned from the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredMatch {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Role of a stored chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    User,
    Assistant,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::User => "user",
            MessageType::Assistant => "assistant",
        }
    }
}

/// A single chat message row from the `chat_history` table.
///
/// Rows are append-only: created per message, never updated, deleted in bulk
/// by session. `metadata` is opaque JSON-as-text (not queryable).
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: i64,
    pub session_id: String,
    pub message_type: MessageType,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: Option<serde_json::Value>,
}

/// A chat session row grouping messages into one conversation.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub mode: String,
    pub pdf_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============ Request / response bodies ============

/// Response body for `POST /upload-pdf`.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    pub chunks_processed: usize,
    pub message: String,
}

/// Request body for `POST /query`.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// A retrieved chunk with its similarity score and stored metadata.
#[derive(Debug, Serialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub score: f32,
    pub metadata: serde_json::Value,
}

/// Response body for `POST /query`.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub query: String,
    pub chunks: Vec<RetrievedChunk>,
    pub message: String,
}

/// Request body for `POST /save-message`.
#[derive(Debug, Deserialize)]
pub struct SaveMessageRequest {
    pub session_id: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub retrieved_chunks: Option<serde_json::Value>,
}

/// Response body for `POST /save-message`.
#[derive(Debug, Serialize)]
pub struct SaveMessageResponse {
    pub success: bool,
    pub message: String,
}

/// Response body for `GET /chat-history`.
#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub success: bool,
    pub messages: Vec<ChatMessage>,
    pub session_id: Option<String>,
}

/// Response body for `DELETE /chat-history/{session_id}`.
#[derive(Debug, Serialize)]
pub struct DeleteHistoryResponse {
    pub success: bool,
    pub message: String,
    pub deleted_count: u64,
}

/// Request body for `POST /sessions`.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub name: String,
    pub mode: String,
    #[serde(default)]
    pub pdf_id: Option<String>,
}

/// Response body for `GET /sessions`.
#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<Session>,
}

/// Response body for `GET /sessions/{id}/messages`.
#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<ChatMessage>,
}
