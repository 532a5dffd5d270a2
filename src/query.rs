//! `POST /query`: similarity search over indexed chunks.
//!
//! Embed the query, ask the vector index for the top_k nearest records,
//! and map the matches straight through. No local ranking or re-scoring.

use axum::extract::State;
use axum::Json;

use crate::models::{QueryRequest, QueryResponse, RetrievedChunk};
use crate::server::{bad_request, upstream_error, AppError, AppState};
use crate::{embedding, vector_index};

pub async fn handle_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    if request.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }
    let top_k = request.top_k.unwrap_or(state.config.default_top_k);
    if !(1..=20).contains(&top_k) {
        return Err(bad_request("top_k must be in 1..=20"));
    }

    let query_embedding = embedding::embed_query(&state.http, &state.config.embedding, &request.query)
        .await
        .map_err(|e| upstream_error("Embedding API", e))?;

    let matches = vector_index::query(
        &state.http,
        &state.config.pinecone,
        &state.index_host,
        &query_embedding,
        top_k,
    )
    .await
    .map_err(|e| upstream_error("Vector index", e))?;

    let chunks: Vec<RetrievedChunk> = matches
        .into_iter()
        .map(|m| RetrievedChunk {
            text: m
                .metadata
                .get("text")
                .and_then(|t| t.as_str())
                .unwrap_or_default()
                .to_string(),
            score: m.score,
            metadata: m.metadata,
        })
        .collect();

    tracing::info!(query = %request.query, results = chunks.len(), "Query served");

    Ok(Json(QueryResponse {
        success: true,
        message: format!("Retrieved {} relevant chunks", chunks.len()),
        query: request.query,
        chunks,
    }))
}
