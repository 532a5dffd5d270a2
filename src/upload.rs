//! `POST /upload-pdf`: the ingestion pipeline.
//!
//! Validate → save file → extract text → clean → chunk → embed → upsert.
//! Any delegated failure aborts the whole upload and surfaces an HTTP
//! error; partial upserts are not rolled back (there is no transaction
//! boundary across the hosted vector index). Invalid input (wrong file
//! type, oversize, empty text) is rejected before any network call.

use axum::extract::{Multipart, State};
use axum::Json;
use std::path::Path;
use uuid::Uuid;

use crate::models::{UploadResponse, VectorRecord};
use crate::server::{bad_request, internal_error, upstream_error, AppError, AppState};
use crate::{chunk, embedding, extract, vector_index};

pub async fn handle_upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let (filename, bytes) = read_file_field(&mut multipart).await?;
    let filename = sanitize_filename(&filename)?;

    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(bad_request(format!(
            "Only PDF files are allowed. Got: {}",
            filename
        )));
    }
    if bytes.len() > state.config.max_file_size {
        return Err(bad_request(format!(
            "File size ({} bytes) exceeds maximum allowed size of {} bytes",
            bytes.len(),
            state.config.max_file_size
        )));
    }

    tracing::info!(%filename, size = bytes.len(), "Processing PDF upload");

    // Keep a copy of the original on disk alongside the index.
    let file_path = state.config.upload_dir.join(&filename);
    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| internal_error("Saving uploaded file", e.into()))?;

    let raw_text = extract::extract_pdf_text(&bytes)
        .map_err(|e| bad_request(format!("Failed to read PDF: {}", e)))?;
    let cleaned = chunk::clean_text(&raw_text);
    if cleaned.is_empty() {
        return Err(bad_request(
            "No text found in PDF. It might be scanned (image-only) or protected.",
        ));
    }

    let chunks = chunk::chunk_document(&cleaned, &filename, &state.config.chunking);
    if chunks.is_empty() {
        return Err(bad_request("PDF text too short to index"));
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let embeddings = embedding::embed_documents(&state.http, &state.config.embedding, &texts)
        .await
        .map_err(|e| upstream_error("Embedding API", e))?;

    let total_chunks = chunks.len();
    let vectors: Vec<VectorRecord> = chunks
        .iter()
        .zip(embeddings)
        .map(|(chunk, values)| VectorRecord {
            id: Uuid::new_v4().to_string(),
            values,
            // Chunk text rides along in metadata so queries can return it
            // without a second lookup.
            metadata: serde_json::json!({
                "filename": chunk.filename,
                "chunk_index": chunk.chunk_index,
                "total_chunks": total_chunks,
                "source": "pdf",
                "text": chunk.text,
            }),
        })
        .collect();

    let upserted = vector_index::upsert(
        &state.http,
        &state.config.pinecone,
        &state.index_host,
        &vectors,
    )
    .await
    .map_err(|e| upstream_error("Vector index", e))?;

    tracing::info!(%filename, chunks = total_chunks, upserted, "PDF indexed");

    Ok(Json(UploadResponse {
        success: true,
        filename: filename.clone(),
        chunks_processed: total_chunks,
        message: format!("Successfully processed {}", filename),
    }))
}

/// Reduce a client-supplied filename to its final path component.
///
/// Multipart filenames are attacker-controlled; joining them into the
/// upload directory verbatim would let a name like `../escaped.pdf` write
/// outside it. Names with no usable component (`..`, `/`, empty) are
/// rejected.
fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string())
        .ok_or_else(|| bad_request(format!("Invalid filename: {}", filename)))
}

/// Pull the `file` field out of the multipart body.
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Vec<u8>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| bad_request("No filename provided"))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(format!("Failed to read file body: {}", e)))?;
        return Ok((filename, bytes.to_vec()));
    }
    Err(bad_request("Missing 'file' field in multipart body"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directory_components() {
        assert_eq!(sanitize_filename("../escaped.pdf").unwrap(), "escaped.pdf");
        assert_eq!(
            sanitize_filename("/etc/cron.d/job.pdf").unwrap(),
            "job.pdf"
        );
        assert_eq!(
            sanitize_filename("nested/dir/doc.pdf").unwrap(),
            "doc.pdf"
        );
    }

    #[test]
    fn sanitize_keeps_plain_names() {
        assert_eq!(sanitize_filename("report.pdf").unwrap(), "report.pdf");
    }

    #[test]
    fn sanitize_rejects_names_without_a_component() {
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("/").is_err());
        assert!(sanitize_filename("").is_err());
    }
}
