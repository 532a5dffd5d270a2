//! PDF text extraction.
//!
//! Thin wrapper over `pdf-extract`: uploads supply bytes, this module
//! returns plain UTF-8 text. Scanned (image-only) and encrypted PDFs come
//! back empty or fail outright; the upload handler turns both into a 400.

use anyhow::{Context, Result};

/// Extract all text from an in-memory PDF.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(bytes).context("Failed to extract text from PDF")
}
