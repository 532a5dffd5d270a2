//! Fixed-size sliding-window text chunker.
//!
//! Splits cleaned document text into windows of at most `chunk_size`
//! characters, where consecutive windows share exactly `chunk_overlap`
//! characters. Window arithmetic operates on characters, never bytes, so
//! multi-byte UTF-8 text is always split on valid boundaries.
//!
//! The overlap invariant (`overlap < size`) is enforced at configuration
//! load; callers pass validated settings.

use crate::config::ChunkingConfig;
use crate::models::Chunk;

/// Chunks shorter than this are dropped as noise (stray page numbers,
/// orphaned punctuation from extraction).
const MIN_CHUNK_CHARS: usize = 10;

/// Collapse whitespace runs to single spaces, strip control characters,
/// and trim. PDF extraction output is full of layout artifacts; embedding
/// quality improves noticeably on cleaned text.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split text into overlapping fixed-size windows.
///
/// Each window holds at most `size` characters and starts `size - overlap`
/// characters after the previous one, so consecutive windows share exactly
/// `overlap` characters. Text no longer than `size` yields a single window;
/// empty text yields none. Concatenating the first window with the
/// post-overlap suffix of each subsequent window reconstructs the input.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    debug_assert!(overlap < size, "overlap must be less than chunk size");

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    if chars.len() <= size {
        return vec![text.to_string()];
    }

    let step = size - overlap;
    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + size).min(chars.len());
        windows.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    windows
}

/// Is this chunk worth embedding?
pub fn validate_chunk(chunk: &str) -> bool {
    chunk.trim().chars().count() >= MIN_CHUNK_CHARS
}

/// Chunk a document's cleaned text into [`Chunk`] records.
///
/// Windows failing [`validate_chunk`] are dropped and the survivors
/// re-indexed, so `chunk_index` values are always contiguous from 0.
pub fn chunk_document(text: &str, filename: &str, chunking: &ChunkingConfig) -> Vec<Chunk> {
    chunk_text(text, chunking.chunk_size, chunking.chunk_overlap)
        .into_iter()
        .filter(|w| validate_chunk(w))
        .enumerate()
        .map(|(chunk_index, text)| Chunk {
            text,
            chunk_index,
            filename: filename.to_string(),
        })
        .collect()
}
