//! Fixed-size sliding-window text chunker.
//!
//! Splits a [`SourceDocument`] body into [`Chunk`]s of at most
//! `window_chars` characters. Consecutive windows overlap by exactly
//! `overlap_chars` characters, so text cut at one boundary is whole in the
//! neighbouring chunk. Lengths are counted in `char`s, not bytes, so
//! multi-byte text never splits inside a code point.
//!
//! Each chunk receives a random UUID plus a SHA-256 hash of its text.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::{Chunk, SourceDocument};

/// Split a document into overlapping windows.
///
/// Returns no chunks for an empty or whitespace-only body. A body shorter
/// than the window yields exactly one chunk. `overlap_chars` must be smaller
/// than `window_chars` (enforced by config validation); a larger value is
/// clamped so the window always advances.
pub fn chunk_document(doc: &SourceDocument, window_chars: usize, overlap_chars: usize) -> Vec<Chunk> {
    split_windows(&doc.body, window_chars, overlap_chars)
        .into_iter()
        .map(|(start, text)| make_chunk(doc, start, text))
        .collect()
}

/// Compute `(start_char_offset, text)` windows over `text`.
pub fn split_windows(text: &str, window_chars: usize, overlap_chars: usize) -> Vec<(usize, String)> {
    if text.trim().is_empty() || window_chars == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let step = window_chars - overlap_chars.min(window_chars - 1);

    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + window_chars).min(chars.len());
        windows.push((start, chars[start..end].iter().collect::<String>()));
        if end == chars.len() {
            break;
        }
        start += step;
    }

    windows
}

fn make_chunk(doc: &SourceDocument, start_index: usize, text: String) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        source: doc.source.clone(),
        title: doc.title.clone(),
        page: doc.page,
        start_index,
        text,
        hash,
    }
}
