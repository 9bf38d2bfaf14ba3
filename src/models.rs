//! Core data models used throughout the pipeline.
//!
//! These types represent the documents, chunks, and scored results that flow
//! from the loader through the store to the context assembler.

use std::cmp::Ordering;

pub const CONTENT_TYPE_TEXT: &str = "text/plain";
pub const CONTENT_TYPE_PDF: &str = "application/pdf";

/// A parsed unit of a source file, before chunking.
///
/// Plain-text files produce one document; PDFs produce one per page.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Path relative to the source directory.
    pub source: String,
    pub title: Option<String>,
    /// 1-based page number for paged formats.
    pub page: Option<u32>,
    pub content_type: String,
    pub body: String,
}

/// A window of a document's text. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub source: String,
    pub title: Option<String>,
    pub page: Option<u32>,
    /// Character offset of the window within its parent document.
    pub start_index: usize,
    pub text: String,
    pub hash: String,
}

/// A chunk paired with its embedding, as persisted in the store.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A relevance score with its polarity attached.
///
/// Stores produce either similarities (higher is closer) or distances
/// (lower is closer). Carrying the polarity with the value keeps every
/// ranking pass explicit about its direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    Similarity(f64),
    Distance(f64),
}

impl Score {
    pub fn value(&self) -> f64 {
        match *self {
            Score::Similarity(v) | Score::Distance(v) => v,
        }
    }

    /// Order two scores so that the more relevant one compares `Greater`.
    ///
    /// Scores of different kinds are not comparable by value; similarities
    /// rank ahead of distances so the result is still a total order.
    pub fn relevance_cmp(&self, other: &Score) -> Ordering {
        match (self, other) {
            (Score::Similarity(a), Score::Similarity(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (Score::Distance(a), Score::Distance(b)) => b.partial_cmp(a).unwrap_or(Ordering::Equal),
            (Score::Similarity(_), Score::Distance(_)) => Ordering::Greater,
            (Score::Distance(_), Score::Similarity(_)) => Ordering::Less,
        }
    }
}

/// A chunk returned by the store for one query.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub chunk: Chunk,
    pub score: Score,
}
