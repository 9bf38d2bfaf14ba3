//! Vector store abstraction.
//!
//! The [`VectorStore`] trait is the seam between the pipeline and the
//! persisted index. Two backends exist:
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`sqlite::SqliteStore`] | on-disk store under the configured directory |
//! | [`memory::InMemoryStore`] | tests and throwaway runs |
//!
//! Both run exact brute-force search over every stored vector and return
//! results best-first under their [`Metric`].

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::embedding::{cosine_similarity, l2_distance};
use crate::error::{RagError, Result};
use crate::models::{IndexedChunk, RetrievalResult, Score};

/// How query and chunk vectors are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Cosine similarity; produces [`Score::Similarity`] (higher is closer).
    Cosine,
    /// Euclidean distance; produces [`Score::Distance`] (lower is closer).
    L2,
}

impl Metric {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "cosine" => Ok(Metric::Cosine),
            "l2" => Ok(Metric::L2),
            other => Err(RagError::config(format!(
                "unknown retrieval metric '{}'",
                other
            ))),
        }
    }

    pub fn score(&self, query: &[f32], candidate: &[f32]) -> Score {
        match self {
            Metric::Cosine => Score::Similarity(cosine_similarity(query, candidate) as f64),
            Metric::L2 => Score::Distance(l2_distance(query, candidate) as f64),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cosine => "cosine",
            Metric::L2 => "l2",
        }
    }
}

/// Summary of what a store currently holds.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreInfo {
    pub chunks: usize,
    pub dims: Option<usize>,
    pub model: Option<String>,
    /// Unix timestamp of the last full replacement.
    pub indexed_at: Option<i64>,
}

/// Abstract storage backend for indexed chunks.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The metric used by [`nearest`](VectorStore::nearest).
    fn metric(&self) -> Metric;

    /// Discard everything and store `chunks` in one atomic step.
    ///
    /// Fails with [`RagError::DimensionMismatch`] (leaving the previous
    /// contents intact) if the chunks do not share one dimensionality.
    async fn replace_all(&self, chunks: &[IndexedChunk], model: &str) -> Result<()>;

    /// Return up to `k` chunks nearest to `query`, best first.
    ///
    /// An empty store returns an empty list. A query whose length differs
    /// from the stored dimensionality fails with [`RagError::DimensionMismatch`].
    async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<RetrievalResult>>;

    /// Number of stored chunks.
    async fn count(&self) -> Result<usize>;

    async fn info(&self) -> Result<StoreInfo>;
}

/// Check that every chunk carries an embedding of the same length.
///
/// Returns that length, or `None` for an empty slice.
pub fn uniform_dims(chunks: &[IndexedChunk]) -> Result<Option<usize>> {
    let mut dims: Option<usize> = None;
    for c in chunks {
        let len = c.embedding.len();
        if len == 0 {
            return Err(RagError::DimensionMismatch {
                expected: dims.unwrap_or(1),
                actual: 0,
            });
        }
        match dims {
            None => dims = Some(len),
            Some(d) if d != len => {
                return Err(RagError::DimensionMismatch {
                    expected: d,
                    actual: len,
                })
            }
            Some(_) => {}
        }
    }
    Ok(dims)
}

/// Score every candidate against `query`, sort best-first, keep `k`.
pub(crate) fn rank<'a, I>(query: &[f32], candidates: I, metric: Metric, k: usize) -> Vec<RetrievalResult>
where
    I: IntoIterator<Item = (&'a crate::models::Chunk, &'a [f32])>,
{
    let mut results: Vec<RetrievalResult> = candidates
        .into_iter()
        .map(|(chunk, vector)| RetrievalResult {
            chunk: chunk.clone(),
            score: metric.score(query, vector),
        })
        .collect();

    results.sort_by(|a, b| b.score.relevance_cmp(&a.score));
    results.truncate(k);
    results
}

pub(crate) fn check_query_dims(stored: Option<usize>, query: &[f32]) -> Result<()> {
    match stored {
        Some(d) if d != query.len() => Err(RagError::DimensionMismatch {
            expected: d,
            actual: query.len(),
        }),
        _ => Ok(()),
    }
}
