//! In-memory [`VectorStore`] for tests and throwaway runs.
//!
//! Holds the indexed chunks behind a `tokio::sync::RwLock`. Vector search is
//! brute force over all stored vectors.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::{IndexedChunk, RetrievalResult};

use super::{check_query_dims, rank, uniform_dims, Metric, StoreInfo, VectorStore};

#[derive(Default)]
struct Contents {
    chunks: Vec<IndexedChunk>,
    dims: Option<usize>,
    model: Option<String>,
    indexed_at: Option<i64>,
}

pub struct InMemoryStore {
    metric: Metric,
    contents: RwLock<Contents>,
}

impl InMemoryStore {
    pub fn new(metric: Metric) -> Self {
        Self {
            metric,
            contents: RwLock::new(Contents::default()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Metric::Cosine)
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn metric(&self) -> Metric {
        self.metric
    }

    async fn replace_all(&self, chunks: &[IndexedChunk], model: &str) -> Result<()> {
        let dims = uniform_dims(chunks)?;
        let mut contents = self.contents.write().await;
        *contents = Contents {
            chunks: chunks.to_vec(),
            dims,
            model: Some(model.to_string()),
            indexed_at: Some(chrono::Utc::now().timestamp()),
        };
        Ok(())
    }

    async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<RetrievalResult>> {
        let contents = self.contents.read().await;
        if contents.chunks.is_empty() {
            return Ok(Vec::new());
        }
        check_query_dims(contents.dims, query)?;

        Ok(rank(
            query,
            contents
                .chunks
                .iter()
                .map(|c| (&c.chunk, c.embedding.as_slice())),
            self.metric,
            k,
        ))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.contents.read().await.chunks.len())
    }

    async fn info(&self) -> Result<StoreInfo> {
        let contents = self.contents.read().await;
        Ok(StoreInfo {
            chunks: contents.chunks.len(),
            dims: contents.dims,
            model: contents.model.clone(),
            indexed_at: contents.indexed_at,
        })
    }
}
