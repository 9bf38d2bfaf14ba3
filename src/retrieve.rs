//! Query-time retrieval: embed the question, ask the store for neighbours.

use tracing::{debug, info};

use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::models::RetrievalResult;
use crate::store::VectorStore;

/// Return up to `k` chunks nearest to `query`, in store-native order.
///
/// The ordering is whatever the store produced (best first under its
/// metric); final ranking is the context assembler's job.
///
/// # Errors
///
/// - [`RagError::InvalidArgument`] if `k <= 0`, before any network call.
/// - Any embedding error, unchanged.
///
/// An empty store yields an empty list without embedding the query.
pub async fn retrieve(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    query: &str,
    k: i64,
) -> Result<Vec<RetrievalResult>> {
    if k <= 0 {
        return Err(RagError::invalid_argument(format!(
            "k must be a positive integer, got {}",
            k
        )));
    }

    if store.count().await? == 0 {
        info!("vector store is empty; no results");
        return Ok(Vec::new());
    }

    let query_vec = embedder.embed(query).await?;
    let results = store.nearest(&query_vec, k as usize).await?;

    for r in &results {
        debug!(
            chunk_id = %r.chunk.id,
            source = %r.chunk.source,
            score = %format!("{:.4}", r.score.value()),
            "retrieved chunk"
        );
    }
    info!(k, returned = results.len(), metric = store.metric().as_str(), "retrieval complete");

    Ok(results)
}
