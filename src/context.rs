//! Context assembly: final ranking and prompt rendering of retrieved chunks.
//!
//! The assembler re-sorts its input by relevance instead of trusting the
//! order the store delivered, truncates to `top_k`, and renders one block
//! per kept chunk:
//!
//! ```text
//! Retrieved documents (top 2):
//!
//! ---
//! ID: 0b6f...
//! Title: cv.pdf
//! Source: cv.pdf (page 1)
//! Score: 0.9000
//! Text: Yahya is available starting June 2025.
//!
//! ---
//! ...
//! ```
//!
//! Relevance follows the [`Score`](crate::models::Score) polarity:
//! similarities sort descending, distances ascending. The sort is stable, so
//! equal scores keep the store's order.

use crate::models::RetrievalResult;

/// Rank `results` by relevance and keep the best `top_k`.
pub fn rank_results(mut results: Vec<RetrievalResult>, top_k: usize) -> Vec<RetrievalResult> {
    results.sort_by(|a, b| b.score.relevance_cmp(&a.score));
    results.truncate(top_k);
    results
}

/// Render the best `top_k` results as a single context block.
///
/// Fewer than `top_k` results render all of them; no padding is added.
pub fn assemble(results: Vec<RetrievalResult>, top_k: usize) -> String {
    let kept = rank_results(results, top_k);

    let blocks: Vec<String> = kept.iter().map(render_block).collect();

    // The header counts rendered blocks, not the requested `top_k`.
    format!(
        "Retrieved documents (top {}):\n\n{}",
        blocks.len(),
        blocks.join("\n")
    )
}

fn render_block(result: &RetrievalResult) -> String {
    let chunk = &result.chunk;
    let source = match chunk.page {
        Some(page) => format!("{} (page {})", chunk.source, page),
        None => chunk.source.clone(),
    };

    format!(
        "---\nID: {}\nTitle: {}\nSource: {}\nScore: {:.4}\nText: {}\n",
        chunk.id,
        chunk.title.as_deref().unwrap_or("N/A"),
        source,
        result.score.value(),
        chunk.text
    )
}
