//! `gqa search` and `gqa context`: inspect retrieval without generating.

use anyhow::Result;

use crate::config::Config;
use crate::context;
use crate::embedding::OpenAiEmbedder;
use crate::pipeline::{check_embedding_model, open_store};
use crate::retrieve::retrieve;

/// Print the `k` nearest chunks for `query` in store order.
pub async fn run_search(config: &Config, query: &str, k: Option<i64>) -> Result<()> {
    let embedder = OpenAiEmbedder::from_config(&config.embedding)?;
    let store = open_store(config).await?;
    check_embedding_model(&store, &embedder).await?;
    let k = k.unwrap_or(config.retrieval.k);

    let results = retrieve(&embedder, &store, query, k).await?;

    if results.is_empty() {
        println!("No results.");
        store.close().await;
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        let chunk = &result.chunk;
        let title_display = chunk.title.as_deref().unwrap_or("(untitled)");

        println!(
            "{}. [{:.4}] {} / {}",
            i + 1,
            result.score.value(),
            chunk.source,
            title_display
        );
        if let Some(page) = chunk.page {
            println!("    page: {}", page);
        }
        println!("    offset: {}", chunk.start_index);
        println!("    excerpt: \"{}\"", excerpt(&chunk.text, 160));
        println!("    id: {}", chunk.id);
        println!();
    }

    store.close().await;
    Ok(())
}

/// Print the context block that `gqa ask` would send to the chat model.
pub async fn run_context(
    config: &Config,
    query: &str,
    k: Option<i64>,
    top_k: Option<usize>,
) -> Result<()> {
    let embedder = OpenAiEmbedder::from_config(&config.embedding)?;
    let store = open_store(config).await?;
    check_embedding_model(&store, &embedder).await?;
    let k = k.unwrap_or(config.retrieval.k);
    let top_k = top_k.unwrap_or(config.retrieval.top_k.max(1) as usize);

    let results = retrieve(&embedder, &store, query, k).await?;
    print!("{}", context::assemble(results, top_k));

    store.close().await;
    Ok(())
}

/// Single-line excerpt of at most `max_chars` characters.
fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    let flat = flat.trim();
    if flat.chars().count() <= max_chars {
        return flat.to_string();
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
