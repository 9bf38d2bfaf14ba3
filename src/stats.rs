//! Store statistics.
//!
//! Prints what the last `gqa index` run left behind: chunk count, embedding
//! model and dimensionality, metric, and a per-source breakdown. Needs no
//! API keys.

use anyhow::Result;

use crate::config::Config;
use crate::pipeline::open_store;
use crate::store::VectorStore;

/// Run the stats command: open the store and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = open_store(config).await?;
    let info = store.info().await?;
    let sources = store.source_counts().await?;
    let metric = store.stored_metric().await?;

    let db_size = std::fs::metadata(store.path())
        .map(|m| m.len())
        .unwrap_or(0);

    println!("grounded-qa — Store Stats");
    println!("=========================");
    println!();
    println!("  Store:       {}", store.path().display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Chunks:      {}", info.chunks);
    println!(
        "  Model:       {}",
        info.model.as_deref().unwrap_or("(none)")
    );
    println!(
        "  Dimensions:  {}",
        info.dims
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("  Metric:      {}", metric.as_deref().unwrap_or("-"));
    println!(
        "  Indexed:     {}",
        info.indexed_at
            .map(format_ts_relative)
            .unwrap_or_else(|| "never".to_string())
    );

    if !sources.is_empty() {
        println!();
        println!("  By source:");
        println!("  {:<48} {:>8}", "SOURCE", "CHUNKS");
        println!("  {}", "-".repeat(57));

        for (source, count) in &sources {
            println!("  {:<48} {:>8}", source, count);
        }
    }

    println!();

    store.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
