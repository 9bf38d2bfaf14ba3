//! # grounded-qa CLI (`gqa`)
//!
//! The `gqa` binary indexes a folder of documents and answers questions
//! about it.
//!
//! ## Usage
//!
//! ```bash
//! gqa --config ./config/gqa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `gqa index` | Rebuild the vector store from the source directory |
//! | `gqa search "<query>"` | Show the nearest chunks with scores |
//! | `gqa context "<query>"` | Show the context block sent to the chat model |
//! | `gqa ask "<question>"` | Answer one question |
//! | `gqa chat` | Interactive question shell |
//! | `gqa stats` | Summarise the store |
//!
//! API keys are read from the environment (`EMBEDDINGS_API_KEY`,
//! `OPENAI_API_KEY` by default). A `.env` file in the working directory is
//! loaded first. Logs go to stderr and are controlled by `RUST_LOG`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grounded_qa::{chat, config, index, search, stats};

/// grounded-qa: answer questions from your own documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/gqa.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "gqa",
    about = "grounded-qa — retrieval-augmented question answering over a local document folder",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/gqa.toml")]
    config: PathBuf,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the vector store from the source directory.
    ///
    /// Every run replaces the store contents completely.
    Index,

    /// Show the chunks nearest to a query.
    Search {
        query: String,

        /// Number of chunks to retrieve (defaults to `retrieval.k`).
        #[arg(long)]
        k: Option<i64>,
    },

    /// Print the context block that `ask` would send.
    Context {
        query: String,

        #[arg(long)]
        k: Option<i64>,

        /// Number of blocks kept after ranking (defaults to `retrieval.top_k`).
        #[arg(long, value_parser = parse_top_k)]
        top_k: Option<usize>,
    },

    /// Answer a single question.
    Ask {
        question: String,

        /// Print the assembled context before the answer.
        #[arg(long)]
        show_context: bool,
    },

    /// Start an interactive question shell.
    Chat,

    /// Show store statistics.
    Stats,
}

fn parse_top_k(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("top-k must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "gqa=debug,grounded_qa=debug"
    } else {
        "gqa=info,grounded_qa=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    dotenvy::dotenv().ok();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Index => {
            index::run_index(&cfg).await?;
        }
        Commands::Search { query, k } => {
            search::run_search(&cfg, &query, k).await?;
        }
        Commands::Context { query, k, top_k } => {
            search::run_context(&cfg, &query, k, top_k).await?;
        }
        Commands::Ask {
            question,
            show_context,
        } => {
            chat::run_ask(&cfg, &question, show_context).await?;
        }
        Commands::Chat => {
            chat::run_chat(&cfg).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
