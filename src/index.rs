//! Corpus indexing: source directory → chunks → embeddings → store.
//!
//! Indexing is a full rebuild. Every run re-reads the whole source
//! directory and replaces the store contents in one step, so running it
//! twice over the same files leaves an equivalent store, and running it over
//! a changed directory leaves no trace of the previous corpus.
//!
//! Nothing touches the store until every file has been parsed and every
//! chunk embedded. A failure before that point (abort-policy parse error,
//! embedding error) leaves the previous contents intact.

use tracing::{debug, info, warn};

use crate::chunk::chunk_document;
use crate::config::{Config, ParseErrorPolicy};
use crate::embedding::{Embedder, OpenAiEmbedder};
use crate::error::Result;
use crate::loader::{self, FileKind};
use crate::models::{Chunk, IndexedChunk};
use crate::store::sqlite::SqliteStore;
use crate::store::{uniform_dims, Metric, VectorStore};

/// Outcome of one indexing run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexReport {
    /// Recognised files found under the source directory, supported or not.
    pub files_seen: usize,
    pub documents_loaded: usize,
    pub chunks_written: usize,
    /// Recognised but unsupported files (relative paths).
    pub unsupported: Vec<String>,
    /// Files skipped because they failed to parse, with the reason.
    pub skipped: Vec<SkippedFile>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub source: String,
    pub reason: String,
}

/// Rebuild the store from `cfg.sources.dir`.
pub async fn index_corpus(
    cfg: &Config,
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
) -> Result<IndexReport> {
    let files = loader::scan_directory(&cfg.sources.dir)?;
    let policy = cfg.index.policy();

    let mut report = IndexReport {
        files_seen: files.len(),
        ..IndexReport::default()
    };

    let mut chunks: Vec<Chunk> = Vec::new();

    for file in &files {
        if file.kind == FileKind::Unsupported {
            debug!(source = %file.relative, "unsupported file type, not indexed");
            report.unsupported.push(file.relative.clone());
            continue;
        }

        let docs = match loader::load_file(file) {
            Ok(docs) => docs,
            Err(e) => match policy {
                ParseErrorPolicy::Abort => return Err(e),
                ParseErrorPolicy::Skip => {
                    warn!(source = %file.relative, error = %e, "skipping unparseable file");
                    report.skipped.push(SkippedFile {
                        source: file.relative.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            },
        };

        report.documents_loaded += docs.len();
        for doc in &docs {
            chunks.extend(chunk_document(
                doc,
                cfg.chunking.window_chars,
                cfg.chunking.overlap_chars,
            ));
        }
    }

    let indexed = embed_chunks(embedder, chunks, cfg.embedding.batch_size).await?;
    uniform_dims(&indexed)?;

    store.replace_all(&indexed, embedder.model_name()).await?;
    report.chunks_written = indexed.len();

    info!(
        files = report.files_seen,
        documents = report.documents_loaded,
        chunks = report.chunks_written,
        unsupported = report.unsupported.len(),
        skipped = report.skipped.len(),
        "index rebuilt"
    );

    Ok(report)
}

/// Run the index command: rebuild the on-disk store and print a summary.
pub async fn run_index(config: &Config) -> anyhow::Result<()> {
    let embedder = OpenAiEmbedder::from_config(&config.embedding)?;
    let metric = Metric::parse(&config.retrieval.metric)?;
    let store = SqliteStore::create(&config.store.dir, metric).await?;

    let report = index_corpus(config, &embedder, &store).await?;

    println!("index {}", config.sources.dir.display());
    println!("  files found: {}", report.files_seen);
    println!("  documents loaded: {}", report.documents_loaded);
    println!("  chunks written: {}", report.chunks_written);
    if !report.unsupported.is_empty() {
        println!("  unsupported: {}", report.unsupported.join(", "));
    }
    for skipped in &report.skipped {
        println!("  skipped: {} ({})", skipped.source, skipped.reason);
    }
    println!("  store: {}", store.path().display());
    println!("ok");

    store.close().await;
    Ok(())
}

async fn embed_chunks(
    embedder: &dyn Embedder,
    chunks: Vec<Chunk>,
    batch_size: usize,
) -> Result<Vec<IndexedChunk>> {
    let mut indexed = Vec::with_capacity(chunks.len());
    let batch_size = batch_size.max(1);

    let mut remaining = chunks.into_iter().peekable();
    while remaining.peek().is_some() {
        let batch: Vec<Chunk> = remaining.by_ref().take(batch_size).collect();
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;
        debug!(batch = batch.len(), "embedded chunk batch");

        indexed.extend(
            batch
                .into_iter()
                .zip(vectors)
                .map(|(chunk, embedding)| IndexedChunk { chunk, embedding }),
        );
    }

    Ok(indexed)
}
