//! Library-level end-to-end tests: index a folder into SQLite, then answer.

mod common;

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use common::{HashEmbedder, RuleChat};
use grounded_qa::config::Config;
use grounded_qa::generate::DEFAULT_FALLBACK_ANSWER;
use grounded_qa::index::index_corpus;
use grounded_qa::pipeline::{Pipeline, PipelineSettings};
use grounded_qa::store::sqlite::SqliteStore;
use grounded_qa::store::{Metric, VectorStore};
use grounded_qa::RagError;

const CV: &str = "Yahya El Amrani, final-year computer science student. \
Yahya is available to start his internship in June 2025 for six months.";
const MENU: &str = "The cafeteria serves pasta on Fridays and soup on Mondays.";

fn config(root: &Path) -> Config {
    let mut cfg = Config::default();
    cfg.sources.dir = root.join("Data_sources");
    cfg.store.dir = root.join("chroma_db");
    cfg
}

async fn index_and_open(cfg: &Config, metric: Metric) -> Pipeline {
    let store = SqliteStore::create(&cfg.store.dir, metric).await.unwrap();
    index_corpus(cfg, &HashEmbedder, &store).await.unwrap();
    Pipeline::new(
        Box::new(HashEmbedder),
        Box::new(store),
        Box::new(RuleChat::default()),
        PipelineSettings::from_config(cfg),
    )
}

#[tokio::test]
async fn test_answers_start_date_from_cv() {
    let tmp = TempDir::new().unwrap();
    let cfg = config(tmp.path());
    fs::create_dir_all(&cfg.sources.dir).unwrap();
    fs::write(cfg.sources.dir.join("cv.txt"), CV).unwrap();
    fs::write(cfg.sources.dir.join("menu.txt"), MENU).unwrap();

    let pipeline = index_and_open(&cfg, Metric::Cosine).await;
    let answer = pipeline
        .answer("When can Yahya start his internship?")
        .await
        .unwrap();

    assert!(answer.text.contains("June 2025"), "{}", answer.text);
    assert_eq!(answer.results[0].chunk.source, "cv.txt");
    assert!(answer
        .context
        .starts_with("Retrieved documents (top 2):\n\n---\nID: "));
    let first_block = answer.context.split("\n---\n").nth(1).unwrap();
    assert!(first_block.contains("Source: cv.txt"));
}

#[tokio::test]
async fn test_one_line_availability_note() {
    let tmp = TempDir::new().unwrap();
    let cfg = config(tmp.path());
    fs::create_dir_all(&cfg.sources.dir).unwrap();
    fs::write(
        cfg.sources.dir.join("availability.txt"),
        "Yahya is available starting June 2025.",
    )
    .unwrap();
    fs::write(cfg.sources.dir.join("menu.txt"), MENU).unwrap();

    let pipeline = index_and_open(&cfg, Metric::Cosine).await;
    let answer = pipeline.answer("When can Yahya start?").await.unwrap();

    assert_eq!(answer.results[0].chunk.source, "availability.txt");
    assert!(answer
        .context
        .contains("Text: Yahya is available starting June 2025.\n"));
    assert!(answer.text.contains("June 2025"), "{}", answer.text);
}

#[tokio::test]
async fn test_l2_metric_gives_same_top_chunk() {
    let tmp = TempDir::new().unwrap();
    let mut cfg = config(tmp.path());
    cfg.retrieval.metric = "l2".to_string();
    cfg.retrieval.top_k = 1;
    fs::create_dir_all(&cfg.sources.dir).unwrap();
    fs::write(cfg.sources.dir.join("cv.txt"), CV).unwrap();
    // Raw bag-of-words vectors are unnormalised; a long distractor keeps
    // the distance ordering unambiguous.
    fs::write(cfg.sources.dir.join("menu.txt"), MENU.repeat(3)).unwrap();

    let pipeline = index_and_open(&cfg, Metric::L2).await;
    let answer = pipeline
        .answer("When can Yahya start his internship?")
        .await
        .unwrap();
    assert!(answer.context.contains("Source: cv.txt"));
    assert!(!answer.context.contains("cafeteria"));
}

#[tokio::test]
async fn test_reindex_forgets_previous_corpus() {
    let tmp = TempDir::new().unwrap();
    let cfg = config(tmp.path());
    fs::create_dir_all(&cfg.sources.dir).unwrap();
    fs::write(cfg.sources.dir.join("cv.txt"), CV).unwrap();

    let store = SqliteStore::create(&cfg.store.dir, Metric::Cosine).await.unwrap();
    index_corpus(&cfg, &HashEmbedder, &store).await.unwrap();
    store.close().await;

    fs::remove_file(cfg.sources.dir.join("cv.txt")).unwrap();
    fs::write(cfg.sources.dir.join("menu.txt"), MENU).unwrap();

    let pipeline = index_and_open(&cfg, Metric::Cosine).await;
    let results = pipeline
        .search("When can Yahya start his internship?", 10)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk.source, "menu.txt");

    let answer = pipeline
        .answer("When can Yahya start his internship?")
        .await
        .unwrap();
    assert_eq!(answer.text, DEFAULT_FALLBACK_ANSWER);
}

#[tokio::test]
async fn test_empty_corpus_yields_empty_context() {
    let tmp = TempDir::new().unwrap();
    let cfg = config(tmp.path());
    fs::create_dir_all(&cfg.sources.dir).unwrap();

    let pipeline = index_and_open(&cfg, Metric::Cosine).await;
    assert_eq!(pipeline.store().count().await.unwrap(), 0);

    let answer = pipeline.answer("Anything at all?").await.unwrap();
    assert!(answer.results.is_empty());
    assert_eq!(answer.context, "Retrieved documents (top 0):\n\n");
    assert_eq!(answer.text, DEFAULT_FALLBACK_ANSWER);
}

#[tokio::test]
async fn test_invalid_k_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let cfg = config(tmp.path());
    fs::create_dir_all(&cfg.sources.dir).unwrap();
    fs::write(cfg.sources.dir.join("cv.txt"), CV).unwrap();

    let pipeline = index_and_open(&cfg, Metric::Cosine).await;
    for k in [0, -3] {
        let err = pipeline.search("start date", k).await.unwrap_err();
        assert!(matches!(err, RagError::InvalidArgument(_)));
    }
}

#[tokio::test]
async fn test_chunks_carry_offsets_for_long_documents() {
    let tmp = TempDir::new().unwrap();
    let cfg = config(tmp.path());
    fs::create_dir_all(cfg.sources.dir.join("nested")).unwrap();
    let body: String = (0..100).map(|i| format!("line{:03} ", i)).collect();
    fs::write(cfg.sources.dir.join("nested/long.txt"), &body).unwrap();

    let pipeline = index_and_open(&cfg, Metric::Cosine).await;
    let results = pipeline.search("line050", 100).await.unwrap();

    let mut starts: Vec<usize> = results.iter().map(|r| r.chunk.start_index).collect();
    starts.sort();
    // 800 chars, window 300, overlap 100
    assert_eq!(starts, vec![0, 200, 400, 600]);
    assert!(results.iter().all(|r| r.chunk.source == "nested/long.txt"));
    assert!(results.iter().all(|r| r.chunk.title.as_deref() == Some("long.txt")));
}
