//! SQLite-backed [`VectorStore`].
//!
//! The store lives at `<dir>/store.sqlite`. Embeddings are kept as
//! little-endian `f32` BLOBs next to the chunk text and metadata; search
//! loads every vector and scores it in Rust.
//!
//! Schema:
//!
//! | Table | Columns |
//! |-------|---------|
//! | `chunks` | id, source, title, page, start_index, text, hash, embedding |
//! | `store_meta` | key, value (`dims`, `model`, `metric`, `indexed_at`) |

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::embedding::{blob_to_vec, vec_to_blob};
use crate::error::{RagError, Result};
use crate::models::{Chunk, IndexedChunk, RetrievalResult};

use super::{check_query_dims, rank, uniform_dims, Metric, StoreInfo, VectorStore};

pub const STORE_FILE: &str = "store.sqlite";

pub struct SqliteStore {
    pool: SqlitePool,
    metric: Metric,
    path: PathBuf,
}

impl SqliteStore {
    /// Open or create the store under `dir`, creating the directory and
    /// schema as needed. Used by the indexer.
    pub async fn create(dir: &Path, metric: Metric) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let store = Self::connect(dir, metric, true).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Open an existing store for querying.
    ///
    /// # Errors
    ///
    /// [`RagError::Config`] if the directory or store file is missing.
    pub async fn open(dir: &Path, metric: Metric) -> Result<Self> {
        if !dir.is_dir() {
            return Err(RagError::config(format!(
                "vector store directory '{}' does not exist; run `gqa index` first",
                dir.display()
            )));
        }
        if !dir.join(STORE_FILE).is_file() {
            return Err(RagError::config(format!(
                "no vector store found in '{}'; run `gqa index` first",
                dir.display()
            )));
        }
        let store = Self::connect(dir, metric, false).await?;
        store.migrate().await?;
        Ok(store)
    }

    async fn connect(dir: &Path, metric: Metric, create: bool) -> Result<Self> {
        let path = dir.join(STORE_FILE);
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(create)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool, metric, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                title TEXT,
                page INTEGER,
                start_index INTEGER NOT NULL,
                text TEXT NOT NULL,
                hash TEXT NOT NULL,
                embedding BLOB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS store_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn meta(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM store_meta WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn stored_dims(&self) -> Result<Option<usize>> {
        Ok(self.meta("dims").await?.and_then(|v| v.parse().ok()))
    }

    /// Chunk counts grouped by source, largest first.
    pub async fn source_counts(&self) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(
            "SELECT source, COUNT(*) AS n FROM chunks GROUP BY source ORDER BY n DESC, source ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| (row.get("source"), row.get("n")))
            .collect())
    }

    /// Metric recorded by the last write, if any.
    pub async fn stored_metric(&self) -> Result<Option<String>> {
        self.meta("metric").await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    fn metric(&self) -> Metric {
        self.metric
    }

    async fn replace_all(&self, chunks: &[IndexedChunk], model: &str) -> Result<()> {
        let dims = uniform_dims(chunks)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM chunks").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM store_meta")
            .execute(&mut *tx)
            .await?;

        for item in chunks {
            let c = &item.chunk;
            sqlx::query(
                r#"
                INSERT INTO chunks (id, source, title, page, start_index, text, hash, embedding)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&c.id)
            .bind(&c.source)
            .bind(&c.title)
            .bind(c.page.map(i64::from))
            .bind(c.start_index as i64)
            .bind(&c.text)
            .bind(&c.hash)
            .bind(vec_to_blob(&item.embedding))
            .execute(&mut *tx)
            .await?;
        }

        let mut meta: Vec<(&str, String)> = vec![
            ("model", model.to_string()),
            ("metric", self.metric.as_str().to_string()),
            ("indexed_at", chrono::Utc::now().timestamp().to_string()),
        ];
        if let Some(d) = dims {
            meta.push(("dims", d.to_string()));
        }
        for (key, value) in meta {
            sqlx::query("INSERT INTO store_meta (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!(chunks = chunks.len(), path = %self.path.display(), "replaced store contents");
        Ok(())
    }

    async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<RetrievalResult>> {
        let rows = sqlx::query(
            "SELECT id, source, title, page, start_index, text, hash, embedding FROM chunks",
        )
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }
        check_query_dims(self.stored_dims().await?, query)?;

        let loaded: Vec<(Chunk, Vec<f32>)> = rows
            .iter()
            .map(|row| {
                let page: Option<i64> = row.get("page");
                let start_index: i64 = row.get("start_index");
                let blob: Vec<u8> = row.get("embedding");
                (
                    Chunk {
                        id: row.get("id"),
                        source: row.get("source"),
                        title: row.get("title"),
                        page: page.map(|p| p as u32),
                        start_index: start_index as usize,
                        text: row.get("text"),
                        hash: row.get("hash"),
                    },
                    blob_to_vec(&blob),
                )
            })
            .collect();

        Ok(rank(
            query,
            loaded.iter().map(|(c, v)| (c, v.as_slice())),
            self.metric,
            k,
        ))
    }

    async fn count(&self) -> Result<usize> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as usize)
    }

    async fn info(&self) -> Result<StoreInfo> {
        Ok(StoreInfo {
            chunks: self.count().await?,
            dims: self.stored_dims().await?,
            model: self.meta("model").await?,
            indexed_at: self.meta("indexed_at").await?.and_then(|v| v.parse().ok()),
        })
    }
}
