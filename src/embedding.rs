//! Embedding client abstraction and implementation.
//!
//! Defines the [`Embedder`] trait and [`OpenAiEmbedder`], which calls any
//! OpenAI-compatible `POST {base_url}/embeddings` endpoint (OpenRouter by
//! default).
//!
//! Also provides vector utilities used by the stores:
//! - [`cosine_similarity`] and [`l2_distance`] for ranking
//! - [`vec_to_blob`] / [`blob_to_vec`] for SQLite BLOB storage
//!
//! # Failure Semantics
//!
//! Each `embed`/`embed_batch` call makes exactly one HTTP request. There is
//! no retry: a non-2xx status becomes [`RagError::Api`], a network failure
//! [`RagError::Http`], and an unreadable payload
//! [`RagError::MalformedResponse`]. Callers decide whether to try again.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::EmbeddingConfig;
use crate::error::{RagError, Result};

const SERVICE: &str = "embedding";

/// A text-to-vector model.
///
/// Implementations are constructed once (credentials bound at construction)
/// and shared by the indexer and the retriever, so queries are embedded
/// with the same model as the corpus.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier recorded alongside stored vectors.
    fn model_name(&self) -> &str;

    /// Expected dimensionality, if known up front.
    fn dims(&self) -> Option<usize>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, returning one vector per input in input order.
    ///
    /// The default implementation calls [`embed`](Embedder::embed) once per text.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// Embedder backed by an OpenAI-compatible embeddings API.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dims: Option<usize>,
}

impl OpenAiEmbedder {
    /// Create an embedder for `base_url` (e.g. `https://openrouter.ai/api/v1`).
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RagError::config("embedding API key must not be empty"));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key,
            model: model.into(),
            dims: None,
        })
    }

    /// Build from configuration, reading the key from `api_key_env`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if the environment variable is unset.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            RagError::config(format!(
                "{} environment variable not set (embedding API key)",
                config.api_key_env
            ))
        })?;

        let mut embedder = Self::new(
            &config.base_url,
            api_key,
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        embedder.dims = config.dims;
        Ok(embedder)
    }

    /// Reject responses whose vectors are not exactly `dims` long.
    pub fn with_dims(mut self, dims: usize) -> Self {
        self.dims = Some(dims);
        self
    }

    async fn request(&self, input: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        let expected = input.len();
        let body = EmbeddingRequest {
            model: &self.model,
            input,
            encoding_format: "float",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(RagError::Api {
                service: SERVICE,
                status: status.as_u16(),
                body: text,
            });
        }

        let vectors = parse_embedding_response(&text, expected)?;
        if let Some(dims) = self.dims {
            if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
                return Err(RagError::DimensionMismatch {
                    expected: dims,
                    actual: bad.len(),
                });
            }
        }

        debug!(count = vectors.len(), model = %self.model, "embedded texts");
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> Option<usize> {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(vec![text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::malformed(SERVICE, "empty data array"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts.iter().map(String::as_str).collect()).await
    }
}

// ── API request/response types ─────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    encoding_format: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

/// Parse an embeddings response body, restoring input order via `index`.
fn parse_embedding_response(body: &str, expected: usize) -> Result<Vec<Vec<f32>>> {
    let parsed: EmbeddingResponse =
        serde_json::from_str(body).map_err(|e| RagError::malformed(SERVICE, e.to_string()))?;

    if parsed.data.len() != expected {
        return Err(RagError::malformed(
            SERVICE,
            format!("expected {} embeddings, got {}", expected, parsed.data.len()),
        ));
    }

    let mut data = parsed.data;
    if data.iter().all(|d| d.index.is_some()) {
        data.sort_by_key(|d| d.index);
    }

    Ok(data.into_iter().map(|d| d.embedding).collect())
}

/// Encode a float vector as a BLOB (little-endian f32 bytes).
///
/// ```rust
/// use grounded_qa::embedding::{vec_to_blob, blob_to_vec};
///
/// let v = vec![1.0f32, -2.5, 3.125];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 12);
/// assert_eq!(blob_to_vec(&blob), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB back into a float vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` for empty vectors, vectors of
/// different lengths, or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

/// Euclidean distance between two vectors of equal length.
///
/// Returns `f32::INFINITY` when the lengths differ.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
