//! Error types for the question-answering pipeline.
//!
//! Library code returns [`RagError`]; the `gqa` binary wraps it in
//! `anyhow` at the command boundary.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while indexing, retrieving, or generating.
#[derive(Debug, Error)]
pub enum RagError {
    /// A caller supplied an argument outside its valid range (e.g. `k <= 0`).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing or unusable configuration: credentials, store directory, etc.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network-level failure talking to a remote API.
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// A remote API answered with a non-success status.
    #[error("{service} API error {status}: {body}")]
    Api {
        /// Which remote service failed (`embedding` or `chat`).
        service: &'static str,
        /// HTTP status code.
        status: u16,
        /// Raw response body, for diagnosis.
        body: String,
    },

    /// A remote API answered 2xx with a payload we could not interpret.
    #[error("malformed {service} response: {message}")]
    MalformedResponse {
        service: &'static str,
        message: String,
    },

    /// A source document could not be parsed into text.
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// An embedding did not have the dimensionality the store expects.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The persisted vector store failed.
    #[error("vector store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RagError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn malformed(service: &'static str, msg: impl Into<String>) -> Self {
        Self::MalformedResponse {
            service,
            message: msg.into(),
        }
    }
}

/// A convenience result type for pipeline operations.
pub type Result<T> = std::result::Result<T, RagError>;
