//! TOML configuration for the `gqa` binary and the pipeline components.
//!
//! Every section carries serde defaults, so a config file only needs the
//! values that differ from the stock OpenRouter setup. API keys are never
//! stored in the file: each client names the environment variable it reads.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_dir")]
    pub dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
        }
    }
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("chroma_db")
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    #[serde(default = "default_sources_dir")]
    pub dir: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            dir: default_sources_dir(),
        }
    }
}

fn default_sources_dir() -> PathBuf {
    PathBuf::from("Data_sources")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_window_chars")]
    pub window_chars: usize,
    #[serde(default = "default_overlap_chars")]
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_chars: default_window_chars(),
            overlap_chars: default_overlap_chars(),
        }
    }
}

fn default_window_chars() -> usize {
    300
}
fn default_overlap_chars() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Number of nearest chunks requested from the store.
    #[serde(default = "default_k")]
    pub k: i64,
    /// Number of blocks kept by the context assembler.
    #[serde(default = "default_k")]
    pub top_k: i64,
    /// `"cosine"` (similarity, higher is better) or `"l2"` (distance, lower is better).
    #[serde(default = "default_metric")]
    pub metric: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            top_k: default_k(),
            metric: default_metric(),
        }
    }
}

fn default_k() -> i64 {
    4
}
fn default_metric() -> String {
    "cosine".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Expected vector length. When set, responses of any other length are rejected.
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_embedding_key_env")]
    pub api_key_env: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_embedding_model(),
            dims: None,
            batch_size: default_batch_size(),
            timeout_secs: default_embedding_timeout(),
            api_key_env: default_embedding_key_env(),
        }
    }
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}
fn default_embedding_model() -> String {
    "sentence-transformers/all-minilm-l12-v2".to_string()
}
fn default_batch_size() -> usize {
    32
}
fn default_embedding_timeout() -> u64 {
    30
}
fn default_embedding_key_env() -> String {
    "EMBEDDINGS_API_KEY".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_chat_model")]
    pub model: String,
    #[serde(default = "default_reasoning")]
    pub reasoning: bool,
    #[serde(default = "default_chat_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_chat_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_fallback_answer")]
    pub fallback_answer: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_chat_model(),
            reasoning: default_reasoning(),
            timeout_secs: default_chat_timeout(),
            api_key_env: default_chat_key_env(),
            fallback_answer: default_fallback_answer(),
        }
    }
}

fn default_chat_model() -> String {
    "openai/gpt-oss-20b:free".to_string()
}
fn default_reasoning() -> bool {
    true
}
fn default_chat_timeout() -> u64 {
    120
}
fn default_chat_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_fallback_answer() -> String {
    crate::generate::DEFAULT_FALLBACK_ANSWER.to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct IndexConfig {
    /// `"skip"` logs and skips unparseable files; `"abort"` fails the run.
    #[serde(default)]
    pub on_parse_error: ParseErrorPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConversationConfig {
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
        }
    }
}

fn default_max_turns() -> usize {
    50
}

/// What the indexer does when a source file cannot be parsed.
///
/// Unknown names are rejected when the config is deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseErrorPolicy {
    #[default]
    Skip,
    Abort,
}

impl IndexConfig {
    pub fn policy(&self) -> ParseErrorPolicy {
        self.on_parse_error
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&content)?;
    Ok(config.resolve_relative_to(path.parent().unwrap_or(Path::new("."))))
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate chunking
    if config.chunking.window_chars == 0 {
        bail!("chunking.window_chars must be > 0");
    }
    if config.chunking.overlap_chars >= config.chunking.window_chars {
        bail!(
            "chunking.overlap_chars ({}) must be smaller than chunking.window_chars ({})",
            config.chunking.overlap_chars,
            config.chunking.window_chars
        );
    }

    // Validate retrieval
    if config.retrieval.k < 1 {
        bail!("retrieval.k must be >= 1");
    }
    if config.retrieval.top_k < 1 {
        bail!("retrieval.top_k must be >= 1");
    }
    match config.retrieval.metric.as_str() {
        "cosine" | "l2" => {}
        other => bail!("Unknown retrieval metric: '{}'. Must be cosine or l2.", other),
    }

    // Validate embedding
    if config.embedding.batch_size == 0 {
        bail!("embedding.batch_size must be > 0");
    }
    if config.embedding.dims == Some(0) {
        bail!("embedding.dims must be > 0 when set");
    }
    if config.embedding.model.trim().is_empty() {
        bail!("embedding.model must not be empty");
    }
    if config.chat.model.trim().is_empty() {
        bail!("chat.model must not be empty");
    }

    if config.conversation.max_turns == 0 {
        bail!("conversation.max_turns must be > 0");
    }

    Ok(())
}

impl Config {
    /// Relative store and source directories are taken relative to the
    /// directory that holds the config file.
    fn resolve_relative_to(mut self, base: &Path) -> Self {
        if self.store.dir.is_relative() {
            self.store.dir = base.join(&self.store.dir);
        }
        if self.sources.dir.is_relative() {
            self.sources.dir = base.join(&self.sources.dir);
        }
        self
    }
}
