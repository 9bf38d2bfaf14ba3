//! End-to-end question answering: retrieve → assemble → generate.
//!
//! A [`Pipeline`] owns one embedder, one store and one chat model for its
//! whole lifetime. Build it with [`Pipeline::open`] from configuration, or
//! with [`Pipeline::new`] to inject other implementations.

use tracing::info;

use crate::config::Config;
use crate::context;
use crate::embedding::{Embedder, OpenAiEmbedder};
use crate::error::{RagError, Result};
use crate::generate::{self, ChatModel, OpenAiChat};
use crate::models::RetrievalResult;
use crate::retrieve;
use crate::store::sqlite::SqliteStore;
use crate::store::{Metric, VectorStore};

/// Query-time knobs.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub k: i64,
    pub top_k: usize,
    pub fallback_answer: String,
}

impl PipelineSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            k: cfg.retrieval.k,
            top_k: cfg.retrieval.top_k.max(1) as usize,
            fallback_answer: cfg.chat.fallback_answer.clone(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// A generated answer together with what it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub context: String,
    pub results: Vec<RetrievalResult>,
}

pub struct Pipeline {
    embedder: Box<dyn Embedder>,
    store: Box<dyn VectorStore>,
    chat: Box<dyn ChatModel>,
    settings: PipelineSettings,
}

/// Open the persisted store described by `cfg`.
///
/// Fails with a configuration error if nothing has been indexed yet.
pub async fn open_store(cfg: &Config) -> Result<SqliteStore> {
    let metric = Metric::parse(&cfg.retrieval.metric)?;
    SqliteStore::open(&cfg.store.dir, metric).await
}

/// Fail if `store` was indexed with a different embedding model than
/// `embedder`. Vectors from two models are not comparable even when their
/// dimensionality matches.
pub async fn check_embedding_model(store: &dyn VectorStore, embedder: &dyn Embedder) -> Result<()> {
    match store.info().await?.model {
        Some(indexed) if indexed != embedder.model_name() => Err(RagError::config(format!(
            "store was indexed with embedding model '{}' but embedding.model is '{}'; run `gqa index` again",
            indexed,
            embedder.model_name()
        ))),
        _ => Ok(()),
    }
}

impl Pipeline {
    pub fn new(
        embedder: Box<dyn Embedder>,
        store: Box<dyn VectorStore>,
        chat: Box<dyn ChatModel>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            embedder,
            store,
            chat,
            settings,
        }
    }

    /// Build the HTTP clients and open the store from configuration.
    pub async fn open(cfg: &Config) -> Result<Self> {
        let embedder = OpenAiEmbedder::from_config(&cfg.embedding)?;
        let chat = OpenAiChat::from_config(&cfg.chat)?;
        let store = open_store(cfg).await?;
        check_embedding_model(&store, &embedder).await?;

        Ok(Self::new(
            Box::new(embedder),
            Box::new(store),
            Box::new(chat),
            PipelineSettings::from_config(cfg),
        ))
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn store(&self) -> &dyn VectorStore {
        self.store.as_ref()
    }

    /// Retrieve up to `k` chunks for `query` without generating.
    pub async fn search(&self, query: &str, k: i64) -> Result<Vec<RetrievalResult>> {
        retrieve::retrieve(self.embedder.as_ref(), self.store.as_ref(), query, k).await
    }

    /// Retrieve and assemble the context block for `query`.
    pub async fn context(&self, query: &str, k: i64, top_k: usize) -> Result<(String, Vec<RetrievalResult>)> {
        let results = self.search(query, k).await?;
        let ctx = context::assemble(results.clone(), top_k);
        Ok((ctx, results))
    }

    /// Answer `question` from the indexed corpus.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let (ctx, results) = self
            .context(question, self.settings.k, self.settings.top_k)
            .await?;

        let text = generate::generate(
            self.chat.as_ref(),
            question,
            &ctx,
            &self.settings.fallback_answer,
        )
        .await?;

        info!(
            retrieved = results.len(),
            model = self.chat.model_name(),
            "answered question"
        );

        Ok(Answer {
            text,
            context: ctx,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::ChatMessage;
    use crate::models::{Chunk, IndexedChunk};
    use crate::store::memory::InMemoryStore;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct KeywordEmbedder;

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        fn model_name(&self) -> &str {
            "keyword"
        }
        fn dims(&self) -> Option<usize> {
            Some(2)
        }
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let t = text.to_lowercase();
            Ok(vec![
                if t.contains("start") { 1.0 } else { 0.0 },
                if t.contains("python") { 1.0 } else { 0.1 },
            ])
        }
    }

    /// Echoes the system prompt back so tests can inspect it.
    struct EchoChat {
        prompts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ChatModel for EchoChat {
        fn model_name(&self) -> &str {
            "echo"
        }
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.prompts.lock().unwrap().push(messages[0].content.clone());
            Ok(format!("answer to: {}", messages[1].content))
        }
    }

    async fn pipeline(settings: PipelineSettings) -> (Pipeline, Arc<Mutex<Vec<String>>>) {
        let store = InMemoryStore::default();
        let chunk = |id: &str, text: &str| Chunk {
            id: id.to_string(),
            source: "cv.txt".to_string(),
            title: Some("cv.txt".to_string()),
            page: None,
            start_index: 0,
            text: text.to_string(),
            hash: String::new(),
        };
        store
            .replace_all(
                &[
                    IndexedChunk {
                        chunk: chunk("avail", "Yahya can start the internship in June 2025."),
                        embedding: vec![1.0, 0.1],
                    },
                    IndexedChunk {
                        chunk: chunk("skills", "Yahya writes Python."),
                        embedding: vec![0.0, 1.0],
                    },
                ],
                "keyword",
            )
            .await
            .unwrap();

        let prompts = Arc::new(Mutex::new(Vec::new()));
        let p = Pipeline::new(
            Box::new(KeywordEmbedder),
            Box::new(store),
            Box::new(EchoChat {
                prompts: prompts.clone(),
            }),
            settings,
        );
        (p, prompts)
    }

    #[tokio::test]
    async fn test_answer_grounds_prompt_in_context() {
        let settings = PipelineSettings {
            k: 2,
            top_k: 1,
            fallback_answer: "I don't know.".to_string(),
        };
        let (p, prompts) = pipeline(settings).await;
        let answer = p.answer("When can Yahya start?").await.unwrap();

        assert_eq!(answer.text, "answer to: When can Yahya start?");
        assert_eq!(answer.results.len(), 2);
        assert!(answer.context.contains("June 2025"));
        assert!(!answer.context.contains("Python"));

        let prompt = &prompts.lock().unwrap()[0];
        assert!(prompt.contains("June 2025"));
        assert!(prompt.contains("I don't know."));
    }

    #[tokio::test]
    async fn test_store_indexed_with_other_model_is_rejected() {
        let store = InMemoryStore::default();
        store
            .replace_all(
                &[IndexedChunk {
                    chunk: Chunk {
                        id: "a".to_string(),
                        source: "cv.txt".to_string(),
                        title: None,
                        page: None,
                        start_index: 0,
                        text: "start".to_string(),
                        hash: String::new(),
                    },
                    embedding: vec![1.0, 0.0],
                }],
                "some-other-model",
            )
            .await
            .unwrap();

        let err = check_embedding_model(&store, &KeywordEmbedder)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
        let msg = err.to_string();
        assert!(msg.contains("some-other-model"), "{}", msg);
        assert!(msg.contains("keyword"), "{}", msg);
    }

    #[tokio::test]
    async fn test_store_with_matching_or_no_model_is_accepted() {
        let (p, _) = pipeline(PipelineSettings::default()).await;
        check_embedding_model(p.store(), &KeywordEmbedder).await.unwrap();
        check_embedding_model(&InMemoryStore::default(), &KeywordEmbedder)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_k_fails_before_generation() {
        let settings = PipelineSettings {
            k: 0,
            ..PipelineSettings::default()
        };
        let (p, prompts) = pipeline(settings).await;
        let err = p.answer("anything").await.unwrap_err();
        assert!(matches!(err, RagError::InvalidArgument(_)));
        assert!(prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_without_index_is_config_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.store.dir = tmp.path().join("missing");
        let err = open_store(&cfg).await.err().unwrap();
        assert!(matches!(err, RagError::Config(_)));
    }
}
