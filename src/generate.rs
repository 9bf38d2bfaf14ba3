//! Answer generation against an OpenAI-compatible chat completions API.
//!
//! The prompt is two messages: a system message carrying the answering
//! rules plus the assembled context, and a user message carrying the raw
//! question. The model's reply is returned verbatim.
//!
//! When the context does not contain the answer the prompt asks the model to
//! reply with a fixed fallback sentence. This is best effort; nothing checks
//! that the model complied.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::ChatConfig;
use crate::error::{RagError, Result};

const SERVICE: &str = "chat";

/// Reply requested from the model when the context lacks the answer.
pub const DEFAULT_FALLBACK_ANSWER: &str =
    "Based on the available information, I cannot answer this question.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A chat completion model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Send `messages` and return the assistant's reply text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Chat client for `POST {base_url}/chat/completions`.
///
/// One request per call. Non-2xx statuses surface as [`RagError::Api`].
pub struct OpenAiChat {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    reasoning: bool,
}

impl OpenAiChat {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RagError::config("chat API key must not be empty"));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model: model.into(),
            reasoning: true,
        })
    }

    pub fn from_config(config: &ChatConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            RagError::config(format!(
                "{} environment variable not set (chat API key)",
                config.api_key_env
            ))
        })?;

        Ok(Self::new(
            &config.base_url,
            api_key,
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )?
        .with_reasoning(config.reasoning))
    }

    /// Toggle the provider's reasoning mode (`"reasoning": {"enabled": ..}`).
    pub fn with_reasoning(mut self, enabled: bool) -> Self {
        self.reasoning = enabled;
        self
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
            reasoning: Reasoning {
                enabled: self.reasoning,
            },
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

        let content = parse_completion_response(&text)?;
        debug!(model = %self.model, chars = content.len(), "chat completion received");
        Ok(content)
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    reasoning: Reasoning,
}

#[derive(Serialize)]
struct Reasoning {
    enabled: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

fn parse_completion_response(body: &str) -> Result<String> {
    let parsed: CompletionResponse =
        serde_json::from_str(body).map_err(|e| RagError::malformed(SERVICE, e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| RagError::malformed(SERVICE, "no choices in response"))?
        .message
        .content
        .ok_or_else(|| RagError::malformed(SERVICE, "choice has no message content"))
}

/// Build the system + user message pair for one question.
pub fn build_messages(question: &str, context: &str, fallback: &str) -> Vec<ChatMessage> {
    let system = format!(
        "You are a professional assistant who answers questions using only the information in the provided context.\n\
         Important:\n\
         - Never use generic phrases such as \"According to the excerpts you shared\".\n\
         - If the answer is not in the context, reply politely and professionally with exactly: \"{}\"\n\
         - Give the answer directly and clearly.\n\
         Context:\n\n{}",
        fallback, context
    );

    vec![ChatMessage::system(system), ChatMessage::user(question)]
}

/// Ask `chat` to answer `question` from `context`.
///
/// Errors from the chat model propagate unchanged.
pub async fn generate(
    chat: &dyn ChatModel,
    question: &str,
    context: &str,
    fallback: &str,
) -> Result<String> {
    let messages = build_messages(question, context, fallback);
    chat.complete(&messages).await
}
