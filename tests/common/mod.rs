//! Shared fakes for the integration tests.
//!
//! `HashEmbedder` and `RuleChat` stand in for the remote models inside the
//! library. `FakeApi` serves the same behaviour over HTTP with the
//! OpenAI-compatible routes the real clients call.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use grounded_qa::embedding::Embedder;
use grounded_qa::generate::{ChatMessage, ChatModel, DEFAULT_FALLBACK_ANSWER};

pub const DIMS: usize = 256;

/// Bag-of-words embedding: each lower-cased word bumps one FNV-1a bucket.
pub fn hash_embed(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; DIMS];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut h: u64 = 0xcbf29ce484222325;
        for b in word.to_lowercase().bytes() {
            h ^= b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        v[(h % DIMS as u64) as usize] += 1.0;
    }
    v
}

/// Answers start-date questions when the context carries the date,
/// otherwise returns the fallback sentence.
pub fn rule_answer(question: &str, system_prompt: &str) -> String {
    if question.to_lowercase().contains("start") && system_prompt.contains("June 2025") {
        "Yahya can start his internship in June 2025.".to_string()
    } else {
        DEFAULT_FALLBACK_ANSWER.to_string()
    }
}

/// Minimal valid PDF with one page per entry of `pages`, each showing its
/// text in Helvetica. The xref carries real byte offsets so pdf-extract can
/// parse it. Text must not contain parentheses or backslashes.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let n = pages.len();
    let font_obj = 3 + 2 * n;
    let mut offsets = Vec::new();
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    offsets.push(out.len());
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");

    let kids: Vec<String> = (0..n).map(|i| format!("{} 0 R", 3 + 2 * i)).collect();
    offsets.push(out.len());
    out.extend_from_slice(
        format!(
            "2 0 obj << /Type /Pages /Kids [{}] /Count {} >> endobj\n",
            kids.join(" "),
            n
        )
        .as_bytes(),
    );

    for (i, text) in pages.iter().enumerate() {
        let page_obj = 3 + 2 * i;
        let content_obj = page_obj + 1;
        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "{} 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents {} 0 R /Resources << /Font << /F1 {} 0 R >> >> >> endobj\n",
                page_obj, content_obj, font_obj
            )
            .as_bytes(),
        );

        let stream = format!("BT /F1 12 Tf 72 700 Td ({}) Tj ET", text);
        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "{} 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
                content_obj,
                stream.len(),
                stream
            )
            .as_bytes(),
        );
    }

    offsets.push(out.len());
    out.extend_from_slice(
        format!(
            "{} 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
            font_obj
        )
        .as_bytes(),
    );

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", offsets.len() + 1).as_bytes());
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in &offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer << /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            offsets.len() + 1,
            xref_start
        )
        .as_bytes(),
    );
    out
}

pub struct HashEmbedder;

#[async_trait]
impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        "hash-bow"
    }

    fn dims(&self) -> Option<usize> {
        Some(DIMS)
    }

    async fn embed(&self, text: &str) -> grounded_qa::Result<Vec<f32>> {
        Ok(hash_embed(text))
    }
}

/// Chat model that applies [`rule_answer`] and records every prompt.
#[derive(Default, Clone)]
pub struct RuleChat {
    pub prompts: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

#[async_trait]
impl ChatModel for RuleChat {
    fn model_name(&self) -> &str {
        "rule"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> grounded_qa::Result<String> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        Ok(rule_answer(&messages[1].content, &messages[0].content))
    }
}

// ── Fake HTTP API ───────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeApi {
    pub embedding_hits: AtomicUsize,
    pub chat_hits: AtomicUsize,
    pub last_chat_body: Mutex<Option<Value>>,
    pub last_auth: Mutex<Option<String>>,
    /// When set, every route answers with this status and an error body.
    pub fail_status: Mutex<Option<u16>>,
    /// When set, embeddings are returned in reverse order.
    pub reverse_embeddings: Mutex<bool>,
}

impl FakeApi {
    pub fn embedding_hits(&self) -> usize {
        self.embedding_hits.load(Ordering::SeqCst)
    }

    pub fn chat_hits(&self) -> usize {
        self.chat_hits.load(Ordering::SeqCst)
    }
}

pub fn fake_api_router(state: Arc<FakeApi>) -> Router {
    Router::new()
        .route("/v1/embeddings", post(embeddings))
        .route("/v1/chat/completions", post(chat_completions))
        .route("/garbled/v1/embeddings", post(garbled))
        .route("/garbled/v1/chat/completions", post(garbled))
        .with_state(state)
}

async fn embeddings(
    State(state): State<Arc<FakeApi>>,
    headers: axum::http::HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.embedding_hits.fetch_add(1, Ordering::SeqCst);
    *state.last_auth.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if let Some(status) = *state.fail_status.lock().unwrap() {
        return failure(status);
    }

    let inputs: Vec<String> = body["input"]
        .as_array()
        .map(|a| {
            a.iter()
                .map(|v| v.as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default();

    let mut data: Vec<Value> = inputs
        .iter()
        .enumerate()
        .map(|(i, text)| json!({ "object": "embedding", "index": i, "embedding": hash_embed(text) }))
        .collect();
    if *state.reverse_embeddings.lock().unwrap() {
        data.reverse();
    }

    let model = body["model"].clone();
    (
        StatusCode::OK,
        Json(json!({ "object": "list", "model": model, "data": data })),
    )
}

async fn chat_completions(
    State(state): State<Arc<FakeApi>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.chat_hits.fetch_add(1, Ordering::SeqCst);
    *state.last_chat_body.lock().unwrap() = Some(body.clone());

    if let Some(status) = *state.fail_status.lock().unwrap() {
        return failure(status);
    }

    let system = body["messages"][0]["content"].as_str().unwrap_or_default();
    let question = body["messages"][1]["content"].as_str().unwrap_or_default();

    (
        StatusCode::OK,
        Json(json!({
            "id": "chatcmpl-fake",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": rule_answer(question, system) },
                "finish_reason": "stop"
            }]
        })),
    )
}

async fn garbled() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "unexpected": true })))
}

fn failure(status: u16) -> (StatusCode, Json<Value>) {
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(json!({ "error": { "message": "rate limited by fake" } })),
    )
}

/// Serve the fake API on an ephemeral port inside the current runtime.
///
/// Returns the server root (`http://127.0.0.1:<port>`).
pub async fn spawn_fake_api(state: Arc<FakeApi>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, fake_api_router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Serve the fake API from a background thread with its own runtime, for
/// tests that drive the `gqa` binary synchronously.
pub fn spawn_fake_api_thread(state: Arc<FakeApi>) -> String {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let root = spawn_fake_api(state).await;
            tx.send(root).unwrap();
            std::future::pending::<()>().await;
        });
    });
    rx.recv().unwrap()
}
