//! # grounded-qa
//!
//! Retrieval-augmented question answering over a local document folder.
//!
//! Plain-text and PDF files are split into overlapping character windows,
//! embedded through an OpenAI-compatible embeddings API, and persisted in a
//! local SQLite vector store. At query time the question is embedded, the
//! nearest chunks are ranked and rendered into a context block, and a chat
//! model is asked to answer from that context alone.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │ Data_sources│──▶│ Chunk+Embed │──▶│  SQLite  │
//! │  txt / pdf  │   │   (index)   │   │  vectors │
//! └─────────────┘   └─────────────┘   └────┬─────┘
//!                                          │
//!         ┌──────────┐   ┌──────────┐   ┌──▼───────┐
//!         │ generate │◀──│ context  │◀──│ retrieve │
//!         │  (chat)  │   │ assemble │   │  top k   │
//!         └──────────┘   └──────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! gqa index                                  # build the store from Data_sources/
//! gqa search "internship start date"         # inspect retrieval
//! gqa ask "When can Yahya start?"            # answer one question
//! gqa chat                                   # interactive shell
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`loader`] | Source directory scanning and parsing |
//! | [`extract`] | Plain-text and PDF text extraction |
//! | [`chunk`] | Sliding-window chunking |
//! | [`embedding`] | Embedding client and vector helpers |
//! | [`store`] | Vector store trait, SQLite and in-memory backends |
//! | [`index`] | Full-rebuild corpus indexing |
//! | [`retrieve`] | Nearest-neighbour retrieval |
//! | [`context`] | Final ranking and context rendering |
//! | [`generate`] | Chat client and prompt construction |
//! | [`pipeline`] | Retrieve → assemble → generate |
//! | [`conversation`] | Bounded chat history |

pub mod chat;
pub mod chunk;
pub mod config;
pub mod context;
pub mod conversation;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generate;
pub mod index;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod retrieve;
pub mod search;
pub mod stats;
pub mod store;

pub use error::{RagError, Result};
