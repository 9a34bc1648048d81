//! # docqa
//!
//! Chat with a PDF, plus a tiny long-running request demo service.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────┐   ┌──────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Loader │──▶│ Splitter │──▶│ Embed+Index  │──▶│ RetrievalQa  │
//! │  PDF   │   │ 1000/150 │   │ cosine top-K │   │ prompt + LLM │
//! └────────┘   └──────────┘   └──────────────┘   └──────┬───────┘
//!                                                       │
//!                                   ┌───────────────────┤
//!                                   ▼                   ▼
//!                              ┌─────────┐       ┌────────────┐
//!                              │ CLI REPL│       │ Chat HTTP  │
//!                              └─────────┘       └────────────┘
//!
//! ┌──────────────────────────────┐
//! │ Demo service: / and          │   (independent process)
//! │ /long-process (70 s sleep)   │
//! └──────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! docqa chat report.pdf                    # interactive
//! docqa ask report.pdf "What is the budget?"
//! docqa serve chat                         # JSON API on 127.0.0.1:8501
//! docqa serve demo                         # demo service on 127.0.0.1:8000
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and credential lookup |
//! | [`models`] | Core data types |
//! | [`loader`] | PDF page extraction |
//! | [`splitter`] | Fixed-width overlapping chunking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | In-memory vector index |
//! | [`llm`] | Chat completion client |
//! | [`qa`] | Retrieval-augmented answering |
//! | [`session`] | Per-conversation state machine |
//! | [`chat`] | Terminal REPL and one-shot ask |
//! | [`server`] | Chat HTTP server |
//! | [`demo`] | Long-running request demo service |

pub mod chat;
pub mod config;
pub mod demo;
pub mod embedding;
pub mod error;
pub mod index;
pub mod llm;
pub mod loader;
pub mod logging;
pub mod models;
pub mod qa;
pub mod server;
pub mod session;
pub mod splitter;
