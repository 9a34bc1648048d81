//! Core data models.
//!
//! These types flow through the pipeline: [`Page`]s come out of the loader,
//! [`Chunk`]s out of the splitter, and a question produces an [`Answer`]
//! whose [`SourceChunk`]s point back at the retrieved text. [`Turn`]s make up
//! the conversation history held by a session.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Text extracted from one PDF page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub number: u32,
    pub text: String,
    /// Where the page came from (file name or path).
    pub source: String,
}

/// A bounded, possibly overlapping slice of page text; the unit of retrieval.
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    pub id: String,
    /// Position in the document, contiguous from 0.
    pub index: usize,
    pub page: u32,
    pub source: String,
    pub text: String,
    /// SHA-256 of `text`, hex encoded.
    pub hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the conversation history.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            at: Utc::now(),
        }
    }
}

/// A retrieved chunk as reported alongside an answer.
#[derive(Debug, Clone, Serialize)]
pub struct SourceChunk {
    pub index: usize,
    pub page: u32,
    pub source: String,
    pub text: String,
    /// Cosine similarity to the question.
    pub score: f32,
}

/// Generated answer plus the chunks it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceChunk>,
}

/// Summary of the document a session has indexed.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub filename: String,
    pub pages: usize,
    pub chunks: usize,
}
