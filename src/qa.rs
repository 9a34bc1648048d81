//! Retrieval-augmented question answering.
//!
//! [`RetrievalQa`] owns a built [`VectorIndex`] and the two providers. For
//! each question it embeds the question with the same embedder that built
//! the index, takes the top-K chunks, "stuffs" them into a grounding prompt
//! and asks the chat model at a fixed temperature.
//!
//! ```text
//! question ──embed──▶ top-K chunks ──▶ system: instructions + context
//!                                      user:   question
//!                                          │
//!                                          ▼
//!                                  chat model ──▶ Answer { answer, sources }
//! ```

use std::sync::Arc;

use crate::config::Config;
use crate::embedding::{create_provider, embed_query, EmbeddingProvider};
use crate::error::{DocqaError, Result};
use crate::index::{ScoredChunk, VectorIndex};
use crate::llm::{ChatMessage, ChatModel, OpenAIChat};
use crate::models::{Answer, Page, SourceChunk};
use crate::splitter::{split_pages, SplitterConfig};

const SYSTEM_PROMPT: &str = "Use the following pieces of context to answer the user's question. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";
const CONTEXT_SEPARATOR: &str = "----------------";

/// Tunables for building and querying a chain.
#[derive(Debug, Clone)]
pub struct QaSettings {
    pub splitter: SplitterConfig,
    pub batch_size: usize,
    pub k: usize,
    pub temperature: f32,
}

impl Default for QaSettings {
    fn default() -> Self {
        Self {
            splitter: SplitterConfig::default(),
            batch_size: 64,
            k: 5,
            temperature: 0.0,
        }
    }
}

impl From<&Config> for QaSettings {
    fn from(config: &Config) -> Self {
        Self {
            splitter: SplitterConfig::from(&config.chunking),
            batch_size: config.embedding.batch_size,
            k: config.retrieval.k,
            temperature: config.llm.temperature,
        }
    }
}

/// The embedding and chat backends a chain talks to.
#[derive(Clone)]
pub struct Providers {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub chat: Arc<dyn ChatModel>,
}

impl Providers {
    /// Build the configured providers. The chat model is always OpenAI, so
    /// the key is required even when embeddings are computed locally.
    pub fn from_config(config: &Config, api_key: &str) -> Result<Self> {
        let embedder = create_provider(&config.embedding, &config.openai.base_url, Some(api_key))?;
        let chat = OpenAIChat::new(&config.llm, &config.openai.base_url, api_key.to_string())?;
        Ok(Self {
            embedder: Arc::from(embedder),
            chat: Arc::new(chat),
        })
    }
}

pub struct RetrievalQa {
    index: VectorIndex,
    providers: Providers,
    k: usize,
    temperature: f32,
}

impl RetrievalQa {
    /// Split `pages`, embed the chunks and wrap the resulting index.
    pub async fn build(pages: &[Page], providers: Providers, settings: &QaSettings) -> Result<Self> {
        let chunks = split_pages(pages, &settings.splitter);
        if chunks.is_empty() {
            return Err(DocqaError::Ingestion(
                "the PDF contains no extractable text".to_string(),
            ));
        }
        tracing::info!(pages = pages.len(), chunks = chunks.len(), "indexing document");

        let index =
            VectorIndex::build(chunks, providers.embedder.as_ref(), settings.batch_size).await?;

        Ok(Self::from_index(index, providers, settings))
    }

    pub fn from_index(index: VectorIndex, providers: Providers, settings: &QaSettings) -> Self {
        Self {
            index,
            providers,
            k: settings.k,
            temperature: settings.temperature,
        }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Top-K chunks for `question`, without calling the chat model.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<ScoredChunk>> {
        let query_vec = embed_query(self.providers.embedder.as_ref(), question).await?;
        if query_vec.len() != self.index.dims() {
            return Err(DocqaError::Provider(format!(
                "query embedding has {} dimensions, index was built with {}",
                query_vec.len(),
                self.index.dims()
            )));
        }
        Ok(self.index.search(&query_vec, self.k))
    }

    /// Answer `question` from the indexed document.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(DocqaError::InvalidInput(
                "question must not be empty".to_string(),
            ));
        }

        let hits = self.retrieve(question).await?;
        tracing::info!(
            question_len = question.len(),
            k = self.k,
            hits = hits.len(),
            top_score = hits.first().map(|h| h.score),
            "retrieved context"
        );

        let messages = build_prompt(question, &hits);
        let answer = self
            .providers
            .chat
            .complete(&messages, self.temperature)
            .await?;

        Ok(Answer {
            answer,
            sources: hits
                .into_iter()
                .map(|h| SourceChunk {
                    index: h.chunk.index,
                    page: h.chunk.page,
                    source: h.chunk.source,
                    text: h.chunk.text,
                    score: h.score,
                })
                .collect(),
        })
    }
}

/// Build the grounding prompt: instructions plus retrieved context as the
/// system message, the question as the user message.
pub fn build_prompt(question: &str, hits: &[ScoredChunk]) -> Vec<ChatMessage> {
    let context = hits
        .iter()
        .map(|h| h.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    vec![
        ChatMessage::system(format!(
            "{}\n{}\n{}",
            SYSTEM_PROMPT, CONTEXT_SEPARATOR, context
        )),
        ChatMessage::user(question),
    ]
}
