//! In-memory vector index.
//!
//! Holds every chunk next to its embedding and answers top-K queries by
//! brute-force cosine similarity. The index is built once from a finished
//! chunk list and never mutated afterwards; there is no persistence.

use crate::embedding::{cosine_similarity, EmbeddingProvider};
use crate::error::{DocqaError, Result};
use crate::models::Chunk;

struct IndexedChunk {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// A chunk returned by [`VectorIndex::search`] with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

pub struct VectorIndex {
    entries: Vec<IndexedChunk>,
    dims: usize,
    model: String,
}

impl VectorIndex {
    /// Embed `chunks` in batches of `batch_size` and build the index.
    ///
    /// All-or-nothing: a failed batch, a short response or a vector whose
    /// width differs from `provider.dims()` aborts the build and nothing is
    /// returned.
    pub async fn build(
        chunks: Vec<Chunk>,
        provider: &dyn EmbeddingProvider,
        batch_size: usize,
    ) -> Result<Self> {
        let batch_size = batch_size.max(1);
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
        let total_batches = chunks.len().div_ceil(batch_size);

        for (n, batch) in chunks.chunks(batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embedded = provider.embed(&texts).await?;

            if embedded.len() != texts.len() {
                return Err(DocqaError::Provider(format!(
                    "provider returned {} vectors for {} chunks",
                    embedded.len(),
                    texts.len()
                )));
            }
            vectors.extend(embedded);
            tracing::debug!(batch = n + 1, total_batches, "embedded batch");
        }

        let dims = provider.dims();
        if let Some(bad) = vectors.iter().position(|v| v.len() != dims) {
            return Err(DocqaError::Provider(format!(
                "embedding {} has {} dimensions, {} declares {}",
                bad,
                vectors[bad].len(),
                provider.model_name(),
                dims
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexedChunk { chunk, vector })
            .collect::<Vec<_>>();

        tracing::info!(
            chunks = entries.len(),
            dims,
            model = provider.model_name(),
            "vector index built"
        );

        Ok(Self {
            entries,
            dims,
            model: provider.model_name().to_string(),
        })
    }

    /// The `k` chunks most similar to `query`, best first.
    ///
    /// Ties are broken by chunk index so results are stable across calls.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<(f32, &IndexedChunk)> = self
            .entries
            .iter()
            .map(|e| (cosine_similarity(query, &e.vector), e))
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.chunk.index.cmp(&b.1.chunk.index))
        });
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(score, e)| ScoredChunk {
                chunk: e.chunk.clone(),
                score,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashProvider;
    use crate::models::Page;
    use crate::splitter::{split_pages, SplitterConfig};
    use async_trait::async_trait;

    fn chunks_from(texts: &[&str]) -> Vec<Chunk> {
        let pages: Vec<Page> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Page {
                number: i as u32 + 1,
                text: t.to_string(),
                source: "mem".to_string(),
            })
            .collect();
        split_pages(&pages, &SplitterConfig::default())
    }

    struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        fn model_name(&self) -> &str {
            "failing"
        }
        fn dims(&self) -> usize {
            4
        }
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(DocqaError::Provider("quota exceeded".to_string()))
        }
    }

    struct RaggedProvider;

    #[async_trait]
    impl EmbeddingProvider for RaggedProvider {
        fn model_name(&self) -> &str {
            "ragged"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .enumerate()
                .map(|(i, _)| vec![1.0; i + 1])
                .collect())
        }
    }

    #[tokio::test]
    async fn test_build_and_search() {
        let provider = HashProvider::new(256);
        let chunks = chunks_from(&[
            "Rust ownership and borrowing rules",
            "Project Apollo budget is $50M",
            "Tomato gardening in spring",
        ]);
        let index = VectorIndex::build(chunks, &provider, 2).await.unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.dims(), 256);
        assert_eq!(index.model(), "feature-hash");

        let q = provider.embed_one("What is the Apollo budget?");
        let hits = index.search(&q, 1);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].chunk.text.contains("Apollo"));
    }

    #[tokio::test]
    async fn test_search_k_larger_than_index() {
        let provider = HashProvider::new(64);
        let index = VectorIndex::build(chunks_from(&["one", "two"]), &provider, 64)
            .await
            .unwrap();
        let q = provider.embed_one("one");
        assert_eq!(index.search(&q, 5).len(), 2);
    }

    #[tokio::test]
    async fn test_search_is_deterministic() {
        let provider = HashProvider::new(64);
        let index = VectorIndex::build(
            chunks_from(&["alpha beta", "beta gamma", "gamma delta", "delta alpha"]),
            &provider,
            3,
        )
        .await
        .unwrap();
        let q = provider.embed_one("beta");
        let a: Vec<usize> = index.search(&q, 3).iter().map(|s| s.chunk.index).collect();
        let b: Vec<usize> = index.search(&q, 3).iter().map(|s| s.chunk.index).collect();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_ties_break_by_index() {
        let provider = HashProvider::new(64);
        let index = VectorIndex::build(chunks_from(&["same", "same", "same"]), &provider, 64)
            .await
            .unwrap();
        let q = provider.embed_one("same");
        let order: Vec<usize> = index.search(&q, 3).iter().map(|s| s.chunk.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_provider_failure_yields_no_index() {
        let result = VectorIndex::build(chunks_from(&["a", "b"]), &FailingProvider, 1).await;
        assert!(matches!(result, Err(DocqaError::Provider(_))));
    }

    struct WideProvider;

    #[async_trait]
    impl EmbeddingProvider for WideProvider {
        fn model_name(&self) -> &str {
            "wide"
        }
        fn dims(&self) -> usize {
            4
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.5; 8]).collect())
        }
    }

    #[tokio::test]
    async fn test_width_must_match_declared_dims() {
        let result = VectorIndex::build(chunks_from(&["a", "b"]), &WideProvider, 8).await;
        match result {
            Err(DocqaError::Provider(msg)) => assert!(msg.contains("declares 4"), "{}", msg),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("index built from mismatched vectors"),
        }
    }

    #[tokio::test]
    async fn test_inconsistent_dims_rejected() {
        let result = VectorIndex::build(chunks_from(&["a", "b", "c"]), &RaggedProvider, 8).await;
        let err = result.err().unwrap();
        assert!(err.to_string().contains("dimensions"));
    }
}
