//! Hybrid (dense + sparse) retrieval with Reciprocal Rank Fusion.
//!
//! Issues the query to the sparse index and the vector store in parallel via
//! `tokio::join!`, matching this stack's general preference for structured
//! concurrency over manual thread spawning. Sparse lookup is CPU-bound and
//! synchronous, so it's dispatched through `spawn_blocking`.

use std::sync::Arc;

use docurag_embeddings::EmbeddingService;
use docurag_vector_store::{Chunk, ScoredChunk, VectorStore};

use crate::reranker::{Reranker, apply_reranking};
use crate::sparse::{SparseIndex, SparseMatch};
use crate::{RetrievalError, RetrievalResult};

#[derive(Debug, Clone, Copy)]
pub struct HybridConfig {
    pub k: usize,
    pub rrf_k: u32,
    pub hybrid_enabled: bool,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            k: 10,
            rrf_k: 60,
            hybrid_enabled: true,
        }
    }
}

pub struct HybridRetriever {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingService>,
    sparse: Arc<SparseIndex>,
    reranker: Option<Arc<dyn Reranker>>,
    config: HybridConfig,
}

impl HybridRetriever {
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingService>,
        sparse: Arc<SparseIndex>,
        reranker: Option<Arc<dyn Reranker>>,
        config: HybridConfig,
    ) -> Self {
        Self {
            vector_store,
            embedder,
            sparse,
            reranker,
            config,
        }
    }

    /// Rebuild the sparse index from a full corpus snapshot. Call after
    /// ingestion or deletion completes.
    pub async fn refresh_sparse_index(&self) -> RetrievalResult<()> {
        let chunks = self.vector_store.list_all_chunks().await?;
        self.sparse.refresh(chunks);
        Ok(())
    }

    /// Retrieve, fuse, and (if configured) rerank candidates for `query`.
    pub async fn retrieve(&self, query: &str) -> RetrievalResult<Vec<ScoredChunk>> {
        let embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|_| RetrievalError::EmbeddingFailed {
                query: query.to_string(),
            })?;

        let k = self.config.k;
        let use_sparse = self.config.hybrid_enabled && self.sparse.is_initialized();

        let fused = if use_sparse {
            let sparse = Arc::clone(&self.sparse);
            let query_owned = query.to_string();
            let sparse_fut =
                tokio::task::spawn_blocking(move || sparse.retrieve(&query_owned, k));
            let dense_fut = self.vector_store.query(&embedding, k);

            let (sparse_result, dense_result) = tokio::join!(sparse_fut, dense_fut);
            let sparse_matches = sparse_result.unwrap_or_default();
            let dense_matches = dense_result?;

            if sparse_matches.is_empty() {
                dense_matches
            } else {
                reciprocal_rank_fusion(dense_matches, sparse_matches, self.config.rrf_k, k)
            }
        } else {
            self.vector_store.query(&embedding, k).await?
        };

        apply_reranking(
            self.reranker.as_deref(),
            query,
            fused,
            k,
            |sc: &ScoredChunk| sc.chunk.text.as_str(),
        )
        .await
    }
}

fn reciprocal_rank_fusion(
    dense: Vec<ScoredChunk>,
    sparse: Vec<SparseMatch>,
    rrf_k: u32,
    k: usize,
) -> Vec<ScoredChunk> {
    use std::collections::HashMap;

    struct Fused {
        chunk: Chunk,
        dense_similarity: f32,
        score: f32,
    }

    let mut fused: HashMap<String, Fused> = HashMap::new();

    for (rank, m) in dense.into_iter().enumerate() {
        let contribution = 1.0 / (rrf_k as f32 + rank as f32 + 1.0);
        let entry = fused.entry(m.chunk.chunk_id.clone()).or_insert(Fused {
            chunk: m.chunk.clone(),
            dense_similarity: m.similarity,
            score: 0.0,
        });
        entry.dense_similarity = m.similarity;
        entry.score += contribution;
    }

    for (rank, m) in sparse.into_iter().enumerate() {
        let contribution = 1.0 / (rrf_k as f32 + rank as f32 + 1.0);
        fused
            .entry(m.chunk.chunk_id.clone())
            .and_modify(|f| f.score += contribution)
            .or_insert(Fused {
                chunk: m.chunk,
                dense_similarity: 0.0,
                score: contribution,
            });
    }

    let mut combined: Vec<Fused> = fused.into_values().collect();
    combined.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.dense_similarity
                    .partial_cmp(&a.dense_similarity)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.chunk.chunk_id.cmp(&b.chunk.chunk_id))
    });
    combined.truncate(k);

    combined
        .into_iter()
        .map(|f| ScoredChunk {
            chunk: f.chunk,
            similarity: f.score,
        })
        .collect()
}
