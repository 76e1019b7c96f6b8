//! Trait abstractions for embedding generation
//!
//! `EmbeddingProvider` is the raw backend capability; `EmbeddingService`
//! wraps it with batching and readiness/stat tracking, allowing different
//! providers (remote HTTP endpoints today, others later) to be used
//! interchangeably behind one seam.

use crate::EmbeddingResult;
use async_trait::async_trait;

/// Trait for embedding generation providers
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for a batch of texts, one output per input.
    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// Dimensionality of embeddings produced by this provider.
    fn embedding_dimension(&self) -> usize;

    /// Name/identifier of the embedding model in use.
    fn model_name(&self) -> &str;

    /// Probe the backend to confirm it is reachable and ready to serve.
    async fn ensure_ready(&self) -> EmbeddingResult<()>;
}

/// Service for managing embedding generation: batching, stats, provider access.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Generate embeddings for a batch of texts using zero-copy string references.
    async fn generate_embeddings(&self, texts: Vec<&str>) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let mut embeddings = self.generate_embeddings(vec![text]).await?;
        Ok(embeddings.remove(0))
    }

    /// The embedding provider backing this service.
    fn provider(&self) -> &dyn EmbeddingProvider;

    /// Service statistics accumulated since construction.
    async fn get_stats(&self) -> EmbeddingStats;
}

/// Statistics about embedding generation
#[derive(Debug, Clone, Default)]
pub struct EmbeddingStats {
    pub total_embeddings: usize,
    pub total_batches: usize,
    pub avg_batch_time_ms: f64,
    pub model_name: String,
    pub embedding_dimension: usize,
}
