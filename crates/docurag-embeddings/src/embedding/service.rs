//! Default `EmbeddingService` implementation: batching + stats over a provider

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use docurag_config::EmbeddingConfig;
use tokio::sync::RwLock;

use super::http::HttpEmbeddingProvider;
use super::traits::{EmbeddingProvider, EmbeddingService, EmbeddingStats};
use crate::EmbeddingResult;

const DEFAULT_BATCH_SIZE: usize = 32;

/// Batches requests to a provider and tracks running statistics.
pub struct DefaultEmbeddingService {
    provider: Arc<dyn EmbeddingProvider>,
    stats: Arc<RwLock<EmbeddingStats>>,
    batch_size: usize,
}

impl DefaultEmbeddingService {
    /// Build a service backed by the configured remote embedding endpoint.
    pub fn new(config: &EmbeddingConfig) -> Self {
        let provider = Arc::new(HttpEmbeddingProvider::new(config));
        Self::with_provider(provider, DEFAULT_BATCH_SIZE)
    }

    /// Build a service around an arbitrary provider (used by tests).
    pub fn with_provider(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        let stats = Arc::new(RwLock::new(EmbeddingStats {
            model_name: provider.model_name().to_string(),
            embedding_dimension: provider.embedding_dimension(),
            ..Default::default()
        }));

        Self {
            provider,
            stats,
            batch_size,
        }
    }
}

#[async_trait]
impl EmbeddingService for DefaultEmbeddingService {
    async fn generate_embeddings(&self, texts: Vec<&str>) -> EmbeddingResult<Vec<Vec<f32>>> {
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let start = Instant::now();

            let embeddings = self.provider.embed_batch(batch).await?;
            all_embeddings.extend(embeddings);

            let elapsed_ms = start.elapsed().as_millis() as f64;
            let mut stats = self.stats.write().await;
            stats.total_embeddings += batch.len();
            stats.total_batches += 1;
            let prev_avg = stats.avg_batch_time_ms;
            let count = stats.total_batches as f64;
            stats.avg_batch_time_ms = (prev_avg * (count - 1.0) + elapsed_ms) / count;
        }

        Ok(all_embeddings)
    }

    fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    async fn get_stats(&self) -> EmbeddingStats {
        self.stats.read().await.clone()
    }
}

#[cfg(test)]
pub struct MockEmbeddingProvider {
    dimension: usize,
    fail: bool,
}

#[cfg(test)]
impl MockEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail: false,
        }
    }

    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[cfg(test)]
#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if self.fail {
            return Err(crate::EmbeddingError::Request("mock failure".into()));
        }
        Ok(texts.iter().map(|_| vec![0.1; self.dimension]).collect())
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embedding-model"
    }

    async fn ensure_ready(&self) -> EmbeddingResult<()> {
        if self.fail {
            Err(crate::EmbeddingError::Unavailable("mock unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn batches_requests_by_batch_size() {
        let provider = Arc::new(MockEmbeddingProvider::new(768));
        let service = DefaultEmbeddingService::with_provider(provider, 2);

        let texts = vec!["text1", "text2", "text3", "text4", "text5"];
        let embeddings = service.generate_embeddings(texts).await.unwrap();

        assert_eq!(embeddings.len(), 5);
        assert_eq!(embeddings[0].len(), 768);

        let stats = service.get_stats().await;
        assert_eq!(stats.total_embeddings, 5);
        assert_eq!(stats.total_batches, 3);
    }

    #[tokio::test]
    async fn propagates_provider_failure() {
        let provider = Arc::new(MockEmbeddingProvider::new(768).with_failure());
        let service = DefaultEmbeddingService::with_provider(provider, 2);

        let result = service.generate_embeddings(vec!["text1"]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn embed_single_delegates_to_batch() {
        let provider = Arc::new(MockEmbeddingProvider::new(4));
        let service = DefaultEmbeddingService::with_provider(provider, 8);

        let embedding = service.embed("hello").await.unwrap();
        assert_eq!(embedding.len(), 4);
    }
}
