//! Common test utilities for API tests

use std::sync::Arc;

use async_trait::async_trait;
use docurag_embeddings::{DefaultEmbeddingService, EmbeddingProvider, EmbeddingResult};
use docurag_llm::LlmGateway;
use docurag_meta_data::MockMetaDataRepository;
use docurag_query::QueryEngine;
use docurag_retrieval::{HybridConfig, HybridRetriever, SparseIndex};
use docurag_state::{ChatMemoryStore, ProgressStore};
use docurag_vector_store::MockVectorStore;

use crate::state::AppState;

/// Standard test result type for all test functions
pub type TestResult = Result<(), Box<dyn std::error::Error>>;

struct FixedProvider;

#[async_trait]
impl EmbeddingProvider for FixedProvider {
    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.1, 0.2, 0.3]).collect())
    }

    fn embedding_dimension(&self) -> usize {
        3
    }

    fn model_name(&self) -> &str {
        "fixed-test-model"
    }

    async fn ensure_ready(&self) -> EmbeddingResult<()> {
        Ok(())
    }
}

/// Build an `AppState` wired entirely to in-memory mocks, for route tests
/// that don't need a live database/vector store/LLM endpoint.
pub fn test_state() -> AppState {
    let repository = Arc::new(MockMetaDataRepository::new());
    let vector_store = Arc::new(MockVectorStore::new());
    let embedding_service = Arc::new(DefaultEmbeddingService::with_provider(Arc::new(FixedProvider), 8));
    let sparse = Arc::new(SparseIndex::empty());
    let retriever = Arc::new(HybridRetriever::new(
        vector_store.clone(),
        embedding_service.clone(),
        sparse,
        None,
        HybridConfig::default(),
    ));
    let llm = Arc::new(
        LlmGateway::new(&docurag_config::LlmConfig {
            provider: "local".to_string(),
            model: "test-model".to_string(),
            base_url: Some("http://127.0.0.1:1".to_string()),
            timeout_seconds: 1,
            api_key: None,
        })
        .expect("local provider always constructs"),
    );
    let memory = Arc::new(ChatMemoryStore::new().expect("chat memory store"));
    let query_engine = Arc::new(QueryEngine::new(
        repository.clone(),
        retriever.clone(),
        llm.clone(),
        memory.clone(),
        "/tmp/docurag-test-storage".to_string(),
    ));

    AppState {
        repository,
        vector_store,
        embedding_service,
        llm,
        retriever,
        progress: Arc::new(ProgressStore::new()),
        memory,
        query_engine,
        config: Arc::new(docurag_config::ApplicationConfig::default()),
    }
}
