//! Application state for Axum handlers
//!
//! Contains every shared service constructed once at startup by
//! [`crate::bootstrap::initialize_app_state`] and injected into each
//! handler via `State<AppState>`, so no handler reconstructs a connection
//! pool or client per request.

use std::sync::Arc;

use docurag_config::ApplicationConfig;
use docurag_embeddings::EmbeddingService;
use docurag_llm::LlmGateway;
use docurag_meta_data::MetaDataRepository;
use docurag_query::QueryEngine;
use docurag_retrieval::HybridRetriever;
use docurag_state::{ChatMemoryStore, ProgressStore};
use docurag_vector_store::VectorStore;

/// Shared services behind the HTTP surface.
#[derive(Clone)]
pub struct AppState {
    /// Durable document/batch/task bookkeeping
    pub repository: Arc<dyn MetaDataRepository>,
    /// Vector store backing retrieval and ingestion
    pub vector_store: Arc<dyn VectorStore>,
    /// Embedding service shared by ingestion and retrieval
    pub embedding_service: Arc<dyn EmbeddingService>,
    /// LLM gateway: generation, condensing, reranking
    pub llm: Arc<LlmGateway>,
    /// Hybrid (dense + sparse) retriever
    pub retriever: Arc<HybridRetriever>,
    /// Process-local batch/task progress cache
    pub progress: Arc<ProgressStore>,
    /// Process-local per-session chat memory
    pub memory: Arc<ChatMemoryStore>,
    /// The chat loop itself
    pub query_engine: Arc<QueryEngine>,
    /// Resolved application configuration
    pub config: Arc<ApplicationConfig>,
}
