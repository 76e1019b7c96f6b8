//! Fixed fail-fast startup sequence (4.N): load config (done by the
//! caller) → init embedding+LLM clients → instantiate the reranker if
//! enabled → probe the vector store for its current chunk count →
//! build the sparse index if hybrid search is enabled and the store is
//! non-empty → return a fully populated `AppState` plus the ingestion
//! worker that `main` spawns alongside the HTTP server.
//!
//! Sequential, dependency-ordered construction, grounded on the reference
//! architecture's `bootstrap.rs` (`setup_database`, `setup_vector_storage`,
//! `setup_embedding_service` with an `ensure_ready()` warm-up call).

use std::path::PathBuf;
use std::sync::Arc;

use docurag_config::ApplicationConfig;
use docurag_embeddings::{DefaultEmbeddingService, EmbeddingService};
use docurag_ingest::{IngestDeps, IngestionWorker, WorkerConfig};
use docurag_llm::LlmGateway;
use docurag_meta_data::{DataClient, MetaDataRepository};
use docurag_query::QueryEngine;
use docurag_retrieval::{HybridConfig, HybridRetriever, Reranker, SparseIndex};
use docurag_state::{ChatMemoryStore, ProgressStore};
use docurag_vector_store::{QdrantVectorStore, VectorStore};

use crate::state::AppState;

/// Connect to `PostgreSQL` and build the metadata repository.
async fn setup_database(config: &ApplicationConfig) -> anyhow::Result<Arc<dyn MetaDataRepository>> {
    let client = DataClient::initialize(&config.database).await?;
    Ok(Arc::new(client.repository().clone()))
}

/// Connect to Qdrant, creating the backing collection if it doesn't exist yet.
async fn setup_vector_storage(config: &ApplicationConfig) -> anyhow::Result<Arc<dyn VectorStore>> {
    let store = QdrantVectorStore::new(
        &config.vector_store.url,
        config.vector_store.collection_name.clone(),
        config.vector_store.vector_dimension,
    )
    .await?;
    Ok(Arc::new(store))
}

/// Build the embedding service and warm it up before serving traffic, so
/// the first real request doesn't pay the cold-start latency.
async fn setup_embedding_service(config: &ApplicationConfig) -> anyhow::Result<Arc<dyn EmbeddingService>> {
    let service = DefaultEmbeddingService::new(&config.embedding);
    service.provider().ensure_ready().await?;
    Ok(Arc::new(service))
}

/// Build the reranker if enabled. There is no standalone health-check on
/// `LlmGateway` the way there is `EmbeddingProvider::ensure_ready()` — the
/// gateway's construction already validates the provider/api-key
/// combination, which is the only thing "pre-loaded at startup" can mean
/// for an LLM client with no local weights to warm up.
fn setup_reranker(config: &ApplicationConfig, llm: &Arc<LlmGateway>) -> Option<Arc<dyn Reranker>> {
    if config.reranker.enabled {
        Some(Arc::clone(llm) as Arc<dyn Reranker>)
    } else {
        None
    }
}

pub struct Bootstrapped {
    pub state: AppState,
    pub worker: IngestionWorker,
}

/// Run the fixed startup sequence and return the application state plus
/// the (not yet started) ingestion worker pool.
///
/// # Errors
/// Returns an error if the database, vector store, or embedding service
/// can't be reached, or the LLM gateway's configured provider is invalid.
pub async fn initialize_app_state(config: &ApplicationConfig) -> anyhow::Result<Bootstrapped> {
    let repository = setup_database(config).await?;
    let vector_store = setup_vector_storage(config).await?;
    let embedding_service = setup_embedding_service(config).await?;
    let llm = Arc::new(LlmGateway::new(&config.llm)?);
    let reranker = setup_reranker(config, &llm);

    let sparse = Arc::new(SparseIndex::empty());
    let retriever = Arc::new(HybridRetriever::new(
        Arc::clone(&vector_store),
        Arc::clone(&embedding_service),
        Arc::clone(&sparse),
        reranker,
        HybridConfig {
            k: config.retrieval.top_k,
            rrf_k: config.retrieval.rrf_k,
            hybrid_enabled: config.retrieval.enable_hybrid_search,
        },
    ));

    let stats = vector_store.get_stats().await?;
    if config.retrieval.enable_hybrid_search && stats.vector_count > 0 {
        retriever.refresh_sparse_index().await?;
    }

    let progress = Arc::new(ProgressStore::new());
    let memory = Arc::new(ChatMemoryStore::new()?);
    let query_engine = Arc::new(QueryEngine::new(
        Arc::clone(&repository),
        Arc::clone(&retriever),
        Arc::clone(&llm),
        Arc::clone(&memory),
        config.storage_root.clone(),
    ));

    let contextual_llm = config.retrieval.enable_contextual_retrieval.then(|| Arc::clone(&llm));
    let ingest_deps = IngestDeps {
        repository: Arc::clone(&repository),
        vector_store: Arc::clone(&vector_store),
        embedding_service: Arc::clone(&embedding_service),
        hybrid_retriever: Arc::clone(&retriever),
        progress: Arc::clone(&progress),
        llm: contextual_llm,
        storage_root: PathBuf::from(&config.storage_root),
    };
    let worker = IngestionWorker::new(ingest_deps, WorkerConfig::default());

    let state = AppState {
        repository,
        vector_store,
        embedding_service,
        llm,
        retriever,
        progress,
        memory,
        query_engine,
        config: Arc::new(config.clone()),
    };

    Ok(Bootstrapped { state, worker })
}
