use thiserror::Error;

/// Retrieval-specific error types.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("embedding generation failed for query '{query}'")]
    EmbeddingFailed { query: String },

    #[error("retrieval timed out after {timeout_ms}ms for query '{query}'")]
    Timeout { query: String, timeout_ms: u64 },

    #[error("reranker call failed: {0}")]
    Rerank(String),

    #[error("embedding error: {0}")]
    Embedding(#[from] docurag_embeddings::EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] docurag_vector_store::VectorStoreError),
}

pub type RetrievalResult<T> = std::result::Result<T, RetrievalError>;
