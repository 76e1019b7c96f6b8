use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("extraction failed: {0}")]
    Extract(#[from] docurag_extract::ExtractError),

    #[error("embedding error: {0}")]
    Embedding(#[from] docurag_embeddings::EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] docurag_vector_store::VectorStoreError),

    #[error("metadata error: {0}")]
    MetaData(#[from] docurag_meta_data::MetaDataError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// Whether an error is worth retrying inline (network blip, timeout,
/// backend unavailability) versus one that will never succeed on retry
/// (bad config, malformed response shape, dimension mismatch).
pub fn is_transient(error: &IngestError) -> bool {
    match error {
        IngestError::Embedding(e) => matches!(
            e,
            docurag_embeddings::EmbeddingError::Unavailable(_)
                | docurag_embeddings::EmbeddingError::Transport(_)
        ),
        IngestError::VectorStore(e) => {
            matches!(e, docurag_vector_store::VectorStoreError::Unavailable(_))
        }
        _ => false,
    }
}
