use thiserror::Error;

/// Result type alias for query engine operations.
pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] docurag_retrieval::RetrievalError),

    #[error("llm call failed: {0}")]
    Llm(#[from] docurag_llm::LlmError),

    #[error("metadata store error: {0}")]
    MetaData(#[from] docurag_meta_data::MetaDataError),

    #[error("chat memory store error: {0}")]
    Memory(String),
}
