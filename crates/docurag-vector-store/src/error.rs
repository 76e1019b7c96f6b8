//! Error types for vector store operations

use thiserror::Error;

/// Result type alias for vector store operations
pub type VectorStoreResult<T> = Result<T, VectorStoreError>;

/// Errors that can occur during vector store operations
#[derive(Error, Debug)]
pub enum VectorStoreError {
    /// Store backend is unavailable or connection failed
    #[error("vector store unavailable: {0}")]
    Unavailable(String),

    /// Query vector dimension did not match the collection's configured dimension
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Collection/index management operation failed
    #[error("collection operation failed: {0}")]
    Collection(String),

    /// Upsert operation failed
    #[error("upsert failed: {0}")]
    Upsert(String),

    /// Generic backend error not covered above
    #[error("vector store error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for VectorStoreError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
