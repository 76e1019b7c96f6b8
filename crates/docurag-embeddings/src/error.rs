//! Error types for the embedding client crate

use thiserror::Error;

/// Result type alias for embedding operations
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Errors surfaced by the embedding client
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// The embedding endpoint returned a non-success response
    #[error("embedding request failed: {0}")]
    Request(String),

    /// The endpoint responded but the payload didn't match the expected shape
    #[error("unexpected embedding response: {0}")]
    Decode(String),

    /// The configured endpoint is not responding to health probes
    #[error("embedding endpoint unavailable: {0}")]
    Unavailable(String),

    /// Configuration error surfaced at construction time
    #[error("embedding configuration error: {0}")]
    Config(String),

    /// Wraps a lower-level transport error
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl EmbeddingError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
