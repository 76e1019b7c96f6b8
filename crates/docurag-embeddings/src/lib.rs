//! Embedding client for the document retrieval engine
//!
//! Wraps a remote embedding endpoint behind `EmbeddingProvider`/
//! `EmbeddingService`: the model runtime itself is an external service this
//! crate speaks HTTP to, not an in-process model.

pub mod embedding;
pub mod error;

pub use embedding::{
    DefaultEmbeddingService, EmbeddingProvider, EmbeddingService, EmbeddingStats,
    HttpEmbeddingProvider,
};
pub use error::{EmbeddingError, EmbeddingResult};
