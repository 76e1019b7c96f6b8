//! Vector store adapter for the document retrieval engine
//!
//! Defines the `VectorStore` contract the retrieval and ingestion core
//! consumes from an external vector database, backed by `Qdrant`.

pub mod error;
pub mod storage;

pub use error::{VectorStoreError, VectorStoreResult};
pub use storage::{
    Chunk, DocumentSummary, HashCandidate, HashCheckResult, MockVectorStore, Primitive,
    QdrantVectorStore, ScoredChunk, SortField, SortOrder, StoreStats, VectorStore,
    sanitize_metadata,
};
