pub mod mock;
pub mod qdrant;
pub mod traits;

pub use mock::MockVectorStore;
pub use qdrant::QdrantVectorStore;
pub use traits::{
    Chunk, DocumentSummary, HashCandidate, HashCheckResult, Primitive, ScoredChunk,
    sanitize_metadata, SortField, SortOrder, StoreStats, VectorStore,
};
