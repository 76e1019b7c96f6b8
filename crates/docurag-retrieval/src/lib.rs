//! Retrieval orchestration for the document chat engine.
//!
//! Combines a hand-rolled BM25 sparse index with dense vector search via
//! Reciprocal Rank Fusion, and an optional LLM-backed reranking pass.

pub mod error;
pub mod hybrid;
pub mod reranker;
pub mod sparse;

pub use error::{RetrievalError, RetrievalResult};
pub use hybrid::{HybridConfig, HybridRetriever};
pub use reranker::Reranker;
pub use sparse::{Bm25Index, SparseIndex, SparseMatch};
