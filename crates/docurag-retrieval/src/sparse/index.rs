//! Lock-free swappable handle around a [`Bm25Index`] snapshot.
//!
//! Built at startup if the store is non-empty; refreshed wholesale after
//! ingestion or deletion. Concurrent queries always see either the
//! pre-refresh or post-refresh index, never a torn one, via `ArcSwap`'s
//! atomic pointer replace.

use std::sync::Arc;

use arc_swap::ArcSwap;
use docurag_vector_store::Chunk;

use super::bm25::{Bm25Index, SparseMatch};

/// Swappable container for the sparse index. An empty/uninitialized index
/// makes `retrieve` return nothing, which the hybrid retriever treats as
/// "fall back to dense-only".
pub struct SparseIndex {
    inner: ArcSwap<Option<Bm25Index>>,
}

impl SparseIndex {
    /// Start uninitialized; call [`Self::refresh`] to build the first
    /// snapshot once the store has been queried.
    pub fn empty() -> Self {
        Self {
            inner: ArcSwap::from_pointee(None),
        }
    }

    /// Build (or rebuild) the index from a full corpus snapshot.
    pub fn refresh(&self, chunks: Vec<Chunk>) {
        self.inner.store(Arc::new(Bm25Index::build(chunks)));
    }

    /// Rank chunks against `query`. Returns an empty vec if the index has
    /// never been built or the corpus was empty at last refresh.
    pub fn retrieve(&self, query: &str, k: usize) -> Vec<SparseMatch> {
        let guard = self.inner.load();
        match guard.as_ref() {
            Some(index) => index.retrieve(query, k),
            None => Vec::new(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.load().is_some()
    }
}

impl Default for SparseIndex {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docurag_vector_store::Primitive;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn chunk(text: &str) -> Chunk {
        let document_id = Uuid::new_v4();
        Chunk {
            chunk_id: Chunk::derive_id(document_id, 0),
            document_id,
            chunk_index: 0,
            text: text.to_string(),
            embedding: None,
            metadata: HashMap::<String, Primitive>::new(),
        }
    }

    #[test]
    fn uninitialized_index_returns_no_matches() {
        let index = SparseIndex::empty();
        assert!(!index.is_initialized());
        assert!(index.retrieve("anything", 5).is_empty());
    }

    #[test]
    fn refresh_with_empty_corpus_stays_uninitialized() {
        let index = SparseIndex::empty();
        index.refresh(Vec::new());
        assert!(!index.is_initialized());
    }

    #[test]
    fn refresh_then_retrieve_finds_matches() {
        let index = SparseIndex::empty();
        index.refresh(vec![chunk("the quick brown fox")]);
        assert!(index.is_initialized());
        assert!(!index.retrieve("quick fox", 5).is_empty());
    }
}
