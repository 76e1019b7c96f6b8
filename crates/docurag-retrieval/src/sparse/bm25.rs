//! Hand-rolled BM25 index, built in-process over every chunk in the store.
//!
//! No BM25 crate exists anywhere the document-retrieval engine's dependency
//! surface already reaches into, so this is a small library-defaults
//! implementation: term frequencies per chunk, document frequencies across
//! the corpus, `k1 = 1.2`, `b = 0.75`.

use std::collections::HashMap;

use docurag_vector_store::Chunk;

const K1: f32 = 1.2;
const B: f32 = 0.75;

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

struct IndexedChunk {
    chunk: Chunk,
    term_counts: HashMap<String, u32>,
    length: u32,
}

/// A single scored match out of the sparse index, keyed by rank rather than
/// a normalized similarity — BM25 scores aren't comparable across queries.
#[derive(Debug, Clone)]
pub struct SparseMatch {
    pub chunk: Chunk,
    pub score: f32,
}

/// An in-process BM25 index over a fixed snapshot of the corpus.
///
/// Immutable once built; refreshing the corpus means building a new one and
/// swapping the pointer (see [`super::index::SparseIndex`]).
pub struct Bm25Index {
    chunks: Vec<IndexedChunk>,
    document_frequency: HashMap<String, u32>,
    avg_length: f32,
}

impl Bm25Index {
    /// Build an index from a full corpus snapshot. Returns `None` if the
    /// corpus is empty — callers treat that as "uninitialized".
    pub fn build(chunks: Vec<Chunk>) -> Option<Self> {
        if chunks.is_empty() {
            return None;
        }

        let mut document_frequency: HashMap<String, u32> = HashMap::new();
        let mut indexed = Vec::with_capacity(chunks.len());
        let mut total_length: u64 = 0;

        for chunk in chunks {
            let terms = tokenize(&chunk.text);
            let length = terms.len() as u32;
            total_length += u64::from(length);

            let mut term_counts: HashMap<String, u32> = HashMap::new();
            for term in &terms {
                *term_counts.entry(term.clone()).or_insert(0) += 1;
            }
            for term in term_counts.keys() {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }

            indexed.push(IndexedChunk {
                chunk,
                term_counts,
                length,
            });
        }

        let avg_length = total_length as f32 / indexed.len() as f32;

        Some(Self {
            chunks: indexed,
            document_frequency,
            avg_length,
        })
    }

    /// Rank every chunk against a query, returning the top `k` by BM25 score.
    /// Empty query terms (e.g. punctuation-only input) yield an empty result.
    pub fn retrieve(&self, query: &str, k: usize) -> Vec<SparseMatch> {
        let query_terms = tokenize(query);
        if query_terms.is_empty() {
            return Vec::new();
        }

        let n = self.chunks.len() as f32;
        let mut idf = HashMap::with_capacity(query_terms.len());
        for term in &query_terms {
            let df = *self.document_frequency.get(term).unwrap_or(&0) as f32;
            let score = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
            idf.insert(term.clone(), score);
        }

        let mut scored: Vec<SparseMatch> = self
            .chunks
            .iter()
            .filter_map(|indexed| {
                let mut score = 0.0_f32;
                for term in &query_terms {
                    let Some(&tf) = indexed.term_counts.get(term) else {
                        continue;
                    };
                    let tf = tf as f32;
                    let term_idf = idf.get(term).copied().unwrap_or(0.0);
                    let norm = 1.0 - B + B * (indexed.length as f32 / self.avg_length);
                    score += term_idf * (tf * (K1 + 1.0)) / (tf + K1 * norm);
                }
                (score > 0.0).then(|| SparseMatch {
                    chunk: indexed.chunk.clone(),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docurag_vector_store::Primitive;
    use std::collections::HashMap as Map;
    use uuid::Uuid;

    fn chunk(text: &str, index: usize) -> Chunk {
        let document_id = Uuid::new_v4();
        Chunk {
            chunk_id: Chunk::derive_id(document_id, index),
            document_id,
            chunk_index: index,
            text: text.to_string(),
            embedding: None,
            metadata: Map::<String, Primitive>::new(),
        }
    }

    #[test]
    fn empty_corpus_builds_no_index() {
        assert!(Bm25Index::build(Vec::new()).is_none());
    }

    #[test]
    fn ranks_chunks_containing_more_query_terms_higher() {
        let chunks = vec![
            chunk("the quick brown fox jumps over the lazy dog", 0),
            chunk("a completely unrelated sentence about weather", 1),
            chunk("quick fox quick fox quick fox", 2),
        ];
        let index = Bm25Index::build(chunks).unwrap();
        let results = index.retrieve("quick fox", 3);
        assert!(!results.is_empty());
        assert_eq!(results[0].chunk.chunk_index, 2);
    }

    #[test]
    fn query_with_no_known_terms_returns_empty() {
        let chunks = vec![chunk("alpha beta gamma", 0)];
        let index = Bm25Index::build(chunks).unwrap();
        assert!(index.retrieve("zzz yyy xxx", 5).is_empty());
    }

    #[test]
    fn punctuation_only_query_returns_empty() {
        let chunks = vec![chunk("alpha beta gamma", 0)];
        let index = Bm25Index::build(chunks).unwrap();
        assert!(index.retrieve("???", 5).is_empty());
    }
}
