//! `Source` construction and dedup for the chat loop's answer response.

use std::collections::HashMap;

use docurag_meta_data::Document;
use docurag_vector_store::ScoredChunk;
use serde::Serialize;
use uuid::Uuid;

const EXCERPT_LEN: usize = 200;

#[derive(Debug, Clone, Serialize)]
pub struct Source {
    pub document_id: Uuid,
    pub document_name: String,
    pub excerpt: String,
    pub full_text: String,
    pub path: String,
    pub score: f32,
}

/// Build one `Source` per distinct `document_id` in `chunks`, keeping the
/// first (best-ranked) occurrence and preserving rerank order. `documents`
/// must contain an entry for every `document_id` present in `chunks` —
/// callers fetch these via `MetaDataRepository::get_document` before calling
/// this function.
pub fn build_sources(
    chunks: &[ScoredChunk],
    documents: &HashMap<Uuid, Document>,
    storage_root: &str,
) -> Vec<Source> {
    let mut seen = std::collections::HashSet::new();
    let mut sources = Vec::new();

    for sc in chunks {
        let document_id = sc.chunk.document_id;
        if !seen.insert(document_id) {
            continue;
        }
        let Some(document) = documents.get(&document_id) else {
            continue;
        };

        sources.push(Source {
            document_id,
            document_name: document.filename.clone(),
            excerpt: excerpt(&sc.chunk.text),
            full_text: sc.chunk.text.clone(),
            path: format!("{storage_root}/{document_id}/{}", document.filename),
            score: sc.similarity,
        });
    }

    sources
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT_LEN {
        return text.to_string();
    }
    let truncated: String = text.chars().take(EXCERPT_LEN).collect();
    format!("{truncated}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use docurag_vector_store::{Chunk, Primitive};

    fn document(document_id: Uuid, filename: &str) -> Document {
        Document {
            document_id,
            filename: filename.to_string(),
            content_hash: "hash".to_string(),
            size_bytes: 100,
            chunk_count: 1,
            uploaded_at: Utc::now(),
        }
    }

    fn scored_chunk(document_id: Uuid, chunk_id: &str, text: &str, similarity: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                chunk_id: chunk_id.to_string(),
                document_id,
                chunk_index: 0,
                text: text.to_string(),
                embedding: None,
                metadata: HashMap::<String, Primitive>::new(),
            },
            similarity,
        }
    }

    #[test]
    fn dedups_by_document_id_keeping_first_occurrence() {
        let doc_id = Uuid::new_v4();
        let mut docs = HashMap::new();
        docs.insert(doc_id, document(doc_id, "report.pdf"));

        let chunks = vec![
            scored_chunk(doc_id, "c1", "first chunk", 0.9),
            scored_chunk(doc_id, "c2", "second chunk", 0.5),
        ];

        let sources = build_sources(&chunks, &docs, "/data");
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].full_text, "first chunk");
    }

    #[test]
    fn preserves_rerank_order_across_documents() {
        let doc_a = Uuid::new_v4();
        let doc_b = Uuid::new_v4();
        let mut docs = HashMap::new();
        docs.insert(doc_a, document(doc_a, "a.pdf"));
        docs.insert(doc_b, document(doc_b, "b.pdf"));

        let chunks = vec![
            scored_chunk(doc_b, "c1", "from b", 0.8),
            scored_chunk(doc_a, "c2", "from a", 0.7),
        ];

        let sources = build_sources(&chunks, &docs, "/data");
        assert_eq!(sources[0].document_name, "b.pdf");
        assert_eq!(sources[1].document_name, "a.pdf");
    }

    #[test]
    fn excerpt_truncates_long_text_with_ellipsis() {
        let long_text = "a".repeat(300);
        let doc_id = Uuid::new_v4();
        let mut docs = HashMap::new();
        docs.insert(doc_id, document(doc_id, "x.pdf"));

        let chunks = vec![scored_chunk(doc_id, "c1", &long_text, 0.9)];
        let sources = build_sources(&chunks, &docs, "/data");

        assert_eq!(sources[0].excerpt.chars().count(), EXCERPT_LEN + 1);
        assert!(sources[0].excerpt.ends_with('…'));
        assert_eq!(sources[0].full_text.len(), 300);
    }

    #[test]
    fn unknown_document_id_is_skipped_rather_than_panicking() {
        let doc_id = Uuid::new_v4();
        let docs = HashMap::new();
        let chunks = vec![scored_chunk(doc_id, "c1", "orphan chunk", 0.9)];

        assert!(build_sources(&chunks, &docs, "/data").is_empty());
    }
}
