//! In-memory `VectorStore` for tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::traits::{
    Chunk, DocumentSummary, HashCandidate, HashCheckResult, Primitive, ScoredChunk, SortField,
    SortOrder, StoreStats, VectorStore,
};
use crate::VectorStoreResult;

/// Thread-safe in-memory stand-in for [`super::qdrant::QdrantVectorStore`].
#[derive(Default)]
pub struct MockVectorStore {
    chunks: Mutex<HashMap<String, Chunk>>,
}

impl MockVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for MockVectorStore {
    async fn upsert(&self, chunks: &[Chunk]) -> VectorStoreResult<()> {
        let mut store = self.chunks.lock().unwrap();
        for chunk in chunks {
            store.insert(chunk.chunk_id.clone(), chunk.clone());
        }
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> VectorStoreResult<Vec<ScoredChunk>> {
        let store = self.chunks.lock().unwrap();
        let mut scored: Vec<ScoredChunk> = store
            .values()
            .filter_map(|chunk| {
                chunk.embedding.as_ref().map(|e| ScoredChunk {
                    chunk: chunk.clone(),
                    similarity: (cosine_similarity(embedding, e) + 1.0) / 2.0,
                })
            })
            .collect();
        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(k);
        Ok(scored)
    }

    async fn delete_by_document(&self, document_id: uuid::Uuid) -> VectorStoreResult<()> {
        self.chunks
            .lock()
            .unwrap()
            .retain(|_, chunk| chunk.document_id != document_id);
        Ok(())
    }

    async fn list_documents(
        &self,
        sort_by: SortField,
        order: SortOrder,
    ) -> VectorStoreResult<Vec<DocumentSummary>> {
        let store = self.chunks.lock().unwrap();
        let mut by_document: HashMap<uuid::Uuid, DocumentSummary> = HashMap::new();
        for chunk in store.values() {
            let entry = by_document
                .entry(chunk.document_id)
                .or_insert_with(|| DocumentSummary {
                    document_id: chunk.document_id,
                    filename: chunk
                        .metadata
                        .get("filename")
                        .and_then(|p| match p {
                            Primitive::String(s) => Some(s.clone()),
                            _ => None,
                        })
                        .unwrap_or_default(),
                    chunk_count: 0,
                });
            entry.chunk_count += 1;
        }
        let mut summaries: Vec<_> = by_document.into_values().collect();
        summaries.sort_by(|a, b| match sort_by {
            SortField::Filename => a.filename.cmp(&b.filename),
            SortField::UploadedAt => a.document_id.cmp(&b.document_id),
            SortField::SizeBytes => a.chunk_count.cmp(&b.chunk_count),
        });
        if order == SortOrder::Descending {
            summaries.reverse();
        }
        Ok(summaries)
    }

    async fn list_all_chunks(&self) -> VectorStoreResult<Vec<Chunk>> {
        Ok(self.chunks.lock().unwrap().values().cloned().collect())
    }

    async fn check_hashes(
        &self,
        candidates: &[HashCandidate],
    ) -> VectorStoreResult<HashMap<String, HashCheckResult>> {
        let store = self.chunks.lock().unwrap();
        let mut by_hash: HashMap<String, (uuid::Uuid, String)> = HashMap::new();
        for chunk in store.values() {
            if let Some(Primitive::String(hash)) = chunk.metadata.get("file_hash") {
                let filename = chunk
                    .metadata
                    .get("filename")
                    .and_then(|p| match p {
                        Primitive::String(s) => Some(s.clone()),
                        _ => None,
                    })
                    .unwrap_or_default();
                by_hash.entry(hash.clone()).or_insert((chunk.document_id, filename));
            }
        }

        let mut results = HashMap::new();
        for candidate in candidates {
            let result = match by_hash.get(&candidate.file_hash) {
                Some((document_id, filename)) => HashCheckResult {
                    exists: true,
                    existing_document_id: Some(*document_id),
                    existing_filename: Some(filename.clone()),
                },
                None => HashCheckResult::default(),
            };
            results.insert(candidate.filename.clone(), result);
        }
        Ok(results)
    }

    async fn collection_exists(&self) -> VectorStoreResult<bool> {
        Ok(true)
    }

    async fn ensure_collection(&self) -> VectorStoreResult<()> {
        Ok(())
    }

    async fn get_stats(&self) -> VectorStoreResult<StoreStats> {
        Ok(StoreStats {
            vector_count: self.chunks.lock().unwrap().len(),
            collection_name: "mock".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(document_id: uuid::Uuid, index: usize, hash: &str, embedding: Vec<f32>) -> Chunk {
        let mut metadata = HashMap::new();
        metadata.insert("file_hash".to_string(), Primitive::String(hash.to_string()));
        metadata.insert("filename".to_string(), Primitive::String("doc.txt".to_string()));
        Chunk {
            chunk_id: Chunk::derive_id(document_id, index),
            document_id,
            chunk_index: index,
            text: format!("chunk {index}"),
            embedding: Some(embedding),
            metadata,
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_on_chunk_id() {
        let store = MockVectorStore::new();
        let document_id = uuid::Uuid::new_v4();
        let first = chunk(document_id, 0, "abc", vec![1.0, 0.0]);
        store.upsert(&[first.clone()]).await.unwrap();
        store.upsert(&[first]).await.unwrap();

        assert_eq!(store.list_all_chunks().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn query_orders_by_similarity() {
        let store = MockVectorStore::new();
        let document_id = uuid::Uuid::new_v4();
        store
            .upsert(&[
                chunk(document_id, 0, "a", vec![1.0, 0.0]),
                chunk(document_id, 1, "b", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let results = store.query(&[1.0, 0.0], 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.chunk_index, 0);
    }

    #[tokio::test]
    async fn check_hashes_reports_existing_document() {
        let store = MockVectorStore::new();
        let document_id = uuid::Uuid::new_v4();
        store
            .upsert(&[chunk(document_id, 0, "abc123", vec![1.0])])
            .await
            .unwrap();

        let results = store
            .check_hashes(&[HashCandidate {
                filename: "new.txt".to_string(),
                size_bytes: 10,
                file_hash: "abc123".to_string(),
            }])
            .await
            .unwrap();

        let result = &results["new.txt"];
        assert!(result.exists);
        assert_eq!(result.existing_document_id, Some(document_id));
    }

    #[tokio::test]
    async fn delete_by_document_removes_all_its_chunks() {
        let store = MockVectorStore::new();
        let document_id = uuid::Uuid::new_v4();
        store
            .upsert(&[
                chunk(document_id, 0, "a", vec![1.0]),
                chunk(document_id, 1, "b", vec![1.0]),
            ])
            .await
            .unwrap();

        store.delete_by_document(document_id).await.unwrap();
        assert!(store.list_all_chunks().await.unwrap().is_empty());
    }
}
