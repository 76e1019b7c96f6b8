//! Qdrant-backed implementation of [`VectorStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    Condition, CreateCollection, DeletePoints, Distance, Filter, PointId, PointStruct,
    PointsSelector, ScrollPoints, SearchPoints, UpsertPoints, Value, VectorParams,
    points_selector::PointsSelectorOneOf,
};
use qdrant_client::{Payload, Qdrant};

use super::traits::{
    Chunk, DocumentSummary, HashCandidate, HashCheckResult, Primitive, ScoredChunk, SortField,
    SortOrder, StoreStats, VectorStore,
};
use crate::{VectorStoreError, VectorStoreResult};

/// Qdrant client wrapper implementing the document [`VectorStore`] contract.
pub struct QdrantVectorStore {
    client: Qdrant,
    collection_name: String,
    vector_dimension: usize,
}

impl QdrantVectorStore {
    /// Connect and ensure the configured collection exists.
    pub async fn new(
        url: &str,
        collection_name: impl Into<String>,
        vector_dimension: usize,
    ) -> VectorStoreResult<Self> {
        let mut builder = Qdrant::from_url(url);
        if let Ok(api_key) = std::env::var("QDRANT_API_KEY") {
            builder = builder.api_key(api_key);
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::Unavailable(e.to_string()))?;

        let store = Self {
            client,
            collection_name: collection_name.into(),
            vector_dimension,
        };
        store.ensure_collection().await?;
        Ok(store)
    }

    fn payload_to_chunk(point_id: &str, payload: &HashMap<String, Value>) -> Option<Chunk> {
        let document_id = payload
            .get("document_id")
            .and_then(|v| v.as_str())
            .and_then(|s| uuid::Uuid::parse_str(s).ok())?;
        let chunk_index = payload
            .get("chunk_index")
            .and_then(|v| v.as_integer())
            .unwrap_or(0) as usize;
        let text = payload
            .get("text")
            .and_then(|v| v.as_str())
            .map(std::string::String::as_str)
            .unwrap_or_default()
            .to_string();

        let mut metadata = HashMap::new();
        for (key, value) in payload {
            if matches!(key.as_str(), "document_id" | "chunk_index" | "text") {
                continue;
            }
            if let Some(primitive) = qdrant_value_to_primitive(value) {
                metadata.insert(key.clone(), primitive);
            }
        }

        Some(Chunk {
            chunk_id: point_id.to_string(),
            document_id,
            chunk_index,
            text,
            embedding: None,
            metadata,
        })
    }
}

fn qdrant_value_to_primitive(value: &Value) -> Option<Primitive> {
    if let Some(s) = value.as_str() {
        Some(Primitive::String(s.to_string()))
    } else if let Some(i) = value.as_integer() {
        Some(Primitive::Int(i))
    } else if let Some(b) = value.as_bool() {
        Some(Primitive::Bool(b))
    } else {
        value.as_double().map(Primitive::Float)
    }
}

fn primitive_to_qdrant_value(primitive: &Primitive) -> Option<Value> {
    match primitive {
        Primitive::String(s) => Some(Value::from(s.clone())),
        Primitive::Int(i) => Some(Value::from(*i)),
        Primitive::Float(f) => Some(Value::from(*f)),
        Primitive::Bool(b) => Some(Value::from(*b)),
        Primitive::Null => None,
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn collection_exists(&self) -> VectorStoreResult<bool> {
        self.client
            .collection_exists(&self.collection_name)
            .await
            .map_err(|e| VectorStoreError::Collection(e.to_string()))
    }

    async fn ensure_collection(&self) -> VectorStoreResult<()> {
        if self.collection_exists().await? {
            return Ok(());
        }

        let request = CreateCollection {
            collection_name: self.collection_name.clone(),
            vectors_config: Some(
                VectorParams {
                    size: self.vector_dimension as u64,
                    distance: Distance::Cosine as i32,
                    ..Default::default()
                }
                .into(),
            ),
            ..Default::default()
        };

        match self.client.create_collection(request).await {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("already exists") => Ok(()),
            Err(e) => Err(VectorStoreError::Collection(e.to_string())),
        }
    }

    async fn upsert(&self, chunks: &[Chunk]) -> VectorStoreResult<()> {
        let mut points = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            let Some(embedding) = &chunk.embedding else {
                continue;
            };

            let mut payload: HashMap<String, Value> = HashMap::new();
            payload.insert(
                "document_id".to_string(),
                Value::from(chunk.document_id.to_string()),
            );
            payload.insert(
                "chunk_index".to_string(),
                Value::from(chunk.chunk_index as i64),
            );
            payload.insert("text".to_string(), Value::from(chunk.text.clone()));
            for (key, primitive) in &chunk.metadata {
                if let Some(value) = primitive_to_qdrant_value(primitive) {
                    payload.insert(key.clone(), value);
                }
            }

            points.push(PointStruct::new(
                chunk.chunk_id.clone(),
                embedding.clone(),
                Payload::from(payload),
            ));
        }

        if points.is_empty() {
            return Ok(());
        }

        let request = UpsertPoints {
            collection_name: self.collection_name.clone(),
            points,
            ..Default::default()
        };

        self.client
            .upsert_points(request)
            .await
            .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;

        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> VectorStoreResult<Vec<ScoredChunk>> {
        let request = SearchPoints {
            collection_name: self.collection_name.clone(),
            vector: embedding.to_vec(),
            limit: k as u64,
            with_payload: Some(true.into()),
            ..Default::default()
        };

        let response = self
            .client
            .search_points(request)
            .await
            .map_err(|e| VectorStoreError::Other(format!("search failed: {e}")))?;

        let mut results = Vec::with_capacity(response.result.len());
        for scored_point in response.result {
            let point_id = point_id_to_string(scored_point.id.as_ref());
            if let Some(chunk) = Self::payload_to_chunk(&point_id, &scored_point.payload) {
                // Qdrant cosine distance is already in [-1,1]; clamp into [0,1].
                let similarity = (scored_point.score + 1.0) / 2.0;
                results.push(ScoredChunk { chunk, similarity });
            }
        }
        Ok(results)
    }

    async fn delete_by_document(&self, document_id: uuid::Uuid) -> VectorStoreResult<()> {
        let filter = Filter {
            must: vec![Condition::matches("document_id", document_id.to_string())],
            ..Default::default()
        };

        let request = DeletePoints {
            collection_name: self.collection_name.clone(),
            points: Some(PointsSelector {
                points_selector_one_of: Some(PointsSelectorOneOf::Filter(filter)),
            }),
            ..Default::default()
        };

        self.client
            .delete_points(request)
            .await
            .map_err(|e| VectorStoreError::Other(format!("delete failed: {e}")))?;

        Ok(())
    }

    async fn list_documents(
        &self,
        sort_by: SortField,
        order: SortOrder,
    ) -> VectorStoreResult<Vec<DocumentSummary>> {
        let chunks = self.list_all_chunks().await?;

        let mut by_document: HashMap<uuid::Uuid, DocumentSummary> = HashMap::new();
        for chunk in chunks {
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
        let mut chunks = Vec::new();
        let mut offset = None;

        loop {
            let request = ScrollPoints {
                collection_name: self.collection_name.clone(),
                with_payload: Some(true.into()),
                offset: offset.clone(),
                limit: Some(256),
                ..Default::default()
            };

            let response = self
                .client
                .scroll(request)
                .await
                .map_err(|e| VectorStoreError::Other(format!("scroll failed: {e}")))?;

            for point in &response.result {
                let point_id = point_id_to_string(point.id.as_ref());
                if let Some(chunk) = Self::payload_to_chunk(&point_id, &point.payload) {
                    chunks.push(chunk);
                }
            }

            offset = response.next_page_offset;
            if offset.is_none() {
                break;
            }
        }

        Ok(chunks)
    }

    async fn check_hashes(
        &self,
        candidates: &[HashCandidate],
    ) -> VectorStoreResult<HashMap<String, HashCheckResult>> {
        let chunks = self.list_all_chunks().await?;

        let mut by_hash: HashMap<String, (uuid::Uuid, String)> = HashMap::new();
        for chunk in &chunks {
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

    async fn get_stats(&self) -> VectorStoreResult<StoreStats> {
        let info = self
            .client
            .collection_info(&self.collection_name)
            .await
            .map_err(|e| VectorStoreError::Collection(e.to_string()))?;

        let result = info
            .result
            .ok_or_else(|| VectorStoreError::Other("missing collection info".into()))?;

        Ok(StoreStats {
            vector_count: result.vectors_count.unwrap_or(0) as usize,
            collection_name: self.collection_name.clone(),
        })
    }
}

fn point_id_to_string(id: Option<&PointId>) -> String {
    match id.and_then(|id| id.point_id_options.as_ref()) {
        Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(s)) => s.clone(),
        Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    }
}
