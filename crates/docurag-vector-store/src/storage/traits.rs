//! Storage abstraction trait for vector database backends
//!
//! Generalized from the reference architecture's `VectorStorage` trait
//! (`store_chunks`/`search`/`delete_chunks`/`collection_exists`/
//! `ensure_collection`/`get_stats`), trading code-search chunks for the
//! document model's `Chunk`/`Primitive` types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::VectorStoreResult;

/// A sanitized metadata value. Every value stored alongside a chunk must
/// reduce to one of these four variants before it reaches the store: dicts
/// are flattened key-by-key, lists are dropped, everything else is
/// stringified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Primitive {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    #[serde(skip_serializing)]
    Null,
}

impl From<&str> for Primitive {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Primitive {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Primitive {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Primitive {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Primitive {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Flatten an arbitrary JSON value into the chunk metadata map at `prefix`.
///
/// Objects are recursed into with dotted key paths; arrays are dropped
/// entirely (no ordinal-indexed flattening — the spec treats lists as
/// non-representable metadata); everything else is coerced to a `Primitive`.
pub fn sanitize_metadata(raw: &serde_json::Value) -> HashMap<String, Primitive> {
    let mut out = HashMap::new();
    flatten_into(raw, String::new(), &mut out);
    out
}

fn flatten_into(value: &serde_json::Value, prefix: String, out: &mut HashMap<String, Primitive>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                let next_prefix = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(child, next_prefix, out);
            }
        }
        serde_json::Value::Array(_) => {
            // lists are dropped per the metadata sanitization rule
        }
        serde_json::Value::Null => {
            if !prefix.is_empty() {
                out.insert(prefix, Primitive::Null);
            }
        }
        serde_json::Value::Bool(b) => {
            if !prefix.is_empty() {
                out.insert(prefix, Primitive::Bool(*b));
            }
        }
        serde_json::Value::Number(n) => {
            if !prefix.is_empty() {
                let primitive = if let Some(i) = n.as_i64() {
                    Primitive::Int(i)
                } else {
                    Primitive::Float(n.as_f64().unwrap_or_default())
                };
                out.insert(prefix, primitive);
            }
        }
        serde_json::Value::String(s) => {
            if !prefix.is_empty() {
                out.insert(prefix, Primitive::String(s.clone()));
            }
        }
    }
}

/// A single retrievable unit: a slice of a document's text plus its
/// embedding and sanitized structural metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub document_id: uuid::Uuid,
    pub chunk_index: usize,
    pub text: String,
    pub embedding: Option<Vec<f32>>,
    pub metadata: HashMap<String, Primitive>,
}

impl Chunk {
    /// Deterministic chunk identifier: `{document_id}-chunk-{index}`.
    pub fn derive_id(document_id: uuid::Uuid, chunk_index: usize) -> String {
        format!("{document_id}-chunk-{chunk_index}")
    }
}

/// A chunk paired with its similarity to a query, `[0,1]`, higher is better.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub similarity: f32,
}

/// Summary used for document listings, independent of chunk content.
#[derive(Debug, Clone)]
pub struct DocumentSummary {
    pub document_id: uuid::Uuid,
    pub filename: String,
    pub chunk_count: usize,
}

/// Result of a hash-based dedup check for one candidate file.
#[derive(Debug, Clone, Default)]
pub struct HashCheckResult {
    pub exists: bool,
    pub existing_document_id: Option<uuid::Uuid>,
    pub existing_filename: Option<String>,
}

/// A candidate file to check for prior ingestion by content hash.
#[derive(Debug, Clone)]
pub struct HashCandidate {
    pub filename: String,
    pub size_bytes: i64,
    pub file_hash: String,
}

/// Sort key for `list_documents`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Filename,
    UploadedAt,
    SizeBytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Summary statistics about the store's collection.
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub vector_count: usize,
    pub collection_name: String,
}

/// Contract the retrieval and ingestion core consumes from an external
/// vector database.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Upsert chunks, idempotent on `chunk_id`.
    async fn upsert(&self, chunks: &[Chunk]) -> VectorStoreResult<()>;

    /// Nearest-neighbor search against an embedding. Similarity is
    /// normalized to `[0,1]`, higher is better, regardless of the
    /// backend's native distance metric.
    async fn query(&self, embedding: &[f32], k: usize) -> VectorStoreResult<Vec<ScoredChunk>>;

    /// Delete every chunk belonging to a document.
    async fn delete_by_document(&self, document_id: uuid::Uuid) -> VectorStoreResult<()>;

    /// List distinct documents present in the store.
    async fn list_documents(
        &self,
        sort_by: SortField,
        order: SortOrder,
    ) -> VectorStoreResult<Vec<DocumentSummary>>;

    /// Return every chunk in the store; used to rebuild the sparse index.
    async fn list_all_chunks(&self) -> VectorStoreResult<Vec<Chunk>>;

    /// Check a batch of candidate files against stored content hashes,
    /// keyed by filename.
    async fn check_hashes(
        &self,
        candidates: &[HashCandidate],
    ) -> VectorStoreResult<HashMap<String, HashCheckResult>>;

    /// Whether the backing collection exists.
    async fn collection_exists(&self) -> VectorStoreResult<bool>;

    /// Create the backing collection if it doesn't already exist.
    async fn ensure_collection(&self) -> VectorStoreResult<()>;

    /// Collection-level statistics.
    async fn get_stats(&self) -> VectorStoreResult<StoreStats>;
}
