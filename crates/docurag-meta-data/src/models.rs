//! Domain models for the document/batch/task metadata store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A document that has finished ingestion and is retrievable.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub document_id: Uuid,
    pub filename: String,
    pub content_hash: String,
    pub size_bytes: i64,
    pub chunk_count: i32,
    pub uploaded_at: DateTime<Utc>,
}

/// Field to sort `list_documents` results by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSortField {
    Filename,
    UploadedAt,
    SizeBytes,
}

/// Sort order for listing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// A batch groups one or more ingestion tasks submitted together.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Batch {
    pub batch_id: Uuid,
    pub total: i32,
    pub completed: i32,
    pub total_chunks: i32,
    pub completed_chunks: i32,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle state of an ingestion task. Transitions only move forward:
/// `Pending -> Processing -> {Completed | Error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "error" => Ok(Self::Error),
            other => Err(format!("invalid task status: {other}")),
        }
    }
}

/// A single ingestion task: extract one uploaded file, embed its chunks,
/// and upsert them to the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: Uuid,
    pub batch_id: Uuid,
    pub filename: String,
    pub file_path: String,
    pub status: TaskStatus,
    pub total_chunks: i32,
    pub completed_chunks: i32,
    pub document_id: Option<Uuid>,
    pub error_message: Option<String>,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Raw row shape returned by sqlx for the `tasks` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct TaskRow {
    pub task_id: Uuid,
    pub batch_id: Uuid,
    pub filename: String,
    pub file_path: String,
    pub status: String,
    pub total_chunks: i32,
    pub completed_chunks: i32,
    pub document_id: Option<Uuid>,
    pub error_message: Option<String>,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            task_id: row.task_id,
            batch_id: row.batch_id,
            filename: row.filename,
            file_path: row.file_path,
            status: row.status.parse().unwrap_or(TaskStatus::Error),
            total_chunks: row.total_chunks,
            completed_chunks: row.completed_chunks,
            document_id: row.document_id,
            error_message: row.error_message,
            retry_count: row.retry_count,
            created_at: row.created_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
        }
    }
}

/// Generate a content hash for uploaded bytes, used to detect duplicate uploads.
pub fn hash_content(content: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}
