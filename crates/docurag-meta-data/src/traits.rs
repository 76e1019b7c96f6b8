//! Repository trait for dependency injection and testing

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::MetaDataResult;
use crate::models::{Batch, Document, DocumentSortField, SortOrder, Task, TaskStatus};

/// Durable bookkeeping for documents, ingestion batches, and ingestion tasks.
///
/// Backed by `PostgreSQL` in production (`PgMetaDataRepository`); an
/// in-memory `MockMetaDataRepository` implements the same contract for
/// tests that don't need a live database.
#[async_trait]
pub trait MetaDataRepository: Send + Sync {
    /// Record a newly-ingested document.
    async fn create_document(
        &self,
        document_id: Uuid,
        filename: &str,
        content_hash: &str,
        size_bytes: i64,
        chunk_count: i32,
    ) -> MetaDataResult<Document>;

    /// Fetch a document by ID.
    async fn get_document(&self, document_id: Uuid) -> MetaDataResult<Option<Document>>;

    /// List all documents, sorted as requested.
    async fn list_documents(
        &self,
        sort_by: DocumentSortField,
        order: SortOrder,
    ) -> MetaDataResult<Vec<Document>>;

    /// Remove a document's bookkeeping row. Does not touch the vector store
    /// or content store; callers coordinate that separately.
    async fn delete_document(&self, document_id: Uuid) -> MetaDataResult<()>;

    /// Create a new batch covering `total` tasks.
    async fn create_batch(&self, total: i32) -> MetaDataResult<Batch>;

    /// Fetch a batch by ID.
    async fn get_batch(&self, batch_id: Uuid) -> MetaDataResult<Option<Batch>>;

    /// Enqueue one ingestion task belonging to `batch_id`.
    async fn enqueue_task(
        &self,
        batch_id: Uuid,
        filename: &str,
        file_path: &str,
    ) -> MetaDataResult<Task>;

    /// Atomically claim the oldest pending task (`FOR UPDATE SKIP LOCKED`),
    /// marking it `processing`. Returns `None` if the queue is empty.
    async fn dequeue_task(&self) -> MetaDataResult<Option<Task>>;

    /// Fetch a task by ID.
    async fn get_task(&self, task_id: Uuid) -> MetaDataResult<Option<Task>>;

    /// List every task belonging to a batch.
    async fn list_tasks_for_batch(&self, batch_id: Uuid) -> MetaDataResult<Vec<Task>>;

    /// Record the chunk count once extraction completes.
    async fn set_task_total_chunks(&self, task_id: Uuid, total_chunks: i32) -> MetaDataResult<()>;

    /// Increment a task's completed-chunk counter (and its batch's aggregate).
    async fn increment_task_chunk_progress(
        &self,
        task_id: Uuid,
        delta: i32,
    ) -> MetaDataResult<()>;

    /// Transition a task to a terminal state, optionally attaching the
    /// resulting `document_id` or an error message. Increments the owning
    /// batch's `completed` counter.
    async fn complete_task(
        &self,
        task_id: Uuid,
        status: TaskStatus,
        document_id: Option<Uuid>,
        error_message: Option<String>,
    ) -> MetaDataResult<()>;

    /// Reset a task back to `pending` for a queue-level retry, incrementing
    /// its retry counter.
    async fn requeue_task(&self, task_id: Uuid) -> MetaDataResult<()>;
}
