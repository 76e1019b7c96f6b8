//! `PostgreSQL`-backed implementation of `MetaDataRepository`

use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::error::{MapDbErr, MetaDataError, MetaDataResult};
use crate::models::{Batch, Document, DocumentSortField, SortOrder, Task, TaskRow, TaskStatus};
use crate::pool_manager::PoolManager;
use crate::traits::MetaDataRepository;

/// Repository backed by a `PostgreSQL` connection pool.
#[derive(Clone)]
pub struct PgMetaDataRepository {
    pools: PoolManager,
}

impl PgMetaDataRepository {
    pub const fn new(pools: PoolManager) -> Self {
        Self { pools }
    }

    pub const fn pools(&self) -> &PoolManager {
        &self.pools
    }
}

#[async_trait]
impl MetaDataRepository for PgMetaDataRepository {
    async fn create_document(
        &self,
        document_id: Uuid,
        filename: &str,
        content_hash: &str,
        size_bytes: i64,
        chunk_count: i32,
    ) -> MetaDataResult<Document> {
        sqlx::query_as::<_, Document>(
            r"
            INSERT INTO documents (document_id, filename, content_hash, size_bytes, chunk_count)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING document_id, filename, content_hash, size_bytes, chunk_count, uploaded_at
            ",
        )
        .bind(document_id)
        .bind(filename)
        .bind(content_hash)
        .bind(size_bytes)
        .bind(chunk_count)
        .fetch_one(self.pools.pool())
        .await
        .map_db_err("create_document")
    }

    async fn get_document(&self, document_id: Uuid) -> MetaDataResult<Option<Document>> {
        sqlx::query_as::<_, Document>(
            r"
            SELECT document_id, filename, content_hash, size_bytes, chunk_count, uploaded_at
            FROM documents WHERE document_id = $1
            ",
        )
        .bind(document_id)
        .fetch_optional(self.pools.pool())
        .await
        .map_db_err("get_document")
    }

    async fn list_documents(
        &self,
        sort_by: DocumentSortField,
        order: SortOrder,
    ) -> MetaDataResult<Vec<Document>> {
        let column = match sort_by {
            DocumentSortField::Filename => "filename",
            DocumentSortField::UploadedAt => "uploaded_at",
            DocumentSortField::SizeBytes => "size_bytes",
        };
        let direction = match order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        // column/direction are drawn from a closed enum, never user input
        let query = format!(
            "SELECT document_id, filename, content_hash, size_bytes, chunk_count, uploaded_at \
             FROM documents ORDER BY {column} {direction}"
        );

        sqlx::query_as::<_, Document>(&query)
            .fetch_all(self.pools.pool())
            .await
            .map_db_err("list_documents")
    }

    async fn delete_document(&self, document_id: Uuid) -> MetaDataResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE document_id = $1")
            .bind(document_id)
            .execute(self.pools.pool())
            .await
            .map_db_err("delete_document")?;

        if result.rows_affected() == 0 {
            return Err(MetaDataError::DocumentNotFound { document_id });
        }
        Ok(())
    }

    async fn create_batch(&self, total: i32) -> MetaDataResult<Batch> {
        sqlx::query_as::<_, Batch>(
            r"
            INSERT INTO batches (batch_id, total)
            VALUES ($1, $2)
            RETURNING batch_id, total, completed, total_chunks, completed_chunks, created_at
            ",
        )
        .bind(Uuid::new_v4())
        .bind(total)
        .fetch_one(self.pools.pool())
        .await
        .map_db_err("create_batch")
    }

    async fn get_batch(&self, batch_id: Uuid) -> MetaDataResult<Option<Batch>> {
        sqlx::query_as::<_, Batch>(
            r"
            SELECT batch_id, total, completed, total_chunks, completed_chunks, created_at
            FROM batches WHERE batch_id = $1
            ",
        )
        .bind(batch_id)
        .fetch_optional(self.pools.pool())
        .await
        .map_db_err("get_batch")
    }

    async fn enqueue_task(
        &self,
        batch_id: Uuid,
        filename: &str,
        file_path: &str,
    ) -> MetaDataResult<Task> {
        let row = sqlx::query_as::<_, TaskRow>(
            r"
            INSERT INTO tasks (task_id, batch_id, filename, file_path)
            VALUES ($1, $2, $3, $4)
            RETURNING task_id, batch_id, filename, file_path, status, total_chunks,
                      completed_chunks, document_id, error_message, retry_count,
                      created_at, started_at, completed_at
            ",
        )
        .bind(Uuid::new_v4())
        .bind(batch_id)
        .bind(filename)
        .bind(file_path)
        .fetch_one(self.pools.pool())
        .await
        .map_db_err("enqueue_task")?;

        Ok(row.into())
    }

    async fn dequeue_task(&self) -> MetaDataResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(
            r"
            WITH claimed AS (
                UPDATE tasks
                SET status = 'processing', started_at = NOW()
                WHERE task_id = (
                    SELECT task_id FROM tasks
                    WHERE status = 'pending'
                    ORDER BY created_at ASC
                    LIMIT 1
                    FOR UPDATE SKIP LOCKED
                )
                RETURNING task_id, batch_id, filename, file_path, status, total_chunks,
                          completed_chunks, document_id, error_message, retry_count,
                          created_at, started_at, completed_at
            )
            SELECT * FROM claimed
            ",
        )
        .fetch_optional(self.pools.pool())
        .await
        .map_db_err("dequeue_task")?;

        Ok(row.map(Into::into))
    }

    async fn get_task(&self, task_id: Uuid) -> MetaDataResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(
            r"
            SELECT task_id, batch_id, filename, file_path, status, total_chunks,
                   completed_chunks, document_id, error_message, retry_count,
                   created_at, started_at, completed_at
            FROM tasks WHERE task_id = $1
            ",
        )
        .bind(task_id)
        .fetch_optional(self.pools.pool())
        .await
        .map_db_err("get_task")?;

        Ok(row.map(Into::into))
    }

    async fn list_tasks_for_batch(&self, batch_id: Uuid) -> MetaDataResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r"
            SELECT task_id, batch_id, filename, file_path, status, total_chunks,
                   completed_chunks, document_id, error_message, retry_count,
                   created_at, started_at, completed_at
            FROM tasks WHERE batch_id = $1 ORDER BY created_at ASC
            ",
        )
        .bind(batch_id)
        .fetch_all(self.pools.pool())
        .await
        .map_db_err("list_tasks_for_batch")?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn set_task_total_chunks(&self, task_id: Uuid, total_chunks: i32) -> MetaDataResult<()> {
        let result = sqlx::query("UPDATE tasks SET total_chunks = $2 WHERE task_id = $1")
            .bind(task_id)
            .bind(total_chunks)
            .execute(self.pools.pool())
            .await
            .map_db_err("set_task_total_chunks")?;

        if result.rows_affected() == 0 {
            return Err(MetaDataError::TaskNotFound { task_id });
        }
        Ok(())
    }

    async fn increment_task_chunk_progress(
        &self,
        task_id: Uuid,
        delta: i32,
    ) -> MetaDataResult<()> {
        let mut tx = self
            .pools
            .pool()
            .begin()
            .await
            .map_db_err("increment_task_chunk_progress.begin")?;

        let batch_id: Uuid = sqlx::query(
            "UPDATE tasks SET completed_chunks = completed_chunks + $2 \
             WHERE task_id = $1 RETURNING batch_id",
        )
        .bind(task_id)
        .bind(delta)
        .fetch_optional(&mut *tx)
        .await
        .map_db_err("increment_task_chunk_progress.task")?
        .ok_or(MetaDataError::TaskNotFound { task_id })?
        .get("batch_id");

        sqlx::query(
            "UPDATE batches SET completed_chunks = completed_chunks + $2 WHERE batch_id = $1",
        )
        .bind(batch_id)
        .bind(delta)
        .execute(&mut *tx)
        .await
        .map_db_err("increment_task_chunk_progress.batch")?;

        tx.commit()
            .await
            .map_db_err("increment_task_chunk_progress.commit")
    }

    async fn complete_task(
        &self,
        task_id: Uuid,
        status: TaskStatus,
        document_id: Option<Uuid>,
        error_message: Option<String>,
    ) -> MetaDataResult<()> {
        let mut tx = self
            .pools
            .pool()
            .begin()
            .await
            .map_db_err("complete_task.begin")?;

        let batch_id: Uuid = sqlx::query(
            r"
            UPDATE tasks
            SET status = $2, document_id = $3, error_message = $4, completed_at = NOW()
            WHERE task_id = $1
            RETURNING batch_id
            ",
        )
        .bind(task_id)
        .bind(status.to_string())
        .bind(document_id)
        .bind(error_message)
        .fetch_optional(&mut *tx)
        .await
        .map_db_err("complete_task.task")?
        .ok_or(MetaDataError::TaskNotFound { task_id })?
        .get("batch_id");

        sqlx::query("UPDATE batches SET completed = completed + 1 WHERE batch_id = $1")
            .bind(batch_id)
            .execute(&mut *tx)
            .await
            .map_db_err("complete_task.batch")?;

        tx.commit().await.map_db_err("complete_task.commit")
    }

    async fn requeue_task(&self, task_id: Uuid) -> MetaDataResult<()> {
        let result = sqlx::query(
            r"
            UPDATE tasks
            SET status = 'pending', retry_count = retry_count + 1, started_at = NULL
            WHERE task_id = $1
            ",
        )
        .bind(task_id)
        .execute(self.pools.pool())
        .await
        .map_db_err("requeue_task")?;

        if result.rows_affected() == 0 {
            return Err(MetaDataError::TaskNotFound { task_id });
        }
        Ok(())
    }
}
