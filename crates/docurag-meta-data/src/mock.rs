//! In-memory `MetaDataRepository` for tests that don't need a live database

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::{MetaDataError, MetaDataResult};
use crate::models::{Batch, Document, DocumentSortField, SortOrder, Task, TaskStatus};
use crate::traits::MetaDataRepository;

#[derive(Default)]
struct State {
    documents: Vec<Document>,
    batches: Vec<Batch>,
    tasks: Vec<Task>,
}

/// Thread-safe in-memory stand-in for `PgMetaDataRepository`.
#[derive(Default)]
pub struct MockMetaDataRepository {
    state: Mutex<State>,
}

impl MockMetaDataRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetaDataRepository for MockMetaDataRepository {
    async fn create_document(
        &self,
        document_id: Uuid,
        filename: &str,
        content_hash: &str,
        size_bytes: i64,
        chunk_count: i32,
    ) -> MetaDataResult<Document> {
        let document = Document {
            document_id,
            filename: filename.to_string(),
            content_hash: content_hash.to_string(),
            size_bytes,
            chunk_count,
            uploaded_at: Utc::now(),
        };
        self.state.lock().unwrap().documents.push(document.clone());
        Ok(document)
    }

    async fn get_document(&self, document_id: Uuid) -> MetaDataResult<Option<Document>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .documents
            .iter()
            .find(|d| d.document_id == document_id)
            .cloned())
    }

    async fn list_documents(
        &self,
        sort_by: DocumentSortField,
        order: SortOrder,
    ) -> MetaDataResult<Vec<Document>> {
        let mut documents = self.state.lock().unwrap().documents.clone();
        documents.sort_by(|a, b| match sort_by {
            DocumentSortField::Filename => a.filename.cmp(&b.filename),
            DocumentSortField::UploadedAt => a.uploaded_at.cmp(&b.uploaded_at),
            DocumentSortField::SizeBytes => a.size_bytes.cmp(&b.size_bytes),
        });
        if order == SortOrder::Descending {
            documents.reverse();
        }
        Ok(documents)
    }

    async fn delete_document(&self, document_id: Uuid) -> MetaDataResult<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.documents.len();
        state.documents.retain(|d| d.document_id != document_id);
        if state.documents.len() == before {
            return Err(MetaDataError::DocumentNotFound { document_id });
        }
        Ok(())
    }

    async fn create_batch(&self, total: i32) -> MetaDataResult<Batch> {
        let batch = Batch {
            batch_id: Uuid::new_v4(),
            total,
            completed: 0,
            total_chunks: 0,
            completed_chunks: 0,
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().batches.push(batch.clone());
        Ok(batch)
    }

    async fn get_batch(&self, batch_id: Uuid) -> MetaDataResult<Option<Batch>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .batches
            .iter()
            .find(|b| b.batch_id == batch_id)
            .cloned())
    }

    async fn enqueue_task(
        &self,
        batch_id: Uuid,
        filename: &str,
        file_path: &str,
    ) -> MetaDataResult<Task> {
        let task = Task {
            task_id: Uuid::new_v4(),
            batch_id,
            filename: filename.to_string(),
            file_path: file_path.to_string(),
            status: TaskStatus::Pending,
            total_chunks: 0,
            completed_chunks: 0,
            document_id: None,
            error_message: None,
            retry_count: 0,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };
        self.state.lock().unwrap().tasks.push(task.clone());
        Ok(task)
    }

    async fn dequeue_task(&self) -> MetaDataResult<Option<Task>> {
        let mut state = self.state.lock().unwrap();
        let next = state
            .tasks
            .iter_mut()
            .filter(|t| t.status == TaskStatus::Pending)
            .min_by_key(|t| t.created_at);

        match next {
            Some(task) => {
                task.status = TaskStatus::Processing;
                task.started_at = Some(Utc::now());
                Ok(Some(task.clone()))
            }
            None => Ok(None),
        }
    }

    async fn get_task(&self, task_id: Uuid) -> MetaDataResult<Option<Task>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .tasks
            .iter()
            .find(|t| t.task_id == task_id)
            .cloned())
    }

    async fn list_tasks_for_batch(&self, batch_id: Uuid) -> MetaDataResult<Vec<Task>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .tasks
            .iter()
            .filter(|t| t.batch_id == batch_id)
            .cloned()
            .collect())
    }

    async fn set_task_total_chunks(&self, task_id: Uuid, total_chunks: i32) -> MetaDataResult<()> {
        let mut state = self.state.lock().unwrap();
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.task_id == task_id)
            .ok_or(MetaDataError::TaskNotFound { task_id })?;
        task.total_chunks = total_chunks;
        Ok(())
    }

    async fn increment_task_chunk_progress(
        &self,
        task_id: Uuid,
        delta: i32,
    ) -> MetaDataResult<()> {
        let mut state = self.state.lock().unwrap();
        let batch_id = {
            let task = state
                .tasks
                .iter_mut()
                .find(|t| t.task_id == task_id)
                .ok_or(MetaDataError::TaskNotFound { task_id })?;
            task.completed_chunks += delta;
            task.batch_id
        };
        if let Some(batch) = state.batches.iter_mut().find(|b| b.batch_id == batch_id) {
            batch.completed_chunks += delta;
        }
        Ok(())
    }

    async fn complete_task(
        &self,
        task_id: Uuid,
        status: TaskStatus,
        document_id: Option<Uuid>,
        error_message: Option<String>,
    ) -> MetaDataResult<()> {
        let mut state = self.state.lock().unwrap();
        let batch_id = {
            let task = state
                .tasks
                .iter_mut()
                .find(|t| t.task_id == task_id)
                .ok_or(MetaDataError::TaskNotFound { task_id })?;
            task.status = status;
            task.document_id = document_id;
            task.error_message = error_message;
            task.completed_at = Some(Utc::now());
            task.batch_id
        };
        if let Some(batch) = state.batches.iter_mut().find(|b| b.batch_id == batch_id) {
            batch.completed += 1;
        }
        Ok(())
    }

    async fn requeue_task(&self, task_id: Uuid) -> MetaDataResult<()> {
        let mut state = self.state.lock().unwrap();
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.task_id == task_id)
            .ok_or(MetaDataError::TaskNotFound { task_id })?;
        task.status = TaskStatus::Pending;
        task.retry_count += 1;
        task.started_at = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dequeue_claims_oldest_pending_task_first() {
        let repo = MockMetaDataRepository::new();
        let batch = repo.create_batch(2).await.unwrap();
        repo.enqueue_task(batch.batch_id, "a.txt", "/tmp/a.txt")
            .await
            .unwrap();
        let second = repo
            .enqueue_task(batch.batch_id, "b.txt", "/tmp/b.txt")
            .await
            .unwrap();

        let claimed = repo.dequeue_task().await.unwrap().unwrap();
        assert_eq!(claimed.filename, "a.txt");
        assert_eq!(claimed.status, TaskStatus::Processing);

        let remaining = repo.get_task(second.task_id).await.unwrap().unwrap();
        assert_eq!(remaining.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn complete_task_increments_batch_completed_count() {
        let repo = MockMetaDataRepository::new();
        let batch = repo.create_batch(1).await.unwrap();
        let task = repo
            .enqueue_task(batch.batch_id, "a.txt", "/tmp/a.txt")
            .await
            .unwrap();

        repo.complete_task(task.task_id, TaskStatus::Completed, Some(Uuid::new_v4()), None)
            .await
            .unwrap();

        let batch = repo.get_batch(batch.batch_id).await.unwrap().unwrap();
        assert_eq!(batch.completed, 1);
    }

    #[tokio::test]
    async fn requeue_task_resets_to_pending_and_bumps_retry_count() {
        let repo = MockMetaDataRepository::new();
        let batch = repo.create_batch(1).await.unwrap();
        let task = repo
            .enqueue_task(batch.batch_id, "a.txt", "/tmp/a.txt")
            .await
            .unwrap();
        repo.dequeue_task().await.unwrap();

        repo.requeue_task(task.task_id).await.unwrap();

        let task = repo.get_task(task.task_id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.retry_count, 1);
    }
}
