//! Progress Store (4.F): fast, process-local batch/task progress reads
//! without a round trip to the durable metadata store. The durable record
//! of truth is `docurag-meta-data`'s Postgres-backed `Batch`/`Task`
//! tables; this cache exists purely so batch polling and the SSE progress
//! stream don't hit the database on every tick.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use uuid::Uuid;

use crate::ttl::{Entry, spawn_sweeper};

const DEFAULT_TTL: Duration = Duration::from_secs(3600);
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskProgressStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl TaskProgressStatus {
    const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

#[derive(Debug, Clone)]
pub struct TaskState {
    pub task_id: Uuid,
    pub filename: String,
    pub status: TaskProgressStatus,
    pub total_chunks: i32,
    pub completed_chunks: i32,
    pub document_id: Option<Uuid>,
    pub error_message: Option<String>,
}

impl TaskState {
    fn new(task_id: Uuid, filename: String) -> Self {
        Self {
            task_id,
            filename,
            status: TaskProgressStatus::Pending,
            total_chunks: 0,
            completed_chunks: 0,
            document_id: None,
            error_message: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchRecord {
    pub batch_id: Uuid,
    pub total: i32,
    pub completed: i32,
    pub tasks: HashMap<Uuid, TaskState>,
}

impl BatchRecord {
    fn new(batch_id: Uuid, total: i32) -> Self {
        Self {
            batch_id,
            total,
            completed: 0,
            tasks: HashMap::new(),
        }
    }
}

/// Keyed store of in-flight batch progress, each entry expiring after
/// `ttl` of inactivity (reset on every write).
pub struct ProgressStore {
    records: Arc<DashMap<String, Entry<BatchRecord>>>,
    _sweeper: tokio::task::JoinHandle<()>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        let records = Arc::new(DashMap::new());
        let sweeper = spawn_sweeper(Arc::clone(&records), ttl, SWEEP_INTERVAL);
        Self {
            records,
            _sweeper: sweeper,
        }
    }

    fn key(batch_id: Uuid) -> String {
        format!("batch:{batch_id}")
    }

    pub fn create_batch(&self, batch_id: Uuid, total: i32) {
        self.records
            .insert(Self::key(batch_id), Entry::new(BatchRecord::new(batch_id, total)));
    }

    pub fn set_task_total_chunks(&self, batch_id: Uuid, task_id: Uuid, filename: &str, total_chunks: i32) {
        if let Some(mut entry) = self.records.get_mut(&Self::key(batch_id)) {
            let task = entry
                .value
                .tasks
                .entry(task_id)
                .or_insert_with(|| TaskState::new(task_id, filename.to_string()));
            task.total_chunks = total_chunks;
            task.status = TaskProgressStatus::Processing;
            entry.touch();
        }
    }

    pub fn increment_task_chunk_progress(&self, batch_id: Uuid, task_id: Uuid, delta: i32) {
        if let Some(mut entry) = self.records.get_mut(&Self::key(batch_id)) {
            if let Some(task) = entry.value.tasks.get_mut(&task_id) {
                task.completed_chunks += delta;
            }
            entry.touch();
        }
    }

    /// Transition a task to a new status, incrementing the batch's
    /// `completed` counter the first time it reaches a terminal state.
    pub fn update_task_progress(
        &self,
        batch_id: Uuid,
        task_id: Uuid,
        status: TaskProgressStatus,
        document_id: Option<Uuid>,
        error_message: Option<String>,
    ) {
        if let Some(mut entry) = self.records.get_mut(&Self::key(batch_id)) {
            let was_terminal = entry
                .value
                .tasks
                .get(&task_id)
                .is_some_and(|t| t.status.is_terminal());

            if let Some(task) = entry.value.tasks.get_mut(&task_id) {
                task.status = status;
                task.document_id = document_id;
                task.error_message = error_message;
            }

            if status.is_terminal() && !was_terminal {
                entry.value.completed += 1;
            }
            entry.touch();
        }
    }

    pub fn get_batch(&self, batch_id: Uuid) -> Option<BatchRecord> {
        self.records.get(&Self::key(batch_id)).map(|e| e.value.clone())
    }
}

impl Default for ProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_chunk_progress_across_increments() {
        let store = ProgressStore::new();
        let batch_id = Uuid::new_v4();
        let task_id = Uuid::new_v4();

        store.create_batch(batch_id, 1);
        store.set_task_total_chunks(batch_id, task_id, "report.pdf", 10);
        store.increment_task_chunk_progress(batch_id, task_id, 3);
        store.increment_task_chunk_progress(batch_id, task_id, 4);

        let batch = store.get_batch(batch_id).unwrap();
        let task = &batch.tasks[&task_id];
        assert_eq!(task.completed_chunks, 7);
        assert_eq!(task.total_chunks, 10);
    }

    #[test]
    fn terminal_transition_increments_batch_completed_exactly_once() {
        let store = ProgressStore::new();
        let batch_id = Uuid::new_v4();
        let task_id = Uuid::new_v4();

        store.create_batch(batch_id, 1);
        store.set_task_total_chunks(batch_id, task_id, "report.pdf", 1);
        store.update_task_progress(
            batch_id,
            task_id,
            TaskProgressStatus::Completed,
            Some(Uuid::new_v4()),
            None,
        );
        // a duplicate terminal write (e.g. a retried completion callback)
        // must not double-count
        store.update_task_progress(
            batch_id,
            task_id,
            TaskProgressStatus::Completed,
            Some(Uuid::new_v4()),
            None,
        );

        let batch = store.get_batch(batch_id).unwrap();
        assert_eq!(batch.completed, 1);
    }

    #[test]
    fn unknown_batch_lookups_return_none() {
        let store = ProgressStore::new();
        assert!(store.get_batch(Uuid::new_v4()).is_none());
    }
}
