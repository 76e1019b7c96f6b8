//! Background ingestion worker.
//!
//! A pool of workers pulls tasks off the durable PostgreSQL-backed queue
//! (`FOR UPDATE SKIP LOCKED` dequeue, same crash-recovery story as the
//! reference architecture's file-repository queue) and runs each one
//! through extract → embed → upsert → persist → refresh-index →
//! complete. Grounded on the reference architecture's `BackgroundWorker`:
//! an `Arc<AtomicBool>` shutdown signal and a `tokio::task::JoinSet` of
//! concurrent pollers, simplified from its two-level parser/embedder split
//! since this domain has no separate parse stage worth decoupling from
//! the rest of a task.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use docurag_embeddings::EmbeddingService;
use docurag_llm::LlmGateway;
use docurag_meta_data::{MetaDataRepository, Task, TaskStatus};
use docurag_retrieval::HybridRetriever;
use docurag_state::progress::{ProgressStore, TaskProgressStatus};
use docurag_vector_store::{Chunk, Primitive, VectorStore};
use uuid::Uuid;

use crate::error::{IngestError, IngestResult, is_transient};
use crate::retry::RetryPolicy;

/// Dependencies shared by every worker in the pool.
pub struct IngestDeps {
    pub repository: Arc<dyn MetaDataRepository>,
    pub vector_store: Arc<dyn VectorStore>,
    pub embedding_service: Arc<dyn EmbeddingService>,
    pub hybrid_retriever: Arc<HybridRetriever>,
    pub progress: Arc<ProgressStore>,
    /// `Some` only when contextual retrieval is enabled; bootstrap leaves
    /// this `None` otherwise so the worker never pays for an LLM call it
    /// doesn't need.
    pub llm: Option<Arc<LlmGateway>>,
    pub storage_root: PathBuf,
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerConfig {
    pub worker_count: usize,
    pub poll_interval_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            poll_interval_ms: 1000,
        }
    }
}

pub struct IngestionWorker {
    deps: Arc<IngestDeps>,
    config: WorkerConfig,
    shutdown_signal: Arc<AtomicBool>,
}

impl IngestionWorker {
    pub fn new(deps: IngestDeps, config: WorkerConfig) -> Self {
        Self {
            deps: Arc::new(deps),
            config,
            shutdown_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown_signal)
    }

    /// Run the worker pool until the shutdown signal is set.
    pub async fn run(&self) {
        tracing::info!(
            worker_count = self.config.worker_count,
            "ingestion worker pool starting"
        );

        let mut join_set = tokio::task::JoinSet::new();
        for worker_id in 0..self.config.worker_count {
            let deps = Arc::clone(&self.deps);
            let shutdown = Arc::clone(&self.shutdown_signal);
            let poll_interval_ms = self.config.poll_interval_ms;
            join_set.spawn(async move {
                worker_loop(worker_id, deps, shutdown, poll_interval_ms).await;
            });
        }

        while let Some(result) = join_set.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "ingestion worker task panicked");
            }
        }

        tracing::info!("ingestion worker pool stopped");
    }

    /// Claim and fully process a single task. Returns its id, or `None` if
    /// the queue was empty. Useful for tests that want step-by-step control.
    pub async fn process_one(&self) -> IngestResult<Option<Uuid>> {
        let Some(task) = self.deps.repository.dequeue_task().await? else {
            return Ok(None);
        };
        let task_id = task.task_id;
        run_task_with_retries(task, &self.deps).await?;
        Ok(Some(task_id))
    }
}

async fn worker_loop(
    worker_id: usize,
    deps: Arc<IngestDeps>,
    shutdown: Arc<AtomicBool>,
    poll_interval_ms: u64,
) {
    tracing::debug!(worker_id, "ingestion worker starting");
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        match deps.repository.dequeue_task().await {
            Ok(Some(task)) => {
                let task_id = task.task_id;
                if let Err(e) = run_task_with_retries(task, &deps).await {
                    tracing::error!(worker_id, %task_id, error = %e, "ingestion task failed");
                }
            }
            Ok(None) => tokio::time::sleep(Duration::from_millis(poll_interval_ms)).await,
            Err(e) => {
                tracing::error!(worker_id, error = %e, "failed to dequeue task");
                tokio::time::sleep(Duration::from_millis(poll_interval_ms)).await;
            }
        }
    }
    tracing::debug!(worker_id, "ingestion worker stopped");
}

/// Queue-level retry: re-run the whole task up to `RetryPolicy::task_level()`
/// attempts. The temp source file is kept on disk between attempts and
/// removed only after the last one, success or failure.
async fn run_task_with_retries(task: Task, deps: &Arc<IngestDeps>) -> IngestResult<()> {
    let policy = RetryPolicy::task_level();
    let file_path = task.file_path.clone();

    for attempt in 0..policy.max_attempts() {
        match process_task(&task, deps).await {
            Ok((document_id, chunk_count)) => {
                deps.repository
                    .complete_task(task.task_id, TaskStatus::Completed, Some(document_id), None)
                    .await?;
                deps.progress.update_task_progress(
                    task.batch_id,
                    task.task_id,
                    TaskProgressStatus::Completed,
                    Some(document_id),
                    None,
                );
                let _ = tokio::fs::remove_file(&file_path).await;
                tracing::info!(task_id = %task.task_id, %document_id, chunk_count, "ingestion task completed");
                return Ok(());
            }
            Err(e) => {
                let is_last = attempt + 1 == policy.max_attempts();
                if is_last {
                    let message = docurag_common::error_sanitizer::scrub_path(
                        &e.to_string(),
                        &file_path,
                        &task.filename,
                    );
                    let _ = deps
                        .repository
                        .complete_task(task.task_id, TaskStatus::Error, None, Some(message.clone()))
                        .await;
                    deps.progress.update_task_progress(
                        task.batch_id,
                        task.task_id,
                        TaskProgressStatus::Error,
                        None,
                        Some(message),
                    );
                    let _ = tokio::fs::remove_file(&file_path).await;
                    return Err(e);
                }

                tracing::warn!(task_id = %task.task_id, attempt, error = %e, "ingestion task failed, retrying");
                let _ = deps.repository.requeue_task(task.task_id).await;
                tokio::time::sleep(policy.delay_for(attempt)).await;
            }
        }
    }

    unreachable!("retry loop always returns on its last attempt")
}

/// The per-task pipeline: extract, embed + upsert chunk by chunk, persist
/// the original, refresh the sparse index. Returns the new document id and
/// its chunk count on success.
async fn process_task(task: &Task, deps: &IngestDeps) -> IngestResult<(Uuid, i32)> {
    let source_path = Path::new(&task.file_path);
    let bytes = tokio::fs::read(source_path).await?;
    let file_hash = docurag_meta_data::hash_content(&bytes);
    let document_id = Uuid::new_v4();

    tracing::debug!(task_id = %task.task_id, %document_id, "extracting");
    let extracted = docurag_extract::extract_file(source_path)?;

    deps.repository
        .set_task_total_chunks(task.task_id, extracted.len() as i32)
        .await?;
    deps.progress.set_task_total_chunks(
        task.batch_id,
        task.task_id,
        &task.filename,
        extracted.len() as i32,
    );

    let file_type = Path::new(&task.filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();
    let uploaded_at = chrono::Utc::now().to_rfc3339();
    let document_path = deps
        .storage_root
        .join(document_id.to_string())
        .join(&task.filename)
        .display()
        .to_string();

    let mut chunk_count = 0_i32;
    for ext_chunk in extracted {
        let mut metadata = ext_chunk.metadata;
        metadata.insert("file_hash".to_string(), Primitive::String(file_hash.clone()));
        metadata.insert("file_name".to_string(), Primitive::String(task.filename.clone()));
        metadata.insert("file_type".to_string(), Primitive::String(file_type.clone()));
        metadata.insert("file_size_bytes".to_string(), Primitive::Int(bytes.len() as i64));
        metadata.insert("uploaded_at".to_string(), Primitive::String(uploaded_at.clone()));
        metadata.insert("path".to_string(), Primitive::String(document_path.clone()));

        let mut chunk_text = ext_chunk.text;
        if let Some(llm) = &deps.llm {
            match llm.contextualize(&task.filename, &file_type, &chunk_text).await {
                Ok(prefix) if !prefix.is_empty() => chunk_text = format!("{prefix}\n\n{chunk_text}"),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(task_id = %task.task_id, error = %e, "contextual prefix generation failed, using unprefixed chunk");
                }
            }
        }

        let mut chunk = Chunk {
            chunk_id: Chunk::derive_id(document_id, ext_chunk.chunk_index),
            document_id,
            chunk_index: ext_chunk.chunk_index,
            text: chunk_text,
            embedding: None,
            metadata,
        };

        let embedding = retry_inline(RetryPolicy::per_chunk(), || async {
            deps.embedding_service
                .embed(&chunk.text)
                .await
                .map_err(IngestError::from)
        })
        .await?;
        chunk.embedding = Some(embedding);

        retry_inline(RetryPolicy::per_chunk(), || async {
            deps.vector_store
                .upsert(std::slice::from_ref(&chunk))
                .await
                .map_err(IngestError::from)
        })
        .await?;

        deps.repository
            .increment_task_chunk_progress(task.task_id, 1)
            .await?;
        deps.progress
            .increment_task_chunk_progress(task.batch_id, task.task_id, 1);
        chunk_count += 1;
    }

    deps.repository
        .create_document(document_id, &task.filename, &file_hash, bytes.len() as i64, chunk_count)
        .await?;

    let dest_dir = deps.storage_root.join(document_id.to_string());
    if let Err(e) = persist_original(&dest_dir, &task.filename, &bytes).await {
        tracing::warn!(task_id = %task.task_id, error = %e, "failed to persist original document");
    }

    if let Err(e) = deps.hybrid_retriever.refresh_sparse_index().await {
        tracing::warn!(task_id = %task.task_id, error = %e, "failed to refresh sparse index");
    }

    Ok((document_id, chunk_count))
}

async fn persist_original(dest_dir: &Path, filename: &str, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dest_dir).await?;
    tokio::fs::write(dest_dir.join(filename), bytes).await
}

/// Inline per-chunk retry: only retries transient embed/upsert errors, up
/// to the policy's attempt limit; anything else fails the task immediately.
async fn retry_inline<T, F, Fut>(policy: RetryPolicy, mut attempt_fn: F) -> IngestResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = IngestResult<T>>,
{
    let mut attempt = 0;
    loop {
        match attempt_fn().await {
            Ok(value) => return Ok(value),
            Err(e) if is_transient(&e) && attempt + 1 < policy.max_attempts() => {
                tokio::time::sleep(policy.delay_for(attempt)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docurag_embeddings::{
        DefaultEmbeddingService, EmbeddingError, EmbeddingProvider, EmbeddingResult,
    };
    use docurag_meta_data::MockMetaDataRepository;
    use docurag_retrieval::{HybridConfig, SparseIndex};
    use docurag_vector_store::MockVectorStore;

    struct FixedProvider {
        dimension: usize,
        fail: bool,
    }

    #[async_trait]
    impl EmbeddingProvider for FixedProvider {
        async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
            if self.fail {
                return Err(EmbeddingError::Unavailable("test failure".to_string()));
            }
            Ok(texts.iter().map(|_| vec![0.1_f32; self.dimension]).collect())
        }

        fn embedding_dimension(&self) -> usize {
            self.dimension
        }

        fn model_name(&self) -> &str {
            "fixed-test-model"
        }

        async fn ensure_ready(&self) -> EmbeddingResult<()> {
            Ok(())
        }
    }

    fn test_deps(
        tmp_root: PathBuf,
        fail_embedding: bool,
    ) -> (Arc<IngestDeps>, Arc<dyn MetaDataRepository>) {
        test_deps_with_llm(tmp_root, fail_embedding, None)
    }

    fn test_deps_with_llm(
        tmp_root: PathBuf,
        fail_embedding: bool,
        llm: Option<Arc<LlmGateway>>,
    ) -> (Arc<IngestDeps>, Arc<dyn MetaDataRepository>) {
        let repository: Arc<dyn MetaDataRepository> = Arc::new(MockMetaDataRepository::new());
        let vector_store: Arc<dyn VectorStore> = Arc::new(MockVectorStore::new());
        let embedding_service: Arc<dyn EmbeddingService> =
            Arc::new(DefaultEmbeddingService::with_provider(
                Arc::new(FixedProvider {
                    dimension: 8,
                    fail: fail_embedding,
                }),
                10,
            ));
        let hybrid_retriever = Arc::new(HybridRetriever::new(
            Arc::clone(&vector_store),
            Arc::clone(&embedding_service),
            Arc::new(SparseIndex::empty()),
            None,
            HybridConfig::default(),
        ));

        let deps = Arc::new(IngestDeps {
            repository: Arc::clone(&repository),
            vector_store,
            embedding_service,
            hybrid_retriever,
            progress: Arc::new(ProgressStore::new()),
            llm,
            storage_root: tmp_root,
        });

        (deps, repository)
    }

    #[tokio::test]
    async fn processes_a_task_end_to_end() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("note.txt");
        tokio::fs::write(&source, b"This is a short note about widgets.")
            .await
            .unwrap();

        let (deps, repository) = test_deps(tmp.path().join("storage"), false);
        let batch = repository.create_batch(1).await.unwrap();
        let task = repository
            .enqueue_task(batch.batch_id, "note.txt", source.to_str().unwrap())
            .await
            .unwrap();

        run_task_with_retries(task.clone(), &deps).await.unwrap();

        let updated = repository.get_task(task.task_id).await.unwrap().unwrap();
        assert_eq!(updated.status, TaskStatus::Completed);
        assert!(updated.document_id.is_some());
    }

    #[tokio::test]
    async fn unreachable_contextual_retrieval_llm_does_not_fail_the_task() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("note.txt");
        tokio::fs::write(&source, b"This is a short note about widgets.")
            .await
            .unwrap();

        let llm = Arc::new(
            LlmGateway::new(&docurag_config::LlmConfig {
                provider: "local".to_string(),
                model: "test-model".to_string(),
                base_url: Some("http://127.0.0.1:1".to_string()),
                timeout_seconds: 1,
                api_key: None,
            })
            .unwrap(),
        );
        let (deps, repository) = test_deps_with_llm(tmp.path().join("storage"), false, Some(llm));

        let batch = repository.create_batch(1).await.unwrap();
        let task = repository
            .enqueue_task(batch.batch_id, "note.txt", source.to_str().unwrap())
            .await
            .unwrap();

        run_task_with_retries(task.clone(), &deps).await.unwrap();

        let updated = repository.get_task(task.task_id).await.unwrap().unwrap();
        assert_eq!(updated.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn stamps_the_full_required_metadata_key_set_on_every_chunk() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("report.txt");
        tokio::fs::write(&source, b"A note about quarterly widgets shipped last month.")
            .await
            .unwrap();

        let (deps, repository) = test_deps(tmp.path().join("storage"), false);
        let batch = repository.create_batch(1).await.unwrap();
        let task = repository
            .enqueue_task(batch.batch_id, "report.txt", source.to_str().unwrap())
            .await
            .unwrap();

        run_task_with_retries(task.clone(), &deps).await.unwrap();

        let chunks = deps.vector_store.list_all_chunks().await.unwrap();
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            for key in ["file_hash", "file_name", "file_type", "file_size_bytes", "uploaded_at", "path"] {
                assert!(chunk.metadata.contains_key(key), "missing metadata key {key}");
            }
            assert_eq!(chunk.metadata["file_name"], Primitive::String("report.txt".to_string()));
            assert_eq!(chunk.metadata["file_type"], Primitive::String("txt".to_string()));
        }
    }

    #[tokio::test]
    async fn completed_task_updates_the_in_memory_progress_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("note.txt");
        tokio::fs::write(&source, b"This is a short note about widgets.")
            .await
            .unwrap();

        let (deps, repository) = test_deps(tmp.path().join("storage"), false);
        let batch = repository.create_batch(1).await.unwrap();
        deps.progress.create_batch(batch.batch_id, batch.total);
        let task = repository
            .enqueue_task(batch.batch_id, "note.txt", source.to_str().unwrap())
            .await
            .unwrap();

        run_task_with_retries(task.clone(), &deps).await.unwrap();

        let cached = deps.progress.get_batch(batch.batch_id).unwrap();
        assert_eq!(cached.completed, 1);
        let cached_task = &cached.tasks[&task.task_id];
        assert_eq!(cached_task.status, TaskProgressStatus::Completed);
        assert!(cached_task.total_chunks >= 1);
    }

    #[tokio::test]
    async fn failing_embedder_exhausts_retries_and_marks_task_errored() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("note.txt");
        tokio::fs::write(&source, b"Some content that will fail to embed.")
            .await
            .unwrap();

        let (deps, repository) = test_deps(tmp.path().join("storage"), true);
        let batch = repository.create_batch(1).await.unwrap();
        let task = repository
            .enqueue_task(batch.batch_id, "note.txt", source.to_str().unwrap())
            .await
            .unwrap();

        let result = run_task_with_retries(task.clone(), &deps).await;
        assert!(result.is_err());

        let updated = repository.get_task(task.task_id).await.unwrap().unwrap();
        assert_eq!(updated.status, TaskStatus::Error);
        assert!(updated.error_message.is_some());
        // the temp source file is removed only after the last retry
        assert!(!source.exists());
    }

    #[tokio::test]
    async fn unsupported_file_extension_fails_without_retrying_embeddings() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("archive.zip");
        tokio::fs::write(&source, b"not actually a zip").await.unwrap();

        let (deps, repository) = test_deps(tmp.path().join("storage"), false);
        let batch = repository.create_batch(1).await.unwrap();
        let task = repository
            .enqueue_task(batch.batch_id, "archive.zip", source.to_str().unwrap())
            .await
            .unwrap();

        let result = run_task_with_retries(task.clone(), &deps).await;
        assert!(result.is_err());

        let updated = repository.get_task(task.task_id).await.unwrap().unwrap();
        assert_eq!(updated.status, TaskStatus::Error);
    }
}
