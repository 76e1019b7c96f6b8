//! `POST /upload`: multipart intake for new documents. Validates each
//! part's extension against the extractor's supported formats, persists
//! accepted files under the configured storage root, and enqueues one
//! ingestion task per file. The background worker pool (started
//! alongside the HTTP server) does the actual extract/embed/upsert work.

use axum::Router;
use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::state::AppState;

const SUPPORTED_EXTENSIONS: &[&str] = &[
    "txt", "md", "pdf", "docx", "pptx", "xlsx", "html", "htm", "asciidoc", "adoc",
];

#[derive(Debug, Serialize, ToSchema)]
pub struct QueuedTask {
    pub task_id: Uuid,
    pub filename: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub status: String,
    pub batch_id: Uuid,
    pub tasks: Vec<QueuedTask>,
}

struct RejectedFile {
    filename: String,
    reason: &'static str,
}

pub fn routes(state: AppState) -> Router {
    Router::new().route("/upload", post(upload)).with_state(state)
}

fn is_supported(filename: &str) -> bool {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

#[utoipa::path(post, path = "/upload", responses((status = 200, body = UploadResponse)))]
async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<UploadResponse>> {
    let max_bytes = state.config.max_upload_size_mb * 1024 * 1024;
    let mut accepted: Vec<(String, bytes::Bytes)> = Vec::new();
    let mut rejected: Vec<RejectedFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(e.to_string()))?
    {
        if field.name() != Some("files") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::BadRequest(e.to_string()))?;

        if !is_supported(&filename) {
            rejected.push(RejectedFile { filename, reason: "unsupported extension" });
            continue;
        }
        if data.len() as u64 > max_bytes {
            rejected.push(RejectedFile { filename, reason: "file exceeds upload size limit" });
            continue;
        }
        accepted.push((filename, data));
    }

    if accepted.is_empty() {
        return Err(Error::BadRequest("no valid files in upload".to_string()));
    }

    let batch = state
        .repository
        .create_batch(i32::try_from(accepted.len()).unwrap_or(i32::MAX))
        .await
        .map_err(Error::from)?;
    state.progress.create_batch(batch.batch_id, batch.total);

    let staging_dir = std::path::Path::new(&state.config.storage_root).join("staging").join(batch.batch_id.to_string());
    tokio::fs::create_dir_all(&staging_dir).await?;

    let mut tasks = Vec::with_capacity(accepted.len());
    for (filename, data) in accepted {
        let staged_path = staging_dir.join(&filename);
        tokio::fs::write(&staged_path, &data).await?;

        let task = state
            .repository
            .enqueue_task(batch.batch_id, &filename, &staged_path.display().to_string())
            .await
            .map_err(Error::from)?;
        tasks.push(QueuedTask { task_id: task.task_id, filename: task.filename });
    }

    for file in &rejected {
        tracing::warn!(batch_id = %batch.batch_id, filename = %file.filename, reason = file.reason, "rejected uploaded file");
    }

    Ok(Json(UploadResponse { status: "queued".to_string(), batch_id: batch.batch_id, tasks }))
}
