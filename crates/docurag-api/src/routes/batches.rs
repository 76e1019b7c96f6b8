//! `GET /batches/{batch_id}` and its SSE counterpart: poll an ingestion
//! batch's progress. Reads straight from the durable metadata store rather
//! than `AppState.progress`'s in-memory cache: the worker keeps both
//! updated, but a poll hitting the durable store can never report a batch
//! as complete before `complete_task` has actually committed, whereas the
//! cache and the commit aren't updated atomically together.

use std::convert::Infallible;
use std::time::Duration;

use async_stream::stream;
use axum::Router;
use axum::extract::{Path, State};
use axum::response::sse::{Event, Sse};
use axum::routing::get;
use axum::Json;
use futures::Stream;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::state::AppState;

const POLL_INTERVAL: Duration = Duration::from_millis(750);

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskStatusDto {
    pub task_id: Uuid,
    pub filename: String,
    pub status: String,
    pub total_chunks: i32,
    pub completed_chunks: i32,
    pub document_id: Option<Uuid>,
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BatchStatusResponse {
    pub batch_id: Uuid,
    pub total: i32,
    pub completed: i32,
    pub tasks: Vec<TaskStatusDto>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/batches/{batch_id}", get(get_batch))
        .route("/batches/{batch_id}/stream", get(stream_batch))
        .with_state(state)
}

async fn load_batch_status(state: &AppState, batch_id: Uuid) -> Result<BatchStatusResponse> {
    let batch = state
        .repository
        .get_batch(batch_id)
        .await
        .map_err(Error::from)?
        .ok_or_else(|| Error::NotFound(format!("batch {batch_id}")))?;

    let tasks = state
        .repository
        .list_tasks_for_batch(batch_id)
        .await
        .map_err(Error::from)?
        .into_iter()
        .map(|t| TaskStatusDto {
            task_id: t.task_id,
            filename: t.filename,
            status: t.status.to_string(),
            total_chunks: t.total_chunks,
            completed_chunks: t.completed_chunks,
            document_id: t.document_id,
            error_message: t.error_message,
        })
        .collect();

    Ok(BatchStatusResponse { batch_id: batch.batch_id, total: batch.total, completed: batch.completed, tasks })
}

#[utoipa::path(get, path = "/batches/{batch_id}", responses((status = 200, body = BatchStatusResponse), (status = 404)))]
async fn get_batch(State(state): State<AppState>, Path(batch_id): Path<Uuid>) -> Result<Json<BatchStatusResponse>> {
    load_batch_status(&state, batch_id).await.map(Json)
}

#[utoipa::path(get, path = "/batches/{batch_id}/stream", responses((status = 200)))]
async fn stream_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let events = stream! {
        loop {
            match load_batch_status(&state, batch_id).await {
                Ok(status) => {
                    let done = status.completed >= status.total;
                    let payload = serde_json::to_string(&status).unwrap_or_default();
                    if done {
                        yield Ok(Event::default().event("complete").data(payload));
                        break;
                    }
                    yield Ok(Event::default().event("progress").data(payload));
                }
                Err(e) => {
                    yield Ok(Event::default().event("error").data(e.to_string()));
                    break;
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    };

    Sse::new(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_state;
    use tower::ServiceExt;

    #[tokio::test]
    async fn unknown_batch_returns_404() {
        let state = test_state();
        let app = routes(state);
        let response = app
            .oneshot(
                axum::http::Request::get(format!("/batches/{}", Uuid::new_v4()))
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn known_batch_reports_its_task_count() {
        let state = test_state();
        let batch = state.repository.create_batch(1).await.unwrap();
        state
            .repository
            .enqueue_task(batch.batch_id, "notes.txt", "/tmp/notes.txt")
            .await
            .unwrap();

        let app = routes(state);
        let response = app
            .oneshot(
                axum::http::Request::get(format!("/batches/{}", batch.batch_id))
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: BatchStatusResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.tasks.len(), 1);
    }
}
