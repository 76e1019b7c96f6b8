//! `POST /files/check`: content-hash dedup check run before an upload, so
//! a client can warn a user "this file is already in the library" instead
//! of re-ingesting it.

use std::collections::HashMap;

use axum::Router;
use axum::extract::State;
use axum::routing::post;
use axum::Json;
use docurag_vector_store::HashCandidate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{Error, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct FileCheckEntry {
    pub filename: String,
    pub size: i64,
    pub hash: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FilesCheckRequest {
    pub files: Vec<FileCheckEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FileCheckOutcome {
    pub exists: bool,
    pub document_id: Option<uuid::Uuid>,
    pub existing_filename: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FilesCheckResponse {
    pub results: HashMap<String, FileCheckOutcome>,
}

pub fn routes(state: AppState) -> Router {
    Router::new().route("/files/check", post(check_files)).with_state(state)
}

#[utoipa::path(post, path = "/files/check", request_body = FilesCheckRequest, responses((status = 200, body = FilesCheckResponse)))]
async fn check_files(
    State(state): State<AppState>,
    Json(body): Json<FilesCheckRequest>,
) -> Result<Json<FilesCheckResponse>> {
    let candidates: Vec<HashCandidate> = body
        .files
        .into_iter()
        .map(|f| HashCandidate { filename: f.filename, size_bytes: f.size, file_hash: f.hash })
        .collect();

    let checked = state.vector_store.check_hashes(&candidates).await.map_err(Error::from)?;

    let results = checked
        .into_iter()
        .map(|(filename, outcome)| {
            (
                filename,
                FileCheckOutcome {
                    exists: outcome.exists,
                    document_id: outcome.existing_document_id,
                    existing_filename: outcome.existing_filename,
                },
            )
        })
        .collect();

    Ok(Json(FilesCheckResponse { results }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_state;
    use tower::ServiceExt;

    #[tokio::test]
    async fn unseen_file_reports_no_existing_match() {
        let state = test_state();
        let app = routes(state);
        let body = serde_json::json!({
            "files": [{ "filename": "report.pdf", "size": 1024, "hash": "deadbeef" }]
        });
        let response = app
            .oneshot(
                axum::http::Request::post("/files/check")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: FilesCheckResponse = serde_json::from_slice(&body).unwrap();
        assert!(!parsed.results["report.pdf"].exists);
    }
}
