//! `GET /documents` and `DELETE /documents/{id}`: the ingested-document
//! library. Deleting a document removes both its metadata row and its
//! vectors — callers never see a half-deleted document.

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::{delete, get};
use axum::Json;
use docurag_meta_data::{DocumentSortField, SortOrder};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::impl_has_status;
use crate::routes::response::ResponseStatus;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListDocumentsQuery {
    sort_by: Option<String>,
    order: Option<String>,
}

fn parse_sort_field(raw: Option<&str>) -> DocumentSortField {
    match raw {
        Some("uploaded_at") => DocumentSortField::UploadedAt,
        Some("size_bytes") => DocumentSortField::SizeBytes,
        _ => DocumentSortField::Filename,
    }
}

fn parse_sort_order(raw: Option<&str>) -> SortOrder {
    match raw {
        Some("descending" | "desc") => SortOrder::Descending,
        _ => SortOrder::Ascending,
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentDto {
    pub document_id: Uuid,
    pub filename: String,
    pub size_bytes: i64,
    pub chunk_count: i32,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListDocumentsResponse {
    pub documents: Vec<DocumentDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteDocumentResponse {
    pub status: ResponseStatus,
    pub message: String,
}
impl_has_status!(DeleteDocumentResponse);

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/documents", get(list_documents))
        .route("/documents/{document_id}", delete(delete_document))
        .with_state(state)
}

#[utoipa::path(get, path = "/documents", responses((status = 200, body = ListDocumentsResponse)))]
async fn list_documents(
    State(state): State<AppState>,
    Query(params): Query<ListDocumentsQuery>,
) -> Result<Json<ListDocumentsResponse>> {
    let sort_by = parse_sort_field(params.sort_by.as_deref());
    let order = parse_sort_order(params.order.as_deref());

    let documents = state
        .repository
        .list_documents(sort_by, order)
        .await
        .map_err(Error::from)?
        .into_iter()
        .map(|d| DocumentDto {
            document_id: d.document_id,
            filename: d.filename,
            size_bytes: d.size_bytes,
            chunk_count: d.chunk_count,
            uploaded_at: d.uploaded_at,
        })
        .collect();

    Ok(Json(ListDocumentsResponse { documents }))
}

#[utoipa::path(delete, path = "/documents/{document_id}", responses((status = 200, body = DeleteDocumentResponse)))]
async fn delete_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<DeleteDocumentResponse>> {
    state.repository.delete_document(document_id).await.map_err(Error::from)?;
    state.vector_store.delete_by_document(document_id).await.map_err(Error::from)?;

    let original_dir = std::path::Path::new(&state.config.storage_root).join(document_id.to_string());
    if let Err(e) = tokio::fs::remove_dir_all(&original_dir).await {
        tracing::warn!(%document_id, error = %e, "failed to remove persisted original document directory");
    }

    if let Err(e) = state.retriever.refresh_sparse_index().await {
        tracing::warn!(%document_id, error = %e, "failed to refresh sparse index after document deletion");
    }

    Ok(Json(DeleteDocumentResponse {
        status: ResponseStatus::Success,
        message: format!("document {document_id} deleted"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_state;
    use tower::ServiceExt;

    #[tokio::test]
    async fn lists_empty_library_as_an_empty_array() {
        let state = test_state();
        let app = routes(state);
        let response = app
            .oneshot(axum::http::Request::get("/documents").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: ListDocumentsResponse = serde_json::from_slice(&body).unwrap();
        assert!(parsed.documents.is_empty());
    }

    #[tokio::test]
    async fn deleting_a_known_document_removes_its_persisted_original() {
        let state = test_state();
        let document_id = Uuid::new_v4();
        state
            .repository
            .create_document(document_id, "notes.txt", "deadbeef", 11, 1)
            .await
            .unwrap();

        let original_dir = std::path::Path::new(&state.config.storage_root).join(document_id.to_string());
        tokio::fs::create_dir_all(&original_dir).await.unwrap();
        tokio::fs::write(original_dir.join("notes.txt"), b"hello").await.unwrap();

        let app = routes(state);
        let response = app
            .oneshot(
                axum::http::Request::delete(format!("/documents/{document_id}"))
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        assert!(!original_dir.exists());
    }

    #[tokio::test]
    async fn deleting_an_unknown_document_is_reported_as_not_found() {
        let state = test_state();
        let app = routes(state);
        let response = app
            .oneshot(
                axum::http::Request::delete(format!("/documents/{}", Uuid::new_v4()))
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
