//! `OpenAPI` documentation generation and Swagger UI setup

use axum::response::IntoResponse;
use axum::Json;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// `OpenAPI` documentation for the document chat API.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::query::query,
        crate::routes::query::query_stream,
        crate::routes::upload::upload,
        crate::routes::files::check_files,
        crate::routes::batches::get_batch,
        crate::routes::batches::stream_batch,
        crate::routes::documents::list_documents,
        crate::routes::documents::delete_document,
        crate::routes::chat::chat_history,
        crate::routes::chat::clear_chat,
    ),
    components(
        schemas(
            crate::routes::query::QueryBody,
            crate::routes::query::QueryResponseBody,
            crate::routes::query::SourceDto,

            crate::routes::upload::UploadResponse,
            crate::routes::upload::QueuedTask,

            crate::routes::files::FilesCheckRequest,
            crate::routes::files::FileCheckEntry,
            crate::routes::files::FilesCheckResponse,
            crate::routes::files::FileCheckOutcome,

            crate::routes::batches::BatchStatusResponse,
            crate::routes::batches::TaskStatusDto,

            crate::routes::documents::ListDocumentsResponse,
            crate::routes::documents::DocumentDto,
            crate::routes::documents::DeleteDocumentResponse,

            crate::routes::chat::ChatHistoryResponse,
            crate::routes::chat::ChatMessageDto,
            crate::routes::chat::ClearChatRequest,
            crate::routes::chat::ClearChatResponse,

            crate::routes::response::ResponseStatus,
        )
    ),
    tags(
        (name = "query", description = "Conversational document chat"),
        (name = "upload", description = "Document intake and ingestion"),
        (name = "documents", description = "Ingested document library"),
        (name = "chat", description = "Per-session chat history"),
    ),
    info(
        title = "docurag API",
        version = "0.1.0",
        description = "Retrieval-augmented chat over an ingested document library",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    )
)]
pub struct ApiDoc;

/// Returns configured Swagger UI service
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

/// Returns `OpenAPI` JSON as a response
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
