//! Error handling for the document RAG chat API.
//!
//! Wraps every core-crate error (query, metadata, vector store) into one
//! enum and maps it onto an HTTP status code. Every message that
//! reaches the client is routed through `docurag_common::error_sanitizer`
//! first, per the error-handling design's mandatory scrubbing rule — no
//! handler ever formats a raw error's `to_string()` straight into a
//! response body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use docurag_common::CommonError;
use docurag_common::error_sanitizer::sanitize_error;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("Other error: {0}")]
    Other(String),

    #[error("query engine error: {0}")]
    Query(#[from] docurag_query::QueryError),

    #[error("metadata error: {0}")]
    MetaData(#[from] docurag_meta_data::MetaDataError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] docurag_vector_store::VectorStoreError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl CommonError for Error {
    fn io_error(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    fn config_error(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    fn parse_error(msg: impl Into<String>) -> Self {
        Self::Parser(msg.into())
    }

    fn other_error(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::io_error(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl Error {
    /// HTTP status this error maps onto, per the error-handling design's
    /// taxonomy (`NotFound` -> 404, everything else core-failure -> 500).
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MetaData(docurag_meta_data::MetaDataError::DocumentNotFound { .. })
            | Self::MetaData(docurag_meta_data::MetaDataError::BatchNotFound { .. })
            | Self::MetaData(docurag_meta_data::MetaDataError::TaskNotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // bad-request/not-found messages are already safe to show verbatim;
        // everything else goes through the correlation-id scrubber.
        let message = match status {
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => self.to_string(),
            _ => sanitize_error(&self, "docurag-api request"),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
