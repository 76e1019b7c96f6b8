//! Error types for the metadata store

use thiserror::Error;

/// Errors surfaced by the metadata repository
#[derive(Error, Debug)]
pub enum MetaDataError {
    /// The requested document does not exist
    #[error("document not found: {document_id}")]
    DocumentNotFound { document_id: uuid::Uuid },

    /// The requested batch does not exist
    #[error("batch not found: {batch_id}")]
    BatchNotFound { batch_id: uuid::Uuid },

    /// The requested task does not exist
    #[error("task not found: {task_id}")]
    TaskNotFound { task_id: uuid::Uuid },

    /// Underlying database error
    #[error("database error during {operation}: {source}")]
    Database {
        operation: String,
        #[source]
        source: sqlx::Error,
    },

    /// Pool construction or migration failure
    #[error("database unavailable: {0}")]
    Unavailable(String),
}

/// Result type for metadata repository operations
pub type MetaDataResult<T> = Result<T, MetaDataError>;

/// Attach an operation label to a raw `sqlx::Error`
pub(crate) trait MapDbErr<T> {
    fn map_db_err(self, operation: &str) -> MetaDataResult<T>;
}

impl<T> MapDbErr<T> for Result<T, sqlx::Error> {
    fn map_db_err(self, operation: &str) -> MetaDataResult<T> {
        self.map_err(|source| MetaDataError::Database {
            operation: operation.to_string(),
            source,
        })
    }
}
