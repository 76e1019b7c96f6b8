//! Error types for the chunk extractor crate

use thiserror::Error;

/// Result type alias for extraction operations
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Errors surfaced while turning a file on disk into chunks
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The file extension has no registered extractor
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The path does not exist or could not be opened
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Extraction produced no usable text
    #[error("extraction failed: {0}")]
    Extract(String),

    /// Underlying I/O failure while reading the file
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
