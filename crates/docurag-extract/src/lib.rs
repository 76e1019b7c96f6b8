//! Chunk extractor for the document retrieval engine
//!
//! Turns a filesystem path into an ordered list of text chunks with
//! flattened structural metadata, dispatching by file extension. No
//! embedding happens here — that's the embedding client's job.

pub mod chunking;
pub mod error;
pub mod formats;

pub use error::{ExtractError, ExtractResult};

use std::collections::HashMap;
use std::path::Path;

use docurag_vector_store::Primitive;

use chunking::{DEFAULT_OVERLAP_TOKENS, DEFAULT_TARGET_TOKENS, split_into_spans};

/// One extracted span of text, not yet stamped with a document/chunk id —
/// the ingestion worker does that once it has a `document_id` in hand.
#[derive(Debug, Clone)]
pub struct ExtractedChunk {
    pub chunk_index: usize,
    pub text: String,
    pub metadata: HashMap<String, Primitive>,
}

const SENTENCE_SPLIT_EXTENSIONS: &[&str] = &["txt", "md"];
const LAYOUT_AWARE_EXTENSIONS: &[&str] = &[
    "pdf", "docx", "pptx", "xlsx", "html", "htm", "asciidoc", "adoc",
];

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

/// Extract chunks from a file, dispatching by extension.
///
/// # Errors
/// `ExtractError::FileNotFound` if the path can't be read,
/// `ExtractError::UnsupportedFormat` for an unrecognized extension,
/// `ExtractError::Extract` if extraction succeeds but yields no content.
pub fn extract_file(path: &Path) -> ExtractResult<Vec<ExtractedChunk>> {
    let extension = extension_of(path)
        .ok_or_else(|| ExtractError::UnsupportedFormat(path.display().to_string()))?;

    if !SENTENCE_SPLIT_EXTENSIONS.contains(&extension.as_str())
        && !LAYOUT_AWARE_EXTENSIONS.contains(&extension.as_str())
    {
        return Err(ExtractError::UnsupportedFormat(extension));
    }

    let text = match extension.as_str() {
        "pdf" => formats::extract_pdf(&read_bytes(path)?)?,
        "docx" => formats::extract_docx(&read_bytes(path)?)?,
        "pptx" => formats::extract_pptx(&read_bytes(path)?)?,
        "xlsx" => formats::extract_xlsx(&read_bytes(path)?)?,
        "html" | "htm" => formats::extract_html(&read_text(path)?)?,
        "asciidoc" | "adoc" => formats::extract_asciidoc(&read_text(path)?),
        _ => read_text(path)?,
    };

    if text.trim().is_empty() {
        return Err(ExtractError::Extract("no content".to_string()));
    }

    chunks_from_text(&text, path)
}

fn read_text(path: &Path) -> ExtractResult<String> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ExtractError::FileNotFound(path.display().to_string()),
        _ => ExtractError::Io(e),
    })
}

fn read_bytes(path: &Path) -> ExtractResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ExtractError::FileNotFound(path.display().to_string()),
        _ => ExtractError::Io(e),
    })
}

fn chunks_from_text(text: &str, path: &Path) -> ExtractResult<Vec<ExtractedChunk>> {
    let spans = split_into_spans(text, DEFAULT_TARGET_TOKENS, DEFAULT_OVERLAP_TOKENS)
        .map_err(|e| ExtractError::Extract(e.to_string()))?;

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let chunks: Vec<ExtractedChunk> = spans
        .into_iter()
        .filter(|span| !span.text.trim().is_empty())
        .enumerate()
        .map(|(chunk_index, span)| {
            let mut metadata = HashMap::new();
            metadata.insert("filename".to_string(), Primitive::String(filename.clone()));
            metadata.insert(
                "token_count".to_string(),
                Primitive::Int(span.token_count as i64),
            );
            ExtractedChunk {
                chunk_index,
                text: span.text,
                metadata,
            }
        })
        .collect();

    if chunks.is_empty() {
        return Err(ExtractError::Extract("no content".to_string()));
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.exe");
        std::fs::write(&path, b"binary").unwrap();

        let result = extract_file(&path);
        assert!(matches!(result, Err(ExtractError::UnsupportedFormat(_))));
    }

    #[test]
    fn missing_file_is_reported() {
        let path = Path::new("/nonexistent/path/to/file.txt");
        let result = extract_file(path);
        assert!(matches!(result, Err(ExtractError::FileNotFound(_))));
    }

    #[test]
    fn empty_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::File::create(&path).unwrap();

        let result = extract_file(&path);
        assert!(matches!(result, Err(ExtractError::Extract(_))));
    }

    #[test]
    fn plain_text_produces_chunks_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "This is a short test document with one sentence.").unwrap();

        let chunks = extract_file(&path).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);
        assert!(chunks[0].metadata.contains_key("filename"));
    }
}
