use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for document text extraction backends.
///
/// Implementors return the raw, newline-delimited text of the leading pages
/// of a document. Title heuristics live in `titlematch_parsing`; the corpus
/// indexer in `titlematch_ingest` drives a backend over a whole folder.
pub trait PdfBackend: Send + Sync {
    /// Extract the text of the first pages of a document.
    fn extract_text(&self, path: &Path) -> Result<String, BackendError>;
}
