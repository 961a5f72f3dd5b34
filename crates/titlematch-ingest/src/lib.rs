use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod catalog;
pub mod html;
pub mod indexer;
pub mod markdown;

pub use catalog::{CatalogTable, read_catalog, write_augmented_catalog, write_catalog};
pub use html::{HtmlCatalog, extract_html_catalog};
pub use indexer::{
    CorpusIndex, CorpusIndexer, DocumentOutcome, IndexProgress, IndexStats, IndexerConfig,
    SkipReason,
};
pub use markdown::{ConversionSummary, convert_folder};
// Re-export domain types for convenience
pub use titlematch_core::{CatalogRecord, DocumentEntry, PdfBackend, TitleIndex};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("catalog has no `{0}` column")]
    MissingColumn(String),
    #[error("no matching documents in {}", .0.display())]
    NoDocuments(PathBuf),
    #[error("catalog {} has no records", .0.display())]
    EmptyCatalog(PathBuf),
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("HTML conversion failed: {0}")]
    Conversion(String),
    #[cfg(not(feature = "pdf"))]
    #[error("PDF support not compiled in (enable the `pdf` feature of titlematch-ingest)")]
    NoPdfSupport,
}

/// List the files of `folder` whose extension is in `extensions`
/// (case-insensitive, without the dot), sorted by file name.
pub(crate) fn list_files(
    folder: &Path,
    extensions: &[String],
) -> Result<Vec<PathBuf>, IngestError> {
    if !folder.is_dir() {
        return Err(IngestError::NotADirectory(folder.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)));
        if matches {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// How the PDF backend reads each document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackendOptions {
    /// Leading pages read per document.
    pub max_pages: usize,
    /// Fraction of page height dropped from the top. `0.0` keeps everything.
    pub header_exclusion: f32,
    /// Fraction of page height dropped from the bottom. `0.0` keeps everything.
    pub footer_exclusion: f32,
}

/// The MuPDF text backend configured from `options`.
#[cfg(feature = "pdf")]
pub fn pdf_backend(options: BackendOptions) -> Result<Box<dyn PdfBackend>, IngestError> {
    Ok(Box::new(
        titlematch_pdf_mupdf::MupdfBackend::new()
            .with_max_pages(options.max_pages)
            .with_header_exclusion(options.header_exclusion)
            .with_footer_exclusion(options.footer_exclusion),
    ))
}

#[cfg(not(feature = "pdf"))]
pub fn pdf_backend(_options: BackendOptions) -> Result<Box<dyn PdfBackend>, IngestError> {
    Err(IngestError::NoPdfSupport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt", "c.pdf"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.pdf")).unwrap();

        let files = list_files(dir.path(), &["pdf".to_string()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf", "c.pdf"]);
    }

    #[test]
    fn test_list_files_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.pdf");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            list_files(&file, &["pdf".to_string()]),
            Err(IngestError::NotADirectory(_))
        ));
    }
}
