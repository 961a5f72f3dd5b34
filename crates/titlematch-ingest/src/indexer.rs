use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use titlematch_core::{DocumentEntry, PdfBackend, TitleIndex};
use titlematch_parsing::TitleExtractor;

use crate::{IngestError, list_files};

/// Indexer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerConfig {
    /// File extensions picked up from the folder, without the dot.
    pub extensions: Vec<String>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["pdf".to_string()],
        }
    }
}

/// Why a document did not make it into the title index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The backend could not open or read the file.
    ReadFailure(String),
    /// The file was read but carried no text (scanned image, empty page).
    EmptyText,
    /// Text was present but no line qualified as a title.
    NoTitle,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ReadFailure(e) => write!(f, "read failure: {}", e),
            SkipReason::EmptyText => write!(f, "no extractable text"),
            SkipReason::NoTitle => write!(f, "no title found"),
        }
    }
}

/// Result of indexing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentOutcome {
    Indexed { title: String },
    Skipped(SkipReason),
}

/// Counters for one indexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub discovered: usize,
    pub indexed: usize,
    pub read_failures: usize,
    pub empty_text: usize,
    pub no_title: usize,
}

impl IndexStats {
    pub fn skipped(&self) -> usize {
        self.read_failures + self.empty_text + self.no_title
    }

    fn record(&mut self, outcome: &DocumentOutcome) {
        match outcome {
            DocumentOutcome::Indexed { .. } => self.indexed += 1,
            DocumentOutcome::Skipped(SkipReason::ReadFailure(_)) => self.read_failures += 1,
            DocumentOutcome::Skipped(SkipReason::EmptyText) => self.empty_text += 1,
            DocumentOutcome::Skipped(SkipReason::NoTitle) => self.no_title += 1,
        }
    }
}

/// Progress events emitted while a folder is indexed.
#[derive(Debug, Clone)]
pub enum IndexProgress<'a> {
    Started {
        total: usize,
    },
    Processed {
        index: usize,
        total: usize,
        identifier: &'a str,
        outcome: &'a DocumentOutcome,
    },
    Finished {
        stats: &'a IndexStats,
    },
}

/// Everything an indexing run produced.
#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    /// Identifier → extracted title, for documents with a title only.
    pub titles: TitleIndex,
    /// Every document whose text could be read, in processing order.
    pub entries: Vec<DocumentEntry>,
    /// Per-document outcome in processing order.
    pub outcomes: Vec<(String, DocumentOutcome)>,
    pub stats: IndexStats,
}

/// Runs text and title extraction over a folder of documents.
///
/// Failures are per document: a file that cannot be read, has no text or has
/// no recognizable title is counted and skipped, never fatal to the batch.
pub struct CorpusIndexer<'a> {
    backend: &'a dyn PdfBackend,
    extractor: TitleExtractor,
    config: IndexerConfig,
}

impl<'a> CorpusIndexer<'a> {
    pub fn new(backend: &'a dyn PdfBackend) -> Self {
        Self {
            backend,
            extractor: TitleExtractor::new(),
            config: IndexerConfig::default(),
        }
    }

    pub fn with_extractor(mut self, extractor: TitleExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_config(mut self, config: IndexerConfig) -> Self {
        self.config = config;
        self
    }

    /// Documents of `folder` the indexer would process, sorted by file name.
    pub fn list_documents(&self, folder: &Path) -> Result<Vec<PathBuf>, IngestError> {
        list_files(folder, &self.config.extensions)
    }

    /// Read one document and extract its title.
    ///
    /// The entry is `None` when the backend failed; the raw text is kept
    /// otherwise, even when no title was found.
    pub fn index_document(&self, path: &Path) -> (Option<DocumentEntry>, DocumentOutcome) {
        let identifier = identifier_for(path);

        let raw_text = match self.backend.extract_text(path) {
            Ok(text) => text,
            Err(e) => {
                return (
                    None,
                    DocumentOutcome::Skipped(SkipReason::ReadFailure(e.to_string())),
                );
            }
        };

        if raw_text.trim().is_empty() {
            let entry = DocumentEntry {
                identifier,
                raw_text,
                extracted_title: None,
            };
            return (Some(entry), DocumentOutcome::Skipped(SkipReason::EmptyText));
        }

        let extracted_title = self.extractor.extract(&raw_text);
        let outcome = match &extracted_title {
            Some(title) => DocumentOutcome::Indexed {
                title: title.clone(),
            },
            None => DocumentOutcome::Skipped(SkipReason::NoTitle),
        };
        let entry = DocumentEntry {
            identifier,
            raw_text,
            extracted_title,
        };
        (Some(entry), outcome)
    }

    /// Index every matching document of `folder`.
    ///
    /// Errors only when the folder cannot be listed or holds no matching
    /// files.
    pub fn index_folder(
        &self,
        folder: &Path,
        mut progress: impl FnMut(IndexProgress<'_>),
    ) -> Result<CorpusIndex, IngestError> {
        let paths = self.list_documents(folder)?;
        if paths.is_empty() {
            return Err(IngestError::NoDocuments(folder.to_path_buf()));
        }

        let total = paths.len();
        progress(IndexProgress::Started { total });

        let mut index = CorpusIndex {
            stats: IndexStats {
                discovered: total,
                ..Default::default()
            },
            ..Default::default()
        };

        for (i, path) in paths.iter().enumerate() {
            let identifier = identifier_for(path);
            let (entry, outcome) = self.index_document(path);

            match &outcome {
                DocumentOutcome::Indexed { title } => {
                    tracing::debug!(document = %identifier, title = %title, "extracted title");
                }
                DocumentOutcome::Skipped(reason) => {
                    tracing::warn!(document = %identifier, reason = %reason, "skipping document");
                }
            }

            index.stats.record(&outcome);
            progress(IndexProgress::Processed {
                index: i,
                total,
                identifier: &identifier,
                outcome: &outcome,
            });

            if let Some(entry) = entry {
                index.entries.push(entry);
            }
            index.outcomes.push((identifier, outcome));
        }

        index.titles = TitleIndex::from_entries(&index.entries);

        tracing::info!(
            discovered = index.stats.discovered,
            indexed = index.stats.indexed,
            skipped = index.stats.skipped(),
            "indexing complete"
        );
        progress(IndexProgress::Finished {
            stats: &index.stats,
        });

        Ok(index)
    }
}

/// The document identifier: its file name.
pub fn identifier_for(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
