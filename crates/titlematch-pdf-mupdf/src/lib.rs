use std::path::Path;

use mupdf::{Document, TextPageFlags};

use titlematch_core::{BackendError, PdfBackend};

/// Pages read per document unless configured otherwise.
pub const DEFAULT_MAX_PAGES: usize = 2;

/// MuPDF-based implementation of [`PdfBackend`].
///
/// The only crate linking mupdf (AGPL-3.0). Titles sit on the first page, so
/// only the leading `max_pages` pages are read. Header and footer bands can be
/// excluded by page-height ratio; both are off by default because journal
/// title pages often print the title close to the top margin.
pub struct MupdfBackend {
    max_pages: usize,
    /// Fraction of page height from the top to drop. `None` keeps everything.
    header_exclusion_ratio: Option<f32>,
    /// Fraction of page height from the bottom to drop. `None` keeps everything.
    footer_exclusion_ratio: Option<f32>,
}

impl Default for MupdfBackend {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            header_exclusion_ratio: None,
            footer_exclusion_ratio: None,
        }
    }
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read at most `n` leading pages (at least one).
    pub fn with_max_pages(mut self, n: usize) -> Self {
        self.max_pages = n.max(1);
        self
    }

    /// Set the header exclusion ratio. Pass `0.0` to disable.
    pub fn with_header_exclusion(mut self, ratio: f32) -> Self {
        self.header_exclusion_ratio = (ratio > 0.0).then_some(ratio);
        self
    }

    /// Set the footer exclusion ratio. Pass `0.0` to disable.
    pub fn with_footer_exclusion(mut self, ratio: f32) -> Self {
        self.footer_exclusion_ratio = (ratio > 0.0).then_some(ratio);
        self
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }
}

fn extraction_error(e: impl std::fmt::Display) -> BackendError {
    BackendError::ExtractionError(e.to_string())
}

impl PdfBackend for MupdfBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut pages_text = Vec::new();

        for page_result in document.pages().map_err(extraction_error)?.take(self.max_pages) {
            let page = page_result.map_err(extraction_error)?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(extraction_error)?;

            let bounds = page.bounds().map_err(extraction_error)?;
            let height = bounds.y1 - bounds.y0;
            let header_limit = self.header_exclusion_ratio.map(|r| bounds.y0 + height * r);
            let footer_limit = self.footer_exclusion_ratio.map(|r| bounds.y1 - height * r);

            let mut page_text = String::new();
            for block in text_page.blocks() {
                let block_bounds = block.bounds();
                if header_limit.is_some_and(|limit| block_bounds.y1 <= limit) {
                    continue;
                }
                if footer_limit.is_some_and(|limit| block_bounds.y0 >= limit) {
                    continue;
                }

                for line in block.lines() {
                    page_text.extend(line.chars().map(|c| c.char().unwrap_or('\u{FFFD}')));
                    page_text.push('\n');
                }
            }
            pages_text.push(page_text);
        }

        tracing::trace!(path = %path.display(), pages = pages_text.len(), "extracted text");
        Ok(pages_text.join("\n"))
    }
}
