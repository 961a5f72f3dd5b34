use std::path::PathBuf;

use titlematch_core::DEFAULT_THRESHOLD;
use titlematch_core::config_file::ConfigFile;
use titlematch_ingest::{BackendOptions, IndexerConfig};
use titlematch_parsing::{TitleConfig, TitleConfigBuilder};
use titlematch_pdf_mupdf::DEFAULT_MAX_PAGES;

pub const DEFAULT_PDF_FOLDER: &str = "Published";
pub const DEFAULT_CATALOG: &str = "journal_articles_summary.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "output-files";
pub const DEFAULT_HTML_FOLDER: &str = "html_files";
pub const DEFAULT_MARKDOWN_DIR: &str = "markdown_files";

pub const ENV_THRESHOLD: &str = "TITLEMATCH_THRESHOLD";
pub const ENV_PDF_FOLDER: &str = "TITLEMATCH_PDF_FOLDER";
pub const ENV_CATALOG: &str = "TITLEMATCH_CATALOG";

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub pdf_folder: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub threshold: Option<u8>,
    pub max_pages: Option<usize>,
    pub extensions: Vec<String>,
}

/// Effective settings of a run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub pdf_folder: PathBuf,
    pub catalog: PathBuf,
    pub output_dir: PathBuf,
    pub threshold: u8,
    pub max_pages: usize,
    pub extensions: Vec<String>,
    pub header_exclusion: f32,
    pub footer_exclusion: f32,
    pub title_config: TitleConfig,
}

impl Settings {
    /// CLI flag > environment variable > config file > built-in default.
    pub fn resolve(
        overrides: Overrides,
        env: impl Fn(&str) -> Option<String>,
        file: &ConfigFile,
    ) -> anyhow::Result<Self> {
        let env_path = |key: &str| env(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);

        let pdf_folder = overrides
            .pdf_folder
            .or_else(|| env_path(ENV_PDF_FOLDER))
            .or_else(|| file.pdf_folder())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PDF_FOLDER));
        let catalog = overrides
            .catalog
            .or_else(|| env_path(ENV_CATALOG))
            .or_else(|| file.catalog())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG));
        let output_dir = overrides
            .output_dir
            .or_else(|| file.output_dir())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let threshold = overrides
            .threshold
            .or_else(|| env(ENV_THRESHOLD).and_then(|v| v.trim().parse().ok()))
            .or_else(|| file.threshold())
            .unwrap_or(DEFAULT_THRESHOLD)
            .min(100);

        let max_pages = overrides
            .max_pages
            .or_else(|| file.max_pages())
            .unwrap_or(DEFAULT_MAX_PAGES);

        let extensions = if !overrides.extensions.is_empty() {
            overrides.extensions
        } else {
            file.extensions()
                .map(<[String]>::to_vec)
                .unwrap_or_else(|| IndexerConfig::default().extensions)
        };
        let extensions = extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        let header_exclusion = exclusion_ratio("header_exclusion", file.header_exclusion())?;
        let footer_exclusion = exclusion_ratio("footer_exclusion", file.footer_exclusion())?;
        if header_exclusion + footer_exclusion >= 1.0 {
            anyhow::bail!("header_exclusion and footer_exclusion together cover the whole page");
        }

        Ok(Self {
            pdf_folder,
            catalog,
            output_dir,
            threshold,
            max_pages,
            extensions,
            header_exclusion,
            footer_exclusion,
            title_config: title_config_from(file)?,
        })
    }

    pub fn backend_options(&self) -> BackendOptions {
        BackendOptions {
            max_pages: self.max_pages,
            header_exclusion: self.header_exclusion,
            footer_exclusion: self.footer_exclusion,
        }
    }

    pub fn indexer_config(&self) -> IndexerConfig {
        IndexerConfig {
            extensions: self.extensions.clone(),
        }
    }
}

/// A page-height fraction from the config file; unset means `0.0`.
fn exclusion_ratio(key: &str, value: Option<f32>) -> anyhow::Result<f32> {
    let ratio = value.unwrap_or(0.0);
    if !(0.0..1.0).contains(&ratio) {
        anyhow::bail!("{} must be in [0, 1), got {}", key, ratio);
    }
    Ok(ratio)
}

/// Title heuristics with the config file's extra keywords appended.
fn title_config_from(file: &ConfigFile) -> anyhow::Result<TitleConfig> {
    let mut builder = TitleConfigBuilder::new();
    if let Some(extraction) = &file.extraction {
        for value in extraction.extra_boilerplate.iter().flatten() {
            builder = builder
                .add_boilerplate_header(value.clone())
                .add_line_drop_token(value.clone());
        }
        for value in extraction.extra_section_labels.iter().flatten() {
            builder = builder.add_section_label(value.clone());
        }
        for value in extraction.extra_end_markers.iter().flatten() {
            builder = builder.add_end_marker(value.clone());
        }
    }
    Ok(builder.build()?)
}
