use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub matching: Option<MatchingConfig>,
    pub extraction: Option<ExtractionConfig>,
    pub paths: Option<PathsConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub threshold: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Number of leading pages read per document.
    pub max_pages: Option<usize>,
    /// File extensions picked up by the indexer (without the dot).
    pub extensions: Option<Vec<String>>,
    /// Extra header/boilerplate markers appended to the built-in list.
    pub extra_boilerplate: Option<Vec<String>>,
    /// Extra section labels ("letter to the editor", ...) appended to the built-in list.
    pub extra_section_labels: Option<Vec<String>>,
    /// Extra end-of-title markers appended to the built-in list.
    pub extra_end_markers: Option<Vec<String>>,
    /// Fraction of page height dropped from the top of each page.
    pub header_exclusion: Option<f32>,
    /// Fraction of page height dropped from the bottom of each page.
    pub footer_exclusion: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    pub pdf_folder: Option<String>,
    pub catalog: Option<String>,
    pub output_dir: Option<String>,
}

/// Platform config directory path: `<config_dir>/titlematch/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("titlematch").join("config.toml"))
}

/// Load config by cascading CWD `.titlematch.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".titlematch.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

fn pick<S, T: Clone>(
    overlay: Option<&S>,
    base: Option<&S>,
    field: impl Fn(&S) -> Option<T>,
) -> Option<T> {
    overlay.and_then(&field).or_else(|| base.and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (bm, om) = (base.matching.as_ref(), overlay.matching.as_ref());
    let (be, oe) = (base.extraction.as_ref(), overlay.extraction.as_ref());
    let (bp, op) = (base.paths.as_ref(), overlay.paths.as_ref());

    ConfigFile {
        matching: Some(MatchingConfig {
            threshold: pick(om, bm, |m| m.threshold),
        }),
        extraction: Some(ExtractionConfig {
            max_pages: pick(oe, be, |e| e.max_pages),
            extensions: pick(oe, be, |e| e.extensions.clone()),
            extra_boilerplate: pick(oe, be, |e| e.extra_boilerplate.clone()),
            extra_section_labels: pick(oe, be, |e| e.extra_section_labels.clone()),
            extra_end_markers: pick(oe, be, |e| e.extra_end_markers.clone()),
            header_exclusion: pick(oe, be, |e| e.header_exclusion),
            footer_exclusion: pick(oe, be, |e| e.footer_exclusion),
        }),
        paths: Some(PathsConfig {
            pdf_folder: pick(op, bp, |p| p.pdf_folder.clone()),
            catalog: pick(op, bp, |p| p.catalog.clone()),
            output_dir: pick(op, bp, |p| p.output_dir.clone()),
        }),
    }
}

impl ConfigFile {
    pub fn threshold(&self) -> Option<u8> {
        self.matching.as_ref().and_then(|m| m.threshold)
    }

    pub fn max_pages(&self) -> Option<usize> {
        self.extraction.as_ref().and_then(|e| e.max_pages)
    }

    pub fn extensions(&self) -> Option<&[String]> {
        self.extraction
            .as_ref()
            .and_then(|e| e.extensions.as_deref())
    }

    pub fn header_exclusion(&self) -> Option<f32> {
        self.extraction.as_ref().and_then(|e| e.header_exclusion)
    }

    pub fn footer_exclusion(&self) -> Option<f32> {
        self.extraction.as_ref().and_then(|e| e.footer_exclusion)
    }

    pub fn pdf_folder(&self) -> Option<PathBuf> {
        self.paths
            .as_ref()
            .and_then(|p| p.pdf_folder.as_ref())
            .map(PathBuf::from)
    }

    pub fn catalog(&self) -> Option<PathBuf> {
        self.paths
            .as_ref()
            .and_then(|p| p.catalog.as_ref())
            .map(PathBuf::from)
    }

    pub fn output_dir(&self) -> Option<PathBuf> {
        self.paths
            .as_ref()
            .and_then(|p| p.output_dir.as_ref())
            .map(PathBuf::from)
    }
}
