use regex::Regex;

/// Controls how a keyword list is overridden from its defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }

    fn push(&mut self, value: T) {
        match self {
            ListOverride::Default => *self = ListOverride::Extend(vec![value]),
            ListOverride::Replace(v) | ListOverride::Extend(v) => v.push(value),
        }
    }
}

/// Tunables of the title extraction heuristics.
///
/// Lengths are counted in characters. Keyword lists are matched
/// case-insensitively. Use [`TitleConfigBuilder`] to construct a custom one.
#[derive(Debug, Clone)]
pub struct TitleConfig {
    // ── start detection ──
    /// Leading lines searched for the title start.
    pub(crate) scan_window: usize,
    /// A long line only counts as the start within this many leading lines.
    pub(crate) early_line_window: usize,
    /// A line must be strictly longer than this to start the title.
    pub(crate) min_start_len: usize,
    /// Only lines up to this length can be article-type labels.
    pub(crate) section_label_max_len: usize,

    // ── fragment collection ──
    /// Lines examined from the start index.
    pub(crate) max_fragments: usize,
    /// Author/affiliation heuristics only apply to lines shorter than this.
    pub(crate) author_line_max_len: usize,
    /// Accepted title length, both bounds exclusive.
    pub(crate) title_len_bounds: (usize, usize),

    // ── fallback ──
    /// Leading lines considered by the longest-line fallback.
    pub(crate) fallback_window: usize,
    /// Accepted fallback line length, both bounds exclusive.
    pub(crate) fallback_len_bounds: (usize, usize),

    // ── keyword sets ──
    pub(crate) boilerplate_headers: ListOverride<String>,
    pub(crate) section_labels: ListOverride<String>,
    pub(crate) end_markers: ListOverride<String>,
    pub(crate) line_drop_tokens: ListOverride<String>,
    pub(crate) affiliation_keywords: ListOverride<String>,
    /// Extra patterns flagging a short line as author metadata.
    pub(crate) author_line_patterns: Vec<Regex>,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            scan_window: 15,
            early_line_window: 10,
            min_start_len: 20,
            section_label_max_len: 30,
            max_fragments: 5,
            author_line_max_len: 50,
            title_len_bounds: (10, 300),
            fallback_window: 20,
            fallback_len_bounds: (15, 200),
            boilerplate_headers: ListOverride::Default,
            section_labels: ListOverride::Default,
            end_markers: ListOverride::Default,
            line_drop_tokens: ListOverride::Default,
            affiliation_keywords: ListOverride::Default,
            author_line_patterns: Vec::new(),
        }
    }
}

impl TitleConfig {
    pub fn builder() -> TitleConfigBuilder {
        TitleConfigBuilder::new()
    }

    pub fn scan_window(&self) -> usize {
        self.scan_window
    }

    pub fn max_fragments(&self) -> usize {
        self.max_fragments
    }

    pub fn title_len_bounds(&self) -> (usize, usize) {
        self.title_len_bounds
    }
}

/// Builder for [`TitleConfig`].
///
/// Author-line patterns are kept as strings and compiled in
/// [`build()`](Self::build), which fails fast on an invalid pattern.
#[derive(Debug, Clone, Default)]
pub struct TitleConfigBuilder {
    scan_window: Option<usize>,
    early_line_window: Option<usize>,
    min_start_len: Option<usize>,
    section_label_max_len: Option<usize>,
    max_fragments: Option<usize>,
    author_line_max_len: Option<usize>,
    title_len_bounds: Option<(usize, usize)>,
    fallback_window: Option<usize>,
    fallback_len_bounds: Option<(usize, usize)>,
    boilerplate_headers: ListOverride<String>,
    section_labels: ListOverride<String>,
    end_markers: ListOverride<String>,
    line_drop_tokens: ListOverride<String>,
    affiliation_keywords: ListOverride<String>,
    author_line_patterns: Vec<String>,
}

impl TitleConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Scalars ──

    pub fn scan_window(mut self, n: usize) -> Self {
        self.scan_window = Some(n);
        self
    }

    pub fn early_line_window(mut self, n: usize) -> Self {
        self.early_line_window = Some(n);
        self
    }

    pub fn min_start_len(mut self, n: usize) -> Self {
        self.min_start_len = Some(n);
        self
    }

    pub fn section_label_max_len(mut self, n: usize) -> Self {
        self.section_label_max_len = Some(n);
        self
    }

    pub fn max_fragments(mut self, n: usize) -> Self {
        self.max_fragments = Some(n);
        self
    }

    pub fn author_line_max_len(mut self, n: usize) -> Self {
        self.author_line_max_len = Some(n);
        self
    }

    pub fn title_len_bounds(mut self, min: usize, max: usize) -> Self {
        self.title_len_bounds = Some((min, max));
        self
    }

    pub fn fallback_window(mut self, n: usize) -> Self {
        self.fallback_window = Some(n);
        self
    }

    pub fn fallback_len_bounds(mut self, min: usize, max: usize) -> Self {
        self.fallback_len_bounds = Some((min, max));
        self
    }

    // ── Boilerplate headers ──

    pub fn set_boilerplate_headers(mut self, values: Vec<String>) -> Self {
        self.boilerplate_headers = ListOverride::Replace(values);
        self
    }

    pub fn add_boilerplate_header(mut self, value: impl Into<String>) -> Self {
        self.boilerplate_headers.push(value.into());
        self
    }

    // ── Section labels ──

    pub fn set_section_labels(mut self, values: Vec<String>) -> Self {
        self.section_labels = ListOverride::Replace(values);
        self
    }

    pub fn add_section_label(mut self, value: impl Into<String>) -> Self {
        self.section_labels.push(value.into());
        self
    }

    // ── End markers ──

    pub fn set_end_markers(mut self, values: Vec<String>) -> Self {
        self.end_markers = ListOverride::Replace(values);
        self
    }

    pub fn add_end_marker(mut self, value: impl Into<String>) -> Self {
        self.end_markers.push(value.into());
        self
    }

    // ── Line drop tokens ──

    pub fn set_line_drop_tokens(mut self, values: Vec<String>) -> Self {
        self.line_drop_tokens = ListOverride::Replace(values);
        self
    }

    pub fn add_line_drop_token(mut self, value: impl Into<String>) -> Self {
        self.line_drop_tokens.push(value.into());
        self
    }

    // ── Author metadata ──

    pub fn set_affiliation_keywords(mut self, values: Vec<String>) -> Self {
        self.affiliation_keywords = ListOverride::Replace(values);
        self
    }

    pub fn add_affiliation_keyword(mut self, value: impl Into<String>) -> Self {
        self.affiliation_keywords.push(value.into());
        self
    }

    pub fn add_author_line_pattern(mut self, pattern: &str) -> Self {
        self.author_line_patterns.push(pattern.to_string());
        self
    }

    /// Compile the author-line patterns and produce a [`TitleConfig`].
    pub fn build(self) -> Result<TitleConfig, regex::Error> {
        let defaults = TitleConfig::default();
        let author_line_patterns = self
            .author_line_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TitleConfig {
            scan_window: self.scan_window.unwrap_or(defaults.scan_window),
            early_line_window: self.early_line_window.unwrap_or(defaults.early_line_window),
            min_start_len: self.min_start_len.unwrap_or(defaults.min_start_len),
            section_label_max_len: self
                .section_label_max_len
                .unwrap_or(defaults.section_label_max_len),
            max_fragments: self.max_fragments.unwrap_or(defaults.max_fragments),
            author_line_max_len: self
                .author_line_max_len
                .unwrap_or(defaults.author_line_max_len),
            title_len_bounds: self.title_len_bounds.unwrap_or(defaults.title_len_bounds),
            fallback_window: self.fallback_window.unwrap_or(defaults.fallback_window),
            fallback_len_bounds: self
                .fallback_len_bounds
                .unwrap_or(defaults.fallback_len_bounds),
            boilerplate_headers: self.boilerplate_headers,
            section_labels: self.section_labels,
            end_markers: self.end_markers,
            line_drop_tokens: self.line_drop_tokens,
            affiliation_keywords: self.affiliation_keywords,
            author_line_patterns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TitleConfig::default();
        assert_eq!(config.scan_window, 15);
        assert_eq!(config.early_line_window, 10);
        assert_eq!(config.min_start_len, 20);
        assert_eq!(config.section_label_max_len, 30);
        assert_eq!(config.max_fragments, 5);
        assert_eq!(config.author_line_max_len, 50);
        assert_eq!(config.title_len_bounds, (10, 300));
        assert_eq!(config.fallback_window, 20);
        assert_eq!(config.fallback_len_bounds, (15, 200));
    }

    #[test]
    fn test_builder_scalars() {
        let config = TitleConfigBuilder::new()
            .max_fragments(3)
            .title_len_bounds(5, 100)
            .build()
            .unwrap();
        assert_eq!(config.max_fragments(), 3);
        assert_eq!(config.title_len_bounds(), (5, 100));
        assert_eq!(config.scan_window(), 15);
    }

    #[test]
    fn test_builder_invalid_regex() {
        let result = TitleConfigBuilder::new()
            .add_author_line_pattern(r"[invalid")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_add_extends_defaults() {
        let config = TitleConfigBuilder::new()
            .add_end_marker("index terms")
            .add_end_marker("nomenclature")
            .build()
            .unwrap();
        assert_eq!(
            config.end_markers,
            ListOverride::Extend(vec!["index terms".to_string(), "nomenclature".to_string()])
        );
    }

    #[test]
    fn test_builder_add_after_set_keeps_replacement() {
        let config = TitleConfigBuilder::new()
            .set_section_labels(vec!["editorial".into()])
            .add_section_label("letter")
            .build()
            .unwrap();
        assert_eq!(
            config.section_labels,
            ListOverride::Replace(vec!["editorial".to_string(), "letter".to_string()])
        );
    }

    #[test]
    fn test_list_override_resolve() {
        let defaults = vec!["a".to_string(), "b".to_string()];

        let d: ListOverride<String> = ListOverride::Default;
        assert_eq!(d.resolve(&defaults), defaults);

        let r: ListOverride<String> = ListOverride::Replace(vec!["x".to_string()]);
        assert_eq!(r.resolve(&defaults), vec!["x".to_string()]);

        let e: ListOverride<String> = ListOverride::Extend(vec!["c".to_string()]);
        assert_eq!(
            e.resolve(&defaults),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }
}
