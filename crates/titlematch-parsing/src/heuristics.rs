//! Lexical predicates used by the title extractor.
//!
//! Every keyword set has a built-in default that [`TitleConfig`] can replace
//! or extend. All matching is case-insensitive.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::TitleConfig;

/// Header lines that never start a title (site URL, copyright, running head).
pub const BOILERPLATE_HEADERS: &[&str] = &[
    "www.ausmt.org",
    "copyright",
    "journal of automation",
    "vol.",
    "no.",
];

/// Article-type labels printed just above the title.
pub const SECTION_LABELS: &[&str] = &[
    "editorial",
    "original article",
    "original research",
    "trend",
    "trends",
    "review",
    "review article",
    "research",
    "research article",
    "research paper",
];

/// Markers of the text that follows the title block.
pub const END_MARKERS: &[&str] = &["abstract", "introduction", "keywords", "received:", "doi:"];

/// Tokens that turn a line into noise during fragment cleaning.
pub const LINE_DROP_TOKENS: &[&str] = &["www.", "copyright", "journal", "vol.", "no.", "page"];

/// Words that mark an affiliation line. Others (`institute`, `department`)
/// can be added through [`add_affiliation_keyword`].
///
/// [`add_affiliation_keyword`]: crate::TitleConfigBuilder::add_affiliation_keyword
pub const AFFILIATION_KEYWORDS: &[&str] = &["university"];

/// `Firstname Lastname, ACRONYM`: an author followed by an abbreviated affiliation.
static NAME_WITH_ACRONYM_AFFILIATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\p{Lu}[\p{L}.'\-]*(?:\s+\p{Lu}[\p{L}.'\-]*){1,3}\s*,\s*\p{Lu}{2,}\b").unwrap()
});

fn resolve_lowercase(list: &crate::config::ListOverride<String>, defaults: &[&str]) -> Vec<String> {
    let defaults: Vec<String> = defaults.iter().map(|s| s.to_string()).collect();
    list.resolve(&defaults)
        .into_iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn contains_any(haystack_lower: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack_lower.contains(n.as_str()))
}

/// True when the line has cased letters and none of them is lowercase.
pub fn is_all_uppercase(line: &str) -> bool {
    line.chars().any(char::is_uppercase) && !line.chars().any(char::is_lowercase)
}

/// True for `"John Smith, MIT"`-shaped lines.
pub fn has_acronym_affiliation(line: &str) -> bool {
    NAME_WITH_ACRONYM_AFFILIATION.is_match(line.trim())
}

/// Lowercase with whitespace runs collapsed (`"ORIGINAL  ARTICLE"` → `"original article"`).
fn normalize_label(line: &str) -> String {
    line.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Keyword sets resolved from a [`TitleConfig`], ready for repeated use.
#[derive(Debug, Clone)]
pub struct Heuristics {
    boilerplate_headers: Vec<String>,
    section_labels: Vec<String>,
    end_markers: Vec<String>,
    line_drop_tokens: Vec<String>,
    affiliation_keywords: Vec<String>,
    author_line_patterns: Vec<Regex>,
    author_line_max_len: usize,
    section_label_max_len: usize,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self::from_config(&TitleConfig::default())
    }
}

impl Heuristics {
    pub fn from_config(config: &TitleConfig) -> Self {
        Self {
            boilerplate_headers: resolve_lowercase(
                &config.boilerplate_headers,
                BOILERPLATE_HEADERS,
            ),
            section_labels: resolve_lowercase(&config.section_labels, SECTION_LABELS)
                .iter()
                .map(|l| normalize_label(l))
                .collect(),
            end_markers: resolve_lowercase(&config.end_markers, END_MARKERS),
            line_drop_tokens: resolve_lowercase(&config.line_drop_tokens, LINE_DROP_TOKENS),
            affiliation_keywords: resolve_lowercase(
                &config.affiliation_keywords,
                AFFILIATION_KEYWORDS,
            ),
            author_line_patterns: config.author_line_patterns.clone(),
            author_line_max_len: config.author_line_max_len,
            section_label_max_len: config.section_label_max_len,
        }
    }

    /// Header boilerplate: skipped while looking for the title start.
    pub fn is_boilerplate_header(&self, line: &str) -> bool {
        contains_any(&line.to_lowercase(), &self.boilerplate_headers)
    }

    /// A short line carrying an article-type label, e.g. `Original Article`,
    /// `Review Paper` or `ORIGINAL ARTICLE  Open Access`.
    ///
    /// Lines longer than the label length cap are never labels, so a title
    /// such as "Research on Cable-Driven Parallel Robots" survives.
    pub fn is_section_label(&self, line: &str) -> bool {
        let normalized = normalize_label(line);
        if normalized.is_empty() || normalized.chars().count() > self.section_label_max_len {
            return false;
        }
        contains_any(&normalized, &self.section_labels)
    }

    /// The line belongs to the abstract/keywords block after the title.
    pub fn is_end_marker(&self, line: &str) -> bool {
        contains_any(&line.to_lowercase(), &self.end_markers)
    }

    /// A short line that reads like author or affiliation metadata.
    pub fn is_author_line(&self, line: &str) -> bool {
        if line.chars().count() >= self.author_line_max_len {
            return false;
        }
        is_all_uppercase(line)
            || line.contains('@')
            || contains_any(&line.to_lowercase(), &self.affiliation_keywords)
            || has_acronym_affiliation(line)
            || self.author_line_patterns.iter().any(|re| re.is_match(line))
    }

    /// The line is page furniture and contributes nothing to a title.
    pub fn should_drop_line(&self, line: &str) -> bool {
        contains_any(&line.to_lowercase(), &self.line_drop_tokens)
    }
}
