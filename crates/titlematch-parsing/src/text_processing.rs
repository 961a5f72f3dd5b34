use once_cell::sync::Lazy;
use regex::Regex;

use crate::heuristics::Heuristics;

/// Expand common typographic ligatures found in PDFs.
pub fn expand_ligatures(text: &str) -> String {
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace(['\u{FB05}', '\u{FB06}'], "st")
}

/// Collapse every whitespace run to one space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Clean one candidate title line.
///
/// Strips page/line numbers glued to either end and collapses whitespace.
/// Returns an empty string for page furniture (URLs, running heads, page
/// labels) so callers can skip it.
pub fn clean_title_line(line: &str, heuristics: &Heuristics) -> String {
    static LEADING_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\s*").unwrap());
    static TRAILING_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\d+$").unwrap());

    let line = LEADING_DIGITS.replace(line.trim(), "");
    let line = TRAILING_DIGITS.replace(&line, "");
    let line = collapse_whitespace(&line);

    if heuristics.should_drop_line(&line) {
        return String::new();
    }
    line
}

/// Final cleanup of an assembled title: leading article and trailing
/// separator removed.
///
/// `"The Design of Grippers ;"` → `"Design of Grippers"`
pub fn clean_full_title(title: &str) -> String {
    static LEADING_ARTICLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(the|an|a)\s+").unwrap());
    static TRAILING_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[,;]\s*$").unwrap());

    let title = collapse_whitespace(title);
    let title = LEADING_ARTICLE.replace(&title, "");
    let title = TRAILING_SEPARATOR.replace(&title, "");
    title.trim().to_string()
}
