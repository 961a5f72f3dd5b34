//! Markdown conversion of saved journal pages.
//!
//! Page chrome (scripts, sidebars, navigation blocks, comments) is pruned
//! from the main content area, the remainder is rendered with `html2text`,
//! and leftover site UI text (breadcrumbs, login banner, font-size controls)
//! is removed from the rendered text.

use std::fmt::Write as _;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use serde::Serialize;

use crate::indexer::identifier_for;
use crate::{IngestError, list_files};

/// Render width. Large enough that paragraphs are never wrapped.
const RENDER_WIDTH: usize = 10_000;

/// Elements dropped with their whole subtree.
const DROPPED_TAGS: &[&str] = &["script", "style", "noscript"];
/// `div` ids holding site navigation.
const DROPPED_DIV_IDS: &[&str] = &["sidebar", "navbar", "header", "footer"];
/// `div` classes holding site UI blocks.
const DROPPED_DIV_CLASSES: &[&str] = &["block", "roundedCorner"];
/// Containers tried in order for the main content.
const CONTENT_SELECTORS: &[&str] = &["div#main", "div#content", "div#body", "body"];

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Outcome of converting a folder.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionSummary {
    pub files_found: usize,
    /// `(source, written markdown file)` in folder order.
    pub converted: Vec<(String, PathBuf)>,
    /// `(source, error)` for files that could not be converted.
    pub failed: Vec<(String, String)>,
}

fn is_dropped(element: &scraper::node::Element) -> bool {
    let name = element.name();
    if DROPPED_TAGS.contains(&name) {
        return true;
    }
    name == "div"
        && (element.id().is_some_and(|id| DROPPED_DIV_IDS.contains(&id))
            || element.classes().any(|c| DROPPED_DIV_CLASSES.contains(&c)))
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let value = element.value();
    if is_dropped(value) {
        return;
    }
    let name = value.name();
    out.push('<');
    out.push_str(name);
    for (attr, v) in value.attrs() {
        let v = v.replace('&', "&amp;").replace('"', "&quot;");
        let _ = write!(out, " {}=\"{}\"", attr, v);
    }
    out.push('>');
    if VOID_TAGS.contains(&name) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => escape_text(text, out),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    write_element(child, out);
                }
            }
            // Comments, doctype and processing instructions
            _ => {}
        }
    }
    let _ = write!(out, "</{}>", name);
}

/// The main content of a page as HTML, with page chrome removed.
///
/// The first of `div#main`, `div#content`, `div#body` and `body` present is
/// used; a page with none of them is taken whole.
pub fn clean_html(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = CONTENT_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut out = String::with_capacity(html.len());
    write_element(root, &mut out);
    out
}

/// Drop site UI text left in rendered markdown and tidy blank lines.
pub fn post_process(markdown: &str) -> String {
    static BREADCRUMB: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?m)^[^\n]*Home(\]\[\d+\])?\s*>[^\n]*(\n|$)").unwrap());
    static LOGIN_BANNER: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"You are logged in as[^\n]*\n[^\n]*(\n|$)").unwrap());
    static FONT_SIZE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"Make font size[^\n]*(\n|$)").unwrap());
    static DASH_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{3,}").unwrap());
    static LONE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*\*[ \t]*$").unwrap());
    static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n\s*\n").unwrap());

    let text = BREADCRUMB.replace_all(markdown, "");
    let text = LOGIN_BANNER.replace_all(&text, "");
    let text = FONT_SIZE.replace_all(&text, "");
    let text = DASH_RUN.replace_all(&text, "---");
    let text = LONE_BULLET.replace_all(&text, "");
    let text = BLANK_RUN.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Convert one page to markdown, headed by `# <title>`.
pub fn html_to_markdown(html: &str, title: &str) -> Result<String, IngestError> {
    let cleaned = clean_html(html);
    let rendered = html2text::from_read(Cursor::new(cleaned.as_bytes()), RENDER_WIDTH)
        .map_err(|e| IngestError::Conversion(e.to_string()))?;
    Ok(format!("# {}\n\n{}", title, post_process(&rendered)))
}

/// Markdown file written for `source` inside `output_dir`.
pub fn markdown_output_path(source: &Path, output_dir: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    output_dir.join(format!("{}.md", stem))
}

/// Convert every `.htm`/`.html` page of `folder` into `output_dir`.
///
/// A page that cannot be read or converted is recorded in
/// [`ConversionSummary::failed`]; the rest of the folder is still converted.
pub fn convert_folder(
    folder: &Path,
    output_dir: &Path,
) -> Result<ConversionSummary, IngestError> {
    let files = list_files(folder, &["htm".to_string(), "html".to_string()])?;
    if files.is_empty() {
        return Err(IngestError::NoDocuments(folder.to_path_buf()));
    }
    std::fs::create_dir_all(output_dir)?;

    let mut summary = ConversionSummary {
        files_found: files.len(),
        ..Default::default()
    };
    for path in &files {
        let name = identifier_for(path);
        let target = markdown_output_path(path, output_dir);
        match convert_file(path, &target) {
            Ok(()) => {
                tracing::debug!(file = %name, output = %target.display(), "converted page");
                summary.converted.push((name, target));
            }
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "cannot convert page");
                summary.failed.push((name, e.to_string()));
            }
        }
    }

    tracing::info!(
        found = summary.files_found,
        converted = summary.converted.len(),
        failed = summary.failed.len(),
        "markdown conversion complete"
    );
    Ok(summary)
}

fn convert_file(source: &Path, target: &Path) -> Result<(), IngestError> {
    let bytes = std::fs::read(source)?;
    let html = String::from_utf8_lossy(&bytes);
    let title = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let markdown = html_to_markdown(&html, &title)?;
    std::fs::write(target, markdown)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html>
<head><title>Vol 3, No 2 (2013)</title><style>body { color: red; }</style></head>
<body>
<div id="navbar"><a href="/">Home</a> <a href="/about">About</a></div>
<div id="body">
  <div id="sidebar"><p>Sidebar links</p></div>
  <div id="breadcrumb"><a href="/">Home</a> &gt; <a href="/issue">Archives</a> &gt; Vol 3</div>
  <div class="block"><p>Make font size larger</p></div>
  <h2>Vol 3, No 2 (2013)</h2>
  <!-- generated by the journal system -->
  <script>var tracker = 1;</script>
  <p>Neural Control of Legged Robots &amp; Other Machines</p>
  <p>Soft Grippers<br>for Harvesting</p>
</div>
</body></html>"#;

    #[test]
    fn test_clean_html_prunes_chrome() {
        let cleaned = clean_html(PAGE);
        assert!(cleaned.starts_with("<div id=\"body\">"));
        assert!(cleaned.contains("Neural Control of Legged Robots &amp; Other Machines"));
        assert!(cleaned.contains("<br>for Harvesting"));
        assert!(!cleaned.contains("</br>"));
        assert!(!cleaned.contains("Sidebar links"));
        assert!(!cleaned.contains("Make font size"));
        assert!(!cleaned.contains("tracker"));
        assert!(!cleaned.contains("color: red"));
        assert!(!cleaned.contains("generated by"));
        assert!(!cleaned.contains("About"));
    }

    #[test]
    fn test_clean_html_prefers_main() {
        let html =
            r#"<html><body><div id="main"><p>Main text</p></div><p>Outside</p></body></html>"#;
        assert_eq!(clean_html(html), "<div id=\"main\"><p>Main text</p></div>");
    }

    #[test]
    fn test_clean_html_falls_back_to_body() {
        let html = "<html><body><p>Only body</p></body></html>";
        assert_eq!(clean_html(html), "<body><p>Only body</p></body>");
    }

    #[test]
    fn test_post_process_removes_site_ui() {
        let text = "Home > Archives > Vol 3\n\
                    You are logged in as\n\
                    jdoe\n\
                    Make font size smaller\n\
                    ## Vol 3\n\
                    \n\
                    \n\
                    \n\
                    *\n\
                    ----------\n\
                    Neural Control of Legged Robots\n";
        assert_eq!(
            post_process(text),
            "## Vol 3\n\n---\nNeural Control of Legged Robots"
        );
    }

    #[test]
    fn test_html_to_markdown_keeps_content() {
        let markdown = html_to_markdown(PAGE, "issue_3_2").unwrap();
        assert!(markdown.starts_with("# issue_3_2\n\n"));
        assert!(markdown.contains("Vol 3, No 2 (2013)"));
        assert!(markdown.contains("Neural Control of Legged Robots & Other Machines"));
        assert!(markdown.contains("Soft Grippers"));
        assert!(!markdown.contains("Sidebar links"));
        assert!(!markdown.contains("Home >"));
        assert!(!markdown.contains("tracker"));
    }

    #[test]
    fn test_convert_folder() {
        let dir = tempfile::tempdir().unwrap();
        let html_dir = dir.path().join("html_files");
        std::fs::create_dir(&html_dir).unwrap();
        std::fs::write(html_dir.join("issue_3_2.htm"), PAGE).unwrap();
        std::fs::write(html_dir.join("notes.txt"), "not a page").unwrap();
        let out_dir = dir.path().join("markdown_files");

        let summary = convert_folder(&html_dir, &out_dir).unwrap();
        assert_eq!(summary.files_found, 1);
        assert!(summary.failed.is_empty());
        assert_eq!(summary.converted[0].0, "issue_3_2.htm");

        let written = std::fs::read_to_string(out_dir.join("issue_3_2.md")).unwrap();
        assert!(written.starts_with("# issue_3_2"));
        assert!(written.contains("Neural Control of Legged Robots"));
    }

    #[test]
    fn test_convert_empty_folder_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = convert_folder(dir.path(), &dir.path().join("out"));
        assert!(matches!(result, Err(IngestError::NoDocuments(_))));
    }
}
