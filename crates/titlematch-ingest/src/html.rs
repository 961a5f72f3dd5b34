//! Catalog extraction from saved journal issue pages.
//!
//! Each page is an issue table of contents: a heading like
//! `Vol 3, No 2 (2013)` and one `table.tocArticle` per article.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use titlematch_core::CatalogRecord;

use crate::indexer::identifier_for;
use crate::{IngestError, list_files};

/// Titles shorter than this are navigation debris, not articles.
const MIN_TITLE_CHARS: usize = 5;

/// Volume, issue and year parsed from an issue heading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct IssueInfo {
    pub volume: Option<u32>,
    pub issue: Option<u32>,
    pub year: Option<u32>,
}

/// One article row of an issue page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlArticle {
    pub title: String,
    pub authors: String,
    pub pages: String,
}

/// What one issue page yielded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuePage {
    pub heading: Option<String>,
    pub issue: IssueInfo,
    pub articles: Vec<HtmlArticle>,
}

impl IssuePage {
    pub fn into_records(self) -> Vec<CatalogRecord> {
        let issue = self.issue;
        self.articles
            .into_iter()
            .map(|a| CatalogRecord {
                volume: issue.volume,
                issue: issue.issue,
                year: issue.year,
                title: a.title,
                authors: a.authors,
                pages: a.pages,
            })
            .collect()
    }
}

/// Collapse whitespace and decode entities left over as literal text.
pub fn clean_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .trim()
        .to_string()
}

fn element_text(el: ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<String>())
}

/// Parse `Vol N, No M (YYYY)`.
pub fn parse_issue_info(heading: &str) -> Option<IssueInfo> {
    static ISSUE_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"Vol\.?\s*(\d+),\s*No\.?\s*(\d+)\s*\((\d{4})\)").unwrap());

    let caps = ISSUE_RE.captures(heading)?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    Some(IssueInfo {
        volume: num(1),
        issue: num(2),
        year: num(3),
    })
}

/// The issue heading: first `h2` mentioning "Vol", else the page `<title>`
/// when it does, else the current breadcrumb link.
pub fn extract_issue_heading(document: &Html) -> Option<String> {
    let h2 = Selector::parse("h2").unwrap();
    let title = Selector::parse("title").unwrap();
    let breadcrumb = Selector::parse("#breadcrumb a.current").unwrap();

    document
        .select(&h2)
        .map(element_text)
        .find(|t| t.contains("Vol"))
        .or_else(|| {
            document
                .select(&title)
                .map(element_text)
                .find(|t| t.contains("Vol"))
        })
        .or_else(|| {
            document
                .select(&breadcrumb)
                .map(element_text)
                .find(|t| !t.is_empty())
        })
}

/// Every article of an issue page, in page order.
pub fn extract_articles(document: &Html) -> Vec<HtmlArticle> {
    let table = Selector::parse("table.tocArticle").unwrap();
    let title_cell = Selector::parse("td.tocTitle").unwrap();
    let link = Selector::parse("a").unwrap();
    let authors_cell = Selector::parse("td.tocAuthors").unwrap();
    let pages_cell = Selector::parse("td.tocPages").unwrap();

    let mut articles = Vec::new();
    for entry in document.select(&table) {
        let Some(cell) = entry.select(&title_cell).next() else {
            continue;
        };
        let title = cell
            .select(&link)
            .next()
            .map(element_text)
            .unwrap_or_else(|| element_text(cell));
        if title.chars().count() < MIN_TITLE_CHARS {
            continue;
        }

        let authors = entry
            .select(&authors_cell)
            .next()
            .map(element_text)
            .unwrap_or_default();
        let pages = entry
            .select(&pages_cell)
            .next()
            .map(element_text)
            .unwrap_or_default();

        articles.push(HtmlArticle {
            title,
            authors,
            pages,
        });
    }
    articles
}

/// Parse one issue page.
pub fn parse_issue_page(html: &str) -> IssuePage {
    let document = Html::parse_document(html);
    let heading = extract_issue_heading(&document);
    let issue = match heading.as_deref().map(|h| (h, parse_issue_info(h))) {
        Some((_, Some(info))) => info,
        Some((h, None)) => {
            tracing::warn!(heading = h, "could not parse issue heading");
            IssueInfo::default()
        }
        None => IssueInfo::default(),
    };
    IssuePage {
        heading,
        issue,
        articles: extract_articles(&document),
    }
}

/// Sort by (year, volume, issue); absent values sort last, ties keep their
/// order.
pub fn sort_records(records: &mut [CatalogRecord]) {
    records.sort_by_key(|r| {
        (
            r.year.is_none(),
            r.year,
            r.volume.is_none(),
            r.volume,
            r.issue.is_none(),
            r.issue,
        )
    });
}

/// Totals of an HTML extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HtmlSummary {
    pub files_processed: usize,
    pub files_without_articles: Vec<String>,
    pub articles: usize,
    pub years: BTreeSet<u32>,
    pub issues: BTreeSet<IssueInfo>,
    pub articles_per_year: BTreeMap<u32, usize>,
    pub articles_without_year: usize,
}

/// Catalog extracted from a folder of issue pages.
#[derive(Debug, Clone, Default)]
pub struct HtmlCatalog {
    pub records: Vec<CatalogRecord>,
    pub summary: HtmlSummary,
}

/// Extract the catalog of every `.htm`/`.html` page in `folder`, sorted by
/// (year, volume, issue).
///
/// A page that cannot be read or yields no articles is counted, not fatal.
pub fn extract_html_catalog(folder: &Path) -> Result<HtmlCatalog, IngestError> {
    let files = list_files(folder, &["htm".to_string(), "html".to_string()])?;
    if files.is_empty() {
        return Err(IngestError::NoDocuments(folder.to_path_buf()));
    }

    let mut catalog = HtmlCatalog::default();
    for path in &files {
        catalog.summary.files_processed += 1;
        let name = identifier_for(path);

        let html = match std::fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "cannot read issue page");
                catalog.summary.files_without_articles.push(name);
                continue;
            }
        };

        let page = parse_issue_page(&html);
        tracing::debug!(
            file = %name,
            heading = page.heading.as_deref().unwrap_or("-"),
            articles = page.articles.len(),
            "parsed issue page"
        );
        if page.articles.is_empty() {
            catalog.summary.files_without_articles.push(name);
            continue;
        }
        catalog.summary.issues.insert(page.issue);
        catalog.records.extend(page.into_records());
    }

    sort_records(&mut catalog.records);

    let summary = &mut catalog.summary;
    summary.articles = catalog.records.len();
    for record in &catalog.records {
        match record.year {
            Some(year) => {
                summary.years.insert(year);
                *summary.articles_per_year.entry(year).or_default() += 1;
            }
            None => summary.articles_without_year += 1,
        }
    }

    tracing::info!(
        files = summary.files_processed,
        articles = summary.articles,
        "html catalog extracted"
    );
    Ok(catalog)
}
