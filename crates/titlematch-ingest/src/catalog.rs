//! Catalog tables on disk.
//!
//! The reconciliation catalog is read from CSV with columns resolved by
//! header name. The original headers and cells are kept verbatim so the
//! augmented output only ever adds the two match columns.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use titlematch_core::{AugmentedRecord, CatalogRecord};

use crate::IngestError;

pub const FILE_NAME_COLUMN: &str = "File Name";
pub const MATCH_CONFIDENCE_COLUMN: &str = "Match Confidence";

/// Headers written for a catalog extracted from HTML issue pages.
pub const CATALOG_HEADERS: [&str; 6] = ["Vol", "No", "Year", "Article", "Author", "Pages"];

const TITLE_ALIASES: &[&str] = &["article", "title"];
const AUTHOR_ALIASES: &[&str] = &["author", "authors"];
const PAGES_ALIASES: &[&str] = &["pages"];
const VOLUME_ALIASES: &[&str] = &["vol", "volume"];
const ISSUE_ALIASES: &[&str] = &["no", "issue", "number"];
const YEAR_ALIASES: &[&str] = &["year"];

/// Column positions of the fields the matcher cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub title: usize,
    pub authors: Option<usize>,
    pub pages: Option<usize>,
    pub volume: Option<usize>,
    pub issue: Option<usize>,
    pub year: Option<usize>,
}

impl ColumnMap {
    /// Resolve columns by case-insensitive header name. Only the title
    /// column is required.
    pub fn resolve(headers: &[String]) -> Result<Self, IngestError> {
        let find = |aliases: &[&str]| {
            headers
                .iter()
                .position(|h| aliases.iter().any(|a| h.trim().eq_ignore_ascii_case(a)))
        };
        let title =
            find(TITLE_ALIASES).ok_or_else(|| IngestError::MissingColumn("Article".into()))?;
        Ok(Self {
            title,
            authors: find(AUTHOR_ALIASES),
            pages: find(PAGES_ALIASES),
            volume: find(VOLUME_ALIASES),
            issue: find(ISSUE_ALIASES),
            year: find(YEAR_ALIASES),
        })
    }
}

/// A catalog as read from disk: verbatim table plus typed records.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogTable {
    pub headers: Vec<String>,
    /// Raw cells, each row padded to the header width.
    pub rows: Vec<Vec<String>>,
    /// One record per row, same order.
    pub records: Vec<CatalogRecord>,
    pub columns: ColumnMap,
}

impl CatalogTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse a numeric cell. Spreadsheet exports write `3.0` for integers.
fn parse_number(cell: &str) -> Option<u32> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse::<u32>().ok().or_else(|| {
        cell.parse::<f64>()
            .ok()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64)
            .map(|f| f as u32)
    })
}

fn cell<'r>(row: &'r [String], column: Option<usize>) -> &'r str {
    column.and_then(|i| row.get(i)).map(String::as_str).unwrap_or("")
}

/// Read a catalog from any CSV source.
pub fn read_catalog_from_reader<R: Read>(reader: R) -> Result<CatalogTable, IngestError> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv.headers()?.iter().map(str::to_string).collect();
    let columns = ColumnMap::resolve(&headers)?;

    let mut rows = Vec::new();
    let mut records = Vec::new();
    for result in csv.records() {
        let record = result?;
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        if row.len() < headers.len() {
            row.resize(headers.len(), String::new());
        }

        records.push(CatalogRecord {
            volume: parse_number(cell(&row, columns.volume)),
            issue: parse_number(cell(&row, columns.issue)),
            year: parse_number(cell(&row, columns.year)),
            title: cell(&row, Some(columns.title)).trim().to_string(),
            authors: cell(&row, columns.authors).trim().to_string(),
            pages: cell(&row, columns.pages).trim().to_string(),
        });
        rows.push(row);
    }

    Ok(CatalogTable {
        headers,
        rows,
        records,
        columns,
    })
}

/// Read a catalog CSV file; an empty catalog is an error.
pub fn read_catalog(path: &Path) -> Result<CatalogTable, IngestError> {
    let file = std::fs::File::open(path)?;
    let table = read_catalog_from_reader(file)?;
    if table.is_empty() {
        return Err(IngestError::EmptyCatalog(path.to_path_buf()));
    }
    tracing::debug!(path = %path.display(), records = table.len(), "catalog loaded");
    Ok(table)
}

/// `<output_dir>/<catalog stem>_with_filenames.csv`
pub fn augmented_output_path(catalog_path: &Path, output_dir: &Path) -> PathBuf {
    let stem = catalog_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "catalog".to_string());
    output_dir.join(format!("{}_with_filenames.csv", stem))
}

/// Write the catalog with `File Name` and `Match Confidence` filled in.
///
/// Existing columns of those names (from an earlier run) are overwritten in
/// place; otherwise the two columns are appended.
pub fn write_augmented_to<W: Write>(
    writer: W,
    table: &CatalogTable,
    rows: &[AugmentedRecord<'_>],
) -> Result<(), IngestError> {
    let mut headers = table.headers.clone();
    let mut column = |name: &str| match headers.iter().position(|h| h.trim() == name) {
        Some(i) => i,
        None => {
            headers.push(name.to_string());
            headers.len() - 1
        }
    };
    let file_col = column(FILE_NAME_COLUMN);
    let confidence_col = column(MATCH_CONFIDENCE_COLUMN);

    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(&headers)?;

    for (raw, augmented) in table.rows.iter().zip(rows) {
        let mut out = raw.clone();
        out.resize(headers.len(), String::new());
        out[file_col] = augmented.file_name_cell();
        out[confidence_col] = augmented.confidence_cell();
        wtr.write_record(&out)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the augmented catalog to `path`, creating its directory.
pub fn write_augmented_catalog(
    path: &Path,
    table: &CatalogTable,
    rows: &[AugmentedRecord<'_>],
) -> Result<(), IngestError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_augmented_to(file, table, rows)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "augmented catalog written");
    Ok(())
}

fn number_cell(n: Option<u32>) -> String {
    n.map(|n| n.to_string()).unwrap_or_default()
}

/// Write records with the [`CATALOG_HEADERS`] layout.
///
/// With `group_years`, the year is only printed on the first row of each run
/// of equal years.
pub fn write_catalog_to<W: Write>(
    writer: W,
    records: &[CatalogRecord],
    group_years: bool,
) -> Result<(), IngestError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(CATALOG_HEADERS)?;

    let mut previous_year: Option<Option<u32>> = None;
    for record in records {
        let year = if group_years && previous_year == Some(record.year) {
            String::new()
        } else {
            number_cell(record.year)
        };
        previous_year = Some(record.year);

        wtr.write_record([
            number_cell(record.volume),
            number_cell(record.issue),
            year,
            record.title.clone(),
            record.authors.clone(),
            record.pages.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write records to a CSV file, creating its directory.
pub fn write_catalog(
    path: &Path,
    records: &[CatalogRecord],
    group_years: bool,
) -> Result<(), IngestError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_catalog_to(file, records, group_years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use titlematch_core::{MatchResult, MatchStrategy, ReconciliationOutcome, report::augment};

    const CSV: &str = "Vol,No,Year,Article,Author,Pages\n\
                       1,1,2013,Neural Control of Legged Robots,J. Smith,1-8\n\
                       1,2.0,2013,A Study on Soft Grippers,A. Lee,9-15\n\
                       ,,,,,\n";

    #[test]
    fn test_read_resolves_columns_and_types() {
        let table = read_catalog_from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.columns.title, 3);
        let second = &table.records[1];
        assert_eq!(second.volume, Some(1));
        assert_eq!(second.issue, Some(2));
        assert_eq!(second.year, Some(2013));
        assert_eq!(second.authors, "A. Lee");
        assert_eq!(second.pages, "9-15");
        assert!(table.records[2].usable_title().is_none());
        assert!(table.records[2].year.is_none());
    }

    #[test]
    fn test_header_aliases_case_insensitive() {
        let csv = "TITLE,authors,Volume,Issue,YEAR\nSoft Grippers,A. Lee,2,3,2015\n";
        let table = read_catalog_from_reader(csv.as_bytes()).unwrap();
        let r = &table.records[0];
        assert_eq!(r.title, "Soft Grippers");
        assert_eq!(r.authors, "A. Lee");
        assert_eq!((r.volume, r.issue, r.year), (Some(2), Some(3), Some(2015)));
        assert!(table.columns.pages.is_none());
    }

    #[test]
    fn test_missing_title_column() {
        let err = read_catalog_from_reader("Vol,No\n1,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn(_)));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table =
            read_catalog_from_reader("Article,Author,Pages\nOnly Title\n".as_bytes()).unwrap();
        assert_eq!(table.rows[0].len(), 3);
        assert_eq!(table.records[0].authors, "");
    }

    #[test]
    fn test_read_catalog_empty_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "Article,Author\n").unwrap();
        assert!(matches!(read_catalog(&path), Err(IngestError::EmptyCatalog(_))));
    }

    #[test]
    fn test_write_augmented_appends_columns() {
        let table = read_catalog_from_reader(CSV.as_bytes()).unwrap();
        let outcome = ReconciliationOutcome {
            matches: vec![MatchResult {
                record_index: 0,
                document_identifier: "2013_01.pdf".into(),
                matched_title: "Neural Control of Legged Robots".into(),
                confidence: 87,
                strategy: MatchStrategy::TokenSort,
            }],
            ..Default::default()
        };
        let rows = augment(&table.records, &outcome);

        let mut out = Vec::new();
        write_augmented_to(&mut out, &table, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Vol,No,Year,Article,Author,Pages,File Name,Match Confidence");
        assert_eq!(
            lines[1],
            "1,1,2013,Neural Control of Legged Robots,J. Smith,1-8,2013_01.pdf,87%"
        );
        assert_eq!(lines[2], "1,2.0,2013,A Study on Soft Grippers,A. Lee,9-15,,");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_write_augmented_overwrites_previous_run() {
        let csv = "Article,File Name,Match Confidence\nSoft Grippers,old.pdf,50%\n";
        let table = read_catalog_from_reader(csv.as_bytes()).unwrap();
        let outcome = ReconciliationOutcome::default();
        let rows = augment(&table.records, &outcome);

        let mut out = Vec::new();
        write_augmented_to(&mut out, &table, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Article,File Name,Match Confidence\nSoft Grippers,,\n");
    }

    #[test]
    fn test_augmented_output_path() {
        assert_eq!(
            augmented_output_path(Path::new("data/articles.csv"), Path::new("output-files")),
            PathBuf::from("output-files/articles_with_filenames.csv")
        );
    }

    #[test]
    fn test_write_catalog_group_years() {
        let mk = |year, title: &str| CatalogRecord {
            volume: Some(1),
            issue: Some(1),
            year,
            title: title.to_string(),
            ..Default::default()
        };
        let records = vec![
            mk(Some(2013), "One"),
            mk(Some(2013), "Two"),
            mk(Some(2014), "Three"),
            mk(None, "Four"),
        ];

        let mut grouped = Vec::new();
        write_catalog_to(&mut grouped, &records, true).unwrap();
        let grouped = String::from_utf8(grouped).unwrap();
        let lines: Vec<&str> = grouped.lines().collect();
        assert_eq!(lines[0], "Vol,No,Year,Article,Author,Pages");
        assert_eq!(lines[1], "1,1,2013,One,,");
        assert_eq!(lines[2], "1,1,,Two,,");
        assert_eq!(lines[3], "1,1,2014,Three,,");
        assert_eq!(lines[4], "1,1,,Four,,");

        let mut plain = Vec::new();
        write_catalog_to(&mut plain, &records, false).unwrap();
        assert!(String::from_utf8(plain).unwrap().contains("1,1,2013,Two,,"));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 12 "), Some(12));
        assert_eq!(parse_number("3.0"), Some(3));
        assert_eq!(parse_number("3.5"), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number(""), None);
    }
}
