use std::io::Write;
use std::path::Path;

use owo_colors::OwoColorize;
use titlematch_core::report::format_confidence;
use titlematch_core::{ReconciliationReport, UnmatchedReason};
use titlematch_ingest::html::HtmlSummary;
use titlematch_ingest::{ConversionSummary, DocumentOutcome, IndexStats};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Shorten to `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        format!("{}...", s.chars().take(max).collect::<String>())
    } else {
        s.to_string()
    }
}

fn print_header(w: &mut dyn Write, title: &str, color: ColorMode) -> std::io::Result<()> {
    let sep = "=".repeat(60);
    writeln!(w)?;
    if color.enabled() {
        writeln!(w, "{}", sep.bold())?;
        writeln!(w, "{}", title.bold())?;
        writeln!(w, "{}", sep.bold())?;
    } else {
        writeln!(w, "{}", sep)?;
        writeln!(w, "{}", title)?;
        writeln!(w, "{}", sep)?;
    }
    Ok(())
}

/// One line per document of a dry run.
pub fn print_document_outcome(
    w: &mut dyn Write,
    identifier: &str,
    outcome: &DocumentOutcome,
    color: ColorMode,
) -> std::io::Result<()> {
    match outcome {
        DocumentOutcome::Indexed { title } => {
            if color.enabled() {
                writeln!(w, "{} {}", identifier.cyan(), title)?;
            } else {
                writeln!(w, "{} {}", identifier, title)?;
            }
        }
        DocumentOutcome::Skipped(reason) => {
            let msg = format!("(skipped: {})", reason);
            if color.enabled() {
                writeln!(w, "{} {}", identifier.cyan(), msg.yellow())?;
            } else {
                writeln!(w, "{} {}", identifier, msg)?;
            }
        }
    }
    Ok(())
}

/// Totals of an indexing run.
pub fn print_index_stats(
    w: &mut dyn Write,
    stats: &IndexStats,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(
        w,
        "Indexed {} of {} documents",
        stats.indexed, stats.discovered
    )?;
    if stats.skipped() > 0 {
        let msg = format!(
            "(Skipped {}: {} unreadable, {} without text, {} without title)",
            stats.skipped(),
            stats.read_failures,
            stats.empty_text,
            stats.no_title
        );
        if color.enabled() {
            writeln!(w, "{}", msg.dimmed())?;
        } else {
            writeln!(w, "{}", msg)?;
        }
    }
    Ok(())
}

/// Summary of an HTML catalog extraction.
pub fn print_html_summary(
    w: &mut dyn Write,
    summary: &HtmlSummary,
    output_file: &Path,
    color: ColorMode,
) -> std::io::Result<()> {
    print_header(w, "CATALOG EXTRACTION SUMMARY", color)?;
    writeln!(w, "  Files processed: {}", summary.files_processed)?;
    writeln!(w, "  Articles extracted: {}", summary.articles)?;
    writeln!(w, "  Unique years: {}", summary.years.len())?;
    writeln!(w, "  Unique issues: {}", summary.issues.len())?;

    if !summary.files_without_articles.is_empty() {
        let msg = format!(
            "Files without articles: {}",
            summary.files_without_articles.join(", ")
        );
        if color.enabled() {
            writeln!(w, "  {}", msg.yellow())?;
        } else {
            writeln!(w, "  {}", msg)?;
        }
    }

    if !summary.articles_per_year.is_empty() {
        writeln!(w)?;
        writeln!(w, "  Articles per year:")?;
        for (year, count) in &summary.articles_per_year {
            writeln!(w, "    {}: {}", year, count)?;
        }
        if summary.articles_without_year > 0 {
            writeln!(w, "    unknown: {}", summary.articles_without_year)?;
        }
    }

    writeln!(w)?;
    writeln!(w, "Catalog written to: {}", output_file.display())?;
    Ok(())
}

/// Summary of a markdown conversion.
pub fn print_conversion_summary(
    w: &mut dyn Write,
    summary: &ConversionSummary,
    output_dir: &Path,
    color: ColorMode,
) -> std::io::Result<()> {
    print_header(w, "MARKDOWN CONVERSION SUMMARY", color)?;
    writeln!(w, "  Pages found: {}", summary.files_found)?;
    let converted = format!("Converted: {}", summary.converted.len());
    if color.enabled() {
        writeln!(w, "  {}", converted.green())?;
    } else {
        writeln!(w, "  {}", converted)?;
    }
    if !summary.failed.is_empty() {
        writeln!(w, "  Failed: {}", summary.failed.len())?;
        for (name, error) in &summary.failed {
            let line = format!("{}: {}", name, error);
            if color.enabled() {
                writeln!(w, "    {}", line.yellow())?;
            } else {
                writeln!(w, "    {}", line)?;
            }
        }
    }

    writeln!(w)?;
    writeln!(w, "Markdown files saved in: {}", output_dir.display())?;
    Ok(())
}

/// The reconciliation report: totals, sample matches, unmatched titles and
/// conflicts.
pub fn print_match_report(
    w: &mut dyn Write,
    report: &ReconciliationReport<'_>,
    output_file: &Path,
    color: ColorMode,
) -> std::io::Result<()> {
    let summary = &report.summary;
    print_header(w, "MATCHING RESULTS SUMMARY", color)?;
    writeln!(w, "  Documents with titles: {}", summary.total_documents)?;
    writeln!(w, "  Catalog records: {}", summary.total_records)?;
    let matched = format!("Successful matches: {}", summary.matched);
    if color.enabled() {
        writeln!(w, "  {}", matched.green())?;
    } else {
        writeln!(w, "  {}", matched)?;
    }
    writeln!(w, "  Match rate: {:.1}%", summary.match_rate() * 100.0)?;
    if summary.conflicts > 0 {
        let msg = format!("Claim conflicts: {}", summary.conflicts);
        if color.enabled() {
            writeln!(w, "  {}", msg.yellow())?;
        } else {
            writeln!(w, "  {}", msg)?;
        }
    }
    writeln!(w, "  Unmatched documents: {}", summary.unmatched_documents)?;

    let matches = &report.outcome.matches;
    if !matches.is_empty() {
        writeln!(w)?;
        writeln!(w, "Sample successful matches:")?;
        for (i, m) in matches.iter().take(5).enumerate() {
            let catalog_title = report
                .rows
                .get(m.record_index)
                .map(|r| r.record.title.as_str())
                .unwrap_or_default();
            let head = format!(
                "{} ({}, {})",
                m.document_identifier,
                format_confidence(m.confidence),
                m.strategy
            );
            if color.enabled() {
                writeln!(w, "  {}. {}", i + 1, head.green())?;
            } else {
                writeln!(w, "  {}. {}", i + 1, head)?;
            }
            writeln!(w, "     Catalog:  {}", truncate(catalog_title, 60))?;
            writeln!(w, "     Document: {}", truncate(&m.matched_title, 60))?;
        }
    }

    let unmatched = &report.outcome.unmatched_records;
    if !unmatched.is_empty() {
        writeln!(w)?;
        writeln!(w, "First {} unmatched records:", unmatched.len().min(5))?;
        for (i, u) in unmatched.iter().take(5).enumerate() {
            let title = report
                .rows
                .get(u.record_index)
                .map(|r| r.record.title.trim())
                .unwrap_or_default();
            let title = if title.is_empty() {
                "(no title)".to_string()
            } else {
                truncate(title, 80)
            };
            let reason = describe_reason(&u.reason);
            if color.enabled() {
                writeln!(w, "  {}. {} {}", i + 1, title, reason.dimmed())?;
            } else {
                writeln!(w, "  {}. {} {}", i + 1, title, reason)?;
            }
        }
    }

    let conflicts = &report.outcome.conflicts;
    if !conflicts.is_empty() {
        writeln!(w)?;
        writeln!(w, "Claim conflicts:")?;
        for c in conflicts {
            let line = format!(
                "row {} wanted {} ({}), already claimed by row {}",
                c.record_index + 1,
                c.document_identifier,
                format_confidence(c.confidence),
                c.claimed_by + 1
            );
            if color.enabled() {
                writeln!(w, "  {}", line.yellow())?;
            } else {
                writeln!(w, "  {}", line)?;
            }
        }
    }

    writeln!(w)?;
    writeln!(w, "Output file created: {}", output_file.display())?;
    Ok(())
}

fn describe_reason(reason: &UnmatchedReason) -> String {
    match reason {
        UnmatchedReason::MissingTitle => "(missing title)".to_string(),
        UnmatchedReason::BelowThreshold { best_score } => {
            format!("(best score {})", format_confidence(*best_score))
        }
        UnmatchedReason::Conflict {
            document_identifier,
            claimed_by,
            ..
        } => format!("({} taken by row {})", document_identifier, claimed_by + 1),
        UnmatchedReason::NoCandidates => "(no documents)".to_string(),
    }
}
