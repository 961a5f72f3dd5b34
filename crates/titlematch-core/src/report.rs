use serde::Serialize;

use crate::models::{CatalogRecord, MatchResult, MatchStrategy, ReconciliationOutcome};

/// A catalog row with its match annotations attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AugmentedRecord<'a> {
    pub record_index: usize,
    pub record: &'a CatalogRecord,
    pub file_name: Option<&'a str>,
    pub match_confidence: Option<u8>,
    pub strategy: Option<MatchStrategy>,
}

impl AugmentedRecord<'_> {
    /// Output cell for the matched document, empty when unmatched.
    pub fn file_name_cell(&self) -> String {
        self.file_name.unwrap_or_default().to_string()
    }

    /// Output cell for the confidence, `"87%"` or empty when unmatched.
    pub fn confidence_cell(&self) -> String {
        self.match_confidence
            .map(format_confidence)
            .unwrap_or_default()
    }
}

/// Render a confidence as a percentage string.
pub fn format_confidence(confidence: u8) -> String {
    format!("{}%", confidence)
}

/// Summary counts of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconciliationSummary {
    pub total_documents: usize,
    pub total_records: usize,
    pub matched: usize,
    pub unmatched_records: usize,
    pub unmatched_documents: usize,
    pub conflicts: usize,
}

impl ReconciliationSummary {
    /// Matches over total records, in `0.0..=1.0` (0 for an empty catalog).
    pub fn match_rate(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            self.matched as f64 / self.total_records as f64
        }
    }
}

/// Attach match results to the catalog, preserving row order.
///
/// Pure function of its inputs: every record yields one row, matched rows carry
/// the document identifier and confidence.
pub fn augment<'a>(
    catalog: &'a [CatalogRecord],
    outcome: &'a ReconciliationOutcome,
) -> Vec<AugmentedRecord<'a>> {
    let mut by_record: Vec<Option<&MatchResult>> = vec![None; catalog.len()];
    for m in &outcome.matches {
        if let Some(slot) = by_record.get_mut(m.record_index) {
            *slot = Some(m);
        }
    }

    catalog
        .iter()
        .zip(by_record)
        .enumerate()
        .map(|(record_index, (record, m))| AugmentedRecord {
            record_index,
            record,
            file_name: m.map(|m| m.document_identifier.as_str()),
            match_confidence: m.map(|m| m.confidence),
            strategy: m.map(|m| m.strategy),
        })
        .collect()
}

/// Count the result sets of a run.
pub fn summarize(
    total_documents: usize,
    catalog: &[CatalogRecord],
    outcome: &ReconciliationOutcome,
) -> ReconciliationSummary {
    ReconciliationSummary {
        total_documents,
        total_records: catalog.len(),
        matched: outcome.matches.len(),
        unmatched_records: outcome.unmatched_records.len(),
        unmatched_documents: outcome.unmatched_documents.len(),
        conflicts: outcome.conflicts.len(),
    }
}

/// Full report: summary, augmented rows and the raw outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport<'a> {
    pub summary: ReconciliationSummary,
    pub rows: Vec<AugmentedRecord<'a>>,
    pub outcome: &'a ReconciliationOutcome,
}

impl<'a> ReconciliationReport<'a> {
    pub fn build(
        total_documents: usize,
        catalog: &'a [CatalogRecord],
        outcome: &'a ReconciliationOutcome,
    ) -> Self {
        Self {
            summary: summarize(total_documents, catalog, outcome),
            rows: augment(catalog, outcome),
            outcome,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{UnmatchedReason, UnmatchedRecord};

    fn sample() -> (Vec<CatalogRecord>, ReconciliationOutcome) {
        let catalog = vec![
            CatalogRecord::with_title("First"),
            CatalogRecord::with_title("Second"),
            CatalogRecord::with_title("Third"),
        ];
        let outcome = ReconciliationOutcome {
            matches: vec![MatchResult {
                record_index: 2,
                document_identifier: "third.pdf".into(),
                matched_title: "Third".into(),
                confidence: 87,
                strategy: MatchStrategy::Partial,
            }],
            unmatched_records: vec![
                UnmatchedRecord {
                    record_index: 0,
                    reason: UnmatchedReason::BelowThreshold { best_score: 12 },
                },
                UnmatchedRecord {
                    record_index: 1,
                    reason: UnmatchedReason::MissingTitle,
                },
            ],
            unmatched_documents: ["orphan.pdf".to_string()].into_iter().collect(),
            conflicts: vec![],
        };
        (catalog, outcome)
    }

    #[test]
    fn test_augment_preserves_order_and_annotates() {
        let (catalog, outcome) = sample();
        let rows = augment(&catalog, &outcome);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].record.title, "First");
        assert_eq!(rows[0].file_name_cell(), "");
        assert_eq!(rows[0].confidence_cell(), "");
        assert_eq!(rows[2].file_name_cell(), "third.pdf");
        assert_eq!(rows[2].confidence_cell(), "87%");
        assert_eq!(rows[2].strategy, Some(MatchStrategy::Partial));
    }

    #[test]
    fn test_augment_is_pure() {
        let (catalog, outcome) = sample();
        assert_eq!(augment(&catalog, &outcome), augment(&catalog, &outcome));
    }

    #[test]
    fn test_summary_counts() {
        let (catalog, outcome) = sample();
        let summary = summarize(2, &catalog, &outcome);
        assert_eq!(summary.total_documents, 2);
        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.unmatched_records, 2);
        assert_eq!(summary.unmatched_documents, 1);
        assert!((summary.match_rate() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_match_rate_empty_catalog() {
        assert_eq!(ReconciliationSummary::default().match_rate(), 0.0);
    }

    #[test]
    fn test_report_serializes() {
        let (catalog, outcome) = sample();
        let json = ReconciliationReport::build(2, &catalog, &outcome)
            .to_json_pretty()
            .unwrap();
        assert!(json.contains("\"third.pdf\""));
        assert!(json.contains("\"below_threshold\""));
    }
}
