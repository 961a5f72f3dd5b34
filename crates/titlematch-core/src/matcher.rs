use std::collections::HashMap;

use crate::MatchConfig;
use crate::models::{
    CatalogRecord, ClaimConflict, MatchCandidate, MatchResult, MatchStrategy,
    ReconciliationOutcome, TitleIndex, UnmatchedReason, UnmatchedRecord,
};
use crate::similarity::{self, PreparedTitle};

/// A document title preprocessed for scoring.
#[derive(Debug, Clone)]
struct PreparedDocument<'a> {
    identifier: &'a str,
    title: &'a str,
    prepared: PreparedTitle,
}

/// The title index, preprocessed once per run.
#[derive(Debug, Clone)]
pub struct PreparedIndex<'a> {
    documents: Vec<PreparedDocument<'a>>,
}

impl<'a> PreparedIndex<'a> {
    pub fn new(index: &'a TitleIndex) -> Self {
        let documents = index
            .iter()
            .map(|(identifier, title)| PreparedDocument {
                identifier,
                title,
                prepared: PreparedTitle::new(title),
            })
            .collect();
        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Multi-strategy fuzzy matcher binding catalog records to documents.
///
/// Matching is record-greedy: records are processed in catalog order and the
/// first record whose best document clears the threshold claims it. A later
/// record whose best document is already claimed is left unmatched and
/// reported as a [`ClaimConflict`], even if its own score is higher. There is
/// no re-assignment and no global (bipartite) optimization.
#[derive(Debug, Clone, Default)]
pub struct FuzzyMatcher {
    config: MatchConfig,
}

impl FuzzyMatcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Best document per strategy for one title, searching the whole index
    /// independently for each strategy. Within a strategy the first maximal
    /// document in identifier order wins. Empty when the index is empty.
    pub fn best_candidates(&self, title: &str, index: &PreparedIndex<'_>) -> Vec<MatchCandidate> {
        let query = PreparedTitle::new(title);

        MatchStrategy::ALL
            .iter()
            .filter_map(|&strategy| {
                let mut best: Option<(u8, &PreparedDocument<'_>)> = None;
                for doc in &index.documents {
                    let score = similarity::score(strategy, &query, &doc.prepared);
                    if best.is_none_or(|(best_score, _)| score > best_score) {
                        best = Some((score, doc));
                    }
                }
                best.map(|(score, doc)| MatchCandidate {
                    strategy,
                    document_identifier: doc.identifier.to_string(),
                    candidate_title: doc.title.to_string(),
                    score,
                })
            })
            .collect()
    }

    /// Overall best candidate across strategies; ties go to the earlier
    /// strategy (token-sort, then partial, then token-set).
    pub fn best_candidate(&self, title: &str, index: &PreparedIndex<'_>) -> Option<MatchCandidate> {
        let mut best: Option<MatchCandidate> = None;
        for candidate in self.best_candidates(title, index) {
            if best.as_ref().is_none_or(|b| candidate.score > b.score) {
                best = Some(candidate);
            }
        }
        best
    }

    /// Reconcile the whole catalog against the title index.
    pub fn reconcile(
        &self,
        index: &TitleIndex,
        catalog: &[CatalogRecord],
    ) -> ReconciliationOutcome {
        let prepared = PreparedIndex::new(index);
        let mut outcome = ReconciliationOutcome::default();
        let mut claimed: HashMap<String, usize> = HashMap::new();

        for (record_index, record) in catalog.iter().enumerate() {
            let Some(title) = record.usable_title() else {
                tracing::debug!(record_index, "skipping record without title");
                outcome.unmatched_records.push(UnmatchedRecord {
                    record_index,
                    reason: UnmatchedReason::MissingTitle,
                });
                continue;
            };

            let Some(best) = self.best_candidate(title, &prepared) else {
                outcome.unmatched_records.push(UnmatchedRecord {
                    record_index,
                    reason: UnmatchedReason::NoCandidates,
                });
                continue;
            };

            if best.score < self.config.threshold {
                tracing::debug!(
                    record_index,
                    title,
                    best_score = best.score,
                    threshold = self.config.threshold,
                    "below threshold"
                );
                outcome.unmatched_records.push(UnmatchedRecord {
                    record_index,
                    reason: UnmatchedReason::BelowThreshold {
                        best_score: best.score,
                    },
                });
                continue;
            }

            if let Some(&claimed_by) = claimed.get(&best.document_identifier) {
                tracing::warn!(
                    record_index,
                    claimed_by,
                    document = %best.document_identifier,
                    confidence = best.score,
                    "document already claimed by an earlier record"
                );
                outcome.conflicts.push(ClaimConflict {
                    record_index,
                    document_identifier: best.document_identifier.clone(),
                    claimed_by,
                    confidence: best.score,
                    strategy: best.strategy,
                });
                outcome.unmatched_records.push(UnmatchedRecord {
                    record_index,
                    reason: UnmatchedReason::Conflict {
                        document_identifier: best.document_identifier,
                        claimed_by,
                        confidence: best.score,
                    },
                });
                continue;
            }

            tracing::debug!(
                record_index,
                document = %best.document_identifier,
                confidence = best.score,
                strategy = %best.strategy,
                "matched"
            );
            claimed.insert(best.document_identifier.clone(), record_index);
            outcome.matches.push(MatchResult {
                record_index,
                document_identifier: best.document_identifier,
                matched_title: best.candidate_title,
                confidence: best.score,
                strategy: best.strategy,
            });
        }

        outcome.unmatched_documents = index
            .identifiers()
            .filter(|id| !claimed.contains_key(*id))
            .map(str::to_string)
            .collect();

        tracing::info!(
            records = catalog.len(),
            documents = index.len(),
            matched = outcome.matches.len(),
            conflicts = outcome.conflicts.len(),
            "reconciliation complete"
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(pairs: &[(&str, &str)]) -> TitleIndex {
        pairs.iter().copied().collect()
    }

    fn catalog(titles: &[&str]) -> Vec<CatalogRecord> {
        titles.iter().map(|t| CatalogRecord::with_title(*t)).collect()
    }

    #[test]
    fn test_reference_example() {
        let idx = index(&[
            ("doc1.pdf", "Neural Control of Legged Robots"),
            ("doc2.pdf", "soft grippers study"),
        ]);
        let cat = catalog(&["Neural Control of Legged Robots", "A Study on Soft Grippers"]);
        let outcome = FuzzyMatcher::default().reconcile(&idx, &cat);

        assert_eq!(outcome.matches.len(), 2);
        let first = &outcome.matches[0];
        assert_eq!(first.record_index, 0);
        assert_eq!(first.document_identifier, "doc1.pdf");
        assert_eq!(first.confidence, 100);
        assert_eq!(first.strategy, MatchStrategy::TokenSort);

        let second = &outcome.matches[1];
        assert_eq!(second.record_index, 1);
        assert_eq!(second.document_identifier, "doc2.pdf");
        assert_eq!(second.strategy, MatchStrategy::TokenSet);
        assert!(second.confidence >= 60);

        assert!(outcome.unmatched_records.is_empty());
        assert!(outcome.unmatched_documents.is_empty());
        assert!(outcome.conflicts.is_empty());
    }

    #[test]
    fn test_strategy_tie_prefers_token_sort() {
        let idx = index(&[("a.pdf", "Vision Based Grasping")]);
        let prepared = PreparedIndex::new(&idx);
        let best = FuzzyMatcher::default()
            .best_candidate("Vision Based Grasping", &prepared)
            .unwrap();
        assert_eq!(best.score, 100);
        assert_eq!(best.strategy, MatchStrategy::TokenSort);
    }

    #[test]
    fn test_document_tie_prefers_first_identifier() {
        let idx = index(&[("b.pdf", "Same Title Here"), ("a.pdf", "Same Title Here")]);
        let prepared = PreparedIndex::new(&idx);
        let candidates = FuzzyMatcher::default().best_candidates("Same Title Here", &prepared);
        assert_eq!(candidates.len(), 3);
        assert!(candidates.iter().all(|c| c.document_identifier == "a.pdf"));
    }

    #[test]
    fn test_missing_title_is_unmatched() {
        let idx = index(&[("a.pdf", "Neural Control of Legged Robots")]);
        let cat = catalog(&["   "]);
        let outcome = FuzzyMatcher::default().reconcile(&idx, &cat);
        assert!(outcome.matches.is_empty());
        assert_eq!(
            outcome.unmatched_records,
            vec![UnmatchedRecord {
                record_index: 0,
                reason: UnmatchedReason::MissingTitle
            }]
        );
        assert!(outcome.unmatched_documents.contains("a.pdf"));
    }

    #[test]
    fn test_below_threshold_is_unmatched() {
        let idx = index(&[("a.pdf", "Thermal Analysis of Printed Circuit Boards")]);
        let cat = catalog(&["Neural Control of Legged Robots"]);
        let outcome = FuzzyMatcher::default().reconcile(&idx, &cat);
        assert!(outcome.matches.is_empty());
        assert!(matches!(
            outcome.unmatched_records[0].reason,
            UnmatchedReason::BelowThreshold { best_score } if best_score < 60
        ));
    }

    #[test]
    fn test_empty_index_reports_no_candidates() {
        let outcome = FuzzyMatcher::default().reconcile(&TitleIndex::new(), &catalog(&["Title"]));
        assert_eq!(
            outcome.unmatched_records[0].reason,
            UnmatchedReason::NoCandidates
        );
    }

    #[test]
    fn test_earlier_record_claims_document() {
        // Record 1 is the exact title but record 0 comes first and claims it.
        let idx = index(&[("a.pdf", "Neural Control of Legged Robots")]);
        let cat = catalog(&[
            "Neural Control of Legged Robot Swarms",
            "Neural Control of Legged Robots",
        ]);
        let outcome = FuzzyMatcher::default().reconcile(&idx, &cat);

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].record_index, 0);
        assert_eq!(outcome.conflicts.len(), 1);
        let conflict = &outcome.conflicts[0];
        assert_eq!(conflict.record_index, 1);
        assert_eq!(conflict.claimed_by, 0);
        assert_eq!(conflict.confidence, 100);
        assert_eq!(outcome.unmatched_record_indices().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_threshold_zero_accepts_anything() {
        let idx = index(&[("a.pdf", "Thermal Analysis of Printed Circuit Boards")]);
        let cat = catalog(&["Neural Control of Legged Robots"]);
        let outcome = FuzzyMatcher::new(MatchConfig::with_threshold(0)).reconcile(&idx, &cat);
        assert_eq!(outcome.matches.len(), 1);
    }
}
