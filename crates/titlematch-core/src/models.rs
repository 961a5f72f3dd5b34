use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// One bibliographic entry of the catalog (a table row).
///
/// Records are identified by their position in the catalog; the title is the
/// join key used for matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogRecord {
    pub volume: Option<u32>,
    pub issue: Option<u32>,
    pub year: Option<u32>,
    pub title: String,
    pub authors: String,
    pub pages: String,
}

impl CatalogRecord {
    /// Convenience constructor for a record that only carries a title.
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// The trimmed title, or `None` when the row has no usable title.
    pub fn usable_title(&self) -> Option<&str> {
        let t = self.title.trim();
        if t.is_empty() { None } else { Some(t) }
    }
}

/// A document seen by the corpus indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    /// Stable identifier, the file name.
    pub identifier: String,
    /// Raw text of the leading pages.
    pub raw_text: String,
    /// Best-guess title, absent when no line met the title heuristics.
    pub extracted_title: Option<String>,
}

/// Mapping from document identifier to extracted title.
///
/// Iteration is in lexical identifier order, which makes "first best"
/// tie-breaking in the matcher independent of directory listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TitleIndex {
    titles: BTreeMap<String, String>,
}

impl TitleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from indexer entries, keeping only those with a title.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a DocumentEntry>) -> Self {
        let titles = entries
            .into_iter()
            .filter_map(|e| {
                e.extracted_title
                    .as_ref()
                    .map(|t| (e.identifier.clone(), t.clone()))
            })
            .collect();
        Self { titles }
    }

    pub fn insert(&mut self, identifier: impl Into<String>, title: impl Into<String>) {
        self.titles.insert(identifier.into(), title.into());
    }

    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.titles.get(identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.titles.keys().map(String::as_str)
    }

    /// `(identifier, title)` pairs in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.titles.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TitleIndex {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            titles: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Similarity strategy. Declaration order is the tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    TokenSort,
    Partial,
    TokenSet,
}

impl MatchStrategy {
    /// All strategies in tie-break order.
    pub const ALL: [MatchStrategy; 3] = [
        MatchStrategy::TokenSort,
        MatchStrategy::Partial,
        MatchStrategy::TokenSet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::TokenSort => "token_sort",
            MatchStrategy::Partial => "partial",
            MatchStrategy::TokenSet => "token_set",
        }
    }
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best document for one (record, strategy) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate {
    pub strategy: MatchStrategy,
    pub document_identifier: String,
    pub candidate_title: String,
    pub score: u8,
}

/// An accepted binding of a catalog record to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub record_index: usize,
    pub document_identifier: String,
    pub matched_title: String,
    pub confidence: u8,
    pub strategy: MatchStrategy,
}

/// Why a catalog record ended up without a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnmatchedReason {
    /// The record has no usable title.
    MissingTitle,
    /// The best score over all strategies was under the threshold.
    BelowThreshold { best_score: u8 },
    /// The best document had already been claimed by an earlier record.
    Conflict {
        document_identifier: String,
        claimed_by: usize,
        confidence: u8,
    },
    /// The title index was empty.
    NoCandidates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedRecord {
    pub record_index: usize,
    pub reason: UnmatchedReason,
}

/// A record whose best document was taken by an earlier record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimConflict {
    pub record_index: usize,
    pub document_identifier: String,
    pub claimed_by: usize,
    pub confidence: u8,
    pub strategy: MatchStrategy,
}

/// The three disjoint result sets of a reconciliation run.
///
/// Every record index is in exactly one of `matches` / `unmatched_records`;
/// every indexed document is in exactly one of `matches` / `unmatched_documents`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationOutcome {
    pub matches: Vec<MatchResult>,
    pub unmatched_records: Vec<UnmatchedRecord>,
    pub unmatched_documents: BTreeSet<String>,
    pub conflicts: Vec<ClaimConflict>,
}

impl ReconciliationOutcome {
    pub fn unmatched_record_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.unmatched_records.iter().map(|u| u.record_index)
    }

    pub fn match_for_record(&self, record_index: usize) -> Option<&MatchResult> {
        self.matches.iter().find(|m| m.record_index == record_index)
    }
}
