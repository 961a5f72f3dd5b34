pub mod backend;
pub mod config_file;
pub mod matcher;
pub mod models;
pub mod report;
pub mod similarity;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend};
pub use matcher::FuzzyMatcher;
pub use models::{
    CatalogRecord, ClaimConflict, DocumentEntry, MatchCandidate, MatchResult, MatchStrategy,
    ReconciliationOutcome, TitleIndex, UnmatchedReason, UnmatchedRecord,
};
pub use report::{AugmentedRecord, ReconciliationReport, ReconciliationSummary};

/// Default minimum confidence (0–100) for accepting a match.
pub const DEFAULT_THRESHOLD: u8 = 60;

/// Configuration for the fuzzy matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchConfig {
    /// Minimum winning score required to bind a record to a document.
    /// Values above 100 are clamped to 100.
    pub threshold: u8,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl MatchConfig {
    pub fn with_threshold(threshold: u8) -> Self {
        Self {
            threshold: threshold.min(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_threshold_is_sixty() {
        assert_eq!(MatchConfig::default().threshold, 60);
    }

    #[test]
    fn threshold_is_clamped() {
        assert_eq!(MatchConfig::with_threshold(250).threshold, 100);
        assert_eq!(MatchConfig::with_threshold(0).threshold, 0);
    }
}
