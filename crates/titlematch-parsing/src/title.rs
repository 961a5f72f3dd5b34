use once_cell::sync::Lazy;

use crate::config::TitleConfig;
use crate::heuristics::Heuristics;
use crate::text_processing::{char_len, clean_full_title, clean_title_line, expand_ligatures};

/// Best-guess title extraction over layout-stripped text.
///
/// Pipeline:
/// 1. Split into trimmed, non-empty lines
/// 2. Find where the title starts (after boilerplate and article-type labels)
/// 3. Collect up to `max_fragments` lines, stopping at the abstract block,
///    an author line, or a line ending in terminal punctuation
/// 4. Fall back to the longest plausible line near the top
///
/// Deterministic for a given input and configuration.
#[derive(Debug, Clone)]
pub struct TitleExtractor {
    config: TitleConfig,
    heuristics: Heuristics,
}

impl Default for TitleExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TitleExtractor {
    pub fn new() -> Self {
        Self::with_config(TitleConfig::default())
    }

    pub fn with_config(config: TitleConfig) -> Self {
        let heuristics = Heuristics::from_config(&config);
        Self { config, heuristics }
    }

    pub fn config(&self) -> &TitleConfig {
        &self.config
    }

    pub fn heuristics(&self) -> &Heuristics {
        &self.heuristics
    }

    /// Extract the title, or `None` when no line qualifies.
    pub fn extract(&self, text: &str) -> Option<String> {
        let text = expand_ligatures(text);
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if lines.is_empty() {
            return None;
        }

        let start = self.find_title_start(&lines);
        self.collect_title(lines.get(start..).unwrap_or_default())
            .or_else(|| self.longest_line_fallback(&lines))
    }

    /// Index of the first title line within the scan window, 0 when nothing
    /// stands out.
    pub fn find_title_start(&self, lines: &[&str]) -> usize {
        for (i, line) in lines.iter().take(self.config.scan_window).enumerate() {
            if self.heuristics.is_boilerplate_header(line) {
                continue;
            }
            if self.heuristics.is_section_label(line) {
                return i + 1;
            }
            if char_len(line) > self.config.min_start_len && i < self.config.early_line_window {
                return i;
            }
        }
        0
    }

    fn collect_title(&self, lines: &[&str]) -> Option<String> {
        let mut fragments: Vec<String> = Vec::new();

        for line in lines.iter().take(self.config.max_fragments) {
            let cleaned = clean_title_line(line, &self.heuristics);
            if cleaned.is_empty() {
                continue;
            }
            if self.heuristics.is_end_marker(&cleaned) || self.heuristics.is_author_line(&cleaned) {
                break;
            }
            let complete = cleaned.ends_with(['.', '?', '!']);
            fragments.push(cleaned);
            if complete {
                break;
            }
        }

        if fragments.is_empty() {
            return None;
        }
        let title = clean_full_title(&fragments.join(" "));
        let (min, max) = self.config.title_len_bounds;
        let len = char_len(&title);
        (len > min && len < max).then_some(title)
    }

    fn longest_line_fallback(&self, lines: &[&str]) -> Option<String> {
        let (min, max) = self.config.fallback_len_bounds;
        let mut best: Option<(usize, String)> = None;

        for line in lines.iter().take(self.config.fallback_window) {
            let cleaned = clean_title_line(line, &self.heuristics);
            let len = char_len(&cleaned);
            if len > min && len < max && best.as_ref().is_none_or(|(best_len, _)| len > *best_len) {
                best = Some((len, cleaned));
            }
        }

        best.map(|(_, line)| clean_full_title(&line))
    }
}

/// Extract a title with the default heuristics.
pub fn extract_title(text: &str) -> Option<String> {
    static DEFAULT: Lazy<TitleExtractor> = Lazy::new(TitleExtractor::new);
    DEFAULT.extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TitleConfigBuilder;

    #[test]
    fn test_label_skip_and_author_stop() {
        let text = "Vol. 3, No. 2\nOriginal Article\nA Study of Fuzzy Reconciliation Systems\n\
            John Smith, MIT\nAbstract: ...";
        assert_eq!(
            extract_title(text),
            Some("Study of Fuzzy Reconciliation Systems".to_string())
        );
    }

    #[test]
    fn test_only_short_noise_lines_is_none() {
        assert_eq!(extract_title("Vol. 1\nNo. 2\n12\nPage 3"), None);
    }

    #[test]
    fn test_short_plain_lines_are_joined() {
        // No line exceeds 15 characters, yet the joined fragments pass the
        // title length check before the fallback is consulted.
        assert_eq!(
            extract_title("Short line\nAnother one\nThird"),
            Some("Short line Another one Third".to_string())
        );
    }

    #[test]
    fn test_empty_text_is_none() {
        assert_eq!(extract_title(""), None);
        assert_eq!(extract_title(" \n\t\n  "), None);
    }

    #[test]
    fn test_first_long_line_starts_title() {
        let text = "ISSN 2223-9766\nAdaptive Impedance Control of Robotic Manipulators\nJANE DOE\n\
            Abstract";
        assert_eq!(
            extract_title(text),
            Some("Adaptive Impedance Control of Robotic Manipulators".to_string())
        );
    }

    #[test]
    fn test_multi_line_title_joined() {
        let text = "Original Article\nDesign and Implementation of a\nCable-Driven Parallel Robot\n\
            for Rehabilitation\nJ. Smith, NTU\nAbstract";
        assert_eq!(
            extract_title(text),
            Some(
                "Design and Implementation of a Cable-Driven Parallel Robot for Rehabilitation"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_terminal_punctuation_ends_title() {
        let text = "Editorial\nWhy Do Robots Fail?\nThis opening sentence belongs to the body text";
        assert_eq!(extract_title(text), Some("Why Do Robots Fail?".to_string()));
    }

    #[test]
    fn test_end_marker_line_excluded() {
        let text = "Research Article\nSoft Robotic Grippers for Fruit Harvesting\n\
            Keywords: soft robotics, grasping";
        assert_eq!(
            extract_title(text),
            Some("Soft Robotic Grippers for Fruit Harvesting".to_string())
        );
    }

    #[test]
    fn test_at_most_five_fragments() {
        let text = "Original Article\nline one\nline two\nline three\nline four\nline five\n\
            line six";
        assert_eq!(
            extract_title(text),
            Some("line one line two line three line four line five".to_string())
        );
    }

    #[test]
    fn test_page_numbers_stripped() {
        let text = "3\nOriginal Article\n12 Neural Control of Legged Robots 45\nAbstract";
        assert_eq!(
            extract_title(text),
            Some("Neural Control of Legged Robots".to_string())
        );
    }

    #[test]
    fn test_label_variant_keeps_short_first_line() {
        let text = "Review Paper\nDesign of a\nCable-Driven Parallel Robot\nJANE DOE\nAbstract";
        assert_eq!(
            extract_title(text),
            Some("Design of a Cable-Driven Parallel Robot".to_string())
        );
    }

    #[test]
    fn test_label_line_with_trailing_text_is_skipped() {
        let text = "ORIGINAL ARTICLE  Open Access\nNeural Control of Legged Robots\nJANE DOE\n\
            Abstract";
        assert_eq!(
            extract_title(text),
            Some("Neural Control of Legged Robots".to_string())
        );
    }

    #[test]
    fn test_laboratory_in_title_does_not_stop_collection() {
        let text = "Original Article\nAutomated Laboratory Sample Handling\nwith Mobile Robots\n\
            JANE DOE\nAbstract";
        assert_eq!(
            extract_title(text),
            Some("Automated Laboratory Sample Handling with Mobile Robots".to_string())
        );
    }

    #[test]
    fn test_title_containing_label_word_is_not_a_label() {
        let text = "Research on Cable-Driven Parallel Robots\nJANE DOE";
        assert_eq!(
            extract_title(text),
            Some("Research on Cable-Driven Parallel Robots".to_string())
        );
    }

    #[test]
    fn test_fallback_longest_line() {
        let text = "Editorial\nRobots\nJOHN SMITH\nThe Longest Meaningful Line Here is this one\n\
            short line text";
        assert_eq!(
            extract_title(text),
            Some("Longest Meaningful Line Here is this one".to_string())
        );
    }

    #[test]
    fn test_ligatures_expanded() {
        let text = "Original Article\nE\u{FB03}cient Gripper Design for Harvesting\nAbstract";
        assert_eq!(
            extract_title(text),
            Some("Efficient Gripper Design for Harvesting".to_string())
        );
    }

    #[test]
    fn test_custom_section_label() {
        let config = TitleConfigBuilder::new()
            .add_section_label("letter to the editor")
            .build()
            .unwrap();
        let extractor = TitleExtractor::with_config(config);
        let text = "Letter to the Editor\nOn Safety of Collaborative Robots\nAbstract";
        assert_eq!(extractor.find_title_start(&text.lines().collect::<Vec<_>>()), 1);
        assert_eq!(
            extractor.extract(text),
            Some("On Safety of Collaborative Robots".to_string())
        );
    }

    #[test]
    fn test_start_defaults_to_zero() {
        let extractor = TitleExtractor::new();
        assert_eq!(extractor.find_title_start(&["Short", "Also short"]), 0);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let text = "Original Article\nNeural Control of Legged Robots\nAbstract";
        assert_eq!(extract_title(text), extract_title(text));
    }
}
