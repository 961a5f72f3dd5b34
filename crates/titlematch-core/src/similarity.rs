//! String similarity scorers used by the fuzzy matcher.
//!
//! All scorers return an integer in `0..=100`. Both inputs go through the same
//! preprocessing ([`process`]) first, and an empty processed string scores 0
//! against anything.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::models::MatchStrategy;

/// Normalize a title for scoring.
///
/// NFKD-decomposes and drops non-ASCII (so accents fold onto their base
/// letter), replaces every run of non-alphanumerics with one space, lowercases
/// and trims. Word boundaries survive so the token scorers can split on them.
pub fn process(s: &str) -> String {
    static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9]+").unwrap());
    let ascii: String = s.nfkd().filter(|c| c.is_ascii()).collect();
    NON_ALNUM
        .replace_all(&ascii, " ")
        .trim()
        .to_ascii_lowercase()
}

/// A title preprocessed once for repeated scoring against many others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTitle {
    processed: String,
    sorted_tokens: String,
    token_set: BTreeSet<String>,
}

impl PreparedTitle {
    pub fn new(title: &str) -> Self {
        let processed = process(title);
        let mut tokens: Vec<&str> = processed.split_whitespace().collect();
        tokens.sort_unstable();
        let sorted_tokens = tokens.join(" ");
        let token_set = tokens.into_iter().map(str::to_string).collect();
        Self {
            processed,
            sorted_tokens,
            token_set,
        }
    }

    pub fn processed(&self) -> &str {
        &self.processed
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }
}

fn to_percent(similarity: f64) -> u8 {
    (similarity * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Normalized Indel similarity (0..=1); 0 when either side is empty.
fn raw_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    rapidfuzz::fuzz::ratio(a.chars(), b.chars())
}

/// Plain edit-distance similarity of the processed strings.
pub fn ratio(a: &str, b: &str) -> u8 {
    to_percent(raw_ratio(&process(a), &process(b)))
}

/// Similarity after sorting tokens alphabetically (robust to reordering).
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    token_sort_prepared(&PreparedTitle::new(a), &PreparedTitle::new(b))
}

/// Best alignment of the shorter string inside the longer one.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    partial_prepared(&PreparedTitle::new(a), &PreparedTitle::new(b))
}

/// Similarity over unique tokens (robust to extra or missing words).
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    token_set_prepared(&PreparedTitle::new(a), &PreparedTitle::new(b))
}

/// Score two prepared titles with the given strategy.
pub fn score(strategy: MatchStrategy, a: &PreparedTitle, b: &PreparedTitle) -> u8 {
    match strategy {
        MatchStrategy::TokenSort => token_sort_prepared(a, b),
        MatchStrategy::Partial => partial_prepared(a, b),
        MatchStrategy::TokenSet => token_set_prepared(a, b),
    }
}

fn token_sort_prepared(a: &PreparedTitle, b: &PreparedTitle) -> u8 {
    to_percent(raw_ratio(&a.sorted_tokens, &b.sorted_tokens))
}

fn partial_prepared(a: &PreparedTitle, b: &PreparedTitle) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let a_chars: Vec<char> = a.processed.chars().collect();
    let b_chars: Vec<char> = b.processed.chars().collect();
    let (shorter, longer) = if a_chars.len() <= b_chars.len() {
        (a_chars, b_chars)
    } else {
        (b_chars, a_chars)
    };

    if shorter.len() == longer.len() {
        return to_percent(rapidfuzz::fuzz::ratio(
            shorter.iter().copied(),
            longer.iter().copied(),
        ));
    }

    let mut best = 0.0_f64;
    for window in longer.windows(shorter.len()) {
        let s = rapidfuzz::fuzz::ratio(shorter.iter().copied(), window.iter().copied());
        if s > best {
            best = s;
            if best >= 1.0 {
                break;
            }
        }
    }
    to_percent(best)
}

fn token_set_prepared(a: &PreparedTitle, b: &PreparedTitle) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let join = |tokens: Vec<&String>| {
        tokens
            .into_iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    };
    let combine = |head: &str, tail: &str| format!("{} {}", head, tail).trim().to_string();

    // BTreeSet iteration is already sorted
    let intersection = join(a.token_set.intersection(&b.token_set).collect());
    let a_only = join(a.token_set.difference(&b.token_set).collect());
    let b_only = join(b.token_set.difference(&a.token_set).collect());

    let combined_a = combine(&intersection, &a_only);
    let combined_b = combine(&intersection, &b_only);

    [
        raw_ratio(&intersection, &combined_a),
        raw_ratio(&intersection, &combined_b),
        raw_ratio(&combined_a, &combined_b),
    ]
    .into_iter()
    .map(to_percent)
    .max()
    .unwrap_or(0)
}
