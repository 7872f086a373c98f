//! Text normalization helpers shared by the classifier and scorer.
//!
//! # Responsibility
//! - Tokenize note text into lowercase words and sentences.
//! - Derive plain-text summaries and frequency-ranked keywords.
//!
//! # Invariants
//! - Every helper is deterministic for identical input.
//! - Helpers never panic on arbitrary user text.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Maximum characters kept by `derive_summary`.
pub const SUMMARY_MAX_CHARS: usize = 100;
const KEYWORD_MIN_CHARS: usize = 4;

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+(?:['’-][\p{L}\p{N}]+)*").expect("valid word regex"));
static SENTENCE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?;\n]+").expect("valid sentence regex"));
static MARKDOWN_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link regex"));
static MARKDOWN_SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\*_`#>~\[\]\(\)!]+").expect("valid markdown symbol regex"));
static LIST_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:[-+]\s+(?:\[[ xX]\]\s*)?|\d+[.)]\s+)").expect("valid list marker regex")
});
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

const STOPWORDS: &[&str] = &[
    "a", "about", "after", "again", "all", "also", "an", "and", "any", "are", "as", "at", "be",
    "because", "been", "before", "being", "but", "by", "can", "could", "did", "do", "does",
    "doing", "done", "for", "from", "get", "got", "had", "has", "have", "having", "he", "her",
    "here", "him", "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "like",
    "maybe", "me", "more", "most", "my", "need", "not", "now", "of", "on", "one", "only", "or",
    "our", "out", "over", "really", "she", "should", "so", "some", "such", "than", "that", "the",
    "their", "them", "then", "there", "these", "they", "thing", "things", "this", "those",
    "through", "to", "too", "up", "very", "want", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "why", "will", "with", "would", "you", "your",
];

/// Splits text into lowercase word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Splits text into trimmed, non-empty sentences with list markers removed.
pub fn sentences(text: &str) -> Vec<String> {
    let without_markers = LIST_MARKER_RE.replace_all(text, "");
    SENTENCE_BREAK_RE
        .split(&without_markers)
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.binary_search(&word).is_ok()
}

/// Normalizes one keyword for comparisons: trimmed and lowercased.
pub fn normalize_keyword(keyword: &str) -> Option<String> {
    let trimmed = keyword.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Derives a plain-text summary from raw note text.
///
/// Rules:
/// - markdown links keep their label, other markdown symbols are removed;
/// - whitespace is collapsed;
/// - the first `SUMMARY_MAX_CHARS` characters are kept.
pub fn derive_summary(text: &str) -> String {
    let without_links = MARKDOWN_LINK_RE.replace_all(text, "$1");
    let without_markers = LIST_MARKER_RE.replace_all(&without_links, " ");
    let without_symbols = MARKDOWN_SYMBOL_RE.replace_all(&without_markers, " ");
    let normalized = WHITESPACE_RE.replace_all(&without_symbols, " ");
    truncate_chars(normalized.trim(), SUMMARY_MAX_CHARS)
}

/// Returns up to `max` keywords ranked by frequency, then first occurrence.
///
/// Stopwords, pure numbers and words shorter than four characters are skipped.
pub fn extract_keywords(text: &str, max: usize) -> Vec<String> {
    let mut stats: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, token) in tokenize(text).into_iter().enumerate() {
        if token.chars().count() < KEYWORD_MIN_CHARS
            || is_stopword(&token)
            || token.chars().all(|c| c.is_numeric())
        {
            continue;
        }
        let entry = stats.entry(token).or_insert((0, position));
        entry.0 += 1;
    }

    let mut ranked = stats.into_iter().collect::<Vec<_>>();
    ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
        count_b.cmp(count_a).then(first_a.cmp(first_b))
    });
    ranked.into_iter().take(max).map(|(word, _)| word).collect()
}

/// Truncates on character boundaries.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::{
        derive_summary, extract_keywords, is_stopword, sentences, tokenize, STOPWORDS,
        SUMMARY_MAX_CHARS,
    };

    #[test]
    fn stopwords_are_sorted_for_binary_search() {
        let mut sorted = STOPWORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOPWORDS);
        assert!(is_stopword("the"));
        assert!(!is_stopword("pricing"));
    }

    #[test]
    fn tokenize_lowercases_and_keeps_contractions() {
        assert_eq!(
            tokenize("Don't ship the API v2 yet!"),
            vec!["don't", "ship", "the", "api", "v2", "yet"]
        );
    }

    #[test]
    fn sentences_strip_list_markers() {
        let parts = sentences("- [ ] Email Sam\n- Book flights. Think later");
        assert_eq!(parts, vec!["Email Sam", "Book flights", "Think later"]);
    }

    #[test]
    fn summary_strips_markdown_and_limits_length() {
        let source = format!(
            "# Title\n\n- [link](https://example.com) **bold** {}",
            "x".repeat(200)
        );
        let summary = derive_summary(&source);
        assert!(summary.starts_with("Title link bold"));
        assert!(!summary.contains('#'));
        assert_eq!(summary.chars().count(), SUMMARY_MAX_CHARS);
    }

    #[test]
    fn keywords_rank_by_frequency_then_position() {
        let keywords = extract_keywords(
            "pricing page test; pricing tiers and onboarding flow. Onboarding matters for pricing",
            3,
        );
        assert_eq!(keywords, vec!["pricing", "onboarding", "page"]);
    }
}
