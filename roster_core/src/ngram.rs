//! N-gram generation over ASR token streams.
//!
//! Candidate search strings are every contiguous token window between the
//! configured sizes. Windows are normalized before matching and emitted
//! longest-first; the aggregator relies on that order so multi-word names
//! are matched before their fragments.

use crate::text::normalize;
use serde::{Deserialize, Serialize};

/// One decoded speech token with its clip-relative timing. `pass` records
/// which decode pass produced it when the same clip is transcribed several
/// times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    /// Seconds from clip start.
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub avg_logprob: Option<f64>,
    #[serde(default)]
    pub pass: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Token {
            text: text.into(),
            start,
            end,
            probability: None,
            avg_logprob: None,
            pass: 0,
        }
    }
}

/// A normalized token window, with the half-open token index span it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ngram {
    pub text: String,
    /// Index of the first token in the window.
    pub start: usize,
    /// Index one past the last token in the window.
    pub end: usize,
}

impl Ngram {
    /// Word count of the normalized text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Generate every token window of `min_n..=max_n` tokens, normalized.
/// Windows that normalize to nothing are dropped; duplicates are kept so
/// every occurrence retains its own position. The result is sorted by word
/// count descending (stable, so equal sizes stay in stream order).
pub fn build_ngrams(tokens: &[Token], min_n: usize, max_n: usize) -> Vec<Ngram> {
    let min_n = min_n.max(1);
    if tokens.is_empty() || max_n < min_n {
        return Vec::new();
    }

    let mut grams = Vec::new();
    for n in min_n..=max_n.min(tokens.len()) {
        for start in 0..=(tokens.len() - n) {
            let window: Vec<&str> = tokens[start..start + n]
                .iter()
                .map(|t| t.text.as_str())
                .collect();
            let text = normalize(&window.join(" "));
            if text.is_empty() {
                continue;
            }
            grams.push(Ngram {
                text,
                start,
                end: start + n,
            });
        }
    }

    grams.sort_by_key(|g| std::cmp::Reverse(g.word_count()));
    grams
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(texts: &[&str]) -> Vec<Token> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Token::new(*t, i as f64, i as f64 + 1.0))
            .collect()
    }

    #[test]
    fn test_window_count() {
        // 3 tokens, sizes 1..=2: three unigrams plus two bigrams.
        let grams = build_ngrams(&tokens(&["lionel", "messi", "scores"]), 1, 2);
        assert_eq!(grams.len(), 5);
    }

    #[test]
    fn test_longest_first() {
        let grams = build_ngrams(&tokens(&["thiago", "silva", "defends"]), 1, 3);
        let counts: Vec<usize> = grams.iter().map(|g| g.word_count()).collect();
        let mut sorted = counts.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(counts, sorted);
        assert_eq!(grams[0].text, "thiago silva defends");
    }

    #[test]
    fn test_spans_and_normalization() {
        let grams = build_ngrams(&tokens(&["Messi,", "RONALDO."]), 2, 2);
        assert_eq!(grams.len(), 1);
        assert_eq!(grams[0].text, "messi ronaldo");
        assert_eq!((grams[0].start, grams[0].end), (0, 2));
    }

    #[test]
    fn test_punctuation_only_windows_dropped() {
        let grams = build_ngrams(&tokens(&["...", "neymar", "!!"]), 1, 1);
        assert_eq!(grams.len(), 1);
        assert_eq!(grams[0].text, "neymar");
        assert_eq!(grams[0].start, 1);
    }

    #[test]
    fn test_duplicates_keep_positions() {
        let grams = build_ngrams(&tokens(&["silva", "silva"]), 1, 1);
        assert_eq!(grams.len(), 2);
        assert_ne!(grams[0].start, grams[1].start);
        assert_eq!(grams[0].text, grams[1].text);
    }

    #[test]
    fn test_empty_and_degenerate_inputs() {
        assert!(build_ngrams(&[], 1, 3).is_empty());
        assert!(build_ngrams(&tokens(&["messi"]), 3, 2).is_empty());
        // max_n larger than the stream is clamped, not an error.
        assert_eq!(build_ngrams(&tokens(&["messi"]), 1, 10).len(), 1);
    }
}
