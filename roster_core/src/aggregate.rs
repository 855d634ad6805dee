//! Aggregation of matches across decode passes.
//!
//! A clip is usually transcribed more than once (different decode settings
//! or slowdowns), and each pass produces its own token stream. This module
//! runs the matcher over every pass through one shared [`SearchCache`],
//! then folds the per-pass results into per-token suggestion lists keyed by
//! the primary pass's token indices, plus a ranked candidate summary.

use crate::matcher::{MatchType, Matcher, PlayerSummary, Suggestion};
use crate::ngram::{build_ngrams, Token};
use crate::text::normalize;
use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One n-gram that produced suggestions, with the token span and clip
/// timing it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub pass: usize,
    pub ngram: String,
    /// Half-open token index span within the pass's token stream.
    pub token_span: (usize, usize),
    pub start_time: f64,
    pub end_time: f64,
    pub avg_probability: Option<f64>,
    pub suggestions: Vec<Suggestion>,
}

/// Memoized n-gram search results, shared across passes. Empty results are
/// cached too so a miss is never searched twice.
#[derive(Debug, Default)]
pub struct SearchCache {
    entries: FxHashMap<String, Vec<Suggestion>>,
    hits: u64,
    misses: u64,
}

impl SearchCache {
    pub fn new() -> Self {
        SearchCache::default()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_or_compute(
        &mut self,
        key: &str,
        compute: impl FnOnce() -> Vec<Suggestion>,
    ) -> Vec<Suggestion> {
        if let Some(cached) = self.entries.get(key) {
            self.hits += 1;
            return cached.clone();
        }
        self.misses += 1;
        let computed = compute();
        self.entries.insert(key.to_string(), computed.clone());
        computed
    }
}

/// Match every n-gram of one pass's token stream, longest n-grams first.
///
/// Each distinct n-gram text is searched once per pass; its first
/// (longest, earliest) occurrence provides the span and timing. Only
/// n-grams with at least one suggestion produce a record, but empty
/// results still land in the cache.
pub fn process_pass(
    pass: usize,
    tokens: &[Token],
    matcher: &Matcher<'_>,
    cache: &mut SearchCache,
) -> Vec<MatchRecord> {
    let config = matcher.config();
    let grams = build_ngrams(tokens, config.min_gram, config.max_gram);

    let mut records = Vec::new();
    let mut seen_texts: Vec<&str> = Vec::new();
    for gram in &grams {
        if seen_texts.contains(&gram.text.as_str()) {
            continue;
        }
        seen_texts.push(&gram.text);

        let suggestions = cache.get_or_compute(&gram.text, || matcher.match_ngram(&gram.text));
        if suggestions.is_empty() {
            continue;
        }

        let span = &tokens[gram.start..gram.end];
        let probs: Vec<f64> = span.iter().filter_map(|t| t.probability).collect();
        let avg_probability = if probs.is_empty() {
            None
        } else {
            Some(probs.iter().sum::<f64>() / probs.len() as f64)
        };

        records.push(MatchRecord {
            pass,
            ngram: gram.text.clone(),
            token_span: (gram.start, gram.end),
            start_time: span[0].start,
            end_time: span[span.len() - 1].end,
            avg_probability,
            suggestions,
        });
    }

    debug!(
        "pass {}: {} tokens, {} records, cache {}h/{}m",
        pass,
        tokens.len(),
        records.len(),
        cache.hits(),
        cache.misses()
    );
    records
}

/// A suggestion projected onto one primary-pass token, annotated with every
/// n-gram and pass that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSuggestion {
    pub name: String,
    pub match_type: MatchType,
    pub score: f64,
    pub career_score: f64,
    pub player: PlayerSummary,
    pub source_ngrams: Vec<String>,
    pub source_passes: Vec<usize>,
}

/// Fold records from all passes into per-token suggestion lists keyed by
/// primary-pass token index.
///
/// Records from `primary_pass` attach via their token spans; records from
/// other passes attach to every primary token whose normalized text occurs
/// in the matched n-gram. One entry per name per token: duplicates keep
/// the highest-career copy and merge their sources. Each token's list is
/// sorted by career score then similarity score, both descending.
pub fn fold_token_suggestions(
    primary_pass: usize,
    primary_tokens: &[Token],
    records: &[MatchRecord],
) -> BTreeMap<usize, Vec<TokenSuggestion>> {
    let mut by_word: FxHashMap<String, Vec<usize>> = FxHashMap::default();
    for (idx, token) in primary_tokens.iter().enumerate() {
        let word = normalize(&token.text);
        if !word.is_empty() {
            by_word.entry(word).or_default().push(idx);
        }
    }

    let mut folded: BTreeMap<usize, Vec<TokenSuggestion>> = BTreeMap::new();
    let mut attach = |idx: usize, record: &MatchRecord| {
        let entries = folded.entry(idx).or_default();
        for suggestion in &record.suggestions {
            let existing = entries
                .iter_mut()
                .find(|e| e.name.eq_ignore_ascii_case(&suggestion.name));
            match existing {
                Some(entry) => {
                    if suggestion.career_score > entry.career_score {
                        entry.score = suggestion.score;
                        entry.career_score = suggestion.career_score;
                        entry.match_type = suggestion.match_type;
                        entry.player = suggestion.player.clone();
                    }
                    if !entry.source_ngrams.contains(&record.ngram) {
                        entry.source_ngrams.push(record.ngram.clone());
                    }
                    if !entry.source_passes.contains(&record.pass) {
                        entry.source_passes.push(record.pass);
                    }
                }
                None => entries.push(TokenSuggestion {
                    name: suggestion.name.clone(),
                    match_type: suggestion.match_type,
                    score: suggestion.score,
                    career_score: suggestion.career_score,
                    player: suggestion.player.clone(),
                    source_ngrams: vec![record.ngram.clone()],
                    source_passes: vec![record.pass],
                }),
            }
        }
    };

    for record in records {
        if record.pass == primary_pass {
            let (start, end) = record.token_span;
            for idx in start..end.min(primary_tokens.len()) {
                attach(idx, record);
            }
        } else {
            let mut indices: Vec<usize> = record
                .ngram
                .split_whitespace()
                .filter_map(|word| by_word.get(word))
                .flatten()
                .copied()
                .collect();
            indices.sort_unstable();
            indices.dedup();
            for idx in indices {
                attach(idx, record);
            }
        }
    }

    for entries in folded.values_mut() {
        entries.sort_by(|a, b| {
            b.career_score
                .partial_cmp(&a.career_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.score
                        .partial_cmp(&a.score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        });
        for entry in entries.iter_mut() {
            entry.source_passes.sort_unstable();
        }
    }
    folded
}

/// One distinct player over a whole clip, for the batch report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub name: String,
    pub career_score: f64,
    /// Number of match records mentioning the player.
    pub mentions: usize,
    pub ngrams: Vec<String>,
}

/// Collapse records into a ranked list of distinct candidates: career
/// score descending, then mention count, then name.
pub fn candidate_summary(records: &[MatchRecord], limit: usize) -> Vec<CandidateSummary> {
    let mut candidates: Vec<CandidateSummary> = Vec::new();
    for record in records {
        for suggestion in &record.suggestions {
            match candidates
                .iter_mut()
                .find(|c| c.name.eq_ignore_ascii_case(&suggestion.name))
            {
                Some(candidate) => {
                    candidate.mentions += 1;
                    candidate.career_score = candidate.career_score.max(suggestion.career_score);
                    if !candidate.ngrams.contains(&record.ngram) {
                        candidate.ngrams.push(record.ngram.clone());
                    }
                }
                None => candidates.push(CandidateSummary {
                    name: suggestion.name.clone(),
                    career_score: suggestion.career_score,
                    mentions: 1,
                    ngrams: vec![record.ngram.clone()],
                }),
            }
        }
    }
    candidates.sort_by(|a, b| {
        b.career_score
            .partial_cmp(&a.career_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.mentions.cmp(&a.mentions))
            .then_with(|| a.name.cmp(&b.name))
    });
    candidates.truncate(limit);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{NameDictionary, PlayerRecord};
    use crate::matcher::MatchConfig;
    use crate::scoring::ScoringWeights;

    fn dict() -> NameDictionary {
        let messi = PlayerRecord {
            name: Some("Lionel Messi".to_string()),
            current_club: Some("Paris Saint-Germain".to_string()),
            goals: Some(50.0),
            ..Default::default()
        };
        let neymar = PlayerRecord {
            name: Some("Neymar".to_string()),
            ..Default::default()
        };
        NameDictionary::build(vec![messi, neymar], &ScoringWeights::default())
    }

    fn tokens(texts: &[&str]) -> Vec<Token> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let mut tok = Token::new(*t, i as f64, i as f64 + 1.0);
                tok.probability = Some(0.9);
                tok
            })
            .collect()
    }

    #[test]
    fn test_process_pass_finds_full_name() {
        let dict = dict();
        let matcher = Matcher::new(&dict, MatchConfig::default());
        let mut cache = SearchCache::new();
        let toks = tokens(&["lionel", "messi", "shoots"]);

        let records = process_pass(1, &toks, &matcher, &mut cache);
        let full = records
            .iter()
            .find(|r| r.ngram == "lionel messi")
            .expect("bigram record");
        assert_eq!(full.token_span, (0, 2));
        assert_eq!(full.start_time, 0.0);
        assert_eq!(full.end_time, 2.0);
        assert_eq!(full.avg_probability, Some(0.9));
        assert_eq!(full.suggestions[0].name, "Lionel Messi");
        assert_eq!(full.suggestions[0].score, 100.0);
    }

    #[test]
    fn test_repeated_pass_served_from_cache() {
        let dict = dict();
        let matcher = Matcher::new(&dict, MatchConfig::default());
        let mut cache = SearchCache::new();
        let toks = tokens(&["lionel", "messi"]);

        let first = process_pass(1, &toks, &matcher, &mut cache);
        let searches_after_first = matcher.lookups();
        assert!(searches_after_first > 0);

        let second = process_pass(2, &toks, &matcher, &mut cache);
        assert_eq!(matcher.lookups(), searches_after_first);
        assert!(cache.hits() >= 3);
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].ngram, second[0].ngram);
        assert_eq!(first[0].suggestions, second[0].suggestions);
    }

    #[test]
    fn test_empty_results_cached_too() {
        let dict = dict();
        let matcher = Matcher::new(&dict, MatchConfig::default());
        let mut cache = SearchCache::new();
        let toks = tokens(&["qqqq"]);

        assert!(process_pass(1, &toks, &matcher, &mut cache).is_empty());
        assert_eq!(cache.len(), 1);
        process_pass(2, &toks, &matcher, &mut cache);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn test_duplicate_ngram_first_occurrence_wins() {
        let dict = dict();
        let matcher = Matcher::new(&dict, MatchConfig::default());
        let mut cache = SearchCache::new();
        let toks = tokens(&["neymar", "and", "neymar"]);

        let records = process_pass(1, &toks, &matcher, &mut cache);
        let neymar: Vec<&MatchRecord> =
            records.iter().filter(|r| r.ngram == "neymar").collect();
        assert_eq!(neymar.len(), 1);
        assert_eq!(neymar[0].token_span, (0, 1));
    }

    #[test]
    fn test_fold_projects_primary_spans() {
        let dict = dict();
        let matcher = Matcher::new(&dict, MatchConfig::default());
        let mut cache = SearchCache::new();
        let toks = tokens(&["lionel", "messi"]);

        let records = process_pass(1, &toks, &matcher, &mut cache);
        let folded = fold_token_suggestions(1, &toks, &records);
        let token0 = folded.get(&0).expect("token 0 suggestions");
        assert!(token0.iter().any(|s| s.name == "Lionel Messi"));
        let messi = token0.iter().find(|s| s.name == "Lionel Messi").unwrap();
        assert!(messi.source_ngrams.contains(&"lionel messi".to_string()));
        // Career ordering within the token list.
        for pair in token0.windows(2) {
            assert!(pair[0].career_score >= pair[1].career_score);
        }
    }

    #[test]
    fn test_fold_merges_secondary_pass_by_word() {
        let dict = dict();
        let matcher = Matcher::new(&dict, MatchConfig::default());
        let mut cache = SearchCache::new();
        let primary = tokens(&["messi", "runs"]);
        let secondary = tokens(&["lionel", "messi"]);

        let mut records = process_pass(1, &primary, &matcher, &mut cache);
        records.extend(process_pass(2, &secondary, &matcher, &mut cache));

        let folded = fold_token_suggestions(1, &primary, &records);
        let token0 = folded.get(&0).expect("token 0 suggestions");
        let messi = token0.iter().find(|s| s.name == "Lionel Messi").unwrap();
        // Same player seen in both passes collapses to one entry.
        assert_eq!(
            token0
                .iter()
                .filter(|s| s.name == "Lionel Messi")
                .count(),
            1
        );
        assert!(messi.source_passes.contains(&1));
        assert!(messi.source_passes.contains(&2));
        assert!(messi.source_ngrams.len() >= 2);
    }

    #[test]
    fn test_candidate_summary_ranked_and_limited() {
        let dict = dict();
        let matcher = Matcher::new(&dict, MatchConfig::default());
        let mut cache = SearchCache::new();
        let toks = tokens(&["lionel", "messi", "passes", "to", "neymar"]);

        let records = process_pass(1, &toks, &matcher, &mut cache);
        let summary = candidate_summary(&records, 10);
        assert!(summary.len() >= 2);
        assert_eq!(summary[0].name, "Lionel Messi");
        for pair in summary.windows(2) {
            assert!(pair[0].career_score >= pair[1].career_score);
        }

        let limited = candidate_summary(&records, 1);
        assert_eq!(limited.len(), 1);
    }
}
