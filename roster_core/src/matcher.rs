//! Exact and fuzzy n-gram matching against the name dictionary.
//!
//! Exact hits on a normalized dictionary key always score 100. Fuzzy
//! matching scores every dictionary key with [`weighted_ratio`] and keeps
//! those above the configured threshold, so misheard names ("naymar")
//! still reach the right player.

use crate::dictionary::{NameDictionary, PlayerRecord};
use crate::text::normalize;
use serde::{Deserialize, Serialize};
use std::cell::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Fuzzy,
    /// Manual search hits; never produced by n-gram matching.
    Search,
}

/// Display fields shipped with every suggestion so consumers never need a
/// second dictionary lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub full_name: Option<String>,
    pub nationality: Option<String>,
    pub position: Option<String>,
    pub current_club: Option<String>,
}

impl From<&PlayerRecord> for PlayerSummary {
    fn from(record: &PlayerRecord) -> Self {
        PlayerSummary {
            full_name: record.full_name.clone(),
            nationality: record.nationality.clone(),
            position: record.position.clone(),
            current_club: record.current_club.clone(),
        }
    }
}

/// One ranked candidate for an n-gram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    pub match_type: MatchType,
    /// Similarity score, 0..=100. Exact matches are always 100.
    pub score: f64,
    pub career_score: f64,
    pub player: PlayerSummary,
}

/// Matching knobs. Defaults mirror the interactive review tool.
#[derive(Debug, Clone, Copy)]
pub struct MatchConfig {
    pub min_gram: usize,
    pub max_gram: usize,
    /// Minimum [`weighted_ratio`] for a fuzzy hit, 0..=100.
    pub fuzzy_threshold: f64,
    pub max_suggestions: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            min_gram: 1,
            max_gram: 3,
            fuzzy_threshold: 70.0,
            max_suggestions: 5,
        }
    }
}

fn token_sort(text: &str) -> String {
    let mut words: Vec<&str> = text.split_whitespace().collect();
    words.sort_unstable();
    words.join(" ")
}

/// Similarity of two names on a 0..=100 scale.
///
/// Both sides are normalized first. Identical strings score 100. Otherwise
/// the score is the better of a plain and a word-order-insensitive
/// Levenshtein ratio, floored at 85 when one side contains the other and
/// at 75 for short same-length strings one edit apart.
pub fn weighted_ratio(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 100.0;
    }

    let plain = strsim::normalized_levenshtein(&a, &b);
    let sorted = strsim::normalized_levenshtein(&token_sort(&a), &token_sort(&b));
    let mut score = plain.max(sorted) * 100.0;

    if a.contains(&b) || b.contains(&a) {
        score = score.max(85.0);
    }
    if a.len() == b.len() && a.len() <= 5 && strsim::levenshtein(&a, &b) == 1 {
        score = score.max(75.0);
    }
    score
}

/// Score `query` against every key and keep the best `limit` at or above
/// `threshold`. Ties break on the key so results are reproducible.
pub fn fuzzy_match(
    query: &str,
    keys: &[String],
    limit: usize,
    threshold: f64,
) -> Vec<(String, f64)> {
    let mut scored: Vec<(String, f64)> = keys
        .iter()
        .filter_map(|key| {
            let score = weighted_ratio(query, key);
            (score >= threshold).then(|| (key.clone(), score))
        })
        .collect();
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    scored.truncate(limit);
    scored
}

/// Matches single n-grams against a dictionary. Holds no mutable state
/// beyond a lookup counter used to observe cache effectiveness.
pub struct Matcher<'a> {
    dict: &'a NameDictionary,
    config: MatchConfig,
    lookups: Cell<u64>,
}

// Cap on records taken from a single fuzzy-matched key.
const RECORDS_PER_FUZZY_KEY: usize = 2;

impl<'a> Matcher<'a> {
    pub fn new(dict: &'a NameDictionary, config: MatchConfig) -> Self {
        Matcher {
            dict,
            config,
            lookups: Cell::new(0),
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Number of `match_ngram` calls that actually ran a search.
    pub fn lookups(&self) -> u64 {
        self.lookups.get()
    }

    /// Rank candidates for one n-gram: exact hits first, then fuzzy hits,
    /// deduplicated by canonical name, sorted by score then career score,
    /// truncated to `max_suggestions`.
    pub fn match_ngram(&self, text: &str) -> Vec<Suggestion> {
        let key = normalize(text);
        if key.is_empty() {
            return Vec::new();
        }
        self.lookups.set(self.lookups.get() + 1);

        let mut suggestions: Vec<Suggestion> = Vec::new();
        let mut seen: Vec<String> = Vec::new();
        let mut push = |record: &PlayerRecord, match_type: MatchType, score: f64,
                        suggestions: &mut Vec<Suggestion>,
                        seen: &mut Vec<String>| {
            let name = match record.display_name() {
                Some(n) => n.to_string(),
                None => return,
            };
            let folded = name.to_lowercase();
            if seen.contains(&folded) {
                return;
            }
            seen.push(folded);
            suggestions.push(Suggestion {
                name,
                match_type,
                score,
                career_score: record.career_score,
                player: PlayerSummary::from(record),
            });
        };

        if let Some(records) = self.dict.lookup(&key) {
            for record in records {
                push(record, MatchType::Exact, 100.0, &mut suggestions, &mut seen);
            }
        }

        let fuzzy = fuzzy_match(
            &key,
            self.dict.keys(),
            2 * self.config.max_suggestions,
            self.config.fuzzy_threshold,
        );
        for (fuzzy_key, score) in fuzzy {
            if fuzzy_key == key {
                continue;
            }
            if let Some(records) = self.dict.lookup(&fuzzy_key) {
                for record in records.iter().take(RECORDS_PER_FUZZY_KEY) {
                    push(record, MatchType::Fuzzy, score, &mut suggestions, &mut seen);
                }
            }
        }

        suggestions.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.career_score
                        .partial_cmp(&a.career_score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        });
        suggestions.truncate(self.config.max_suggestions);
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoringWeights;

    fn dict() -> NameDictionary {
        let mut messi = PlayerRecord {
            name: Some("Lionel Messi".to_string()),
            ..Default::default()
        };
        messi.current_club = Some("Paris Saint-Germain".to_string());
        messi.goals = Some(50.0);
        let mut neymar = PlayerRecord {
            name: Some("Neymar".to_string()),
            ..Default::default()
        };
        neymar.current_club = Some("Al-Hilal".to_string());
        let thiago = PlayerRecord {
            name: Some("Thiago Silva".to_string()),
            current_club: Some("Chelsea".to_string()),
            goals: Some(20.0),
            ..Default::default()
        };
        let bernardo = PlayerRecord {
            name: Some("Bernardo Silva".to_string()),
            current_club: Some("Manchester City".to_string()),
            ..Default::default()
        };
        NameDictionary::build(
            vec![messi, neymar, thiago, bernardo],
            &ScoringWeights::default(),
        )
    }

    #[test]
    fn test_exact_match_scores_100() {
        let dict = dict();
        let matcher = Matcher::new(&dict, MatchConfig::default());
        let got = matcher.match_ngram("Lionel Messi");
        assert_eq!(got[0].name, "Lionel Messi");
        assert_eq!(got[0].score, 100.0);
        assert_eq!(got[0].match_type, MatchType::Exact);
    }

    #[test]
    fn test_fuzzy_catches_misheard_name() {
        let dict = dict();
        let matcher = Matcher::new(&dict, MatchConfig::default());
        let got = matcher.match_ngram("naymar");
        assert!(got.iter().any(|s| s.name == "Neymar"));
        let hit = got.iter().find(|s| s.name == "Neymar").unwrap();
        assert_eq!(hit.match_type, MatchType::Fuzzy);
        assert!(hit.score >= 70.0 && hit.score < 95.0);
    }

    #[test]
    fn test_high_threshold_excludes_fuzzy() {
        let dict = dict();
        let config = MatchConfig {
            fuzzy_threshold: 95.0,
            ..Default::default()
        };
        let matcher = Matcher::new(&dict, config);
        assert!(matcher.match_ngram("naymar").is_empty());
    }

    #[test]
    fn test_unknown_and_empty_ngrams() {
        let dict = dict();
        let matcher = Matcher::new(&dict, MatchConfig::default());
        assert!(matcher.match_ngram("zzzzzz qqqqqq").is_empty());
        assert!(matcher.match_ngram("!!!").is_empty());
    }

    #[test]
    fn test_shared_surname_ranked_by_career() {
        let dict = dict();
        let matcher = Matcher::new(&dict, MatchConfig::default());
        let got = matcher.match_ngram("silva");
        assert!(got.len() >= 2);
        assert_eq!(got[0].score, 100.0);
        assert_eq!(got[0].name, "Thiago Silva");
        assert!(got[0].career_score >= got[1].career_score);
    }

    #[test]
    fn test_truncated_to_max_suggestions() {
        let records: Vec<PlayerRecord> = (0..10)
            .map(|i| PlayerRecord {
                name: Some(format!("Silva{}", i)),
                ..Default::default()
            })
            .collect();
        let dict = NameDictionary::build(records, &ScoringWeights::default());
        let matcher = Matcher::new(&dict, MatchConfig::default());
        let got = matcher.match_ngram("silva0");
        assert!(got.len() <= MatchConfig::default().max_suggestions);
    }

    #[test]
    fn test_weighted_ratio_floors() {
        assert_eq!(weighted_ratio("messi", "messi"), 100.0);
        assert_eq!(weighted_ratio("Messi!", "messi"), 100.0);
        // Containment floor.
        assert!(weighted_ratio("lionel messi", "messi") >= 85.0);
        // Word order does not matter.
        assert!(weighted_ratio("messi lionel", "lionel messi") >= 95.0);
        // Short one-edit floor.
        assert!(weighted_ratio("pele", "pela") >= 75.0);
        assert_eq!(weighted_ratio("", "messi"), 0.0);
    }

    #[test]
    fn test_fuzzy_match_ordering_reproducible() {
        let keys = vec![
            "neymar".to_string(),
            "neymur".to_string(),
            "messi".to_string(),
        ];
        let a = fuzzy_match("naymar", &keys, 10, 60.0);
        let b = fuzzy_match("naymar", &keys, 10, 60.0);
        assert_eq!(a, b);
        assert!(a.len() >= 2);
        assert!(a[0].1 >= a[1].1);
    }
}
