//! Pitchquiz Roster Core - Footballer name resolution for quiz clips.
//!
//! This module provides:
//! - Player dictionary built from JSONL datasets, indexed by name variant
//! - Career prominence scoring to rank same-named players
//! - N-gram generation over ASR token streams
//! - Exact and fuzzy n-gram matching (weighted Levenshtein ratio)
//! - Cross-pass aggregation with a shared search cache
//! - Biasing-vocabulary selection for the speech engine
//! - Rule-based and LLM-backed question verification

pub mod aggregate;
pub mod checker;
pub mod dictionary;
pub mod error;
pub mod knowledge;
pub mod matcher;
pub mod ngram;
pub mod prompt;
pub mod scoring;
pub mod text;

pub use aggregate::{
    candidate_summary, fold_token_suggestions, process_pass, CandidateSummary, MatchRecord,
    SearchCache, TokenSuggestion,
};
pub use checker::{
    verify_players, LlmChecker, LlmClient, LlmResult, NullLlmClient, RuleBasedChecker, Verdict,
};
pub use dictionary::{LoadStats, NameDictionary, PlayerRecord};
pub use error::RosterError;
pub use knowledge::{ClubStint, Honor, KnowledgeBase, PlayerFacts};
pub use matcher::{
    fuzzy_match, weighted_ratio, MatchConfig, MatchType, Matcher, PlayerSummary, Suggestion,
};
pub use ngram::{build_ngrams, Ngram, Token};
pub use prompt::{build_initial_prompt, relevance_score, select_prompt_names};
pub use scoring::{career_score, CareerFacts, ScoringWeights};
pub use text::{last_name, normalize, word_tokens};
