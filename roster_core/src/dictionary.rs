//! Player name dictionary.
//!
//! This module provides:
//! - The dataset-facing [`PlayerRecord`] shape
//! - [`NameDictionary`]: normalized name variant -> ranked player records
//! - JSONL loading with skip-don't-fail handling of bad rows
//!
//! Each record is indexed under every usable name variant (canonical name,
//! full name, last name, aliases). Several players routinely share a
//! variant, common surnames especially, so lookups return them ordered by
//! descending career score with the most prominent player first.

use crate::scoring::{career_score, CareerFacts, ScoringWeights};
use crate::text::{last_name, normalize};
use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// One player row from the dataset. Unknown fields are ignored; every
/// field except the name is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default, alias = "club")]
    pub current_club: Option<String>,
    /// Historical clubs.
    #[serde(default)]
    pub clubs: Vec<String>,
    #[serde(default, alias = "current_league")]
    pub league: Option<String>,
    /// Historical leagues.
    #[serde(default)]
    pub leagues: Vec<String>,
    #[serde(default)]
    pub minutes_played: Option<f64>,
    #[serde(default)]
    pub goals: Option<f64>,
    #[serde(default)]
    pub assists: Option<f64>,
    /// Tags of the datasets this row was merged from.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Derived at load time; serialized back out for downstream payloads.
    #[serde(default)]
    pub career_score: f64,
}

impl PlayerRecord {
    /// Canonical display name: `name`, falling back to `full_name`.
    pub fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.full_name.as_deref())
            .filter(|n| !n.trim().is_empty())
    }

    fn compute_career_score(&mut self, weights: &ScoringWeights) {
        let facts = CareerFacts {
            current_club: self.current_club.as_deref(),
            past_clubs: &self.clubs,
            current_league: self.league.as_deref(),
            past_leagues: &self.leagues,
            minutes_played: self.minutes_played,
            goals: self.goals.unwrap_or(0.0),
            assists: self.assists.unwrap_or(0.0),
            sources: &self.sources,
        };
        self.career_score = career_score(&facts, weights);
    }

    /// All normalized name variants this record should be reachable under.
    fn name_variants(&self) -> Vec<String> {
        let mut variants: Vec<String> = Vec::new();
        let mut push = |raw: &str| {
            let key = normalize(raw);
            if !key.is_empty() && !variants.contains(&key) {
                variants.push(key);
            }
        };

        let canonical = match self.display_name() {
            Some(n) => n.to_string(),
            None => return variants,
        };
        push(&canonical);
        if let Some(full) = self.full_name.as_deref() {
            push(full);
        }
        if canonical.split_whitespace().count() > 1 {
            push(last_name(&canonical));
        }
        for alias in &self.aliases {
            push(alias);
        }
        variants
    }
}

/// Counters for rows the loader dropped. These are recoverable skips, not
/// failures: a dictionary built from a partially bad file is still valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub records: usize,
    pub malformed_lines: usize,
    pub unnamed_records: usize,
}

/// Read-only lookup from normalized name variant to player records, built
/// once per session.
#[derive(Debug, Default)]
pub struct NameDictionary {
    by_name: FxHashMap<String, Vec<Arc<PlayerRecord>>>,
    keys: Vec<String>,
    stats: LoadStats,
}

impl NameDictionary {
    /// Build a dictionary from already-deserialized records. Records with
    /// no usable name are skipped.
    pub fn build(records: Vec<PlayerRecord>, weights: &ScoringWeights) -> Self {
        let mut dict = NameDictionary::default();
        for record in records {
            dict.insert(record, weights);
        }
        dict.finish();
        dict
    }

    /// Load a newline-delimited JSON dataset. Malformed lines and unnamed
    /// records are counted and skipped.
    pub fn load_jsonl(path: &Path, weights: &ScoringWeights) -> std::io::Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut dict = NameDictionary::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<PlayerRecord>(line) {
                Ok(record) => dict.insert(record, weights),
                Err(err) => {
                    debug!("skipping malformed player line: {}", err);
                    dict.stats.malformed_lines += 1;
                }
            }
        }
        dict.finish();
        debug!(
            "loaded dictionary: {} records, {} keys, {} malformed lines, {} unnamed records",
            dict.stats.records,
            dict.keys.len(),
            dict.stats.malformed_lines,
            dict.stats.unnamed_records
        );
        Ok(dict)
    }

    fn insert(&mut self, mut record: PlayerRecord, weights: &ScoringWeights) {
        if record.display_name().is_none() {
            self.stats.unnamed_records += 1;
            return;
        }
        record.compute_career_score(weights);
        let variants = record.name_variants();
        let record = Arc::new(record);
        for key in variants {
            self.by_name.entry(key).or_default().push(Arc::clone(&record));
        }
        self.stats.records += 1;
    }

    /// Restore the ordering invariants: records per key sorted by career
    /// score descending, key list sorted for deterministic fuzzy search.
    fn finish(&mut self) {
        for entries in self.by_name.values_mut() {
            entries.sort_by(|a, b| {
                b.career_score
                    .partial_cmp(&a.career_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        self.keys = self.by_name.keys().cloned().collect();
        self.keys.sort();
    }

    /// Records filed under a normalized key, most prominent first.
    pub fn lookup(&self, key: &str) -> Option<&[Arc<PlayerRecord>]> {
        self.by_name.get(key).map(|v| v.as_slice())
    }

    /// All distinct normalized name keys, sorted.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.stats.records
    }

    pub fn is_empty(&self) -> bool {
        self.stats.records == 0
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    /// Distinct display names over all records, sorted. Used as the prompt
    /// fallback vocabulary.
    pub fn display_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .by_name
            .values()
            .flatten()
            .filter_map(|r| r.display_name().map(|n| n.to_string()))
            .collect();
        names.sort();
        names.dedup();
        names
    }
}
