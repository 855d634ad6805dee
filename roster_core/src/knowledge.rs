//! Curated player knowledge used by the condition checkers and the prompt
//! selector. Distinct from the matching dictionary: this data carries
//! verifiable facts (world cup years, club stints, honors) rather than
//! search variants.

use crate::error::RosterError;
use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One spell at a club, with optional year bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClubStint {
    pub club: String,
    #[serde(default)]
    pub from: Option<i32>,
    #[serde(default)]
    pub to: Option<i32>,
}

/// One recorded honor, e.g. a treble season.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Honor {
    #[serde(rename = "type")]
    pub honor_type: String,
    #[serde(default)]
    pub club: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
}

/// Everything the checkers may know about one player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerFacts {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub clubs: Vec<String>,
    #[serde(default)]
    pub leagues: Vec<String>,
    #[serde(default)]
    pub world_cup_years: Vec<i32>,
    #[serde(default)]
    pub club_history: Vec<ClubStint>,
    #[serde(default)]
    pub honors: Vec<Honor>,
    #[serde(default)]
    pub career_score: f64,
}

impl PlayerFacts {
    /// All clubs the player is known to have played for, whichever shape
    /// the dataset used.
    pub fn all_clubs(&self) -> Vec<&str> {
        let mut clubs: Vec<&str> = self.clubs.iter().map(String::as_str).collect();
        for stint in &self.club_history {
            if !clubs.iter().any(|c| c.eq_ignore_ascii_case(&stint.club)) {
                clubs.push(&stint.club);
            }
        }
        clubs
    }

    /// The stint covering `club`, if the structured history has one.
    pub fn stint_at(&self, club: &str) -> Option<&ClubStint> {
        self.club_history
            .iter()
            .find(|s| s.club.eq_ignore_ascii_case(club))
    }
}

/// Case-insensitive name/alias index over a knowledge dataset.
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    players: Vec<PlayerFacts>,
    index: FxHashMap<String, usize>,
}

impl KnowledgeBase {
    pub fn from_players(players: Vec<PlayerFacts>) -> Self {
        let mut base = KnowledgeBase {
            players,
            index: FxHashMap::default(),
        };
        for (i, player) in base.players.iter().enumerate() {
            let key = player.name.trim().to_lowercase();
            if !key.is_empty() {
                base.index.entry(key).or_insert(i);
            }
            for alias in &player.aliases {
                let key = alias.trim().to_lowercase();
                if !key.is_empty() {
                    base.index.entry(key).or_insert(i);
                }
            }
        }
        base
    }

    /// Load a knowledge file. Accepts three layouts: JSONL (one record per
    /// line), a JSON list of records, or a JSON object keyed by player
    /// name. A missing file yields an empty base.
    pub fn load(path: &Path) -> Result<Self, RosterError> {
        if !path.exists() {
            debug!("knowledge file {} missing, starting empty", path.display());
            return Ok(KnowledgeBase::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| RosterError::dataset(path, e.to_string()))?;

        let players = if path.extension().map_or(false, |ext| ext == "jsonl") {
            let mut players = Vec::new();
            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let player: PlayerFacts = serde_json::from_str(line)
                    .map_err(|e| RosterError::dataset(path, e.to_string()))?;
                players.push(player);
            }
            players
        } else {
            let value: serde_json::Value = serde_json::from_str(&content)
                .map_err(|e| RosterError::dataset(path, e.to_string()))?;
            match value {
                serde_json::Value::Array(items) => items
                    .into_iter()
                    .map(serde_json::from_value)
                    .collect::<Result<Vec<PlayerFacts>, _>>()
                    .map_err(|e| RosterError::dataset(path, e.to_string()))?,
                serde_json::Value::Object(map) => {
                    let mut players = Vec::new();
                    for (name, item) in map {
                        let mut player: PlayerFacts = serde_json::from_value(item)
                            .map_err(|e| RosterError::dataset(path, e.to_string()))?;
                        if player.name.trim().is_empty() {
                            player.name = name;
                        }
                        players.push(player);
                    }
                    players
                }
                other => {
                    return Err(RosterError::dataset(
                        path,
                        format!("expected a list or object, got {}", kind_of(&other)),
                    ))
                }
            }
        };

        debug!("loaded {} knowledge entries from {}", players.len(), path.display());
        Ok(KnowledgeBase::from_players(players))
    }

    pub fn get(&self, name: &str) -> Option<&PlayerFacts> {
        self.index
            .get(&name.trim().to_lowercase())
            .map(|&i| &self.players[i])
    }

    pub fn all_names(&self) -> Vec<&str> {
        self.players.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn players(&self) -> &[PlayerFacts] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const RECORD: &str = r#"{"name": "Lionel Messi", "aliases": ["La Pulga"],
        "nationality": "Argentina", "world_cup_years": [2022],
        "club_history": [{"club": "Barcelona", "from": 2004, "to": 2021}],
        "honors": [{"type": "treble", "club": "Barcelona", "season": "2014-15"}]}"#;

    #[test]
    fn test_load_jsonl_layout() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(file, "{}", RECORD.replace('\n', " ")).unwrap();
        writeln!(file, r#"{{"name": "Neymar"}}"#).unwrap();

        let base = KnowledgeBase::load(file.path()).unwrap();
        assert_eq!(base.len(), 2);
        assert!(base.get("lionel messi").is_some());
    }

    #[test]
    fn test_load_list_layout() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "[{}]", RECORD).unwrap();
        let base = KnowledgeBase::load(file.path()).unwrap();
        assert_eq!(base.len(), 1);
        assert_eq!(base.get("Lionel Messi").unwrap().world_cup_years, vec![2022]);
    }

    #[test]
    fn test_load_name_keyed_layout_fills_name() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"Xavi": {{"nationality": "Spain"}}, "Iniesta": {{"name": "Andres Iniesta"}}}}"#
        )
        .unwrap();
        let base = KnowledgeBase::load(file.path()).unwrap();
        assert_eq!(base.len(), 2);
        assert_eq!(base.get("xavi").unwrap().name, "Xavi");
        // An explicit name field wins over the object key.
        assert!(base.get("andres iniesta").is_some());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let base = KnowledgeBase::load(Path::new("/nonexistent/knowledge.json")).unwrap();
        assert!(base.is_empty());
        assert!(base.get("anyone").is_none());
    }

    #[test]
    fn test_alias_lookup_case_insensitive() {
        let base = KnowledgeBase::from_players(vec![PlayerFacts {
            name: "Lionel Messi".to_string(),
            aliases: vec!["La Pulga".to_string()],
            ..Default::default()
        }]);
        assert!(base.get("LA PULGA").is_some());
        assert!(base.get("  lionel messi ").is_some());
    }

    #[test]
    fn test_all_clubs_merges_both_shapes() {
        let facts = PlayerFacts {
            clubs: vec!["Barcelona".to_string()],
            club_history: vec![
                ClubStint {
                    club: "barcelona".to_string(),
                    from: Some(2004),
                    to: Some(2021),
                },
                ClubStint {
                    club: "Paris Saint-Germain".to_string(),
                    from: Some(2021),
                    to: None,
                },
            ],
            ..Default::default()
        };
        let clubs = facts.all_clubs();
        assert_eq!(clubs.len(), 2);
        assert!(facts.stint_at("BARCELONA").is_some());
    }

    #[test]
    fn test_scalar_top_level_rejected() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "42").unwrap();
        assert!(KnowledgeBase::load(file.path()).is_err());
    }
}
