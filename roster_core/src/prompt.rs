//! Biasing-vocabulary selection for the speech engine.
//!
//! Given the quiz question, rank knowledge entries by how relevant they
//! look to the question text and hand the best names to the transcriber as
//! a hint. The list is advisory; the engine is free to ignore it.

use crate::dictionary::NameDictionary;
use crate::knowledge::{KnowledgeBase, PlayerFacts};
use crate::text::last_name;
use log::debug;

/// Question text following `keyword`, trimmed of trailing punctuation.
pub fn extract_phrase<'a>(question: &'a str, keyword: &str) -> Option<&'a str> {
    let idx = question.find(keyword)?;
    let tail = question[idx + keyword.len()..].trim_matches(|c: char| " ?.!,:;".contains(c));
    (!tail.is_empty()).then_some(tail)
}

const PREMIER_LEAGUE_ALIASES: &[&str] = &[
    "english premier league",
    "eng premier league",
    "premier league",
    "gb1",
];

fn any_keyword(q: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| q.contains(k))
}

/// Rule-based relevance of one knowledge entry to a question. Positive
/// means the entry looks on-topic; an explicit position mismatch against a
/// position-specific question scores a penalty.
pub fn relevance_score(question: &str, entry: &PlayerFacts) -> i32 {
    let q = question.to_lowercase();
    let mut score = 0;
    let position = entry
        .position
        .as_deref()
        .unwrap_or("")
        .to_lowercase();

    if let Some(nationality) = entry.nationality.as_deref() {
        let nationality = nationality.to_lowercase();
        if !nationality.is_empty() && q.contains(&nationality) {
            score += 3;
        }
    }

    let club_phrase = extract_phrase(&q, "played for").or_else(|| extract_phrase(&q, "play for"));
    if let Some(phrase) = club_phrase {
        let clubs: Vec<String> = entry.all_clubs().iter().map(|c| c.to_lowercase()).collect();
        if clubs.iter().any(|c| c.contains(phrase)) {
            score += 4;
        }
    }

    let leagues: Vec<String> = entry.leagues.iter().map(|l| l.to_lowercase()).collect();
    let league_targets: &[&str] = if q.contains("premier league") {
        PREMIER_LEAGUE_ALIASES
    } else {
        &[]
    };
    if leagues.iter().any(|l| q.contains(l.as_str()))
        || leagues
            .iter()
            .any(|l| league_targets.iter().any(|t| l.contains(t)))
    {
        score += 3;
    }

    if !position.is_empty() && q.contains(&position) {
        score += 1;
    }
    if any_keyword(&q, &["goalkeeper", "keeper"])
        && (position.contains("goal") || position == "gk")
    {
        score += 2;
    }
    if any_keyword(&q, &["defender", "defence", "defense", "cb", "lb", "rb", "fullback", "full-back"]) {
        if any_keyword(&position, &["def", "cb", "lb", "rb", "lwb", "rwb", "back"]) {
            score += 5;
        } else if !position.is_empty() {
            score -= 1;
        }
    }
    if any_keyword(&q, &["midfielder", "midfield", "cm", "dm", "am"]) {
        if any_keyword(&position, &["mid", "cm", "dm", "am"]) {
            score += 3;
        } else if !position.is_empty() {
            score -= 1;
        }
    }
    if any_keyword(&q, &["forward", "striker", "winger", "attack"]) {
        if any_keyword(&position, &["for", "wing", "att", "st"]) {
            score += 3;
        } else if !position.is_empty() {
            score -= 1;
        }
    }

    score
}

/// Pick the vocabulary for the biasing prompt.
///
/// With a question and a non-empty knowledge base: entries with positive
/// relevance, ordered by relevance, then career score, then name. When
/// nothing scores positive the whole candidate set is kept in load order.
/// Without a question or knowledge, the dictionary's distinct display
/// names are used.
pub fn select_prompt_names(
    question: Option<&str>,
    knowledge: &KnowledgeBase,
    fallback: Option<&NameDictionary>,
    limit: usize,
    last_names_only: bool,
) -> Vec<String> {
    let question = question.map(str::trim).filter(|q| !q.is_empty());

    let mut names: Vec<String> = match question {
        Some(q) if !knowledge.is_empty() => {
            let mut scored: Vec<(i32, f64, &PlayerFacts)> = knowledge
                .players()
                .iter()
                .map(|p| (relevance_score(q, p), p.career_score, p))
                .collect();
            scored.sort_by(|a, b| {
                b.0.cmp(&a.0)
                    .then_with(|| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal))
                    .then_with(|| a.2.name.to_lowercase().cmp(&b.2.name.to_lowercase()))
            });
            let positive: Vec<String> = scored
                .iter()
                .filter(|(s, _, p)| *s > 0 && !p.name.is_empty())
                .map(|(_, _, p)| p.name.clone())
                .collect();
            if positive.is_empty() {
                debug!("no knowledge entry scored positive, keeping full candidate set");
                knowledge
                    .players()
                    .iter()
                    .filter(|p| !p.name.is_empty())
                    .map(|p| p.name.clone())
                    .collect()
            } else {
                positive
            }
        }
        _ => match fallback {
            Some(dict) => dict.display_names(),
            None => knowledge
                .players()
                .iter()
                .filter(|p| !p.name.is_empty())
                .map(|p| p.name.clone())
                .collect(),
        },
    };

    if last_names_only {
        names = names
            .iter()
            .map(|n| last_name(n).to_string())
            .filter(|n| !n.is_empty())
            .collect();
    }
    names.truncate(limit);
    names
}

/// The biasing string handed to the speech engine.
pub fn build_initial_prompt(names: &[String]) -> Option<String> {
    if names.is_empty() {
        return None;
    }
    Some(format!("Football players mentioned: {}", names.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::PlayerRecord;
    use crate::scoring::ScoringWeights;

    fn facts(name: &str) -> PlayerFacts {
        PlayerFacts {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_goalkeeper_premier_league_ranks_first() {
        let mut keeper = facts("Alisson Becker");
        keeper.position = Some("Goalkeeper".to_string());
        keeper.leagues = vec!["Premier League".to_string()];
        let mut striker = facts("Robert Lewandowski");
        striker.position = Some("Striker".to_string());
        striker.leagues = vec!["Bundesliga".to_string()];
        let base = KnowledgeBase::from_players(vec![striker, keeper]);

        let names = select_prompt_names(
            Some("Are all of these goalkeepers in the Premier League?"),
            &base,
            None,
            10,
            false,
        );
        assert_eq!(names[0], "Alisson Becker");
    }

    #[test]
    fn test_played_for_phrase_boosts_club() {
        let mut veteran = facts("Xavi");
        veteran.clubs = vec!["Barcelona".to_string()];
        let other = facts("Steven Gerrard");
        let base = KnowledgeBase::from_players(vec![other, veteran]);

        let names = select_prompt_names(
            Some("Did all of them play for Barcelona?"),
            &base,
            None,
            10,
            false,
        );
        assert_eq!(names, vec!["Xavi".to_string()]);
    }

    #[test]
    fn test_no_positive_scores_keeps_full_set() {
        let base = KnowledgeBase::from_players(vec![facts("Xavi"), facts("Andres Iniesta")]);
        let names = select_prompt_names(
            Some("Did all of them win a treble?"),
            &base,
            None,
            10,
            false,
        );
        assert_eq!(names.len(), 2);
        assert_eq!(names[0], "Xavi");
    }

    #[test]
    fn test_dictionary_fallback_without_question() {
        let dict = NameDictionary::build(
            vec![
                PlayerRecord {
                    name: Some("Neymar".to_string()),
                    ..Default::default()
                },
                PlayerRecord {
                    name: Some("Lionel Messi".to_string()),
                    ..Default::default()
                },
            ],
            &ScoringWeights::default(),
        );
        let names =
            select_prompt_names(None, &KnowledgeBase::default(), Some(&dict), 10, false);
        assert_eq!(names, vec!["Lionel Messi".to_string(), "Neymar".to_string()]);
    }

    #[test]
    fn test_last_names_and_limit() {
        let base = KnowledgeBase::from_players(vec![
            facts("Lionel Messi"),
            facts("Cristiano Ronaldo"),
            facts("Neymar"),
        ]);
        let names = select_prompt_names(None, &base, None, 2, true);
        assert_eq!(names, vec!["Messi".to_string(), "Ronaldo".to_string()]);
    }

    #[test]
    fn test_build_initial_prompt() {
        assert_eq!(build_initial_prompt(&[]), None);
        let names = vec!["Messi".to_string(), "Neymar".to_string()];
        assert_eq!(
            build_initial_prompt(&names).as_deref(),
            Some("Football players mentioned: Messi, Neymar")
        );
    }

    #[test]
    fn test_position_mismatch_penalized() {
        let mut striker = facts("Robert Lewandowski");
        striker.position = Some("Striker".to_string());
        assert!(relevance_score("Are all of these defenders?", &striker) < 0);
    }

    #[test]
    fn test_extract_phrase() {
        assert_eq!(
            extract_phrase("did they play for real madrid?", "play for"),
            Some("real madrid")
        );
        assert_eq!(extract_phrase("no club here", "played for"), None);
    }
}
