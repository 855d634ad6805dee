//! Question verification against resolved players.
//!
//! Two checkers share one contract: given the resolved player names and
//! the quiz question, decide whether every player satisfies the question.
//! [`RuleBasedChecker`] answers from the local knowledge base alone;
//! [`LlmChecker`] delegates the reasoning to an injected [`LlmClient`]
//! while still supplying knowledge snippets as context.

use crate::error::RosterError;
use crate::knowledge::KnowledgeBase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of a condition check with a human-readable justification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub ok: bool,
    pub detail: String,
}

impl Verdict {
    pub fn positive(detail: impl Into<String>) -> Self {
        Verdict {
            ok: true,
            detail: detail.into(),
        }
    }

    pub fn negative(detail: impl Into<String>) -> Self {
        Verdict {
            ok: false,
            detail: detail.into(),
        }
    }
}

fn strip_tail(text: &str) -> &str {
    text.trim_matches(|c: char| "?.! ".contains(c))
}

/// Single-pass classifier over the question text. Recognized shapes, in
/// priority order: world cup, treble (optionally "with <club>"), played
/// for / club membership, nationality. Anything else is rejected rather
/// than guessed at.
pub struct RuleBasedChecker<'a> {
    knowledge: &'a KnowledgeBase,
}

impl<'a> RuleBasedChecker<'a> {
    pub fn new(knowledge: &'a KnowledgeBase) -> Self {
        RuleBasedChecker { knowledge }
    }

    pub fn check(&self, names: &[String], question: &str) -> Verdict {
        if names.is_empty() {
            return Verdict::negative("No names extracted from transcript.");
        }
        let q = question.to_lowercase();
        let q = q.trim();
        if !q.contains("all") {
            return Verdict::negative("Question must include an 'all' constraint.");
        }

        if q.contains("world cup") {
            return self.check_world_cup(names);
        }
        if q.contains("treble") {
            let club = q
                .split_once("with")
                .map(|(_, tail)| strip_tail(tail).to_string())
                .filter(|c| !c.is_empty());
            return self.check_treble(names, club.as_deref());
        }
        if q.contains("played for") || q.contains("play for") || q.contains("club") {
            let tail = q
                .split_once("played for")
                .or_else(|| q.split_once("play for"))
                .or_else(|| q.split_once("club"))
                .map(|(_, t)| t)
                .unwrap_or("");
            return self.check_club(names, strip_tail(tail));
        }
        if q.contains("national") || q.contains("are") {
            return self.check_nationality(names, q);
        }

        Verdict::negative("Rule-based checker does not support this question type.")
    }

    fn check_world_cup(&self, names: &[String]) -> Verdict {
        let mut details = Vec::new();
        for name in names {
            let player = match self.knowledge.get(name) {
                Some(p) => p,
                None => return Verdict::negative(format!("Missing knowledge for {}.", name)),
            };
            if player.world_cup_years.is_empty() {
                return Verdict::negative(format!("{} never played in a World Cup.", name));
            }
            let years: Vec<String> = player
                .world_cup_years
                .iter()
                .map(|y| y.to_string())
                .collect();
            details.push(format!("{}: {}", name, years.join(", ")));
        }
        Verdict::positive(format!(
            "All players have World Cup appearances. {}",
            details.join("; ")
        ))
    }

    fn check_treble(&self, names: &[String], club: Option<&str>) -> Verdict {
        let mut details = Vec::new();
        for name in names {
            let player = match self.knowledge.get(name) {
                Some(p) => p,
                None => return Verdict::negative(format!("Missing knowledge for {}.", name)),
            };
            let won = player.honors.iter().find(|h| {
                h.honor_type == "treble"
                    && club.map_or(true, |c| {
                        h.club
                            .as_deref()
                            .map_or(false, |hc| hc.eq_ignore_ascii_case(c))
                    })
            });
            match won {
                Some(honor) => {
                    if let Some(season) = honor.season.as_deref() {
                        details.push(format!("{}: {}", name, season));
                    }
                }
                None => {
                    return Verdict::negative(match club {
                        Some(c) => format!("{} did not win a treble with {}.", name, c),
                        None => format!("{} did not win a treble.", name),
                    })
                }
            }
        }
        let mut detail = match club {
            Some(c) => format!("All players won a treble with {}.", c),
            None => "All players won a treble.".to_string(),
        };
        if !details.is_empty() {
            detail.push(' ');
            detail.push_str(&details.join("; "));
        }
        Verdict::positive(detail)
    }

    fn check_club(&self, names: &[String], club: &str) -> Verdict {
        let mut details = Vec::new();
        for name in names {
            let player = match self.knowledge.get(name) {
                Some(p) => p,
                None => return Verdict::negative(format!("Missing knowledge for {}.", name)),
            };
            let played = player
                .all_clubs()
                .iter()
                .any(|c| c.eq_ignore_ascii_case(club));
            if !club.is_empty() && !played {
                return Verdict::negative(format!("{} did not play for {}.", name, club));
            }
            if let Some(stint) = player.stint_at(club) {
                let from = stint.from.map_or("?".to_string(), |y| y.to_string());
                let to = stint.to.map_or("present".to_string(), |y| y.to_string());
                details.push(format!("{}: {} to {}", name, from, to));
            }
        }
        let mut detail = format!("All players played for {}.", club);
        if !details.is_empty() {
            detail.push(' ');
            detail.push_str(&details.join("; "));
        }
        Verdict::positive(detail)
    }

    fn check_nationality(&self, names: &[String], q: &str) -> Verdict {
        for name in names {
            let player = match self.knowledge.get(name) {
                Some(p) => p,
                None => return Verdict::negative(format!("Missing knowledge for {}.", name)),
            };
            let nationality = player
                .nationality
                .as_deref()
                .unwrap_or("")
                .to_lowercase();
            if !nationality.is_empty() && q.contains(&nationality) {
                continue;
            }
            if q.contains("are") && !nationality.is_empty() {
                return Verdict::negative(format!("{} is not the named nationality.", name));
            }
        }
        Verdict::positive("All players match the nationality constraint.")
    }
}

/// The one capability a verification backend must provide. Concrete
/// providers are constructed by the caller and injected.
pub trait LlmClient {
    fn ask(&self, prompt: &str) -> Result<String, RosterError>;
}

/// Placeholder client for runs with no LLM configured; every ask fails.
pub struct NullLlmClient;

impl LlmClient for NullLlmClient {
    fn ask(&self, _prompt: &str) -> Result<String, RosterError> {
        Err(RosterError::Config(
            "no LLM configured, provide an LlmClient implementation".to_string(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct LlmReply {
    answer: bool,
    #[serde(default)]
    justification: String,
}

/// Parse a reply that should be the strict verdict JSON, tolerating code
/// fences and surrounding prose by retrying on the outermost braces.
fn parse_reply(raw: &str) -> Option<LlmReply> {
    if let Ok(reply) = serde_json::from_str::<LlmReply>(raw.trim()) {
        return Some(reply);
    }
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

/// Condition checker that hands the question and knowledge snippets to an
/// LLM and expects the strict `{"answer", "justification"}` JSON back.
pub struct LlmChecker<'a, C: LlmClient> {
    knowledge: &'a KnowledgeBase,
    client: &'a C,
}

impl<'a, C: LlmClient> LlmChecker<'a, C> {
    pub fn new(knowledge: &'a KnowledgeBase, client: &'a C) -> Self {
        LlmChecker { knowledge, client }
    }

    fn build_context(&self, names: &[String]) -> Vec<serde_json::Value> {
        names
            .iter()
            .map(|name| match self.knowledge.get(name) {
                Some(player) => {
                    serde_json::to_value(player).unwrap_or_else(|_| {
                        serde_json::json!({ "name": name, "missing": true })
                    })
                }
                None => serde_json::json!({ "name": name, "missing": true }),
            })
            .collect()
    }

    pub fn check(&self, names: &[String], question: &str) -> Result<Verdict, RosterError> {
        if names.is_empty() {
            return Ok(Verdict::negative("No names extracted from transcript."));
        }
        let context = serde_json::to_string(&self.build_context(names))
            .map_err(|e| RosterError::VerificationParse(e.to_string()))?;
        let prompt = format!(
            "You are given a question and a JSON knowledge base for the named players. \
             Answer with strict JSON: {{\"answer\": true|false, \"justification\": \"...\"}}. \
             Include years/dates in the justification if present in the knowledge.\n\
             Question: {}\nPlayers: {}",
            question, context
        );

        let raw = self.client.ask(&prompt)?;
        match parse_reply(&raw) {
            Some(reply) => {
                let justification = if reply.justification.is_empty() {
                    "LLM did not provide justification.".to_string()
                } else {
                    reply.justification
                };
                Ok(Verdict {
                    ok: reply.answer,
                    detail: justification,
                })
            }
            None => Ok(Verdict::negative("LLM response was not valid JSON.")),
        }
    }
}

/// Per-player verification outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmResult {
    pub answer: bool,
    pub justification: String,
}

/// Ask the client about each player individually. A reply that is not the
/// strict verdict JSON degrades to a keyword heuristic over the raw text;
/// a failed ask records a negative result rather than aborting the batch.
pub fn verify_players(
    client: &dyn LlmClient,
    names: &[String],
    question: &str,
) -> BTreeMap<String, LlmResult> {
    let mut results = BTreeMap::new();
    for name in names {
        let prompt = format!(
            "Answer the question for the single player below. \
             Return strict JSON: {{\"answer\": true|false, \"justification\": \"...\"}}. \
             Include years/dates if relevant.\n\
             Question: {}\nPlayer: {}\n",
            question, name
        );
        let result = match client.ask(&prompt) {
            Ok(raw) => match parse_reply(&raw) {
                Some(reply) => LlmResult {
                    answer: reply.answer,
                    justification: reply.justification,
                },
                None => {
                    let lower = raw.to_lowercase();
                    LlmResult {
                        answer: lower.contains("true") || lower.contains("yes"),
                        justification: raw,
                    }
                }
            },
            Err(err) => LlmResult {
                answer: false,
                justification: format!("Error: {}", err),
            },
        };
        results.insert(name.clone(), result);
    }
    results
}
