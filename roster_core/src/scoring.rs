//! Career prominence scoring.
//!
//! This module provides:
//! - Static prestige tables for clubs and leagues
//! - An injectable [`ScoringWeights`] configuration
//! - The composite career score used to rank same-named players
//!
//! The score is derived from club/league prestige, playing time and goal
//! contributions, not from an externally sourced popularity measure. The
//! constants are tuned defaults; callers may supply their own tables.

use crate::text::normalize;
use rustc_hash::FxHashMap;

/// Prestige weights for historically dominant clubs across the top
/// European leagues. Keys are normalized club names.
static CLUB_PRESTIGE: &[(&str, f64)] = &[
    ("real madrid", 100.0),
    ("barcelona", 98.0),
    ("fc barcelona", 98.0),
    ("manchester united", 95.0),
    ("bayern munich", 95.0),
    ("fc bayern munchen", 95.0),
    ("liverpool", 92.0),
    ("ac milan", 92.0),
    ("milan", 92.0),
    ("juventus", 90.0),
    ("inter milan", 88.0),
    ("internazionale", 88.0),
    ("chelsea", 88.0),
    ("arsenal", 85.0),
    ("manchester city", 85.0),
    ("atletico madrid", 82.0),
    ("atletico de madrid", 82.0),
    ("borussia dortmund", 80.0),
    ("paris saint germain", 80.0),
    ("psg", 80.0),
    ("tottenham hotspur", 75.0),
    ("tottenham", 75.0),
    ("ajax", 75.0),
    ("benfica", 72.0),
    ("porto", 72.0),
    ("fc porto", 72.0),
    ("napoli", 72.0),
    ("roma", 70.0),
    ("as roma", 70.0),
    ("sevilla", 68.0),
    ("valencia", 65.0),
    ("lazio", 65.0),
    ("olympique marseille", 62.0),
    ("marseille", 62.0),
    ("olympique lyonnais", 62.0),
    ("lyon", 62.0),
    ("monaco", 60.0),
    ("as monaco", 60.0),
    ("leicester city", 55.0),
    ("everton", 55.0),
    ("west ham united", 52.0),
    ("newcastle united", 52.0),
    ("villarreal", 52.0),
    ("bayer leverkusen", 55.0),
    ("rb leipzig", 52.0),
    ("schalke 04", 50.0),
    ("atalanta", 50.0),
    ("celtic", 48.0),
    ("rangers", 45.0),
];

/// Prestige weights for leagues and continental competitions. Keys are
/// normalized league names.
static LEAGUE_PRESTIGE: &[(&str, f64)] = &[
    ("uefa champions league", 60.0),
    ("champions league", 60.0),
    ("uefa europa league", 45.0),
    ("europa league", 45.0),
    ("english premier league", 50.0),
    ("premier league", 50.0),
    ("la liga", 50.0),
    ("laliga", 50.0),
    ("primera division", 50.0),
    ("serie a", 48.0),
    ("bundesliga", 48.0),
    ("ligue 1", 45.0),
    ("eredivisie", 35.0),
    ("primeira liga", 35.0),
    ("liga portugal", 35.0),
    ("championship", 28.0),
    ("mls", 25.0),
    ("major league soccer", 25.0),
    ("saudi pro league", 25.0),
];

/// Injectable configuration for [`career_score`]. `Default` carries the
/// tuned constants; every multiplier can be overridden.
#[derive(Debug, Clone)]
pub struct ScoringWeights {
    /// Normalized club name -> prestige weight.
    pub club_prestige: FxHashMap<String, f64>,
    /// Normalized league name -> prestige weight.
    pub league_prestige: FxHashMap<String, f64>,
    /// Weight for a current club absent from the table.
    pub default_club_weight: f64,
    /// Weight for a historical club absent from the table.
    pub default_past_club_weight: f64,
    /// Weight for a current league absent from the table.
    pub default_league_weight: f64,
    /// Weight for a historical league absent from the table.
    pub default_past_league_weight: f64,
    /// Fraction of a historical club's table weight that counts.
    pub past_club_factor: f64,
    /// Fraction of a historical league's table weight that counts.
    pub past_league_factor: f64,
    /// Cap on the playing-time term.
    pub experience_cap: f64,
    /// Multiplier applied to log10(minutes + 1).
    pub experience_log_factor: f64,
    pub goal_weight: f64,
    pub assist_weight: f64,
    /// Points per data source covering the player.
    pub source_weight: f64,
    /// Flat bonus when "worldcup" is among the sources.
    pub world_cup_bonus: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        let club_prestige = CLUB_PRESTIGE
            .iter()
            .map(|(name, w)| (name.to_string(), *w))
            .collect();
        let league_prestige = LEAGUE_PRESTIGE
            .iter()
            .map(|(name, w)| (name.to_string(), *w))
            .collect();
        Self {
            club_prestige,
            league_prestige,
            default_club_weight: 30.0,
            default_past_club_weight: 20.0,
            default_league_weight: 20.0,
            default_past_league_weight: 15.0,
            past_club_factor: 0.3,
            past_league_factor: 0.2,
            experience_cap: 25.0,
            experience_log_factor: 8.0,
            goal_weight: 1.5,
            assist_weight: 1.0,
            source_weight: 5.0,
            world_cup_bonus: 30.0,
        }
    }
}

impl ScoringWeights {
    fn club_weight(&self, club: &str, default: f64) -> f64 {
        let key = normalize(club);
        self.club_prestige.get(&key).copied().unwrap_or(default)
    }

    fn league_weight(&self, league: &str, default: f64) -> f64 {
        let key = normalize(league);
        self.league_prestige.get(&key).copied().unwrap_or(default)
    }
}

/// Input fields for the career score, decoupled from the dataset record so
/// the formula stays independent of serde shapes.
#[derive(Debug, Clone, Default)]
pub struct CareerFacts<'a> {
    pub current_club: Option<&'a str>,
    pub past_clubs: &'a [String],
    pub current_league: Option<&'a str>,
    pub past_leagues: &'a [String],
    pub minutes_played: Option<f64>,
    pub goals: f64,
    pub assists: f64,
    pub sources: &'a [String],
}

/// Composite career prominence score: additive over club prestige, league
/// prestige, playing time, goal contributions and source coverage. Rounded
/// to 2 decimals; deterministic for identical inputs.
pub fn career_score(facts: &CareerFacts<'_>, weights: &ScoringWeights) -> f64 {
    let mut score = 0.0;

    if let Some(club) = facts.current_club {
        score += weights.club_weight(club, weights.default_club_weight);
    }
    for club in facts.past_clubs {
        score +=
            weights.club_weight(club, weights.default_past_club_weight) * weights.past_club_factor;
    }

    if let Some(league) = facts.current_league {
        score += weights.league_weight(league, weights.default_league_weight);
    }
    for league in facts.past_leagues {
        score += weights.league_weight(league, weights.default_past_league_weight)
            * weights.past_league_factor;
    }

    if let Some(minutes) = facts.minutes_played {
        let experience = (minutes.max(0.0) + 1.0).log10() * weights.experience_log_factor;
        score += experience.min(weights.experience_cap);
    }

    score += facts.goals * weights.goal_weight + facts.assists * weights.assist_weight;

    score += facts.sources.len() as f64 * weights.source_weight;
    if facts.sources.iter().any(|s| s.eq_ignore_ascii_case("worldcup")) {
        score += weights.world_cup_bonus;
    }

    (score * 100.0).round() / 100.0
}
