//! Stage-1 ASR payload parsing.
//!
//! The transcription stage writes a JSON payload of segments, each with
//! word tokens carrying clip-relative timing and confidence. Timestamp
//! marker tokens and empty texts are skipped; everything else becomes a
//! matcher [`Token`].

use anyhow::{Context, Result};
use log::debug;
use pitchquiz_roster_core::{word_tokens, Token};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct Stage1Payload {
    #[serde(default)]
    segments: Vec<Stage1Segment>,
}

#[derive(Debug, Deserialize)]
struct Stage1Segment {
    #[serde(default)]
    tokens: Vec<Stage1Token>,
    #[serde(default)]
    avg_logprob: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Stage1Token {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    start: Option<f64>,
    #[serde(default)]
    end: Option<f64>,
    #[serde(default)]
    probability: Option<f64>,
    #[serde(default)]
    is_timestamp: bool,
}

/// Parse a stage-1 payload file into matcher tokens for one pass.
pub fn load_tokens(path: &Path, pass: usize) -> Result<Vec<Token>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading ASR payload {}", path.display()))?;
    let payload: Stage1Payload = serde_json::from_str(&content)
        .with_context(|| format!("parsing ASR payload {}", path.display()))?;

    let mut tokens = Vec::new();
    for segment in &payload.segments {
        for token in &segment.tokens {
            if token.is_timestamp {
                continue;
            }
            let text = match token.text.as_deref().map(str::trim) {
                Some(t) if !t.is_empty() => t.to_string(),
                _ => continue,
            };
            let start = token.start.unwrap_or(0.0);
            let end = token.end.unwrap_or(start);
            tokens.push(Token {
                text,
                start,
                end,
                probability: token.probability,
                avg_logprob: segment.avg_logprob,
                pass,
            });
        }
    }
    debug!("loaded {} tokens from {}", tokens.len(), path.display());
    Ok(tokens)
}

/// Split a plain transcript into matcher tokens. No timing is available,
/// so tokens get zeroed times and full confidence.
pub fn transcript_tokens(text: &str, pass: usize) -> Vec<Token> {
    word_tokens(text)
        .into_iter()
        .map(|word| Token {
            text: word,
            start: 0.0,
            end: 0.0,
            probability: Some(1.0),
            avg_logprob: Some(0.0),
            pass,
        })
        .collect()
}
