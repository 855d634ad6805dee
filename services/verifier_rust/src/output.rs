//! JSON payload shapes for the CLI, written to a file or stdout.

use anyhow::{Context, Result};
use pitchquiz_roster_core::{CandidateSummary, MatchRecord, TokenSuggestion, Verdict};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Full output of the `match` subcommand.
#[derive(Debug, Serialize)]
pub struct MatchReport {
    pub token_count: usize,
    pub records: Vec<MatchRecord>,
    pub token_suggestions: BTreeMap<usize, Vec<TokenSuggestion>>,
    pub candidates: Vec<CandidateSummary>,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

/// Output of the `prompt` subcommand.
#[derive(Debug, Serialize)]
pub struct PromptReport {
    pub names: Vec<String>,
    pub initial_prompt: Option<String>,
}

/// Output of the `check` subcommand.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub checker: &'static str,
    pub question: String,
    pub names: Vec<String>,
    pub verdict: Verdict,
}

/// Serialize `value` as pretty JSON to `output`, or stdout when absent.
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing report")?;
    match output {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("writing report to {}", path.display()))?,
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", json).context("writing report to stdout")?;
        }
    }
    Ok(())
}
