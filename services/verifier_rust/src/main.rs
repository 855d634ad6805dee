//! Verifier Service (Rust)
//!
//! Responsibilities:
//! - Match stage-1 ASR tokens (or a plain transcript) against the player
//!   dictionary and emit the ranked match payload
//! - Build the biasing vocabulary and initial prompt for transcription
//! - Check quiz questions against resolved players (rules or LLM)
//! - Extract clip audio as 16kHz mono wav via ffmpeg
//!
//! Exit codes: 0 success / positive verdict, 1 negative verdict,
//! 2 configuration or external failure.

mod asr;
mod audio;
mod output;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use log::{error, warn};
use pitchquiz_roster_core::{
    build_initial_prompt, candidate_summary, fold_token_suggestions, process_pass,
    select_prompt_names, verify_players, KnowledgeBase, LlmChecker, MatchConfig, Matcher,
    NameDictionary, NullLlmClient, RuleBasedChecker, ScoringWeights, SearchCache, Verdict,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "verifier",
    version,
    about = "Footballer name matching and quiz question verification"
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Match ASR tokens against the player dictionary
    Match(MatchArgs),
    /// Build the biasing vocabulary for the speech engine
    Prompt(PromptArgs),
    /// Check a question against resolved player names
    Check(CheckArgs),
    /// Extract a clip's audio as a 16kHz mono wav
    ExtractAudio(ExtractAudioArgs),
}

#[derive(Args)]
struct MatchArgs {
    /// Stage-1 ASR payload (JSON with segments/tokens)
    #[arg(long)]
    tokens: Option<PathBuf>,
    /// Plain transcript text, or a path to a text file
    #[arg(long, conflicts_with = "tokens")]
    transcript: Option<String>,
    /// Player dataset (JSONL)
    #[arg(long)]
    players: PathBuf,
    #[arg(long, default_value_t = 1)]
    min_gram: usize,
    #[arg(long, default_value_t = 4)]
    max_gram: usize,
    /// Minimum fuzzy similarity, 0-100
    #[arg(long, default_value_t = 70.0)]
    fuzzy_threshold: f64,
    #[arg(long, default_value_t = 5)]
    max_suggestions: usize,
    /// Cap on the ranked candidate summary
    #[arg(long, default_value_t = 50)]
    max_candidates: usize,
    /// Write the JSON report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct PromptArgs {
    /// Quiz question used to rank knowledge entries
    #[arg(long)]
    question: Option<String>,
    /// Knowledge base file (.json or .jsonl)
    #[arg(long)]
    knowledge: Option<PathBuf>,
    /// Player dataset used as fallback vocabulary
    #[arg(long)]
    players: Option<PathBuf>,
    #[arg(long, default_value_t = 1000)]
    limit: usize,
    /// Emit last names only
    #[arg(long)]
    last_names: bool,
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct CheckArgs {
    #[arg(long)]
    question: String,
    /// Resolved player names (repeatable or comma-separated)
    #[arg(long, required = true, value_delimiter = ',')]
    names: Vec<String>,
    /// Knowledge base file (.json or .jsonl)
    #[arg(long)]
    knowledge: Option<PathBuf>,
    /// Use the LLM checker instead of the rule-based one
    #[arg(long)]
    llm: bool,
    /// Ask the LLM about each player individually
    #[arg(long, requires = "llm")]
    per_player: bool,
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ExtractAudioArgs {
    /// Source video file
    video: PathBuf,
    /// Clip start (ss, mm:ss or h:mm:ss)
    #[arg(long)]
    start: Option<String>,
    /// Clip end (ss, mm:ss or h:mm:ss)
    #[arg(long)]
    end: Option<String>,
    /// Playback speed factor, e.g. 0.5 for half speed
    #[arg(long, default_value_t = 1.0)]
    slowdown: f64,
    /// Output wav path
    #[arg(long)]
    output: PathBuf,
}

fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("error: {:#}", err);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Cmd::Match(args) => run_match(args),
        Cmd::Prompt(args) => run_prompt(args),
        Cmd::Check(args) => run_check(args),
        Cmd::ExtractAudio(args) => {
            audio::extract_audio(
                &args.video,
                &args.output,
                args.start.as_deref(),
                args.end.as_deref(),
                args.slowdown,
            )?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_match(args: MatchArgs) -> Result<ExitCode> {
    if args.max_gram < args.min_gram {
        bail!("--max-gram must be >= --min-gram");
    }
    if !(0.0..=100.0).contains(&args.fuzzy_threshold) {
        bail!("--fuzzy-threshold must be within 0-100");
    }

    let weights = ScoringWeights::default();
    let dict = NameDictionary::load_jsonl(&args.players, &weights)
        .with_context(|| format!("loading player dataset {}", args.players.display()))?;
    if dict.is_empty() {
        warn!("player dataset {} yielded no records", args.players.display());
    }

    let tokens = match (&args.tokens, &args.transcript) {
        (Some(path), _) => asr::load_tokens(path, 1)?,
        (None, Some(transcript)) => {
            let path = PathBuf::from(transcript);
            let text = if path.is_file() {
                std::fs::read_to_string(&path)
                    .with_context(|| format!("reading transcript {}", path.display()))?
            } else {
                transcript.clone()
            };
            asr::transcript_tokens(&text, 1)
        }
        (None, None) => bail!("provide --tokens or --transcript"),
    };

    let config = MatchConfig {
        min_gram: args.min_gram,
        max_gram: args.max_gram,
        fuzzy_threshold: args.fuzzy_threshold,
        max_suggestions: args.max_suggestions,
    };
    let matcher = Matcher::new(&dict, config);
    let mut cache = SearchCache::new();

    let records = process_pass(1, &tokens, &matcher, &mut cache);
    let token_suggestions = fold_token_suggestions(1, &tokens, &records);
    let candidates = candidate_summary(&records, args.max_candidates);

    let report = output::MatchReport {
        token_count: tokens.len(),
        records,
        token_suggestions,
        candidates,
        cache_hits: cache.hits(),
        cache_misses: cache.misses(),
    };
    output::write_json(&report, args.output.as_deref())?;
    Ok(ExitCode::SUCCESS)
}

fn run_prompt(args: PromptArgs) -> Result<ExitCode> {
    let knowledge = match &args.knowledge {
        Some(path) => KnowledgeBase::load(path)?,
        None => KnowledgeBase::default(),
    };
    let dict = match &args.players {
        Some(path) => Some(
            NameDictionary::load_jsonl(path, &ScoringWeights::default())
                .with_context(|| format!("loading player dataset {}", path.display()))?,
        ),
        None => None,
    };
    if knowledge.is_empty() && dict.is_none() {
        bail!("provide --knowledge or --players");
    }

    let names = select_prompt_names(
        args.question.as_deref(),
        &knowledge,
        dict.as_ref(),
        args.limit,
        args.last_names,
    );
    let report = output::PromptReport {
        initial_prompt: build_initial_prompt(&names),
        names,
    };
    output::write_json(&report, args.output.as_deref())?;
    Ok(ExitCode::SUCCESS)
}

fn run_check(args: CheckArgs) -> Result<ExitCode> {
    let names: Vec<String> = args
        .names
        .iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    let knowledge = match &args.knowledge {
        Some(path) => KnowledgeBase::load(path)?,
        None => KnowledgeBase::default(),
    };

    if args.llm && args.per_player {
        // Injection point for a real provider; unconfigured runs record a
        // negative result per player rather than aborting.
        let results = verify_players(&NullLlmClient, &names, &args.question);
        let all_ok = !results.is_empty() && results.values().all(|r| r.answer);
        output::write_json(&results, args.output.as_deref())?;
        return Ok(if all_ok {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        });
    }

    let (checker_name, verdict): (&'static str, Verdict) = if args.llm {
        let checker = LlmChecker::new(&knowledge, &NullLlmClient);
        ("llm", checker.check(&names, &args.question)?)
    } else {
        ("rules", RuleBasedChecker::new(&knowledge).check(&names, &args.question))
    };

    let ok = verdict.ok;
    let report = output::CheckReport {
        checker: checker_name,
        question: args.question,
        names,
        verdict,
    };
    output::write_json(&report, args.output.as_deref())?;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::from(1) })
}
