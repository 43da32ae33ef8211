//! Headless Battle Runner
//!
//! Plays a timed key script against the engine and prints every emitted event
//! plus the final round snapshot. Useful for balance checks and regression runs.
//!
//! Script format, one step per line (`#` starts a comment):
//!
//! ```text
//! A 1000        # strike PATA 1000ms after the previous step
//! pon 400       # symbol names work too
//! wait 3000     # let time pass
//! restart 500   # restart the round
//! ```

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use war_drum::core::config::EngineConfig;
use war_drum::core::error::{DrumError, Result};
use war_drum::core::types::Millis;
use war_drum::rhythm::{format_elapsed, Symbol};
use war_drum::round::{EngineEvent, EventLog, Outcome, RoundController, RoundSnapshot};

/// Headless Battle Runner - scripted drum input, JSON or text report
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Drive a round from a timed key script and report what happened")]
struct Args {
    /// Script of timed keys
    #[arg(long)]
    script: PathBuf,

    /// Engine config (TOML); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for the damage roll
    #[arg(long)]
    seed: Option<u64>,

    /// Extra time to run after the last step
    #[arg(long, default_value_t = 0)]
    tail_ms: Millis,

    /// Include beat pulses and timer ticks in the report
    #[arg(long)]
    beats: bool,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ScriptStep {
    /// Round start; recorded, never parsed
    Start,
    Key { key: char, delay_ms: Millis },
    Wait { delay_ms: Millis },
    Restart { delay_ms: Millis },
}

impl ScriptStep {
    fn delay_ms(&self) -> Millis {
        match *self {
            ScriptStep::Start => 0,
            ScriptStep::Key { delay_ms, .. }
            | ScriptStep::Wait { delay_ms }
            | ScriptStep::Restart { delay_ms } => delay_ms,
        }
    }
}

/// One script step and what the engine emitted for it
#[derive(Serialize)]
struct StepRecord {
    at_ms: Millis,
    step: ScriptStep,
    events: Vec<EngineEvent>,
}

/// JSON output structure
#[derive(Serialize)]
struct RunReport {
    seed: u64,
    end_ms: Millis,
    outcome: Option<Outcome>,
    combo: u32,
    steps: Vec<StepRecord>,
    snapshot: RoundSnapshot,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("war_drum=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("battle_runner: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let script = fs::read_to_string(&args.script)?;
    let steps = parse_script(&script)?;
    tracing::info!(steps = steps.len(), script = ?args.script, "script loaded");

    let seed = args.seed.unwrap_or_else(rand::random);
    let report = play(config, seed, &steps, args.tail_ms, args.beats);

    match args.format.as_str() {
        "text" => print_text(&report),
        _ => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn parse_script(contents: &str) -> Result<Vec<ScriptStep>> {
    let mut steps = Vec::new();
    for (index, raw) in contents.lines().enumerate() {
        let line = index + 1;
        let text = raw.split('#').next().unwrap_or("").trim();
        if text.is_empty() {
            continue;
        }

        let mut fields = text.split_whitespace();
        let (Some(head), Some(delay), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(script_error(line, format!("expected `<key> <delay_ms>`, got `{}`", text)));
        };
        let delay_ms: Millis = delay
            .parse()
            .map_err(|_| script_error(line, format!("`{}` is not a delay in ms", delay)))?;

        let step = match head.to_ascii_lowercase().as_str() {
            "wait" => ScriptStep::Wait { delay_ms },
            "restart" => ScriptStep::Restart { delay_ms },
            _ => ScriptStep::Key {
                key: parse_key(head).ok_or_else(|| script_error(line, format!("unknown key `{}`", head)))?,
                delay_ms,
            },
        };
        steps.push(step);
    }
    Ok(steps)
}

/// A single character passes through untouched (foreign keys are legal input);
/// longer words must name a drum symbol
fn parse_key(word: &str) -> Option<char> {
    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => Symbol::ALL
            .iter()
            .find(|symbol| symbol.name().eq_ignore_ascii_case(word))
            .map(|symbol| symbol.key()),
    }
}

fn script_error(line: usize, message: String) -> DrumError {
    DrumError::Script { line, message }
}

fn play(config: EngineConfig, seed: u64, steps: &[ScriptStep], tail_ms: Millis, beats: bool) -> RunReport {
    let mut round = RoundController::with_seed(config, seed, 0);
    let mut records = vec![StepRecord {
        at_ms: 0,
        step: ScriptStep::Start,
        events: keep(round.start(0), beats),
    }];

    let mut now: Millis = 0;
    for step in steps {
        now += step.delay_ms();
        let log = match *step {
            ScriptStep::Start => round.start(now),
            ScriptStep::Key { key, .. } => round.handle_key(key, now),
            ScriptStep::Wait { .. } => round.advance(now),
            ScriptStep::Restart { .. } => round.restart(now),
        };
        records.push(StepRecord {
            at_ms: now,
            step: *step,
            events: keep(log, beats),
        });
    }

    if tail_ms > 0 {
        now += tail_ms;
        let log = round.advance(now);
        records.push(StepRecord {
            at_ms: now,
            step: ScriptStep::Wait { delay_ms: tail_ms },
            events: keep(log, beats),
        });
    }

    round.teardown();
    RunReport {
        seed,
        end_ms: now,
        outcome: round.outcome(),
        combo: round.combo(),
        steps: records,
        snapshot: round.snapshot(),
    }
}

fn keep(log: EventLog, beats: bool) -> Vec<EngineEvent> {
    log.into_iter()
        .filter(|event| {
            beats
                || !matches!(
                    event,
                    EngineEvent::BeatPulse | EngineEvent::BeatFlashEnded | EngineEvent::Elapsed { .. }
                )
        })
        .collect()
}

fn print_text(report: &RunReport) {
    println!("=== Battle Run (seed {}) ===", report.seed);
    for record in &report.steps {
        println!("[{}] {:?}", format_elapsed(record.at_ms), record.step);
        for event in &record.events {
            println!("    {:?}", event);
        }
    }
    println!();
    println!("Ended at {} ms ({})", report.end_ms, format_elapsed(report.end_ms));
    println!("Outcome: {:?}", report.outcome);
    println!("Combo: {}", report.combo);
    println!(
        "Hero: pos {:.1} hp {:.0}/{:.0} {:?}",
        report.snapshot.hero.position,
        report.snapshot.hero.hp,
        report.snapshot.hero.max_hp,
        report.snapshot.hero.state
    );
    println!(
        "Enemy: pos {:.1} hp {:.0}/{:.0} {:?}",
        report.snapshot.enemy.position,
        report.snapshot.enemy.hp,
        report.snapshot.enemy.max_hp,
        report.snapshot.enemy.state
    );
}
