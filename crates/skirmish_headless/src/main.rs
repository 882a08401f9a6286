//! Headless skirmish runner.
//!
//! This binary runs matches without graphics, either from a scenario file
//! or controlled via JSON on stdin/stdout.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p skirmish_headless
//!
//! # Play a scenario to the end and print a summary
//! cargo run -p skirmish_headless -- run --scenario scenarios/duel.ron
//!
//! # Run a batch of seeded matches
//! cargo run -p skirmish_headless -- batch --scenario scenarios/duel.ron --count 1000
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skirmish_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    game_runner::run_scenario,
    runner::HeadlessRunner,
    scenario::{Scenario, ScenarioError},
};

#[derive(Parser)]
#[command(name = "skirmish_headless")]
#[command(about = "Headless skirmish runner for scripted matches and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a scenario to victory or its tick budget
    Run {
        /// Scenario file to load (built-in duel if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Override the scenario's tick budget
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Override the scenario's seconds per tick
        #[arg(long)]
        dt: Option<f64>,

        /// Override the scenario's seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Control a match over JSON lines on stdin/stdout
    Interactive {
        /// Scenario whose config and units to start from
        #[arg(short, long)]
        scenario: Option<PathBuf>,
    },

    /// Run many seeded copies of a scenario and count outcomes
    Batch {
        /// Scenario file to load (built-in duel if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of matches to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Also write full results to this JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that a seed replays identically
    Verify {
        /// Scenario file to load (built-in duel if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Seed to replay
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Number of replays to compare
        #[arg(long, default_value = "3")]
        runs: u32,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let outcome = match cli.command {
        Some(Commands::Run {
            scenario,
            max_ticks,
            dt,
            seed,
        }) => cmd_run(scenario, max_ticks, dt, seed),
        Some(Commands::Interactive { scenario }) => cmd_interactive(scenario),
        Some(Commands::Batch {
            scenario,
            count,
            seed,
            parallel,
            output,
        }) => cmd_batch(scenario, count, seed, parallel, output),
        Some(Commands::Verify {
            scenario,
            seed,
            runs,
        }) => cmd_verify(scenario, seed, runs),
        // Default: interactive mode
        None => cmd_interactive(None),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            eprintln!("FATAL: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Errors that end the process.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

fn load_scenario(path: Option<PathBuf>) -> Result<Scenario, ScenarioError> {
    match path {
        Some(path) => {
            let scenario = Scenario::load(&path)?;
            tracing::info!(path = %path.display(), name = %scenario.name, "Scenario loaded");
            Ok(scenario)
        }
        None => Ok(Scenario::duel()),
    }
}

/// Play one scenario and print its summary
fn cmd_run(
    scenario: Option<PathBuf>,
    max_ticks: Option<u64>,
    dt: Option<f64>,
    seed: Option<u64>,
) -> Result<ExitCode, CliError> {
    let mut scenario = load_scenario(scenario)?;
    if let Some(max_ticks) = max_ticks {
        scenario.max_ticks = max_ticks;
    }
    if let Some(dt) = dt {
        scenario.dt = dt;
    }
    scenario.validate()?;

    let summary = run_scenario(&scenario, seed)?;
    println!("{}", serde_json::to_string(&summary)?);
    Ok(ExitCode::SUCCESS)
}

/// Serve the JSON-lines protocol on stdin/stdout
fn cmd_interactive(scenario: Option<PathBuf>) -> Result<ExitCode, CliError> {
    tracing::info!("Starting interactive session");

    let mut runner = match scenario {
        Some(path) => HeadlessRunner::from_scenario(&load_scenario(Some(path))?)?,
        None => HeadlessRunner::from_scenario(&Scenario::default())?,
    };
    runner.run(io::stdin().lock(), io::stdout().lock())?;
    Ok(ExitCode::SUCCESS)
}

/// Run a batch and print per-outcome counts
fn cmd_batch(
    scenario: Option<PathBuf>,
    count: u32,
    seed: u64,
    parallel: u32,
    output: Option<PathBuf>,
) -> Result<ExitCode, CliError> {
    let scenario = load_scenario(scenario)?;
    let config = BatchConfig {
        game_count: count,
        seed_start: seed,
        parallel_games: parallel,
    };

    tracing::info!(
        scenario = %scenario.name,
        count,
        seed,
        parallel,
        max_ticks = scenario.max_ticks,
        "Batch configuration"
    );

    let results = run_batch(&scenario, config)?;

    if let Some(path) = output {
        results.save(&path)?;
        tracing::info!(path = %path.display(), "Results saved");
    }

    println!("{}", serde_json::to_string(&results.outcomes)?);
    Ok(ExitCode::SUCCESS)
}

/// Replay one seed several times and compare
fn cmd_verify(scenario: Option<PathBuf>, seed: u64, runs: u32) -> Result<ExitCode, CliError> {
    let scenario = load_scenario(scenario)?;

    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        scenario.name,
        seed,
        runs
    );

    if verify_determinism(&scenario, seed, runs)? {
        eprintln!("PASS: All {runs} runs produced identical results");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        Ok(ExitCode::FAILURE)
    }
}
