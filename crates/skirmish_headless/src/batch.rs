//! Batch match runner.
//!
//! Runs many seeded copies of one scenario in parallel using rayon and
//! tallies the outcomes.

use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::game_runner::{run_scenario, GameSummary};
use crate::protocol::MatchStatus;
use crate::scenario::{Scenario, ScenarioError};

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of matches to run
    pub game_count: u32,
    /// Seed of the first match; match `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Maximum parallel matches (0 = use rayon default)
    pub parallel_games: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            game_count: 100,
            seed_start: 0,
            parallel_games: 0,
        }
    }
}

impl BatchConfig {
    /// Create config for `game_count` matches
    pub fn new(game_count: u32) -> Self {
        Self {
            game_count,
            ..Default::default()
        }
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }
}

/// Outcome counts over a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    /// Matches won by player one
    pub player_one_wins: u32,
    /// Matches won by player two
    pub player_two_wins: u32,
    /// Matches still undecided at the tick budget
    pub undecided: u32,
}

impl OutcomeCounts {
    /// Tally the outcomes of `games`
    pub fn from_games(games: &[GameSummary]) -> Self {
        games.iter().fold(Self::default(), |mut counts, game| {
            match game.outcome {
                MatchStatus::PlayerOneWins => counts.player_one_wins += 1,
                MatchStatus::PlayerTwoWins => counts.player_two_wins += 1,
                MatchStatus::InProgress => counts.undecided += 1,
            }
            counts
        })
    }

    /// Total matches counted
    pub fn total(&self) -> u32 {
        self.player_one_wins + self.player_two_wins + self.undecided
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Scenario name
    pub scenario: String,
    /// Configuration used
    pub config: BatchConfig,
    /// Per-outcome counts
    pub outcomes: OutcomeCounts,
    /// Individual match summaries, in seed order
    pub games: Vec<GameSummary>,
    /// Total runtime
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Run a batch of matches
///
/// # Errors
///
/// Returns the scenario's error if it cannot be played.
pub fn run_batch(scenario: &Scenario, config: BatchConfig) -> Result<BatchResults, ScenarioError> {
    let start = Instant::now();
    scenario.validate()?;

    info!(
        "Starting batch run: {} matches of '{}'",
        config.game_count, scenario.name
    );

    // Configure thread pool if specified
    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let games: Vec<GameSummary> = (0..config.game_count)
        .into_par_iter()
        .map(|i| run_scenario(scenario, Some(config.seed_start.wrapping_add(u64::from(i)))))
        .collect::<Result<_, _>>()?;

    let outcomes = OutcomeCounts::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} matches in {:.1}s ({:.1} matches/sec)",
        games.len(),
        duration_seconds,
        games.len() as f64 / duration_seconds.max(f64::EPSILON)
    );

    Ok(BatchResults {
        scenario: scenario.name.clone(),
        config,
        outcomes,
        games,
        duration_seconds,
    })
}

/// Verify determinism by running the same seed several times
///
/// # Errors
///
/// Returns the scenario's error if it cannot be played.
pub fn verify_determinism(scenario: &Scenario, seed: u64, runs: u32) -> Result<bool, ScenarioError> {
    let results: Vec<GameSummary> = (0..runs.max(1))
        .into_par_iter()
        .map(|_| run_scenario(scenario, Some(seed)))
        .collect::<Result<_, _>>()?;

    // Every run must agree on everything, hash included
    Ok(results.windows(2).all(|w| w[0] == w[1]))
}
