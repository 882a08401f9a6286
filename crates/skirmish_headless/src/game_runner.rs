//! Runs a scenario to completion without any controller attached.
//!
//! Scheduled inputs are fed in at their tick and the match advances until
//! a reactor falls or the tick budget runs out.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use skirmish_core::components::Player;
use skirmish_core::simulation::MatchState;
use tracing::{debug, info};

use crate::protocol::MatchStatus;
use crate::scenario::{Scenario, ScenarioError};

/// Outcome of one headless match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Scenario name.
    pub scenario: String,
    /// PRNG seed the match ran with.
    pub seed: u64,
    /// Final result.
    pub outcome: MatchStatus,
    /// Ticks simulated.
    pub ticks: u64,
    /// Final point balances, player one first.
    pub points: [i32; 2],
    /// Attacks resolved over the whole match.
    pub attacks: u32,
    /// Entities removed by the death sweep.
    pub kills: u32,
    /// Inputs rejected for cost or bounds.
    pub rejected_inputs: u32,
    /// State hash after the last tick.
    pub final_hash: u64,
}

impl GameSummary {
    /// The winning player, if any.
    #[must_use]
    pub const fn winner(&self) -> Option<Player> {
        match self.outcome {
            MatchStatus::PlayerOneWins => Some(Player::One),
            MatchStatus::PlayerTwoWins => Some(Player::Two),
            MatchStatus::InProgress => None,
        }
    }
}

/// Run `scenario` with its own seed, or `seed` if given.
///
/// # Errors
///
/// Returns [`ScenarioError::Invalid`] if the scenario's tick length is unusable.
pub fn run_scenario(scenario: &Scenario, seed: Option<u64>) -> Result<GameSummary, ScenarioError> {
    let started = Instant::now();
    let dt = scenario.tick_length()?;
    let mut state = scenario.build_match(seed);
    let seed = state.config().seed;

    info!(
        scenario = %scenario.name,
        seed,
        max_ticks = scenario.max_ticks,
        "Starting match"
    );

    let mut attacks = 0u32;
    let mut kills = 0u32;
    let mut rejected_inputs = 0u32;

    while state.current_tick() < scenario.max_ticks {
        let inputs = scenario.inputs_for_tick(state.current_tick());
        let result = state.tick(dt, &inputs);

        attacks += result.attacks.len() as u32;
        kills += result.removed.len() as u32;
        rejected_inputs += result.rejections.len() as u32;
        for rejection in &result.rejections {
            debug!(tick = result.tick, %rejection, "Scripted input rejected");
        }

        if result.win_status.is_decided() {
            break;
        }
    }

    let summary = summarize(scenario, seed, &state, attacks, kills, rejected_inputs);
    info!(
        outcome = ?summary.outcome,
        ticks = summary.ticks,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Match finished"
    );
    Ok(summary)
}

fn summarize(
    scenario: &Scenario,
    seed: u64,
    state: &MatchState,
    attacks: u32,
    kills: u32,
    rejected_inputs: u32,
) -> GameSummary {
    GameSummary {
        scenario: scenario.name.clone(),
        seed,
        outcome: state.win_status().into(),
        ticks: state.current_tick(),
        points: [state.points(Player::One), state.points(Player::Two)],
        attacks,
        kills,
        rejected_inputs,
        final_hash: state.state_hash(),
    }
}
