//! Scenario loading and configuration.
//!
//! A scenario fixes everything a headless match needs to be reproducible:
//! the match config, units placed before the first tick, a schedule of
//! player inputs and a tick budget.
//!
//! # Example RON
//!
//! ```ron
//! Scenario(
//!     name: "Opening rush",
//!     config: (seed: 3),
//!     units: [
//!         (kind: Wall, player: Two, x: 0.0, z: 4.0),
//!     ],
//!     inputs: [
//!         (tick: 0, input: Select(attacker)),
//!         (tick: 0, input: Confirm(player: One, x: 0.0, z: -4.0)),
//!     ],
//!     max_ticks: 1200,
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_core::commands::{CommandMode, InputCommand};
use skirmish_core::components::{Player, UnitKind};
use skirmish_core::config::{ConfigError, MatchConfig};
use skirmish_core::math::{Fixed, Vec3Fixed};
use skirmish_core::simulation::MatchState;
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The embedded match config is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Scenario values are unusable.
    #[error("Invalid scenario: {0}")]
    Invalid(String),
}

/// A unit present before the first tick. Placed for free.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// Unit kind.
    pub kind: UnitKind,
    /// Owning player.
    pub player: Player,
    /// World X coordinate.
    pub x: f64,
    /// World Z coordinate.
    pub z: f64,
}

impl UnitPlacement {
    /// Create a new placement.
    #[must_use]
    pub const fn new(kind: UnitKind, player: Player, x: f64, z: f64) -> Self {
        Self { kind, player, x, z }
    }
}

/// A player input as written in scenario files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScriptedInput {
    /// Enter a spawn or teleport mode.
    Select(CommandMode),
    /// Click a cell.
    Confirm {
        /// Acting player.
        player: Player,
        /// World X coordinate.
        x: f64,
        /// World Z coordinate.
        z: f64,
    },
    /// Leave the current mode.
    Cancel,
}

/// An input applied at the start of a given tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledInput {
    /// Tick number (0 is the first tick).
    pub tick: u64,
    /// The input.
    pub input: ScriptedInput,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Match configuration.
    #[serde(default)]
    pub config: MatchConfig,
    /// Units placed before the first tick.
    #[serde(default)]
    pub units: Vec<UnitPlacement>,
    /// Timed player inputs.
    #[serde(default)]
    pub inputs: Vec<ScheduledInput>,
    /// Tick budget; the match stops here if nobody has won.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
    /// Seconds per tick.
    #[serde(default = "default_dt")]
    pub dt: f64,
}

/// Ten minutes at 60 ticks per second.
fn default_max_ticks() -> u64 {
    36_000
}

fn default_dt() -> f64 {
    1.0 / 60.0
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "Empty Duel".to_string(),
            description: "Two reactors and no units".to_string(),
            config: MatchConfig::default(),
            units: Vec::new(),
            inputs: Vec::new(),
            max_ticks: default_max_ticks(),
            dt: default_dt(),
        }
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Standard duel: each side fields two attackers behind a wall, and
    /// player one tries a teleport halfway through the first minute.
    #[must_use]
    pub fn duel() -> Self {
        use crate::scenario::ScriptedInput::{Cancel, Confirm, Select};

        let at = |tick, input| ScheduledInput { tick, input };
        Self {
            name: "Standard Duel".to_string(),
            description: "Mirrored openings with a mid-game teleport".to_string(),
            inputs: vec![
                at(0, Select(CommandMode::Attacker)),
                at(0, Confirm { player: Player::One, x: -2.0, z: -6.0 }),
                at(0, Confirm { player: Player::One, x: 2.0, z: -6.0 }),
                at(0, Confirm { player: Player::Two, x: -2.0, z: 6.0 }),
                at(0, Confirm { player: Player::Two, x: 2.0, z: 6.0 }),
                at(1, Select(CommandMode::Wall)),
                at(1, Confirm { player: Player::One, x: 0.0, z: -2.0 }),
                at(1, Confirm { player: Player::Two, x: 0.0, z: 2.0 }),
                at(1, Cancel),
                at(1800, Select(CommandMode::Portal)),
                at(1800, Confirm { player: Player::One, x: 2.0, z: -6.0 }),
                at(1800, Confirm { player: Player::One, x: 2.0, z: 8.0 }),
            ],
            ..Self::default()
        }
    }

    /// Reject values the runner cannot work with.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.config.validate()?;
        self.tick_length()?;
        let coordinates = self
            .units
            .iter()
            .flat_map(|u| [u.x, u.z])
            .chain(self.inputs.iter().flat_map(|s| match s.input {
                ScriptedInput::Confirm { x, z, .. } => vec![x, z],
                _ => Vec::new(),
            }));
        for value in coordinates {
            if Fixed::checked_from_num(value).is_none() {
                return Err(ScenarioError::Invalid(format!(
                    "coordinate {value} is out of range"
                )));
            }
        }
        Ok(())
    }

    /// Seconds per tick in fixed point.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Invalid`] when `dt` is not finite, not
    /// positive, or too large or too small to represent.
    pub fn tick_length(&self) -> Result<Fixed, ScenarioError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ScenarioError::Invalid(format!(
                "tick length {} must be positive",
                self.dt
            )));
        }
        Fixed::checked_from_num(self.dt)
            .filter(|dt| *dt > Fixed::ZERO)
            .ok_or_else(|| {
                ScenarioError::Invalid(format!("tick length {} cannot be represented", self.dt))
            })
    }

    /// Build the starting match, optionally overriding the config seed.
    #[must_use]
    pub fn build_match(&self, seed: Option<u64>) -> MatchState {
        let config = seed.map_or(self.config, |s| self.config.with_seed(s));
        let height = config.spawn_height_offset;
        let mut state = MatchState::new(config);
        for unit in &self.units {
            let position = Vec3Fixed::new(coordinate(unit.x), height, coordinate(unit.z));
            state.create_unit(unit.kind, position, unit.player);
        }
        state
    }

    /// Inputs scheduled for `tick`, in file order.
    #[must_use]
    pub fn inputs_for_tick(&self, tick: u64) -> Vec<InputCommand> {
        self.inputs
            .iter()
            .filter(|s| s.tick == tick)
            .map(|s| s.input.into())
            .collect()
    }
}

impl From<ScriptedInput> for InputCommand {
    fn from(input: ScriptedInput) -> Self {
        match input {
            ScriptedInput::Select(mode) => Self::Select { mode },
            ScriptedInput::Confirm { player, x, z } => Self::Confirm {
                player,
                position: Vec3Fixed::new(coordinate(x), Fixed::ZERO, coordinate(z)),
            },
            ScriptedInput::Cancel => Self::Cancel,
        }
    }
}

/// Validated scenarios only hold in-range coordinates.
fn coordinate(value: f64) -> Fixed {
    Fixed::checked_from_num(value).unwrap_or(Fixed::ZERO)
}
