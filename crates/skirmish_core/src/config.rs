//! Match configuration.
//!
//! Unit stats, costs, rewards and grid dimensions live here rather than
//! in code. `MatchConfig::default()` is the standard duel; alternative
//! configs can be loaded from RON.
//!
//! # Example RON
//!
//! ```ron
//! MatchConfig(
//!     seed: 7,
//!     starting_points: 1000,
//!     attacker: AttackerConfig(
//!         health: 50.0, damage: 10.0, range: 16.0, cooldown: 1.0,
//!         cost: 100, size: 2.0, height: 2.0,
//!     ),
//! )
//! ```
//!
//! Omitted fields fall back to their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{fixed_decimal, vec3_decimal, Fixed, Vec3Fixed};

/// Error type for configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read file.
    #[error("Failed to read match config: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse match config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Parsed values are unusable.
    #[error("Invalid match config: {0}")]
    Invalid(String),
}

/// Grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Cells per side.
    pub size: u32,
    /// Width of one cell in world units.
    #[serde(with = "fixed_decimal")]
    pub tile_size: Fixed,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 17,
            tile_size: Fixed::from_num(2),
        }
    }
}

/// Stats for spawned attacker units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackerConfig {
    /// Maximum health.
    #[serde(with = "fixed_decimal")]
    pub health: Fixed,
    /// Damage per attack.
    #[serde(with = "fixed_decimal")]
    pub damage: Fixed,
    /// Attack range.
    #[serde(with = "fixed_decimal")]
    pub range: Fixed,
    /// Seconds between attacks.
    #[serde(with = "fixed_decimal")]
    pub cooldown: Fixed,
    /// Spawn cost in points.
    pub cost: i32,
    /// Footprint width.
    #[serde(with = "fixed_decimal")]
    pub size: Fixed,
    /// Vertical extent.
    #[serde(with = "fixed_decimal")]
    pub height: Fixed,
}

impl Default for AttackerConfig {
    fn default() -> Self {
        Self {
            health: Fixed::from_num(50),
            damage: Fixed::from_num(10),
            range: Fixed::from_num(16),
            cooldown: Fixed::ONE,
            cost: 100,
            size: Fixed::from_num(2),
            height: Fixed::from_num(2),
        }
    }
}

/// Stats for spawned walls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallConfig {
    /// Maximum health.
    #[serde(with = "fixed_decimal")]
    pub health: Fixed,
    /// Flat damage reduction.
    #[serde(with = "fixed_decimal")]
    pub defense: Fixed,
    /// Probability of blocking a hit outright.
    #[serde(with = "fixed_decimal")]
    pub block_chance: Fixed,
    /// Spawn cost in points.
    pub cost: i32,
    /// Footprint width.
    #[serde(with = "fixed_decimal")]
    pub size: Fixed,
    /// Vertical extent.
    #[serde(with = "fixed_decimal")]
    pub height: Fixed,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            health: Fixed::from_num(75),
            defense: Fixed::from_num(5),
            block_chance: Fixed::from_num(0.3),
            cost: 150,
            size: Fixed::from_num(2),
            height: Fixed::from_num(2),
        }
    }
}

/// Reactor stats and starting positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactorConfig {
    /// Maximum health.
    #[serde(with = "fixed_decimal")]
    pub health: Fixed,
    /// Footprint width.
    #[serde(with = "fixed_decimal")]
    pub size: Fixed,
    /// Vertical extent.
    #[serde(with = "fixed_decimal")]
    pub height: Fixed,
    /// Player one's reactor, before grid snapping.
    #[serde(with = "vec3_decimal")]
    pub player_one_position: Vec3Fixed,
    /// Player two's reactor, before grid snapping.
    #[serde(with = "vec3_decimal")]
    pub player_two_position: Vec3Fixed,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            health: Fixed::from_num(100),
            size: Fixed::ONE,
            height: Fixed::from_num(6),
            player_one_position: Vec3Fixed::new(
                Fixed::ZERO,
                Fixed::from_num(3),
                Fixed::from_num(-14),
            ),
            player_two_position: Vec3Fixed::new(
                Fixed::ZERO,
                Fixed::from_num(3),
                Fixed::from_num(14),
            ),
        }
    }
}

/// Portal entity stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Seconds between uses.
    #[serde(with = "fixed_decimal")]
    pub cooldown: Fixed,
    /// Footprint width.
    #[serde(with = "fixed_decimal")]
    pub size: Fixed,
    /// Vertical extent.
    #[serde(with = "fixed_decimal")]
    pub height: Fixed,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            cooldown: Fixed::from_num(5),
            size: Fixed::from_num(2),
            height: Fixed::from_num(0.5),
        }
    }
}

/// Largest accepted grid, in cells per side.
pub const MAX_GRID_SIZE: u32 = 4096;

/// Complete configuration for one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Seed for the block-roll PRNG.
    pub seed: u64,
    /// Points each player starts with.
    pub starting_points: i32,
    /// Cost of one teleport, charged once per move.
    pub teleport_cost: i32,
    /// Points for a kill with a damaging hit.
    pub kill_reward: i32,
    /// Points for a kill with a fully blocked hit.
    pub blocked_kill_reward: i32,
    /// Attack effect progress per second.
    #[serde(with = "fixed_decimal")]
    pub effect_speed: Fixed,
    /// Height added to a clicked position when placing a unit.
    #[serde(with = "fixed_decimal")]
    pub spawn_height_offset: Fixed,
    /// Grid dimensions.
    pub grid: GridConfig,
    /// Attacker unit stats.
    pub attacker: AttackerConfig,
    /// Wall stats.
    pub wall: WallConfig,
    /// Reactor stats.
    pub reactor: ReactorConfig,
    /// Portal stats.
    pub portal: PortalConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            starting_points: 1000,
            teleport_cost: 200,
            kill_reward: 50,
            blocked_kill_reward: 25,
            effect_speed: Fixed::from_num(4),
            spawn_height_offset: Fixed::ONE,
            grid: GridConfig::default(),
            attacker: AttackerConfig::default(),
            wall: WallConfig::default(),
            reactor: ReactorConfig::default(),
            portal: PortalConfig::default(),
        }
    }
}

impl MatchConfig {
    /// Load a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method to set the PRNG seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject values the simulation cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.size == 0 || self.grid.size > MAX_GRID_SIZE {
            return Err(ConfigError::Invalid(format!(
                "grid size {} is outside 1..={MAX_GRID_SIZE}",
                self.grid.size
            )));
        }
        if self.grid.tile_size <= Fixed::ZERO {
            return Err(ConfigError::Invalid("tile size must be positive".into()));
        }
        let board_width = Fixed::checked_from_num(self.grid.size)
            .and_then(|size| size.checked_mul(self.grid.tile_size));
        if board_width.is_none() {
            return Err(ConfigError::Invalid(format!(
                "a {} cell grid of {} wide tiles does not fit the world",
                self.grid.size, self.grid.tile_size
            )));
        }
        let positive = [
            ("effect speed", self.effect_speed),
            ("attacker damage", self.attacker.damage),
            ("attacker range", self.attacker.range),
            ("attacker cooldown", self.attacker.cooldown),
        ];
        if let Some((name, value)) = positive.iter().find(|(_, value)| *value <= Fixed::ZERO) {
            return Err(ConfigError::Invalid(format!(
                "{name} must be positive, got {value}"
            )));
        }
        if self.wall.defense < Fixed::ZERO || self.portal.cooldown < Fixed::ZERO {
            return Err(ConfigError::Invalid(
                "wall defense and portal cooldown must not be negative".into(),
            ));
        }
        if self.wall.block_chance < Fixed::ZERO || self.wall.block_chance > Fixed::ONE {
            return Err(ConfigError::Invalid(format!(
                "wall block chance {} is outside [0, 1]",
                self.wall.block_chance
            )));
        }
        let amounts = [
            self.attacker.cost,
            self.wall.cost,
            self.teleport_cost,
            self.starting_points,
            self.kill_reward,
            self.blocked_kill_reward,
        ];
        if amounts.iter().any(|&c| c < 0) {
            return Err(ConfigError::Invalid(
                "costs, rewards and starting points must not be negative".into(),
            ));
        }
        if self.attacker.health <= Fixed::ZERO
            || self.wall.health <= Fixed::ZERO
            || self.reactor.health <= Fixed::ZERO
        {
            return Err(ConfigError::Invalid("unit health must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_standard_duel() {
        let config = MatchConfig::default();
        assert_eq!(config.starting_points, 1000);
        assert_eq!(config.attacker.cost, 100);
        assert_eq!(config.wall.cost, 150);
        assert_eq!(config.teleport_cost, 200);
        assert_eq!(config.attacker.range, Fixed::from_num(16));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = MatchConfig::from_ron_str(
            "(seed: 42, starting_points: 500, attacker: (damage: 12.5))",
        )
        .unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.starting_points, 500);
        assert_eq!(config.attacker.damage, Fixed::from_num(12.5));
        assert_eq!(config.attacker.cost, 100);
        assert_eq!(config.wall, WallConfig::default());
    }

    #[test]
    fn test_invalid_block_chance_is_rejected() {
        let err = MatchConfig::from_ron_str("(wall: (block_chance: 1.5))").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let err = MatchConfig::from_ron_str("(grid: (size: 4000000000))").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let largest = format!("(grid: (size: {MAX_GRID_SIZE}))");
        assert!(MatchConfig::from_ron_str(&largest).is_ok());

        let wide_tiles = MatchConfig::from_ron_str("(grid: (size: 4096, tile_size: 1000000.0))");
        assert!(matches!(wide_tiles, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_non_positive_combat_values_are_rejected() {
        for ron in [
            "(effect_speed: 0.0)",
            "(effect_speed: -4.0)",
            "(attacker: (damage: 0.0))",
            "(attacker: (range: -1.0))",
            "(attacker: (cooldown: 0.0))",
            "(wall: (defense: -5.0))",
            "(portal: (cooldown: -1.0))",
            "(kill_reward: -50)",
        ] {
            let result = MatchConfig::from_ron_str(ron);
            assert!(
                matches!(result, Err(ConfigError::Invalid(_))),
                "{ron} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_error() {
        let err = MatchConfig::from_ron_str("(seed: \"nope\")").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.ron");
        std::fs::write(&path, "(teleport_cost: 250)").unwrap();
        let config = MatchConfig::load(&path).unwrap();
        assert_eq!(config.teleport_cost, 250);

        let missing = MatchConfig::load(dir.path().join("missing.ron"));
        assert!(matches!(missing, Err(ConfigError::ReadError(_))));
    }
}
