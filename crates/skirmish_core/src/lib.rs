//! # Skirmish Core
//!
//! Deterministic simulation core for a two-player grid skirmish.
//!
//! Players spend points to place attackers and walls, units pick the
//! nearest enemy and fight on their own, and the match is decided when a
//! reactor falls.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO beyond loading a config file on request
//! - No system randomness (block rolls come from a seeded PRNG)
//! - No floating-point math (uses fixed-point)
//!
//! ## Crate Structure
//!
//! - [`store`] - Entity and typed component storage
//! - [`components`] - Component definitions
//! - [`systems`] - Targeting, combat and the death sweep
//! - [`combat`] - Damage mitigation and kill scoring
//! - [`effects`] - Transient visual effects
//! - [`commands`] - Spawn and teleport command state machine
//! - [`simulation`] - The match loop
//! - [`config`] - Match configuration
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod commands;
pub mod components;
pub mod config;
pub mod economy;
pub mod effects;
pub mod error;
pub mod grid;
pub mod math;
pub mod simulation;
pub mod store;
pub mod systems;

pub use error::{GameError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::commands::{CommandMode, CommandOutcome, CommandState, InputCommand};
    pub use crate::components::*;
    pub use crate::config::{ConfigError, MatchConfig};
    pub use crate::economy::PointsLedger;
    pub use crate::effects::{EffectDescriptor, EffectSystem};
    pub use crate::error::{GameError, Result};
    pub use crate::math::{Fixed, Vec3Fixed};
    pub use crate::simulation::{EntityView, MatchState, TickResult, WinStatus};
    pub use crate::store::ComponentStore;
    pub use crate::systems::{AttackEvent, Reactors};
}
