//! Error types for the match simulation.
//!
//! None of these are fatal. The simulation reports them and carries on:
//! a lookup on a removed entity yields "not found", and a rejected command
//! leaves the match state untouched.

use thiserror::Error;

use crate::components::{EntityId, Player};
use crate::math::Fixed;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all match simulation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The entity was never created or has already been removed.
    #[error("Invalid entity: {0}")]
    InvalidEntity(EntityId),

    /// A spawn or teleport was attempted without enough points.
    #[error("Insufficient points for {player:?}: need {required}, have {available}")]
    InsufficientPoints {
        /// Player attempting the purchase.
        player: Player,
        /// Cost of the command.
        required: i32,
        /// Current balance.
        available: i32,
    },

    /// The target position lies outside the grid.
    #[error("Position ({x}, {z}) is outside the grid")]
    OutOfBounds {
        /// Horizontal X coordinate of the rejected position.
        x: Fixed,
        /// Horizontal Z coordinate of the rejected position.
        z: Fixed,
    },

    /// Invalid match state.
    #[error("Invalid match state: {0}")]
    InvalidState(String),
}

impl GameError {
    /// Whether this error is one of the silent command rejections
    /// (insufficient points or out of bounds).
    #[must_use]
    pub const fn is_command_rejection(&self) -> bool {
        matches!(
            self,
            Self::InsufficientPoints { .. } | Self::OutOfBounds { .. }
        )
    }
}
