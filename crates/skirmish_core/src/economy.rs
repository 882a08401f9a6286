//! Per-player point balances.
//!
//! Points are the only resource in a match. Spawning and teleporting
//! spend them and kills award them. All math is integer.

use serde::{Deserialize, Serialize};

use crate::components::Player;
use crate::error::{GameError, Result};

/// Point balances for both players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointsLedger {
    balances: [i32; 2],
}

impl PointsLedger {
    /// Create a ledger with both players at `starting` points.
    #[must_use]
    pub const fn new(starting: i32) -> Self {
        Self {
            balances: [starting, starting],
        }
    }

    /// Current balance for `player`.
    #[must_use]
    pub const fn balance(&self, player: Player) -> i32 {
        self.balances[player.index()]
    }

    /// Check if `player` can pay `cost`.
    #[must_use]
    pub const fn can_afford(&self, player: Player, cost: i32) -> bool {
        self.balance(player) >= cost
    }

    /// Fail with [`GameError::InsufficientPoints`] unless `player` can pay `cost`.
    pub fn ensure_affordable(&self, player: Player, cost: i32) -> Result<()> {
        if self.can_afford(player, cost) {
            Ok(())
        } else {
            Err(GameError::InsufficientPoints {
                player,
                required: cost,
                available: self.balance(player),
            })
        }
    }

    /// Deduct `cost` from `player`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InsufficientPoints`] and leaves the balance
    /// unchanged if the player cannot pay.
    pub fn spend(&mut self, player: Player, cost: i32) -> Result<()> {
        self.ensure_affordable(player, cost)?;
        self.balances[player.index()] -= cost;
        Ok(())
    }

    /// Add `amount` to `player`'s balance.
    pub fn award(&mut self, player: Player, amount: i32) {
        let balance = &mut self.balances[player.index()];
        *balance = balance.saturating_add(amount);
    }

    /// Both balances as `[player one, player two]`.
    #[must_use]
    pub const fn balances(&self) -> [i32; 2] {
        self.balances
    }
}
