//! Component definitions.
//!
//! Components are plain records attached to entities in the
//! [`ComponentStore`](crate::store::ComponentStore). An entity may carry
//! any subset of them, and at most one of each type.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, Vec3Fixed};

/// Unique identifier for entities.
///
/// Identifiers increase monotonically and are never reused within a match.
pub type EntityId = u64;

// ============================================================================
// Spatial
// ============================================================================

/// World-space placement, independent of rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    /// World position.
    pub position: Vec3Fixed,
    /// Euler rotation.
    pub rotation: Vec3Fixed,
    /// Per-axis scale.
    pub scale: Vec3Fixed,
}

impl Transform {
    /// Create a transform at the given position with no rotation and unit scale.
    #[must_use]
    pub const fn at(position: Vec3Fixed) -> Self {
        Self {
            position,
            rotation: Vec3Fixed::ZERO,
            scale: Vec3Fixed::ONE,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(Vec3Fixed::ZERO)
    }
}

// ============================================================================
// Combat
// ============================================================================

/// Health component for damageable entities.
///
/// `current` always stays within `0..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Maximum health points.
    #[serde(with = "fixed_serde")]
    pub max: Fixed,
    /// Current health points.
    #[serde(with = "fixed_serde")]
    pub current: Fixed,
}

impl Health {
    /// Create new health component at full health.
    #[must_use]
    pub const fn new(max: Fixed) -> Self {
        Self { max, current: max }
    }

    /// An entity is alive while it has any health left.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.current > Fixed::ZERO
    }

    /// Apply damage, returning actual damage dealt. Health never drops below zero.
    pub fn take_damage(&mut self, amount: Fixed) -> Fixed {
        let amount = amount.max(Fixed::ZERO);
        let actual = amount.min(self.current);
        self.current -= actual;
        actual
    }

    /// Heal the entity, returning actual amount healed. Health never exceeds `max`.
    pub fn heal(&mut self, amount: Fixed) -> Fixed {
        let amount = amount.max(Fixed::ZERO);
        let headroom = (self.max - self.current).max(Fixed::ZERO);
        let actual = amount.min(headroom);
        self.current += actual;
        actual
    }

    /// Health as a percentage of maximum (0-100).
    #[must_use]
    pub fn percentage(&self) -> Fixed {
        if self.max <= Fixed::ZERO {
            Fixed::ZERO
        } else {
            self.current / self.max * Fixed::from_num(100)
        }
    }
}

/// Offensive capability: fixed damage at a fixed range, gated by a cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attacker {
    /// Damage per attack before mitigation.
    #[serde(with = "fixed_serde")]
    pub damage: Fixed,
    /// Maximum attack distance in world units.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
    /// Seconds between attacks.
    #[serde(with = "fixed_serde")]
    pub attack_cooldown: Fixed,
    /// Seconds until the next attack is allowed.
    #[serde(with = "fixed_serde")]
    pub current_cooldown: Fixed,
}

impl Attacker {
    /// Create a ready-to-fire attacker.
    #[must_use]
    pub const fn new(damage: Fixed, range: Fixed, attack_cooldown: Fixed) -> Self {
        Self {
            damage,
            range,
            attack_cooldown,
            current_cooldown: Fixed::ZERO,
        }
    }

    /// Check if ready to attack.
    #[must_use]
    pub fn can_attack(&self) -> bool {
        self.current_cooldown <= Fixed::ZERO
    }

    /// Count the cooldown down by `dt` seconds, never below zero.
    pub fn tick_cooldown(&mut self, dt: Fixed) {
        if self.current_cooldown > Fixed::ZERO {
            self.current_cooldown = (self.current_cooldown - dt).max(Fixed::ZERO);
        }
    }

    /// Reset cooldown after attacking.
    pub fn reset_cooldown(&mut self) {
        self.current_cooldown = self.attack_cooldown;
    }
}

/// Damage mitigation: a flat reduction plus a chance to block outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defender {
    /// Flat reduction applied to every unblocked hit.
    #[serde(with = "fixed_serde")]
    pub defense: Fixed,
    /// Probability in `[0, 1]` of negating a hit entirely.
    #[serde(with = "fixed_serde")]
    pub block_chance: Fixed,
}

impl Defender {
    /// Create a defender component.
    #[must_use]
    pub const fn new(defense: Fixed, block_chance: Fixed) -> Self {
        Self {
            defense,
            block_chance,
        }
    }

    /// Mitigate an incoming hit given a block roll in `[0, 100)`.
    ///
    /// A roll below `block_chance * 100` blocks the hit. Otherwise the
    /// flat defense is subtracted, flooring at zero.
    #[must_use]
    pub fn mitigate(&self, incoming: Fixed, roll: u32) -> Fixed {
        if Fixed::from_num(roll) < self.block_chance * Fixed::from_num(100) {
            return Fixed::ZERO;
        }
        incoming.saturating_sub(self.defense).max(Fixed::ZERO)
    }
}

// ============================================================================
// Ownership
// ============================================================================

/// One of the two players in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Player {
    /// First player (blue).
    One,
    /// Second player (red).
    Two,
}

impl Player {
    /// Both players, in order.
    pub const ALL: [Self; 2] = [Self::One, Self::Two];

    /// The other player.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    /// Zero-based index for per-player tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }
}

/// Which player owns an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAffiliation {
    /// Owning player.
    pub player: Player,
}

impl PlayerAffiliation {
    /// Create an affiliation for `player`.
    #[must_use]
    pub const fn new(player: Player) -> Self {
        Self { player }
    }

    /// Check whether two affiliations belong to opposing players.
    #[must_use]
    pub fn is_opponent(&self, other: &Self) -> bool {
        self.player != other.player
    }
}

// ============================================================================
// Presentation hints
// ============================================================================

/// RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Create an opaque colour.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Player one unit colour.
    pub const BLUE: Self = Self::rgb(0, 121, 241);
    /// Player two unit colour.
    pub const RED: Self = Self::rgb(230, 41, 55);
    /// Player one wall colour.
    pub const DARK_GREEN: Self = Self::rgb(0, 117, 44);
    /// Player two wall colour.
    pub const DARK_PURPLE: Self = Self::rgb(112, 31, 126);
}

/// Category tag for drawable entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// A player's base. Its destruction ends the match.
    Reactor,
    /// Stationary blocker with a [`Defender`] component.
    Wall,
    /// Mobile fighter with an [`Attacker`] component.
    Attacker,
    /// Teleport anchor (currently decorative).
    Portal,
}

/// Presentation hints consumed by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Renderable {
    /// Base colour.
    pub color: Color,
    /// Category tag.
    pub kind: UnitKind,
    /// Footprint width.
    #[serde(with = "fixed_serde")]
    pub size: Fixed,
    /// Vertical extent.
    #[serde(with = "fixed_serde")]
    pub height: Fixed,
}

// ============================================================================
// Portals and terrain
// ============================================================================

/// Portal state. Teleporting is gated on points only, so nothing in the
/// command flow consults this yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portal {
    /// Seconds between uses.
    #[serde(with = "fixed_serde")]
    pub cooldown: Fixed,
    /// Seconds until the next use.
    #[serde(with = "fixed_serde")]
    pub current_cooldown: Fixed,
    /// Whether the portal may be used at all.
    pub active: bool,
}

impl Portal {
    /// Create an active, ready portal.
    #[must_use]
    pub const fn new(cooldown: Fixed) -> Self {
        Self {
            cooldown,
            current_cooldown: Fixed::ZERO,
            active: true,
        }
    }

    /// Check if the portal is active and off cooldown.
    #[must_use]
    pub fn can_use(&self) -> bool {
        self.active && self.current_cooldown <= Fixed::ZERO
    }

    /// Use the portal, starting its cooldown. Returns whether it fired.
    pub fn activate(&mut self) -> bool {
        if self.can_use() {
            self.current_cooldown = self.cooldown;
            true
        } else {
            false
        }
    }

    /// Count the cooldown down by `dt` seconds, never below zero.
    pub fn tick(&mut self, dt: Fixed) {
        if self.current_cooldown > Fixed::ZERO {
            self.current_cooldown = (self.current_cooldown - dt).max(Fixed::ZERO);
        }
    }
}

/// Terrain classification for grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TerrainType {
    /// Default lowland.
    #[default]
    Grass,
    /// Water.
    Water,
    /// Rock.
    Stone,
    /// The raised ridge between the two bases.
    Dirt,
    /// Sand.
    Sand,
}

/// Grid-cell marker. Entities carrying a tile are ground, not units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Terrain category.
    pub terrain: TerrainType,
    /// Column height.
    #[serde(with = "fixed_serde")]
    pub height: Fixed,
    /// Hover highlight.
    pub highlighted: bool,
}

impl Tile {
    /// Create an unhighlighted tile.
    #[must_use]
    pub const fn new(terrain: TerrainType, height: Fixed) -> Self {
        Self {
            terrain,
            height,
            highlighted: false,
        }
    }
}
