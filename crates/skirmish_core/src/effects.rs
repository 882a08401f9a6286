//! Transient visual effects.
//!
//! Effects are owned by an [`EffectSystem`], separate from the component
//! store. The combat system hands over start/end positions and a colour
//! when it creates one; after that the effect advances on its own and is
//! dropped once it completes.

use serde::{Deserialize, Serialize};

use crate::components::{Color, Player};
use crate::math::{fixed_serde, Fixed, Vec3Fixed};

/// Draw radius of an attack bolt.
pub const BOLT_RADIUS: Fixed = Fixed::from_bits(858_993_459);

/// What the renderer needs to draw one effect this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectDescriptor {
    /// Current centre.
    pub position: Vec3Fixed,
    /// Draw colour.
    pub color: Color,
    /// Sphere radius.
    #[serde(with = "fixed_serde")]
    pub radius: Fixed,
}

/// A projectile-like streak from attacker to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackBolt {
    start: Vec3Fixed,
    end: Vec3Fixed,
    position: Vec3Fixed,
    color: Color,
    #[serde(with = "fixed_serde")]
    progress: Fixed,
    #[serde(with = "fixed_serde")]
    speed: Fixed,
}

impl AttackBolt {
    /// Create a bolt travelling from `start` to `end` at `speed` progress per second.
    #[must_use]
    pub const fn new(start: Vec3Fixed, end: Vec3Fixed, color: Color, speed: Fixed) -> Self {
        Self {
            start,
            end,
            position: start,
            color,
            progress: Fixed::ZERO,
            speed,
        }
    }

    /// Colour of a bolt fired by `player` whose hit kept `intensity` of its
    /// damage. Red and green fade with intensity; blue and alpha are kept.
    #[must_use]
    pub fn color_for(player: Player, intensity: Fixed) -> Color {
        let base = match player {
            Player::One => Color::rgb(0, 120, 255),
            Player::Two => Color::rgb(255, 60, 60),
        };
        let t = intensity.clamp(Fixed::ZERO, Fixed::ONE);
        let scale = |channel: u8| (Fixed::from_num(channel) * t).to_num::<u8>();
        Color {
            r: scale(base.r),
            g: scale(base.g),
            b: base.b,
            a: base.a,
        }
    }

    /// Progress from 0 (at start) to 1 (arrived).
    #[must_use]
    pub const fn progress(&self) -> Fixed {
        self.progress
    }

    fn advance(&mut self, dt: Fixed) {
        if self.is_done() {
            return;
        }
        let step = dt.max(Fixed::ZERO).saturating_mul(self.speed);
        self.progress = self.progress.saturating_add(step).min(Fixed::ONE);
        if !self.is_done() {
            self.position = self.start.lerp(self.end, self.progress);
        }
    }

    fn is_done(&self) -> bool {
        self.progress >= Fixed::ONE
    }
}

/// One transient effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Attack streak.
    AttackBolt(AttackBolt),
}

impl Effect {
    /// Step the effect forward by `dt` seconds.
    pub fn advance(&mut self, dt: Fixed) {
        match self {
            Self::AttackBolt(bolt) => bolt.advance(dt),
        }
    }

    /// Whether the effect has finished and should be dropped.
    #[must_use]
    pub fn is_done(&self) -> bool {
        match self {
            Self::AttackBolt(bolt) => bolt.is_done(),
        }
    }

    /// Draw data for this frame.
    #[must_use]
    pub fn render_descriptor(&self) -> EffectDescriptor {
        match self {
            Self::AttackBolt(bolt) => EffectDescriptor {
                position: bolt.position,
                color: bolt.color,
                radius: BOLT_RADIUS,
            },
        }
    }
}

impl From<AttackBolt> for Effect {
    fn from(bolt: AttackBolt) -> Self {
        Self::AttackBolt(bolt)
    }
}

/// Owns every live effect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectSystem {
    effects: Vec<Effect>,
}

impl EffectSystem {
    /// Create an empty effect system.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            effects: Vec::new(),
        }
    }

    /// Add an effect.
    pub fn spawn(&mut self, effect: impl Into<Effect>) {
        self.effects.push(effect.into());
    }

    /// Advance every effect, then drop the finished ones. Survivors keep
    /// their relative order.
    pub fn update(&mut self, dt: Fixed) {
        for effect in &mut self.effects {
            effect.advance(dt);
        }
        self.effects.retain(|effect| !effect.is_done());
    }

    /// Draw data for every live effect, oldest first.
    #[must_use]
    pub fn descriptors(&self) -> Vec<EffectDescriptor> {
        self.effects.iter().map(Effect::render_descriptor).collect()
    }

    /// Live effects, oldest first.
    #[must_use]
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Number of live effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether there are no live effects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
