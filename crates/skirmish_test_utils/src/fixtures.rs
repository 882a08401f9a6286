//! Test fixtures and helpers.
//!
//! Pre-built matches and input scripts for consistent testing.

use fixed::types::I32F32;
use skirmish_core::commands::{CommandMode, InputCommand};
use skirmish_core::components::{EntityId, Player, UnitKind};
use skirmish_core::config::MatchConfig;
use skirmish_core::math::Vec3Fixed;
use skirmish_core::simulation::MatchState;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a world position from integer coordinates.
#[must_use]
pub fn vec3(x: i32, y: i32, z: i32) -> Vec3Fixed {
    Vec3Fixed::new(fixed(x), fixed(y), fixed(z))
}

/// One frame at 60 FPS.
#[must_use]
pub fn frame() -> I32F32 {
    fixed(1) / fixed(60)
}

/// Standard duel config with a chosen seed.
#[must_use]
pub fn duel_config(seed: u64) -> MatchConfig {
    MatchConfig::default().with_seed(seed)
}

/// A fresh match with extra units placed at grid coordinates, in order.
///
/// Units are created directly (no points are charged). Returns the match
/// and the new unit IDs.
#[must_use]
pub fn match_with_units(
    config: MatchConfig,
    units: &[(UnitKind, Player, i32, i32)],
) -> (MatchState, Vec<EntityId>) {
    let mut state = MatchState::new(config);
    let ids = units
        .iter()
        .map(|&(kind, player, x, z)| state.create_unit(kind, vec3(x, 1, z), player))
        .collect();
    (state, ids)
}

/// Select `mode` then confirm once at each cell for `player`.
#[must_use]
pub fn place_inputs(mode: CommandMode, player: Player, cells: &[(i32, i32)]) -> Vec<InputCommand> {
    std::iter::once(InputCommand::Select { mode })
        .chain(cells.iter().map(|&(x, z)| InputCommand::Confirm {
            player,
            position: vec3(x, 0, z),
        }))
        .collect()
}

/// A short skirmish: both players field attackers and walls near the
/// centre line so that blocks, kills and reactor damage all happen.
#[must_use]
pub fn skirmish_script() -> Vec<InputCommand> {
    let mut inputs = place_inputs(CommandMode::Attacker, Player::One, &[(-2, -4), (2, -4)]);
    inputs.extend(place_inputs(CommandMode::Wall, Player::One, &[(0, -2)]));
    inputs.extend(place_inputs(CommandMode::Attacker, Player::Two, &[(-2, 4), (4, 6)]));
    inputs.extend(place_inputs(CommandMode::Wall, Player::Two, &[(0, 2), (2, 2)]));
    inputs.push(InputCommand::Cancel);
    inputs
}

/// A match with [`skirmish_script`] already applied in the first tick.
#[must_use]
pub fn skirmish_match(seed: u64) -> MatchState {
    let mut state = MatchState::new(duel_config(seed));
    let opening = state.tick(frame(), &skirmish_script());
    assert!(
        opening.rejections.is_empty(),
        "skirmish script was rejected: {:?}",
        opening.rejections
    );
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skirmish_match_places_every_unit() {
        let state = skirmish_match(7);
        // Two reactors, four attackers and three walls.
        assert_eq!(state.store().len(), 9);
        assert_eq!(state.points(Player::One), 650);
        assert_eq!(state.points(Player::Two), 500);
        assert_eq!(state.current_tick(), 1);
    }
}
