//! Damage mitigation and kill scoring.
//!
//! Mitigation has two stages. A Defender first gets a chance to block the
//! hit outright; otherwise its flat defense is subtracted. Targets without
//! a Defender take the attacker's damage unmodified.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::components::Defender;
use crate::config::MatchConfig;
use crate::math::Fixed;

/// Source of block rolls: uniform integers in `[0, 100)`.
pub trait BlockRoll {
    /// Draw the next roll.
    fn roll(&mut self) -> u32;
}

impl BlockRoll for ChaCha8Rng {
    fn roll(&mut self) -> u32 {
        self.random_range(0..100)
    }
}

/// Damage left after the target's Defender (if any) is applied.
///
/// A roll is drawn only when the target actually has a Defender, so
/// undefended targets do not advance the roll sequence.
pub fn mitigate_damage(
    damage: Fixed,
    defender: Option<&Defender>,
    rolls: &mut impl BlockRoll,
) -> Fixed {
    match defender {
        Some(defender) => defender.mitigate(damage, rolls.roll()),
        None => damage,
    }
}

/// Points awarded for a killing blow.
///
/// A kill landed by a fully blocked hit scores the smaller reward. With
/// the current damage rules a zero-damage hit cannot finish a living
/// target, so in practice only the full reward is ever paid.
#[must_use]
pub fn kill_reward(config: &MatchConfig, mitigated: Fixed) -> i32 {
    if mitigated > Fixed::ZERO {
        config.kill_reward
    } else {
        config.blocked_kill_reward
    }
}

/// Fraction of the attacker's damage that got through, in `[0, 1]`.
#[must_use]
pub fn hit_intensity(mitigated: Fixed, damage: Fixed) -> Fixed {
    if damage <= Fixed::ZERO {
        return Fixed::ZERO;
    }
    (mitigated / damage).clamp(Fixed::ZERO, Fixed::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    /// Replays a fixed list of rolls.
    struct ScriptedRolls(Vec<u32>);

    impl BlockRoll for ScriptedRolls {
        fn roll(&mut self) -> u32 {
            self.0.remove(0)
        }
    }

    fn fx(n: i32) -> Fixed {
        Fixed::from_num(n)
    }

    #[test]
    fn test_no_defender_passes_damage_through() {
        let mut rolls = ScriptedRolls(vec![]);
        assert_eq!(mitigate_damage(fx(10), None, &mut rolls), fx(10));
    }

    #[test]
    fn test_flat_defense() {
        let defender = Defender::new(fx(5), Fixed::ZERO);
        let mut rolls = ScriptedRolls(vec![0]);
        assert_eq!(mitigate_damage(fx(10), Some(&defender), &mut rolls), fx(5));
        assert!(rolls.0.is_empty());
    }

    #[test]
    fn test_certain_block() {
        let defender = Defender::new(fx(5), Fixed::ONE);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for damage in [1, 10, 500] {
            assert_eq!(
                mitigate_damage(fx(damage), Some(&defender), &mut rng),
                Fixed::ZERO
            );
        }
    }

    #[test]
    fn test_seeded_rolls_in_range_and_repeatable() {
        let mut a = ChaCha8Rng::seed_from_u64(11);
        let mut b = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..200 {
            let roll = a.roll();
            assert!(roll < 100);
            assert_eq!(roll, b.roll());
        }
    }

    #[test]
    fn test_kill_reward_branches() {
        let config = MatchConfig::default();
        assert_eq!(kill_reward(&config, fx(5)), 50);
        assert_eq!(kill_reward(&config, Fixed::ZERO), 25);
    }

    #[test]
    fn test_hit_intensity() {
        assert_eq!(hit_intensity(fx(5), fx(10)), Fixed::from_num(0.5));
        assert_eq!(hit_intensity(Fixed::ZERO, fx(10)), Fixed::ZERO);
        assert_eq!(hit_intensity(fx(5), Fixed::ZERO), Fixed::ZERO);
    }
}
