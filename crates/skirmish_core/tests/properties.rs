//! Property tests for the store, health, mitigation and the match loop.

use proptest::prelude::*;
use skirmish_core::combat::mitigate_damage;
use skirmish_core::prelude::*;
use skirmish_test_utils::determinism::strategies::{
    arb_block_chance, arb_damage, arb_health, arb_input_sequence,
};
use skirmish_test_utils::fixtures::{duel_config, fixed, frame, vec3};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_health_stays_in_bounds(
        max in arb_health(),
        ops in proptest::collection::vec((any::<bool>(), arb_damage()), 0..40),
    ) {
        let mut health = Health::new(max);
        for (is_heal, amount) in ops {
            if is_heal {
                health.heal(amount);
            } else {
                health.take_damage(amount);
            }
            prop_assert!(health.current >= Fixed::ZERO);
            prop_assert!(health.current <= health.max);
        }
    }

    #[test]
    fn prop_removed_entities_leave_no_trace(
        count in 1usize..20,
        remove_mask in any::<u32>(),
    ) {
        let mut store = ComponentStore::new();
        let ids: Vec<EntityId> = (0..count)
            .map(|i| {
                let builder = store
                    .spawn()
                    .with(Transform::at(vec3(0, 0, 0)))
                    .with(Health::new(fixed(10)));
                if i % 2 == 0 {
                    builder.with(Attacker::new(fixed(1), fixed(1), fixed(1))).id()
                } else {
                    builder.with(Defender::new(fixed(1), Fixed::ZERO)).id()
                }
            })
            .collect();

        let removed: Vec<EntityId> = ids
            .iter()
            .enumerate()
            .filter(|(i, _)| remove_mask & (1 << i) != 0)
            .map(|(_, &id)| id)
            .collect();
        for &id in &removed {
            store.remove_entity(id);
        }

        for &id in &removed {
            prop_assert!(store.get::<Transform>(id).is_none());
            prop_assert!(store.get::<Health>(id).is_none());
            prop_assert!(store.get::<Attacker>(id).is_none());
            prop_assert!(store.get::<Defender>(id).is_none());
            prop_assert!(!store.all_entities().contains(&id));
        }
        prop_assert_eq!(store.len(), count - removed.len());
    }

    #[test]
    fn prop_mitigation_bounds(
        damage in arb_damage(),
        defense in arb_damage(),
        block_chance in arb_block_chance(),
        seed in any::<u64>(),
    ) {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
        let defender = Defender::new(defense, block_chance);

        let mitigated = mitigate_damage(damage, Some(&defender), &mut rng);
        prop_assert!(mitigated >= Fixed::ZERO);
        prop_assert!(mitigated == Fixed::ZERO || mitigated == damage - defense);
    }

    #[test]
    fn prop_certain_block_always_zero(damage in arb_damage(), seed in any::<u64>()) {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
        let defender = Defender::new(fixed(5), Fixed::ONE);
        prop_assert_eq!(mitigate_damage(damage, Some(&defender), &mut rng), Fixed::ZERO);
    }

    #[test]
    fn prop_balances_never_negative(
        seed in any::<u64>(),
        inputs in arb_input_sequence(40),
    ) {
        let mut state = MatchState::new(duel_config(seed));
        for chunk in inputs.chunks(4) {
            let result = state.tick(frame(), chunk);
            prop_assert!(result.points.iter().all(|&p| p >= 0));
            let health_in_bounds = result.entities.iter().all(|view| {
                view.health.map_or(true, |h| h.current >= Fixed::ZERO && h.current <= h.max)
            });
            prop_assert!(health_in_bounds);
        }
    }

    #[test]
    fn prop_outcome_never_reverts(seed in any::<u64>(), inputs in arb_input_sequence(30)) {
        let mut state = MatchState::new(duel_config(seed));
        let reactor = state.reactors().player_two;
        state.store_mut().get_mut::<Health>(reactor).unwrap().current = Fixed::ZERO;

        prop_assert_eq!(state.tick(frame(), &[]).win_status, WinStatus::PlayerOneWins);
        for chunk in inputs.chunks(3) {
            prop_assert_eq!(state.tick(frame(), chunk).win_status, WinStatus::PlayerOneWins);
        }
    }
}
