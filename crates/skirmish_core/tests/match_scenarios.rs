//! End-to-end match scenarios.
//!
//! These drive a [`MatchState`] only through its public surface: unit
//! creation, inputs and ticks.

use skirmish_core::prelude::*;
use skirmish_test_utils::fixtures::{
    duel_config, fixed, fixed_f, frame, match_with_units, place_inputs, vec3,
};

// =============================================================================
// Economy
// =============================================================================

#[test]
fn test_three_attackers_cost_three_hundred() {
    let mut state = MatchState::new(MatchConfig::default());
    let inputs = place_inputs(CommandMode::Attacker, Player::One, &[(-4, -6), (0, -6), (4, -6)]);

    let result = state.tick(frame(), &inputs);

    assert!(result.rejections.is_empty());
    assert_eq!(result.points, [700, 1000]);
    assert_eq!(state.store().query::<Attacker>().len(), 3);
    assert_eq!(result.command_state, CommandState::SpawningAttacker);
}

#[test]
fn test_spawning_stops_when_points_run_out() {
    let mut state = MatchState::new(MatchConfig::default());
    let cells: Vec<(i32, i32)> = (-4..=4).map(|x| (x * 2, -10)).collect();
    let inputs = place_inputs(CommandMode::Wall, Player::Two, &cells);

    let result = state.tick(frame(), &inputs);

    // 1000 / 150 = 6 walls, three confirms rejected.
    assert_eq!(state.store().query::<Defender>().len(), 6);
    assert_eq!(result.points[1], 100);
    assert_eq!(result.rejections.len(), 3);
    assert!(result
        .rejections
        .iter()
        .all(|e| matches!(e, GameError::InsufficientPoints { .. })));
}

// =============================================================================
// Combat
// =============================================================================

#[test]
fn test_attacker_hits_undefended_reactor() {
    let mut state = MatchState::new(MatchConfig::default());
    let reactor = state.reactors().player_two;
    let reactor_position = state.store().get::<Transform>(reactor).unwrap().position;
    let attacker = state.create_unit(
        UnitKind::Attacker,
        reactor_position - vec3(0, 0, 5),
        Player::One,
    );

    let result = state.tick(frame(), &[]);

    assert_eq!(
        state.store().get::<Health>(reactor).unwrap().current,
        fixed(90)
    );
    assert_eq!(
        state.store().get::<Attacker>(attacker).unwrap().current_cooldown,
        fixed(1)
    );
    assert_eq!(result.attacks.len(), 1);
    assert_eq!(result.attacks[0].target, reactor);
    assert_eq!(result.effects.len(), 1);
    assert_eq!(result.effects[0].color, Color::rgb(0, 120, 255));
}

#[test]
fn test_cooldown_gates_attacks() {
    let (mut state, ids) = match_with_units(
        MatchConfig::default(),
        &[
            (UnitKind::Attacker, Player::One, 0, 0),
            (UnitKind::Wall, Player::Two, 0, 4),
        ],
    );
    let wall = ids[1];
    let dt = fixed_f(0.25);

    // First hit lands immediately; the next three ticks are on cooldown.
    let mut hits = 0;
    for _ in 0..4 {
        hits += state.tick(dt, &[]).attacks.len();
    }
    assert_eq!(hits, 1);
    assert_eq!(hits + state.tick(dt, &[]).attacks.len(), 2);
    let health = state.store().get::<Health>(wall).unwrap().current;
    assert!(health == fixed(65) || health == fixed(70) || health == fixed(75));
}

#[test]
fn test_walls_block_or_absorb() {
    let mut blocked = 0;

    for seed in 1..=4 {
        let (mut state, ids) = match_with_units(
            duel_config(seed),
            &[
                (UnitKind::Attacker, Player::One, 0, 0),
                (UnitKind::Wall, Player::Two, 0, 2),
            ],
        );
        let wall = ids[1];
        let mut absorbed = 0;

        while state.store().contains(wall) {
            for attack in state.tick(fixed(1), &[]).attacks {
                match attack.damage.to_num::<i32>() {
                    0 => blocked += 1,
                    5 => absorbed += 1,
                    other => panic!("unexpected mitigated damage {other}"),
                }
            }
        }

        // 75 health at 5 per unblocked hit.
        assert_eq!(absorbed, 15);
        // The kill pays the full reward; the wall was placed for free.
        assert_eq!(state.points(Player::One), 1050);
    }

    assert!(blocked > 0, "30% block chance never fired");
}

#[test]
fn test_equidistant_targets_prefer_earliest() {
    let (mut state, ids) = match_with_units(
        MatchConfig::default(),
        &[
            (UnitKind::Wall, Player::Two, 4, 0),
            (UnitKind::Wall, Player::Two, -4, 0),
            (UnitKind::Attacker, Player::One, 0, 0),
        ],
    );

    let result = state.tick(frame(), &[]);

    assert_eq!(result.attacks.len(), 1);
    assert_eq!(result.attacks[0].target, ids[0]);
}

#[test]
fn test_dead_units_are_swept_and_reported() {
    let (mut state, ids) = match_with_units(
        MatchConfig::default(),
        &[
            (UnitKind::Attacker, Player::One, 0, 0),
            (UnitKind::Attacker, Player::Two, 0, 2),
        ],
    );
    state
        .store_mut()
        .get_mut::<Health>(ids[1])
        .unwrap()
        .current = fixed(5);

    let result = state.tick(frame(), &[]);

    assert_eq!(result.removed, vec![ids[1]]);
    assert!(!state.store().contains(ids[1]));
    assert!(result.entities.iter().all(|view| view.id != ids[1]));
    assert_eq!(result.points, [1050, 1000]);
}

// =============================================================================
// Teleporting
// =============================================================================

#[test]
fn test_empty_portal_selection_is_free() {
    let mut state = MatchState::new(MatchConfig::default());
    let inputs = place_inputs(CommandMode::Portal, Player::One, &[(6, 6)]);

    let result = state.tick(frame(), &inputs);

    assert_eq!(result.command_state, CommandState::SelectingPortalStart);
    assert_eq!(result.points, [1000, 1000]);
    assert!(state.commands().selection().is_empty());
}

#[test]
fn test_teleport_charges_once_for_a_stack() {
    let (mut state, ids) = match_with_units(
        MatchConfig::default(),
        &[
            (UnitKind::Wall, Player::One, 8, -8),
            (UnitKind::Attacker, Player::One, 8, -8),
            (UnitKind::Attacker, Player::Two, 8, -8),
        ],
    );
    state.create_tile(vec3(8, 0, -8), Tile::new(TerrainType::Sand, fixed(1)));

    let mut inputs = place_inputs(CommandMode::Portal, Player::One, &[(8, -8)]);
    inputs.push(InputCommand::Confirm {
        player: Player::One,
        position: vec3(-8, 0, 8),
    });
    let result = state.tick(frame(), &inputs);

    assert_eq!(result.points[0], 800);
    assert_eq!(result.command_state, CommandState::Idle);
    for &id in &ids[..2] {
        let position = state.store().get::<Transform>(id).unwrap().position;
        assert_eq!((position.x, position.z), (fixed(-8), fixed(8)));
    }
    let enemy = state.store().get::<Transform>(ids[2]).unwrap().position;
    assert_eq!((enemy.x, enemy.z), (fixed(8), fixed(-8)));
}

// =============================================================================
// Victory
// =============================================================================

#[test]
fn test_destroying_a_reactor_wins_and_stays_won() {
    let mut state = MatchState::new(MatchConfig::default());
    let reactor = state.reactors().player_one;
    let target = state.store().get::<Transform>(reactor).unwrap().position;
    for dx in [-2, 2] {
        state.create_unit(UnitKind::Attacker, target + vec3(dx, 0, 4), Player::Two);
    }

    let mut ticks = 0;
    while state.win_status() == WinStatus::Undecided {
        state.tick(fixed_f(0.5), &[]);
        ticks += 1;
        assert!(ticks < 100, "reactor never fell");
    }

    assert_eq!(state.win_status(), WinStatus::PlayerTwoWins);
    assert_eq!(
        state.store().get::<Health>(reactor).unwrap().current,
        fixed(0)
    );
    assert!(state.store().contains(reactor));
    assert_eq!(state.points(Player::Two), 1050);

    for _ in 0..20 {
        assert_eq!(state.tick(fixed_f(0.5), &[]).win_status, WinStatus::PlayerTwoWins);
    }
}

#[test]
fn test_effects_expire() {
    let mut state = MatchState::new(MatchConfig::default());
    let reactor = state.reactors().player_two;
    let position = state.store().get::<Transform>(reactor).unwrap().position;
    state.create_unit(UnitKind::Attacker, position - vec3(0, 0, 6), Player::One);

    assert_eq!(state.tick(fixed_f(0.1), &[]).effects.len(), 1);
    // Progress 4 per second: gone after a quarter second.
    assert_eq!(state.tick(fixed_f(0.1), &[]).effects.len(), 1);
    assert!(state.tick(fixed_f(0.2), &[]).effects.is_empty());
}
