//! Simulation systems.
//!
//! Systems contain the logic that processes components. Each one scans
//! the store in entity creation order so that identical inputs always
//! produce identical outcomes, including tie-breaks.
//!
//! The per-tick order is fixed by [`crate::simulation::MatchState::tick`]:
//! cooldowns, then combat, then the death sweep.

use serde::{Deserialize, Serialize};

use crate::combat::{hit_intensity, kill_reward, mitigate_damage, BlockRoll};
use crate::components::{
    Attacker, Defender, EntityId, Health, Player, PlayerAffiliation, Transform,
};
use crate::config::MatchConfig;
use crate::economy::PointsLedger;
use crate::effects::{AttackBolt, EffectSystem};
use crate::math::{fixed_serde, Fixed, Vec3Fixed};
use crate::store::ComponentStore;

/// The two reactor entities of a match.
///
/// Reactors are exempt from the death sweep and are the only entities
/// that are attackable without carrying an [`Attacker`] or [`Defender`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reactors {
    /// Player one's reactor.
    pub player_one: EntityId,
    /// Player two's reactor.
    pub player_two: EntityId,
}

impl Reactors {
    /// Reactor owned by `player`.
    #[must_use]
    pub const fn of(&self, player: Player) -> EntityId {
        match player {
            Player::One => self.player_one,
            Player::Two => self.player_two,
        }
    }

    /// Check whether `entity` is one of the two reactors.
    #[must_use]
    pub const fn contains(&self, entity: EntityId) -> bool {
        entity == self.player_one || entity == self.player_two
    }
}

/// The nearest enemy found for an attacker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetCandidate {
    /// Target entity.
    pub entity: EntityId,
    /// Squared distance from the attacker.
    pub distance_squared: Fixed,
}

/// One resolved attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackEvent {
    /// Attacking entity.
    pub attacker: EntityId,
    /// Entity that was hit.
    pub target: EntityId,
    /// Damage after mitigation.
    #[serde(with = "fixed_serde")]
    pub damage: Fixed,
    /// Whether this hit took the target to zero health.
    pub killed: bool,
}

/// Whether `entity` can be chosen as a combat target by `attacker_owner`.
///
/// A target must belong to the other player, have a position and be
/// alive, and be a fighter (Attacker or Defender) or a reactor.
#[must_use]
pub fn is_attackable(
    store: &ComponentStore,
    reactors: &Reactors,
    attacker_owner: Player,
    entity: EntityId,
) -> bool {
    let Some(affiliation) = store.get::<PlayerAffiliation>(entity) else {
        return false;
    };
    if affiliation.player == attacker_owner || !store.has::<Transform>(entity) {
        return false;
    }
    if !store.get::<Health>(entity).is_some_and(Health::is_alive) {
        return false;
    }
    store.has::<Attacker>(entity) || store.has::<Defender>(entity) || reactors.contains(entity)
}

/// Nearest attackable enemy of `attacker_owner` from `origin`.
///
/// Candidates are scanned in creation order and only a strictly closer
/// one replaces the current best, so equidistant ties go to the
/// earliest-created entity.
#[must_use]
pub fn find_nearest_target(
    store: &ComponentStore,
    reactors: &Reactors,
    attacker_owner: Player,
    origin: Vec3Fixed,
) -> Option<TargetCandidate> {
    let mut best: Option<TargetCandidate> = None;

    for entity in store.query::<PlayerAffiliation>() {
        if !is_attackable(store, reactors, attacker_owner, entity) {
            continue;
        }
        let Some(transform) = store.get::<Transform>(entity) else {
            continue;
        };
        let distance_squared = origin.distance_squared(transform.position);
        if matches!(best, Some(b) if distance_squared >= b.distance_squared) {
            continue;
        }
        best = Some(TargetCandidate {
            entity,
            distance_squared,
        });
    }

    best
}

/// Counts every attacker's cooldown down by `dt`, never below zero.
pub fn cooldown_system(store: &mut ComponentStore, dt: Fixed) {
    for entity in store.query::<Attacker>() {
        if let Some(attacker) = store.get_mut::<Attacker>(entity) {
            attacker.tick_cooldown(dt);
        }
    }
}

/// Resolves one round of attacks.
///
/// Attackers act in creation order. Each one that is alive, affiliated,
/// ready and within range of its nearest target deals mitigated damage,
/// resets its cooldown and spawns an attack bolt. Killing blows pay the
/// attacker's owner. Dead entities stay in the store until the
/// [`death_sweep_system`] runs, but are no longer attackable.
pub fn combat_system(
    store: &mut ComponentStore,
    reactors: &Reactors,
    config: &MatchConfig,
    ledger: &mut PointsLedger,
    effects: &mut EffectSystem,
    rolls: &mut impl BlockRoll,
) -> Vec<AttackEvent> {
    let mut events = Vec::new();

    for attacker_id in store.query::<Attacker>() {
        let Some(attacker) = store.get::<Attacker>(attacker_id).copied() else {
            continue;
        };
        let Some(origin) = store.get::<Transform>(attacker_id).map(|t| t.position) else {
            continue;
        };
        let Some(owner) = store.get::<PlayerAffiliation>(attacker_id).map(|a| a.player) else {
            continue;
        };
        // Units killed earlier in this round do not get to fire back.
        if !store.get::<Health>(attacker_id).is_some_and(Health::is_alive) {
            continue;
        }

        let Some(target) = find_nearest_target(store, reactors, owner, origin) else {
            continue;
        };
        let in_range = target.distance_squared <= attacker.range.saturating_mul(attacker.range);
        if !in_range || !attacker.can_attack() {
            continue;
        }
        let Some(target_position) = store.get::<Transform>(target.entity).map(|t| t.position)
        else {
            continue;
        };

        let defender = store.get::<Defender>(target.entity).copied();
        let damage = mitigate_damage(attacker.damage, defender.as_ref(), rolls);

        let Some(health) = store.get_mut::<Health>(target.entity) else {
            continue;
        };
        health.take_damage(damage);
        let killed = !health.is_alive();

        if let Some(attacker) = store.get_mut::<Attacker>(attacker_id) {
            attacker.reset_cooldown();
        }

        let lift = Vec3Fixed::new(Fixed::ZERO, Fixed::ONE, Fixed::ZERO);
        let color = AttackBolt::color_for(owner, hit_intensity(damage, attacker.damage));
        effects.spawn(AttackBolt::new(
            origin + lift,
            target_position + lift,
            color,
            config.effect_speed,
        ));

        if killed {
            let reward = kill_reward(config, damage);
            ledger.award(owner, reward);
            tracing::debug!(
                attacker = attacker_id,
                target = target.entity,
                ?owner,
                reward,
                "Kill"
            );
        }

        events.push(AttackEvent {
            attacker: attacker_id,
            target: target.entity,
            damage,
            killed,
        });
    }

    events
}

/// Removes every dead, non-reactor entity that has a Health component.
///
/// Returns the removed IDs in creation order. Reactors are left in place
/// at zero health so the win check can see them.
pub fn death_sweep_system(store: &mut ComponentStore, reactors: &Reactors) -> Vec<EntityId> {
    let dead: Vec<EntityId> = store
        .query::<Health>()
        .into_iter()
        .filter(|&id| !reactors.contains(id))
        .filter(|&id| !store.get::<Health>(id).is_some_and(Health::is_alive))
        .collect();

    for &id in &dead {
        store.remove_entity(id);
    }

    dead
}
