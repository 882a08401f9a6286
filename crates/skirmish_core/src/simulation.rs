//! Core match loop.
//!
//! [`MatchState`] owns everything a match needs: the component store,
//! point balances, the two reactors, transient effects, the command flow
//! and the seeded block-roll generator. Nothing is global, so any number of
//! matches can run side by side.
//!
//! Each call to [`MatchState::tick`] runs, in order:
//!
//! 1. queued inputs through the command state machine
//! 2. effect animation
//! 3. cooldown decay
//! 4. target search and attack resolution
//! 5. the death sweep
//! 6. the win check

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::commands::{CommandFlow, CommandState, InputCommand};
use crate::components::{
    Attacker, Color, Defender, EntityId, Health, Player, PlayerAffiliation, Portal, Renderable,
    Tile, Transform, UnitKind,
};
use crate::config::MatchConfig;
use crate::economy::PointsLedger;
use crate::effects::{EffectDescriptor, EffectSystem};
use crate::error::GameError;
use crate::grid::Grid;
use crate::math::{Fixed, Vec3Fixed};
use crate::store::ComponentStore;
use crate::systems::{combat_system, cooldown_system, death_sweep_system, AttackEvent, Reactors};

/// Match outcome. Once decided it never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WinStatus {
    /// Both reactors are still standing.
    #[default]
    Undecided,
    /// Player two's reactor fell.
    PlayerOneWins,
    /// Player one's reactor fell.
    PlayerTwoWins,
}

impl WinStatus {
    /// Winning player, if any.
    #[must_use]
    pub const fn winner(self) -> Option<Player> {
        match self {
            Self::Undecided => None,
            Self::PlayerOneWins => Some(Player::One),
            Self::PlayerTwoWins => Some(Player::Two),
        }
    }

    /// Check if the match has been decided.
    #[must_use]
    pub const fn is_decided(self) -> bool {
        !matches!(self, Self::Undecided)
    }
}

/// Drawable snapshot of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityView {
    /// Entity ID.
    pub id: EntityId,
    /// World placement.
    pub transform: Transform,
    /// Presentation hints, absent for bare entities.
    pub renderable: Option<Renderable>,
    /// Health, absent for terrain and portals.
    pub health: Option<Health>,
    /// Owner, absent for terrain.
    pub player: Option<Player>,
    /// Terrain data for tile entities.
    pub tile: Option<Tile>,
}

/// Everything the presentation layer needs after one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickResult {
    /// Tick counter after this tick.
    pub tick: u64,
    /// Balances as `[player one, player two]`.
    pub points: [i32; 2],
    /// Command state after inputs were applied.
    pub command_state: CommandState,
    /// Match outcome.
    pub win_status: WinStatus,
    /// Every entity with a transform, in creation order.
    pub entities: Vec<EntityView>,
    /// Live effects, oldest first.
    pub effects: Vec<EffectDescriptor>,
    /// Attacks resolved this tick.
    pub attacks: Vec<AttackEvent>,
    /// Entities removed by the death sweep.
    pub removed: Vec<EntityId>,
    /// Inputs that were rejected, in input order.
    pub rejections: Vec<GameError>,
}

/// Complete state of one match.
#[derive(Debug, Clone)]
pub struct MatchState {
    pub(crate) config: MatchConfig,
    pub(crate) grid: Grid,
    pub(crate) store: ComponentStore,
    pub(crate) ledger: PointsLedger,
    pub(crate) effects: EffectSystem,
    pub(crate) commands: CommandFlow,
    pub(crate) reactors: Reactors,
    pub(crate) outcome: WinStatus,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) tick: u64,
}

impl MatchState {
    /// Start a match: both players at their starting points and a reactor
    /// for each player at its snapped configured position.
    #[must_use]
    pub fn new(config: MatchConfig) -> Self {
        let grid = Grid::new(&config.grid, config.spawn_height_offset);
        let mut state = Self {
            grid,
            store: ComponentStore::new(),
            ledger: PointsLedger::new(config.starting_points),
            effects: EffectSystem::new(),
            commands: CommandFlow::new(),
            reactors: Reactors {
                player_one: 0,
                player_two: 0,
            },
            outcome: WinStatus::Undecided,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            tick: 0,
            config,
        };

        let player_one = state.create_unit(
            UnitKind::Reactor,
            grid.snap(config.reactor.player_one_position),
            Player::One,
        );
        let player_two = state.create_unit(
            UnitKind::Reactor,
            grid.snap(config.reactor.player_two_position),
            Player::Two,
        );
        state.reactors = Reactors {
            player_one,
            player_two,
        };

        tracing::debug!(
            seed = config.seed,
            player_one,
            player_two,
            "Match started"
        );
        state
    }

    /// Create a unit of `kind` for `player` at `position`, with stats from
    /// the match config. The position is used as given; no points are
    /// charged and no bounds are checked.
    ///
    /// Reactors created this way are ordinary units: only the two created
    /// at match start decide the game.
    pub fn create_unit(&mut self, kind: UnitKind, position: Vec3Fixed, player: Player) -> EntityId {
        let config = &self.config;
        let team_color = match player {
            Player::One => Color::BLUE,
            Player::Two => Color::RED,
        };
        let renderable = |color, size, height| Renderable {
            color,
            kind,
            size,
            height,
        };

        let builder = self
            .store
            .spawn()
            .with(Transform::at(position))
            .with(PlayerAffiliation::new(player));

        let entity = match kind {
            UnitKind::Attacker => builder
                .with(renderable(team_color, config.attacker.size, config.attacker.height))
                .with(Attacker::new(
                    config.attacker.damage,
                    config.attacker.range,
                    config.attacker.cooldown,
                ))
                .with(Health::new(config.attacker.health)),
            UnitKind::Wall => {
                let color = match player {
                    Player::One => Color::DARK_GREEN,
                    Player::Two => Color::DARK_PURPLE,
                };
                builder
                    .with(renderable(color, config.wall.size, config.wall.height))
                    .with(Defender::new(config.wall.defense, config.wall.block_chance))
                    .with(Health::new(config.wall.health))
            }
            UnitKind::Reactor => builder
                .with(renderable(team_color, config.reactor.size, config.reactor.height))
                .with(Health::new(config.reactor.health)),
            UnitKind::Portal => builder
                .with(renderable(team_color, config.portal.size, config.portal.height))
                .with(Portal::new(config.portal.cooldown)),
        }
        .id();

        tracing::debug!(entity, ?kind, ?player, "Unit created");
        entity
    }

    /// Attach a terrain tile at `position`. Tiles are never targeted,
    /// selected or teleported.
    pub fn create_tile(&mut self, position: Vec3Fixed, tile: Tile) -> EntityId {
        self.store
            .spawn()
            .with(Transform::at(position))
            .with(tile)
            .id()
    }

    /// Advance the match by `elapsed` seconds after applying `inputs` in order.
    ///
    /// Rejected inputs leave no trace beyond their entry in
    /// [`TickResult::rejections`]. Negative elapsed time counts as zero.
    pub fn tick(&mut self, elapsed: Fixed, inputs: &[InputCommand]) -> TickResult {
        let dt = elapsed.max(Fixed::ZERO);

        let mut rejections = Vec::new();
        for &input in inputs {
            if let Err(err) = self.apply_input(input) {
                tracing::debug!(tick = self.tick, %err, "Input rejected");
                rejections.push(err);
            }
        }

        self.effects.update(dt);
        cooldown_system(&mut self.store, dt);
        let attacks = combat_system(
            &mut self.store,
            &self.reactors,
            &self.config,
            &mut self.ledger,
            &mut self.effects,
            &mut self.rng,
        );
        let removed = death_sweep_system(&mut self.store, &self.reactors);
        self.check_outcome();

        self.tick += 1;

        #[cfg(feature = "debug-validation")]
        self.validate_invariants();

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Match state hash");
        }

        TickResult {
            tick: self.tick,
            points: self.ledger.balances(),
            command_state: self.commands.state(),
            win_status: self.outcome,
            entities: self.entity_views(),
            effects: self.effects.descriptors(),
            attacks,
            removed,
            rejections,
        }
    }

    /// Latch the outcome the first time a reactor is found dead.
    fn check_outcome(&mut self) {
        if self.outcome.is_decided() {
            return;
        }
        let fallen = |id: EntityId| {
            self.store
                .get::<Health>(id)
                .is_some_and(|health| !health.is_alive())
        };
        self.outcome = if fallen(self.reactors.player_one) {
            WinStatus::PlayerTwoWins
        } else if fallen(self.reactors.player_two) {
            WinStatus::PlayerOneWins
        } else {
            return;
        };
        tracing::info!(tick = self.tick, outcome = ?self.outcome, "Match decided");
    }

    /// Entities whose X/Z position lies in the same cell as `position`.
    ///
    /// Height is ignored. Results are in creation order.
    #[must_use]
    pub fn entities_at(&self, position: Vec3Fixed) -> Vec<EntityId> {
        let tile_size = self.grid.tile_size();
        self.store
            .query::<Transform>()
            .into_iter()
            .filter(|&id| {
                self.store
                    .get::<Transform>(id)
                    .is_some_and(|t| t.position.same_cell(position, tile_size))
            })
            .collect()
    }

    /// Drawable snapshot of every placed entity, in creation order.
    #[must_use]
    pub fn entity_views(&self) -> Vec<EntityView> {
        self.store
            .query::<Transform>()
            .into_iter()
            .filter_map(|id| {
                let transform = *self.store.get::<Transform>(id)?;
                Some(EntityView {
                    id,
                    transform,
                    renderable: self.store.get::<Renderable>(id).copied(),
                    health: self.store.get::<Health>(id).copied(),
                    player: self.store.get::<PlayerAffiliation>(id).map(|a| a.player),
                    tile: self.store.get::<Tile>(id).copied(),
                })
            })
            .collect()
    }

    /// Compute a deterministic hash of the match state.
    ///
    /// Covers the tick counter, balances, command flow, outcome, effects and
    /// every entity's components. Two matches with the same config and
    /// inputs hash identically after every tick.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.ledger.hash(&mut hasher);
        self.commands.state().hash(&mut hasher);
        self.commands.selection().hash(&mut hasher);
        self.outcome.hash(&mut hasher);
        self.effects.len().hash(&mut hasher);
        for descriptor in self.effects.descriptors() {
            descriptor.position.hash(&mut hasher);
        }

        let entities = self.store.all_entities();
        entities.len().hash(&mut hasher);
        for &id in entities {
            id.hash(&mut hasher);

            if let Some(transform) = self.store.get::<Transform>(id) {
                transform.position.hash(&mut hasher);
            }
            if let Some(health) = self.store.get::<Health>(id) {
                health.current.to_bits().hash(&mut hasher);
                health.max.to_bits().hash(&mut hasher);
            }
            if let Some(attacker) = self.store.get::<Attacker>(id) {
                attacker.current_cooldown.to_bits().hash(&mut hasher);
            }
            if let Some(affiliation) = self.store.get::<PlayerAffiliation>(id) {
                affiliation.player.hash(&mut hasher);
            }
            self.store.has::<Defender>(id).hash(&mut hasher);
            self.store.has::<Tile>(id).hash(&mut hasher);
        }

        hasher.finish()
    }

    #[cfg(feature = "debug-validation")]
    fn validate_invariants(&self) {
        for id in self.store.query::<Health>() {
            if let Some(health) = self.store.get::<Health>(id) {
                debug_assert!(
                    health.current >= Fixed::ZERO && health.current <= health.max,
                    "entity {id} health {} outside 0..={}",
                    health.current,
                    health.max
                );
            }
        }
        debug_assert!(self.store.contains(self.reactors.player_one));
        debug_assert!(self.store.contains(self.reactors.player_two));
    }

    /// Match configuration.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Grid used for snapping and bounds checks.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Entity and component storage.
    #[must_use]
    pub const fn store(&self) -> &ComponentStore {
        &self.store
    }

    /// Mutable entity and component storage, for setup and tooling.
    pub fn store_mut(&mut self) -> &mut ComponentStore {
        &mut self.store
    }

    /// Point balances.
    #[must_use]
    pub const fn ledger(&self) -> &PointsLedger {
        &self.ledger
    }

    /// Current balance for `player`.
    #[must_use]
    pub const fn points(&self, player: Player) -> i32 {
        self.ledger.balance(player)
    }

    /// Live effects.
    #[must_use]
    pub const fn effects(&self) -> &EffectSystem {
        &self.effects
    }

    /// Command state and pending selection.
    #[must_use]
    pub const fn commands(&self) -> &CommandFlow {
        &self.commands
    }

    /// Current command state.
    #[must_use]
    pub const fn command_state(&self) -> CommandState {
        self.commands.state()
    }

    /// The two reactors.
    #[must_use]
    pub const fn reactors(&self) -> &Reactors {
        &self.reactors
    }

    /// Match outcome so far.
    #[must_use]
    pub const fn win_status(&self) -> WinStatus {
        self.outcome
    }

    /// Number of ticks run.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }
}
