//! Spawn and teleport command state machine.
//!
//! Input arrives as discrete [`InputCommand`]s: pick a mode, confirm at a
//! world position, or cancel. Spawn modes persist after a successful
//! confirm so repeated clicks keep spawning. Teleporting takes two
//! confirms, one to pick up the acting player's units at a start cell and
//! one to drop them at a destination cell.
//!
//! Confirms that cannot be honoured (out of bounds, not enough points)
//! return an error and leave the match untouched.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, Player, PlayerAffiliation, Tile, Transform, UnitKind};
use crate::error::Result;
use crate::math::Vec3Fixed;
use crate::simulation::MatchState;

/// Where the command flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CommandState {
    /// No command in progress.
    #[default]
    Idle,
    /// Each confirm spawns an attacker.
    SpawningAttacker,
    /// Each confirm spawns a wall.
    SpawningWall,
    /// Waiting for the cell to teleport from.
    SelectingPortalStart,
    /// Waiting for the cell to teleport to.
    SelectingPortalEnd,
}

impl CommandState {
    /// Status line shown to the player for this state.
    #[must_use]
    pub const fn prompt(self) -> &'static str {
        match self {
            Self::Idle => "Press 1 for Attacker, 2 for Portal, 3 for Wall",
            Self::SpawningAttacker => "Attacker Spawn Mode (Cost: 100) - ESC to cancel",
            Self::SpawningWall => "Wall Spawn Mode (Cost: 150) - ESC to cancel",
            Self::SelectingPortalStart => {
                "Select Portal Start Position (Cost: 200) - ESC to cancel"
            }
            Self::SelectingPortalEnd => "Select Portal End Position - ESC to cancel",
        }
    }
}

/// Mode a player can switch into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandMode {
    /// Spawn attackers.
    Attacker,
    /// Spawn walls.
    Wall,
    /// Teleport units.
    Portal,
}

impl CommandMode {
    /// State entered when this mode is selected.
    #[must_use]
    pub const fn initial_state(self) -> CommandState {
        match self {
            Self::Attacker => CommandState::SpawningAttacker,
            Self::Wall => CommandState::SpawningWall,
            Self::Portal => CommandState::SelectingPortalStart,
        }
    }
}

/// One discrete input from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum InputCommand {
    /// Switch to a mode, from any state.
    Select {
        /// Mode to enter.
        mode: CommandMode,
    },
    /// Click at a world position on behalf of `player`.
    Confirm {
        /// Acting player; pays costs and owns anything spawned.
        player: Player,
        /// Clicked world position, snapped before use.
        position: Vec3Fixed,
    },
    /// Return to idle and drop any pending selection.
    Cancel,
}

/// What an accepted input did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandOutcome {
    /// The command state changed.
    StateChanged(CommandState),
    /// A unit was bought and placed.
    Spawned(EntityId),
    /// Units were picked up for teleporting.
    Selected(Vec<EntityId>),
    /// Units were moved to the destination.
    Teleported(Vec<EntityId>),
    /// The input had no effect.
    Ignored,
}

/// Command state plus the pending teleport selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandFlow {
    state: CommandState,
    selection: Vec<EntityId>,
    anchor: Option<Vec3Fixed>,
}

impl CommandFlow {
    /// Start idle with nothing selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> CommandState {
        self.state
    }

    /// Entities picked up at the teleport start cell.
    #[must_use]
    pub fn selection(&self) -> &[EntityId] {
        &self.selection
    }

    /// Snapped start cell of a pending teleport.
    #[must_use]
    pub const fn anchor(&self) -> Option<Vec3Fixed> {
        self.anchor
    }

    fn enter(&mut self, state: CommandState) {
        self.state = state;
        self.selection.clear();
        self.anchor = None;
    }
}

impl MatchState {
    /// Apply one input to the command state machine.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GameError::OutOfBounds`] or
    /// [`crate::GameError::InsufficientPoints`] for a confirm that cannot be
    /// honoured. The match is left exactly as it was.
    pub fn apply_input(&mut self, input: InputCommand) -> Result<CommandOutcome> {
        match input {
            InputCommand::Select { mode } => {
                let state = mode.initial_state();
                self.commands.enter(state);
                tracing::debug!(?state, "Command mode selected");
                Ok(CommandOutcome::StateChanged(state))
            }
            InputCommand::Cancel => {
                self.commands.enter(CommandState::Idle);
                tracing::debug!("Command cancelled");
                Ok(CommandOutcome::StateChanged(CommandState::Idle))
            }
            InputCommand::Confirm { player, position } => self.confirm(player, position),
        }
    }

    fn confirm(&mut self, player: Player, position: Vec3Fixed) -> Result<CommandOutcome> {
        let state = self.commands.state();
        if state == CommandState::Idle {
            return Ok(CommandOutcome::Ignored);
        }
        let target = self.grid.snap_target(position)?;

        match state {
            CommandState::Idle => Ok(CommandOutcome::Ignored),
            CommandState::SpawningAttacker => {
                self.purchase(UnitKind::Attacker, self.config.attacker.cost, target, player)
            }
            CommandState::SpawningWall => {
                self.purchase(UnitKind::Wall, self.config.wall.cost, target, player)
            }
            CommandState::SelectingPortalStart => self.select_for_teleport(target, player),
            CommandState::SelectingPortalEnd => self.finish_teleport(target, player),
        }
    }

    fn purchase(
        &mut self,
        kind: UnitKind,
        cost: i32,
        target: Vec3Fixed,
        player: Player,
    ) -> Result<CommandOutcome> {
        self.ledger.spend(player, cost)?;
        let entity = self.create_unit(kind, target, player);
        Ok(CommandOutcome::Spawned(entity))
    }

    fn select_for_teleport(&mut self, target: Vec3Fixed, player: Player) -> Result<CommandOutcome> {
        self.ledger
            .ensure_affordable(player, self.config.teleport_cost)?;

        let owned: Vec<EntityId> = self
            .entities_at(target)
            .into_iter()
            .filter(|&id| {
                self.store
                    .get::<PlayerAffiliation>(id)
                    .is_some_and(|a| a.player == player)
            })
            .collect();
        if owned.is_empty() {
            return Ok(CommandOutcome::Ignored);
        }

        self.commands.state = CommandState::SelectingPortalEnd;
        self.commands.selection.clone_from(&owned);
        self.commands.anchor = Some(target);
        tracing::debug!(?player, selected = owned.len(), "Teleport start selected");
        Ok(CommandOutcome::Selected(owned))
    }

    fn finish_teleport(&mut self, target: Vec3Fixed, player: Player) -> Result<CommandOutcome> {
        self.ledger.spend(player, self.config.teleport_cost)?;

        let selection = std::mem::take(&mut self.commands.selection);
        let moved: Vec<EntityId> = selection
            .into_iter()
            .filter(|&id| self.teleport(id, target))
            .collect();
        self.commands.enter(CommandState::Idle);
        tracing::debug!(?player, moved = moved.len(), "Teleport finished");
        Ok(CommandOutcome::Teleported(moved))
    }

    /// Move `entity` horizontally to `destination`, keeping its height.
    ///
    /// Terrain tiles and entities without a transform stay put. Returns
    /// whether the entity moved.
    pub fn teleport(&mut self, entity: EntityId, destination: Vec3Fixed) -> bool {
        if self.store.has::<Tile>(entity) {
            return false;
        }
        let Some(transform) = self.store.get_mut::<Transform>(entity) else {
            return false;
        };
        transform.position = destination.with_y(transform.position.y);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::error::GameError;
    use crate::math::Fixed;

    fn v(x: i32, z: i32) -> Vec3Fixed {
        Vec3Fixed::new(Fixed::from_num(x), Fixed::ZERO, Fixed::from_num(z))
    }

    fn confirm(player: Player, x: i32, z: i32) -> InputCommand {
        InputCommand::Confirm {
            player,
            position: v(x, z),
        }
    }

    fn select(mode: CommandMode) -> InputCommand {
        InputCommand::Select { mode }
    }

    #[test]
    fn test_prompts() {
        assert_eq!(
            CommandState::SpawningAttacker.prompt(),
            "Attacker Spawn Mode (Cost: 100) - ESC to cancel"
        );
        assert!(CommandState::Idle.prompt().starts_with("Press 1"));
    }

    #[test]
    fn test_confirm_while_idle_is_ignored() {
        let mut state = MatchState::new(MatchConfig::default());
        let before = state.store().len();
        assert_eq!(
            state.apply_input(confirm(Player::One, 0, 0)),
            Ok(CommandOutcome::Ignored)
        );
        assert_eq!(state.store().len(), before);
    }

    #[test]
    fn test_spawn_mode_persists() {
        let mut state = MatchState::new(MatchConfig::default());
        state.apply_input(select(CommandMode::Wall)).unwrap();
        for x in [0, 2, 4] {
            let outcome = state.apply_input(confirm(Player::Two, x, 0)).unwrap();
            assert!(matches!(outcome, CommandOutcome::Spawned(_)));
        }
        assert_eq!(state.command_state(), CommandState::SpawningWall);
        assert_eq!(state.points(Player::Two), 1000 - 3 * 150);
        assert_eq!(state.points(Player::One), 1000);
    }

    #[test]
    fn test_insufficient_points_is_rejected_silently() {
        let config = MatchConfig {
            starting_points: 99,
            ..MatchConfig::default()
        };
        let mut state = MatchState::new(config);
        let before = state.store().len();
        state.apply_input(select(CommandMode::Attacker)).unwrap();
        let err = state.apply_input(confirm(Player::One, 0, 0)).unwrap_err();
        assert!(matches!(err, GameError::InsufficientPoints { .. }));
        assert_eq!(state.store().len(), before);
        assert_eq!(state.points(Player::One), 99);
        assert_eq!(state.command_state(), CommandState::SpawningAttacker);
    }

    #[test]
    fn test_out_of_bounds_is_rejected() {
        let mut state = MatchState::new(MatchConfig::default());
        state.apply_input(select(CommandMode::Attacker)).unwrap();
        let err = state.apply_input(confirm(Player::One, 40, 0)).unwrap_err();
        assert!(matches!(err, GameError::OutOfBounds { .. }));
        assert_eq!(state.points(Player::One), 1000);
    }

    #[test]
    fn test_teleport_round_trip() {
        let mut state = MatchState::new(MatchConfig::default());
        state.apply_input(select(CommandMode::Attacker)).unwrap();
        let CommandOutcome::Spawned(unit) = state.apply_input(confirm(Player::One, 4, 4)).unwrap()
        else {
            panic!("expected a spawn");
        };
        let height = state.store().get::<Transform>(unit).unwrap().position.y;

        state.apply_input(select(CommandMode::Portal)).unwrap();
        let picked = state.apply_input(confirm(Player::One, 4, 4)).unwrap();
        assert_eq!(picked, CommandOutcome::Selected(vec![unit]));
        assert_eq!(state.command_state(), CommandState::SelectingPortalEnd);
        assert_eq!(state.commands().selection(), &[unit]);
        assert_eq!(state.points(Player::One), 900);

        let moved = state.apply_input(confirm(Player::One, -8, 6)).unwrap();
        assert_eq!(moved, CommandOutcome::Teleported(vec![unit]));
        assert_eq!(state.command_state(), CommandState::Idle);
        assert!(state.commands().selection().is_empty());
        assert_eq!(state.points(Player::One), 700);

        let position = state.store().get::<Transform>(unit).unwrap().position;
        assert_eq!(position.x, Fixed::from_num(-8));
        assert_eq!(position.z, Fixed::from_num(6));
        assert_eq!(position.y, height);
    }

    #[test]
    fn test_enemy_units_are_not_selected() {
        let mut state = MatchState::new(MatchConfig::default());
        state.apply_input(select(CommandMode::Attacker)).unwrap();
        state.apply_input(confirm(Player::Two, 4, 4)).unwrap();
        state.apply_input(select(CommandMode::Portal)).unwrap();
        assert_eq!(
            state.apply_input(confirm(Player::One, 4, 4)),
            Ok(CommandOutcome::Ignored)
        );
        assert_eq!(state.command_state(), CommandState::SelectingPortalStart);
    }

    #[test]
    fn test_cancel_clears_selection() {
        let mut state = MatchState::new(MatchConfig::default());
        state.apply_input(select(CommandMode::Attacker)).unwrap();
        state.apply_input(confirm(Player::One, 4, 4)).unwrap();
        state.apply_input(select(CommandMode::Portal)).unwrap();
        state.apply_input(confirm(Player::One, 4, 4)).unwrap();

        state.apply_input(InputCommand::Cancel).unwrap();
        assert_eq!(state.command_state(), CommandState::Idle);
        assert!(state.commands().selection().is_empty());
        assert!(state.commands().anchor().is_none());
        assert_eq!(state.points(Player::One), 900);
    }

    #[test]
    fn test_teleport_end_rechecks_points() {
        let config = MatchConfig {
            starting_points: 300,
            ..MatchConfig::default()
        };
        let mut state = MatchState::new(config);
        state.apply_input(select(CommandMode::Attacker)).unwrap();
        state.apply_input(confirm(Player::One, 4, 4)).unwrap();
        state.apply_input(select(CommandMode::Portal)).unwrap();
        state.apply_input(confirm(Player::One, 4, 4)).unwrap();
        state.ledger.spend(Player::One, 150).unwrap();

        let err = state.apply_input(confirm(Player::One, 0, 0)).unwrap_err();
        assert!(matches!(err, GameError::InsufficientPoints { .. }));
        assert_eq!(state.command_state(), CommandState::SelectingPortalEnd);
        assert_eq!(state.commands().selection().len(), 1);
    }
}
