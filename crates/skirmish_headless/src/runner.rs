//! Interactive headless runner.
//!
//! Reads [`Command`]s as JSON lines and answers each with exactly one
//! [`Response`] line. Input and output are generic so tests can drive a
//! session from an in-memory buffer.

use std::io::{self, BufRead, Write};

use skirmish_core::commands::InputCommand;
use skirmish_core::components::Player;
use skirmish_core::math::Fixed;
use skirmish_core::simulation::MatchState;
use tracing::{debug, info, warn};

use crate::protocol::{
    kind_name, parse_kind, parse_player, to_fixed, to_position, Command, EffectState, EntityState,
    MatchSnapshot, Response,
};
use crate::scenario::{Scenario, ScenarioError};

/// Upper bound on ticks advanced by one `tick` command.
pub const MAX_TICKS_PER_COMMAND: u32 = 100_000;

/// Headless runner configuration.
#[derive(Debug, Clone, Copy)]
pub struct HeadlessConfig {
    /// Seconds per tick when a `tick` command gives no `dt`.
    pub default_dt: Fixed,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            default_dt: Fixed::ONE / Fixed::from_num(60),
        }
    }
}

/// A match driven by protocol commands.
#[derive(Debug, Clone)]
pub struct HeadlessRunner {
    state: MatchState,
    config: HeadlessConfig,
}

impl HeadlessRunner {
    /// Wrap an existing match.
    pub fn new(state: MatchState) -> Self {
        Self::with_config(state, HeadlessConfig::default())
    }

    /// Wrap an existing match with explicit runner settings.
    pub fn with_config(state: MatchState, config: HeadlessConfig) -> Self {
        Self { state, config }
    }

    /// Start from a scenario's config and placed units. Its input schedule
    /// is not replayed; the controller plays instead.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Invalid`] if the scenario's tick length is unusable.
    pub fn from_scenario(scenario: &Scenario) -> Result<Self, ScenarioError> {
        let default_dt = scenario.tick_length()?;
        Ok(Self::with_config(
            scenario.build_match(None),
            HeadlessConfig { default_dt },
        ))
    }

    /// The match being driven.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Serve a session: write `ready`, then answer each command line until
    /// `quit` or end of input. Always ends with `bye`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        info!(tick = self.state.current_tick(), "Interactive session started");
        output.write_all(Response::ready(self.state.current_tick()).to_json_line().as_bytes())?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = match Command::from_json(line) {
                Ok(Command::Quit) => break,
                Ok(cmd) => self.handle(cmd),
                Err(e) => {
                    warn!(error = %e, "Unparseable command");
                    Response::error(format!("Parse error: {e}"), None)
                }
            };
            output.write_all(response.to_json_line().as_bytes())?;
            output.flush()?;
        }

        info!(tick = self.state.current_tick(), "Interactive session ended");
        output.write_all(Response::Bye.to_json_line().as_bytes())?;
        output.flush()
    }

    /// Apply one command and build its response.
    pub fn handle(&mut self, cmd: Command) -> Response {
        let name = cmd.name();
        debug!(cmd = name, "Handling command");
        match self.dispatch(cmd) {
            Ok(response) => response,
            Err(message) => Response::error(message, Some(name)),
        }
    }

    fn dispatch(&mut self, cmd: Command) -> Result<Response, String> {
        match cmd {
            Command::Tick { count, dt } => {
                if count > MAX_TICKS_PER_COMMAND {
                    return Err(format!(
                        "Tick count {count} exceeds the limit of {MAX_TICKS_PER_COMMAND}"
                    ));
                }
                let dt = dt.map_or(Ok(self.config.default_dt), to_fixed)?;
                for _ in 0..count {
                    self.state.tick(dt, &[]);
                }
                Ok(self.snapshot())
            }
            Command::Select { mode } => self.apply(InputCommand::Select { mode }),
            Command::Confirm { player, x, y, z } => self.apply(InputCommand::Confirm {
                player: parse_player(player)?,
                position: to_position(x, y, z)?,
            }),
            Command::Cancel => self.apply(InputCommand::Cancel),
            Command::Query => Ok(self.snapshot()),
            Command::EntitiesAt { x, y, z } => Ok(Response::Entities {
                ids: self.state.entities_at(to_position(x, y, z)?),
            }),
            Command::Spawn {
                kind,
                player,
                x,
                y,
                z,
            } => {
                let kind = parse_kind(&kind)?;
                let entity_id =
                    self.state
                        .create_unit(kind, to_position(x, y, z)?, parse_player(player)?);
                Ok(Response::Spawned {
                    entity_id,
                    kind: kind_name(kind).to_string(),
                })
            }
            Command::Hash => Ok(Response::StateHash {
                tick: self.state.current_tick(),
                hash: self.state.state_hash(),
            }),
            Command::Quit => Ok(Response::Bye),
        }
    }

    /// Apply a player input immediately, outside of any tick.
    fn apply(&mut self, input: InputCommand) -> Result<Response, String> {
        let outcome = self.state.apply_input(input).map_err(|e| e.to_string())?;
        debug!(?outcome, "Input applied");
        Ok(self.snapshot())
    }

    fn snapshot(&self) -> Response {
        let state = &self.state;
        Response::State(MatchSnapshot {
            tick: state.current_tick(),
            points: [state.points(Player::One), state.points(Player::Two)],
            command_state: state.command_state(),
            prompt: state.command_state().prompt().to_string(),
            status: state.win_status().into(),
            entities: state.entity_views().iter().map(EntityState::from).collect(),
            effects: state
                .effects()
                .descriptors()
                .iter()
                .map(EffectState::from)
                .collect(),
            hash: state.state_hash(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MatchStatus;
    use skirmish_core::commands::{CommandMode, CommandState};
    use skirmish_core::config::MatchConfig;

    fn runner() -> HeadlessRunner {
        HeadlessRunner::new(MatchState::new(MatchConfig::default()))
    }

    fn session(runner: &mut HeadlessRunner, script: &str) -> Vec<serde_json::Value> {
        let mut output = Vec::new();
        runner.run(script.as_bytes(), &mut output).unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn expect_state(response: Response) -> MatchSnapshot {
        match response {
            Response::State(snapshot) => snapshot,
            other => panic!("expected state, got {other:?}"),
        }
    }

    // =========================================================================
    // Session framing
    // =========================================================================

    #[test]
    fn test_session_starts_ready_and_ends_bye() {
        let lines = session(&mut runner(), "{\"cmd\":\"query\"}\n{\"cmd\":\"quit\"}\n");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["type"], "ready");
        assert_eq!(lines[0]["version"], "1.0");
        assert_eq!(lines[1]["type"], "state");
        assert_eq!(lines[2]["type"], "bye");
    }

    #[test]
    fn test_end_of_input_says_bye() {
        let lines = session(&mut runner(), "\n{\"cmd\":\"hash\"}\n");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1]["type"], "hash");
        assert_eq!(lines[2]["type"], "bye");
    }

    #[test]
    fn test_parse_error_keeps_session_alive() {
        let lines = session(&mut runner(), "garbage\n{\"cmd\":\"tick\"}\n");
        assert_eq!(lines[1]["type"], "error");
        assert_eq!(lines[2]["type"], "state");
        assert_eq!(lines[2]["tick"], 1);
    }

    #[test]
    fn test_commands_after_quit_are_ignored() {
        let mut runner = runner();
        session(&mut runner, "{\"cmd\":\"quit\"}\n{\"cmd\":\"tick\",\"count\":5}\n");
        assert_eq!(runner.state().current_tick(), 0);
    }

    // =========================================================================
    // Commands
    // =========================================================================

    #[test]
    fn test_tick_advances_count() {
        let mut runner = runner();
        let snapshot = expect_state(runner.handle(Command::Tick {
            count: 60,
            dt: None,
        }));
        assert_eq!(snapshot.tick, 60);
        assert_eq!(snapshot.status, MatchStatus::InProgress);
        // Two reactors.
        assert_eq!(snapshot.entities.len(), 2);
    }

    #[test]
    fn test_tick_limit_enforced() {
        let response = runner().handle(Command::Tick {
            count: MAX_TICKS_PER_COMMAND + 1,
            dt: None,
        });
        assert!(matches!(response, Response::Error { cmd: Some(ref c), .. } if c == "tick"));
    }

    #[test]
    fn test_select_and_confirm_spend_points() {
        let mut runner = runner();
        let selected = expect_state(runner.handle(Command::Select {
            mode: CommandMode::Attacker,
        }));
        assert_eq!(selected.command_state, CommandState::SpawningAttacker);
        assert_eq!(selected.prompt, "Attacker Spawn Mode (Cost: 100) - ESC to cancel");

        let confirmed = expect_state(runner.handle(Command::Confirm {
            player: 1,
            x: 2.0,
            y: 0.0,
            z: -6.0,
        }));
        assert_eq!(confirmed.points, [900, 1000]);
        assert_eq!(confirmed.entities.len(), 3);
        // Inputs do not advance time.
        assert_eq!(confirmed.tick, 0);

        let cancelled = expect_state(runner.handle(Command::Cancel));
        assert_eq!(cancelled.command_state, CommandState::Idle);
    }

    #[test]
    fn test_rejected_confirm_reports_error() {
        let mut runner = runner();
        runner.handle(Command::Select {
            mode: CommandMode::Wall,
        });
        let response = runner.handle(Command::Confirm {
            player: 2,
            x: 500.0,
            y: 0.0,
            z: 0.0,
        });
        assert!(matches!(response, Response::Error { cmd: Some(ref c), .. } if c == "confirm"));
        assert_eq!(runner.state().points(Player::Two), 1000);
    }

    #[test]
    fn test_unknown_player_rejected() {
        let response = runner().handle(Command::Confirm {
            player: 7,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        });
        assert!(matches!(response, Response::Error { .. }));
    }

    #[test]
    fn test_spawn_and_entities_at() {
        let mut runner = runner();
        let response = runner.handle(Command::Spawn {
            kind: "wall".to_string(),
            player: 2,
            x: 4.0,
            y: 1.0,
            z: 4.0,
        });
        let (entity_id, kind) = match response {
            Response::Spawned { entity_id, kind } => (entity_id, kind),
            other => panic!("expected spawned, got {other:?}"),
        };
        assert_eq!(kind, "wall");
        // Spawning directly is free.
        assert_eq!(runner.state().points(Player::Two), 1000);

        let found = runner.handle(Command::EntitiesAt {
            x: 4.0,
            y: 0.0,
            z: 4.0,
        });
        assert_eq!(found, Response::Entities { ids: vec![entity_id] });
    }

    #[test]
    fn test_spawn_unknown_kind() {
        let response = runner().handle(Command::Spawn {
            kind: "tank".to_string(),
            player: 1,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        });
        assert!(matches!(response, Response::Error { cmd: Some(ref c), .. } if c == "spawn"));
    }

    #[test]
    fn test_far_spawn_and_long_tick_keep_running() {
        let mut runner = runner();
        for (player, x) in [(1, 60_000.0), (1, -2_000_000_000.0), (2, 0.0)] {
            let response = runner.handle(Command::Spawn {
                kind: "attacker".to_string(),
                player,
                x,
                y: 1.0,
                z: 0.0,
            });
            assert!(matches!(response, Response::Spawned { .. }), "{response:?}");
        }

        let snapshot = expect_state(runner.handle(Command::Tick {
            count: 1,
            dt: Some(0.016),
        }));
        assert_eq!(snapshot.effects.len(), 1);

        let snapshot = expect_state(runner.handle(Command::Tick {
            count: 2,
            dt: Some(1e9),
        }));
        assert_eq!(snapshot.tick, 3);
        assert_eq!(snapshot.effects.len(), 1);
    }

    #[test]
    fn test_hash_matches_state() {
        let mut runner = runner();
        let expected = runner.state().state_hash();
        assert_eq!(
            runner.handle(Command::Hash),
            Response::StateHash {
                tick: 0,
                hash: expected,
            }
        );
    }

    #[test]
    fn test_same_session_same_hash() {
        let script = concat!(
            "{\"cmd\":\"select\",\"mode\":\"attacker\"}\n",
            "{\"cmd\":\"confirm\",\"player\":1,\"x\":0.0,\"z\":-4.0}\n",
            "{\"cmd\":\"confirm\",\"player\":2,\"x\":0.0,\"z\":4.0}\n",
            "{\"cmd\":\"tick\",\"count\":240}\n",
            "{\"cmd\":\"hash\"}\n",
        );
        let a = session(&mut runner(), script);
        let b = session(&mut runner(), script);
        assert_eq!(a[5]["type"], "hash");
        assert_eq!(a[5]["hash"], b[5]["hash"]);
    }

    #[test]
    fn test_from_scenario_places_units() {
        let scenario = Scenario::from_ron_str(
            r#"(name: "Walls", units: [(kind: Wall, player: One, x: 0.0, z: -4.0)], dt: 0.5)"#,
        )
        .unwrap();
        let mut runner = HeadlessRunner::from_scenario(&scenario).unwrap();
        assert_eq!(runner.state().store().len(), 3);

        runner.handle(Command::Tick { count: 2, dt: None });
        assert_eq!(runner.state().current_tick(), 2);
    }
}
