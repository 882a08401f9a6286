//! JSON protocol for headless match control.
//!
//! The interactive runner speaks JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Match state and responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0","tick":0}`
//! 2. Controller sends commands as JSON lines
//! 3. Runner answers every command with exactly one response line
//! 4. `quit` (or end of input) ends the session with `{"type":"bye"}`
//!
//! Positions cross the boundary as plain decimals and are converted to
//! fixed point on the way in. Players are numbered `1` and `2`. Player
//! inputs (`select`, `confirm`, `cancel`) apply at once without advancing
//! time; only `tick` moves the clock.
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0}
//! -> {"cmd":"select","mode":"attacker"}
//! <- {"type":"state","tick":0,"command_state":"SpawningAttacker",...}
//! -> {"cmd":"confirm","player":1,"x":2.0,"z":-6.0}
//! <- {"type":"state","tick":0,"points":[900,1000],...}
//! -> {"cmd":"tick","count":60}
//! <- {"type":"state","tick":60,...}
//! -> {"cmd":"hash"}
//! <- {"type":"hash","tick":60,"hash":1234567890}
//! ```

use serde::{Deserialize, Serialize};
use skirmish_core::commands::{CommandMode, CommandState};
use skirmish_core::components::{Player, UnitKind};
use skirmish_core::effects::EffectDescriptor;
use skirmish_core::math::{Fixed, Vec3Fixed};
use skirmish_core::simulation::{EntityView, WinStatus};

/// Protocol version reported in the `ready` line.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (controller -> runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance the match by `count` ticks of `dt` seconds (default: one frame).
    Tick {
        #[serde(default = "default_tick_count")]
        count: u32,
        #[serde(default)]
        dt: Option<f64>,
    },

    /// Enter a spawn or teleport mode.
    Select { mode: CommandMode },

    /// Click a cell on behalf of a player.
    Confirm {
        player: u8,
        x: f64,
        #[serde(default)]
        y: f64,
        z: f64,
    },

    /// Leave the current mode.
    Cancel,

    /// Query match state without advancing time.
    Query,

    /// List entities sharing the cell under a position.
    EntitiesAt {
        x: f64,
        #[serde(default)]
        y: f64,
        z: f64,
    },

    /// Create a unit directly, without charging points.
    Spawn {
        kind: String,
        player: u8,
        x: f64,
        #[serde(default)]
        y: f64,
        z: f64,
    },

    /// Report the current state hash (for determinism verification).
    Hash,

    /// End the session.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (runner -> controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready { version: String, tick: u64 },

    /// Error processing a command.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// Current match state.
    State(MatchSnapshot),

    /// Entities found under a position.
    Entities { ids: Vec<u64> },

    /// Entity was spawned.
    Spawned { entity_id: u64, kind: String },

    /// State hash for determinism verification.
    #[serde(rename = "hash")]
    StateHash { tick: u64, hash: u64 },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// State Types
// ============================================================================

/// Full match state as seen by a controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub tick: u64,
    pub points: [i32; 2],
    pub command_state: CommandState,
    pub prompt: String,
    pub status: MatchStatus,
    pub entities: Vec<EntityState>,
    pub effects: Vec<EffectState>,
    pub hash: u64,
}

/// State of a single entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terrain: Option<String>,
}

impl From<&EntityView> for EntityState {
    fn from(view: &EntityView) -> Self {
        let position = view.transform.position;
        Self {
            id: view.id,
            kind: view.renderable.map(|r| kind_name(r.kind).to_string()),
            x: position.x.to_num(),
            y: position.y.to_num(),
            z: position.z.to_num(),
            player: view.player.map(player_number),
            health: view.health.map(|h| HealthState {
                current: h.current.to_num(),
                max: h.max.to_num(),
            }),
            terrain: view.tile.map(|t| format!("{:?}", t.terrain).to_lowercase()),
        }
    }
}

/// Health state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthState {
    pub current: f64,
    pub max: f64,
}

/// One visual effect, for controllers that draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectState {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub radius: f64,
    pub rgba: [u8; 4],
}

impl From<&EffectDescriptor> for EffectState {
    fn from(effect: &EffectDescriptor) -> Self {
        let c = effect.color;
        Self {
            x: effect.position.x.to_num(),
            y: effect.position.y.to_num(),
            z: effect.position.z.to_num(),
            radius: effect.radius.to_num(),
            rgba: [c.r, c.g, c.b, c.a],
        }
    }
}

/// Match outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    InProgress,
    PlayerOneWins,
    PlayerTwoWins,
}

impl From<WinStatus> for MatchStatus {
    fn from(status: WinStatus) -> Self {
        match status {
            WinStatus::Undecided => Self::InProgress,
            WinStatus::PlayerOneWins => Self::PlayerOneWins,
            WinStatus::PlayerTwoWins => Self::PlayerTwoWins,
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

/// Protocol number for a player.
#[must_use]
pub const fn player_number(player: Player) -> u8 {
    match player {
        Player::One => 1,
        Player::Two => 2,
    }
}

/// Player for a protocol number.
pub fn parse_player(number: u8) -> Result<Player, String> {
    match number {
        1 => Ok(Player::One),
        2 => Ok(Player::Two),
        other => Err(format!("Unknown player: {other} (expected 1 or 2)")),
    }
}

/// Protocol name for a unit kind.
#[must_use]
pub const fn kind_name(kind: UnitKind) -> &'static str {
    match kind {
        UnitKind::Reactor => "reactor",
        UnitKind::Wall => "wall",
        UnitKind::Attacker => "attacker",
        UnitKind::Portal => "portal",
    }
}

/// Unit kind for a protocol name.
pub fn parse_kind(name: &str) -> Result<UnitKind, String> {
    match name {
        "reactor" => Ok(UnitKind::Reactor),
        "wall" => Ok(UnitKind::Wall),
        "attacker" => Ok(UnitKind::Attacker),
        "portal" => Ok(UnitKind::Portal),
        other => Err(format!("Unknown unit kind: {other}")),
    }
}

/// Convert a decimal to fixed point, rejecting NaN and out-of-range values.
pub fn to_fixed(value: f64) -> Result<Fixed, String> {
    Fixed::checked_from_num(value).ok_or_else(|| format!("{value} is not a usable coordinate"))
}

/// Convert a decimal position to fixed point.
pub fn to_position(x: f64, y: f64, z: f64) -> Result<Vec3Fixed, String> {
    Ok(Vec3Fixed::new(to_fixed(x)?, to_fixed(y)?, to_fixed(z)?))
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(tick: u64) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            tick,
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for error reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Select { .. } => "select",
            Self::Confirm { .. } => "confirm",
            Self::Cancel => "cancel",
            Self::Query => "query",
            Self::EntitiesAt { .. } => "entities_at",
            Self::Spawn { .. } => "spawn",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}
