//! Headless match runner for scripted scenarios and CI verification.
//!
//! This crate drives a [`skirmish_core`] match without graphics. It offers:
//!
//! - **Scenario runs**: play a RON scenario to victory or a tick budget
//! - **Interactive control**: a controller plays over JSON lines
//! - **Batch runs**: many seeded copies in parallel, with outcome counts
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from the controller (tick, select, confirm, etc.)
//! - **stdout**: State updates and responses (JSON)
//! - **stderr**: Debug logs (human-readable)
//!
//! See the [`protocol`] module for every command and response.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"tick","count":60}' | cargo run -p skirmish_headless -- interactive
//!
//! # Run a scenario
//! cargo run -p skirmish_headless -- run --scenario scenarios/duel.ron
//!
//! # Count outcomes over 200 seeds
//! cargo run -p skirmish_headless -- batch --scenario scenarios/duel.ron --count 200
//! ```

pub mod batch;
pub mod game_runner;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, BatchConfig, BatchResults, OutcomeCounts};
pub use game_runner::{run_scenario, GameSummary};
pub use protocol::{Command, Response};
pub use runner::HeadlessRunner;
pub use scenario::{Scenario, ScenarioError};
