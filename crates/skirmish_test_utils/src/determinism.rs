//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a match produces identical
//! results given identical config and inputs.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism the core guards against:
//!
//! - **Floating-point math**: different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`skirmish_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   The component store always iterates in entity creation order.
//!
//! - **System randomness**: the only random draw is the block roll, and it
//!   comes from a PRNG seeded by the match config.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use skirmish_core::commands::InputCommand;
use skirmish_core::math::Fixed;
use skirmish_core::simulation::MatchState;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use skirmish_core::simulation::MatchState;
/// use skirmish_test_utils::determinism::verify_determinism;
/// use skirmish_test_utils::fixtures::{frame, skirmish_match};
///
/// let result = verify_determinism(
///     3,
///     120,
///     || skirmish_match(7),
///     |state: &mut MatchState| {
///         state.tick(frame(), &[]);
///     },
///     MatchState::state_hash,
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run `num_matches` copies of a match on scoped threads, each for
/// `num_ticks` ticks of `dt`, and collect the final hashes.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_matches<F>(
    setup_fn: F,
    num_matches: usize,
    num_ticks: u64,
    dt: Fixed,
) -> DeterminismResult
where
    F: Fn() -> MatchState + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_matches)
            .map(|_| {
                s.spawn(|| {
                    let mut state = setup_fn();
                    for _ in 0..num_ticks {
                        state.tick(dt, &[]);
                    }
                    state.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("match thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two runs of a match tick-by-tick, finding the first divergence.
///
/// `inputs_for` supplies the inputs for each tick number (starting at 0).
///
/// # Returns
///
/// `None` if the runs agree throughout, `Some(tick)` for the first tick
/// after which their hashes differ (0 means they differed from the start).
pub fn find_first_divergence<F, I>(
    setup_fn: F,
    inputs_for: I,
    num_ticks: u64,
    dt: Fixed,
) -> Option<u64>
where
    F: Fn() -> MatchState,
    I: Fn(u64) -> Vec<InputCommand>,
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for tick in 0..num_ticks {
        let inputs = inputs_for(tick);
        a.tick(dt, &inputs);
        b.tick(dt, &inputs);

        if a.state_hash() != b.state_hash() {
            tracing::warn!(tick = tick + 1, "Matches diverged");
            return Some(tick + 1);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for match testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of the core.
pub mod strategies {
    use proptest::prelude::*;
    use skirmish_core::commands::{CommandMode, InputCommand};
    use skirmish_core::components::Player;
    use skirmish_core::math::{Fixed, Vec3Fixed};

    /// Generate a fixed-point coordinate a little wider than the default
    /// board, so some positions land out of bounds.
    pub fn arb_coordinate() -> impl Strategy<Value = Fixed> {
        (-20_000i32..20_000i32).prop_map(|milli| Fixed::from_num(milli) / Fixed::from_num(1000))
    }

    /// Generate a world position.
    pub fn arb_position() -> impl Strategy<Value = Vec3Fixed> {
        (arb_coordinate(), 0i32..4, arb_coordinate())
            .prop_map(|(x, y, z)| Vec3Fixed::new(x, Fixed::from_num(y), z))
    }

    /// Generate either player.
    pub fn arb_player() -> impl Strategy<Value = Player> {
        prop_oneof![Just(Player::One), Just(Player::Two)]
    }

    /// Generate a command mode.
    pub fn arb_mode() -> impl Strategy<Value = CommandMode> {
        prop_oneof![
            Just(CommandMode::Attacker),
            Just(CommandMode::Wall),
            Just(CommandMode::Portal),
        ]
    }

    /// Generate any input.
    pub fn arb_input() -> impl Strategy<Value = InputCommand> {
        prop_oneof![
            arb_mode().prop_map(|mode| InputCommand::Select { mode }),
            (arb_player(), arb_position())
                .prop_map(|(player, position)| InputCommand::Confirm { player, position }),
            Just(InputCommand::Cancel),
        ]
    }

    /// Generate a sequence of inputs.
    pub fn arb_input_sequence(max_len: usize) -> impl Strategy<Value = Vec<InputCommand>> {
        proptest::collection::vec(arb_input(), 0..max_len)
    }

    /// Generate health values (1-1000).
    pub fn arb_health() -> impl Strategy<Value = Fixed> {
        (1i32..1000i32).prop_map(Fixed::from_num)
    }

    /// Generate damage values (0-200), including amounts that overkill.
    pub fn arb_damage() -> impl Strategy<Value = Fixed> {
        (0i32..200i32).prop_map(Fixed::from_num)
    }

    /// Generate a block chance in `[0, 1]`, in whole percent.
    pub fn arb_block_chance() -> impl Strategy<Value = Fixed> {
        (0i32..=100i32).prop_map(|pct| Fixed::from_num(pct) / Fixed::from_num(100))
    }
}
