//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the world produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! A game must be reproducible from its seed and the payloads players sent.
//! Sources of non-determinism include:
//!
//! - **Unseeded randomness**: every draw goes through the world's own
//!   generator, never `thread_rng`.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Arenas are iterated by index and the ledger uses ordered maps.
//!
//! - **Batch arrival order**: players may answer in any order; batches are
//!   always applied in player ID order.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual system determinism (movement, economy, etc.)
//! 2. **Property tests**: Random command streams still replay identically
//! 3. **Integration tests**: Scripted games are reproducible
//! 4. **Parallel tests**: Running N games on separate threads all match

use std::thread;

use astro_core::simulation::PlayerBatch;
use astro_core::world::World;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of rounds simulated.
    pub rounds: u32,
}

impl DeterminismResult {
    fn from_hashes(hashes: Vec<u64>, rounds: u32) -> Self {
        let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
        Self {
            is_deterministic,
            hashes,
            rounds,
        }
    }

    /// Get all unique hashes (should be 1 for a deterministic game).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the game was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "World is non-deterministic!\n\
                 Runs: {}\n\
                 Rounds: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.rounds,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Command batches for each round, indexed by round number.
///
/// Rounds past the end of the script get no commands.
pub type Script = Vec<Vec<PlayerBatch>>;

/// Play `rounds` rounds of `script` on `world`.
pub fn play_script(world: &mut World, script: &[Vec<PlayerBatch>], rounds: u32) {
    for round in 0..rounds as usize {
        let batches = script.get(round).map_or(&[][..], Vec::as_slice);
        world.play_round(batches);
    }
}

/// Run the same scripted game several times and compare final hashes.
///
/// # Example
///
/// ```ignore
/// use astro_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(5, 100, || setup_skirmish(), &script);
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<Setup>(
    runs: usize,
    rounds: u32,
    setup: Setup,
    script: &[Vec<PlayerBatch>],
) -> DeterminismResult
where
    Setup: Fn() -> World,
{
    let hashes = (0..runs)
        .map(|_| {
            let mut world = setup();
            play_script(&mut world, script, rounds);
            world.state_hash()
        })
        .collect();
    DeterminismResult::from_hashes(hashes, rounds)
}

/// Run N copies of a scripted game on scoped threads.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_games<Setup>(
    setup: Setup,
    num_games: usize,
    rounds: u32,
    script: &[Vec<PlayerBatch>],
) -> DeterminismResult
where
    Setup: Fn() -> World + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_games)
            .map(|_| {
                s.spawn(|| {
                    let mut world = setup();
                    play_script(&mut world, script, rounds);
                    world.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("game thread panicked"))
            .collect()
    });
    DeterminismResult::from_hashes(hashes, rounds)
}

/// Compare two runs round by round, finding the first divergence.
///
/// Returns `None` if the runs stay identical, `Some(round)` for the first
/// round after which the hashes differ (0 means the setup already differs).
pub fn find_first_divergence<Setup>(
    setup: Setup,
    rounds: u32,
    script: &[Vec<PlayerBatch>],
) -> Option<u32>
where
    Setup: Fn() -> World,
{
    let mut first = setup();
    let mut second = setup();
    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for round in 0..rounds {
        let batches = script.get(round as usize).map_or(&[][..], Vec::as_slice);
        first.play_round(batches);
        second.play_round(batches);
        if first.state_hash() != second.state_hash() {
            tracing::warn!(round = round + 1, "Runs diverged");
            return Some(round + 1);
        }
    }
    None
}

/// Check that saving and restoring mid-game changes nothing, including
/// the random stream used afterwards.
pub fn verify_serialization_determinism<Setup>(
    setup: Setup,
    rounds: u32,
    script: &[Vec<PlayerBatch>],
) -> bool
where
    Setup: Fn() -> World,
{
    let mut world = setup();
    let half = rounds / 2;
    play_script(&mut world, script, half);

    let Ok(bytes) = world.save_bytes() else {
        return false;
    };
    let Ok(mut restored) = World::load_bytes(&bytes) else {
        return false;
    };
    if restored.state_hash() != world.state_hash() {
        return false;
    }

    let rest: Vec<Vec<PlayerBatch>> = script.iter().skip(half as usize).cloned().collect();
    play_script(&mut world, &rest, rounds - half);
    play_script(&mut restored, &rest, rounds - half);
    world.state_hash() == restored.state_hash()
}

/// Proptest strategies for commands and batches.
///
/// Ship IDs are drawn from a small range so that generated commands hit
/// real ships often enough to exercise execution, not just rejection.
pub mod strategies {
    use astro_core::commands::{
        BuyCommand, Command, MoveCommand, RepairCommand, ShootCommand, TransferCommand,
    };
    use astro_core::components::{ResourceKind, ShipClass, ShipId};
    use astro_core::math::Vec2;
    use proptest::prelude::*;

    /// Any ship class.
    pub fn arb_ship_class() -> impl Strategy<Value = ShipClass> {
        prop::sample::select(ShipClass::ALL.to_vec())
    }

    /// Either resource kind.
    pub fn arb_resource_kind() -> impl Strategy<Value = ResourceKind> {
        prop_oneof![Just(ResourceKind::Rock), Just(ResourceKind::Fuel)]
    }

    /// Vector with components in `[-limit, limit]`.
    pub fn arb_vec2(limit: f64) -> impl Strategy<Value = Vec2> {
        (-limit..=limit, -limit..=limit).prop_map(|(x, y)| Vec2::new(x, y))
    }

    /// Ship ID below `max_ship`.
    pub fn arb_ship_id(max_ship: usize) -> impl Strategy<Value = ShipId> {
        (0..max_ship).prop_map(ShipId)
    }

    /// Any command, including structurally invalid ones.
    pub fn arb_command(max_ship: usize) -> impl Strategy<Value = Command> {
        prop_oneof![
            (-1i64..8).prop_map(|class| Command::Buy(BuyCommand { class })),
            (arb_ship_id(max_ship), arb_vec2(50.0))
                .prop_map(|(ship_id, vector)| Command::Move(MoveCommand { ship_id, vector })),
            (arb_ship_id(max_ship), arb_ship_id(max_ship), -5i64..200).prop_map(
                |(source_id, destination_id, amount)| Command::Load(TransferCommand {
                    source_id,
                    destination_id,
                    amount,
                })
            ),
            (arb_ship_id(max_ship), arb_ship_id(max_ship), -5i64..200).prop_map(
                |(source_id, destination_id, amount)| Command::Siphon(TransferCommand {
                    source_id,
                    destination_id,
                    amount,
                })
            ),
            (arb_ship_id(max_ship), arb_ship_id(max_ship)).prop_map(
                |(source_id, destination_id)| Command::Shoot(ShootCommand {
                    source_id,
                    destination_id,
                })
            ),
            arb_ship_id(max_ship).prop_map(|ship_id| Command::Repair(RepairCommand { ship_id })),
        ]
    }

    /// Sequence of commands for one player's turn.
    pub fn arb_command_sequence(
        max_ship: usize,
        max_len: usize,
    ) -> impl Strategy<Value = Vec<Command>> {
        prop::collection::vec(arb_command(max_ship), 0..max_len)
    }
}
