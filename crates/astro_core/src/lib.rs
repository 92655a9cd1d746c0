//! # Astro Core
//!
//! Deterministic turn-resolution core for the Astro Arena space strategy
//! contest.
//!
//! This crate contains **only** the simulation:
//! - No transport or process I/O (file I/O is limited to configs and replays)
//! - No system randomness (one seeded generator per world)
//! - No wall-clock time
//!
//! This separation enables:
//! - Headless hosting behind any transport
//! - Bit-exact replays from a seed and the recorded command payloads
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`world`] - World state and entity factories
//! - [`commands`] - Command decoding, validation and the ship ledger
//! - [`movement`] - Thrust, drift and wormholes
//! - [`economy`] - Purchases, transfers, mining, conquering, scoring
//! - [`combat`] - Shooting, repairs and the destruction sweep
//! - [`simulation`] - Round resolution
//! - [`snapshot`] - JSON views for players and observers
//! - [`replay`] - Recording and re-running games

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod arena;
pub mod combat;
pub mod commands;
pub mod components;
pub mod config;
pub mod economy;
pub mod error;
pub mod math;
pub mod movement;
pub mod replay;
pub mod rng;
pub mod simulation;
pub mod snapshot;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::arena::Arena;
    pub use crate::combat::Destruction;
    pub use crate::commands::{
        BuyCommand, Command, CommandEnvelope, CommandKind, MoveCommand, RepairCommand,
        ShipLedger, ShootCommand, TransferCommand,
    };
    pub use crate::components::*;
    pub use crate::config::{AsteroidDrift, GameConfig, MovementCost, ShipPrices};
    pub use crate::error::{CommandError, GameError, Result};
    pub use crate::math::Vec2;
    pub use crate::movement::Teleport;
    pub use crate::replay::{RecordedBatch, RecordedRound, Replay, REPLAY_VERSION};
    pub use crate::simulation::{CommandOutcome, PlayerBatch, RoundReport};
    pub use crate::snapshot::{MapSnapshot, ObserverSnapshot, PlayerSnapshot};
    pub use crate::world::World;
}
