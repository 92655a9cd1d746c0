//! Game host for Astro Arena.
//!
//! This crate connects the simulation in `astro_core` to the processes
//! that run the players. Everything the core needs from the outside world
//! goes through the [`Transport`] trait; the default implementation speaks
//! JSON lines over any reader/writer pair.
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdout**: Requests from the runner (state for players, log lines, scores)
//! - **stdin**: Replies from the host (status, roster, command batches)
//! - **stderr**: Debug logs (human-readable)
//!
//! See [`protocol`] module for the full request/reply specification.
//!
//! # Example
//!
//! ```bash
//! # Host a game over stdio
//! cargo run -p astro_runner -- run --seed 7 --replay-out game.replay
//!
//! # Check a recorded game still reproduces
//! cargo run -p astro_runner -- verify-replay game.replay
//! ```

pub mod error;
pub mod game_runner;
pub mod protocol;
pub mod transport;

pub use error::{Result, RunnerError};
pub use game_runner::{GameRunner, GameSummary, RunnerOptions};
pub use protocol::{Reply, Request};
pub use transport::{JsonLinesTransport, Status, Transport};
