//! Runner error types.

use astro_core::error::GameError;
use thiserror::Error;

/// Errors that stop the host. Player misbehaviour never ends up here.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Transport stream failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Host sent a line that is not a valid reply.
    #[error("malformed reply from host: {0}")]
    Json(#[from] serde_json::Error),

    /// Simulation setup or replay failure.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Host refused or closed the conversation.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Nobody to play.
    #[error("roster is empty")]
    EmptyRoster,
}

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;
