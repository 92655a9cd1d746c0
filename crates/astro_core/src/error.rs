//! Error types for the game simulation.

use thiserror::Error;

use crate::components::{PlayerId, ShipClass, ShipId};

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for simulation setup, persistence and replays.
///
/// Nothing a player sends can produce one of these; player input only
/// ever yields a [`CommandError`].
#[derive(Debug, Error)]
pub enum GameError {
    /// Failed to read a data file.
    #[error("Failed to read '{path}': {source}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Configuration values are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unknown player referenced by the host.
    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    /// Player display names must be unique.
    #[error("Duplicate player name: {0}")]
    DuplicatePlayerName(String),

    /// Binary or JSON (de)serialization failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Replay did not reproduce the recorded outcome.
    #[error("Desync detected at round {round}: expected hash {expected}, got {actual}")]
    DesyncDetected {
        /// Round where the comparison was made.
        round: u32,
        /// Recorded state hash.
        expected: u64,
        /// Recomputed state hash.
        actual: u64,
    },
}

/// Why a single player command was rejected.
///
/// A rejected command has no effect on the world; the rest of the batch
/// still runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    /// The payload did not decode into the command's typed form.
    #[error("could not decode command payload: {0}")]
    Decode(String),

    /// The envelope's `type` tag names no known command.
    #[error("unknown command type: {0}")]
    UnknownKind(i64),

    /// Ship ID out of range or pointing at an empty slot.
    #[error("invalid ship id: {0}")]
    InvalidShip(ShipId),

    /// Ship belongs to someone else.
    #[error("ship {ship} does not belong to player {player}")]
    NotOwner {
        /// Ship in question.
        ship: ShipId,
        /// Player that issued the command.
        player: PlayerId,
    },

    /// Ship is at zero or less health and waiting for the destruction sweep.
    #[error("ship {0} is disabled")]
    ShipDisabled(ShipId),

    /// Ship was already the actor of another command this round.
    #[error("ship {0} already acted this round")]
    ShipAlreadyUsed(ShipId),

    /// Source and destination refer to the same ship.
    #[error("source and destination are the same ship: {0}")]
    SameShip(ShipId),

    /// Ships are farther apart than the action allows.
    #[error("ships too far apart: {distance:.3} > {max}")]
    OutOfRange {
        /// Actual distance.
        distance: f64,
        /// Allowed distance.
        max: f64,
    },

    /// Transfer amount must be positive.
    #[error("amount must be positive: {0}")]
    InvalidAmount(i64),

    /// Ship class cannot be bought.
    #[error("invalid ship type: {0}")]
    InvalidShipClass(i64),

    /// Not enough rock for the action.
    #[error("insufficient rock: needed {required}, has {available}")]
    InsufficientRock {
        /// Rock needed.
        required: i64,
        /// Rock available.
        available: i64,
    },

    /// Not enough fuel for the action.
    #[error("insufficient fuel: needed {required:.3}, has {available:.3}")]
    InsufficientFuel {
        /// Fuel needed.
        required: f64,
        /// Fuel available.
        available: f64,
    },

    /// Only battleships carry weapons.
    #[error("ship {ship} is a {class:?}, not a battleship")]
    NotABattleship {
        /// Ship that tried to fire.
        ship: ShipId,
        /// Its class.
        class: ShipClass,
    },

    /// Motherships can never be damaged.
    #[error("mothership {0} is invincible")]
    MothershipInvincible(ShipId),

    /// A vector in the payload was not finite.
    #[error("vector components must be finite")]
    NonFiniteVector,

    /// Issuing player does not exist or is no longer in the game.
    #[error("player {0} cannot issue commands")]
    InactivePlayer(PlayerId),
}
