//! JSON views of the world sent to players and observers.
//!
//! Arena slots are kept positionally, empty ones as `null`, because clients
//! address ships and asteroids by index. RNG state and the ledger are not
//! part of the view.

use serde::{Deserialize, Serialize};

use crate::components::{Asteroid, Player, PlayerId, Ship, Wormhole};
use crate::error::{GameError, Result};
use crate::world::World;

/// Full public state of the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
    /// World disc radius.
    pub radius: f64,
    /// Ship slots.
    pub ships: Vec<Option<Ship>>,
    /// Asteroid slots.
    pub asteroids: Vec<Option<Asteroid>>,
    /// Wormholes, pairs adjacent.
    pub wormholes: Vec<Wormhole>,
    /// Players in join order.
    pub players: Vec<Player>,
    /// Rounds completed.
    pub round: u32,
}

impl MapSnapshot {
    /// Capture the current state of `world`.
    #[must_use]
    pub fn capture(world: &World) -> Self {
        Self {
            radius: world.radius(),
            ships: world.ships().slots().to_vec(),
            asteroids: world.asteroids().slots().to_vec(),
            wormholes: world.wormholes().to_vec(),
            players: world.players().to_vec(),
            round: world.round(),
        }
    }
}

/// What one player sees at the start of their turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// The shared world.
    pub map: MapSnapshot,
    /// The receiving player.
    pub player_id: PlayerId,
}

impl PlayerSnapshot {
    /// Snapshot of `world` addressed to `player`.
    #[must_use]
    pub fn capture(world: &World, player: PlayerId) -> Self {
        Self {
            map: MapSnapshot::capture(world),
            player_id: player,
        }
    }

    /// Encode as a single line of JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GameError::Serialization(e.to_string()))
    }
}

/// What the observer stream receives after each round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverSnapshot {
    /// The shared world.
    pub map: MapSnapshot,
}

impl ObserverSnapshot {
    /// Snapshot of `world` for spectators.
    #[must_use]
    pub fn capture(world: &World) -> Self {
        Self {
            map: MapSnapshot::capture(world),
        }
    }

    /// Encode as a single line of JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GameError::Serialization(e.to_string()))
    }
}
