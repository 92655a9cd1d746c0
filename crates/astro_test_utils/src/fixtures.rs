//! Test fixtures and helpers.
//!
//! Hand-placed worlds for scenario tests. Fixture worlds start empty (no
//! random asteroids or wormholes) and asteroids do not drift, so every
//! entity in a test is one the test put there, where it put it.

use astro_core::commands::{Command, CommandEnvelope};
use astro_core::components::{AsteroidId, PlayerId, ResourceKind, ShipClass, ShipId};
use astro_core::config::{AsteroidDrift, GameConfig};
use astro_core::math::Vec2;
use astro_core::simulation::PlayerBatch;
use astro_core::world::World;

/// Seed used by fixtures unless a test picks its own.
pub const FIXTURE_SEED: u64 = 0x00A5_7E01;

/// Default rules with world generation and asteroid drift switched off.
#[must_use]
pub fn empty_config() -> GameConfig {
    GameConfig {
        asteroid_count: 0,
        wormhole_pairs: 0,
        asteroid_drift: AsteroidDrift::STILL,
        ..GameConfig::default()
    }
}

/// A small generated world for end-to-end runs.
#[must_use]
pub fn small_config() -> GameConfig {
    GameConfig {
        radius: 400.0,
        asteroid_count: 40,
        wormhole_pairs: 3,
        max_rounds: 50,
        ..GameConfig::default()
    }
}

/// Empty world with the named players joined in order.
///
/// # Panics
///
/// Panics on duplicate names.
#[must_use]
pub fn world_with_players(names: &[&str]) -> World {
    let mut world = World::empty(empty_config(), FIXTURE_SEED).expect("default config is valid");
    for name in names {
        world.add_player(*name).expect("fixture names are unique");
    }
    world
}

/// Put a ship of `class` for `owner` at `position`.
pub fn place_ship(world: &mut World, owner: PlayerId, class: ShipClass, position: Vec2) -> ShipId {
    world.spawn_ship(owner, class, position)
}

/// Put an unowned asteroid at `position`.
pub fn place_asteroid(
    world: &mut World,
    kind: ResourceKind,
    position: Vec2,
    size: f64,
) -> AsteroidId {
    world.spawn_asteroid(position, kind, size)
}

/// Put an asteroid owned by `owner` with `fraction` of its surface held.
///
/// # Panics
///
/// Panics if the freshly spawned asteroid cannot be found.
pub fn place_owned_asteroid(
    world: &mut World,
    kind: ResourceKind,
    position: Vec2,
    size: f64,
    owner: PlayerId,
    fraction: f64,
) -> AsteroidId {
    let id = world.spawn_asteroid(position, kind, size);
    let asteroid = world.asteroid_mut(id).expect("asteroid was just spawned");
    asteroid.owner = Some(owner);
    asteroid.owned_surface = asteroid.total_surface() * fraction;
    id
}

/// The player's mothership ID.
///
/// # Panics
///
/// Panics for unknown players.
#[must_use]
pub fn mothership_of(world: &World, player: PlayerId) -> ShipId {
    world.player(player).expect("player exists").mothership
}

/// Position of the player's mothership.
///
/// # Panics
///
/// Panics for unknown players.
#[must_use]
pub fn home_of(world: &World, player: PlayerId) -> Vec2 {
    world
        .ship(mothership_of(world, player))
        .expect("motherships are never destroyed")
        .position
}

/// Wrap typed commands into a batch.
#[must_use]
pub fn batch(player: PlayerId, commands: &[Command]) -> PlayerBatch {
    PlayerBatch::new(
        player,
        commands.iter().map(CommandEnvelope::from_command).collect(),
    )
}

/// Serialize typed commands into the JSON text a player would send.
///
/// # Panics
///
/// Panics if the envelopes cannot be serialized.
#[must_use]
pub fn batch_json(commands: &[Command]) -> String {
    let envelopes: Vec<CommandEnvelope> = commands.iter().map(CommandEnvelope::from_command).collect();
    serde_json::to_string(&envelopes).expect("envelopes serialize")
}
