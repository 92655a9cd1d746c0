//! Ship thrust, drift and wormhole teleportation, plus asteroid drift.
//!
//! Velocity persists across rounds. A move command adds thrust to it and
//! the per-round [`movement_system`] only ever reads it. Asteroids have no
//! momentum: [`asteroid_drift_system`] recomputes their step every round
//! from a Perlin field seeded by the world seed.

use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::commands::owned_ship;
use crate::components::{PlayerId, ShipId, WormholeId};
use crate::error::CommandError;
use crate::math::Vec2;
use crate::world::World;

/// A ship relocated by a wormhole during the movement step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Teleport {
    /// Teleported ship.
    pub ship: ShipId,
    /// Wormhole the ship entered.
    pub entry: WormholeId,
    /// Wormhole it came out of.
    pub exit: WormholeId,
    /// Landing position.
    pub position: Vec2,
}

/// Execute a move: pay for the thrust and add it to the ship's velocity.
///
/// Thrust above the configured maximum is rescaled down to it before the
/// price is computed. A mothership pays from its owner's fuel stockpile.
pub(crate) fn apply_thrust(
    world: &mut World,
    player: PlayerId,
    ship_id: ShipId,
    vector: Vec2,
) -> Result<(), CommandError> {
    let ship = owned_ship(world, player, ship_id)?;
    let thrust = vector.clamp_magnitude(world.config().max_move_magnitude);
    let price = world.config().movement_price(thrust.magnitude(), ship.class);
    let available = world.available_fuel(ship);
    if available < price {
        return Err(CommandError::InsufficientFuel {
            required: price,
            available,
        });
    }

    world.add_fuel(ship_id, -price);
    if let Some(ship) = world.ship_mut(ship_id) {
        ship.velocity += thrust;
    }
    Ok(())
}

/// Advance every operable ship by its velocity, then resolve wormholes.
///
/// All ships move before any teleport check. Each ship uses the first
/// wormhole, in ID order, whose trigger radius it is strictly inside.
pub fn movement_system(world: &mut World) -> Vec<Teleport> {
    for (_, ship) in world.ships_mut().iter_mut() {
        if ship.is_operable() {
            ship.position += ship.velocity;
        }
    }

    let mut teleports = Vec::new();
    for index in world.ships().indices() {
        if let Some(teleport) = check_wormholes(world, ShipId(index)) {
            teleports.push(teleport);
        }
    }
    teleports
}

/// Move every asteroid along the noise field.
///
/// The step is a shared flow direction, which changes slowly with the
/// round, plus a local direction that depends on where the asteroid is.
/// No random draws are made, so drift never shifts the RNG stream.
pub fn asteroid_drift_system(world: &mut World) {
    let drift = world.config().asteroid_drift;
    if drift.is_still() {
        return;
    }

    let field = Perlin::new(noise_seed(world.seed()));
    let time = f64::from(world.round()) * drift.noise_scale;
    // Half-unit offsets keep samples off the lattice, where Perlin is zero.
    let global = flow_direction(&field, [time, 0.5, 0.5]).scale(drift.global_scale);

    for (_, asteroid) in world.asteroids_mut().iter_mut() {
        let at = asteroid.position.scale(drift.noise_scale);
        let local = flow_direction(&field, [at.x + 0.5, at.y + 0.5, time + 100.5])
            .scale(drift.individual_scale);
        asteroid.velocity = global + local;
        asteroid.position += asteroid.velocity;
    }
}

fn flow_direction(field: &Perlin, point: [f64; 3]) -> Vec2 {
    Vec2::from_angle(field.get(point) * std::f64::consts::TAU)
}

fn noise_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

/// Teleport one ship if it sits inside a wormhole's trigger radius.
fn check_wormholes(world: &mut World, id: ShipId) -> Option<Teleport> {
    let ship = world.ship(id)?;
    if !ship.is_operable() {
        return None;
    }
    let (position, velocity) = (ship.position, ship.velocity);

    let radius = world.config().wormhole_radius;
    let entry = world
        .wormholes()
        .iter()
        .find(|w| w.position.distance(position) < radius)?;
    let (entry_id, exit_id) = (entry.id, entry.target_id);
    let exit_position = world.wormhole(exit_id)?.position;

    // Land outside the exit's trigger radius, along the direction of travel.
    let direction = if velocity.is_zero() {
        world.rng_mut().random_direction()
    } else {
        velocity.normalize()
    };
    let landing = exit_position + direction.scale(world.config().wormhole_teleport_distance);

    if let Some(ship) = world.ship_mut(id) {
        ship.position = landing;
    }
    tracing::debug!(ship = %id, entry = %entry_id, exit = %exit_id, "Ship teleported");
    Some(Teleport {
        ship: id,
        entry: entry_id,
        exit: exit_id,
        position: landing,
    })
}
