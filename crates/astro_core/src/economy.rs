//! Ship purchases, cargo transfers, mining, conquering and scoring.
//!
//! The per-round systems scan asteroids in ID order and each ship only
//! ever touches the first asteroid in range. There is no spatial index.

use crate::commands::owned_ship;
use crate::components::{AsteroidId, PlayerId, ResourceKind, ShipClass, ShipId};
use crate::error::CommandError;
use crate::math::size_for_material;
use crate::world::World;

// ============================================================================
// Commands
// ============================================================================

/// Buy a ship for `player`, spawning it on top of their mothership.
pub(crate) fn buy_ship(
    world: &mut World,
    player: PlayerId,
    class: ShipClass,
) -> Result<ShipId, CommandError> {
    let price = world
        .config()
        .ship_prices
        .price(class)
        .ok_or(CommandError::InvalidShipClass(class as i64))?;
    let buyer = world
        .player(player)
        .ok_or(CommandError::InactivePlayer(player))?;
    if buyer.rock < price {
        return Err(CommandError::InsufficientRock {
            required: price,
            available: buyer.rock,
        });
    }
    let mothership = buyer.mothership;
    let position = world
        .ship(mothership)
        .map(|s| s.position)
        .ok_or(CommandError::InvalidShip(mothership))?;

    if let Some(buyer) = world.player_mut(player) {
        buyer.rock -= price;
    }
    let id = world.spawn_ship(player, class, position);
    tracing::debug!(player = %player, ship = %id, ?class, price, "Ship bought");
    Ok(id)
}

/// Both ends must be the player's operable ships within transfer range.
fn check_transfer(
    world: &World,
    player: PlayerId,
    source: ShipId,
    destination: ShipId,
) -> Result<(), CommandError> {
    let from = owned_ship(world, player, source)?;
    let to = owned_ship(world, player, destination)?;
    let distance = from.position.distance(to.position);
    let max = world.config().transfer_distance;
    if distance > max {
        return Err(CommandError::OutOfRange { distance, max });
    }
    Ok(())
}

/// Move rock between two of the player's ships.
pub(crate) fn transfer_rock(
    world: &mut World,
    player: PlayerId,
    source: ShipId,
    destination: ShipId,
    amount: i64,
) -> Result<(), CommandError> {
    check_transfer(world, player, source, destination)?;
    let available = world.ship(source).map_or(0, |s| world.available_rock(s));
    if available < amount {
        return Err(CommandError::InsufficientRock {
            required: amount,
            available,
        });
    }

    world.add_rock(source, -amount);
    world.add_rock(destination, amount);
    Ok(())
}

/// Move fuel between two of the player's ships.
///
/// Amounts are whole units drawn from a real-valued pool.
pub(crate) fn transfer_fuel(
    world: &mut World,
    player: PlayerId,
    source: ShipId,
    destination: ShipId,
    amount: i64,
) -> Result<(), CommandError> {
    check_transfer(world, player, source, destination)?;
    let available = world.ship(source).map_or(0.0, |s| world.available_fuel(s));
    let required = amount as f64;
    if available < required {
        return Err(CommandError::InsufficientFuel {
            required,
            available,
        });
    }

    world.add_fuel(source, -required);
    world.add_fuel(destination, required);
    Ok(())
}

// ============================================================================
// Per-round systems
// ============================================================================

/// Let every operable miner work the first matching asteroid in range.
///
/// Returns the asteroids mined down to nothing, whose slots are now empty.
pub fn mining_system(world: &mut World) -> Vec<AsteroidId> {
    let range = world.config().mining_distance;
    let mut depleted = Vec::new();

    for index in world.ships().indices() {
        let ship_id = ShipId(index);
        let Some(ship) = world.ship(ship_id) else {
            continue;
        };
        if !ship.is_operable() {
            continue;
        }
        let Some(kind) = ship.class.mines() else {
            continue;
        };
        let position = ship.position;

        let target = world
            .asteroids()
            .iter()
            .find(|(_, a)| a.kind == kind && a.position.distance(position) <= range)
            .map(|(_, a)| a.id);
        if let Some(asteroid) = target {
            if mine(world, ship_id, asteroid) {
                depleted.push(asteroid);
            }
        }
    }
    depleted
}

/// Transfer one mining load from the asteroid to the ship.
///
/// Returns `true` when the asteroid was exhausted and removed.
fn mine(world: &mut World, ship_id: ShipId, asteroid_id: AsteroidId) -> bool {
    let ratio = world.config().material_ratio;
    let load = world.config().mining_amount;
    let Some(asteroid) = world.asteroid(asteroid_id) else {
        return false;
    };
    let kind = asteroid.kind;
    let material = asteroid.material(ratio);
    let mined = load.min(material);
    let remaining = material - mined;

    if let Some(ship) = world.ship_mut(ship_id) {
        match kind {
            ResourceKind::Rock => ship.rock += mined as i64,
            ResourceKind::Fuel => ship.fuel += mined,
        }
    }

    if remaining <= 0.0 {
        world.asteroids_mut().remove(asteroid_id.0);
        tracing::debug!(asteroid = %asteroid_id, ship = %ship_id, "Asteroid depleted");
        return true;
    }

    if let Some(asteroid) = world.asteroid_mut(asteroid_id) {
        let old_total = asteroid.total_surface();
        asteroid.size = size_for_material(remaining, ratio);
        if old_total > 0.0 {
            asteroid.owned_surface *= asteroid.total_surface() / old_total;
        }
        asteroid.clamp_owned_surface();
    }
    false
}

/// Let every operable ship contest the first asteroid in range.
pub fn conquering_system(world: &mut World) {
    let range = world.config().conquering_distance;
    let rate = world.config().conquering_rate;

    for index in world.ships().indices() {
        let Some(ship) = world.ship(ShipId(index)) else {
            continue;
        };
        if !ship.is_operable() {
            continue;
        }
        let (owner, position) = (ship.owner, ship.position);

        let target = world
            .asteroids()
            .iter()
            .find(|(_, a)| a.position.distance(position) <= range)
            .map(|(_, a)| a.id);
        let Some(asteroid) = target.and_then(|id| world.asteroid_mut(id)) else {
            continue;
        };

        if asteroid.owner == Some(owner) {
            asteroid.owned_surface =
                (asteroid.owned_surface + rate).min(asteroid.total_surface());
        } else {
            asteroid.owned_surface = (asteroid.owned_surface - rate).max(0.0);
            if asteroid.owned_surface == 0.0 {
                tracing::debug!(asteroid = %asteroid.id, player = %owner, "Asteroid conquered");
                asteroid.owner = Some(owner);
            }
        }
        asteroid.clamp_owned_surface();
    }
}

/// Recompute every player's score from the asteroids they own.
///
/// Each owned asteroid is worth a flat base plus a bonus that grows
/// exponentially with the owned percentage and linearly with size.
pub fn scoring_system(world: &mut World) {
    let config = world.config();
    let (base, growth, divisor, max_size) = (
        config.score_base,
        config.score_growth,
        config.score_divisor,
        config.max_asteroid_size,
    );

    let mut totals = vec![0.0_f64; world.players().len()];
    for (_, asteroid) in world.asteroids().iter() {
        let Some(owner) = asteroid.owner else {
            continue;
        };
        let Some(total) = totals.get_mut(owner.0) else {
            continue;
        };
        let percent = asteroid.owned_fraction() * 100.0;
        *total += base + growth.powf(percent / divisor) * (asteroid.size / max_size);
    }

    for (player, total) in world.players_mut().iter_mut().zip(totals) {
        player.score = total as i64;
    }
}
