//! Shooting, repairs and the end-of-round destruction sweep.
//!
//! A shot only ever lowers health. Ships at zero health or below are
//! disabled until the sweep turns them into wreckage at the end of the
//! round, so every death goes through the same path and always leaves its
//! cargo behind. Motherships are immune to all of this.

use serde::{Deserialize, Serialize};

use crate::commands::owned_ship;
use crate::components::{AsteroidId, PlayerId, ResourceKind, ShipClass, ShipId};
use crate::error::CommandError;
use crate::world::World;

/// A ship removed by the destruction sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destruction {
    /// Vacated slot.
    pub ship: ShipId,
    /// Former owner.
    pub owner: PlayerId,
    /// Wreckage asteroids, fuel first. Empty cargo leaves no wreck.
    pub wrecks: Vec<AsteroidId>,
}

/// Fire a battleship at another ship.
pub(crate) fn shoot(
    world: &mut World,
    player: PlayerId,
    source: ShipId,
    target: ShipId,
) -> Result<(), CommandError> {
    let shooter = owned_ship(world, player, source)?;
    if shooter.class != ShipClass::Battleship {
        return Err(CommandError::NotABattleship {
            ship: source,
            class: shooter.class,
        });
    }

    let victim = world.ship(target).ok_or(CommandError::InvalidShip(target))?;
    if victim.is_mothership() {
        return Err(CommandError::MothershipInvincible(target));
    }
    if !victim.is_operable() {
        return Err(CommandError::ShipDisabled(target));
    }

    let distance = shooter.position.distance(victim.position);
    let max = world.config().shoot_distance;
    if distance > max {
        return Err(CommandError::OutOfRange { distance, max });
    }

    let damage = world.config().shoot_damage;
    if let Some(victim) = world.ship_mut(target) {
        victim.health = victim.health.saturating_sub(damage);
        tracing::debug!(shooter = %source, target = %target, health = victim.health, "Ship hit");
    }
    Ok(())
}

/// Heal one of the player's ships near their mothership.
pub(crate) fn repair(world: &mut World, player: PlayerId, ship_id: ShipId) -> Result<(), CommandError> {
    let ship = owned_ship(world, player, ship_id)?;
    let mothership = world
        .player(player)
        .and_then(|p| world.ship(p.mothership))
        .ok_or(CommandError::InactivePlayer(player))?;

    let distance = ship.position.distance(mothership.position);
    let max = world.config().repair_distance;
    if distance > max {
        return Err(CommandError::OutOfRange { distance, max });
    }

    let (amount, cap) = (world.config().repair_amount, world.config().ship_max_health);
    if let Some(ship) = world.ship_mut(ship_id) {
        ship.heal(amount, cap);
    }
    Ok(())
}

/// Turn every ship at zero health or below into wreckage.
///
/// Each dead ship is flagged destroyed with its health clamped to zero,
/// spawns a fuel wreck from its fuel and a rock wreck from its rock, and
/// then leaves its arena slot empty. A resource it carried none of spawns
/// no wreck, so an empty ship leaves nothing behind.
pub fn destruction_system(world: &mut World) -> Vec<Destruction> {
    let mut destroyed = Vec::new();

    for index in world.ships().indices() {
        let id = ShipId(index);
        let Some(ship) = world.ship_mut(id) else {
            continue;
        };
        if ship.is_mothership() || ship.is_destroyed || ship.health > 0 {
            continue;
        }

        ship.is_destroyed = true;
        ship.health = 0;
        let dead = ship.clone();

        let wrecks: Vec<AsteroidId> = [ResourceKind::Fuel, ResourceKind::Rock]
            .into_iter()
            .filter_map(|kind| world.spawn_wreck(&dead, kind))
            .collect();
        world.ships_mut().remove(index);

        tracing::debug!(ship = %id, owner = %dead.owner, wrecks = wrecks.len(), "Ship destroyed");
        destroyed.push(Destruction {
            ship: id,
            owner: dead.owner,
            wrecks,
        });
    }
    destroyed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::math::Vec2;

    fn duel() -> (World, PlayerId, PlayerId) {
        let mut world = World::empty(GameConfig::default(), 5).unwrap();
        let a = world.add_player("attacker").unwrap();
        let b = world.add_player("defender").unwrap();
        (world, a, b)
    }

    #[test]
    fn test_shot_then_sweep_leaves_two_wrecks() {
        let (mut world, a, b) = duel();
        let gun = world.spawn_ship(a, ShipClass::Battleship, Vec2::ZERO);
        let drill = world.spawn_ship(b, ShipClass::Drill, Vec2::new(80.0, 0.0));
        {
            let drill = world.ship_mut(drill).unwrap();
            drill.health = 20;
            drill.rock = 40;
            drill.fuel = 60.0;
        }

        shoot(&mut world, a, gun, drill).unwrap();
        assert_eq!(world.ship(drill).unwrap().health, -5);
        assert!(!world.ship(drill).unwrap().is_destroyed);

        let asteroids_before = world.asteroids().len();
        let destroyed = destruction_system(&mut world);
        assert_eq!(destroyed.len(), 1);
        assert_eq!(destroyed[0].ship, drill);
        assert!(world.ship(drill).is_none());
        assert_eq!(world.asteroids().len(), asteroids_before + 2);

        let fuel = world.asteroid(destroyed[0].wrecks[0]).unwrap();
        let rock = world.asteroid(destroyed[0].wrecks[1]).unwrap();
        assert_eq!(fuel.kind, ResourceKind::Fuel);
        assert_eq!(rock.kind, ResourceKind::Rock);
        assert!((fuel.material(10.0) - 60.0).abs() < 1e-9);
        assert!((rock.material(10.0) - 40.0).abs() < 1e-9);
        assert_eq!(rock.owner, Some(b));
    }

    #[test]
    fn test_sweep_processes_ship_once() {
        let (mut world, a, _) = duel();
        let ship = world.spawn_ship(a, ShipClass::Truck, Vec2::ZERO);
        world.ship_mut(ship).unwrap().health = 0;

        assert_eq!(destruction_system(&mut world).len(), 1);
        assert!(destruction_system(&mut world).is_empty());
        assert_eq!(world.ships().slot_count(), 3);
    }

    #[test]
    fn test_sweep_spares_motherships() {
        let (mut world, a, _) = duel();
        let mothership = world.player(a).unwrap().mothership;
        world.ship_mut(mothership).unwrap().health = -100;

        assert!(destruction_system(&mut world).is_empty());
        assert!(world.ship(mothership).is_some());
    }

    #[test]
    fn test_empty_ship_leaves_no_wreckage() {
        let (mut world, a, _) = duel();
        let ship = world.spawn_ship(a, ShipClass::Battleship, Vec2::ZERO);
        world.ship_mut(ship).unwrap().fuel = 0.0;
        world.ship_mut(ship).unwrap().health = -1;

        let destroyed = destruction_system(&mut world);
        assert!(destroyed[0].wrecks.is_empty());
        assert!(world.asteroids().is_empty());
    }

    #[test]
    fn test_fuel_only_ship_leaves_one_wreck() {
        let (mut world, a, _) = duel();
        let ship = world.spawn_ship(a, ShipClass::Tanker, Vec2::ZERO);
        world.ship_mut(ship).unwrap().health = 0;

        let destroyed = destruction_system(&mut world);
        assert_eq!(destroyed[0].wrecks.len(), 1);
        let wreck = world.asteroid(destroyed[0].wrecks[0]).unwrap();
        assert_eq!(wreck.kind, ResourceKind::Fuel);
    }

    #[test]
    fn test_mothership_invincible() {
        let (mut world, a, b) = duel();
        let target = world.player(b).unwrap().mothership;
        let position = world.ship(target).unwrap().position;
        let gun = world.spawn_ship(a, ShipClass::Battleship, position);

        assert_eq!(
            shoot(&mut world, a, gun, target),
            Err(CommandError::MothershipInvincible(target))
        );
        assert_eq!(world.ship(target).unwrap().health, 100);
    }

    #[test]
    fn test_only_battleships_shoot() {
        let (mut world, a, b) = duel();
        let drill = world.spawn_ship(a, ShipClass::Drill, Vec2::ZERO);
        let target = world.spawn_ship(b, ShipClass::Drill, Vec2::ZERO);
        assert!(matches!(
            shoot(&mut world, a, drill, target),
            Err(CommandError::NotABattleship { .. })
        ));
    }

    #[test]
    fn test_shot_out_of_range() {
        let (mut world, a, b) = duel();
        let gun = world.spawn_ship(a, ShipClass::Battleship, Vec2::ZERO);
        let target = world.spawn_ship(b, ShipClass::Drill, Vec2::new(100.5, 0.0));
        assert!(matches!(
            shoot(&mut world, a, gun, target),
            Err(CommandError::OutOfRange { .. })
        ));
        assert_eq!(world.ship(target).unwrap().health, 100);
    }

    #[test]
    fn test_disabled_ship_cannot_be_targeted() {
        let (mut world, a, b) = duel();
        let gun = world.spawn_ship(a, ShipClass::Battleship, Vec2::ZERO);
        let target = world.spawn_ship(b, ShipClass::Drill, Vec2::ZERO);
        world.ship_mut(target).unwrap().health = 0;
        assert_eq!(
            shoot(&mut world, a, gun, target),
            Err(CommandError::ShipDisabled(target))
        );
    }

    #[test]
    fn test_repair_near_mothership() {
        let (mut world, a, _) = duel();
        let home = world.ship(world.player(a).unwrap().mothership).unwrap().position;
        let ship = world.spawn_ship(a, ShipClass::Tanker, home + Vec2::new(30.0, 40.0));
        world.ship_mut(ship).unwrap().health = 50;

        repair(&mut world, a, ship).unwrap();
        assert_eq!(world.ship(ship).unwrap().health, 80);
        repair(&mut world, a, ship).unwrap();
        assert_eq!(world.ship(ship).unwrap().health, 100);
    }

    #[test]
    fn test_repair_too_far() {
        let (mut world, a, _) = duel();
        let home = world.ship(world.player(a).unwrap().mothership).unwrap().position;
        let ship = world.spawn_ship(a, ShipClass::Tanker, home + Vec2::new(51.0, 0.0));
        world.ship_mut(ship).unwrap().health = 50;

        assert!(matches!(
            repair(&mut world, a, ship),
            Err(CommandError::OutOfRange { .. })
        ));
        assert_eq!(world.ship(ship).unwrap().health, 50);
    }
}
