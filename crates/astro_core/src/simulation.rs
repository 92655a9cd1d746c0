//! Round resolution.
//!
//! One call to [`World::play_round`] is one tick of the game. Phases run
//! in a fixed order:
//!
//! 1. **Ledger reset** - every ship gets its one action back
//! 2. **Commands** - batches applied in player ID order, commands in submission order
//! 3. **Movement** - ships drift, then wormhole teleports
//! 4. **Asteroid drift** - asteroids follow the noise field
//! 5. **Mining** - miners work the first matching asteroid in range
//! 6. **Conquering** - every ship contests the first asteroid in range
//! 7. **Destruction** - ships at zero health become wreckage
//! 8. **Scoring** - scores recomputed from owned asteroids
//! 9. **Round counter** incremented

use serde::{Deserialize, Serialize};

use crate::combat::{destruction_system, Destruction};
use crate::commands::{parse_batch, CommandEnvelope};
use crate::components::{AsteroidId, PlayerId};
use crate::economy::{conquering_system, mining_system, scoring_system};
use crate::error::{CommandError, GameError, Result};
use crate::movement::{asteroid_drift_system, movement_system, Teleport};
use crate::world::World;

/// The commands one player submitted for a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerBatch {
    /// Issuing player.
    pub player: PlayerId,
    /// Envelopes in submission order.
    pub commands: Vec<CommandEnvelope>,
}

impl PlayerBatch {
    /// Batch with already parsed envelopes.
    #[must_use]
    pub const fn new(player: PlayerId, commands: Vec<CommandEnvelope>) -> Self {
        Self { player, commands }
    }

    /// Parse a raw JSON payload. Unparseable payloads yield an empty batch.
    ///
    /// The parse error, if any, is returned alongside so the caller can
    /// report it.
    #[must_use]
    pub fn from_json(player: PlayerId, raw: &str) -> (Self, Option<CommandError>) {
        match parse_batch(raw) {
            Ok(commands) => (Self::new(player, commands), None),
            Err(err) => (Self::new(player, Vec::new()), Some(err)),
        }
    }
}

/// Result of one submitted command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOutcome {
    /// Issuing player.
    pub player: PlayerId,
    /// Position within the player's batch.
    pub index: usize,
    /// Raw kind discriminant from the envelope.
    pub kind: i64,
    /// Rejection reason, `None` when the command took effect.
    pub error: Option<String>,
}

impl CommandOutcome {
    /// Whether the command took effect.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything that happened during one round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    /// Round number reached after this tick.
    pub round: u32,
    /// One entry per submitted command.
    pub outcomes: Vec<CommandOutcome>,
    /// Wormhole jumps.
    pub teleports: Vec<Teleport>,
    /// Asteroids mined to nothing.
    pub depleted: Vec<AsteroidId>,
    /// Ships turned into wreckage.
    pub destroyed: Vec<Destruction>,
}

impl RoundReport {
    /// Rejected commands only.
    pub fn rejected(&self) -> impl Iterator<Item = &CommandOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    /// All wreckage asteroids spawned by the sweep.
    #[must_use]
    pub fn wrecks_spawned(&self) -> Vec<AsteroidId> {
        self.destroyed
            .iter()
            .flat_map(|d| d.wrecks.iter().copied())
            .collect()
    }
}

impl World {
    /// Resolve one full round.
    ///
    /// Batches are applied in player ID order regardless of the order they
    /// are passed in. Batches from players who are no longer alive are
    /// ignored.
    pub fn play_round(&mut self, batches: &[PlayerBatch]) -> RoundReport {
        let mut report = RoundReport::default();
        self.ledger_mut().reset();

        let mut ordered: Vec<&PlayerBatch> = batches.iter().collect();
        ordered.sort_by_key(|b| b.player);

        for batch in ordered {
            if !self.player(batch.player).is_some_and(|p| p.alive) {
                tracing::debug!(player = %batch.player, "Ignoring batch from inactive player");
                continue;
            }
            for (index, envelope) in batch.commands.iter().enumerate() {
                let result = self.apply_envelope(batch.player, envelope);
                if let Err(err) = &result {
                    tracing::warn!(
                        player = %batch.player,
                        index,
                        kind = envelope.kind,
                        error = %err,
                        "Command rejected"
                    );
                }
                report.outcomes.push(CommandOutcome {
                    player: batch.player,
                    index,
                    kind: envelope.kind,
                    error: result.err().map(|e| e.to_string()),
                });
            }
        }

        report.teleports = movement_system(self);
        asteroid_drift_system(self);
        report.depleted = mining_system(self);
        conquering_system(self);
        report.destroyed = destruction_system(self);
        scoring_system(self);

        self.advance_round();
        report.round = self.round();

        #[cfg(feature = "debug-validation")]
        {
            if let Err(err) = self.check_invariants() {
                tracing::error!(round = self.round(), error = %err, "Invariant violated");
            }
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(round = self.round(), state_hash = hash, "World state hash");
        }

        report
    }

    /// Verify the structural invariants of the world.
    ///
    /// Checks owned-surface bounds, that surface implies an owner, wormhole
    /// pairing, that every live entity sits at its own index, and that no
    /// live ship is flagged destroyed.
    pub fn check_invariants(&self) -> Result<()> {
        for (index, asteroid) in self.asteroids().iter() {
            if asteroid.id.0 != index {
                return Err(GameError::InvalidState(format!(
                    "asteroid in slot {index} has id {}",
                    asteroid.id
                )));
            }
            let total = asteroid.total_surface();
            if !(0.0..=total).contains(&asteroid.owned_surface) {
                return Err(GameError::InvalidState(format!(
                    "asteroid {index} owned surface {} outside [0, {total}]",
                    asteroid.owned_surface
                )));
            }
            if asteroid.owner.is_none() && asteroid.owned_surface != 0.0 {
                return Err(GameError::InvalidState(format!(
                    "unowned asteroid {index} has surface {}",
                    asteroid.owned_surface
                )));
            }
            if !(asteroid.size > 0.0) {
                return Err(GameError::InvalidState(format!(
                    "asteroid {index} has size {}",
                    asteroid.size
                )));
            }
        }

        for wormhole in self.wormholes() {
            let paired = self
                .wormhole(wormhole.target_id)
                .is_some_and(|t| t.target_id == wormhole.id && t.id != wormhole.id);
            if !paired {
                return Err(GameError::InvalidState(format!(
                    "wormhole {} is not symmetrically paired",
                    wormhole.id
                )));
            }
        }

        for (index, ship) in self.ships().iter() {
            if ship.id.0 != index || ship.is_destroyed {
                return Err(GameError::InvalidState(format!(
                    "ship slot {index} holds ship {} (destroyed: {})",
                    ship.id, ship.is_destroyed
                )));
            }
        }

        for player in self.players() {
            if !self.ship(player.mothership).is_some_and(|s| s.is_mothership()) {
                return Err(GameError::InvalidState(format!(
                    "player {} lost its mothership",
                    player.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Command, MoveCommand, ShootCommand, TransferCommand};
    use crate::components::{ResourceKind, ShipClass, ShipId};
    use crate::config::GameConfig;
    use crate::math::Vec2;
    use serde_json::json;

    fn envelope(command: &Command) -> CommandEnvelope {
        CommandEnvelope::from_command(command)
    }

    fn two_players() -> (World, PlayerId, PlayerId) {
        let mut world = World::empty(GameConfig::default(), 42).unwrap();
        let a = world.add_player("alpha").unwrap();
        let b = world.add_player("beta").unwrap();
        (world, a, b)
    }

    #[test]
    fn test_round_counter_advances() {
        let (mut world, _, _) = two_players();
        let report = world.play_round(&[]);
        assert_eq!(report.round, 1);
        assert_eq!(world.round(), 1);
    }

    #[test]
    fn test_move_accumulates_over_rounds() {
        let (mut world, a, _) = two_players();
        let ship = world.spawn_ship(a, ShipClass::Drill, Vec2::ZERO);
        let thrust = envelope(&Command::Move(MoveCommand {
            ship_id: ship,
            vector: Vec2::new(5.0, 0.0),
        }));

        world.play_round(&[PlayerBatch::new(a, vec![thrust.clone()])]);
        assert_eq!(world.ship(ship).unwrap().position, Vec2::new(5.0, 0.0));

        world.play_round(&[PlayerBatch::new(a, vec![thrust])]);
        let ship = world.ship(ship).unwrap();
        assert_eq!(ship.position, Vec2::new(15.0, 0.0));
        assert_eq!(ship.velocity, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_ledger_resets_between_rounds() {
        let (mut world, a, _) = two_players();
        let ship = world.spawn_ship(a, ShipClass::Battleship, Vec2::ZERO);
        let thrust = envelope(&Command::Move(MoveCommand {
            ship_id: ship,
            vector: Vec2::new(1.0, 0.0),
        }));

        let report = world.play_round(&[PlayerBatch::new(a, vec![thrust.clone(), thrust.clone()])]);
        assert!(report.outcomes[0].is_ok());
        assert!(!report.outcomes[1].is_ok());

        let report = world.play_round(&[PlayerBatch::new(a, vec![thrust])]);
        assert!(report.outcomes[0].is_ok());
    }

    #[test]
    fn test_bad_command_does_not_stop_batch() {
        let (mut world, a, _) = two_players();
        let batch = PlayerBatch::new(
            a,
            vec![
                CommandEnvelope {
                    kind: 42,
                    data: json!({}),
                },
                CommandEnvelope {
                    kind: 2,
                    data: json!("garbage"),
                },
                CommandEnvelope {
                    kind: 0,
                    data: json!({"type": 5}),
                },
            ],
        );
        let report = world.play_round(&[batch]);
        assert_eq!(report.rejected().count(), 2);
        assert!(report.outcomes[2].is_ok());
        assert_eq!(world.player(a).unwrap().rock, 900);
    }

    #[test]
    fn test_shot_ship_becomes_wreckage_same_round() {
        let (mut world, a, b) = two_players();
        let gun = world.spawn_ship(a, ShipClass::Battleship, Vec2::ZERO);
        let drill = world.spawn_ship(b, ShipClass::Drill, Vec2::new(80.0, 0.0));
        {
            let drill = world.ship_mut(drill).unwrap();
            drill.health = 20;
            drill.rock = 30;
        }
        let shot = envelope(&Command::Shoot(ShootCommand {
            source_id: gun,
            destination_id: drill,
        }));

        let report = world.play_round(&[PlayerBatch::new(a, vec![shot])]);
        assert_eq!(report.destroyed.len(), 1);
        assert_eq!(report.wrecks_spawned().len(), 2);
        assert!(world.ship(drill).is_none());
        assert_eq!(world.ships().slot_count(), 4);
    }

    #[test]
    fn test_batches_applied_in_player_order() {
        let (mut world, a, b) = two_players();
        let a_gun = world.spawn_ship(a, ShipClass::Battleship, Vec2::ZERO);
        let b_gun = world.spawn_ship(b, ShipClass::Battleship, Vec2::new(10.0, 0.0));
        world.ship_mut(a_gun).unwrap().health = 25;
        world.ship_mut(b_gun).unwrap().health = 25;

        let a_shot = envelope(&Command::Shoot(ShootCommand {
            source_id: a_gun,
            destination_id: b_gun,
        }));
        let b_shot = envelope(&Command::Shoot(ShootCommand {
            source_id: b_gun,
            destination_id: a_gun,
        }));

        // Passed in reverse; alpha still fires first and disables beta's gun.
        let report = world.play_round(&[
            PlayerBatch::new(b, vec![b_shot]),
            PlayerBatch::new(a, vec![a_shot]),
        ]);
        assert_eq!(report.outcomes[0].player, a);
        assert!(report.outcomes[0].is_ok());
        assert!(!report.outcomes[1].is_ok());
        assert!(world.ship(a_gun).is_some());
        assert!(world.ship(b_gun).is_none());
    }

    #[test]
    fn test_dead_player_batch_ignored() {
        let (mut world, a, _) = two_players();
        world.mark_player_dead(a).unwrap();
        let report = world.play_round(&[PlayerBatch::new(
            a,
            vec![envelope(&Command::Buy(crate::commands::BuyCommand { class: 1 }))],
        )]);
        assert!(report.outcomes.is_empty());
        assert_eq!(world.player(a).unwrap().rock, 1000);
    }

    #[test]
    fn test_asteroids_drift_during_round() {
        let (mut world, _, _) = two_players();
        let a = world.spawn_asteroid(Vec2::new(10.0, 20.0), ResourceKind::Rock, 30.0);
        let b = world.spawn_asteroid(Vec2::new(30.0, 40.0), ResourceKind::Fuel, 30.0);

        let report = world.play_round(&[]);
        assert_eq!(report.round, 1);
        for (id, start) in [(a, Vec2::new(10.0, 20.0)), (b, Vec2::new(30.0, 40.0))] {
            let asteroid = world.asteroid(id).unwrap();
            assert_ne!(asteroid.position, start);
            assert_eq!(asteroid.position, start + asteroid.velocity);
        }
    }

    #[test]
    fn test_from_json_tolerates_garbage() {
        let (batch, err) = PlayerBatch::from_json(PlayerId(0), "[{");
        assert!(batch.commands.is_empty());
        assert!(err.is_some());

        let (batch, err) = PlayerBatch::from_json(PlayerId(0), r#"[{"type":1,"data":{}}]"#);
        assert_eq!(batch.commands.len(), 1);
        assert!(err.is_none());
    }

    #[test]
    fn test_economy_runs_after_commands() {
        let (mut world, a, _) = two_players();
        let drill = world.spawn_ship(a, ShipClass::Drill, Vec2::ZERO);
        let truck = world.spawn_ship(a, ShipClass::Truck, Vec2::ZERO);
        world.ship_mut(drill).unwrap().rock = 5;
        let asteroid = world.spawn_asteroid(Vec2::new(1.0, 0.0), ResourceKind::Rock, 10.0);

        let load = envelope(&Command::Load(TransferCommand {
            source_id: drill,
            destination_id: truck,
            amount: 5,
        }));
        world.play_round(&[PlayerBatch::new(a, vec![load])]);

        assert_eq!(world.ship(truck).unwrap().rock, 5);
        assert_eq!(world.ship(drill).unwrap().rock, 10);
        assert_eq!(world.asteroid(asteroid).unwrap().owner, Some(a));
        assert!(world.check_invariants().is_ok());
    }

    #[test]
    fn test_invariants_detect_corruption() {
        let (mut world, _, _) = two_players();
        let id = world.spawn_asteroid(Vec2::ZERO, ResourceKind::Fuel, 5.0);
        assert!(world.check_invariants().is_ok());
        world.asteroid_mut(id).unwrap().owned_surface = 3.0;
        assert!(world.check_invariants().is_err());
        assert_eq!(world.ship(ShipId(0)).map(|s| s.class), Some(ShipClass::Mothership));
    }
}
