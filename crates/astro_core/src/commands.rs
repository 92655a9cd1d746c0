//! Player commands: decoding, validation, the ship ledger and dispatch.
//!
//! A player's batch is a JSON array of `{"type": <kind>, "data": {...}}`
//! envelopes. Each envelope goes through the same pipeline:
//!
//! 1. decode the payload into a typed [`Command`]
//! 2. stateless [`Command::validate`]
//! 3. ledger check: every actor ship must still be unused this round
//! 4. execute against the world, then record the actors in the ledger
//!
//! Any failure rejects only that command. Execution checks everything
//! before touching the world, so a rejected command leaves no trace.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::components::{PlayerId, Ship, ShipClass, ShipId};
use crate::error::CommandError;
use crate::math::Vec2;
use crate::world::World;
use crate::{combat, economy, movement};

// ============================================================================
// Wire format
// ============================================================================

/// Tagged command record as received from a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// Command kind discriminant.
    #[serde(rename = "type")]
    pub kind: i64,
    /// Kind-specific payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl CommandEnvelope {
    /// Wrap a typed command for sending.
    pub fn from_command(command: &Command) -> Self {
        let data = match command {
            Command::Buy(c) => serde_json::to_value(c),
            Command::Move(c) => serde_json::to_value(c),
            Command::Load(c) | Command::Siphon(c) => serde_json::to_value(c),
            Command::Shoot(c) => serde_json::to_value(c),
            Command::Repair(c) => serde_json::to_value(c),
        }
        .unwrap_or(serde_json::Value::Null);
        Self {
            kind: command.kind() as i64,
            data,
        }
    }
}

/// Parse a raw batch payload into envelopes.
///
/// Individual envelopes are decoded later, so one malformed command does
/// not sink the rest of the batch. Only a payload that is not a JSON array
/// of objects with a `type` field fails here.
pub fn parse_batch(raw: &str) -> Result<Vec<CommandEnvelope>, CommandError> {
    serde_json::from_str(raw).map_err(|e| CommandError::Decode(e.to_string()))
}

/// The six command kinds, numbered as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CommandKind {
    /// Buy a ship with rock.
    Buy = 0,
    /// Add thrust to a ship.
    Move = 1,
    /// Transfer rock between ships.
    Load = 2,
    /// Transfer fuel between ships.
    Siphon = 3,
    /// Fire a battleship.
    Shoot = 4,
    /// Heal a ship near the mothership.
    Repair = 5,
}

impl CommandKind {
    /// Kind for a wire discriminant.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Buy),
            1 => Some(Self::Move),
            2 => Some(Self::Load),
            3 => Some(Self::Siphon),
            4 => Some(Self::Shoot),
            5 => Some(Self::Repair),
            _ => None,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Buy => "buy",
            Self::Move => "move",
            Self::Load => "load",
            Self::Siphon => "siphon",
            Self::Shoot => "shoot",
            Self::Repair => "repair",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Typed commands
// ============================================================================

/// Buy a ship of the given class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyCommand {
    /// Requested class discriminant, range-checked in validation.
    #[serde(rename = "type")]
    pub class: i64,
}

/// Add `vector` to a ship's velocity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveCommand {
    /// Ship to accelerate.
    pub ship_id: ShipId,
    /// Thrust; rescaled down to the configured maximum.
    pub vector: Vec2,
}

/// Move `amount` of rock or fuel from one ship to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCommand {
    /// Giving ship.
    pub source_id: ShipId,
    /// Receiving ship.
    pub destination_id: ShipId,
    /// Whole units to move.
    pub amount: i64,
}

/// Fire a battleship at another ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShootCommand {
    /// Firing battleship.
    pub source_id: ShipId,
    /// Target.
    pub destination_id: ShipId,
}

/// Repair a ship near its mothership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairCommand {
    /// Ship to heal.
    pub ship_id: ShipId,
}

/// A decoded player command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// See [`BuyCommand`].
    Buy(BuyCommand),
    /// See [`MoveCommand`].
    Move(MoveCommand),
    /// Rock transfer, see [`TransferCommand`].
    Load(TransferCommand),
    /// Fuel transfer, see [`TransferCommand`].
    Siphon(TransferCommand),
    /// See [`ShootCommand`].
    Shoot(ShootCommand),
    /// See [`RepairCommand`].
    Repair(RepairCommand),
}

impl Command {
    /// Decode an envelope into its typed form.
    pub fn decode(envelope: &CommandEnvelope) -> Result<Self, CommandError> {
        let kind =
            CommandKind::from_code(envelope.kind).ok_or(CommandError::UnknownKind(envelope.kind))?;
        let data = envelope.data.clone();
        let decode_err = |e: serde_json::Error| CommandError::Decode(e.to_string());
        Ok(match kind {
            CommandKind::Buy => Self::Buy(serde_json::from_value(data).map_err(decode_err)?),
            CommandKind::Move => Self::Move(serde_json::from_value(data).map_err(decode_err)?),
            CommandKind::Load => Self::Load(serde_json::from_value(data).map_err(decode_err)?),
            CommandKind::Siphon => Self::Siphon(serde_json::from_value(data).map_err(decode_err)?),
            CommandKind::Shoot => Self::Shoot(serde_json::from_value(data).map_err(decode_err)?),
            CommandKind::Repair => Self::Repair(serde_json::from_value(data).map_err(decode_err)?),
        })
    }

    /// Wire kind of this command.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::Buy(_) => CommandKind::Buy,
            Self::Move(_) => CommandKind::Move,
            Self::Load(_) => CommandKind::Load,
            Self::Siphon(_) => CommandKind::Siphon,
            Self::Shoot(_) => CommandKind::Shoot,
            Self::Repair(_) => CommandKind::Repair,
        }
    }

    /// Structural checks that need no world state.
    pub fn validate(&self) -> Result<(), CommandError> {
        match self {
            Self::Buy(buy) => match ShipClass::from_code(buy.class) {
                Some(class) if class.is_purchasable() => Ok(()),
                _ => Err(CommandError::InvalidShipClass(buy.class)),
            },
            Self::Move(mv) => {
                if mv.vector.x.is_finite() && mv.vector.y.is_finite() {
                    Ok(())
                } else {
                    Err(CommandError::NonFiniteVector)
                }
            }
            Self::Load(t) | Self::Siphon(t) => {
                if t.amount <= 0 {
                    return Err(CommandError::InvalidAmount(t.amount));
                }
                if t.source_id == t.destination_id {
                    return Err(CommandError::SameShip(t.source_id));
                }
                Ok(())
            }
            Self::Shoot(shot) => {
                if shot.source_id == shot.destination_id {
                    Err(CommandError::SameShip(shot.source_id))
                } else {
                    Ok(())
                }
            }
            Self::Repair(_) => Ok(()),
        }
    }

    /// Ships that spend their one action for the round on this command.
    ///
    /// Transfers occupy both ends; a shot only occupies the shooter, since
    /// the target usually belongs to someone else.
    #[must_use]
    pub fn actors(&self) -> Vec<ShipId> {
        match self {
            Self::Buy(_) => Vec::new(),
            Self::Move(mv) => vec![mv.ship_id],
            Self::Load(t) | Self::Siphon(t) => vec![t.source_id, t.destination_id],
            Self::Shoot(shot) => vec![shot.source_id],
            Self::Repair(repair) => vec![repair.ship_id],
        }
    }

    /// Apply the command for `player`. Nothing changes on error.
    pub fn execute(&self, world: &mut World, player: PlayerId) -> Result<(), CommandError> {
        match self {
            Self::Buy(buy) => {
                let class = ShipClass::from_code(buy.class)
                    .ok_or(CommandError::InvalidShipClass(buy.class))?;
                economy::buy_ship(world, player, class).map(|_| ())
            }
            Self::Move(mv) => movement::apply_thrust(world, player, mv.ship_id, mv.vector),
            Self::Load(t) => economy::transfer_rock(world, player, t.source_id, t.destination_id, t.amount),
            Self::Siphon(t) => {
                economy::transfer_fuel(world, player, t.source_id, t.destination_id, t.amount)
            }
            Self::Shoot(shot) => combat::shoot(world, player, shot.source_id, shot.destination_id),
            Self::Repair(repair) => combat::repair(world, player, repair.ship_id),
        }
    }
}

/// Look up a ship the player may act with.
///
/// Fails for empty slots, foreign ships and disabled ships.
pub(crate) fn owned_ship(
    world: &World,
    player: PlayerId,
    id: ShipId,
) -> Result<&Ship, CommandError> {
    let ship = world.ship(id).ok_or(CommandError::InvalidShip(id))?;
    if ship.owner != player {
        return Err(CommandError::NotOwner { ship: id, player });
    }
    if !ship.is_operable() {
        return Err(CommandError::ShipDisabled(id));
    }
    Ok(ship)
}

// ============================================================================
// Ship ledger
// ============================================================================

/// Which ships each player has already used this round.
///
/// Reset at the start of every round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipLedger {
    used: BTreeMap<PlayerId, BTreeSet<ShipId>>,
}

impl ShipLedger {
    /// Forget all claims.
    pub fn reset(&mut self) {
        self.used.clear();
    }

    /// Whether no ship has been used yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.used.values().all(BTreeSet::is_empty)
    }

    /// Whether `ship` already acted for `player` this round.
    #[must_use]
    pub fn is_used(&self, player: PlayerId, ship: ShipId) -> bool {
        self.used.get(&player).is_some_and(|s| s.contains(&ship))
    }

    /// Fail if any of `ships` already acted.
    pub fn check(&self, player: PlayerId, ships: &[ShipId]) -> Result<(), CommandError> {
        match ships.iter().find(|s| self.is_used(player, **s)) {
            Some(ship) => Err(CommandError::ShipAlreadyUsed(*ship)),
            None => Ok(()),
        }
    }

    /// Record `ships` as used.
    pub fn claim(&mut self, player: PlayerId, ships: &[ShipId]) {
        if ships.is_empty() {
            return;
        }
        self.used.entry(player).or_default().extend(ships.iter().copied());
    }

    /// Ships `player` has used this round, in ID order.
    pub fn used_by(&self, player: PlayerId) -> impl Iterator<Item = ShipId> + '_ {
        self.used.get(&player).into_iter().flatten().copied()
    }
}

// ============================================================================
// Pipeline
// ============================================================================

impl World {
    /// Run one envelope through the full decode/validate/ledger/execute pipeline.
    pub fn apply_envelope(
        &mut self,
        player: PlayerId,
        envelope: &CommandEnvelope,
    ) -> Result<Command, CommandError> {
        let command = Command::decode(envelope)?;
        self.apply_command(player, &command)?;
        Ok(command)
    }

    /// Validate, ledger-check and execute a typed command.
    pub fn apply_command(&mut self, player: PlayerId, command: &Command) -> Result<(), CommandError> {
        match self.player(player) {
            Some(p) if p.alive => {}
            _ => return Err(CommandError::InactivePlayer(player)),
        }

        command.validate()?;

        let actors = command.actors();
        self.ledger().check(player, &actors)?;

        command.execute(self, player)?;
        self.ledger_mut().claim(player, &actors);

        tracing::debug!(player = %player, kind = %command.kind(), "Command executed");
        Ok(())
    }
}
