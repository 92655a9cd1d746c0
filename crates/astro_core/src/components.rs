//! Entity definitions.
//!
//! Entities are plain data. The rules that mutate them live in the
//! movement, economy and combat modules.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::{disc_surface, Vec2};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl $name {
            /// Raw arena index.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Index of a ship in the world's ship arena.
    ShipId
);
id_type!(
    /// Index of an asteroid in the world's asteroid arena.
    AsteroidId
);
id_type!(
    /// Index of a wormhole.
    WormholeId
);
id_type!(
    /// Index of a player, equal to join order.
    PlayerId
);

// ============================================================================
// Ships
// ============================================================================

/// Ship classes. Serialized as their integer discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum ShipClass {
    /// The player's invincible home ship and depot.
    Mothership = 0,
    /// Fuel miner.
    Sucker = 1,
    /// Rock miner.
    Drill = 2,
    /// Fuel hauler.
    Tanker = 3,
    /// Rock hauler.
    Truck = 4,
    /// The only armed class.
    Battleship = 5,
}

impl ShipClass {
    /// All classes in discriminant order.
    pub const ALL: [Self; 6] = [
        Self::Mothership,
        Self::Sucker,
        Self::Drill,
        Self::Tanker,
        Self::Truck,
        Self::Battleship,
    ];

    /// Class for a wire discriminant, if it names one.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| *c as i64 == code)
    }

    /// Resource this class extracts from asteroids, if any.
    #[must_use]
    pub const fn mines(self) -> Option<ResourceKind> {
        match self {
            Self::Sucker => Some(ResourceKind::Fuel),
            Self::Drill => Some(ResourceKind::Rock),
            _ => None,
        }
    }

    /// Tankers and trucks get the cheaper movement table.
    #[must_use]
    pub const fn is_hauler(self) -> bool {
        matches!(self, Self::Tanker | Self::Truck)
    }

    /// Whether this class can be bought with rock.
    #[must_use]
    pub const fn is_purchasable(self) -> bool {
        !matches!(self, Self::Mothership)
    }
}

impl From<ShipClass> for u8 {
    fn from(class: ShipClass) -> Self {
        class as u8
    }
}

impl TryFrom<u8> for ShipClass {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(i64::from(code)).ok_or_else(|| format!("unknown ship type {code}"))
    }
}

/// A ship owned by a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    /// Arena index.
    pub id: ShipId,
    /// Owning player.
    #[serde(rename = "player")]
    pub owner: PlayerId,
    /// World position.
    pub position: Vec2,
    /// Drift applied every round. Move commands add to it.
    #[serde(rename = "vector")]
    pub velocity: Vec2,
    /// Current health. May go negative until the destruction sweep runs.
    pub health: i32,
    /// Fuel carried.
    pub fuel: f64,
    /// Ship class.
    #[serde(rename = "type")]
    pub class: ShipClass,
    /// Rock carried.
    pub rock: i64,
    /// Set by the destruction sweep just before the slot is emptied.
    pub is_destroyed: bool,
}

impl Ship {
    /// A fresh ship at full health with no velocity.
    #[must_use]
    pub fn new(
        id: ShipId,
        owner: PlayerId,
        class: ShipClass,
        position: Vec2,
        health: i32,
        fuel: f64,
    ) -> Self {
        Self {
            id,
            owner,
            position,
            velocity: Vec2::ZERO,
            health,
            fuel,
            class,
            rock: 0,
            is_destroyed: false,
        }
    }

    /// Whether this is a mothership.
    #[must_use]
    pub const fn is_mothership(&self) -> bool {
        matches!(self.class, ShipClass::Mothership)
    }

    /// Whether the ship can still act and be acted on.
    ///
    /// Motherships always are; anything else stops at zero health.
    #[must_use]
    pub const fn is_operable(&self) -> bool {
        !self.is_destroyed && (self.is_mothership() || self.health > 0)
    }

    /// Heal by `amount`, never above `max`.
    pub fn heal(&mut self, amount: i32, max: i32) {
        self.health = self.health.saturating_add(amount).min(max);
    }
}

// ============================================================================
// Asteroids
// ============================================================================

/// What an asteroid is made of. Serialized as its integer discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum ResourceKind {
    /// Mined into integer rock.
    Rock = 0,
    /// Mined into real-valued fuel.
    Fuel = 1,
}

impl From<ResourceKind> for u8 {
    fn from(kind: ResourceKind) -> Self {
        kind as u8
    }
}

impl TryFrom<u8> for ResourceKind {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Rock),
            1 => Ok(Self::Fuel),
            other => Err(format!("unknown asteroid type {other}")),
        }
    }
}

/// Serde support for asteroid ownership.
///
/// Unowned asteroids serialize their owner as `-1`, which is what the
/// player clients expect.
pub mod owner_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::PlayerId;

    /// Serialize an optional owner, `None` as `-1`.
    pub fn serialize<S>(value: &Option<PlayerId>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(id) => (id.0 as i64).serialize(serializer),
            None => (-1i64).serialize(serializer),
        }
    }

    /// Deserialize an owner; any negative value means unowned.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<PlayerId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        Ok(usize::try_from(raw).ok().map(PlayerId))
    }
}

/// A minable, conquerable asteroid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asteroid {
    /// Arena index.
    pub id: AsteroidId,
    /// World position.
    pub position: Vec2,
    /// Drift applied during the last round.
    #[serde(rename = "vector", default)]
    pub velocity: Vec2,
    /// Resource class, fixed for the asteroid's lifetime.
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    /// Radius. Total surface is `size² · π`.
    pub size: f64,
    /// Controlling player.
    #[serde(rename = "owner_id", with = "owner_serde")]
    pub owner: Option<PlayerId>,
    /// Portion of the surface controlled by `owner`.
    #[serde(rename = "surface")]
    pub owned_surface: f64,
}

impl Asteroid {
    /// An unowned asteroid.
    #[must_use]
    pub fn new(id: AsteroidId, position: Vec2, kind: ResourceKind, size: f64) -> Self {
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            kind,
            size,
            owner: None,
            owned_surface: 0.0,
        }
    }

    /// Total surface area.
    #[must_use]
    pub fn total_surface(&self) -> f64 {
        disc_surface(self.size)
    }

    /// Material left, given the material-per-surface ratio.
    #[must_use]
    pub fn material(&self, ratio: f64) -> f64 {
        self.total_surface() * ratio
    }

    /// Owned surface as a fraction of the total, 0 for a degenerate asteroid.
    #[must_use]
    pub fn owned_fraction(&self) -> f64 {
        let total = self.total_surface();
        if total > 0.0 {
            (self.owned_surface / total).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Re-clamp the owned surface into `[0, total]`.
    pub fn clamp_owned_surface(&mut self) {
        self.owned_surface = self.owned_surface.clamp(0.0, self.total_surface());
    }
}

// ============================================================================
// Wormholes and players
// ============================================================================

/// One end of a wormhole pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wormhole {
    /// Index in the wormhole list.
    pub id: WormholeId,
    /// The paired wormhole.
    pub target_id: WormholeId,
    /// Fixed position.
    pub position: Vec2,
}

/// Colour given to players at join, until the host picks another.
pub const DEFAULT_PLAYER_COLOR: &str = "white";

fn default_player_color() -> String {
    DEFAULT_PLAYER_COLOR.to_string()
}

/// A contestant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Join index.
    pub id: PlayerId,
    /// Unique display name.
    pub name: String,
    /// Display colour for observers, any CSS colour string.
    #[serde(default = "default_player_color")]
    pub color: String,
    /// The player's home ship.
    pub mothership: ShipId,
    /// Rock stockpile held at the mothership.
    pub rock: i64,
    /// Fuel stockpile held at the mothership.
    pub fuel: f64,
    /// False once the player stopped responding.
    pub alive: bool,
    /// Recomputed every round from owned asteroids.
    pub score: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ship_class_codes() {
        for class in ShipClass::ALL {
            assert_eq!(ShipClass::from_code(class as i64), Some(class));
        }
        assert_eq!(ShipClass::from_code(6), None);
        assert_eq!(ShipClass::from_code(-1), None);
    }

    #[test]
    fn test_only_miners_mine() {
        assert_eq!(ShipClass::Sucker.mines(), Some(ResourceKind::Fuel));
        assert_eq!(ShipClass::Drill.mines(), Some(ResourceKind::Rock));
        for class in [
            ShipClass::Mothership,
            ShipClass::Tanker,
            ShipClass::Truck,
            ShipClass::Battleship,
        ] {
            assert_eq!(class.mines(), None);
        }
    }

    #[test]
    fn test_mothership_always_operable() {
        let mut ship = Ship::new(
            ShipId(0),
            PlayerId(0),
            ShipClass::Mothership,
            Vec2::ZERO,
            100,
            0.0,
        );
        ship.health = -50;
        assert!(ship.is_operable());

        ship.class = ShipClass::Truck;
        assert!(!ship.is_operable());
    }

    #[test]
    fn test_heal_clamps_to_max() {
        let mut ship = Ship::new(ShipId(0), PlayerId(0), ShipClass::Drill, Vec2::ZERO, 90, 0.0);
        ship.heal(30, 100);
        assert_eq!(ship.health, 100);
    }

    #[test]
    fn test_ship_wire_format() {
        let ship = Ship::new(
            ShipId(3),
            PlayerId(1),
            ShipClass::Battleship,
            Vec2::new(1.0, 2.0),
            100,
            50.0,
        );
        let json = serde_json::to_value(&ship).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["player"], 1);
        assert_eq!(json["type"], 5);
        assert_eq!(json["vector"]["x"], 0.0);
        assert_eq!(json["is_destroyed"], false);
    }

    #[test]
    fn test_unowned_asteroid_serializes_minus_one() {
        let asteroid = Asteroid::new(AsteroidId(0), Vec2::ZERO, ResourceKind::Fuel, 30.0);
        let json = serde_json::to_value(&asteroid).unwrap();
        assert_eq!(json["owner_id"], -1);
        assert_eq!(json["type"], 1);

        let back: Asteroid = serde_json::from_value(json).unwrap();
        assert_eq!(back.owner, None);
    }

    #[test]
    fn test_unknown_ship_type_rejected() {
        let result: Result<ShipClass, _> = serde_json::from_str("9");
        assert!(result.is_err());
    }

    #[test]
    fn test_owned_fraction() {
        let mut asteroid = Asteroid::new(AsteroidId(0), Vec2::ZERO, ResourceKind::Rock, 10.0);
        asteroid.owner = Some(PlayerId(0));
        asteroid.owned_surface = asteroid.total_surface() / 4.0;
        assert!((asteroid.owned_fraction() - 0.25).abs() < 1e-12);
    }
}
