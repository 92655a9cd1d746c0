//! Game tuning constants.
//!
//! Every number the rules depend on lives in [`GameConfig`]. The default
//! values are the standard competition settings; alternative rule sets are
//! loaded from RON files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::components::ShipClass;
use crate::error::{GameError, Result};

/// Movement cost parameters for one group of ship classes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementCost {
    /// Thrust magnitude that costs nothing.
    pub free_threshold: f64,
    /// Fuel per unit of thrust beyond the free threshold.
    pub multiplier: f64,
}

impl MovementCost {
    /// Fuel needed for a thrust of the given magnitude.
    #[must_use]
    pub fn price(&self, magnitude: f64) -> f64 {
        ((magnitude - self.free_threshold) * self.multiplier).max(0.0)
    }
}

/// Rock price of each purchasable ship class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipPrices {
    /// Fuel miner.
    pub sucker: i64,
    /// Rock miner.
    pub drill: i64,
    /// Fuel hauler.
    pub tanker: i64,
    /// Rock hauler.
    pub truck: i64,
    /// Armed ship.
    pub battleship: i64,
}

impl ShipPrices {
    /// Price of a class, `None` for classes that cannot be bought.
    #[must_use]
    pub const fn price(&self, class: ShipClass) -> Option<i64> {
        match class {
            ShipClass::Mothership => None,
            ShipClass::Sucker => Some(self.sucker),
            ShipClass::Drill => Some(self.drill),
            ShipClass::Tanker => Some(self.tanker),
            ShipClass::Truck => Some(self.truck),
            ShipClass::Battleship => Some(self.battleship),
        }
    }
}

impl Default for ShipPrices {
    fn default() -> Self {
        Self {
            sucker: 100,
            drill: 100,
            tanker: 100,
            truck: 100,
            battleship: 100,
        }
    }
}

/// Noise-driven asteroid drift.
///
/// Every round each asteroid moves by a shared flow vector plus a local
/// one, both unit directions read from a Perlin field and scaled here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsteroidDrift {
    /// Length of the flow vector shared by all asteroids.
    pub global_scale: f64,
    /// Length of the per-asteroid vector.
    pub individual_scale: f64,
    /// Maps world coordinates and rounds into noise space.
    pub noise_scale: f64,
}

impl AsteroidDrift {
    /// Asteroids stay where they are.
    pub const STILL: Self = Self {
        global_scale: 0.0,
        individual_scale: 0.0,
        noise_scale: 0.0,
    };

    /// Whether drift moves nothing.
    #[must_use]
    pub fn is_still(&self) -> bool {
        self.global_scale == 0.0 && self.individual_scale == 0.0
    }
}

impl Default for AsteroidDrift {
    fn default() -> Self {
        Self {
            global_scale: 2.0,
            individual_scale: 1.0,
            noise_scale: 0.01,
        }
    }
}

/// Complete rule set for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// World disc radius.
    pub radius: f64,
    /// Smallest randomly generated asteroid.
    pub min_asteroid_size: f64,
    /// Largest randomly generated asteroid, also the score normaliser.
    pub max_asteroid_size: f64,
    /// Asteroids generated at world creation.
    pub asteroid_count: u32,
    /// Wormhole pairs generated at world creation.
    pub wormhole_pairs: u32,
    /// How asteroids wander between rounds.
    pub asteroid_drift: AsteroidDrift,

    /// Health of a freshly built ship.
    pub ship_max_health: i32,
    /// Fuel of a freshly bought ship.
    pub ship_start_fuel: f64,
    /// Player rock stockpile at join.
    pub player_start_rock: i64,
    /// Player fuel stockpile at join.
    pub player_start_fuel: f64,
    /// Rock price of each ship class.
    pub ship_prices: ShipPrices,

    /// Movement cost for everything except haulers.
    pub movement: MovementCost,
    /// Movement cost for tankers and trucks.
    pub hauler_movement: MovementCost,
    /// Largest thrust a single move command may apply.
    pub max_move_magnitude: f64,

    /// Range for rock and fuel transfers between ships.
    pub transfer_distance: f64,
    /// Battleship weapon range.
    pub shoot_distance: f64,
    /// Damage per shot.
    pub shoot_damage: i32,
    /// Range from the mothership within which ships can be repaired.
    pub repair_distance: f64,
    /// Health restored per repair.
    pub repair_amount: i32,

    /// Range within which miners work an asteroid.
    pub mining_distance: f64,
    /// Material removed per mining ship per round.
    pub mining_amount: f64,
    /// Range within which ships contest asteroid ownership.
    pub conquering_distance: f64,
    /// Owned surface gained or removed per ship per round.
    pub conquering_rate: f64,
    /// Material contained per unit of asteroid surface.
    pub material_ratio: f64,
    /// Wreckage lands within this distance of the destroyed ship.
    pub wreck_spawn_offset: f64,

    /// Ships closer than this to a wormhole are teleported.
    pub wormhole_radius: f64,
    /// Distance from the target wormhole a teleported ship lands at.
    pub wormhole_teleport_distance: f64,

    /// Flat score per owned asteroid.
    pub score_base: f64,
    /// Exponential base of the ownership bonus.
    pub score_growth: f64,
    /// Owned percentage is divided by this before exponentiation.
    pub score_divisor: f64,

    /// Rounds played before the game ends.
    pub max_rounds: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            radius: 15_000.0,
            min_asteroid_size: 25.0,
            max_asteroid_size: 50.0,
            asteroid_count: 500,
            wormhole_pairs: 25,
            asteroid_drift: AsteroidDrift::default(),

            ship_max_health: 100,
            ship_start_fuel: 100.0,
            player_start_rock: 1000,
            player_start_fuel: 1000.0,
            ship_prices: ShipPrices::default(),

            movement: MovementCost {
                free_threshold: 1.0,
                multiplier: 1.0,
            },
            hauler_movement: MovementCost {
                free_threshold: 5.0,
                multiplier: 0.5,
            },
            max_move_magnitude: 10_000.0,

            transfer_distance: 20.0,
            shoot_distance: 100.0,
            shoot_damage: 25,
            repair_distance: 50.0,
            repair_amount: 30,

            mining_distance: 50.0,
            mining_amount: 10.0,
            conquering_distance: 50.0,
            conquering_rate: 10.0,
            material_ratio: 10.0,
            wreck_spawn_offset: 5.0,

            wormhole_radius: 5.0,
            wormhole_teleport_distance: 10.0,

            score_base: 50.0,
            score_growth: 1.5,
            score_divisor: 9.0,

            max_rounds: 1000,
        }
    }
}

impl GameConfig {
    /// Load a config from a RON file.
    ///
    /// Missing fields fall back to their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| GameError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_ron_str(&contents).map_err(|e| match e {
            GameError::DataParseError { message, .. } => GameError::DataParseError {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })?;
        tracing::info!(path = %path.display(), "Loaded game config");
        Ok(config)
    }

    /// Parse and validate a config from a RON string.
    pub fn from_ron_str(ron_str: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron_str).map_err(|e| GameError::DataParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Render the config as pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::Serialization(e.to_string()))
    }

    /// Reject settings the rules cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.radius > 0.0) {
            return Err(GameError::InvalidConfig(format!(
                "radius must be positive, got {}",
                self.radius
            )));
        }
        if !(self.min_asteroid_size > 0.0) || self.min_asteroid_size > self.max_asteroid_size {
            return Err(GameError::InvalidConfig(format!(
                "asteroid sizes must satisfy 0 < min <= max, got {}..{}",
                self.min_asteroid_size, self.max_asteroid_size
            )));
        }
        if !(self.material_ratio > 0.0) {
            return Err(GameError::InvalidConfig(
                "material_ratio must be positive".to_string(),
            ));
        }
        if self.ship_max_health <= 0 {
            return Err(GameError::InvalidConfig(
                "ship_max_health must be positive".to_string(),
            ));
        }
        let ranges = [
            ("transfer_distance", self.transfer_distance),
            ("shoot_distance", self.shoot_distance),
            ("repair_distance", self.repair_distance),
            ("mining_distance", self.mining_distance),
            ("conquering_distance", self.conquering_distance),
            ("wormhole_radius", self.wormhole_radius),
            ("wreck_spawn_offset", self.wreck_spawn_offset),
            ("max_move_magnitude", self.max_move_magnitude),
            ("mining_amount", self.mining_amount),
            ("conquering_rate", self.conquering_rate),
        ];
        for (name, value) in ranges {
            if !(value >= 0.0) {
                return Err(GameError::InvalidConfig(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        let drift = &self.asteroid_drift;
        for (name, value) in [
            ("global_scale", drift.global_scale),
            ("individual_scale", drift.individual_scale),
            ("noise_scale", drift.noise_scale),
        ] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(GameError::InvalidConfig(format!(
                    "asteroid_drift.{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if self.wormhole_teleport_distance < self.wormhole_radius {
            return Err(GameError::InvalidConfig(format!(
                "wormhole_teleport_distance ({}) must be at least wormhole_radius ({})",
                self.wormhole_teleport_distance, self.wormhole_radius
            )));
        }
        Ok(())
    }

    /// Movement cost table that applies to a ship class.
    #[must_use]
    pub const fn movement_for(&self, class: ShipClass) -> &MovementCost {
        if class.is_hauler() {
            &self.hauler_movement
        } else {
            &self.movement
        }
    }

    /// Fuel needed to apply a thrust of `magnitude` to a ship of `class`.
    #[must_use]
    pub fn movement_price(&self, magnitude: f64, class: ShipClass) -> f64 {
        self.movement_for(class).price(magnitude)
    }
}
