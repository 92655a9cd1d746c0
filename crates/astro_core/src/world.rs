//! The shared world and its entity factories.
//!
//! [`World`] owns every entity, the per-round ship ledger and the seeded
//! random source. Round processing lives in [`crate::simulation`]; this
//! module only builds, stores and looks things up.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::commands::ShipLedger;
use crate::components::{
    Asteroid, AsteroidId, Player, PlayerId, ResourceKind, Ship, ShipClass, ShipId, Wormhole,
    WormholeId, DEFAULT_PLAYER_COLOR,
};
use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::math::{size_for_material, Vec2};
use crate::rng::SimRng;

/// Complete game state.
///
/// Every mutation of shared state goes through methods on this type, and
/// all randomness comes from its own [`SimRng`], so two worlds built from
/// the same config and seed evolve identically under identical input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    config: GameConfig,
    seed: u64,
    round: u32,
    ships: Arena<Ship>,
    asteroids: Arena<Asteroid>,
    wormholes: Vec<Wormhole>,
    players: Vec<Player>,
    ledger: ShipLedger,
    rng: SimRng,
}

impl World {
    /// Create a world populated with random asteroids and wormhole pairs.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self> {
        let mut world = Self::empty(config, seed)?;
        for _ in 0..world.config.asteroid_count {
            world.spawn_random_asteroid();
        }
        for _ in 0..world.config.wormhole_pairs {
            world.spawn_wormhole_pair();
        }
        tracing::info!(
            seed,
            asteroids = world.asteroids.len(),
            wormholes = world.wormholes.len(),
            "World generated"
        );
        Ok(world)
    }

    /// Generate a world and join `roster` in order.
    ///
    /// This is the one setup sequence used by live games and replays, so
    /// both consume the random stream identically.
    pub fn with_roster<S: AsRef<str>>(config: GameConfig, seed: u64, roster: &[S]) -> Result<Self> {
        let mut world = Self::new(config, seed)?;
        for name in roster {
            world.add_player(name.as_ref())?;
        }
        Ok(world)
    }

    /// Create a world with no entities at all.
    pub fn empty(config: GameConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            seed,
            round: 0,
            ships: Arena::new(),
            asteroids: Arena::new(),
            wormholes: Vec::new(),
            players: Vec::new(),
            ledger: ShipLedger::default(),
            rng: SimRng::new(seed),
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Rule set in effect.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Seed the world was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// World disc radius.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.config.radius
    }

    /// Rounds completed so far.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Ship arena.
    #[must_use]
    pub const fn ships(&self) -> &Arena<Ship> {
        &self.ships
    }

    /// Asteroid arena.
    #[must_use]
    pub const fn asteroids(&self) -> &Arena<Asteroid> {
        &self.asteroids
    }

    /// All wormholes; pairs are adjacent.
    #[must_use]
    pub fn wormholes(&self) -> &[Wormhole] {
        &self.wormholes
    }

    /// Players in join order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// This round's ship ledger.
    #[must_use]
    pub const fn ledger(&self) -> &ShipLedger {
        &self.ledger
    }

    /// Ship by ID, if its slot is occupied.
    #[must_use]
    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.ships.get(id.0)
    }

    /// Mutable ship by ID.
    pub fn ship_mut(&mut self, id: ShipId) -> Option<&mut Ship> {
        self.ships.get_mut(id.0)
    }

    /// Asteroid by ID, if its slot is occupied.
    #[must_use]
    pub fn asteroid(&self, id: AsteroidId) -> Option<&Asteroid> {
        self.asteroids.get(id.0)
    }

    /// Mutable asteroid by ID.
    pub fn asteroid_mut(&mut self, id: AsteroidId) -> Option<&mut Asteroid> {
        self.asteroids.get_mut(id.0)
    }

    /// Wormhole by ID.
    #[must_use]
    pub fn wormhole(&self, id: WormholeId) -> Option<&Wormhole> {
        self.wormholes.get(id.0)
    }

    /// Player by ID.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.0)
    }

    /// Mutable player by ID.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id.0)
    }

    /// Player by display name.
    #[must_use]
    pub fn player_by_name(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub(crate) fn ships_mut(&mut self) -> &mut Arena<Ship> {
        &mut self.ships
    }

    pub(crate) fn asteroids_mut(&mut self) -> &mut Arena<Asteroid> {
        &mut self.asteroids
    }

    pub(crate) fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    pub(crate) fn ledger_mut(&mut self) -> &mut ShipLedger {
        &mut self.ledger
    }

    pub(crate) fn rng_mut(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    pub(crate) fn advance_round(&mut self) {
        self.round += 1;
    }

    // ------------------------------------------------------------------
    // Factories
    // ------------------------------------------------------------------

    /// Spawn an unowned asteroid with random position, kind and size.
    pub fn spawn_random_asteroid(&mut self) -> AsteroidId {
        let radius = self.config.radius;
        let position = self.rng.random_position(radius);
        let kind = if self.rng.random_bool() {
            ResourceKind::Fuel
        } else {
            ResourceKind::Rock
        };
        let size = self
            .rng
            .random_float(self.config.min_asteroid_size, self.config.max_asteroid_size);
        self.spawn_asteroid(position, kind, size)
    }

    /// Spawn an unowned asteroid with explicit parameters.
    pub fn spawn_asteroid(&mut self, position: Vec2, kind: ResourceKind, size: f64) -> AsteroidId {
        let id = AsteroidId(self.asteroids.next_index());
        self.asteroids.insert(Asteroid::new(id, position, kind, size));
        id
    }

    /// Turn a dying ship's cargo of `kind` into an asteroid near its last position.
    ///
    /// The wreck belongs to the ship's owner with its full surface. Nothing
    /// is spawned when the ship carried none of that resource.
    pub fn spawn_wreck(&mut self, ship: &Ship, kind: ResourceKind) -> Option<AsteroidId> {
        let material = match kind {
            ResourceKind::Fuel => ship.fuel,
            ResourceKind::Rock => ship.rock as f64,
        };
        let size = size_for_material(material, self.config.material_ratio);
        if !(size > 0.0) {
            return None;
        }

        let offset = self.config.wreck_spawn_offset;
        let position = self.rng.random_offset(ship.position, offset);
        let id = self.spawn_asteroid(position, kind, size);
        if let Some(asteroid) = self.asteroids.get_mut(id.0) {
            asteroid.owner = Some(ship.owner);
            asteroid.owned_surface = asteroid.total_surface();
        }
        tracing::debug!(ship = %ship.id, asteroid = %id, ?kind, size, "Wreck spawned");
        Some(id)
    }

    /// Spawn two wormholes at random positions, each targeting the other.
    pub fn spawn_wormhole_pair(&mut self) -> (WormholeId, WormholeId) {
        let radius = self.config.radius;
        let first_pos = self.rng.random_position(radius);
        let second_pos = self.rng.random_position(radius);
        self.spawn_wormhole_pair_at(first_pos, second_pos)
    }

    /// Spawn a linked wormhole pair at fixed positions.
    pub fn spawn_wormhole_pair_at(&mut self, first: Vec2, second: Vec2) -> (WormholeId, WormholeId) {
        let a = WormholeId(self.wormholes.len());
        let b = WormholeId(a.0 + 1);
        self.wormholes.push(Wormhole {
            id: a,
            target_id: b,
            position: first,
        });
        self.wormholes.push(Wormhole {
            id: b,
            target_id: a,
            position: second,
        });
        (a, b)
    }

    /// Add a ship owned by `owner` at `position`.
    ///
    /// Fresh ships start at full health with the standard fuel load.
    pub fn spawn_ship(&mut self, owner: PlayerId, class: ShipClass, position: Vec2) -> ShipId {
        let id = ShipId(self.ships.next_index());
        let fuel = if class == ShipClass::Mothership {
            0.0
        } else {
            self.config.ship_start_fuel
        };
        let ship = Ship::new(id, owner, class, position, self.config.ship_max_health, fuel);
        self.ships.insert(ship);
        id
    }

    /// Join a new player and give them a mothership at a random position.
    pub fn add_player(&mut self, name: impl Into<String>) -> Result<PlayerId> {
        let name = name.into();
        if self.player_by_name(&name).is_some() {
            return Err(GameError::DuplicatePlayerName(name));
        }

        let id = PlayerId(self.players.len());
        let position = self.rng.random_position(self.config.radius);
        let mothership = self.spawn_ship(id, ShipClass::Mothership, position);
        self.players.push(Player {
            id,
            name,
            color: DEFAULT_PLAYER_COLOR.to_string(),
            mothership,
            rock: self.config.player_start_rock,
            fuel: self.config.player_start_fuel,
            alive: true,
            score: 0,
        });
        tracing::info!(player = %id, ship = %mothership, "Player joined");
        Ok(id)
    }

    /// Stop soliciting commands from a player. Their entities stay.
    pub fn mark_player_dead(&mut self, id: PlayerId) -> Result<()> {
        let player = self
            .players
            .get_mut(id.0)
            .ok_or(GameError::UnknownPlayer(id))?;
        if player.alive {
            player.alive = false;
            tracing::info!(player = %id, name = %player.name, "Player marked dead");
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Stockpile routing
    // ------------------------------------------------------------------

    /// Rock a ship can hand over. A mothership draws on the owner's stockpile.
    #[must_use]
    pub fn available_rock(&self, ship: &Ship) -> i64 {
        if ship.is_mothership() {
            self.player(ship.owner).map_or(0, |p| p.rock)
        } else {
            ship.rock
        }
    }

    /// Fuel a ship can spend or hand over. A mothership draws on the owner's stockpile.
    #[must_use]
    pub fn available_fuel(&self, ship: &Ship) -> f64 {
        if ship.is_mothership() {
            self.player(ship.owner).map_or(0.0, |p| p.fuel)
        } else {
            ship.fuel
        }
    }

    pub(crate) fn add_rock(&mut self, id: ShipId, delta: i64) {
        let Some(ship) = self.ships.get_mut(id.0) else {
            return;
        };
        if ship.is_mothership() {
            let owner = ship.owner;
            if let Some(player) = self.players.get_mut(owner.0) {
                player.rock += delta;
            }
        } else {
            ship.rock += delta;
        }
    }

    pub(crate) fn add_fuel(&mut self, id: ShipId, delta: f64) {
        let Some(ship) = self.ships.get_mut(id.0) else {
            return;
        };
        if ship.is_mothership() {
            let owner = ship.owner;
            if let Some(player) = self.players.get_mut(owner.0) {
                player.fuel += delta;
            }
        } else {
            ship.fuel += delta;
        }
    }

    // ------------------------------------------------------------------
    // Game lifecycle
    // ------------------------------------------------------------------

    /// Whether another round should be played.
    #[must_use]
    pub fn should_continue(&self) -> bool {
        self.round < self.config.max_rounds
    }

    /// Final standings as `(name, score)` in join order.
    #[must_use]
    pub fn scores(&self) -> Vec<(String, i64)> {
        self.players
            .iter()
            .map(|p| (p.name.clone(), p.score))
            .collect()
    }

    /// Compute a hash of the entire world state.
    ///
    /// Covers every entity field, stockpiles, scores and the round counter.
    /// Floats are hashed by bit pattern, so any divergence shows up.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.round.hash(&mut hasher);

        self.ships.slot_count().hash(&mut hasher);
        for (id, ship) in self.ships.iter() {
            id.hash(&mut hasher);
            ship.owner.hash(&mut hasher);
            hash_vec(ship.position, &mut hasher);
            hash_vec(ship.velocity, &mut hasher);
            ship.health.hash(&mut hasher);
            ship.fuel.to_bits().hash(&mut hasher);
            ship.rock.hash(&mut hasher);
            ship.class.hash(&mut hasher);
        }

        self.asteroids.slot_count().hash(&mut hasher);
        for (id, asteroid) in self.asteroids.iter() {
            id.hash(&mut hasher);
            hash_vec(asteroid.position, &mut hasher);
            hash_vec(asteroid.velocity, &mut hasher);
            asteroid.kind.hash(&mut hasher);
            asteroid.size.to_bits().hash(&mut hasher);
            asteroid.owner.hash(&mut hasher);
            asteroid.owned_surface.to_bits().hash(&mut hasher);
        }

        for wormhole in &self.wormholes {
            wormhole.target_id.hash(&mut hasher);
            hash_vec(wormhole.position, &mut hasher);
        }

        for player in &self.players {
            player.name.hash(&mut hasher);
            player.rock.hash(&mut hasher);
            player.fuel.to_bits().hash(&mut hasher);
            player.alive.hash(&mut hasher);
            player.score.hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Serialize the whole world, RNG state included.
    pub fn save_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::Serialization(format!("Failed to serialize world: {e}")))
    }

    /// Restore a world produced by [`save_bytes`](Self::save_bytes).
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::Serialization(format!("Failed to deserialize world: {e}")))
    }
}

fn hash_vec(v: Vec2, hasher: &mut DefaultHasher) {
    v.x.to_bits().hash(hasher);
    v.y.to_bits().hash(hasher);
}
