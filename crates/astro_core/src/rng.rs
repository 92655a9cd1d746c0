//! Seeded randomness for world generation and teleports.
//!
//! Each [`World`](crate::world::World) owns exactly one generator, so a
//! recorded seed plus the recorded command batches reproduce a whole game.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Deterministic random source owned by the world.
///
/// Serializable so that saved worlds resume the exact same stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimRng {
    inner: Xoshiro256PlusPlus,
}

impl SimRng {
    /// Create a generator from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Uniform float in `[min, max)`.
    ///
    /// A degenerate range returns `min` exactly.
    pub fn random_float(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        self.inner.gen::<f64>() * (max - min) + min
    }

    /// Fair coin flip.
    pub fn random_bool(&mut self) -> bool {
        self.inner.gen::<bool>()
    }

    /// Random point with each coordinate uniform in `[-radius, radius]`.
    ///
    /// This samples the bounding square of the world disc, not the disc
    /// itself; corners outside the disc are reachable.
    pub fn random_position(&mut self, radius: f64) -> Vec2 {
        let x = self.random_float(-radius, radius);
        let y = self.random_float(-radius, radius);
        Vec2::new(x, y)
    }

    /// Unit vector in a uniformly random direction.
    pub fn random_direction(&mut self) -> Vec2 {
        let angle = self.random_float(0.0, std::f64::consts::TAU);
        Vec2::from_angle(angle)
    }

    /// Random point within `max_offset` of `origin`.
    pub fn random_offset(&mut self, origin: Vec2, max_offset: f64) -> Vec2 {
        let direction = self.random_direction();
        let distance = self.random_float(0.0, max_offset);
        origin + direction.scale(distance)
    }
}
