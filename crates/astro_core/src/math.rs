//! 2D vector math for positions and velocities.
//!
//! All world coordinates are plain `f64`. Determinism comes from running
//! the same operations in the same order on the same seeded inputs, so
//! nothing in here may depend on global state.

use serde::{Deserialize, Serialize};

/// A 2D point or displacement in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Vec2 {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Zero vector (also the world origin).
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Euclidean distance between two points.
    ///
    /// Uses `hypot`, so huge but finite offsets do not overflow to infinity.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Length of the vector, i.e. its distance from the origin.
    #[must_use]
    pub fn magnitude(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Multiply both components by `factor`.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Unit vector in the same direction.
    ///
    /// The zero vector normalizes to itself instead of dividing by zero.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.magnitude();
        if len == 0.0 {
            return Self::ZERO;
        }
        Self::new(self.x / len, self.y / len)
    }

    /// Unit vector pointing at `angle` radians from the +X axis.
    #[must_use]
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    /// Whether both components are exactly zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Rescale so the magnitude does not exceed `max`, keeping direction.
    ///
    /// Components are divided by the larger of the two before the length is
    /// taken, so any finite vector comes out at exactly `max`.
    #[must_use]
    pub fn clamp_magnitude(self, max: f64) -> Self {
        let len = self.magnitude();
        if len <= max || len == 0.0 {
            return self;
        }
        let largest = self.x.abs().max(self.y.abs());
        let unit = Self::new(self.x / largest, self.y / largest).normalize();
        unit.scale(max)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Surface area of a disc with the given radius.
#[must_use]
pub fn disc_surface(size: f64) -> f64 {
    size * size * std::f64::consts::PI
}

/// Radius of a disc holding `material` at the given material-per-surface ratio.
///
/// Inverse of `disc_surface(size) * ratio`.
#[must_use]
pub fn size_for_material(material: f64, ratio: f64) -> f64 {
    if material <= 0.0 || ratio <= 0.0 {
        return 0.0;
    }
    (material / ratio / std::f64::consts::PI).sqrt()
}
