//! Fixed-point math utilities for deterministic decisions.
//!
//! Positions, health and danger scores are all fixed-point so that two
//! agents fed the same snapshot rank threats and cluster resources
//! identically on every platform.

use fixed::traits::ToFixed;
use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all engine math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Fixed-point 2D point on the playable map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point point.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a point from any numeric type the `fixed` crate can convert.
    ///
    /// Intended for host adapters and tests; engine code stays fixed-point.
    #[must_use]
    pub fn from_num<T: ToFixed>(x: T, y: T) -> Self {
        Self {
            x: Fixed::from_num(x),
            y: Fixed::from_num(y),
        }
    }

    /// The origin.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// Whether `other` lies strictly within `radius` of this point.
    #[must_use]
    pub fn is_within(self, other: Self, radius: Fixed) -> bool {
        self.distance_squared(other) < radius.saturating_mul(radius)
    }

    /// Linearly interpolate between two points.
    #[must_use]
    pub fn lerp(self, other: Self, t: Fixed) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Point halfway between two points.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        self.lerp(other, Fixed::from_num(1) / Fixed::from_num(2))
    }

    /// Translate by an offset.
    #[must_use]
    pub fn offset(self, dx: Fixed, dy: Fixed) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Multiply both coordinates by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Divide both coordinates by a scalar. Returns `self` for a zero divisor.
    #[must_use]
    pub fn div_scalar(self, divisor: Fixed) -> Self {
        if divisor == Fixed::ZERO {
            return self;
        }
        Self {
            x: self.x / divisor,
            y: self.y / divisor,
        }
    }
}

/// Computes the square root of a fixed-point number using binary search.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::from_num(1) {
        value
    } else {
        Fixed::from_num(1)
    };

    for _ in 0..48 {
        let mid = (low + high) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

/// Convert an integer percentage into a fixed-point fraction.
#[must_use]
pub fn percent(value: u32) -> Fixed {
    Fixed::from_num(value) / Fixed::from_num(100)
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_distance_squared() {
        let a = Vec2Fixed::from_num(3, 0);
        let b = Vec2Fixed::from_num(0, 4);
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
    }

    #[test]
    fn test_vec2_distance() {
        let a = Vec2Fixed::from_num(3, 0);
        let b = Vec2Fixed::from_num(0, 4);
        let epsilon = Fixed::from_num(1) / Fixed::from_num(10000);
        assert!((a.distance(b) - Fixed::from_num(5)).abs() < epsilon);
    }

    #[test]
    fn test_is_within_is_strict() {
        let a = Vec2Fixed::ZERO;
        let b = Vec2Fixed::from_num(20, 0);
        assert!(!a.is_within(b, Fixed::from_num(20)));
        assert!(a.is_within(b, Fixed::from_num(21)));
    }

    #[test]
    fn test_vec2_lerp() {
        let a = Vec2Fixed::ZERO;
        let b = Vec2Fixed::from_num(10, 20);
        assert_eq!(a.lerp(b, Fixed::from_num(0.5)), Vec2Fixed::from_num(5, 10));
        assert_eq!(a.midpoint(b), Vec2Fixed::from_num(5, 10));
    }

    #[test]
    fn test_running_average_step() {
        // (c * n + p) / (n + 1) with n = 1
        let c = Vec2Fixed::from_num(10, 10);
        let p = Vec2Fixed::from_num(20, 30);
        let n = Fixed::from_num(1);
        let avg = (c.scale(n) + p).div_scalar(n + Fixed::from_num(1));
        assert_eq!(avg, Vec2Fixed::from_num(15, 20));
    }

    #[test]
    fn test_div_scalar_by_zero_is_identity() {
        let p = Vec2Fixed::from_num(7, -3);
        assert_eq!(p.div_scalar(Fixed::ZERO), p);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(50), Fixed::from_num(0.5));
        assert_eq!(percent(100), Fixed::from_num(1));
    }

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a * Fixed::from_num(7), b * Fixed::from_num(7));
    }
}
