//! Fixed-point math utilities for deterministic simulation.
//!
//! All battle math uses fixed-point arithmetic so that a battle replayed
//! in the same process with the same inputs produces bit-identical
//! results. Combat only ever looks at the ground plane (x/z); height is
//! carried separately and never feeds back into targeting or damage.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// A point or direction on the ground plane.
///
/// `x` runs along the axis separating the two armies, `z` across the
/// battlefield. Layout offsets reuse this type in a side-local frame
/// (`x` lateral, `z` depth).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Z coordinate.
    #[serde(with = "fixed_serde")]
    pub z: Fixed,
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

/// Serde support for fixed-point numbers in human-edited files.
///
/// Config and scenario files write `1.5` rather than `6442450944`. The
/// conversion happens once at load time; simulation math never sees a
/// float.
pub mod decimal_serde {
    use super::Fixed;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.to_num::<f64>())
    }

    /// Deserialize a decimal into a fixed-point number.
    ///
    /// Rejects NaN and values outside the `Fixed` range.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| D::Error::custom(format!("{value} is not representable as Fixed")))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, z: Fixed) -> Self {
        Self { x, z }
    }

    /// Create a vector from whole numbers.
    #[must_use]
    pub fn from_ints(x: i32, z: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(z))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        z: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    ///
    /// Saturates at `Fixed::MAX` instead of overflowing, so far-apart
    /// points still compare as far apart.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let d = self - other;
        d.dot(d)
    }

    /// Euclidean distance on the ground plane.
    ///
    /// Symmetric by construction: the squared terms are identical for
    /// `a - b` and `b - a`.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        (self - other).length()
    }

    /// Dot product of two vectors, saturating.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.z.saturating_mul(other.z))
    }

    /// Length of the vector.
    #[must_use]
    pub fn length(self) -> Fixed {
        let sq = self.dot(self);
        if sq < Fixed::MAX {
            return fixed_sqrt(sq);
        }
        // Square is out of range: measure the half vector instead.
        let two = Fixed::from_num(2);
        Self::new(self.x / two, self.z / two)
            .length()
            .saturating_mul(two)
    }

    /// Normalize vector using fixed-point math.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.z / len)
    }

    /// Move from `self` toward `target` by at most `step`.
    ///
    /// Never overshoots: if the target is closer than `step`, the result
    /// is the target itself.
    #[must_use]
    pub fn step_toward(self, target: Self, step: Fixed) -> Self {
        let diff = target - self;
        let len = diff.length();
        if len == Fixed::ZERO || step <= Fixed::ZERO {
            return self;
        }
        if len <= step {
            return target;
        }

        // Multiply before dividing so whole-number steps stay exact.
        Self::new(
            self.x.saturating_add(diff.x.saturating_mul(step) / len),
            self.z.saturating_add(diff.z.saturating_mul(step) / len),
        )
    }
}

/// Computes the square root of a fixed-point number using binary search.
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    // Invariant: low² <= value < high².
    let mut low = Fixed::ZERO;
    let mut high = value.max(Fixed::ONE).saturating_add(Fixed::ONE);

    // 64 halvings exhaust the 64-bit representation for any input.
    for _ in 0..64 {
        let mid = low + (high - low) / Fixed::from_num(2);
        if mid == low {
            break;
        }
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_add(rhs.x),
            z: self.z.saturating_add(rhs.z),
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_sub(rhs.x),
            z: self.z.saturating_sub(rhs.z),
        }
    }
}
