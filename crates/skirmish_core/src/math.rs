//! Fixed-point math utilities for deterministic simulation.
//!
//! All simulation quantities use fixed-point arithmetic so that two
//! matches fed the same inputs produce bit-identical state on any CPU.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Fixed-point 3D vector in world space.
///
/// `y` is the vertical axis; the grid lies in the `x`/`z` plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec3Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y (vertical) coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
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

/// Serde support for hand-edited fixed-point values.
///
/// Config files are written by people, so values are stored as plain
/// decimals (`16.0`, `0.3`) and converted at the boundary. Simulation
/// code never sees the float.
pub mod fixed_decimal {
    use super::Fixed;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.to_num::<f64>())
    }

    /// Deserialize a decimal into a fixed-point number.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| D::Error::custom(format!("{value} is out of fixed-point range")))
    }
}

/// Serde support for hand-edited vectors, stored as `(x, y, z)` decimals.
pub mod vec3_decimal {
    use super::{Fixed, Vec3Fixed};
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a vector as a decimal triple.
    pub fn serialize<S>(value: &Vec3Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (
            value.x.to_num::<f64>(),
            value.y.to_num::<f64>(),
            value.z.to_num::<f64>(),
        )
            .serialize(serializer)
    }

    /// Deserialize a decimal triple into a vector.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec3Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (x, y, z) = <(f64, f64, f64)>::deserialize(deserializer)?;
        let convert = |v: f64| {
            Fixed::checked_from_num(v)
                .ok_or_else(|| D::Error::custom(format!("{v} is out of fixed-point range")))
        };
        Ok(Vec3Fixed::new(convert(x)?, convert(y)?, convert(z)?))
    }
}

impl Vec3Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Self { x, y, z }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
        z: Fixed::ZERO,
    };

    /// Unit scale vector.
    pub const ONE: Self = Self {
        x: Fixed::ONE,
        y: Fixed::ONE,
        z: Fixed::ONE,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    ///
    /// Saturates at [`Fixed::MAX`] for positions too far apart to
    /// represent, so far-flung units compare as out of range.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x.saturating_sub(other.x);
        let dy = self.y.saturating_sub(other.y);
        let dz = self.z.saturating_sub(other.z);
        dx.saturating_mul(dx)
            .saturating_add(dy.saturating_mul(dy))
            .saturating_add(dz.saturating_mul(dz))
    }

    /// Straight-line Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// Linearly interpolate between two vectors, saturating per axis.
    #[must_use]
    pub fn lerp(self, other: Self, t: Fixed) -> Self {
        let axis = |from: Fixed, to: Fixed| {
            from.saturating_add(to.saturating_sub(from).saturating_mul(t))
        };
        Self {
            x: axis(self.x, other.x),
            y: axis(self.y, other.y),
            z: axis(self.z, other.z),
        }
    }

    /// Copy of this vector with a different vertical coordinate.
    #[must_use]
    pub const fn with_y(self, y: Fixed) -> Self {
        Self { y, ..self }
    }

    /// Whether two positions fall within the same horizontal cell of the
    /// given size (strictly less than half a cell apart on X and Z).
    #[must_use]
    pub fn same_cell(self, other: Self, cell_size: Fixed) -> bool {
        let half = cell_size / Fixed::from_num(2);
        self.x.saturating_sub(other.x).saturating_abs() < half
            && self.z.saturating_sub(other.z).saturating_abs() < half
    }
}

/// Computes the square root of a fixed-point number using binary search.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::ONE { value } else { Fixed::ONE };

    for _ in 0..64 {
        let mid = low + (high - low) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

/// Component-wise, saturating at the edges of the numeric range.
impl std::ops::Add for Vec3Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_add(rhs.x),
            y: self.y.saturating_add(rhs.y),
            z: self.z.saturating_add(rhs.z),
        }
    }
}

/// Component-wise, saturating at the edges of the numeric range.
impl std::ops::Sub for Vec3Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_sub(rhs.x),
            y: self.y.saturating_sub(rhs.y),
            z: self.z.saturating_sub(rhs.z),
        }
    }
}
