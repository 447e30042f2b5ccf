use crate::math::{Scalar, Vector};
use core::ops::Mul;

/// A counterclockwise 2D rotation stored as the cosine and sine of the
/// rotation angle, i.e. a unit complex number.
///
/// Rotating local anchor points into world space is the single most common
/// operation in the solver, so the trigonometry is paid once per tick when
/// the rotation is constructed, not per rotated vector.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Rotation {
    /// The cosine of the rotation angle.
    ///
    /// This is the real part of the unit complex number representing the rotation.
    pub cos: Scalar,
    /// The sine of the rotation angle.
    ///
    /// This is the imaginary part of the unit complex number representing the rotation.
    pub sin: Scalar,
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Rotation {
    /// No rotation.
    pub const IDENTITY: Self = Self { cos: 1.0, sin: 0.0 };

    /// Creates a [`Rotation`] from a counterclockwise angle in radians.
    #[inline]
    pub fn radians(radians: Scalar) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::from_sin_cos(sin, cos)
    }

    /// Creates a [`Rotation`] from a counterclockwise angle in degrees.
    #[inline]
    pub fn degrees(degrees: Scalar) -> Self {
        Self::radians(degrees.to_radians())
    }

    /// Creates a [`Rotation`] from the sine and cosine of an angle.
    ///
    /// The rotation is only valid if `sin * sin + cos * cos == 1.0`.
    #[inline]
    pub const fn from_sin_cos(sin: Scalar, cos: Scalar) -> Self {
        Self { cos, sin }
    }

    /// Returns the rotation angle in radians, in the `(-π, π]` range.
    #[inline]
    pub fn as_radians(self) -> Scalar {
        self.sin.atan2(self.cos)
    }

    /// Returns the inverse rotation.
    #[inline]
    pub fn inverse(self) -> Self {
        Self {
            cos: self.cos,
            sin: -self.sin,
        }
    }
}

impl Mul<Vector> for Rotation {
    type Output = Vector;

    /// Rotates the given vector by `self`.
    #[inline]
    fn mul(self, rhs: Vector) -> Self::Output {
        Vector::new(
            self.cos * rhs.x - self.sin * rhs.y,
            self.sin * rhs.x + self.cos * rhs.y,
        )
    }
}

impl Mul<Rotation> for Rotation {
    type Output = Rotation;

    /// Composes the two rotations.
    #[inline]
    fn mul(self, rhs: Rotation) -> Self::Output {
        Self {
            cos: self.cos * rhs.cos - self.sin * rhs.sin,
            sin: self.sin * rhs.cos + self.cos * rhs.sin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::PI;
    use approx::assert_relative_eq;

    #[test]
    fn rotates_vectors_counterclockwise() {
        let rot = Rotation::radians(PI / 2.0);
        let rotated = rot * Vector::X;
        assert_relative_eq!(rotated, Vector::Y, epsilon = 1.0e-6);
    }

    #[test]
    fn inverse_undoes_rotation() {
        let rot = Rotation::radians(0.73);
        let v = Vector::new(1.5, -2.0);
        assert_relative_eq!(rot.inverse() * (rot * v), v, epsilon = 1.0e-6);
    }

    #[test]
    fn as_radians_round_trips() {
        for angle in [-2.5, -0.3, 0.0, 0.8, 3.0] {
            assert_relative_eq!(Rotation::radians(angle).as_radians(), angle, epsilon = 1.0e-6);
        }
    }
}
