//! Math types and helpers used by the solver.
//!
//! The scalar, vector, and matrix types are precision-dependent aliases,
//! selected by the `f32`/`f64` cargo features.

#[cfg(feature = "f32")]
mod single;
#[cfg(feature = "f32")]
pub use single::*;

#[cfg(feature = "f64")]
mod double;
#[cfg(feature = "f64")]
pub use double::*;

mod matrix;
mod rotation;

pub use matrix::SymmetricMatrix3;
pub use rotation::Rotation;

/// The 2D scalar cross product, also known as the perpendicular dot product.
///
/// `cross(a, b) = a.x * b.y - a.y * b.x`
#[inline]
pub fn cross(a: Vector, b: Vector) -> Scalar {
    a.perp_dot(b)
}

/// The cross product of a scalar and a 2D vector.
///
/// `cross_scalar(s, v) = s * (-v.y, v.x)`
#[inline]
pub fn cross_scalar(s: Scalar, v: Vector) -> Vector {
    Vector::new(-s * v.y, s * v.x)
}

/// Solves `K * x = b` for a 2x2 matrix `K`, returning a zero vector
/// when `K` is singular.
///
/// Unlike computing the matrix inverse up front, this stays well-defined
/// for degenerate effective masses, such as two bodies that cannot rotate.
#[inline]
pub(crate) fn solve22(k: Matrix2, b: Vector) -> Vector {
    let a11 = k.x_axis.x;
    let a12 = k.y_axis.x;
    let a21 = k.x_axis.y;
    let a22 = k.y_axis.y;

    let det = a11 * a22 - a12 * a21;
    let inv_det = det.recip_or_zero();

    Vector::new(
        inv_det * (a22 * b.x - a12 * b.y),
        inv_det * (a11 * b.y - a21 * b.x),
    )
}

/// An extension trait for computing reciprocals without division by zero.
pub trait RecipOrZero {
    /// Computes the reciprocal of `self` if `self` is not zero,
    /// and returns zero otherwise to avoid division by zero.
    fn recip_or_zero(self) -> Self;
}

impl RecipOrZero for Scalar {
    #[inline]
    fn recip_or_zero(self) -> Self {
        if self != 0.0 {
            self.recip()
        } else {
            0.0
        }
    }
}
