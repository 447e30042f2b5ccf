use crate::math::{RecipOrZero, Scalar, Vector, Vector3};

/// The bottom left triangle (including the diagonal) of a symmetric 3x3
/// column-major matrix.
///
/// Effective-mass matrices of three-degree-of-freedom constraints are always
/// symmetric, so only six of the nine elements need to be stored. The solve
/// methods mirror the usual constraint-solver conventions: singular systems
/// yield zero impulses instead of propagating infinities.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SymmetricMatrix3 {
    /// The first element of the first column.
    pub m00: Scalar,
    /// The second element of the first column.
    pub m01: Scalar,
    /// The third element of the first column.
    pub m02: Scalar,
    /// The second element of the second column.
    pub m11: Scalar,
    /// The third element of the second column.
    pub m12: Scalar,
    /// The third element of the third column.
    pub m22: Scalar,
}

impl SymmetricMatrix3 {
    /// A symmetric 3x3 matrix with all elements set to `0.0`.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);

    /// Creates a new symmetric 3x3 matrix from its bottom left triangle,
    /// including diagonal elements.
    ///
    /// The elements are in column-major order `mCR`, where `C` is the column
    /// index and `R` is the row index.
    #[inline]
    #[must_use]
    pub const fn new(
        m00: Scalar,
        m01: Scalar,
        m02: Scalar,
        m11: Scalar,
        m12: Scalar,
        m22: Scalar,
    ) -> Self {
        Self {
            m00,
            m01,
            m02,
            m11,
            m12,
            m22,
        }
    }

    /// Returns the columns of the matrix.
    #[inline]
    fn columns(&self) -> [Vector3; 3] {
        [
            Vector3::new(self.m00, self.m01, self.m02),
            Vector3::new(self.m01, self.m11, self.m12),
            Vector3::new(self.m02, self.m12, self.m22),
        ]
    }

    /// Solves `A * x = b`, returning a zero vector when `A` is singular.
    #[inline]
    #[must_use]
    pub fn solve33(&self, b: Vector3) -> Vector3 {
        let [ex, ey, ez] = self.columns();

        let det = ex.dot(ey.cross(ez)).recip_or_zero();

        Vector3::new(
            det * b.dot(ey.cross(ez)),
            det * ex.dot(b.cross(ez)),
            det * ex.dot(ey.cross(b)),
        )
    }

    /// Solves `A * x = b` using only the upper left 2x2 block of the matrix,
    /// returning a zero vector when the block is singular.
    #[inline]
    #[must_use]
    pub fn solve22(&self, b: Vector) -> Vector {
        let det = (self.m00 * self.m11 - self.m01 * self.m01).recip_or_zero();

        Vector::new(
            det * (self.m11 * b.x - self.m01 * b.y),
            det * (self.m00 * b.y - self.m01 * b.x),
        )
    }

    /// Returns the inverse of the upper left 2x2 block, with the remaining
    /// row and column zeroed.
    ///
    /// This is used when the rotational degree of freedom is solved
    /// separately, or not at all.
    #[inline]
    #[must_use]
    pub fn inverse22(&self) -> Self {
        let det = (self.m00 * self.m11 - self.m01 * self.m01).recip_or_zero();

        Self::new(det * self.m11, -det * self.m01, 0.0, det * self.m00, 0.0, 0.0)
    }

    /// Returns the inverse of the full matrix, which is also symmetric.
    ///
    /// Returns [`Self::ZERO`] when the matrix is singular.
    #[inline]
    #[must_use]
    pub fn sym_inverse33(&self) -> Self {
        let [ex, ey, ez] = self.columns();

        let det = ex.dot(ey.cross(ez)).recip_or_zero();

        let Self {
            m00: a11,
            m01: a12,
            m02: a13,
            m11: a22,
            m12: a23,
            m22: a33,
        } = *self;

        Self::new(
            det * (a22 * a33 - a23 * a23),
            det * (a13 * a23 - a12 * a33),
            det * (a12 * a23 - a13 * a22),
            det * (a11 * a33 - a13 * a13),
            det * (a13 * a12 - a11 * a23),
            det * (a11 * a22 - a12 * a12),
        )
    }

    /// Multiplies the upper left 2x2 block of the matrix by the given vector.
    #[inline]
    #[must_use]
    pub fn mul22(&self, rhs: Vector) -> Vector {
        Vector::new(
            self.m00 * rhs.x + self.m01 * rhs.y,
            self.m01 * rhs.x + self.m11 * rhs.y,
        )
    }

    /// Multiplies the matrix by the given vector.
    #[inline]
    #[must_use]
    pub fn mul_vector3(&self, rhs: Vector3) -> Vector3 {
        let [ex, ey, ez] = self.columns();
        ex * rhs.x + ey * rhs.y + ez * rhs.z
    }
}
