//! The rigid-body state consumed by the joint solver.
//!
//! Bodies are owned by the outer physics step. The solver reads mass
//! properties and transforms from [`RigidBody`] snapshots when constraints
//! are initialized, and reads/writes velocities and positions through the
//! island arrays in [`SolverData`](crate::dynamics::solver::SolverData)
//! during solving.

use crate::math::{RecipOrZero, Rotation, Scalar, Vector};

/// An opaque handle identifying a rigid body.
///
/// The value is assigned by the caller and doubles as the index into the
/// caller's body storage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyId(pub u32);

impl BodyId {
    /// Returns the handle as a `usize` index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A snapshot of the rigid-body state the joint solver needs.
///
/// The linear and angular velocities are deliberately *not* stored here.
/// They live in the island's velocity arrays so that the hot solving loop
/// touches contiguous memory instead of chasing per-body references.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidBody {
    /// The world-space position of the body origin.
    pub position: Vector,
    /// The world-space rotation of the body.
    pub rotation: Rotation,
    /// The inverse mass of the body. Zero for static bodies.
    pub inv_mass: Scalar,
    /// The inverse rotational inertia of the body. Zero for bodies that cannot rotate.
    pub inv_angular_inertia: Scalar,
    /// The center of mass in the body's local frame.
    ///
    /// Currently always the origin for bodies produced by the outer step,
    /// but carried explicitly so the anchor math stays correct if that changes.
    pub local_center: Vector,
    /// The island-local index of the body.
    ///
    /// Only stable for the current tick.
    pub island_index: usize,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new()
    }
}

impl RigidBody {
    /// Creates a new static body at the origin.
    pub const fn new() -> Self {
        Self {
            position: Vector::ZERO,
            rotation: Rotation::IDENTITY,
            inv_mass: 0.0,
            inv_angular_inertia: 0.0,
            local_center: Vector::ZERO,
            island_index: 0,
        }
    }

    /// Sets the world-space position of the body.
    #[inline]
    pub fn with_position(mut self, position: Vector) -> Self {
        self.position = position;
        self
    }

    /// Sets the world-space rotation of the body.
    #[inline]
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets the mass of the body. A mass of zero makes the body static.
    #[inline]
    pub fn with_mass(mut self, mass: Scalar) -> Self {
        self.inv_mass = mass.recip_or_zero();
        self
    }

    /// Sets the rotational inertia of the body.
    /// An inertia of zero prevents the body from rotating.
    #[inline]
    pub fn with_angular_inertia(mut self, angular_inertia: Scalar) -> Self {
        self.inv_angular_inertia = angular_inertia.recip_or_zero();
        self
    }

    /// Sets the island-local index of the body.
    #[inline]
    pub fn with_island_index(mut self, island_index: usize) -> Self {
        self.island_index = island_index;
        self
    }

    /// Converts a point in the body's local frame to world space.
    #[inline]
    pub fn world_point(&self, local_point: Vector) -> Vector {
        self.position + self.rotation * local_point
    }

    /// Converts a world-space point to the body's local frame.
    #[inline]
    pub fn local_point(&self, world_point: Vector) -> Vector {
        self.rotation.inverse() * (world_point - self.position)
    }
}
