//! **Joints** connect two rigid bodies and restrict their relative movement.
//!
//! Each joint kind constrains a different set of *degrees of freedom* (DOF):
//!
//! | Joint              | Constrained DOF                            |
//! | ------------------ | ------------------------------------------ |
//! | [`DistanceJoint`]  | 1 translation (point separation)           |
//! | [`FrictionJoint`]  | 2 translations + 1 rotation, velocity only |
//! | [`MouseJoint`]     | 2 translations, always soft                |
//! | [`PrismaticJoint`] | 1 translation + 1 rotation                 |
//! | [`RevoluteJoint`]  | 2 translations (point coincidence)         |
//! | [`WeldJoint`]      | 2 translations + 1 rotation                |
//!
//! A joint is a [`Joint`] wrapper around one of the concrete configurations,
//! carrying the state shared by all kinds: the two constrained bodies, the
//! enabled flag, collision filtering between the connected bodies, and the
//! breakpoint force threshold.
//!
//! # Solving
//!
//! Every joint implements the same three-phase protocol, dispatched over the
//! closed [`JointKind`] union:
//!
//! 1. **Init**: cache body mass properties, rotate local anchors into world
//!    space, and build the effective-mass matrix once per tick. Apply
//!    warm-started impulses.
//! 2. **Velocity solving**: called several times per tick; computes the
//!    constraint velocity error and applies clamped corrective impulses
//!    directly to the island velocity arrays.
//! 3. **Position solving**: corrects the remaining positional drift by
//!    nudging positions and angles, reporting whether the error is within
//!    tolerance. Soft constraints skip this phase; springs are allowed to
//!    have static error.

mod distance;
mod friction;
mod mouse;
mod prismatic;
mod revolute;
mod weld;

pub use distance::DistanceJoint;
pub use friction::FrictionJoint;
pub use mouse::MouseJoint;
pub use prismatic::PrismaticJoint;
pub use revolute::RevoluteJoint;
pub use weld::WeldJoint;

use crate::{
    dynamics::{rigid_body::BodyId, rigid_body::RigidBody, solver::SolverData},
    math::{Scalar, Vector},
};
use derive_more::From;

/// The kind of a [`Joint`], as a plain tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum JointType {
    /// See [`DistanceJoint`].
    Distance,
    /// See [`FrictionJoint`].
    Friction,
    /// See [`MouseJoint`].
    Mouse,
    /// See [`PrismaticJoint`].
    Prismatic,
    /// See [`RevoluteJoint`].
    Revolute,
    /// See [`WeldJoint`].
    Weld,
}

/// The closed set of concrete joint configurations.
///
/// The solver dispatches over this union with exhaustive matches instead of
/// virtual calls, keeping the set of joint kinds explicit and the per-tick
/// dispatch branch-predictable.
#[derive(Clone, Debug, PartialEq, From)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum JointKind {
    /// A distance joint.
    Distance(DistanceJoint),
    /// A friction joint.
    Friction(FrictionJoint),
    /// A mouse joint.
    Mouse(MouseJoint),
    /// A prismatic joint.
    Prismatic(PrismaticJoint),
    /// A revolute joint.
    Revolute(RevoluteJoint),
    /// A weld joint.
    Weld(WeldJoint),
}

/// A joint connecting two rigid bodies.
///
/// The shared configuration lives here; the kind-specific parameters and
/// solver scratch state live in the [`JointKind`] payload.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Joint {
    /// The first constrained body.
    pub body_a: BodyId,
    /// The second constrained body. Never equal to [`body_a`](Self::body_a).
    pub body_b: BodyId,
    /// Whether the joint contributes a constraint this tick.
    ///
    /// A disabled joint still exists in the joint graph but is skipped by
    /// the solver.
    pub enabled: bool,
    /// Whether the connected bodies should still collide with each other.
    pub collide_connected: bool,
    /// The maximum reaction force magnitude the joint withstands before
    /// disabling itself. Unbounded by default.
    pub breakpoint: Scalar,
    /// The concrete joint configuration and solver state.
    pub kind: JointKind,
}

impl Joint {
    /// Creates a new joint between two bodies.
    ///
    /// # Panics
    ///
    /// Panics if `body_a` and `body_b` are the same body.
    pub fn new(body_a: BodyId, body_b: BodyId, kind: impl Into<JointKind>) -> Self {
        assert_ne!(body_a, body_b, "joint cannot connect a body to itself");

        Self {
            body_a,
            body_b,
            enabled: true,
            collide_connected: false,
            breakpoint: Scalar::MAX,
            kind: kind.into(),
        }
    }

    /// Sets the breakpoint force threshold.
    #[inline]
    pub fn with_breakpoint(mut self, breakpoint: Scalar) -> Self {
        self.breakpoint = breakpoint;
        self
    }

    /// Sets whether the connected bodies should still collide with each other.
    #[inline]
    pub fn with_collide_connected(mut self, collide_connected: bool) -> Self {
        self.collide_connected = collide_connected;
        self
    }

    /// Returns the kind of the joint as a plain tag.
    pub fn joint_type(&self) -> JointType {
        match &self.kind {
            JointKind::Distance(_) => JointType::Distance,
            JointKind::Friction(_) => JointType::Friction,
            JointKind::Mouse(_) => JointType::Mouse,
            JointKind::Prismatic(_) => JointType::Prismatic,
            JointKind::Revolute(_) => JointType::Revolute,
            JointKind::Weld(_) => JointType::Weld,
        }
    }

    /// Given one endpoint of the joint, returns the body at the other end.
    ///
    /// Returns `None` if `body` is not an endpoint of this joint.
    pub fn other_body(&self, body: BodyId) -> Option<BodyId> {
        if body == self.body_a {
            Some(self.body_b)
        } else if body == self.body_b {
            Some(self.body_a)
        } else {
            None
        }
    }

    /// Returns the net linear force the joint applied during the last solve.
    ///
    /// `inv_dt` converts the internally accumulated impulse into a force.
    pub fn reaction_force(&self, inv_dt: Scalar) -> Vector {
        match &self.kind {
            JointKind::Distance(joint) => joint.reaction_force(inv_dt),
            JointKind::Friction(joint) => joint.reaction_force(inv_dt),
            JointKind::Mouse(joint) => joint.reaction_force(inv_dt),
            JointKind::Prismatic(joint) => joint.reaction_force(inv_dt),
            JointKind::Revolute(joint) => joint.reaction_force(inv_dt),
            JointKind::Weld(joint) => joint.reaction_force(inv_dt),
        }
    }

    /// Returns the torque the joint applied during the last solve.
    pub fn reaction_torque(&self, inv_dt: Scalar) -> Scalar {
        match &self.kind {
            JointKind::Distance(joint) => joint.reaction_torque(inv_dt),
            JointKind::Friction(joint) => joint.reaction_torque(inv_dt),
            JointKind::Mouse(joint) => joint.reaction_torque(inv_dt),
            JointKind::Prismatic(joint) => joint.reaction_torque(inv_dt),
            JointKind::Revolute(joint) => joint.reaction_torque(inv_dt),
            JointKind::Weld(joint) => joint.reaction_torque(inv_dt),
        }
    }

    /// Disables the joint if its reaction force exceeded the breakpoint.
    ///
    /// No-op for already disabled joints. The transition is polled by the
    /// owning system; the solver never removes joints itself.
    pub fn validate(&mut self, inv_dt: Scalar) {
        if !self.enabled {
            return;
        }

        let force = self.reaction_force(inv_dt);

        if force.length_squared() > self.breakpoint * self.breakpoint {
            self.enabled = false;
            log::debug!(
                "{:?} joint between {:?} and {:?} broke: reaction force {} exceeded breakpoint {}",
                self.joint_type(),
                self.body_a,
                self.body_b,
                force.length(),
                self.breakpoint,
            );
        }
    }

    pub(crate) fn init_velocity_constraints(
        &mut self,
        body_a: &RigidBody,
        body_b: &RigidBody,
        data: &mut SolverData,
    ) {
        match &mut self.kind {
            JointKind::Distance(joint) => joint.init_velocity_constraints(body_a, body_b, data),
            JointKind::Friction(joint) => joint.init_velocity_constraints(body_a, body_b, data),
            JointKind::Mouse(joint) => joint.init_velocity_constraints(body_a, body_b, data),
            JointKind::Prismatic(joint) => joint.init_velocity_constraints(body_a, body_b, data),
            JointKind::Revolute(joint) => joint.init_velocity_constraints(body_a, body_b, data),
            JointKind::Weld(joint) => joint.init_velocity_constraints(body_a, body_b, data),
        }
    }

    pub(crate) fn solve_velocity_constraints(&mut self, data: &mut SolverData) {
        match &mut self.kind {
            JointKind::Distance(joint) => joint.solve_velocity_constraints(data),
            JointKind::Friction(joint) => joint.solve_velocity_constraints(data),
            JointKind::Mouse(joint) => joint.solve_velocity_constraints(data),
            JointKind::Prismatic(joint) => joint.solve_velocity_constraints(data),
            JointKind::Revolute(joint) => joint.solve_velocity_constraints(data),
            JointKind::Weld(joint) => joint.solve_velocity_constraints(data),
        }
    }

    pub(crate) fn solve_position_constraints(&mut self, data: &mut SolverData) -> bool {
        match &mut self.kind {
            JointKind::Distance(joint) => joint.solve_position_constraints(data),
            JointKind::Friction(joint) => joint.solve_position_constraints(data),
            JointKind::Mouse(joint) => joint.solve_position_constraints(data),
            JointKind::Prismatic(joint) => joint.solve_position_constraints(data),
            JointKind::Revolute(joint) => joint.solve_position_constraints(data),
            JointKind::Weld(joint) => joint.solve_position_constraints(data),
        }
    }
}

/// A limit that indicates that a distance should be between `min` and `max`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceLimit {
    /// The minimum distance.
    pub min: Scalar,
    /// The maximum distance.
    pub max: Scalar,
}

impl DistanceLimit {
    /// A `DistanceLimit` with `min` and `max` set to zero.
    pub const ZERO: Self = Self { min: 0.0, max: 0.0 };

    /// Creates a new `DistanceLimit`.
    pub const fn new(min: Scalar, max: Scalar) -> Self {
        Self { min, max }
    }
}

/// A limit that indicates that an angle should be between `min` and `max` radians.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct AngleLimit {
    /// The minimum angle.
    pub min: Scalar,
    /// The maximum angle.
    pub max: Scalar,
}

impl AngleLimit {
    /// An `AngleLimit` with `min` and `max` set to zero.
    pub const ZERO: Self = Self { min: 0.0, max: 0.0 };

    /// Creates a new `AngleLimit`.
    pub const fn new(min: Scalar, max: Scalar) -> Self {
        Self { min, max }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "joint cannot connect a body to itself")]
    fn self_joint_panics() {
        let _ = Joint::new(BodyId(0), BodyId(0), FrictionJoint::new());
    }

    #[test]
    fn other_body_mirrors_endpoints() {
        let joint = Joint::new(BodyId(1), BodyId(2), FrictionJoint::new());
        assert_eq!(joint.other_body(BodyId(1)), Some(BodyId(2)));
        assert_eq!(joint.other_body(BodyId(2)), Some(BodyId(1)));
        assert_eq!(joint.other_body(BodyId(3)), None);
    }

    #[test]
    fn new_joints_are_enabled_and_unbreakable() {
        let joint = Joint::new(BodyId(0), BodyId(1), FrictionJoint::new());
        assert!(joint.enabled);
        assert!(!joint.collide_connected);
        assert_eq!(joint.breakpoint, Scalar::MAX);
    }
}
