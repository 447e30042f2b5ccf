//! [`FrictionJoint`]: applies top-down friction between two bodies.

use crate::{
    dynamics::{rigid_body::RigidBody, solver::SolverData},
    math::{cross, cross_scalar, solve22, Matrix2, RecipOrZero, Rotation, Scalar, Vector},
};

/// A friction joint damps the relative linear and angular velocity of two
/// bodies without constraining their positions. It is useful for top-down
/// games where bodies should slide to a stop.
///
/// The applied forces are capped by [`max_force`](Self::max_force) and
/// [`max_torque`](Self::max_torque), so heavy bodies keep drifting longer
/// than light ones.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct FrictionJoint {
    /// The attachment point in the first body's local frame.
    pub local_anchor_a: Vector,
    /// The attachment point in the second body's local frame.
    pub local_anchor_b: Vector,
    /// The maximum friction force in N.
    pub max_force: Scalar,
    /// The maximum friction torque in N·m.
    pub max_torque: Scalar,
    #[cfg_attr(feature = "serialize", serde(skip))]
    solver_data: FrictionJointSolverData,
}

/// Cached per-tick solver state for [`FrictionJoint`].
#[derive(Clone, Debug, Default, PartialEq)]
struct FrictionJointSolverData {
    index_a: usize,
    index_b: usize,
    r_a: Vector,
    r_b: Vector,
    local_center_a: Vector,
    local_center_b: Vector,
    inv_mass_a: Scalar,
    inv_mass_b: Scalar,
    inv_i_a: Scalar,
    inv_i_b: Scalar,
    linear_mass: Matrix2,
    angular_mass: Scalar,
    linear_impulse: Vector,
    angular_impulse: Scalar,
}

impl Default for FrictionJoint {
    fn default() -> Self {
        Self::new()
    }
}

impl FrictionJoint {
    /// Creates a new friction joint anchored at both bodies' origins.
    pub fn new() -> Self {
        Self {
            local_anchor_a: Vector::ZERO,
            local_anchor_b: Vector::ZERO,
            max_force: 0.0,
            max_torque: 0.0,
            solver_data: FrictionJointSolverData::default(),
        }
    }

    /// Sets the local anchor points.
    pub fn with_local_anchors(mut self, anchor_a: Vector, anchor_b: Vector) -> Self {
        self.local_anchor_a = anchor_a;
        self.local_anchor_b = anchor_b;
        self
    }

    /// Sets the maximum friction force.
    pub fn with_max_force(mut self, force: Scalar) -> Self {
        if force < 0.0 {
            log::debug!("friction joint max force {force} clamped to 0");
        }
        self.max_force = force.max(0.0);
        self
    }

    /// Sets the maximum friction torque.
    pub fn with_max_torque(mut self, torque: Scalar) -> Self {
        if torque < 0.0 {
            log::debug!("friction joint max torque {torque} clamped to 0");
        }
        self.max_torque = torque.max(0.0);
        self
    }

    /// Returns the friction force applied during the last solve.
    pub fn reaction_force(&self, inv_dt: Scalar) -> Vector {
        self.solver_data.linear_impulse * inv_dt
    }

    /// Returns the friction torque applied during the last solve.
    pub fn reaction_torque(&self, inv_dt: Scalar) -> Scalar {
        self.solver_data.angular_impulse * inv_dt
    }

    pub(super) fn init_velocity_constraints(
        &mut self,
        body_a: &RigidBody,
        body_b: &RigidBody,
        data: &mut SolverData,
    ) {
        let scratch = &mut self.solver_data;

        scratch.index_a = data.body_index(body_a);
        scratch.index_b = data.body_index(body_b);
        scratch.local_center_a = body_a.local_center;
        scratch.local_center_b = body_b.local_center;
        scratch.inv_mass_a = body_a.inv_mass;
        scratch.inv_mass_b = body_b.inv_mass;
        scratch.inv_i_a = body_a.inv_angular_inertia;
        scratch.inv_i_b = body_b.inv_angular_inertia;

        let a_a = data.angles[scratch.index_a];
        let mut v_a = data.linear_velocities[scratch.index_a];
        let mut w_a = data.angular_velocities[scratch.index_a];

        let a_b = data.angles[scratch.index_b];
        let mut v_b = data.linear_velocities[scratch.index_b];
        let mut w_b = data.angular_velocities[scratch.index_b];

        let q_a = Rotation::radians(a_a);
        let q_b = Rotation::radians(a_b);

        // Compute the effective mass matrix.
        scratch.r_a = q_a * (self.local_anchor_a - scratch.local_center_a);
        scratch.r_b = q_b * (self.local_anchor_b - scratch.local_center_b);

        // J = [-I -r1_skew I r2_skew]
        // K = J * invM * JT
        let m_a = scratch.inv_mass_a;
        let m_b = scratch.inv_mass_b;
        let i_a = scratch.inv_i_a;
        let i_b = scratch.inv_i_b;

        let r_a = scratch.r_a;
        let r_b = scratch.r_b;

        let k = Matrix2::from_cols(
            Vector::new(
                m_a + m_b + i_a * r_a.y * r_a.y + i_b * r_b.y * r_b.y,
                -i_a * r_a.x * r_a.y - i_b * r_b.x * r_b.y,
            ),
            Vector::new(
                -i_a * r_a.x * r_a.y - i_b * r_b.x * r_b.y,
                m_a + m_b + i_a * r_a.x * r_a.x + i_b * r_b.x * r_b.x,
            ),
        );
        scratch.linear_mass = k;
        scratch.angular_mass = (i_a + i_b).recip_or_zero();

        if data.warm_starting {
            // Scale impulses to support a variable time step.
            scratch.linear_impulse *= data.dt_ratio;
            scratch.angular_impulse *= data.dt_ratio;

            let p = scratch.linear_impulse;
            v_a -= p * m_a;
            w_a -= i_a * (cross(r_a, p) + scratch.angular_impulse);
            v_b += p * m_b;
            w_b += i_b * (cross(r_b, p) + scratch.angular_impulse);
        } else {
            scratch.linear_impulse = Vector::ZERO;
            scratch.angular_impulse = 0.0;
        }

        data.linear_velocities[scratch.index_a] = v_a;
        data.angular_velocities[scratch.index_a] = w_a;
        data.linear_velocities[scratch.index_b] = v_b;
        data.angular_velocities[scratch.index_b] = w_b;
    }

    pub(super) fn solve_velocity_constraints(&mut self, data: &mut SolverData) {
        let scratch = &mut self.solver_data;

        let mut v_a = data.linear_velocities[scratch.index_a];
        let mut w_a = data.angular_velocities[scratch.index_a];
        let mut v_b = data.linear_velocities[scratch.index_b];
        let mut w_b = data.angular_velocities[scratch.index_b];

        let m_a = scratch.inv_mass_a;
        let m_b = scratch.inv_mass_b;
        let i_a = scratch.inv_i_a;
        let i_b = scratch.inv_i_b;

        let h = data.frame_time;

        // Solve angular friction.
        {
            let c_dot = w_b - w_a;
            let mut impulse = -scratch.angular_mass * c_dot;

            let old_impulse = scratch.angular_impulse;
            let max_impulse = h * self.max_torque;
            scratch.angular_impulse =
                (scratch.angular_impulse + impulse).clamp(-max_impulse, max_impulse);
            impulse = scratch.angular_impulse - old_impulse;

            w_a -= i_a * impulse;
            w_b += i_b * impulse;
        }

        // Solve linear friction.
        {
            let c_dot =
                v_b + cross_scalar(w_b, scratch.r_b) - v_a - cross_scalar(w_a, scratch.r_a);

            let impulse = -solve22(scratch.linear_mass, c_dot);
            let old_impulse = scratch.linear_impulse;
            scratch.linear_impulse += impulse;

            let max_impulse = h * self.max_force;
            if scratch.linear_impulse.length_squared() > max_impulse * max_impulse {
                scratch.linear_impulse = scratch.linear_impulse.normalize_or_zero() * max_impulse;
            }

            let impulse = scratch.linear_impulse - old_impulse;

            v_a -= impulse * m_a;
            w_a -= i_a * cross(scratch.r_a, impulse);
            v_b += impulse * m_b;
            w_b += i_b * cross(scratch.r_b, impulse);
        }

        data.linear_velocities[scratch.index_a] = v_a;
        data.angular_velocities[scratch.index_a] = w_a;
        data.linear_velocities[scratch.index_b] = v_b;
        data.angular_velocities[scratch.index_b] = w_b;
    }

    pub(super) fn solve_position_constraints(&mut self, _data: &mut SolverData) -> bool {
        // Friction has no position constraint.
        true
    }
}
