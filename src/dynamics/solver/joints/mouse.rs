//! [`MouseJoint`]: drags a body towards a world-space target point.

use crate::{
    dynamics::{rigid_body::RigidBody, solver::SolverData},
    math::{cross, cross_scalar, solve22, Matrix2, RecipOrZero, Rotation, Scalar, Vector, TAU},
};

/// A mouse joint pulls a point on the second body towards a moving
/// world-space [`target`](Self::target), typically the cursor. The
/// connection is a critically dampable spring, and the applied force is
/// capped so grabbed bodies cannot launch others at silly speeds.
///
/// The first body is a reference body and is not affected.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct MouseJoint {
    /// The world-space point the body is pulled towards.
    pub target: Vector,
    /// The grabbed point in the second body's local frame.
    pub local_anchor_b: Vector,
    /// The maximum pull force in N. Usually some multiple of the body's
    /// weight so the grip can be broken.
    pub max_force: Scalar,
    /// The response frequency in Hz.
    pub frequency: Scalar,
    /// The damping ratio. 0 = no damping, 1 = critical damping.
    pub damping_ratio: Scalar,
    #[cfg_attr(feature = "serialize", serde(skip))]
    solver_data: MouseJointSolverData,
}

/// Cached per-tick solver state for [`MouseJoint`].
#[derive(Clone, Debug, Default, PartialEq)]
struct MouseJointSolverData {
    index_b: usize,
    r_b: Vector,
    local_center_b: Vector,
    inv_mass_b: Scalar,
    inv_i_b: Scalar,
    k: Matrix2,
    c: Vector,
    beta: Scalar,
    gamma: Scalar,
    impulse: Vector,
}

impl MouseJoint {
    /// Creates a new mouse joint grabbing `body_b` at the given world-space
    /// point, which also becomes the initial target.
    pub fn new(body_b: &RigidBody, target: Vector) -> Self {
        Self {
            target,
            local_anchor_b: body_b.local_point(target),
            max_force: 0.0,
            frequency: 5.0,
            damping_ratio: 0.7,
            solver_data: MouseJointSolverData::default(),
        }
    }

    /// Sets the maximum pull force.
    pub fn with_max_force(mut self, force: Scalar) -> Self {
        if force < 0.0 {
            log::debug!("mouse joint max force {force} clamped to 0");
        }
        self.max_force = force.max(0.0);
        self
    }

    /// Sets the spring frequency and damping ratio.
    pub fn with_spring(mut self, frequency: Scalar, damping_ratio: Scalar) -> Self {
        if frequency < 0.0 || damping_ratio < 0.0 {
            log::debug!("mouse joint spring ({frequency}, {damping_ratio}) clamped to 0");
        }
        self.frequency = frequency.max(0.0);
        self.damping_ratio = damping_ratio.max(0.0);
        self
    }

    /// Returns the pull force applied during the last solve.
    pub fn reaction_force(&self, inv_dt: Scalar) -> Vector {
        self.solver_data.impulse * inv_dt
    }

    /// The reaction torque is always zero for a mouse joint.
    pub fn reaction_torque(&self, _inv_dt: Scalar) -> Scalar {
        0.0
    }

    pub(super) fn init_velocity_constraints(
        &mut self,
        _body_a: &RigidBody,
        body_b: &RigidBody,
        data: &mut SolverData,
    ) {
        let scratch = &mut self.solver_data;

        scratch.index_b = data.body_index(body_b);
        scratch.local_center_b = body_b.local_center;
        scratch.inv_mass_b = body_b.inv_mass;
        scratch.inv_i_b = body_b.inv_angular_inertia;

        let c_b = data.positions[scratch.index_b];
        let a_b = data.angles[scratch.index_b];
        let mut v_b = data.linear_velocities[scratch.index_b];
        let mut w_b = data.angular_velocities[scratch.index_b];

        let q_b = Rotation::radians(a_b);

        let mass = scratch.inv_mass_b.recip_or_zero();

        // Frequency
        let omega = TAU * self.frequency;

        // Damping coefficient
        let d = 2.0 * mass * self.damping_ratio * omega;

        // Spring stiffness
        let k = mass * omega * omega;

        // gamma has units of inverse mass,
        // beta has units of inverse time.
        let h = data.frame_time;
        scratch.gamma = (h * (d + h * k)).recip_or_zero();
        scratch.beta = h * k * scratch.gamma;

        // Compute the effective mass matrix.
        scratch.r_b = q_b * (self.local_anchor_b - scratch.local_center_b);

        // K = [(1/m1 + 1/m2) * eye(2) - skew(r1) * invI1 * skew(r1) - skew(r2) * invI2 * skew(r2)]
        let m_b = scratch.inv_mass_b;
        let i_b = scratch.inv_i_b;
        let r_b = scratch.r_b;

        scratch.k = Matrix2::from_cols(
            Vector::new(
                m_b + i_b * r_b.y * r_b.y + scratch.gamma,
                -i_b * r_b.x * r_b.y,
            ),
            Vector::new(
                -i_b * r_b.x * r_b.y,
                m_b + i_b * r_b.x * r_b.x + scratch.gamma,
            ),
        );

        scratch.c = (c_b + r_b - self.target) * scratch.beta;

        // Cheat with some damping.
        w_b *= (1.0 - 0.02 * (60.0 * h)).max(0.0);

        if data.warm_starting {
            scratch.impulse *= data.dt_ratio;
            v_b += scratch.impulse * m_b;
            w_b += i_b * cross(r_b, scratch.impulse);
        } else {
            scratch.impulse = Vector::ZERO;
        }

        data.linear_velocities[scratch.index_b] = v_b;
        data.angular_velocities[scratch.index_b] = w_b;
    }

    pub(super) fn solve_velocity_constraints(&mut self, data: &mut SolverData) {
        let scratch = &mut self.solver_data;

        let mut v_b = data.linear_velocities[scratch.index_b];
        let mut w_b = data.angular_velocities[scratch.index_b];

        // Cdot = v + cross(w, r)
        let c_dot = v_b + cross_scalar(w_b, scratch.r_b);
        let mut impulse = solve22(
            scratch.k,
            -(c_dot + scratch.c + scratch.gamma * scratch.impulse),
        );

        let old_impulse = scratch.impulse;
        scratch.impulse += impulse;
        let max_impulse = data.frame_time * self.max_force;
        if scratch.impulse.length_squared() > max_impulse * max_impulse {
            scratch.impulse *= max_impulse / scratch.impulse.length();
        }
        impulse = scratch.impulse - old_impulse;

        v_b += impulse * scratch.inv_mass_b;
        w_b += scratch.inv_i_b * cross(scratch.r_b, impulse);

        data.linear_velocities[scratch.index_b] = v_b;
        data.angular_velocities[scratch.index_b] = w_b;
    }

    pub(super) fn solve_position_constraints(&mut self, _data: &mut SolverData) -> bool {
        // The target is chased in velocity space only.
        true
    }
}
