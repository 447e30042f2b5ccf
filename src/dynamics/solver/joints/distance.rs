//! [`DistanceJoint`]: keeps two anchor points at a fixed distance.

use crate::{
    dynamics::{rigid_body::RigidBody, solver::SolverData, solver::SolverSettings},
    math::{cross, cross_scalar, RecipOrZero, Rotation, Scalar, Vector},
};

use super::DistanceLimit;

// 1-D constrained system
// C = norm(p2 - p1) - L
// u = (p2 - p1) / norm(p2 - p1)
// Cdot = dot(u, v2 + cross(w2, r2) - v1 - cross(w1, r1))
// J = [-u -cross(r1, u) u cross(r2, u)]
// K = J * invM * JT
//   = invMass1 + invI1 * cross(r1, u)^2 + invMass2 + invI2 * cross(r2, u)^2

/// A distance joint constrains two points on two bodies to remain at a fixed
/// distance from each other. You can view this as a massless, rigid rod.
///
/// With a non-zero [`stiffness`](Self::stiffness) the rod becomes a
/// spring-damper, tolerating some steady-state error, and the
/// [`limits`](Self::limits) bound how far the spring may stretch or compress.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceJoint {
    /// The attachment point in the first body's local frame.
    pub local_anchor_a: Vector,
    /// The attachment point in the second body's local frame.
    pub local_anchor_b: Vector,
    /// The rest length between the anchor points.
    ///
    /// Kept at or above the default linear slop; a zero-length distance
    /// joint has no defined constraint axis.
    pub length: Scalar,
    /// The minimum and maximum allowed separation.
    ///
    /// Only meaningful for soft joints; when `min == max` the joint is
    /// solved rigidly at [`length`](Self::length).
    pub limits: DistanceLimit,
    /// The spring stiffness in N/m. Zero disables the spring and makes the
    /// joint rigid.
    pub stiffness: Scalar,
    /// The spring damping coefficient in N·s/m.
    pub damping: Scalar,
    #[cfg_attr(feature = "serialize", serde(skip))]
    solver_data: DistanceJointSolverData,
}

/// Cached per-tick solver state for [`DistanceJoint`].
#[derive(Clone, Debug, Default, PartialEq)]
struct DistanceJointSolverData {
    index_a: usize,
    index_b: usize,
    u: Vector,
    r_a: Vector,
    r_b: Vector,
    local_center_a: Vector,
    local_center_b: Vector,
    inv_mass_a: Scalar,
    inv_mass_b: Scalar,
    inv_i_a: Scalar,
    inv_i_b: Scalar,
    mass: Scalar,
    soft_mass: Scalar,
    current_length: Scalar,
    bias: Scalar,
    gamma: Scalar,
    // Accumulated impulses, carried across ticks for warm starting.
    impulse: Scalar,
    lower_impulse: Scalar,
    upper_impulse: Scalar,
}

impl DistanceJoint {
    /// Creates a new distance joint from local anchor points and a rest length.
    pub fn new(local_anchor_a: Vector, local_anchor_b: Vector, length: Scalar) -> Self {
        let clamped = length.max(SolverSettings::DEFAULT_LINEAR_SLOP);
        if clamped != length {
            log::debug!("distance joint rest length {length} clamped to {clamped}");
        }
        let length = clamped;

        Self {
            local_anchor_a,
            local_anchor_b,
            length,
            limits: DistanceLimit::new(length, length),
            stiffness: 0.0,
            damping: 0.0,
            solver_data: DistanceJointSolverData::default(),
        }
    }

    /// Creates a new distance joint from world-space anchor points,
    /// with the rest length taken from the current separation.
    pub fn between_world_points(
        body_a: &RigidBody,
        body_b: &RigidBody,
        world_anchor_a: Vector,
        world_anchor_b: Vector,
    ) -> Self {
        Self::new(
            body_a.local_point(world_anchor_a),
            body_b.local_point(world_anchor_b),
            world_anchor_b.distance(world_anchor_a),
        )
    }

    /// Sets the minimum and maximum allowed separation.
    ///
    /// The minimum is clamped to stay positive and below the maximum.
    pub fn with_limits(mut self, min: Scalar, max: Scalar) -> Self {
        let clamped_max = max.max(SolverSettings::DEFAULT_LINEAR_SLOP);
        let clamped_min = min.clamp(SolverSettings::DEFAULT_LINEAR_SLOP, clamped_max);
        if clamped_min != min || clamped_max != max {
            log::debug!(
                "distance joint limits [{min}, {max}] clamped to [{clamped_min}, {clamped_max}]"
            );
        }
        self.limits = DistanceLimit::new(clamped_min, clamped_max);
        self.solver_data.lower_impulse = 0.0;
        self.solver_data.upper_impulse = 0.0;
        self
    }

    /// Sets the spring stiffness and damping, making the joint soft.
    pub fn with_spring(mut self, stiffness: Scalar, damping: Scalar) -> Self {
        self.stiffness = stiffness;
        self.damping = damping;
        self
    }

    /// Returns the net linear force the joint applied during the last solve.
    pub fn reaction_force(&self, inv_dt: Scalar) -> Vector {
        let data = &self.solver_data;
        data.u * ((data.impulse + data.lower_impulse - data.upper_impulse) * inv_dt)
    }

    /// The reaction torque is always zero for a distance joint.
    pub fn reaction_torque(&self, _inv_dt: Scalar) -> Scalar {
        0.0
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

        let c_a = data.positions[scratch.index_a];
        let a_a = data.angles[scratch.index_a];
        let mut v_a = data.linear_velocities[scratch.index_a];
        let mut w_a = data.angular_velocities[scratch.index_a];

        let c_b = data.positions[scratch.index_b];
        let a_b = data.angles[scratch.index_b];
        let mut v_b = data.linear_velocities[scratch.index_b];
        let mut w_b = data.angular_velocities[scratch.index_b];

        let q_a = Rotation::radians(a_a);
        let q_b = Rotation::radians(a_b);

        scratch.r_a = q_a * (self.local_anchor_a - scratch.local_center_a);
        scratch.r_b = q_b * (self.local_anchor_b - scratch.local_center_b);
        scratch.u = c_b + scratch.r_b - c_a - scratch.r_a;

        // Handle singularity.
        scratch.current_length = scratch.u.length();
        if scratch.current_length > data.linear_slop {
            scratch.u *= 1.0 / scratch.current_length;
        } else {
            scratch.u = Vector::ZERO;
            scratch.mass = 0.0;
            scratch.impulse = 0.0;
            scratch.lower_impulse = 0.0;
            scratch.upper_impulse = 0.0;
        }

        let cr_a_u = cross(scratch.r_a, scratch.u);
        let cr_b_u = cross(scratch.r_b, scratch.u);
        let mut inv_mass = scratch.inv_mass_a
            + scratch.inv_i_a * cr_a_u * cr_a_u
            + scratch.inv_mass_b
            + scratch.inv_i_b * cr_b_u * cr_b_u;
        scratch.mass = inv_mass.recip_or_zero();

        if self.stiffness > 0.0 && self.limits.min < self.limits.max {
            // Soft. The extra factor of h in gamma is because the lambda
            // is an impulse, not a force.
            let c = scratch.current_length - self.length;

            let d = self.damping;
            let k = self.stiffness;
            let h = data.frame_time;

            scratch.gamma = (h * (d + h * k)).recip_or_zero();
            scratch.bias = c * h * k * scratch.gamma;

            inv_mass += scratch.gamma;
            scratch.soft_mass = inv_mass.recip_or_zero();
        } else {
            // Rigid
            scratch.gamma = 0.0;
            scratch.bias = 0.0;
            scratch.soft_mass = scratch.mass;
        }

        if data.warm_starting {
            // Scale the impulse to support a variable time step.
            scratch.impulse *= data.dt_ratio;
            scratch.lower_impulse *= data.dt_ratio;
            scratch.upper_impulse *= data.dt_ratio;

            let p = scratch.u * (scratch.impulse + scratch.lower_impulse - scratch.upper_impulse);
            v_a -= p * scratch.inv_mass_a;
            w_a -= scratch.inv_i_a * cross(scratch.r_a, p);
            v_b += p * scratch.inv_mass_b;
            w_b += scratch.inv_i_b * cross(scratch.r_b, p);
        } else {
            scratch.impulse = 0.0;
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

        if self.limits.min < self.limits.max {
            if self.stiffness > 0.0 {
                // Cdot = dot(u, v + cross(w, r))
                let vp_a = v_a + cross_scalar(w_a, scratch.r_a);
                let vp_b = v_b + cross_scalar(w_b, scratch.r_b);
                let c_dot = scratch.u.dot(vp_b - vp_a);

                let impulse =
                    -scratch.soft_mass * (c_dot + scratch.bias + scratch.gamma * scratch.impulse);
                scratch.impulse += impulse;

                let p = scratch.u * impulse;
                v_a -= p * scratch.inv_mass_a;
                w_a -= scratch.inv_i_a * cross(scratch.r_a, p);
                v_b += p * scratch.inv_mass_b;
                w_b += scratch.inv_i_b * cross(scratch.r_b, p);
            }

            // Lower limit
            {
                let c = scratch.current_length - self.limits.min;
                let bias = c.max(0.0) * data.inv_dt;

                let vp_a = v_a + cross_scalar(w_a, scratch.r_a);
                let vp_b = v_b + cross_scalar(w_b, scratch.r_b);
                let c_dot = scratch.u.dot(vp_b - vp_a);

                let mut impulse = -scratch.mass * (c_dot + bias);
                let old_impulse = scratch.lower_impulse;
                scratch.lower_impulse = (scratch.lower_impulse + impulse).max(0.0);
                impulse = scratch.lower_impulse - old_impulse;
                let p = scratch.u * impulse;

                v_a -= p * scratch.inv_mass_a;
                w_a -= scratch.inv_i_a * cross(scratch.r_a, p);
                v_b += p * scratch.inv_mass_b;
                w_b += scratch.inv_i_b * cross(scratch.r_b, p);
            }

            // Upper limit
            {
                let c = self.limits.max - scratch.current_length;
                let bias = c.max(0.0) * data.inv_dt;

                let vp_a = v_a + cross_scalar(w_a, scratch.r_a);
                let vp_b = v_b + cross_scalar(w_b, scratch.r_b);
                let c_dot = scratch.u.dot(vp_a - vp_b);

                let mut impulse = -scratch.mass * (c_dot + bias);
                let old_impulse = scratch.upper_impulse;
                scratch.upper_impulse = (scratch.upper_impulse + impulse).max(0.0);
                impulse = scratch.upper_impulse - old_impulse;
                let p = scratch.u * -impulse;

                v_a -= p * scratch.inv_mass_a;
                w_a -= scratch.inv_i_a * cross(scratch.r_a, p);
                v_b += p * scratch.inv_mass_b;
                w_b += scratch.inv_i_b * cross(scratch.r_b, p);
            }
        } else {
            // Equal limits: solve the rest length rigidly.
            let vp_a = v_a + cross_scalar(w_a, scratch.r_a);
            let vp_b = v_b + cross_scalar(w_b, scratch.r_b);
            let c_dot = scratch.u.dot(vp_b - vp_a);

            let impulse = -scratch.mass * c_dot;
            scratch.impulse += impulse;

            let p = scratch.u * impulse;
            v_a -= p * scratch.inv_mass_a;
            w_a -= scratch.inv_i_a * cross(scratch.r_a, p);
            v_b += p * scratch.inv_mass_b;
            w_b += scratch.inv_i_b * cross(scratch.r_b, p);
        }

        data.linear_velocities[scratch.index_a] = v_a;
        data.angular_velocities[scratch.index_a] = w_a;
        data.linear_velocities[scratch.index_b] = v_b;
        data.angular_velocities[scratch.index_b] = w_b;
    }

    pub(super) fn solve_position_constraints(&mut self, data: &mut SolverData) -> bool {
        let scratch = &mut self.solver_data;

        let mut c_a = data.positions[scratch.index_a];
        let mut a_a = data.angles[scratch.index_a];
        let mut c_b = data.positions[scratch.index_b];
        let mut a_b = data.angles[scratch.index_b];

        let q_a = Rotation::radians(a_a);
        let q_b = Rotation::radians(a_b);

        let r_a = q_a * (self.local_anchor_a - scratch.local_center_a);
        let r_b = q_b * (self.local_anchor_b - scratch.local_center_b);
        let u = c_b + r_b - c_a - r_a;

        let length = u.length();
        let u = u.normalize_or_zero();

        let c = if (self.limits.max - self.limits.min).abs() < Scalar::EPSILON {
            length - self.limits.min
        } else if length < self.limits.min {
            length - self.limits.min
        } else if self.limits.max < length {
            length - self.limits.max
        } else {
            return true;
        };

        let impulse = -scratch.mass * c;
        let p = u * impulse;

        c_a -= p * scratch.inv_mass_a;
        a_a -= scratch.inv_i_a * cross(r_a, p);
        c_b += p * scratch.inv_mass_b;
        a_b += scratch.inv_i_b * cross(r_b, p);

        data.positions[scratch.index_a] = c_a;
        data.angles[scratch.index_a] = a_a;
        data.positions[scratch.index_b] = c_b;
        data.angles[scratch.index_b] = a_b;

        c.abs() < data.linear_slop
    }
}
