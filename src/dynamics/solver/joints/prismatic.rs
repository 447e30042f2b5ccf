//! [`PrismaticJoint`]: a slider allowing translation along one axis.

use crate::{
    dynamics::{rigid_body::RigidBody, solver::SolverData},
    math::{
        cross, cross_scalar, solve22, Matrix2, RecipOrZero, Rotation, Scalar, SymmetricMatrix3,
        Vector, Vector3,
    },
};

use super::DistanceLimit;

// Linear constraint (point-to-line)
// d = p2 - p1 = x2 + r2 - x1 - r1
// C = dot(perp, d)
// Cdot = dot(d, cross(w1, perp)) + dot(perp, v2 + cross(w2, r2) - v1 - cross(w1, r1))
//      = -dot(perp, v1) - dot(cross(d + r1, perp), w1) + dot(perp, v2) + dot(cross(r2, perp), v2)
// J = [-perp, -cross(d + r1, perp), perp, cross(r2,perp)]
//
// Angular constraint
// C = a2 - a1 + a_initial
// Cdot = w2 - w1
// J = [0 0 -1 0 0 1]

/// A prismatic joint allows relative translation of two bodies along a
/// local axis while preventing relative rotation, like a piston or an
/// elevator rail.
///
/// Translation can be restricted to a [`DistanceLimit`] and driven by a
/// motor with a configurable speed and maximum force.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct PrismaticJoint {
    /// The attachment point in the first body's local frame.
    pub local_anchor_a: Vector,
    /// The attachment point in the second body's local frame.
    pub local_anchor_b: Vector,
    /// The slide axis in the first body's local frame. Unit length.
    pub local_axis_a: Vector,
    /// The second body's angle relative to the first at rest, in radians.
    pub reference_angle: Scalar,
    /// Whether the translation limit is enforced.
    pub enable_limit: bool,
    /// The lower and upper bounds on the translation along the axis.
    pub limits: DistanceLimit,
    /// Whether the motor is enabled.
    pub enable_motor: bool,
    /// The target translation speed of the motor, in m/s.
    pub motor_speed: Scalar,
    /// The maximum force the motor may exert, in N.
    pub max_motor_force: Scalar,
    #[cfg_attr(feature = "serialize", serde(skip))]
    solver_data: PrismaticJointSolverData,
}

/// Cached per-tick solver state for [`PrismaticJoint`].
#[derive(Clone, Debug, Default, PartialEq)]
struct PrismaticJointSolverData {
    index_a: usize,
    index_b: usize,
    local_center_a: Vector,
    local_center_b: Vector,
    inv_mass_a: Scalar,
    inv_mass_b: Scalar,
    inv_i_a: Scalar,
    inv_i_b: Scalar,
    axis: Vector,
    perp: Vector,
    s1: Scalar,
    s2: Scalar,
    a1: Scalar,
    a2: Scalar,
    k: Matrix2,
    axial_mass: Scalar,
    translation: Scalar,
    impulse: Vector,
    motor_impulse: Scalar,
    lower_impulse: Scalar,
    upper_impulse: Scalar,
}

impl PrismaticJoint {
    /// Creates a new prismatic joint from local anchor points and a local
    /// slide axis. The axis is normalized, falling back to the x axis when
    /// degenerate.
    pub fn new(local_anchor_a: Vector, local_anchor_b: Vector, local_axis_a: Vector) -> Self {
        let local_axis_a = local_axis_a.try_normalize().unwrap_or_else(|| {
            log::debug!("prismatic joint slide axis is degenerate, falling back to the x axis");
            Vector::X
        });

        Self {
            local_anchor_a,
            local_anchor_b,
            local_axis_a,
            reference_angle: 0.0,
            enable_limit: false,
            limits: DistanceLimit::ZERO,
            enable_motor: false,
            motor_speed: 0.0,
            max_motor_force: 0.0,
            solver_data: PrismaticJointSolverData::default(),
        }
    }

    /// Creates a new prismatic joint from a world-space anchor and axis,
    /// using the bodies' current relative angle as the rest angle.
    pub fn along_world_axis(
        body_a: &RigidBody,
        body_b: &RigidBody,
        world_anchor: Vector,
        world_axis: Vector,
    ) -> Self {
        Self {
            reference_angle: body_b.rotation.as_radians() - body_a.rotation.as_radians(),
            ..Self::new(
                body_a.local_point(world_anchor),
                body_b.local_point(world_anchor),
                body_a.rotation.inverse() * world_axis,
            )
        }
    }

    /// Enables the translation limit with the given bounds along the axis.
    pub fn with_translation_limits(mut self, min: Scalar, max: Scalar) -> Self {
        self.enable_limit = true;
        self.limits = DistanceLimit::new(min.min(max), max.max(min));
        self.solver_data.lower_impulse = 0.0;
        self.solver_data.upper_impulse = 0.0;
        self
    }

    /// Enables the motor with the given target speed and maximum force.
    pub fn with_motor(mut self, speed: Scalar, max_force: Scalar) -> Self {
        if max_force < 0.0 {
            log::debug!("prismatic joint max motor force {max_force} clamped to 0");
        }
        self.enable_motor = true;
        self.motor_speed = speed;
        self.max_motor_force = max_force.max(0.0);
        self
    }

    /// Returns the force the joint applied during the last solve,
    /// including the motor and limit forces along the axis.
    pub fn reaction_force(&self, inv_dt: Scalar) -> Vector {
        let data = &self.solver_data;
        inv_dt
            * (data.perp * data.impulse.x
                + data.axis * (data.motor_impulse + data.lower_impulse - data.upper_impulse))
    }

    /// Returns the torque the joint applied during the last solve.
    pub fn reaction_torque(&self, inv_dt: Scalar) -> Scalar {
        self.solver_data.impulse.y * inv_dt
    }

    /// The current translation along the slide axis.
    pub fn joint_translation(&self) -> Scalar {
        self.solver_data.translation
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

        // Compute the effective masses.
        let r_a = q_a * (self.local_anchor_a - scratch.local_center_a);
        let r_b = q_b * (self.local_anchor_b - scratch.local_center_b);
        let d = c_b - c_a + r_b - r_a;

        let m_a = scratch.inv_mass_a;
        let m_b = scratch.inv_mass_b;
        let i_a = scratch.inv_i_a;
        let i_b = scratch.inv_i_b;

        // Point to line constraint.
        scratch.axis = q_a * self.local_axis_a;
        scratch.a1 = cross(d + r_a, scratch.axis);
        scratch.a2 = cross(r_b, scratch.axis);

        scratch.axial_mass =
            (m_a + m_b + i_a * scratch.a1 * scratch.a1 + i_b * scratch.a2 * scratch.a2)
                .recip_or_zero();

        // Prismatic constraint.
        scratch.perp = cross_scalar(1.0, scratch.axis);
        scratch.s1 = cross(d + r_a, scratch.perp);
        scratch.s2 = cross(r_b, scratch.perp);

        let k11 = m_a + m_b + i_a * scratch.s1 * scratch.s1 + i_b * scratch.s2 * scratch.s2;
        let k12 = i_a * scratch.s1 + i_b * scratch.s2;
        let mut k22 = i_a + i_b;
        if k22 == 0.0 {
            // For bodies with fixed rotation.
            k22 = 1.0;
        }

        scratch.k = Matrix2::from_cols(Vector::new(k11, k12), Vector::new(k12, k22));

        scratch.translation = scratch.axis.dot(d);
        if !self.enable_limit {
            scratch.lower_impulse = 0.0;
            scratch.upper_impulse = 0.0;
        }
        if !self.enable_motor {
            scratch.motor_impulse = 0.0;
        }

        if data.warm_starting {
            // Account for variable time step.
            scratch.impulse *= data.dt_ratio;
            scratch.motor_impulse *= data.dt_ratio;
            scratch.lower_impulse *= data.dt_ratio;
            scratch.upper_impulse *= data.dt_ratio;

            let axial_impulse =
                scratch.motor_impulse + scratch.lower_impulse - scratch.upper_impulse;
            let p = scratch.perp * scratch.impulse.x + scratch.axis * axial_impulse;
            let l_a = scratch.impulse.x * scratch.s1 + scratch.impulse.y + axial_impulse * scratch.a1;
            let l_b = scratch.impulse.x * scratch.s2 + scratch.impulse.y + axial_impulse * scratch.a2;

            v_a -= p * m_a;
            w_a -= i_a * l_a;
            v_b += p * m_b;
            w_b += i_b * l_b;
        } else {
            scratch.impulse = Vector::ZERO;
            scratch.motor_impulse = 0.0;
            scratch.lower_impulse = 0.0;
            scratch.upper_impulse = 0.0;
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

        // Solve linear motor constraint.
        if self.enable_motor {
            let c_dot = scratch.axis.dot(v_b - v_a) + scratch.a2 * w_b - scratch.a1 * w_a;
            let mut impulse = scratch.axial_mass * (self.motor_speed - c_dot);
            let old_impulse = scratch.motor_impulse;
            let max_impulse = data.frame_time * self.max_motor_force;
            scratch.motor_impulse =
                (scratch.motor_impulse + impulse).clamp(-max_impulse, max_impulse);
            impulse = scratch.motor_impulse - old_impulse;

            let p = scratch.axis * impulse;
            let l_a = impulse * scratch.a1;
            let l_b = impulse * scratch.a2;

            v_a -= p * m_a;
            w_a -= i_a * l_a;
            v_b += p * m_b;
            w_b += i_b * l_b;
        }

        if self.enable_limit {
            // Lower limit
            {
                let c = scratch.translation - self.limits.min;
                let c_dot = scratch.axis.dot(v_b - v_a) + scratch.a2 * w_b - scratch.a1 * w_a;
                let mut impulse = -scratch.axial_mass * (c_dot + c.max(0.0) * data.inv_dt);
                let old_impulse = scratch.lower_impulse;
                scratch.lower_impulse = (scratch.lower_impulse + impulse).max(0.0);
                impulse = scratch.lower_impulse - old_impulse;

                let p = scratch.axis * impulse;
                let l_a = impulse * scratch.a1;
                let l_b = impulse * scratch.a2;

                v_a -= p * m_a;
                w_a -= i_a * l_a;
                v_b += p * m_b;
                w_b += i_b * l_b;
            }

            // Upper limit
            // Note: signs are flipped to keep the impulse positive when the
            // constraint is active.
            {
                let c = self.limits.max - scratch.translation;
                let c_dot = scratch.axis.dot(v_a - v_b) + scratch.a1 * w_a - scratch.a2 * w_b;
                let mut impulse = -scratch.axial_mass * (c_dot + c.max(0.0) * data.inv_dt);
                let old_impulse = scratch.upper_impulse;
                scratch.upper_impulse = (scratch.upper_impulse + impulse).max(0.0);
                impulse = scratch.upper_impulse - old_impulse;

                let p = scratch.axis * impulse;
                let l_a = impulse * scratch.a1;
                let l_b = impulse * scratch.a2;

                v_a += p * m_a;
                w_a += i_a * l_a;
                v_b -= p * m_b;
                w_b -= i_b * l_b;
            }
        }

        // Solve the prismatic constraint in block form.
        {
            let c_dot = Vector::new(
                scratch.perp.dot(v_b - v_a) + scratch.s2 * w_b - scratch.s1 * w_a,
                w_b - w_a,
            );

            let df = -solve22(scratch.k, c_dot);
            scratch.impulse += df;

            let p = scratch.perp * df.x;
            let l_a = df.x * scratch.s1 + df.y;
            let l_b = df.x * scratch.s2 + df.y;

            v_a -= p * m_a;
            w_a -= i_a * l_a;
            v_b += p * m_b;
            w_b += i_b * l_b;
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

        let m_a = scratch.inv_mass_a;
        let m_b = scratch.inv_mass_b;
        let i_a = scratch.inv_i_a;
        let i_b = scratch.inv_i_b;

        // Compute fresh Jacobians.
        let r_a = q_a * (self.local_anchor_a - scratch.local_center_a);
        let r_b = q_b * (self.local_anchor_b - scratch.local_center_b);
        let d = c_b + r_b - c_a - r_a;

        let axis = q_a * self.local_axis_a;
        let a1 = cross(d + r_a, axis);
        let a2 = cross(r_b, axis);
        let perp = cross_scalar(1.0, axis);

        let s1 = cross(d + r_a, perp);
        let s2 = cross(r_b, perp);

        let c1 = Vector::new(perp.dot(d), a_b - a_a - self.reference_angle);

        let mut linear_error = c1.x.abs();
        let angular_error = c1.y.abs();

        let mut active = false;
        let mut c2 = 0.0;
        if self.enable_limit {
            let translation = axis.dot(d);
            if (self.limits.max - self.limits.min).abs() < 2.0 * data.linear_slop {
                c2 = translation.clamp(-data.max_linear_correction, data.max_linear_correction);
                linear_error = linear_error.max(translation.abs());
                active = true;
            } else if translation <= self.limits.min {
                c2 = (translation - self.limits.min + data.linear_slop)
                    .clamp(-data.max_linear_correction, 0.0);
                linear_error = linear_error.max(self.limits.min - translation);
                active = true;
            } else if translation >= self.limits.max {
                c2 = (translation - self.limits.max - data.linear_slop)
                    .clamp(0.0, data.max_linear_correction);
                linear_error = linear_error.max(translation - self.limits.max);
                active = true;
            }
        }

        let impulse = if active {
            let k11 = m_a + m_b + i_a * s1 * s1 + i_b * s2 * s2;
            let k12 = i_a * s1 + i_b * s2;
            let k13 = i_a * s1 * a1 + i_b * s2 * a2;
            let mut k22 = i_a + i_b;
            if k22 == 0.0 {
                // For fixed rotation.
                k22 = 1.0;
            }
            let k23 = i_a * a1 + i_b * a2;
            let k33 = m_a + m_b + i_a * a1 * a1 + i_b * a2 * a2;

            let k = SymmetricMatrix3::new(k11, k12, k13, k22, k23, k33);
            k.solve33(-Vector3::new(c1.x, c1.y, c2))
        } else {
            let k11 = m_a + m_b + i_a * s1 * s1 + i_b * s2 * s2;
            let k12 = i_a * s1 + i_b * s2;
            let mut k22 = i_a + i_b;
            if k22 == 0.0 {
                k22 = 1.0;
            }

            let k = Matrix2::from_cols(Vector::new(k11, k12), Vector::new(k12, k22));
            let impulse1 = -solve22(k, c1);
            Vector3::new(impulse1.x, impulse1.y, 0.0)
        };

        let p = perp * impulse.x + axis * impulse.z;
        let l_a = impulse.x * s1 + impulse.y + impulse.z * a1;
        let l_b = impulse.x * s2 + impulse.y + impulse.z * a2;

        c_a -= p * m_a;
        a_a -= i_a * l_a;
        c_b += p * m_b;
        a_b += i_b * l_b;

        data.positions[scratch.index_a] = c_a;
        data.angles[scratch.index_a] = a_a;
        data.positions[scratch.index_b] = c_b;
        data.angles[scratch.index_b] = a_b;

        linear_error <= data.linear_slop && angular_error <= data.angular_slop
    }
}
