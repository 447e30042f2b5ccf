//! [`RevoluteJoint`]: a hinge pinning two bodies at a shared point.

use crate::{
    dynamics::{rigid_body::RigidBody, solver::SolverData},
    math::{cross, cross_scalar, solve22, Matrix2, RecipOrZero, Rotation, Scalar, Vector},
};

use super::AngleLimit;

// Point-to-point constraint
// C = p2 - p1
// Cdot = v2 - v1
//      = v2 + cross(w2, r2) - v1 - cross(w1, r1)
// J = [-I -r1_skew I r2_skew ]
//
// Motor constraint
// Cdot = w2 - w1
// J = [0 0 -1 0 0 1]
// K = invI1 + invI2

/// A revolute joint pins two bodies together at an anchor point while
/// letting them rotate freely relative to each other, like a hinge or pin.
///
/// The relative rotation can be restricted to an [`AngleLimit`] and driven
/// by a motor with a configurable speed and maximum torque.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct RevoluteJoint {
    /// The attachment point in the first body's local frame.
    pub local_anchor_a: Vector,
    /// The attachment point in the second body's local frame.
    pub local_anchor_b: Vector,
    /// The second body's angle relative to the first at rest, in radians.
    pub reference_angle: Scalar,
    /// Whether the rotation limit is enforced.
    pub enable_limit: bool,
    /// The lower and upper bounds on the relative rotation, in radians.
    pub limits: AngleLimit,
    /// Whether the motor is enabled.
    pub enable_motor: bool,
    /// The target angular velocity of the motor, in rad/s.
    pub motor_speed: Scalar,
    /// The maximum torque the motor may exert, in N·m.
    pub max_motor_torque: Scalar,
    #[cfg_attr(feature = "serialize", serde(skip))]
    solver_data: RevoluteJointSolverData,
}

/// Cached per-tick solver state for [`RevoluteJoint`].
#[derive(Clone, Debug, Default, PartialEq)]
struct RevoluteJointSolverData {
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
    k: Matrix2,
    axial_mass: Scalar,
    angle: Scalar,
    impulse: Vector,
    motor_impulse: Scalar,
    lower_impulse: Scalar,
    upper_impulse: Scalar,
}

impl RevoluteJoint {
    /// Creates a new revolute joint from local anchor points.
    pub fn new(local_anchor_a: Vector, local_anchor_b: Vector) -> Self {
        Self {
            local_anchor_a,
            local_anchor_b,
            reference_angle: 0.0,
            enable_limit: false,
            limits: AngleLimit::ZERO,
            enable_motor: false,
            motor_speed: 0.0,
            max_motor_torque: 0.0,
            solver_data: RevoluteJointSolverData::default(),
        }
    }

    /// Creates a new revolute joint pinning both bodies at a world-space
    /// point, using the bodies' current relative angle as the rest angle.
    pub fn at_world_point(body_a: &RigidBody, body_b: &RigidBody, world_anchor: Vector) -> Self {
        Self {
            reference_angle: body_b.rotation.as_radians() - body_a.rotation.as_radians(),
            ..Self::new(
                body_a.local_point(world_anchor),
                body_b.local_point(world_anchor),
            )
        }
    }

    /// Enables the rotation limit with the given bounds, in radians.
    pub fn with_angle_limits(mut self, min: Scalar, max: Scalar) -> Self {
        self.enable_limit = true;
        self.limits = AngleLimit::new(min.min(max), max.max(min));
        self.solver_data.lower_impulse = 0.0;
        self.solver_data.upper_impulse = 0.0;
        self
    }

    /// Enables the motor with the given target speed and maximum torque.
    pub fn with_motor(mut self, speed: Scalar, max_torque: Scalar) -> Self {
        if max_torque < 0.0 {
            log::debug!("revolute joint max motor torque {max_torque} clamped to 0");
        }
        self.enable_motor = true;
        self.motor_speed = speed;
        self.max_motor_torque = max_torque.max(0.0);
        self
    }

    /// Returns the force the joint applied at the anchor during the last
    /// solve. Limit and motor torques are reported separately by
    /// [`reaction_torque`](Self::reaction_torque).
    pub fn reaction_force(&self, inv_dt: Scalar) -> Vector {
        self.solver_data.impulse * inv_dt
    }

    /// Returns the motor and limit torque applied during the last solve.
    pub fn reaction_torque(&self, inv_dt: Scalar) -> Scalar {
        let data = &self.solver_data;
        inv_dt * (data.motor_impulse + data.lower_impulse - data.upper_impulse)
    }

    /// The current relative rotation of the connected bodies, in radians.
    pub fn joint_angle(&self) -> Scalar {
        self.solver_data.angle
    }

    fn fixed_rotation(&self) -> bool {
        self.solver_data.inv_i_a + self.solver_data.inv_i_b == 0.0
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

        scratch.r_a = q_a * (self.local_anchor_a - scratch.local_center_a);
        scratch.r_b = q_b * (self.local_anchor_b - scratch.local_center_b);

        let m_a = scratch.inv_mass_a;
        let m_b = scratch.inv_mass_b;
        let i_a = scratch.inv_i_a;
        let i_b = scratch.inv_i_b;

        let r_a = scratch.r_a;
        let r_b = scratch.r_b;

        scratch.k = Matrix2::from_cols(
            Vector::new(
                m_a + m_b + r_a.y * r_a.y * i_a + r_b.y * r_b.y * i_b,
                -r_a.y * r_a.x * i_a - r_b.y * r_b.x * i_b,
            ),
            Vector::new(
                -r_a.y * r_a.x * i_a - r_b.y * r_b.x * i_b,
                m_a + m_b + r_a.x * r_a.x * i_a + r_b.x * r_b.x * i_b,
            ),
        );

        scratch.axial_mass = (i_a + i_b).recip_or_zero();
        let fixed_rotation = i_a + i_b == 0.0;

        scratch.angle = a_b - a_a - self.reference_angle;
        if !self.enable_limit || fixed_rotation {
            scratch.lower_impulse = 0.0;
            scratch.upper_impulse = 0.0;
        }
        if !self.enable_motor || fixed_rotation {
            scratch.motor_impulse = 0.0;
        }

        if data.warm_starting {
            // Scale impulses to support a variable time step.
            scratch.impulse *= data.dt_ratio;
            scratch.motor_impulse *= data.dt_ratio;
            scratch.lower_impulse *= data.dt_ratio;
            scratch.upper_impulse *= data.dt_ratio;

            let axial_impulse =
                scratch.motor_impulse + scratch.lower_impulse - scratch.upper_impulse;
            let p = scratch.impulse;

            v_a -= p * m_a;
            w_a -= i_a * (cross(r_a, p) + axial_impulse);
            v_b += p * m_b;
            w_b += i_b * (cross(r_b, p) + axial_impulse);
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
        let fixed_rotation = self.fixed_rotation();
        let scratch = &mut self.solver_data;

        let mut v_a = data.linear_velocities[scratch.index_a];
        let mut w_a = data.angular_velocities[scratch.index_a];
        let mut v_b = data.linear_velocities[scratch.index_b];
        let mut w_b = data.angular_velocities[scratch.index_b];

        let m_a = scratch.inv_mass_a;
        let m_b = scratch.inv_mass_b;
        let i_a = scratch.inv_i_a;
        let i_b = scratch.inv_i_b;

        // Solve motor constraint.
        if self.enable_motor && !fixed_rotation {
            let c_dot = w_b - w_a - self.motor_speed;
            let mut impulse = -scratch.axial_mass * c_dot;
            let old_impulse = scratch.motor_impulse;
            let max_impulse = data.frame_time * self.max_motor_torque;
            scratch.motor_impulse =
                (scratch.motor_impulse + impulse).clamp(-max_impulse, max_impulse);
            impulse = scratch.motor_impulse - old_impulse;

            w_a -= i_a * impulse;
            w_b += i_b * impulse;
        }

        if self.enable_limit && !fixed_rotation {
            // Lower limit
            {
                let c = scratch.angle - self.limits.min;
                let c_dot = w_b - w_a;
                let mut impulse = -scratch.axial_mass * (c_dot + c.max(0.0) * data.inv_dt);
                let old_impulse = scratch.lower_impulse;
                scratch.lower_impulse = (scratch.lower_impulse + impulse).max(0.0);
                impulse = scratch.lower_impulse - old_impulse;

                w_a -= i_a * impulse;
                w_b += i_b * impulse;
            }

            // Upper limit
            // Note: signs are flipped to keep the impulse positive when the
            // constraint is active.
            {
                let c = self.limits.max - scratch.angle;
                let c_dot = w_a - w_b;
                let mut impulse = -scratch.axial_mass * (c_dot + c.max(0.0) * data.inv_dt);
                let old_impulse = scratch.upper_impulse;
                scratch.upper_impulse = (scratch.upper_impulse + impulse).max(0.0);
                impulse = scratch.upper_impulse - old_impulse;

                w_a += i_a * impulse;
                w_b -= i_b * impulse;
            }
        }

        // Solve point-to-point constraint.
        {
            let c_dot =
                v_b + cross_scalar(w_b, scratch.r_b) - v_a - cross_scalar(w_a, scratch.r_a);
            let impulse = -solve22(scratch.k, c_dot);

            scratch.impulse += impulse;

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

    pub(super) fn solve_position_constraints(&mut self, data: &mut SolverData) -> bool {
        let fixed_rotation = self.fixed_rotation();
        let scratch = &mut self.solver_data;

        let mut c_a = data.positions[scratch.index_a];
        let mut a_a = data.angles[scratch.index_a];
        let mut c_b = data.positions[scratch.index_b];
        let mut a_b = data.angles[scratch.index_b];

        let mut angular_error = 0.0;

        // Solve angular limit constraint.
        if self.enable_limit && !fixed_rotation {
            let angle = a_b - a_a - self.reference_angle;
            let mut c = 0.0;

            if (self.limits.max - self.limits.min).abs() < 2.0 * data.angular_slop {
                // Prevent large angular corrections.
                c = (angle - self.limits.min)
                    .clamp(-data.max_angular_correction, data.max_angular_correction);
            } else if angle <= self.limits.min {
                // Prevent large angular corrections and allow some slop.
                c = (angle - self.limits.min + data.angular_slop)
                    .clamp(-data.max_angular_correction, 0.0);
            } else if angle >= self.limits.max {
                // Prevent large angular corrections and allow some slop.
                c = (angle - self.limits.max - data.angular_slop)
                    .clamp(0.0, data.max_angular_correction);
            }

            let limit_impulse = -scratch.axial_mass * c;
            a_a -= scratch.inv_i_a * limit_impulse;
            a_b += scratch.inv_i_b * limit_impulse;
            angular_error = c.abs();
        }

        // Solve point-to-point constraint.
        let position_error;
        {
            let q_a = Rotation::radians(a_a);
            let q_b = Rotation::radians(a_b);

            let r_a = q_a * (self.local_anchor_a - scratch.local_center_a);
            let r_b = q_b * (self.local_anchor_b - scratch.local_center_b);

            let c = c_b + r_b - c_a - r_a;
            position_error = c.length();

            let m_a = scratch.inv_mass_a;
            let m_b = scratch.inv_mass_b;
            let i_a = scratch.inv_i_a;
            let i_b = scratch.inv_i_b;

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

            let impulse = -solve22(k, c);

            c_a -= impulse * m_a;
            a_a -= i_a * cross(r_a, impulse);
            c_b += impulse * m_b;
            a_b += i_b * cross(r_b, impulse);
        }

        data.positions[scratch.index_a] = c_a;
        data.angles[scratch.index_a] = a_a;
        data.positions[scratch.index_b] = c_b;
        data.angles[scratch.index_b] = a_b;

        position_error <= data.linear_slop && angular_error <= data.angular_slop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_point_constructor_uses_relative_angle() {
        let body_a = RigidBody::new()
            .with_mass(1.0)
            .with_rotation(Rotation::radians(0.5));
        let body_b = RigidBody::new()
            .with_mass(1.0)
            .with_rotation(Rotation::radians(1.0));

        let joint = RevoluteJoint::at_world_point(&body_a, &body_b, Vector::ZERO);
        approx::assert_relative_eq!(joint.reference_angle, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn angle_limits_are_ordered() {
        let joint = RevoluteJoint::new(Vector::ZERO, Vector::ZERO).with_angle_limits(1.0, -1.0);
        assert!(joint.enable_limit);
        assert_eq!(joint.limits.min, -1.0);
        assert_eq!(joint.limits.max, 1.0);
    }
}
