//! [`WeldJoint`]: glues two bodies together, removing all relative motion.

use crate::{
    dynamics::{rigid_body::RigidBody, solver::SolverData},
    math::{cross, cross_scalar, RecipOrZero, Rotation, Scalar, SymmetricMatrix3, Vector, Vector3, TAU},
};

// Point-to-point constraint
// C = p2 - p1
// Cdot = v2 - v1
//      = v2 + cross(w2, r2) - v1 - cross(w1, r1)
// J = [-I -r1_skew I r2_skew ]
//
// Angular constraint
// C = angle2 - angle1 - referenceAngle
// Cdot = w2 - w1
// J = [0 0 -1 0 0 1]

/// A weld joint removes all relative motion between two bodies, both
/// translation at the anchor and rotation.
///
/// With a non-zero [`frequency`](Self::frequency) the angular part becomes
/// soft, letting the weld flex slightly under load. A truly rigid
/// connection is better modeled as a single body; a weld can still bend
/// under heavy load because the solver is iterative.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct WeldJoint {
    /// The attachment point in the first body's local frame.
    pub local_anchor_a: Vector,
    /// The attachment point in the second body's local frame.
    pub local_anchor_b: Vector,
    /// The second body's angle relative to the first at rest, in radians.
    pub reference_angle: Scalar,
    /// The flex frequency in Hz. Zero makes the weld rigid.
    pub frequency: Scalar,
    /// The damping ratio. 0 = no damping, 1 = critical damping.
    pub damping_ratio: Scalar,
    #[cfg_attr(feature = "serialize", serde(skip))]
    solver_data: WeldJointSolverData,
}

/// Cached per-tick solver state for [`WeldJoint`].
#[derive(Clone, Debug, Default, PartialEq)]
struct WeldJointSolverData {
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
    mass: SymmetricMatrix3,
    impulse: Vector3,
    bias: Scalar,
    gamma: Scalar,
}

impl WeldJoint {
    /// Creates a new weld joint from local anchor points.
    pub fn new(local_anchor_a: Vector, local_anchor_b: Vector) -> Self {
        Self {
            local_anchor_a,
            local_anchor_b,
            reference_angle: 0.0,
            frequency: 0.0,
            damping_ratio: 0.0,
            solver_data: WeldJointSolverData::default(),
        }
    }

    /// Creates a new weld joint gluing both bodies together at a
    /// world-space point, using the bodies' current relative angle as the
    /// rest angle.
    pub fn at_world_point(body_a: &RigidBody, body_b: &RigidBody, world_anchor: Vector) -> Self {
        Self {
            reference_angle: body_b.rotation.as_radians() - body_a.rotation.as_radians(),
            ..Self::new(
                body_a.local_point(world_anchor),
                body_b.local_point(world_anchor),
            )
        }
    }

    /// Sets the flex frequency and damping ratio, making the angular part
    /// of the weld soft.
    pub fn with_spring(mut self, frequency: Scalar, damping_ratio: Scalar) -> Self {
        if frequency < 0.0 || damping_ratio < 0.0 {
            log::debug!("weld joint spring ({frequency}, {damping_ratio}) clamped to 0");
        }
        self.frequency = frequency.max(0.0);
        self.damping_ratio = damping_ratio.max(0.0);
        self
    }

    /// Returns the force the joint applied at the anchor during the last
    /// solve.
    pub fn reaction_force(&self, inv_dt: Scalar) -> Vector {
        let impulse = self.solver_data.impulse;
        Vector::new(impulse.x, impulse.y) * inv_dt
    }

    /// Returns the torque the joint applied during the last solve.
    pub fn reaction_torque(&self, inv_dt: Scalar) -> Scalar {
        self.solver_data.impulse.z * inv_dt
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

        let k = SymmetricMatrix3::new(
            m_a + m_b + r_a.y * r_a.y * i_a + r_b.y * r_b.y * i_b,
            -r_a.y * r_a.x * i_a - r_b.y * r_b.x * i_b,
            -r_a.y * i_a - r_b.y * i_b,
            m_a + m_b + r_a.x * r_a.x * i_a + r_b.x * r_b.x * i_b,
            r_a.x * i_a + r_b.x * i_b,
            i_a + i_b,
        );

        if self.frequency > 0.0 {
            scratch.mass = k.inverse22();

            let mut inv_m = i_a + i_b;
            let m = inv_m.recip_or_zero();

            let c = a_b - a_a - self.reference_angle;

            // Frequency
            let omega = TAU * self.frequency;

            // Damping coefficient
            let d = 2.0 * m * self.damping_ratio * omega;

            // Spring stiffness
            let spring_k = m * omega * omega;

            // Magic formulas
            let h = data.frame_time;
            scratch.gamma = (h * (d + h * spring_k)).recip_or_zero();
            scratch.bias = c * h * spring_k * scratch.gamma;

            inv_m += scratch.gamma;
            scratch.mass.m22 = inv_m.recip_or_zero();
        } else if k.m22 == 0.0 {
            scratch.mass = k.inverse22();
            scratch.gamma = 0.0;
            scratch.bias = 0.0;
        } else {
            scratch.mass = k.sym_inverse33();
            scratch.gamma = 0.0;
            scratch.bias = 0.0;
        }

        if data.warm_starting {
            // Scale impulses to support a variable time step.
            scratch.impulse *= data.dt_ratio;

            let p = Vector::new(scratch.impulse.x, scratch.impulse.y);

            v_a -= p * m_a;
            w_a -= i_a * (cross(r_a, p) + scratch.impulse.z);
            v_b += p * m_b;
            w_b += i_b * (cross(r_b, p) + scratch.impulse.z);
        } else {
            scratch.impulse = Vector3::ZERO;
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

        if self.frequency > 0.0 {
            let c_dot2 = w_b - w_a;

            let impulse2 =
                -scratch.mass.m22 * (c_dot2 + scratch.bias + scratch.gamma * scratch.impulse.z);
            scratch.impulse.z += impulse2;

            w_a -= i_a * impulse2;
            w_b += i_b * impulse2;

            let c_dot1 =
                v_b + cross_scalar(w_b, scratch.r_b) - v_a - cross_scalar(w_a, scratch.r_a);

            let impulse1 = -scratch.mass.mul22(c_dot1);
            scratch.impulse.x += impulse1.x;
            scratch.impulse.y += impulse1.y;

            let p = impulse1;

            v_a -= p * m_a;
            w_a -= i_a * cross(scratch.r_a, p);
            v_b += p * m_b;
            w_b += i_b * cross(scratch.r_b, p);
        } else {
            let c_dot1 =
                v_b + cross_scalar(w_b, scratch.r_b) - v_a - cross_scalar(w_a, scratch.r_a);
            let c_dot2 = w_b - w_a;
            let c_dot = Vector3::new(c_dot1.x, c_dot1.y, c_dot2);

            let impulse = -scratch.mass.mul_vector3(c_dot);
            scratch.impulse += impulse;

            let p = Vector::new(impulse.x, impulse.y);

            v_a -= p * m_a;
            w_a -= i_a * (cross(scratch.r_a, p) + impulse.z);
            v_b += p * m_b;
            w_b += i_b * (cross(scratch.r_b, p) + impulse.z);
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

        let r_a = q_a * (self.local_anchor_a - scratch.local_center_a);
        let r_b = q_b * (self.local_anchor_b - scratch.local_center_b);

        let position_error;
        let angular_error;

        let k = SymmetricMatrix3::new(
            m_a + m_b + r_a.y * r_a.y * i_a + r_b.y * r_b.y * i_b,
            -r_a.y * r_a.x * i_a - r_b.y * r_b.x * i_b,
            -r_a.y * i_a - r_b.y * i_b,
            m_a + m_b + r_a.x * r_a.x * i_a + r_b.x * r_b.x * i_b,
            r_a.x * i_a + r_b.x * i_b,
            i_a + i_b,
        );

        if self.frequency > 0.0 {
            let c1 = c_b + r_b - c_a - r_a;

            position_error = c1.length();
            angular_error = 0.0;

            let p = -k.solve22(c1);

            c_a -= p * m_a;
            a_a -= i_a * cross(r_a, p);
            c_b += p * m_b;
            a_b += i_b * cross(r_b, p);
        } else {
            let c1 = c_b + r_b - c_a - r_a;
            let c2 = a_b - a_a - self.reference_angle;

            position_error = c1.length();
            angular_error = c2.abs();

            let c = Vector3::new(c1.x, c1.y, c2);

            let impulse = if k.m22 > 0.0 {
                -k.solve33(c)
            } else {
                let impulse2 = -k.solve22(c1);
                Vector3::new(impulse2.x, impulse2.y, 0.0)
            };

            let p = Vector::new(impulse.x, impulse.y);

            c_a -= p * m_a;
            a_a -= i_a * (cross(r_a, p) + impulse.z);
            c_b += p * m_b;
            a_b += i_b * (cross(r_b, p) + impulse.z);
        }

        data.positions[scratch.index_a] = c_a;
        data.angles[scratch.index_a] = a_a;
        data.positions[scratch.index_b] = c_b;
        data.angles[scratch.index_b] = a_b;

        position_error <= data.linear_slop && angular_error <= data.angular_slop
    }
}
