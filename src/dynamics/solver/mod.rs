//! The sequential-impulse joint solver.
//!
//! The solver operates on per-island arrays of body state supplied by the
//! outer physics step. Within one island, joints are solved strictly
//! sequentially; each impulse is written back to the island arrays
//! immediately so that subsequent constraints in the same pass observe it.
//! The solve order affects convergence speed but not correctness.

pub mod joint_graph;
pub mod joints;

use crate::{
    dynamics::rigid_body::RigidBody,
    math::{Scalar, Vector},
};
use joints::Joint;

/// Tunable parameters of the joint solver.
///
/// These are operational tuning knobs, injected into [`SolverData`] each
/// tick rather than compiled in, so that physics tuning can be changed at
/// runtime and tests can supply their own values.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverSettings {
    /// The positional tolerance below which a linear constraint error is
    /// considered satisfied. Chasing exact zero error would make the solver
    /// jitter forever.
    pub linear_slop: Scalar,
    /// The angular equivalent of [`linear_slop`](Self::linear_slop), in radians.
    pub angular_slop: Scalar,
    /// The maximum linear position correction applied in a single solver pass.
    pub max_linear_correction: Scalar,
    /// The maximum angular position correction applied in a single solver pass, in radians.
    pub max_angular_correction: Scalar,
    /// Whether accumulated impulses from the previous tick are applied at
    /// constraint initialization to seed the iterative solver.
    pub warm_starting: bool,
    /// The number of velocity-solving passes per tick.
    pub velocity_iterations: usize,
    /// The maximum number of position-solving passes per tick.
    pub position_iterations: usize,
}

impl SolverSettings {
    /// The default linear slop, in meters.
    pub const DEFAULT_LINEAR_SLOP: Scalar = 0.005;
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            linear_slop: Self::DEFAULT_LINEAR_SLOP,
            angular_slop: 2.0 / 180.0 * crate::math::PI,
            max_linear_correction: 0.2,
            max_angular_correction: 8.0 / 180.0 * crate::math::PI,
            warm_starting: true,
            velocity_iterations: 8,
            position_iterations: 3,
        }
    }
}

/// The per-tick context handed to every solver phase.
///
/// The position and velocity arrays are shared by all bodies of the batch.
/// A body's entry lives at `island_offset + island_index`; the offset allows
/// several islands to be packed into the same backing arrays.
pub struct SolverData<'a> {
    /// The duration of the tick in seconds.
    pub frame_time: Scalar,
    /// The inverse of [`frame_time`](Self::frame_time).
    pub inv_dt: Scalar,
    /// The ratio of this tick's time step to the previous tick's.
    ///
    /// Used to rescale warm-started impulses under variable time steps.
    pub dt_ratio: Scalar,
    /// Whether warm starting is enabled for this tick.
    pub warm_starting: bool,
    /// See [`SolverSettings::linear_slop`].
    pub linear_slop: Scalar,
    /// See [`SolverSettings::angular_slop`].
    pub angular_slop: Scalar,
    /// See [`SolverSettings::max_linear_correction`].
    pub max_linear_correction: Scalar,
    /// See [`SolverSettings::max_angular_correction`].
    pub max_angular_correction: Scalar,
    /// The offset of this island's bodies within the shared arrays.
    pub island_offset: usize,
    /// The world-space positions of the bodies.
    pub positions: &'a mut [Vector],
    /// The rotation angles of the bodies, in radians.
    pub angles: &'a mut [Scalar],
    /// The linear velocities of the bodies.
    pub linear_velocities: &'a mut [Vector],
    /// The angular velocities of the bodies, in radians per second.
    pub angular_velocities: &'a mut [Scalar],
}

impl<'a> SolverData<'a> {
    /// Returns the index of the given body within the shared island arrays.
    #[inline]
    pub fn body_index(&self, body: &RigidBody) -> usize {
        self.island_offset + body.island_index
    }
}

/// Initializes the velocity constraints of every enabled joint.
///
/// Must be called exactly once per tick before any solving pass. Applies
/// warm-started impulses to the island velocities when enabled.
pub fn init_velocity_constraints(
    joints: &mut [Joint],
    bodies: &[RigidBody],
    data: &mut SolverData,
) {
    for joint in joints.iter_mut() {
        if !joint.enabled {
            continue;
        }

        let body_a = &bodies[joint.body_a.index()];
        let body_b = &bodies[joint.body_b.index()];
        joint.init_velocity_constraints(body_a, body_b, data);
    }
}

/// Runs one velocity-solving pass over every enabled joint.
pub fn solve_velocity_constraints(joints: &mut [Joint], data: &mut SolverData) {
    for joint in joints.iter_mut() {
        if !joint.enabled {
            continue;
        }

        joint.solve_velocity_constraints(data);
    }
}

/// Runs one position-solving pass over every enabled joint.
///
/// Returns `true` when every joint reported a position error within
/// tolerance, letting the caller stop iterating early.
pub fn solve_position_constraints(joints: &mut [Joint], data: &mut SolverData) -> bool {
    let mut solved = true;

    for joint in joints.iter_mut() {
        if !joint.enabled {
            continue;
        }

        solved &= joint.solve_position_constraints(data);
    }

    solved
}

/// Checks the breakpoint of every joint, disabling joints whose reaction
/// force exceeded it.
///
/// Disabling is not removal: a broken joint stays in place, inert, until
/// the owning system reacts to it.
pub fn validate_joints(joints: &mut [Joint], inv_dt: Scalar) {
    for joint in joints.iter_mut() {
        joint.validate(inv_dt);
    }
}

/// Runs the full per-tick solving sequence over the given joints:
/// one initialization, `velocity_iterations` velocity passes,
/// up to `position_iterations` position passes with early exit,
/// and a final breakpoint validation.
///
/// Callers that integrate velocities into positions between the velocity
/// and position phases should invoke the individual phase functions instead.
///
/// Returns `true` if the position errors of all joints were solved to
/// within tolerance.
pub fn solve_joints(
    joints: &mut [Joint],
    bodies: &[RigidBody],
    data: &mut SolverData,
    velocity_iterations: usize,
    position_iterations: usize,
) -> bool {
    init_velocity_constraints(joints, bodies, data);

    for _ in 0..velocity_iterations {
        solve_velocity_constraints(joints, data);
    }

    let mut position_solved = false;

    for _ in 0..position_iterations {
        if solve_position_constraints(joints, data) {
            position_solved = true;
            break;
        }
    }

    validate_joints(joints, data.inv_dt);

    position_solved
}
