//! # Impulse2D
//!
//! **Impulse2D** is a 2D joint constraint solver based on the *sequential impulse*
//! method. It computes and applies corrective impulses so that pairs of rigid
//! bodies obey geometric constraints, and is designed to be driven by an outer
//! physics step that owns integration, island building, and collision handling.
//!
//! The solver supports:
//!
//! - **Warm starting**: accumulated impulses from the previous tick seed the
//!   iterative solver close to the converged solution, scaled by the time step
//!   ratio to stay consistent under variable time steps.
//! - **Soft constraints**: joints with spring-damper tuning tolerate some
//!   steady-state error instead of being solved rigidly.
//! - **Limits and motors**: one-sided limit impulses and force/torque-clamped
//!   motors using accumulated-impulse clamping.
//! - **Position correction**: a separate position-solving phase removes the
//!   drift that velocity-only solving leaves behind.
//!
//! # Joints
//!
//! | Joint              | Constrained DOF                 |
//! | ------------------ | ------------------------------- |
//! | [`DistanceJoint`]  | 1 translation                   |
//! | [`FrictionJoint`]  | 2 translations, 1 rotation (velocity only) |
//! | [`MouseJoint`]     | 2 translations (always soft)    |
//! | [`PrismaticJoint`] | 1 translation, 1 rotation       |
//! | [`RevoluteJoint`]  | 2 translations                  |
//! | [`WeldJoint`]      | 2 translations, 1 rotation      |
//!
//! [`DistanceJoint`]: crate::dynamics::solver::joints::DistanceJoint
//! [`FrictionJoint`]: crate::dynamics::solver::joints::FrictionJoint
//! [`MouseJoint`]: crate::dynamics::solver::joints::MouseJoint
//! [`PrismaticJoint`]: crate::dynamics::solver::joints::PrismaticJoint
//! [`RevoluteJoint`]: crate::dynamics::solver::joints::RevoluteJoint
//! [`WeldJoint`]: crate::dynamics::solver::joints::WeldJoint
//!
//! # Solving protocol
//!
//! Each simulation tick, for every island, the caller is expected to:
//!
//! 1. Call [`init_velocity_constraints`] once per joint.
//! 2. Run `N` passes of [`solve_velocity_constraints`] over every joint.
//! 3. Integrate velocities into positions (owned by the outer solver).
//! 4. Run `M` passes of [`solve_position_constraints`], stopping early once
//!    every joint reports that its position error is within tolerance.
//! 5. Call [`validate_joints`] to disable joints whose reaction force exceeded
//!    their breakpoint.
//!
//! [`solve_joints`] bundles this sequence for callers that do not interleave
//! integration with the solver phases.
//!
//! [`init_velocity_constraints`]: crate::dynamics::solver::init_velocity_constraints
//! [`solve_velocity_constraints`]: crate::dynamics::solver::solve_velocity_constraints
//! [`solve_position_constraints`]: crate::dynamics::solver::solve_position_constraints
//! [`validate_joints`]: crate::dynamics::solver::validate_joints
//! [`solve_joints`]: crate::dynamics::solver::solve_joints

#[cfg(all(feature = "f32", feature = "f64"))]
compile_error!("feature \"f32\" and feature \"f64\" cannot be enabled at the same time");

#[cfg(all(not(feature = "f32"), not(feature = "f64")))]
compile_error!("either feature \"f32\" or feature \"f64\" must be enabled");

pub mod data_structures;
pub mod dynamics;
pub mod math;

/// Re-exports the most common types and functions.
pub mod prelude {
    pub use crate::{
        dynamics::{
            rigid_body::{BodyId, RigidBody},
            solver::{
                init_velocity_constraints, joint_graph::*, joints::*, solve_joints,
                solve_position_constraints, solve_velocity_constraints, validate_joints,
                SolverData, SolverSettings,
            },
        },
        math::*,
    };
}

#[cfg(test)]
mod tests;
