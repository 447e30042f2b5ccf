//! Rigid-body dynamics: the body interface consumed by the solver,
//! and the joint constraint solver itself.

pub mod rigid_body;
pub mod solver;
