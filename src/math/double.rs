#![allow(unused)] // Not all aliases are used with every feature combination.

use bevy_math::{DMat2, DVec2, DVec3};

/// The floating point number type used by the crate.
pub type Scalar = f64;

/// The 2D vector type used by the crate.
pub type Vector = DVec2;

/// The 3D vector type used by the crate.
pub type Vector3 = DVec3;

/// The 2x2 matrix type used by the crate.
pub type Matrix2 = DMat2;

/// The value of π.
pub const PI: Scalar = core::f64::consts::PI;

/// The value of 2π.
pub const TAU: Scalar = core::f64::consts::TAU;
