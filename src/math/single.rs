#![allow(unused)] // Not all aliases are used with every feature combination.

use bevy_math::{Mat2, Vec2, Vec3};

/// The floating point number type used by the crate.
pub type Scalar = f32;

/// The 2D vector type used by the crate.
pub type Vector = Vec2;

/// The 3D vector type used by the crate.
pub type Vector3 = Vec3;

/// The 2x2 matrix type used by the crate.
pub type Matrix2 = Mat2;

/// The value of π.
pub const PI: Scalar = core::f32::consts::PI;

/// The value of 2π.
pub const TAU: Scalar = core::f32::consts::TAU;
