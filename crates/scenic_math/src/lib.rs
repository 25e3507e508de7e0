//! # scenic_math - Scene Math
//!
//! Small set of math primitives shared by the exporter, the loader and the
//! scene graph: vectors, quaternions, matrices, transforms and bounds.

pub mod bounds;
pub mod matrix;
pub mod quaternion;
pub mod transform;
pub mod vector;

pub use bounds::*;
pub use matrix::*;
pub use quaternion::*;
pub use transform::*;
pub use vector::*;

/// Common math constants
pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const DEG_TO_RAD: f32 = PI / 180.0;
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Convert degrees to radians
#[inline]
pub fn radians(degrees: f32) -> f32 {
    degrees * consts::DEG_TO_RAD
}

/// Convert radians to degrees
#[inline]
pub fn degrees(radians: f32) -> f32 {
    radians * consts::RAD_TO_DEG
}

pub mod prelude {
    pub use crate::bounds::AABB;
    pub use crate::matrix::Mat4;
    pub use crate::quaternion::Quat;
    pub use crate::transform::Transform;
    pub use crate::vector::{Vec2, Vec3};
    pub use crate::{degrees, radians};
}
