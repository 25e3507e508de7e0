//! Handedness conversion between the authoring space and the document
//!
//! Authoring tools are left-handed with rotations in degrees. Documents are
//! right-handed with rotations in radians. Converting flips the Z axis of
//! positions, directions and rotations; scale is never flipped.

use scenic_math::{degrees, radians, Quat, Vec3};

/// Authoring-space position to document position
#[inline]
pub fn position_to_document(p: Vec3) -> [f32; 3] {
    p.flip_z().to_array()
}

/// Document position back to authoring space
#[inline]
pub fn position_from_document(p: [f32; 3]) -> Vec3 {
    Vec3::from_array(p).flip_z()
}

/// Directions convert like positions
#[inline]
pub fn direction_to_document(d: Vec3) -> [f32; 3] {
    position_to_document(d)
}

/// Euler angles in degrees to document rotation (radians, Z negated)
pub fn rotation_to_document(euler_degrees: Vec3) -> [f32; 3] {
    [
        radians(euler_degrees.x),
        radians(euler_degrees.y),
        -radians(euler_degrees.z),
    ]
}

/// Document rotation back to authoring Euler angles in degrees
pub fn rotation_from_document(r: [f32; 3]) -> Vec3 {
    Vec3::new(degrees(r[0]), degrees(r[1]), -degrees(r[2]))
}

/// Document rotation as a quaternion in document space
pub fn rotation_quat(r: [f32; 3]) -> Quat {
    Quat::from_euler(r[0], r[1], r[2])
}

#[inline]
pub fn scale_to_document(s: Vec3) -> [f32; 3] {
    s.to_array()
}

#[inline]
pub fn scale_from_document(s: [f32; 3]) -> Vec3 {
    Vec3::from_array(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_position_flips_z_only() {
        assert_eq!(position_to_document(Vec3::new(1.0, 2.0, 3.0)), [1.0, 2.0, -3.0]);
        assert_eq!(scale_to_document(Vec3::new(1.0, 2.0, 3.0)), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_rotation_round_trip() {
        let euler = Vec3::new(30.0, -45.0, 90.0);
        let doc = rotation_to_document(euler);
        assert_relative_eq!(doc[2], -core::f32::consts::FRAC_PI_2, epsilon = 1e-6);
        let back = rotation_from_document(doc);
        assert_relative_eq!(back.x, euler.x, epsilon = 1e-4);
        assert_relative_eq!(back.y, euler.y, epsilon = 1e-4);
        assert_relative_eq!(back.z, euler.z, epsilon = 1e-4);
    }
}
