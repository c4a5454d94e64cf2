//! Euler/quaternion conversion helpers. Intrinsic XYZ order is used
//! everywhere so that gizmo targets and serialized transforms agree.

use glam::{EulerRot, Quat, Vec3};

/// Quaternion from intrinsic XYZ Euler angles (radians).
pub fn quat_from_euler(euler: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z)
}

/// Intrinsic XYZ Euler angles (radians) from a quaternion.
pub fn euler_from_quat(q: Quat) -> Vec3 {
    let (x, y, z) = q.to_euler(EulerRot::XYZ);
    Vec3::new(x, y, z)
}

/// Signed angle from `v_start` to `v_now` around `axis`: both vectors are
/// projected onto the plane perpendicular to the axis and renormalized
/// before the atan2. Returns 0 when either projection degenerates.
pub fn signed_angle_around_axis(v_start: Vec3, v_now: Vec3, axis: Vec3) -> f32 {
    let a = project_onto_plane(v_start, axis);
    let b = project_onto_plane(v_now, axis);
    if a.length_squared() < 1e-12 || b.length_squared() < 1e-12 {
        return 0.0;
    }
    let a = a.normalize();
    let b = b.normalize();
    a.cross(b).dot(axis).atan2(a.dot(b))
}

fn project_onto_plane(v: Vec3, normal: Vec3) -> Vec3 {
    v - normal * v.dot(normal)
}

/// Snap a value to the nearest multiple of `increment` (no-op when the
/// increment is non-positive).
pub fn snap(value: f32, increment: f32) -> f32 {
    if increment <= 0.0 {
        value
    } else {
        (value / increment).round() * increment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_euler_quat_round_trip() {
        // Outside the gimbal poles the round trip agrees to 1e-5.
        let cases = [
            Vec3::new(0.3, -0.7, 1.2),
            Vec3::new(-1.0, 0.4, -0.2),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.2, 0.9, -2.6),
        ];
        for euler in cases {
            let q = quat_from_euler(euler);
            let back = euler_from_quat(q);
            assert!(
                (back - euler).length() < 1e-5,
                "round trip failed for {euler:?}: got {back:?}"
            );
        }
    }

    #[test]
    fn test_quat_mat_quat_round_trip() {
        let q = quat_from_euler(Vec3::new(0.5, -1.1, 2.0));
        let m = glam::Mat4::from_quat(q);
        let (_, q2, _) = m.to_scale_rotation_translation();
        // Quaternion double cover: compare up to sign.
        let d = q.dot(q2).abs();
        assert!(d > 1.0 - 1e-5, "dot = {d}");
    }

    #[test]
    fn test_signed_angle_quarter_turn() {
        let a = signed_angle_around_axis(Vec3::X, Vec3::Z, Vec3::Y);
        assert!((a + FRAC_PI_2).abs() < 1e-6);
        let b = signed_angle_around_axis(Vec3::Z, Vec3::X, Vec3::Y);
        assert!((b - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_signed_angle_ignores_axis_component() {
        // Components along the axis are projected away first.
        let a = signed_angle_around_axis(
            Vec3::new(1.0, 5.0, 0.0),
            Vec3::new(0.0, -3.0, 1.0),
            Vec3::Y,
        );
        assert!((a + FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_signed_angle_degenerate() {
        assert_eq!(signed_angle_around_axis(Vec3::Y, Vec3::X, Vec3::Y), 0.0);
    }

    #[test]
    fn test_snap() {
        assert!((snap(0.26, 0.25) - 0.25).abs() < 1e-6);
        assert!((snap(87.0, 15.0) - 90.0).abs() < 1e-6);
        assert_eq!(snap(PI, 0.0), PI);
    }
}
