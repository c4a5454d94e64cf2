use glam::{Mat4, Quat, Vec3};

use crate::angles::quat_from_euler;

/// Position, Euler rotation, non-uniform scale and a rotation/scale pivot.
/// Composes as `T * T_pivot * R * S * T_pivot^-1`, so rotation and scale
/// happen about the pivot while `position` stays the object's anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Intrinsic XYZ Euler angles, radians.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub pivot: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            pivot: Vec3::ZERO,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn rotation_quat(&self) -> Quat {
        quat_from_euler(self.rotation)
    }

    /// The composed model matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_translation(self.pivot)
            * Mat4::from_quat(self.rotation_quat())
            * Mat4::from_scale(self.scale)
            * Mat4::from_translation(-self.pivot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_identity() {
        assert_eq!(Transform::default().matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_plain_trs_with_zero_pivot() {
        let t = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Vec3::new(0.2, -0.4, 0.6),
            scale: Vec3::new(2.0, 1.0, 0.5),
            pivot: Vec3::ZERO,
        };
        let expected = Mat4::from_scale_rotation_translation(
            t.scale,
            t.rotation_quat(),
            t.position,
        );
        let m = t.matrix();
        for c in 0..4 {
            assert!((m.col(c) - expected.col(c)).length() < 1e-6);
        }
    }

    #[test]
    fn test_rotation_about_pivot() {
        // Rotating 90 deg about Y with pivot (1,0,0): the pivot point is a
        // fixed point of the rotation/scale part.
        let t = Transform {
            position: Vec3::ZERO,
            rotation: Vec3::new(0.0, FRAC_PI_2, 0.0),
            scale: Vec3::ONE,
            pivot: Vec3::new(1.0, 0.0, 0.0),
        };
        let fixed = t.matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!((fixed - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
        // The origin swings around the pivot.
        let moved = t.matrix().transform_point3(Vec3::ZERO);
        assert!((moved - Vec3::new(1.0, 0.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn test_position_composes_after_pivot() {
        let t = Transform {
            position: Vec3::new(0.0, 5.0, 0.0),
            rotation: Vec3::ZERO,
            scale: Vec3::splat(2.0),
            pivot: Vec3::new(1.0, 0.0, 0.0),
        };
        // Scale about pivot then translate: pivot maps to pivot + position.
        let p = t.matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(1.0, 5.0, 0.0)).length() < 1e-6);
    }
}
