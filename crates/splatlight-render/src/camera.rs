use glam::{Mat4, Vec3};

/// Orbit camera around a focus point. Feeds the shared scene uniform; the
/// renderer core only ever sees the matrices.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub focus: Vec3,
    pub distance: f32,
    /// Radians around +Y.
    pub yaw: f32,
    /// Radians above the horizon, clamped short of the poles.
    pub pitch: f32,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            focus: Vec3::ZERO,
            distance: 5.0,
            yaw: 0.0,
            pitch: 0.35,
            fov_y: 45f32.to_radians(),
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl OrbitCamera {
    pub fn position(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.focus + Vec3::new(cp * sy, sp, cp * cy) * self.distance
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.focus, Vec3::Y)
    }

    pub fn projection(&self, width: u32, height: u32) -> Mat4 {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far)
    }

    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-1.54, 1.54);
    }

    pub fn dolly(&mut self, factor: f32) {
        self.distance = (self.distance * factor).clamp(0.01, 1e5);
    }

    /// Pan the focus in the camera's screen plane by pixel deltas.
    pub fn pan(&mut self, dx_px: f32, dy_px: f32, viewport_height: f32) {
        let world_per_pixel =
            2.0 * self.distance * (self.fov_y * 0.5).tan() / viewport_height.max(1.0);
        let view = self.view();
        let right = Vec3::new(view.x_axis.x, view.y_axis.x, view.z_axis.x);
        let up = Vec3::new(view.x_axis.y, view.y_axis.y, view.z_axis.y);
        self.focus += (-right * dx_px + up * dy_px) * world_per_pixel;
    }

    /// Frame a bounding sphere so it fills most of the view.
    pub fn frame(&mut self, center: Vec3, radius: f32) {
        self.focus = center;
        let r = radius.max(0.01);
        self.distance = r / (self.fov_y * 0.5).sin() * 1.2;
        self.near = (self.distance - r * 4.0).max(r * 0.001).max(0.001);
        self.far = self.distance + r * 10.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_at_zero_angles() {
        let cam = OrbitCamera {
            yaw: 0.0,
            pitch: 0.0,
            distance: 3.0,
            focus: Vec3::ZERO,
            ..Default::default()
        };
        assert!((cam.position() - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn test_view_looks_at_focus() {
        let cam = OrbitCamera {
            focus: Vec3::new(1.0, 2.0, 3.0),
            ..Default::default()
        };
        let view = cam.view();
        let focus_view = view.transform_point3(cam.focus);
        // The focus projects onto the view axis, straight ahead.
        assert!(focus_view.x.abs() < 1e-4);
        assert!(focus_view.y.abs() < 1e-4);
        assert!(focus_view.z < 0.0);
    }

    #[test]
    fn test_pitch_clamped() {
        let mut cam = OrbitCamera::default();
        cam.orbit(0.0, 10.0);
        assert!(cam.pitch <= 1.54);
        cam.orbit(0.0, -20.0);
        assert!(cam.pitch >= -1.54);
    }

    #[test]
    fn test_frame_contains_sphere() {
        let mut cam = OrbitCamera::default();
        cam.frame(Vec3::new(5.0, 0.0, 0.0), 2.0);
        assert_eq!(cam.focus, Vec3::new(5.0, 0.0, 0.0));
        // The sphere fits inside the vertical field of view.
        let half_angle = (2.0f32 / cam.distance).asin();
        assert!(half_angle < cam.fov_y * 0.5);
        assert!(cam.near > 0.0 && cam.far > cam.distance);
    }
}
