use glam::{Mat4, Vec2, Vec3};

/// A world-space ray with unit direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self {
            origin,
            dir: dir.normalize(),
        }
    }

    /// Build a picking ray from a pointer position in physical pixels.
    ///
    /// The pixel is mapped to NDC and unprojected through the inverse
    /// view-projection at depth 0 and depth 1 (wgpu's 0..1 clip range);
    /// the ray originates at the camera position and points through the
    /// pixel.
    pub fn from_screen(
        pixel: Vec2,
        viewport: Vec2,
        inv_view_proj: Mat4,
        camera_pos: Vec3,
    ) -> Self {
        let ndc = Vec2::new(
            2.0 * pixel.x / viewport.x - 1.0,
            1.0 - 2.0 * pixel.y / viewport.y,
        );
        let near = inv_view_proj.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inv_view_proj.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Self::new(camera_pos, far - near)
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }

    /// Intersect with the plane through `point` with normal `normal`.
    /// Returns the hit point, or `None` when the ray is parallel to the
    /// plane or the plane lies behind the origin.
    pub fn intersect_plane(&self, point: Vec3, normal: Vec3) -> Option<Vec3> {
        let denom = self.dir.dot(normal);
        if denom.abs() < 1e-8 {
            return None;
        }
        let t = (point - self.origin).dot(normal) / denom;
        if t < 0.0 {
            return None;
        }
        Some(self.at(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4Swizzles;

    fn test_matrices() -> (Mat4, Mat4, Vec3) {
        let eye = Vec3::new(0.0, 0.0, 3.0);
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        let proj =
            Mat4::perspective_rh(45f32.to_radians(), 800.0 / 600.0, 0.1, 100.0);
        (view, proj, eye)
    }

    #[test]
    fn test_center_pixel_looks_forward() {
        let (view, proj, eye) = test_matrices();
        let inv_vp = (proj * view).inverse();
        let ray = Ray::from_screen(
            Vec2::new(400.0, 300.0),
            Vec2::new(800.0, 600.0),
            inv_vp,
            eye,
        );
        assert!((ray.origin - eye).length() < 1e-5);
        // Camera looks down -Z toward the origin.
        assert!((ray.dir - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-4);
    }

    #[test]
    fn test_ray_passes_through_projected_point() {
        let (view, proj, eye) = test_matrices();
        let vp = proj * view;
        let world = Vec3::new(0.4, -0.2, 0.5);
        let clip = vp * world.extend(1.0);
        let ndc = clip.xyz() / clip.w;
        let pixel = Vec2::new(
            (ndc.x + 1.0) * 0.5 * 800.0,
            (1.0 - ndc.y) * 0.5 * 600.0,
        );
        let ray = Ray::from_screen(pixel, Vec2::new(800.0, 600.0), vp.inverse(), eye);
        // Distance from `world` to the ray must be tiny.
        let to_point = world - ray.origin;
        let closest = ray.origin + ray.dir * to_point.dot(ray.dir);
        assert!((closest - world).length() < 1e-3);
    }

    #[test]
    fn test_plane_intersection() {
        let ray = Ray::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let hit = ray.intersect_plane(Vec3::ZERO, Vec3::Y).unwrap();
        assert!((hit - Vec3::ZERO).length() < 1e-6);
    }

    #[test]
    fn test_plane_parallel_misses() {
        let ray = Ray::new(Vec3::new(0.0, 2.0, 0.0), Vec3::X);
        assert!(ray.intersect_plane(Vec3::ZERO, Vec3::Y).is_none());
    }

    #[test]
    fn test_plane_behind_origin_misses() {
        let ray = Ray::new(Vec3::new(0.0, 2.0, 0.0), Vec3::Y);
        assert!(ray.intersect_plane(Vec3::ZERO, Vec3::Y).is_none());
    }
}
