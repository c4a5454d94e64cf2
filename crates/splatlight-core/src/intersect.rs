use glam::Vec3;

use crate::ray::Ray;

const EPSILON: f32 = 1e-7;

/// Möller–Trumbore ray/triangle intersection. Returns the ray parameter
/// `t` for the hit, or `None` on a miss. Both triangle windings are
/// accepted; gizmo handles must pick from either side.
pub fn ray_triangle(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let pvec = ray.dir.cross(edge2);
    let det = edge1.dot(pvec);
    if det.abs() < EPSILON {
        // Ray parallel to the triangle plane.
        return None;
    }
    let inv_det = 1.0 / det;
    let tvec = ray.origin - v0;
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let qvec = tvec.cross(edge1);
    let v = ray.dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(qvec) * inv_det;
    if t < EPSILON {
        return None;
    }
    Some(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> (Vec3, Vec3, Vec3) {
        (
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_hit_through_center() {
        let (v0, v1, v2) = unit_triangle();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let t = ray_triangle(&ray, v0, v1, v2).unwrap();
        let hit = ray.at(t);
        assert!((hit - Vec3::ZERO).length() < 1e-5);
        assert!((t - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_hit_from_behind() {
        // No backface culling: approaching from -Z also hits.
        let (v0, v1, v2) = unit_triangle();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(ray_triangle(&ray, v0, v1, v2).is_some());
    }

    #[test]
    fn test_miss_outside() {
        let (v0, v1, v2) = unit_triangle();
        let ray = Ray::new(Vec3::new(2.0, 2.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(ray_triangle(&ray, v0, v1, v2).is_none());
    }

    #[test]
    fn test_miss_parallel() {
        let (v0, v1, v2) = unit_triangle();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::X);
        assert!(ray_triangle(&ray, v0, v1, v2).is_none());
    }

    #[test]
    fn test_miss_behind_origin() {
        let (v0, v1, v2) = unit_triangle();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(ray_triangle(&ray, v0, v1, v2).is_none());
    }

    #[test]
    fn test_hit_point_accuracy() {
        // Skewed triangle, oblique ray: ||origin + t*dir - hit|| < 1e-5.
        let v0 = Vec3::new(0.3, -0.7, 1.2);
        let v1 = Vec3::new(1.9, 0.1, 0.8);
        let v2 = Vec3::new(0.2, 1.4, 1.0);
        let inside = (v0 + v1 + v2) / 3.0;
        let origin = Vec3::new(-2.0, 3.0, 7.0);
        let ray = Ray::new(origin, inside - origin);
        let t = ray_triangle(&ray, v0, v1, v2).unwrap();
        assert!((ray.at(t) - inside).length() < 1e-5);
    }
}
