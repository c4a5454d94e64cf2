//! Analytic gizmo handle shapes.
//!
//! Each handle is a unit-primitive triangle mesh used both for rendering
//! and for ray picking, plus display state (priority, colors, visibility,
//! interactability). Shapes are built in gizmo-local space, oriented for
//! their axis; a per-frame `dynamic` matrix applies camera-dependent
//! adjustments (arc facing, plane flips).

use glam::{Mat4, Quat, Vec3};

use splatlight_core::intersect::ray_triangle;
use splatlight_core::Ray;

/// Handle identity: single axes, axis pairs (planes), the all-axis center
/// and the camera-facing ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisId {
    X,
    Y,
    Z,
    XY,
    XZ,
    YZ,
    XYZ,
    F,
}

impl AxisId {
    /// Unit axis for single-axis handles.
    pub fn axis(self) -> Option<Vec3> {
        match self {
            Self::X => Some(Vec3::X),
            Self::Y => Some(Vec3::Y),
            Self::Z => Some(Vec3::Z),
            _ => None,
        }
    }

    /// Normal of the plane spanned by a two-axis handle.
    pub fn plane_normal(self) -> Option<Vec3> {
        match self {
            Self::XY => Some(Vec3::Z),
            Self::XZ => Some(Vec3::Y),
            Self::YZ => Some(Vec3::X),
            _ => None,
        }
    }

    pub fn is_plane(self) -> bool {
        self.plane_normal().is_some()
    }

    /// Component axes highlighted together with a compound handle.
    pub fn components(self) -> &'static [AxisId] {
        match self {
            Self::XY => &[Self::X, Self::Y],
            Self::XZ => &[Self::X, Self::Z],
            Self::YZ => &[Self::Y, Self::Z],
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Arrow,
    Plane,
    Sphere,
    Arc,
    BoxLine,
}

pub struct Shape {
    pub axis: AxisId,
    pub kind: ShapeKind,
    /// Picking and render triangles, gizmo-local space.
    pub triangles: Vec<[Vec3; 3]>,
    /// Full-ring variant for arcs viewed down their axis.
    pub alt_triangles: Vec<[Vec3; 3]>,
    pub use_alt: bool,
    /// Camera-dependent per-frame adjustment.
    pub dynamic: Mat4,
    pub priority: i32,
    pub color: [f32; 3],
    pub hover_color: [f32; 3],
    pub disabled_color: [f32; 3],
    pub alpha: f32,
    pub hover_alpha: f32,
    pub visible: bool,
    pub interactable: bool,
    pub disabled: bool,
}

impl Shape {
    fn new(axis: AxisId, kind: ShapeKind, triangles: Vec<[Vec3; 3]>, priority: i32) -> Self {
        let color = axis_color(axis);
        Self {
            axis,
            kind,
            triangles,
            alt_triangles: Vec::new(),
            use_alt: false,
            dynamic: Mat4::IDENTITY,
            priority,
            color,
            hover_color: [1.0, 0.85, 0.25],
            disabled_color: [0.45, 0.45, 0.45],
            alpha: 1.0,
            hover_alpha: 1.0,
            visible: true,
            interactable: true,
            disabled: false,
        }
    }

    pub fn active_triangles(&self) -> &[[Vec3; 3]] {
        if self.use_alt && !self.alt_triangles.is_empty() {
            &self.alt_triangles
        } else {
            &self.triangles
        }
    }

    /// Closest ray hit against the handle under `world` (the gizmo frame
    /// composed with this shape's dynamic matrix).
    pub fn intersect(&self, ray: &Ray, world: &Mat4) -> Option<f32> {
        let mut best: Option<f32> = None;
        for tri in self.active_triangles() {
            let v0 = world.transform_point3(tri[0]);
            let v1 = world.transform_point3(tri[1]);
            let v2 = world.transform_point3(tri[2]);
            if let Some(t) = ray_triangle(ray, v0, v1, v2) {
                if best.is_none_or(|b| t < b) {
                    best = Some(t);
                }
            }
        }
        best
    }
}

fn axis_color(axis: AxisId) -> [f32; 3] {
    const X: [f32; 3] = [0.89, 0.21, 0.25];
    const Y: [f32; 3] = [0.42, 0.79, 0.15];
    const Z: [f32; 3] = [0.18, 0.52, 0.95];
    match axis {
        AxisId::X => X,
        AxisId::Y => Y,
        AxisId::Z => Z,
        AxisId::XY => [0.62, 0.52, 0.2],
        AxisId::XZ => [0.55, 0.36, 0.6],
        AxisId::YZ => [0.3, 0.66, 0.55],
        AxisId::XYZ => [0.82, 0.82, 0.82],
        AxisId::F => [0.9, 0.9, 0.9],
    }
}

/// Translate mode: three arrows, three planes, one center sphere. Each
/// arrow is two priority-ranked sub-shapes: the shaft line outranks the
/// tip cone, so where a shaft crosses another arrow's cone the shaft
/// picks first.
pub fn translate_shapes() -> Vec<Shape> {
    let mut shapes = Vec::new();
    for axis_id in [AxisId::X, AxisId::Y, AxisId::Z] {
        let axis = axis_id.axis().unwrap_or(Vec3::Z);
        let shaft = oriented(arrow_shaft_triangles(), axis);
        shapes.push(Shape::new(axis_id, ShapeKind::Arrow, shaft, 1));
        let tip = oriented(arrow_tip_triangles(), axis);
        shapes.push(Shape::new(axis_id, ShapeKind::Arrow, tip, 0));
    }
    for axis_id in [AxisId::XY, AxisId::YZ, AxisId::XZ] {
        let normal = axis_id.plane_normal().unwrap_or(Vec3::Z);
        let tris = oriented(plane_triangles(), normal);
        let mut shape = Shape::new(axis_id, ShapeKind::Plane, tris, 2);
        shape.alpha = 0.6;
        shapes.push(shape);
    }
    let mut center = Shape::new(AxisId::XYZ, ShapeKind::Sphere, sphere_triangles(0.1), 0);
    center.alpha = 0.9;
    shapes.push(center);
    shapes
}

/// Rotate mode: three half-arcs, a camera-facing full ring, a transparent
/// center sphere for free rotation (invisible yet pickable).
pub fn rotate_shapes() -> Vec<Shape> {
    let mut shapes = Vec::new();
    for axis_id in [AxisId::X, AxisId::Y, AxisId::Z] {
        let axis = axis_id.axis().unwrap_or(Vec3::Z);
        let half = oriented(arc_triangles(1.0, 0.025, 180.0), axis);
        let full = oriented(arc_triangles(1.0, 0.025, 360.0), axis);
        let mut shape = Shape::new(axis_id, ShapeKind::Arc, half, 1);
        shape.alt_triangles = full;
        shapes.push(shape);
    }
    let mut face = Shape::new(AxisId::F, ShapeKind::Arc, arc_triangles(1.15, 0.025, 360.0), 0);
    face.alpha = 0.8;
    shapes.push(face);
    let mut free = Shape::new(AxisId::XYZ, ShapeKind::Sphere, sphere_triangles(0.9), -1);
    free.visible = false;
    free.alpha = 0.0;
    shapes.push(free);
    shapes
}

/// Scale mode: three box-capped lines and a center sphere for uniform
/// scaling.
pub fn scale_shapes() -> Vec<Shape> {
    let mut shapes = Vec::new();
    for axis_id in [AxisId::X, AxisId::Y, AxisId::Z] {
        let tris = oriented(box_line_triangles(), axis_id.axis().unwrap_or(Vec3::Z));
        shapes.push(Shape::new(axis_id, ShapeKind::BoxLine, tris, 1));
    }
    let mut center = Shape::new(AxisId::XYZ, ShapeKind::Sphere, sphere_triangles(0.12), 0);
    center.alpha = 0.9;
    shapes.push(center);
    shapes
}

/// Rotate triangles built along +Z onto the handle axis.
fn oriented(tris: Vec<[Vec3; 3]>, axis: Vec3) -> Vec<[Vec3; 3]> {
    let q = Quat::from_rotation_arc(Vec3::Z, axis);
    tris.iter()
        .map(|t| [q * t[0], q * t[1], q * t[2]])
        .collect()
}

const SEGMENTS: u32 = 12;

fn ring_point(radius: f32, z: f32, segment: u32, segments: u32) -> Vec3 {
    let angle = 2.0 * std::f32::consts::PI * segment as f32 / segments as f32;
    Vec3::new(radius * angle.cos(), radius * angle.sin(), z)
}

/// Open cylinder along +Z.
fn cylinder_triangles(radius: f32, z0: f32, z1: f32) -> Vec<[Vec3; 3]> {
    let mut tris = Vec::new();
    for s in 0..SEGMENTS {
        let a0 = ring_point(radius, z0, s, SEGMENTS);
        let a1 = ring_point(radius, z0, s + 1, SEGMENTS);
        let b0 = ring_point(radius, z1, s, SEGMENTS);
        let b1 = ring_point(radius, z1, s + 1, SEGMENTS);
        tris.push([a0, a1, b1]);
        tris.push([a0, b1, b0]);
    }
    tris
}

/// Closed cone along +Z, apex at `z1`.
fn cone_triangles(radius: f32, z0: f32, z1: f32) -> Vec<[Vec3; 3]> {
    let apex = Vec3::new(0.0, 0.0, z1);
    let base_center = Vec3::new(0.0, 0.0, z0);
    let mut tris = Vec::new();
    for s in 0..SEGMENTS {
        let a = ring_point(radius, z0, s, SEGMENTS);
        let b = ring_point(radius, z0, s + 1, SEGMENTS);
        tris.push([a, b, apex]);
        tris.push([b, a, base_center]);
    }
    tris
}

fn arrow_shaft_triangles() -> Vec<[Vec3; 3]> {
    cylinder_triangles(0.02, 0.0, 0.78)
}

fn arrow_tip_triangles() -> Vec<[Vec3; 3]> {
    cone_triangles(0.06, 0.78, 1.0)
}

/// Offset quad in the XY plane; the dynamic flip mirrors it toward the
/// camera when enabled.
fn plane_triangles() -> Vec<[Vec3; 3]> {
    let (center, half) = (0.4, 0.15);
    let a = Vec3::new(center - half, center - half, 0.0);
    let b = Vec3::new(center + half, center - half, 0.0);
    let c = Vec3::new(center + half, center + half, 0.0);
    let d = Vec3::new(center - half, center + half, 0.0);
    vec![[a, b, c], [a, c, d]]
}

fn sphere_triangles(radius: f32) -> Vec<[Vec3; 3]> {
    let (rings, sectors) = (8u32, 12u32);
    let point = |ring: u32, sector: u32| {
        let theta = std::f32::consts::PI * ring as f32 / rings as f32;
        let phi = 2.0 * std::f32::consts::PI * sector as f32 / sectors as f32;
        Vec3::new(
            theta.sin() * phi.cos(),
            theta.cos(),
            theta.sin() * phi.sin(),
        ) * radius
    };
    let mut tris = Vec::new();
    for ring in 0..rings {
        for sector in 0..sectors {
            let a = point(ring, sector);
            let b = point(ring, sector + 1);
            let c = point(ring + 1, sector + 1);
            let d = point(ring + 1, sector);
            if ring > 0 {
                tris.push([a, b, c]);
            }
            if ring + 1 < rings {
                tris.push([a, c, d]);
            }
        }
    }
    tris
}

/// Torus sector in the XY plane around +Z, centered on the +X direction.
/// `sweep_deg` of 360 produces the closed ring.
fn arc_triangles(major: f32, minor: f32, sweep_deg: f32) -> Vec<[Vec3; 3]> {
    let major_segments = (SEGMENTS * 4) as usize;
    let minor_segments = 8usize;
    let sweep = sweep_deg.to_radians();
    let start = -sweep * 0.5;
    let steps = ((major_segments as f32) * sweep / (2.0 * std::f32::consts::PI)).ceil() as usize;
    let steps = steps.max(4);

    let center_point = |i: usize| {
        let angle = start + sweep * i as f32 / steps as f32;
        (Vec3::new(angle.cos(), angle.sin(), 0.0), angle)
    };
    let tube_point = |i: usize, j: usize| {
        let (radial, _) = center_point(i);
        let tube_angle = 2.0 * std::f32::consts::PI * j as f32 / minor_segments as f32;
        let outward = radial * (major + minor * tube_angle.cos());
        outward + Vec3::new(0.0, 0.0, minor * tube_angle.sin())
    };

    let mut tris = Vec::new();
    for i in 0..steps {
        for j in 0..minor_segments {
            let a = tube_point(i, j);
            let b = tube_point(i + 1, j);
            let c = tube_point(i + 1, j + 1);
            let d = tube_point(i, j + 1);
            tris.push([a, b, c]);
            tris.push([a, c, d]);
        }
    }
    tris
}

fn cube_triangles(center: Vec3, half: f32) -> Vec<[Vec3; 3]> {
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    ];
    let mut tris = Vec::new();
    for (normal, tangent, bitangent) in faces {
        let corner = |u: f32, v: f32| center + (normal + tangent * u + bitangent * v) * half;
        let a = corner(-1.0, -1.0);
        let b = corner(1.0, -1.0);
        let c = corner(1.0, 1.0);
        let d = corner(-1.0, 1.0);
        tris.push([a, b, c]);
        tris.push([a, c, d]);
    }
    tris
}

fn box_line_triangles() -> Vec<[Vec3; 3]> {
    let mut tris = cylinder_triangles(0.02, 0.0, 0.82);
    tris.extend(cube_triangles(Vec3::new(0.0, 0.0, 0.89), 0.07));
    tris
}
