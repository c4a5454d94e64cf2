//! Interactive translate/rotate/scale gizmo.
//!
//! Pure pointer/drag logic lives here; GPU resources are in
//! [`render::GizmoRenderer`], keyed off this state. The gizmo owns a
//! shape set per mode, picks handles by ray against their triangle
//! meshes with priorities, captures a drag plane at pointer-down, and
//! pushes transform updates through the [`target::TransformTarget`]
//! capability trait.

pub mod render;
pub mod shape;
pub mod target;

pub use render::GizmoRenderer;
pub use shape::{AxisId, Shape, ShapeKind};
pub use target::{CompositeTarget, SplatTarget, TransformTarget};

use glam::{Mat4, Quat, Vec3};

use splatlight_core::angles::{
    euler_from_quat, quat_from_euler, signed_angle_around_axis, snap,
};
use splatlight_core::Ray;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GizmoMode {
    Translate,
    Rotate,
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordSpace {
    World,
    Local,
}

/// What happens to the non-selected shapes while a drag is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragDisplay {
    /// Keep every shape visible.
    Show,
    /// Hide everything but the dragged handle.
    Hide,
    /// Keep the others visible but dimmed.
    Selected,
}

/// Fraction of the viewport the gizmo occupies at any camera distance.
const SCREEN_SCALE_FACTOR: f32 = 0.3;
const MIN_SCREEN_SCALE: f32 = 1e-3;
/// Arrows/planes hide when within this of edge-on.
const EDGE_ON_EPSILON: f32 = 0.01;
/// Axis rings switch from half to full display past this view alignment.
const RING_FULL_THRESHOLD: f32 = 0.99;
const MIN_SCALE_FACTOR: f32 = 0.001;

#[derive(Debug, Clone)]
struct DragState {
    shape_index: usize,
    axis: AxisId,
    /// Fixed at pointer-down; never recomputed during the drag.
    plane_point: Vec3,
    plane_normal: Vec3,
    start_point: Vec3,
    start_position: Vec3,
    start_rotation: Vec3,
    start_scale: Vec3,
    /// Gizmo frame rotation at press, for local-space deltas.
    frame_rotation: Quat,
    /// World-space handle axis (or rotation axis) at press.
    axis_world: Vec3,
    screen_scale: f32,
}

#[derive(Debug, Clone)]
enum PointerState {
    Idle,
    Hover(usize),
    Dragging(DragState),
}

pub struct Gizmo {
    pub mode: GizmoMode,
    pub space: CoordSpace,
    pub snap_enabled: bool,
    /// World units per translate/scale snap step.
    pub snap_translate: f32,
    /// Degrees per rotate snap step.
    pub snap_rotate_deg: f32,
    pub drag_display: DragDisplay,
    pub flip_planes: bool,
    shapes: Vec<Shape>,
    state: PointerState,
    origin: Vec3,
    rotation: Quat,
    screen_scale: f32,
    camera_pos: Vec3,
    view_dir: Vec3,
    /// Bumped whenever the shape set is rebuilt, so GPU buffers follow.
    shapes_version: u64,
}

impl Default for Gizmo {
    fn default() -> Self {
        Self::new()
    }
}

impl Gizmo {
    pub fn new() -> Self {
        Self {
            mode: GizmoMode::Translate,
            space: CoordSpace::World,
            snap_enabled: false,
            snap_translate: 0.25,
            snap_rotate_deg: 15.0,
            drag_display: DragDisplay::Selected,
            flip_planes: true,
            shapes: shape::translate_shapes(),
            state: PointerState::Idle,
            origin: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            screen_scale: 1.0,
            camera_pos: Vec3::new(0.0, 0.0, 5.0),
            view_dir: Vec3::NEG_Z,
            shapes_version: 0,
        }
    }

    pub fn set_mode(&mut self, mode: GizmoMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.shapes = match mode {
            GizmoMode::Translate => shape::translate_shapes(),
            GizmoMode::Rotate => shape::rotate_shapes(),
            GizmoMode::Scale => shape::scale_shapes(),
        };
        self.state = PointerState::Idle;
        self.shapes_version += 1;
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn shapes_version(&self) -> u64 {
        self.shapes_version
    }

    pub fn screen_scale(&self) -> f32 {
        self.screen_scale
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, PointerState::Dragging(_))
    }

    pub fn hovered_shape(&self) -> Option<usize> {
        match &self.state {
            PointerState::Hover(i) => Some(*i),
            PointerState::Dragging(d) => Some(d.shape_index),
            PointerState::Idle => None,
        }
    }

    /// Axes to draw highlighted: the active handle plus, for compound
    /// handles, their component axes.
    pub fn highlighted_axes(&self) -> Vec<AxisId> {
        let Some(index) = self.hovered_shape() else {
            return Vec::new();
        };
        let axis = self.shapes[index].axis;
        let mut out = vec![axis];
        out.extend_from_slice(axis.components());
        out
    }

    /// Gizmo frame: translation to the target, orientation per coordinate
    /// space, uniform screen-space scale.
    pub fn frame_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.origin)
            * Mat4::from_quat(self.rotation)
            * Mat4::from_scale(Vec3::splat(self.screen_scale))
    }

    pub fn shape_world_matrix(&self, shape: &Shape) -> Mat4 {
        self.frame_matrix() * shape.dynamic
    }

    /// Per-frame refresh: origin, orientation, screen-space scale, and
    /// camera-dependent shape dynamics.
    pub fn update(&mut self, camera_pos: Vec3, fov_y: f32, target: &dyn TransformTarget) {
        self.origin = target.position();
        self.rotation = match self.space {
            CoordSpace::World => Quat::IDENTITY,
            CoordSpace::Local => quat_from_euler(target.rotation()),
        };
        self.camera_pos = camera_pos;
        let to_target = self.origin - camera_pos;
        let distance = to_target.length().max(1e-6);
        self.view_dir = to_target / distance;
        self.screen_scale =
            ((fov_y * 0.5).tan() * distance * SCREEN_SCALE_FACTOR).max(MIN_SCREEN_SCALE);

        self.update_shape_dynamics();
        self.apply_drag_display();
    }

    fn update_shape_dynamics(&mut self) {
        // Camera direction in the gizmo frame.
        let cam_local = self.rotation.inverse() * (self.camera_pos - self.origin);
        let view_local = self.rotation.inverse() * self.view_dir;

        for shape in &mut self.shapes {
            shape.disabled = false;
            match shape.kind {
                ShapeKind::Arrow | ShapeKind::BoxLine => {
                    let axis = shape.axis.axis().unwrap_or(Vec3::Z);
                    shape.visible = view_local.dot(axis).abs() <= 1.0 - EDGE_ON_EPSILON;
                }
                ShapeKind::Plane => {
                    let normal = shape.axis.plane_normal().unwrap_or(Vec3::Z);
                    shape.visible = view_local.dot(normal).abs() >= EDGE_ON_EPSILON;
                    if self.flip_planes {
                        // Mirror the offset quad into the quadrant facing
                        // the camera.
                        let flip = Vec3::new(
                            if cam_local.x < 0.0 { -1.0 } else { 1.0 },
                            if cam_local.y < 0.0 { -1.0 } else { 1.0 },
                            if cam_local.z < 0.0 { -1.0 } else { 1.0 },
                        );
                        let masked = flip * (Vec3::ONE - normal.abs()) + normal.abs();
                        shape.dynamic = Mat4::from_scale(masked);
                    } else {
                        shape.dynamic = Mat4::IDENTITY;
                    }
                }
                ShapeKind::Arc => {
                    if shape.axis == AxisId::F {
                        // The face ring stays perpendicular to the view.
                        shape.dynamic = Mat4::from_quat(Quat::from_rotation_arc(
                            Vec3::Z,
                            -view_local.normalize_or_zero(),
                        ));
                    } else if let Some(axis) = shape.axis.axis() {
                        let aligned = view_local.dot(axis).abs() > RING_FULL_THRESHOLD;
                        shape.use_alt = aligned;
                        if aligned {
                            shape.dynamic = Mat4::IDENTITY;
                        } else {
                            // Swing the half arc's open side toward the
                            // camera. Sectors are built centered on the
                            // local reference direction of their plane.
                            let radial = cam_local - axis * cam_local.dot(axis);
                            let reference =
                                Quat::from_rotation_arc(Vec3::Z, axis) * Vec3::X;
                            let angle = signed_angle_around_axis(reference, radial, axis);
                            shape.dynamic =
                                Mat4::from_quat(Quat::from_axis_angle(axis, angle));
                        }
                    }
                }
                ShapeKind::Sphere => {}
            }
        }
    }

    fn apply_drag_display(&mut self) {
        let PointerState::Dragging(drag) = &self.state else {
            return;
        };
        let selected = drag.shape_index;
        for (i, shape) in self.shapes.iter_mut().enumerate() {
            if i == selected {
                continue;
            }
            match self.drag_display {
                DragDisplay::Show => {}
                DragDisplay::Hide => shape.visible = false,
                DragDisplay::Selected => shape.disabled = true,
            }
        }
    }

    /// Highest-priority hit, ties broken by distance. Invisible handles
    /// stay pickable as long as they are interactable and not disabled.
    pub fn pick(&self, ray: &Ray) -> Option<(usize, f32)> {
        let frame = self.frame_matrix();
        let mut best: Option<(usize, f32, i32)> = None;
        for (i, shape) in self.shapes.iter().enumerate() {
            if !shape.interactable || shape.disabled {
                continue;
            }
            let world = frame * shape.dynamic;
            if let Some(t) = shape.intersect(ray, &world) {
                let better = match best {
                    None => true,
                    Some((_, best_t, best_priority)) => {
                        shape.priority > best_priority
                            || (shape.priority == best_priority && t < best_t)
                    }
                };
                if better {
                    best = Some((i, t, shape.priority));
                }
            }
        }
        best.map(|(i, t, _)| (i, t))
    }

    /// Pointer move: drives hover when idle, the drag math when captured.
    /// Returns true when the gizmo consumed the event.
    pub fn pointer_moved(&mut self, ray: &Ray, target: &mut dyn TransformTarget) -> bool {
        if let PointerState::Dragging(drag) = &self.state {
            let drag = drag.clone();
            self.apply_drag(&drag, ray, target);
            return true;
        }
        match self.pick(ray) {
            Some((i, _)) => {
                self.state = PointerState::Hover(i);
                true
            }
            None => {
                self.state = PointerState::Idle;
                false
            }
        }
    }

    /// Pointer down: capture the hit handle and snapshot the drag state.
    /// Returns true when a handle was captured.
    pub fn pointer_pressed(&mut self, ray: &Ray, target: &dyn TransformTarget) -> bool {
        let Some((index, _)) = self.pick(ray) else {
            return false;
        };
        let axis_id = self.shapes[index].axis;
        let (plane_normal, axis_world) = self.drag_plane(axis_id);
        let Some(start_point) = ray.intersect_plane(self.origin, plane_normal) else {
            return false;
        };
        self.state = PointerState::Dragging(DragState {
            shape_index: index,
            axis: axis_id,
            plane_point: self.origin,
            plane_normal,
            start_point,
            start_position: target.position(),
            start_rotation: target.rotation(),
            start_scale: target.scale(),
            frame_rotation: self.rotation,
            axis_world,
            screen_scale: self.screen_scale,
        });
        true
    }

    /// Pointer up or capture loss: discard in-flight drag state; the
    /// partially applied transform stands, nothing is rolled back.
    pub fn pointer_released(&mut self) {
        self.state = PointerState::Idle;
    }

    /// Drag plane for a handle, chosen once at pointer-down. Returns the
    /// plane normal and the world-space handle axis.
    fn drag_plane(&self, axis_id: AxisId) -> (Vec3, Vec3) {
        match (self.mode, axis_id) {
            // Single-axis translate/scale: the plane through the origin
            // containing the axis, as face-on to the camera as possible.
            (GizmoMode::Translate | GizmoMode::Scale, AxisId::X | AxisId::Y | AxisId::Z) => {
                let axis = self.rotation * axis_id.axis().unwrap_or(Vec3::Z);
                let normal = axis.cross(self.view_dir).cross(axis);
                let normal = if normal.length_squared() < 1e-9 {
                    axis.any_orthonormal_vector()
                } else {
                    normal.normalize()
                };
                (normal, axis)
            }
            // Plane translate: the plane of the plane shape.
            (_, AxisId::XY | AxisId::XZ | AxisId::YZ) => {
                let normal = self.rotation * axis_id.plane_normal().unwrap_or(Vec3::Z);
                (normal, normal)
            }
            // Single-axis rotate: the plane perpendicular to the axis.
            (GizmoMode::Rotate, AxisId::X | AxisId::Y | AxisId::Z) => {
                let axis = self.rotation * axis_id.axis().unwrap_or(Vec3::Z);
                (axis, axis)
            }
            // Face rotate, free rotate, all-axis translate, uniform
            // scale: the camera-facing plane through the origin.
            _ => (self.view_dir, self.view_dir),
        }
    }

    fn apply_drag(&self, drag: &DragState, ray: &Ray, target: &mut dyn TransformTarget) {
        let Some(point) = ray.intersect_plane(drag.plane_point, drag.plane_normal) else {
            return;
        };
        match self.mode {
            GizmoMode::Translate => self.apply_translate(drag, point, target),
            GizmoMode::Rotate => self.apply_rotate(drag, point, target),
            GizmoMode::Scale => self.apply_scale(drag, point, target),
        }
    }

    fn apply_translate(&self, drag: &DragState, point: Vec3, target: &mut dyn TransformTarget) {
        let snap_step = if self.snap_enabled {
            self.snap_translate
        } else {
            0.0
        };
        let delta = point - drag.start_point;
        let new_position = match drag.axis {
            AxisId::X | AxisId::Y | AxisId::Z => {
                let along = snap(delta.dot(drag.axis_world), snap_step);
                drag.start_position + drag.axis_world * along
            }
            _ => {
                // Plane or free translate: snap per axis in the gizmo
                // frame captured at press.
                let local = drag.frame_rotation.inverse() * delta;
                let snapped = Vec3::new(
                    snap(local.x, snap_step),
                    snap(local.y, snap_step),
                    snap(local.z, snap_step),
                );
                drag.start_position + drag.frame_rotation * snapped
            }
        };
        target.set_position(new_position);
    }

    fn apply_rotate(&self, drag: &DragState, point: Vec3, target: &mut dyn TransformTarget) {
        let v_start = drag.start_point - drag.plane_point;
        let v_now = point - drag.plane_point;
        let mut angle = signed_angle_around_axis(v_start, v_now, drag.axis_world);
        if self.snap_enabled {
            angle = snap(angle.to_degrees(), self.snap_rotate_deg).to_radians();
        }
        let delta = Quat::from_axis_angle(drag.axis_world, angle);
        let rotation = delta * quat_from_euler(drag.start_rotation);
        target.set_rotation(euler_from_quat(rotation));
    }

    fn apply_scale(&self, drag: &DragState, point: Vec3, target: &mut dyn TransformTarget) {
        // Deltas are measured in gizmo units (the handle meshes are unit
        // primitives scaled to the screen), so one handle-length of drag
        // is one unit of factor.
        let gizmo_units = drag.screen_scale.max(MIN_SCREEN_SCALE);
        let factor = match drag.axis {
            AxisId::XYZ => {
                let now = (point - drag.plane_point).length();
                let start = (drag.start_point - drag.plane_point).length();
                1.0 + (now - start) / gizmo_units
            }
            _ => {
                let along = (point - drag.start_point).dot(drag.axis_world);
                1.0 + along / gizmo_units
            }
        };
        let factor = factor.max(MIN_SCALE_FACTOR);
        let mut scale = drag.start_scale;
        match drag.axis {
            AxisId::X => scale.x = drag.start_scale.x * factor,
            AxisId::Y => scale.y = drag.start_scale.y * factor,
            AxisId::Z => scale.z = drag.start_scale.z * factor,
            _ => scale = drag.start_scale * factor,
        }
        target.set_scale(scale);
    }
}
