//! Winit application shell: window and GPU bootstrap, input routing
//! between the orbit camera and the gizmo pointer pipeline, and the
//! per-frame redraw.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use splatlight_core::{Aabb, Ray, Transform};
use splatlight_render::gizmo::{
    CompositeTarget, CoordSpace, Gizmo, GizmoMode, SplatTarget, TransformTarget,
};
use splatlight_render::mesh::{create_cube, create_sphere, GpuMesh, MeshInstance};
use splatlight_render::{GpuState, OrbitCamera, Renderer};

use crate::cli::CliArgs;
use crate::config::ViewerConfig;

/// Which object the gizmo currently addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetSelect {
    Splat,
    Mesh(usize),
    /// Every mesh instance as one composite, about a shared pivot.
    Group,
}

enum TargetRef<'a> {
    Splat(SplatTarget<'a>),
    Mesh(&'a mut MeshInstance),
    Group(CompositeTarget<'a>),
}

impl TargetRef<'_> {
    fn as_dyn(&mut self) -> &mut dyn TransformTarget {
        match self {
            Self::Splat(t) => t,
            Self::Mesh(m) => *m,
            Self::Group(t) => t,
        }
    }
}

fn select_target<'a>(
    selection: TargetSelect,
    renderer: Option<&'a mut Renderer>,
    instances: &'a mut [MeshInstance],
    group_pivot: &'a mut Transform,
) -> Option<TargetRef<'a>> {
    match selection {
        TargetSelect::Splat => renderer?
            .splat_store_mut()
            .map(|store| TargetRef::Splat(SplatTarget { store })),
        TargetSelect::Mesh(i) => instances.get_mut(i).map(TargetRef::Mesh),
        TargetSelect::Group => {
            if instances.len() < 2 {
                return None;
            }
            let members = (0..instances.len()).collect();
            Some(TargetRef::Group(CompositeTarget::new(
                instances,
                members,
                group_pivot,
            )))
        }
    }
}

#[derive(Default)]
struct PointerButtons {
    left: bool,
    right: bool,
    gizmo_captured: bool,
}

pub struct App {
    args: CliArgs,
    config: ViewerConfig,
    gpu: Option<GpuState>,
    renderer: Option<Renderer>,
    camera: OrbitCamera,
    gizmo: Gizmo,
    meshes: Vec<GpuMesh>,
    instances: Vec<MeshInstance>,
    target: TargetSelect,
    /// Accumulated pivot for the grouped-meshes target; reset whenever
    /// the group is re-formed.
    group_pivot: Transform,
    has_cloud: bool,
    cursor: Vec2,
    buttons: PointerButtons,
    frames: u32,
    last_fps_log: Option<instant::Instant>,
}

impl App {
    pub fn new(args: CliArgs, config: ViewerConfig) -> Self {
        let mut gizmo = Gizmo::new();
        gizmo.snap_enabled = config.snap_enabled;
        gizmo.snap_translate = config.snap_translate;
        gizmo.snap_rotate_deg = config.snap_rotate_deg;
        gizmo.flip_planes = config.flip_planes;
        Self {
            args,
            config,
            gpu: None,
            renderer: None,
            camera: OrbitCamera::default(),
            gizmo,
            meshes: Vec::new(),
            instances: Vec::new(),
            target: TargetSelect::Splat,
            group_pivot: Transform::default(),
            has_cloud: false,
            cursor: Vec2::ZERO,
            buttons: PointerButtons::default(),
            frames: 0,
            last_fps_log: None,
        }
    }

    fn load_cloud(&mut self) {
        let Some(path) = self.args.file.clone() else {
            return;
        };
        let (Some(gpu), Some(renderer)) = (&self.gpu, &mut self.renderer) else {
            return;
        };

        // Respect the device's storage binding ceiling on top of the
        // configured budget; oversized clouds downsample at load.
        let device_cap =
            (gpu.device.limits().max_storage_buffer_binding_size as usize) / 256;
        let budget = self
            .args
            .max_splats
            .or(self.config.max_splats)
            .map_or(device_cap, |b| b.min(device_cap));

        match splatlight_io::load_cloud(&path, Some(budget)) {
            Ok(cloud) => {
                let cloud = if self.args.compact {
                    cloud.into_compact()
                } else {
                    cloud
                };
                tracing::info!("loaded {:?}: {} splats", path, cloud.len());
                self.camera
                    .frame(cloud.aabb.center(), cloud.bounding_radius.max(0.5));
                renderer.set_cloud(&gpu.device, &cloud);
                self.has_cloud = true;
                self.target = TargetSelect::Splat;
            }
            Err(e) => {
                tracing::error!("failed to load {:?}: {}", path, e);
            }
        }
    }

    fn spawn_demo_meshes(&mut self) {
        let Some(gpu) = &self.gpu else {
            return;
        };
        self.meshes.push(create_cube(&gpu.device));
        self.meshes
            .push(create_sphere(&gpu.device, 0.5, 16, 24));
        let cube_aabb = self.meshes[0].local_aabb;
        let sphere_aabb = self.meshes[1].local_aabb;
        self.instances.push(MeshInstance {
            mesh: 0,
            transform: Transform::from_position(Vec3::new(-1.5, 0.0, 0.0)),
            color: [0.8, 0.4, 0.2, 1.0],
            local_aabb: cube_aabb,
            name: "cube".into(),
        });
        self.instances.push(MeshInstance {
            mesh: 1,
            transform: Transform::from_position(Vec3::new(1.5, 0.0, 0.0)),
            color: [0.2, 0.5, 0.8, 1.0],
            local_aabb: sphere_aabb,
            name: "sphere".into(),
        });
    }

    /// Tab order: splat cloud, each mesh, then all meshes as one group.
    fn cycle_target(&mut self) {
        let next = match self.target {
            TargetSelect::Splat => {
                if self.instances.is_empty() {
                    TargetSelect::Splat
                } else {
                    TargetSelect::Mesh(0)
                }
            }
            TargetSelect::Mesh(i) => {
                if i + 1 < self.instances.len() {
                    TargetSelect::Mesh(i + 1)
                } else if self.instances.len() >= 2 {
                    TargetSelect::Group
                } else if self.has_cloud {
                    TargetSelect::Splat
                } else {
                    TargetSelect::Mesh(0)
                }
            }
            TargetSelect::Group => {
                if self.has_cloud {
                    TargetSelect::Splat
                } else {
                    TargetSelect::Mesh(0)
                }
            }
        };
        if next != self.target {
            // Target change mid-drag discards the drag state.
            self.gizmo.pointer_released();
            self.buttons.gizmo_captured = false;
            if next == TargetSelect::Group {
                // A newly formed group pivots at its aggregate center.
                let members: Vec<usize> = (0..self.instances.len()).collect();
                self.group_pivot =
                    CompositeTarget::aggregate_pivot(&self.instances, &members);
            }
            self.target = next;
            tracing::info!("gizmo target: {:?}", next);
        }
    }

    fn pointer_ray(&self) -> Option<Ray> {
        let gpu = self.gpu.as_ref()?;
        let (width, height) = (gpu.config.width, gpu.config.height);
        let view_proj = self.camera.projection(width, height) * self.camera.view();
        Some(Ray::from_screen(
            self.cursor,
            Vec2::new(width as f32, height as f32),
            view_proj.inverse(),
            self.camera.position(),
        ))
    }

    fn handle_key(&mut self, code: KeyCode, event_loop: &ActiveEventLoop) {
        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::Digit1 => self.gizmo.set_mode(GizmoMode::Translate),
            KeyCode::Digit2 => self.gizmo.set_mode(GizmoMode::Rotate),
            KeyCode::Digit3 => self.gizmo.set_mode(GizmoMode::Scale),
            KeyCode::KeyL => {
                self.gizmo.space = match self.gizmo.space {
                    CoordSpace::World => CoordSpace::Local,
                    CoordSpace::Local => CoordSpace::World,
                };
                tracing::info!("gizmo space: {:?}", self.gizmo.space);
            }
            KeyCode::KeyN => {
                self.gizmo.snap_enabled = !self.gizmo.snap_enabled;
                tracing::info!(
                    "snapping {}",
                    if self.gizmo.snap_enabled { "on" } else { "off" }
                );
            }
            KeyCode::KeyB => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.show_overlay = !renderer.show_overlay;
                }
            }
            KeyCode::KeyF => {
                // Re-frame the camera on the current target.
                if let Some(mut target) = select_target(
                    self.target,
                    self.renderer.as_mut(),
                    &mut self.instances,
                    &mut self.group_pivot,
                ) {
                    let aabb = target.as_dyn().world_aabb();
                    if !aabb.is_empty() {
                        let radius = aabb.size().length() * 0.5;
                        self.camera.frame(aabb.center(), radius.max(0.5));
                    }
                }
            }
            KeyCode::Tab => self.cycle_target(),
            _ => {}
        }
    }

    fn handle_cursor_moved(&mut self, position: Vec2) {
        let delta = position - self.cursor;
        self.cursor = position;

        if self.buttons.left && self.buttons.gizmo_captured {
            if let Some(ray) = self.pointer_ray() {
                if let Some(mut target) = select_target(
                    self.target,
                    self.renderer.as_mut(),
                    &mut self.instances,
                    &mut self.group_pivot,
                ) {
                    self.gizmo.pointer_moved(&ray, target.as_dyn());
                }
            }
            return;
        }
        if self.buttons.left {
            self.camera.orbit(-delta.x * 0.008, delta.y * 0.008);
            return;
        }
        if self.buttons.right {
            let height = self.gpu.as_ref().map_or(720, |g| g.config.height);
            self.camera.pan(delta.x, delta.y, height as f32);
            return;
        }
        // Hover feedback only; nothing captured.
        if let Some(ray) = self.pointer_ray() {
            if let Some(mut target) = select_target(
                self.target,
                self.renderer.as_mut(),
                &mut self.instances,
                &mut self.group_pivot,
            ) {
                self.gizmo.pointer_moved(&ray, target.as_dyn());
            }
        }
    }

    fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match (button, state) {
            (MouseButton::Left, ElementState::Pressed) => {
                self.buttons.left = true;
                self.buttons.gizmo_captured = false;
                if let Some(ray) = self.pointer_ray() {
                    if let Some(mut target) = select_target(
                        self.target,
                        self.renderer.as_mut(),
                        &mut self.instances,
                        &mut self.group_pivot,
                    ) {
                        self.buttons.gizmo_captured =
                            self.gizmo.pointer_pressed(&ray, target.as_dyn());
                    }
                }
            }
            (MouseButton::Left, ElementState::Released) => {
                self.buttons.left = false;
                self.buttons.gizmo_captured = false;
                self.gizmo.pointer_released();
            }
            (MouseButton::Right, ElementState::Pressed) => self.buttons.right = true,
            (MouseButton::Right, ElementState::Released) => self.buttons.right = false,
            _ => {}
        }
    }

    fn redraw(&mut self) {
        self.frames += 1;
        let now = instant::Instant::now();
        match self.last_fps_log {
            None => self.last_fps_log = Some(now),
            Some(last) => {
                let elapsed = now.duration_since(last).as_secs_f32();
                if elapsed >= 2.0 {
                    tracing::debug!("{:.1} fps", self.frames as f32 / elapsed);
                    self.frames = 0;
                    self.last_fps_log = Some(now);
                }
            }
        }

        let overlay_aabb: Option<Aabb> = {
            if let Some(mut target) = select_target(
                self.target,
                self.renderer.as_mut(),
                &mut self.instances,
                &mut self.group_pivot,
            ) {
                let target = target.as_dyn();
                self.gizmo
                    .update(self.camera.position(), self.camera.fov_y, target);
                Some(target.world_aabb())
            } else {
                None
            }
        };

        let (Some(gpu), Some(renderer)) = (&self.gpu, &mut self.renderer) else {
            return;
        };
        let show_gizmo = overlay_aabb.is_some();
        renderer.render(
            gpu,
            &self.camera,
            &self.meshes,
            &self.instances,
            show_gizmo.then_some(&self.gizmo),
            overlay_aabb,
        );
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        tracing::info!("application resumed, initializing GPU");
        let window_attrs = Window::default_attributes()
            .with_title("splatlight")
            .with_inner_size(winit::dpi::LogicalSize::new(self.args.width, self.args.height));
        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("failed to create window"),
        );

        let gpu = match pollster::block_on(splatlight_render::gpu::init_gpu(window)) {
            Ok(gpu) => gpu,
            Err(e) => {
                tracing::error!("GPU initialization failed: {}", e);
                event_loop.exit();
                return;
            }
        };

        let mut renderer = Renderer::new(&gpu, &self.gizmo);
        renderer.frustum_dilation = self.config.frustum_dilation;
        renderer.sh_degree_cap = self.args.sh_degree.unwrap_or(self.config.sh_degree).min(3);
        renderer.background = wgpu::Color {
            r: self.config.background[0],
            g: self.config.background[1],
            b: self.config.background[2],
            a: 1.0,
        };

        self.gpu = Some(gpu);
        self.renderer = Some(renderer);

        self.load_cloud();
        if self.args.demo_meshes {
            self.spawn_demo_meshes();
        }
        if !self.has_cloud {
            if self.instances.is_empty() {
                tracing::warn!("no cloud and no meshes; pass a .ply/.splat file");
            } else {
                self.target = TargetSelect::Mesh(0);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        self.handle_key(code, event_loop);
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.handle_cursor_moved(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.handle_mouse_button(button, state);
            }
            WindowEvent::DroppedFile(path) => {
                // A load superseding another simply replaces the store;
                // the gizmo drops any in-flight drag on the old target.
                self.gizmo.pointer_released();
                self.buttons.gizmo_captured = false;
                self.args.file = Some(path);
                self.load_cloud();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 60.0,
                };
                self.camera.dolly(0.9f32.powf(scroll));
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}
