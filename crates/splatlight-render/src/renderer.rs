//! Renderer host: owns the shared scene uniform and every pipeline, and
//! records the per-frame graph: sort compute passes, then one render
//! pass of clear, meshes, splats, gizmo, overlay.

use glam::Mat4;

use splatlight_core::{Aabb, SplatCloud};

use crate::camera::OrbitCamera;
use crate::gizmo::{Gizmo, GizmoRenderer};
use crate::gpu::GpuState;
use crate::mesh::{GpuMesh, MeshInstance, MeshPipeline};
use crate::overlay::OverlayRenderer;
use crate::sorter::SplatSorter;
use crate::splat_pipeline::SplatPipeline;
use crate::splat_store::SplatStore;
use crate::uniforms::{scene_bind_group_layout, SceneUniform};

/// A loaded cloud with its sort working set and draw pipeline. Replaced
/// wholesale on reload; all GPU buffers release when it drops.
struct SplatBatch {
    store: SplatStore,
    sorter: SplatSorter,
    pipeline: SplatPipeline,
}

pub struct Renderer {
    surface_format: wgpu::TextureFormat,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    mesh_pipeline: MeshPipeline,
    overlay: OverlayRenderer,
    gizmo_renderer: GizmoRenderer,
    splat: Option<SplatBatch>,
    pub background: wgpu::Color,
    pub frustum_dilation: f32,
    /// Upper bound on the SH degree evaluated at draw time.
    pub sh_degree_cap: u32,
    pub show_overlay: bool,
}

impl Renderer {
    pub fn new(gpu: &GpuState, gizmo: &Gizmo) -> Self {
        let device = &gpu.device;
        let scene_layout = scene_bind_group_layout(device);
        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene uniform"),
            size: std::mem::size_of::<SceneUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene bind group"),
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });

        let format = gpu.config.format;
        let mesh_pipeline = MeshPipeline::new(device, format, &scene_layout);
        let overlay = OverlayRenderer::new(device, format, &scene_layout);
        let gizmo_renderer = GizmoRenderer::new(device, format, &scene_layout, gizmo);

        Self {
            surface_format: format,
            scene_buffer,
            scene_bind_group,
            mesh_pipeline,
            overlay,
            gizmo_renderer,
            splat: None,
            background: wgpu::Color {
                r: 0.03,
                g: 0.03,
                b: 0.05,
                a: 1.0,
            },
            frustum_dilation: 0.2,
            sh_degree_cap: 3,
            show_overlay: true,
        }
    }

    /// Upload a cloud, replacing any previous one together with its sort
    /// working set and pipeline.
    pub fn set_cloud(&mut self, device: &wgpu::Device, cloud: &SplatCloud) {
        let store = SplatStore::new(device, cloud);
        let sorter = SplatSorter::new(device, &self.scene_buffer, &store);
        let pipeline = SplatPipeline::new(
            device,
            self.surface_format,
            &self.scene_buffer,
            &store,
            sorter.sorted_index_buffer(),
        );
        self.splat = Some(SplatBatch {
            store,
            sorter,
            pipeline,
        });
    }

    pub fn clear_cloud(&mut self) {
        self.splat = None;
    }

    pub fn splat_store(&self) -> Option<&SplatStore> {
        self.splat.as_ref().map(|b| &b.store)
    }

    pub fn splat_store_mut(&mut self) -> Option<&mut SplatStore> {
        self.splat.as_mut().map(|b| &mut b.store)
    }

    /// Record and submit one frame.
    pub fn render(
        &mut self,
        gpu: &GpuState,
        camera: &OrbitCamera,
        meshes: &[GpuMesh],
        instances: &[MeshInstance],
        gizmo: Option<&Gizmo>,
        overlay_aabb: Option<Aabb>,
    ) {
        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {:?}", e);
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Snapshot the model matrix once so sort and rasterize agree.
        let (model, splat_count, sh_degree, record_stride) = match &self.splat {
            Some(batch) => (
                batch.store.model_matrix(),
                batch.store.splat_count,
                batch.store.sh_degree.min(self.sh_degree_cap),
                batch.store.record_stride,
            ),
            None => (Mat4::IDENTITY, 0, 0, 64),
        };
        let uniform = SceneUniform::new(
            camera.view(),
            camera.projection(gpu.config.width, gpu.config.height),
            model,
            camera.position(),
            (gpu.config.width, gpu.config.height),
            splat_count,
            sh_degree,
            record_stride,
            self.frustum_dilation,
        );
        gpu.queue
            .write_buffer(&self.scene_buffer, 0, bytemuck::bytes_of(&uniform));

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        if let Some(batch) = &self.splat {
            if batch.store.splat_count > 0 {
                batch.sorter.record(&mut encoder);
            }
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.background),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &gpu.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.scene_bind_group, &[]);
            self.mesh_pipeline
                .draw(&mut render_pass, &gpu.queue, meshes, instances);

            if let Some(batch) = &self.splat {
                if batch.store.splat_count > 0 {
                    batch
                        .pipeline
                        .draw(&mut render_pass, batch.sorter.indirect_buffer());
                }
            }

            if let Some(gizmo) = gizmo {
                self.gizmo_renderer.draw(
                    &mut render_pass,
                    &gpu.device,
                    &gpu.queue,
                    &self.scene_bind_group,
                    gizmo,
                );
            }

            if self.show_overlay {
                if let Some(aabb) = overlay_aabb {
                    self.overlay.draw(
                        &mut render_pass,
                        &gpu.queue,
                        &self.scene_bind_group,
                        &aabb,
                    );
                }
            }
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}
