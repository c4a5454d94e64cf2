//! GPU side of the gizmo: one vertex buffer per handle mesh (plus the
//! full-ring variants), a dynamic-offset uniform slot per drawn handle,
//! and an alpha-blended pipeline that draws over everything.

use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::gizmo::{Gizmo, Shape};
use crate::gpu::DEPTH_FORMAT;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct HandleUniforms {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

const HANDLE_SLOT: u64 = 256;
const MAX_HANDLES: usize = 16;

struct ShapeBuffers {
    vertex: wgpu::Buffer,
    vertex_count: u32,
    alt_vertex: Option<wgpu::Buffer>,
    alt_count: u32,
}

pub struct GizmoRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    buffers: Vec<ShapeBuffers>,
    shapes_version: u64,
}

fn flatten(triangles: &[[Vec3; 3]]) -> Vec<f32> {
    let mut out = Vec::with_capacity(triangles.len() * 9);
    for tri in triangles {
        for v in tri {
            out.extend_from_slice(&v.to_array());
        }
    }
    out
}

impl GizmoRenderer {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        scene_layout: &wgpu::BindGroupLayout,
        gizmo: &Gizmo,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("gizmo shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/gizmo.wgsl").into()),
        });

        let handle_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("gizmo handle layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<HandleUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gizmo handle uniforms"),
            size: HANDLE_SLOT * MAX_HANDLES as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("gizmo handle bind group"),
            layout: &handle_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<HandleUniforms>() as u64),
                }),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("gizmo pipeline layout"),
            bind_group_layouts: &[scene_layout, &handle_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("gizmo pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: 12,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let mut renderer = Self {
            pipeline,
            uniform_buffer,
            bind_group,
            buffers: Vec::new(),
            shapes_version: gizmo.shapes_version(),
        };
        renderer.rebuild_buffers(device, gizmo.shapes());
        renderer
    }

    fn rebuild_buffers(&mut self, device: &wgpu::Device, shapes: &[Shape]) {
        self.buffers = shapes
            .iter()
            .map(|shape| {
                let flat = flatten(&shape.triangles);
                let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("gizmo handle VB"),
                    contents: bytemuck::cast_slice(&flat),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let (alt_vertex, alt_count) = if shape.alt_triangles.is_empty() {
                    (None, 0)
                } else {
                    let alt_flat = flatten(&shape.alt_triangles);
                    let buffer =
                        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                            label: Some("gizmo handle alt VB"),
                            contents: bytemuck::cast_slice(&alt_flat),
                            usage: wgpu::BufferUsages::VERTEX,
                        });
                    (Some(buffer), (shape.alt_triangles.len() * 3) as u32)
                };
                ShapeBuffers {
                    vertex,
                    vertex_count: (shape.triangles.len() * 3) as u32,
                    alt_vertex,
                    alt_count,
                }
            })
            .collect();
    }

    /// Draw the gizmo's visible handles, rebuilding mesh buffers first if
    /// the shape set changed mode.
    pub fn draw(
        &mut self,
        render_pass: &mut wgpu::RenderPass<'_>,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene_bind_group: &wgpu::BindGroup,
        gizmo: &Gizmo,
    ) {
        if gizmo.shapes_version() != self.shapes_version {
            self.rebuild_buffers(device, gizmo.shapes());
            self.shapes_version = gizmo.shapes_version();
        }

        let highlighted = gizmo.highlighted_axes();
        let mut draw_list: Vec<(usize, bool)> = Vec::new();
        let mut slots = vec![0u8; HANDLE_SLOT as usize * MAX_HANDLES];

        for (i, shape) in gizmo.shapes().iter().enumerate() {
            if !shape.visible || draw_list.len() >= MAX_HANDLES {
                continue;
            }
            let highlight = highlighted.contains(&shape.axis);
            let (rgb, alpha) = if shape.disabled {
                (shape.disabled_color, shape.alpha * 0.4)
            } else if highlight {
                (shape.hover_color, shape.hover_alpha)
            } else {
                (shape.color, shape.alpha)
            };
            if alpha <= 0.0 {
                continue;
            }
            let uniforms = HandleUniforms {
                model: gizmo.shape_world_matrix(shape).to_cols_array_2d(),
                color: [rgb[0], rgb[1], rgb[2], alpha],
            };
            let offset = draw_list.len() * HANDLE_SLOT as usize;
            slots[offset..offset + std::mem::size_of::<HandleUniforms>()]
                .copy_from_slice(bytemuck::bytes_of(&uniforms));
            draw_list.push((i, shape.use_alt && !shape.alt_triangles.is_empty()));
        }

        if draw_list.is_empty() {
            return;
        }
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            &slots[..draw_list.len() * HANDLE_SLOT as usize],
        );

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, scene_bind_group, &[]);
        for (slot, (shape_index, use_alt)) in draw_list.iter().enumerate() {
            let buffers = &self.buffers[*shape_index];
            let (vertex, count) = if *use_alt {
                match &buffers.alt_vertex {
                    Some(alt) => (alt, buffers.alt_count),
                    None => (&buffers.vertex, buffers.vertex_count),
                }
            } else {
                (&buffers.vertex, buffers.vertex_count)
            };
            render_pass.set_bind_group(
                1,
                &self.bind_group,
                &[(slot as u32) * HANDLE_SLOT as u32],
            );
            render_pass.set_vertex_buffer(0, vertex.slice(..));
            render_pass.draw(0..count, 0..1);
        }
    }
}
