//! Procedural triangle meshes and the forward mesh pass.
//!
//! Meshes render before the splats with normal depth testing, so splats
//! blend correctly over and behind them. Only procedural primitives are
//! supported; mesh assets are outside this renderer's scope.

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use splatlight_core::{Aabb, Transform};

use crate::gpu::DEPTH_FORMAT;

/// 3D vertex for mesh rendering.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3D {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex3D {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex3D>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// A GPU-resident mesh.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub local_aabb: Aabb,
}

/// One placed mesh in the scene; a gizmo target.
pub struct MeshInstance {
    pub mesh: usize,
    pub transform: Transform,
    pub color: [f32; 4],
    pub local_aabb: Aabb,
    pub name: String,
}

impl MeshInstance {
    pub fn world_aabb(&self) -> Aabb {
        let m = self.transform.matrix();
        Aabb::from_points(self.local_aabb.corners().map(|c| m.transform_point3(c)))
    }
}

/// Per-draw uniforms, one 256-byte slot per instance.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct DrawUniforms {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 4],
    base_color: [f32; 4],
}

const DRAW_SLOT: u64 = 256;
const MAX_DRAWS: usize = 64;

pub struct MeshPipeline {
    pipeline: wgpu::RenderPipeline,
    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
}

impl MeshPipeline {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        scene_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh forward shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh_forward.wgsl").into()),
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mesh draw layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<DrawUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let draw_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mesh draw uniforms"),
            size: DRAW_SLOT * MAX_DRAWS as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let draw_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh draw bind group"),
            layout: &draw_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &draw_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniforms>() as u64),
                }),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh pipeline layout"),
            bind_group_layouts: &[scene_layout, &draw_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh forward pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex3D::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            draw_buffer,
            draw_bind_group,
        }
    }

    /// Upload per-instance uniforms and record one draw per instance.
    pub fn draw(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        queue: &wgpu::Queue,
        meshes: &[GpuMesh],
        instances: &[MeshInstance],
    ) {
        if instances.is_empty() {
            return;
        }
        if instances.len() > MAX_DRAWS {
            tracing::warn!(
                "mesh instance count {} exceeds pool of {}, extras skipped",
                instances.len(),
                MAX_DRAWS
            );
        }

        let mut slots = vec![0u8; DRAW_SLOT as usize * instances.len().min(MAX_DRAWS)];
        for (i, instance) in instances.iter().take(MAX_DRAWS).enumerate() {
            let model = instance.transform.matrix();
            let uniforms = DrawUniforms {
                model: model.to_cols_array_2d(),
                normal: model.inverse().transpose().to_cols_array_2d(),
                base_color: instance.color,
            };
            let offset = i * DRAW_SLOT as usize;
            slots[offset..offset + std::mem::size_of::<DrawUniforms>()]
                .copy_from_slice(bytemuck::bytes_of(&uniforms));
        }
        queue.write_buffer(&self.draw_buffer, 0, &slots);

        render_pass.set_pipeline(&self.pipeline);
        for (i, instance) in instances.iter().take(MAX_DRAWS).enumerate() {
            let Some(mesh) = meshes.get(instance.mesh) else {
                continue;
            };
            render_pass.set_bind_group(1, &self.draw_bind_group, &[(i as u32) * DRAW_SLOT as u32]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass
                .set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

fn upload(device: &wgpu::Device, label: &str, vertices: &[Vertex3D], indices: &[u32]) -> GpuMesh {
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{} VB", label)),
        contents: bytemuck::cast_slice(vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{} IB", label)),
        contents: bytemuck::cast_slice(indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    GpuMesh {
        vertex_buffer,
        index_buffer,
        index_count: indices.len() as u32,
        local_aabb: Aabb::from_points(vertices.iter().map(|v| Vec3::from(v.position))),
    }
}

/// Unit cube centered at the origin.
pub fn create_cube(device: &wgpu::Device) -> GpuMesh {
    let (vertices, indices) = cube_geometry();
    upload(device, "cube", &vertices, &indices)
}

/// UV sphere.
pub fn create_sphere(device: &wgpu::Device, radius: f32, rings: u32, sectors: u32) -> GpuMesh {
    let (vertices, indices) = sphere_geometry(radius, rings, sectors);
    upload(device, "sphere", &vertices, &indices)
}

fn cube_geometry() -> (Vec<Vertex3D>, Vec<u32>) {
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    ];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, tangent, bitangent) in faces {
        let base = vertices.len() as u32;
        for (u, v) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            let p = normal * 0.5 + tangent * u + bitangent * v;
            vertices.push(Vertex3D {
                position: p.to_array(),
                normal: normal.to_array(),
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    (vertices, indices)
}

fn sphere_geometry(radius: f32, rings: u32, sectors: u32) -> (Vec<Vertex3D>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for ring in 0..=rings {
        let theta = std::f32::consts::PI * ring as f32 / rings as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();
        for sector in 0..=sectors {
            let phi = 2.0 * std::f32::consts::PI * sector as f32 / sectors as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();
            let n = Vec3::new(sin_theta * cos_phi, cos_theta, sin_theta * sin_phi);
            vertices.push(Vertex3D {
                position: (n * radius).to_array(),
                normal: n.to_array(),
            });
        }
    }

    for ring in 0..rings {
        for sector in 0..sectors {
            let curr_row = ring * (sectors + 1);
            let next_row = (ring + 1) * (sectors + 1);
            // CCW winding when viewed from outside the sphere.
            indices.push(curr_row + sector);
            indices.push(next_row + sector + 1);
            indices.push(next_row + sector);
            indices.push(curr_row + sector);
            indices.push(curr_row + sector + 1);
            indices.push(next_row + sector + 1);
        }
    }
    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_geometry() {
        let (vertices, indices) = cube_geometry();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        let aabb = Aabb::from_points(vertices.iter().map(|v| Vec3::from(v.position)));
        assert_eq!(aabb.min, Vec3::splat(-0.5));
        assert_eq!(aabb.max, Vec3::splat(0.5));
    }

    #[test]
    fn test_sphere_geometry() {
        let (vertices, indices) = sphere_geometry(2.0, 8, 12);
        assert_eq!(vertices.len(), (8 + 1) * (12 + 1));
        assert_eq!(indices.len() as u32, 8 * 12 * 6);
        for v in &vertices {
            let p = Vec3::from(v.position);
            assert!((p.length() - 2.0).abs() < 1e-5);
            // Normals point outward.
            assert!((Vec3::from(v.normal) - p / 2.0).length() < 1e-5);
        }
    }

    #[test]
    fn test_instance_world_aabb() {
        let instance = MeshInstance {
            mesh: 0,
            transform: Transform {
                position: Vec3::new(10.0, 0.0, 0.0),
                scale: Vec3::splat(2.0),
                ..Default::default()
            },
            color: [1.0; 4],
            local_aabb: Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5)),
            name: "box".into(),
        };
        let aabb = instance.world_aabb();
        assert!((aabb.min - Vec3::new(9.0, -1.0, -1.0)).length() < 1e-5);
        assert!((aabb.max - Vec3::new(11.0, 1.0, 1.0)).length() < 1e-5);
    }
}
