//! GPU-resident splat storage.
//!
//! Holds the record buffer, the position-only shadow buffer the cull pass
//! reads, and the model transform applied to the whole cloud. Buffers are
//! created at load and dropped with the store; a reload builds a new store
//! (and a new sort working set sized to it).

use glam::Mat4;
use wgpu::util::DeviceExt;

use splatlight_core::{Aabb, SplatCloud, Transform};

pub struct SplatStore {
    /// Raw record array, indexed by the shaders at `record_stride` floats.
    pub record_buffer: wgpu::Buffer,
    /// Packed `f32x3` means, bit-exact copies of the record means.
    pub position_buffer: wgpu::Buffer,
    pub splat_count: u32,
    pub record_stride: u32,
    pub sh_degree: u32,
    aabb: Aabb,
    bounding_radius: f32,
    transform: Transform,
}

impl SplatStore {
    pub fn new(device: &wgpu::Device, cloud: &SplatCloud) -> Self {
        let record_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("splat records"),
            contents: cloud.record_bytes(),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let shadow = cloud.shadow_positions();
        let position_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("splat positions"),
            contents: bytemuck::cast_slice(&shadow),
            usage: wgpu::BufferUsages::STORAGE,
        });

        tracing::info!(
            "splat store: {} splats, {} B/record, SH degree {}",
            cloud.len(),
            cloud.stride_floats() * 4,
            cloud.sh_degree
        );

        Self {
            record_buffer,
            position_buffer,
            splat_count: cloud.len() as u32,
            record_stride: cloud.stride_floats(),
            sh_degree: cloud.sh_degree,
            aabb: cloud.aabb,
            bounding_radius: cloud.bounding_radius,
            transform: Transform::default(),
        }
    }

    /// Object-space bounds, mutated only by reloads.
    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    pub fn bounding_radius(&self) -> f32 {
        self.bounding_radius
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// The model matrix the compute and render shaders apply per splat.
    pub fn model_matrix(&self) -> Mat4 {
        self.transform.matrix()
    }

    /// World-space bounds of the transformed cloud.
    pub fn world_aabb(&self) -> Aabb {
        let m = self.model_matrix();
        Aabb::from_points(self.aabb.corners().map(|c| m.transform_point3(c)))
    }
}
