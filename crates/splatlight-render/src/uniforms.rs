use glam::{Mat4, Vec3};

/// The one uniform block shared by the cull/sort compute passes and every
/// render pipeline. Matches `SceneUniform` in the WGSL sources; the model
/// matrix is snapshotted at frame start so sort and rasterize agree.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub splat_count: u32,
    pub viewport: [f32; 2],
    /// Screen-space focal lengths `|P00|*W/2`, `|P11|*H/2`, positive.
    pub focal: [f32; 2],
    pub sh_degree: u32,
    pub record_stride: u32,
    pub frustum_dilation: f32,
    pub _pad: f32,
}

impl SceneUniform {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        view: Mat4,
        proj: Mat4,
        model: Mat4,
        camera_pos: Vec3,
        viewport: (u32, u32),
        splat_count: u32,
        sh_degree: u32,
        record_stride: u32,
        frustum_dilation: f32,
    ) -> Self {
        let (width, height) = (viewport.0 as f32, viewport.1 as f32);
        let focal = [
            proj.col(0).x.abs() * width * 0.5,
            proj.col(1).y.abs() * height * 0.5,
        ];
        Self {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            camera_pos: camera_pos.to_array(),
            splat_count,
            viewport: [width, height],
            focal,
            sh_degree,
            record_stride,
            frustum_dilation,
            _pad: 0.0,
        }
    }
}

/// Bind group layout entry for the scene uniform at binding 0, visible to
/// every stage that reads it.
pub fn scene_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("scene uniform layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX
                | wgpu::ShaderStages::FRAGMENT
                | wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_size_and_alignment() {
        // 3 mat4 + 4 vec4-sized tails.
        assert_eq!(std::mem::size_of::<SceneUniform>(), 240);
        assert_eq!(std::mem::size_of::<SceneUniform>() % 16, 0);
    }

    #[test]
    fn test_focal_from_projection() {
        let proj = Mat4::perspective_rh(45f32.to_radians(), 800.0 / 600.0, 0.1, 100.0);
        let u = SceneUniform::new(
            Mat4::IDENTITY,
            proj,
            Mat4::IDENTITY,
            Vec3::ZERO,
            (800, 600),
            0,
            0,
            64,
            0.2,
        );
        // fy = cot(fov/2) * H/2; fx relates through the aspect ratio and
        // equals fy for square pixels.
        let expected_fy = (45f32.to_radians() * 0.5).tan().recip() * 300.0;
        assert!((u.focal[1] - expected_fy).abs() < 1e-3);
        assert!((u.focal[0] - expected_fy).abs() < 1e-3);
        assert!(u.focal[0] > 0.0 && u.focal[1] > 0.0);
    }
}
