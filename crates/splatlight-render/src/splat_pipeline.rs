//! Splat rasterizer: a 4-vertex triangle-strip billboard per visible
//! splat, instanced through the sorted index buffer via indirect draw.
//! Depth test is `always` and depth writes are off; ordering is entirely
//! the sort engine's. Blending is premultiplied
//! (`ONE`, `ONE_MINUS_SRC_ALPHA` on color and alpha).

use crate::gpu::DEPTH_FORMAT;
use crate::splat_store::SplatStore;

pub struct SplatPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
}

impl SplatPipeline {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        scene_buffer: &wgpu::Buffer,
        store: &SplatStore,
        sorted_indices: &wgpu::Buffer,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("splat draw shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/splat_draw.wgsl").into()),
        });

        let storage_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("splat draw layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage_entry(1),
                storage_entry(2),
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("splat draw bind group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: scene_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: store.record_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: sorted_indices.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("splat pipeline layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let blend = wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("splat render pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState {
                        color: blend,
                        alpha: blend,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
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

        Self {
            pipeline,
            bind_group,
        }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, indirect: &wgpu::Buffer) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.draw_indirect(indirect, 0);
    }
}

#[cfg(test)]
mod tests {
    //! CPU checks of the math contracts the WGSL vertex stage relies on.

    /// Normalized Gaussian falloff used by the fragment stage.
    fn falloff(a: f32) -> f32 {
        ((-4.0 * a).exp() - (-4.0f32).exp()) / (1.0 - (-4.0f32).exp())
    }

    fn clip_factor(alpha: f32) -> f32 {
        ((255.0 * alpha).ln().sqrt() / 2.0).min(1.0)
    }

    #[test]
    fn test_falloff_normalized() {
        assert!((falloff(0.0) - 1.0).abs() < 1e-6);
        assert!(falloff(1.0).abs() < 1e-6);
        assert!(falloff(0.5) > 0.0 && falloff(0.5) < 1.0);
    }

    #[test]
    fn test_opacity_clip_soundness() {
        // For any alpha in (1/255, 1], every uv with alpha*falloff(|uv|^2)
        // >= 1/255 must lie inside the clipped billboard (|uv|^2 <=
        // clip^2): the clip never discards a visible pixel.
        let cutoff = 1.0 / 255.0;
        let mut alpha = 0.0045f32;
        while alpha <= 1.0 {
            let clip = clip_factor(alpha);
            assert!(clip > 0.0 && clip <= 1.0);
            // Largest a with alpha * falloff(a) >= cutoff, by bisection.
            let (mut lo, mut hi) = (0.0f32, 1.0f32);
            for _ in 0..64 {
                let mid = 0.5 * (lo + hi);
                if alpha * falloff(mid) >= cutoff {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            assert!(
                lo <= clip * clip + 1e-4,
                "alpha {alpha}: visible extent {lo} exceeds clip^2 {}",
                clip * clip
            );
            alpha += 0.013;
        }
    }

    #[test]
    fn test_clip_discards_at_cutoff() {
        // At alpha == 1/255 the clip collapses to zero and the splat is
        // discarded in the vertex stage.
        assert!(clip_factor(1.0 / 255.0) <= 1e-4);
    }

    /// Analytic 2x2 symmetric eigendecomposition used for the billboard
    /// axes.
    fn eigenvalues(a: f32, b: f32, d: f32) -> (f32, f32) {
        let mid = 0.5 * (a + d);
        let radius = (0.25 * (a - d) * (a - d) + b * b).max(0.0).sqrt();
        (mid + radius, (mid - radius).max(0.1))
    }

    #[test]
    fn test_eigenvalues_diagonal() {
        let (l1, l2) = eigenvalues(9.0, 0.0, 4.0);
        assert!((l1 - 9.0).abs() < 1e-6);
        assert!((l2 - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_eigenvalues_rotated() {
        // [[5,3],[3,5]] has eigenvalues 8 and 2.
        let (l1, l2) = eigenvalues(5.0, 3.0, 5.0);
        assert!((l1 - 8.0).abs() < 1e-5);
        assert!((l2 - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_eigenvalue_floor() {
        // Near-degenerate covariance is floored, keeping the quad finite.
        let (_, l2) = eigenvalues(1e-6, 0.0, 1e-6);
        assert!((l2 - 0.1).abs() < 1e-6);
    }
}
