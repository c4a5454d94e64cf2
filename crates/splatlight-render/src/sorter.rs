//! GPU sort-and-cull engine.
//!
//! Once per frame, in one command submission: clear the working set,
//! project and cull every splat (compacting survivors with a sortable
//! depth key and an indirect instance count), then run a four-pass 8-bit
//! LSD radix sort over the compacted keys. Each radix pass is an
//! upsweep (per-block histograms), a spine (prefix sums across blocks,
//! plus the global bin prefix in the bin-0 workgroup), and a downsweep
//! (stable ordered scatter). Passes ping-pong between two key/value
//! buffer pairs; after the even number of passes the primary value
//! buffer holds the back-to-front permutation and is bound directly by
//! the rasterizer.
//!
//! All degenerate cases (zero splats, everything culled) leave the
//! indirect instance count at zero and the draw is a no-op; the tail of
//! the working buffers past `visible_count` is never read.

use std::collections::HashMap;

use crate::splat_store::SplatStore;

pub const WORKGROUP_SIZE: u32 = 256;
/// Elements per sort block (4 per thread).
pub const BLOCK_SIZE: u32 = 1024;
const RADIX_PASSES: u32 = 4;
/// Dynamic-offset stride for the per-pass parameter slots.
const PASS_SLOT: u64 = 256;

/// Monotone map from f32 to u32: flip the sign bit for positives, all
/// bits for negatives, so IEEE-754 values compare by plain `u32` order.
/// Host-side mirror of the shader's `encode_depth`.
pub fn encode_depth_key(z: f32) -> u32 {
    let bits = z.to_bits();
    let mask = if bits >> 31 == 1 { 0xFFFF_FFFF } else { 0x8000_0000 };
    bits ^ mask
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct SortPassParams {
    pass_index: u32,
    _pad: [u32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct DrawIndirectArgs {
    vertex_count: u32,
    instance_count: u32,
    first_vertex: u32,
    first_instance: u32,
}

pub struct SplatSorter {
    capacity: u32,
    partitions: u32,

    keys: wgpu::Buffer,
    keys_tmp: wgpu::Buffer,
    values: wgpu::Buffer,
    values_tmp: wgpu::Buffer,
    global_hist: wgpu::Buffer,
    partition_hist: wgpu::Buffer,
    indirect: wgpu::Buffer,
    indirect_reset: wgpu::Buffer,
    _pass_buffer: wgpu::Buffer,

    cull_pipeline: wgpu::ComputePipeline,
    upsweep_pipeline: wgpu::ComputePipeline,
    spine_pipeline: wgpu::ComputePipeline,
    downsweep_pipeline: wgpu::ComputePipeline,

    /// Even passes read primary, write tmp; odd passes swap.
    sort_group_even: wgpu::BindGroup,
    sort_group_odd: wgpu::BindGroup,
    pass_group: wgpu::BindGroup,
}

impl SplatSorter {
    pub fn new(
        device: &wgpu::Device,
        scene_buffer: &wgpu::Buffer,
        store: &SplatStore,
    ) -> Self {
        let capacity = store.splat_count.max(1);
        let partitions = capacity.div_ceil(BLOCK_SIZE);

        let pair = |label: &str| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: u64::from(capacity) * 4,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let keys = pair("sort keys");
        let keys_tmp = pair("sort keys tmp");
        let values = pair("sort values");
        let values_tmp = pair("sort values tmp");

        let global_hist = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sort global histogram"),
            size: u64::from(RADIX_PASSES) * 256 * 4,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let partition_hist = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sort partition histogram"),
            size: u64::from(partitions) * 256 * 4,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        use wgpu::util::DeviceExt;
        let reset_args = DrawIndirectArgs {
            vertex_count: 4,
            instance_count: 0,
            first_vertex: 0,
            first_instance: 0,
        };
        let indirect = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("splat draw indirect"),
            contents: bytemuck::bytes_of(&reset_args),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::INDIRECT
                | wgpu::BufferUsages::COPY_DST,
        });
        let indirect_reset = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("splat draw indirect reset"),
            contents: bytemuck::bytes_of(&reset_args),
            usage: wgpu::BufferUsages::COPY_SRC,
        });

        // One parameter slot per radix pass, selected by dynamic offset.
        let mut pass_bytes = vec![0u8; PASS_SLOT as usize * RADIX_PASSES as usize];
        for pass in 0..RADIX_PASSES {
            let params = SortPassParams {
                pass_index: pass,
                _pad: [0; 3],
            };
            let offset = (pass as usize) * PASS_SLOT as usize;
            pass_bytes[offset..offset + std::mem::size_of::<SortPassParams>()]
                .copy_from_slice(bytemuck::bytes_of(&params));
        }
        let pass_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sort pass params"),
            contents: &pass_bytes,
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("splat sort shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/splat_sort.wgsl").into()),
        });

        let storage_entry = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let sort_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sort bind group layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage_entry(1, true),
                storage_entry(2, true),
                storage_entry(3, false),
                storage_entry(4, false),
                storage_entry(5, false),
                storage_entry(6, false),
                storage_entry(7, false),
                storage_entry(8, false),
                storage_entry(9, false),
            ],
        });

        let pass_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sort pass layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<SortPassParams>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let make_sort_group = |label: &str,
                               in_keys: &wgpu::Buffer,
                               in_values: &wgpu::Buffer,
                               out_keys: &wgpu::Buffer,
                               out_values: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &sort_layout,
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
                        resource: store.position_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: in_keys.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: in_values.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: out_keys.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 6,
                        resource: out_values.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 7,
                        resource: global_hist.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 8,
                        resource: partition_hist.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 9,
                        resource: indirect.as_entire_binding(),
                    },
                ],
            })
        };
        let sort_group_even =
            make_sort_group("sort group even", &keys, &values, &keys_tmp, &values_tmp);
        let sort_group_odd =
            make_sort_group("sort group odd", &keys_tmp, &values_tmp, &keys, &values);

        let pass_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sort pass group"),
            layout: &pass_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &pass_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<SortPassParams>() as u64),
                }),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sort pipeline layout"),
            bind_group_layouts: &[&sort_layout, &pass_layout],
            push_constant_ranges: &[],
        });

        fn make_pipeline(
            device: &wgpu::Device,
            layout: &wgpu::PipelineLayout,
            module: &wgpu::ShaderModule,
            label: &str,
            entry: &str,
            options: wgpu::PipelineCompilationOptions,
        ) -> wgpu::ComputePipeline {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: Some(layout),
                module,
                entry_point: Some(entry),
                compilation_options: options,
                cache: None,
            })
        }

        let cull_pipeline = make_pipeline(
            device,
            &pipeline_layout,
            &shader,
            "cull pipeline",
            "cull",
            Default::default(),
        );
        let upsweep_pipeline = make_pipeline(
            device,
            &pipeline_layout,
            &shader,
            "upsweep pipeline",
            "upsweep",
            Default::default(),
        );
        let spine_constants =
            HashMap::from([("max_partitions".to_string(), f64::from(partitions))]);
        let spine_pipeline = make_pipeline(
            device,
            &pipeline_layout,
            &shader,
            "spine pipeline",
            "spine",
            wgpu::PipelineCompilationOptions {
                constants: &spine_constants,
                ..Default::default()
            },
        );
        let downsweep_pipeline = make_pipeline(
            device,
            &pipeline_layout,
            &shader,
            "downsweep pipeline",
            "downsweep",
            Default::default(),
        );

        tracing::info!(
            "sort working set: capacity {}, {} partitions",
            capacity,
            partitions
        );

        Self {
            capacity,
            partitions,
            keys,
            keys_tmp,
            values,
            values_tmp,
            global_hist,
            partition_hist,
            indirect,
            indirect_reset,
            _pass_buffer: pass_buffer,
            cull_pipeline,
            upsweep_pipeline,
            spine_pipeline,
            downsweep_pipeline,
            sort_group_even,
            sort_group_odd,
            pass_group,
        }
    }

    /// The `{4, visible_count, 0, 0}` buffer consumed by `draw_indirect`.
    pub fn indirect_buffer(&self) -> &wgpu::Buffer {
        &self.indirect
    }

    /// Back-to-front permutation of visible splat indices, valid for
    /// `[0, visible_count)` after the recorded passes execute.
    pub fn sorted_index_buffer(&self) -> &wgpu::Buffer {
        &self.values
    }

    /// Record the full reset / cull / sort sequence for this frame.
    pub fn record(&self, encoder: &mut wgpu::CommandEncoder) {
        // Pass 0 - reset the working set.
        encoder.clear_buffer(&self.keys, 0, None);
        encoder.clear_buffer(&self.keys_tmp, 0, None);
        encoder.clear_buffer(&self.values, 0, None);
        encoder.clear_buffer(&self.values_tmp, 0, None);
        encoder.clear_buffer(&self.global_hist, 0, None);
        encoder.clear_buffer(&self.partition_hist, 0, None);
        encoder.copy_buffer_to_buffer(
            &self.indirect_reset,
            0,
            &self.indirect,
            0,
            std::mem::size_of::<DrawIndirectArgs>() as u64,
        );

        // Pass 1 - project and cull into the compacted key/value pairs.
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("splat cull"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.cull_pipeline);
            pass.set_bind_group(0, &self.sort_group_even, &[]);
            pass.set_bind_group(1, &self.pass_group, &[0]);
            pass.dispatch_workgroups(self.capacity.div_ceil(WORKGROUP_SIZE), 1, 1);
        }

        // Pass 2 - four stable radix passes over 8-bit digits.
        for radix_pass in 0..RADIX_PASSES {
            let group = if radix_pass % 2 == 0 {
                &self.sort_group_even
            } else {
                &self.sort_group_odd
            };
            let pass_offset = radix_pass * PASS_SLOT as u32;

            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("radix upsweep"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.upsweep_pipeline);
            pass.set_bind_group(0, group, &[]);
            pass.set_bind_group(1, &self.pass_group, &[pass_offset]);
            pass.dispatch_workgroups(self.partitions, 1, 1);
            drop(pass);

            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("radix spine"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.spine_pipeline);
            pass.set_bind_group(0, group, &[]);
            pass.set_bind_group(1, &self.pass_group, &[pass_offset]);
            pass.dispatch_workgroups(256, 1, 1);
            drop(pass);

            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("radix downsweep"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.downsweep_pipeline);
            pass.set_bind_group(0, group, &[]);
            pass.set_bind_group(1, &self.pass_group, &[pass_offset]);
            pass.dispatch_workgroups(self.partitions, 1, 1);
        }
        // Pass 3 - publish: after the even number of passes the primary
        // value buffer already is `sorted_indices`; nothing to copy.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_key_monotone() {
        let values = [
            f32::MIN,
            -1e30,
            -100.5,
            -1.0,
            -1e-30,
            -0.0,
            0.0,
            1e-30,
            0.5,
            1.0,
            100.5,
            1e30,
            f32::MAX,
        ];
        for pair in values.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a < b {
                assert!(
                    encode_depth_key(a) < encode_depth_key(b),
                    "encode({a}) >= encode({b})"
                );
            } else {
                // -0.0 and 0.0 map to adjacent keys in order.
                assert!(encode_depth_key(a) <= encode_depth_key(b));
            }
        }
    }

    #[test]
    fn test_depth_key_exhaustive_negatives_before_positives() {
        assert!(encode_depth_key(-f32::MIN_POSITIVE) < encode_depth_key(0.0));
        assert!(encode_depth_key(-1.0) < encode_depth_key(-0.5));
        assert!(encode_depth_key(0.5) < encode_depth_key(1.0));
    }

    /// CPU mirror of the GPU radix scheme: per-block histograms, global and
    /// per-partition exclusive prefixes, then an in-order scatter per block.
    /// Exercises the exact cursor arithmetic the shader uses.
    fn radix_sort_mirror(keys: &[u32], values: &[u32]) -> (Vec<u32>, Vec<u32>) {
        let n = keys.len();
        let mut in_keys = keys.to_vec();
        let mut in_values = values.to_vec();
        let mut out_keys = vec![0u32; n];
        let mut out_values = vec![0u32; n];
        let partitions = n.div_ceil(BLOCK_SIZE as usize).max(1);

        for pass in 0..4 {
            let shift = pass * 8;
            // Upsweep.
            let mut global = [0u32; 256];
            let mut partial = vec![[0u32; 256]; partitions];
            for p in 0..partitions {
                let start = p * BLOCK_SIZE as usize;
                let end = (start + BLOCK_SIZE as usize).min(n);
                for &key in &in_keys[start..end] {
                    let bin = ((key >> shift) & 0xFF) as usize;
                    partial[p][bin] += 1;
                    global[bin] += 1;
                }
            }
            // Spine: exclusive prefix across bins and across partitions.
            let mut running = 0u32;
            for bin in 0..256 {
                let count = global[bin];
                global[bin] = running;
                running += count;
            }
            for bin in 0..256 {
                let mut carry = 0u32;
                for p in 0..partitions {
                    let count = partial[p][bin];
                    partial[p][bin] = carry;
                    carry += count;
                }
            }
            // Downsweep: one in-order walk per block.
            for p in 0..partitions {
                let mut cursors = [0u32; 256];
                for bin in 0..256 {
                    cursors[bin] = global[bin] + partial[p][bin];
                }
                let start = p * BLOCK_SIZE as usize;
                let end = (start + BLOCK_SIZE as usize).min(n);
                for i in start..end {
                    let key = in_keys[i];
                    let bin = ((key >> shift) & 0xFF) as usize;
                    let dst = cursors[bin] as usize;
                    cursors[bin] += 1;
                    out_keys[dst] = key;
                    out_values[dst] = in_values[i];
                }
            }
            std::mem::swap(&mut in_keys, &mut out_keys);
            std::mem::swap(&mut in_values, &mut out_values);
        }
        (in_keys, in_values)
    }

    #[test]
    fn test_radix_mirror_sorts() {
        let mut rng = 0x1234_5678_u64;
        let mut next = || {
            rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (rng >> 32) as u32
        };
        let keys: Vec<u32> = (0..5000).map(|_| next()).collect();
        let values: Vec<u32> = (0..5000).collect();
        let (sorted_keys, sorted_values) = radix_sort_mirror(&keys, &values);
        assert!(sorted_keys.windows(2).all(|w| w[0] <= w[1]));
        // The permutation round-trips the original keys.
        for (k, &v) in sorted_keys.iter().zip(&sorted_values) {
            assert_eq!(*k, keys[v as usize]);
        }
    }

    #[test]
    fn test_radix_mirror_is_stable() {
        // 8 distinct depths x 8 identical-depth tiebreak groups: within
        // each group the permutation must preserve input order.
        let mut keys = Vec::new();
        let mut values = Vec::new();
        for i in 0..64u32 {
            keys.push(encode_depth_key(-((i % 8) as f32) - 1.0));
            values.push(i);
        }
        let (_, sorted_values) = radix_sort_mirror(&keys, &values);
        for depth_group in 0..8u32 {
            let group: Vec<u32> = sorted_values
                .iter()
                .copied()
                .filter(|v| v % 8 == depth_group)
                .collect();
            let mut expected = group.clone();
            expected.sort_unstable();
            assert_eq!(group, expected, "group {depth_group} reordered");
        }
    }

    #[test]
    fn test_radix_mirror_multi_block_stability() {
        // Spread identical keys across several 1024-element blocks.
        let n = 4096u32;
        let keys: Vec<u32> = (0..n).map(|i| encode_depth_key(-((i % 3) as f32))).collect();
        let values: Vec<u32> = (0..n).collect();
        let (sorted_keys, sorted_values) = radix_sort_mirror(&keys, &values);
        assert!(sorted_keys.windows(2).all(|w| w[0] <= w[1]));
        for class in 0..3u32 {
            let group: Vec<u32> = sorted_values
                .iter()
                .copied()
                .filter(|v| v % 3 == class)
                .collect();
            assert!(group.windows(2).all(|w| w[0] < w[1]), "class {class} unstable");
        }
    }

    #[test]
    fn test_radix_mirror_empty_and_single() {
        let (k, v) = radix_sort_mirror(&[], &[]);
        assert!(k.is_empty() && v.is_empty());
        let (k, v) = radix_sort_mirror(&[42], &[0]);
        assert_eq!(k, vec![42]);
        assert_eq!(v, vec![0]);
    }

    use glam::{Mat4, Vec3};

    /// CPU reference of the cull pass: same tests, same key encoding.
    fn cull_reference(
        mean: Vec3,
        opacity: f32,
        rotation: [f32; 4],
        model: Mat4,
        view: Mat4,
        proj: Mat4,
        dilation: f32,
    ) -> Option<u32> {
        if opacity < 1.0 / 255.0 {
            return None;
        }
        let q_sq: f32 = rotation.iter().map(|c| c * c).sum();
        if q_sq < 1e-6 {
            return None;
        }
        let view_pos = view * model * mean.extend(1.0);
        let clip = proj * view_pos;
        let lim = (1.0 + dilation) * clip.w;
        let inside = clip.x.abs() <= lim
            && clip.y.abs() <= lim
            && clip.z >= -dilation * clip.w
            && clip.z <= clip.w;
        if !inside {
            return None;
        }
        Some(encode_depth_key(view_pos.z))
    }

    #[test]
    fn test_cull_reference_cases() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(45f32.to_radians(), 4.0 / 3.0, 0.1, 100.0);
        let ident = [1.0, 0.0, 0.0, 0.0];
        let cull = |mean: Vec3, opacity: f32, rot: [f32; 4]| {
            cull_reference(mean, opacity, rot, Mat4::IDENTITY, view, proj, 0.2)
        };

        // Centered splat survives.
        assert!(cull(Vec3::ZERO, 1.0, ident).is_some());
        // Behind the camera, far off-screen, and past the far plane fail
        // the dilated clip test.
        assert!(cull(Vec3::new(0.0, 0.0, 10.0), 1.0, ident).is_none());
        assert!(cull(Vec3::new(50.0, 0.0, 0.0), 1.0, ident).is_none());
        assert!(cull(Vec3::new(0.0, 0.0, -200.0), 1.0, ident).is_none());
        // The 20% dilation band keeps splats slightly outside the frustum.
        let edge_x = (45f32.to_radians() * 0.5).tan() * 3.0 * (4.0 / 3.0);
        assert!(cull(Vec3::new(edge_x * 1.1, 0.0, 0.0), 1.0, ident).is_some());
        assert!(cull(Vec3::new(edge_x * 1.4, 0.0, 0.0), 1.0, ident).is_none());
        // Transparent and quaternion-degenerate splats are rejected.
        assert!(cull(Vec3::ZERO, 0.5 / 255.0, ident).is_none());
        assert!(cull(Vec3::ZERO, 1.0, [0.0; 4]).is_none());
        // NaN means fail the affirmative containment test.
        assert!(cull(Vec3::new(f32::NAN, 0.0, 0.0), 1.0, ident).is_none());
    }

    #[test]
    fn test_cull_reference_orders_back_to_front() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 20.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(45f32.to_radians(), 1.0, 0.1, 100.0);
        let ident = [1.0, 0.0, 0.0, 0.0];
        let far = cull_reference(
            Vec3::new(0.0, 0.0, -10.0),
            1.0,
            ident,
            Mat4::IDENTITY,
            view,
            proj,
            0.2,
        )
        .unwrap();
        let near = cull_reference(
            Vec3::new(0.0, 0.0, 10.0),
            1.0,
            ident,
            Mat4::IDENTITY,
            view,
            proj,
            0.2,
        )
        .unwrap();
        // Ascending key order draws the farther splat first.
        assert!(far < near);
    }

    #[test]
    fn test_back_to_front_ordering() {
        // View-space z is negative in front of the camera; ascending key
        // order puts the farthest (most negative) splat first.
        let far = encode_depth_key(-10.0);
        let near = encode_depth_key(-5.0);
        assert!(far < near);
    }
}
