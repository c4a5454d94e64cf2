//! GPU-layout splat records and the in-memory splat cloud.
//!
//! Two record layouts are supported: the full 256-byte record carrying
//! three bands of spherical harmonics, and a 64-byte compact record for
//! memory-constrained devices. The compact record is bitwise the prefix of
//! the full record, so shaders address both through a single stride field.

use glam::Vec3;

use crate::aabb::Aabb;

/// Floats per full record (256 bytes).
pub const RECORD_FLOATS: usize = 64;
/// Floats per compact record (64 bytes).
pub const COMPACT_RECORD_FLOATS: usize = 16;
/// Interleaved higher-band SH coefficients: 9 (L1) + 15 (L2) + 21 (L3).
pub const SH_REST_FLOATS: usize = 45;

/// Full splat record, 256 bytes. Field order is load-bearing: shaders index
/// the buffer as raw floats, and the compact record must remain the prefix.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SplatRecord {
    /// World-space center.
    pub mean: [f32; 3],
    pub _pad0: f32,
    /// Per-axis standard deviations, already exp-decoded. Positive.
    pub scale: [f32; 3],
    pub _pad1: f32,
    /// Unit quaternion, `w,x,y,z` order.
    pub rotation: [f32; 4],
    /// Base color in linear light, `0.5 + C0 * f_dc`. May be negative.
    pub color_dc: [f32; 3],
    /// Sigmoid-decoded opacity in [0, 1].
    pub opacity: f32,
    /// Channel-interleaved `[R0,G0,B0,R1,G1,B1,...]` across bands 1..=3,
    /// zero-filled when absent.
    pub sh: [f32; SH_REST_FLOATS],
    pub _pad2: [f32; 3],
}

/// Compact splat record, 64 bytes, no spherical harmonics.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CompactSplatRecord {
    pub mean: [f32; 3],
    pub _pad0: f32,
    pub scale: [f32; 3],
    pub _pad1: f32,
    pub rotation: [f32; 4],
    pub color_dc: [f32; 3],
    pub opacity: f32,
}

impl SplatRecord {
    pub fn new(
        mean: Vec3,
        scale: Vec3,
        rotation: [f32; 4],
        color_dc: [f32; 3],
        opacity: f32,
    ) -> Self {
        Self {
            mean: mean.to_array(),
            _pad0: 0.0,
            scale: scale.to_array(),
            _pad1: 0.0,
            rotation,
            color_dc,
            opacity,
            sh: [0.0; SH_REST_FLOATS],
            _pad2: [0.0; 3],
        }
    }
}

impl CompactSplatRecord {
    pub fn new(
        mean: Vec3,
        scale: Vec3,
        rotation: [f32; 4],
        color_dc: [f32; 3],
        opacity: f32,
    ) -> Self {
        Self {
            mean: mean.to_array(),
            _pad0: 0.0,
            scale: scale.to_array(),
            _pad1: 0.0,
            rotation,
            color_dc,
            opacity,
        }
    }
}

/// Record storage for one loaded point cloud.
#[derive(Clone)]
pub enum SplatData {
    Full(Vec<SplatRecord>),
    Compact(Vec<CompactSplatRecord>),
}

/// A loaded splat point cloud with its precomputed bounds.
pub struct SplatCloud {
    pub data: SplatData,
    /// Axis-aligned bounding box over the means.
    pub aabb: Aabb,
    /// Radius of the bounding sphere centered at `aabb.center()`.
    pub bounding_radius: f32,
    /// Highest SH band actually present in the data (0..=3).
    pub sh_degree: u32,
}

impl SplatCloud {
    pub fn from_records(records: Vec<SplatRecord>, sh_degree: u32) -> Self {
        let (aabb, bounding_radius) =
            bounds(records.iter().map(|r| Vec3::from(r.mean)));
        Self {
            data: SplatData::Full(records),
            aabb,
            bounding_radius,
            sh_degree: sh_degree.min(3),
        }
    }

    pub fn from_compact(records: Vec<CompactSplatRecord>) -> Self {
        let (aabb, bounding_radius) =
            bounds(records.iter().map(|r| Vec3::from(r.mean)));
        Self {
            data: SplatData::Compact(records),
            aabb,
            bounding_radius,
            sh_degree: 0,
        }
    }

    pub fn len(&self) -> usize {
        match &self.data {
            SplatData::Full(v) => v.len(),
            SplatData::Compact(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record stride in floats, as the shaders index the buffer.
    pub fn stride_floats(&self) -> u32 {
        match &self.data {
            SplatData::Full(_) => RECORD_FLOATS as u32,
            SplatData::Compact(_) => COMPACT_RECORD_FLOATS as u32,
        }
    }

    /// Raw bytes of the record array for GPU upload.
    pub fn record_bytes(&self) -> &[u8] {
        match &self.data {
            SplatData::Full(v) => bytemuck::cast_slice(v),
            SplatData::Compact(v) => bytemuck::cast_slice(v),
        }
    }

    /// Drop the SH bands, converting to the 64-byte compact layout for
    /// memory-constrained devices. The rasterizer then runs in L0 mode.
    pub fn into_compact(self) -> SplatCloud {
        let data = match self.data {
            SplatData::Compact(v) => SplatData::Compact(v),
            SplatData::Full(v) => SplatData::Compact(
                v.into_iter()
                    .map(|r| CompactSplatRecord {
                        mean: r.mean,
                        _pad0: 0.0,
                        scale: r.scale,
                        _pad1: 0.0,
                        rotation: r.rotation,
                        color_dc: r.color_dc,
                        opacity: r.opacity,
                    })
                    .collect(),
            ),
        };
        SplatCloud {
            data,
            aabb: self.aabb,
            bounding_radius: self.bounding_radius,
            sh_degree: 0,
        }
    }

    /// Packed `f32x3` means, the position shadow buffer for culling. The
    /// values are copied bit-exactly from the records.
    pub fn shadow_positions(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.len() * 3);
        match &self.data {
            SplatData::Full(v) => {
                for r in v {
                    out.extend_from_slice(&r.mean);
                }
            }
            SplatData::Compact(v) => {
                for r in v {
                    out.extend_from_slice(&r.mean);
                }
            }
        }
        out
    }
}

fn bounds<I: Iterator<Item = Vec3> + Clone>(means: I) -> (Aabb, f32) {
    let aabb = Aabb::from_points(means.clone());
    let center = aabb.center();
    let mut radius: f32 = 0.0;
    for p in means {
        radius = radius.max(p.distance(center));
    }
    (aabb, radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes() {
        assert_eq!(std::mem::size_of::<SplatRecord>(), 256);
        assert_eq!(std::mem::size_of::<CompactSplatRecord>(), 64);
    }

    #[test]
    fn test_compact_is_prefix_of_full() {
        let full = SplatRecord::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.1, 0.2, 0.3),
            [1.0, 0.0, 0.0, 0.0],
            [0.5, 0.6, 0.7],
            0.8,
        );
        let compact = CompactSplatRecord::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.1, 0.2, 0.3),
            [1.0, 0.0, 0.0, 0.0],
            [0.5, 0.6, 0.7],
            0.8,
        );
        let full_bytes: &[u8] = bytemuck::bytes_of(&full);
        let compact_bytes: &[u8] = bytemuck::bytes_of(&compact);
        assert_eq!(&full_bytes[..64], compact_bytes);
    }

    #[test]
    fn test_cloud_bounds() {
        let records = vec![
            SplatRecord::new(
                Vec3::new(-1.0, 0.0, 0.0),
                Vec3::ONE,
                [1.0, 0.0, 0.0, 0.0],
                [0.5; 3],
                1.0,
            ),
            SplatRecord::new(
                Vec3::new(3.0, 0.0, 0.0),
                Vec3::ONE,
                [1.0, 0.0, 0.0, 0.0],
                [0.5; 3],
                1.0,
            ),
        ];
        let cloud = SplatCloud::from_records(records, 0);
        assert_eq!(cloud.aabb.center(), Vec3::new(1.0, 0.0, 0.0));
        assert!((cloud.bounding_radius - 2.0).abs() < 1e-6);
        assert_eq!(cloud.stride_floats(), 64);
    }

    #[test]
    fn test_into_compact_preserves_base_fields() {
        let mut record = SplatRecord::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.1, 0.2, 0.3),
            [0.5, 0.5, 0.5, 0.5],
            [0.2, 0.4, 0.6],
            0.7,
        );
        record.sh[0] = 9.0;
        let cloud = SplatCloud::from_records(vec![record], 3).into_compact();
        assert_eq!(cloud.sh_degree, 0);
        assert_eq!(cloud.stride_floats(), 16);
        let SplatData::Compact(records) = &cloud.data else {
            panic!("expected compact records");
        };
        assert_eq!(records[0].mean, [1.0, 2.0, 3.0]);
        assert_eq!(records[0].opacity, 0.7);
    }

    #[test]
    fn test_shadow_positions_bit_exact() {
        let mean = Vec3::new(0.1, -0.2, 1e-20);
        let cloud = SplatCloud::from_records(
            vec![SplatRecord::new(
                mean,
                Vec3::ONE,
                [1.0, 0.0, 0.0, 0.0],
                [0.5; 3],
                1.0,
            )],
            0,
        );
        let shadow = cloud.shadow_positions();
        assert_eq!(shadow.len(), 3);
        assert_eq!(shadow[0].to_bits(), mean.x.to_bits());
        assert_eq!(shadow[1].to_bits(), mean.y.to_bits());
        assert_eq!(shadow[2].to_bits(), mean.z.to_bits());
    }
}
