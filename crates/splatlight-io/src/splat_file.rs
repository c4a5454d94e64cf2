//! Headerless `.splat` loader: 32 bytes per splat, no spherical harmonics.
//!
//! Layout per record: `pos[3]*f32`, `scale[3]*f32` (linear), `color[3]*u8`,
//! `opacity*u8` (both divided by 255), `quat[4]*u8` (mapped through
//! `(b - 128) / 128` in `w,x,y,z` order, then normalized).

use splatlight_core::{CompactSplatRecord, SplatCloud};

use crate::error::LoadError;
use crate::sample;

const RECORD_BYTES: usize = 32;

/// Parse a `.splat` byte buffer into a compact splat cloud, downsampling
/// to `max_splats` when set. Compact clouds render with SH mode L0.
pub fn parse_splat(bytes: &[u8], max_splats: Option<usize>) -> Result<SplatCloud, LoadError> {
    if bytes.is_empty() {
        return Err(LoadError::NoVertices);
    }
    if bytes.len() % RECORD_BYTES != 0 {
        return Err(LoadError::Malformed(format!(
            ".splat length {} is not a multiple of {}",
            bytes.len(),
            RECORD_BYTES
        )));
    }

    let count = bytes.len() / RECORD_BYTES;
    let mut records = Vec::with_capacity(count);
    for row in bytes.chunks_exact(RECORD_BYTES) {
        let f = |i: usize| f32::from_le_bytes(row[i * 4..i * 4 + 4].try_into().unwrap());
        let mean = [f(0), f(1), f(2)];
        let scale = [f(3), f(4), f(5)];
        let color = &row[24..28];
        let quat = &row[28..32];

        let mut rot = [0.0f32; 4];
        for (dst, &b) in rot.iter_mut().zip(quat) {
            *dst = (f32::from(b) - 128.0) / 128.0;
        }
        let len_sq: f32 = rot.iter().map(|c| c * c).sum();
        let rotation = if len_sq > 1e-8 {
            let inv = len_sq.sqrt().recip();
            [rot[0] * inv, rot[1] * inv, rot[2] * inv, rot[3] * inv]
        } else {
            [1.0, 0.0, 0.0, 0.0]
        };

        records.push(CompactSplatRecord::new(
            mean.into(),
            scale.into(),
            rotation,
            [
                f32::from(color[0]) / 255.0,
                f32::from(color[1]) / 255.0,
                f32::from(color[2]) / 255.0,
            ],
            f32::from(color[3]) / 255.0,
        ));
    }

    let records = apply_budget(records, max_splats, bytes.len() as u64);
    tracing::info!("parsed .splat: {} splats (compact)", records.len());
    Ok(SplatCloud::from_compact(records))
}

fn apply_budget(
    records: Vec<CompactSplatRecord>,
    max_splats: Option<usize>,
    seed: u64,
) -> Vec<CompactSplatRecord> {
    let Some(budget) = max_splats else {
        return records;
    };
    if records.len() <= budget {
        return records;
    }
    let weights: Vec<f32> = records
        .iter()
        .map(|r| r.opacity * r.scale[0].max(r.scale[1]).max(r.scale[2]))
        .collect();
    let picked = sample::reservoir_indices(&weights, budget, seed);
    tracing::info!(
        "downsampled {} -> {} splats (budget {})",
        records.len(),
        picked.len(),
        budget
    );
    picked.into_iter().map(|i| records[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_record(
        pos: [f32; 3],
        scale: [f32; 3],
        color: [u8; 4],
        quat: [u8; 4],
    ) -> Vec<u8> {
        let mut row = Vec::with_capacity(RECORD_BYTES);
        for v in pos.iter().chain(scale.iter()) {
            row.extend_from_slice(&v.to_le_bytes());
        }
        row.extend_from_slice(&color);
        row.extend_from_slice(&quat);
        row
    }

    #[test]
    fn test_decode() {
        let bytes = build_record(
            [1.0, 2.0, 3.0],
            [0.1, 0.2, 0.3],
            [255, 128, 0, 255],
            [255, 128, 128, 128],
        );
        let cloud = parse_splat(&bytes, None).unwrap();
        assert_eq!(cloud.len(), 1);
        assert_eq!(cloud.sh_degree, 0);
        assert_eq!(cloud.stride_floats(), 16);
        let splatlight_core::SplatData::Compact(records) = &cloud.data else {
            panic!("expected compact records");
        };
        let r = &records[0];
        assert_eq!(r.mean, [1.0, 2.0, 3.0]);
        assert_eq!(r.scale, [0.1, 0.2, 0.3]);
        assert!((r.color_dc[0] - 1.0).abs() < 1e-6);
        assert!((r.color_dc[1] - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(r.color_dc[2], 0.0);
        assert!((r.opacity - 1.0).abs() < 1e-6);
        // quat bytes (255,128,128,128) -> (0.992.., 0, 0, 0) -> identity.
        assert!((r.rotation[0] - 1.0).abs() < 1e-6);
        assert_eq!(&r.rotation[1..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_degenerate_quat_falls_back() {
        let bytes = build_record([0.0; 3], [1.0; 3], [0, 0, 0, 0], [128, 128, 128, 128]);
        let cloud = parse_splat(&bytes, None).unwrap();
        let splatlight_core::SplatData::Compact(records) = &cloud.data else {
            panic!("expected compact records");
        };
        assert_eq!(records[0].rotation, [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_rejects_bad_length() {
        let bytes = vec![0u8; 33];
        assert!(matches!(
            parse_splat(&bytes, None),
            Err(LoadError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(parse_splat(&[], None), Err(LoadError::NoVertices)));
    }

    #[test]
    fn test_budget() {
        let mut bytes = Vec::new();
        for i in 0..50u8 {
            bytes.extend(build_record(
                [f32::from(i), 0.0, 0.0],
                [1.0; 3],
                [255, 255, 255, 255],
                [255, 128, 128, 128],
            ));
        }
        let cloud = parse_splat(&bytes, Some(8)).unwrap();
        assert_eq!(cloud.len(), 8);
    }
}
