//! Point cloud loaders for the splatlight renderer.
//!
//! Supports binary PLY (little- and big-endian) in the standard 3DGS
//! property layout, and the headerless 32-byte-per-splat `.splat` format.
//! Files exceeding a splat budget are downsampled deterministically by
//! weighted reservoir sampling so that two runs on the same file produce
//! the same image.

pub mod error;
pub mod ply;
pub mod sample;
pub mod splat_file;

pub use error::LoadError;

use std::path::Path;

use splatlight_core::SplatCloud;

/// Load a point cloud by file extension (`.ply` or `.splat`), downsampling
/// to at most `max_splats` when set.
pub fn load_cloud(path: &Path, max_splats: Option<usize>) -> Result<SplatCloud, LoadError> {
    let bytes = std::fs::read(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("ply") => ply::parse_ply(&bytes, max_splats),
        Some("splat") => splat_file::parse_splat(&bytes, max_splats),
        other => Err(LoadError::UnsupportedFormat(format!(
            "unrecognized extension {:?} (expected .ply or .splat)",
            other.unwrap_or("")
        ))),
    }
}
