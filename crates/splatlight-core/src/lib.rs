//! Core types for the splatlight renderer: GPU-layout splat records, the
//! in-memory splat cloud, and the small math kernel (rays, triangle
//! intersection, Euler/quaternion helpers, pivoted transforms) shared by
//! the render and viewer crates.

pub mod aabb;
pub mod angles;
pub mod intersect;
pub mod ray;
pub mod record;
pub mod transform;

pub use aabb::Aabb;
pub use ray::Ray;
pub use record::{CompactSplatRecord, SplatCloud, SplatData, SplatRecord};
pub use transform::Transform;

/// Zeroth-band spherical harmonic normalization constant (Y_0^0).
pub const SH_C0: f32 = 0.28209479177387814;

/// Splats with effective alpha below this never contribute a visible pixel.
pub const OPACITY_CUTOFF: f32 = 1.0 / 255.0;
