//! GPU renderer for 3D Gaussian splat clouds.
//!
//! The per-frame pipeline: project and cull every splat on the GPU, radix
//! sort the survivors back to front, then rasterize them as EWA-fitted
//! billboards with premultiplied blending. Meshes draw first with normal
//! depth testing; the transform gizmo and the bounding-box overlay draw
//! last on top.

pub mod camera;
pub mod error;
pub mod gizmo;
pub mod gpu;
pub mod mesh;
pub mod overlay;
pub mod renderer;
pub mod sorter;
pub mod splat_pipeline;
pub mod splat_store;
pub mod uniforms;

pub use camera::OrbitCamera;
pub use error::RenderError;
pub use gpu::GpuState;
pub use renderer::Renderer;
pub use splat_store::SplatStore;
