use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "splatlight", version, about = "Interactive 3D Gaussian splatting viewer")]
pub struct CliArgs {
    /// Point cloud to load (.ply or .splat)
    pub file: Option<PathBuf>,

    /// Path to a splatlight.yaml config (default: search upward from cwd)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Downsample budget; clouds above it are importance-sampled
    #[arg(long)]
    pub max_splats: Option<usize>,

    /// Cap on the spherical harmonics degree (0-3)
    #[arg(long)]
    pub sh_degree: Option<u32>,

    /// Initial window width
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Initial window height
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Drop spherical harmonics on load (64-byte records, L0 shading)
    #[arg(long)]
    pub compact: bool,

    /// Spawn demo meshes next to the cloud (extra gizmo targets)
    #[arg(long)]
    pub demo_meshes: bool,
}
