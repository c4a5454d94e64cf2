//! Optional YAML viewer configuration, discovered as `splatlight.yaml` in
//! the working directory or any parent. CLI flags override file values.

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(msg) => write!(f, "config IO error: {}", msg),
            Self::ParseError(msg) => write!(f, "config parse error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Downsample budget; `None` keeps every splat the device can hold.
    pub max_splats: Option<usize>,
    /// Spherical harmonics degree cap (0-3). Desktop defaults to 1.
    pub sh_degree: u32,
    /// Frustum dilation used by the cull test.
    pub frustum_dilation: f32,
    /// Clear color, linear RGB.
    pub background: [f64; 3],
    /// Gizmo snapping defaults.
    pub snap_enabled: bool,
    pub snap_translate: f32,
    pub snap_rotate_deg: f32,
    pub flip_planes: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            max_splats: None,
            sh_degree: 1,
            frustum_dilation: 0.2,
            background: [0.03, 0.03, 0.05],
            snap_enabled: false,
            snap_translate: 0.25,
            snap_rotate_deg: 15.0,
            flip_planes: true,
        }
    }
}

/// Search for `splatlight.yaml` from `start` upward.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        let candidate = d.join("splatlight.yaml");
        if candidate.exists() {
            return Some(candidate);
        }
        dir = d.parent();
    }
    None
}

pub fn load_config(path: &Path) -> Result<ViewerConfig, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.sh_degree, 1);
        assert!((config.frustum_dilation - 0.2).abs() < 1e-6);
        assert!(config.max_splats.is_none());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: ViewerConfig =
            serde_yaml::from_str("sh_degree: 3\nmax_splats: 500000\n").unwrap();
        assert_eq!(config.sh_degree, 3);
        assert_eq!(config.max_splats, Some(500_000));
        assert!(config.flip_planes);
    }

    #[test]
    fn test_bad_yaml_is_an_error() {
        let result: Result<ViewerConfig, _> = serde_yaml::from_str("sh_degree: [oops");
        assert!(result.is_err());
    }
}
