#[derive(Debug)]
pub enum RenderError {
    /// No usable adapter or device on this system.
    NoDevice(String),
    SurfaceError(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDevice(msg) => write!(f, "no GPU device: {}", msg),
            Self::SurfaceError(msg) => write!(f, "surface error: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {}
