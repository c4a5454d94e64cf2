#[derive(Debug)]
pub enum LoadError {
    IoError(String),
    /// Not a PLY file, ASCII PLY, or an extension we do not handle.
    UnsupportedFormat(String),
    /// Scalar type name the PLY grammar does not define.
    UnknownScalarType(String),
    /// Structurally broken file (truncated body, bad counts).
    Malformed(String),
    NoVertices,
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(msg) => write!(f, "splat IO error: {}", msg),
            Self::UnsupportedFormat(msg) => write!(f, "unsupported input: {}", msg),
            Self::UnknownScalarType(name) => {
                write!(f, "unknown PLY scalar type: {}", name)
            }
            Self::Malformed(msg) => write!(f, "malformed file: {}", msg),
            Self::NoVertices => write!(f, "file contains no splats"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}
