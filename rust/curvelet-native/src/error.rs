/// Failure reported by a native curvelet library.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NativeError {
    /// The library rejected the dimensions or geometry it was given.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The library failed while running a transform.
    #[error("{0}")]
    Failed(String),
}

impl NativeError {
    pub fn invalid_geometry(message: impl Into<String>) -> NativeError {
        NativeError::InvalidGeometry(message.into())
    }

    pub fn failed(message: impl Into<String>) -> NativeError {
        NativeError::Failed(message.into())
    }
}
