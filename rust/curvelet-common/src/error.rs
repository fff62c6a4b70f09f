use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

pub type StdErrorBoxed = Box<dyn std::error::Error + Send + Sync + 'static>;

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_geometry(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidGeometry {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn empty_buffer() -> Error {
        Error(ErrorKind::EmptyBuffer.into())
    }

    pub fn rank_mismatch(expected: usize, actual: usize) -> Error {
        Error(ErrorKind::RankMismatch { expected, actual }.into())
    }

    pub fn scale_count_mismatch(expected: i64, actual: usize) -> Error {
        Error(ErrorKind::ScaleCountMismatch { expected, actual }.into())
    }

    pub fn angle_count_mismatch(scale: usize, expected: usize, actual: usize) -> Error {
        Error(
            ErrorKind::AngleCountMismatch {
                scale,
                expected,
                actual,
            }
            .into(),
        )
    }

    pub fn shape_mismatch(
        scale: usize,
        angle: usize,
        expected: impl Into<Vec<usize>>,
        actual: impl Into<Vec<usize>>,
    ) -> Error {
        Error(
            ErrorKind::ShapeMismatch {
                scale,
                angle,
                expected: expected.into(),
                actual: actual.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn native<E>(context: impl Into<String>, source: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error(
            ErrorKind::Native {
                context: context.into(),
                source: Box::new(source),
            }
            .into(),
        )
    }

    pub fn config(context: impl Into<String>, source: StdErrorBoxed) -> Error {
        Error(
            ErrorKind::Config {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The native library rejected the dimensions, scale count, angle count
    /// or boundary mode.
    #[error("invalid geometry: {message}")]
    InvalidGeometry { message: String },

    #[error("input buffer is empty")]
    EmptyBuffer,

    #[error("rank mismatch: expected {expected} axes, got {actual}")]
    RankMismatch { expected: usize, actual: usize },

    #[error("scale count mismatch: nbscales is {expected}, coefficients have {actual} scales")]
    ScaleCountMismatch { expected: i64, actual: usize },

    #[error("angle count mismatch at scale {scale}: expected {expected}, got {actual}")]
    AngleCountMismatch {
        scale: usize,
        expected: usize,
        actual: usize,
    },

    #[error("shape mismatch at scale {scale}, angle {angle}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        scale: usize,
        angle: usize,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("native library error: {context}: {source}")]
    Native {
        context: String,
        source: StdErrorBoxed,
    },

    #[error("configuration error for '{context}': {source}")]
    Config {
        context: String,
        source: StdErrorBoxed,
    },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        let err = Error::rank_mismatch(2, 4);
        assert!(matches!(
            err.kind(),
            ErrorKind::RankMismatch {
                expected: 2,
                actual: 4
            }
        ));
        assert_eq!(err.to_string(), "rank mismatch: expected 2 axes, got 4");
        assert!(matches!(err.into_kind(), ErrorKind::RankMismatch { .. }));
    }

    #[test]
    fn test_shape_mismatch_message() {
        let err = Error::shape_mismatch(1, 3, [4, 5], vec![5, 4]);
        assert_eq!(
            err.to_string(),
            "shape mismatch at scale 1, angle 3: expected [4, 5], got [5, 4]"
        );
    }

    #[test]
    fn test_error_is_small() {
        assert_eq!(
            std::mem::size_of::<Error>(),
            std::mem::size_of::<usize>()
        );
    }
}
