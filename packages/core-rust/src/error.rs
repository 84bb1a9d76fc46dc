//! Error taxonomy shared by every stage of the handling chain.

/// Coarse classification of an [`ImageError`].
///
/// The outer boundary maps these to user-facing status codes; stages never
/// inspect them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing, malformed or expired credential.
    Authentication,
    /// Missing or malformed operation parameters.
    Validation,
    /// Unknown operation name or unsupported output format.
    UnsupportedOperation,
    /// Failure inside the underlying transform or codec.
    Processing,
}

impl ErrorKind {
    /// Stable machine-readable code for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authentication => "AUTH_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            Self::Processing => "PROCESSING_ERROR",
        }
    }
}

/// Errors returned by handling stages and transforms.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    UnsupportedOperation(String),
    #[error("{0}")]
    Processing(String),
    #[error("operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl ImageError {
    /// Returns the taxonomy kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Validation(_) => ErrorKind::Validation,
            Self::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            Self::Processing(_) | Self::Timeout { .. } => ErrorKind::Processing,
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<image::ImageError> for ImageError {
    fn from(err: image::ImageError) -> Self {
        Self::Processing(err.to_string())
    }
}
