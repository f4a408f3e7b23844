//! Error types for mesh loading.

use thiserror::Error;

/// Result type for mesh loading operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors that can occur while loading a mesh.
///
/// `NotFound` is recoverable by the caller (for example by trying another
/// backend); the others are fatal to the array or feature they affect.
#[derive(Error, Debug)]
pub enum MeshError {
    /// A required variable, array or attribute is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Paired inputs have inconsistent sizes or ranks.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Unknown encoding, compressor or connectivity layout.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Underlying read failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MeshError {
    /// Create a NotFound error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Create an UnsupportedFormat error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Create an Io error from a message (for read failures reported by
    /// collaborators that do not surface a `std::io::Error`).
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(std::io::Error::new(std::io::ErrorKind::Other, msg.into()))
    }

    /// Whether the caller may recover by trying an alternate source.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<serde_json::Error> for MeshError {
    fn from(err: serde_json::Error) -> Self {
        Self::UnsupportedFormat(format!("unparseable metadata: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_recoverable() {
        assert!(MeshError::not_found("lon").is_not_found());
        assert!(!MeshError::unsupported("x").is_not_found());
    }

    #[test]
    fn test_json_error_maps_to_unsupported() {
        let err: MeshError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, MeshError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_display_includes_context() {
        let err = MeshError::shape_mismatch("lon has 4 values, lat has 7");
        assert_eq!(err.to_string(), "shape mismatch: lon has 4 values, lat has 7");
    }
}
