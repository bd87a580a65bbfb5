//! Error types for retrograph-memory

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing the event and pattern stores
#[derive(Debug, Error)]
pub enum MemoryError {
    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A store file exists but does not have the expected shape
    #[error("Malformed store document {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

impl MemoryError {
    /// Create a malformed document error
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for memory operations
pub type Result<T> = std::result::Result<T, MemoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display() {
        let err = MemoryError::malformed("/tmp/patterns.json", "expected object");
        assert_eq!(
            err.to_string(),
            "Malformed store document /tmp/patterns.json: expected object"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: MemoryError = io_err.into();
        assert!(matches!(err, MemoryError::Io(_)));
    }
}
