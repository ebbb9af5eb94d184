//! Error types for evomem-core.

use thiserror::Error;

use crate::config::ConfigValidationError;

/// Result type alias using evomem-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for memory and session operations
#[derive(Error, Debug)]
pub enum Error {
    // Session registry errors
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session already exists: {0}")]
    SessionExists(String),

    // Validation errors
    #[error("Invalid argument for {field}: {message}")]
    InvalidArgument { field: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigValidationError),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Check if this error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SessionNotFound(_))
    }

    /// Check if this error reports a duplicate session
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::SessionExists(_))
    }

    /// Check if this error is a rejected argument
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_predicates() {
        let err = Error::SessionNotFound("abc".into());
        assert!(err.is_not_found());
        assert!(err.to_string().contains("abc"));

        let err = Error::SessionExists("dup".into());
        assert!(err.is_already_exists());
        assert!(!err.is_not_found());

        let err = Error::invalid_argument("category", "unknown value 'foo'");
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("category"));
        assert!(err.to_string().contains("foo"));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
