//! Error types for Eureka operations.

use thiserror::Error;

/// Result type alias for Eureka operations.
pub type Result<T> = std::result::Result<T, EurekaError>;

/// Main error type for Eureka operations.
///
/// The first six variants form the public taxonomy that callers see. The
/// remaining ones describe internal failures and are reported to clients as
/// a generic internal error.
#[derive(Error, Debug)]
pub enum EurekaError {
    /// Malformed or missing input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credential where one is required
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Valid credential without ownership of the target
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate value for a unique field
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unexpected failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Storage engine errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EurekaError {
    /// Creates a new bad request error.
    pub fn bad_request<T: ToString>(msg: T) -> Self {
        Self::BadRequest(msg.to_string())
    }

    /// Creates a new unauthorized error.
    pub fn unauthorized<T: ToString>(msg: T) -> Self {
        Self::Unauthorized(msg.to_string())
    }

    /// Creates a new forbidden error.
    pub fn forbidden<T: ToString>(msg: T) -> Self {
        Self::Forbidden(msg.to_string())
    }

    /// Creates a new not found error.
    pub fn not_found<T: ToString>(msg: T) -> Self {
        Self::NotFound(msg.to_string())
    }

    /// Creates a new conflict error.
    pub fn conflict<T: ToString>(msg: T) -> Self {
        Self::Conflict(msg.to_string())
    }

    /// Creates a new internal error.
    pub fn internal<T: ToString>(msg: T) -> Self {
        Self::Internal(msg.to_string())
    }

    /// Creates a new storage error.
    pub fn storage<T: ToString>(msg: T) -> Self {
        Self::Storage(msg.to_string())
    }

    /// Creates a new serialization error.
    pub fn serialization<T: ToString>(msg: T) -> Self {
        Self::Serialization(msg.to_string())
    }

    /// Creates a new configuration error.
    pub fn config<T: ToString>(msg: T) -> Self {
        Self::Config(msg.to_string())
    }

    /// Returns true for failures that originate inside the service rather
    /// than from the caller's input or credentials.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Internal(_) | Self::Storage(_) | Self::Serialization(_) | Self::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_classification() {
        assert!(EurekaError::storage("disk full").is_internal());
        assert!(EurekaError::serialization("bad bytes").is_internal());
        assert!(!EurekaError::not_found("Question not found").is_internal());
        assert!(!EurekaError::forbidden("not owner").is_internal());
    }

    #[test]
    fn test_display_includes_message() {
        let err = EurekaError::conflict("Username or email already exists");
        assert_eq!(
            err.to_string(),
            "Conflict: Username or email already exists"
        );
    }
}
