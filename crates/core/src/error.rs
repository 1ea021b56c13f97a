// Central Error Type for the Dispatch Pipeline

use thiserror::Error;

/// Every failure the dispatch pipeline can surface.
///
/// The first four variants are the recognised kinds the error translator
/// maps to specific status codes; everything else folds into a 500.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No principal where one is required, method not public, or permission check failed
    #[error("{0}")]
    Forbidden(String),

    /// Request verb does not match the allow-list rule
    #[error("{0}")]
    MethodNotAllowed(String),

    /// Entity-level view denial raised by a repository
    #[error("{0}")]
    AccessDenied(String),

    /// Missing required parameter, failed coercion, or unclassified invocation failure
    #[error("{0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DispatchError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        DispatchError::Forbidden(msg.into())
    }

    pub fn method_not_allowed(msg: impl Into<String>) -> Self {
        DispatchError::MethodNotAllowed(msg.into())
    }

    pub fn access_denied(msg: impl Into<String>) -> Self {
        DispatchError::AccessDenied(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        DispatchError::Internal(msg.into())
    }

    /// HTTP status code this error translates to
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchError::Forbidden(_) | DispatchError::AccessDenied(_) => 403,
            DispatchError::MethodNotAllowed(_) => 405,
            DispatchError::Internal(_)
            | DispatchError::Database(_)
            | DispatchError::Serialization(_)
            | DispatchError::Config(_) => 500,
        }
    }
}

/// Result type alias using DispatchError
pub type Result<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(DispatchError::forbidden("x").status_code(), 403);
        assert_eq!(DispatchError::access_denied("x").status_code(), 403);
        assert_eq!(DispatchError::method_not_allowed("x").status_code(), 405);
        assert_eq!(DispatchError::internal("x").status_code(), 500);
        assert_eq!(DispatchError::Database("locked".into()).status_code(), 500);
        assert_eq!(DispatchError::Config("bad".into()).status_code(), 500);
    }

    #[test]
    fn test_recognised_kinds_display_bare_message() {
        let err = DispatchError::forbidden("Public method secret not allowed");
        assert_eq!(err.to_string(), "Public method secret not allowed");
    }
}
