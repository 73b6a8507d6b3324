//! # Error Types
//!
//! Typed error handling for natours.
//! Every store, gateway and checkout operation returns `Result<T, AppError>`.

use thiserror::Error;

/// Core error type shared by all crates
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data (validation failures, malformed input)
    #[error("{0}")]
    InvalidRequest(String),

    /// Record not found
    #[error("No {resource} found with that ID: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Missing or invalid credentials
    #[error("{0}")]
    Unauthenticated(String),

    /// Authenticated, but the role does not allow the action
    #[error("You do not have permission to perform this action")]
    Forbidden,

    /// Payment signature did not match
    #[error("Payment verification failed")]
    VerificationFailed,

    /// Uniqueness conflict (duplicate email, duplicate review, ...)
    #[error("{0}")]
    Conflict(String),

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    Gateway { provider: String, message: String },

    /// Network/HTTP error communicating with the provider
    #[error("Network error: {0}")]
    Network(String),

    /// Database failure
    #[error("Store error: {0}")]
    Store(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidRequest(message.into())
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Configuration(_) => 503,
            AppError::InvalidRequest(_) => 400,
            AppError::NotFound { .. } => 404,
            AppError::Unauthenticated(_) => 401,
            AppError::Forbidden => 403,
            AppError::VerificationFailed => 400,
            AppError::Conflict(_) => 409,
            AppError::Gateway { .. } => 502,
            AppError::Network(_) => 503,
            AppError::Store(_) => 500,
            AppError::Serialization(_) => 500,
            AppError::Internal(_) => 500,
        }
    }

    /// `"fail"` for client errors, `"error"` for server errors.
    pub fn status_label(&self) -> &'static str {
        if self.is_client_error() {
            "fail"
        } else {
            "error"
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

/// Result type alias used across the workspace
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::invalid("bad").status_code(), 400);
        assert_eq!(AppError::not_found("tour", "t1").status_code(), 404);
        assert_eq!(AppError::Forbidden.status_code(), 403);
        assert_eq!(AppError::VerificationFailed.status_code(), 400);
        assert_eq!(
            AppError::Gateway {
                provider: "razorpay".into(),
                message: "boom".into()
            }
            .status_code(),
            502
        );
    }

    #[test]
    fn test_status_label() {
        assert_eq!(AppError::VerificationFailed.status_label(), "fail");
        assert_eq!(AppError::Unauthenticated("x".into()).status_label(), "fail");
        assert_eq!(AppError::Store("down".into()).status_label(), "error");
        assert_eq!(AppError::Network("timeout".into()).status_label(), "error");
    }

    #[test]
    fn test_not_found_message() {
        let err = AppError::not_found("tour", "abc");
        assert_eq!(err.to_string(), "No tour found with that ID: abc");
    }
}
