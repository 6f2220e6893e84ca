//! Credential storage error types.
//!
//! Backends translate their own failures into [`AuthError`] so callers can
//! tell a user-correctable condition (unknown user, bad id, duplicate email)
//! from an operational failure (database unreachable, malformed document).

use std::error::Error as StdError;
use std::fmt;

/// Boxed source error carried by [`AuthError::Storage`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors returned by [`PasswordStorage`](crate::PasswordStorage) implementations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A targeted update matched no user record.
    #[error("User not found: {user_id}")]
    UserNotFound {
        /// The user id the operation targeted.
        user_id: String,
    },

    /// The caller passed a value the backend cannot use (e.g. a malformed id).
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of why the input is invalid.
        message: String,
    },

    /// The write would violate a uniqueness constraint.
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflict.
        message: String,
    },

    /// The backing store failed. The original error is kept as the source.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
        /// Underlying driver error, if any.
        #[source]
        source: Option<BoxError>,
    },
}

impl AuthError {
    /// Creates a new `UserNotFound` error.
    #[must_use]
    pub fn user_not_found(user_id: impl Into<String>) -> Self {
        Self::UserNotFound {
            user_id: user_id.into(),
        }
    }

    /// Creates a new `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error without a source.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `Storage` error wrapping the driver error.
    #[must_use]
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns `true` if this is a `UserNotFound` error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound { .. })
    }

    /// Returns `true` if this is a `Conflict` error.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound { .. } | Self::InvalidInput { .. } | Self::Conflict { .. }
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UserNotFound { .. } => ErrorCategory::NotFound,
            Self::InvalidInput { .. } => ErrorCategory::Validation,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
        }
    }
}

/// Categories of storage errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The targeted user does not exist.
    NotFound,
    /// Request validation errors.
    Validation,
    /// Uniqueness violations.
    Conflict,
    /// Database or network failures.
    Infrastructure,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Validation => write!(f, "validation"),
            Self::Conflict => write!(f, "conflict"),
            Self::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_not_found() {
        let err = AuthError::user_not_found("abc");
        assert!(err.is_not_found());
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.to_string(), "User not found: abc");
    }

    #[test]
    fn test_storage_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err = AuthError::storage_with_source("update failed", io);
        assert!(err.is_server_error());
        assert_eq!(err.category(), ErrorCategory::Infrastructure);
        let source = err.source().expect("source should be kept");
        assert_eq!(source.to_string(), "reset by peer");
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Conflict.to_string(), "conflict");
        assert_eq!(AuthError::invalid_input("x").category().to_string(), "validation");
    }
}
