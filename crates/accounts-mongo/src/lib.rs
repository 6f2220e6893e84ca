//! MongoDB storage backend for accounts credentials
//!
//! Provides persistent storage for the credential state of a user record:
//!
//! - Password hashes (`services.password.bcrypt`)
//! - Pending password reset requests (`services.password.reset`)
//! - Pending email verification requests (`services.email.verificationTokens`)
//! - Email addresses (`emails`)
//!
//! User records are created and deleted elsewhere; this backend only reads
//! and mutates existing documents, one query per operation.
//!
//! # Example
//!
//! ```ignore
//! use accounts_mongo::{MongoOptions, MongoPasswordStorage};
//!
//! let storage =
//!     MongoPasswordStorage::connect("mongodb://localhost:27017", "accounts", MongoOptions::default())
//!         .await?;
//! storage.setup_indexes().await?;
//!
//! let hash = storage.find_password_hash("65f1c0ffee0000000000beef").await?;
//! ```

pub mod adapter;
pub mod document;
pub mod id;
pub mod options;
pub mod password;
pub mod query;

pub use options::{MongoOptions, PartialMongoOptions, PartialTimestampFields, TimestampFields};
pub use password::MongoPasswordStorage;

use mongodb::error::{ErrorKind, WriteError, WriteFailure};

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during credential storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// A targeted update matched no user document.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// The write would violate a unique index.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored document does not have the expected shape.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] mongodb::bson::de::Error),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StorageError {
    // -------------------------------------------------------------------------
    // Constructor Methods
    // -------------------------------------------------------------------------

    /// Create a `UserNotFound` error.
    #[must_use]
    pub fn user_not_found(user_id: impl Into<String>) -> Self {
        Self::UserNotFound(user_id.into())
    }

    /// Create a `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create an `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    // -------------------------------------------------------------------------
    // Predicate Methods
    // -------------------------------------------------------------------------

    /// Returns `true` if this is a `UserNotFound` error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound(_))
    }

    /// Returns `true` if this is a `Conflict` error.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Returns `true` if this is a database error.
    #[must_use]
    pub fn is_database_error(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// Returns `true` if this is an invalid input error.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Returns `true` if this is a client error (4xx equivalent).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_) | Self::Conflict(_) | Self::InvalidInput(_)
        )
    }

    /// Returns `true` if this is a server error (5xx equivalent).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Deserialization(_))
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Returns `true` if the driver error is a unique index violation.
pub(crate) fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(WriteError {
            code: DUPLICATE_KEY_CODE,
            ..
        }))
    )
}

// =============================================================================
// Tests
// =============================================================================
