//! Credential storage contract for the accounts service.
//!
//! This crate defines what a password/credential storage backend must do,
//! without implementing it:
//!
//! - [`User`] and its credential sub-records (emails, reset and verification tokens)
//! - [`PasswordStorage`], the async trait every backend implements
//! - [`AuthError`], the backend-agnostic error returned through the trait
//! - [`DateProvider`], the injectable clock used for `when`/`updatedAt` stamps
//!
//! # Implementations
//!
//! - `accounts-mongo` - MongoDB storage backend
//! - `accounts-db-memory` - in-memory backend for tests and local development
//!
//! # Example
//!
//! ```ignore
//! use accounts_auth::{DynPasswordStorage, AuthResult};
//!
//! async fn change_password(
//!     storage: &DynPasswordStorage,
//!     user_id: &str,
//!     hash: &str,
//! ) -> AuthResult<()> {
//!     storage.set_password(user_id, hash).await
//! }
//! ```

pub mod clock;
pub mod email;
pub mod error;
pub mod storage;
pub mod user;

pub use clock::DateProvider;
pub use email::normalize_email;
pub use error::{AuthError, ErrorCategory};
pub use storage::{DynPasswordStorage, PasswordStorage};
pub use user::{
    EmailRecord, EmailService, PasswordService, REASON_ENROLL, REASON_RESET, ResetTokenRecord,
    User, UserServices, VerificationTokenRecord,
};

/// Result type for auth storage operations.
pub type AuthResult<T> = Result<T, AuthError>;
