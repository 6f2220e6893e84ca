//! Password storage trait.
//!
//! Defines the interface for credential persistence operations.
//! Implementations are provided by storage backends (e.g., MongoDB).

use std::sync::Arc;

use async_trait::async_trait;

use crate::{AuthResult, User};

/// Storage operations for password and email credentials.
///
/// Every method is one independent read or single-document update; there is
/// no transactional guarantee across calls. Email arguments are normalized
/// with [`normalize_email`](crate::normalize_email) by the implementation.
///
/// Lookups return `Ok(None)` when nothing matches. Targeted updates that
/// match no user fail with [`AuthError::UserNotFound`](crate::AuthError).
#[async_trait]
pub trait PasswordStorage: Send + Sync {
    /// Ensure the unique indexes on `username` and `emails.address` exist.
    ///
    /// Idempotent. Failures are fatal at startup.
    async fn setup_indexes(&self) -> AuthResult<()>;

    /// Find the user whose pending reset requests contain `token`.
    async fn find_user_by_reset_password_token(&self, token: &str) -> AuthResult<Option<User>>;

    /// Find the user whose pending verification requests contain `token`.
    async fn find_user_by_email_verification_token(&self, token: &str)
    -> AuthResult<Option<User>>;

    /// Stored password hash; `None` both for unknown users and users without one.
    async fn find_password_hash(&self, user_id: &str) -> AuthResult<Option<String>>;

    /// Replace the password hash and drop all pending reset requests.
    async fn set_password(&self, user_id: &str, password_hash: &str) -> AuthResult<()>;

    /// Record a pending verification request for `email`.
    async fn add_email_verification_token(
        &self,
        user_id: &str,
        email: &str,
        token: &str,
    ) -> AuthResult<()>;

    /// Record a pending reset request for `email`, tagged with `reason`.
    async fn add_reset_password_token(
        &self,
        user_id: &str,
        email: &str,
        token: &str,
        reason: &str,
    ) -> AuthResult<()>;

    /// Complete a reset: same as [`set_password`](Self::set_password).
    ///
    /// `email` is accepted for interface compatibility and is not used.
    async fn set_reset_password(
        &self,
        user_id: &str,
        email: &str,
        password_hash: &str,
    ) -> AuthResult<()> {
        let _ = email;
        self.set_password(user_id, password_hash).await
    }

    /// Attach an email address unless the same entry is already present.
    async fn add_email(&self, user_id: &str, email: &str, verified: bool) -> AuthResult<()>;

    /// Detach an email address.
    async fn remove_email(&self, user_id: &str, email: &str) -> AuthResult<()>;

    /// Mark an address verified and drop its pending verification requests.
    async fn verify_email(&self, user_id: &str, email: &str) -> AuthResult<()>;
}

/// Type alias for a shareable password storage instance.
pub type DynPasswordStorage = Arc<dyn PasswordStorage>;
