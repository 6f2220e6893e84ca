//! [`PasswordStorage`] implementation for the MongoDB backend.
//!
//! Lets [`MongoPasswordStorage`] be used as `Arc<dyn PasswordStorage>` by the
//! accounts service. Driver errors are kept as the error source.

use accounts_auth::{AuthError, AuthResult, PasswordStorage, User};
use async_trait::async_trait;

use crate::{MongoPasswordStorage, StorageError};

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UserNotFound(user_id) => AuthError::user_not_found(user_id),
            StorageError::Conflict(message) => AuthError::conflict(message),
            StorageError::InvalidInput(message) => AuthError::invalid_input(message),
            StorageError::Database(e) => AuthError::storage_with_source("MongoDB operation failed", e),
            StorageError::Deserialization(e) => {
                AuthError::storage_with_source("Malformed user document", e)
            }
        }
    }
}

#[async_trait]
impl PasswordStorage for MongoPasswordStorage {
    async fn setup_indexes(&self) -> AuthResult<()> {
        Ok(MongoPasswordStorage::setup_indexes(self).await?)
    }

    async fn find_user_by_reset_password_token(&self, token: &str) -> AuthResult<Option<User>> {
        Ok(MongoPasswordStorage::find_user_by_reset_password_token(self, token).await?)
    }

    async fn find_user_by_email_verification_token(
        &self,
        token: &str,
    ) -> AuthResult<Option<User>> {
        Ok(MongoPasswordStorage::find_user_by_email_verification_token(self, token).await?)
    }

    async fn find_password_hash(&self, user_id: &str) -> AuthResult<Option<String>> {
        Ok(MongoPasswordStorage::find_password_hash(self, user_id).await?)
    }

    async fn set_password(&self, user_id: &str, password_hash: &str) -> AuthResult<()> {
        Ok(MongoPasswordStorage::set_password(self, user_id, password_hash).await?)
    }

    async fn add_email_verification_token(
        &self,
        user_id: &str,
        email: &str,
        token: &str,
    ) -> AuthResult<()> {
        Ok(MongoPasswordStorage::add_email_verification_token(self, user_id, email, token).await?)
    }

    async fn add_reset_password_token(
        &self,
        user_id: &str,
        email: &str,
        token: &str,
        reason: &str,
    ) -> AuthResult<()> {
        Ok(
            MongoPasswordStorage::add_reset_password_token(self, user_id, email, token, reason)
                .await?,
        )
    }

    async fn set_reset_password(
        &self,
        user_id: &str,
        email: &str,
        password_hash: &str,
    ) -> AuthResult<()> {
        Ok(MongoPasswordStorage::set_reset_password(self, user_id, email, password_hash).await?)
    }

    async fn add_email(&self, user_id: &str, email: &str, verified: bool) -> AuthResult<()> {
        Ok(MongoPasswordStorage::add_email(self, user_id, email, verified).await?)
    }

    async fn remove_email(&self, user_id: &str, email: &str) -> AuthResult<()> {
        Ok(MongoPasswordStorage::remove_email(self, user_id, email).await?)
    }

    async fn verify_email(&self, user_id: &str, email: &str) -> AuthResult<()> {
        Ok(MongoPasswordStorage::verify_email(self, user_id, email).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accounts_auth::ErrorCategory;
    use std::error::Error as _;

    #[test]
    fn test_not_found_maps_to_user_not_found() {
        let err = AuthError::from(StorageError::user_not_found("u1"));
        assert!(matches!(err, AuthError::UserNotFound { ref user_id } if user_id == "u1"));
    }

    #[test]
    fn test_conflict_and_invalid_input_stay_client_errors() {
        assert_eq!(
            AuthError::from(StorageError::conflict("dup")).category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            AuthError::from(StorageError::invalid_input("bad id")).category(),
            ErrorCategory::Validation
        );
    }

    #[test]
    fn test_deserialization_keeps_source() {
        let doc = mongodb::bson::doc! { "verified": "yes" };
        let de_err = mongodb::bson::from_document::<accounts_auth::EmailRecord>(doc).unwrap_err();
        let err = AuthError::from(StorageError::from(de_err));
        assert!(err.is_server_error());
        assert!(err.source().is_some());
    }
}
