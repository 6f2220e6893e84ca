//! Password and email credential storage.
//!
//! Each method issues exactly one `findOne`, `updateOne` or `createIndex`
//! against the user collection.

use std::sync::Arc;

use accounts_auth::{User, normalize_email};
use mongodb::bson::{Bson, Document, doc};
use mongodb::options::IndexOptions;
use mongodb::results::UpdateResult;
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::{debug, info, instrument, warn};

use crate::document::{timestamp_to_bson, user_from_document};
use crate::id::to_mongo_id;
use crate::options::MongoOptions;
use crate::{StorageError, StorageResult, is_duplicate_key, query};

/// MongoDB storage for password hashes, reset/verification tokens and emails.
///
/// Cheap to clone; clones share the driver's connection pool.
#[derive(Debug, Clone)]
pub struct MongoPasswordStorage {
    collection: Collection<Document>,
    options: Arc<MongoOptions>,
}

impl MongoPasswordStorage {
    /// Create storage on an existing database handle.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the options fail validation.
    pub fn new(db: &Database, options: MongoOptions) -> StorageResult<Self> {
        options.validate()?;
        let collection = db.collection::<Document>(&options.collection_name);
        Ok(Self {
            collection,
            options: Arc::new(options),
        })
    }

    /// Create storage by connecting to `uri` and selecting `database`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI cannot be parsed or the options are invalid.
    pub async fn connect(uri: &str, database: &str, options: MongoOptions) -> StorageResult<Self> {
        let client = Client::with_uri_str(uri).await?;
        Self::new(&client.database(database), options)
    }

    /// Get a reference to the resolved options.
    #[must_use]
    pub fn options(&self) -> &MongoOptions {
        &self.options
    }

    /// Get a reference to the user collection.
    #[must_use]
    pub fn collection(&self) -> &Collection<Document> {
        &self.collection
    }

    fn mongo_id(&self, user_id: &str) -> StorageResult<Bson> {
        to_mongo_id(user_id, self.options.convert_user_id_to_object_id)
    }

    fn now(&self) -> Bson {
        timestamp_to_bson(self.options.date_provider.now())
    }

    fn updated_at_field(&self) -> &str {
        &self.options.timestamps.updated_at
    }

    async fn find_one(&self, filter: Document) -> StorageResult<Option<User>> {
        self.collection
            .find_one(filter)
            .await?
            .map(|raw| user_from_document(raw, &self.options.timestamps))
            .transpose()
    }

    /// Fail with `UserNotFound` when the targeted update matched nothing.
    fn expect_matched(result: &UpdateResult, user_id: &str, operation: &str) -> StorageResult<()> {
        if result.matched_count == 0 {
            warn!(user_id, operation, "Update matched no user");
            return Err(StorageError::user_not_found(user_id));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Indexes
    // -------------------------------------------------------------------------

    /// Ensure unique sparse indexes on `username` and `emails.address`.
    ///
    /// Creating an index that already exists with the same options is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if either index cannot be created.
    #[instrument(skip(self), fields(collection = %self.options.collection_name))]
    pub async fn setup_indexes(&self) -> StorageResult<()> {
        for key in ["username", "emails.address"] {
            let model = IndexModel::builder()
                .keys(doc! { key: 1 })
                .options(IndexOptions::builder().unique(true).sparse(true).build())
                .build();
            self.collection.create_index(model).await?;
            info!(key, "Ensured unique sparse index");
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    /// Find the user with a pending reset request for `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the document is malformed.
    #[instrument(skip_all)]
    pub async fn find_user_by_reset_password_token(&self, token: &str) -> StorageResult<Option<User>> {
        let user = self.find_one(query::by_reset_token(token)).await?;
        debug!(found = user.is_some(), "Looked up user by reset token");
        Ok(user)
    }

    /// Find the user with a pending verification request for `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the document is malformed.
    #[instrument(skip_all)]
    pub async fn find_user_by_email_verification_token(
        &self,
        token: &str,
    ) -> StorageResult<Option<User>> {
        let user = self.find_one(query::by_verification_token(token)).await?;
        debug!(found = user.is_some(), "Looked up user by verification token");
        Ok(user)
    }

    /// Find a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is invalid or the query fails.
    #[instrument(skip(self))]
    pub async fn find_user_by_id(&self, user_id: &str) -> StorageResult<Option<User>> {
        self.find_one(query::by_id(self.mongo_id(user_id)?)).await
    }

    /// Find a user owning `email` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the document is malformed.
    #[instrument(skip(self))]
    pub async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        self.find_one(doc! { "emails.address": normalize_email(email) })
            .await
    }

    /// Stored password hash, or `None` for an unknown user or a user without one.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is invalid or the query fails.
    #[instrument(skip(self))]
    pub async fn find_password_hash(&self, user_id: &str) -> StorageResult<Option<String>> {
        let user = self.find_user_by_id(user_id).await?;
        Ok(user.and_then(|u| u.password_hash().map(str::to_string)))
    }

    // -------------------------------------------------------------------------
    // Password
    // -------------------------------------------------------------------------

    /// Replace the password hash, stamp `updatedAt` and drop pending resets.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if no user has this id.
    #[instrument(skip(self, password_hash))]
    pub async fn set_password(&self, user_id: &str, password_hash: &str) -> StorageResult<()> {
        let filter = query::by_id(self.mongo_id(user_id)?);
        let update = query::set_password(password_hash, self.updated_at_field(), self.now());
        let result = self.collection.update_one(filter, update).await?;
        Self::expect_matched(&result, user_id, "set_password")?;
        debug!("Password updated");
        Ok(())
    }

    /// Same as [`set_password`](Self::set_password); `email` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if no user has this id.
    #[instrument(skip(self, password_hash))]
    pub async fn set_reset_password(
        &self,
        user_id: &str,
        email: &str,
        password_hash: &str,
    ) -> StorageResult<()> {
        self.set_password(user_id, password_hash).await
    }

    // -------------------------------------------------------------------------
    // Tokens
    // -------------------------------------------------------------------------

    /// Append a verification request for `email`.
    ///
    /// Token uniqueness is not checked. An unknown user id is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is invalid or the update fails.
    #[instrument(skip(self, token))]
    pub async fn add_email_verification_token(
        &self,
        user_id: &str,
        email: &str,
        token: &str,
    ) -> StorageResult<()> {
        let filter = query::by_id(self.mongo_id(user_id)?);
        let update = query::push_verification_token(token, &normalize_email(email), self.now());
        let result = self.collection.update_one(filter, update).await?;
        debug!(matched = result.matched_count, "Added verification token");
        Ok(())
    }

    /// Append a reset request for `email`, tagged with `reason`.
    ///
    /// Token uniqueness is not checked. An unknown user id is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is invalid or the update fails.
    #[instrument(skip(self, token))]
    pub async fn add_reset_password_token(
        &self,
        user_id: &str,
        email: &str,
        token: &str,
        reason: &str,
    ) -> StorageResult<()> {
        let filter = query::by_id(self.mongo_id(user_id)?);
        let update = query::push_reset_token(token, &normalize_email(email), self.now(), reason);
        let result = self.collection.update_one(filter, update).await?;
        debug!(matched = result.matched_count, "Added reset token");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Emails
    // -------------------------------------------------------------------------

    /// Attach `email` unless an identical entry already exists.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if no user has this id, `Conflict` if another
    /// user already owns the address.
    #[instrument(skip(self))]
    pub async fn add_email(&self, user_id: &str, email: &str, verified: bool) -> StorageResult<()> {
        let address = normalize_email(email);
        let filter = query::by_id(self.mongo_id(user_id)?);
        let update = query::add_email(&address, verified, self.updated_at_field(), self.now());
        let result = self
            .collection
            .update_one(filter, update)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    return StorageError::conflict(format!(
                        "Email '{address}' is already in use"
                    ));
                }
                StorageError::from(e)
            })?;
        Self::expect_matched(&result, user_id, "add_email")
    }

    /// Detach `email`. A missing address on an existing user is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if no user has this id.
    #[instrument(skip(self))]
    pub async fn remove_email(&self, user_id: &str, email: &str) -> StorageResult<()> {
        let filter = query::by_id(self.mongo_id(user_id)?);
        let update =
            query::remove_email(&normalize_email(email), self.updated_at_field(), self.now());
        let result = self.collection.update_one(filter, update).await?;
        Self::expect_matched(&result, user_id, "remove_email")
    }

    /// Mark `email` verified and drop its verification requests atomically.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if the user does not exist or does not own `email`.
    #[instrument(skip(self))]
    pub async fn verify_email(&self, user_id: &str, email: &str) -> StorageResult<()> {
        let address = normalize_email(email);
        let filter = query::by_id_and_email(self.mongo_id(user_id)?, &address);
        let update = query::verify_email(&address, self.updated_at_field(), self.now());
        let result = self.collection.update_one(filter, update).await?;
        Self::expect_matched(&result, user_id, "verify_email")
    }
}
