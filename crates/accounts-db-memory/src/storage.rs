use std::sync::{Arc, Mutex, PoisonError};

use accounts_auth::{
    AuthError, AuthResult, DateProvider, EmailRecord, EmailService, PasswordService,
    PasswordStorage, ResetTokenRecord, User, VerificationTokenRecord, normalize_email,
};
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, warn};

/// In-memory password storage keyed by user id.
///
/// Mirrors the MongoDB backend:
/// - addresses are lowercased before storing and comparing
/// - `add_email` skips only an identical `{address, verified}` entry
/// - an address owned by another user is a `Conflict` (unique index);
///   `add_email` calls are serialized so the check and the insert are atomic,
///   while `insert_user` bypasses the check
/// - `add_email` on an unknown user is `UserNotFound`, even for a taken address
/// - token appends on an unknown user are silently ignored
/// - `verify_email` updates the first entry with the address
#[derive(Debug, Clone, Default)]
pub struct InMemoryPasswordStorage {
    users: Arc<DashMap<String, User>>,
    email_writes: Arc<Mutex<()>>,
    clock: DateProvider,
}

impl InMemoryPasswordStorage {
    /// Creates an empty storage using the system clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty storage using `clock` for timestamps.
    pub fn with_clock(clock: DateProvider) -> Self {
        Self {
            users: Arc::new(DashMap::new()),
            email_writes: Arc::new(Mutex::new(())),
            clock,
        }
    }

    /// Insert or replace a user record.
    ///
    /// Stands in for the registration path, which is outside credential storage.
    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    /// Snapshot of a user record.
    pub fn get_user(&self, user_id: &str) -> Option<User> {
        self.users.get(user_id).map(|u| u.value().clone())
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` if no users are stored.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn find_first(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        self.users
            .iter()
            .find(|entry| pred(entry.value()))
            .map(|entry| entry.value().clone())
    }

    /// Apply `f` to the user, stamping `updated_at`.
    fn update_user(
        &self,
        user_id: &str,
        operation: &str,
        f: impl FnOnce(&mut User),
    ) -> AuthResult<()> {
        let Some(mut user) = self.users.get_mut(user_id) else {
            warn!(user_id, operation, "Update matched no user");
            return Err(AuthError::user_not_found(user_id));
        };
        f(user.value_mut());
        user.updated_at = Some(self.clock.now());
        Ok(())
    }
}

#[async_trait]
impl PasswordStorage for InMemoryPasswordStorage {
    async fn setup_indexes(&self) -> AuthResult<()> {
        debug!("In-memory storage has no indexes to create");
        Ok(())
    }

    async fn find_user_by_reset_password_token(&self, token: &str) -> AuthResult<Option<User>> {
        Ok(self.find_first(|u| u.has_reset_token(token)))
    }

    async fn find_user_by_email_verification_token(
        &self,
        token: &str,
    ) -> AuthResult<Option<User>> {
        Ok(self.find_first(|u| u.has_verification_token(token)))
    }

    async fn find_password_hash(&self, user_id: &str) -> AuthResult<Option<String>> {
        Ok(self
            .users
            .get(user_id)
            .and_then(|u| u.password_hash().map(str::to_string)))
    }

    async fn set_password(&self, user_id: &str, password_hash: &str) -> AuthResult<()> {
        self.update_user(user_id, "set_password", |user| {
            let password = user.services.password.get_or_insert_with(PasswordService::default);
            password.bcrypt = Some(password_hash.to_string());
            password.reset.clear();
        })
    }

    async fn add_email_verification_token(
        &self,
        user_id: &str,
        email: &str,
        token: &str,
    ) -> AuthResult<()> {
        if let Some(mut user) = self.users.get_mut(user_id) {
            user.services
                .email
                .get_or_insert_with(EmailService::default)
                .verification_tokens
                .push(VerificationTokenRecord {
                    token: token.to_string(),
                    address: normalize_email(email),
                    when: self.clock.now(),
                });
        }
        Ok(())
    }

    async fn add_reset_password_token(
        &self,
        user_id: &str,
        email: &str,
        token: &str,
        reason: &str,
    ) -> AuthResult<()> {
        if let Some(mut user) = self.users.get_mut(user_id) {
            user.services
                .password
                .get_or_insert_with(PasswordService::default)
                .reset
                .push(ResetTokenRecord {
                    token: token.to_string(),
                    address: normalize_email(email),
                    when: self.clock.now(),
                    reason: reason.to_string(),
                });
        }
        Ok(())
    }

    async fn add_email(&self, user_id: &str, email: &str, verified: bool) -> AuthResult<()> {
        let address = normalize_email(email);
        let _guard = self
            .email_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if !self.users.contains_key(user_id) {
            warn!(user_id, operation = "add_email", "Update matched no user");
            return Err(AuthError::user_not_found(user_id));
        }

        // Scan before taking the entry lock; DashMap shards would deadlock otherwise.
        let owned_elsewhere = self
            .users
            .iter()
            .any(|entry| entry.key() != user_id && entry.value().email(&address).is_some());
        if owned_elsewhere {
            return Err(AuthError::conflict(format!(
                "Email '{address}' is already in use"
            )));
        }

        let record = EmailRecord::new(address, verified);
        self.update_user(user_id, "add_email", |user| {
            if !user.emails.contains(&record) {
                user.emails.push(record);
            }
        })
    }

    async fn remove_email(&self, user_id: &str, email: &str) -> AuthResult<()> {
        let address = normalize_email(email);
        self.update_user(user_id, "remove_email", |user| {
            user.emails.retain(|e| e.address != address);
        })
    }

    async fn verify_email(&self, user_id: &str, email: &str) -> AuthResult<()> {
        let address = normalize_email(email);
        let owns_address = self
            .users
            .get(user_id)
            .is_some_and(|u| u.email(&address).is_some());
        if !owns_address {
            warn!(user_id, "verify_email matched no user with this address");
            return Err(AuthError::user_not_found(user_id));
        }

        self.update_user(user_id, "verify_email", |user| {
            if let Some(entry) = user.emails.iter_mut().find(|e| e.address == address) {
                entry.verified = true;
            }
            if let Some(service) = user.services.email.as_mut() {
                service.verification_tokens.retain(|v| v.address != address);
            }
        })
    }
}
