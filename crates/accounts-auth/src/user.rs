//! User record and its credential sub-records.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Reset reason used by the "forgot password" flow.
pub const REASON_RESET: &str = "reset";

/// Reset reason used when an account is enrolled without a password.
pub const REASON_ENROLL: &str = "enroll";

// =============================================================================
// User Type
// =============================================================================

/// A user record as seen by credential storage.
///
/// Only the fields credential storage reads or writes are modeled; profile
/// data owned by other services is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier, in its external string form.
    pub id: String,

    /// Login name, if the account has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Email addresses attached to the account (lowercase).
    #[serde(default)]
    pub emails: Vec<EmailRecord>,

    /// Per-service credential state.
    #[serde(default)]
    pub services: UserServices,

    /// When the record was created.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub created_at: Option<OffsetDateTime>,

    /// When the record was last mutated.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub updated_at: Option<OffsetDateTime>,
}

impl User {
    /// Creates a user with no emails and no credentials.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: None,
            emails: Vec::new(),
            services: UserServices::default(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Stored password hash, if any.
    #[must_use]
    pub fn password_hash(&self) -> Option<&str> {
        self.services
            .password
            .as_ref()
            .and_then(|p| p.bcrypt.as_deref())
    }

    /// Pending password reset requests.
    #[must_use]
    pub fn reset_tokens(&self) -> &[ResetTokenRecord] {
        self.services
            .password
            .as_ref()
            .map_or(&[], |p| p.reset.as_slice())
    }

    /// Pending email verification requests.
    #[must_use]
    pub fn verification_tokens(&self) -> &[VerificationTokenRecord] {
        self.services
            .email
            .as_ref()
            .map_or(&[], |e| e.verification_tokens.as_slice())
    }

    /// Finds the email entry with exactly this (already normalized) address.
    #[must_use]
    pub fn email(&self, address: &str) -> Option<&EmailRecord> {
        self.emails.iter().find(|e| e.address == address)
    }

    /// Returns `true` if a pending reset request carries `token`.
    #[must_use]
    pub fn has_reset_token(&self, token: &str) -> bool {
        self.reset_tokens().iter().any(|r| r.token == token)
    }

    /// Returns `true` if a pending verification request carries `token`.
    #[must_use]
    pub fn has_verification_token(&self, token: &str) -> bool {
        self.verification_tokens().iter().any(|v| v.token == token)
    }

    /// Copy of the user with the password hash and all tokens removed.
    ///
    /// Use this before logging or printing a user.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut user = self.clone();
        user.services = UserServices::default();
        user
    }
}

// =============================================================================
// Sub-records
// =============================================================================

/// One email address attached to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    /// Lowercase address.
    pub address: String,
    /// Whether the user proved control of the address.
    #[serde(default)]
    pub verified: bool,
}

impl EmailRecord {
    /// Creates an email entry.
    #[must_use]
    pub fn new(address: impl Into<String>, verified: bool) -> Self {
        Self {
            address: address.into(),
            verified,
        }
    }
}

/// Credential state grouped per service, matching the stored layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserServices {
    /// Password service state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<PasswordService>,
    /// Email service state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailService>,
}

/// Password hash and pending reset requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordService {
    /// Password hash produced by the calling service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bcrypt: Option<String>,
    /// Pending reset requests, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reset: Vec<ResetTokenRecord>,
}

/// Pending email verification requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailService {
    /// Pending verification requests, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification_tokens: Vec<VerificationTokenRecord>,
}

/// A pending password reset request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetTokenRecord {
    /// Opaque token generated by the calling service.
    pub token: String,
    /// Lowercase address the token was sent to.
    pub address: String,
    /// When the request was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub when: OffsetDateTime,
    /// Flow that issued the token, e.g. [`REASON_RESET`] or [`REASON_ENROLL`].
    pub reason: String,
}

/// A pending email verification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationTokenRecord {
    /// Opaque token generated by the calling service.
    pub token: String,
    /// Lowercase address being verified.
    pub address: String,
    /// When the request was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub when: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn user_with_credentials() -> User {
        let when = datetime!(2024-01-01 00:00:00 UTC);
        let mut user = User::new("u1");
        user.emails.push(EmailRecord::new("a@b.com", false));
        user.services.password = Some(PasswordService {
            bcrypt: Some("$2b$10$hash".to_string()),
            reset: vec![ResetTokenRecord {
                token: "tok1".to_string(),
                address: "a@b.com".to_string(),
                when,
                reason: REASON_RESET.to_string(),
            }],
        });
        user.services.email = Some(EmailService {
            verification_tokens: vec![VerificationTokenRecord {
                token: "vtok".to_string(),
                address: "a@b.com".to_string(),
                when,
            }],
        });
        user
    }

    #[test]
    fn test_accessors() {
        let user = user_with_credentials();
        assert_eq!(user.password_hash(), Some("$2b$10$hash"));
        assert!(user.has_reset_token("tok1"));
        assert!(!user.has_reset_token("tok2"));
        assert!(user.has_verification_token("vtok"));
        assert_eq!(user.email("a@b.com").map(|e| e.verified), Some(false));
        assert!(user.email("A@B.com").is_none());
    }

    #[test]
    fn test_empty_user_accessors() {
        let user = User::new("u2");
        assert!(user.password_hash().is_none());
        assert!(user.reset_tokens().is_empty());
        assert!(user.verification_tokens().is_empty());
    }

    #[test]
    fn test_redacted_drops_secrets() {
        let user = user_with_credentials().redacted();
        assert!(user.password_hash().is_none());
        assert!(user.reset_tokens().is_empty());
        assert_eq!(user.emails.len(), 1);

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("hash"));
        assert!(!json.contains("tok1"));
    }

    #[test]
    fn test_json_layout() {
        let user = user_with_credentials();
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["services"]["password"]["bcrypt"], "$2b$10$hash");
        assert_eq!(
            json["services"]["email"]["verificationTokens"][0]["token"],
            "vtok"
        );
        assert!(json.get("createdAt").is_none());
    }
}
