//! Mapping between stored user documents and [`User`].
//!
//! Timestamps are written as Int64 milliseconds since the epoch. On read,
//! any integer/double millisecond value or BSON `DateTime` is accepted, so
//! records written by other tools still load.

use accounts_auth::clock::{from_unix_millis, to_unix_millis};
use accounts_auth::{
    EmailRecord, EmailService, PasswordService, ResetTokenRecord, User, UserServices,
    VerificationTokenRecord,
};
use mongodb::bson::{self, Bson, Document};
use serde::Deserialize;
use serde::de::Error as _;
use time::OffsetDateTime;

use crate::StorageResult;
use crate::id::id_to_string;
use crate::options::TimestampFields;

// =============================================================================
// Stored Layout
// =============================================================================

#[derive(Debug, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id")]
    id: Bson,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    emails: Vec<EmailRecord>,
    #[serde(default)]
    services: ServicesDocument,
}

#[derive(Debug, Default, Deserialize)]
struct ServicesDocument {
    #[serde(default)]
    password: Option<PasswordDocument>,
    #[serde(default)]
    email: Option<EmailDocument>,
}

#[derive(Debug, Deserialize)]
struct PasswordDocument {
    #[serde(default)]
    bcrypt: Option<String>,
    #[serde(default)]
    reset: Vec<ResetDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmailDocument {
    #[serde(default)]
    verification_tokens: Vec<VerificationDocument>,
}

#[derive(Debug, Deserialize)]
struct ResetDocument {
    token: String,
    address: String,
    when: Bson,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct VerificationDocument {
    token: String,
    address: String,
    when: Bson,
}

// =============================================================================
// Conversion
// =============================================================================

/// Timestamp value as written to the database.
#[must_use]
pub fn timestamp_to_bson(at: OffsetDateTime) -> Bson {
    Bson::Int64(to_unix_millis(at))
}

/// Read a stored timestamp; `None` for missing or unrecognized values.
#[must_use]
pub fn timestamp_from_bson(value: &Bson) -> Option<OffsetDateTime> {
    let millis = match value {
        Bson::Int64(ms) => *ms,
        Bson::Int32(ms) => i64::from(*ms),
        Bson::Double(ms) if ms.is_finite() => *ms as i64,
        Bson::DateTime(dt) => dt.timestamp_millis(),
        _ => return None,
    };
    from_unix_millis(millis)
}

fn required_timestamp(value: &Bson, field: &str) -> StorageResult<OffsetDateTime> {
    timestamp_from_bson(value).ok_or_else(|| {
        bson::de::Error::custom(format!("field '{field}' is not a timestamp: {value}")).into()
    })
}

/// Build a [`User`] from a stored document.
///
/// # Errors
///
/// Returns `Deserialization` if the credential fields do not have the
/// expected shape.
pub fn user_from_document(raw: Document, timestamps: &TimestampFields) -> StorageResult<User> {
    let created_at = raw.get(&timestamps.created_at).and_then(timestamp_from_bson);
    let updated_at = raw.get(&timestamps.updated_at).and_then(timestamp_from_bson);

    let doc: UserDocument = bson::from_document(raw)?;

    let password = match doc.services.password {
        Some(p) => Some(PasswordService {
            bcrypt: p.bcrypt,
            reset: p
                .reset
                .into_iter()
                .map(|r| {
                    Ok(ResetTokenRecord {
                        when: required_timestamp(&r.when, "services.password.reset.when")?,
                        token: r.token,
                        address: r.address,
                        reason: r.reason,
                    })
                })
                .collect::<StorageResult<Vec<_>>>()?,
        }),
        None => None,
    };

    let email = match doc.services.email {
        Some(e) => Some(EmailService {
            verification_tokens: e
                .verification_tokens
                .into_iter()
                .map(|v| {
                    Ok(VerificationTokenRecord {
                        when: required_timestamp(
                            &v.when,
                            "services.email.verificationTokens.when",
                        )?,
                        token: v.token,
                        address: v.address,
                    })
                })
                .collect::<StorageResult<Vec<_>>>()?,
        }),
        None => None,
    };

    Ok(User {
        id: id_to_string(&doc.id),
        username: doc.username,
        emails: doc.emails,
        services: UserServices { password, email },
        created_at,
        updated_at,
    })
}
