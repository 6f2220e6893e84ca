//! Filter and update documents for each storage operation.
//!
//! Kept free of I/O so the exact shape sent to the server is unit-tested.

use mongodb::bson::{Bson, Document, doc};

/// Path of the pending reset token values.
pub const RESET_TOKEN_PATH: &str = "services.password.reset.token";
/// Path of the pending verification token values.
pub const VERIFICATION_TOKEN_PATH: &str = "services.email.verificationTokens.token";
/// Path of the password hash.
pub const PASSWORD_HASH_PATH: &str = "services.password.bcrypt";
/// Path of the pending reset list.
pub const RESET_PATH: &str = "services.password.reset";
/// Path of the pending verification list.
pub const VERIFICATION_PATH: &str = "services.email.verificationTokens";

// =============================================================================
// Filters
// =============================================================================

/// Match a user by `_id`.
#[must_use]
pub fn by_id(id: Bson) -> Document {
    doc! { "_id": id }
}

/// Match a user by `_id` that owns `address`.
#[must_use]
pub fn by_id_and_email(id: Bson, address: &str) -> Document {
    doc! { "_id": id, "emails.address": address }
}

/// Match the user holding a pending reset token.
#[must_use]
pub fn by_reset_token(token: &str) -> Document {
    doc! { RESET_TOKEN_PATH: token }
}

/// Match the user holding a pending verification token.
#[must_use]
pub fn by_verification_token(token: &str) -> Document {
    doc! { VERIFICATION_TOKEN_PATH: token }
}

// =============================================================================
// Updates
// =============================================================================

/// Replace the hash and drop every pending reset request.
#[must_use]
pub fn set_password(password_hash: &str, updated_at_field: &str, now: Bson) -> Document {
    doc! {
        "$set": {
            PASSWORD_HASH_PATH: password_hash,
            updated_at_field: now,
        },
        "$unset": { RESET_PATH: "" },
    }
}

/// Append a verification request.
#[must_use]
pub fn push_verification_token(token: &str, address: &str, when: Bson) -> Document {
    doc! {
        "$push": {
            VERIFICATION_PATH: {
                "token": token,
                "address": address,
                "when": when,
            },
        },
    }
}

/// Append a reset request.
#[must_use]
pub fn push_reset_token(token: &str, address: &str, when: Bson, reason: &str) -> Document {
    doc! {
        "$push": {
            RESET_PATH: {
                "token": token,
                "address": address,
                "when": when,
                "reason": reason,
            },
        },
    }
}

/// Add an email entry with set semantics.
#[must_use]
pub fn add_email(address: &str, verified: bool, updated_at_field: &str, now: Bson) -> Document {
    doc! {
        "$addToSet": {
            "emails": { "address": address, "verified": verified },
        },
        "$set": { updated_at_field: now },
    }
}

/// Remove every email entry with this address.
#[must_use]
pub fn remove_email(address: &str, updated_at_field: &str, now: Bson) -> Document {
    doc! {
        "$pull": { "emails": { "address": address } },
        "$set": { updated_at_field: now },
    }
}

/// Mark the matched email verified and drop its verification requests.
///
/// Must be paired with [`by_id_and_email`] so the positional `$` resolves.
#[must_use]
pub fn verify_email(address: &str, updated_at_field: &str, now: Bson) -> Document {
    doc! {
        "$set": {
            "emails.$.verified": true,
            updated_at_field: now,
        },
        "$pull": { VERIFICATION_PATH: { "address": address } },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    fn now() -> Bson {
        Bson::Int64(1_709_294_400_000)
    }

    #[test]
    fn test_token_filters() {
        assert_eq!(
            by_reset_token("tok1"),
            doc! { "services.password.reset.token": "tok1" }
        );
        assert_eq!(
            by_verification_token("vtok"),
            doc! { "services.email.verificationTokens.token": "vtok" }
        );
    }

    #[test]
    fn test_id_filters() {
        let oid = ObjectId::parse_str("65f1c0ffee0000000000beef").unwrap();
        assert_eq!(by_id(Bson::ObjectId(oid)), doc! { "_id": oid });
        assert_eq!(
            by_id_and_email(Bson::String("u1".into()), "a@b.com"),
            doc! { "_id": "u1", "emails.address": "a@b.com" }
        );
    }

    #[test]
    fn test_set_password_clears_reset() {
        let update = set_password("hash", "updatedAt", now());
        assert_eq!(
            update,
            doc! {
                "$set": { "services.password.bcrypt": "hash", "updatedAt": 1_709_294_400_000_i64 },
                "$unset": { "services.password.reset": "" },
            }
        );
    }

    #[test]
    fn test_set_password_custom_timestamp_field() {
        let update = set_password("hash", "modified", now());
        let set = update.get_document("$set").unwrap();
        assert!(set.contains_key("modified"));
        assert!(!set.contains_key("updatedAt"));
    }

    #[test]
    fn test_push_reset_token() {
        let update = push_reset_token("tok1", "a@b.com", now(), "enroll");
        let entry = update
            .get_document("$push")
            .unwrap()
            .get_document("services.password.reset")
            .unwrap();
        assert_eq!(entry.get_str("token").unwrap(), "tok1");
        assert_eq!(entry.get_str("address").unwrap(), "a@b.com");
        assert_eq!(entry.get_i64("when").unwrap(), 1_709_294_400_000);
        assert_eq!(entry.get_str("reason").unwrap(), "enroll");
    }

    #[test]
    fn test_push_verification_token_has_no_reason() {
        let update = push_verification_token("vtok", "a@b.com", now());
        let entry = update
            .get_document("$push")
            .unwrap()
            .get_document("services.email.verificationTokens")
            .unwrap();
        assert_eq!(entry.len(), 3);
        assert!(!entry.contains_key("reason"));
    }

    #[test]
    fn test_add_email_uses_add_to_set() {
        let update = add_email("x@y.com", false, "updatedAt", now());
        assert_eq!(
            update.get_document("$addToSet").unwrap(),
            &doc! { "emails": { "address": "x@y.com", "verified": false } }
        );
        assert!(update.get_document("$set").unwrap().contains_key("updatedAt"));
    }

    #[test]
    fn test_remove_email_pulls_by_address() {
        let update = remove_email("x@y.com", "updatedAt", now());
        assert_eq!(
            update.get_document("$pull").unwrap(),
            &doc! { "emails": { "address": "x@y.com" } }
        );
    }

    #[test]
    fn test_verify_email() {
        let update = verify_email("x@y.com", "updatedAt", now());
        assert_eq!(
            update,
            doc! {
                "$set": { "emails.$.verified": true, "updatedAt": 1_709_294_400_000_i64 },
                "$pull": { "services.email.verificationTokens": { "address": "x@y.com" } },
            }
        );
    }
}
