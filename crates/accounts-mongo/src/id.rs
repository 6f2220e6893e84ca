//! User id conversion between the external string form and `_id`.

use mongodb::bson::Bson;
use mongodb::bson::oid::ObjectId;

use crate::{StorageError, StorageResult};

/// Convert an external user id into the value stored in `_id`.
///
/// With `convert_to_object_id` the id must be a 24-character hex string.
///
/// # Errors
///
/// Returns `InvalidInput` if conversion is requested and the id is not a
/// valid `ObjectId`.
pub fn to_mongo_id(user_id: &str, convert_to_object_id: bool) -> StorageResult<Bson> {
    if !convert_to_object_id {
        return Ok(Bson::String(user_id.to_string()));
    }
    ObjectId::parse_str(user_id)
        .map(Bson::ObjectId)
        .map_err(|e| StorageError::invalid_input(format!("Invalid user id '{user_id}': {e}")))
}

/// Render a stored `_id` in its external string form.
#[must_use]
pub fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "65f1c0ffee0000000000beef";

    #[test]
    fn test_converts_hex_to_object_id() {
        let id = to_mongo_id(HEX, true).unwrap();
        assert!(matches!(id, Bson::ObjectId(_)));
        assert_eq!(id_to_string(&id), HEX);
    }

    #[test]
    fn test_passthrough_without_conversion() {
        let id = to_mongo_id("user-42", false).unwrap();
        assert_eq!(id, Bson::String("user-42".to_string()));
        assert_eq!(id_to_string(&id), "user-42");
    }

    #[test]
    fn test_rejects_invalid_object_id() {
        let err = to_mongo_id("not-an-object-id", true).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_numeric_id_to_string() {
        assert_eq!(id_to_string(&Bson::Int64(7)), "7");
    }
}
