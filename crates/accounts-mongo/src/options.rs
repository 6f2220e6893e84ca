//! Backend options and their merge over defaults.
//!
//! Options are resolved once at construction: a [`PartialMongoOptions`]
//! (from code or a TOML file) is laid over [`MongoOptions::default`].

use accounts_auth::DateProvider;
use serde::{Deserialize, Serialize};

use crate::{StorageError, StorageResult};

/// Default user collection.
pub const DEFAULT_COLLECTION_NAME: &str = "users";

/// Names of the timestamp fields on the user document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampFields {
    /// Field holding the creation time.
    pub created_at: String,
    /// Field stamped on every mutation.
    pub updated_at: String,
}

impl Default for TimestampFields {
    fn default() -> Self {
        Self {
            created_at: "createdAt".to_string(),
            updated_at: "updatedAt".to_string(),
        }
    }
}

/// Resolved options for [`MongoPasswordStorage`](crate::MongoPasswordStorage).
#[derive(Debug, Clone)]
pub struct MongoOptions {
    /// Collection holding user documents.
    pub collection_name: String,
    /// Parse user ids as `ObjectId` instead of using them as strings.
    pub convert_user_id_to_object_id: bool,
    /// Timestamp field names.
    pub timestamps: TimestampFields,
    /// Clock for `when` and `updatedAt` values.
    pub date_provider: DateProvider,
}

impl Default for MongoOptions {
    fn default() -> Self {
        Self {
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            convert_user_id_to_object_id: true,
            timestamps: TimestampFields::default(),
            date_provider: DateProvider::default(),
        }
    }
}

impl MongoOptions {
    /// Defaults with `partial` applied on top.
    #[must_use]
    pub fn merged(partial: PartialMongoOptions) -> Self {
        Self::default().merge(partial)
    }

    /// Apply the fields set in `partial`, keeping the rest.
    #[must_use]
    pub fn merge(mut self, partial: PartialMongoOptions) -> Self {
        if let Some(name) = partial.collection_name {
            self.collection_name = name;
        }
        if let Some(convert) = partial.convert_user_id_to_object_id {
            self.convert_user_id_to_object_id = convert;
        }
        if let Some(ts) = partial.timestamps {
            if let Some(created_at) = ts.created_at {
                self.timestamps.created_at = created_at;
            }
            if let Some(updated_at) = ts.updated_at {
                self.timestamps.updated_at = updated_at;
            }
        }
        self
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_date_provider(mut self, date_provider: DateProvider) -> Self {
        self.date_provider = date_provider;
        self
    }

    /// Reject option values that cannot produce a valid query.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty collection name or an empty or
    /// `$`-prefixed timestamp field name.
    pub fn validate(&self) -> StorageResult<()> {
        if self.collection_name.is_empty() {
            return Err(StorageError::invalid_input("collection_name must not be empty"));
        }
        for (key, field) in [
            ("timestamps.created_at", &self.timestamps.created_at),
            ("timestamps.updated_at", &self.timestamps.updated_at),
        ] {
            if field.is_empty() || field.starts_with('$') {
                return Err(StorageError::invalid_input(format!(
                    "{key} must be a non-empty field name not starting with '$'"
                )));
            }
        }
        Ok(())
    }
}

/// Overrides for [`MongoOptions`]; unset fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct PartialMongoOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convert_user_id_to_object_id: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<PartialTimestampFields>,
}

/// Overrides for [`TimestampFields`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialTimestampFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl PartialMongoOptions {
    /// Create an empty override set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML string
    pub fn from_toml(toml_str: &str) -> StorageResult<Self> {
        toml::from_str(toml_str)
            .map_err(|e| StorageError::invalid_input(format!("TOML parse error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_defaults() {
        let options = MongoOptions::default();
        assert_eq!(options.collection_name, "users");
        assert!(options.convert_user_id_to_object_id);
        assert_eq!(options.timestamps.created_at, "createdAt");
        assert_eq!(options.timestamps.updated_at, "updatedAt");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let partial = PartialMongoOptions {
            convert_user_id_to_object_id: Some(false),
            timestamps: Some(PartialTimestampFields {
                created_at: None,
                updated_at: Some("modified".to_string()),
            }),
            ..Default::default()
        };
        let options = MongoOptions::merged(partial);
        assert_eq!(options.collection_name, "users");
        assert!(!options.convert_user_id_to_object_id);
        assert_eq!(options.timestamps.created_at, "createdAt");
        assert_eq!(options.timestamps.updated_at, "modified");
    }

    #[test]
    fn test_from_toml() {
        let partial = PartialMongoOptions::from_toml(
            r#"
            collection_name = "accounts"

            [timestamps]
            updated_at = "lastModified"
            "#,
        )
        .unwrap();
        assert_eq!(partial.collection_name.as_deref(), Some("accounts"));
        assert_eq!(partial.convert_user_id_to_object_id, None);

        let options = MongoOptions::merged(partial);
        assert_eq!(options.collection_name, "accounts");
        assert_eq!(options.timestamps.updated_at, "lastModified");
    }

    #[test]
    fn test_from_toml_rejects_unknown_keys() {
        let err = PartialMongoOptions::from_toml("collection = \"x\"").unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_validate_rejects_operator_field() {
        let mut options = MongoOptions::default();
        options.timestamps.updated_at = "$set".to_string();
        assert!(options.validate().unwrap_err().is_invalid_input());

        options.timestamps.updated_at = "updatedAt".to_string();
        options.collection_name.clear();
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_with_date_provider() {
        let at = datetime!(2024-05-05 10:00:00 UTC);
        let options = MongoOptions::default().with_date_provider(DateProvider::fixed(at));
        assert_eq!(options.date_provider.now(), at);
    }
}
