use std::fs;
use std::path::Path;

use accounts_mongo::{MongoOptions, PartialMongoOptions};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "accounts";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub mongo: MongoSection,
    #[serde(default)]
    pub options: PartialMongoOptions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MongoSection {
    pub uri: Option<String>,
    pub database: Option<String>,
}

/// Connection settings and backend options after all overrides.
#[derive(Debug)]
pub struct ResolvedConfig {
    pub uri: String,
    pub database: String,
    pub options: MongoOptions,
}

pub fn load_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Cannot read config file {}", path.display()))?;
    let cfg: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(cfg)
}

/// Resolve settings: flag/env value, then config file, then defaults.
pub fn resolve(
    path: Option<&Path>,
    uri: Option<&str>,
    database: Option<&str>,
) -> Result<ResolvedConfig> {
    let file = match path {
        Some(p) => load_file(p)?,
        None => ConfigFile::default(),
    };

    let uri = uri
        .map(str::to_string)
        .or(file.mongo.uri)
        .unwrap_or_else(|| DEFAULT_URI.to_string());
    let database = database
        .map(str::to_string)
        .or(file.mongo.database)
        .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

    Ok(ResolvedConfig {
        uri,
        database,
        options: MongoOptions::merged(file.options),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let cfg = resolve(None, None, None).unwrap();
        assert_eq!(cfg.uri, DEFAULT_URI);
        assert_eq!(cfg.database, DEFAULT_DATABASE);
        assert_eq!(cfg.options.collection_name, "users");
    }

    #[test]
    fn test_file_values_and_overrides() {
        let file = write_config(
            r#"
            [mongo]
            uri = "mongodb://db.internal:27017"
            database = "prod_accounts"

            [options]
            collection_name = "people"
            convert_user_id_to_object_id = false

            [options.timestamps]
            updated_at = "modified"
            "#,
        );

        let cfg = resolve(Some(file.path()), None, Some("staging")).unwrap();
        assert_eq!(cfg.uri, "mongodb://db.internal:27017");
        assert_eq!(cfg.database, "staging");
        assert_eq!(cfg.options.collection_name, "people");
        assert!(!cfg.options.convert_user_id_to_object_id);
        assert_eq!(cfg.options.timestamps.updated_at, "modified");
        assert_eq!(cfg.options.timestamps.created_at, "createdAt");
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        let file = write_config("[server]\nport = 1\n");
        assert!(resolve(Some(file.path()), None, None).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = resolve(Some(Path::new("/nonexistent/accounts.toml")), None, None).unwrap_err();
        assert!(err.to_string().contains("Cannot read config file"));
    }
}
