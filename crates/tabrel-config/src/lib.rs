//! Runtime settings for tabrel sessions.
//!
//! Settings are plain data deserialized from TOML:
//!
//! ```toml
//! [tables]
//! books = "book"
//! authors = "author"
//! ```
//!
//! Each entry maps a table name to the entity kind used when materializing
//! its rows. Kinds are resolved against the session's entity registry.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read settings from '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

///
/// Settings
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Table name → entity kind name.
    pub tables: BTreeMap<String, String>,
}

impl Settings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style table mapping.
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>, kind: impl Into<String>) -> Self {
        self.tables.insert(table.into(), kind.into());
        self
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(input)?;
        settings.validate()?;

        Ok(settings)
    }

    /// Read, parse and validate a TOML settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&input)
    }

    /// Entity kind configured for `table`, if any.
    #[must_use]
    pub fn entity_kind(&self, table: &str) -> Option<&str> {
        self.tables.get(table).map(String::as_str)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (table, kind) in &self.tables {
            if table.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "empty table name mapped to kind '{kind}'"
                )));
            }
            if kind.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "table '{table}' maps to an empty entity kind"
                )));
            }
        }

        Ok(())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::{ConfigError, Settings};

    #[test]
    fn parses_table_mapping() {
        let settings = Settings::from_toml_str(
            r#"
            [tables]
            books = "book"
            "#,
        )
        .expect("settings should parse");

        assert_eq!(settings.entity_kind("books"), Some("book"));
        assert_eq!(settings.entity_kind("authors"), None);
    }

    #[test]
    fn empty_document_yields_defaults() {
        let settings = Settings::from_toml_str("").expect("empty settings");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = Settings::from_toml_str("[entities]\nbooks = \"book\"\n")
            .expect_err("unknown section must be rejected");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_empty_kind() {
        let err = Settings::from_toml_str("[tables]\nbooks = \" \"\n")
            .expect_err("empty kind must be rejected");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn load_reports_missing_file_path() {
        let err = Settings::load("/nonexistent/tabrel/settings.toml")
            .expect_err("missing file must fail");
        assert!(err.to_string().contains("/nonexistent/tabrel/settings.toml"));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let path = std::env::temp_dir().join(format!(
            "tabrel-settings-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[tables]\nauthors = \"author\"\n").expect("write settings");

        let settings = Settings::load(&path).expect("settings should load");
        std::fs::remove_file(&path).expect("cleanup settings");

        assert_eq!(settings.entity_kind("authors"), Some("author"));
    }
}
