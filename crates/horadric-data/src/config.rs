//! Data layer configuration

use crate::error::{DataError, Result};
use horadric_mpq::resolve_case_insensitive;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default archive file extension
pub const DEFAULT_ARCHIVE_EXTENSION: &str = "mpq";

/// Archive that must be present for the game data to be usable
pub const DEFAULT_SANITY_ARCHIVE: &str = "d2data";

/// Default language code used for localized resources
pub const DEFAULT_LANGUAGE: &str = "ENG";

/// Configuration for indexing and serving game data
///
/// Every field has a default, so a JSON file only needs the values it
/// changes:
///
/// ```json
/// { "base_path": "/games/diablo2", "language": "ENG" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory searched (recursively) for archives
    pub base_path: PathBuf,

    /// Archive file extension, matched case-insensitively
    pub archive_extension: String,

    /// Archive name (without extension) required at the base path
    pub sanity_archive: String,

    /// Language code substituted into localized resource paths
    pub language: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            archive_extension: DEFAULT_ARCHIVE_EXTENSION.to_string(),
            sanity_archive: DEFAULT_SANITY_ARCHIVE.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl DataConfig {
    /// Create a configuration for the given base path
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Parse a configuration from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Set the base path
    #[must_use]
    pub fn with_base_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.base_path = path.as_ref().to_path_buf();
        self
    }

    /// Set the archive extension (a leading dot is ignored)
    #[must_use]
    pub fn with_archive_extension(mut self, extension: impl Into<String>) -> Self {
        self.archive_extension = extension.into();
        self
    }

    /// Set the sanity-check archive name
    #[must_use]
    pub fn with_sanity_archive(mut self, name: impl Into<String>) -> Self {
        self.sanity_archive = name.into();
        self
    }

    /// Set the language code
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Archive extension without a leading dot
    pub fn extension(&self) -> &str {
        self.archive_extension.trim_start_matches('.')
    }

    /// Check that the values can be used
    pub fn validate(&self) -> Result<()> {
        if self.extension().is_empty() {
            return Err(DataError::Config(
                "archive extension must not be empty".to_string(),
            ));
        }
        if self.sanity_archive.is_empty() {
            return Err(DataError::Config(
                "sanity archive name must not be empty".to_string(),
            ));
        }
        if self.language.is_empty() {
            return Err(DataError::Config("language must not be empty".to_string()));
        }
        Ok(())
    }

    /// Location of the sanity-check archive, matched case-insensitively
    pub fn sanity_archive_path(&self) -> PathBuf {
        let file_name = format!("{}.{}", self.sanity_archive, self.extension());
        resolve_case_insensitive(&self.base_path.join(file_name))
    }
}
