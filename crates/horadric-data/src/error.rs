//! Error types for the data layer

use horadric_mpq::MpqError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for data layer operations
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors raised while indexing archives or serving assets
#[derive(Debug, Error)]
pub enum DataError {
    /// The base directory could not be enumerated at all
    #[error("cannot enumerate archive directory {}: {source}", path.display())]
    Enumerate {
        /// Directory that was being scanned
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// A required archive is not present
    #[error("required archive not found: {}", .0.display())]
    MissingArchive(PathBuf),

    /// No indexed archive holds the asset
    #[error("asset not found: {0}")]
    AssetNotFound(String),

    /// An archive path with no file name to derive an identifier from
    #[error("no archive identifier in path {0}")]
    InvalidArchiveName(PathBuf),

    /// Asset content is not valid UTF-8 text
    #[error("asset {0} is not valid UTF-8 text")]
    InvalidText(String),

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Archive format error
    #[error("archive error: {0}")]
    Archive(#[from] MpqError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Whether the error means an asset was simply absent
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::AssetNotFound(_) | Self::Archive(MpqError::FileNotFound(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerate_message_names_directory() {
        let err = DataError::Enumerate {
            path: PathBuf::from("/missing/dir"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/missing/dir"));
    }

    #[test]
    fn test_not_found_classification() {
        assert!(DataError::AssetNotFound("a".to_string()).is_not_found());
        assert!(DataError::Archive(MpqError::FileNotFound("a".to_string())).is_not_found());
        assert!(!DataError::Config("bad".to_string()).is_not_found());
    }
}
