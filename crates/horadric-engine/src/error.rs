//! Engine error types

use horadric_data::DataError;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised by the engine, its platform or its scenes
#[derive(Debug, Error)]
pub enum EngineError {
    /// Game data could not be indexed or read
    #[error("data error: {0}")]
    Data(#[from] DataError),

    /// The platform layer failed
    #[error("platform error: {0}")]
    Platform(String),

    /// A scene failed to start
    #[error("scene '{scene}' failed: {reason}")]
    Scene {
        /// Scene name
        scene: String,
        /// What went wrong
        reason: String,
    },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
