//! Launcher configuration
//!
//! Configuration comes from three places, later ones winning: built-in
//! defaults, an optional JSON file (`--config`) and command-line flags or
//! their environment variables.

use crate::error::{EngineError, Result};
use clap::Parser;
use horadric_data::DataConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Window settings handed to the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Start in full screen mode
    pub full_screen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Horadric".to_string(),
            width: 800,
            height: 600,
            full_screen: false,
        }
    }
}

/// Complete launcher configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Game data settings
    pub data: DataConfig,
    /// Window settings
    pub window: WindowConfig,
}

impl AppConfig {
    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the values can be used
    pub fn validate(&self) -> Result<()> {
        self.data.validate()?;
        if self.window.width == 0 || self.window.height == 0 {
            return Err(EngineError::Config(format!(
                "window size {}x{} is empty",
                self.window.width, self.window.height
            )));
        }
        Ok(())
    }
}

/// Command-line arguments of the `horadric` launcher
#[derive(Debug, Clone, Parser)]
#[command(
    name = "horadric",
    about = "Diablo II engine scaffold: indexes the game archives and runs the front end",
    version
)]
pub struct Cli {
    /// Directory holding the game's MPQ archives (default: current directory)
    #[arg(short, long, env = "HORADRIC_PATH")]
    pub path: Option<PathBuf>,

    /// Archive file extension
    #[arg(long, env = "HORADRIC_EXTENSION")]
    pub extension: Option<String>,

    /// Language code for localized resources
    #[arg(long, env = "HORADRIC_LANGUAGE")]
    pub language: Option<String>,

    /// Number of frames the headless platform renders before closing
    #[arg(long, default_value_t = 1)]
    pub frames: u64,

    /// JSON configuration file
    #[arg(long, env = "HORADRIC_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse arguments from the process command line
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Resolve the final configuration
    pub fn resolve(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };

        if let Some(path) = &self.path {
            config.data.base_path.clone_from(path);
        }
        if let Some(extension) = &self.extension {
            config.data.archive_extension.clone_from(extension);
        }
        if let Some(language) = &self.language {
            config.data.language.clone_from(language);
        }

        config.validate()?;
        Ok(config)
    }
}
