//! Engine scaffold for the Horadric Diablo II re-implementation
//!
//! The engine indexes the game archives through `horadric-data`, then runs a
//! stack of [`Scene`]s against a [`Platform`]. Only a headless platform is
//! provided; windowing and rendering backends plug in through the trait.
//!
//! ```no_run
//! use horadric_data::{DataConfig, DataManager};
//! use horadric_engine::{Engine, HeadlessPlatform, WindowConfig, scenes::MainMenu};
//!
//! let data = DataManager::open(DataConfig::new("/games/diablo2"))?;
//! let mut engine = Engine::new(data, WindowConfig::default());
//! let summary = engine.run(&mut HeadlessPlatform::new(60), Box::new(MainMenu::new()))?;
//! println!("{} frames", summary.frames);
//! # Ok::<(), horadric_engine::EngineError>(())
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod platform;
pub mod scene;
pub mod scenes;

pub use config::{AppConfig, Cli, WindowConfig};
pub use engine::{Engine, ExitReason, RunSummary};
pub use error::{EngineError, Result};
pub use input::{InputState, Key};
pub use platform::{DrawCommand, HeadlessPlatform, Platform, PlatformEvent, WindowSession};
pub use scene::{Scene, SceneContext, Transition};
