//! Scenes and the transitions between them
//!
//! Scenes never hold on to the engine. Every call receives a
//! [`SceneContext`] borrowing what the scene may look at for that call, and
//! `update` answers with a [`Transition`] that the engine applies.

use crate::error::Result;
use crate::input::InputState;
use crate::platform::DrawCommand;
use horadric_data::DataManager;
use std::fmt;

/// What a scene can see while it runs
pub struct SceneContext<'a> {
    /// Game data
    pub data: &'a DataManager,
    /// Input state for this frame
    pub input: &'a InputState,
    /// Frame number, starting at zero
    pub frame: u64,
}

/// Change to the scene stack requested by the active scene
pub enum Transition {
    /// Keep running the current scene
    None,
    /// Put a scene on top of the current one
    Push(Box<dyn Scene>),
    /// Leave the current scene, returning to the one below
    Pop,
    /// Swap the current scene for another
    Replace(Box<dyn Scene>),
    /// Stop the engine
    Quit,
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Push(scene) => write!(f, "Push({})", scene.name()),
            Self::Pop => f.write_str("Pop"),
            Self::Replace(scene) => write!(f, "Replace({})", scene.name()),
            Self::Quit => f.write_str("Quit"),
        }
    }
}

/// One screen of the game
pub trait Scene {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Called when the scene becomes part of the stack
    fn on_enter(&mut self, _ctx: &SceneContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Advance one frame
    fn update(&mut self, ctx: &SceneContext<'_>) -> Transition;

    /// Append this frame's draw commands
    fn render(&self, ctx: &SceneContext<'_>, frame: &mut Vec<DrawCommand>);

    /// Called when the scene leaves the stack
    fn on_exit(&mut self, _ctx: &SceneContext<'_>) {}
}
