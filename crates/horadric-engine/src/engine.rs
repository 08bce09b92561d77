//! The engine loop

use crate::config::WindowConfig;
use crate::error::Result;
use crate::input::InputState;
use crate::platform::{Platform, WindowSession};
use crate::scene::{Scene, SceneContext, Transition};
use horadric_data::DataManager;
use tracing::{debug, info};

/// Why the loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The platform window closed
    WindowClosed,
    /// A scene or the user asked to quit
    QuitRequested,
    /// The last scene left the stack
    NoScenes,
}

/// Result of [`Engine::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames rendered
    pub frames: u64,
    /// Why the loop ended
    pub reason: ExitReason,
}

/// Owns the game data, the input state and the scene stack
pub struct Engine {
    data: DataManager,
    input: InputState,
    scenes: Vec<Box<dyn Scene>>,
    window: WindowConfig,
    frame: u64,
}

impl Engine {
    /// Create an engine over indexed game data
    pub fn new(data: DataManager, window: WindowConfig) -> Self {
        Self {
            data,
            input: InputState::new(),
            scenes: Vec::new(),
            window,
            frame: 0,
        }
    }

    /// Game data
    pub fn data(&self) -> &DataManager {
        &self.data
    }

    /// Names of the scenes on the stack, bottom first
    pub fn scene_names(&self) -> Vec<&str> {
        self.scenes.iter().map(|s| s.name()).collect()
    }

    /// Frames rendered so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Run `initial` until the window closes, a scene quits or the stack
    /// empties.
    ///
    /// The window is closed on every exit path, errors included. Scenes
    /// still on the stack get `on_exit` when the loop ends.
    pub fn run<P: Platform + ?Sized>(
        &mut self,
        platform: &mut P,
        initial: Box<dyn Scene>,
    ) -> Result<RunSummary> {
        let mut window = WindowSession::open(platform, &self.window)?;
        info!(
            "Window {}x{} open, starting with {}",
            self.window.width,
            self.window.height,
            initial.name()
        );

        let result = self
            .push(initial)
            .and_then(|()| self.main_loop(&mut *window));
        self.exit_all();
        let summary = result?;

        info!(
            "Engine stopped after {} frames ({:?})",
            summary.frames, summary.reason
        );
        Ok(summary)
    }

    fn main_loop<P: Platform + ?Sized>(&mut self, platform: &mut P) -> Result<RunSummary> {
        let start = self.frame;
        let mut frame = Vec::new();

        let reason = loop {
            if !platform.is_open() {
                break ExitReason::WindowClosed;
            }

            self.input.begin_frame();
            for event in platform.poll_events() {
                self.input.apply(&event);
            }
            if self.input.quit_requested() {
                break ExitReason::QuitRequested;
            }

            let transition = {
                let ctx = SceneContext {
                    data: &self.data,
                    input: &self.input,
                    frame: self.frame,
                };
                match self.scenes.last_mut() {
                    Some(scene) => scene.update(&ctx),
                    None => break ExitReason::NoScenes,
                }
            };
            if matches!(transition, Transition::Quit) {
                break ExitReason::QuitRequested;
            }
            self.apply(transition)?;

            let Some(scene) = self.scenes.last() else {
                break ExitReason::NoScenes;
            };

            platform.clear();
            frame.clear();
            let ctx = SceneContext {
                data: &self.data,
                input: &self.input,
                frame: self.frame,
            };
            scene.render(&ctx, &mut frame);
            platform.present(&frame);
            self.frame += 1;
        };

        Ok(RunSummary {
            frames: self.frame - start,
            reason,
        })
    }

    fn apply(&mut self, transition: Transition) -> Result<()> {
        match transition {
            Transition::None | Transition::Quit => Ok(()),
            Transition::Push(scene) => self.push(scene),
            Transition::Pop => {
                self.pop();
                Ok(())
            }
            Transition::Replace(scene) => {
                self.pop();
                self.push(scene)
            }
        }
    }

    fn push(&mut self, mut scene: Box<dyn Scene>) -> Result<()> {
        debug!("Entering scene {}", scene.name());
        let ctx = SceneContext {
            data: &self.data,
            input: &self.input,
            frame: self.frame,
        };
        scene.on_enter(&ctx)?;
        self.scenes.push(scene);
        Ok(())
    }

    fn pop(&mut self) {
        if let Some(mut scene) = self.scenes.pop() {
            debug!("Leaving scene {}", scene.name());
            let ctx = SceneContext {
                data: &self.data,
                input: &self.input,
                frame: self.frame,
            };
            scene.on_exit(&ctx);
        }
    }

    fn exit_all(&mut self) {
        while !self.scenes.is_empty() {
            self.pop();
        }
    }
}
