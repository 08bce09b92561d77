use crate::input::Key;
use crate::platform::DrawCommand;
use crate::scene::{Scene, SceneContext, Transition};
use horadric_data::ResourcePath;
use tracing::{debug, warn};

const VISIBLE_LINES: usize = 24;
const LINE_HEIGHT: i32 = 20;
const BOTTOM: i32 = 560;

/// Scrolling credits. Escape returns to the previous scene.
#[derive(Debug, Default)]
pub struct Credits {
    lines: Vec<String>,
    shown: usize,
    has_background: bool,
}

impl Credits {
    /// Create the scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines of credits text loaded on enter
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl Scene for Credits {
    fn name(&self) -> &str {
        "Credits"
    }

    fn on_enter(&mut self, ctx: &SceneContext<'_>) -> crate::Result<()> {
        self.has_background = ctx.data.resource_exists(ResourcePath::CreditsBackground);
        self.shown = 0;

        // Credits files predate UTF-8, decode lossily
        match ctx.data.read_resource(ResourcePath::CreditsText) {
            Ok(bytes) => {
                self.lines = String::from_utf8_lossy(&bytes)
                    .lines()
                    .map(|line| line.trim().to_string())
                    .collect();
                debug!("Loaded {} lines of credits", self.lines.len());
            }
            Err(e) => {
                warn!("Credits text unavailable: {e}");
                self.lines.clear();
            }
        }
        Ok(())
    }

    fn update(&mut self, ctx: &SceneContext<'_>) -> Transition {
        if ctx.input.was_pressed(Key::Escape) {
            return Transition::Pop;
        }
        if self.shown < self.lines.len() {
            self.shown += 1;
        }
        Transition::None
    }

    fn render(&self, _ctx: &SceneContext<'_>, frame: &mut Vec<DrawCommand>) {
        if self.has_background {
            frame.push(DrawCommand::Sprite {
                resource: ResourcePath::CreditsBackground.path().to_string(),
                x: 0,
                y: 0,
            });
        }

        let first = self.shown.saturating_sub(VISIBLE_LINES);
        let visible = &self.lines[first..self.shown];
        let top = BOTTOM - LINE_HEIGHT * visible.len() as i32;
        for (row, line) in visible.iter().enumerate() {
            frame.push(DrawCommand::Text {
                text: line.clone(),
                x: 400,
                y: top + LINE_HEIGHT * row as i32,
            });
        }
    }
}
