use crate::input::Key;
use crate::platform::DrawCommand;
use crate::scene::{Scene, SceneContext, Transition};
use crate::scenes::Credits;
use horadric_data::ResourcePath;
use tracing::{info, warn};

/// Sprites drawn by the main menu, with their positions
const LAYOUT: &[(ResourcePath, i32, i32)] = &[
    (ResourcePath::TrademarkScreen, 0, 0),
    (ResourcePath::Diablo2LogoBlackLeft, 400, 120),
    (ResourcePath::Diablo2LogoBlackRight, 400, 120),
    (ResourcePath::Diablo2LogoFireLeft, 400, 120),
    (ResourcePath::Diablo2LogoFireRight, 400, 120),
];

/// Title screen. Escape quits, Enter or `C` opens the credits.
#[derive(Debug, Default)]
pub struct MainMenu {
    missing: Vec<ResourcePath>,
}

impl MainMenu {
    /// Create the scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Resources the index did not contain when the scene was entered
    pub fn missing_resources(&self) -> &[ResourcePath] {
        &self.missing
    }
}

impl Scene for MainMenu {
    fn name(&self) -> &str {
        "MainMenu"
    }

    fn on_enter(&mut self, ctx: &SceneContext<'_>) -> crate::Result<()> {
        self.missing = LAYOUT
            .iter()
            .map(|(resource, _, _)| *resource)
            .filter(|resource| !ctx.data.resource_exists(*resource))
            .collect();

        for resource in &self.missing {
            warn!("Main menu resource missing: {resource}");
        }
        info!(
            "Main menu ready ({} of {} resources found)",
            LAYOUT.len() - self.missing.len(),
            LAYOUT.len()
        );
        Ok(())
    }

    fn update(&mut self, ctx: &SceneContext<'_>) -> Transition {
        if ctx.input.was_pressed(Key::Escape) {
            Transition::Quit
        } else if ctx.input.was_pressed(Key::Enter) || ctx.input.was_pressed(Key::Char('c')) {
            Transition::Push(Box::new(Credits::new()))
        } else {
            Transition::None
        }
    }

    fn render(&self, _ctx: &SceneContext<'_>, frame: &mut Vec<DrawCommand>) {
        frame.extend(
            LAYOUT
                .iter()
                .filter(|(resource, _, _)| !self.missing.contains(resource))
                .map(|(resource, x, y)| DrawCommand::Sprite {
                    resource: resource.path().to_string(),
                    x: *x,
                    y: *y,
                }),
        );
    }
}
