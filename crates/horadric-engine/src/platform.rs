//! Window and graphics boundary
//!
//! The engine talks to the windowing system only through [`Platform`]. The
//! crate ships [`HeadlessPlatform`], which renders nothing and replays
//! scripted events; it drives the launcher and the tests.

use crate::config::WindowConfig;
use crate::error::{EngineError, Result};
use crate::input::Key;
use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use tracing::debug;

/// Event reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    /// A key went down
    KeyDown(Key),
    /// A key was released
    KeyUp(Key),
    /// The user closed the window
    CloseRequested,
}

/// One thing to draw in a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCommand {
    /// A sprite resource at a screen position
    Sprite {
        /// Resource path of the sprite
        resource: String,
        /// Left edge
        x: i32,
        /// Top edge
        y: i32,
    },
    /// A line of text at a screen position
    Text {
        /// Text to draw
        text: String,
        /// Left edge
        x: i32,
        /// Top edge
        y: i32,
    },
}

/// Window, event and presentation backend
pub trait Platform {
    /// Create the window
    fn initialize_window(&mut self, window: &WindowConfig) -> Result<()>;

    /// Destroy the window; called on every exit path after a successful
    /// [`Platform::initialize_window`]
    fn close_window(&mut self);

    /// Clear the back buffer
    fn clear(&mut self);

    /// Draw the frame and show it
    fn present(&mut self, frame: &[DrawCommand]);

    /// Events received since the last poll
    fn poll_events(&mut self) -> Vec<PlatformEvent>;

    /// Whether the window is still open
    fn is_open(&self) -> bool;
}

/// An initialized window; the window is closed when this is dropped
pub struct WindowSession<'a, P: Platform + ?Sized> {
    platform: &'a mut P,
}

impl<'a, P: Platform + ?Sized> WindowSession<'a, P> {
    /// Initialize the window on `platform`
    pub fn open(platform: &'a mut P, window: &WindowConfig) -> Result<Self> {
        platform.initialize_window(window)?;
        Ok(Self { platform })
    }
}

impl<P: Platform + ?Sized> Deref for WindowSession<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.platform
    }
}

impl<P: Platform + ?Sized> DerefMut for WindowSession<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.platform
    }
}

impl<P: Platform + ?Sized> Drop for WindowSession<'_, P> {
    fn drop(&mut self) {
        self.platform.close_window();
    }
}

/// Platform without a window
///
/// The window counts as open until `frame_budget` frames have been
/// presented. Scripted events are delivered on the poll of the frame they
/// are scheduled for.
#[derive(Debug, Clone, Default)]
pub struct HeadlessPlatform {
    frame_budget: u64,
    frames_presented: u64,
    window: Option<WindowConfig>,
    scripted: VecDeque<(u64, PlatformEvent)>,
    last_frame: Vec<DrawCommand>,
    clears: u64,
    closed: bool,
    fail_initialization: bool,
}

impl HeadlessPlatform {
    /// Headless platform that closes after `frame_budget` frames
    pub fn new(frame_budget: u64) -> Self {
        Self {
            frame_budget,
            ..Self::default()
        }
    }

    /// Deliver `event` when frame `frame` (zero-based) polls for events
    #[must_use]
    pub fn with_event(mut self, frame: u64, event: PlatformEvent) -> Self {
        let position = self
            .scripted
            .iter()
            .position(|(at, _)| *at > frame)
            .unwrap_or(self.scripted.len());
        self.scripted.insert(position, (frame, event));
        self
    }

    /// Make window initialization fail
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail_initialization = true;
        self
    }

    /// Frames presented so far
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Number of clears
    pub fn clears(&self) -> u64 {
        self.clears
    }

    /// Draw commands of the most recent frame
    pub fn last_frame(&self) -> &[DrawCommand] {
        &self.last_frame
    }

    /// Window settings, while the window exists
    pub fn window(&self) -> Option<&WindowConfig> {
        self.window.as_ref()
    }

    /// Whether the window was created and closed again
    pub fn was_closed(&self) -> bool {
        self.closed
    }
}

impl Platform for HeadlessPlatform {
    fn initialize_window(&mut self, window: &WindowConfig) -> Result<()> {
        if self.fail_initialization {
            return Err(EngineError::Platform(
                "headless window creation disabled".to_string(),
            ));
        }
        debug!(
            "Headless window '{}' {}x{}",
            window.title, window.width, window.height
        );
        self.window = Some(window.clone());
        self.closed = false;
        Ok(())
    }

    fn close_window(&mut self) {
        self.window = None;
        self.closed = true;
    }

    fn clear(&mut self) {
        self.clears += 1;
        self.last_frame.clear();
    }

    fn present(&mut self, frame: &[DrawCommand]) {
        self.last_frame = frame.to_vec();
        self.frames_presented += 1;
    }

    fn poll_events(&mut self) -> Vec<PlatformEvent> {
        let mut events = Vec::new();
        while let Some((at, event)) = self.scripted.front().copied() {
            if at > self.frames_presented {
                break;
            }
            self.scripted.pop_front();
            events.push(event);
        }
        events
    }

    fn is_open(&self) -> bool {
        self.window.is_some() && self.frames_presented < self.frame_budget
    }
}
