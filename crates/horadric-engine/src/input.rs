//! Keyboard state polled once per frame

use crate::platform::PlatformEvent;
use std::collections::HashSet;

/// Keys the front end reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Escape
    Escape,
    /// Enter / Return
    Enter,
    /// Space bar
    Space,
    /// Arrow up
    Up,
    /// Arrow down
    Down,
    /// Arrow left
    Left,
    /// Arrow right
    Right,
    /// A character key
    Char(char),
}

/// Current input state, rebuilt from platform events every frame
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Key>,
    pressed: HashSet<Key>,
    quit_requested: bool,
}

impl InputState {
    /// Empty input state
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the keys pressed during the previous frame
    pub fn begin_frame(&mut self) {
        self.pressed.clear();
    }

    /// Apply one platform event
    pub fn apply(&mut self, event: &PlatformEvent) {
        match *event {
            PlatformEvent::KeyDown(key) => {
                if self.held.insert(key) {
                    self.pressed.insert(key);
                }
            }
            PlatformEvent::KeyUp(key) => {
                self.held.remove(&key);
            }
            PlatformEvent::CloseRequested => self.quit_requested = true,
        }
    }

    /// Whether `key` is held down
    pub fn is_down(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Whether `key` went down this frame
    pub fn was_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    /// Whether the user asked to close the game
    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }
}
