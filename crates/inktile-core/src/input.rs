//! Pointer and wheel input types.

use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Chord that turns a primary-button drag into a pan.
    pub fn pan_chord(self) -> bool {
        self.ctrl || self.meta
    }

    /// Chord that turns wheel scroll into zoom.
    pub fn zoom_chord(self) -> bool {
        self.ctrl || self.meta
    }
}
