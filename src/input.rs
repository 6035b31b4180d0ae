//! Player intents
//!
//! The presentation layer turns raw key events into these and hands them to
//! the simulation once per tick.

use serde::{Deserialize, Serialize};

use crate::sim::player::Controls;

/// Discrete input delivered to the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    MoveLeftStart,
    MoveLeftStop,
    MoveRightStart,
    MoveRightStop,
    Jump,
    CrouchStart,
    CrouchStop,
    PauseToggle,
    Restart,
}

impl Intent {
    /// Map a DOM-style key name to an intent.
    ///
    /// Jump, pause and restart fire on press only; releases of those keys
    /// map to nothing.
    pub fn from_key(key: &str, pressed: bool) -> Option<Self> {
        let intent = match (key, pressed) {
            ("a" | "A" | "ArrowLeft", true) => Intent::MoveLeftStart,
            ("a" | "A" | "ArrowLeft", false) => Intent::MoveLeftStop,
            ("d" | "D" | "ArrowRight", true) => Intent::MoveRightStart,
            ("d" | "D" | "ArrowRight", false) => Intent::MoveRightStop,
            ("w" | "W" | "ArrowUp" | " " | "Space", true) => Intent::Jump,
            ("s" | "S" | "ArrowDown", true) => Intent::CrouchStart,
            ("s" | "S" | "ArrowDown", false) => Intent::CrouchStop,
            ("p" | "P" | "Escape", true) => Intent::PauseToggle,
            ("r" | "R" | "Enter", true) => Intent::Restart,
            _ => return None,
        };
        Some(intent)
    }

    /// Latch a movement intent into the held controls. Returns false for
    /// intents that are not movement.
    pub fn latch(self, controls: &mut Controls) -> bool {
        match self {
            Intent::MoveLeftStart => controls.move_left = true,
            Intent::MoveLeftStop => controls.move_left = false,
            Intent::MoveRightStart => controls.move_right = true,
            Intent::MoveRightStop => controls.move_right = false,
            Intent::Jump => controls.jump = true,
            Intent::CrouchStart => controls.crouch = true,
            Intent::CrouchStop => controls.crouch = false,
            Intent::PauseToggle | Intent::Restart => return false,
        }
        true
    }
}
