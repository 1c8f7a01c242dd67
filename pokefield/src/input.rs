//! Held-direction tracking on top of terminal key events.
//!
//! Terminals report presses (and autorepeats), and only report releases when
//! the keyboard enhancement protocol is on. [`KeyTracker`] handles both: with
//! release events it keeps a key down until released, without them a key
//! counts as held for `hold_ms` after its last press or repeat.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::Direction;

/// Directions held during one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HeldKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl HeldKeys {
    pub fn only(direction: Direction) -> Self {
        let mut keys = Self::default();
        keys.set(direction, true);
        keys
    }

    pub fn set(&mut self, direction: Direction, held: bool) {
        match direction {
            Direction::Up => self.up = held,
            Direction::Down => self.down = held,
            Direction::Left => self.left = held,
            Direction::Right => self.right = held,
        }
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    /// The single direction acted on this frame: up, then down, then left, then right.
    pub fn primary_direction(&self) -> Option<Direction> {
        Direction::ALL.into_iter().find(|direction| self.is_held(*direction))
    }

    pub fn any(&self) -> bool {
        self.primary_direction().is_some()
    }
}

#[derive(Clone, Debug)]
pub struct KeyTracker {
    /// `None` when the terminal reports releases.
    hold_ms: Option<u64>,
    /// Time of the last press per direction, in `Direction::ALL` order.
    pressed_at: [Option<u64>; 4],
}

impl KeyTracker {
    pub fn with_release_events() -> Self {
        Self {
            hold_ms: None,
            pressed_at: [None; 4],
        }
    }

    pub fn with_hold_window(hold_ms: u64) -> Self {
        Self {
            hold_ms: Some(hold_ms),
            pressed_at: [None; 4],
        }
    }

    pub fn press(&mut self, direction: Direction, now_ms: u64) {
        self.pressed_at[direction.index()] = Some(now_ms);
    }

    pub fn release(&mut self, direction: Direction) {
        self.pressed_at[direction.index()] = None;
    }

    pub fn release_all(&mut self) {
        self.pressed_at = [None; 4];
    }

    pub fn snapshot(&mut self, now_ms: u64) -> HeldKeys {
        let mut keys = HeldKeys::default();
        for direction in Direction::ALL {
            let slot = &mut self.pressed_at[direction.index()];
            let held = match (*slot, self.hold_ms) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(at), Some(window)) => now_ms.saturating_sub(at) <= window,
            };
            if !held {
                *slot = None;
            }
            keys.set(direction, held);
        }
        keys
    }
}
