//! Tile-based field exploration with random grass encounters and turn-based
//! battles, drawn in the terminal.
//!
//! State lives in [`state::AppState`] and only changes through
//! [`reducer::reducer`]; [`ui`] renders it and maps key presses to
//! [`action::Action`]s.

pub mod action;
pub mod animation;
pub mod assets;
pub mod battle;
pub mod collision;
pub mod config;
pub mod creature;
pub mod dialogue;
pub mod effect;
pub mod encounter;
pub mod error;
pub mod input;
pub mod map;
pub mod movement;
pub mod npc;
pub mod reducer;
pub mod scenario;
pub mod state;
pub mod text;
pub mod transition;
pub mod ui;
