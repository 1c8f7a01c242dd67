//! Layered tile grids for terminal games.
//!
//! Layers hold global tile ids (`0` means "no tile") and carry a [`LayerRole`]
//! derived from their name. With the `ratatui` feature, layers can be
//! composited once into [`LayerSurface`](render::LayerSurface)s and blitted
//! at a camera offset every frame.

pub mod core;
pub mod parse;
pub mod prelude;
#[cfg(feature = "ratatui")]
pub mod render;
