pub use crate::core::{
    camera_offset, CoreError, LayerRole, LayerStack, MapSize, TileId, TileLayer, EMPTY_TILE,
};
pub use crate::parse::{
    parse_char_layer, parse_char_rows, Legend, LegendBuilder, ParseError, ParseOptions, TrimMode,
};

#[cfg(feature = "ratatui")]
pub use crate::render::{
    adjust_color, cell_seed, tile_seed, CellScale, LayerSurface, SurfaceCell, TextureVariant,
    TileArt, TileFill, TilePalette, Tileset, TilesetBuilder,
};
