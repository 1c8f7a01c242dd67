use std::collections::HashMap;

use ratatui::{buffer::Buffer, layout::Rect, style::Color};

use crate::core::{TileId, TileLayer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureVariant {
    pub ch: char,
    pub fg: Color,
    pub density: u8,
}

impl TextureVariant {
    pub const fn new(ch: char, fg: Color, density: u8) -> Self {
        Self { ch, fg, density }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TilePalette {
    pub main: Color,
    pub alt: Color,
    pub variants: [TextureVariant; 3],
}

impl TilePalette {
    pub const fn new(main: Color, alt: Color, variants: [TextureVariant; 3]) -> Self {
        Self {
            main,
            alt,
            variants,
        }
    }

    /// Palette whose variants are derived from `main` by brightening.
    pub fn textured(main: Color, ch: char, density: u8) -> Self {
        Self::new(
            main,
            adjust_color(main, 4),
            [
                TextureVariant::new(ch, adjust_color(main, 24), density),
                TextureVariant::new(ch, adjust_color(main, 16), density.saturating_add(1)),
                TextureVariant::new(ch, adjust_color(main, -12), density.saturating_add(2)),
            ],
        )
    }
}

/// How a tile occupies the cells it covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileFill {
    /// Paints background and texture on every cell.
    Solid,
    /// Paints only texture cells and leaves the rest see-through.
    Sparse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileArt {
    pub palette: TilePalette,
    pub fill: TileFill,
    /// Drawn once in the middle of the tile, over the texture.
    pub glyph: Option<(char, Color)>,
}

impl TileArt {
    pub const fn solid(palette: TilePalette) -> Self {
        Self {
            palette,
            fill: TileFill::Solid,
            glyph: None,
        }
    }

    pub const fn sparse(palette: TilePalette) -> Self {
        Self {
            palette,
            fill: TileFill::Sparse,
            glyph: None,
        }
    }

    pub fn with_glyph(mut self, ch: char, fg: Color) -> Self {
        self.glyph = Some((ch, fg));
        self
    }
}

#[derive(Clone, Debug)]
pub struct Tileset {
    tiles: HashMap<TileId, TileArt>,
    fallback: TileArt,
}

impl Tileset {
    pub fn builder() -> TilesetBuilder {
        TilesetBuilder::default()
    }

    pub fn art_for(&self, gid: TileId) -> &TileArt {
        self.tiles.get(&gid).unwrap_or(&self.fallback)
    }

    pub fn contains(&self, gid: TileId) -> bool {
        self.tiles.contains_key(&gid)
    }
}

#[derive(Clone, Debug)]
pub struct TilesetBuilder {
    tiles: HashMap<TileId, TileArt>,
    fallback: TileArt,
}

impl Default for TilesetBuilder {
    fn default() -> Self {
        Self {
            tiles: HashMap::new(),
            fallback: TileArt::solid(TilePalette::textured(Color::Rgb(200, 40, 200), '?', 2)),
        }
    }
}

impl TilesetBuilder {
    pub fn tile(mut self, gid: TileId, art: TileArt) -> Self {
        self.tiles.insert(gid, art);
        self
    }

    pub fn fallback(mut self, art: TileArt) -> Self {
        self.fallback = art;
        self
    }

    pub fn build(self) -> Tileset {
        Tileset {
            tiles: self.tiles,
            fallback: self.fallback,
        }
    }
}

/// Terminal cells covered by one tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellScale {
    pub cols_per_tile: u16,
    pub rows_per_tile: u16,
}

impl Default for CellScale {
    fn default() -> Self {
        Self {
            cols_per_tile: 4,
            rows_per_tile: 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceCell {
    pub ch: char,
    pub fg: Color,
    /// `None` keeps whatever background is already underneath.
    pub bg: Option<Color>,
}

/// A layer (or several) composited into terminal cells once, ahead of time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerSurface {
    pub width: u16,
    pub height: u16,
    cells: Vec<Option<SurfaceCell>>,
}

impl LayerSurface {
    pub fn blank(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width as usize * height as usize],
        }
    }

    pub fn compose<'a, I>(layers: I, tileset: &Tileset, scale: CellScale) -> Self
    where
        I: IntoIterator<Item = &'a TileLayer>,
    {
        let layers: Vec<&TileLayer> = layers.into_iter().collect();
        let (tiles_w, tiles_h) = layers.iter().fold((0, 0), |(w, h), layer| {
            (w.max(layer.size.width), h.max(layer.size.height))
        });
        let mut surface = Self::blank(
            tiles_w.saturating_mul(scale.cols_per_tile),
            tiles_h.saturating_mul(scale.rows_per_tile),
        );
        for layer in layers {
            for (col, row, gid) in layer.iter() {
                surface.paint_tile(col, row, tileset.art_for(gid), scale);
            }
        }
        surface
    }

    fn paint_tile(&mut self, col: u16, row: u16, art: &TileArt, scale: CellScale) {
        let palette = &art.palette;
        let seed = tile_seed(col, row);
        let bg = if seed % 2 == 0 { palette.main } else { palette.alt };
        let texture = palette.variants[(seed % palette.variants.len() as u32) as usize];
        let density = texture.density.max(1) as u32;
        let origin_x = col * scale.cols_per_tile;
        let origin_y = row * scale.rows_per_tile;

        for dy in 0..scale.rows_per_tile {
            for dx in 0..scale.cols_per_tile {
                let sprinkle = cell_seed(col, row, dx, dy) % density == 0;
                let cell = match (art.fill, sprinkle) {
                    (_, true) => Some(SurfaceCell {
                        ch: texture.ch,
                        fg: texture.fg,
                        bg: (art.fill == TileFill::Solid).then_some(bg),
                    }),
                    (TileFill::Solid, false) => Some(SurfaceCell {
                        ch: ' ',
                        fg: bg,
                        bg: Some(bg),
                    }),
                    (TileFill::Sparse, false) => None,
                };
                if cell.is_some() {
                    self.put(origin_x + dx, origin_y + dy, cell);
                }
            }
        }

        if let Some((ch, fg)) = art.glyph {
            let gx = origin_x + scale.cols_per_tile / 2;
            let gy = origin_y + scale.rows_per_tile.saturating_sub(1) / 2;
            let under = self.get(gx, gy).and_then(|cell| cell.bg);
            self.put(
                gx,
                gy,
                Some(SurfaceCell {
                    ch,
                    fg,
                    bg: under.or((art.fill == TileFill::Solid).then_some(bg)),
                }),
            );
        }
    }

    fn put(&mut self, x: u16, y: u16, cell: Option<SurfaceCell>) {
        if x < self.width && y < self.height {
            let idx = y as usize * self.width as usize + x as usize;
            self.cells[idx] = cell;
        }
    }

    pub fn get(&self, x: u16, y: u16) -> Option<SurfaceCell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells[y as usize * self.width as usize + x as usize]
    }

    /// Copies the surface into `area`, with the surface origin placed at
    /// `(offset_x, offset_y)` cells relative to the area's top-left corner.
    /// Anything outside `area` is clipped.
    pub fn blit(&self, buf: &mut Buffer, area: Rect, offset_x: i32, offset_y: i32) {
        for ay in 0..area.height {
            let sy = ay as i32 - offset_y;
            if sy < 0 || sy >= self.height as i32 {
                continue;
            }
            for ax in 0..area.width {
                let sx = ax as i32 - offset_x;
                if sx < 0 || sx >= self.width as i32 {
                    continue;
                }
                let Some(src) = self.get(sx as u16, sy as u16) else {
                    continue;
                };
                if let Some(cell) = buf.cell_mut((area.x + ax, area.y + ay)) {
                    cell.set_char(src.ch).set_fg(src.fg);
                    if let Some(bg) = src.bg {
                        cell.set_bg(bg);
                    }
                }
            }
        }
    }

    pub fn is_transparent_at(&self, x: u16, y: u16) -> bool {
        self.get(x, y).is_none()
    }

    pub fn has_tile_content(&self) -> bool {
        self.cells.iter().any(Option::is_some)
    }
}

pub fn adjust_color(color: Color, delta: i16) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let clamp = |v: i16| v.max(0).min(255) as u8;
            Color::Rgb(
                clamp(r as i16 + delta),
                clamp(g as i16 + delta),
                clamp(b as i16 + delta),
            )
        }
        other => other,
    }
}

pub fn tile_seed(x: u16, y: u16) -> u32 {
    let mut n = x as u32;
    n = n
        .wrapping_mul(374_761_393)
        .wrapping_add((y as u32).wrapping_mul(668_265_263));
    n ^= n >> 13;
    n = n.wrapping_mul(1_274_126_177);
    n ^= n >> 16;
    n
}

pub fn cell_seed(x: u16, y: u16, dx: u16, dy: u16) -> u32 {
    let mut n = tile_seed(x, y);
    n ^= (dx as u32).wrapping_mul(2_246_822_519);
    n ^= (dy as u32).wrapping_mul(3_266_489_917);
    n ^= n >> 15;
    n = n.wrapping_mul(668_265_263);
    n ^= n >> 13;
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MapSize;
    use ratatui::{backend::TestBackend, Terminal};

    const STONE: Color = Color::Rgb(90, 90, 90);
    const LEAF: Color = Color::Rgb(40, 160, 60);

    fn tileset() -> Tileset {
        Tileset::builder()
            .tile(1, TileArt::solid(TilePalette::textured(STONE, '#', 3)))
            .tile(2, TileArt::sparse(TilePalette::textured(LEAF, '"', 1)))
            .build()
    }

    #[test]
    fn tile_seed_is_deterministic() {
        assert_eq!(tile_seed(7, 9), tile_seed(7, 9));
        assert_ne!(tile_seed(7, 9), tile_seed(7, 10));
    }

    #[test]
    fn compose_scales_layer_to_cells() {
        let mut layer = TileLayer::empty("background", MapSize::new(3, 2));
        layer.set(0, 0, 1);
        let surface = LayerSurface::compose([&layer], &tileset(), CellScale::default());

        assert_eq!((surface.width, surface.height), (12, 4));
        for y in 0..2 {
            for x in 0..4 {
                assert!(surface.get(x, y).and_then(|cell| cell.bg).is_some());
            }
        }
        assert!(surface.is_transparent_at(4, 0));
        assert!(surface.is_transparent_at(0, 2));
    }

    #[test]
    fn sparse_tiles_keep_background() {
        let mut layer = TileLayer::empty("grassy_top", MapSize::new(1, 1));
        layer.set(0, 0, 2);
        let surface = LayerSurface::compose([&layer], &tileset(), CellScale::default());
        assert!(surface.has_tile_content());
        for y in 0..2 {
            for x in 0..4 {
                if let Some(cell) = surface.get(x, y) {
                    assert_eq!(cell.bg, None);
                }
            }
        }
    }

    #[test]
    fn blit_clips_and_offsets() {
        let mut layer = TileLayer::empty("background", MapSize::new(2, 2));
        for (col, row) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            layer.set(col, row, 1);
        }
        let surface = LayerSurface::compose([&layer], &tileset(), CellScale::default());

        let mut terminal = Terminal::new(TestBackend::new(10, 6)).expect("terminal");
        terminal
            .draw(|frame| {
                let area = Rect::new(0, 0, 10, 6);
                surface.blit(frame.buffer_mut(), area, -6, 2);
            })
            .expect("draw");

        let buffer = terminal.backend().buffer();
        // Surface is 8x4 cells; shifted left by 6 only two columns remain.
        assert_ne!(buffer.cell((1, 2)).expect("cell").bg, Color::Reset);
        assert_eq!(buffer.cell((2, 2)).expect("cell").bg, Color::Reset);
        assert_eq!(buffer.cell((0, 1)).expect("cell").bg, Color::Reset);
    }

    #[test]
    fn composed_output_is_deterministic() {
        let mut layer = TileLayer::empty("background", MapSize::new(4, 4));
        for row in 0..4 {
            for col in 0..4 {
                layer.set(col, row, 1);
            }
        }
        let first = LayerSurface::compose([&layer], &tileset(), CellScale::default());
        let second = LayerSurface::compose([&layer], &tileset(), CellScale::default());
        assert_eq!(first, second);
    }
}
