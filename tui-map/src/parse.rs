use std::collections::HashMap;
use std::fmt;

use crate::core::{MapSize, TileId, TileLayer, EMPTY_TILE};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrimMode {
    TrimEnd,
    TrimBoth,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    pub trim_mode: TrimMode,
    pub default_char: char,
    pub default_tile: TileId,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            trim_mode: TrimMode::TrimEnd,
            default_char: ' ',
            default_tile: EMPTY_TILE,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Legend {
    map: HashMap<char, TileId>,
}

impl Legend {
    pub fn builder() -> LegendBuilder {
        LegendBuilder::default()
    }

    pub fn tile_for(&self, ch: char) -> Option<TileId> {
        self.map.get(&ch).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct LegendBuilder {
    entries: HashMap<char, TileId>,
}

impl LegendBuilder {
    pub fn entry(mut self, ch: char, tile: TileId) -> Self {
        self.entries.insert(ch, tile);
        self
    }

    /// Marks `ch` as "no tile".
    pub fn blank(self, ch: char) -> Self {
        self.entry(ch, EMPTY_TILE)
    }

    pub fn build(self) -> Result<Legend, ParseError> {
        if self.entries.is_empty() {
            return Err(ParseError::EmptyLegend);
        }

        if self.entries.keys().any(|ch| *ch == '\0') {
            return Err(ParseError::InvalidLegendChar);
        }

        Ok(Legend { map: self.entries })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    EmptyLegend,
    InvalidLegendChar,
    UnknownLegendKey { ch: char, col: usize, row: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::EmptyLegend => write!(f, "legend must contain at least one entry"),
            ParseError::InvalidLegendChar => write!(f, "legend contains an invalid character"),
            ParseError::UnknownLegendKey { ch, col, row } => {
                write!(f, "unknown legend key {:?} at column {}, row {}", ch, col, row)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses one layer from already split rows. Every row counts, including
/// rows that are blank after trimming; short rows are padded with
/// `options.default_char`.
pub fn parse_char_rows<S: AsRef<str>>(
    layer_name: &str,
    rows: &[S],
    legend: &Legend,
    options: &ParseOptions,
) -> Result<TileLayer, ParseError> {
    let lines: Vec<&str> = rows
        .iter()
        .map(|row| match options.trim_mode {
            TrimMode::TrimBoth => row.as_ref().trim(),
            TrimMode::TrimEnd => row.as_ref().trim_end(),
        })
        .collect();

    let height = lines.len();
    let width = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);

    let mut tiles = Vec::with_capacity(width * height);
    for (row, line) in lines.iter().enumerate() {
        let chars: Vec<char> = line.chars().collect();
        for col in 0..width {
            let ch = chars.get(col).copied().unwrap_or(options.default_char);
            let tile = if let Some(tile) = legend.tile_for(ch) {
                tile
            } else if ch == options.default_char {
                options.default_tile
            } else {
                return Err(ParseError::UnknownLegendKey { ch, col, row });
            };
            tiles.push(tile);
        }
    }

    let size = MapSize::new(width as u16, height as u16);
    Ok(TileLayer::new(layer_name, size, tiles).expect("parser precomputes exact tile capacity"))
}

/// Parses one layer from a text block, skipping blank lines.
pub fn parse_char_layer(
    layer_name: &str,
    text: &str,
    legend: &Legend,
    options: &ParseOptions,
) -> Result<TileLayer, ParseError> {
    let rows: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    parse_char_rows(layer_name, &rows, legend, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LayerRole;

    fn sample_legend() -> Legend {
        Legend::builder()
            .blank('.')
            .entry('g', 20)
            .entry('T', 10)
            .build()
            .expect("legend")
    }

    #[test]
    fn parse_ragged_rows_pads_with_blank() {
        let legend = sample_legend();
        let layer =
            parse_char_rows("grassy_bottom", &["gg.", "g", ""], &legend, &ParseOptions::default())
                .expect("layer");

        assert_eq!(layer.size, MapSize::new(3, 3));
        assert_eq!(layer.role, LayerRole::GrassBottom);
        assert_eq!(layer.gid_at(1, 0), 20);
        assert_eq!(layer.gid_at(2, 0), EMPTY_TILE);
        assert_eq!(layer.gid_at(1, 1), EMPTY_TILE);
        assert_eq!(layer.gid_at(0, 2), EMPTY_TILE);
    }

    #[test]
    fn parse_errors_on_unknown_legend_key() {
        let legend = sample_legend();
        let err = parse_char_layer("obstacles", "TT\nT?", &legend, &ParseOptions::default())
            .expect_err("should fail");

        assert_eq!(err, ParseError::UnknownLegendKey { ch: '?', col: 1, row: 1 });
    }

    #[test]
    fn text_layers_skip_blank_lines() {
        let legend = sample_legend();
        let layer = parse_char_layer("obstacles", "\nT.T\n\n.T.\n", &legend, &ParseOptions::default())
            .expect("layer");
        assert_eq!(layer.size, MapSize::new(3, 2));
        assert_eq!(layer.iter().count(), 3);
    }

    #[test]
    fn trim_mode_parity() {
        let legend = sample_legend();

        let trimmed = parse_char_rows(
            "trim",
            &["   g   "],
            &legend,
            &ParseOptions {
                trim_mode: TrimMode::TrimBoth,
                ..ParseOptions::default()
            },
        )
        .expect("trimmed layer");

        let keep_left =
            parse_char_rows("keep-left", &["   g   "], &legend, &ParseOptions::default())
                .expect("left-preserved layer");

        assert_eq!(trimmed.size.width, 1);
        assert_eq!(keep_left.size.width, 4);
        assert_eq!(keep_left.gid_at(3, 0), 20);
    }

    #[test]
    fn legend_builder_rejects_empty() {
        let err = Legend::builder().build().expect_err("should fail");
        assert_eq!(err, ParseError::EmptyLegend);
    }
}
