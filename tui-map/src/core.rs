use std::fmt;

/// Global tile id. `0` is reserved for "no tile".
pub type TileId = u32;

pub const EMPTY_TILE: TileId = 0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MapSize {
    pub width: u16,
    pub height: u16,
}

impl MapSize {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    pub fn tile_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn contains(self, col: i64, row: i64) -> bool {
        col >= 0 && row >= 0 && col < self.width as i64 && row < self.height as i64
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoreError {
    TileCountMismatch {
        expected: usize,
        actual: usize,
    },
    LayerSizeMismatch {
        layer: String,
        expected: MapSize,
        actual: MapSize,
    },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::TileCountMismatch { expected, actual } => {
                write!(f, "tile count mismatch: expected {}, got {}", expected, actual)
            }
            CoreError::LayerSizeMismatch {
                layer,
                expected,
                actual,
            } => write!(
                f,
                "layer {:?} is {}x{}, expected {}x{}",
                layer, actual.width, actual.height, expected.width, expected.height
            ),
        }
    }
}

impl std::error::Error for CoreError {}

/// What a layer means to game logic, inferred from its name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerRole {
    Background,
    Blocking,
    GrassBottom,
    GrassTop,
    Decoration,
}

impl LayerRole {
    pub fn from_layer_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "background" | "ground" => LayerRole::Background,
            "obstacles" | "object" | "objects" | "rock" | "collision" => LayerRole::Blocking,
            "grassy_bottom" => LayerRole::GrassBottom,
            "grassy_top" => LayerRole::GrassTop,
            _ => LayerRole::Decoration,
        }
    }

    pub fn is_blocking(self) -> bool {
        matches!(self, LayerRole::Blocking)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileLayer {
    pub name: String,
    pub role: LayerRole,
    pub size: MapSize,
    tiles: Vec<TileId>,
}

impl TileLayer {
    pub fn new(name: impl Into<String>, size: MapSize, tiles: Vec<TileId>) -> Result<Self, CoreError> {
        let expected = size.tile_count();
        let actual = tiles.len();
        if expected != actual {
            return Err(CoreError::TileCountMismatch { expected, actual });
        }
        let name = name.into();
        Ok(Self {
            role: LayerRole::from_layer_name(&name),
            name,
            size,
            tiles,
        })
    }

    pub fn empty(name: impl Into<String>, size: MapSize) -> Self {
        let name = name.into();
        Self {
            role: LayerRole::from_layer_name(&name),
            name,
            size,
            tiles: vec![EMPTY_TILE; size.tile_count()],
        }
    }

    fn index(&self, col: i64, row: i64) -> Option<usize> {
        if !self.size.contains(col, row) {
            return None;
        }
        Some(row as usize * self.size.width as usize + col as usize)
    }

    /// Tile id at a cell; out of bounds reads as [`EMPTY_TILE`].
    pub fn gid_at(&self, col: i64, row: i64) -> TileId {
        self.index(col, row)
            .and_then(|idx| self.tiles.get(idx).copied())
            .unwrap_or(EMPTY_TILE)
    }

    pub fn is_set(&self, col: i64, row: i64) -> bool {
        self.gid_at(col, row) != EMPTY_TILE
    }

    pub fn set(&mut self, col: u16, row: u16, gid: TileId) {
        if let Some(idx) = self.index(col as i64, row as i64) {
            self.tiles[idx] = gid;
        }
    }

    /// Non-empty cells in row-major order as `(col, row, gid)`.
    pub fn iter(&self) -> impl Iterator<Item = (u16, u16, TileId)> + '_ {
        let width = self.size.width.max(1) as usize;
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, gid)| **gid != EMPTY_TILE)
            .map(move |(idx, gid)| ((idx % width) as u16, (idx / width) as u16, *gid))
    }
}

/// An ordered set of same-sized layers forming one authored map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerStack {
    pub name: String,
    pub size: MapSize,
    layers: Vec<TileLayer>,
}

impl LayerStack {
    pub fn new(name: impl Into<String>, layers: Vec<TileLayer>) -> Result<Self, CoreError> {
        let size = layers.first().map(|layer| layer.size).unwrap_or_default();
        if let Some(bad) = layers.iter().find(|layer| layer.size != size) {
            return Err(CoreError::LayerSizeMismatch {
                layer: bad.name.clone(),
                expected: size,
                actual: bad.size,
            });
        }
        Ok(Self {
            name: name.into(),
            size,
            layers,
        })
    }

    pub fn layers(&self) -> &[TileLayer] {
        &self.layers
    }

    pub fn layer(&self, name: &str) -> Option<&TileLayer> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    pub fn with_role(&self, role: LayerRole) -> impl Iterator<Item = &TileLayer> + '_ {
        self.layers.iter().filter(move |layer| layer.role == role)
    }

    pub fn any_set(&self, role: LayerRole, col: i64, row: i64) -> bool {
        self.with_role(role).any(|layer| layer.is_set(col, row))
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty() || self.size.tile_count() == 0
    }
}

/// Offset that places `center` in the middle of `viewport` without showing
/// anything outside `0..map_extent`. A map smaller than the viewport is
/// centered instead.
pub fn camera_offset(center: i32, map_extent: i32, viewport: i32) -> i32 {
    if map_extent < viewport {
        return (viewport - map_extent) / 2;
    }
    (viewport / 2 - center).clamp(viewport - map_extent, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_lookup_and_bounds() {
        let layer = TileLayer::new("obstacles", MapSize::new(3, 2), vec![0, 4, 0, 0, 0, 9])
            .expect("layer");
        assert_eq!(layer.role, LayerRole::Blocking);
        assert_eq!(layer.gid_at(1, 0), 4);
        assert_eq!(layer.gid_at(2, 1), 9);
        assert!(!layer.is_set(0, 0));
        assert!(!layer.is_set(-1, 0));
        assert!(!layer.is_set(3, 0));
        assert!(!layer.is_set(0, 2));
    }

    #[test]
    fn iter_skips_empty_cells() {
        let layer = TileLayer::new("background", MapSize::new(2, 2), vec![1, 0, 0, 7]).expect("layer");
        let cells: Vec<_> = layer.iter().collect();
        assert_eq!(cells, vec![(0, 0, 1), (1, 1, 7)]);
    }

    #[test]
    fn tile_count_is_checked() {
        let err = TileLayer::new("background", MapSize::new(2, 2), vec![1]).expect_err("should fail");
        assert_eq!(err, CoreError::TileCountMismatch { expected: 4, actual: 1 });
    }

    #[test]
    fn stack_rejects_mismatched_layers() {
        let a = TileLayer::empty("background", MapSize::new(4, 4));
        let b = TileLayer::empty("obstacles", MapSize::new(4, 3));
        let err = LayerStack::new("demo", vec![a, b]).expect_err("should fail");
        assert!(matches!(err, CoreError::LayerSizeMismatch { .. }));
    }

    #[test]
    fn role_names_follow_convention() {
        for name in ["obstacles", "object", "rock", "collision", "Objects"] {
            assert!(LayerRole::from_layer_name(name).is_blocking(), "{name}");
        }
        assert_eq!(LayerRole::from_layer_name("grassy_bottom"), LayerRole::GrassBottom);
        assert_eq!(LayerRole::from_layer_name("grassy_top"), LayerRole::GrassTop);
        assert_eq!(LayerRole::from_layer_name("flowers"), LayerRole::Decoration);
    }

    #[test]
    fn camera_clamps_to_map() {
        // Map 960 wide, viewport 480.
        assert_eq!(camera_offset(100, 960, 480), 0);
        assert_eq!(camera_offset(480, 960, 480), -240);
        assert_eq!(camera_offset(950, 960, 480), -480);
    }

    #[test]
    fn camera_centers_small_map() {
        assert_eq!(camera_offset(10, 480, 600), 60);
        assert_eq!(camera_offset(400, 480, 600), 60);
    }
}
