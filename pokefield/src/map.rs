//! Field maps in scaled pixel space.
//!
//! A [`TileMap`] is one of three kinds behind the same query methods:
//! the stitched overworld, a single interior room, or an empty stand-in used
//! when a map could not be loaded. Every query on the empty kind answers
//! "blocked, no grass, no door".

use std::sync::Arc;

use tui_map::core::{camera_offset, LayerRole, LayerStack, MapSize};
use tui_map::render::{CellScale, LayerSurface, Tileset};

use crate::assets::AssetStore;
use crate::config::GameConfig;
use crate::error::MapLoadError;
use crate::scenario::{ScenarioManifest, OVERWORLD_ID};

pub type MapId = String;

/// Pre-composited layers of one section, in draw order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionSurfaces {
    pub background: LayerSurface,
    pub grass_top: LayerSurface,
    pub grass_bottom: LayerSurface,
    pub foreground: LayerSurface,
}

impl SectionSurfaces {
    fn compose(layers: &LayerStack, tileset: &Tileset, scale: CellScale) -> Self {
        let surface = |roles: &[LayerRole]| {
            let picked = layers
                .layers()
                .iter()
                .filter(|layer| roles.contains(&layer.role));
            let mut surface = LayerSurface::compose(picked, tileset, scale);
            if surface.width == 0 {
                surface = LayerSurface::blank(
                    layers.size.width * scale.cols_per_tile,
                    layers.size.height * scale.rows_per_tile,
                );
            }
            surface
        };
        Self {
            background: surface(&[LayerRole::Background, LayerRole::Decoration]),
            grass_top: surface(&[LayerRole::GrassTop]),
            grass_bottom: surface(&[LayerRole::GrassBottom]),
            foreground: surface(&[LayerRole::Blocking]),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapSection {
    pub id: MapId,
    /// First tile row of this section in the stitched map.
    pub row_offset: u16,
    pub layers: Arc<LayerStack>,
    pub surfaces: SectionSurfaces,
}

impl MapSection {
    fn new(id: MapId, row_offset: u16, layers: Arc<LayerStack>, tileset: &Tileset, scale: CellScale) -> Self {
        let surfaces = SectionSurfaces::compose(&layers, tileset, scale);
        Self {
            id,
            row_offset,
            layers,
            surfaces,
        }
    }

    pub fn size(&self) -> MapSize {
        self.layers.size
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Door {
    pub col: u16,
    /// Row in stitched coordinates.
    pub row: u16,
    pub target: MapId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapKind {
    Combined {
        sections: Vec<MapSection>,
        doors: Vec<Door>,
    },
    Single {
        section: MapSection,
        exits: Vec<(u16, u16)>,
    },
    Empty,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TileMap {
    id: MapId,
    kind: MapKind,
    tile_px: f32,
}

impl TileMap {
    pub fn empty(id: impl Into<MapId>, tile_px: f32) -> Self {
        Self {
            id: id.into(),
            kind: MapKind::Empty,
            tile_px,
        }
    }

    /// Stacks `sections` top to bottom. Door rows are given per section and
    /// shifted into stitched coordinates here.
    pub fn combined(
        sections: Vec<(MapId, Arc<LayerStack>)>,
        doors: &[(MapId, u16, u16, MapId)],
        tileset: &Tileset,
        tile_px: f32,
    ) -> Self {
        let scale = CellScale::default();
        let mut row_offset = 0u16;
        let mut built = Vec::with_capacity(sections.len());
        for (id, layers) in sections {
            let height = layers.size.height;
            built.push(MapSection::new(id, row_offset, layers, tileset, scale));
            row_offset = row_offset.saturating_add(height);
        }
        let doors = doors
            .iter()
            .filter_map(|(section, col, row, target)| {
                let owner = built.iter().find(|s| &s.id == section)?;
                Some(Door {
                    col: *col,
                    row: owner.row_offset + row,
                    target: target.clone(),
                })
            })
            .collect();
        Self {
            id: OVERWORLD_ID.to_string(),
            kind: MapKind::Combined {
                sections: built,
                doors,
            },
            tile_px,
        }
    }

    pub fn single(
        id: impl Into<MapId>,
        layers: Arc<LayerStack>,
        exits: Vec<(u16, u16)>,
        tileset: &Tileset,
        tile_px: f32,
    ) -> Self {
        let id = id.into();
        let section = MapSection::new(id.clone(), 0, layers, tileset, CellScale::default());
        Self {
            id,
            kind: MapKind::Single { section, exits },
            tile_px,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &MapKind {
        &self.kind
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.kind, MapKind::Empty)
    }

    pub fn tile_px(&self) -> f32 {
        self.tile_px
    }

    pub fn sections(&self) -> &[MapSection] {
        match &self.kind {
            MapKind::Combined { sections, .. } => sections,
            MapKind::Single { section, .. } => std::slice::from_ref(section),
            MapKind::Empty => &[],
        }
    }

    pub fn size_in_tiles(&self) -> MapSize {
        let sections = self.sections();
        let width = sections.iter().map(|s| s.size().width).max().unwrap_or(0);
        let height = sections.iter().map(|s| s.size().height).sum();
        MapSize::new(width, height)
    }

    pub fn scaled_size(&self) -> (f32, f32) {
        let size = self.size_in_tiles();
        (size.width as f32 * self.tile_px, size.height as f32 * self.tile_px)
    }

    /// Tile under a pixel position. Negative pixels map to negative tiles.
    pub fn tile_at(&self, x: f32, y: f32) -> (i64, i64) {
        (
            (x / self.tile_px).floor() as i64,
            (y / self.tile_px).floor() as i64,
        )
    }

    fn locate(&self, col: i64, row: i64) -> Option<(&MapSection, i64, i64)> {
        self.sections().iter().find_map(|section| {
            let local_row = row - section.row_offset as i64;
            section
                .size()
                .contains(col, local_row)
                .then_some((section, col, local_row))
        })
    }

    pub fn is_walkable(&self, x: f32, y: f32) -> bool {
        let (col, row) = self.tile_at(x, y);
        match self.locate(col, row) {
            Some((section, col, row)) => !section.layers.any_set(LayerRole::Blocking, col, row),
            None => false,
        }
    }

    pub fn is_on_grassy(&self, x: f32, y: f32) -> bool {
        let (col, row) = self.tile_at(x, y);
        match self.locate(col, row) {
            Some((section, col, row)) => section.layers.any_set(LayerRole::GrassBottom, col, row),
            None => false,
        }
    }

    pub fn check_door_interaction(&self, x: f32, y: f32) -> Option<MapId> {
        let MapKind::Combined { doors, .. } = &self.kind else {
            return None;
        };
        let (col, row) = self.tile_at(x, y);
        doors
            .iter()
            .find(|door| door.col as i64 == col && door.row as i64 == row)
            .map(|door| door.target.clone())
    }

    pub fn is_exit_cell(&self, x: f32, y: f32) -> bool {
        let MapKind::Single { exits, .. } = &self.kind else {
            return false;
        };
        let (col, row) = self.tile_at(x, y);
        exits
            .iter()
            .any(|(ex, ey)| *ex as i64 == col && *ey as i64 == row)
    }

    /// Pixel offset that keeps `focus` centered within `viewport` without
    /// revealing space outside the map.
    pub fn camera_offset(&self, focus: (f32, f32), viewport: (f32, f32)) -> (i32, i32) {
        let (map_w, map_h) = self.scaled_size();
        (
            camera_offset(focus.0 as i32, map_w as i32, viewport.0 as i32),
            camera_offset(focus.1 as i32, map_h as i32, viewport.1 as i32),
        )
    }
}

/// Builds the stitched overworld from the preloaded documents.
pub fn load_overworld(
    scenario: &ScenarioManifest,
    assets: &AssetStore,
    config: &GameConfig,
) -> Result<TileMap, MapLoadError> {
    let mut sections = Vec::with_capacity(scenario.overworld.len());
    for spec in &scenario.overworld {
        let layers = assets.document(&spec.map)?;
        if layers.is_empty() {
            return Err(MapLoadError::Empty(spec.id.clone()));
        }
        sections.push((spec.id.clone(), layers));
    }
    let doors: Vec<_> = scenario
        .doors
        .iter()
        .map(|door| (door.section.clone(), door.x, door.y, door.target.clone()))
        .collect();
    Ok(TileMap::combined(
        sections,
        &doors,
        assets.tileset(),
        config.scaled_tile(),
    ))
}

pub fn load_interior(
    id: &str,
    scenario: &ScenarioManifest,
    assets: &AssetStore,
    config: &GameConfig,
) -> Result<TileMap, MapLoadError> {
    let spec = scenario
        .interior(id)
        .ok_or_else(|| MapLoadError::Unlisted(id.to_string()))?;
    let layers = assets.document(&spec.map)?;
    if layers.is_empty() {
        return Err(MapLoadError::Empty(id.to_string()));
    }
    Ok(TileMap::single(
        id,
        layers,
        spec.exits.clone(),
        assets.tileset(),
        config.scaled_tile(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tui_map::core::TileLayer;

    const TILE: f32 = 48.0;

    fn stack(name: &str, width: u16, height: u16, blocked: &[(u16, u16)], grass: &[(u16, u16)]) -> Arc<LayerStack> {
        let size = MapSize::new(width, height);
        let mut background = TileLayer::empty("background", size);
        let mut obstacles = TileLayer::empty("obstacles", size);
        let mut grass_bottom = TileLayer::empty("grassy_bottom", size);
        for row in 0..height {
            for col in 0..width {
                background.set(col, row, 1);
            }
        }
        for (col, row) in blocked {
            obstacles.set(*col, *row, 10);
        }
        for (col, row) in grass {
            grass_bottom.set(*col, *row, 20);
        }
        Arc::new(LayerStack::new(name, vec![background, obstacles, grass_bottom]).expect("stack"))
    }

    fn tileset() -> Tileset {
        Tileset::builder().build()
    }

    fn overworld() -> TileMap {
        TileMap::combined(
            vec![
                ("road".into(), stack("road", 4, 3, &[(0, 0)], &[(1, 1)])),
                ("town".into(), stack("town", 5, 2, &[(3, 1)], &[])),
            ],
            &[("town".into(), 2, 1, "lab".into())],
            &tileset(),
            TILE,
        )
    }

    fn center(col: u16, row: u16) -> (f32, f32) {
        (col as f32 * TILE + TILE / 2.0, row as f32 * TILE + TILE / 2.0)
    }

    #[test]
    fn combined_map_routes_rows_to_sections() {
        let map = overworld();
        assert_eq!(map.size_in_tiles(), MapSize::new(5, 5));

        let (x, y) = center(0, 0);
        assert!(!map.is_walkable(x, y));
        let (x, y) = center(1, 1);
        assert!(map.is_walkable(x, y));
        assert!(map.is_on_grassy(x, y));

        // Town row 1 sits at stitched row 4.
        let (x, y) = center(3, 4);
        assert!(!map.is_walkable(x, y));
        let (x, y) = center(3, 3);
        assert!(map.is_walkable(x, y));
    }

    #[test]
    fn narrower_section_is_out_of_bounds_past_its_width() {
        let map = overworld();
        let (x, y) = center(4, 1);
        assert!(!map.is_walkable(x, y));
        let (x, y) = center(4, 3);
        assert!(map.is_walkable(x, y));
    }

    #[test]
    fn out_of_bounds_is_blocked_and_not_grass() {
        let map = overworld();
        for (x, y) in [(-1.0, 10.0), (10.0, -0.5), (5000.0, 10.0), (10.0, 5000.0)] {
            assert!(!map.is_walkable(x, y));
            assert!(!map.is_on_grassy(x, y));
            assert_eq!(map.check_door_interaction(x, y), None);
        }
    }

    #[test]
    fn door_uses_stitched_row() {
        let map = overworld();
        let (x, y) = center(2, 4);
        assert_eq!(map.check_door_interaction(x, y), Some("lab".to_string()));
        let (x, y) = center(2, 1);
        assert_eq!(map.check_door_interaction(x, y), None);
    }

    #[test]
    fn single_map_reports_exit_cells() {
        let map = TileMap::single("lab", stack("lab", 10, 12, &[], &[]), vec![(4, 11), (5, 11)], &tileset(), TILE);
        let (x, y) = center(4, 11);
        assert!(map.is_exit_cell(x, y));
        let (x, y) = center(6, 11);
        assert!(!map.is_exit_cell(x, y));
        assert_eq!(map.check_door_interaction(x, y), None);
    }

    #[test]
    fn degraded_map_blocks_everything() {
        let map = TileMap::empty("road", TILE);
        assert!(map.is_degraded());
        assert!(!map.is_walkable(10.0, 10.0));
        assert!(!map.is_on_grassy(10.0, 10.0));
        assert_eq!(map.scaled_size(), (0.0, 0.0));
    }

    #[test]
    fn camera_follows_and_clamps() {
        // 5x5 tiles = 240px square.
        let map = overworld();
        assert_eq!(map.camera_offset((120.0, 120.0), (120.0, 120.0)), (-60, -60));
        assert_eq!(map.camera_offset((10.0, 230.0), (120.0, 120.0)), (0, -120));
        assert_eq!(map.camera_offset((10.0, 10.0), (480.0, 300.0)), (120, 30));
    }
}
