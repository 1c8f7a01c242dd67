use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ratatui::style::Color;
use serde::Deserialize;
use tracing::{debug, warn};
use tui_map::core::{LayerStack, TileId, EMPTY_TILE};
use tui_map::parse::{parse_char_rows, Legend, ParseOptions};
use tui_map::render::{TileArt, TilePalette, Tileset};

use crate::error::{AssetError, MapLoadError};
use crate::scenario::ScenarioManifest;

#[derive(Clone, Debug, Deserialize)]
struct TilesetFile {
    #[serde(default = "default_blank")]
    blank: Vec<char>,
    tiles: Vec<TileSpec>,
}

#[derive(Clone, Debug, Deserialize)]
struct TileSpec {
    id: TileId,
    symbol: char,
    color: (u8, u8, u8),
    texture: char,
    #[serde(default = "default_density")]
    density: u8,
    #[serde(default)]
    sparse: bool,
    #[serde(default)]
    glyph: Option<(char, (u8, u8, u8))>,
}

#[derive(Clone, Debug, Deserialize)]
struct MapFile {
    name: String,
    layers: Vec<LayerFile>,
}

#[derive(Clone, Debug, Deserialize)]
struct LayerFile {
    name: String,
    rows: Vec<String>,
}

/// Everything derived from the tileset file: the char legend used to read
/// map layers and the art used to draw them.
#[derive(Clone, Debug)]
pub struct TileCatalog {
    pub legend: Legend,
    pub tileset: Tileset,
}

impl TileCatalog {
    pub fn from_ron(text: &str, path: &Path) -> Result<Self, AssetError> {
        let file: TilesetFile = ron::de::from_str(text).map_err(|err| AssetError::Parse {
            path: path.to_path_buf(),
            details: err.to_string(),
        })?;
        let invalid = |details: String| AssetError::Tileset {
            path: path.to_path_buf(),
            details,
        };

        let mut legend = Legend::builder();
        let mut tileset = Tileset::builder();
        let mut symbols = HashSet::new();
        for ch in &file.blank {
            symbols.insert(*ch);
            legend = legend.blank(*ch);
        }
        for tile in &file.tiles {
            if tile.id == EMPTY_TILE {
                return Err(invalid(format!("tile {:?} uses the reserved id 0", tile.symbol)));
            }
            if !symbols.insert(tile.symbol) {
                return Err(invalid(format!("symbol {:?} is used twice", tile.symbol)));
            }
            legend = legend.entry(tile.symbol, tile.id);

            let (r, g, b) = tile.color;
            let palette = TilePalette::textured(Color::Rgb(r, g, b), tile.texture, tile.density);
            let mut art = if tile.sparse {
                TileArt::sparse(palette)
            } else {
                TileArt::solid(palette)
            };
            if let Some((ch, (r, g, b))) = tile.glyph {
                art = art.with_glyph(ch, Color::Rgb(r, g, b));
            }
            tileset = tileset.tile(tile.id, art);
        }

        let legend = legend.build().map_err(|err| invalid(err.to_string()))?;
        Ok(Self {
            legend,
            tileset: tileset.build(),
        })
    }
}

pub fn parse_map_document(text: &str, path: &Path, legend: &Legend) -> Result<LayerStack, AssetError> {
    let file: MapFile = ron::de::from_str(text).map_err(|err| AssetError::Parse {
        path: path.to_path_buf(),
        details: err.to_string(),
    })?;
    let options = ParseOptions::default();
    let layers = file
        .layers
        .iter()
        .map(|layer| {
            parse_char_rows(&layer.name, &layer.rows, legend, &options).map_err(|source| {
                AssetError::Layer {
                    path: path.to_path_buf(),
                    layer: layer.name.clone(),
                    source,
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    LayerStack::new(file.name, layers).map_err(|source| AssetError::Stack {
        path: path.to_path_buf(),
        source,
    })
}

/// Map documents keyed by their path relative to the asset root.
///
/// Loads are cached on success. Failures are remembered only for
/// diagnostics; a later [`AssetStore::load`] retries the file.
#[derive(Clone, Debug)]
pub struct AssetStore {
    root: PathBuf,
    catalog: Arc<TileCatalog>,
    documents: HashMap<String, Arc<LayerStack>>,
    failures: HashMap<String, String>,
}

impl AssetStore {
    /// Reads the tileset; a missing or broken tileset is fatal.
    pub fn open(root: impl Into<PathBuf>, tileset_path: &str) -> Result<Self, AssetError> {
        let root = root.into();
        let path = root.join(tileset_path);
        let text = std::fs::read_to_string(&path).map_err(|source| AssetError::Read {
            path: path.clone(),
            source,
        })?;
        let catalog = TileCatalog::from_ron(&text, &path)?;
        Ok(Self::with_catalog(root, catalog))
    }

    pub fn with_catalog(root: impl Into<PathBuf>, catalog: TileCatalog) -> Self {
        Self {
            root: root.into(),
            catalog: Arc::new(catalog),
            documents: HashMap::new(),
            failures: HashMap::new(),
        }
    }

    pub fn catalog(&self) -> &TileCatalog {
        &self.catalog
    }

    pub fn tileset(&self) -> &Tileset {
        &self.catalog.tileset
    }

    pub fn load(&mut self, path: &str) -> Result<Arc<LayerStack>, AssetError> {
        if let Some(doc) = self.documents.get(path) {
            return Ok(Arc::clone(doc));
        }
        let full = self.root.join(path);
        let result = std::fs::read_to_string(&full)
            .map_err(|source| AssetError::Read {
                path: full.clone(),
                source,
            })
            .and_then(|text| parse_map_document(&text, &full, &self.catalog.legend));
        self.remember(path, result)
    }

    /// Parses a document from memory and caches it under `path`.
    pub fn insert_text(&mut self, path: &str, text: &str) -> Result<Arc<LayerStack>, AssetError> {
        let result = parse_map_document(text, Path::new(path), &self.catalog.legend);
        self.remember(path, result)
    }

    fn remember(
        &mut self,
        path: &str,
        result: Result<LayerStack, AssetError>,
    ) -> Result<Arc<LayerStack>, AssetError> {
        match result {
            Ok(stack) => {
                debug!(path, layers = stack.layers().len(), "map document cached");
                let doc = Arc::new(stack);
                self.failures.remove(path);
                self.documents.insert(path.to_string(), Arc::clone(&doc));
                Ok(doc)
            }
            Err(err) => {
                self.failures.insert(path.to_string(), err.to_string());
                Err(err)
            }
        }
    }

    /// Loads every map the scenario mentions. Broken maps are logged and
    /// skipped; they show up later as degraded maps.
    pub fn preload(&mut self, manifest: &ScenarioManifest) -> usize {
        let paths: Vec<String> = manifest
            .overworld
            .iter()
            .map(|section| section.map.clone())
            .chain(manifest.interiors.iter().map(|interior| interior.map.clone()))
            .collect();
        let mut failed = 0;
        for path in paths {
            if let Err(err) = self.load(&path) {
                warn!(path = %path, error = %err, "map document failed to load");
                failed += 1;
            }
        }
        failed
    }

    /// Cached lookup used while the game runs; never touches the disk.
    pub fn document(&self, path: &str) -> Result<Arc<LayerStack>, MapLoadError> {
        if let Some(doc) = self.documents.get(path) {
            return Ok(Arc::clone(doc));
        }
        match self.failures.get(path) {
            Some(reason) => Err(MapLoadError::Unavailable {
                path: path.to_string(),
                reason: reason.clone(),
            }),
            None => Err(MapLoadError::NotLoaded(path.to_string())),
        }
    }
}

fn default_blank() -> Vec<char> {
    vec!['.', ' ']
}

fn default_density() -> u8 {
    4
}

#[cfg(test)]
mod tests {
    use super::*;
    use tui_map::core::LayerRole;

    const TILESET: &str = r#"(
        tiles: [
            (id: 1, symbol: ',', color: (52, 128, 64), texture: '\''),
            (id: 10, symbol: 'T', color: (24, 84, 40), texture: '^', glyph: Some(('#', (120, 200, 110)))),
            (id: 20, symbol: 'g', color: (40, 140, 60), texture: '"', sparse: true),
        ],
    )"#;

    const MAP: &str = r#"(
        name: "patch",
        layers: [
            (name: "background", rows: [",,,", ",,,"]),
            (name: "obstacles", rows: ["T..", "..."]),
            (name: "grassy_bottom", rows: ["..g", "..g"]),
        ],
    )"#;

    fn store() -> AssetStore {
        let catalog = TileCatalog::from_ron(TILESET, Path::new("tileset.ron")).expect("catalog");
        AssetStore::with_catalog("assets", catalog)
    }

    #[test]
    fn catalog_builds_legend_from_symbols() {
        let catalog = TileCatalog::from_ron(TILESET, Path::new("tileset.ron")).expect("catalog");
        assert_eq!(catalog.legend.tile_for('T'), Some(10));
        assert_eq!(catalog.legend.tile_for('.'), Some(EMPTY_TILE));
        assert!(catalog.tileset.contains(20));
    }

    #[test]
    fn catalog_rejects_duplicate_symbols() {
        let text = "(tiles: [(id: 1, symbol: 'a', color: (0, 0, 0), texture: '.'), (id: 2, symbol: 'a', color: (0, 0, 0), texture: '.')])";
        let err = TileCatalog::from_ron(text, Path::new("t.ron")).expect_err("should fail");
        assert!(matches!(err, AssetError::Tileset { .. }));
    }

    #[test]
    fn documents_are_cached_by_path() {
        let mut store = store();
        let first = store.insert_text("maps/patch.ron", MAP).expect("document");
        let second = store.document("maps/patch.ron").expect("cached");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.any_set(LayerRole::Blocking, 0, 0));
        assert!(second.any_set(LayerRole::GrassBottom, 2, 1));
    }

    #[test]
    fn unknown_symbol_is_a_layer_error() {
        let mut store = store();
        let text = r#"(name: "bad", layers: [(name: "background", rows: [",?,"])])"#;
        let err = store.insert_text("maps/bad.ron", text).expect_err("should fail");
        assert!(matches!(err, AssetError::Layer { .. }));
        assert!(matches!(
            store.document("maps/bad.ron"),
            Err(MapLoadError::Unavailable { .. })
        ));
    }

    #[test]
    fn missing_file_is_reported_not_cached() {
        let mut store = store();
        let err = store.load("maps/does-not-exist.ron").expect_err("should fail");
        assert!(matches!(err, AssetError::Read { .. }));
        assert_eq!(
            store.document("maps/never.ron"),
            Err(MapLoadError::NotLoaded("maps/never.ron".into()))
        );
    }
}
