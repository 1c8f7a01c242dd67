//! Moving between the overworld and interior rooms.
//!
//! Every transition builds the destination first and only then touches the
//! player or the current location, so a failure leaves both untouched.

use tracing::info;

use crate::assets::AssetStore;
use crate::config::GameConfig;
use crate::error::TransitionError;
use crate::map::{load_interior, MapId, TileMap};
use crate::scenario::{ScenarioManifest, OVERWORLD_ID};
use crate::state::Player;

#[derive(Clone, Debug, PartialEq)]
pub enum TransitionTarget {
    Enter(MapId),
    ReturnToPrevious,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Location {
    #[default]
    Overworld,
    Interior(TileMap),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransitionManager {
    location: Location,
    previous_position: Option<(f32, f32)>,
    /// Tile the player was dropped on by the last return. Triggers on it stay
    /// quiet until the player's center leaves it.
    arrival_tile: Option<(i64, i64)>,
}

impl TransitionManager {
    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn is_interior(&self) -> bool {
        matches!(self.location, Location::Interior(_))
    }

    pub fn previous_position(&self) -> Option<(f32, f32)> {
        self.previous_position
    }

    pub fn current_map<'a>(&'a self, overworld: &'a TileMap) -> &'a TileMap {
        match &self.location {
            Location::Overworld => overworld,
            Location::Interior(map) => map,
        }
    }

    /// Looks for a door (overworld) or an exit cell (interior) under `center`.
    pub fn check_trigger(&mut self, overworld: &TileMap, center: (f32, f32)) -> Option<TransitionTarget> {
        let (x, y) = center;
        let map = match &self.location {
            Location::Overworld => overworld,
            Location::Interior(map) => map,
        };
        if let Some(arrival) = self.arrival_tile {
            if arrival == map.tile_at(x, y) {
                return None;
            }
            self.arrival_tile = None;
        }
        match &self.location {
            Location::Overworld => overworld
                .check_door_interaction(x, y)
                .map(TransitionTarget::Enter),
            Location::Interior(map) => map
                .is_exit_cell(x, y)
                .then_some(TransitionTarget::ReturnToPrevious),
        }
    }

    /// Applies `target` and returns the id of the map the player is now on.
    pub fn transition(
        &mut self,
        target: TransitionTarget,
        player: &mut Player,
        scenario: &ScenarioManifest,
        assets: &AssetStore,
        config: &GameConfig,
    ) -> Result<MapId, TransitionError> {
        match target {
            TransitionTarget::Enter(id) => {
                if scenario.interior(&id).is_none() {
                    return Err(TransitionError::UnknownMap(id));
                }
                let map = load_interior(&id, scenario, assets, config).map_err(|source| {
                    TransitionError::MapUnavailable {
                        id: id.clone(),
                        source,
                    }
                })?;
                let (map_w, _) = map.scaled_size();
                let rows = map.size_in_tiles().height;
                let entry_x = map_w / 2.0 - player.width / 2.0;
                let entry_y = rows.saturating_sub(1) as f32 * map.tile_px() - player.height;

                self.previous_position = Some((player.x, player.y));
                self.location = Location::Interior(map);
                self.arrival_tile = None;
                player.x = entry_x;
                player.y = entry_y;
                info!(map = %id, x = entry_x, y = entry_y, "entered interior");
                Ok(id)
            }
            TransitionTarget::ReturnToPrevious => {
                let (x, y) = self
                    .previous_position
                    .ok_or(TransitionError::NoPreviousPosition)?;
                self.location = Location::Overworld;
                self.previous_position = None;
                player.x = x;
                player.y = y;
                let (cx, cy) = player.center();
                let tile = config.scaled_tile();
                self.arrival_tile = Some(((cx / tile).floor() as i64, (cy / tile).floor() as i64));
                info!(x, y, "returned to overworld");
                Ok(OVERWORLD_ID.to_string())
            }
        }
    }
}
