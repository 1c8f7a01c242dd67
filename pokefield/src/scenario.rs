use std::collections::HashSet;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::animation::SkillAnimation;
use crate::creature::ElementType;
use crate::error::AssetError;
use crate::state::Direction;

/// Id under which the stitched outdoor sections are addressed.
pub const OVERWORLD_ID: &str = "overworld";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioManifest {
    pub name: String,
    pub tileset: String,
    /// Outdoor sections, stacked top to bottom in this order.
    pub overworld: Vec<SectionSpec>,
    #[serde(default)]
    pub interiors: Vec<InteriorSpec>,
    #[serde(default)]
    pub doors: Vec<DoorSpec>,
    pub start: StartSpec,
    pub starter: CreatureSpec,
    pub wild_roster: Vec<CreatureSpec>,
    #[serde(default)]
    pub npcs: Vec<NpcSpec>,
    #[serde(default)]
    pub events: Vec<WorldEventSpec>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SectionSpec {
    pub id: String,
    pub map: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InteriorSpec {
    pub id: String,
    pub map: String,
    /// Tiles that lead back outside.
    #[serde(default)]
    pub exits: Vec<(u16, u16)>,
}

/// Door tile in section-local coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DoorSpec {
    pub section: String,
    pub x: u16,
    pub y: u16,
    pub target: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StartSpec {
    pub section: String,
    /// Distance between the player's feet and the section's bottom edge.
    #[serde(default)]
    pub tiles_from_bottom: u16,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CreatureSpec {
    pub name: String,
    pub element: ElementType,
    pub max_hp: u16,
    pub moves: Vec<MoveSpec>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MoveSpec {
    pub name: String,
    pub power: u16,
    /// Defaults to the owner's type.
    #[serde(default)]
    pub element: Option<ElementType>,
    #[serde(default = "default_pp")]
    pub max_pp: u8,
    #[serde(default)]
    pub animation: Option<SkillAnimation>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NpcSpec {
    pub id: String,
    pub name: String,
    /// Either [`OVERWORLD_ID`] or an interior id.
    pub map: String,
    /// Tile in the map's own coordinates (overworld: stacked coordinates).
    pub tile: (u16, u16),
    #[serde(default = "default_facing")]
    pub facing: Direction,
    #[serde(default)]
    pub lines: Vec<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Waypoints visited in a loop, in tiles.
    #[serde(default)]
    pub patrol: Vec<(u16, u16)>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WorldEventSpec {
    pub id: String,
    pub trigger: WorldTrigger,
    #[serde(default)]
    pub reveal: Vec<String>,
    /// NPC whose script opens when the event fires.
    #[serde(default)]
    pub dialogue_from: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum WorldTrigger {
    FirstVisit { map: String },
}

impl ScenarioManifest {
    pub fn interior(&self, id: &str) -> Option<&InteriorSpec> {
        self.interiors.iter().find(|interior| interior.id == id)
    }

    pub fn npc(&self, id: &str) -> Option<&NpcSpec> {
        self.npcs.iter().find(|npc| npc.id == id)
    }

    /// Cross-reference check run once at startup.
    pub fn validate(&self) -> Result<(), String> {
        if self.overworld.is_empty() {
            return Err("overworld needs at least one section".into());
        }
        if self.wild_roster.is_empty() {
            return Err("wild roster is empty".into());
        }
        if self.starter.moves.is_empty() {
            return Err(format!("starter {} has no moves", self.starter.name));
        }

        let sections: HashSet<&str> = self.overworld.iter().map(|s| s.id.as_str()).collect();
        let interiors: HashSet<&str> = self.interiors.iter().map(|i| i.id.as_str()).collect();
        if !sections.contains(self.start.section.as_str()) {
            return Err(format!("start section {:?} is unknown", self.start.section));
        }
        for door in &self.doors {
            if !sections.contains(door.section.as_str()) {
                return Err(format!("door in unknown section {:?}", door.section));
            }
            // Unknown door targets are reported by the transition at runtime.
        }
        for npc in &self.npcs {
            if npc.map != OVERWORLD_ID && !interiors.contains(npc.map.as_str()) {
                return Err(format!("npc {:?} is placed on unknown map {:?}", npc.id, npc.map));
            }
        }
        for event in &self.events {
            for id in event.reveal.iter().chain(event.dialogue_from.iter()) {
                if self.npc(id).is_none() {
                    return Err(format!("event {:?} refers to unknown npc {:?}", event.id, id));
                }
            }
        }
        Ok(())
    }
}

pub fn load_manifest(path: &Path) -> Result<ScenarioManifest, AssetError> {
    let text = std::fs::read_to_string(path).map_err(|source| AssetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::de::from_str(&text).map_err(|err| AssetError::Parse {
        path: path.to_path_buf(),
        details: err.to_string(),
    })
}

fn default_pp() -> u8 {
    10
}

fn default_facing() -> Direction {
    Direction::Down
}

fn default_true() -> bool {
    true
}
