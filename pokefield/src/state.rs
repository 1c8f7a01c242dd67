use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::animation::AnimationSystem;
use crate::assets::AssetStore;
use crate::battle::BattleSession;
use crate::collision::Rect;
use crate::config::GameConfig;
use crate::creature::Creature;
use crate::dialogue::DialogueManager;
use crate::encounter::EncounterTracker;
use crate::map::{load_overworld, TileMap};
use crate::movement::WalkCycle;
use crate::npc::Npc;
use crate::scenario::{ScenarioManifest, OVERWORLD_ID};
use crate::transition::TransitionManager;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Input priority order.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn delta(self) -> (f32, f32) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum GameMode {
    Field,
    Battle,
}

/// Small deterministic generator; a 64-bit LCG whose high half is the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dice {
    seed: u64,
}

impl Dice {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.seed = self.seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.seed >> 32) as u32
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / (u32::MAX as f64 + 1.0)
    }

    /// Uniform in `0..n`; `n` must be non-zero.
    pub fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize
    }
}

pub fn seed_from_time() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (now.as_secs() << 32) ^ now.subsec_nanos() as u64
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub facing: Direction,
    pub walk: WalkCycle,
    pub creature: Creature,
    /// Maps entered at least once; drives first-visit events.
    pub visited_maps: HashSet<String>,
}

impl Player {
    pub fn new(x: f32, y: f32, config: &GameConfig, creature: Creature) -> Self {
        let size = config.player_extent();
        Self {
            x,
            y,
            width: size,
            height: size,
            facing: Direction::Up,
            walk: WalkCycle::default(),
            creature,
            visited_maps: HashSet::new(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> (f32, f32) {
        self.rect().center()
    }

    pub fn has_visited(&self, map: &str) -> bool {
        self.visited_maps.contains(map)
    }
}

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: GameConfig,
    pub scenario: ScenarioManifest,
    pub assets: AssetStore,
    pub terminal_size: (u16, u16),
    pub mode: GameMode,
    /// Milliseconds of game time since startup.
    pub clock_ms: u64,
    pub player: Player,
    pub overworld: TileMap,
    pub transition: TransitionManager,
    pub npcs: Vec<Npc>,
    pub encounter: EncounterTracker,
    pub battle: Option<BattleSession>,
    pub animations: AnimationSystem,
    pub dialogue: DialogueManager,
    pub dice: Dice,
    pub show_debug: bool,
    pub status: Option<String>,
    pub fired_events: HashSet<String>,
}

impl AppState {
    /// Builds the field from preloaded assets. A broken overworld degrades to
    /// an empty map instead of failing.
    pub fn new(config: GameConfig, scenario: ScenarioManifest, assets: AssetStore, seed: u64) -> Self {
        let overworld = match load_overworld(&scenario, &assets, &config) {
            Ok(map) => map,
            Err(err) => {
                warn!(error = %err, "overworld unavailable, using an empty map");
                TileMap::empty(OVERWORLD_ID, config.scaled_tile())
            }
        };
        let creature = Creature::from_spec(&scenario.starter);
        let player = Player::new(0.0, 0.0, &config, creature);
        let dialogue = DialogueManager::new(config.dialogue_char_ms);
        let mut state = Self {
            config,
            scenario,
            assets,
            terminal_size: (80, 24),
            mode: GameMode::Field,
            clock_ms: 0,
            player,
            overworld,
            transition: TransitionManager::default(),
            npcs: Vec::new(),
            encounter: EncounterTracker::default(),
            battle: None,
            animations: AnimationSystem::default(),
            dialogue,
            dice: Dice::new(seed),
            show_debug: false,
            status: None,
            fired_events: HashSet::new(),
        };
        state.reset_field();
        state
    }

    /// Back to the overworld start: fresh NPCs, fresh starter, no battle.
    pub fn reset_field(&mut self) {
        self.mode = GameMode::Field;
        self.battle = None;
        self.animations.clear();
        self.dialogue.close();
        self.encounter.reset();
        self.transition = TransitionManager::default();
        self.fired_events.clear();
        self.status = None;

        let (x, y) = self.start_position();
        self.player = Player::new(x, y, &self.config, Creature::from_spec(&self.scenario.starter));
        self.npcs = self
            .scenario
            .npcs
            .iter()
            .map(|spec| Npc::from_spec(spec, &self.config))
            .collect();
    }

    /// Horizontally centered in the start section, `tiles_from_bottom` tiles
    /// above its bottom edge.
    pub fn start_position(&self) -> (f32, f32) {
        let tile = self.config.scaled_tile();
        let size = self.config.player_extent();
        let (map_w, _) = self.overworld.scaled_size();
        let start = &self.scenario.start;
        let Some(section) = self
            .overworld
            .sections()
            .iter()
            .find(|section| section.id == start.section)
        else {
            return (0.0, 0.0);
        };
        let bottom = (section.row_offset + section.size().height) as f32 * tile;
        let x = map_w / 2.0 - size / 2.0;
        let y = bottom - size - start.tiles_from_bottom as f32 * tile;
        (x.max(0.0), y.max(0.0))
    }

    pub fn current_map(&self) -> &TileMap {
        self.transition.current_map(&self.overworld)
    }

    pub fn current_map_id(&self) -> &str {
        self.current_map().id()
    }

    /// Boxes of visible NPCs on the current map.
    pub fn obstacles(&self) -> Vec<Rect> {
        let map = self.current_map_id();
        self.npcs
            .iter()
            .filter(|npc| npc.map == map)
            .filter_map(Npc::collision_rect)
            .collect()
    }

    pub fn npcs_on_current_map(&self) -> impl Iterator<Item = &Npc> + '_ {
        let map = self.current_map_id();
        self.npcs.iter().filter(move |npc| npc.visible && npc.map == map)
    }

    pub fn npc_mut(&mut self, id: &str) -> Option<&mut Npc> {
        self.npcs.iter_mut().find(|npc| npc.id == id)
    }
}
