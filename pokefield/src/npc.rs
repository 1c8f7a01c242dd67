use crate::collision::Rect;
use crate::config::GameConfig;
use crate::scenario::NpcSpec;
use crate::state::Direction;

/// A character standing on, or walking around, one map.
#[derive(Clone, Debug, PartialEq)]
pub struct Npc {
    pub id: String,
    pub name: String,
    pub map: String,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub facing: Direction,
    pub lines: Vec<String>,
    pub visible: bool,
    pub patrol: Patrol,
}

/// Waypoint loop in pixel space; empty for NPCs that stand still.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Patrol {
    pub waypoints: Vec<(f32, f32)>,
    pub target: usize,
}

impl Npc {
    /// Places the NPC so its box is centered on its tile.
    pub fn from_spec(spec: &NpcSpec, config: &GameConfig) -> Self {
        let tile = config.scaled_tile();
        let size = config.npc_extent();
        let place = |(col, row): (u16, u16)| {
            (
                col as f32 * tile + (tile - size) / 2.0,
                row as f32 * tile + (tile - size) / 2.0,
            )
        };
        let (x, y) = place(spec.tile);
        Self {
            id: spec.id.clone(),
            name: spec.name.clone(),
            map: spec.map.clone(),
            x,
            y,
            w: size,
            h: size,
            facing: spec.facing,
            lines: spec.lines.clone(),
            visible: spec.visible,
            patrol: Patrol {
                waypoints: spec.patrol.iter().copied().map(place).collect(),
                target: 0,
            },
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    /// Invisible NPCs take no part in collision.
    pub fn collision_rect(&self) -> Option<Rect> {
        self.visible.then(|| self.rect())
    }

    /// Walks toward the current waypoint, one axis at a time. Stops short
    /// when the step would overlap `blocker` (normally the player).
    pub fn step_patrol(&mut self, speed: f32, blocker: Option<&Rect>) -> bool {
        if !self.visible || self.patrol.waypoints.is_empty() {
            return false;
        }
        let (tx, ty) = self.patrol.waypoints[self.patrol.target];
        let (dx, dy) = (tx - self.x, ty - self.y);
        if dx == 0.0 && dy == 0.0 {
            self.patrol.target = (self.patrol.target + 1) % self.patrol.waypoints.len();
            return false;
        }

        let (next_x, next_y, facing) = if dx != 0.0 {
            let step = dx.abs().min(speed).copysign(dx);
            let facing = if dx > 0.0 { Direction::Right } else { Direction::Left };
            (self.x + step, self.y, facing)
        } else {
            let step = dy.abs().min(speed).copysign(dy);
            let facing = if dy > 0.0 { Direction::Down } else { Direction::Up };
            (self.x, self.y + step, facing)
        };
        self.facing = facing;
        if blocker.is_some_and(|other| self.rect().moved_to(next_x, next_y).overlaps(other)) {
            return false;
        }
        self.x = next_x;
        self.y = next_y;
        true
    }
}

/// First visible NPC on `map` whose box contains `point`.
pub fn npc_at<'a>(npcs: &'a [Npc], map: &str, point: (f32, f32)) -> Option<&'a Npc> {
    let (px, py) = point;
    npcs.iter().find(|npc| {
        npc.visible
            && npc.map == map
            && px >= npc.x
            && px < npc.x + npc.w
            && py >= npc.y
            && py < npc.y + npc.h
    })
}

/// The NPC one tile ahead of `center` in `facing`.
pub fn npc_in_front<'a>(
    npcs: &'a [Npc],
    map: &str,
    center: (f32, f32),
    facing: Direction,
    tile: f32,
) -> Option<&'a Npc> {
    let (dx, dy) = facing.delta();
    npc_at(npcs, map, (center.0 + dx * tile, center.1 + dy * tile))
}
