use crate::collision::{can_move, Rect};
use crate::config::GameConfig;
use crate::input::HeldKeys;
use crate::map::TileMap;
use crate::state::Player;

/// Walking animation phase. Frame 0 is the standing pose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalkCycle {
    pub frame: u8,
    pub elapsed_ms: u64,
}

impl WalkCycle {
    pub fn update(&mut self, moving: bool, dt_ms: u64, frame_ms: u64, frames: u8) {
        if !moving {
            *self = Self::default();
            return;
        }
        self.elapsed_ms += dt_ms;
        while self.elapsed_ms >= frame_ms.max(1) {
            self.elapsed_ms -= frame_ms.max(1);
            self.frame = (self.frame + 1) % frames.max(1);
        }
    }
}

/// Attempts one single-axis step for the held direction with the highest
/// priority. Facing follows the key even when the step is refused.
///
/// Returns whether the player actually changed position.
pub fn handle_input(
    player: &mut Player,
    keys: &HeldKeys,
    map: &TileMap,
    obstacles: &[Rect],
    dt_ms: u64,
    config: &GameConfig,
) -> bool {
    let moved = match keys.primary_direction() {
        Some(direction) => {
            player.facing = direction;
            let (dx, dy) = direction.delta();
            let step = config.step_distance();
            let (new_x, new_y) = (player.x + dx * step, player.y + dy * step);
            let actor = player.rect();
            if can_move(&actor, new_x, new_y, config.margin(), map, obstacles.iter().copied()) {
                let (map_w, map_h) = map.scaled_size();
                let (old_x, old_y) = (player.x, player.y);
                player.x = new_x.clamp(0.0, (map_w - player.width).max(0.0));
                player.y = new_y.clamp(0.0, (map_h - player.height).max(0.0));
                old_x != player.x || old_y != player.y
            } else {
                false
            }
        }
        None => false,
    };
    player
        .walk
        .update(moved, dt_ms, config.walk_frame_ms, config.walk_frames);
    moved
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tui_map::core::{LayerStack, MapSize, TileLayer};
    use tui_map::render::Tileset;

    use super::*;
    use crate::creature::{Creature, ElementType};
    use crate::state::Direction;

    fn field(blocked: &[(u16, u16)]) -> TileMap {
        let size = MapSize::new(8, 8);
        let mut background = TileLayer::empty("background", size);
        let mut obstacles = TileLayer::empty("obstacles", size);
        for row in 0..8 {
            for col in 0..8 {
                background.set(col, row, 1);
            }
        }
        for (col, row) in blocked {
            obstacles.set(*col, *row, 10);
        }
        let stack = LayerStack::new("field", vec![background, obstacles]).expect("stack");
        TileMap::single("field", Arc::new(stack), Vec::new(), &Tileset::builder().build(), 48.0)
    }

    fn player_at(x: f32, y: f32) -> Player {
        let creature = Creature {
            name: "Charmander".into(),
            element: ElementType::Fire,
            max_hp: 20,
            hp: 20,
            display_hp: 20.0,
            moves: Vec::new(),
        };
        Player::new(x, y, &GameConfig::default(), creature)
    }

    #[test]
    fn up_wins_over_left() {
        let map = field(&[]);
        let mut player = player_at(150.0, 150.0);
        let keys = HeldKeys {
            up: true,
            left: true,
            ..HeldKeys::default()
        };
        assert!(handle_input(&mut player, &keys, &map, &[], 16, &GameConfig::default()));
        assert_eq!((player.x, player.y), (150.0, 147.0));
        assert_eq!(player.facing, Direction::Up);
    }

    #[test]
    fn blocked_step_still_turns() {
        // After the step the bottom-right probe lands at (195, 162), inside tile (4, 3).
        let map = field(&[(4, 3)]);
        let mut player = player_at(150.0, 120.0);
        let keys = HeldKeys::only(Direction::Right);
        assert!(!handle_input(&mut player, &keys, &map, &[], 16, &GameConfig::default()));
        assert_eq!(player.x, 150.0);
        assert_eq!(player.facing, Direction::Right);
    }

    #[test]
    fn position_is_clamped_to_map() {
        let map = field(&[]);
        let config = GameConfig::default();
        // The inset corners are still on the map, but the box would poke out.
        let mut player = player_at(1.0, 100.0);
        assert!(handle_input(&mut player, &HeldKeys::only(Direction::Left), &map, &[], 16, &config));
        assert_eq!(player.x, 0.0);
        assert!(!handle_input(&mut player, &HeldKeys::only(Direction::Left), &map, &[], 16, &config));
    }

    #[test]
    fn walk_cycle_advances_only_while_moving() {
        let map = field(&[]);
        let config = GameConfig::default();
        let mut player = player_at(150.0, 150.0);
        let keys = HeldKeys::only(Direction::Down);
        for _ in 0..13 {
            handle_input(&mut player, &keys, &map, &[], 16, &config);
        }
        assert_eq!(player.walk.frame, 1);
        handle_input(&mut player, &HeldKeys::default(), &map, &[], 16, &config);
        assert_eq!(player.walk, WalkCycle::default());
    }

    #[test]
    fn walk_cycle_wraps_after_three_frames() {
        let mut walk = WalkCycle::default();
        walk.update(true, 600, 200, 3);
        assert_eq!(walk.frame, 0);
        walk.update(true, 200, 200, 3);
        assert_eq!(walk.frame, 1);
    }
}
