use crate::map::TileMap;

/// Axis-aligned box in scaled pixel space, origin at the top-left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Touching edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn moved_to(&self, x: f32, y: f32) -> Rect {
        Rect { x, y, ..*self }
    }

    fn distance_sq(&self, other: &Rect) -> f32 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).powi(2) + (ay - by).powi(2)
    }
}

/// All four corners of `rect`, inset by `margin`, sit on walkable tiles.
pub fn corners_walkable(rect: &Rect, margin: f32, map: &TileMap) -> bool {
    let left = rect.x + margin;
    let right = rect.x + rect.w - margin;
    let top = rect.y + margin;
    let bottom = rect.y + rect.h - margin;
    [(left, top), (right, top), (left, bottom), (right, bottom)]
        .into_iter()
        .all(|(x, y)| map.is_walkable(x, y))
}

/// Decides whether `actor` may move its top-left corner to `(new_x, new_y)`.
///
/// The map must accept the inset corners. Against `others`, a new overlap is
/// refused, while an actor already stuck inside another box may only move
/// strictly further away from it.
pub fn can_move<I>(actor: &Rect, new_x: f32, new_y: f32, margin: f32, map: &TileMap, others: I) -> bool
where
    I: IntoIterator<Item = Rect>,
{
    let moved = actor.moved_to(new_x, new_y);
    if !corners_walkable(&moved, margin, map) {
        return false;
    }
    others.into_iter().all(|other| {
        if !moved.overlaps(&other) {
            return true;
        }
        actor.overlaps(&other) && moved.distance_sq(&other) > actor.distance_sq(&other)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tui_map::core::{LayerStack, MapSize, TileLayer};
    use tui_map::render::Tileset;

    use super::*;

    fn open_map() -> TileMap {
        let size = MapSize::new(6, 6);
        let mut background = TileLayer::empty("background", size);
        let mut obstacles = TileLayer::empty("obstacles", size);
        for row in 0..6 {
            for col in 0..6 {
                background.set(col, row, 1);
            }
        }
        obstacles.set(3, 0, 10);
        let stack = LayerStack::new("open", vec![background, obstacles]).expect("stack");
        TileMap::single("open", Arc::new(stack), Vec::new(), &Tileset::builder().build(), 48.0)
    }

    #[test]
    fn overlap_is_strict() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(!a.overlaps(&Rect::new(10.0, 0.0, 10.0, 10.0)));
        assert!(a.overlaps(&Rect::new(9.5, 9.5, 10.0, 10.0)));
    }

    #[test]
    fn margin_lets_body_hang_over_blocked_tile() {
        let map = open_map();
        // Right edge at 150 pokes 6px into the blocked tile at col 3 (x 144..192).
        let actor = Rect::new(90.0, 0.0, 60.0, 60.0);
        assert!(can_move(&actor, 90.0, 0.0, 18.0, &map, []));
        assert!(!can_move(&actor, 90.0, 0.0, 0.0, &map, []));
    }

    #[test]
    fn leaving_the_map_is_blocked() {
        let map = open_map();
        let actor = Rect::new(0.0, 100.0, 60.0, 60.0);
        assert!(!can_move(&actor, -20.0, 100.0, 18.0, &map, []));
    }

    #[test]
    fn new_overlap_with_npc_is_refused() {
        let map = open_map();
        let actor = Rect::new(0.0, 100.0, 60.0, 60.0);
        let npc = Rect::new(62.0, 100.0, 48.0, 48.0);
        assert!(can_move(&actor, 1.0, 100.0, 18.0, &map, [npc]));
        assert!(!can_move(&actor, 3.0, 100.0, 18.0, &map, [npc]));
    }

    #[test]
    fn stuck_actor_can_only_back_away() {
        let map = open_map();
        let npc = Rect::new(100.0, 100.0, 48.0, 48.0);
        let actor = Rect::new(80.0, 100.0, 60.0, 60.0);
        assert!(actor.overlaps(&npc));
        assert!(can_move(&actor, 77.0, 100.0, 18.0, &map, [npc]));
        assert!(!can_move(&actor, 83.0, 100.0, 18.0, &map, [npc]));
    }
}
