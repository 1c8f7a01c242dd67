//! Registry of timed visual effects.
//!
//! Each entry has an elapsed/duration pair and is advanced by the frame
//! delta. Entries are dropped as soon as they complete, so a caller holding
//! an [`AnimationId`] only needs [`AnimationSystem::is_active`] to know when
//! to move on.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Scripted animation attached to a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum SkillAnimation {
    Fire,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlameSize {
    Small,
    Big,
}

/// Three flames hopping between fixed points around a target, each growing
/// from small to big before moving on.
#[derive(Clone, Debug, PartialEq)]
pub struct FireAnimation {
    positions: [(f32, f32); 3],
    index: usize,
    size: FlameSize,
    frame_elapsed_ms: u64,
    frame_ms: u64,
}

impl FireAnimation {
    pub fn new(target: (f32, f32), spread: f32, frame_ms: u64) -> Self {
        let (x, y) = target;
        Self {
            positions: [(x - spread, y), (x + spread, y), (x, y)],
            index: 0,
            size: FlameSize::Small,
            frame_elapsed_ms: 0,
            frame_ms: frame_ms.max(1),
        }
    }

    fn advance(&mut self, dt_ms: u64) {
        self.frame_elapsed_ms += dt_ms;
        while self.frame_elapsed_ms >= self.frame_ms {
            self.frame_elapsed_ms -= self.frame_ms;
            match self.size {
                FlameSize::Small => self.size = FlameSize::Big,
                FlameSize::Big => {
                    self.size = FlameSize::Small;
                    self.index = (self.index + 1) % self.positions.len();
                }
            }
        }
    }

    pub fn position(&self) -> (f32, f32) {
        self.positions[self.index]
    }

    pub fn size(&self) -> FlameSize {
        self.size
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AnimationEffect {
    Fire(FireAnimation),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimedAnimation {
    pub id: AnimationId,
    pub elapsed_ms: u64,
    pub duration_ms: u64,
    pub effect: AnimationEffect,
}

impl TimedAnimation {
    /// Advances the animation; `false` once it has run its full duration.
    fn update(&mut self, dt_ms: u64) -> bool {
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        match &mut self.effect {
            AnimationEffect::Fire(fire) => fire.advance(dt_ms),
        }
        self.elapsed_ms < self.duration_ms
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationSystem {
    next_id: u64,
    active: Vec<TimedAnimation>,
}

impl AnimationSystem {
    pub fn spawn(&mut self, effect: AnimationEffect, duration_ms: u64) -> AnimationId {
        let id = AnimationId(self.next_id);
        self.next_id += 1;
        self.active.push(TimedAnimation {
            id,
            elapsed_ms: 0,
            duration_ms,
            effect,
        });
        id
    }

    pub fn spawn_skill(
        &mut self,
        skill: SkillAnimation,
        target: (f32, f32),
        spread: f32,
        frame_ms: u64,
        duration_ms: u64,
    ) -> AnimationId {
        let effect = match skill {
            SkillAnimation::Fire => AnimationEffect::Fire(FireAnimation::new(target, spread, frame_ms)),
        };
        self.spawn(effect, duration_ms)
    }

    pub fn update(&mut self, dt_ms: u64) {
        self.active.retain_mut(|animation| animation.update(dt_ms));
    }

    pub fn is_active(&self, id: AnimationId) -> bool {
        self.active.iter().any(|animation| animation.id == id)
    }

    pub fn get(&self, id: AnimationId) -> Option<&TimedAnimation> {
        self.active.iter().find(|animation| animation.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimedAnimation> {
        self.active.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}
