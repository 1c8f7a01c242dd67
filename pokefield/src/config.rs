use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Gameplay and timing constants. Built once at startup and passed by value
/// into everything that needs it; nothing reads a global.
///
/// Sizes are authored in unscaled pixels and multiplied by `scale`; all
/// durations are milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GameConfig {
    pub scale: u32,
    pub tile_size: u32,
    pub screen_width: u32,
    pub screen_height: u32,
    pub fps: u32,

    // Field
    pub player_size: u32,
    pub player_speed: u32,
    pub collision_margin: u32,
    pub npc_size: u32,
    pub walk_frame_ms: u64,
    pub walk_frames: u8,
    pub key_hold_ms: u64,

    // Encounters
    pub encounter_rate: f64,
    pub steps_before_encounter: u32,

    // Battle pacing
    pub message_char_ms: u64,
    pub message_wait_ms: u64,
    pub battle_end_wait_ms: u64,
    pub hp_animation_ratio: f32,
    pub hp_animation_min_step: f32,
    pub skill_animation_ms: u64,
    pub fire_frame_ms: u64,
    pub fire_spread: u32,

    pub dialogue_char_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            scale: 3,
            tile_size: 16,
            screen_width: 160,
            screen_height: 144,
            fps: 60,
            player_size: 20,
            player_speed: 1,
            collision_margin: 6,
            npc_size: 16,
            walk_frame_ms: 200,
            walk_frames: 3,
            key_hold_ms: 150,
            encounter_rate: 0.03,
            steps_before_encounter: 10,
            message_char_ms: 50,
            message_wait_ms: 2000,
            battle_end_wait_ms: 4000,
            hp_animation_ratio: 0.05,
            hp_animation_min_step: 0.1,
            skill_animation_ms: 1500,
            fire_frame_ms: 100,
            fire_spread: 20,
            dialogue_char_ms: 50,
        }
    }
}

impl GameConfig {
    /// Reads a partial override file; missing fields keep their defaults.
    pub fn from_ron_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: GameConfig = ron::de::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            details: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scale == 0 || self.tile_size == 0 {
            return Err(ConfigError::Invalid("scale and tile_size must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.encounter_rate) {
            return Err(ConfigError::Invalid(format!(
                "encounter_rate {} is outside 0..=1",
                self.encounter_rate
            )));
        }
        if self.walk_frames == 0 || self.fps == 0 {
            return Err(ConfigError::Invalid("walk_frames and fps must be positive".into()));
        }
        Ok(())
    }

    pub fn scaled_tile(&self) -> f32 {
        (self.tile_size * self.scale) as f32
    }

    pub fn player_extent(&self) -> f32 {
        (self.player_size * self.scale) as f32
    }

    pub fn npc_extent(&self) -> f32 {
        (self.npc_size * self.scale) as f32
    }

    pub fn step_distance(&self) -> f32 {
        (self.player_speed * self.scale) as f32
    }

    pub fn margin(&self) -> f32 {
        (self.collision_margin * self.scale) as f32
    }

    pub fn fire_offset(&self) -> f32 {
        (self.fire_spread * self.scale) as f32
    }

    pub fn viewport(&self) -> (f32, f32) {
        (
            (self.screen_width * self.scale) as f32,
            (self.screen_height * self.scale) as f32,
        )
    }

    pub fn frame_ms(&self) -> u64 {
        1000 / self.fps.max(1) as u64
    }
}
