//! Turn-based battle against one wild creature.
//!
//! The session moves between four phases:
//!
//! - `Command`: the 2x2 menu (Fight, Bag, Party, Run).
//! - `MoveSelect`: the player's move list.
//! - `Message`: a typewriter line, optionally carrying damage that lands once
//!   the line is fully shown.
//! - `Animation`: a skill animation; the line is shown in full and the damage
//!   waits for the animation to finish.
//!
//! After a message is revealed and the post-message wait has passed, control
//! goes back to the player's menu or to the enemy, depending on whose turn it
//! is. A set `ending` stops that hand-off; the session then reports its
//! outcome once the end wait has passed.

use tracing::debug;

use crate::animation::{AnimationId, AnimationSystem};
use crate::config::GameConfig;
use crate::creature::Creature;
use crate::state::{Dice, Direction};
use crate::text::Typewriter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Player,
    Enemy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingDamage {
    pub target: Side,
    pub amount: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BattlePhase {
    Command,
    MoveSelect,
    Message { pending: Option<PendingDamage> },
    Animation { handle: AnimationId, pending: PendingDamage },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BattleOutcome {
    Victory,
    Defeat,
    Fled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BattleCommand {
    Fight,
    Bag,
    Party,
    Run,
}

impl BattleCommand {
    /// Grid order: top row then bottom row.
    pub const ALL: [BattleCommand; 4] = [
        BattleCommand::Fight,
        BattleCommand::Bag,
        BattleCommand::Party,
        BattleCommand::Run,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BattleCommand::Fight => "FIGHT",
            BattleCommand::Bag => "BAG",
            BattleCommand::Party => "PARTY",
            BattleCommand::Run => "RUN",
        }
    }
}

/// Pacing and placement values lifted from [`GameConfig`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BattleTiming {
    pub message_char_ms: u64,
    pub message_wait_ms: u64,
    pub end_wait_ms: u64,
    pub hp_ratio: f32,
    pub hp_min_step: f32,
    pub skill_ms: u64,
    pub fire_frame_ms: u64,
    pub fire_offset: f32,
    /// Where the enemy sprite sits in battle-screen pixels.
    pub enemy_anchor: (f32, f32),
}

impl BattleTiming {
    pub fn from_config(config: &GameConfig) -> Self {
        let (width, height) = config.viewport();
        Self {
            message_char_ms: config.message_char_ms,
            message_wait_ms: config.message_wait_ms,
            end_wait_ms: config.battle_end_wait_ms,
            hp_ratio: config.hp_animation_ratio,
            hp_min_step: config.hp_animation_min_step,
            skill_ms: config.skill_animation_ms,
            fire_frame_ms: config.fire_frame_ms,
            fire_offset: config.fire_offset(),
            enemy_anchor: (width * 0.72, height * 0.28),
        }
    }
}

/// What one tick produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BattleTick {
    pub finished: Option<BattleOutcome>,
    pub damage_landed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BattleSession {
    pub wild: Creature,
    pub phase: BattlePhase,
    pub turn: Side,
    pub message: Typewriter,
    pub command_cursor: usize,
    pub move_cursor: usize,
    pub ending: Option<BattleOutcome>,
    /// Time since the current message was posted.
    pub message_elapsed_ms: u64,
    pub timing: BattleTiming,
}

impl BattleSession {
    pub fn start(wild: Creature, player: &mut Creature, timing: BattleTiming) -> Self {
        player.sync_display();
        let text = format!("A wild {} appeared!", wild.name);
        Self {
            wild,
            phase: BattlePhase::Message { pending: None },
            turn: Side::Player,
            message: Typewriter::new(text, timing.message_char_ms),
            command_cursor: 0,
            move_cursor: 0,
            ending: None,
            message_elapsed_ms: 0,
            timing,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.ending.is_some()
    }

    pub fn accepts_input(&self) -> bool {
        matches!(self.phase, BattlePhase::Command | BattlePhase::MoveSelect)
    }

    fn announce(&mut self, text: String) {
        debug!(message = %text, "battle message");
        self.message = Typewriter::new(text, self.timing.message_char_ms);
        self.message_elapsed_ms = 0;
    }

    /// Moves the command cursor inside the 2x2 grid or the move cursor
    /// through the move list.
    pub fn navigate(&mut self, direction: Direction, move_count: usize) -> bool {
        let before = (self.command_cursor, self.move_cursor);
        match self.phase {
            BattlePhase::Command => {
                let cursor = self.command_cursor;
                self.command_cursor = match direction {
                    Direction::Left if cursor % 2 == 1 => cursor - 1,
                    Direction::Right if cursor % 2 == 0 => cursor + 1,
                    Direction::Up if cursor >= 2 => cursor - 2,
                    Direction::Down if cursor < 2 => cursor + 2,
                    _ => cursor,
                };
            }
            BattlePhase::MoveSelect => match direction {
                Direction::Up => self.move_cursor = self.move_cursor.saturating_sub(1),
                Direction::Down if self.move_cursor + 1 < move_count => self.move_cursor += 1,
                _ => {}
            },
            _ => {}
        }
        before != (self.command_cursor, self.move_cursor)
    }

    /// Enter on the menu or on a move.
    pub fn confirm(&mut self, player: &mut Creature, animations: &mut AnimationSystem) -> bool {
        match self.phase {
            BattlePhase::Command => match BattleCommand::ALL[self.command_cursor] {
                BattleCommand::Fight => {
                    self.phase = BattlePhase::MoveSelect;
                    self.move_cursor = self.move_cursor.min(player.moves.len().saturating_sub(1));
                    true
                }
                BattleCommand::Run => {
                    self.flee();
                    true
                }
                BattleCommand::Bag | BattleCommand::Party => false,
            },
            BattlePhase::MoveSelect => self.choose_move(self.move_cursor, player, animations),
            _ => false,
        }
    }

    /// Escape from the move list back to the menu.
    pub fn cancel(&mut self) -> bool {
        if self.phase == BattlePhase::MoveSelect {
            self.phase = BattlePhase::Command;
            return true;
        }
        false
    }

    pub fn flee(&mut self) {
        self.announce("Got away safely!".to_string());
        self.phase = BattlePhase::Message { pending: None };
        self.ending = Some(BattleOutcome::Fled);
    }

    /// Uses the player's move at `index`. PP is spent here; damage is only
    /// staged. Without PP the player keeps the turn.
    pub fn choose_move(&mut self, index: usize, player: &mut Creature, animations: &mut AnimationSystem) -> bool {
        let Some(mv) = player.moves.get_mut(index) else {
            return false;
        };
        if !mv.consume_pp() {
            let text = format!("No PP left for {}!", mv.name);
            self.announce(text);
            self.phase = BattlePhase::Message { pending: None };
            return true;
        }

        let pending = PendingDamage {
            target: Side::Enemy,
            amount: mv.power,
        };
        let animation = mv.animation;
        let text = format!("{} used {}!", player.name, mv.name);
        self.announce(text);
        self.phase = match animation {
            Some(skill) => {
                let timing = self.timing;
                let handle = animations.spawn_skill(
                    skill,
                    timing.enemy_anchor,
                    timing.fire_offset,
                    timing.fire_frame_ms,
                    timing.skill_ms,
                );
                BattlePhase::Animation { handle, pending }
            }
            None => BattlePhase::Message {
                pending: Some(pending),
            },
        };
        self.turn = Side::Enemy;
        true
    }

    /// Advances the session by `dt_ms`. The animation registry must already
    /// have been advanced for this frame.
    pub fn tick(
        &mut self,
        player: &mut Creature,
        animations: &AnimationSystem,
        dice: &mut Dice,
        dt_ms: u64,
    ) -> BattleTick {
        let mut result = BattleTick::default();
        self.message_elapsed_ms = self.message_elapsed_ms.saturating_add(dt_ms);

        match self.phase {
            BattlePhase::Animation { handle, pending } => {
                self.message.reveal_all();
                if !animations.is_active(handle) {
                    self.phase = BattlePhase::Message {
                        pending: Some(pending),
                    };
                    self.message_elapsed_ms = 0;
                }
            }
            BattlePhase::Message { pending } => {
                self.message.advance(dt_ms);
                if self.message.is_revealed() {
                    if let Some(damage) = pending {
                        self.phase = BattlePhase::Message { pending: None };
                        result.damage_landed = self.apply_damage(damage, player);
                    }
                    if self.ending.is_none() && self.message_elapsed_ms >= self.timing.message_wait_ms {
                        match self.turn {
                            Side::Player => self.phase = BattlePhase::Command,
                            Side::Enemy => self.enemy_turn(dice),
                        }
                    }
                }
            }
            BattlePhase::Command | BattlePhase::MoveSelect => {}
        }

        if let Some(outcome) = self.ending {
            if self.message.is_revealed() && self.message_elapsed_ms >= self.timing.end_wait_ms {
                result.finished = Some(outcome);
            }
        }

        let (ratio, min_step) = (self.timing.hp_ratio, self.timing.hp_min_step);
        player.tick_display_hp(ratio, min_step);
        self.wild.tick_display_hp(ratio, min_step);
        result
    }

    fn apply_damage(&mut self, damage: PendingDamage, player: &mut Creature) -> bool {
        let dealt = match damage.target {
            Side::Enemy => self.wild.apply_damage(damage.amount),
            Side::Player => player.apply_damage(damage.amount),
        };
        if damage.target == Side::Player && player.is_fainted() {
            self.announce(format!("{} fainted!", player.name));
            self.ending = Some(BattleOutcome::Defeat);
        }
        dealt > 0
    }

    fn enemy_turn(&mut self, dice: &mut Dice) {
        if self.wild.is_fainted() {
            self.announce(format!("Wild {} fainted!", self.wild.name));
            self.ending = Some(BattleOutcome::Victory);
            return;
        }

        let usable: Vec<usize> = self.wild.usable_moves().map(|(index, _)| index).collect();
        self.turn = Side::Player;
        if usable.is_empty() {
            self.phase = BattlePhase::Command;
            return;
        }
        let index = usable[dice.below(usable.len())];
        let mv = &mut self.wild.moves[index];
        mv.consume_pp();
        let pending = PendingDamage {
            target: Side::Player,
            amount: mv.power,
        };
        let text = format!("Wild {} used {}!", self.wild.name, mv.name);
        self.announce(text);
        self.phase = BattlePhase::Message {
            pending: Some(pending),
        };
    }
}
