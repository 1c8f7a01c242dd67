use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::animation::SkillAnimation;
use crate::scenario::{CreatureSpec, MoveSpec};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ElementType {
    Normal,
    Fire,
    Water,
    Grass,
    Electric,
}

impl ElementType {
    pub fn label(self) -> &'static str {
        match self {
            ElementType::Normal => "NORMAL",
            ElementType::Fire => "FIRE",
            ElementType::Water => "WATER",
            ElementType::Grass => "GRASS",
            ElementType::Electric => "ELECTRIC",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Move {
    pub name: String,
    pub power: u16,
    pub element: ElementType,
    pub pp: u8,
    pub max_pp: u8,
    #[serde(default)]
    pub animation: Option<SkillAnimation>,
}

impl Move {
    pub fn from_spec(spec: &MoveSpec, owner: ElementType) -> Self {
        Self {
            name: spec.name.clone(),
            power: spec.power,
            element: spec.element.unwrap_or(owner),
            pp: spec.max_pp,
            max_pp: spec.max_pp,
            animation: spec.animation,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.pp > 0
    }

    /// Spends one PP. A move at 0 PP is left untouched and reports `false`.
    pub fn consume_pp(&mut self) -> bool {
        if self.pp == 0 {
            return false;
        }
        self.pp -= 1;
        true
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Creature {
    pub name: String,
    pub element: ElementType,
    pub max_hp: u16,
    pub hp: u16,
    /// Smoothed value for the HP bar; trails `hp` from above.
    pub display_hp: f32,
    pub moves: Vec<Move>,
}

impl Creature {
    pub fn from_spec(spec: &CreatureSpec) -> Self {
        Self {
            name: spec.name.clone(),
            element: spec.element,
            max_hp: spec.max_hp,
            hp: spec.max_hp,
            display_hp: spec.max_hp as f32,
            moves: spec
                .moves
                .iter()
                .map(|mv| Move::from_spec(mv, spec.element))
                .collect(),
        }
    }

    /// Subtracts `amount` from HP, stopping at zero. Returns the HP actually lost.
    pub fn apply_damage(&mut self, amount: u16) -> u16 {
        let dealt = amount.min(self.hp);
        self.hp -= dealt;
        dealt
    }

    pub fn is_fainted(&self) -> bool {
        self.hp == 0
    }

    pub fn restore_full(&mut self) {
        self.hp = self.max_hp;
        self.display_hp = self.max_hp as f32;
    }

    pub fn sync_display(&mut self) {
        self.display_hp = self.hp as f32;
    }

    /// Moves the displayed HP one step toward the real value:
    /// `max(gap * ratio, min_step)`, never dropping below `hp`.
    pub fn tick_display_hp(&mut self, ratio: f32, min_step: f32) -> bool {
        let target = self.hp as f32;
        if self.display_hp <= target {
            let changed = self.display_hp != target;
            self.display_hp = target;
            return changed;
        }
        let gap = self.display_hp - target;
        let step = (gap * ratio).max(min_step);
        self.display_hp = (self.display_hp - step).max(target);
        true
    }

    pub fn usable_moves(&self) -> impl Iterator<Item = (usize, &Move)> + '_ {
        self.moves.iter().enumerate().filter(|(_, mv)| mv.is_usable())
    }

    pub fn has_usable_move(&self) -> bool {
        self.moves.iter().any(Move::is_usable)
    }
}
