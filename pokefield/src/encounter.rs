use crate::config::GameConfig;
use crate::creature::Creature;
use crate::scenario::CreatureSpec;
use crate::state::Dice;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncounterTracker {
    pub steps_since_last: u32,
}

impl EncounterTracker {
    /// Counts one successful step and decides whether it starts a battle.
    /// `roll` yields a value in `[0, 1)` and is only consulted on grass once
    /// enough steps have been taken.
    pub fn record_step(&mut self, on_grass: bool, config: &GameConfig, roll: impl FnOnce() -> f64) -> bool {
        self.steps_since_last = self.steps_since_last.saturating_add(1);
        if !on_grass || self.steps_since_last < config.steps_before_encounter {
            return false;
        }
        if roll() < config.encounter_rate {
            self.steps_since_last = 0;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.steps_since_last = 0;
    }
}

/// A fresh copy of a uniformly chosen roster entry.
pub fn pick_wild(roster: &[CreatureSpec], dice: &mut Dice) -> Option<Creature> {
    if roster.is_empty() {
        return None;
    }
    let index = dice.below(roster.len());
    Some(Creature::from_spec(&roster[index]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::ElementType;

    #[test]
    fn off_grass_never_rolls() {
        let config = GameConfig::default();
        let mut tracker = EncounterTracker::default();
        for _ in 0..50 {
            assert!(!tracker.record_step(false, &config, || panic!("rolled off grass")));
        }
        assert_eq!(tracker.steps_since_last, 50);
    }

    #[test]
    fn grass_rolls_only_after_enough_steps() {
        let config = GameConfig::default();
        let mut tracker = EncounterTracker::default();
        for _ in 0..9 {
            assert!(!tracker.record_step(true, &config, || panic!("rolled too early")));
        }
        assert!(!tracker.record_step(true, &config, || 0.5));
        assert_eq!(tracker.steps_since_last, 10);
        assert!(tracker.record_step(true, &config, || 0.01));
        assert_eq!(tracker.steps_since_last, 0);
    }

    #[test]
    fn wild_creature_is_a_fresh_copy() {
        let roster = vec![CreatureSpec {
            name: "Eevee".into(),
            element: ElementType::Normal,
            max_hp: 17,
            moves: Vec::new(),
        }];
        let mut dice = Dice::new(7);
        let first = pick_wild(&roster, &mut dice).expect("creature");
        assert_eq!(first.hp, 17);
        assert_eq!(pick_wild(&[], &mut dice), None);
    }
}
