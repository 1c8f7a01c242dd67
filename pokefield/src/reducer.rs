use tracing::{info, warn};
use tui_dispatch::DispatchResult;

use crate::action::Action;
use crate::battle::{BattleOutcome, BattlePhase, BattleSession, BattleTiming};
use crate::dialogue::DialogueAdvance;
use crate::effect::{Cue, Effect};
use crate::encounter::pick_wild;
use crate::input::HeldKeys;
use crate::movement::handle_input;
use crate::npc::npc_in_front;
use crate::scenario::WorldTrigger;
use crate::state::{AppState, Direction, GameMode};
use crate::transition::TransitionTarget;

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::Init => {
            state.reset_field();
            info!(
                map = state.current_map_id(),
                x = state.player.x,
                y = state.player.y,
                "field ready"
            );
            DispatchResult::changed()
        }
        Action::UiTerminalResize(width, height) => {
            if state.terminal_size != (width, height) {
                state.terminal_size = (width, height);
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }
        Action::Tick { dt_ms, keys } => tick(state, dt_ms, &keys),
        Action::Interact => interact(state),
        Action::BattleMenuUp => battle_navigate(state, Direction::Up),
        Action::BattleMenuDown => battle_navigate(state, Direction::Down),
        Action::BattleMenuLeft => battle_navigate(state, Direction::Left),
        Action::BattleMenuRight => battle_navigate(state, Direction::Right),
        Action::BattleConfirm => battle_confirm(state),
        Action::BattleCancel => battle_cancel(state),
        Action::UiToggleDebug => {
            state.show_debug = !state.show_debug;
            DispatchResult::changed()
        }
        Action::Quit => DispatchResult::unchanged(),
    }
}

fn tick(state: &mut AppState, dt_ms: u64, keys: &HeldKeys) -> DispatchResult<Effect> {
    state.clock_ms = state.clock_ms.saturating_add(dt_ms);
    state.animations.update(dt_ms);
    match state.mode {
        GameMode::Field => field_tick(state, dt_ms, keys),
        GameMode::Battle => battle_tick(state, dt_ms),
    }
}

fn field_tick(state: &mut AppState, dt_ms: u64, keys: &HeldKeys) -> DispatchResult<Effect> {
    // Dialogue is modal: the world holds still until it closes.
    if state.dialogue.is_active() {
        state.dialogue.update(dt_ms);
        state.player.walk = Default::default();
        return DispatchResult::changed();
    }

    step_patrols(state);

    let obstacles = state.obstacles();
    let map = state.transition.current_map(&state.overworld);
    let moved = handle_input(&mut state.player, keys, map, &obstacles, dt_ms, &state.config);
    if !moved {
        return DispatchResult::changed();
    }

    let center = state.player.center();
    if let Some(target) = state.transition.check_trigger(&state.overworld, center) {
        apply_transition(state, target);
        return DispatchResult::changed();
    }

    let on_grass = state.current_map().is_on_grassy(center.0, center.1);
    let dice = &mut state.dice;
    if state.encounter.record_step(on_grass, &state.config, || dice.next_f64()) {
        return start_battle(state);
    }
    DispatchResult::changed()
}

fn step_patrols(state: &mut AppState) {
    let speed = state.config.scale as f32;
    let player = state.player.rect();
    let current = state.transition.current_map(&state.overworld).id();
    for npc in &mut state.npcs {
        let blocker = (npc.map == current).then_some(&player);
        npc.step_patrol(speed, blocker);
    }
}

fn apply_transition(state: &mut AppState, target: TransitionTarget) {
    let result = state.transition.transition(
        target.clone(),
        &mut state.player,
        &state.scenario,
        &state.assets,
        &state.config,
    );
    match result {
        Ok(map_id) => {
            state.status = None;
            state.player.walk = Default::default();
            fire_first_visit_events(state, &map_id);
        }
        Err(err) => {
            warn!(?target, error = %err, "map transition failed");
            state.status = Some(format!("The way is blocked ({err})."));
        }
    }
}

/// Marks `map_id` as visited and runs the world events waiting for that.
fn fire_first_visit_events(state: &mut AppState, map_id: &str) {
    if !state.player.visited_maps.insert(map_id.to_string()) {
        return;
    }
    let pending: Vec<_> = state
        .scenario
        .events
        .iter()
        .filter(|event| match &event.trigger {
            WorldTrigger::FirstVisit { map } => map == map_id,
        })
        .filter(|event| !state.fired_events.contains(&event.id))
        .cloned()
        .collect();

    for event in pending {
        info!(event = %event.id, map = map_id, "world event fired");
        for id in &event.reveal {
            if let Some(npc) = state.npc_mut(id) {
                npc.visible = true;
            }
        }
        if let Some(speaker) = event.dialogue_from.as_deref() {
            if let Some(npc) = state.npcs.iter().find(|npc| npc.id == speaker) {
                let (name, lines) = (npc.name.clone(), npc.lines.clone());
                state.dialogue.start(Some(name), lines);
            }
        }
        state.fired_events.insert(event.id);
    }
}

fn start_battle(state: &mut AppState) -> DispatchResult<Effect> {
    let Some(wild) = pick_wild(&state.scenario.wild_roster, &mut state.dice) else {
        warn!("encounter rolled but the wild roster is empty");
        return DispatchResult::changed();
    };
    info!(wild = %wild.name, hp = wild.hp, "battle started");
    let timing = BattleTiming::from_config(&state.config);
    state.battle = Some(BattleSession::start(wild, &mut state.player.creature, timing));
    state.mode = GameMode::Battle;
    state.player.walk = Default::default();
    state.status = None;
    DispatchResult::changed_with(Effect::Cue(Cue::Encounter))
}

fn battle_tick(state: &mut AppState, dt_ms: u64) -> DispatchResult<Effect> {
    let Some(session) = state.battle.as_mut() else {
        warn!("battle mode without a session; returning to the field");
        state.mode = GameMode::Field;
        return DispatchResult::changed();
    };
    let result = session.tick(
        &mut state.player.creature,
        &state.animations,
        &mut state.dice,
        dt_ms,
    );
    if let Some(outcome) = result.finished {
        end_battle(state, outcome);
        return DispatchResult::changed();
    }
    if result.damage_landed {
        DispatchResult::changed_with(Effect::Cue(Cue::Hit))
    } else {
        DispatchResult::changed()
    }
}

fn end_battle(state: &mut AppState, outcome: BattleOutcome) {
    let creature = &mut state.player.creature;
    if creature.is_fainted() {
        creature.restore_full();
    }
    info!(?outcome, hp = creature.hp, "battle finished");
    state.status = Some(
        match outcome {
            BattleOutcome::Victory => "You won the battle!",
            BattleOutcome::Defeat => "Your partner was healed after the loss.",
            BattleOutcome::Fled => "You ran back to the path.",
        }
        .to_string(),
    );
    state.battle = None;
    state.animations.clear();
    state.mode = GameMode::Field;
}

fn interact(state: &mut AppState) -> DispatchResult<Effect> {
    if state.mode != GameMode::Field {
        return DispatchResult::unchanged();
    }
    if state.dialogue.is_active() {
        return match state.dialogue.advance() {
            DialogueAdvance::Ignored => DispatchResult::unchanged(),
            _ => DispatchResult::changed(),
        };
    }

    let map = state.current_map_id().to_string();
    let tile = state.config.scaled_tile();
    let (center, facing) = (state.player.center(), state.player.facing);
    let Some(id) = npc_in_front(&state.npcs, &map, center, facing, tile).map(|npc| npc.id.clone()) else {
        return DispatchResult::unchanged();
    };
    let Some(npc) = state.npc_mut(&id) else {
        return DispatchResult::unchanged();
    };
    npc.facing = facing.opposite();
    let (name, lines) = (npc.name.clone(), npc.lines.clone());
    state.dialogue.start(Some(name), lines);
    DispatchResult::changed()
}

fn battle_navigate(state: &mut AppState, direction: Direction) -> DispatchResult<Effect> {
    let move_count = state.player.creature.moves.len();
    let Some(session) = state.battle.as_mut() else {
        return DispatchResult::unchanged();
    };
    if session.navigate(direction, move_count) {
        DispatchResult::changed()
    } else {
        DispatchResult::unchanged()
    }
}

fn battle_confirm(state: &mut AppState) -> DispatchResult<Effect> {
    let Some(session) = state.battle.as_mut() else {
        return DispatchResult::unchanged();
    };
    if session.confirm(&mut state.player.creature, &mut state.animations) {
        DispatchResult::changed()
    } else {
        DispatchResult::unchanged()
    }
}

fn battle_cancel(state: &mut AppState) -> DispatchResult<Effect> {
    match state.battle.as_mut() {
        Some(session) if session.phase == BattlePhase::MoveSelect => {
            session.cancel();
            DispatchResult::changed()
        }
        _ => DispatchResult::unchanged(),
    }
}
