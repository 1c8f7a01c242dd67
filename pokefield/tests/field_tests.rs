//! Field flow through the store: doors, interiors, first-visit events.

use std::path::Path;

use pokefield::{
    action::Action,
    assets::{AssetStore, TileCatalog},
    config::GameConfig,
    effect::Effect,
    input::HeldKeys,
    reducer::reducer,
    scenario::{ScenarioManifest, OVERWORLD_ID},
    state::{AppState, Direction},
};
use pretty_assertions::assert_eq;
use tui_dispatch::EffectStore;

type Store = EffectStore<AppState, Action, Effect>;

const TILESET: &str = r#"(tiles: [
    (id: 2, symbol: '=', color: (196, 170, 118), texture: '.'),
    (id: 3, symbol: '_', color: (206, 190, 160), texture: '.'),
    (id: 13, symbol: 'W', color: (216, 214, 198), texture: '|'),
])"#;

const SCENARIO: &str = r#"(
    name: "field",
    tileset: "tileset.ron",
    overworld: [(id: "yard", map: "maps/yard.ron")],
    interiors: [
        (id: "lab", map: "maps/lab.ron", exits: [(4, 11), (5, 11)]),
        (id: "cave", map: "maps/cave.ron"),
    ],
    doors: [
        (section: "yard", x: 3, y: 2, target: "lab"),
        (section: "yard", x: 6, y: 2, target: "cave"),
    ],
    start: (section: "yard", tiles_from_bottom: 1),
    starter: (name: "Charmander", element: Fire, max_hp: 20, moves: [(name: "Scratch", power: 5)]),
    wild_roster: [(name: "Magikarp", element: Water, max_hp: 18, moves: [])],
    npcs: [
        (id: "professor", name: "Professor", map: "lab", tile: (5, 8), lines: ["Welcome!", "Take care out there."]),
        (id: "rival", name: "Rival", map: "lab", tile: (3, 6), visible: false, lines: ["Hmph."]),
    ],
    events: [
        (id: "intro", trigger: FirstVisit(map: "lab"), reveal: ["rival"], dialogue_from: Some("professor")),
    ],
)"#;

fn map_text(name: &str, layers: &[(&str, Vec<String>)]) -> String {
    let layers: Vec<String> = layers
        .iter()
        .map(|(layer, rows)| format!("(name: {layer:?}, rows: {rows:?})"))
        .collect();
    format!("(name: {name:?}, layers: [{}])", layers.join(", "))
}

fn assets(with_yard: bool) -> AssetStore {
    let catalog = TileCatalog::from_ron(TILESET, Path::new("tileset.ron")).expect("catalog");
    let mut assets = AssetStore::with_catalog("assets", catalog);
    if with_yard {
        let yard = map_text("yard", &[("background", vec!["=".repeat(8); 6])]);
        assets.insert_text("maps/yard.ron", &yard).expect("yard");
    }
    let mut walls = vec![".".repeat(10); 12];
    walls[0] = "W".repeat(10);
    let lab = map_text(
        "lab",
        &[("background", vec!["_".repeat(10); 12]), ("obstacles", walls)],
    );
    assets.insert_text("maps/lab.ron", &lab).expect("lab");
    assets
}

fn store(with_yard: bool) -> Store {
    let scenario: ScenarioManifest = ron::de::from_str(SCENARIO).expect("scenario");
    let state = AppState::new(GameConfig::default(), scenario, assets(with_yard), 3);
    EffectStore::new(state, reducer)
}

fn hold(store: &mut Store, direction: Direction) {
    store.dispatch(Action::Tick {
        dt_ms: 16,
        keys: HeldKeys::only(direction),
    });
}

/// One step up from here puts the player's center on yard tile (col, 2).
fn stand_below_door(store: &mut Store, col: f32) {
    let player = &mut store.state_mut().player;
    player.x = col * 48.0 + 24.0 - 30.0;
    player.y = 115.0;
}

#[test]
fn door_leads_inside_and_fires_first_visit_event() {
    let mut store = store(true);
    stand_below_door(&mut store, 3.0);
    hold(&mut store, Direction::Up);

    let state = store.state();
    assert!(state.transition.is_interior());
    assert_eq!(state.current_map_id(), "lab");
    assert_eq!((state.player.x, state.player.y), (210.0, 468.0));
    assert_eq!(state.transition.previous_position(), Some((138.0, 112.0)));
    assert!(state.npcs.iter().any(|npc| npc.id == "rival" && npc.visible));
    assert!(state.dialogue.is_active());
    assert_eq!(state.dialogue.speaker(), Some("Professor"));
    assert!(state.fired_events.contains("intro"));

    // The conversation holds the player in place.
    hold(&mut store, Direction::Down);
    assert_eq!(store.state().player.y, 468.0);

    for _ in 0..10 {
        if !store.state().dialogue.is_active() {
            break;
        }
        store.dispatch(Action::Interact);
    }
    assert!(!store.state().dialogue.is_active());
}

#[test]
fn exit_returns_to_the_door_without_bouncing_back() {
    let mut store = store(true);
    stand_below_door(&mut store, 3.0);
    hold(&mut store, Direction::Up);
    store.state_mut().dialogue.close();

    for _ in 0..40 {
        if store.state().current_map_id() == OVERWORLD_ID {
            break;
        }
        hold(&mut store, Direction::Down);
    }
    let state = store.state();
    assert_eq!(state.current_map_id(), OVERWORLD_ID);
    assert_eq!((state.player.x, state.player.y), (138.0, 112.0));
    assert_eq!(state.transition.previous_position(), None);

    // Still on the door tile: nothing happens.
    hold(&mut store, Direction::Up);
    assert_eq!(store.state().current_map_id(), OVERWORLD_ID);

    // Off the tile and back on: the door works again, the event does not.
    hold(&mut store, Direction::Down);
    hold(&mut store, Direction::Down);
    hold(&mut store, Direction::Down);
    hold(&mut store, Direction::Up);
    hold(&mut store, Direction::Up);
    let state = store.state();
    assert_eq!(state.current_map_id(), "lab");
    assert!(!state.dialogue.is_active());
}

#[test]
fn unavailable_interior_keeps_the_player_outside() {
    let mut store = store(true);
    stand_below_door(&mut store, 6.0);
    hold(&mut store, Direction::Up);

    let state = store.state();
    assert!(!state.transition.is_interior());
    assert_eq!((state.player.x, state.player.y), (282.0, 112.0));
    let status = state.status.as_deref().unwrap_or_default();
    assert!(status.starts_with("The way is blocked"), "{status}");
}

#[test]
fn missing_overworld_degrades_to_an_empty_field() {
    let mut store = store(false);
    assert!(store.state().overworld.is_degraded());

    let before = (store.state().player.x, store.state().player.y);
    hold(&mut store, Direction::Up);
    assert_eq!((store.state().player.x, store.state().player.y), before);
    assert!(store.state().battle.is_none());
}

#[test]
fn init_resets_the_field() {
    let mut store = store(true);
    stand_below_door(&mut store, 3.0);
    hold(&mut store, Direction::Up);
    assert!(store.state().transition.is_interior());

    assert!(store.dispatch(Action::Init).changed);
    let state = store.state();
    assert_eq!(state.current_map_id(), OVERWORLD_ID);
    assert!(state.fired_events.is_empty());
    assert!(!state.dialogue.is_active());
    assert!(state.npcs.iter().all(|npc| npc.id != "rival" || !npc.visible));
}
