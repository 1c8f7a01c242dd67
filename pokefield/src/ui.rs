use crossterm::event::KeyCode;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{block::Title, Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use tui_map::prelude::CellScale;

use crate::action::Action;
use crate::animation::{AnimationEffect, FlameSize};
use crate::battle::{BattleCommand, BattlePhase, BattleSession};
use crate::creature::Creature;
use crate::map::TileMap;
use crate::state::{AppState, Direction, GameMode};

const BG_BASE: Color = Color::Rgb(24, 36, 26);
const BG_PANEL: Color = Color::Rgb(34, 58, 38);
const BG_PANEL_ALT: Color = Color::Rgb(28, 48, 32);
const BG_HEADER: Color = Color::Rgb(26, 46, 34);
const TEXT_MAIN: Color = Color::Rgb(228, 236, 214);
const TEXT_DIM: Color = Color::Rgb(172, 186, 160);
const ACCENT_GREEN: Color = Color::Rgb(104, 204, 120);
const ACCENT_GOLD: Color = Color::Rgb(222, 196, 120);
const ACCENT_RED: Color = Color::Rgb(220, 96, 96);
const HIGHLIGHT_BG: Color = ACCENT_GOLD;
const HIGHLIGHT_TEXT: Color = Color::Rgb(16, 26, 18);
const BORDER_ACCENT: Color = Color::Rgb(74, 98, 82);
const PLAYER_COLOR: Color = Color::Rgb(232, 84, 72);
const NPC_COLOR: Color = Color::Rgb(96, 148, 232);
const FLAME_CORE: Color = Color::Rgb(255, 214, 96);
const FLAME_EDGE: Color = Color::Rgb(236, 110, 48);

/// Pixels covered by one terminal cell on a map drawn at `scale`.
fn cell_px(map: &TileMap, scale: CellScale) -> (f32, f32) {
    (
        map.tile_px() / scale.cols_per_tile.max(1) as f32,
        map.tile_px() / scale.rows_per_tile.max(1) as f32,
    )
}

pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    frame.render_widget(Block::default().style(Style::default().bg(BG_BASE)), area);
    match state.mode {
        GameMode::Field => render_field(frame, area, state),
        GameMode::Battle => render_battle(frame, area, state),
    }
    if state.show_debug {
        render_debug(frame, area, state);
    }
}

fn render_field(frame: &mut Frame, area: Rect, state: &AppState) {
    if area.width < 30 || area.height < 12 {
        let warning = Paragraph::new("Terminal too small - expand window.")
            .style(Style::default().fg(TEXT_DIM))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(warning, area);
        return;
    }

    let layout = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(6), Constraint::Length(3)])
        .split(area);

    render_field_header(frame, layout[0], state);
    render_map(frame, layout[1], state);
    render_field_status(frame, layout[2], state);

    if state.dialogue.is_active() {
        render_dialogue(frame, layout[1], state);
    }
}

fn render_field_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = panel_block(" FIELD ", BG_HEADER);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let creature = &state.player.creature;
    let line = Line::from(vec![
        Span::styled(
            state.current_map_id().to_ascii_uppercase(),
            Style::default().fg(ACCENT_GREEN).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  •  "),
        Span::styled(
            format!("{} {}/{}", creature.name, creature.hp, creature.max_hp),
            Style::default().fg(TEXT_MAIN),
        ),
        Span::raw("  •  "),
        Span::styled(state.scenario.name.clone(), Style::default().fg(TEXT_DIM)),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
}

fn render_field_status(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = panel_block("STATUS", BG_PANEL_ALT);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let line = match state.status.as_deref() {
        Some(message) => Line::from(Span::styled(message.to_string(), Style::default().fg(TEXT_MAIN))),
        None => Line::from(Span::styled(
            "Arrows/WASD move  |  Z/E talk  |  F3 debug  |  Q quit",
            Style::default().fg(TEXT_DIM),
        )),
    };
    frame.render_widget(Paragraph::new(line), inner);
}

/// Draws the current map around the player. Grass layers cover the lower
/// part of the player sprite when standing in tall grass.
fn render_map(frame: &mut Frame, area: Rect, state: &AppState) {
    let map = state.current_map();
    let block = panel_block(format!(" {} ", map.id()), BG_PANEL_ALT);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if map.is_degraded() {
        let note = Paragraph::new("This area failed to load.")
            .style(Style::default().fg(TEXT_DIM))
            .alignment(Alignment::Center);
        frame.render_widget(note, inner);
    }

    let scale = CellScale::default();
    let (col_px, row_px) = cell_px(map, scale);
    let viewport = (inner.width as f32 * col_px, inner.height as f32 * row_px);
    let (cam_x, cam_y) = map.camera_offset(state.player.center(), viewport);
    let to_cell = |x: f32, y: f32| {
        (
            ((x + cam_x as f32) / col_px).floor() as i32,
            ((y + cam_y as f32) / row_px).floor() as i32,
        )
    };

    let in_grass = {
        let (cx, cy) = state.player.center();
        map.is_on_grassy(cx, cy)
    };
    let p = &state.player;
    let player = sprite_cells(p.x, p.y, p.width, p.height, col_px, row_px, &to_cell);
    let split_row = player.1 + player.3 / 2;

    let buf = frame.buffer_mut();
    for section in map.sections() {
        let (ox, oy) = to_cell(0.0, section.row_offset as f32 * map.tile_px());
        section.surfaces.background.blit(buf, inner, ox, oy);
    }
    if in_grass {
        draw_actor(buf, inner, player, state.player.facing, PLAYER_COLOR, Some(split_row..i32::MAX));
    }
    for section in map.sections() {
        let (ox, oy) = to_cell(0.0, section.row_offset as f32 * map.tile_px());
        section.surfaces.grass_top.blit(buf, inner, ox, oy);
        section.surfaces.grass_bottom.blit(buf, inner, ox, oy);
        section.surfaces.foreground.blit(buf, inner, ox, oy);
    }
    for npc in state.npcs_on_current_map() {
        let cells = sprite_cells(npc.x, npc.y, npc.w, npc.h, col_px, row_px, &to_cell);
        draw_actor(buf, inner, cells, npc.facing, NPC_COLOR, None);
    }
    let rows = in_grass.then_some(i32::MIN..split_row);
    draw_actor(buf, inner, player, state.player.facing, PLAYER_COLOR, rows);
}

/// Cell box `(col, row, width, height)` of a pixel rectangle.
fn sprite_cells(
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    col_px: f32,
    row_px: f32,
    to_cell: &impl Fn(f32, f32) -> (i32, i32),
) -> (i32, i32, i32, i32) {
    let (col, row) = to_cell(x, y);
    let width = (w / col_px).round().max(1.0) as i32;
    let height = (h / row_px).round().max(1.0) as i32;
    (col, row, width, height)
}

fn draw_actor(
    buf: &mut Buffer,
    area: Rect,
    (col, row, width, height): (i32, i32, i32, i32),
    facing: Direction,
    color: Color,
    rows: Option<std::ops::Range<i32>>,
) {
    let marker = facing_glyph(facing);
    let (mid_col, mid_row) = (col + width / 2, row + height / 2);
    for y in row..row + height {
        if rows.as_ref().is_some_and(|range| !range.contains(&y)) {
            continue;
        }
        for x in col..col + width {
            if x < 0 || y < 0 || x >= area.width as i32 || y >= area.height as i32 {
                continue;
            }
            let ch = if (x, y) == (mid_col, mid_row) { marker } else { '█' };
            if let Some(cell) = buf.cell_mut((area.x + x as u16, area.y + y as u16)) {
                cell.set_char(ch).set_fg(color);
                if ch != '█' {
                    cell.set_fg(HIGHLIGHT_TEXT).set_bg(color);
                }
            }
        }
    }
}

fn facing_glyph(facing: Direction) -> char {
    match facing {
        Direction::Up => '▲',
        Direction::Down => '▼',
        Direction::Left => '◀',
        Direction::Right => '▶',
    }
}

fn render_dialogue(frame: &mut Frame, area: Rect, state: &AppState) {
    let height = 5.min(area.height);
    let box_area = Rect::new(area.x, area.y + area.height - height, area.width, height);
    frame.render_widget(Clear, box_area);

    let title = state
        .dialogue
        .speaker()
        .map(|name| format!(" {} ", name.to_ascii_uppercase()))
        .unwrap_or_default();
    let block = panel_block(title, BG_PANEL);
    let inner = block.inner(box_area);
    frame.render_widget(block, box_area);

    let hint = if state.dialogue.has_more_lines() { "Z: next ▼" } else { "Z: close" };
    let lines = vec![
        Line::from(Span::styled(state.dialogue.visible_text().to_string(), Style::default().fg(TEXT_MAIN))),
        Line::from(Span::styled(hint, Style::default().fg(TEXT_DIM))),
    ];
    let paragraph = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

fn render_battle(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(battle) = state.battle.as_ref() else {
        return;
    };

    let layout = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(6)])
        .split(area);
    let panels = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(layout[0]);

    render_creature_panel(frame, panels[0], &battle.wild, true);
    render_creature_panel(frame, panels[1], &state.player.creature, false);
    render_flames(frame.buffer_mut(), layout[0], state);
    render_battle_text(frame, layout[1], battle, &state.player.creature);
}

fn render_creature_panel(frame: &mut Frame, area: Rect, creature: &Creature, wild: bool) {
    let title = if wild {
        format!(" WILD {} ", creature.name.to_ascii_uppercase())
    } else {
        format!(" {} ", creature.name.to_ascii_uppercase())
    };
    let block = panel_block(title, BG_PANEL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let shown = creature.display_hp.round().max(0.0) as u16;
    let lines = vec![
        hp_line(shown, creature.max_hp),
        Line::from(Span::styled(
            format!("Type {}", creature.element.label()),
            Style::default().fg(TEXT_DIM),
        )),
    ];
    let paragraph = Paragraph::new(Text::from(lines)).style(Style::default().fg(TEXT_MAIN));
    frame.render_widget(paragraph, inner);
}

/// Flames are placed in viewport pixels and scaled onto `area`.
fn render_flames(buf: &mut Buffer, area: Rect, state: &AppState) {
    let (vw, vh) = state.config.viewport();
    for animation in state.animations.iter() {
        let AnimationEffect::Fire(fire) = &animation.effect;
        let (x, y) = fire.position();
        let col = (x / vw * area.width as f32) as i32;
        let row = (y / vh * area.height as f32) as i32;
        let glyphs: &[(i32, i32, char, Color)] = match fire.size() {
            FlameSize::Small => &[(0, 0, '▲', FLAME_EDGE)],
            FlameSize::Big => &[
                (0, -1, '▲', FLAME_EDGE),
                (-1, 0, '▲', FLAME_EDGE),
                (0, 0, '▲', FLAME_CORE),
                (1, 0, '▲', FLAME_EDGE),
            ],
        };
        for (dx, dy, ch, color) in glyphs {
            let (cx, cy) = (col + dx, row + dy);
            if cx < 0 || cy < 0 || cx >= area.width as i32 || cy >= area.height as i32 {
                continue;
            }
            if let Some(cell) = buf.cell_mut((area.x + cx as u16, area.y + cy as u16)) {
                cell.set_char(*ch)
                    .set_style(Style::default().fg(*color).add_modifier(Modifier::BOLD));
            }
        }
    }
}

fn render_battle_text(frame: &mut Frame, area: Rect, battle: &BattleSession, player: &Creature) {
    let block = panel_block("COMMAND", BG_PANEL_ALT);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = match battle.phase {
        BattlePhase::Command => {
            let mut lines = vec![Line::from(format!("What will {} do?", player.name))];
            lines.extend(battle_menu_lines(battle.command_cursor));
            lines
        }
        BattlePhase::MoveSelect => move_lines(player, battle.move_cursor),
        BattlePhase::Message { .. } | BattlePhase::Animation { .. } => {
            vec![Line::from(battle.message.visible().to_string())]
        }
    };
    let paragraph = Paragraph::new(Text::from(lines))
        .style(Style::default().fg(TEXT_MAIN))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

/// The 2x2 command grid.
fn battle_menu_lines(selected: usize) -> Vec<Line<'static>> {
    BattleCommand::ALL
        .chunks(2)
        .enumerate()
        .map(|(row, pair)| {
            let mut spans = Vec::new();
            for (col, command) in pair.iter().enumerate() {
                let index = row * 2 + col;
                spans.push(menu_span(&format!(" {:<6}", command.label()), index == selected));
                spans.push(Span::raw("   "));
            }
            Line::from(spans)
        })
        .collect()
}

fn move_lines(player: &Creature, selected: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = player
        .moves
        .iter()
        .enumerate()
        .map(|(index, mv)| {
            let pp_style = if mv.pp == 0 {
                Style::default().fg(ACCENT_RED)
            } else {
                Style::default().fg(TEXT_DIM)
            };
            Line::from(vec![
                menu_span(&format!(" {:<12}", mv.name), index == selected),
                Span::styled(format!("  PP {:>2}/{:<2}", mv.pp, mv.max_pp), pp_style),
                Span::styled(format!("  {}", mv.element.label()), Style::default().fg(TEXT_DIM)),
            ])
        })
        .collect();
    lines.push(Line::from(Span::styled("Z: use  |  X/Esc: back", Style::default().fg(TEXT_DIM))));
    lines
}

fn render_debug(frame: &mut Frame, area: Rect, state: &AppState) {
    let width = 34.min(area.width);
    let height = 8.min(area.height);
    let debug_area = Rect::new(area.x + area.width - width, area.y, width, height);
    frame.render_widget(Clear, debug_area);

    let block = panel_block(" DEBUG ", BG_HEADER);
    let inner = block.inner(debug_area);
    frame.render_widget(block, debug_area);

    let map = state.current_map();
    let (cx, cy) = state.player.center();
    let (col, row) = map.tile_at(cx, cy);
    let lines = vec![
        Line::from(format!("map {}", map.id())),
        Line::from(format!("pos {:.0},{:.0} tile {col},{row}", state.player.x, state.player.y)),
        Line::from(format!("grass {}  steps {}", map.is_on_grassy(cx, cy), state.encounter.steps_since_last)),
        Line::from(format!("anims {}  t {}ms", state.animations.iter().count(), state.clock_ms)),
        Line::from(format!("facing {:?}", state.player.facing)),
    ];
    let paragraph = Paragraph::new(Text::from(lines)).style(Style::default().fg(TEXT_DIM));
    frame.render_widget(paragraph, inner);
}

fn panel_block<'a, T>(title: T, bg: Color) -> Block<'a>
where
    T: Into<Title<'a>>,
{
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title)
        .style(Style::default().bg(bg).fg(TEXT_MAIN))
        .border_style(Style::default().fg(BORDER_ACCENT))
}

fn hp_line(current: u16, max: u16) -> Line<'static> {
    let width: usize = 12;
    let ratio = if max == 0 { 0.0 } else { current as f32 / max as f32 };
    let filled = ((ratio * width as f32).round() as usize).min(width);
    let empty = width.saturating_sub(filled);
    let color = if ratio > 0.5 {
        ACCENT_GREEN
    } else if ratio > 0.2 {
        ACCENT_GOLD
    } else {
        ACCENT_RED
    };
    Line::from(vec![
        Span::raw("HP "),
        Span::styled(
            "█".repeat(filled),
            Style::default().fg(color).bg(Color::Rgb(24, 32, 24)).add_modifier(Modifier::BOLD),
        ),
        Span::styled("░".repeat(empty), Style::default().fg(TEXT_DIM).bg(Color::Rgb(20, 26, 20))),
        Span::raw(format!(" {current}/{max}")),
    ])
}

fn menu_span(label: &str, selected: bool) -> Span<'static> {
    let style = if selected {
        Style::default().fg(HIGHLIGHT_TEXT).bg(HIGHLIGHT_BG).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(TEXT_MAIN)
    };
    Span::styled(label.to_string(), style)
}

/// Movement keys; held state is tracked by the event loop.
pub fn direction_for_key(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Direction::Right),
        _ => None,
    }
}

/// Maps a key press to an action for the current mode. On the field,
/// movement keys return `None`; they feed the held-key tracker instead.
pub fn handle_key(code: KeyCode, state: &AppState) -> Option<Action> {
    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') => return Some(Action::Quit),
        KeyCode::F(3) | KeyCode::Char('`') => return Some(Action::UiToggleDebug),
        _ => {}
    }
    match state.mode {
        GameMode::Field => match code {
            KeyCode::Char('z') | KeyCode::Char('Z') | KeyCode::Char('e') | KeyCode::Char('E')
            | KeyCode::Enter | KeyCode::Char(' ') => Some(Action::Interact),
            KeyCode::Esc => Some(Action::Quit),
            _ => None,
        },
        GameMode::Battle => match direction_for_key(code) {
            Some(Direction::Up) => Some(Action::BattleMenuUp),
            Some(Direction::Down) => Some(Action::BattleMenuDown),
            Some(Direction::Left) => Some(Action::BattleMenuLeft),
            Some(Direction::Right) => Some(Action::BattleMenuRight),
            None => match code {
                KeyCode::Char('z') | KeyCode::Char('Z') | KeyCode::Enter | KeyCode::Char(' ') => {
                    Some(Action::BattleConfirm)
                }
                KeyCode::Char('x') | KeyCode::Char('X') | KeyCode::Esc | KeyCode::Backspace => {
                    Some(Action::BattleCancel)
                }
                _ => None,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use ratatui::{backend::TestBackend, Terminal};

    use super::*;
    use crate::assets::{AssetStore, TileCatalog};
    use crate::battle::{BattleSession, BattleTiming};
    use crate::config::GameConfig;
    use crate::scenario::ScenarioManifest;

    const TILESET: &str = r#"(tiles: [
        (id: 1, symbol: ',', color: (52, 128, 64), texture: '\''),
        (id: 20, symbol: 'g', color: (40, 140, 60), texture: '"', sparse: true),
    ])"#;

    const SCENARIO: &str = r#"(
        name: "ui",
        tileset: "tileset.ron",
        overworld: [(id: "meadow", map: "maps/meadow.ron")],
        start: (section: "meadow"),
        starter: (name: "Charmander", element: Fire, max_hp: 20, moves: [(name: "Ember", power: 10, animation: Some(Fire))]),
        wild_roster: [(name: "Eevee", element: Normal, max_hp: 17, moves: [])],
        npcs: [(id: "kid", name: "Kid", map: "overworld", tile: (2, 2), lines: ["Hello there!"])],
    )"#;

    fn state() -> AppState {
        let catalog = TileCatalog::from_ron(TILESET, Path::new("tileset.ron")).expect("catalog");
        let mut assets = AssetStore::with_catalog("assets", catalog);
        let rows = vec![",".repeat(8); 8];
        let text = format!("(name: \"meadow\", layers: [(name: \"background\", rows: {rows:?})])");
        assets.insert_text("maps/meadow.ron", &text).expect("meadow");
        let scenario: ScenarioManifest = ron::de::from_str(SCENARIO).expect("scenario");
        AppState::new(GameConfig::default(), scenario, assets, 1)
    }

    fn draw(state: &AppState) -> String {
        let backend = TestBackend::new(80, 30);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal
            .draw(|frame| render(frame, frame.area(), state))
            .expect("draw");
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn field_view_shows_map_and_player() {
        let state = state();
        let screen = draw(&state);
        assert!(screen.contains("OVERWORLD"));
        assert!(screen.contains('▲'), "player marker faces up");
        assert!(screen.contains("Charmander 20/20"));
    }

    #[test]
    fn dialogue_box_shows_speaker() {
        let mut state = state();
        state.dialogue.start(Some("Kid".into()), vec!["Hello there!".into()]);
        state.dialogue.advance();
        let screen = draw(&state);
        assert!(screen.contains("KID"));
        assert!(screen.contains("Hello there!"));
    }

    #[test]
    fn battle_view_shows_menu_and_moves() {
        let mut state = state();
        let wild = crate::creature::Creature::from_spec(&state.scenario.wild_roster[0]);
        let timing = BattleTiming::from_config(&state.config);
        let mut session = BattleSession::start(wild, &mut state.player.creature, timing);
        session.phase = BattlePhase::Command;
        state.battle = Some(session);
        state.mode = GameMode::Battle;

        let screen = draw(&state);
        assert!(screen.contains("WILD EEVEE"));
        assert!(screen.contains("FIGHT"));
        assert!(screen.contains("PARTY"));

        if let Some(battle) = state.battle.as_mut() {
            battle.phase = BattlePhase::MoveSelect;
        }
        let screen = draw(&state);
        assert!(screen.contains("Ember"));
        assert!(screen.contains("FIRE"));
    }

    #[test]
    fn keys_map_per_mode() {
        let mut state = state();
        assert_eq!(handle_key(KeyCode::Char('z'), &state), Some(Action::Interact));
        assert_eq!(handle_key(KeyCode::Up, &state), None);
        assert_eq!(handle_key(KeyCode::Char('q'), &state), Some(Action::Quit));

        state.mode = GameMode::Battle;
        assert_eq!(handle_key(KeyCode::Up, &state), Some(Action::BattleMenuUp));
        assert_eq!(handle_key(KeyCode::Enter, &state), Some(Action::BattleConfirm));
        assert_eq!(handle_key(KeyCode::Esc, &state), Some(Action::BattleCancel));
        assert_eq!(direction_for_key(KeyCode::Char('a')), Some(Direction::Left));
    }
}
