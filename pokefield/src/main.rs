use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tui_dispatch::EffectStore;

use pokefield::action::Action;
use pokefield::assets::AssetStore;
use pokefield::config::GameConfig;
use pokefield::effect::Effect;
use pokefield::error::StartupError;
use pokefield::input::KeyTracker;
use pokefield::reducer::reducer;
use pokefield::scenario::{load_manifest, ScenarioManifest};
use pokefield::state::{seed_from_time, AppState, GameMode};
use pokefield::ui;

type Store = EffectStore<AppState, Action, Effect>;

#[derive(Parser, Debug)]
#[command(name = "pokefield")]
#[command(about = "Walk the tall grass and battle what jumps out")]
struct Args {
    /// Directory holding scenario.ron, the tileset and the maps.
    #[arg(long, default_value = "assets")]
    assets: PathBuf,
    /// Optional RON file overriding the default tuning values.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value = "pokefield.log")]
    log_file: PathBuf,
    /// Silence the terminal bell on encounters and hits.
    #[arg(long)]
    mute: bool,
    /// Print the scenario manifest schema and exit.
    #[arg(long)]
    print_schema: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.print_schema {
        let schema = schemars::schema_for!(ScenarioManifest);
        return match ron::ser::to_string_pretty(&schema, ron::ser::PrettyConfig::default()) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("could not render schema: {err}");
                ExitCode::FAILURE
            }
        };
    }

    if let Err(err) = init_tracing(&args.log_file) {
        eprintln!("could not open log file {}: {err}", args.log_file.display());
        return ExitCode::FAILURE;
    }
    info!("=== pokefield startup ===");

    let state = match load_state(&args) {
        Ok(state) => state,
        Err(err) => {
            error!(error = %err, "startup failed");
            eprintln!("pokefield: {err}");
            return ExitCode::FAILURE;
        }
    };

    match run_terminal(state, args.mute) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "terminal session failed");
            eprintln!("pokefield: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

/// Loads configuration and assets. The tileset and the manifest are
/// required; broken individual maps only degrade the areas using them.
fn load_state(args: &Args) -> Result<AppState, StartupError> {
    let config = match &args.config {
        Some(path) => GameConfig::from_ron_file(path)?,
        None => GameConfig::default(),
    };
    config.validate()?;

    let scenario = load_manifest(&args.assets.join("scenario.ron"))?;
    scenario.validate().map_err(StartupError::Scenario)?;

    let mut assets = AssetStore::open(&args.assets, &scenario.tileset)?;
    let failed = assets.preload(&scenario);
    if failed > 0 {
        warn!(failed, "some maps failed to load and will be shown empty");
    }
    info!(scenario = %scenario.name, "assets loaded");

    let seed = args.seed.unwrap_or_else(seed_from_time);
    info!(seed, "rng seeded");
    Ok(AppState::new(config, scenario, assets, seed))
}

fn run_terminal(state: AppState, mute: bool) -> Result<(), StartupError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let enhanced = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tracker = if enhanced {
        KeyTracker::with_release_events()
    } else {
        KeyTracker::with_hold_window(state.config.key_hold_ms)
    };
    let result = run_app(&mut terminal, state, tracker, mute);

    if enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result.map_err(StartupError::from)
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    state: AppState,
    mut keys: KeyTracker,
    mute: bool,
) -> io::Result<()> {
    let frame = Duration::from_millis(state.config.frame_ms());
    let mut store = EffectStore::new(state, reducer);
    let mut bell = Bell { mute };
    let size = terminal.size()?;
    dispatch_action(&mut store, Action::UiTerminalResize(size.width, size.height), &mut bell);
    dispatch_action(&mut store, Action::Init, &mut bell);

    let started = Instant::now();
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| ui::render(f, f.area(), store.state()))?;

        let timeout = frame.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            let now_ms = started.elapsed().as_millis() as u64;
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Release => {
                    if let Some(direction) = ui::direction_for_key(key.code) {
                        keys.release(direction);
                    }
                }
                Event::Key(key) => {
                    if handle_key(key.code, key.modifiers, key.kind, now_ms, &mut store, &mut keys, &mut bell) {
                        break;
                    }
                }
                Event::Resize(width, height) => {
                    dispatch_action(&mut store, Action::UiTerminalResize(width, height), &mut bell);
                }
                _ => {}
            }
        }

        let elapsed = last_tick.elapsed();
        if elapsed >= frame {
            last_tick = Instant::now();
            let now_ms = started.elapsed().as_millis() as u64;
            let held = keys.snapshot(now_ms);
            let dt_ms = elapsed.as_millis() as u64;
            dispatch_action(&mut store, Action::Tick { dt_ms, keys: held }, &mut bell);
        }
    }

    info!(clock_ms = store.state().clock_ms, "session ended");
    Ok(())
}

/// Routes a key press; returns `true` when the session should end.
fn handle_key(
    code: KeyCode,
    modifiers: KeyModifiers,
    kind: KeyEventKind,
    now_ms: u64,
    store: &mut Store,
    keys: &mut KeyTracker,
    bell: &mut Bell,
) -> bool {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return true;
    }
    let mode = store.state().mode;
    if mode == GameMode::Field {
        if let Some(direction) = ui::direction_for_key(code) {
            keys.press(direction, now_ms);
            return false;
        }
    }
    // Menus move one step per press.
    if kind == KeyEventKind::Repeat && mode == GameMode::Battle {
        return false;
    }
    match ui::handle_key(code, store.state()) {
        Some(Action::Quit) => true,
        Some(action) => {
            dispatch_action(store, action, bell);
            false
        }
        None => false,
    }
}

fn dispatch_action(store: &mut Store, action: Action, bell: &mut Bell) {
    let result = store.dispatch(action);
    for effect in result.effects {
        handle_effect(effect, bell);
    }
}

fn handle_effect(effect: Effect, bell: &mut Bell) {
    match effect {
        Effect::Cue(cue) => {
            if let Err(err) = bell.ring() {
                warn!(?cue, error = %err, "bell failed");
            }
        }
    }
}

struct Bell {
    mute: bool,
}

impl Bell {
    fn ring(&mut self) -> io::Result<()> {
        if self.mute {
            return Ok(());
        }
        let mut out = io::stdout();
        out.write_all(b"\x07")?;
        out.flush()
    }
}
