/// Entry point and frame loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::path::Path;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyModifiers};

use config::GameConfig;
use domain::entity::{DirSet, FrameInput, MenuAction, MoveDir};
use sim::event::GameEvent;
use sim::game::{Game, Phase};
use sim::scores;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::{self, Renderer};

const LOG_FILE: &str = "lightgame.log";

fn main() {
    init_logging(&config::data_dir());
    log::info!("lightgame {} starting", env!("CARGO_PKG_VERSION"));

    let config = GameConfig::load();

    let table = match scores::load(&config.scores_path) {
        Ok(t) => t,
        Err(e) => {
            log::error!("could not read {}: {e}", config.scores_path.display());
            eprintln!("Could not read scores from {}: {e}", config.scores_path.display());
            return;
        }
    };
    let mut game = Game::new(config.timing.clone(), config.rules.clone(), table);

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut game, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    log::info!("shutting down");
    println!();
    println!("Thanks for playing Light Game!");
    println!("Best Score: {}", game.top_score);
}

/// Log to a file in the data dir: the terminal is in raw mode while playing.
/// `RUST_LOG` overrides the default `info` filter.
fn init_logging(dir: &Path) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    );
    builder.write_style(env_logger::WriteStyle::Never);

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE));
    match file {
        Ok(f) => {
            builder.target(env_logger::Target::Pipe(Box::new(f)));
        }
        Err(_) => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
}

fn game_loop(
    game: &mut Game,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        log::info!("gamepad detected");
    }

    let frame = Duration::from_millis(config.timing.frame_ms);
    let mut last_frame = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            log::info!("quit signal");
            break;
        }

        let phase = game.phase;
        let mut events = Vec::new();
        for action in menu_actions(phase, &kb, &gp) {
            events.extend(game.handle(action));
        }

        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        let input = FrameInput {
            movement: detect_movement(&kb, &gp),
            pointer: kb.pointer.map(|(col, row)| renderer::pointer_cell(col, row)),
        };
        events.extend(game.update(input, dt));
        if game.phase != phase {
            kb.mark_held_stale();
        }

        if process_events(game, &events, config)? {
            break;
        }

        renderer.render(game)?;
        std::thread::sleep(frame);
    }

    Ok(())
}

/// Log events and persist scores. Returns true when the game should exit.
fn process_events(
    game: &Game,
    events: &[GameEvent],
    config: &GameConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    for event in events {
        match event {
            GameEvent::LevelStarted(level) => {
                if let Some(s) = &game.session {
                    log::info!(
                        "level {} started: {} blocking cells, {} lit from {:?}",
                        level.number(), s.grid.blocking_count(), s.light.lit_count(), s.light.source,
                    );
                }
            }
            GameEvent::CoinCollected { x, y, score } => {
                log::debug!("coin at ({x},{y}), score {score}");
            }
            GameEvent::CoinFallback { x, y } => {
                log::warn!("coin spawn gave up, using fallback cell ({x},{y})");
            }
            GameEvent::InvincibilityEnded => log::debug!("grace window over"),
            GameEvent::CaughtInDark { x, y } => log::info!("caught in the dark at ({x},{y})"),
            GameEvent::TimeUp { score } => log::info!("time up, score {score}"),
            GameEvent::NewTopScore(score) => log::info!("new top score {score}"),
            GameEvent::ScoreSubmitted { id, score, name } => {
                log::info!("score #{id} submitted: {name:?} {score}");
                scores::save(&game.scores, &config.scores_path)?;
            }
            GameEvent::Quit => {
                log::info!("quit from menu");
                return Ok(true);
            }
        }
    }
    Ok(false)
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_BACK: &[KeyCode] = &[KeyCode::Esc];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

fn dir_keys(dir: MoveDir) -> &'static [KeyCode] {
    match dir {
        MoveDir::Up => KEYS_UP,
        MoveDir::Down => KEYS_DOWN,
        MoveDir::Left => KEYS_LEFT,
        MoveDir::Right => KEYS_RIGHT,
    }
}

/// Every direction held this frame; the session chooses among them.
fn detect_movement(kb: &InputState, gp: &GamepadState) -> DirSet {
    DirSet::from_fn(|d| {
        let keys = dir_keys(d);
        kb.any_held(keys) || kb.any_pressed(keys) || gp.held(d)
    })
}

/// Translate this frame's keys, clicks and buttons into menu actions for `phase`.
fn menu_actions(phase: Phase, kb: &InputState, gp: &GamepadState) -> Vec<MenuAction> {
    let mut out = Vec::new();

    match phase {
        // Text entry: every key event counts, including repeats
        Phase::GameOver { .. } => {
            for key in &kb.raw_events {
                match key.code {
                    KeyCode::Enter => out.push(MenuAction::Confirm),
                    KeyCode::Backspace => out.push(MenuAction::Backspace),
                    KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                        out.push(MenuAction::Char(c));
                    }
                    _ => {}
                }
            }
            if gp.menu_actions().contains(&MenuAction::Confirm) {
                out.push(MenuAction::Confirm);
            }
        }

        Phase::Playing(_) => {
            if kb.any_pressed(KEYS_BACK) || gp.menu_actions().contains(&MenuAction::Back) {
                out.push(MenuAction::Back);
            }
        }

        Phase::MainMenu | Phase::LevelSelect | Phase::Tutorial | Phase::Leaderboard => {
            if kb.any_pressed(KEYS_UP) { out.push(MenuAction::Up); }
            if kb.any_pressed(KEYS_DOWN) { out.push(MenuAction::Down); }
            if kb.any_pressed(KEYS_CONFIRM) { out.push(MenuAction::Confirm); }
            if kb.any_pressed(KEYS_BACK) { out.push(MenuAction::Back); }
            if phase == Phase::MainMenu && kb.any_pressed(KEYS_QUIT) {
                out.push(MenuAction::Back);
            }

            for &(_, row) in &kb.clicks {
                match phase {
                    Phase::MainMenu | Phase::LevelSelect => {
                        if let Some(i) = renderer::menu_item_at(row) {
                            out.push(MenuAction::Select(i));
                        }
                    }
                    Phase::Leaderboard => out.push(MenuAction::Confirm),
                    _ => {}
                }
            }

            out.extend(gp.menu_actions());
        }
    }

    out
}
