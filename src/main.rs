/// Entry point and frame loop.

mod ui;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use maze3d::config::GameConfig;
use maze3d::sim::event::GameEvent;
use maze3d::sim::level;
use maze3d::sim::session::GameSession;
use ui::gamepad::GamepadSource;
use ui::input::{KeySource, KeyTransition, KeyboardCapture};
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(2);
/// Longest frame handed to the session, so a stalled terminal doesn't
/// fast-forward the reset timer.
const MAX_DT: f32 = 0.25;

fn main() {
    if let Err(e) = init_logging() {
        eprintln!("Logger setup failed: {e}");
    }

    let config = GameConfig::load();
    let layout = level::resolve_layout(&config.maze);
    let mut session = GameSession::new(layout, &config);

    let mut renderer = Renderer::new();
    renderer.load_layout(&session.layout());

    if let Err(e) = renderer.init() {
        log::error!("terminal init failed: {e}");
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let capture = KeyboardCapture::acquire();
    let result = game_loop(&mut session, &mut renderer, &config, capture.reports_release());
    drop(capture);

    session.stop();

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game loop: {e}");
        eprintln!("Game error: {e}");
    }

    println!("Thanks for playing maze3d! Rounds played: {}", session.round());
}

/// Logs go to a file; the terminal belongs to the renderer.
fn init_logging() -> Result<(), log::SetLoggerError> {
    let path = std::env::var_os("MAZE3D_LOG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("maze3d.log"));
    install_logger(&path)
}

/// Fails if a logger is already installed.
fn install_logger(path: &Path) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match File::create(path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!("cannot open log file {}: {e}; logging disabled", path.display());
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.try_init()
}

fn game_loop(
    session: &mut GameSession,
    renderer: &mut Renderer,
    config: &GameConfig,
    honor_release: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = KeySource::new(honor_release);
    let mut gp = GamepadSource::new(&config.gamepad);
    let frame = Duration::from_millis(config.session.frame_ms);
    let mut last_tick = Instant::now();

    log::info!("maze {:?} ready, {} ms frames", session.maze_name(), config.session.frame_ms);

    loop {
        kb.drain_events()?;
        gp.update();

        if kb.ctrl_c_pressed() || handle_meta(session, &kb, &gp) {
            break;
        }

        // A tap shorter than one frame lands here as Down then Up and never
        // reaches a snapshot. Movement is hold-based, so that is fine.
        for t in kb.take_transitions().into_iter().chain(gp.take_transitions()) {
            match t {
                KeyTransition::Down(name) => session.key_down(&name),
                KeyTransition::Up(name) => session.key_up(&name),
            }
        }

        let elapsed = last_tick.elapsed();
        if elapsed >= frame {
            last_tick = Instant::now();
            let dt = elapsed.as_secs_f32().min(MAX_DT);
            for event in session.tick(dt) {
                log_event(&event);
                // The session dropped its held directions; forget ours too so
                // keys still down re-register from auto-repeat.
                if matches!(event, GameEvent::GoalReached { .. } | GameEvent::Collided { .. }) {
                    kb.release_all();
                }
            }
            renderer.render(session.maze_name(), &session.layout(), &session.frame(), gp.connected())?;
        }

        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ── Key Constants ──

const KEYS_START: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_RESET: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

/// Session commands. Returns true when the player asked to quit.
fn handle_meta(session: &mut GameSession, kb: &KeySource, gp: &GamepadSource) -> bool {
    if kb.any_pressed(KEYS_QUIT) || gp.quit_pressed() {
        log::info!("quit requested");
        return true;
    }
    // Commands are no-ops outside their state, so both may be tried.
    if kb.any_pressed(KEYS_START) || gp.start_pressed() {
        session.start();
    }
    if kb.any_pressed(KEYS_RESET) || gp.reset_pressed() {
        session.reset();
    }
    false
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::Started => log::info!("session started"),
        GameEvent::GoalReached { at } => log::info!("goal reached at ({:.2}, {:.2}, {:.2})", at.x, at.y, at.z),
        GameEvent::Collided { at } => log::info!("hit a wall at ({:.2}, {:.2}, {:.2})", at.x, at.y, at.z),
        GameEvent::RoundReset { round, reason } => log::info!("round {round} begins ({reason:?})"),
        GameEvent::StaleResetIgnored { .. } | GameEvent::Stopped => log::debug!("{event:?}"),
    }
}
