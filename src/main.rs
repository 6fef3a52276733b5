/// Entry point and game loop.
///
/// Usage: `ghostmaze [MAZE_FILE]`. A maze file given on the command line
/// overrides `maze_file` from config.toml.

mod app;
mod config;
mod domain;
mod error;
mod logging;
mod sim;
mod ui;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing::{error, info, warn};

use app::{App, Phase};
use config::GameConfig;
use error::GameResult;
use sim::event::GameEvent;
use sim::level::load_maze;
use sim::session::Session;
use ui::gamepad::{Action, GamepadState};
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{SoundEngine, Sfx};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let mut config = GameConfig::load();
    if let Some(arg) = std::env::args_os().nth(1) {
        config.maze_file = Some(PathBuf::from(arg));
    }

    let _log_guard = match logging::init(&config.log_dir) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {e}");
            None
        }
    };
    for warning in &config.warnings {
        warn!("{warning}");
    }

    let mut app = match build_app(&config) {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "startup failed");
            eprintln!("Ghost Maze failed to start: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        error!(error = %e, "terminal init failed");
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut app, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!(error = %e, "game loop aborted");
        eprintln!("Game error: {e}");
    }

    info!(best = app.best_score, "exit");
    println!();
    println!("Thanks for playing Ghost Maze!");
    println!("Best Score: {}", app.best_score);
}

fn build_app(config: &GameConfig) -> GameResult<App> {
    let template = load_maze(config.maze_file.as_deref())?;
    let session = Session::new(&template, config.session.clone(), 0)?;
    Ok(App::new(session, config.timing.clone()))
}

fn game_loop(
    app: &mut App,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> std::io::Result<()> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let clock = Instant::now();
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);

    loop {
        kb.drain_events();
        gp.update();
        let now_ms = clock.elapsed().as_millis() as u64;

        if kb.ctrl_c_pressed() || handle_meta(app, &kb, &gp, now_ms) {
            break;
        }

        if let Some(dir) = kb.heading_request().or(gp.heading_request()) {
            app.steer(dir);
        }

        if last_tick.elapsed() >= tick_rate {
            let events = app.advance(now_ms);
            process_sound_events(sound, &events);
            last_tick = Instant::now();
        }

        renderer.render(app, now_ms)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for effect in events.iter().filter_map(Sfx::for_event) {
        sfx.play(effect);
    }
}

// ── Key Constants ──

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::F(1), KeyCode::Char('p'), KeyCode::Char('P')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

/// Menu, pause and restart keys. Returns true to quit.
fn handle_meta(app: &mut App, kb: &InputState, gp: &GamepadState, now_ms: u64) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.pressed(Action::Confirm);
    let esc = kb.was_pressed(KeyCode::Esc) || gp.pressed(Action::Cancel);
    let restart = kb.any_pressed(KEYS_RESTART);

    if kb.any_pressed(KEYS_QUIT) {
        return true;
    }

    match app.phase {
        Phase::Title => {
            if esc {
                return true;
            }
            if confirm {
                app.start(now_ms);
            }
        }
        Phase::Playing => {
            if kb.any_pressed(KEYS_PAUSE) {
                app.toggle_pause(now_ms);
            } else if esc {
                app.back_to_title(now_ms);
            } else if restart {
                app.start(now_ms);
            }
        }
        Phase::Won => {
            if confirm || esc {
                app.back_to_title(now_ms);
            }
        }
        Phase::Caught => {
            if esc {
                app.back_to_title(now_ms);
            } else if restart || confirm || gp.pressed(Action::Restart) {
                app.start(now_ms);
            }
        }
    }
    false
}
