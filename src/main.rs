/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use log::{info, warn, LevelFilter};

use config::GameConfig;
use domain::creature::CreatureManager;
use domain::grid::Direction;
use domain::player::FrameInput;
use sim::event::GameEvent;
use sim::save::{self, SaveStore};
use sim::step;
use sim::world::GameSession;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const CATCH_SOUND: &str = "assets/sounds/catch.wav";

fn main() {
    let config = GameConfig::load();
    init_logging(&config);
    for w in &config.warnings {
        warn!("Config: {}", w);
    }

    let store = SaveStore::open(save::resolve_path(&config.save_file));
    let mut session = GameSession::new(&config, store, CreatureManager::new());
    session.populate();

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        std::process::exit(1);
    }

    let sound = SoundEngine::new(&config.asset_path(CATCH_SOUND));

    let result = game_loop(&mut session, &mut renderer, sound.as_ref(), &config);

    drop(sound);
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    let counts = &session.save.state.counts;
    println!();
    println!("Thanks for playing Campus Critters!");
    for (species, n) in counts.iter() {
        println!("  {:<9} {}", species.plural(), n);
    }
    info!("Exited after {} frames", session.frame);
}

/// Log records go to a file: the terminal belongs to the renderer.
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(config: &GameConfig) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Info);
    builder.parse_filters(&config.log_level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    let path = save::resolve_path(&config.log_file);
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!("Log file {} unavailable ({e}), logging disabled", path.display());
            builder.filter_level(LevelFilter::Off);
        }
    }
    if builder.try_init().is_err() {
        eprintln!("Logger already initialised");
    }
}

fn game_loop(
    session: &mut GameSession,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.keyboard_enhanced();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let start = Instant::now();
    let frame = Duration::from_millis(config.timing.frame_ms);

    loop {
        let frame_start = Instant::now();
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) || gp.quit_pressed() {
            info!("Quit requested");
            break;
        }

        let input = FrameInput {
            direction: detect_movement(&kb, &gp),
            catch: kb.any_pressed(KEYS_CATCH) || gp.catch_pressed(),
            interact: kb.any_pressed(KEYS_INTERACT) || gp.interact_pressed(),
            reset: kb.any_pressed(KEYS_RESET) || gp.reset_pressed(),
        };

        let now_ms = start.elapsed().as_millis() as u64;
        let events = step::step(session, input, now_ms);
        process_sound_events(sound, &events, config);

        renderer.render(session)?;

        if let Some(rest) = frame.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    Ok(())
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent], config: &GameConfig) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::CreatureCaught { .. } => sfx.play_catch(),
            GameEvent::QuestStarted { .. } => sfx.play_quest_start(),
            GameEvent::QuestCompleted { .. } => sfx.play_quest_complete(),
            GameEvent::RoomEntered { door, .. } => sfx.play_door(*door),
            GameEvent::DialogueBlip => sfx.play_blip(),
            GameEvent::TotalsReset => sfx.play_reset(),
            GameEvent::MusicCue { track } => sfx.change_track(&config.asset_path(track)),
            _ => {}
        }
    }
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_CATCH: &[KeyCode] = &[KeyCode::Char(' '), KeyCode::Char('c'), KeyCode::Char('C')];
const KEYS_INTERACT: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char('t'), KeyCode::Char('T')];
const KEYS_RESET: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

fn detect_movement(kb: &InputState, gp: &GamepadState) -> Option<Direction> {
    if kb.any_held(KEYS_UP) || kb.any_pressed(KEYS_UP) || gp.up_held() {
        Some(Direction::Up)
    } else if kb.any_held(KEYS_DOWN) || kb.any_pressed(KEYS_DOWN) || gp.down_held() {
        Some(Direction::Down)
    } else if kb.any_held(KEYS_LEFT) || kb.any_pressed(KEYS_LEFT) || gp.left_held() {
        Some(Direction::Left)
    } else if kb.any_held(KEYS_RIGHT) || kb.any_pressed(KEYS_RIGHT) || gp.right_held() {
        Some(Direction::Right)
    } else {
        None
    }
}
