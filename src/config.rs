/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD, or
/// `~/.local/share/campus-critters`. Falls back to defaults if the file is
/// missing or incomplete. Problems are collected in `warnings` and logged
/// once the logger is running.

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::dialogue::CHAR_DELAY_MS;
use crate::domain::player::{ANIMATION_SPEED, MOVE_DELAY_MS};
use crate::domain::species::PerSpecies;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub population: PerSpecies<u32>,
    pub gamepad: GamepadConfig,
    pub save_file: String,
    pub log_file: String,
    pub log_level: String,
    pub assets_dir: PathBuf,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub frame_ms: u64,
    pub move_delay_ms: u64,
    pub animation_speed: f32, // pixels per frame
    pub typewriter_ms: u64,
    pub music_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub catch: Vec<String>,
    pub interact: Vec<String>,
    pub reset: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    population: TomlPopulation,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_move_delay")]
    move_delay_ms: u64,
    #[serde(default = "default_animation_speed")]
    animation_speed: f32,
    #[serde(default = "default_typewriter")]
    typewriter_ms: u64,
    #[serde(default = "default_music_delay")]
    music_delay_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlPopulation {
    #[serde(default = "default_bear")]
    bear: u32,
    #[serde(default = "default_raccoon")]
    raccoon: u32,
    #[serde(default = "default_deer")]
    deer: u32,
    #[serde(default = "default_bigdeer")]
    bigdeer: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_catch")]
    catch: Vec<String>,
    #[serde(default = "default_interact")]
    interact: Vec<String>,
    #[serde(default = "default_reset")]
    reset: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_save_file")]
    save_file: String,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_assets_dir")]
    assets_dir: String,
}

// ── Defaults ──

fn default_frame_ms() -> u64 { 33 }          // ~30 fps
fn default_move_delay() -> u64 { MOVE_DELAY_MS }
fn default_animation_speed() -> f32 { ANIMATION_SPEED }  // 64px tile in 8 frames
fn default_typewriter() -> u64 { CHAR_DELAY_MS }
fn default_music_delay() -> u64 { 12_000 }

fn default_bear() -> u32 { 3 }
fn default_raccoon() -> u32 { 3 }
fn default_deer() -> u32 { 2 }
fn default_bigdeer() -> u32 { 2 }

fn default_catch() -> Vec<String> { vec!["A".into(), "X".into()] }
fn default_interact() -> Vec<String> { vec!["B".into(), "Y".into()] }
fn default_reset() -> Vec<String> { vec!["Start".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }

fn default_save_file() -> String { "save_data.dat".into() }
fn default_log_file() -> String { "campus-critters.log".into() }
fn default_log_level() -> String { "info".into() }
fn default_assets_dir() -> String { "assets".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            frame_ms: default_frame_ms(),
            move_delay_ms: default_move_delay(),
            animation_speed: default_animation_speed(),
            typewriter_ms: default_typewriter(),
            music_delay_ms: default_music_delay(),
        }
    }
}

impl Default for TomlPopulation {
    fn default() -> Self {
        TomlPopulation {
            bear: default_bear(),
            raccoon: default_raccoon(),
            deer: default_deer(),
            bigdeer: default_bigdeer(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            catch: default_catch(),
            interact: default_interact(),
            reset: default_reset(),
            quit: default_quit(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            save_file: default_save_file(),
            log_file: default_log_file(),
            log_level: default_log_level(),
            assets_dir: default_assets_dir(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let mut warnings = vec![];
        let toml_cfg = load_toml(&search_dirs, &mut warnings);
        Self::from_toml(toml_cfg, &search_dirs, warnings)
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf], mut warnings: Vec<String>) -> Self {
        let mut timing = TimingConfig {
            frame_ms: cfg.timing.frame_ms,
            move_delay_ms: cfg.timing.move_delay_ms,
            animation_speed: cfg.timing.animation_speed,
            typewriter_ms: cfg.timing.typewriter_ms,
            music_delay_ms: cfg.timing.music_delay_ms,
        };
        if timing.frame_ms == 0 {
            warnings.push("timing.frame_ms must be positive, using default".into());
            timing.frame_ms = default_frame_ms();
        }
        if !(timing.animation_speed > 0.0) {
            warnings.push("timing.animation_speed must be positive, using default".into());
            timing.animation_speed = default_animation_speed();
        }

        // Resolve assets directory against the search path
        let assets_str = &cfg.general.assets_dir;
        let assets_dir = if PathBuf::from(assets_str).is_absolute() {
            PathBuf::from(assets_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(assets_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(assets_str))
        };

        GameConfig {
            timing,
            population: PerSpecies([
                cfg.population.bear,
                cfg.population.raccoon,
                cfg.population.deer,
                cfg.population.bigdeer,
            ]),
            gamepad: GamepadConfig {
                catch: cfg.gamepad.catch,
                interact: cfg.gamepad.interact,
                reset: cfg.gamepad.reset,
                quit: cfg.gamepad.quit,
            },
            save_file: cfg.general.save_file,
            log_file: cfg.general.log_file,
            log_level: cfg.general.log_level,
            assets_dir,
            warnings,
        }
    }

    /// Asset references in the room tables are written `assets/...`;
    /// rebase them onto the configured assets directory.
    pub fn asset_path(&self, reference: &str) -> PathBuf {
        let rel = reference.strip_prefix("assets/").unwrap_or(reference);
        self.assets_dir.join(rel)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), &[], vec![])
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/campus-critters)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/campus-critters");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        warnings.push(format!("{} parse error, using defaults: {e}", path.display()));
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warnings.push(format!("could not read {}: {e}", path.display()));
                }
            }
        }
    }
    TomlConfig::default()
}
