/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD, or the XDG
/// config dir. Missing files or keys fall back to defaults. Problems found
/// while loading are collected in `warnings` so they can be logged once the
/// subscriber exists.

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::ConfigError;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub session: SessionConfig,
    pub timing: TimingConfig,
    pub gamepad: GamepadConfig,
    pub maze_file: Option<PathBuf>,
    pub log_dir: PathBuf,
    pub warnings: Vec<String>,
}

/// Tunables the simulation core reads. Nothing in `domain` or `sim` hardcodes these.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub cell_size: f64,
    pub player_speed: f64,
    /// `[row, col]`
    pub player_spawn: [usize; 2],
    pub adversary_count: usize,
    /// Adversary `i` moves at `adversary_speeds[i % len]`.
    pub adversary_speeds: Vec<f64>,
    pub power_pickup_count: usize,
    pub power_duration_ms: u64,
    pub scatter_ms: u64,
    pub chase_ms: u64,
    /// Inset of the player's leading-corner probes.
    pub corner_padding: f64,
    pub wander_retarget_chance: f64,
    /// Score for eating an adversary while powered.
    pub eat_bonus: u32,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub restart_delay_ms: u64,
    pub win_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::CellSize(self.cell_size));
        }
        if !(self.player_speed.is_finite() && self.player_speed > 0.0) {
            return Err(ConfigError::PlayerSpeed(self.player_speed));
        }
        if self.adversary_speeds.is_empty() {
            return Err(ConfigError::NoAdversarySpeeds);
        }
        for (index, &speed) in self.adversary_speeds.iter().enumerate() {
            if !(speed.is_finite() && speed > 0.0) {
                return Err(ConfigError::AdversarySpeed { index, speed });
            }
        }
        // A single tick must not carry a corner check across a whole wall cell.
        if self.player_speed > self.cell_size {
            return Err(ConfigError::TooFast {
                who: "player",
                speed: self.player_speed,
                cell_size: self.cell_size,
            });
        }
        if let Some(&speed) = self.adversary_speeds.iter().find(|&&s| s >= self.cell_size) {
            return Err(ConfigError::TooFast {
                who: "adversary",
                speed,
                cell_size: self.cell_size,
            });
        }
        if !(self.corner_padding >= 0.0 && self.corner_padding < self.cell_size / 2.0) {
            return Err(ConfigError::CornerPadding { padding: self.corner_padding });
        }
        if !(0.0..=1.0).contains(&self.wander_retarget_chance) {
            return Err(ConfigError::RetargetChance(self.wander_retarget_chance));
        }
        Ok(())
    }

    /// Speed of adversary `id`.
    pub fn adversary_speed(&self, id: usize) -> f64 {
        self.adversary_speeds[id % self.adversary_speeds.len()]
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        TomlGame::default().into()
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    game: TomlGame,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlGame {
    #[serde(default = "default_cell_size")]
    cell_size: f64,
    #[serde(default = "default_player_speed")]
    player_speed: f64,
    #[serde(default = "default_player_spawn")]
    player_spawn: [usize; 2],
    #[serde(default = "default_adversary_count")]
    adversary_count: usize,
    #[serde(default = "default_adversary_speeds")]
    adversary_speeds: Vec<f64>,
    #[serde(default = "default_power_pickup_count")]
    power_pickup_count: usize,
    #[serde(default = "default_power_duration")]
    power_duration_ms: u64,
    #[serde(default = "default_scatter")]
    scatter_ms: u64,
    #[serde(default = "default_chase")]
    chase_ms: u64,
    #[serde(default = "default_corner_padding")]
    corner_padding: f64,
    #[serde(default = "default_retarget_chance")]
    wander_retarget_chance: f64,
    #[serde(default = "default_eat_bonus")]
    eat_bonus: u32,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_restart_delay")]
    restart_delay_ms: u64,
    #[serde(default = "default_win_delay")]
    win_delay_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    maze_file: Option<String>,
    #[serde(default)]
    log_dir: Option<String>,
}

// ── Defaults ──

fn default_cell_size() -> f64 { 30.0 }
fn default_player_speed() -> f64 { 2.0 }
fn default_player_spawn() -> [usize; 2] { [1, 1] }
fn default_adversary_count() -> usize { 2 }
fn default_adversary_speeds() -> Vec<f64> { vec![1.5] }
fn default_power_pickup_count() -> usize { 5 }
fn default_power_duration() -> u64 { 5000 }
fn default_scatter() -> u64 { 7000 }
fn default_chase() -> u64 { 20000 }
fn default_corner_padding() -> f64 { 5.0 }
fn default_retarget_chance() -> f64 { 0.1 }
fn default_eat_bonus() -> u32 { 10 }

fn default_tick_rate() -> u64 { 16 }     // ~60 Hz, one tick per display frame
fn default_restart_delay() -> u64 { 2000 }
fn default_win_delay() -> u64 { 3000 }

fn default_confirm() -> Vec<String> { vec!["Start".into(), "South".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_restart() -> Vec<String> { vec!["Start".into()] }

impl Default for TomlGame {
    fn default() -> Self {
        TomlGame {
            cell_size: default_cell_size(),
            player_speed: default_player_speed(),
            player_spawn: default_player_spawn(),
            adversary_count: default_adversary_count(),
            adversary_speeds: default_adversary_speeds(),
            power_pickup_count: default_power_pickup_count(),
            power_duration_ms: default_power_duration(),
            scatter_ms: default_scatter(),
            chase_ms: default_chase(),
            corner_padding: default_corner_padding(),
            wander_retarget_chance: default_retarget_chance(),
            eat_bonus: default_eat_bonus(),
            seed: None,
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            restart_delay_ms: default_restart_delay(),
            win_delay_ms: default_win_delay(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            restart: default_restart(),
        }
    }
}

impl From<TomlGame> for SessionConfig {
    fn from(g: TomlGame) -> Self {
        SessionConfig {
            cell_size: g.cell_size,
            player_speed: g.player_speed,
            player_spawn: g.player_spawn,
            adversary_count: g.adversary_count,
            adversary_speeds: g.adversary_speeds,
            power_pickup_count: g.power_pickup_count,
            power_duration_ms: g.power_duration_ms,
            scatter_ms: g.scatter_ms,
            chase_ms: g.chase_ms,
            corner_padding: g.corner_padding,
            wander_retarget_chance: g.wander_retarget_chance,
            eat_bonus: g.eat_bonus,
            seed: g.seed,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `$XDG_CONFIG_HOME/ghostmaze`.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let mut warnings = Vec::new();
        let toml_cfg = load_toml(&search_dirs, &mut warnings);
        Self::from_toml(toml_cfg, &search_dirs, warnings)
    }

    /// Parse a config document directly. Used by tests and `load`.
    pub fn parse(text: &str) -> Self {
        let mut warnings = Vec::new();
        let toml_cfg = parse_toml(text, "config.toml", &mut warnings);
        Self::from_toml(toml_cfg, &[], warnings)
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf], mut warnings: Vec<String>) -> Self {
        let mut session: SessionConfig = toml_cfg.game.into();
        if let Err(e) = session.validate() {
            warnings.push(format!("invalid [game] settings ({e}); using defaults"));
            session = SessionConfig::default();
        }

        // Relative maze paths resolve against the config search dirs first.
        let maze_file = toml_cfg.general.maze_file.map(|name| {
            let path = PathBuf::from(&name);
            if path.is_absolute() {
                return path;
            }
            search_dirs
                .iter()
                .map(|d| d.join(&name))
                .find(|p| p.is_file())
                .unwrap_or(path)
        });

        let log_dir = toml_cfg
            .general
            .log_dir
            .map(PathBuf::from)
            .unwrap_or_else(default_log_dir);

        GameConfig {
            session,
            timing: TimingConfig {
                tick_rate_ms: toml_cfg.timing.tick_rate_ms.max(1),
                restart_delay_ms: toml_cfg.timing.restart_delay_ms,
                win_delay_ms: toml_cfg.timing.win_delay_ms,
            },
            gamepad: GamepadConfig {
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
                restart: toml_cfg.gamepad.restart,
            },
            maze_file,
            log_dir,
            warnings,
        }
    }
}

/// `$XDG_CACHE_HOME/ghostmaze/logs`, else `~/.cache/ghostmaze/logs`, else `./logs`.
fn default_log_dir() -> PathBuf {
    if let Ok(cache) = std::env::var("XDG_CACHE_HOME") {
        if !cache.is_empty() {
            return PathBuf::from(cache).join("ghostmaze/logs");
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".cache/ghostmaze/logs");
    }
    PathBuf::from("logs")
}

/// Candidate directories to search: exe dir + CWD + XDG config (deduplicated).
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

    // 3. XDG config home
    let xdg = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")));
    if let Some(base) = xdg {
        let dir = base.join("ghostmaze");
        if dir.is_dir() && !dirs.iter().any(|d| d == &dir) {
            dirs.push(dir);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn parse_toml(text: &str, origin: &str, warnings: &mut Vec<String>) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warnings.push(format!("{origin} parse error: {e}; using default settings"));
            TomlConfig::default()
        }
    }
}

/// Search for config.toml in candidate directories. The first one found wins.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => return parse_toml(&text, &path.display().to_string(), warnings),
                Err(e) => warnings.push(format!("could not read {}: {e}", path.display())),
            }
        }
    }
    TomlConfig::default()
}
