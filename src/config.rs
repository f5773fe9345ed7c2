/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::math::Vec3;

// ── Public Config Structs ──

#[derive(Clone, Debug, Default)]
pub struct GameConfig {
    pub movement: MovementConfig,
    pub camera: CameraConfig,
    pub session: SessionConfig,
    pub particles: ParticleConfig,
    pub keys: KeyConfig,
    pub gamepad: GamepadConfig,
    pub maze: MazeConfig,
}

#[derive(Clone, Debug)]
pub struct MovementConfig {
    pub speed: f32,         // world units per frame, per axis
    pub player_extent: Vec3, // full box size
}

#[derive(Clone, Debug)]
pub struct CameraConfig {
    pub offset: Vec3,
    pub blend: f32, // lerp factor per frame, 1.0 = rigid attach
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub reset_delay_secs: f32,
    pub frame_ms: u64,
}

#[derive(Clone, Debug)]
pub struct ParticleConfig {
    pub count: usize,
    pub spread: f32,  // side of the spawn cube
    pub rise: f32,    // per frame
    pub ceiling: f32, // relative to burst origin
    pub floor: f32,   // relative to burst origin
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct KeyConfig {
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub start: Vec<String>,
    pub reset: Vec<String>,
    pub quit: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct MazeConfig {
    pub file: Option<PathBuf>,
    pub cell_size: f32,
    pub wall_height: f32,
    pub goal_radius: f32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config.toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid [{section}] {key}: {reason}")]
    Invalid {
        section: &'static str,
        key: &'static str,
        reason: String,
    },
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    movement: TomlMovement,
    #[serde(default)]
    camera: TomlCamera,
    #[serde(default)]
    session: TomlSession,
    #[serde(default)]
    particles: TomlParticles,
    #[serde(default)]
    keys: TomlKeys,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    maze: TomlMaze,
}

#[derive(Deserialize, Debug)]
struct TomlMovement {
    #[serde(default = "default_speed")]
    speed: f32,
    #[serde(default = "default_player_extent")]
    player_extent: [f32; 3],
}

#[derive(Deserialize, Debug)]
struct TomlCamera {
    #[serde(default = "default_camera_offset")]
    offset: [f32; 3],
    #[serde(default = "default_camera_blend")]
    blend: f32,
}

#[derive(Deserialize, Debug)]
struct TomlSession {
    #[serde(default = "default_reset_delay")]
    reset_delay_secs: f32,
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlParticles {
    #[serde(default = "default_particle_count")]
    count: usize,
    #[serde(default = "default_particle_spread")]
    spread: f32,
    #[serde(default = "default_particle_rise")]
    rise: f32,
    #[serde(default = "default_particle_ceiling")]
    ceiling: f32,
    #[serde(default)]
    floor: f32,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlKeys {
    #[serde(default = "default_keys_up")]
    up: Vec<String>,
    #[serde(default = "default_keys_down")]
    down: Vec<String>,
    #[serde(default = "default_keys_left")]
    left: Vec<String>,
    #[serde(default = "default_keys_right")]
    right: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_start")]
    start: Vec<String>,
    #[serde(default = "default_pad_reset")]
    reset: Vec<String>,
    #[serde(default = "default_pad_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlMaze {
    #[serde(default)]
    file: Option<String>,
    #[serde(default = "default_cell_size")]
    cell_size: f32,
    #[serde(default = "default_wall_height")]
    wall_height: f32,
    #[serde(default = "default_goal_radius")]
    goal_radius: f32,
}

// ── Defaults ──

fn default_speed() -> f32 { 0.15 }
fn default_player_extent() -> [f32; 3] { [1.0, 1.0, 1.0] }
fn default_camera_offset() -> [f32; 3] { [0.0, 10.0, 10.0] }
fn default_camera_blend() -> f32 { 0.1 }
fn default_reset_delay() -> f32 { 2.0 }
fn default_frame_ms() -> u64 { 16 } // ~60 fps
fn default_particle_count() -> usize { 100 }
fn default_particle_spread() -> f32 { 1.0 }
fn default_particle_rise() -> f32 { 0.02 }
fn default_particle_ceiling() -> f32 { 2.0 }
fn default_cell_size() -> f32 { 1.0 }
fn default_wall_height() -> f32 { 1.0 }
fn default_goal_radius() -> f32 { 1.0 }

// Gamepad D-pad and stick show up as virtual key names, so one
// binding table serves both keyboard and pad.
fn default_keys_up() -> Vec<String> { names(&["ArrowUp", "w", "W", "DPadUp", "StickUp"]) }
fn default_keys_down() -> Vec<String> { names(&["ArrowDown", "s", "S", "DPadDown", "StickDown"]) }
fn default_keys_left() -> Vec<String> { names(&["ArrowLeft", "a", "A", "DPadLeft", "StickLeft"]) }
fn default_keys_right() -> Vec<String> { names(&["ArrowRight", "d", "D", "DPadRight", "StickRight"]) }

fn default_pad_start() -> Vec<String> { names(&["Start", "A"]) }
fn default_pad_reset() -> Vec<String> { names(&["Start", "Y"]) }
fn default_pad_quit() -> Vec<String> { names(&["Select"]) }

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for TomlMovement {
    fn default() -> Self {
        TomlMovement {
            speed: default_speed(),
            player_extent: default_player_extent(),
        }
    }
}

impl Default for TomlCamera {
    fn default() -> Self {
        TomlCamera {
            offset: default_camera_offset(),
            blend: default_camera_blend(),
        }
    }
}

impl Default for TomlSession {
    fn default() -> Self {
        TomlSession {
            reset_delay_secs: default_reset_delay(),
            frame_ms: default_frame_ms(),
        }
    }
}

impl Default for TomlParticles {
    fn default() -> Self {
        TomlParticles {
            count: default_particle_count(),
            spread: default_particle_spread(),
            rise: default_particle_rise(),
            ceiling: default_particle_ceiling(),
            floor: 0.0,
            seed: None,
        }
    }
}

impl Default for TomlKeys {
    fn default() -> Self {
        TomlKeys {
            up: default_keys_up(),
            down: default_keys_down(),
            left: default_keys_left(),
            right: default_keys_right(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            start: default_pad_start(),
            reset: default_pad_reset(),
            quit: default_pad_quit(),
        }
    }
}

impl Default for TomlMaze {
    fn default() -> Self {
        TomlMaze {
            file: None,
            cell_size: default_cell_size(),
            wall_height: default_wall_height(),
            goal_radius: default_goal_radius(),
        }
    }
}

impl Default for MovementConfig {
    fn default() -> Self {
        TomlMovement::default().into()
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        TomlCamera::default().into()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        TomlSession::default().into()
    }
}

impl Default for ParticleConfig {
    fn default() -> Self {
        TomlParticles::default().into()
    }
}

impl Default for KeyConfig {
    fn default() -> Self {
        TomlKeys::default().into()
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        TomlGamepad::default().into()
    }
}

impl Default for MazeConfig {
    fn default() -> Self {
        TomlMaze::default().into()
    }
}

// ── Schema → public structs ──

fn to_vec3(a: [f32; 3]) -> Vec3 {
    Vec3::new(a[0], a[1], a[2])
}

impl From<TomlMovement> for MovementConfig {
    fn from(t: TomlMovement) -> Self {
        MovementConfig { speed: t.speed, player_extent: to_vec3(t.player_extent) }
    }
}

impl From<TomlCamera> for CameraConfig {
    fn from(t: TomlCamera) -> Self {
        CameraConfig { offset: to_vec3(t.offset), blend: t.blend }
    }
}

impl From<TomlSession> for SessionConfig {
    fn from(t: TomlSession) -> Self {
        SessionConfig { reset_delay_secs: t.reset_delay_secs, frame_ms: t.frame_ms }
    }
}

impl From<TomlParticles> for ParticleConfig {
    fn from(t: TomlParticles) -> Self {
        ParticleConfig {
            count: t.count,
            spread: t.spread,
            rise: t.rise,
            ceiling: t.ceiling,
            floor: t.floor,
            seed: t.seed,
        }
    }
}

impl From<TomlKeys> for KeyConfig {
    fn from(t: TomlKeys) -> Self {
        KeyConfig { up: t.up, down: t.down, left: t.left, right: t.right }
    }
}

impl From<TomlGamepad> for GamepadConfig {
    fn from(t: TomlGamepad) -> Self {
        GamepadConfig { start: t.start, reset: t.reset, quit: t.quit }
    }
}

impl From<TomlMaze> for MazeConfig {
    fn from(t: TomlMaze) -> Self {
        MazeConfig {
            file: t.file.map(PathBuf::from),
            cell_size: t.cell_size,
            wall_height: t.wall_height,
            goal_radius: t.goal_radius,
        }
    }
}

impl From<TomlConfig> for GameConfig {
    fn from(t: TomlConfig) -> Self {
        GameConfig {
            movement: t.movement.into(),
            camera: t.camera.into(),
            session: t.session.into(),
            particles: t.particles.into(),
            keys: t.keys.into(),
            gamepad: t.gamepad.into(),
            maze: t.maze.into(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/maze3d`.
    /// Missing file or missing keys gracefully fall back to defaults;
    /// an unreadable or invalid file is logged and ignored.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();

        for dir in &search_dirs {
            let path = dir.join("config.toml");
            if !path.exists() {
                continue;
            }
            match GameConfig::from_file(&path) {
                Ok(mut cfg) => {
                    log::info!("loaded {}", path.display());
                    cfg.maze.file = cfg.maze.file.map(|f| resolve_relative(&f, dir));
                    return cfg;
                }
                Err(e) => {
                    log::warn!("{e}");
                    log::warn!("using default settings");
                    return GameConfig::default();
                }
            }
        }
        log::debug!("no config.toml found, using defaults");
        GameConfig::default()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        GameConfig::from_toml_str(&text)
    }

    /// Parse and validate a TOML document. Absent keys take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: TomlConfig = toml::from_str(text)?;
        let cfg: GameConfig = raw.into();
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(section: &'static str, key: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid { section, key, reason: reason.into() }
        }

        if !(self.movement.speed.is_finite() && self.movement.speed >= 0.0) {
            return Err(invalid("movement", "speed", "must be a finite, non-negative number"));
        }
        if !self.movement.player_extent.iter().all(|e| e.is_finite() && *e > 0.0) {
            return Err(invalid("movement", "player_extent", "every component must be > 0"));
        }
        if !(self.camera.blend > 0.0 && self.camera.blend <= 1.0) {
            return Err(invalid("camera", "blend", "must be in (0, 1]"));
        }
        if !(self.session.reset_delay_secs.is_finite() && self.session.reset_delay_secs >= 0.0) {
            return Err(invalid("session", "reset_delay_secs", "must be >= 0"));
        }
        if self.session.frame_ms == 0 {
            return Err(invalid("session", "frame_ms", "must be at least 1"));
        }
        if !self.camera.offset.iter().all(|c| c.is_finite()) {
            return Err(invalid("camera", "offset", "every component must be finite"));
        }
        for (key, value) in [
            ("spread", self.particles.spread),
            ("rise", self.particles.rise),
            ("ceiling", self.particles.ceiling),
            ("floor", self.particles.floor),
        ] {
            if !value.is_finite() {
                return Err(invalid("particles", key, "must be finite"));
            }
        }
        if self.particles.ceiling <= self.particles.floor {
            return Err(invalid("particles", "ceiling", "must be above floor"));
        }
        if self.particles.spread < 0.0 {
            return Err(invalid("particles", "spread", "must be >= 0"));
        }
        for (key, value) in [
            ("cell_size", self.maze.cell_size),
            ("wall_height", self.maze.wall_height),
            ("goal_radius", self.maze.goal_radius),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid("maze", key, "must be > 0"));
            }
        }
        Ok(())
    }
}

fn resolve_relative(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/maze3d");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}
