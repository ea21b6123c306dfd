/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub rules: RulesConfig,
    pub gamepad: GamepadConfig,
    pub scores_path: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimingConfig {
    pub start_time: f32,     // seconds on the clock at level start
    pub immunity_time: f32,  // grace window before the dark can catch you
    pub move_delay: f32,     // debounce between accepted character moves
    pub frame_ms: u64,
    pub tutorial_char: f32,  // typewriter delay per character
}

#[derive(Clone, Debug, PartialEq)]
pub struct RulesConfig {
    pub coin_spawn_attempts: u32,
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_start_time")]
    start_time_secs: f32,
    #[serde(default = "default_immunity")]
    immunity_secs: f32,
    #[serde(default = "default_move_delay")]
    move_delay_ms: u64,
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_tutorial_char")]
    tutorial_char_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_coin_attempts")]
    coin_spawn_attempts: u32,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_scores_file")]
    scores_file: String,
}

// ── Defaults ──

fn default_start_time() -> f32 { 30.0 }
fn default_immunity() -> f32 { 3.0 }
fn default_move_delay() -> u64 { 150 }
fn default_frame_ms() -> u64 { 16 }
fn default_tutorial_char() -> u64 { 100 }
fn default_coin_attempts() -> u32 { 100 }

fn default_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into(), "B".into()] }
fn default_scores_file() -> String { "scores.json".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            start_time_secs: default_start_time(),
            immunity_secs: default_immunity(),
            move_delay_ms: default_move_delay(),
            frame_ms: default_frame_ms(),
            tutorial_char_ms: default_tutorial_char(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            coin_spawn_attempts: default_coin_attempts(),
            seed: None,
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            scores_file: default_scores_file(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig::from_toml(&TomlTiming::default())
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            coin_spawn_attempts: default_coin_attempts(),
            seed: None,
        }
    }
}

impl TimingConfig {
    fn from_toml(t: &TomlTiming) -> Self {
        TimingConfig {
            start_time: t.start_time_secs.max(0.0),
            immunity_time: t.immunity_secs.max(0.0),
            move_delay: t.move_delay_ms as f32 / 1000.0,
            frame_ms: t.frame_ms.max(1),
            tutorial_char: t.tutorial_char_ms as f32 / 1000.0,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let toml_cfg = load_toml(&candidate_dirs());
        Self::from_toml(toml_cfg, &data_dir())
    }

    fn from_toml(cfg: TomlConfig, data_dir: &Path) -> Self {
        let scores = PathBuf::from(&cfg.general.scores_file);
        let scores_path = if scores.is_absolute() {
            scores
        } else {
            data_dir.join(scores)
        };

        GameConfig {
            timing: TimingConfig::from_toml(&cfg.timing),
            rules: RulesConfig {
                coin_spawn_attempts: cfg.rules.coin_spawn_attempts,
                seed: cfg.rules.seed,
            },
            gamepad: GamepadConfig {
                confirm: cfg.gamepad.confirm,
                cancel: cfg.gamepad.cancel,
            },
            scores_path,
        }
    }
}

/// Writable directory for scores and the log file.
/// Exe directory if writable, else `~/.local/share/lightgame`, else CWD.
pub fn data_dir() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // System installs like /usr/games/ won't be writable
            let test_path = parent.join(".write_test_lightgame");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/lightgame");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a linked binary still finds its config.
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
        let xdg = PathBuf::from(&home).join(".local/share/lightgame");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    let sys = PathBuf::from("/usr/share/lightgame");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => {
                        log::info!("Loaded config from {}", path.display());
                        return cfg;
                    }
                    Err(e) => {
                        log::warn!("config.toml parse error: {e}; using default settings");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    log::info!("No config.toml found, using defaults");
    TomlConfig::default()
}
