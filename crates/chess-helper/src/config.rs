//! Configuration file loading for the chess helper.
//!
//! Settings live in a TOML file (`chess_helper.toml` in the working
//! directory by default). Every field has a default, so a missing file or a
//! partial one is fine.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chess_analysis::{EngineLocator, EngineSettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration file used when none is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "chess_helper.toml";

/// Log levels accepted by `log_level`.
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Errors that can occur when loading, saving or editing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read or write the configuration file.
    #[error("Failed to access config file: {0}")]
    IoError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// Failed to render the configuration as TOML.
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
    /// `set` was given a key that does not exist.
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
    /// `set` was given a value of the wrong type or out of range.
    #[error("Invalid value '{value}' for {key}: expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// Analysis engine settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine executable. When unset, the bundled engine next to the helper
    /// and then `stockfish` on the PATH are tried.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Search depth in plies.
    pub depth: u32,
    /// Time budget per query in milliseconds, 0 for none.
    pub time_budget_ms: u64,
    /// Engine strength, 0 to 20.
    pub skill_level: u8,
    /// Number of moves shown by `analyze`, best move included.
    pub alternatives: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: None,
            depth: 15,
            time_budget_ms: 1000,
            skill_level: 20,
            alternatives: 3,
        }
    }
}

impl EngineConfig {
    /// Search settings for the analysis engine.
    pub fn settings(&self) -> EngineSettings {
        EngineSettings {
            depth: self.depth,
            time_budget: (self.time_budget_ms > 0)
                .then(|| Duration::from_millis(self.time_budget_ms)),
            ..EngineSettings::default()
        }
        .with_skill_level(i64::from(self.skill_level))
    }

    /// Where to look for the engine executable.
    pub fn locator(&self) -> EngineLocator {
        EngineLocator::new(self.path.clone())
    }
}

/// Game recording settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    /// Name written to the PGN `White` tag.
    pub white: String,
    /// Name written to the PGN `Black` tag.
    pub black: String,
    /// Show engine analysis after every move.
    pub auto_analysis: bool,
    /// Save the game every `autosave_interval` moves.
    pub auto_save: bool,
    pub autosave_interval: usize,
    /// Directory for auto-saved games.
    pub export_dir: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            white: "White".to_string(),
            black: "Black".to_string(),
            auto_analysis: true,
            auto_save: true,
            autosave_interval: 10,
            export_dir: PathBuf::from("./saved_games/"),
        }
    }
}

/// Main helper configuration.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct HelperConfig {
    /// Minimum level of log lines written to stderr.
    pub log_level: String,
    pub engine: EngineConfig,
    pub game: GameConfig,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            engine: EngineConfig::default(),
            game: GameConfig::default(),
        }
    }
}

impl HelperConfig {
    /// Every key accepted by [`set`](Self::set).
    pub const KEYS: [&'static str; 12] = [
        "log_level",
        "engine.path",
        "engine.depth",
        "engine.time_budget_ms",
        "engine.skill_level",
        "engine.alternatives",
        "game.white",
        "game.black",
        "game.auto_analysis",
        "game.auto_save",
        "game.autosave_interval",
        "game.export_dir",
    ];

    /// Returns the default configuration file path.
    pub fn config_path() -> PathBuf {
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// Load the configuration at `path`, or the defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IoError`] if the file exists but cannot be read,
    /// or [`ConfigError::ParseError`] if the file contains invalid TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the configuration to `path` as TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Update one setting from its text form.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownKey`] for keys outside [`KEYS`](Self::KEYS),
    /// [`ConfigError::InvalidValue`] when the value does not parse or is out
    /// of range. The configuration is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |expected| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected,
        };
        match key {
            "log_level" => {
                let level = value.to_ascii_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(invalid("one of trace, debug, info, warn, error"));
                }
                self.log_level = level;
            }
            "engine.path" => {
                self.engine.path = match value {
                    "" | "none" => None,
                    path => Some(PathBuf::from(path)),
                };
            }
            "engine.depth" => {
                self.engine.depth = match value.parse::<u32>() {
                    Ok(depth) if depth > 0 => depth,
                    _ => return Err(invalid("a positive integer")),
                };
            }
            "engine.time_budget_ms" => {
                self.engine.time_budget_ms = value
                    .parse()
                    .map_err(|_| invalid("a number of milliseconds"))?;
            }
            "engine.skill_level" => {
                self.engine.skill_level = match value.parse::<u8>() {
                    Ok(level) if level <= 20 => level,
                    _ => return Err(invalid("an integer from 0 to 20")),
                };
            }
            "engine.alternatives" => {
                self.engine.alternatives = match value.parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => return Err(invalid("a positive integer")),
                };
            }
            "game.white" => self.game.white = value.to_string(),
            "game.black" => self.game.black = value.to_string(),
            "game.auto_analysis" => {
                self.game.auto_analysis =
                    parse_bool(value).ok_or_else(|| invalid("true or false"))?;
            }
            "game.auto_save" => {
                self.game.auto_save =
                    parse_bool(value).ok_or_else(|| invalid("true or false"))?;
            }
            "game.autosave_interval" => {
                self.game.autosave_interval = match value.parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => return Err(invalid("a positive number of moves")),
                };
            }
            "game.export_dir" => self.game.export_dir = PathBuf::from(value),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

impl fmt::Display for HelperConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self
            .engine
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(auto)".to_string());
        writeln!(f, "log_level: {}", self.log_level)?;
        writeln!(f, "engine.path: {}", path)?;
        writeln!(f, "engine.depth: {}", self.engine.depth)?;
        writeln!(f, "engine.time_budget_ms: {}", self.engine.time_budget_ms)?;
        writeln!(f, "engine.skill_level: {}", self.engine.skill_level)?;
        writeln!(f, "engine.alternatives: {}", self.engine.alternatives)?;
        writeln!(f, "game.white: {}", self.game.white)?;
        writeln!(f, "game.black: {}", self.game.black)?;
        writeln!(f, "game.auto_analysis: {}", self.game.auto_analysis)?;
        writeln!(f, "game.auto_save: {}", self.game.auto_save)?;
        writeln!(f, "game.autosave_interval: {}", self.game.autosave_interval)?;
        write!(f, "game.export_dir: {}", self.game.export_dir.display())
    }
}
