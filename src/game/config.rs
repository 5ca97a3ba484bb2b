//! Battle tuning parameters.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```toml
//! # battle.toml
//! max_turns = 300
//! bullet_range = 6
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Rules for a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BattleConfig {
    /// Turns before the battle is declared a draw.
    pub max_turns: u32,
    /// Starting hit points.
    pub max_hp: i32,
    /// Cells a bullet travels per turn.
    pub bullet_speed: u32,
    /// Cells a bullet may travel before it fizzles.
    pub bullet_range: i32,
    /// Register ops a CPU may run per turn before it is forced to wait.
    pub max_ops_per_turn: u32,
    /// Entries kept in the message log.
    pub message_limit: usize,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            max_turns: 200,
            max_hp: 3,
            bullet_speed: 2,
            bullet_range: 8,
            max_ops_per_turn: 100,
            message_limit: 64,
        }
    }
}

impl BattleConfig {
    /// Parse a TOML document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML, has unknown keys, or
    /// sets a value that makes no sense (e.g. zero hit points).
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("loaded battle config from {}: {config:?}", path.display());
        Ok(config)
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_turns == 0 {
            return Err(ConfigError::Invalid("max_turns must be at least 1"));
        }
        if self.max_hp <= 0 {
            return Err(ConfigError::Invalid("max_hp must be at least 1"));
        }
        if self.bullet_range <= 0 {
            return Err(ConfigError::Invalid("bullet_range must be at least 1"));
        }
        Ok(())
    }
}

/// Errors loading a [`BattleConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The file could not be read.
    Io(String),
    /// The file is not a valid config.
    Parse(String),
    /// A field has an unusable value.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "cannot read config: {msg}"),
            ConfigError::Parse(msg) => write!(f, "invalid config: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
