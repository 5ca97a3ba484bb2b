//! CLI command implementations for tankasm.

pub(crate) mod check;
pub(crate) mod run;
pub(crate) mod tournament;

mod output;

use clap::ValueEnum;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

use tankasm::game::{BattleConfig, ConfigError};
use tankasm::isa::{compile, Program};

/// Output format for the `run` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Output format for the `tournament` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum TournamentFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<tankasm::ArenaError> for CliError {
    fn from(e: tankasm::ArenaError) -> Self {
        Self::new(format!("Invalid arena: {e}"))
    }
}

impl From<tankasm::TurnError> for CliError {
    fn from(e: tankasm::TurnError) -> Self {
        Self::new(format!("Battle failed: {e}"))
    }
}

impl From<tankasm::tournament::TournamentError> for CliError {
    fn from(e: tankasm::tournament::TournamentError) -> Self {
        Self::new(e.to_string())
    }
}

/// Read a file, naming it in the error.
fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", path.display())))
}

/// Read and compile a program file.
fn load_program(path: &Path) -> Result<Program, CliError> {
    let source = read_file(path)?;
    compile(&source).map_err(|e| CliError::new(format!("{}: {e}", path.display())))
}

/// Display name for a program file: its file stem.
fn bot_name(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "unknown".to_string(), |n| n.to_string_lossy().to_string())
}

/// Load the battle config, applying a turn-limit override.
fn load_config(path: Option<&Path>, turns: Option<u32>) -> Result<BattleConfig, CliError> {
    let mut config = match path {
        Some(path) => BattleConfig::load(path)?,
        None => BattleConfig::default(),
    };
    if let Some(turns) = turns {
        config.max_turns = turns;
    }
    config.validate()?;
    Ok(config)
}
