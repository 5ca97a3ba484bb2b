//! Run command implementation.

use super::output::{format_text, format_turn, JsonBattleResult};
use super::{bot_name, load_config, load_program, read_file, CliError, OutputFormat};
use std::path::PathBuf;
use tankasm::game::{Arena, Level};
use tankasm::tournament::run_battle_observed;

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if a program or the arena cannot be loaded.
#[allow(clippy::too_many_arguments, clippy::needless_pass_by_value)]
pub(crate) fn execute(
    bots: [PathBuf; 2],
    level: u8,
    map: Option<PathBuf>,
    config: Option<PathBuf>,
    turns: Option<u32>,
    format: OutputFormat,
    trace: bool,
) -> Result<(), CliError> {
    let programs = [load_program(&bots[0])?, load_program(&bots[1])?];
    let names = [bot_name(&bots[0]), bot_name(&bots[1])];
    let config = load_config(config.as_deref(), turns)?;

    let (arena, arena_name) = match &map {
        Some(path) => (
            Arena::from_ascii(&read_file(path)?)?,
            path.display().to_string(),
        ),
        None => (Level::try_from(level)?.arena(), format!("level {level}")),
    };

    let mut snapshots = Vec::new();
    let mut final_state = None;
    let result = run_battle_observed(&programs, &arena, &config, |battle| {
        let state = battle.state();
        if trace {
            match format {
                OutputFormat::Text => print!("{}", format_turn(&state)),
                OutputFormat::Json => snapshots.push(state.clone()),
            }
        }
        final_state = Some(state);
    })?;

    match format {
        OutputFormat::Text => {
            if trace {
                println!();
            }
            print!("{}", format_text(&result, &names, &arena_name));
        }
        OutputFormat::Json => {
            let final_state =
                final_state.ok_or_else(|| CliError::new("battle ended before its first turn"))?;
            let json_result = JsonBattleResult {
                players: [&names[0], &names[1]],
                arena: &arena_name,
                result: &result,
                state: &final_state,
                trace: snapshots,
            };
            let json = serde_json::to_string_pretty(&json_result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}
