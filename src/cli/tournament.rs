//! Tournament command implementation.

use super::output::{format_tournament_csv, format_tournament_text};
use super::{bot_name, load_config, load_program, CliError, TournamentFormat};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tankasm::game::Level;
use tankasm::tournament::{run_tournament_with_progress, schedule, Entry};

/// Execute the tournament command.
///
/// # Errors
///
/// Returns an error if a program cannot be loaded or the tournament fails.
#[allow(clippy::too_many_arguments, clippy::needless_pass_by_value)]
pub(crate) fn execute(
    bots: Vec<PathBuf>,
    levels: Vec<u8>,
    threads: Option<usize>,
    config: Option<PathBuf>,
    turns: Option<u32>,
    format: TournamentFormat,
    progress: bool,
) -> Result<(), CliError> {
    // Compile every program once, up front
    let mut entries = Vec::with_capacity(bots.len());
    for bot_path in &bots {
        entries.push(Entry::new(bot_name(bot_path), load_program(bot_path)?));
    }

    let levels = levels
        .into_iter()
        .map(Level::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    let config = load_config(config.as_deref(), turns)?;

    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        size_thread_pool(num_threads);
    }

    // Progress bar
    let pb = if progress {
        let total = schedule(entries.len(), &levels).len() as u64;
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} battles ({per_sec})")
            .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
            .progress_chars("=>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();
    let result = run_tournament_with_progress(&entries, &levels, &config, || {
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    })?;
    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }
    let duration = start.elapsed();

    // Output based on format
    match format {
        TournamentFormat::Text => {
            println!();
            print!("{}", format_tournament_text(&result));
            println!();
            println!("Duration: {:.2}s", duration.as_secs_f64());
        }
        TournamentFormat::Json => {
            let json = serde_json::to_string_pretty(&result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
        TournamentFormat::Csv => {
            print!("{}", format_tournament_csv(&result));
        }
    }

    Ok(())
}

/// Size rayon's global pool. Returns `false`, with a warning, if the pool
/// was already built.
fn size_thread_pool(num_threads: usize) -> bool {
    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        Ok(()) => true,
        Err(e) => {
            log::warn!("could not size the thread pool to {num_threads}: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resizing_built_pool_is_reported() {
        // Whether or not this first call wins, the global pool exists after it.
        let _ = size_thread_pool(2);
        assert!(!size_thread_pool(2));
    }
}
