//! tankasm CLI - play, check and rank tank programs.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// tankasm - A deterministic tank arena driven by a tiny assembly language
#[derive(Parser, Debug)]
#[command(name = "tankasm")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play one battle between two programs
    Run {
        /// Program for P1
        p1: PathBuf,

        /// Program for P2
        p2: PathBuf,

        /// Built-in level (1-3)
        #[arg(short, long, default_value = "1", conflicts_with = "map")]
        level: u8,

        /// ASCII map file (`#` wall, `.` floor, `1`/`2` spawns)
        #[arg(short, long)]
        map: Option<PathBuf>,

        /// TOML battle config
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Maximum turns (overrides the config file)
        #[arg(short, long)]
        turns: Option<u32>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Print the board after every turn
        #[arg(long)]
        trace: bool,
    },

    /// Compile programs and report errors
    Check {
        /// Program files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print a disassembly of each program
        #[arg(long)]
        listing: bool,
    },

    /// Play every pair of programs on every level and rank them
    Tournament {
        /// Program files (at least 2)
        #[arg(required = true, num_args = 2..)]
        bots: Vec<PathBuf>,

        /// Levels to play, comma separated
        #[arg(long, value_delimiter = ',', default_value = "1,2,3")]
        levels: Vec<u8>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// TOML battle config
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Maximum turns per battle (overrides the config file)
        #[arg(short, long)]
        turns: Option<u32>,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::TournamentFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let result = match args.command {
        Commands::Run {
            p1,
            p2,
            level,
            map,
            config,
            turns,
            format,
            trace,
        } => cli::run::execute([p1, p2], level, map, config, turns, format, trace),

        Commands::Check { files, listing } => cli::check::execute(files, listing),

        Commands::Tournament {
            bots,
            levels,
            threads,
            config,
            turns,
            format,
            progress,
        } => cli::tournament::execute(bots, levels, threads, config, turns, format, progress),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
