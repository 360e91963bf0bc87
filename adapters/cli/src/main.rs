#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays and checks Sandsink levels.

mod campaign;
mod level_file;
mod render;
mod session;

use std::{
    fs,
    io::{self, Cursor, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::error;
use sandsink_core::{Level, TileKind};
use sandsink_system_turn::TurnController;

use crate::{
    campaign::{Campaign, CampaignConfig},
    level_file::{parse_level, serialize_level},
    session::Outcome,
};

/// Sliding-block puzzles played one turn at a time.
#[derive(Debug, Parser)]
#[command(name = "sandsink", version)]
struct Cli {
    /// Log debug output unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Plays a single level file.
    Play {
        /// Level file to play.
        level: PathBuf,
        /// Moves to apply instead of reading standard input, e.g. "ddsw".
        #[arg(long)]
        moves: Option<String>,
    },
    /// Plays every level of a campaign in order.
    Campaign {
        /// Campaign configuration file. Defaults to sandsink.toml when present.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Parses and validates level files.
    Check {
        /// Level files to check.
        #[arg(required = true)]
        levels: Vec<PathBuf>,
    },
    /// Rewrites level files in the canonical padded layout.
    Format {
        /// Level files to rewrite.
        #[arg(required = true)]
        levels: Vec<PathBuf>,
    },
}

/// Entry point for the Sandsink command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        CliCommand::Play { level, moves } => run_play(&level, moves.as_deref()),
        CliCommand::Campaign { config } => run_campaign(config.as_deref()),
        CliCommand::Check { levels } => run_check(&levels),
        CliCommand::Format { levels } => run_format(&levels),
    }
}

fn run_play(path: &Path, moves: Option<&str>) -> Result<()> {
    let level = read_level(path)?;
    let mut controller = TurnController::setup(level)
        .with_context(|| format!("level {} is not playable", path.display()))?;
    let mut stdout = io::stdout().lock();

    let outcome = match moves {
        Some(script) => session::play(&mut controller, Cursor::new(script), &mut stdout)?,
        None => session::play(&mut controller, io::stdin().lock(), &mut stdout)?,
    };
    if outcome == Outcome::Stopped {
        writeln!(
            stdout,
            "level not completed after {} turns",
            controller.turn_count()
        )?;
    }
    Ok(())
}

fn run_campaign(config: Option<&Path>) -> Result<()> {
    let config = CampaignConfig::load(config)?;
    let mut campaign = Campaign::load(&config)?;
    let _ = session::play_campaign(&mut campaign, io::stdin().lock(), &mut io::stdout().lock())?;
    Ok(())
}

fn run_check(paths: &[PathBuf]) -> Result<()> {
    let mut failures = 0_usize;
    for path in paths {
        match read_level(path).and_then(|level| {
            level
                .validate()
                .with_context(|| format!("level {} is not playable", path.display()))?;
            Ok(level)
        }) {
            Ok(level) => println!("{}: {}", path.display(), summary(&level)),
            Err(error) => {
                error!("{error:#}");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        bail!("{failures} of {} level files failed the check", paths.len());
    }
    Ok(())
}

fn run_format(paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        let level = read_level(path)?;
        fs::write(path, serialize_level(&level))
            .with_context(|| format!("failed to write level file at {}", path.display()))?;
    }
    Ok(())
}

fn read_level(path: &Path) -> Result<Level> {
    let id = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read level file at {}", path.display()))?;
    parse_level(id, &contents).with_context(|| format!("failed to parse level {}", path.display()))
}

fn summary(level: &Level) -> String {
    let size = level.size();
    let entities: usize = TileKind::ALL.iter().map(|kind| level.count_of(*kind)).sum();
    format!(
        "{:?} {}x{}, {} layers, {} entities ({} crates, {} rocks, {} exits)",
        level.name(),
        size.width(),
        size.height(),
        level.layers().len(),
        entities,
        level.count_of(TileKind::Crate),
        level.count_of(TileKind::Rock),
        level.count_of(TileKind::Exit)
    )
}
