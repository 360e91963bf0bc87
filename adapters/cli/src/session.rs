//! Line-oriented play loops driving a [`TurnController`] from text input.

use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};
use log::warn;
use sandsink_core::Direction;
use sandsink_system_turn::{LevelPhase, TurnController};

use crate::{campaign::Campaign, render::render};

/// Single keystroke understood by the play loops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Input {
    /// Step the actor.
    Move(Direction),
    /// Set the current level up again.
    Restart,
    /// Skip to the next campaign level.
    Next,
    /// Go back to the previous campaign level.
    Previous,
    /// Stop playing.
    Quit,
}

/// Maps a character onto an input. Whitespace and unknown characters yield `None`.
#[must_use]
pub(crate) fn parse_input(symbol: char) -> Option<Input> {
    let input = match symbol {
        'w' | 'k' | 'U' => Input::Move(Direction::North),
        'd' | 'l' | 'R' => Input::Move(Direction::East),
        's' | 'j' | 'D' => Input::Move(Direction::South),
        'a' | 'h' | 'L' => Input::Move(Direction::West),
        'r' => Input::Restart,
        'n' => Input::Next,
        'p' => Input::Previous,
        'q' => Input::Quit,
        _ => return None,
    };
    Some(input)
}

/// How a play loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The level, or the last level of the campaign, was completed.
    Completed,
    /// The player quit or the input ran out first.
    Stopped,
}

/// Plays a single level until it is completed or the input ends.
pub(crate) fn play<R: BufRead, W: Write>(
    controller: &mut TurnController,
    input: R,
    out: &mut W,
) -> Result<Outcome> {
    write!(out, "{}", render(controller.world()))?;
    for symbol in symbols(input) {
        let symbol = symbol?;
        let Some(key) = parse_input(symbol) else {
            bail!("unknown input {symbol:?}");
        };
        match key {
            Input::Move(direction) => {
                step(controller, direction, out)?;
                if controller.phase() == LevelPhase::Completed {
                    writeln!(
                        out,
                        "level completed in {} turns",
                        controller.turn_count()
                    )?;
                    return Ok(Outcome::Completed);
                }
            }
            Input::Restart => {
                controller.restart();
                write!(out, "{}", render(controller.world()))?;
            }
            Input::Next | Input::Previous => warn!("level skipping is only available in campaigns"),
            Input::Quit => return Ok(Outcome::Stopped),
        }
    }
    Ok(Outcome::Stopped)
}

/// Plays every campaign level in order, wrapping to a victory after the last one.
pub(crate) fn play_campaign<R: BufRead, W: Write>(
    campaign: &mut Campaign,
    input: R,
    out: &mut W,
) -> Result<Outcome> {
    let mut controller = TurnController::setup(campaign.current().clone())
        .with_context(|| format!("failed to set up level {:?}", campaign.current().name()))?;
    announce(campaign, &controller, out)?;

    for symbol in symbols(input) {
        let symbol = symbol?;
        let Some(key) = parse_input(symbol) else {
            bail!("unknown input {symbol:?}");
        };
        let delta = match key {
            Input::Move(direction) => {
                step(&mut controller, direction, out)?;
                if controller.phase() != LevelPhase::Completed {
                    continue;
                }
                writeln!(
                    out,
                    "level completed in {} turns",
                    controller.turn_count()
                )?;
                1
            }
            Input::Restart => {
                controller.restart();
                write!(out, "{}", render(controller.world()))?;
                continue;
            }
            Input::Next => 1,
            Input::Previous => -1,
            Input::Quit => return Ok(Outcome::Stopped),
        };

        let completed = controller.phase() == LevelPhase::Completed;
        let level = campaign.go_to(delta).clone();
        if completed && campaign.current_index() == 0 {
            writeln!(out, "victory! every level is completed")?;
            return Ok(Outcome::Completed);
        }
        controller
            .reload(level)
            .with_context(|| format!("failed to set up level {:?}", campaign.current().name()))?;
        announce(campaign, &controller, out)?;
    }
    Ok(Outcome::Stopped)
}

fn step<W: Write>(controller: &mut TurnController, direction: Direction, out: &mut W) -> Result<()> {
    if controller.process_turn(direction).is_empty() {
        writeln!(out, "cannot move {direction:?}")?;
    } else {
        write!(out, "{}", render(controller.world()))?;
    }
    Ok(())
}

fn announce<W: Write>(campaign: &Campaign, controller: &TurnController, out: &mut W) -> Result<()> {
    writeln!(
        out,
        "level {}/{}: {}",
        campaign.current_index() + 1,
        campaign.len(),
        controller.level().name()
    )?;
    write!(out, "{}", render(controller.world()))?;
    Ok(())
}

fn symbols<R: BufRead>(input: R) -> impl Iterator<Item = Result<char>> {
    input
        .lines()
        .flat_map(|line| match line.context("failed to read input") {
            Ok(line) => line
                .chars()
                .filter(|symbol| !symbol.is_whitespace())
                .map(Ok)
                .collect::<Vec<_>>(),
            Err(error) => vec![Err(error)],
        })
}
