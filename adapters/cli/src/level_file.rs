//! Text format used to store levels on disk.
//!
//! ```text
//! v1
//! :name First steps
//! :layers
//! 1111
//! 1101
//! ---
//! 2003
//! 0000
//! ```

use log::warn;
use sandsink_core::{Level, LevelError, TileLayer, MAX_LEVEL_SIZE, MIN_LEVEL_SIZE};
use thiserror::Error;

/// Version marker expected on the first line of a level file.
pub(crate) const LEVEL_FILE_VERSION: &str = "v1";
/// File extension of level files inside the level directory.
pub(crate) const LEVEL_FILE_EXTENSION: &str = "level";

const COMMAND_PREFIX: char = ':';
const LAYER_SEPARATOR: &str = "---";

/// Errors raised while reading a level file.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum LevelFileError {
    /// The file contained nothing but whitespace.
    #[error("level file is empty")]
    Empty,
    /// The first line names a format version this build cannot read.
    #[error("level file version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// Text appeared before the first command.
    #[error("unexpected content before the first command on line {line}")]
    StrayContent {
        /// One-based line number.
        line: usize,
    },
    /// No `:layers` command was found.
    #[error("level file does not describe any layers")]
    MissingLayers,
    /// A layer block between separators holds no rows.
    #[error("layer {index} is empty")]
    EmptyLayer {
        /// Zero-based layer index.
        index: usize,
    },
    /// A layer block could not be parsed.
    #[error("layer {index} is malformed: {source}")]
    Layer {
        /// Zero-based layer index.
        index: usize,
        /// Underlying layer error.
        source: LevelError,
    },
    /// The level is smaller than the editor allows.
    #[error(
        "level is {width}x{height}, the minimum is {}x{}",
        MIN_LEVEL_SIZE.width(),
        MIN_LEVEL_SIZE.height()
    )]
    TooSmall {
        /// Width in cells.
        width: u32,
        /// Height in cells.
        height: u32,
    },
    /// The level is larger than the editor allows.
    #[error(
        "level is {width}x{height}, the maximum is {}x{}",
        MAX_LEVEL_SIZE.width(),
        MAX_LEVEL_SIZE.height()
    )]
    TooLarge {
        /// Width in cells.
        width: u32,
        /// Height in cells.
        height: u32,
    },
}

/// Parses a level file. `id` names the level when the file has no `:name` command.
pub(crate) fn parse_level(id: &str, contents: &str) -> Result<Level, LevelFileError> {
    let mut lines = contents.lines().map(|line| line.trim_end_matches('\r')).enumerate();
    let version = lines
        .by_ref()
        .map(|(_, line)| line.trim())
        .find(|line| !line.is_empty())
        .ok_or(LevelFileError::Empty)?;
    if version != LEVEL_FILE_VERSION {
        return Err(LevelFileError::UnsupportedVersion(version.to_owned()));
    }

    let mut name = None;
    let mut layers = None;
    let mut current: Option<(String, Vec<&str>)> = None;
    for (index, line) in lines {
        if let Some(command) = line.strip_prefix(COMMAND_PREFIX) {
            if let Some(finished) = current.take() {
                apply_command(finished, &mut name, &mut layers)?;
            }
            let (command_name, value) = command
                .split_once(char::is_whitespace)
                .unwrap_or((command, ""));
            current = Some((command_name.to_owned(), vec![value]));
            continue;
        }

        match current.as_mut() {
            Some((_, body)) => body.push(line),
            None if line.trim().is_empty() => {}
            None => return Err(LevelFileError::StrayContent { line: index + 1 }),
        }
    }
    if let Some(finished) = current.take() {
        apply_command(finished, &mut name, &mut layers)?;
    }

    let layers = layers.ok_or(LevelFileError::MissingLayers)?;
    let level = Level::new(name.unwrap_or_else(|| id.to_owned()), layers);
    check_size(&level)?;
    Ok(level)
}

/// Renders a level in the `v1` format, padding every layer to the level size.
#[must_use]
pub(crate) fn serialize_level(level: &Level) -> String {
    let size = level.size();
    let layers = level
        .layers()
        .iter()
        .map(|layer| layer.to_text(size))
        .collect::<Vec<_>>()
        .join(&format!("\n{LAYER_SEPARATOR}\n"));
    format!(
        "{LEVEL_FILE_VERSION}\n{COMMAND_PREFIX}name {}\n{COMMAND_PREFIX}layers\n{layers}\n",
        level.name()
    )
}

fn apply_command(
    (command, body): (String, Vec<&str>),
    name: &mut Option<String>,
    layers: &mut Option<Vec<TileLayer>>,
) -> Result<(), LevelFileError> {
    match command.as_str() {
        "name" => *name = Some(body.join("\n").trim().to_owned()),
        "layers" => *layers = Some(parse_layers(&body)?),
        other => warn!("ignoring unknown level file command ':{other}'"),
    }
    Ok(())
}

fn parse_layers(body: &[&str]) -> Result<Vec<TileLayer>, LevelFileError> {
    let text = body.join("\n");
    let mut blocks = vec![Vec::new()];
    for line in text.lines() {
        if line.trim() == LAYER_SEPARATOR {
            blocks.push(Vec::new());
        } else if let Some(block) = blocks.last_mut() {
            block.push(line.trim());
        }
    }

    blocks
        .into_iter()
        .enumerate()
        .map(|(index, rows)| {
            let text = rows.join("\n");
            if text.trim().is_empty() {
                return Err(LevelFileError::EmptyLayer { index });
            }
            TileLayer::parse(&text).map_err(|source| LevelFileError::Layer { index, source })
        })
        .collect()
}

fn check_size(level: &Level) -> Result<(), LevelFileError> {
    let size = level.size();
    let (width, height) = (size.width(), size.height());
    if level.is_too_small() {
        return Err(LevelFileError::TooSmall { width, height });
    }
    if level.is_too_large() {
        return Err(LevelFileError::TooLarge { width, height });
    }
    Ok(())
}
