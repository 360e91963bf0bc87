//! Ordered list of levels played one after the other.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use log::{debug, info};
use sandsink_core::Level;
use serde::Deserialize;

use crate::level_file::{parse_level, LEVEL_FILE_EXTENSION};

/// Configuration file looked up when `--config` is not provided.
pub(crate) const DEFAULT_CONFIG_PATH: &str = "sandsink.toml";

/// Where campaign levels live and in which order they are played.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CampaignConfig {
    /// Directory containing `<id>.level` files.
    pub(crate) level_dir: PathBuf,
    /// Level identifiers in play order. Takes precedence over `order_file`.
    pub(crate) order: Vec<String>,
    /// Newline separated list of level identifiers, used when `order` is empty.
    pub(crate) order_file: PathBuf,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            level_dir: PathBuf::from("assets/levels"),
            order: Vec::new(),
            order_file: PathBuf::from("assets/levels_order.txt"),
        }
    }
}

impl CampaignConfig {
    /// Loads the configuration from `path`, or from [`DEFAULT_CONFIG_PATH`] when it exists.
    ///
    /// Relative paths inside the file are resolved against its directory.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if !default.exists() {
                    debug!("no {DEFAULT_CONFIG_PATH} found, using default campaign settings");
                    return Ok(Self::default());
                }
                default
            }
        };

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read campaign config at {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml(&contents, base)
            .with_context(|| format!("invalid campaign config at {}", path.display()))
    }

    fn from_toml(contents: &str, base: &Path) -> Result<Self> {
        let mut config: Self =
            toml::from_str(contents).context("failed to parse campaign config toml contents")?;
        config.level_dir = base.join(&config.level_dir);
        config.order_file = base.join(&config.order_file);
        Ok(config)
    }

    /// Path of the level file for `id`.
    #[must_use]
    pub(crate) fn level_path(&self, id: &str) -> PathBuf {
        self.level_dir.join(format!("{id}.{LEVEL_FILE_EXTENSION}"))
    }

    /// Level identifiers in play order.
    pub(crate) fn level_ids(&self) -> Result<Vec<String>> {
        if !self.order.is_empty() {
            return Ok(self.order.clone());
        }
        let contents = fs::read_to_string(&self.order_file).with_context(|| {
            format!(
                "failed to read level order file at {}",
                self.order_file.display()
            )
        })?;
        Ok(parse_order(&contents))
    }
}

fn parse_order(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect()
}

/// Levels of a campaign together with the one being played.
#[derive(Debug)]
pub(crate) struct Campaign {
    levels: Vec<Level>,
    current: usize,
}

impl Campaign {
    /// Reads and validates every level listed by the configuration.
    pub(crate) fn load(config: &CampaignConfig) -> Result<Self> {
        Self::load_with(config, |path| {
            fs::read_to_string(path)
                .with_context(|| format!("failed to read level file at {}", path.display()))
        })
    }

    fn load_with(
        config: &CampaignConfig,
        mut loader: impl FnMut(&Path) -> Result<String>,
    ) -> Result<Self> {
        let mut levels = Vec::new();
        for id in config.level_ids()? {
            let contents = loader(&config.level_path(&id))?;
            let level =
                parse_level(&id, &contents).with_context(|| format!("failed to parse level {id}"))?;
            level
                .validate()
                .with_context(|| format!("level {id} is not playable"))?;
            levels.push(level);
        }
        info!("loaded campaign of {} levels", levels.len());
        Self::from_levels(levels)
    }

    /// Starts a campaign at its first level.
    pub(crate) fn from_levels(levels: Vec<Level>) -> Result<Self> {
        if levels.is_empty() {
            bail!("campaign does not list any level");
        }
        Ok(Self { levels, current: 0 })
    }

    /// Level being played.
    #[must_use]
    pub(crate) fn current(&self) -> &Level {
        &self.levels[self.current]
    }

    /// Zero-based position of the level being played.
    #[must_use]
    pub(crate) fn current_index(&self) -> usize {
        self.current
    }

    /// Number of levels in the campaign.
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.levels.len()
    }

    /// Moves `delta` levels forward or backward, wrapping around at both ends.
    pub(crate) fn go_to(&mut self, delta: isize) -> &Level {
        let len = isize::try_from(self.levels.len()).unwrap_or(isize::MAX);
        let current = isize::try_from(self.current).unwrap_or(0);
        let next = (current + delta).rem_euclid(len);
        self.current = usize::try_from(next).unwrap_or(0);
        self.current()
    }
}
