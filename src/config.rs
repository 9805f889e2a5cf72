//! Simulation configuration loaded from the game and arena parameter files.
//!
//! Both files are optional JSON documents; omitted fields keep their
//! defaults. [`SimulationConfig::validate`] rejects values the engine cannot
//! run with before any episode starts.
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arena::{ArenaConfig, ArenaError};
use crate::episode::{EpisodeConfig, WinCondition};

/// Failures while loading or validating parameters.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A parameter file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A parameter file is not valid JSON for its schema.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// A game parameter is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// The arena parameters are unusable.
    #[error("invalid arena: {0}")]
    Arena(#[from] ArenaError),
}

/// Game and arena parameters for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Episode rules.
    pub game: EpisodeConfig,
    /// Arena generation.
    pub arena: ArenaConfig,
    /// Seed for every random draw; the OS seeds the generator when absent.
    pub seed: Option<u64>,
    /// Dump the effective configuration at startup.
    pub log_parameters: bool,
}

fn read_json<T>(path: &Path) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl SimulationConfig {
    /// Loads the optional game and arena parameter files.
    ///
    /// # Errors
    /// [`ConfigError::Io`] or [`ConfigError::Parse`] for unreadable or
    /// malformed files.
    pub fn load(game: Option<&Path>, arena: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = game {
            config.game = read_json(path)?;
        }
        if let Some(path) = arena {
            config.arena = read_json(path)?;
        }
        Ok(config)
    }

    /// Overrides the seed when `seed` is set.
    #[must_use]
    pub const fn with_seed(mut self, seed: Option<u64>) -> Self {
        if seed.is_some() {
            self.seed = seed;
        }
        self
    }

    /// Checks every value the engine relies on.
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] naming the first bad game parameter, or
    /// [`ConfigError::Arena`] for arena problems.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let game = &self.game;
        if game.episode_steps == 0 {
            return Err(ConfigError::Invalid("episode_steps must be positive".to_owned()));
        }
        if !(0.0..1.0).contains(&game.grace_period_fraction) {
            return Err(ConfigError::Invalid(format!(
                "grace_period_fraction {} must lie in [0, 1)",
                game.grace_period_fraction
            )));
        }
        if !(game.cone_half_angle_deg > 0.0 && game.cone_half_angle_deg <= 180.0) {
            return Err(ConfigError::Invalid(format!(
                "cone_half_angle_deg {} must lie in (0, 180]",
                game.cone_half_angle_deg
            )));
        }
        if game.capture.distance.is_nan() || game.capture.distance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "capture distance {} must not be negative",
                game.capture.distance
            )));
        }
        if let WinCondition::TimeHidden { threshold } = game.win_condition {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::Invalid(format!(
                    "time hidden threshold {threshold} must lie in [0, 1]"
                )));
            }
        }
        if !(0.0..=1.0).contains(&game.coplay.self_play_ratio) {
            return Err(ConfigError::Invalid(format!(
                "self_play_ratio {} must lie in [0, 1]",
                game.coplay.self_play_ratio
            )));
        }
        if let Some(rule) = game.rewards.iter().find(|rule| !rule.weight.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "{:?} reward weight must be finite",
                rule.kind
            )));
        }
        self.arena.validate()?;
        Ok(())
    }

    /// Logs the effective configuration when `log_parameters` is set.
    pub fn log(&self) {
        if !self.log_parameters {
            return;
        }
        match serde_json::to_string_pretty(self) {
            Ok(dump) => info!("simulation parameters:\n{dump}"),
            Err(err) => info!("simulation parameters could not be serialised: {err}"),
        }
    }
}
