//! Game parameters consumed by the episode controller.
use serde::{Deserialize, Serialize};

use crate::policy::CoplayConfig;
use crate::reward::RewardRule;
use crate::{
    DEFAULT_CAPTURE_DISTANCE, DEFAULT_CONE_HALF_ANGLE_DEG, DEFAULT_EPISODE_STEPS,
    DEFAULT_GRAB_DISTANCE, DEFAULT_GRACE_PERIOD_FRACTION, DEFAULT_HOLD_BREAK_DISTANCE,
    DEFAULT_TERMINAL_BONUS,
};

/// How the winner of an episode is decided.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WinCondition {
    /// No terminal bonus is paid.
    #[default]
    None,
    /// Hiders win iff no hider was ever seen during the active phase.
    LineOfSight,
    /// Hiders win iff at most `max_captured` hiders were captured.
    Capture {
        /// Captures the hiders can afford and still win.
        max_captured: u32,
    },
    /// Hiders win iff the fraction of active steps with every hider hidden
    /// exceeds `threshold`.
    TimeHidden {
        /// Hidden fraction the hiders must beat.
        threshold: f32,
    },
}

/// Capture rule switches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Seekers capture hiders within reach.
    pub enabled: bool,
    /// Planar distance below which a seeker captures a hider.
    pub distance: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            distance: DEFAULT_CAPTURE_DISTANCE,
        }
    }
}

/// Reach of the grab and lock actions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Longest ray distance at which a prop can be grabbed or locked.
    pub grab_distance: f32,
    /// Held props farther than this from their holder are dropped.
    pub hold_break_distance: f32,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            grab_distance: DEFAULT_GRAB_DISTANCE,
            hold_break_distance: DEFAULT_HOLD_BREAK_DISTANCE,
        }
    }
}

/// Rules of one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    /// Steps before the episode ends.
    pub episode_steps: u32,
    /// Share of `episode_steps` spent in the grace period.
    pub grace_period_fraction: f64,
    /// Half-angle of every seeker's vision cone.
    pub cone_half_angle_deg: f32,
    /// Capture rule.
    pub capture: CaptureConfig,
    /// How the winner is decided.
    pub win_condition: WinCondition,
    /// Magnitude of the zero-sum group reward paid at episode end.
    pub terminal_bonus: f32,
    /// Evaluated every step, in order.
    pub rewards: Vec<RewardRule>,
    /// Grab and lock reach.
    pub actions: ActionConfig,
    /// Frozen-opponent sampling.
    pub coplay: CoplayConfig,
    /// Log each episode result at info level instead of debug.
    pub log_match_result: bool,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            episode_steps: DEFAULT_EPISODE_STEPS,
            grace_period_fraction: DEFAULT_GRACE_PERIOD_FRACTION,
            cone_half_angle_deg: DEFAULT_CONE_HALF_ANGLE_DEG,
            capture: CaptureConfig::default(),
            win_condition: WinCondition::default(),
            terminal_bonus: DEFAULT_TERMINAL_BONUS,
            rewards: Vec::new(),
            actions: ActionConfig::default(),
            coplay: CoplayConfig::default(),
            log_match_result: false,
        }
    }
}

impl EpisodeConfig {
    /// Whether the grace period is over once the timer reads `timer`.
    #[must_use]
    pub fn grace_period_ended(&self, timer: u32) -> bool {
        f64::from(timer) >= f64::from(self.episode_steps) * self.grace_period_fraction
    }
}
