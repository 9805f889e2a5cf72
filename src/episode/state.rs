//! Per-episode counters.

/// Episode phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Hiders position themselves; no visibility reward or capture applies.
    #[default]
    GracePeriod,
    /// Seekers move; visibility and captures count.
    Active,
    /// The episode has ended and awaits reset.
    Terminal,
}

/// Counters reset at the start of every episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeState {
    /// Steps taken this episode.
    pub timer: u32,
    /// Steps taken after the grace period.
    pub active_steps: u32,
    /// Active steps during which every hider was hidden.
    pub steps_hidden: u32,
    /// Hiders captured so far.
    pub hiders_captured: u32,
    /// `true` until any hider is seen during the active phase.
    pub hiders_perfect_game: bool,
    /// Current phase.
    pub phase: Phase,
}

impl Default for EpisodeState {
    fn default() -> Self {
        Self {
            timer: 0,
            active_steps: 0,
            steps_hidden: 0,
            hiders_captured: 0,
            hiders_perfect_game: true,
            phase: Phase::GracePeriod,
        }
    }
}

impl EpisodeState {
    /// Back to the start-of-episode values.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fraction of active steps with every hider hidden; zero before any
    /// active step.
    #[must_use]
    pub fn time_hidden(&self) -> f32 {
        crate::numeric::step_ratio(self.steps_hidden, self.active_steps)
    }
}
