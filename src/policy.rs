//! Opponent-policy sampling ("coplay").
//!
//! Checkpoint discovery and model conversion belong to the training
//! framework. The episode engine only asks a [`PolicyProvider`] for handles
//! and records which agents run frozen policies.
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::agent::Team;

/// Opaque reference to a frozen policy checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyHandle(pub String);

/// Source of past checkpoints for coplay episodes.
pub trait PolicyProvider {
    /// Refreshes the set of available checkpoints.
    fn rescan(&mut self);

    /// Team whose agents receive sampled checkpoints.
    fn team(&self) -> Team;

    /// Draws a checkpoint, or `None` when none are available.
    fn sample(&mut self, rng: &mut dyn RngCore) -> Option<PolicyHandle>;
}

/// Coplay settings applied at every episode reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoplayConfig {
    /// Sample frozen opponents at reset.
    pub enabled: bool,
    /// How many agents of the provider's team receive frozen policies.
    pub coplay_agents: usize,
    /// Probability that an episode uses frozen policies at all.
    pub self_play_ratio: f64,
}

impl Default for CoplayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            coplay_agents: 1,
            self_play_ratio: 0.5,
        }
    }
}

/// Fixed in-memory checkpoint list.
#[derive(Debug, Clone)]
pub struct CheckpointPool {
    team: Team,
    checkpoints: Vec<PolicyHandle>,
}

impl CheckpointPool {
    /// Pool serving `team` from `checkpoints`.
    #[must_use]
    pub const fn new(team: Team, checkpoints: Vec<PolicyHandle>) -> Self {
        Self { team, checkpoints }
    }

    /// Adds a checkpoint unless one with the same name is present.
    pub fn push(&mut self, checkpoint: PolicyHandle) {
        if !self.checkpoints.contains(&checkpoint) {
            self.checkpoints.push(checkpoint);
        }
    }

    /// Number of distinct checkpoints.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.checkpoints.len()
    }

    /// Whether the pool has nothing to sample.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }
}

impl PolicyProvider for CheckpointPool {
    fn rescan(&mut self) {
        log::debug!("checkpoint pool holds {} entries", self.checkpoints.len());
    }

    fn team(&self) -> Team {
        self.team
    }

    fn sample(&mut self, rng: &mut dyn RngCore) -> Option<PolicyHandle> {
        if self.checkpoints.is_empty() {
            return None;
        }
        let index = rng.random_range(0..self.checkpoints.len());
        self.checkpoints.get(index).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use rstest::rstest;

    #[rstest]
    fn empty_pool_samples_nothing() {
        let mut pool = CheckpointPool::new(Team::Seeker, Vec::new());
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(pool.sample(&mut rng).is_none());
    }

    #[rstest]
    fn pool_samples_known_checkpoints() {
        let mut pool = CheckpointPool::new(Team::Hider, Vec::new());
        pool.push(PolicyHandle("a.onnx".to_owned()));
        pool.push(PolicyHandle("b.onnx".to_owned()));
        pool.push(PolicyHandle("a.onnx".to_owned()));
        assert_eq!(pool.len(), 2);

        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..16 {
            let handle = pool.sample(&mut rng).expect("pool is not empty");
            assert!(handle.0 == "a.onnx" || handle.0 == "b.onnx");
        }
    }
}
