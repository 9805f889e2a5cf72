//! Boundary to the training framework.
//!
//! The episode engine pushes rewards, statistics and group-episode
//! boundaries through [`TrainingSink`]. [`RecordingSink`] keeps everything
//! in memory for the headless runner and tests.
use hashbrown::HashMap;

use crate::agent::{AgentId, Team};

/// Statistics published at episode end and every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stat {
    /// Share of active steps with every hider hidden.
    TimeHidden,
    /// Share of hiders captured.
    HidersCaptured,
    /// `1.0` for a hider win, `0.0` otherwise.
    HiderWinRatio,
    /// Mean hider `x`, relative to the arena centre.
    HidersMeanX,
    /// Mean hider `z`, relative to the arena centre.
    HidersMeanZ,
    /// Mean seeker `x`, relative to the arena centre.
    SeekersMeanX,
    /// Mean seeker `z`, relative to the arena centre.
    SeekersMeanZ,
}

impl Stat {
    /// Key under which the statistic is reported.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::TimeHidden => "Environment/TimeHidden",
            Self::HidersCaptured => "Environment/HidersCaptured",
            Self::HiderWinRatio => "Environment/HiderWinRatio",
            Self::HidersMeanX => "Environment/HidersMeanX",
            Self::HidersMeanZ => "Environment/HidersMeanZ",
            Self::SeekersMeanX => "Environment/SeekersMeanX",
            Self::SeekersMeanZ => "Environment/SeekersMeanZ",
        }
    }

    /// Mean-position statistics for `team` as `(x, z)`.
    #[must_use]
    pub const fn team_mean(team: Team) -> (Self, Self) {
        match team {
            Team::Hider => (Self::HidersMeanX, Self::HidersMeanZ),
            Team::Seeker => (Self::SeekersMeanX, Self::SeekersMeanZ),
        }
    }
}

/// Receives everything the engine reports to the learner.
pub trait TrainingSink {
    /// Publishes one statistic sample.
    fn record_stat(&mut self, stat: Stat, value: f32);
    /// Adds to `agent`'s reward.
    fn add_agent_reward(&mut self, agent: AgentId, reward: f32);
    /// Adds to the shared reward of `team`.
    fn add_group_reward(&mut self, team: Team, reward: f32);
    /// Declares the members of a team's group for the coming episode.
    fn register_group(&mut self, team: Team, members: &[AgentId]);
    /// Closes the current group episode for `team`.
    fn end_group_episode(&mut self, team: Team);
}

/// In-memory sink.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    agent_rewards: HashMap<AgentId, f32>,
    group_rewards: HashMap<Team, f32>,
    stats: HashMap<Stat, Vec<f32>>,
    groups: HashMap<Team, Vec<AgentId>>,
    closed_episodes: Vec<(Team, f32)>,
    open_group_reward: HashMap<Team, f32>,
}

impl RecordingSink {
    /// Cumulative reward delivered to `agent`.
    #[must_use]
    pub fn agent_total(&self, agent: AgentId) -> f32 {
        self.agent_rewards.get(&agent).copied().unwrap_or(0.0)
    }

    /// Cumulative group reward delivered to `team`.
    #[must_use]
    pub fn group_total(&self, team: Team) -> f32 {
        self.group_rewards.get(&team).copied().unwrap_or(0.0)
    }

    /// Every value recorded for `stat`, oldest first.
    #[must_use]
    pub fn stat_values(&self, stat: Stat) -> &[f32] {
        self.stats.get(&stat).map_or(&[], Vec::as_slice)
    }

    /// Most recent sample of `stat`.
    #[must_use]
    pub fn last_stat(&self, stat: Stat) -> Option<f32> {
        self.stat_values(stat).last().copied()
    }

    /// Members most recently registered for `team`.
    #[must_use]
    pub fn group(&self, team: Team) -> &[AgentId] {
        self.groups.get(&team).map_or(&[], Vec::as_slice)
    }

    /// Closed group episodes with the group reward each one accumulated.
    #[must_use]
    pub fn closed_episodes(&self) -> &[(Team, f32)] {
        &self.closed_episodes
    }

    /// Number of closed group episodes for `team`.
    #[must_use]
    pub fn episodes_closed(&self, team: Team) -> usize {
        self.closed_episodes
            .iter()
            .filter(|(closed, _)| *closed == team)
            .count()
    }
}

impl TrainingSink for RecordingSink {
    fn record_stat(&mut self, stat: Stat, value: f32) {
        self.stats.entry(stat).or_default().push(value);
    }

    fn add_agent_reward(&mut self, agent: AgentId, reward: f32) {
        *self.agent_rewards.entry(agent).or_insert(0.0) += reward;
    }

    fn add_group_reward(&mut self, team: Team, reward: f32) {
        *self.group_rewards.entry(team).or_insert(0.0) += reward;
        *self.open_group_reward.entry(team).or_insert(0.0) += reward;
    }

    fn register_group(&mut self, team: Team, members: &[AgentId]) {
        self.groups.insert(team, members.to_vec());
    }

    fn end_group_episode(&mut self, team: Team) {
        let reward = self.open_group_reward.remove(&team).unwrap_or(0.0);
        self.closed_episodes.push((team, reward));
    }
}
