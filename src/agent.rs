//! Agents, teams, and the per-episode rosters.
//!
//! A [`Roster`] keeps hiders and seekers in two ordered lists. The index of
//! an agent inside its list is stable for the whole episode and is the row
//! (hider) or column (seeker) it occupies in the visibility matrix.
use serde::{Deserialize, Serialize};

use crate::entity::EntityHandle;
use crate::policy::PolicyHandle;
use crate::prop::PropId;

/// Stable identifier of an agent within a training session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

/// The two competing teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    /// Hides from seekers.
    Hider,
    /// Searches for hiders.
    Seeker,
}

impl Team {
    /// The opposing team.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Hider => Self::Seeker,
            Self::Seeker => Self::Hider,
        }
    }

    /// Whether this is the hider team.
    #[must_use]
    pub const fn is_hider(self) -> bool {
        matches!(self, Self::Hider)
    }
}

/// Which policy drives an agent this episode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PolicySlot {
    /// Actions come from the learner being trained.
    #[default]
    Training,
    /// Actions come from a frozen checkpoint.
    Frozen(PolicyHandle),
}

/// Episode-scoped agent record. Pose and velocity live in the physics
/// collaborator and are looked up through [`Agent::entity`].
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    /// Session-wide identifier.
    pub id: AgentId,
    /// Team the agent plays for.
    pub team: Team,
    /// Body in the simulated world.
    pub entity: EntityHandle,
    /// Set once a seeker catches this hider; cleared on reset.
    pub captured: bool,
    /// Prop currently held, if any.
    pub held: Option<PropId>,
    /// Policy driving the agent this episode.
    pub policy: PolicySlot,
}

impl Agent {
    /// Fresh, uncaptured agent driven by the learner.
    #[must_use]
    pub const fn new(id: AgentId, team: Team, entity: EntityHandle) -> Self {
        Self {
            id,
            team,
            entity,
            captured: false,
            held: None,
            policy: PolicySlot::Training,
        }
    }

    /// Clears the per-episode flags. The body itself is reset through the
    /// lifecycle collaborator.
    pub const fn reset(&mut self) {
        self.captured = false;
        self.held = None;
    }
}

/// Ordered hider and seeker lists for one episode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    hiders: Vec<Agent>,
    seekers: Vec<Agent>,
}

impl Roster {
    /// Builds a roster by partitioning `agents` on their team, keeping the
    /// input order inside each team.
    #[must_use]
    pub fn from_agents<I>(agents: I) -> Self
    where
        I: IntoIterator<Item = Agent>,
    {
        let (hiders, seekers) = agents
            .into_iter()
            .partition(|agent: &Agent| agent.team.is_hider());
        Self { hiders, seekers }
    }

    /// Hiders in visibility-matrix row order.
    #[must_use]
    pub fn hiders(&self) -> &[Agent] {
        &self.hiders
    }

    /// Seekers in visibility-matrix column order.
    #[must_use]
    pub fn seekers(&self) -> &[Agent] {
        &self.seekers
    }

    /// The ordered list for `team`.
    #[must_use]
    pub fn team(&self, team: Team) -> &[Agent] {
        match team {
            Team::Hider => &self.hiders,
            Team::Seeker => &self.seekers,
        }
    }

    /// `(hider count, seeker count)`; the visibility matrix shape.
    #[must_use]
    pub const fn shape(&self) -> (usize, usize) {
        (self.hiders.len(), self.seekers.len())
    }

    /// Whether neither team has any agent.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.hiders.is_empty() && self.seekers.is_empty()
    }

    /// All agents, hiders first.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.hiders.iter().chain(self.seekers.iter())
    }

    /// Mutable counterpart of [`Roster::iter`].
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.hiders.iter_mut().chain(self.seekers.iter_mut())
    }

    /// Looks up an agent by id.
    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.iter().find(|agent| agent.id == id)
    }

    /// Mutable lookup by id.
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.iter_mut().find(|agent| agent.id == id)
    }

    /// Agent ids of `team` in roster order.
    #[must_use]
    pub fn ids(&self, team: Team) -> Vec<AgentId> {
        self.team(team).iter().map(|agent| agent.id).collect()
    }

    /// Hiders that have not been captured.
    #[must_use]
    pub fn remaining_hiders(&self) -> usize {
        self.hiders.iter().filter(|agent| !agent.captured).count()
    }

    pub(crate) fn hiders_mut(&mut self) -> &mut [Agent] {
        &mut self.hiders
    }

    pub(crate) fn team_mut(&mut self, team: Team) -> &mut [Agent] {
        match team {
            Team::Hider => &mut self.hiders,
            Team::Seeker => &mut self.seekers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn agent(id: u32, team: Team) -> Agent {
        Agent::new(AgentId(id), team, EntityHandle(u64::from(id)))
    }

    #[rstest]
    fn from_agents_keeps_team_order() {
        let roster = Roster::from_agents([
            agent(1, Team::Seeker),
            agent(2, Team::Hider),
            agent(3, Team::Seeker),
            agent(4, Team::Hider),
        ]);
        assert_eq!(roster.ids(Team::Hider), vec![AgentId(2), AgentId(4)]);
        assert_eq!(roster.ids(Team::Seeker), vec![AgentId(1), AgentId(3)]);
        assert_eq!(roster.shape(), (2, 2));
    }

    #[rstest]
    fn remaining_hiders_ignores_captured() {
        let mut roster = Roster::from_agents([agent(1, Team::Hider), agent(2, Team::Hider)]);
        if let Some(first) = roster.get_mut(AgentId(1)) {
            first.captured = true;
        }
        assert_eq!(roster.remaining_hiders(), 1);
    }

    #[rstest]
    fn reset_clears_episode_flags() {
        let mut hider = agent(1, Team::Hider);
        hider.captured = true;
        hider.held = Some(PropId(3));
        hider.reset();
        assert!(!hider.captured);
        assert!(hider.held.is_none());
    }

    #[rstest]
    #[case(Team::Hider, Team::Seeker)]
    #[case(Team::Seeker, Team::Hider)]
    fn opponent_is_other_team(#[case] team: Team, #[case] expected: Team) {
        assert_eq!(team.opponent(), expected);
    }
}
