//! Composable reward shaping.
//!
//! A [`RewardShaper`] evaluates an ordered list of [`RewardRule`]s against
//! the facts of one simulation step and returns additive
//! [`RewardDeltas`]. The controller buffers deltas in a [`RewardLedger`]
//! and flushes it to the training sink once per step.
use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, Roster, Team};
use crate::arena::ArenaBounds;
use crate::sink::TrainingSink;
use crate::visibility::VisibilityMatrix;

/// The shaping signals a rule can contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    /// Per agent, per step: hiders for staying unseen, seekers for seeing.
    IndividualVisibility,
    /// Per team, per step: zero-sum on whether every hider is hidden.
    TeamVisibility,
    /// At capture events only: seeker `+weight`, hider `-weight`.
    Capture,
    /// Per agent, per step, grace period included: `-weight` outside the arena.
    OutOfBoundsPenalty,
}

/// One weighted entry in the configured rule list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardRule {
    /// Signal this rule produces.
    pub kind: RewardKind,
    /// Scale applied to the signal.
    pub weight: f32,
}

impl RewardRule {
    /// Rule of `kind` scaled by `weight`.
    #[must_use]
    pub const fn new(kind: RewardKind, weight: f32) -> Self {
        Self { kind, weight }
    }
}

/// Everything the rules look at for one step.
#[derive(Debug, Clone, Copy)]
pub struct StepFacts<'a> {
    /// Visibility rules stay silent until this is set.
    pub grace_period_ended: bool,
    /// Captured agents are skipped only when capture is enabled.
    pub capture_enabled: bool,
    /// Current roster, in visibility-matrix order.
    pub roster: &'a Roster,
    /// Sightings for this step.
    pub visibility: &'a VisibilityMatrix,
    /// Planar positions of the agents whose pose is known.
    pub positions: &'a [(AgentId, Vec2)],
    /// Square outside which the out-of-bounds penalty applies.
    pub bounds: ArenaBounds,
}

impl StepFacts<'_> {
    fn every_hider_captured(&self) -> bool {
        self.capture_enabled
            && !self.roster.hiders().is_empty()
            && self.roster.remaining_hiders() == 0
    }
}

/// Additive reward contributions produced by one evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewardDeltas {
    /// Per-agent contributions; an agent may appear more than once.
    pub agents: Vec<(AgentId, f32)>,
    /// Group reward for the hider team.
    pub hider_team: f32,
    /// Group reward for the seeker team.
    pub seeker_team: f32,
}

impl RewardDeltas {
    /// Sum of the contributions addressed to `agent`.
    #[must_use]
    pub fn agent_total(&self, agent: AgentId) -> f32 {
        self.agents
            .iter()
            .filter(|(id, _)| *id == agent)
            .map(|(_, delta)| delta)
            .sum()
    }

    /// Group contribution for `team`.
    #[must_use]
    pub const fn team(&self, team: Team) -> f32 {
        match team {
            Team::Hider => self.hider_team,
            Team::Seeker => self.seeker_team,
        }
    }

    /// Whether the evaluation contributed nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.agents.is_empty() && self.hider_team == 0.0 && self.seeker_team == 0.0
    }
}

/// Ordered rule list evaluated once per step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewardShaper {
    rules: Vec<RewardRule>,
}

impl RewardShaper {
    /// Shaper evaluating `rules` in order.
    #[must_use]
    pub const fn new(rules: Vec<RewardRule>) -> Self {
        Self { rules }
    }

    /// The configured rules, in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[RewardRule] {
        &self.rules
    }

    /// Evaluates the per-step rules in list order. `Capture` rules are
    /// skipped here; see [`RewardShaper::capture`].
    #[must_use]
    pub fn evaluate(&self, facts: &StepFacts<'_>) -> RewardDeltas {
        let mut deltas = RewardDeltas::default();
        for rule in &self.rules {
            match rule.kind {
                RewardKind::IndividualVisibility => {
                    individual_visibility(rule.weight, facts, &mut deltas);
                }
                RewardKind::TeamVisibility => team_visibility(rule.weight, facts, &mut deltas),
                RewardKind::Capture => {}
                RewardKind::OutOfBoundsPenalty => out_of_bounds(rule.weight, facts, &mut deltas),
            }
        }
        deltas
    }

    /// Deltas for `seeker` capturing `hider`, summed over every `Capture`
    /// rule. Empty when no such rule is configured.
    #[must_use]
    pub fn capture(&self, seeker: AgentId, hider: AgentId) -> RewardDeltas {
        let weight: f32 = self
            .rules
            .iter()
            .filter(|rule| rule.kind == RewardKind::Capture)
            .map(|rule| rule.weight)
            .sum();
        let mut deltas = RewardDeltas::default();
        if self.rules.iter().any(|rule| rule.kind == RewardKind::Capture) {
            deltas.agents.push((seeker, weight));
            deltas.agents.push((hider, -weight));
        }
        deltas
    }
}

fn individual_visibility(weight: f32, facts: &StepFacts<'_>, deltas: &mut RewardDeltas) {
    if !facts.grace_period_ended {
        return;
    }

    for (i, hider) in facts.roster.hiders().iter().enumerate() {
        if facts.capture_enabled && hider.captured {
            continue;
        }
        let reward = if facts.visibility.hider_seen(i) {
            -weight
        } else {
            weight
        };
        deltas.agents.push((hider.id, reward));
    }

    if facts.every_hider_captured() {
        return;
    }
    for (j, seeker) in facts.roster.seekers().iter().enumerate() {
        let reward = if facts.visibility.seeker_sees(j) {
            weight
        } else {
            -weight
        };
        deltas.agents.push((seeker.id, reward));
    }
}

fn team_visibility(weight: f32, facts: &StepFacts<'_>, deltas: &mut RewardDeltas) {
    if !facts.grace_period_ended {
        return;
    }
    let hider_reward = if facts.visibility.all_hidden() {
        weight
    } else {
        -weight
    };
    deltas.hider_team += hider_reward;
    deltas.seeker_team -= hider_reward;
}

fn out_of_bounds(weight: f32, facts: &StepFacts<'_>, deltas: &mut RewardDeltas) {
    let penalty = -weight.abs();
    for agent in facts.roster.iter() {
        if facts.capture_enabled && agent.captured {
            continue;
        }
        let found = facts
            .positions
            .iter()
            .find(|(id, _)| *id == agent.id)
            .map(|(_, position)| *position);
        if let Some(position) = found {
            if !facts.bounds.contains(position) {
                deltas.agents.push((agent.id, penalty));
            }
        }
    }
}

/// Pending rewards awaiting delivery.
///
/// Collection empties the entry it reads, so every delta is delivered at
/// most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewardLedger {
    agents: BTreeMap<AgentId, f32>,
    hider_team: f32,
    seeker_team: f32,
}

impl RewardLedger {
    /// Buffers every contribution in `deltas`.
    pub fn apply(&mut self, deltas: &RewardDeltas) {
        for (agent, delta) in &deltas.agents {
            self.add_agent(*agent, *delta);
        }
        self.add_team(Team::Hider, deltas.hider_team);
        self.add_team(Team::Seeker, deltas.seeker_team);
    }

    /// Adds `delta` to `agent`'s pending reward.
    pub fn add_agent(&mut self, agent: AgentId, delta: f32) {
        *self.agents.entry(agent).or_insert(0.0) += delta;
    }

    /// Adds `delta` to `team`'s pending group reward.
    pub const fn add_team(&mut self, team: Team, delta: f32) {
        match team {
            Team::Hider => self.hider_team += delta,
            Team::Seeker => self.seeker_team += delta,
        }
    }

    /// `agent`'s buffered reward, left in place.
    #[must_use]
    pub fn pending(&self, agent: AgentId) -> f32 {
        self.agents.get(&agent).copied().unwrap_or(0.0)
    }

    /// Removes and returns `agent`'s pending reward.
    pub fn take(&mut self, agent: AgentId) -> f32 {
        self.agents.remove(&agent).unwrap_or(0.0)
    }

    /// Removes and returns `team`'s pending group reward.
    pub fn take_team(&mut self, team: Team) -> f32 {
        match team {
            Team::Hider => std::mem::take(&mut self.hider_team),
            Team::Seeker => std::mem::take(&mut self.seeker_team),
        }
    }

    /// Delivers every pending reward to `sink` and empties the ledger.
    pub fn flush<S>(&mut self, sink: &mut S)
    where
        S: TrainingSink + ?Sized,
    {
        for (agent, reward) in std::mem::take(&mut self.agents) {
            sink.add_agent_reward(agent, reward);
        }
        for team in [Team::Hider, Team::Seeker] {
            let reward = self.take_team(team);
            if reward != 0.0 {
                sink.add_group_reward(team, reward);
            }
        }
    }

    /// Drops every pending reward undelivered.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether nothing is waiting to be delivered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty() && self.hider_team == 0.0 && self.seeker_team == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::entity::EntityHandle;
    use crate::sink::RecordingSink;
    use approx::assert_relative_eq;
    use rstest::{fixture, rstest};

    const HIDER_A: AgentId = AgentId(0);
    const HIDER_B: AgentId = AgentId(1);
    const SEEKER: AgentId = AgentId(2);

    #[fixture]
    fn roster() -> Roster {
        Roster::from_agents([
            Agent::new(HIDER_A, Team::Hider, EntityHandle(0)),
            Agent::new(HIDER_B, Team::Hider, EntityHandle(1)),
            Agent::new(SEEKER, Team::Seeker, EntityHandle(2)),
        ])
    }

    fn facts<'a>(
        roster: &'a Roster,
        visibility: &'a VisibilityMatrix,
        positions: &'a [(AgentId, Vec2)],
        grace_period_ended: bool,
    ) -> StepFacts<'a> {
        StepFacts {
            grace_period_ended,
            capture_enabled: true,
            roster,
            visibility,
            positions,
            bounds: ArenaBounds::new(Vec2::ZERO, 10.0),
        }
    }

    #[rstest]
    fn individual_rewards_follow_matrix(roster: Roster) {
        let mut visibility = VisibilityMatrix::new(2, 1);
        visibility.set(1, 0, true);
        let shaper = RewardShaper::new(vec![RewardRule::new(RewardKind::IndividualVisibility, 0.5)]);
        let deltas = shaper.evaluate(&facts(&roster, &visibility, &[], true));
        assert_relative_eq!(deltas.agent_total(HIDER_A), 0.5);
        assert_relative_eq!(deltas.agent_total(HIDER_B), -0.5);
        assert_relative_eq!(deltas.agent_total(SEEKER), 0.5);
    }

    #[rstest]
    fn visibility_rules_are_silent_during_grace(roster: Roster) {
        let mut visibility = VisibilityMatrix::new(2, 1);
        visibility.set(0, 0, true);
        let shaper = RewardShaper::new(vec![
            RewardRule::new(RewardKind::IndividualVisibility, 1.0),
            RewardRule::new(RewardKind::TeamVisibility, 1.0),
        ]);
        let deltas = shaper.evaluate(&facts(&roster, &visibility, &[], false));
        assert!(deltas.is_empty());
    }

    #[rstest]
    fn captured_hider_stops_accruing(mut roster: Roster) {
        if let Some(hider) = roster.get_mut(HIDER_A) {
            hider.captured = true;
        }
        let visibility = VisibilityMatrix::new(2, 1);
        let shaper = RewardShaper::new(vec![RewardRule::new(RewardKind::IndividualVisibility, 1.0)]);
        let deltas = shaper.evaluate(&facts(&roster, &visibility, &[], true));
        assert!(deltas.agents.iter().all(|(id, _)| *id != HIDER_A));
        assert_relative_eq!(deltas.agent_total(SEEKER), -1.0);
    }

    #[rstest]
    fn seekers_stop_once_every_hider_is_captured(mut roster: Roster) {
        for id in [HIDER_A, HIDER_B] {
            if let Some(hider) = roster.get_mut(id) {
                hider.captured = true;
            }
        }
        let visibility = VisibilityMatrix::new(2, 1);
        let shaper = RewardShaper::new(vec![RewardRule::new(RewardKind::IndividualVisibility, 1.0)]);
        let deltas = shaper.evaluate(&facts(&roster, &visibility, &[], true));
        assert!(deltas.agents.is_empty());
    }

    #[rstest]
    #[case::hidden(false)]
    #[case::seen(true)]
    fn team_visibility_is_zero_sum(roster: Roster, #[case] seen: bool) {
        let mut visibility = VisibilityMatrix::new(2, 1);
        visibility.set(0, 0, seen);
        let shaper = RewardShaper::new(vec![RewardRule::new(RewardKind::TeamVisibility, 2.0)]);
        let deltas = shaper.evaluate(&facts(&roster, &visibility, &[], true));
        assert_relative_eq!(deltas.hider_team, -deltas.seeker_team);
        assert_relative_eq!(deltas.hider_team, if seen { -2.0 } else { 2.0 });
    }

    #[rstest]
    fn out_of_bounds_penalises_during_grace(roster: Roster) {
        let visibility = VisibilityMatrix::new(2, 1);
        let positions = [
            (HIDER_A, Vec2::new(10.5, 0.0)),
            (HIDER_B, Vec2::new(9.5, -9.5)),
            (SEEKER, Vec2::new(-3.0, 11.0)),
        ];
        let shaper = RewardShaper::new(vec![RewardRule::new(RewardKind::OutOfBoundsPenalty, -0.25)]);
        let deltas = shaper.evaluate(&facts(&roster, &visibility, &positions, false));
        assert_relative_eq!(deltas.agent_total(HIDER_A), -0.25);
        assert_relative_eq!(deltas.agent_total(HIDER_B), 0.0);
        assert_relative_eq!(deltas.agent_total(SEEKER), -0.25);
    }

    #[rstest]
    #[case::capture_enabled(true, 0.0)]
    #[case::capture_disabled(false, -1.0)]
    fn captured_agents_escape_out_of_bounds_penalty_only_with_capture(
        mut roster: Roster,
        #[case] capture_enabled: bool,
        #[case] expected: f32,
    ) {
        if let Some(hider) = roster.get_mut(HIDER_A) {
            hider.captured = true;
        }
        let visibility = VisibilityMatrix::new(2, 1);
        let positions = [(HIDER_A, Vec2::new(15.0, 0.0)), (SEEKER, Vec2::new(0.0, 12.0))];
        let shaper = RewardShaper::new(vec![RewardRule::new(RewardKind::OutOfBoundsPenalty, 1.0)]);
        let step = StepFacts {
            capture_enabled,
            ..facts(&roster, &visibility, &positions, true)
        };
        let deltas = shaper.evaluate(&step);
        assert_relative_eq!(deltas.agent_total(HIDER_A), expected);
        assert_relative_eq!(deltas.agent_total(SEEKER), -1.0);
    }

    #[rstest]
    fn capture_rule_rewards_seeker_and_penalises_hider() {
        let shaper = RewardShaper::new(vec![RewardRule::new(RewardKind::Capture, 3.0)]);
        let deltas = shaper.capture(SEEKER, HIDER_A);
        assert_relative_eq!(deltas.agent_total(SEEKER), 3.0);
        assert_relative_eq!(deltas.agent_total(HIDER_A), -3.0);
        assert!(RewardShaper::default().capture(SEEKER, HIDER_A).is_empty());
    }

    #[rstest]
    fn ledger_delivers_once() {
        let mut ledger = RewardLedger::default();
        ledger.add_agent(SEEKER, 1.0);
        ledger.add_agent(SEEKER, 0.5);
        ledger.add_team(Team::Hider, -1.0);
        assert_relative_eq!(ledger.pending(SEEKER), 1.5);

        let mut sink = RecordingSink::default();
        ledger.flush(&mut sink);
        ledger.flush(&mut sink);
        assert!(ledger.is_empty());
        assert_relative_eq!(sink.agent_total(SEEKER), 1.5);
        assert_relative_eq!(sink.group_total(Team::Hider), -1.0);
    }

    #[rstest]
    fn take_resets_entry() {
        let mut ledger = RewardLedger::default();
        ledger.add_agent(HIDER_A, 2.0);
        assert_relative_eq!(ledger.take(HIDER_A), 2.0);
        assert_relative_eq!(ledger.take(HIDER_A), 0.0);
    }
}
