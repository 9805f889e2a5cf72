//! Per-agent observation vectors.
//!
//! Layout:
//! - own row: `[x, z, heading, vx, vz, is_hider]`
//! - one row per teammate in roster order, self excluded:
//!   `[x, z, heading, vx, vz]`
//!
//! Positions are relative to the arena centre and headings lie in `[-π, π)`.
use glam::Vec2;

use crate::agent::{AgentId, Roster};
use crate::physics::{BodyState, Pose};
use crate::vector_math::normalize_angle;

/// Width of the own row.
pub const OWN_FEATURES: usize = 6;
/// Width of each teammate row.
pub const TEAMMATE_FEATURES: usize = 5;

/// Observation of one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// `[x, z, heading, vx, vz, is_hider]`.
    pub own: [f32; OWN_FEATURES],
    /// One `[x, z, heading, vx, vz]` row per teammate.
    pub teammates: Vec<[f32; TEAMMATE_FEATURES]>,
}

impl Observation {
    /// Own row followed by every teammate row.
    #[must_use]
    pub fn flatten(&self) -> Vec<f32> {
        let mut flat = Vec::with_capacity(OWN_FEATURES + self.teammates.len() * TEAMMATE_FEATURES);
        flat.extend_from_slice(&self.own);
        for row in &self.teammates {
            flat.extend_from_slice(row);
        }
        flat
    }
}

fn kinematics(pose: &Pose, center: Vec2) -> [f32; TEAMMATE_FEATURES] {
    let position = pose.position - center;
    [
        position.x,
        position.y,
        normalize_angle(pose.heading),
        pose.velocity.x,
        pose.velocity.y,
    ]
}

/// Builds the observation for `agent`. `None` when the agent is not on the
/// roster or has no pose.
#[must_use]
pub fn observe<W>(roster: &Roster, agent: AgentId, center: Vec2, world: &W) -> Option<Observation>
where
    W: BodyState + ?Sized,
{
    let me = roster.get(agent)?;
    let pose = world.pose(me.entity)?;
    let [x, z, heading, vx, vz] = kinematics(&pose, center);
    let is_hider = if me.team.is_hider() { 1.0 } else { 0.0 };

    let teammates = roster
        .team(me.team)
        .iter()
        .filter(|mate| mate.id != agent)
        .map(|mate| {
            world
                .pose(mate.entity)
                .map_or([0.0; TEAMMATE_FEATURES], |mate_pose| kinematics(&mate_pose, center))
        })
        .collect();

    Some(Observation {
        own: [x, z, heading, vx, vz, is_hider],
        teammates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, Team};
    use crate::entity::Prefab;
    use crate::world::SimWorld;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::f32::consts::PI;

    #[rstest]
    fn rows_are_centred_and_exclude_self() {
        let mut world = SimWorld::new();
        let a = world.spawn(Prefab::Hider, Vec2::new(3.0, 4.0), 1.5 * PI);
        let b = world.spawn(Prefab::Hider, Vec2::new(-1.0, 2.0), 0.0);
        let s = world.spawn(Prefab::Seeker, Vec2::ZERO, 0.0);
        world.set_velocity(a, Vec2::new(0.5, -0.5));
        let roster = Roster::from_agents([
            Agent::new(AgentId(0), Team::Hider, a),
            Agent::new(AgentId(1), Team::Hider, b),
            Agent::new(AgentId(2), Team::Seeker, s),
        ]);

        let obs = observe(&roster, AgentId(0), Vec2::new(1.0, 1.0), &world).expect("observation");
        assert_relative_eq!(obs.own[0], 2.0);
        assert_relative_eq!(obs.own[1], 3.0);
        assert_relative_eq!(obs.own[2], -0.5 * PI, epsilon = 1e-5);
        assert_relative_eq!(obs.own[3], 0.5);
        assert_relative_eq!(obs.own[5], 1.0);
        assert_eq!(obs.teammates.len(), 1);
        assert_relative_eq!(obs.teammates[0][0], -2.0);
        assert_eq!(obs.flatten().len(), OWN_FEATURES + TEAMMATE_FEATURES);
    }

    #[rstest]
    fn unknown_agent_has_no_observation() {
        let world = SimWorld::new();
        assert!(observe(&Roster::default(), AgentId(9), Vec2::ZERO, &world).is_none());
    }
}
