//! Agent actions on props.
//!
//! Grab and lock act on the first surface straight ahead of the agent. The
//! prop state machine decides whether a request succeeds; refused requests
//! change nothing and report `false`.
use log::debug;

use super::{EpisodeController, Phase};
use crate::agent::AgentId;
use crate::entity::EntityLifecycle;
use crate::physics::{BodyState, RayCaster};
use crate::vector_math::planar_distance;

impl EpisodeController {
    /// Whether `agent` may move this step. Seekers are frozen during the
    /// grace period and captured agents never move.
    #[must_use]
    pub fn can_move(&self, agent: AgentId) -> bool {
        self.roster.get(agent).is_some_and(|member| {
            !member.captured && (member.team.is_hider() || self.state.phase != Phase::GracePeriod)
        })
    }

    /// Index of the prop directly in front of `agent` within grab reach.
    fn prop_ahead<W>(&self, agent: AgentId, world: &W) -> Option<usize>
    where
        W: RayCaster + BodyState + ?Sized,
    {
        let entity = self.roster.get(agent)?.entity;
        let pose = world.pose(entity)?;
        let hit = world.ray_cast(pose.position, pose.forward())?;
        if hit.distance >= self.config.actions.grab_distance {
            return None;
        }
        self.props.iter().position(|prop| prop.entity == hit.collider)
    }

    fn active_agent(&self, agent: AgentId) -> bool {
        self.roster.get(agent).is_some_and(|member| !member.captured)
    }

    /// Picks up the prop in front of `agent`, if it is free and in reach.
    pub fn grab<W>(&mut self, agent: AgentId, world: &W) -> bool
    where
        W: RayCaster + BodyState + ?Sized,
    {
        if !self.active_agent(agent) || self.roster.get(agent).is_some_and(|a| a.held.is_some()) {
            return false;
        }
        let Some(index) = self.prop_ahead(agent, world) else {
            return false;
        };
        let Some(prop) = self.props.get_mut(index) else {
            return false;
        };
        if !prop.try_grab(agent) {
            return false;
        }
        let prop_id = prop.id;
        if let Some(holder) = self.roster.get_mut(agent) {
            holder.held = Some(prop_id);
        }
        debug!("agent {agent:?} grabbed prop {prop_id:?}");
        true
    }

    /// Drops whatever `agent` holds.
    pub fn release(&mut self, agent: AgentId) -> bool {
        if !self.active_agent(agent) {
            return false;
        }
        let Some(prop_id) = self.roster.get_mut(agent).and_then(|holder| holder.held.take())
        else {
            return false;
        };
        self.props
            .iter_mut()
            .find(|prop| prop.id == prop_id)
            .is_some_and(|prop| prop.release(agent))
    }

    /// Locks (`lock == true`) or unlocks the prop in front of `agent`. A
    /// successful change toggles the prop body's kinematic flag.
    pub fn lock<W>(&mut self, agent: AgentId, lock: bool, world: &mut W) -> bool
    where
        W: RayCaster + BodyState + EntityLifecycle + ?Sized,
    {
        let Some(team) = self
            .roster
            .get(agent)
            .filter(|member| !member.captured)
            .map(|member| member.team)
        else {
            return false;
        };
        let Some(index) = self.prop_ahead(agent, &*world) else {
            return false;
        };
        let Some(prop) = self.props.get_mut(index) else {
            return false;
        };
        let changed = if lock {
            prop.try_lock(team)
        } else {
            prop.try_unlock(team)
        };
        if changed {
            world.set_kinematic(prop.entity, lock);
            debug!(
                "agent {agent:?} {} prop {:?}",
                if lock { "locked" } else { "unlocked" },
                prop.id
            );
        }
        changed
    }

    /// Drops every held prop that drifted beyond the hold-break distance
    /// from its holder. Returns how many were dropped.
    pub fn enforce_hold_distance<W>(&mut self, world: &W) -> usize
    where
        W: BodyState + ?Sized,
    {
        let limit = self.config.actions.hold_break_distance;
        let mut dropped = 0;
        for agent in self.roster.iter_mut() {
            let Some(prop_id) = agent.held else {
                continue;
            };
            let Some(prop) = self.props.iter_mut().find(|prop| prop.id == prop_id) else {
                agent.held = None;
                continue;
            };
            let apart = match (world.pose(agent.entity), world.pose(prop.entity)) {
                (Some(holder), Some(body)) => planar_distance(holder.position, body.position),
                _ => f32::INFINITY,
            };
            if apart > limit {
                prop.release(agent.id);
                agent.held = None;
                dropped += 1;
                debug!("agent {:?} lost hold of prop {prop_id:?}", agent.id);
            }
        }
        dropped
    }
}
