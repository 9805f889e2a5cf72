//! Applying a layout to the world.
//!
//! With a static roster the generator only teleports existing bodies. When
//! it owns instantiation it re-samples the roster size, destroys the
//! previous episode's instances and creates fresh ones with new ids.

use log::debug;
use rand::Rng;

use super::{ArenaConfig, ArenaError, ArenaGenerator, ArenaLayout, RosterCounts, WallSegment};
use crate::agent::{Agent, AgentId, Roster, Team};
use crate::entity::{EntityLifecycle, Prefab};
use crate::prop::{Prop, PropId, PropKind};

impl ArenaGenerator {
    /// Item counts for the next layout.
    fn counts<R>(&self, roster: &Roster, existing: &[Prop], rng: &mut R) -> RosterCounts
    where
        R: Rng + ?Sized,
    {
        let (hiders, seekers) = if self.config.instantiate_agents {
            (
                self.config.hiders.sample(rng),
                self.config.seekers.sample(rng),
            )
        } else {
            roster.shape()
        };
        let props = if self.config.instantiate_props {
            self.config.props.sample(rng)
        } else {
            existing.len()
        };
        RosterCounts {
            hiders,
            seekers,
            props,
        }
    }

    /// Lays out a new arena and applies it to `world`, `roster` and `props`.
    ///
    /// Nothing is touched when the layout fails, so the caller never sees
    /// a partially placed roster.
    ///
    /// # Errors
    /// Propagates a fatal [`ArenaError::AgentPlacement`] from
    /// [`ArenaGenerator::layout`].
    pub fn generate<W, R>(
        &mut self,
        world: &mut W,
        roster: &mut Roster,
        props: &mut Vec<Prop>,
        rng: &mut R,
    ) -> Result<ArenaLayout, ArenaError>
    where
        W: EntityLifecycle + ?Sized,
        R: Rng + ?Sized,
    {
        let counts = self.counts(roster, props, rng);
        let layout = self.layout(counts, rng)?;

        self.rebuild_walls(world, &layout.walls);
        if self.config.instantiate_agents {
            *roster = self.respawn_agents(world, roster, &layout);
        } else {
            place_roster(world, roster, &layout);
        }
        if self.config.instantiate_props {
            *props = self.respawn_props(world, props, &layout, rng);
        } else {
            place_props(world, props, &layout);
        }

        debug!(
            "arena generated: {} hiders, {} seekers, {} props",
            roster.hiders().len(),
            roster.seekers().len(),
            layout.props.len()
        );
        Ok(layout)
    }

    fn rebuild_walls<W>(&mut self, world: &mut W, walls: &[WallSegment])
    where
        W: EntityLifecycle + ?Sized,
    {
        for stale in self.walls.drain(..) {
            world.destroy(stale);
        }
        self.walls = walls
            .iter()
            .map(|wall| world.instantiate(Prefab::Wall(*wall), self.root))
            .collect();
    }

    fn respawn_agents<W>(&mut self, world: &mut W, stale: &Roster, layout: &ArenaLayout) -> Roster
    where
        W: EntityLifecycle + ?Sized,
    {
        for agent in stale.iter() {
            world.destroy(agent.entity);
        }

        let placements = layout
            .hiders
            .iter()
            .map(|position| (Team::Hider, *position))
            .chain(layout.seekers.iter().map(|position| (Team::Seeker, *position)));
        let mut agents = Vec::with_capacity(layout.hiders.len() + layout.seekers.len());
        for (team, position) in placements {
            let prefab = match team {
                Team::Hider => Prefab::Hider,
                Team::Seeker => Prefab::Seeker,
            };
            let entity = world.instantiate(prefab, self.root);
            world.teleport(entity, position);
            agents.push(Agent::new(AgentId(self.next_agent_id), team, entity));
            self.next_agent_id += 1;
        }
        Roster::from_agents(agents)
    }

    fn respawn_props<W, R>(
        &mut self,
        world: &mut W,
        stale: &[Prop],
        layout: &ArenaLayout,
        rng: &mut R,
    ) -> Vec<Prop>
    where
        W: EntityLifecycle + ?Sized,
        R: Rng + ?Sized,
    {
        for prop in stale {
            world.destroy(prop.entity);
        }

        layout
            .props
            .iter()
            .map(|position| {
                let kind = if rng.random_bool(self.config.ramp_fraction) {
                    PropKind::Ramp
                } else {
                    PropKind::Box
                };
                let entity = world.instantiate(Prefab::Prop(kind), self.root);
                world.teleport(entity, *position);
                let prop = Prop::new(PropId(self.next_prop_id), kind, entity);
                self.next_prop_id += 1;
                prop
            })
            .collect()
    }
}

/// Moves a fixed roster onto the layout positions, in roster order.
fn place_roster<W>(world: &mut W, roster: &Roster, layout: &ArenaLayout)
where
    W: EntityLifecycle + ?Sized,
{
    for (agents, positions) in [
        (roster.hiders(), &layout.hiders),
        (roster.seekers(), &layout.seekers),
    ] {
        for (agent, position) in agents.iter().zip(positions) {
            world.teleport(agent.entity, *position);
        }
    }
}

/// Moves fixed props onto the layout. Props that found no space are
/// deactivated for the episode.
fn place_props<W>(world: &mut W, props: &[Prop], layout: &ArenaLayout)
where
    W: EntityLifecycle + ?Sized,
{
    for (index, prop) in props.iter().enumerate() {
        match layout.props.get(index) {
            Some(position) => {
                world.set_active(prop.entity, true);
                world.teleport(prop.entity, *position);
            }
            None => world.set_active(prop.entity, false),
        }
    }
}

/// Instantiates the largest roster `config` allows, for worlds whose
/// generator does not own instantiation. Bodies start at the arena centre
/// until the first generation moves them.
pub fn spawn_static<W>(world: &mut W, config: &ArenaConfig) -> (Roster, Vec<Prop>)
where
    W: EntityLifecycle + ?Sized,
{
    let mut next_id = 0;
    let mut agents = Vec::with_capacity(config.hiders.max + config.seekers.max);
    for (team, count) in [(Team::Hider, config.hiders.max), (Team::Seeker, config.seekers.max)] {
        let prefab = match team {
            Team::Hider => Prefab::Hider,
            Team::Seeker => Prefab::Seeker,
        };
        for _ in 0..count {
            let entity = world.instantiate(prefab, None);
            world.teleport(entity, config.center);
            agents.push(Agent::new(AgentId(next_id), team, entity));
            next_id += 1;
        }
    }

    let props = (0..config.props.max)
        .map(|index| {
            let entity = world.instantiate(Prefab::Prop(PropKind::Box), None);
            world.teleport(entity, config.center);
            Prop::new(PropId(u32::try_from(index).unwrap_or(u32::MAX)), PropKind::Box, entity)
        })
        .collect();
    (Roster::from_agents(agents), props)
}
