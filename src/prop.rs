//! Movable props and their grab/lock state machine.
//!
//! A prop is either free, held by exactly one agent, or locked by a team.
//! Holding and locking are variants of one [`PropState`], so a prop can never
//! be both at once. Every transition goes through `Free`; invalid requests
//! leave the state untouched and report `false`.
use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, Team};
use crate::entity::EntityHandle;

/// Stable identifier of a prop within a training session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropId(pub u32);

/// Shape of a prop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropKind {
    /// Cube that blocks sight.
    Box,
    /// Wedge agents can climb.
    Ramp,
}

/// Ownership state of a prop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropState {
    /// Nobody holds or locks the prop.
    #[default]
    Free,
    /// Carried by one agent.
    Held(AgentId),
    /// Immobilised by a team; only that team may unlock it.
    Locked(Team),
}

/// A movable prop and its ownership state.
#[derive(Debug, Clone, PartialEq)]
pub struct Prop {
    /// Session-wide identifier.
    pub id: PropId,
    /// Box or ramp.
    pub kind: PropKind,
    /// Body in the simulated world.
    pub entity: EntityHandle,
    state: PropState,
}

impl Prop {
    /// Free prop.
    #[must_use]
    pub const fn new(id: PropId, kind: PropKind, entity: EntityHandle) -> Self {
        Self {
            id,
            kind,
            entity,
            state: PropState::Free,
        }
    }

    /// Current ownership state.
    #[must_use]
    pub const fn state(&self) -> PropState {
        self.state
    }

    /// Agent currently holding the prop.
    #[must_use]
    pub const fn holder(&self) -> Option<AgentId> {
        match self.state {
            PropState::Held(agent) => Some(agent),
            PropState::Free | PropState::Locked(_) => None,
        }
    }

    /// Team that locked the prop.
    #[must_use]
    pub const fn lock_team(&self) -> Option<Team> {
        match self.state {
            PropState::Locked(team) => Some(team),
            PropState::Free | PropState::Held(_) => None,
        }
    }

    /// `Free -> Held(agent)`. Fails when the prop is held or locked.
    pub fn try_grab(&mut self, agent: AgentId) -> bool {
        if self.state != PropState::Free {
            return false;
        }
        self.state = PropState::Held(agent);
        true
    }

    /// `Held(agent) -> Free`. Only the holder may release.
    pub fn release(&mut self, agent: AgentId) -> bool {
        if self.state != PropState::Held(agent) {
            return false;
        }
        self.state = PropState::Free;
        true
    }

    /// `Free -> Locked(team)`. Fails when the prop is held or locked.
    pub fn try_lock(&mut self, team: Team) -> bool {
        if self.state != PropState::Free {
            return false;
        }
        self.state = PropState::Locked(team);
        true
    }

    /// `Locked(team) -> Free`, only for the team that locked it.
    pub fn try_unlock(&mut self, team: Team) -> bool {
        if self.state != PropState::Locked(team) {
            return false;
        }
        self.state = PropState::Free;
        true
    }

    /// Forces the prop back to `Free` at an episode boundary.
    pub const fn reset(&mut self) {
        self.state = PropState::Free;
    }
}
