//! Entity handles and the lifecycle collaborator.
//!
//! The simulation core never owns bodies. It asks the collaborator behind
//! [`EntityLifecycle`] to create, destroy, move, and toggle them, and refers
//! to them through opaque [`EntityHandle`] values.
use glam::Vec2;
use serde::Serialize;

use crate::arena::WallSegment;
use crate::prop::PropKind;

/// Opaque identifier of a simulated body; doubles as its collider id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityHandle(pub u64);

/// Kinds of entity the lifecycle collaborator knows how to instantiate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prefab {
    /// Agent body on the hider team.
    Hider,
    /// Agent body on the seeker team.
    Seeker,
    /// Movable prop.
    Prop(PropKind),
    /// Static wall piece with its world-space geometry.
    Wall(WallSegment),
}

/// Create, destroy, and reposition simulated entities.
pub trait EntityLifecycle {
    /// Creates a new entity, optionally parented under `parent`.
    fn instantiate(&mut self, prefab: Prefab, parent: Option<EntityHandle>) -> EntityHandle;

    /// Destroys an entity. Unknown handles are ignored.
    fn destroy(&mut self, handle: EntityHandle);

    /// Activates or deactivates an entity without destroying it. Inactive
    /// entities are invisible to ray casts.
    fn set_active(&mut self, handle: EntityHandle, active: bool);

    /// Moves a body to `position` and clears its motion.
    fn teleport(&mut self, handle: EntityHandle, position: Vec2);

    /// Clears linear and angular motion in place.
    fn halt(&mut self, handle: EntityHandle);

    /// Immobilises (or releases) a body so forces no longer move it.
    fn set_kinematic(&mut self, handle: EntityHandle, kinematic: bool);
}
