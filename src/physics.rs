//! Physics collaborator seams.
//!
//! Force application and integration live outside this crate. The core only
//! reads body poses through [`BodyState`] and asks [`RayCaster`] for the
//! first surface along a ray.

use glam::Vec2;

use crate::entity::EntityHandle;
use crate::vector_math::forward;

/// Planar pose of a body as reported by the physics collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// Ground-plane position.
    pub position: Vec2,
    /// Heading in radians, counter-clockwise from +x.
    pub heading: f32,
    /// Ground-plane linear velocity.
    pub velocity: Vec2,
}

impl Pose {
    /// Creates a stationary pose.
    #[must_use]
    pub const fn new(position: Vec2, heading: f32) -> Self {
        Self {
            position,
            heading,
            velocity: Vec2::ZERO,
        }
    }

    /// Unit vector along the pose's heading.
    #[must_use]
    pub fn forward(&self) -> Vec2 {
        forward(self.heading)
    }
}

/// First solid surface struck by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Collider that was struck.
    pub collider: EntityHandle,
    /// World-space contact point.
    pub point: Vec2,
    /// Distance from the ray origin to `point`.
    pub distance: f32,
}

/// Ray-cast query against the physics scene.
pub trait RayCaster {
    /// Returns the first surface hit by a ray from `origin` along
    /// `direction`, or `None` when nothing is struck. `direction` need not
    /// be normalised.
    fn ray_cast(&self, origin: Vec2, direction: Vec2) -> Option<RayHit>;
}

/// Read-only access to body poses.
pub trait BodyState {
    /// Current pose of `handle`, or `None` if the body does not exist.
    fn pose(&self, handle: EntityHandle) -> Option<Pose>;
}
