//! In-memory reference world.
//!
//! [`SimWorld`] implements every collaborator trait the engine consumes:
//! agents and props are circles, walls are line segments, and ray casts
//! return the nearest active surface. It has no forces; drivers set
//! headings and velocities directly and call [`SimWorld::advance`].
use glam::Vec2;
use hashbrown::HashMap;
use log::trace;
use ordered_float::OrderedFloat;

use crate::entity::{EntityHandle, EntityLifecycle, Prefab};
use crate::physics::{BodyState, Pose, RayCaster, RayHit};
use crate::vector_math::normalize_angle;
use crate::{AGENT_BODY_RADIUS, PROP_BODY_RADIUS};

const PARALLEL_EPSILON: f32 = 1e-6;

/// One simulated body.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// What the body was instantiated from.
    pub prefab: Prefab,
    /// Position, heading and velocity.
    pub pose: Pose,
    /// Inactive bodies neither move nor block rays.
    pub active: bool,
    /// Kinematic bodies ignore velocity.
    pub kinematic: bool,
    /// Parent given at instantiation.
    pub parent: Option<EntityHandle>,
}

impl Body {
    fn new(prefab: Prefab, parent: Option<EntityHandle>) -> Self {
        let (position, kinematic) = match prefab {
            Prefab::Wall(wall) => (wall.midpoint(), true),
            _ => (Vec2::ZERO, false),
        };
        Self {
            prefab,
            pose: Pose::new(position, 0.0),
            active: true,
            kinematic,
            parent,
        }
    }

    /// Distance along the unit ray `direction` to this body's surface.
    fn intersect(&self, origin: Vec2, direction: Vec2) -> Option<f32> {
        match self.prefab {
            Prefab::Hider | Prefab::Seeker => {
                ray_circle(origin, direction, self.pose.position, AGENT_BODY_RADIUS)
            }
            Prefab::Prop(_) => ray_circle(origin, direction, self.pose.position, PROP_BODY_RADIUS),
            Prefab::Wall(wall) => ray_segment(origin, direction, wall.start, wall.end),
        }
    }
}

/// Entry distance of a ray into a circle. Rays starting inside the circle
/// ignore it.
fn ray_circle(origin: Vec2, direction: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let offset = origin - center;
    let c = offset.length_squared() - radius * radius;
    if c <= 0.0 {
        return None;
    }
    let b = offset.dot(direction);
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let t = -b - discriminant.sqrt();
    (t >= 0.0).then_some(t)
}

fn ray_segment(origin: Vec2, direction: Vec2, start: Vec2, end: Vec2) -> Option<f32> {
    let edge = end - start;
    let denom = direction.perp_dot(edge);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    let to_start = start - origin;
    let t = to_start.perp_dot(edge) / denom;
    let u = to_start.perp_dot(direction) / denom;
    (t >= 0.0 && (0.0..=1.0).contains(&u)).then_some(t)
}

/// Reference implementation of the world collaborators.
#[derive(Debug, Clone, Default)]
pub struct SimWorld {
    bodies: HashMap<EntityHandle, Body>,
    next_handle: u64,
}

impl SimWorld {
    /// Empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiates `prefab` at `position` facing `heading`.
    pub fn spawn(&mut self, prefab: Prefab, position: Vec2, heading: f32) -> EntityHandle {
        let handle = self.instantiate(prefab, None);
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.pose = Pose::new(position, normalize_angle(heading));
        }
        handle
    }

    /// Body behind `handle`.
    #[must_use]
    pub fn body(&self, handle: EntityHandle) -> Option<&Body> {
        self.bodies.get(&handle)
    }

    /// Whether `handle` exists and is active.
    #[must_use]
    pub fn is_active(&self, handle: EntityHandle) -> bool {
        self.bodies.get(&handle).is_some_and(|body| body.active)
    }

    /// Whether `handle` exists and ignores velocity.
    #[must_use]
    pub fn is_kinematic(&self, handle: EntityHandle) -> bool {
        self.bodies.get(&handle).is_some_and(|body| body.kinematic)
    }

    /// Number of bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the world has no bodies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Number of bodies instantiated from prefabs matching `filter`.
    #[must_use]
    pub fn count_where<F>(&self, filter: F) -> usize
    where
        F: Fn(&Prefab) -> bool,
    {
        self.bodies.values().filter(|body| filter(&body.prefab)).count()
    }

    /// Sets the heading, wrapped to `[-π, π)`.
    pub fn set_heading(&mut self, handle: EntityHandle, heading: f32) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.pose.heading = normalize_angle(heading);
        }
    }

    /// Rotates by `delta` radians.
    pub fn turn(&mut self, handle: EntityHandle, delta: f32) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.pose.heading = normalize_angle(body.pose.heading + delta);
        }
    }

    /// Sets the planar velocity.
    pub fn set_velocity(&mut self, handle: EntityHandle, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.pose.velocity = velocity;
        }
    }

    /// Moves every active, non-kinematic body by `velocity * dt`.
    pub fn advance(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            if body.active && !body.kinematic {
                body.pose.position += body.pose.velocity * dt;
            }
        }
    }
}

impl RayCaster for SimWorld {
    fn ray_cast(&self, origin: Vec2, direction: Vec2) -> Option<RayHit> {
        let unit = direction.try_normalize()?;
        let (collider, distance) = self
            .bodies
            .iter()
            .filter(|(_, body)| body.active)
            .filter_map(|(handle, body)| {
                body.intersect(origin, unit)
                    .map(|entry| (*handle, entry))
            })
            .min_by_key(|(_, entry)| OrderedFloat(*entry))?;
        trace!("ray from {origin:?} hit {collider:?} at {distance}");
        Some(RayHit {
            collider,
            point: origin + unit * distance,
            distance,
        })
    }
}

impl BodyState for SimWorld {
    fn pose(&self, handle: EntityHandle) -> Option<Pose> {
        self.bodies.get(&handle).map(|body| body.pose)
    }
}

impl EntityLifecycle for SimWorld {
    fn instantiate(&mut self, prefab: Prefab, parent: Option<EntityHandle>) -> EntityHandle {
        let handle = EntityHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(handle, Body::new(prefab, parent));
        handle
    }

    fn destroy(&mut self, handle: EntityHandle) {
        self.bodies.remove(&handle);
    }

    fn set_active(&mut self, handle: EntityHandle, active: bool) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.active = active;
        }
    }

    fn teleport(&mut self, handle: EntityHandle, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.pose.position = position;
            body.pose.velocity = Vec2::ZERO;
        }
    }

    fn halt(&mut self, handle: EntityHandle) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.pose.velocity = Vec2::ZERO;
        }
    }

    fn set_kinematic(&mut self, handle: EntityHandle, kinematic: bool) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.kinematic = kinematic;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::WallSegment;
    use crate::prop::PropKind;
    use approx::assert_relative_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn world() -> SimWorld {
        SimWorld::new()
    }

    #[rstest]
    fn nearest_body_wins(mut world: SimWorld) {
        let far = world.spawn(Prefab::Hider, Vec2::new(8.0, 0.0), 0.0);
        let near = world.spawn(Prefab::Prop(PropKind::Box), Vec2::new(4.0, 0.0), 0.0);
        let hit = world.ray_cast(Vec2::ZERO, Vec2::X).expect("hit");
        assert_eq!(hit.collider, near);
        assert_relative_eq!(hit.distance, 4.0 - PROP_BODY_RADIUS);
        world.destroy(near);
        assert_eq!(world.ray_cast(Vec2::ZERO, Vec2::X).map(|next| next.collider), Some(far));
    }

    #[rstest]
    fn origin_inside_body_is_ignored(mut world: SimWorld) {
        let own = world.spawn(Prefab::Seeker, Vec2::ZERO, 0.0);
        let target = world.spawn(Prefab::Hider, Vec2::new(3.0, 0.0), 0.0);
        let hit = world.ray_cast(Vec2::ZERO, Vec2::X).expect("hit");
        assert_ne!(hit.collider, own);
        assert_eq!(hit.collider, target);
    }

    #[rstest]
    fn inactive_bodies_are_transparent(mut world: SimWorld) {
        let target = world.spawn(Prefab::Hider, Vec2::new(3.0, 0.0), 0.0);
        world.set_active(target, false);
        assert!(world.ray_cast(Vec2::ZERO, Vec2::X).is_none());
    }

    #[rstest]
    fn wall_segment_blocks(mut world: SimWorld) {
        world.spawn(Prefab::Hider, Vec2::new(6.0, 0.0), 0.0);
        let wall = world.instantiate(
            Prefab::Wall(WallSegment::new(Vec2::new(3.0, -2.0), Vec2::new(3.0, 2.0), 0.25)),
            None,
        );
        let hit = world.ray_cast(Vec2::ZERO, Vec2::new(6.0, 0.0)).expect("hit");
        assert_eq!(hit.collider, wall);
        assert_relative_eq!(hit.point.x, 3.0);
    }

    #[rstest]
    #[case::behind(Vec2::NEG_X)]
    #[case::parallel(Vec2::Y)]
    fn segment_misses(#[case] direction: Vec2) {
        let segment_hit = ray_segment(Vec2::ZERO, direction, Vec2::new(3.0, -2.0), Vec2::new(3.0, 2.0));
        assert!(segment_hit.is_none());
        let parallel = ray_segment(Vec2::ZERO, Vec2::Y, Vec2::new(0.0, 2.0), Vec2::new(0.0, 4.0));
        assert!(parallel.is_none());
    }

    #[rstest]
    fn advance_skips_kinematic(mut world: SimWorld) {
        let moving = world.spawn(Prefab::Seeker, Vec2::ZERO, 0.0);
        let locked = world.spawn(Prefab::Prop(PropKind::Box), Vec2::ZERO, 0.0);
        world.set_velocity(moving, Vec2::X);
        world.set_velocity(locked, Vec2::X);
        world.set_kinematic(locked, true);
        world.advance(0.5);
        assert_relative_eq!(world.pose(moving).expect("pose").position.x, 0.5);
        assert_relative_eq!(world.pose(locked).expect("pose").position.x, 0.0);
    }

    #[rstest]
    fn teleport_clears_motion(mut world: SimWorld) {
        let agent = world.spawn(Prefab::Hider, Vec2::ZERO, 0.0);
        world.set_velocity(agent, Vec2::ONE);
        world.teleport(agent, Vec2::new(2.0, 2.0));
        let pose = world.pose(agent).expect("pose");
        assert_eq!(pose.position, Vec2::new(2.0, 2.0));
        assert_eq!(pose.velocity, Vec2::ZERO);
    }
}
