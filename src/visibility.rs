//! Line-of-sight between opposing agents.
//!
//! [`sees`] answers whether one agent sees another: the target must lie
//! inside the observer's forward cone, and the first surface struck by a ray
//! towards it must be the target's own collider. [`VisibilityMatrix`] caches
//! the seeker-to-hider answers for one simulation step.
use glam::Vec2;
use log::{error, trace};

use crate::agent::Roster;
use crate::entity::EntityHandle;
use crate::physics::{BodyState, Pose, RayCaster};
use crate::vector_math::angle_between_deg;
use crate::DEFAULT_CONE_HALF_ANGLE_DEG;

/// Forward vision cone described by its half-angle in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisionCone {
    half_angle_deg: f32,
}

impl VisionCone {
    /// Cone of the given half-angle.
    #[must_use]
    pub const fn new(half_angle_deg: f32) -> Self {
        Self { half_angle_deg }
    }

    /// Half-angle in degrees.
    #[must_use]
    pub const fn half_angle_deg(&self) -> f32 {
        self.half_angle_deg
    }

    /// Whether `direction` lies within the cone around `forward`. The
    /// boundary counts as inside; a zero direction never does.
    #[must_use]
    pub fn contains(&self, forward: Vec2, direction: Vec2) -> bool {
        angle_between_deg(direction, forward).is_some_and(|angle| angle <= self.half_angle_deg)
    }
}

impl Default for VisionCone {
    fn default() -> Self {
        Self::new(DEFAULT_CONE_HALF_ANGLE_DEG)
    }
}

/// Evidence that an observer sees its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sighting {
    /// Point where the sight ray struck the target.
    pub hit_point: Vec2,
    /// Ray distance to the hit.
    pub distance: f32,
}

/// Decides whether `observer` sees the body `target_collider` at `target`.
///
/// Targets outside the cone are never seen, whatever lies in between.
/// Inside the cone the target is seen iff the first ray hit is its own
/// collider; walls and props in front of it block the view.
#[must_use]
pub fn sees<C>(
    cone: &VisionCone,
    observer: &Pose,
    target: &Pose,
    target_collider: EntityHandle,
    caster: &C,
) -> Option<Sighting>
where
    C: RayCaster + ?Sized,
{
    let direction = target.position - observer.position;
    if !cone.contains(observer.forward(), direction) {
        return None;
    }

    let hit = caster.ray_cast(observer.position, direction)?;
    (hit.collider == target_collider).then_some(Sighting {
        hit_point: hit.point,
        distance: hit.distance,
    })
}

/// `hiders x seekers` table; `(i, j)` is `true` when seeker `j` sees hider `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityMatrix {
    hiders: usize,
    seekers: usize,
    cells: Vec<bool>,
}

impl VisibilityMatrix {
    /// All-clear matrix of the given shape.
    #[must_use]
    pub fn new(hiders: usize, seekers: usize) -> Self {
        Self {
            hiders,
            seekers,
            cells: vec![false; hiders * seekers],
        }
    }

    /// `(hider rows, seeker columns)`.
    #[must_use]
    pub const fn shape(&self) -> (usize, usize) {
        (self.hiders, self.seekers)
    }

    /// Rebuilds the matrix for a new roster shape, all cells cleared.
    pub fn resize(&mut self, hiders: usize, seekers: usize) {
        *self = Self::new(hiders, seekers);
    }

    /// Clears every cell.
    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    fn index(&self, hider: usize, seeker: usize) -> Option<usize> {
        (hider < self.hiders && seeker < self.seekers).then(|| hider * self.seekers + seeker)
    }

    /// Cell `(hider, seeker)`; out-of-range cells read as `false`.
    #[must_use]
    pub fn get(&self, hider: usize, seeker: usize) -> bool {
        self.index(hider, seeker)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(false)
    }

    /// Writes cell `(hider, seeker)`.
    pub fn set(&mut self, hider: usize, seeker: usize, seen: bool) {
        let cell = self
            .index(hider, seeker)
            .and_then(|index| self.cells.get_mut(index));
        debug_assert!(
            cell.is_some(),
            "cell ({hider}, {seeker}) outside {}x{} matrix",
            self.hiders,
            self.seekers
        );
        if let Some(slot) = cell {
            *slot = seen;
        }
    }

    /// Whether any seeker sees hider `hider`.
    #[must_use]
    pub fn hider_seen(&self, hider: usize) -> bool {
        (0..self.seekers).any(|seeker| self.get(hider, seeker))
    }

    /// Whether seeker `seeker` sees at least one hider.
    #[must_use]
    pub fn seeker_sees(&self, seeker: usize) -> bool {
        (0..self.hiders).any(|hider| self.get(hider, seeker))
    }

    /// `true` iff no cell is set.
    #[must_use]
    pub fn all_hidden(&self) -> bool {
        !self.cells.iter().any(|seen| *seen)
    }

    /// Recomputes every cell from the current poses.
    ///
    /// The matrix is cleared before repopulating. Captured hiders and agents
    /// without a pose keep empty rows and columns. The roster shape must
    /// match the matrix shape; a mismatch is an invariant violation that
    /// panics in debug builds and rebuilds the matrix otherwise.
    pub fn fill<W>(&mut self, cone: &VisionCone, roster: &Roster, world: &W)
    where
        W: RayCaster + BodyState + ?Sized,
    {
        let shape = roster.shape();
        debug_assert_eq!(
            self.shape(),
            shape,
            "visibility matrix shape diverged from roster"
        );
        if self.shape() != shape {
            error!(
                "visibility matrix {:?} does not match roster {:?}; rebuilding",
                self.shape(),
                shape
            );
            self.resize(shape.0, shape.1);
        }

        self.clear();
        for (i, hider) in roster.hiders().iter().enumerate() {
            if hider.captured {
                continue;
            }
            let Some(hider_pose) = world.pose(hider.entity) else {
                continue;
            };
            for (j, seeker) in roster.seekers().iter().enumerate() {
                let Some(seeker_pose) = world.pose(seeker.entity) else {
                    continue;
                };
                if let Some(sighting) = sees(cone, &seeker_pose, &hider_pose, hider.entity, world) {
                    trace!(
                        "seeker {:?} sees hider {:?} at {:?}",
                        seeker.id,
                        hider.id,
                        sighting.hit_point
                    );
                    self.set(i, j, true);
                }
            }
        }
    }
}
