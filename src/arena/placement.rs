//! Disk-packing rejection sampler.
use glam::Vec2;

/// An accepted position and the disk it reserves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementItem {
    /// Accepted centre.
    pub position: Vec2,
    /// Radius no other item may intrude on.
    pub exclusion_radius: f32,
}

impl PlacementItem {
    /// Item at `position` reserving `exclusion_radius`.
    #[must_use]
    pub const fn new(position: Vec2, exclusion_radius: f32) -> Self {
        Self {
            position,
            exclusion_radius,
        }
    }

    /// Whether the exclusion disks of `self` and `other` touch or overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.position.distance(other.position) <= self.exclusion_radius + other.exclusion_radius
    }
}

/// Accumulates accepted items for one layout attempt.
#[derive(Debug, Clone, Default)]
pub struct Packer {
    placed: Vec<PlacementItem>,
}

impl Packer {
    /// Items accepted so far, in placement order.
    #[must_use]
    pub fn placed(&self) -> &[PlacementItem] {
        &self.placed
    }

    /// Whether `candidate` clears every item placed so far.
    #[must_use]
    pub fn accepts(&self, candidate: &PlacementItem) -> bool {
        self.placed.iter().all(|item| !item.overlaps(candidate))
    }

    /// Draws up to `attempts` candidates from `draw` and keeps the first one
    /// that clears every placed item. `None` once the budget is spent; a
    /// `None` draw counts as a spent attempt.
    pub fn try_place<F>(&mut self, radius: f32, attempts: u32, mut draw: F) -> Option<Vec2>
    where
        F: FnMut() -> Option<Vec2>,
    {
        for _ in 0..attempts {
            let Some(position) = draw() else {
                continue;
            };
            let candidate = PlacementItem::new(position, radius);
            if self.accepts(&candidate) {
                self.placed.push(candidate);
                return Some(position);
            }
        }
        None
    }
}
