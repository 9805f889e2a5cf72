//! Spawn regions and uniform sampling inside them.
//!
//! The arena is a square of half-size `h` centred on the configured centre.
//! The optional sub-room of edge `w` occupies the `(+x, -z)` corner, so its
//! inner walls lie on `z = -u` and `x = u` with `u = h - w`. The area outside
//! the room is the union of two disjoint rectangles. Every rectangle is
//! shrunk by half a wall thickness plus the item's exclusion radius so
//! sampled items never overlap a wall.
use glam::Vec2;
use rand::Rng;

use super::{ArenaConfig, Region};

/// Axis-aligned rectangle in arena coordinates (`y` is the ground `z` axis).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Lower-left corner.
    pub min: Vec2,
    /// Upper-right corner.
    pub max: Vec2,
}

impl Rect {
    /// Rectangle spanning `min` to `max`.
    #[must_use]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Rectangle with inverted bounds, i.e. no admissible point.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Area, zero for degenerate rectangles.
    #[must_use]
    pub fn area(&self) -> f32 {
        let extent = (self.max - self.min).max(Vec2::ZERO);
        extent.x * extent.y
    }

    /// Inclusive containment.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Copy shifted by `offset`.
    #[must_use]
    pub fn translate(&self, offset: Vec2) -> Self {
        Self::new(self.min + offset, self.max + offset)
    }

    /// Uniform point inside the rectangle; `None` when it is degenerate.
    pub fn sample<R>(&self, rng: &mut R) -> Option<Vec2>
    where
        R: Rng + ?Sized,
    {
        if self.is_degenerate() {
            return None;
        }
        Some(Vec2::new(
            rng.random_range(self.min.x..=self.max.x),
            rng.random_range(self.min.y..=self.max.y),
        ))
    }
}

/// Draws from one of `rects` with probability proportional to its area.
/// Degenerate rectangles are never chosen.
fn sample_area_weighted<R>(rects: &[Rect], rng: &mut R) -> Option<Vec2>
where
    R: Rng + ?Sized,
{
    let eligible: Vec<&Rect> = rects.iter().filter(|rect| !rect.is_degenerate()).collect();
    let total: f32 = eligible.iter().map(|rect| rect.area()).sum();
    let mut pick = rng.random::<f32>() * total;
    for rect in &eligible {
        if pick < rect.area() {
            return rect.sample(rng);
        }
        pick -= rect.area();
    }
    eligible.last().and_then(|rect| rect.sample(rng))
}

/// Sampling rectangles for one exclusion radius, in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionMap {
    anywhere: Rect,
    room: Rect,
    outside: [Rect; 2],
}

impl RegionMap {
    /// Regions for items of exclusion `radius` under `config`.
    #[must_use]
    pub fn new(config: &ArenaConfig, radius: f32) -> Self {
        let h = config.arena_size * 0.5;
        let u = h - config.room_size();
        let m = 0.5 * config.wall_thickness + radius;
        let offset = config.center;

        let anywhere = Rect::new(Vec2::splat(-h + m), Vec2::splat(h - m));
        let room = Rect::new(Vec2::new(u + m, -h + m), Vec2::new(h - m, -u - m));
        let beside_room = Rect::new(Vec2::new(u + m, -u + m), Vec2::new(h - m, h - m));
        let far_side = Rect::new(Vec2::new(-h + m, -h + m), Vec2::new(u - m, h - m));

        Self {
            anywhere: anywhere.translate(offset),
            room: room.translate(offset),
            outside: [beside_room.translate(offset), far_side.translate(offset)],
        }
    }

    /// Sampling rectangle inside the sub-room.
    #[must_use]
    pub const fn room(&self) -> Rect {
        self.room
    }

    /// The two disjoint rectangles outside the sub-room.
    #[must_use]
    pub const fn outside(&self) -> [Rect; 2] {
        self.outside
    }

    /// Sampling rectangle for the whole arena.
    #[must_use]
    pub const fn anywhere(&self) -> Rect {
        self.anywhere
    }

    fn outside_is_degenerate(&self) -> bool {
        self.outside.iter().all(Rect::is_degenerate)
    }

    /// Whether `region` admits at least one point.
    #[must_use]
    pub fn admits(&self, region: Region) -> bool {
        match region {
            Region::Anywhere => !self.anywhere.is_degenerate(),
            Region::Room => !self.room.is_degenerate(),
            Region::Outside => !self.outside_is_degenerate(),
            Region::Either => !self.room.is_degenerate() && !self.outside_is_degenerate(),
        }
    }

    /// Whether `point` lies inside `region`.
    #[must_use]
    pub fn contains(&self, region: Region, point: Vec2) -> bool {
        let in_room = self.room.contains(point);
        let outside = self.outside.iter().any(|rect| rect.contains(point));
        match region {
            Region::Anywhere => self.anywhere.contains(point),
            Region::Room => in_room,
            Region::Outside => outside,
            Region::Either => in_room || outside,
        }
    }

    /// Draws one candidate from `region`.
    pub fn sample<R>(&self, region: Region, rng: &mut R) -> Option<Vec2>
    where
        R: Rng + ?Sized,
    {
        match region {
            Region::Anywhere => self.anywhere.sample(rng),
            Region::Room => self.room.sample(rng),
            Region::Outside => sample_area_weighted(&self.outside, rng),
            Region::Either => {
                if rng.random_bool(0.5) {
                    self.room.sample(rng)
                } else {
                    sample_area_weighted(&self.outside, rng)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use rstest::{fixture, rstest};

    #[fixture]
    fn regions() -> RegionMap {
        let config = ArenaConfig {
            arena_size: 20.0,
            room_fraction: 0.5,
            wall_thickness: 0.0,
            ..ArenaConfig::default()
        };
        RegionMap::new(&config, 0.0)
    }

    #[rstest]
    fn room_occupies_corner(regions: RegionMap) {
        let room = regions.room();
        assert_relative_eq!(room.min.x, 0.0);
        assert_relative_eq!(room.max.x, 10.0);
        assert_relative_eq!(room.min.y, -10.0);
        assert_relative_eq!(room.max.y, 0.0);
    }

    #[rstest]
    fn outside_partitions_remaining_area(regions: RegionMap) {
        let total: f32 = regions.outside().iter().map(Rect::area).sum();
        assert_relative_eq!(total + regions.room().area(), 400.0);
    }

    #[rstest]
    #[case::room(Region::Room)]
    #[case::outside(Region::Outside)]
    #[case::either(Region::Either)]
    #[case::anywhere(Region::Anywhere)]
    fn samples_stay_in_region(regions: RegionMap, #[case] region: Region) {
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..200 {
            let point = regions
                .sample(region, &mut rng)
                .expect("region should admit points");
            assert!(regions.contains(region, point), "{point:?} outside {region:?}");
        }
    }

    #[rstest]
    fn outside_sampling_is_area_weighted(regions: RegionMap) {
        let mut rng = SmallRng::seed_from_u64(11);
        let [beside, _] = regions.outside();
        let draws = 4000;
        let hits = (0..draws)
            .filter_map(|_| regions.sample(Region::Outside, &mut rng))
            .filter(|point| beside.contains(*point))
            .count();
        // `beside` holds a third of the outside area.
        let share = f64::from(u32::try_from(hits).expect("small count")) / f64::from(draws);
        assert!((share - 1.0 / 3.0).abs() < 0.05, "share was {share}");
    }

    #[rstest]
    fn margins_shrink_regions() {
        let config = ArenaConfig {
            arena_size: 4.0,
            room_fraction: 0.5,
            wall_thickness: 0.0,
            ..ArenaConfig::default()
        };
        let regions = RegionMap::new(&config, 1.5);
        assert!(!regions.admits(Region::Room));
        assert!(regions.admits(Region::Anywhere));
        assert!(regions.sample(Region::Room, &mut SmallRng::seed_from_u64(0)).is_none());
    }
}
