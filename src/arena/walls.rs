//! Wall layout: the sub-room with its door gaps and the optional boundary.
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ArenaConfig;
use crate::MIN_WALL_LENGTH;

/// Straight wall piece between two ground-plane points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallSegment {
    /// First endpoint.
    pub start: Vec2,
    /// Second endpoint.
    pub end: Vec2,
    /// Collider thickness.
    pub thickness: f32,
}

impl WallSegment {
    /// Segment from `start` to `end`.
    #[must_use]
    pub const fn new(start: Vec2, end: Vec2, thickness: f32) -> Self {
        Self {
            start,
            end,
            thickness,
        }
    }

    /// Distance between the endpoints.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Centre of the segment; the wall body sits here.
    #[must_use]
    pub fn midpoint(&self) -> Vec2 {
        (self.start + self.end) * 0.5
    }
}

/// Splits the run `start -> end` around a door gap of `door_width` centred
/// `door_position` along the run.
///
/// Yields up to two segments flanking the gap. A segment whose length would
/// not exceed [`MIN_WALL_LENGTH`] is omitted.
#[must_use]
pub fn split_run(
    start: Vec2,
    end: Vec2,
    door_width: f32,
    door_position: f32,
    thickness: f32,
) -> Vec<WallSegment> {
    let direction = (end - start).normalize_or_zero();
    let run_length = start.distance(end);
    let half_gap = door_width * 0.5;
    let gap_start = (door_position - half_gap).clamp(0.0, run_length);
    let gap_end = (door_position + half_gap).clamp(0.0, run_length);

    [
        WallSegment::new(start, start + direction * gap_start, thickness),
        WallSegment::new(start + direction * gap_end, end, thickness),
    ]
    .into_iter()
    .filter(|segment| segment.length() > MIN_WALL_LENGTH)
    .collect()
}

/// The two inner walls of the sub-room, each with a random door gap.
pub fn room_walls<R>(config: &ArenaConfig, rng: &mut R) -> Vec<WallSegment>
where
    R: Rng + ?Sized,
{
    let h = config.arena_size * 0.5;
    let room = config.room_size();
    let u = h - room;
    let c = config.center;
    let runs = [
        (Vec2::new(u, -u), Vec2::new(h, -u)),
        (Vec2::new(u, -u), Vec2::new(u, -h)),
    ];

    let half_door = config.door_width * 0.5;
    let mut walls = Vec::with_capacity(4);
    for (start, end) in runs {
        let door_position = if room - half_door > half_door {
            rng.random_range(half_door..=room - half_door)
        } else {
            room * 0.5
        };
        walls.extend(split_run(
            c + start,
            c + end,
            config.door_width,
            door_position,
            config.wall_thickness,
        ));
    }
    walls
}

/// The four walls enclosing the arena square.
#[must_use]
pub fn boundary_walls(config: &ArenaConfig) -> Vec<WallSegment> {
    let h = config.arena_size * 0.5;
    let c = config.center;
    let corners = [
        Vec2::new(-h, -h),
        Vec2::new(h, -h),
        Vec2::new(h, h),
        Vec2::new(-h, h),
    ];
    corners
        .iter()
        .zip(corners.iter().cycle().skip(1))
        .map(|(a, b)| WallSegment::new(c + *a, c + *b, config.wall_thickness))
        .collect()
}
