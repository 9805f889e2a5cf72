//! Procedural arena generation.
//!
//! [`ArenaGenerator`] lays out the optional sub-room walls and places every
//! agent and prop by rejection sampling inside per-category regions. Hiders
//! are placed first, then seekers, then props, so earlier categories get
//! first choice of open space. When the generator owns instantiation it
//! also re-samples the roster size every episode; see [`spawn`].

mod placement;
mod region;
pub mod spawn;
mod walls;

use glam::Vec2;
use log::{debug, error, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::Team;
use crate::entity::EntityHandle;
use crate::vector_math::chebyshev_distance;
use crate::{
    AGENT_PLACEMENT_ATTEMPTS, DEFAULT_AGENT_EXCLUSION_RADIUS, DEFAULT_ARENA_SIZE,
    DEFAULT_DOOR_WIDTH, DEFAULT_PROP_EXCLUSION_RADIUS, DEFAULT_ROOM_FRACTION,
    DEFAULT_WALL_THICKNESS, LAYOUT_ATTEMPTS, PROP_PLACEMENT_ATTEMPTS,
};

pub use placement::{Packer, PlacementItem};
pub use region::{Rect, RegionMap};
pub use spawn::spawn_static;
pub use walls::{boundary_walls, room_walls, split_run, WallSegment};

/// Area a category of items may be placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// The whole arena.
    Anywhere,
    /// Inside the sub-room.
    Room,
    /// The arena minus the sub-room.
    Outside,
    /// Room or outside, chosen with equal probability per draw.
    Either,
}

/// Inclusive `[min, max]` bounds on a per-episode count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    /// Smallest allowed count.
    pub min: usize,
    /// Largest allowed count.
    pub max: usize,
}

impl CountRange {
    /// A range that always yields `count`.
    #[must_use]
    pub const fn fixed(count: usize) -> Self {
        Self {
            min: count,
            max: count,
        }
    }

    /// Uniform draw from the range.
    pub fn sample<R>(&self, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        if self.min >= self.max {
            self.min
        } else {
            rng.random_range(self.min..=self.max)
        }
    }
}

impl Default for CountRange {
    fn default() -> Self {
        Self::fixed(2)
    }
}

/// Arena geometry, spawn regions and roster sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Edge length of the square arena.
    pub arena_size: f32,
    /// World-space centre of the arena.
    pub center: Vec2,
    /// Build the walled sub-room in one corner.
    pub generate_subroom: bool,
    /// Sub-room edge as a fraction of `arena_size`.
    pub room_fraction: f32,
    /// Width of the gap left in each sub-room wall.
    pub door_width: f32,
    /// Thickness of every generated wall segment.
    pub wall_thickness: f32,
    /// Also build the four walls around the arena.
    pub enclose_arena: bool,
    /// Exclusion radius kept clear around each agent.
    pub agent_radius: f32,
    /// Exclusion radius kept clear around each prop.
    pub prop_radius: f32,
    /// Where hiders spawn.
    pub hider_region: Region,
    /// Where seekers spawn.
    pub seeker_region: Region,
    /// Where props spawn.
    pub prop_region: Region,
    /// Create and destroy agents every episode instead of moving a fixed
    /// roster around.
    pub instantiate_agents: bool,
    /// Create and destroy props every episode.
    pub instantiate_props: bool,
    /// Hider count drawn per episode when instantiating agents.
    pub hiders: CountRange,
    /// Seeker count drawn per episode when instantiating agents.
    pub seekers: CountRange,
    /// Prop count drawn per episode when instantiating props.
    pub props: CountRange,
    /// Chance that an instantiated prop is a ramp rather than a box.
    pub ramp_fraction: f64,
    /// Samples tried per agent before the layout restarts.
    pub agent_attempts: u32,
    /// Samples tried per prop before it is dropped.
    pub prop_attempts: u32,
    /// Full layout restarts before giving up.
    pub layout_attempts: u32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            arena_size: DEFAULT_ARENA_SIZE,
            center: Vec2::ZERO,
            generate_subroom: true,
            room_fraction: DEFAULT_ROOM_FRACTION,
            door_width: DEFAULT_DOOR_WIDTH,
            wall_thickness: DEFAULT_WALL_THICKNESS,
            enclose_arena: false,
            agent_radius: DEFAULT_AGENT_EXCLUSION_RADIUS,
            prop_radius: DEFAULT_PROP_EXCLUSION_RADIUS,
            hider_region: Region::Room,
            seeker_region: Region::Outside,
            prop_region: Region::Either,
            instantiate_agents: false,
            instantiate_props: false,
            hiders: CountRange::default(),
            seekers: CountRange::default(),
            props: CountRange::default(),
            ramp_fraction: 0.0,
            agent_attempts: AGENT_PLACEMENT_ATTEMPTS,
            prop_attempts: PROP_PLACEMENT_ATTEMPTS,
            layout_attempts: LAYOUT_ATTEMPTS,
        }
    }
}

impl ArenaConfig {
    /// Edge length of the sub-room.
    #[must_use]
    pub const fn room_size(&self) -> f32 {
        self.arena_size * self.room_fraction
    }

    /// The play area used for out-of-bounds checks.
    #[must_use]
    pub const fn bounds(&self) -> ArenaBounds {
        ArenaBounds::new(self.center, self.arena_size * 0.5)
    }

    /// Checks geometry and roster bounds.
    ///
    /// # Errors
    /// Returns the first [`ArenaError`] describing an unusable setting.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if !self.center.is_finite() {
            return Err(ArenaError::InvalidCenter(self.center));
        }
        if !is_positive(self.arena_size) {
            return Err(ArenaError::InvalidSize(self.arena_size));
        }
        if !is_positive(self.agent_radius) {
            return Err(ArenaError::InvalidAgentRadius(self.agent_radius));
        }
        if !is_positive(self.prop_radius) {
            return Err(ArenaError::InvalidPropRadius(self.prop_radius));
        }
        if !is_non_negative(self.wall_thickness) {
            return Err(ArenaError::InvalidWallThickness(self.wall_thickness));
        }
        if !is_non_negative(self.door_width) {
            return Err(ArenaError::InvalidDoorWidth(self.door_width));
        }
        if self.room_fraction.is_nan() || self.room_fraction <= 0.0 || self.room_fraction >= 1.0 {
            return Err(ArenaError::InvalidRoomFraction(self.room_fraction));
        }
        if self.generate_subroom && self.door_width >= self.room_size() {
            return Err(ArenaError::DoorTooWide {
                door_width: self.door_width,
                wall_length: self.room_size(),
            });
        }
        if !(0.0..=1.0).contains(&self.ramp_fraction) {
            return Err(ArenaError::InvalidRampFraction(self.ramp_fraction));
        }
        for (what, range) in [
            ("hider", self.hiders),
            ("seeker", self.seekers),
            ("prop", self.props),
        ] {
            if range.min > range.max {
                return Err(ArenaError::InvalidCount {
                    what,
                    min: range.min,
                    max: range.max,
                });
            }
        }

        let agents = RegionMap::new(self, self.agent_radius);
        let props = RegionMap::new(self, self.prop_radius);
        for (region, regions, radius) in [
            (self.hider_region, &agents, self.agent_radius),
            (self.seeker_region, &agents, self.agent_radius),
            (self.prop_region, &props, self.prop_radius),
        ] {
            if !regions.admits(region) {
                return Err(ArenaError::DegenerateRegion { region, radius });
            }
        }
        Ok(())
    }
}

const fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

const fn is_non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

/// Square play area used by the out-of-bounds check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaBounds {
    /// Centre of the square.
    pub center: Vec2,
    /// Half the edge length.
    pub half_size: f32,
}

impl ArenaBounds {
    /// Square of edge `2 * half_size` around `center`.
    #[must_use]
    pub const fn new(center: Vec2, half_size: f32) -> Self {
        Self { center, half_size }
    }

    /// Chebyshev containment; the boundary itself is inside.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        chebyshev_distance(point, self.center) <= self.half_size
    }
}

/// Unusable arena settings and layout failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArenaError {
    /// A required agent found no free spot in its region.
    #[error("could not place {team:?} #{index} after {attempts} attempts")]
    AgentPlacement {
        /// Team of the agent that failed.
        team: Team,
        /// Index of the agent within its team.
        index: usize,
        /// Samples tried before giving up.
        attempts: u32,
    },
    /// A spawn region shrinks to nothing once the radius is kept clear.
    #[error("{region:?} region leaves no space for items of radius {radius}")]
    DegenerateRegion {
        /// The unusable region.
        region: Region,
        /// Exclusion radius applied to it.
        radius: f32,
    },
    /// The door gap is at least as long as the room wall.
    #[error("door width {door_width} does not fit a room wall of length {wall_length}")]
    DoorTooWide {
        /// Configured door width.
        door_width: f32,
        /// Length of one room wall.
        wall_length: f32,
    },
    /// A count range with `min > max`.
    #[error("invalid {what} count range: min {min} exceeds max {max}")]
    InvalidCount {
        /// Which count is wrong.
        what: &'static str,
        /// Configured minimum.
        min: usize,
        /// Configured maximum.
        max: usize,
    },
    /// Non-finite arena centre.
    #[error("arena centre {0} must be finite")]
    InvalidCenter(Vec2),
    /// Non-finite or non-positive arena size.
    #[error("arena size {0} must be finite and positive")]
    InvalidSize(f32),
    /// Non-finite or non-positive agent exclusion radius.
    #[error("agent radius {0} must be finite and positive")]
    InvalidAgentRadius(f32),
    /// Non-finite or non-positive prop exclusion radius.
    #[error("prop radius {0} must be finite and positive")]
    InvalidPropRadius(f32),
    /// Non-finite or negative wall thickness.
    #[error("wall thickness {0} must be finite and not negative")]
    InvalidWallThickness(f32),
    /// Non-finite or negative door width.
    #[error("door width {0} must be finite and not negative")]
    InvalidDoorWidth(f32),
    /// Room fraction outside `(0, 1)`.
    #[error("room fraction {0} must lie strictly between 0 and 1")]
    InvalidRoomFraction(f32),
    /// Ramp fraction outside `[0, 1]`.
    #[error("ramp fraction {0} must lie in [0, 1]")]
    InvalidRampFraction(f64),
}

/// Number of items to place in one layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RosterCounts {
    /// Hiders to place.
    pub hiders: usize,
    /// Seekers to place.
    pub seekers: usize,
    /// Props to place.
    pub props: usize,
}

/// Walls and positions produced by one successful layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArenaLayout {
    /// Wall segments to build.
    pub walls: Vec<WallSegment>,
    /// Hider positions in roster order.
    pub hiders: Vec<Vec2>,
    /// Seeker positions in roster order.
    pub seekers: Vec<Vec2>,
    /// Props that found space; may be shorter than requested.
    pub props: Vec<Vec2>,
    /// Props skipped for lack of space.
    pub dropped_props: usize,
}

impl ArenaLayout {
    /// Every placed item with its exclusion radius.
    #[must_use]
    pub fn items(&self, agent_radius: f32, prop_radius: f32) -> Vec<PlacementItem> {
        self.hiders
            .iter()
            .chain(&self.seekers)
            .map(|position| PlacementItem::new(*position, agent_radius))
            .chain(
                self.props
                    .iter()
                    .map(|position| PlacementItem::new(*position, prop_radius)),
            )
            .collect()
    }
}

/// Configuration-driven arena generator.
///
/// Besides the configuration it remembers the entities it created so the
/// next generation can destroy them.
#[derive(Debug, Clone)]
pub struct ArenaGenerator {
    config: ArenaConfig,
    agent_regions: RegionMap,
    prop_regions: RegionMap,
    root: Option<EntityHandle>,
    walls: Vec<EntityHandle>,
    next_agent_id: u32,
    next_prop_id: u32,
}

impl ArenaGenerator {
    /// Validates `config` and precomputes the sampling regions.
    ///
    /// # Errors
    /// Propagates [`ArenaConfig::validate`] failures.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self {
            agent_regions: RegionMap::new(&config, config.agent_radius),
            prop_regions: RegionMap::new(&config, config.prop_radius),
            config,
            root: None,
            walls: Vec::new(),
            next_agent_id: 0,
            next_prop_id: 0,
        })
    }

    /// Parents every generated entity under `root`.
    #[must_use]
    pub const fn with_root(mut self, root: EntityHandle) -> Self {
        self.root = Some(root);
        self
    }

    /// Validated configuration.
    #[must_use]
    pub const fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Parent of generated entities, if set.
    #[must_use]
    pub const fn root(&self) -> Option<EntityHandle> {
        self.root
    }

    /// Play area of the configured arena.
    #[must_use]
    pub const fn bounds(&self) -> ArenaBounds {
        self.config.bounds()
    }

    /// Whether agents are created and destroyed by the generator.
    #[must_use]
    pub const fn instantiates_agents(&self) -> bool {
        self.config.instantiate_agents
    }

    /// Whether props are recreated every episode.
    #[must_use]
    pub const fn instantiates_props(&self) -> bool {
        self.config.instantiate_props
    }

    /// Wall entities created by the last generation.
    #[must_use]
    pub fn wall_handles(&self) -> &[EntityHandle] {
        &self.walls
    }

    /// Sampling regions shrunk by the agent radius.
    #[must_use]
    pub const fn agent_regions(&self) -> &RegionMap {
        &self.agent_regions
    }

    /// Sampling regions shrunk by the prop radius.
    #[must_use]
    pub const fn prop_regions(&self) -> &RegionMap {
        &self.prop_regions
    }

    /// Samples a complete layout for `counts`.
    ///
    /// An agent that cannot be placed restarts the whole layout, up to
    /// `layout_attempts` times. A prop that cannot be placed is dropped.
    ///
    /// # Errors
    /// [`ArenaError::AgentPlacement`] when every restart failed to place a
    /// required agent.
    pub fn layout<R>(&self, counts: RosterCounts, rng: &mut R) -> Result<ArenaLayout, ArenaError>
    where
        R: Rng + ?Sized,
    {
        let attempts = self.config.layout_attempts.max(1);
        let mut failure = None;
        for attempt in 1..=attempts {
            match self.try_layout(counts, &mut *rng) {
                Ok(layout) => {
                    debug!(
                        "arena laid out on attempt {attempt}: {} walls, {}+{} agents, {} props ({} dropped)",
                        layout.walls.len(),
                        layout.hiders.len(),
                        layout.seekers.len(),
                        layout.props.len(),
                        layout.dropped_props
                    );
                    return Ok(layout);
                }
                Err(err) => {
                    warn!("arena layout attempt {attempt}/{attempts} failed: {err}");
                    failure = Some(err);
                }
            }
        }
        let err = failure.unwrap_or(ArenaError::AgentPlacement {
            team: Team::Hider,
            index: 0,
            attempts: self.config.agent_attempts,
        });
        error!("giving up on arena layout: {err}");
        Err(err)
    }

    fn try_layout<R>(&self, counts: RosterCounts, rng: &mut R) -> Result<ArenaLayout, ArenaError>
    where
        R: Rng + ?Sized,
    {
        let mut layout = ArenaLayout::default();
        if self.config.generate_subroom {
            layout.walls.extend(room_walls(&self.config, rng));
        }
        if self.config.enclose_arena {
            layout.walls.extend(boundary_walls(&self.config));
        }

        let mut packer = Packer::default();
        for (team, region, count) in [
            (Team::Hider, self.config.hider_region, counts.hiders),
            (Team::Seeker, self.config.seeker_region, counts.seekers),
        ] {
            for index in 0..count {
                let position = packer
                    .try_place(self.config.agent_radius, self.config.agent_attempts, || {
                        self.agent_regions.sample(region, &mut *rng)
                    })
                    .ok_or(ArenaError::AgentPlacement {
                        team,
                        index,
                        attempts: self.config.agent_attempts,
                    })?;
                match team {
                    Team::Hider => layout.hiders.push(position),
                    Team::Seeker => layout.seekers.push(position),
                }
            }
        }

        for index in 0..counts.props {
            let placed = packer.try_place(self.config.prop_radius, self.config.prop_attempts, || {
                self.prop_regions.sample(self.config.prop_region, &mut *rng)
            });
            match placed {
                Some(position) => layout.props.push(position),
                None => {
                    warn!(
                        "dropping prop #{index}: no space after {} attempts",
                        self.config.prop_attempts
                    );
                    layout.dropped_props += 1;
                }
            }
        }
        Ok(layout)
    }
}
