//! Default tuning constants for episodes, vision, and arena generation.
//!
//! Configuration structs fall back to these values when a field is omitted
//! from the loaded parameter files.

/// Steps per episode.
pub const DEFAULT_EPISODE_STEPS: u32 = 240;
/// Share of the episode during which seekers are frozen.
pub const DEFAULT_GRACE_PERIOD_FRACTION: f64 = 0.4;
/// Half-angle of the forward vision cone, in degrees.
pub const DEFAULT_CONE_HALF_ANGLE_DEG: f32 = 67.5;
/// Planar reach of a capture.
pub const DEFAULT_CAPTURE_DISTANCE: f32 = 1.2;
/// Group reward paid to the winning team.
pub const DEFAULT_TERMINAL_BONUS: f32 = 1.0;

/// Edge length of the square arena.
pub const DEFAULT_ARENA_SIZE: f32 = 20.0;
/// Sub-room edge length as a fraction of the arena size.
pub const DEFAULT_ROOM_FRACTION: f32 = 0.5;
/// Gap left in each sub-room wall.
pub const DEFAULT_DOOR_WIDTH: f32 = 2.5;
/// Thickness of generated walls.
pub const DEFAULT_WALL_THICKNESS: f32 = 0.25;
/// Clearance kept around placed agents.
pub const DEFAULT_AGENT_EXCLUSION_RADIUS: f32 = 0.75;
/// Clearance kept around placed props.
pub const DEFAULT_PROP_EXCLUSION_RADIUS: f32 = 1.5;
/// Wall pieces at or below this length are not generated.
pub const MIN_WALL_LENGTH: f32 = 0.25;

/// Candidate draws per agent before its placement is declared failed.
pub const AGENT_PLACEMENT_ATTEMPTS: u32 = 100;
/// Candidate draws per prop before the prop is dropped from the layout.
pub const PROP_PLACEMENT_ATTEMPTS: u32 = 20;
/// Whole-layout restarts after an agent placement failure.
pub const LAYOUT_ATTEMPTS: u32 = 20;

/// Reach of the grab and lock actions.
pub const DEFAULT_GRAB_DISTANCE: f32 = 2.0;
/// Separation at which a held prop is dropped.
pub const DEFAULT_HOLD_BREAK_DISTANCE: f32 = 4.0;

/// Collider radius of agent bodies in the reference world.
pub const AGENT_BODY_RADIUS: f32 = 0.5;
/// Collider radius of prop bodies in the reference world.
pub const PROP_BODY_RADIUS: f32 = 0.75;
