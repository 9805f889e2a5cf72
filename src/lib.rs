#![cfg_attr(docsrs, feature(doc_cfg))]
//! Episode engine for multi-agent hide-and-seek training.
//!
//! The crate drives episodes of two teams in a walled arena: hiders try to
//! stay out of the seekers' vision cones, seekers try to spot or capture
//! them. The engine never steps physics itself. It consumes a simulated
//! world through the collaborator traits in [`physics`] and [`entity`],
//! reports rewards and statistics through [`sink::TrainingSink`], and keeps
//! all per-episode state in [`episode::EpisodeController`].
//!
//! [`world::SimWorld`] is a small in-memory world implementing every
//! collaborator, used by the runner binary and the tests.
pub mod agent;
pub mod arena;
pub mod config;
pub mod constants;
pub mod entity;
pub mod episode;
pub mod logging;
pub mod numeric;
pub mod observation;
pub mod physics;
pub mod policy;
pub mod prop;
pub mod reward;
pub mod sink;
pub mod vector_math;
pub mod visibility;
pub mod world;
pub use constants::*;

// Re-export commonly used items
pub use agent::{Agent, AgentId, PolicySlot, Roster, Team};
pub use arena::{ArenaBounds, ArenaConfig, ArenaError, ArenaGenerator, ArenaLayout, Region};
pub use config::{ConfigError, SimulationConfig};
pub use entity::{EntityHandle, EntityLifecycle, Prefab};
pub use episode::{
    EpisodeConfig, EpisodeController, EpisodeError, EpisodeOutcome, Phase, Simulation,
    StepContext, StepReport, WinCondition,
};
pub use logging::init as init_logging;
pub use physics::{BodyState, Pose, RayCaster, RayHit};
pub use policy::{CheckpointPool, CoplayConfig, PolicyHandle, PolicyProvider};
pub use prop::{Prop, PropId, PropKind, PropState};
pub use reward::{RewardKind, RewardRule};
pub use sink::{RecordingSink, Stat, TrainingSink};
pub use visibility::{VisibilityMatrix, VisionCone};
pub use world::SimWorld;

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use hideseek::prelude::*;
    //!
    //! let mut world = SimWorld::new();
    //! let mut sink = RecordingSink::default();
    //! let generator = ArenaGenerator::new(ArenaConfig::default()).expect("valid arena");
    //! let mut controller =
    //!     EpisodeController::new(EpisodeConfig::default(), Roster::default(), Vec::new())
    //!         .with_generator(generator);
    //! let report = controller
    //!     .step(&mut StepContext::new(&mut world, &mut sink))
    //!     .expect("arena generated");
    //! assert_eq!(report.timer, 1);
    //! ```

    pub use crate::{
        AgentId, ArenaConfig, ArenaGenerator, EpisodeConfig, EpisodeController, Phase,
        RecordingSink, Roster, SimWorld, StepContext, Team, TrainingSink, WinCondition,
    };
    pub use glam::Vec2;
}
