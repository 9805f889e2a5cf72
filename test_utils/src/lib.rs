//! Fixture builders shared by the integration tests.
//!
//! Worlds are assembled from [`AgentSpec`] lists so each test states only
//! the poses it cares about.
use glam::Vec2;
use hideseek::{
    Agent, AgentId, EpisodeConfig, EpisodeController, Prefab, Prop, PropId, PropKind, Roster,
    SimWorld, StepContext, StepReport, Team, TrainingSink, WinCondition,
};

/// Pose of one agent to spawn.
#[derive(Clone, Copy, Debug)]
pub struct AgentSpec {
    pub team: Team,
    pub position: Vec2,
    pub heading: f32,
}

impl AgentSpec {
    /// A hider at `(x, z)` facing `heading`.
    ///
    /// # Examples
    /// ```
    /// use test_utils::AgentSpec;
    /// let spec = AgentSpec::hider(1.0, 2.0, 0.0);
    /// assert_eq!(spec.position.y, 2.0);
    /// ```
    pub fn hider(x: f32, z: f32, heading: f32) -> Self {
        Self {
            team: Team::Hider,
            position: Vec2::new(x, z),
            heading,
        }
    }

    /// A seeker at `(x, z)` facing `heading`.
    pub fn seeker(x: f32, z: f32, heading: f32) -> Self {
        Self {
            team: Team::Seeker,
            position: Vec2::new(x, z),
            heading,
        }
    }
}

/// Spawns `specs` into a fresh world. Agent ids follow the input order.
pub fn world_with_agents(specs: &[AgentSpec]) -> (SimWorld, Roster) {
    let mut world = SimWorld::new();
    let roster = spawn_agents(&mut world, specs);
    (world, roster)
}

/// Spawns `specs` into `world` and returns their roster.
pub fn spawn_agents(world: &mut SimWorld, specs: &[AgentSpec]) -> Roster {
    let agents = specs.iter().zip(0u32..).map(|(spec, id)| {
        let prefab = match spec.team {
            Team::Hider => Prefab::Hider,
            Team::Seeker => Prefab::Seeker,
        };
        let entity = world.spawn(prefab, spec.position, spec.heading);
        Agent::new(AgentId(id), spec.team, entity)
    });
    Roster::from_agents(agents)
}

/// Spawns one box per position, with prop ids in input order.
pub fn spawn_boxes(world: &mut SimWorld, positions: &[Vec2]) -> Vec<Prop> {
    positions
        .iter()
        .zip(0u32..)
        .map(|(position, id)| {
            let entity = world.spawn(Prefab::Prop(PropKind::Box), *position, 0.0);
            Prop::new(PropId(id), PropKind::Box, entity)
        })
        .collect()
}

/// Episode settings with no shaping rules, for tests that only look at
/// phases, visibility and outcomes.
pub fn quiet_config(episode_steps: u32, grace_period_fraction: f64) -> EpisodeConfig {
    EpisodeConfig {
        episode_steps,
        grace_period_fraction,
        win_condition: WinCondition::LineOfSight,
        rewards: Vec::new(),
        ..EpisodeConfig::default()
    }
}

/// A controller with a fixed seed so layouts and coplay draws repeat.
pub fn seeded_controller(config: EpisodeConfig, roster: Roster, props: Vec<Prop>) -> EpisodeController {
    EpisodeController::new(config, roster, props).with_seed(7)
}

/// Steps the controller `count` times and returns every report.
///
/// # Panics
/// Panics if a step fails to reset the arena.
pub fn run_steps<S>(
    controller: &mut EpisodeController,
    world: &mut SimWorld,
    sink: &mut S,
    count: usize,
) -> Vec<StepReport>
where
    S: TrainingSink,
{
    (0..count)
        .map(|_| {
            controller
                .step(&mut StepContext::new(&mut *world, &mut *sink))
                .unwrap_or_else(|err| panic!("step failed: {err}"))
        })
        .collect()
}
