//! Headless runner driving hide-and-seek episodes with random-walk agents.
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use log::info;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use hideseek::arena::spawn_static;
use hideseek::{
    init_logging, AgentId, ArenaGenerator, BodyState, EntityHandle, EpisodeController,
    RecordingSink, Roster, SimWorld, SimulationConfig, Stat, StepContext, Team,
};

/// Simulated seconds per step.
const STEP_SECONDS: f32 = 0.1;
const AGENT_SPEED: f32 = 2.0;
const MAX_TURN: f32 = 0.6;
/// Chance per step that a hider tries to grab or let go of a prop.
const ACTION_CHANCE: f64 = 0.05;

/// Headless hide-and-seek episode runner
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// JSON file with episode parameters
    #[arg(long)]
    game_params: Option<PathBuf>,
    /// JSON file with arena parameters
    #[arg(long)]
    arena_params: Option<PathBuf>,
    /// Number of episodes to run
    #[arg(long, default_value_t = 10)]
    episodes: u64,
    /// Seed for every random draw
    #[arg(long)]
    seed: Option<u64>,
}

struct Mover {
    id: AgentId,
    team: Team,
    entity: EntityHandle,
    can_move: bool,
}

/// Random walk for every agent allowed to move; hiders occasionally grab
/// and release props.
fn drive(controller: &mut EpisodeController, world: &mut SimWorld, rng: &mut SmallRng) {
    let movers: Vec<Mover> = controller
        .roster()
        .iter()
        .map(|agent| Mover {
            id: agent.id,
            team: agent.team,
            entity: agent.entity,
            can_move: controller.can_move(agent.id),
        })
        .collect();

    for mover in movers {
        if !mover.can_move {
            world.set_velocity(mover.entity, Vec2::ZERO);
            continue;
        }
        world.turn(mover.entity, rng.random_range(-MAX_TURN..=MAX_TURN));
        if let Some(pose) = world.pose(mover.entity) {
            world.set_velocity(mover.entity, pose.forward() * AGENT_SPEED);
        }
        if mover.team == Team::Hider
            && rng.random_bool(ACTION_CHANCE)
            && !controller.grab(mover.id, &*world)
        {
            controller.release(mover.id);
        }
    }
    world.advance(STEP_SECONDS);
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = SimulationConfig::load(args.game_params.as_deref(), args.arena_params.as_deref())
        .context("loading simulation parameters")?
        .with_seed(args.seed);
    config.validate().context("validating simulation parameters")?;
    config.log();

    let mut world = SimWorld::new();
    let generator =
        ArenaGenerator::new(config.arena.clone()).context("building the arena generator")?;
    let (roster, props) = if generator.instantiates_agents() {
        (Roster::default(), Vec::new())
    } else {
        spawn_static(&mut world, &config.arena)
    };

    let mut controller =
        EpisodeController::new(config.game.clone(), roster, props).with_generator(generator);
    let mut driver_rng = match config.seed {
        Some(seed) => {
            controller = controller.with_seed(seed);
            SmallRng::seed_from_u64(seed.wrapping_add(1))
        }
        None => SmallRng::from_os_rng(),
    };

    let mut sink = RecordingSink::default();
    info!("running {} episodes", args.episodes);
    while controller.episodes_completed() < args.episodes {
        let report = controller
            .step(&mut StepContext::new(&mut world, &mut sink))
            .context("stepping the episode")?;
        if let Some(outcome) = report.outcome {
            info!(
                "episode {}: {:?} won after {} steps (time hidden {:.2}, captured {:.2})",
                controller.episodes_completed(),
                outcome.winner,
                outcome.steps,
                outcome.time_hidden,
                outcome.captured_ratio
            );
            continue;
        }
        drive(&mut controller, &mut world, &mut driver_rng);
    }

    let wins = sink.stat_values(Stat::HiderWinRatio);
    let hider_wins = wins.iter().filter(|&&won| won > 0.0).count();
    info!(
        "hiders won {hider_wins} of {} episodes; group rewards hider {:.2}, seeker {:.2}",
        wins.len(),
        sink.group_total(Team::Hider),
        sink.group_total(Team::Seeker)
    );
    Ok(())
}
