//! Behaviour tests for whole episodes using rust-rspec.
//!
//! Each scenario builds a small world with hand-placed agents, steps the
//! controller and checks phases, captures, rewards and outcomes.

#[path = "support/rspec_runner.rs"]
mod rspec_runner;

use std::f32::consts::PI;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use hideseek::episode::EpisodeState;
use hideseek::{
    AgentId, EpisodeConfig, EpisodeController, Phase, RecordingSink, RewardKind, RewardRule,
    SimWorld, StepContext, StepReport, Team, WinCondition,
};
use rspec::block::Context as Scenario;
use rspec_runner::run_serial;
use test_utils::{quiet_config, run_steps, seeded_controller, world_with_agents, AgentSpec};

const HIDER: AgentId = AgentId(0);

struct Rig {
    world: SimWorld,
    controller: EpisodeController,
    sink: RecordingSink,
    reports: Vec<StepReport>,
}

impl Rig {
    fn new(specs: &[AgentSpec], config: EpisodeConfig) -> Self {
        let (world, roster) = world_with_agents(specs);
        Self {
            world,
            controller: seeded_controller(config, roster, Vec::new()),
            sink: RecordingSink::default(),
            reports: Vec::new(),
        }
    }

    fn step(&mut self, count: usize) {
        let reports = run_steps(&mut self.controller, &mut self.world, &mut self.sink, count);
        self.reports.extend(reports);
    }

    fn entity(&self, agent: AgentId) -> hideseek::EntityHandle {
        self.controller
            .roster()
            .get(agent)
            .map(|member| member.entity)
            .expect("agent on roster")
    }

    fn last(&self) -> &StepReport {
        self.reports.last().expect("at least one step")
    }
}

/// Shared handle to a rig so rspec can clone the environment.
#[derive(Clone)]
struct Episode {
    rig: Arc<Mutex<Rig>>,
    build: fn() -> Rig,
}

impl fmt::Debug for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Episode").finish_non_exhaustive()
    }
}

impl Episode {
    fn new(build: fn() -> Rig) -> Self {
        Self {
            rig: Arc::new(Mutex::new(build())),
            build,
        }
    }

    fn rig(&self) -> MutexGuard<'_, Rig> {
        self.rig.lock().expect("rig lock")
    }

    fn rebuild(&self) {
        *self.rig() = (self.build)();
    }
}

/// Seeker at the origin looking straight at a hider four units away.
fn watched_hider() -> Rig {
    let config = EpisodeConfig {
        rewards: vec![
            RewardRule::new(RewardKind::IndividualVisibility, 1.0),
            RewardRule::new(RewardKind::TeamVisibility, 1.0),
        ],
        ..quiet_config(100, 0.4)
    };
    Rig::new(
        &[AgentSpec::hider(4.0, 0.0, 0.0), AgentSpec::seeker(0.0, 0.0, 0.0)],
        config,
    )
}

#[test]
fn grace_period_withholds_visibility_rewards() {
    run_serial(&rspec::given(
        "a seeker with direct line of sight to a hider",
        Episode::new(watched_hider),
        |scenario: &mut Scenario<Episode>| {
            scenario.before_each(|episode| episode.rebuild());

            scenario.when("39 steps have run", |branch| {
                branch.before_each(|episode| {
                    episode.rebuild();
                    episode.rig().step(39);
                });

                branch.then("the episode is still in its grace period", |episode| {
                    let rig = episode.rig();
                    assert_eq!(rig.last().phase, Phase::GracePeriod);
                    assert!(rig.reports.iter().all(|report| report.all_hidden.is_none()));
                });

                branch.then("no visibility reward has been paid", |episode| {
                    let rig = episode.rig();
                    assert_eq!(rig.sink.agent_total(HIDER), 0.0);
                    assert_eq!(rig.sink.group_total(Team::Hider), 0.0);
                    assert_eq!(rig.sink.group_total(Team::Seeker), 0.0);
                });
            });

            scenario.when("the 40th step runs", |branch| {
                branch.before_each(|episode| {
                    episode.rebuild();
                    episode.rig().step(40);
                });

                branch.then("the grace period ends on exactly that step", |episode| {
                    let rig = episode.rig();
                    assert_eq!(rig.last().timer, 40);
                    assert_eq!(rig.last().phase, Phase::Active);
                    assert_eq!(rig.last().all_hidden, Some(false));
                });

                branch.then("visibility rewards start flowing", |episode| {
                    let rig = episode.rig();
                    assert_eq!(rig.sink.agent_total(HIDER), -1.0);
                    assert_eq!(rig.sink.agent_total(AgentId(1)), 1.0);
                    assert_eq!(rig.sink.group_total(Team::Hider), -1.0);
                    assert_eq!(rig.sink.group_total(Team::Seeker), 1.0);
                });
            });
        },
    ));
}

fn capture_config(max_captured: u32) -> EpisodeConfig {
    let mut config = EpisodeConfig {
        win_condition: WinCondition::Capture { max_captured },
        rewards: vec![RewardRule::new(RewardKind::Capture, 1.0)],
        ..quiet_config(10, 0.0)
    };
    config.capture.enabled = true;
    config.capture.distance = 1.2;
    config
}

/// Seeker facing away from a hider one unit behind it; a second hider far off.
fn close_hider_with_company() -> Rig {
    Rig::new(
        &[
            AgentSpec::hider(1.0, 0.0, 0.0),
            AgentSpec::hider(8.0, 8.0, 0.0),
            AgentSpec::seeker(0.0, 0.0, PI),
        ],
        capture_config(1),
    )
}

fn lone_close_hider() -> Rig {
    Rig::new(
        &[AgentSpec::hider(1.0, 0.0, 0.0), AgentSpec::seeker(0.0, 0.0, PI)],
        capture_config(0),
    )
}

#[test]
fn capture_within_reach_deactivates_hider() {
    run_serial(&rspec::given(
        "a hider 1.0 from a seeker with a capture distance of 1.2",
        Episode::new(close_hider_with_company),
        |scenario: &mut Scenario<Episode>| {
            scenario.before_each(|episode| {
                episode.rebuild();
                episode.rig().step(1);
            });

            scenario.then("the hider is captured on the first active step", |episode| {
                let rig = episode.rig();
                let captures = &rig.last().captures;
                assert_eq!(captures.len(), 1);
                assert_eq!(captures[0].hider, HIDER);
                assert!(captures[0].deactivated);
                assert_eq!(rig.controller.state().hiders_captured, 1);
                assert!(rig.controller.roster().get(HIDER).is_some_and(|a| a.captured));
            });

            scenario.then("only the captured hider's body is deactivated", |episode| {
                let rig = episode.rig();
                assert!(!rig.world.is_active(rig.entity(HIDER)));
                assert!(rig.world.is_active(rig.entity(AgentId(1))));
                assert!(rig.last().outcome.is_none());
            });

            scenario.then("the capture rule pays the seeker and charges the hider", |episode| {
                let rig = episode.rig();
                assert_eq!(rig.sink.agent_total(AgentId(2)), 1.0);
                assert_eq!(rig.sink.agent_total(HIDER), -1.0);
            });
        },
    ));
}

#[test]
fn capturing_last_hider_ends_episode() {
    run_serial(&rspec::given(
        "the only hider within capture reach",
        Episode::new(lone_close_hider),
        |scenario: &mut Scenario<Episode>| {
            scenario.before_each(|episode| {
                episode.rebuild();
                episode.rig().step(1);
            });

            scenario.then("the episode terminates immediately", |episode| {
                let rig = episode.rig();
                let report = rig.last();
                assert_eq!(report.phase, Phase::Terminal);
                assert!(!report.captures[0].deactivated);
                let outcome = report.outcome.expect("episode finished");
                assert_eq!(outcome.hiders_captured, 1);
                assert_eq!(outcome.captured_ratio, 1.0);
                assert_eq!(outcome.winner, Team::Seeker);
            });

            scenario.then("the next episode has already been prepared", |episode| {
                let rig = episode.rig();
                assert_eq!(rig.controller.phase(), Phase::GracePeriod);
                assert_eq!(rig.controller.episodes_completed(), 1);
                assert!(rig.world.is_active(rig.entity(HIDER)));
                assert_eq!(rig.sink.episodes_closed(Team::Seeker), 1);
            });
        },
    ));
}

/// Seeker facing away from a hider; tests turn it round for single steps.
fn hider_behind_seeker() -> Rig {
    Rig::new(
        &[AgentSpec::hider(4.0, 0.0, 0.0), AgentSpec::seeker(0.0, 0.0, PI)],
        quiet_config(10, 0.2),
    )
}

fn glance(episode: &Episode) {
    let mut rig = episode.rig();
    rig.step(4);
    let seeker = rig.entity(AgentId(1));
    rig.world.set_heading(seeker, 0.0);
    rig.step(1);
    rig.world.set_heading(seeker, PI);
}

#[test]
fn single_sighting_loses_line_of_sight_game() {
    run_serial(&rspec::given(
        "a line-of-sight episode where the seeker glances at the hider once",
        Episode::new(hider_behind_seeker),
        |scenario: &mut Scenario<Episode>| {
            scenario.before_each(|episode| {
                episode.rebuild();
                glance(episode);
            });

            scenario.then("the perfect game is lost on the sighting step", |episode| {
                let rig = episode.rig();
                assert_eq!(rig.last().all_hidden, Some(false));
                assert!(!rig.controller.state().hiders_perfect_game);
            });

            scenario.when("the episode runs to its end unseen", |branch| {
                branch.before_each(|episode| episode.rig().step(5));

                branch.then("seekers still win", |episode| {
                    let rig = episode.rig();
                    let outcome = rig.last().outcome.expect("episode finished");
                    assert_eq!(outcome.winner, Team::Seeker);
                    assert_eq!(outcome.steps, 10);
                    // Nine active steps, one of them seen.
                    assert!((outcome.time_hidden - 8.0 / 9.0).abs() < 1e-6);
                });
            });
        },
    ));
}

#[test]
fn manual_reset_restores_counters() {
    run_serial(&rspec::given(
        "an episode interrupted after a sighting",
        Episode::new(hider_behind_seeker),
        |scenario: &mut Scenario<Episode>| {
            scenario.before_each(|episode| {
                episode.rebuild();
                glance(episode);
                let mut rig = episode.rig();
                let Rig {
                    world,
                    controller,
                    sink,
                    ..
                } = &mut *rig;
                controller
                    .reset(&mut StepContext::new(world, sink))
                    .expect("reset");
            });

            scenario.then("every episode counter is back to its start value", |episode| {
                let rig = episode.rig();
                assert_eq!(rig.controller.state(), &EpisodeState::default());
                assert!(rig.controller.state().hiders_perfect_game);
                assert!(rig.controller.ledger().is_empty());
                assert_eq!(rig.controller.phase(), Phase::GracePeriod);
            });

            scenario.then("no end-of-episode signal was sent", |episode| {
                let rig = episode.rig();
                assert_eq!(rig.sink.episodes_closed(Team::Hider), 0);
                assert_eq!(rig.controller.episodes_completed(), 0);
            });
        },
    ));
}
