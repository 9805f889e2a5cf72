//! Episode orchestration.
//!
//! [`EpisodeController`] owns everything that lives for one episode: the
//! roster, the props, the visibility matrix, the counters and the pending
//! rewards. Collaborators are passed in through a [`StepContext`] on every
//! call, so the controller never holds a reference to the world.
//!
//! Each [`EpisodeController::step`] runs the whole pipeline to completion:
//! advance the timer, refresh visibility, resolve captures, shape and flush
//! rewards, and on termination settle the episode and reset for the next.

mod actions;
mod config;
mod state;

use glam::Vec2;
use log::{debug, error, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::agent::{AgentId, PolicySlot, Roster, Team};
use crate::arena::{ArenaBounds, ArenaConfig, ArenaError, ArenaGenerator};
use crate::entity::EntityLifecycle;
use crate::numeric::{count_to_f32, step_ratio};
use crate::observation::{observe, Observation};
use crate::physics::{BodyState, RayCaster};
use crate::policy::PolicyProvider;
use crate::prop::Prop;
use crate::reward::{RewardLedger, RewardShaper, StepFacts};
use crate::sink::{Stat, TrainingSink};
use crate::vector_math::planar_distance;
use crate::visibility::{VisibilityMatrix, VisionCone};

pub use config::{ActionConfig, CaptureConfig, EpisodeConfig, WinCondition};
pub use state::{EpisodeState, Phase};

/// Everything the controller needs from the simulated world.
pub trait Simulation: RayCaster + BodyState + EntityLifecycle {}

impl<T> Simulation for T where T: RayCaster + BodyState + EntityLifecycle {}

/// Collaborators for one call into the controller.
pub struct StepContext<'a> {
    /// Ray casts, poses and entity lifecycle.
    pub world: &'a mut dyn Simulation,
    /// Receives rewards and statistics.
    pub sink: &'a mut dyn TrainingSink,
    /// Checkpoint source for coplay episodes.
    pub policies: Option<&'a mut dyn PolicyProvider>,
}

impl<'a> StepContext<'a> {
    /// Context without a policy provider.
    #[must_use]
    pub const fn new(world: &'a mut dyn Simulation, sink: &'a mut dyn TrainingSink) -> Self {
        Self {
            world,
            sink,
            policies: None,
        }
    }

    /// Adds a checkpoint source for coplay.
    #[must_use]
    pub const fn with_policies(mut self, policies: &'a mut dyn PolicyProvider) -> Self {
        self.policies = Some(policies);
        self
    }
}

/// Failures surfaced by the controller.
#[derive(Debug, Error)]
pub enum EpisodeError {
    /// The arena could not be generated, so the episode cannot start.
    #[error("episode reset failed: {0}")]
    Arena(#[from] ArenaError),
}

/// A seeker capturing a hider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureEvent {
    /// The capturing seeker.
    pub seeker: AgentId,
    /// The captured hider.
    pub hider: AgentId,
    /// `false` for the last remaining hider, whose capture ends the episode
    /// instead.
    pub deactivated: bool,
}

/// Result of a finished episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeOutcome {
    /// Team that won under the configured condition.
    pub winner: Team,
    /// Share of active steps with every hider hidden.
    pub time_hidden: f32,
    /// Hiders captured during the episode.
    pub hiders_captured: u32,
    /// `hiders_captured` over the hider count.
    pub captured_ratio: f32,
    /// Steps the episode lasted.
    pub steps: u32,
}

/// What happened during one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Phase at the end of the step, before any reset.
    pub phase: Phase,
    /// Timer after the step.
    pub timer: u32,
    /// `None` during the grace period.
    pub all_hidden: Option<bool>,
    /// Captures resolved this step.
    pub captures: Vec<CaptureEvent>,
    /// Present on the step that ended the episode.
    pub outcome: Option<EpisodeOutcome>,
}

/// Runs hide-and-seek episodes step by step.
#[derive(Debug)]
pub struct EpisodeController {
    config: EpisodeConfig,
    cone: VisionCone,
    shaper: RewardShaper,
    state: EpisodeState,
    roster: Roster,
    props: Vec<Prop>,
    visibility: VisibilityMatrix,
    ledger: RewardLedger,
    generator: Option<ArenaGenerator>,
    bounds: ArenaBounds,
    rng: SmallRng,
    needs_reset: bool,
    episodes: u64,
}

impl EpisodeController {
    /// Creates a controller for a fixed roster and prop set. The first
    /// [`step`](Self::step) resets the episode.
    #[must_use]
    pub fn new(config: EpisodeConfig, roster: Roster, props: Vec<Prop>) -> Self {
        let (hiders, seekers) = roster.shape();
        Self {
            cone: VisionCone::new(config.cone_half_angle_deg),
            shaper: RewardShaper::new(config.rewards.clone()),
            config,
            state: EpisodeState::default(),
            roster,
            props,
            visibility: VisibilityMatrix::new(hiders, seekers),
            ledger: RewardLedger::default(),
            generator: None,
            bounds: ArenaConfig::default().bounds(),
            rng: SmallRng::from_os_rng(),
            needs_reset: true,
            episodes: 0,
        }
    }

    /// Hands arena generation to `generator`; its bounds replace the default
    /// out-of-bounds square.
    #[must_use]
    pub fn with_generator(mut self, generator: ArenaGenerator) -> Self {
        self.bounds = generator.bounds();
        self.generator = Some(generator);
        self
    }

    /// Seeds every random draw the controller makes.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Replaces the out-of-bounds square.
    #[must_use]
    pub const fn with_bounds(mut self, bounds: ArenaBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Episode rules in force.
    #[must_use]
    pub const fn config(&self) -> &EpisodeConfig {
        &self.config
    }

    /// Counters of the running episode.
    #[must_use]
    pub const fn state(&self) -> &EpisodeState {
        &self.state
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Agents of the running episode.
    #[must_use]
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Props of the running episode.
    #[must_use]
    pub fn props(&self) -> &[Prop] {
        &self.props
    }

    /// Sightings from the latest active step.
    #[must_use]
    pub const fn visibility(&self) -> &VisibilityMatrix {
        &self.visibility
    }

    /// Rewards not yet flushed.
    #[must_use]
    pub const fn ledger(&self) -> &RewardLedger {
        &self.ledger
    }

    /// Reward buffered for `agent` and not yet flushed.
    #[must_use]
    pub fn pending_reward(&self, agent: AgentId) -> f32 {
        self.ledger.pending(agent)
    }

    /// Arena generator, when one is attached.
    #[must_use]
    pub const fn generator(&self) -> Option<&ArenaGenerator> {
        self.generator.as_ref()
    }

    /// Square used for the out-of-bounds penalty.
    #[must_use]
    pub const fn bounds(&self) -> ArenaBounds {
        self.bounds
    }

    /// Number of episodes that ran to termination.
    #[must_use]
    pub const fn episodes_completed(&self) -> u64 {
        self.episodes
    }

    /// Observation vector for `agent`, relative to the arena centre.
    #[must_use]
    pub fn observe<W>(&self, agent: AgentId, world: &W) -> Option<Observation>
    where
        W: BodyState + ?Sized,
    {
        observe(&self.roster, agent, self.bounds.center, world)
    }

    /// Advances the episode by one simulation step.
    ///
    /// A step that ends the episode also prepares the next one. If that
    /// reset fails the report still carries the outcome; the failure is
    /// logged and the controller stays [`Phase::Terminal`] until a later
    /// call manages the reset.
    ///
    /// # Errors
    /// [`EpisodeError::Arena`] when a reset pending from an earlier call
    /// cannot generate the arena. The controller stays in need of a reset
    /// and retries on the next call.
    pub fn step(&mut self, ctx: &mut StepContext<'_>) -> Result<StepReport, EpisodeError> {
        if self.needs_reset {
            self.reset(ctx)?;
        }

        self.enforce_hold_distance(&*ctx.world);
        self.state.timer += 1;
        self.record_team_means(ctx);

        if self.state.phase == Phase::GracePeriod && self.config.grace_period_ended(self.state.timer)
        {
            debug!("grace period over at step {}", self.state.timer);
            self.state.phase = Phase::Active;
        }

        let mut all_hidden = None;
        let mut captures = Vec::new();
        if self.state.phase == Phase::Active {
            self.state.active_steps += 1;
            self.visibility.fill(&self.cone, &self.roster, &*ctx.world);
            let hidden = self.visibility.all_hidden();
            if hidden {
                self.state.steps_hidden += 1;
            } else if self.state.hiders_perfect_game {
                debug!("hiders first seen at step {}", self.state.timer);
                self.state.hiders_perfect_game = false;
            }
            all_hidden = Some(hidden);
            if self.config.capture.enabled {
                captures = self.resolve_captures(ctx);
            }
        }

        let positions = self.positions(&*ctx.world);
        let facts = StepFacts {
            grace_period_ended: self.state.phase == Phase::Active,
            capture_enabled: self.config.capture.enabled,
            roster: &self.roster,
            visibility: &self.visibility,
            positions: &positions,
            bounds: self.bounds,
        };
        let deltas = self.shaper.evaluate(&facts);
        self.ledger.apply(&deltas);
        self.ledger.flush(&mut *ctx.sink);

        let mut report = StepReport {
            phase: self.state.phase,
            timer: self.state.timer,
            all_hidden,
            captures,
            outcome: None,
        };
        if self.is_terminal() {
            self.state.phase = Phase::Terminal;
            report.phase = Phase::Terminal;
            report.outcome = Some(self.finish(ctx));
            if let Err(err) = self.reset(ctx) {
                error!("next episode could not be prepared: {err}");
            }
        }
        Ok(report)
    }

    fn is_terminal(&self) -> bool {
        let all_captured = self.config.capture.enabled
            && !self.roster.hiders().is_empty()
            && self.roster.remaining_hiders() == 0;
        self.state.timer >= self.config.episode_steps || all_captured
    }

    fn positions<W>(&self, world: &W) -> Vec<(AgentId, Vec2)>
    where
        W: BodyState + ?Sized,
    {
        self.roster
            .iter()
            .filter_map(|agent| world.pose(agent.entity).map(|pose| (agent.id, pose.position)))
            .collect()
    }

    fn record_team_means(&self, ctx: &mut StepContext<'_>) {
        for team in [Team::Hider, Team::Seeker] {
            let positions: Vec<Vec2> = self
                .roster
                .team(team)
                .iter()
                .filter(|agent| !agent.captured)
                .filter_map(|agent| ctx.world.pose(agent.entity))
                .map(|pose| pose.position - self.bounds.center)
                .collect();
            if positions.is_empty() {
                continue;
            }
            let mean = positions.iter().sum::<Vec2>() / count_to_f32(positions.len());
            let (x, z) = Stat::team_mean(team);
            ctx.sink.record_stat(x, mean.x);
            ctx.sink.record_stat(z, mean.y);
        }
    }

    /// Captures every uncaptured hider within reach of a seeker, seekers in
    /// roster order.
    fn resolve_captures(&mut self, ctx: &mut StepContext<'_>) -> Vec<CaptureEvent> {
        let reach = self.config.capture.distance;
        let mut pairs = Vec::new();
        for seeker in self.roster.seekers() {
            let Some(seeker_pose) = ctx.world.pose(seeker.entity) else {
                continue;
            };
            for (index, hider) in self.roster.hiders().iter().enumerate() {
                if hider.captured {
                    continue;
                }
                let Some(hider_pose) = ctx.world.pose(hider.entity) else {
                    continue;
                };
                if planar_distance(seeker_pose.position, hider_pose.position) < reach {
                    pairs.push((seeker.id, index));
                }
            }
        }

        pairs
            .into_iter()
            .filter_map(|(seeker, index)| self.capture(seeker, index, ctx))
            .collect()
    }

    fn capture(
        &mut self,
        seeker: AgentId,
        index: usize,
        ctx: &mut StepContext<'_>,
    ) -> Option<CaptureEvent> {
        let hider = self.roster.hiders_mut().get_mut(index)?;
        if hider.captured {
            return None;
        }
        hider.captured = true;
        let hider_id = hider.id;
        let entity = hider.entity;
        if let Some(prop_id) = hider.held.take() {
            if let Some(prop) = self.props.iter_mut().find(|prop| prop.id == prop_id) {
                prop.release(hider_id);
            }
        }

        self.state.hiders_captured += 1;
        self.ledger.apply(&self.shaper.capture(seeker, hider_id));

        let deactivated = self.roster.remaining_hiders() > 0;
        if deactivated {
            ctx.world.set_active(entity, false);
        }
        debug!(
            "seeker {seeker:?} captured hider {hider_id:?} at step {}",
            self.state.timer
        );
        Some(CaptureEvent {
            seeker,
            hider: hider_id,
            deactivated,
        })
    }

    fn hiders_won(&self) -> bool {
        match self.config.win_condition {
            WinCondition::None | WinCondition::LineOfSight => self.state.hiders_perfect_game,
            WinCondition::Capture { max_captured } => self.state.hiders_captured <= max_captured,
            WinCondition::TimeHidden { threshold } => self.state.time_hidden() > threshold,
        }
    }

    /// Settles the finished episode: terminal bonus, statistics and the
    /// group-episode boundary.
    fn finish(&mut self, ctx: &mut StepContext<'_>) -> EpisodeOutcome {
        let winner = if self.hiders_won() {
            Team::Hider
        } else {
            Team::Seeker
        };
        if self.config.win_condition != WinCondition::None {
            let bonus = self.config.terminal_bonus;
            self.ledger.add_team(winner, bonus);
            self.ledger.add_team(winner.opponent(), -bonus);
        }
        self.ledger.flush(&mut *ctx.sink);

        let hider_count = u32::try_from(self.roster.hiders().len()).unwrap_or(u32::MAX);
        let outcome = EpisodeOutcome {
            winner,
            time_hidden: self.state.time_hidden(),
            hiders_captured: self.state.hiders_captured,
            captured_ratio: step_ratio(self.state.hiders_captured, hider_count),
            steps: self.state.timer,
        };
        ctx.sink.record_stat(Stat::TimeHidden, outcome.time_hidden);
        ctx.sink.record_stat(Stat::HidersCaptured, outcome.captured_ratio);
        ctx.sink.record_stat(
            Stat::HiderWinRatio,
            if winner == Team::Hider { 1.0 } else { 0.0 },
        );
        ctx.sink.end_group_episode(Team::Hider);
        ctx.sink.end_group_episode(Team::Seeker);

        self.episodes += 1;
        let message = format!(
            "episode {} won by {:?}: time hidden {:.2}, {} of {} hiders captured, {} steps",
            self.episodes,
            winner,
            outcome.time_hidden,
            outcome.hiders_captured,
            hider_count,
            outcome.steps
        );
        if self.config.log_match_result {
            info!("{message}");
        } else {
            debug!("{message}");
        }
        outcome
    }

    /// Starts a fresh episode.
    ///
    /// Counters and pending rewards are cleared without paying any terminal
    /// reward, bodies not owned by the generator are restored, the arena is
    /// regenerated, and the visibility matrix and reward groups are rebuilt
    /// for the new roster.
    ///
    /// # Errors
    /// [`EpisodeError::Arena`] when a required agent cannot be placed. The
    /// roster is left as it was and the next step retries the reset.
    pub fn reset(&mut self, ctx: &mut StepContext<'_>) -> Result<(), EpisodeError> {
        self.state.reset();
        self.ledger.clear();
        self.needs_reset = true;

        let owns_agents = self
            .generator
            .as_ref()
            .is_some_and(ArenaGenerator::instantiates_agents);
        let owns_props = self
            .generator
            .as_ref()
            .is_some_and(ArenaGenerator::instantiates_props);

        for agent in self.roster.iter_mut() {
            agent.reset();
            agent.policy = PolicySlot::Training;
            if !owns_agents {
                ctx.world.halt(agent.entity);
                ctx.world.set_active(agent.entity, true);
            }
        }
        for prop in &mut self.props {
            prop.reset();
            if !owns_props {
                ctx.world.halt(prop.entity);
                ctx.world.set_kinematic(prop.entity, false);
                ctx.world.set_active(prop.entity, true);
            }
        }

        if let Some(generator) = self.generator.as_mut() {
            if let Err(err) = generator.generate(
                &mut *ctx.world,
                &mut self.roster,
                &mut self.props,
                &mut self.rng,
            ) {
                self.state.phase = Phase::Terminal;
                return Err(err.into());
            }
        }

        let (hiders, seekers) = self.roster.shape();
        if self.visibility.shape() != (hiders, seekers) {
            debug!("visibility matrix reshaped to {hiders}x{seekers}");
        }
        self.visibility.resize(hiders, seekers);
        for team in [Team::Hider, Team::Seeker] {
            ctx.sink.register_group(team, &self.roster.ids(team));
        }
        self.assign_policies(ctx);

        self.needs_reset = false;
        debug!(
            "episode reset: {hiders} hiders, {seekers} seekers, {} props",
            self.props.len()
        );
        Ok(())
    }

    fn assign_policies(&mut self, ctx: &mut StepContext<'_>) {
        if !self.config.coplay.enabled {
            return;
        }
        let Some(provider) = ctx.policies.as_deref_mut() else {
            return;
        };
        provider.rescan();
        if !self
            .rng
            .random_bool(self.config.coplay.self_play_ratio.clamp(0.0, 1.0))
        {
            return;
        }

        let team = provider.team();
        for agent in self
            .roster
            .team_mut(team)
            .iter_mut()
            .take(self.config.coplay.coplay_agents)
        {
            if let Some(handle) = provider.sample(&mut self.rng) {
                debug!("agent {:?} plays frozen policy {:?}", agent.id, handle);
                agent.policy = PolicySlot::Frozen(handle);
            }
        }
    }
}
