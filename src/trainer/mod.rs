//! # Training Handler
//!
//! [`TrainingHandler`] owns one training session: it bootstraps the replay
//! memory with random play, builds the [`DqnAgent`] from it and runs the epoch
//! loop with periodic evaluation, best-score capture, plateau learning-rate
//! decay and checkpoints.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle -> Bootstrapping -> Training <-> Paused
//!                             |
//!                             v
//!                          Finished
//! ```
//!
//! [`TrainingControl::stop`] ends the loop without a final checkpoint,
//! [`TrainingControl::pause`] ends it with one.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ricochet::brain::DqnBrain;
//! use ricochet::checkpoint::CheckpointWriter;
//! use ricochet::config::Hyperparameters;
//! use ricochet::env::{Environment, RicochetConfig, RicochetEnv};
//! use ricochet::metrics::StatsCollector;
//! use ricochet::trainer::TrainingHandler;
//!
//! let hp = Hyperparameters::default().epochs(500);
//! let env = RicochetEnv::new(RicochetConfig::default()).unwrap();
//! let mut rng = rand::thread_rng();
//! let brain = DqnBrain::new(env.state_size(), env.legal_action_count(), &hp.brain_config(), &mut rng).unwrap();
//! let checkpoints = CheckpointWriter::new("models", "ricochet", "1");
//! let mut handler = TrainingHandler::new(env, brain, hp, checkpoints, StatsCollector::new()).unwrap();
//! let report = handler.start_training().unwrap();
//! println!("{:?}", report);
//! ```

mod bootstrap;
mod control;
mod playout;

pub use bootstrap::bootstrap;
pub use control::TrainingControl;
pub use playout::{randomness_sweep, select_shortest};

use log::{debug, error, info};
use ndarray::{Array1, ArrayView1};
use rand::{rngs::SmallRng, SeedableRng};

use crate::agent::{DqnAgent, DqnAgentBuilder};
use crate::brain::Brain;
use crate::checkpoint::CheckpointWriter;
use crate::config::Hyperparameters;
use crate::env::{Environment, EpisodeRunner, Playout};
use crate::error::{Result, TrainError};
use crate::metrics::{Series, StatsCollector};
use crate::optimizer::PlateauScheduler;
use crate::visualization::StatusSink;

/// Where a [`TrainingHandler`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    Idle,
    Bootstrapping,
    Training,
    Paused,
    Finished,
}

/// What a finished session did.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub epochs: usize,
    pub evaluations: usize,
    /// Full checkpoints written, the final one included
    pub snapshots: usize,
    /// Checkpoint writes that failed and were skipped
    pub checkpoint_failures: usize,
    /// Best average evaluation steps, or the capture threshold if never beaten
    pub best_minimum: f32,
    pub learning_rate: f32,
    pub state: HandlerState,
    pub finished: bool,
}

fn not_bootstrapped() -> TrainError {
    TrainError::Training("the agent exists only once training has started".to_string())
}

/// Orchestrates one training session of a [`DqnAgent`] on an environment.
pub struct TrainingHandler<E: Environment, B: Brain> {
    env: E,
    hp: Hyperparameters,
    runner: EpisodeRunner,
    /// Held until bootstrap hands it to the agent
    brain: Option<B>,
    agent: Option<DqnAgent<B>>,
    stats: StatsCollector,
    status: Option<Box<dyn StatusSink>>,
    control: TrainingControl,
    checkpoints: CheckpointWriter,
    scheduler: Option<PlateauScheduler>,
    minimum: f32,
    snapshots: usize,
    checkpoint_failures: usize,
    state: HandlerState,
    finished: bool,
    rng: SmallRng,
}

impl<E: Environment, B: Brain> TrainingHandler<E, B> {
    /// Set up a session. Fails on invalid hyperparameters.
    pub fn new(
        env: E,
        brain: B,
        hp: Hyperparameters,
        checkpoints: CheckpointWriter,
        stats: StatsCollector,
    ) -> Result<Self> {
        hp.validate()?;
        let rng = match hp.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        Ok(TrainingHandler {
            runner: EpisodeRunner::from_hyperparameters(&hp),
            scheduler: hp.plateau_scheduler(),
            minimum: hp.minimum_capture_thresh,
            env,
            hp,
            brain: Some(brain),
            agent: None,
            stats,
            status: None,
            control: TrainingControl::new(),
            checkpoints,
            snapshots: 0,
            checkpoint_failures: 0,
            state: HandlerState::Idle,
            finished: false,
            rng,
        })
    }

    /// Attach a status sink that receives one data point per evaluation.
    pub fn with_status(mut self, status: Box<dyn StatusSink>) -> Self {
        self.status = Some(status);
        self
    }

    /// A handle sharing this session's cancellation flags.
    pub fn control(&self) -> TrainingControl {
        self.control.clone()
    }

    pub fn state(&self) -> HandlerState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn stats(&self) -> &StatsCollector {
        &self.stats
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hp
    }

    pub fn agent(&self) -> Option<&DqnAgent<B>> {
        self.agent.as_ref()
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    /// Best average evaluation steps seen so far.
    pub fn minimum(&self) -> f32 {
        self.minimum
    }

    pub fn learning_rate(&self) -> f32 {
        match (&self.agent, &self.brain) {
            (Some(agent), _) => agent.brain.learning_rate(),
            (None, Some(brain)) => brain.learning_rate(),
            (None, None) => self.hp.learning_rate,
        }
    }

    /// Stop after the current epoch, dropping the final checkpoint.
    pub fn stop_training(&self) {
        info!("stopping training");
        self.control.stop();
    }

    /// Stop after the current epoch, keeping the final checkpoint.
    pub fn pause_training(&self) {
        info!("pausing training");
        self.control.pause();
    }

    /// Swap the hyperparameters and forward the new learning rate to the brain.
    pub fn set_hyperparameters(&mut self, hp: Hyperparameters) -> Result<()> {
        hp.validate()?;
        match (&mut self.agent, &mut self.brain) {
            (Some(agent), _) => agent.update_learning_rate(hp.learning_rate),
            (None, Some(brain)) => brain.update_learning_rate(hp.learning_rate),
            (None, None) => {}
        }
        if hp.early_stop != self.hp.early_stop {
            self.scheduler = hp.plateau_scheduler();
        }
        self.runner = EpisodeRunner::from_hyperparameters(&hp);
        self.hp = hp;
        Ok(())
    }

    /// Value estimates of the online (or target) network for one state.
    pub fn predict_one(&mut self, state: ArrayView1<f32>, target: bool) -> Result<Array1<f32>> {
        match (&mut self.agent, &mut self.brain) {
            (Some(agent), _) => Ok(agent.brain.predict(state, target)),
            (None, Some(brain)) => Ok(brain.predict(state, target)),
            (None, None) => Err(not_bootstrapped()),
        }
    }

    /// Search for the shortest solution of a fresh board.
    ///
    /// Plays one playout per randomness level `0, step, 2·step, … ≤ max_randomness`
    /// and keeps the one with the fewest actions.
    pub fn play_game(&mut self, max_randomness: f32) -> Result<Playout> {
        let agent = self.agent.as_mut().ok_or_else(not_bootstrapped)?;

        let mut playouts = Vec::new();
        for randomness in randomness_sweep(max_randomness, self.hp.playout_randomness_step) {
            playouts.push(self.runner.play_game(&mut self.env, agent, randomness, &mut self.rng)?);
        }
        let best = select_shortest(playouts).ok_or_else(|| TrainError::Training("no playout was run".to_string()))?;

        let moves = best
            .actions
            .iter()
            .map(|&action| self.env.describe_action(action))
            .collect::<Vec<_>>()
            .join(" ");
        if best.solved {
            info!("solved in {} moves: {}", best.actions.len(), moves);
        } else {
            info!("no solution within {} moves: {}", self.runner.max_steps(), moves);
        }
        Ok(best)
    }

    /// Run the whole session: bootstrap, then the epoch loop.
    pub fn start_training(&mut self) -> Result<TrainingReport> {
        if self.state != HandlerState::Idle {
            return Err(TrainError::Training(format!("cannot start training from {:?}", self.state)));
        }

        self.state = HandlerState::Bootstrapping;
        let bootstrap_rng = SmallRng::from_rng(&mut self.rng).map_err(|err| TrainError::Training(err.to_string()))?;
        let memory = bootstrap(&mut self.env, &self.runner, self.hp.batch_size, bootstrap_rng)?;

        let brain = self.brain.take().ok_or_else(not_bootstrapped)?;
        info!("{}", brain.summary());
        let agent = DqnAgentBuilder::from_hyperparameters(&self.hp).build(brain, memory)?;
        self.agent = Some(agent);

        self.control.start();
        self.finished = false;
        self.checkpoints.restart_clock();
        if let Err(err) = self.checkpoints.prepare() {
            self.record_checkpoint_failure(err)?;
        }

        self.state = HandlerState::Training;
        info!("starting training");

        let mut epoch = 0;
        let mut evaluations = 0;
        let mut last_snapshot = None;
        while epoch < self.hp.epochs && self.control.is_training() {
            epoch += 1;

            let outcome = {
                let agent = self.agent.as_mut().ok_or_else(not_bootstrapped)?;
                self.runner.run(&mut self.env, agent)?
            };
            self.stats.collect(Series::Steps, outcome.steps as f32);
            self.stats.collect(Series::Rewards, outcome.reward);
            debug!("epoch {}: {} steps, reward {}", epoch, outcome.steps, outcome.reward);

            if epoch % self.hp.debug_log_epochs == 0 {
                self.evaluate(epoch)?;
                evaluations += 1;
            }

            if epoch % self.hp.debug_snapshot == 0 && self.snapshot(epoch)? {
                last_snapshot = Some(epoch);
            }
        }

        // A completed run leaves the training flag set; only pause clears it and keeps save
        let paused = !self.control.is_training() && self.control.should_save();
        if self.control.should_save() && last_snapshot != Some(epoch) {
            self.snapshot(epoch)?;
        }

        self.state = if paused {
            HandlerState::Paused
        } else {
            HandlerState::Finished
        };
        self.finished = true;
        info!("finished training after {} epochs", epoch);

        Ok(TrainingReport {
            epochs: epoch,
            evaluations,
            snapshots: self.snapshots,
            checkpoint_failures: self.checkpoint_failures,
            best_minimum: self.minimum,
            learning_rate: self.learning_rate(),
            state: self.state,
            finished: self.finished,
        })
    }

    /// Greedy evaluation playouts, best-score capture and plateau detection.
    fn evaluate(&mut self, epoch: usize) -> Result<()> {
        let games = self.hp.debug_log_epochs;
        let avg_train_steps = self.stats.mean_tail(Series::Steps, games).unwrap_or(0.0);
        let agent = self.agent.as_mut().ok_or_else(not_bootstrapped)?;

        let mut total_steps = 0.0;
        let mut total_reward = 0.0;
        for _ in 0..games {
            let playout = self.runner.play_game(&mut self.env, agent, 0.0, &mut self.rng)?;
            total_steps += playout.steps as f32;
            total_reward += playout.reward;
        }
        let avg_game_steps = total_steps / games as f32;
        let avg_reward = total_reward / games as f32;

        if avg_game_steps < self.minimum {
            if let Err(err) = self.checkpoints.save_local_minimum(epoch, avg_game_steps, &agent.brain) {
                if !err.is_recoverable() {
                    return Err(err);
                }
                error!("could not capture minimum {}: {}", avg_game_steps, err);
                self.checkpoint_failures += 1;
            }
            self.minimum = avg_game_steps;
        }

        info!("avg. steps training = {}", avg_train_steps);
        info!("avg. reward = {}", avg_reward);
        info!(
            "episode: {}/{}, avg. steps last {} finishes = {}, epsilon = {}",
            epoch, self.hp.epochs, games, avg_game_steps, agent.epsilon
        );

        if let Some(status) = self.status.as_mut() {
            status.add_data_point(epoch, avg_game_steps, avg_train_steps);
            status.plot();
        }

        self.stats.collect(Series::BigSteps, avg_game_steps);
        if let Some(scheduler) = self.scheduler.as_mut() {
            if let Some(rate) = scheduler.observe(self.stats.series(Series::BigSteps)) {
                agent.update_learning_rate(rate);
                info!("plateau #{}: new learning rate = {}", scheduler.triggers(), rate);
            }
        }
        self.stats.clear_windows();
        Ok(())
    }

    /// Full checkpoint; write failures are logged and counted. Returns whether it was written.
    fn snapshot(&mut self, epoch: usize) -> Result<bool> {
        let agent = self.agent.as_ref().ok_or_else(not_bootstrapped)?;
        let saved = self
            .checkpoints
            .save_snapshot(epoch, &agent.brain, &self.stats, &self.hp, self.status.as_deref());
        match saved {
            Ok(_) => {
                self.snapshots += 1;
                Ok(true)
            }
            Err(err) => self.record_checkpoint_failure(err).map(|_| false),
        }
    }

    fn record_checkpoint_failure(&mut self, err: TrainError) -> Result<()> {
        if !err.is_recoverable() {
            return Err(err);
        }
        error!("{}", err);
        self.checkpoint_failures += 1;
        Ok(())
    }
}
