use ndarray::{Array2, ArrayView1};
use rand::{rngs::SmallRng, Rng, SeedableRng};

use super::traits::{random_legal_action, Policy};
use crate::brain::Brain;
use crate::config::Hyperparameters;
use crate::error::{Result, TrainError};
use crate::replay_buffer::{ReplayMemory, Transition};
use crate::types::Action;

/// Linear epsilon decay, one step per successful replay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpsilonSchedule {
    pub start: f32,
    pub min: f32,
    pub decay: f32,
}

impl EpsilonSchedule {
    pub fn new(start: f32, min: f32, decay: f32) -> Self {
        EpsilonSchedule { start, min, decay }
    }

    /// Exploration rate after `replays` successful replays.
    pub fn after(&self, replays: usize) -> f32 {
        (self.start - replays as f32 * self.decay).max(self.min)
    }
}

/// Deep Q-learning agent: epsilon-greedy play over a [`Brain`] and experience replay
///
/// # Example
///
/// ```rust
/// use ricochet::agent::{DqnAgentBuilder, EpsilonSchedule};
/// use ricochet::brain::{BrainConfig, DqnBrain};
/// use ricochet::replay_buffer::ReplayMemory;
///
/// let mut rng = rand::thread_rng();
/// let brain = DqnBrain::new(4, 2, &BrainConfig::default(), &mut rng).unwrap();
/// let agent = DqnAgentBuilder::new()
///     .epsilon(EpsilonSchedule::new(1.0, 0.05, 0.001))
///     .gamma(0.95)
///     .batch_size(32)
///     .build(brain, ReplayMemory::new(1000))
///     .unwrap();
/// assert_eq!(agent.epsilon, 1.0);
/// ```
pub struct DqnAgent<B: Brain> {
    /// Online/target network pair
    pub brain: B,

    /// Current exploration rate
    pub epsilon: f32,

    schedule: EpsilonSchedule,
    memory: ReplayMemory,
    gamma: f32,
    batch_size: usize,

    /// Number of successful replays
    replays: usize,

    rng: SmallRng,
}

impl<B: Brain> DqnAgent<B> {
    pub fn memory(&self) -> &ReplayMemory {
        &self.memory
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn replays(&self) -> usize {
        self.replays
    }

    pub fn schedule(&self) -> EpsilonSchedule {
        self.schedule
    }

    /// Epsilon-greedy choice among `legal` actions.
    pub fn select_action(&mut self, state: ArrayView1<f32>, legal: &[Action]) -> Result<Action> {
        if legal.is_empty() {
            return Err(TrainError::NoLegalActions);
        }

        if self.rng.gen::<f32>() < self.epsilon {
            // Exploration: random legal action
            random_legal_action(legal, &mut self.rng)
        } else {
            // Exploitation: best legal action of the online network
            self.greedy_action(state, legal)
        }
    }

    /// Legal action with the highest online estimate; the first one wins ties.
    pub fn greedy_action(&mut self, state: ArrayView1<f32>, legal: &[Action]) -> Result<Action> {
        let q_values = self.brain.predict(state, false);

        let mut best: Option<(Action, f32)> = None;
        for &action in legal {
            let value = *q_values.get(action).ok_or_else(|| {
                TrainError::invalid_action(action, format!("network scores {} actions", q_values.len()))
            })?;
            let better = match best {
                None => true,
                Some((_, best_value)) => value > best_value,
            };
            if better {
                best = Some((action, value));
            }
        }

        best.map(|(action, _)| action).ok_or(TrainError::NoLegalActions)
    }

    /// Store one transition. Training happens in [`replay`](DqnAgent::replay).
    pub fn observe(&mut self, transition: Transition) {
        self.memory.insert(transition);
    }

    /// Fit the online network on a random batch of stored transitions.
    ///
    /// Only the taken action's entry of each target row differs from the online
    /// prediction; it becomes `reward` for terminal transitions and
    /// `reward + gamma * max_a Q_target(next_state, a)` otherwise.
    pub fn replay(&mut self, batch_size: usize) -> Result<f32> {
        if batch_size == 0 {
            return Err(TrainError::configuration("BATCH_SIZE", "must be greater than zero"));
        }
        let batch = self.memory.sample(batch_size, &mut self.rng)?;

        let state_size = batch[0].state.len();
        let mut states = Array2::zeros((batch_size, state_size));
        let mut next_states = Array2::zeros((batch_size, state_size));
        for (i, transition) in batch.iter().enumerate() {
            if transition.state.len() != state_size || transition.next_state.len() != state_size {
                return Err(TrainError::dimension_mismatch(
                    format!("state of length {}", state_size),
                    format!("state of length {}", transition.state.len()),
                ));
            }
            states.row_mut(i).assign(&transition.state);
            next_states.row_mut(i).assign(&transition.next_state);
        }

        let mut targets = self.brain.predict_batch(states.view(), false);
        let next_values = self.brain.predict_batch(next_states.view(), true);

        for (i, transition) in batch.iter().enumerate() {
            if transition.action >= targets.ncols() {
                return Err(TrainError::invalid_action(
                    transition.action,
                    format!("network scores {} actions", targets.ncols()),
                ));
            }
            let target = if transition.done {
                transition.reward
            } else {
                let max_next = next_values
                    .row(i)
                    .iter()
                    .fold(f32::NEG_INFINITY, |max, &val| max.max(val));
                transition.reward + self.gamma * max_next
            };
            targets[[i, transition.action]] = target;
        }

        let loss = self.brain.fit(states.view(), targets.view())?;

        self.replays += 1;
        self.epsilon = self.schedule.after(self.replays);
        Ok(loss)
    }

    /// Forward a new step size to the brain.
    pub fn update_learning_rate(&mut self, rate: f32) {
        self.brain.update_learning_rate(rate);
    }
}

impl<B: Brain> Policy for DqnAgent<B> {
    fn select_action(&mut self, state: ArrayView1<f32>, legal: &[Action]) -> Result<Action> {
        DqnAgent::select_action(self, state, legal)
    }

    fn greedy_action(&mut self, state: ArrayView1<f32>, legal: &[Action]) -> Result<Action> {
        DqnAgent::greedy_action(self, state, legal)
    }

    fn observe(&mut self, transition: Transition) {
        DqnAgent::observe(self, transition)
    }

    fn learn(&mut self) -> Result<Option<f32>> {
        if self.memory.len() < self.batch_size {
            return Ok(None);
        }
        self.replay(self.batch_size).map(Some)
    }

    fn exploration_rate(&self) -> Option<f32> {
        Some(self.epsilon)
    }
}

/// Builder pattern for DqnAgent
pub struct DqnAgentBuilder {
    schedule: EpsilonSchedule,
    gamma: f32,
    batch_size: usize,
    memory_capacity: Option<usize>,
    seed: Option<u64>,
}

impl DqnAgentBuilder {
    pub fn new() -> Self {
        DqnAgentBuilder {
            schedule: EpsilonSchedule::new(1.0, 0.01, 0.0001),
            gamma: 0.95,
            batch_size: 32,
            memory_capacity: None,
            seed: None,
        }
    }

    /// Exploration, discount, batch and memory settings of a session.
    pub fn from_hyperparameters(hp: &Hyperparameters) -> Self {
        let builder = DqnAgentBuilder::new()
            .epsilon(EpsilonSchedule::new(hp.epsilon_start, hp.epsilon_min, hp.epsilon_decay))
            .gamma(hp.gamma)
            .batch_size(hp.batch_size)
            .memory_capacity(hp.memory_capacity);
        match hp.seed {
            Some(seed) => builder.seed(seed),
            None => builder,
        }
    }

    pub fn epsilon(mut self, schedule: EpsilonSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Capacity the handed-over memory is re-homed into.
    pub fn memory_capacity(mut self, capacity: usize) -> Self {
        self.memory_capacity = Some(capacity);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the agent around `brain`, taking ownership of `memory`.
    pub fn build<B: Brain>(self, brain: B, memory: ReplayMemory) -> Result<DqnAgent<B>> {
        if self.batch_size == 0 {
            return Err(TrainError::configuration("BATCH_SIZE", "must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.schedule.start) || self.schedule.min > self.schedule.start {
            return Err(TrainError::configuration(
                "EPSILON_START",
                "needs 0 <= EPSILON_MIN <= EPSILON_START <= 1",
            ));
        }

        let memory = match self.memory_capacity {
            Some(capacity) if capacity != memory.capacity() => memory.with_capacity(capacity),
            _ => memory,
        };
        let rng = match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        Ok(DqnAgent {
            brain,
            epsilon: self.schedule.start,
            schedule: self.schedule,
            memory,
            gamma: self.gamma,
            batch_size: self.batch_size,
            replays: 0,
            rng,
        })
    }
}

impl Default for DqnAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
