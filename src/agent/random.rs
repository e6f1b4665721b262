use ndarray::ArrayView1;
use rand::rngs::SmallRng;

use super::traits::{random_legal_action, Policy};
use crate::error::Result;
use crate::replay_buffer::{ReplayMemory, Transition};
use crate::types::Action;

/// Agent that only ever plays uniformly random legal actions.
///
/// It exists to fill a replay memory before the first gradient update; once its
/// memory is full the contents are taken over with
/// [`into_memory`](RandomAgent::into_memory), which consumes the agent.
pub struct RandomAgent {
    memory: ReplayMemory,
    rng: SmallRng,
}

impl RandomAgent {
    pub fn new(capacity: usize, rng: SmallRng) -> Self {
        RandomAgent {
            memory: ReplayMemory::new(capacity),
            rng,
        }
    }

    pub fn memory(&self) -> &ReplayMemory {
        &self.memory
    }

    pub fn into_memory(self) -> ReplayMemory {
        self.memory
    }
}

impl Policy for RandomAgent {
    fn select_action(&mut self, _state: ArrayView1<f32>, legal: &[Action]) -> Result<Action> {
        random_legal_action(legal, &mut self.rng)
    }

    fn greedy_action(&mut self, _state: ArrayView1<f32>, legal: &[Action]) -> Result<Action> {
        random_legal_action(legal, &mut self.rng)
    }

    fn observe(&mut self, transition: Transition) {
        self.memory.insert(transition);
    }

    fn learn(&mut self) -> Result<Option<f32>> {
        Ok(None)
    }

    fn exploration_rate(&self) -> Option<f32> {
        Some(1.0)
    }
}
