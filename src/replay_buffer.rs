use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::{Result, TrainError};
use crate::types::{Action, State};

/// One step of experience: `(state, action, reward, next_state, done)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: State,
    pub action: Action,
    pub reward: f32,
    pub next_state: State,
    pub done: bool,
}

/// Bounded experience-replay memory with FIFO eviction.
#[derive(Clone, Debug)]
pub struct ReplayMemory {
    buffer: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayMemory {
    pub fn new(capacity: usize) -> Self {
        ReplayMemory {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a transition, evicting the oldest one when the memory is full.
    pub fn insert(&mut self, transition: Transition) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    /// Draw `batch_size` distinct transitions uniformly at random.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<Vec<&Transition>> {
        if batch_size > self.buffer.len() {
            return Err(TrainError::InsufficientSamples {
                requested: batch_size,
                available: self.buffer.len(),
            });
        }
        let indices = rand::seq::index::sample(rng, self.buffer.len(), batch_size);
        Ok(indices.into_iter().map(|i| &self.buffer[i]).collect())
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored transitions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    /// Move the contents into a memory of another capacity.
    ///
    /// When shrinking, only the most recent `capacity` transitions survive.
    pub fn with_capacity(self, capacity: usize) -> Self {
        let mut resized = ReplayMemory::new(capacity);
        for transition in self.buffer {
            resized.insert(transition);
        }
        resized
    }
}
