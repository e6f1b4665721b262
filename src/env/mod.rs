//! # Environments
//!
//! [`Environment`] is the game-side contract the trainer consumes: encoded
//! states, a fixed action space with a per-state legal subset, and step/reset
//! semantics. [`EpisodeRunner`] drives full episodes of an environment with a
//! [`Policy`](crate::agent::Policy), either learning (`run`) or as a
//! learning-free playout (`play_game`). [`RicochetEnv`] is the ricochet-robot
//! board the binary trains on.

pub mod ricochet;
pub mod runner;

pub use ricochet::{BoardStyle, RicochetConfig, RicochetEnv};
pub use runner::{EpisodeOutcome, EpisodeRunner, Playout};

use crate::error::Result;
use crate::types::{Action, State};

/// A single-agent, episodic game with a discrete action space.
pub trait Environment {
    /// Start a new episode and return its initial state.
    ///
    /// Fails when no playable starting position can be set up.
    fn reset(&mut self) -> Result<State>;

    /// Apply `action`, returning `(next_state, reward, done)`.
    ///
    /// Fails with [`TrainError::InvalidAction`](crate::error::TrainError::InvalidAction)
    /// when `action` is not in [`legal_actions`](Environment::legal_actions).
    fn step(&mut self, action: Action) -> Result<(State, f32, bool)>;

    /// Size of the action space, i.e. the number of network outputs.
    fn legal_action_count(&self) -> usize;

    /// Actions playable in the current state, ascending.
    fn legal_actions(&self) -> Vec<Action> {
        (0..self.legal_action_count()).collect()
    }

    /// Length of the encoded state vector.
    fn state_size(&self) -> usize;

    /// Human readable action name for logs.
    fn describe_action(&self, action: Action) -> String {
        format!("a{}", action)
    }
}
