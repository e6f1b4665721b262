use ndarray::ArrayView1;
use rand::Rng;

use crate::error::{Result, TrainError};
use crate::replay_buffer::Transition;
use crate::types::Action;

/// What the episode runner needs from anything that plays the game
pub trait Policy {
    /// Pick the action to play while training (may explore).
    fn select_action(&mut self, state: ArrayView1<f32>, legal: &[Action]) -> Result<Action>;

    /// Pick the action to play during evaluation playouts.
    fn greedy_action(&mut self, state: ArrayView1<f32>, legal: &[Action]) -> Result<Action>;

    /// Hand over one step of experience.
    fn observe(&mut self, transition: Transition);

    /// Give the policy the opportunity to train.
    ///
    /// Returns the training loss when an update took place.
    fn learn(&mut self) -> Result<Option<f32>>;

    /// Current exploration rate (if applicable)
    fn exploration_rate(&self) -> Option<f32> {
        None
    }
}

/// A uniformly random element of `legal`.
pub fn random_legal_action<R: Rng + ?Sized>(legal: &[Action], rng: &mut R) -> Result<Action> {
    if legal.is_empty() {
        return Err(TrainError::NoLegalActions);
    }
    Ok(legal[rng.gen_range(0..legal.len())])
}
