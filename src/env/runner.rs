use log::trace;
use rand::Rng;

use super::Environment;
use crate::agent::{random_legal_action, Policy};
use crate::config::Hyperparameters;
use crate::error::Result;
use crate::replay_buffer::Transition;
use crate::types::Action;

/// Steps and accumulated reward of one training episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeOutcome {
    pub steps: usize,
    pub reward: f32,
}

/// Result of a learning-free playout.
#[derive(Debug, Clone, PartialEq)]
pub struct Playout {
    pub steps: usize,
    pub reward: f32,
    pub actions: Vec<Action>,
    /// Whether the playout reached a terminal state within the step limit
    pub solved: bool,
}

/// Plays full episodes of an environment with a policy.
#[derive(Debug, Clone)]
pub struct EpisodeRunner {
    max_steps: usize,
    train_interval: usize,
}

impl EpisodeRunner {
    pub fn new(max_steps: usize, train_interval: usize) -> Self {
        EpisodeRunner {
            max_steps,
            train_interval: train_interval.max(1),
        }
    }

    pub fn from_hyperparameters(hp: &Hyperparameters) -> Self {
        Self::new(hp.max_steps, hp.train_interval)
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Play one episode with learning enabled.
    ///
    /// Every transition goes to the policy; every `train_interval` steps the
    /// policy gets a chance to learn. The episode ends on a terminal state or
    /// after `max_steps` actions.
    pub fn run<E, P>(&self, env: &mut E, policy: &mut P) -> Result<EpisodeOutcome>
    where
        E: Environment + ?Sized,
        P: Policy + ?Sized,
    {
        let mut state = env.reset()?;
        let mut outcome = EpisodeOutcome { steps: 0, reward: 0.0 };

        while outcome.steps < self.max_steps {
            let legal = env.legal_actions();
            let action = policy.select_action(state.view(), &legal)?;
            let (next_state, reward, done) = env.step(action)?;

            outcome.steps += 1;
            outcome.reward += reward;
            policy.observe(Transition {
                state,
                action,
                reward,
                next_state: next_state.clone(),
                done,
            });

            if outcome.steps % self.train_interval == 0 {
                if let Some(loss) = policy.learn()? {
                    trace!("step {}: loss {:.5}", outcome.steps, loss);
                }
            }

            state = next_state;
            if done {
                break;
            }
        }

        Ok(outcome)
    }

    /// Play one episode without learning.
    ///
    /// Each move is uniformly random among the legal actions with probability
    /// `randomness`, otherwise the policy's greedy choice.
    pub fn play_game<E, P, R>(
        &self,
        env: &mut E,
        policy: &mut P,
        randomness: f32,
        rng: &mut R,
    ) -> Result<Playout>
    where
        E: Environment + ?Sized,
        P: Policy + ?Sized,
        R: Rng + ?Sized,
    {
        let mut state = env.reset()?;
        let mut playout = Playout {
            steps: 0,
            reward: 0.0,
            actions: Vec::new(),
            solved: false,
        };

        while playout.steps < self.max_steps {
            let legal = env.legal_actions();
            let action = if randomness > 0.0 && rng.gen::<f32>() < randomness {
                random_legal_action(&legal, rng)?
            } else {
                policy.greedy_action(state.view(), &legal)?
            };
            let (next_state, reward, done) = env.step(action)?;

            playout.steps += 1;
            playout.reward += reward;
            playout.actions.push(action);
            state = next_state;

            if done {
                playout.solved = true;
                break;
            }
        }

        Ok(playout)
    }
}
