//! # Brain
//!
//! The online/target function-approximator pair behind the agent. The trainer only
//! talks to the [`Brain`] trait: it asks for value estimates, hands over supervised
//! targets, changes the learning rate and persists both networks at checkpoints.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::Rng;
use std::path::Path;

use crate::activations::Activation;
use crate::error::Result;
use crate::network::NeuralNetwork;
use crate::optimizer::{OptimizerKind, OptimizerWrapper};

/// Which half of the pair an operation addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    Online,
    Target,
}

/// A trainable state → per-action value estimator with a target twin.
pub trait Brain {
    /// Value estimates for a single encoded state.
    fn predict(&mut self, state: ArrayView1<f32>, use_target: bool) -> Array1<f32>;

    /// Value estimates for a batch of encoded states, one row per state.
    fn predict_batch(&mut self, states: ArrayView2<f32>, use_target: bool) -> Array2<f32>;

    /// One supervised update of the online network. Returns the training loss.
    fn fit(&mut self, states: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32>;

    /// Change the optimizer step size without touching learned weights.
    fn update_learning_rate(&mut self, rate: f32);

    fn learning_rate(&self) -> f32;

    /// Persist one of the two networks.
    fn save(&self, network: Network, path: &Path) -> Result<()>;

    /// Free-text model description written into checkpoint summaries.
    fn summary(&self) -> String;
}

/// Layer and optimizer settings for a [`DqnBrain`].
#[derive(Clone, Debug)]
pub struct BrainConfig {
    pub hidden_layers: Vec<usize>,
    pub optimizer: OptimizerKind,
    pub learning_rate: f32,
    /// Fits between two copies of the online weights into the target network
    pub target_update_interval: usize,
}

impl Default for BrainConfig {
    fn default() -> Self {
        BrainConfig {
            hidden_layers: vec![164, 150],
            optimizer: OptimizerKind::Adam,
            learning_rate: 0.001,
            target_update_interval: 100,
        }
    }
}

/// Two multi-layer perceptrons: the online network that is fitted and drives
/// action selection, and a target network that produces bootstrap values and is
/// refreshed from the online weights every `target_update_interval` fits.
pub struct DqnBrain {
    pub online: NeuralNetwork,
    pub target: NeuralNetwork,
    learning_rate: f32,
    target_update_interval: usize,
    fits: usize,
}

impl DqnBrain {
    /// Build a brain for `state_size` inputs and `action_count` outputs.
    pub fn new<R: Rng + ?Sized>(
        state_size: usize,
        action_count: usize,
        config: &BrainConfig,
        rng: &mut R,
    ) -> Result<Self> {
        let mut layer_sizes = Vec::with_capacity(config.hidden_layers.len() + 2);
        layer_sizes.push(state_size);
        layer_sizes.extend_from_slice(&config.hidden_layers);
        layer_sizes.push(action_count);

        // ReLU for hidden layers, Linear for output
        let mut activations = vec![Activation::Relu; layer_sizes.len() - 2];
        activations.push(Activation::Linear);

        let online = NeuralNetwork::new(
            &layer_sizes,
            &activations,
            OptimizerWrapper::from_kind(config.optimizer),
            rng,
        )?;
        let target = online.clone();

        Ok(DqnBrain {
            online,
            target,
            learning_rate: config.learning_rate,
            target_update_interval: config.target_update_interval.max(1),
            fits: 0,
        })
    }

    /// Copy the online weights into the target network.
    pub fn sync_target(&mut self) {
        self.target = self.online.clone();
    }

    /// Number of successful fit steps so far.
    pub fn fits(&self) -> usize {
        self.fits
    }

    fn network_mut(&mut self, use_target: bool) -> &mut NeuralNetwork {
        if use_target {
            &mut self.target
        } else {
            &mut self.online
        }
    }
}

impl Brain for DqnBrain {
    fn predict(&mut self, state: ArrayView1<f32>, use_target: bool) -> Array1<f32> {
        self.network_mut(use_target).forward(state)
    }

    fn predict_batch(&mut self, states: ArrayView2<f32>, use_target: bool) -> Array2<f32> {
        self.network_mut(use_target).forward_batch(states)
    }

    fn fit(&mut self, states: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32> {
        let loss = self.online.train_minibatch(states, targets, self.learning_rate)?;

        self.fits += 1;
        if self.fits % self.target_update_interval == 0 {
            self.sync_target();
        }
        Ok(loss)
    }

    fn update_learning_rate(&mut self, rate: f32) {
        self.learning_rate = rate;
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn save(&self, network: Network, path: &Path) -> Result<()> {
        match network {
            Network::Online => self.online.save(path),
            Network::Target => self.target.save(path),
        }
    }

    fn summary(&self) -> String {
        format!(
            "{}\nlearning rate: {}\ntarget update interval: {} fits",
            self.online.summary(),
            self.learning_rate,
            self.target_update_interval
        )
    }
}
