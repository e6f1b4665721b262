//! Hyperparameters of a training session.
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::BufReader,
    path::Path,
};

use crate::brain::BrainConfig;
use crate::error::{Result, TrainError};
use crate::optimizer::{OptimizerKind, PlateauScheduler};

/// Plateau-triggered learning-rate decay settings.
///
/// Present only when the session should adapt its learning rate.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct EarlyStopConfig {
    /// Base rate the decay divides.
    pub learning_rate_max: f32,

    /// Floor of the decayed rate.
    pub learning_rate_min: f32,

    /// Window size, in evaluations, of the plateau check.
    pub learning_rate_early_stop: usize,
}

/// Configuration of a training session.
///
/// Keys in YAML/JSON files use the upper-case names (`EPOCHS`, `DEBUG_LOG_EPOCHS`, ...).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Hyperparameters {
    /// Number of training episodes.
    pub epochs: usize,

    /// Step limit of one episode or playout.
    pub max_steps: usize,

    /// Initial exploration rate.
    pub epsilon_start: f32,

    /// Lower bound of the exploration rate.
    pub epsilon_min: f32,

    /// Linear decrease of the exploration rate per replay.
    pub epsilon_decay: f32,

    /// Discount factor of the bootstrap target.
    #[serde(default = "default_gamma")]
    pub gamma: f32,

    /// Initial optimizer step size.
    pub learning_rate: f32,

    /// Replay batch size, also the capacity of the bootstrap memory.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Capacity of the agent's replay memory.
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,

    /// Environment steps between two replays.
    #[serde(default = "default_one")]
    pub train_interval: usize,

    /// Evaluation cadence in epochs, also the number of evaluation playouts.
    pub debug_log_epochs: usize,

    /// Checkpoint cadence in epochs.
    pub debug_snapshot: usize,

    /// Initial best evaluation score; only averages below it are captured.
    pub minimum_capture_thresh: f32,

    /// Hidden layer widths of both networks.
    #[serde(default = "default_hidden_layers")]
    pub hidden_layers: Vec<usize>,

    #[serde(default)]
    pub optimizer: OptimizerKind,

    /// Fits between two target network refreshes.
    #[serde(default = "default_target_update_interval")]
    pub target_update_interval: usize,

    /// Upper bound of the randomness swept by the playout search.
    #[serde(default = "default_playout_max_randomness")]
    pub playout_max_randomness: f32,

    /// Increment of the randomness swept by the playout search.
    #[serde(default = "default_playout_randomness_step")]
    pub playout_randomness_step: f32,

    /// Seed of every random number generator of the session.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub early_stop: Option<EarlyStopConfig>,
}

fn default_gamma() -> f32 {
    0.95
}

fn default_batch_size() -> usize {
    32
}

fn default_memory_capacity() -> usize {
    2000
}

fn default_one() -> usize {
    1
}

fn default_hidden_layers() -> Vec<usize> {
    vec![164, 150]
}

fn default_target_update_interval() -> usize {
    100
}

fn default_playout_max_randomness() -> f32 {
    0.02
}

fn default_playout_randomness_step() -> f32 {
    0.002
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            epochs: 10_000,
            max_steps: 100,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.0001,
            gamma: default_gamma(),
            learning_rate: 0.001,
            batch_size: default_batch_size(),
            memory_capacity: default_memory_capacity(),
            train_interval: default_one(),
            debug_log_epochs: 100,
            debug_snapshot: 1000,
            minimum_capture_thresh: 50.0,
            hidden_layers: default_hidden_layers(),
            optimizer: OptimizerKind::default(),
            target_update_interval: default_target_update_interval(),
            playout_max_randomness: default_playout_max_randomness(),
            playout_randomness_step: default_playout_randomness_step(),
            seed: None,
            early_stop: None,
        }
    }
}

impl Hyperparameters {
    /// Sets the number of epochs.
    pub fn epochs(mut self, v: usize) -> Self {
        self.epochs = v;
        self
    }

    /// Sets the episode step limit.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    /// Sets the evaluation cadence.
    pub fn debug_log_epochs(mut self, v: usize) -> Self {
        self.debug_log_epochs = v;
        self
    }

    /// Sets the checkpoint cadence.
    pub fn debug_snapshot(mut self, v: usize) -> Self {
        self.debug_snapshot = v;
        self
    }

    /// Sets batch size and memory capacity.
    pub fn memory(mut self, batch_size: usize, capacity: usize) -> Self {
        self.batch_size = batch_size;
        self.memory_capacity = capacity;
        self
    }

    /// Sets the hidden layer widths.
    pub fn hidden_layers(mut self, layers: &[usize]) -> Self {
        self.hidden_layers = layers.to_vec();
        self
    }

    /// Enables the plateau learning-rate decay.
    pub fn early_stop(mut self, config: EarlyStopConfig) -> Self {
        self.early_stop = Some(config);
        self
    }

    /// Sets the seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parses hyperparameters from a YAML document and validates them.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let hp: Self = serde_yaml::from_str(yaml)
            .map_err(|err| TrainError::configuration("hyperparameters", err.to_string()))?;
        hp.validate()?;
        Ok(hp)
    }

    /// Constructs [`Hyperparameters`] from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let hp: Self = serde_yaml::from_reader(rdr)
            .map_err(|err| TrainError::configuration("hyperparameters", err.to_string()))?;
        hp.validate()?;
        Ok(hp)
    }

    /// Writes the JSON dump stored next to checkpoints.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Rejects values the training loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("EPOCHS", self.epochs),
            ("MAX_STEPS", self.max_steps),
            ("BATCH_SIZE", self.batch_size),
            ("TRAIN_INTERVAL", self.train_interval),
            ("DEBUG_LOG_EPOCHS", self.debug_log_epochs),
            ("DEBUG_SNAPSHOT", self.debug_snapshot),
            ("TARGET_UPDATE_INTERVAL", self.target_update_interval),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(TrainError::configuration(field, "must be greater than zero"));
            }
        }

        if self.memory_capacity < self.batch_size {
            return Err(TrainError::configuration(
                "MEMORY_CAPACITY",
                format!("must hold at least BATCH_SIZE ({}) transitions", self.batch_size),
            ));
        }
        for (field, value) in [
            ("EPSILON_START", self.epsilon_start),
            ("EPSILON_MIN", self.epsilon_min),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TrainError::configuration(field, "must lie in [0, 1]"));
            }
        }
        if self.epsilon_min > self.epsilon_start {
            return Err(TrainError::configuration("EPSILON_MIN", "must not exceed EPSILON_START"));
        }
        if self.epsilon_decay < 0.0 {
            return Err(TrainError::configuration("EPSILON_DECAY", "must not be negative"));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(TrainError::configuration("GAMMA", "must lie in [0, 1]"));
        }
        if self.learning_rate <= 0.0 {
            return Err(TrainError::configuration("LEARNING_RATE", "must be positive"));
        }
        if self.playout_randomness_step <= 0.0 || self.playout_max_randomness < 0.0 {
            return Err(TrainError::configuration(
                "PLAYOUT_RANDOMNESS_STEP",
                "the playout sweep needs a positive step and a non-negative bound",
            ));
        }
        if self.playout_max_randomness > 1.0 {
            return Err(TrainError::configuration("PLAYOUT_MAX_RANDOMNESS", "must not exceed 1"));
        }

        if let Some(early_stop) = &self.early_stop {
            if early_stop.learning_rate_early_stop == 0 {
                return Err(TrainError::configuration("LEARNING_RATE_EARLY_STOP", "must be greater than zero"));
            }
            if early_stop.learning_rate_min > early_stop.learning_rate_max {
                return Err(TrainError::configuration(
                    "LEARNING_RATE_MIN",
                    "must not exceed LEARNING_RATE_MAX",
                ));
            }
        }
        Ok(())
    }

    /// Network settings for the brain.
    pub fn brain_config(&self) -> BrainConfig {
        BrainConfig {
            hidden_layers: self.hidden_layers.clone(),
            optimizer: self.optimizer,
            learning_rate: self.learning_rate,
            target_update_interval: self.target_update_interval,
        }
    }

    /// The plateau scheduler, when early stopping is configured.
    pub fn plateau_scheduler(&self) -> Option<PlateauScheduler> {
        self.early_stop.as_ref().map(|es| {
            PlateauScheduler::new(es.learning_rate_max, es.learning_rate_min, es.learning_rate_early_stop)
        })
    }
}
