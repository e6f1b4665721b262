//! # Ricochet - Deep Q-Learning Trainer for Ricochet Robots
//!
//! Ricochet trains a value-based agent to solve ricochet-robot boards. It
//! combines an online/target network pair, a bounded experience-replay memory,
//! epsilon-greedy exploration, a random-play bootstrap, periodic greedy
//! evaluation with best-score capture, checkpoints and a plateau-triggered
//! learning-rate decay.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ricochet::brain::DqnBrain;
//! use ricochet::checkpoint::CheckpointWriter;
//! use ricochet::config::Hyperparameters;
//! use ricochet::env::{Environment, RicochetConfig, RicochetEnv};
//! use ricochet::metrics::StatsCollector;
//! use ricochet::trainer::TrainingHandler;
//! use ricochet::visualization::TextPlotStatus;
//!
//! let hp = Hyperparameters::load("config/hyperparameters.yaml").unwrap();
//! let env = RicochetEnv::new(RicochetConfig::default()).unwrap();
//! let mut rng = rand::thread_rng();
//! let brain = DqnBrain::new(env.state_size(), env.legal_action_count(), &hp.brain_config(), &mut rng).unwrap();
//!
//! let mut handler = TrainingHandler::new(
//!     env,
//!     brain,
//!     hp,
//!     CheckpointWriter::new("models", "ricochet", "1"),
//!     StatsCollector::new(),
//! )
//! .unwrap()
//! .with_status(Box::new(TextPlotStatus::default()));
//! handler.start_training().unwrap();
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Activation functions of the dense layers
//! - [`agent`] - DQN and random agents, the [`Policy`](agent::Policy) trait
//! - [`brain`] - Online/target network pair behind the agent
//! - [`checkpoint`] - Checkpoint layout and writer
//! - [`config`] - Hyperparameters
//! - [`env`] - Environment trait, episode runner and the ricochet board
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense layers
//! - [`metrics`] - Training statistics
//! - [`network`] - Feed-forward network
//! - [`optimizer`] - SGD, Adam and the plateau learning-rate scheduler
//! - [`replay_buffer`] - Experience replay memory
//! - [`trainer`] - The training session
//! - [`types`] - State and action aliases
//! - [`visualization`] - Status sinks and ASCII plots

pub mod activations;
pub mod agent;
pub mod brain;
pub mod checkpoint;
pub mod config;
pub mod env;
pub mod error;
pub mod layers;
pub mod metrics;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod trainer;
pub mod types;
pub mod visualization;

pub use error::{Result, TrainError};

#[cfg(test)]
mod tests;
