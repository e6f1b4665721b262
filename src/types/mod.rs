//! Shared aliases for what flows between the environment, the agent and the memory.

use ndarray::Array1;

/// Encoded board as fed to the Q-network
pub type State = Array1<f32>;

/// Index into the environment's action space
pub type Action = usize;
