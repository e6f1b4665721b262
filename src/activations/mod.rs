//! # Activation Functions
//!
//! Non-linearities applied by the dense layers of the Q-network. Hidden layers of the
//! brain default to ReLU, the output layer is always linear so Q-value estimates are
//! unbounded.

pub mod functions;

pub use functions::Activation;
