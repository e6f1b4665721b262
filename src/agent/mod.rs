//! # Agents
//!
//! - [`DqnAgent`]: epsilon-greedy deep Q-learning over a [`Brain`](crate::brain::Brain),
//!   with its own replay memory
//! - [`RandomAgent`]: uniform-random play used to pre-fill the replay memory
//!
//! Both implement [`Policy`], the interface the
//! [`EpisodeRunner`](crate::env::EpisodeRunner) drives.

pub mod traits;

mod dqn;
mod random;
pub use dqn::{DqnAgent, DqnAgentBuilder, EpsilonSchedule};
pub use random::RandomAgent;
pub use traits::{random_legal_action, Policy};
