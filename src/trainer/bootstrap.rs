use log::{debug, info};
use rand::rngs::SmallRng;

use crate::agent::RandomAgent;
use crate::env::{Environment, EpisodeRunner};
use crate::error::{Result, TrainError};
use crate::replay_buffer::ReplayMemory;

/// Fill a replay memory of `capacity` transitions with uniform-random play.
///
/// Episodes run until the memory is full; the random agent is consumed and its
/// memory returned, ready to be handed to the learning agent.
pub fn bootstrap<E>(env: &mut E, runner: &EpisodeRunner, capacity: usize, rng: SmallRng) -> Result<ReplayMemory>
where
    E: Environment + ?Sized,
{
    info!("filling replay memory with {} random transitions", capacity);
    let mut agent = RandomAgent::new(capacity, rng);
    let mut episodes = 0;

    while !agent.memory().is_full() {
        let outcome = runner.run(env, &mut agent)?;
        if outcome.steps == 0 {
            return Err(TrainError::Training(
                "random episode produced no transition, memory cannot fill".to_string(),
            ));
        }
        episodes += 1;
    }

    debug!("bootstrap finished after {} episodes", episodes);
    Ok(agent.into_memory())
}
