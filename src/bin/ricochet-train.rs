use clap::Parser;
use log::info;
use rand::{rngs::SmallRng, SeedableRng};
use std::path::PathBuf;

use ricochet::{
    brain::DqnBrain,
    checkpoint::CheckpointWriter,
    config::Hyperparameters,
    env::{BoardStyle, Environment, RicochetConfig, RicochetEnv},
    metrics::StatsCollector,
    trainer::TrainingHandler,
    visualization::TextPlotStatus,
};

/// Train a deep Q-learning agent on ricochet-robot boards
#[derive(Parser, Debug)]
#[command(name = "ricochet-train")]
#[command(about = "Train a DQN agent on ricochet-robot boards", long_about = None)]
struct Cli {
    /// Hyperparameter file (YAML); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run name, first level below the models directory
    #[arg(long, default_value = "ricochet")]
    name: String,

    /// Run version, second level below the models directory
    #[arg(long, default_value = "1")]
    version: String,

    /// Root directory of all checkpoints
    #[arg(long, default_value = "models")]
    models_dir: PathBuf,

    /// Overrides EPOCHS of the hyperparameter file
    #[arg(long)]
    epochs: Option<usize>,

    /// Overrides SEED of the hyperparameter file
    #[arg(long)]
    seed: Option<u64>,

    /// Board edge length
    #[arg(long, default_value_t = 5)]
    grid_size: usize,

    /// Number of robots
    #[arg(long, default_value_t = 2)]
    robots: usize,

    /// Number of inner wall segments
    #[arg(long, default_value_t = 4)]
    walls: usize,

    /// Draw a new board on every episode instead of a fixed one
    #[arg(long)]
    random_boards: bool,
}

fn main() -> ricochet::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut hp = match &cli.config {
        Some(path) => Hyperparameters::load(path)?,
        None => Hyperparameters::default(),
    };
    if let Some(epochs) = cli.epochs {
        hp = hp.epochs(epochs);
    }
    if let Some(seed) = cli.seed {
        hp = hp.seed(seed);
    }
    hp.validate()?;

    let env = RicochetEnv::new(RicochetConfig {
        grid_size: cli.grid_size,
        robots: cli.robots,
        walls: cli.walls,
        style: if cli.random_boards { BoardStyle::Random } else { BoardStyle::Fixed },
        seed: hp.seed,
        ..RicochetConfig::default()
    })?;

    let mut rng = match hp.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let brain = DqnBrain::new(env.state_size(), env.legal_action_count(), &hp.brain_config(), &mut rng)?;

    let max_randomness = hp.playout_max_randomness;
    let checkpoints = CheckpointWriter::new(&cli.models_dir, cli.name.as_str(), cli.version.as_str());
    let mut handler = TrainingHandler::new(env, brain, hp, checkpoints, StatsCollector::new())?
        .with_status(Box::new(TextPlotStatus::default()));

    let report = handler.start_training()?;
    info!("{:?}", report);

    let playout = handler.play_game(max_randomness)?;
    info!(
        "best playout: {} steps, reward {}, solved: {}",
        playout.steps, playout.reward, playout.solved
    );
    Ok(())
}
