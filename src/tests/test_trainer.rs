use ndarray::array;
use rand::{rngs::SmallRng, SeedableRng};
use std::fs;
use std::path::Path;

use super::fixtures::{Corridor, MockBrain};
use crate::checkpoint::CheckpointWriter;
use crate::config::{EarlyStopConfig, Hyperparameters};
use crate::env::{EpisodeRunner, Playout};
use crate::error::{Result, TrainError};
use crate::metrics::{Series, StatsCollector};
use crate::trainer::{bootstrap, randomness_sweep, select_shortest, HandlerState, TrainingControl, TrainingHandler};
use crate::visualization::StatusSink;

fn playout(actions: usize, solved: bool) -> Playout {
    Playout {
        steps: actions,
        reward: -(actions as f32),
        actions: vec![0; actions],
        solved,
    }
}

#[test]
fn test_select_shortest_playout() {
    let best = select_shortest(vec![playout(12, true), playout(9, true), playout(15, true)]).unwrap();
    assert_eq!(best.actions.len(), 9);
}

#[test]
fn test_solved_playout_beats_shorter_unsolved() {
    let best = select_shortest(vec![playout(4, false), playout(11, true)]).unwrap();
    assert!(best.solved);
    assert_eq!(best.actions.len(), 11);

    let fallback = select_shortest(vec![playout(20, false), playout(20, false)]).unwrap();
    assert!(!fallback.solved);
    assert!(select_shortest(Vec::new()).is_none());
}

#[test]
fn test_randomness_sweep() {
    let levels = randomness_sweep(0.02, 0.002);
    assert_eq!(levels.len(), 11);
    assert_eq!(levels[0], 0.0);
    assert!((levels[10] - 0.02).abs() < 1e-6);
    assert_eq!(randomness_sweep(0.0, 0.002), vec![0.0]);
}

#[test]
fn test_control_flags() {
    let control = TrainingControl::new();
    assert!(!control.is_training());
    assert!(control.should_save());

    let shared = control.clone();
    control.start();
    assert!(shared.is_training());

    shared.stop();
    assert!(!control.is_training());
    assert!(!control.should_save());

    control.start();
    shared.pause();
    assert!(!control.is_training());
    assert!(control.should_save());
}

#[test]
fn test_bootstrap_fills_memory() {
    let mut env = Corridor::new(4);
    let runner = EpisodeRunner::new(10, 1);
    let memory = bootstrap(&mut env, &runner, 7, SmallRng::seed_from_u64(2)).unwrap();

    assert_eq!(memory.capacity(), 7);
    assert!(memory.is_full());
}

fn hp(epochs: usize, debug_log_epochs: usize, debug_snapshot: usize) -> Hyperparameters {
    Hyperparameters::default()
        .epochs(epochs)
        .max_steps(20)
        .debug_log_epochs(debug_log_epochs)
        .debug_snapshot(debug_snapshot)
        .memory(4, 100)
        .seed(21)
}

/// Greedy choice of this brain always walks right.
fn right_walker() -> MockBrain {
    MockBrain::new(array![1.0, 0.0], array![1.0, 0.0])
}

fn handler(root: &Path, hp: Hyperparameters) -> TrainingHandler<Corridor, MockBrain> {
    TrainingHandler::new(
        Corridor::new(4),
        right_walker(),
        hp,
        CheckpointWriter::new(root, "corridor", "1"),
        StatsCollector::new(),
    )
    .unwrap()
}

#[test]
fn test_single_evaluation_and_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let mut handler = handler(dir.path(), hp(5, 5, 5));
    assert_eq!(handler.state(), HandlerState::Idle);

    let report = handler.start_training().unwrap();

    assert_eq!(report.epochs, 5);
    assert_eq!(report.evaluations, 1);
    assert_eq!(report.snapshots, 1);
    assert_eq!(report.checkpoint_failures, 0);
    assert!(report.finished);
    assert_eq!(report.state, HandlerState::Finished);
    assert!(handler.is_finished());

    assert_eq!(handler.stats().series(Series::BigSteps), &[3.0]);
    assert!(handler.stats().series(Series::Steps).is_empty());
    assert_eq!(report.best_minimum, 3.0);
    let version_dir = dir.path().join("corridor").join("1");
    assert!(version_dir.join("online.bin").exists());
    assert!(version_dir.join("local min").join("online_3.bin").exists());
}

#[test]
fn test_final_snapshot_after_last_epoch() {
    let dir = tempfile::tempdir().unwrap();
    let mut handler = handler(dir.path(), hp(7, 5, 5));

    let report = handler.start_training().unwrap();
    assert_eq!(report.epochs, 7);
    assert_eq!(report.snapshots, 2);
}

#[test]
fn test_minimum_threshold_not_beaten() {
    let dir = tempfile::tempdir().unwrap();
    let mut hp = hp(4, 2, 100);
    hp.minimum_capture_thresh = 2.0;
    let mut handler = handler(dir.path(), hp);

    let report = handler.start_training().unwrap();
    assert_eq!(report.best_minimum, 2.0);
    assert_eq!(fs::read_dir(dir.path().join("corridor/1/local min")).unwrap().count(), 0);
}

struct Interrupt {
    control: TrainingControl,
    pause: bool,
}

impl StatusSink for Interrupt {
    fn add_data_point(&mut self, _epoch: usize, _avg_eval_steps: f32, _avg_train_steps: f32) {
        if self.pause {
            self.control.pause();
        } else {
            self.control.stop();
        }
    }

    fn plot(&mut self) {}

    fn save_plot_to_disk(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

fn interrupted(root: &Path, pause: bool) -> TrainingHandler<Corridor, MockBrain> {
    interrupted_after(root, 20, pause)
}

fn interrupted_after(root: &Path, epochs: usize, pause: bool) -> TrainingHandler<Corridor, MockBrain> {
    let handler = handler(root, hp(epochs, 2, 100));
    let control = handler.control();
    handler.with_status(Box::new(Interrupt { control, pause }))
}

#[test]
fn test_stop_skips_final_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let mut handler = interrupted(dir.path(), false);

    let report = handler.start_training().unwrap();
    assert_eq!(report.epochs, 2);
    assert_eq!(report.snapshots, 0);
    assert_eq!(report.state, HandlerState::Finished);
    assert!(report.finished);
}

#[test]
fn test_pause_keeps_final_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let mut handler = interrupted(dir.path(), true);

    let report = handler.start_training().unwrap();
    assert_eq!(report.epochs, 2);
    assert_eq!(report.snapshots, 1);
    assert_eq!(report.state, HandlerState::Paused);
    assert!(dir.path().join("corridor/1/online.bin").exists());
}

#[test]
fn test_pause_on_last_epoch() {
    let dir = tempfile::tempdir().unwrap();
    let mut handler = interrupted_after(dir.path(), 2, true);

    let report = handler.start_training().unwrap();
    assert_eq!(report.epochs, 2);
    assert_eq!(report.snapshots, 1);
    assert_eq!(report.state, HandlerState::Paused);
    assert_eq!(handler.state(), HandlerState::Paused);
}

#[test]
fn test_failed_last_snapshot_is_retried() {
    let dir = tempfile::tempdir().unwrap();
    let mut hp = hp(5, 5, 5);
    hp.minimum_capture_thresh = 2.0;
    let brain = right_walker();
    brain.failing_saves.set(1);
    let mut handler = TrainingHandler::new(
        Corridor::new(4),
        brain,
        hp,
        CheckpointWriter::new(dir.path(), "corridor", "1"),
        StatsCollector::new(),
    )
    .unwrap();

    let report = handler.start_training().unwrap();
    assert_eq!(report.checkpoint_failures, 1);
    assert_eq!(report.snapshots, 1);
    assert_eq!(report.state, HandlerState::Finished);
    assert!(dir.path().join("corridor/1/online.bin").exists());
}

#[test]
fn test_plateau_decays_learning_rate() {
    let dir = tempfile::tempdir().unwrap();
    let hp = hp(6, 1, 100).early_stop(EarlyStopConfig {
        learning_rate_max: 0.01,
        learning_rate_min: 0.0001,
        learning_rate_early_stop: 2,
    });
    let mut handler = handler(dir.path(), hp);

    let report = handler.start_training().unwrap();
    // Constant evaluations: waits at 3 and 4 entries, fires at 5
    assert_eq!(report.evaluations, 6);
    assert_eq!(report.learning_rate, 0.005);
}

#[test]
fn test_checkpoint_failures_do_not_abort() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    fs::write(&blocker, "x").unwrap();
    let mut handler = handler(&blocker, hp(5, 5, 5));

    let report = handler.start_training().unwrap();
    assert!(report.finished);
    assert_eq!(report.snapshots, 0);
    // Directory setup, local minimum, snapshot and the final retry
    assert_eq!(report.checkpoint_failures, 4);
}

#[test]
fn test_session_can_only_start_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut handler = handler(dir.path(), hp(1, 1, 1));
    handler.start_training().unwrap();
    assert!(matches!(handler.start_training(), Err(TrainError::Training(_))));
}

#[test]
fn test_handler_extras() {
    let dir = tempfile::tempdir().unwrap();
    let mut handler = handler(dir.path(), hp(3, 3, 3));

    let state = array![1.0, 0.0, 0.0, 0.0];
    assert_eq!(handler.predict_one(state.view(), false).unwrap(), array![1.0, 0.0]);
    assert!(handler.play_game(0.01).is_err());

    let mut updated = hp(3, 3, 3);
    updated.learning_rate = 0.042;
    handler.set_hyperparameters(updated).unwrap();
    assert_eq!(handler.learning_rate(), 0.042);
    assert!(handler.set_hyperparameters(hp(0, 3, 3)).is_err());

    handler.start_training().unwrap();
    assert!(handler.agent().is_some());
    assert_eq!(handler.learning_rate(), 0.042);

    let best = handler.play_game(0.01).unwrap();
    assert!(best.solved);
    assert_eq!(best.actions, vec![0, 0, 0]);
}

#[test]
fn test_invalid_hyperparameters_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let result = TrainingHandler::new(
        Corridor::new(4),
        right_walker(),
        hp(5, 0, 5),
        CheckpointWriter::new(dir.path(), "corridor", "1"),
        StatsCollector::new(),
    );
    assert!(matches!(result, Err(TrainError::Configuration { .. })));
}
