use std::fs;

use crate::config::{EarlyStopConfig, Hyperparameters};
use crate::error::TrainError;
use crate::optimizer::OptimizerKind;

const MINIMAL: &str = "
EPOCHS: 200
MAX_STEPS: 40
EPSILON_START: 1.0
EPSILON_MIN: 0.05
EPSILON_DECAY: 0.001
LEARNING_RATE: 0.002
DEBUG_LOG_EPOCHS: 20
DEBUG_SNAPSHOT: 100
MINIMUM_CAPTURE_THRESH: 30.0
";

#[test]
fn test_minimal_yaml_uses_defaults() {
    let hp = Hyperparameters::from_yaml_str(MINIMAL).unwrap();

    assert_eq!(hp.epochs, 200);
    assert_eq!(hp.max_steps, 40);
    assert_eq!(hp.gamma, 0.95);
    assert_eq!(hp.batch_size, 32);
    assert_eq!(hp.memory_capacity, 2000);
    assert_eq!(hp.hidden_layers, vec![164, 150]);
    assert_eq!(hp.optimizer, OptimizerKind::Adam);
    assert!(hp.early_stop.is_none());
    assert!(hp.plateau_scheduler().is_none());
}

#[test]
fn test_early_stop_block() {
    let yaml = format!(
        "{}OPTIMIZER: sgd\nEARLY_STOP:\n  LEARNING_RATE_MAX: 0.01\n  LEARNING_RATE_MIN: 0.0001\n  LEARNING_RATE_EARLY_STOP: 4\n",
        MINIMAL
    );
    let hp = Hyperparameters::from_yaml_str(&yaml).unwrap();

    assert_eq!(hp.optimizer, OptimizerKind::Sgd);
    assert_eq!(
        hp.early_stop,
        Some(EarlyStopConfig {
            learning_rate_max: 0.01,
            learning_rate_min: 0.0001,
            learning_rate_early_stop: 4,
        })
    );
    let scheduler = hp.plateau_scheduler().unwrap();
    assert_eq!(scheduler.window, 4);
}

#[test]
fn test_missing_field_is_configuration_error() {
    let yaml = MINIMAL.replace("EPOCHS: 200\n", "");
    assert!(matches!(
        Hyperparameters::from_yaml_str(&yaml),
        Err(TrainError::Configuration { .. })
    ));
}

#[test]
fn test_validate_rejects_bad_values() {
    assert!(Hyperparameters::default().validate().is_ok());

    let zero_epochs = Hyperparameters::default().epochs(0);
    assert!(matches!(
        zero_epochs.validate(),
        Err(TrainError::Configuration { field, .. }) if field == "EPOCHS"
    ));

    let small_memory = Hyperparameters::default().memory(64, 10);
    assert!(small_memory.validate().is_err());

    let mut epsilon = Hyperparameters::default();
    epsilon.epsilon_min = 0.5;
    epsilon.epsilon_start = 0.2;
    assert!(epsilon.validate().is_err());

    let bad_window = Hyperparameters::default().early_stop(EarlyStopConfig {
        learning_rate_max: 0.01,
        learning_rate_min: 0.001,
        learning_rate_early_stop: 0,
    });
    assert!(bad_window.validate().is_err());

    let mut wide_sweep = Hyperparameters::default();
    wide_sweep.playout_max_randomness = 1000.0;
    assert!(matches!(
        wide_sweep.validate(),
        Err(TrainError::Configuration { field, .. }) if field == "PLAYOUT_MAX_RANDOMNESS"
    ));
    wide_sweep.playout_max_randomness = 1.0;
    assert!(wide_sweep.validate().is_ok());
}

#[test]
fn test_load_and_save_json() {
    let dir = tempfile::tempdir().unwrap();
    let yaml_path = dir.path().join("hp.yaml");
    fs::write(&yaml_path, MINIMAL).unwrap();

    let hp = Hyperparameters::load(&yaml_path).unwrap().seed(9);
    let json_path = dir.path().join("hp.json");
    hp.save_json(&json_path).unwrap();

    let json = fs::read_to_string(&json_path).unwrap();
    assert!(json.contains("\"DEBUG_LOG_EPOCHS\": 20"));
    let restored: Hyperparameters = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, hp);
}

#[test]
fn test_brain_config() {
    let hp = Hyperparameters::default().hidden_layers(&[32, 16]);
    let config = hp.brain_config();
    assert_eq!(config.hidden_layers, vec![32, 16]);
    assert_eq!(config.learning_rate, hp.learning_rate);
    assert_eq!(config.target_update_interval, 100);
}
