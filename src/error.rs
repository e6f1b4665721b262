use std::path::PathBuf;
use thiserror::Error;

/// Result type for training operations
pub type Result<T> = std::result::Result<T, TrainError>;

/// Main error type for the trainer
#[derive(Debug, Error)]
pub enum TrainError {
    /// Sampling or replay was requested before enough transitions were stored
    #[error("insufficient samples: requested {requested}, memory holds {available}")]
    InsufficientSamples { requested: usize, available: usize },

    /// An action outside the legal action set reached the environment
    #[error("invalid action {action}: {reason}")]
    InvalidAction { action: usize, reason: String },

    /// The environment offered no legal action to choose from
    #[error("no legal action available in the current state")]
    NoLegalActions,

    /// Writing a checkpoint failed
    #[error("checkpoint I/O failed at {}: {reason}", path.display())]
    CheckpointIo { path: PathBuf, reason: String },

    /// A hyperparameter is missing or out of range
    #[error("invalid configuration '{field}': {reason}")]
    Configuration { field: String, reason: String },

    /// Dimensions of two arrays do not line up
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// IO errors outside of checkpointing (config files, plots)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The handler was driven out of order
    #[error("training error: {0}")]
    Training(String),
}

impl From<bincode::Error> for TrainError {
    fn from(err: bincode::Error) -> Self {
        TrainError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for TrainError {
    fn from(err: serde_json::Error) -> Self {
        TrainError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for TrainError {
    fn from(err: serde_yaml::Error) -> Self {
        TrainError::Serialization(err.to_string())
    }
}

// Helper functions for common error patterns
impl TrainError {
    pub fn configuration<S: Into<String>, R: Into<String>>(field: S, reason: R) -> Self {
        TrainError::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_action<R: Into<String>>(action: usize, reason: R) -> Self {
        TrainError::InvalidAction {
            action,
            reason: reason.into(),
        }
    }

    pub fn checkpoint_io<P: Into<PathBuf>>(path: P, err: impl std::fmt::Display) -> Self {
        TrainError::CheckpointIo {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        TrainError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Whether the handler may log this error and keep training
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TrainError::CheckpointIo { .. })
    }
}
