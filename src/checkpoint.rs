//! # Checkpoints
//!
//! Every file a training session writes is addressed through a
//! [`CheckpointDescriptor`] and the single [`CheckpointDescriptor::resolve`]
//! function, so the on-disk layout can be tested without running a session:
//!
//! ```text
//! {root}/{run_name}/{version}/online.bin
//!                            /target.bin
//!                            /big_steps.json
//!                            /summary.txt
//!                            /hp.json
//!                            /plot.txt
//!                            /local min/online_{score}.bin
//!                            /local min/target_{score}.bin
//! ```
use chrono::{DateTime, Local};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::brain::{Brain, Network};
use crate::config::Hyperparameters;
use crate::error::{Result, TrainError};
use crate::metrics::StatsCollector;
use crate::visualization::StatusSink;

/// Directory of the best-score captures inside a version directory.
pub const LOCAL_MIN_DIR: &str = "local min";

/// What a checkpoint contains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckpointKind {
    /// Both networks, statistics, hyperparameters, summary and plot
    Snapshot,
    /// Both networks only, keyed by the evaluation score that beat the best so far
    LocalMinimum { score: f32 },
}

/// Structured address of one checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointDescriptor {
    pub run_name: String,
    pub version: String,
    /// Epoch the checkpoint was taken at
    pub epoch: usize,
    pub kind: CheckpointKind,
}

/// Files of one checkpoint. Snapshot-only files are `None` for local minima.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointPaths {
    pub directory: PathBuf,
    pub online: PathBuf,
    pub target: PathBuf,
    pub big_steps: Option<PathBuf>,
    pub summary: Option<PathBuf>,
    pub hyperparameters: Option<PathBuf>,
    pub plot: Option<PathBuf>,
}

impl CheckpointDescriptor {
    pub fn new(run_name: impl Into<String>, version: impl Into<String>, epoch: usize, kind: CheckpointKind) -> Self {
        CheckpointDescriptor {
            run_name: run_name.into(),
            version: version.into(),
            epoch,
            kind,
        }
    }

    /// Version directory shared by every checkpoint of the run.
    pub fn version_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.run_name).join(&self.version)
    }

    /// Resolve the descriptor below `root`.
    pub fn resolve(&self, root: &Path) -> CheckpointPaths {
        let version_dir = self.version_dir(root);
        match self.kind {
            CheckpointKind::Snapshot => CheckpointPaths {
                online: version_dir.join("online.bin"),
                target: version_dir.join("target.bin"),
                big_steps: Some(version_dir.join("big_steps.json")),
                summary: Some(version_dir.join("summary.txt")),
                hyperparameters: Some(version_dir.join("hp.json")),
                plot: Some(version_dir.join("plot.txt")),
                directory: version_dir,
            },
            CheckpointKind::LocalMinimum { score } => {
                let directory = version_dir.join(LOCAL_MIN_DIR);
                CheckpointPaths {
                    online: directory.join(format!("online_{}.bin", score)),
                    target: directory.join(format!("target_{}.bin", score)),
                    big_steps: None,
                    summary: None,
                    hyperparameters: None,
                    plot: None,
                    directory,
                }
            }
        }
    }
}

/// Any failure while writing `path` becomes a [`TrainError::CheckpointIo`].
fn at_path<T>(path: &Path, result: Result<T>) -> Result<T> {
    result.map_err(|err| match err {
        TrainError::CheckpointIo { .. } => err,
        other => TrainError::checkpoint_io(path, other),
    })
}

/// Writes the checkpoints of one run.
pub struct CheckpointWriter {
    root: PathBuf,
    run_name: String,
    version: String,
    started: DateTime<Local>,
}

impl CheckpointWriter {
    pub fn new(root: impl Into<PathBuf>, run_name: impl Into<String>, version: impl Into<String>) -> Self {
        CheckpointWriter {
            root: root.into(),
            run_name: run_name.into(),
            version: version.into(),
            started: Local::now(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn descriptor(&self, epoch: usize, kind: CheckpointKind) -> CheckpointDescriptor {
        CheckpointDescriptor::new(self.run_name.clone(), self.version.clone(), epoch, kind)
    }

    /// Start of the run as written into summaries.
    pub fn started(&self) -> DateTime<Local> {
        self.started
    }

    pub fn restart_clock(&mut self) {
        self.started = Local::now();
    }

    /// Create the version directory and its `local min` subdirectory.
    pub fn prepare(&self) -> Result<()> {
        let directory = self.descriptor(0, CheckpointKind::LocalMinimum { score: 0.0 }).resolve(&self.root).directory;
        fs::create_dir_all(&directory).map_err(|err| TrainError::checkpoint_io(&directory, err))
    }

    /// Full checkpoint of the session at `epoch`.
    pub fn save_snapshot<B: Brain + ?Sized>(
        &self,
        epoch: usize,
        brain: &B,
        stats: &StatsCollector,
        hp: &Hyperparameters,
        status: Option<&dyn StatusSink>,
    ) -> Result<CheckpointPaths> {
        let paths = self.descriptor(epoch, CheckpointKind::Snapshot).resolve(&self.root);
        fs::create_dir_all(&paths.directory).map_err(|err| TrainError::checkpoint_io(&paths.directory, err))?;

        at_path(&paths.online, brain.save(Network::Online, &paths.online))?;
        at_path(&paths.target, brain.save(Network::Target, &paths.target))?;
        if let Some(path) = &paths.big_steps {
            at_path(path, stats.save_big_steps(path))?;
        }
        if let Some(path) = &paths.summary {
            let summary = self.summary_text(brain, epoch, Local::now());
            fs::write(path, summary).map_err(|err| TrainError::checkpoint_io(path, err))?;
        }
        if let Some(path) = &paths.hyperparameters {
            at_path(path, hp.save_json(path))?;
        }
        if let (Some(path), Some(status)) = (&paths.plot, status) {
            at_path(path, status.save_plot_to_disk(path))?;
        }

        info!("saved model in {}", paths.directory.display());
        Ok(paths)
    }

    /// Both networks under `local min/`, keyed by `score`.
    pub fn save_local_minimum<B: Brain + ?Sized>(&self, epoch: usize, score: f32, brain: &B) -> Result<CheckpointPaths> {
        let paths = self
            .descriptor(epoch, CheckpointKind::LocalMinimum { score })
            .resolve(&self.root);
        fs::create_dir_all(&paths.directory).map_err(|err| TrainError::checkpoint_io(&paths.directory, err))?;

        at_path(&paths.online, brain.save(Network::Online, &paths.online))?;
        at_path(&paths.target, brain.save(Network::Target, &paths.target))?;

        info!("captured new minimum {} in {}", score, paths.directory.display());
        Ok(paths)
    }

    /// Free-text run summary: model description, timestamps, duration and epochs.
    pub fn summary_text<B: Brain + ?Sized>(&self, brain: &B, epochs_done: usize, end: DateTime<Local>) -> String {
        let ran = end.signed_duration_since(self.started);
        format!(
            "model:\n{}\nstart: {}, stop: {}\nran: {}s on {} epochs.\n",
            brain.summary(),
            self.started.to_rfc3339(),
            end.to_rfc3339(),
            ran.num_milliseconds() as f64 / 1000.0,
            epochs_done
        )
    }
}
