//! Status reporting of a training session.
//!
//! The handler pushes one data point per evaluation cycle into an optional
//! [`StatusSink`]. Calls are fire-and-forget; without a sink they are skipped.
use log::info;
use std::fs;
use std::path::Path;

use super::text_plots::plot_series;
use crate::error::Result;

/// Receiver of the evaluation curve
pub trait StatusSink {
    fn add_data_point(&mut self, epoch: usize, avg_eval_steps: f32, avg_train_steps: f32);

    fn plot(&mut self);

    fn save_plot_to_disk(&self, path: &Path) -> Result<()>;
}

/// Keeps the curves in memory and renders them as ASCII plots
pub struct TextPlotStatus {
    epochs: Vec<usize>,
    eval_steps: Vec<f32>,
    train_steps: Vec<f32>,
    width: usize,
    height: usize,
}

impl TextPlotStatus {
    pub fn new(width: usize, height: usize) -> Self {
        TextPlotStatus {
            epochs: Vec::new(),
            eval_steps: Vec::new(),
            train_steps: Vec::new(),
            width,
            height,
        }
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// Both curves rendered one below the other
    pub fn render(&self) -> String {
        let last_epoch = self.epochs.last().copied().unwrap_or(0);
        format!(
            "{}\n{}",
            plot_series(
                &self.eval_steps,
                &format!("avg. evaluation steps (epoch {})", last_epoch),
                self.width,
                self.height
            ),
            plot_series(&self.train_steps, "avg. training steps", self.width, self.height)
        )
    }
}

impl Default for TextPlotStatus {
    fn default() -> Self {
        Self::new(60, 15)
    }
}

impl StatusSink for TextPlotStatus {
    fn add_data_point(&mut self, epoch: usize, avg_eval_steps: f32, avg_train_steps: f32) {
        self.epochs.push(epoch);
        self.eval_steps.push(avg_eval_steps);
        self.train_steps.push(avg_train_steps);
    }

    fn plot(&mut self) {
        info!("\n{}", self.render());
    }

    fn save_plot_to_disk(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render())?;
        Ok(())
    }
}
