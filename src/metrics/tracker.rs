use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;

/// The series a [`StatsCollector`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Series {
    /// Steps of each training episode since the last evaluation
    Steps,
    /// Reward of each training episode since the last evaluation
    Rewards,
    /// Average evaluation steps, one entry per evaluation cycle
    BigSteps,
}

impl Series {
    pub const ALL: [Series; 3] = [Series::Steps, Series::Rewards, Series::BigSteps];

    /// Whether the series is cleared after each evaluation cycle
    pub fn is_windowed(&self) -> bool {
        !matches!(self, Series::BigSteps)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Recorded {
    enabled: bool,
    values: Vec<f32>,
}

/// Append-only training statistics owned by one training session.
///
/// `steps` and `rewards` are windows that the handler clears after every
/// evaluation; `big_steps` accumulates for the whole session and is the
/// series the plateau detection and checkpoints read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsCollector {
    steps: Recorded,
    rewards: Recorded,
    big_steps: Recorded,
}

impl StatsCollector {
    /// Collector with every series enabled
    pub fn new() -> Self {
        let enabled = || Recorded {
            enabled: true,
            values: Vec::new(),
        };
        StatsCollector {
            steps: enabled(),
            rewards: enabled(),
            big_steps: enabled(),
        }
    }

    fn recorded(&self, series: Series) -> &Recorded {
        match series {
            Series::Steps => &self.steps,
            Series::Rewards => &self.rewards,
            Series::BigSteps => &self.big_steps,
        }
    }

    fn recorded_mut(&mut self, series: Series) -> &mut Recorded {
        match series {
            Series::Steps => &mut self.steps,
            Series::Rewards => &mut self.rewards,
            Series::BigSteps => &mut self.big_steps,
        }
    }

    /// Toggle recording of one series
    pub fn set_enabled(&mut self, series: Series, enabled: bool) {
        self.recorded_mut(series).enabled = enabled;
    }

    pub fn is_enabled(&self, series: Series) -> bool {
        self.recorded(series).enabled
    }

    /// Append `value` if the series is enabled
    pub fn collect(&mut self, series: Series, value: f32) {
        let recorded = self.recorded_mut(series);
        if recorded.enabled {
            recorded.values.push(value);
        }
    }

    /// All recorded values, oldest first
    pub fn series(&self, series: Series) -> &[f32] {
        &self.recorded(series).values
    }

    /// The last `n` values (fewer if the series is shorter)
    pub fn tail(&self, series: Series, n: usize) -> &[f32] {
        let values = self.series(series);
        &values[values.len().saturating_sub(n)..]
    }

    /// Mean of the last `n` values
    pub fn mean_tail(&self, series: Series, n: usize) -> Option<f32> {
        let tail = self.tail(series, n);
        if tail.is_empty() {
            return None;
        }
        Some(tail.iter().sum::<f32>() / tail.len() as f32)
    }

    /// Clear the windowed series (`steps`, `rewards`); `big_steps` is kept
    pub fn clear_windows(&mut self) {
        for series in Series::ALL {
            if series.is_windowed() {
                self.recorded_mut(series).values.clear();
            }
        }
    }

    /// Write the `big_steps` series as a JSON array
    pub fn save_big_steps(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string(&self.big_steps.values)?;
        fs::write(path, serialized)?;
        Ok(())
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}
