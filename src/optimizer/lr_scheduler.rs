use serde::{Deserialize, Serialize};

/// Plateau-triggered learning-rate decay driven by the evaluation history.
///
/// Scores are "lower is better" (average steps to solve a board). Once the
/// history is longer than `window`, every observation first advances a wait
/// counter; when the counter has reached `window`, each observation inspects the
/// trailing `window` scores. If none of them improved on the oldest one, the
/// decay counter `k` increments and the new learning rate is
/// `max(learning_rate_max / (2k), learning_rate_min)`. Only a trigger resets the
/// wait counter.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlateauScheduler {
    pub learning_rate_max: f32,
    pub learning_rate_min: f32,
    pub window: usize,
    wait: usize,
    triggers: usize,
}

impl PlateauScheduler {
    pub fn new(learning_rate_max: f32, learning_rate_min: f32, window: usize) -> Self {
        PlateauScheduler {
            learning_rate_max,
            learning_rate_min,
            window,
            wait: 0,
            triggers: 0,
        }
    }

    /// Feed the full evaluation history after a new score was appended.
    ///
    /// Returns the learning rate to apply when the plateau condition fires.
    pub fn observe(&mut self, history: &[f32]) -> Option<f32> {
        if self.window == 0 || history.len() <= self.window {
            return None;
        }

        if self.wait < self.window {
            self.wait += 1;
            return None;
        }

        let tail = &history[history.len() - self.window..];
        if !is_plateau(tail) {
            return None;
        }

        self.triggers += 1;
        self.wait = 0;
        Some(self.learning_rate_for(self.triggers))
    }

    /// Learning rate after `triggers` plateau detections.
    pub fn learning_rate_for(&self, triggers: usize) -> f32 {
        let divisor = (triggers.max(1) * 2) as f32;
        (self.learning_rate_max / divisor).max(self.learning_rate_min)
    }

    pub fn wait(&self) -> usize {
        self.wait
    }

    pub fn triggers(&self) -> usize {
        self.triggers
    }
}

/// True when no score in `window` is lower than the first one.
pub fn is_plateau(window: &[f32]) -> bool {
    match window.split_first() {
        Some((first, rest)) => rest.iter().all(|v| v >= first),
        None => false,
    }
}
