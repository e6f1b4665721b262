use ndarray::{array, Array1, Array2, ArrayView1, ArrayView2};
use std::cell::Cell;
use std::fs;
use std::path::Path;

use crate::agent::Policy;
use crate::brain::{Brain, Network};
use crate::env::Environment;
use crate::error::{Result, TrainError};
use crate::replay_buffer::Transition;
use crate::types::{Action, State};

pub fn transition(i: usize) -> Transition {
    Transition {
        state: array![i as f32],
        action: 0,
        reward: i as f32,
        next_state: array![(i + 1) as f32],
        done: false,
    }
}

/// Brain with fixed online and target estimates that records what it was fitted on.
pub struct MockBrain {
    pub online: Array1<f32>,
    pub target: Array1<f32>,
    pub learning_rate: f32,
    pub fits: usize,
    pub last_targets: Option<Array2<f32>>,
    /// Number of upcoming online-network saves that fail
    pub failing_saves: Cell<usize>,
}

impl MockBrain {
    pub fn new(online: Array1<f32>, target: Array1<f32>) -> Self {
        MockBrain {
            online,
            target,
            learning_rate: 0.01,
            fits: 0,
            last_targets: None,
            failing_saves: Cell::new(0),
        }
    }

    fn values(&self, use_target: bool) -> &Array1<f32> {
        if use_target {
            &self.target
        } else {
            &self.online
        }
    }
}

impl Brain for MockBrain {
    fn predict(&mut self, _state: ArrayView1<f32>, use_target: bool) -> Array1<f32> {
        self.values(use_target).clone()
    }

    fn predict_batch(&mut self, states: ArrayView2<f32>, use_target: bool) -> Array2<f32> {
        let values = self.values(use_target);
        let mut out = Array2::zeros((states.nrows(), values.len()));
        for mut row in out.rows_mut() {
            row.assign(values);
        }
        out
    }

    fn fit(&mut self, _states: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32> {
        self.fits += 1;
        self.last_targets = Some(targets.to_owned());
        Ok(0.0)
    }

    fn update_learning_rate(&mut self, rate: f32) {
        self.learning_rate = rate;
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn save(&self, network: Network, path: &Path) -> Result<()> {
        if network == Network::Online && self.failing_saves.get() > 0 {
            self.failing_saves.set(self.failing_saves.get() - 1);
            return Err(TrainError::Training("disk full".to_string()));
        }
        let values = match network {
            Network::Online => &self.online,
            Network::Target => &self.target,
        };
        fs::write(path, serde_json::to_string(values)?)?;
        Ok(())
    }

    fn summary(&self) -> String {
        "mock brain".to_string()
    }
}

/// A one-dimensional corridor: action 0 steps right, action 1 steps left.
/// The episode ends on the rightmost cell.
pub struct Corridor {
    pub length: usize,
    pub position: usize,
}

impl Corridor {
    pub fn new(length: usize) -> Self {
        Corridor { length, position: 0 }
    }

    fn encode(&self) -> State {
        let mut state = Array1::zeros(self.length);
        state[self.position] = 1.0;
        state
    }
}

impl Environment for Corridor {
    fn reset(&mut self) -> Result<State> {
        self.position = 0;
        Ok(self.encode())
    }

    fn step(&mut self, action: Action) -> Result<(State, f32, bool)> {
        if !self.legal_actions().contains(&action) {
            return Err(TrainError::invalid_action(action, "not legal in the corridor"));
        }
        if action == 0 {
            self.position += 1;
        } else {
            self.position -= 1;
        }
        let done = self.position + 1 == self.length;
        Ok((self.encode(), if done { 10.0 } else { -1.0 }, done))
    }

    fn legal_action_count(&self) -> usize {
        2
    }

    fn legal_actions(&self) -> Vec<Action> {
        if self.position == 0 {
            vec![0]
        } else {
            vec![0, 1]
        }
    }

    fn state_size(&self) -> usize {
        self.length
    }
}

/// Plays a fixed action when legal and counts what the runner hands it.
pub struct ScriptedPolicy {
    pub action: Action,
    pub observed: usize,
    pub learn_calls: usize,
}

impl ScriptedPolicy {
    pub fn new(action: Action) -> Self {
        ScriptedPolicy {
            action,
            observed: 0,
            learn_calls: 0,
        }
    }

    fn pick(&self, legal: &[Action]) -> Result<Action> {
        if legal.contains(&self.action) {
            Ok(self.action)
        } else {
            legal.first().copied().ok_or(TrainError::NoLegalActions)
        }
    }
}

impl Policy for ScriptedPolicy {
    fn select_action(&mut self, _state: ArrayView1<f32>, legal: &[Action]) -> Result<Action> {
        self.pick(legal)
    }

    fn greedy_action(&mut self, _state: ArrayView1<f32>, legal: &[Action]) -> Result<Action> {
        self.pick(legal)
    }

    fn observe(&mut self, _transition: Transition) {
        self.observed += 1;
    }

    fn learn(&mut self) -> Result<Option<f32>> {
        self.learn_calls += 1;
        Ok(Some(0.0))
    }
}
