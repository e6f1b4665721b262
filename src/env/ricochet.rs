//! Ricochet-robot board.
//!
//! Robots slide in one of four directions until they hit a wall, the board edge
//! or another robot. The episode is solved when the first robot stops on the
//! target cell.
use ndarray::Array1;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::Environment;
use crate::error::{Result, TrainError};
use crate::types::{Action, State};

type Cell = (usize, usize);

const DIRECTIONS: [&str; 4] = ["north", "east", "south", "west"];

/// Random robot placements tried on one layout before giving up on it.
const PLACEMENT_ATTEMPTS: usize = 256;
/// Fresh layouts drawn when the board may be regenerated.
const LAYOUT_ATTEMPTS: usize = 16;

/// How boards are generated on reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardStyle {
    /// One wall layout and target, drawn once; robots are re-placed on reset
    Fixed,
    /// A fresh wall layout and target on every reset
    Random,
}

/// Shape and rewards of a [`RicochetEnv`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RicochetConfig {
    pub grid_size: usize,
    pub robots: usize,
    /// Number of inner wall segments
    pub walls: usize,
    pub step_reward: f32,
    pub target_reward: f32,
    pub style: BoardStyle,
    pub seed: Option<u64>,
}

impl Default for RicochetConfig {
    fn default() -> Self {
        RicochetConfig {
            grid_size: 5,
            robots: 2,
            walls: 4,
            step_reward: -1.0,
            target_reward: 10.0,
            style: BoardStyle::Fixed,
            seed: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Layout {
    target: Cell,
    /// Wall on the east side of a cell
    east: Vec<bool>,
    /// Wall on the south side of a cell
    south: Vec<bool>,
}

/// Ricochet-robot puzzle as an [`Environment`].
///
/// Action `a` moves robot `a / 4` towards direction `a % 4` (north, east, south,
/// west). Moves that leave the board unchanged are illegal.
pub struct RicochetEnv {
    config: RicochetConfig,
    layout: Option<Layout>,
    robots: Vec<Cell>,
    rng: SmallRng,
}

impl RicochetEnv {
    /// Build a board. Fails on invalid dimensions or when no generated layout
    /// admits a robot placement with a legal move.
    pub fn new(config: RicochetConfig) -> Result<Self> {
        let mut env = Self::unplaced(config)?;
        env.reset()?;
        Ok(env)
    }

    /// Build a board with a given target and inner walls, kept across resets.
    ///
    /// `east` lists cells with a wall on their east side, `south` cells with a
    /// wall on their south side.
    pub fn with_board(mut config: RicochetConfig, target: Cell, east: &[Cell], south: &[Cell]) -> Result<Self> {
        config.style = BoardStyle::Fixed;
        let n = config.grid_size;
        let mut env = Self::unplaced(config)?;
        let on_board = |&(row, col): &Cell| row < n && col < n;
        if !on_board(&target) || !east.iter().all(on_board) || !south.iter().all(on_board) {
            return Err(TrainError::configuration("board", "target and walls must lie on the board"));
        }

        let mut layout = Layout {
            target,
            east: vec![false; n * n],
            south: vec![false; n * n],
        };
        for &cell in east {
            layout.east[env.index(cell)] = true;
        }
        for &cell in south {
            layout.south[env.index(cell)] = true;
        }
        env.layout = Some(layout);
        env.reset()?;
        Ok(env)
    }

    fn unplaced(config: RicochetConfig) -> Result<Self> {
        if config.grid_size < 2 {
            return Err(TrainError::configuration("grid_size", "the board needs at least 2x2 cells"));
        }
        if config.robots == 0 || config.robots + 1 > config.grid_size * config.grid_size {
            return Err(TrainError::configuration("robots", "robots and target must fit on the board"));
        }
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Ok(RicochetEnv {
            config,
            layout: None,
            robots: Vec::new(),
            rng,
        })
    }

    pub fn config(&self) -> &RicochetConfig {
        &self.config
    }

    pub fn robots(&self) -> &[Cell] {
        &self.robots
    }

    pub fn target(&self) -> Option<Cell> {
        self.layout.as_ref().map(|layout| layout.target)
    }

    /// Place robots explicitly, e.g. to replay a known puzzle.
    pub fn set_robots(&mut self, robots: Vec<Cell>) -> Result<()> {
        let n = self.config.grid_size;
        if robots.len() != self.config.robots || robots.iter().any(|&(r, c)| r >= n || c >= n) {
            return Err(TrainError::configuration("robots", "positions must match the board"));
        }
        self.robots = robots;
        Ok(())
    }

    fn index(&self, (row, col): Cell) -> usize {
        row * self.config.grid_size + col
    }

    fn random_cell(&mut self) -> Cell {
        let n = self.config.grid_size;
        (self.rng.gen_range(0..n), self.rng.gen_range(0..n))
    }

    fn generate_layout(&mut self) -> Layout {
        let n = self.config.grid_size;
        let mut east = vec![false; n * n];
        let mut south = vec![false; n * n];
        for _ in 0..self.config.walls {
            let (row, col) = self.random_cell();
            // Board edges are walls already
            if self.rng.gen::<bool>() && col + 1 < n {
                east[row * n + col] = true;
            } else if row + 1 < n {
                south[row * n + col] = true;
            }
        }
        let target = self.random_cell();
        Layout { target, east, south }
    }

    fn place_robots(&mut self, target: Cell) {
        let mut robots: Vec<Cell> = Vec::with_capacity(self.config.robots);
        while robots.len() < self.config.robots {
            let cell = self.random_cell();
            if cell != target && !robots.contains(&cell) {
                robots.push(cell);
            }
        }
        self.robots = robots;
    }

    /// Cell one step from `from` towards `direction`, if no wall or edge is in between.
    fn neighbour(&self, layout: &Layout, from: Cell, direction: usize) -> Option<Cell> {
        let n = self.config.grid_size;
        let (row, col) = from;
        match direction {
            0 if row > 0 && !layout.south[self.index((row - 1, col))] => Some((row - 1, col)),
            1 if col + 1 < n && !layout.east[self.index(from)] => Some((row, col + 1)),
            2 if row + 1 < n && !layout.south[self.index(from)] => Some((row + 1, col)),
            3 if col > 0 && !layout.east[self.index((row, col - 1))] => Some((row, col - 1)),
            _ => None,
        }
    }

    /// Where robot `robot` stops when sliding towards `direction`.
    fn slide(&self, layout: &Layout, robot: usize, direction: usize) -> Cell {
        let mut position = self.robots[robot];
        while let Some(next) = self.neighbour(layout, position, direction) {
            if self.robots.contains(&next) {
                break;
            }
            position = next;
        }
        position
    }

    /// Place robots on the current layout until one of them can move.
    fn place_playable(&mut self) -> bool {
        let target = self.target().unwrap_or((0, 0));
        for _ in 0..PLACEMENT_ATTEMPTS {
            self.place_robots(target);
            if !self.legal_actions().is_empty() {
                return true;
            }
        }
        false
    }

    fn encode(&self) -> State {
        let n = self.config.grid_size;
        let plane = n * n;
        let mut state = Array1::zeros(self.state_size());
        for (i, &robot) in self.robots.iter().enumerate() {
            state[i * plane + self.index(robot)] = 1.0;
        }
        if let Some(layout) = &self.layout {
            let offset = self.config.robots * plane;
            state[offset + self.index(layout.target)] = 1.0;
            for cell in 0..plane {
                if layout.east[cell] {
                    state[offset + plane + cell] = 1.0;
                }
                if layout.south[cell] {
                    state[offset + 2 * plane + cell] = 1.0;
                }
            }
        }
        state
    }
}

impl Environment for RicochetEnv {
    fn reset(&mut self) -> Result<State> {
        let regenerate = self.layout.is_none() || self.config.style == BoardStyle::Random;
        let layouts = if regenerate { LAYOUT_ATTEMPTS } else { 1 };
        for _ in 0..layouts {
            if regenerate {
                self.layout = Some(self.generate_layout());
            }
            if self.place_playable() {
                return Ok(self.encode());
            }
        }
        Err(TrainError::Training(format!(
            "no robot placement with a legal move on a {}x{} board with {} robots",
            self.config.grid_size, self.config.grid_size, self.config.robots
        )))
    }

    fn step(&mut self, action: Action) -> Result<(State, f32, bool)> {
        if action >= self.legal_action_count() {
            return Err(TrainError::invalid_action(
                action,
                format!("action space has {} actions", self.legal_action_count()),
            ));
        }
        let layout = self
            .layout
            .clone()
            .ok_or_else(|| TrainError::Training("step before reset".to_string()))?;

        let (robot, direction) = (action / 4, action % 4);
        let destination = self.slide(&layout, robot, direction);
        if destination == self.robots[robot] {
            return Err(TrainError::invalid_action(action, "move does not change the board"));
        }
        self.robots[robot] = destination;

        let solved = self.robots[0] == layout.target;
        let mut reward = self.config.step_reward;
        if solved {
            reward += self.config.target_reward;
        }
        Ok((self.encode(), reward, solved))
    }

    fn legal_action_count(&self) -> usize {
        self.config.robots * DIRECTIONS.len()
    }

    fn legal_actions(&self) -> Vec<Action> {
        let layout = match &self.layout {
            Some(layout) => layout,
            None => return Vec::new(),
        };
        (0..self.legal_action_count())
            .filter(|&action| self.slide(layout, action / 4, action % 4) != self.robots[action / 4])
            .collect()
    }

    fn state_size(&self) -> usize {
        (self.config.robots + 3) * self.config.grid_size * self.config.grid_size
    }

    fn describe_action(&self, action: Action) -> String {
        format!("robot {} {}", action / 4, DIRECTIONS[action % 4])
    }
}
