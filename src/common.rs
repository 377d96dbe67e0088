mod highlevel;
mod lowlevel;

pub use highlevel::Constraint;
pub(crate) use highlevel::HighLevelOpenNode;
pub(crate) use lowlevel::LowLevelOpenNode;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, error};

use crate::stat::Stats;

/// Fully materialized planning input. Built by the YAML layer, validated
/// once before any search data structure is constructed.
#[derive(Debug, Clone)]
pub struct Problem {
    pub width: usize,
    pub height: usize,
    pub obstacles: HashSet<(usize, usize)>,
    pub starts: Vec<(usize, usize)>,
    pub goals: Vec<(usize, usize)>,
    pub max_task_assignments: usize,
    pub group_size: usize,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProblemError {
    #[error("grid dimensions must be positive, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },
    #[error("{starts} start states but {goals} goals, the task pool must match the agent count")]
    CountMismatch { starts: usize, goals: usize },
    #[error("start {cell:?} of agent {agent} is out of bounds or on an obstacle")]
    InvalidStart { agent: usize, cell: (usize, usize) },
    #[error("goal {cell:?} at index {task} is out of bounds or on an obstacle")]
    InvalidGoal { task: usize, cell: (usize, usize) },
    #[error("agents {0} and {1} share a start cell")]
    DuplicateStart(usize, usize),
    #[error("goals {0} and {1} share a cell")]
    DuplicateGoal(usize, usize),
    #[error("group size must be positive")]
    ZeroGroupSize,
    #[error("task assignment budget must be positive")]
    ZeroTaskAssignments,
}

impl Problem {
    pub fn num_agents(&self) -> usize {
        self.starts.len()
    }

    fn cell_free(&self, cell: (usize, usize)) -> bool {
        cell.0 < self.width && cell.1 < self.height && !self.obstacles.contains(&cell)
    }

    pub fn validate(&self) -> Result<(), ProblemError> {
        if self.width == 0 || self.height == 0 {
            return Err(ProblemError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        if self.starts.len() != self.goals.len() {
            return Err(ProblemError::CountMismatch {
                starts: self.starts.len(),
                goals: self.goals.len(),
            });
        }
        if self.group_size == 0 {
            return Err(ProblemError::ZeroGroupSize);
        }
        if self.max_task_assignments == 0 {
            return Err(ProblemError::ZeroTaskAssignments);
        }

        for (agent, &cell) in self.starts.iter().enumerate() {
            if !self.cell_free(cell) {
                return Err(ProblemError::InvalidStart { agent, cell });
            }
            for (other, &other_cell) in self.starts.iter().enumerate().take(agent) {
                if cell == other_cell {
                    return Err(ProblemError::DuplicateStart(other, agent));
                }
            }
        }
        for (task, &cell) in self.goals.iter().enumerate() {
            if !self.cell_free(cell) {
                return Err(ProblemError::InvalidGoal { task, cell });
            }
            for (other, &other_cell) in self.goals.iter().enumerate().take(task) {
                if cell == other_cell {
                    return Err(ProblemError::DuplicateGoal(other, task));
                }
            }
        }

        Ok(())
    }
}

/// One discrete move. Every action advances time by exactly one step and
/// costs exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Wait,
}

impl Action {
    /// The action taking `from` to `to` in one step, `None` when the cells
    /// are not reachable from each other within a single move.
    pub fn between(from: (usize, usize), to: (usize, usize)) -> Option<Action> {
        let dx = to.0 as i64 - from.0 as i64;
        let dy = to.1 as i64 - from.1 as i64;
        match (dx, dy) {
            (0, 1) => Some(Action::Up),
            (0, -1) => Some(Action::Down),
            (-1, 0) => Some(Action::Left),
            (1, 0) => Some(Action::Right),
            (0, 0) => Some(Action::Wait),
            _ => None,
        }
    }
}

/// Cells visited by one agent, indexed by time step. Includes the start, so
/// the traversal cost is `len() - 1`.
pub(crate) type Path = Vec<(usize, usize)>;

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub paths: Vec<Path>,
    /// Goal index assigned to each agent.
    pub tasks: Vec<usize>,
}

impl Solution {
    pub fn cost(&self) -> usize {
        self.paths.iter().map(|path| path.len() - 1).sum()
    }

    pub fn makespan(&self) -> usize {
        self.paths.iter().map(|path| path.len() - 1).max().unwrap_or(0)
    }

    pub fn verify(&self, problem: &Problem) -> bool {
        if self.paths.len() != problem.num_agents() || self.tasks.len() != problem.num_agents() {
            error!("incomplete solution");
            return false;
        }

        let mut assigned = HashSet::new();
        for (agent, path) in self.paths.iter().enumerate() {
            if path.first().map_or(true, |&s| s != problem.starts[agent]) {
                error!(
                    "path start {:?} does not match agent start {:?}",
                    path.first(),
                    problem.starts[agent]
                );
                return false;
            }
            if path.last().map_or(true, |&g| g != problem.goals[self.tasks[agent]]) {
                error!(
                    "path end {:?} does not match assigned goal {:?}",
                    path.last(),
                    problem.goals[self.tasks[agent]]
                );
                return false;
            }
            if !assigned.insert(self.tasks[agent]) {
                error!("goal {} assigned twice", self.tasks[agent]);
                return false;
            }

            for window in path.windows(2) {
                if let [first, second] = window {
                    if Action::between(*first, *second).is_none() {
                        error!("invalid move {first:?} -> {second:?}");
                        return false;
                    }
                }
            }
        }

        let max_path_length = self.paths.iter().map(|p| p.len()).max().unwrap_or(0);

        for time_step in 0..max_path_length {
            let mut seen_positions = HashSet::new();
            let mut seen_edges = HashSet::new();

            for path in &self.paths {
                let pos = path.get(time_step).unwrap_or_else(|| path.last().unwrap());
                if !problem.cell_free(*pos) {
                    error!("position {pos:?} is blocked");
                    return false;
                }

                if !seen_positions.insert(pos) {
                    error!("vertex conflict at {pos:?} time {time_step}");
                    return false;
                }

                if time_step >= 1 && time_step < path.len() {
                    let prev_pos = path.get(time_step - 1).unwrap();
                    if prev_pos != pos {
                        let edge = (prev_pos, pos);
                        let reverse_edge = (pos, prev_pos);

                        if !seen_edges.insert(edge) || seen_edges.contains(&reverse_edge) {
                            error!("edge conflict on {edge:?} at time {time_step}");
                            return false;
                        }
                    }
                }
            }
        }

        true
    }

    pub fn log(&self) {
        let mut formatted_solution = String::new();
        for (index, path) in self.paths.iter().enumerate() {
            formatted_solution.push_str(&format!(" agent{} -> goal{}:\n", index, self.tasks[index]));
            for (t, &(x, y)) in path.iter().enumerate() {
                formatted_solution
                    .push_str(&format!("   - x: {}\n     y: {}\n     t: {}\n", x, y, t));
            }
        }
        debug!("solution:\n{}", formatted_solution);
    }
}

/// Planner output handed to the serializer: statistics plus, when planning
/// succeeded, a per-agent `(x, y, t)` schedule.
#[derive(Debug, Clone)]
pub struct Plan {
    pub successful: bool,
    pub stats: Stats,
    pub schedule: Vec<Vec<(usize, usize, usize)>>,
}

impl Plan {
    pub fn from_solution(solution: &Solution, stats: Stats) -> Self {
        let schedule = solution
            .paths
            .iter()
            .map(|path| {
                path.iter()
                    .enumerate()
                    .map(|(t, &(x, y))| (x, y, t))
                    .collect()
            })
            .collect();
        Plan {
            successful: true,
            stats,
            schedule,
        }
    }

    pub fn unsuccessful(stats: Stats) -> Self {
        Plan {
            successful: false,
            stats,
            schedule: Vec::new(),
        }
    }
}
