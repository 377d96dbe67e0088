use super::{SolveError, Solver};
use crate::assignment::{NextBestAssignment, FORBIDDEN};
use crate::common::{Constraint, HighLevelOpenNode, Problem, Solution};
use crate::map::Map;
use crate::stat::Stats;

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Conflict-Based Search with Task Assignment. The open set holds one
/// forest of constraint trees: each root carries a fresh assignment from
/// the k-best enumerator, and popping a root lazily seeds the next one, so
/// no cheaper assignment is ever skipped while a tree is drained.
pub struct CBSTA {
    starts: Vec<(usize, usize)>,
    map: Map,
    assignment: NextBestAssignment,
    max_task_assignments: usize,
    node_id: u64,
    stats: Stats,
    final_constraints: Vec<HashSet<Constraint>>,
    cancelled: Arc<AtomicBool>,
}

impl CBSTA {
    pub fn new(problem: &Problem, map: &Map) -> Self {
        // Agent x task cost matrix from the BFS distances. Tasks outside an
        // agent's group window and unreachable goals stay forbidden.
        let num_tasks = problem.goals.len();
        let mut costs = vec![vec![FORBIDDEN; num_tasks]; problem.num_agents()];
        for (agent, &start) in problem.starts.iter().enumerate() {
            let group_start = (agent / problem.group_size) * problem.group_size;
            let group_end = group_start.saturating_add(problem.group_size);
            for task in group_start..group_end.min(num_tasks) {
                let distance = map.h(start, task);
                if distance != usize::MAX {
                    costs[agent][task] = distance as i64;
                }
            }
        }

        CBSTA {
            starts: problem.starts.clone(),
            map: map.clone(),
            assignment: NextBestAssignment::new(costs),
            max_task_assignments: problem.max_task_assignments,
            node_id: 0,
            stats: Stats::default(),
            final_constraints: Vec::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Per-agent constraint sets of the accepted solution node; replanning
    /// any agent under its set reproduces the returned schedule. Empty
    /// until a solve succeeds.
    pub fn final_constraints(&self) -> &[HashSet<Constraint>] {
        &self.final_constraints
    }

    /// Flag checked between high-level pops and low-level expansions;
    /// setting it makes `solve` return `SolveError::Cancelled`.
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    fn next_node_id(&mut self) -> u64 {
        self.node_id += 1;
        self.node_id
    }

    // Strictly budgeted: once max_task_assignments assignments have been
    // handed out, no further ones are requested from the enumerator.
    fn next_task_assignment(&mut self) -> Option<Vec<usize>> {
        if self.stats.num_task_assignments >= self.max_task_assignments {
            return None;
        }
        let (cost, tasks) = self.assignment.next_solution()?;
        self.stats.num_task_assignments += 1;
        debug!("task assignment {tasks:?} with matching cost {cost:?}");
        Some(tasks)
    }

    fn seed_root(&mut self, open: &mut BTreeSet<HighLevelOpenNode>) {
        if let Some(tasks) = self.next_task_assignment() {
            let node_id = self.next_node_id();
            if let Some(root) = HighLevelOpenNode::new(
                &self.starts,
                tasks,
                &self.map,
                node_id,
                &mut self.stats,
                &self.cancelled,
            ) {
                open.insert(root);
            }
        }
    }
}

impl Solver for CBSTA {
    fn solve(&mut self) -> Result<Solution, SolveError> {
        let total_solve_start_time = Instant::now();
        let mut open = BTreeSet::new();

        self.seed_root(&mut open);

        while let Some(current_node) = open.pop_first() {
            if self.cancelled.load(Ordering::Relaxed) {
                self.stats.time_seconds = total_solve_start_time.elapsed().as_secs_f64();
                return Err(SolveError::Cancelled);
            }

            self.stats.high_level_expand_nodes += 1;

            match current_node.first_conflict() {
                None => {
                    self.stats.time_seconds = total_solve_start_time.elapsed().as_secs_f64();
                    self.stats.costs = current_node.cost;
                    self.final_constraints = current_node.constraints;
                    let solution = Solution {
                        paths: current_node.paths,
                        tasks: current_node.tasks,
                    };
                    self.stats.makespan = solution.makespan();
                    solution.log();
                    return Ok(solution);
                }
                Some(conflict) => {
                    // A popped root seeds the next assignment's root before
                    // its own conflict split.
                    if current_node.is_root {
                        self.seed_root(&mut open);
                    }

                    debug!("resolve conflict {conflict:?}");
                    for resolve_first in [true, false] {
                        let node_id = self.next_node_id();
                        if let Some(child) = current_node.update_constraint(
                            &conflict,
                            resolve_first,
                            &self.map,
                            node_id,
                            &mut self.stats,
                            &self.cancelled,
                        ) {
                            open.insert(child);
                        }
                    }
                }
            }
        }

        self.stats.time_seconds = total_solve_start_time.elapsed().as_secs_f64();
        if self.cancelled.load(Ordering::Relaxed) {
            Err(SolveError::Cancelled)
        } else {
            Err(SolveError::NoSolution)
        }
    }
}
