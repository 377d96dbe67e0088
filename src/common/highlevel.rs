use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use tracing::debug;

use super::Path;
use crate::algorithm::a_star_search;
use crate::map::Map;
use crate::stat::Stats;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum ConflictType {
    Vertex {
        position: (usize, usize),
        time_step: usize,
    },
    Edge {
        from_position: (usize, usize),
        to_position: (usize, usize),
        to_time_step: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct Conflict {
    pub(crate) agent_1: usize,
    pub(crate) agent_2: usize,
    pub(crate) conflict_type: ConflictType,
}

impl Conflict {
    /// The constraint the child node resolving this conflict for one of the
    /// two agents has to add. A vertex conflict bans the cell for either
    /// agent; an edge conflict bans the traversal for the first agent and
    /// the reverse traversal for the second.
    pub(crate) fn constraint_for(&self, resolve_first: bool) -> Constraint {
        match self.conflict_type {
            ConflictType::Vertex {
                position,
                time_step,
            } => Constraint::Vertex {
                position,
                time_step,
            },
            ConflictType::Edge {
                from_position,
                to_position,
                to_time_step,
            } => {
                if resolve_first {
                    Constraint::Edge {
                        from_position,
                        to_position,
                        to_time_step,
                    }
                } else {
                    Constraint::Edge {
                        from_position: to_position,
                        to_position: from_position,
                        to_time_step,
                    }
                }
            }
        }
    }
}

/// Space-time prohibition for a single agent: a cell it may not occupy at
/// a time step, or a directed traversal it may not take.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Ord, PartialOrd)]
pub enum Constraint {
    Vertex {
        position: (usize, usize),
        time_step: usize,
    },
    Edge {
        from_position: (usize, usize),
        to_position: (usize, usize),
        to_time_step: usize,
    },
}

impl Constraint {
    pub(crate) fn is_violated(
        &self,
        from_pos: (usize, usize),
        to_pos: (usize, usize),
        to_tmstep: usize,
    ) -> bool {
        match self {
            Constraint::Vertex {
                position,
                time_step,
            } => to_pos == *position && to_tmstep == *time_step,
            Constraint::Edge {
                from_position,
                to_position,
                to_time_step,
            } => from_pos == *from_position && to_pos == *to_position && to_tmstep == *to_time_step,
        }
    }
}

/// Constraint-tree node: one task assignment, per-agent constraint sets and
/// the single-agent optimal paths planned under them.
#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) struct HighLevelOpenNode {
    pub(crate) node_id: u64,
    /// Roots carry a fresh assignment from the enumerator; popping one
    /// triggers seeding of the next assignment.
    pub(crate) is_root: bool,
    /// Goal index assigned to each agent.
    pub(crate) tasks: Vec<usize>,
    pub(crate) constraints: Vec<HashSet<Constraint>>,
    pub(crate) paths: Vec<Path>,
    pub(crate) cost: usize,
}

impl Ord for HighLevelOpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .cmp(&other.cost)
            // Drain an already-realized assignment before paying for the
            // next one: non-root nodes pop first among equal cost.
            .then_with(|| self.is_root.cmp(&other.is_root))
            .then_with(|| self.node_id.cmp(&other.node_id))
    }
}

impl PartialOrd for HighLevelOpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl HighLevelOpenNode {
    pub(crate) fn new(
        starts: &[(usize, usize)],
        tasks: Vec<usize>,
        map: &Map,
        node_id: u64,
        stats: &mut Stats,
        cancelled: &AtomicBool,
    ) -> Option<Self> {
        let mut paths = Vec::new();
        let mut total_cost = 0;

        for (agent, &start) in starts.iter().enumerate() {
            let path = a_star_search(
                map,
                start,
                tasks[agent],
                &HashSet::new(),
                stats,
                cancelled,
            )?;
            // Notice: path includes the start cell.
            total_cost += path.len() - 1;
            paths.push(path);
        }

        Some(HighLevelOpenNode {
            node_id,
            is_root: true,
            tasks,
            constraints: vec![HashSet::new(); starts.len()],
            paths,
            cost: total_cost,
        })
    }

    // A finished agent keeps occupying its goal cell; conflicts generated
    // there are real and must be resolved like any other.
    fn state_at(&self, agent: usize, time_step: usize) -> (usize, usize) {
        let path = &self.paths[agent];
        *path.get(time_step).unwrap_or_else(|| path.last().unwrap())
    }

    /// Earliest conflict in the joint solution: scan time steps in order,
    /// vertex collisions before swaps, agent pairs in ascending order. The
    /// fixed order makes child generation reproducible.
    pub(crate) fn first_conflict(&self) -> Option<Conflict> {
        let max_time_step = self
            .paths
            .iter()
            .map(|path| path.len() - 1)
            .max()
            .unwrap_or(0);

        for time_step in 0..max_time_step {
            for i in 0..self.paths.len() {
                for j in (i + 1)..self.paths.len() {
                    let pos_1 = self.state_at(i, time_step);
                    let pos_2 = self.state_at(j, time_step);
                    if pos_1 == pos_2 {
                        return Some(Conflict {
                            agent_1: i,
                            agent_2: j,
                            conflict_type: ConflictType::Vertex {
                                position: pos_1,
                                time_step,
                            },
                        });
                    }
                }
            }

            for i in 0..self.paths.len() {
                for j in (i + 1)..self.paths.len() {
                    let from_1 = self.state_at(i, time_step);
                    let to_1 = self.state_at(i, time_step + 1);
                    let from_2 = self.state_at(j, time_step);
                    let to_2 = self.state_at(j, time_step + 1);
                    if from_1 == to_2 && to_1 == from_2 {
                        return Some(Conflict {
                            agent_1: i,
                            agent_2: j,
                            conflict_type: ConflictType::Edge {
                                from_position: from_1,
                                to_position: to_1,
                                to_time_step: time_step + 1,
                            },
                        });
                    }
                }
            }
        }

        None
    }

    /// Child node resolving `conflict` on one side: extend that agent's
    /// constraint set by the derived constraint and replan only that agent.
    /// `None` when the agent has no path under the extended constraints.
    pub(crate) fn update_constraint(
        &self,
        conflict: &Conflict,
        resolve_first: bool,
        map: &Map,
        new_node_id: u64,
        stats: &mut Stats,
        cancelled: &AtomicBool,
    ) -> Option<HighLevelOpenNode> {
        let mut new_constraints = self.constraints.clone();
        let mut new_paths = self.paths.clone();

        let agent_to_update = if resolve_first {
            conflict.agent_1
        } else {
            conflict.agent_2
        };

        new_constraints[agent_to_update].insert(conflict.constraint_for(resolve_first));

        let new_path = a_star_search(
            map,
            self.paths[agent_to_update][0],
            self.tasks[agent_to_update],
            &new_constraints[agent_to_update],
            stats,
            cancelled,
        )?;

        debug!("update agent {agent_to_update:?} with path {new_path:?} for conflict {conflict:?}");

        let new_cost = self.cost - (new_paths[agent_to_update].len() - 1) + (new_path.len() - 1);
        new_paths[agent_to_update] = new_path;

        Some(HighLevelOpenNode {
            node_id: new_node_id,
            is_root: false,
            tasks: self.tasks.clone(),
            constraints: new_constraints,
            paths: new_paths,
            cost: new_cost,
        })
    }
}
