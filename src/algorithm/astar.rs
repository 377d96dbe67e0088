use super::{construct_path, Trace};
use crate::common::{Constraint, LowLevelOpenNode, Path};
use crate::map::Map;
use crate::stat::Stats;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, instrument, trace};

/// Space-time A* for a single agent towards goal `task`, forbidden from the
/// vertex and edge constraints in `constraints`. Returns the cost-optimal
/// path or `None` when the goal is unreachable under the constraints.
///
/// The search only stops on the goal cell once the agent can stay there
/// forever: arrival must be later than the last vertex constraint placed on
/// the goal. Past the largest constraint time the time axis is frozen and
/// wait moves are dropped, which demotes the search to plain 2-D A* and
/// bounds the state space.
#[instrument(skip_all, name = "a_star", fields(start = format!("{:?}", start), task = task), level = "debug")]
pub(crate) fn a_star_search(
    map: &Map,
    start: (usize, usize),
    task: usize,
    constraints: &HashSet<Constraint>,
    stats: &mut Stats,
    cancelled: &AtomicBool,
) -> Option<Path> {
    let goal = map.goals[task];
    debug!("constraints: {constraints:?}");

    let start_h_cost = map.h(start, task);
    if start_h_cost == usize::MAX {
        debug!("goal {goal:?} unreachable from {start:?}");
        return None;
    }

    let last_goal_constraint = constraints
        .iter()
        .filter_map(|constraint| match constraint {
            Constraint::Vertex {
                position,
                time_step,
            } if *position == goal => Some(*time_step as i64),
            _ => None,
        })
        .max()
        .unwrap_or(-1);

    let constraint_limit_time_step = constraints
        .iter()
        .map(|constraint| match constraint {
            Constraint::Vertex { time_step, .. } => *time_step,
            Constraint::Edge { to_time_step, .. } => *to_time_step,
        })
        .max()
        .unwrap_or(0);

    let mut open_list = BTreeSet::new();
    let mut closed_list = HashSet::new();
    let mut trace: Trace = HashMap::new();

    open_list.insert(LowLevelOpenNode {
        position: start,
        f_cost: start_h_cost,
        g_cost: 0,
        time_step: 0,
    });

    while let Some(current) = open_list.pop_first() {
        if cancelled.load(Ordering::Relaxed) {
            return None;
        }

        trace!("expand node: {current:?}");
        stats.low_level_expand_nodes += 1;

        closed_list.insert((current.position, current.time_step));

        if current.position == goal && current.g_cost as i64 > last_goal_constraint {
            return Some(construct_path(&trace, (current.position, current.g_cost)));
        }

        let exceed_constraint_limit = current.time_step > constraint_limit_time_step;

        // Assuming uniform cost, g also counts the elapsed time.
        let tentative_g_cost = current.g_cost + 1;
        let tentative_time_step = if exceed_constraint_limit {
            current.time_step
        } else {
            current.time_step + 1
        };

        for neighbor in &map.get_neighbors(
            current.position.0,
            current.position.1,
            !exceed_constraint_limit,
        ) {
            if closed_list.contains(&(*neighbor, tentative_time_step)) {
                continue;
            }

            if constraints.iter().any(|constraint| {
                constraint.is_violated(current.position, *neighbor, tentative_g_cost)
            }) {
                continue;
            }

            let h_cost = map.h(*neighbor, task);
            if h_cost == usize::MAX {
                continue;
            }

            // A node already in the open list keeps its earlier trace entry.
            if open_list.insert(LowLevelOpenNode {
                position: *neighbor,
                f_cost: tentative_g_cost + h_cost,
                g_cost: tentative_g_cost,
                time_step: tentative_time_step,
            }) {
                trace.insert(
                    (*neighbor, tentative_g_cost),
                    (current.position, current.g_cost),
                );
            }
        }
    }

    debug!("cannot find path towards task {task:?}");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Problem;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("trace")
            .try_init();
    }

    fn open_map(width: usize, height: usize, goals: Vec<(usize, usize)>) -> Map {
        let problem = Problem {
            width,
            height,
            obstacles: HashSet::new(),
            starts: vec![(0, 0)],
            goals,
            max_task_assignments: 1_000_000_000,
            group_size: 1_000_000_000,
        };
        Map::new(&problem)
    }

    #[test]
    fn test_a_star_no_constraint() {
        init_tracing();
        let map = open_map(3, 3, vec![(2, 2)]);
        let stats = &mut Stats::default();
        let cancelled = AtomicBool::new(false);

        let path =
            a_star_search(&map, (0, 0), 0, &HashSet::new(), stats, &cancelled).unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path[0], (0, 0));
        assert_eq!(*path.last().unwrap(), (2, 2));
        assert!(stats.low_level_expand_nodes > 0);
    }

    #[test]
    fn test_a_star_start_on_goal() {
        init_tracing();
        let map = open_map(3, 3, vec![(1, 1)]);
        let stats = &mut Stats::default();
        let cancelled = AtomicBool::new(false);

        let path =
            a_star_search(&map, (1, 1), 0, &HashSet::new(), stats, &cancelled).unwrap();
        assert_eq!(path, vec![(1, 1)]);
    }

    #[test]
    fn test_a_star_vertex_constraint_forces_wait() {
        init_tracing();
        // Single corridor: the only cost-2 path goes through (1, 0) at
        // time 1, so banning that forces one extra step.
        let map = open_map(3, 1, vec![(2, 0)]);
        let mut constraints = HashSet::new();
        constraints.insert(Constraint::Vertex {
            position: (1, 0),
            time_step: 1,
        });
        let stats = &mut Stats::default();
        let cancelled = AtomicBool::new(false);

        let path = a_star_search(&map, (0, 0), 0, &constraints, stats, &cancelled).unwrap();
        assert_eq!(path.len(), 4);
        assert_eq!(path[0], (0, 0));
        assert_eq!(*path.last().unwrap(), (2, 0));
        assert_ne!(path[1], (1, 0));
    }

    #[test]
    fn test_a_star_edge_constraint() {
        init_tracing();
        let map = open_map(3, 1, vec![(2, 0)]);
        let mut constraints = HashSet::new();
        constraints.insert(Constraint::Edge {
            from_position: (0, 0),
            to_position: (1, 0),
            to_time_step: 1,
        });
        let stats = &mut Stats::default();
        let cancelled = AtomicBool::new(false);

        let path = a_star_search(&map, (0, 0), 0, &constraints, stats, &cancelled).unwrap();
        // One wait, then straight through.
        assert_eq!(path.len(), 4);
        assert_eq!(path[1], (0, 0));
    }

    #[test]
    fn test_a_star_waits_out_goal_constraint() {
        init_tracing();
        let map = open_map(4, 1, vec![(1, 0)]);
        let mut constraints = HashSet::new();
        constraints.insert(Constraint::Vertex {
            position: (1, 0),
            time_step: 3,
        });
        let stats = &mut Stats::default();
        let cancelled = AtomicBool::new(false);

        let path = a_star_search(&map, (0, 0), 0, &constraints, stats, &cancelled).unwrap();
        // The goal cell is banned at time 3, so the agent may only settle
        // there from time 4 on.
        assert_eq!(path.len(), 5);
        assert_eq!(*path.last().unwrap(), (1, 0));
        assert_ne!(path[3], (1, 0));
    }

    #[test]
    fn test_a_star_unreachable_goal() {
        init_tracing();
        let problem = Problem {
            width: 3,
            height: 3,
            obstacles: HashSet::from([(1, 2), (2, 1)]),
            starts: vec![(0, 0)],
            goals: vec![(2, 2)],
            max_task_assignments: 1_000_000_000,
            group_size: 1_000_000_000,
        };
        let map = Map::new(&problem);
        let stats = &mut Stats::default();
        let cancelled = AtomicBool::new(false);

        assert!(a_star_search(&map, (0, 0), 0, &HashSet::new(), stats, &cancelled).is_none());
    }

    #[test]
    fn test_a_star_cancelled() {
        init_tracing();
        let map = open_map(3, 3, vec![(2, 2)]);
        let stats = &mut Stats::default();
        let cancelled = AtomicBool::new(true);

        assert!(a_star_search(&map, (0, 0), 0, &HashSet::new(), stats, &cancelled).is_none());
    }
}
