use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Cost marking an (agent, task) pair as unusable: unreachable goals, pairs
/// outside an agent's group window and pairs excluded by the enumerator.
/// Large enough to dominate any sum of real grid distances, small enough
/// that the matcher's potentials stay far from overflow.
pub(crate) const FORBIDDEN: i64 = 1 << 40;

/// Dense O(n^3) Hungarian algorithm over an n x n cost matrix. Returns the
/// minimum-cost perfect matching as task index per agent; a matching that
/// resorts to a `FORBIDDEN` entry means no usable perfect matching exists,
/// which callers detect by summing the chosen entries.
pub(crate) fn hungarian(costs: &[Vec<i64>]) -> Vec<usize> {
    let n = costs.len();
    if n == 0 {
        return Vec::new();
    }

    let inf = i64::MAX / 4;
    let mut u = vec![0i64; n + 1];
    let mut v = vec![0i64; n + 1];
    let mut matched = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for agent in 1..=n {
        matched[0] = agent;
        let mut j0 = 0usize;
        let mut minv = vec![inf; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = matched[j0];
            let mut delta = inf;
            let mut j1 = 0usize;

            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let cur = costs[i0 - 1][j - 1] - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }

            for j in 0..=n {
                if used[j] {
                    u[matched[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }

            j0 = j1;
            if matched[j0] == 0 {
                break;
            }
        }

        loop {
            let j1 = way[j0];
            matched[j0] = matched[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0usize; n];
    for j in 1..=n {
        if matched[j] > 0 {
            assignment[matched[j] - 1] = j - 1;
        }
    }
    assignment
}

// Murty subproblem: the best assignment that uses every `forced` edge and
// none of the `forbidden` ones.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AssignmentNode {
    cost: i64,
    seq: u64,
    forced: Vec<(usize, usize)>,
    forbidden: BTreeSet<(usize, usize)>,
    solution: Vec<usize>,
}

impl Ord for AssignmentNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .cmp(&other.cost)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for AssignmentNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lazy enumerator over agent-to-task assignments in non-decreasing total
/// cost, each emitted exactly once (Murty's algorithm over the Hungarian
/// matcher). Popping a solution partitions its subproblem: child k forbids
/// the k-th edge of the solution and forces the edges before it.
pub(crate) struct NextBestAssignment {
    costs: Vec<Vec<i64>>,
    open: BTreeSet<AssignmentNode>,
    seq: u64,
}

impl NextBestAssignment {
    pub(crate) fn new(costs: Vec<Vec<i64>>) -> Self {
        let mut enumerator = NextBestAssignment {
            costs,
            open: BTreeSet::new(),
            seq: 0,
        };

        if let Some((cost, solution)) = enumerator.solve_subproblem(&[], &BTreeSet::new()) {
            enumerator.open.insert(AssignmentNode {
                cost,
                seq: 0,
                forced: Vec::new(),
                forbidden: BTreeSet::new(),
                solution,
            });
        }

        enumerator
    }

    fn solve_subproblem(
        &self,
        forced: &[(usize, usize)],
        forbidden: &BTreeSet<(usize, usize)>,
    ) -> Option<(i64, Vec<usize>)> {
        let n = self.costs.len();
        if n == 0 {
            return Some((0, Vec::new()));
        }

        let mut effective = self.costs.clone();
        for &(agent, task) in forbidden {
            effective[agent][task] = FORBIDDEN;
        }
        for &(agent, task) in forced {
            for other in 0..n {
                if other != task {
                    effective[agent][other] = FORBIDDEN;
                }
            }
        }

        let solution = hungarian(&effective);
        let mut cost = 0;
        for (agent, &task) in solution.iter().enumerate() {
            if effective[agent][task] >= FORBIDDEN {
                return None;
            }
            cost += effective[agent][task];
        }
        Some((cost, solution))
    }

    /// Next assignment in non-decreasing cost order, `None` once exhausted.
    pub(crate) fn next_solution(&mut self) -> Option<(i64, Vec<usize>)> {
        let node = self.open.pop_first()?;

        let fixed_agents: HashSet<usize> = node.forced.iter().map(|&(agent, _)| agent).collect();
        let mut forced = node.forced.clone();

        for agent in 0..self.costs.len() {
            if fixed_agents.contains(&agent) {
                continue;
            }
            let edge = (agent, node.solution[agent]);

            let mut forbidden = node.forbidden.clone();
            forbidden.insert(edge);
            if let Some((cost, solution)) = self.solve_subproblem(&forced, &forbidden) {
                self.seq += 1;
                self.open.insert(AssignmentNode {
                    cost,
                    seq: self.seq,
                    forced: forced.clone(),
                    forbidden,
                    solution,
                });
            }

            forced.push(edge);
        }

        debug!(
            "next best assignment: cost {:?} tasks {:?}",
            node.cost, node.solution
        );
        Some((node.cost, node.solution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hungarian_small() {
        let costs = vec![vec![4, 1, 3], vec![2, 0, 5], vec![3, 2, 2]];

        let assignment = hungarian(&costs);
        assert_eq!(assignment.len(), 3);

        let total: i64 = assignment
            .iter()
            .enumerate()
            .map(|(agent, &task)| costs[agent][task])
            .sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn test_hungarian_avoids_forbidden() {
        // The cheap diagonal is blocked, the matching must route around it.
        let costs = vec![vec![FORBIDDEN, 1], vec![1, FORBIDDEN]];
        let assignment = hungarian(&costs);
        assert_eq!(assignment, vec![1, 0]);
    }

    #[test]
    fn test_next_solution_orders_by_cost() {
        // Permutation costs: [1, 0] -> 4, [0, 1] -> 5.
        let mut enumerator = NextBestAssignment::new(vec![vec![1, 2], vec![2, 4]]);

        assert_eq!(enumerator.next_solution(), Some((4, vec![1, 0])));
        assert_eq!(enumerator.next_solution(), Some((5, vec![0, 1])));
        assert_eq!(enumerator.next_solution(), None);
    }

    #[test]
    fn test_next_solution_enumerates_all_permutations() {
        let costs = vec![vec![7, 2, 5], vec![3, 9, 9], vec![4, 8, 1]];
        let mut enumerator = NextBestAssignment::new(costs.clone());

        let mut seen = Vec::new();
        let mut previous_cost = i64::MIN;
        while let Some((cost, solution)) = enumerator.next_solution() {
            let recomputed: i64 = solution
                .iter()
                .enumerate()
                .map(|(agent, &task)| costs[agent][task])
                .sum();
            assert_eq!(cost, recomputed);
            assert!(cost >= previous_cost);
            previous_cost = cost;
            assert!(!seen.contains(&solution));
            seen.push(solution);
        }

        // All 3! permutations, each exactly once.
        assert_eq!(seen.len(), 6);
        assert_eq!(seen[0], vec![1, 0, 2]);
    }

    #[test]
    fn test_next_solution_skips_forbidden_pairs() {
        // Block-diagonal grouping: agents 0-1 may only take tasks 0-1.
        let costs = vec![
            vec![1, 2, FORBIDDEN, FORBIDDEN],
            vec![2, 1, FORBIDDEN, FORBIDDEN],
            vec![FORBIDDEN, FORBIDDEN, 1, 2],
            vec![FORBIDDEN, FORBIDDEN, 2, 1],
        ];
        let mut enumerator = NextBestAssignment::new(costs);

        let mut count = 0;
        while let Some((_, solution)) = enumerator.next_solution() {
            assert!(solution[0] < 2 && solution[1] < 2);
            assert!(solution[2] >= 2 && solution[3] >= 2);
            count += 1;
        }
        // Two permutations per group.
        assert_eq!(count, 4);
    }

    #[test]
    fn test_no_feasible_assignment() {
        let costs = vec![vec![FORBIDDEN, 1], vec![FORBIDDEN, 1]];
        let mut enumerator = NextBestAssignment::new(costs);
        assert_eq!(enumerator.next_solution(), None);
    }

    #[test]
    fn test_empty_matrix() {
        let mut enumerator = NextBestAssignment::new(Vec::new());
        assert_eq!(enumerator.next_solution(), Some((0, Vec::new())));
        assert_eq!(enumerator.next_solution(), None);
    }
}
