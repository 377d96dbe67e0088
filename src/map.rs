use std::collections::VecDeque;

use crate::common::Problem;

/// Grid world shared by every search: passability plus, per goal, the exact
/// BFS distance from that goal to every reachable free cell. The distances
/// double as the admissible low-level heuristic and as the task-assignment
/// cost matrix entries.
#[derive(Debug, Clone)]
pub struct Map {
    pub width: usize,
    pub height: usize,
    grid: Vec<Vec<bool>>, // [x][y], true when passable
    pub goals: Vec<(usize, usize)>,
    heuristic: Vec<Vec<Vec<usize>>>, // [goal][x][y], usize::MAX when unreachable
}

impl Map {
    pub fn new(problem: &Problem) -> Self {
        let mut grid = vec![vec![true; problem.height]; problem.width];
        for &(x, y) in &problem.obstacles {
            grid[x][y] = false;
        }

        let mut map = Map {
            width: problem.width,
            height: problem.height,
            grid,
            goals: problem.goals.clone(),
            heuristic: Vec::new(),
        };
        let heuristic = map
            .goals
            .iter()
            .map(|&goal| map.bfs_distances(goal))
            .collect();
        map.heuristic = heuristic;

        map
    }

    // Unit-cost BFS over the 4-connected free-cell graph, seeded at the goal.
    fn bfs_distances(&self, goal: (usize, usize)) -> Vec<Vec<usize>> {
        let mut distances = vec![vec![usize::MAX; self.height]; self.width];
        let mut queue = VecDeque::new();

        if self.is_passable(goal.0, goal.1) {
            distances[goal.0][goal.1] = 0;
            queue.push_back(goal);
        }

        while let Some((x, y)) = queue.pop_front() {
            for &(next_x, next_y) in &self.get_neighbors(x, y, false) {
                if distances[next_x][next_y] == usize::MAX {
                    distances[next_x][next_y] = distances[x][y] + 1;
                    queue.push_back((next_x, next_y));
                }
            }
        }

        distances
    }

    pub fn is_passable(&self, x: usize, y: usize) -> bool {
        self.grid[x][y]
    }

    pub fn get_neighbors(&self, x: usize, y: usize, include_wait: bool) -> Vec<(usize, usize)> {
        // Left, right, down, up, wait.
        let directions: &[(i32, i32)] = if include_wait {
            &[(-1, 0), (1, 0), (0, -1), (0, 1), (0, 0)]
        } else {
            &[(-1, 0), (1, 0), (0, -1), (0, 1)]
        };
        let mut neighbors = Vec::new();

        for &(dx, dy) in directions {
            let new_x = x as i32 + dx;
            let new_y = y as i32 + dy;
            if new_x >= 0
                && new_y >= 0
                && new_x < self.width as i32
                && new_y < self.height as i32
                && self.grid[new_x as usize][new_y as usize]
            {
                neighbors.push((new_x as usize, new_y as usize));
            }
        }

        neighbors
    }

    /// BFS distance from `position` to goal `task`, `usize::MAX` when the
    /// goal is unreachable from there.
    pub fn h(&self, position: (usize, usize), task: usize) -> usize {
        self.heuristic[task][position.0][position.1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn problem_with_wall() -> Problem {
        // 5x5 grid, vertical wall at x = 2 with a single opening at y = 4.
        Problem {
            width: 5,
            height: 5,
            obstacles: HashSet::from([(2, 0), (2, 1), (2, 2), (2, 3)]),
            starts: vec![(0, 2), (4, 2)],
            goals: vec![(4, 2), (0, 2)],
            max_task_assignments: 1_000_000_000,
            group_size: 1_000_000_000,
        }
    }

    #[test]
    fn test_neighbors() {
        let problem = Problem {
            width: 3,
            height: 3,
            obstacles: HashSet::from([(1, 1)]),
            starts: vec![(0, 0)],
            goals: vec![(2, 2)],
            max_task_assignments: 1_000_000_000,
            group_size: 1_000_000_000,
        };
        let map = Map::new(&problem);

        let corner = map.get_neighbors(0, 0, true);
        assert_eq!(corner.len(), 3);
        assert!(corner.contains(&(1, 0)));
        assert!(corner.contains(&(0, 1)));
        assert!(corner.contains(&(0, 0)));

        let without_wait = map.get_neighbors(0, 0, false);
        assert_eq!(without_wait.len(), 2);

        // (1, 1) is an obstacle, so the center of an edge loses one neighbor.
        let edge = map.get_neighbors(1, 0, false);
        assert_eq!(edge, vec![(0, 0), (2, 0)]);
    }

    #[test]
    fn test_heuristic_routes_around_wall() {
        let map = Map::new(&problem_with_wall());

        // Goal 0 is (4, 2). Manhattan distance from (0, 2) would be 4, the
        // true distance through the opening at (2, 4) is 8.
        assert_eq!(map.h((0, 2), 0), 8);
        assert_eq!(map.h((4, 2), 0), 0);
        assert_eq!(map.h((2, 4), 0), 4);

        // Symmetric for goal 1 at (0, 2).
        assert_eq!(map.h((4, 2), 1), 8);
    }

    #[test]
    fn test_heuristic_unreachable() {
        let problem = Problem {
            width: 3,
            height: 3,
            // (2, 2) is walled off from the rest of the grid.
            obstacles: HashSet::from([(1, 2), (2, 1)]),
            starts: vec![(0, 0)],
            goals: vec![(2, 2)],
            max_task_assignments: 1_000_000_000,
            group_size: 1_000_000_000,
        };
        let map = Map::new(&problem);

        assert_eq!(map.h((0, 0), 0), usize::MAX);
        assert_eq!(map.h((2, 2), 0), 0);
    }
}
