use rand::prelude::*;
use std::collections::HashSet;
use tracing::info;

use crate::common::Problem;

/// Random instance generator, mainly for stress tests and benchmarking.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub width: usize,
    pub height: usize,
    pub obstacles: HashSet<(usize, usize)>,
}

impl Scenario {
    pub fn generate<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        num_obstacles: usize,
        rng: &mut R,
    ) -> Self {
        let mut cells: Vec<(usize, usize)> = (0..width)
            .flat_map(|x| (0..height).map(move |y| (x, y)))
            .collect();
        cells.shuffle(rng);

        Scenario {
            width,
            height,
            obstacles: cells.into_iter().take(num_obstacles).collect(),
        }
    }

    /// Sample pairwise-distinct free start cells and pairwise-distinct free
    /// goal cells; the two sets may overlap each other.
    pub fn generate_problem<R: Rng + ?Sized>(
        &self,
        num_agents: usize,
        rng: &mut R,
    ) -> Result<Problem, String> {
        let mut free_cells: Vec<(usize, usize)> = (0..self.width)
            .flat_map(|x| (0..self.height).map(move |y| (x, y)))
            .filter(|cell| !self.obstacles.contains(cell))
            .collect();
        free_cells.sort();

        if free_cells.len() < num_agents {
            return Err(format!(
                "only {} free cells for {} agents",
                free_cells.len(),
                num_agents
            ));
        }

        free_cells.shuffle(rng);
        let starts: Vec<(usize, usize)> = free_cells.iter().take(num_agents).copied().collect();

        free_cells.shuffle(rng);
        let goals: Vec<(usize, usize)> = free_cells.iter().take(num_agents).copied().collect();

        let problem = Problem {
            width: self.width,
            height: self.height,
            obstacles: self.obstacles.clone(),
            starts,
            goals,
            max_task_assignments: 1_000_000_000,
            group_size: 1_000_000_000,
        };

        info!(
            "generated scenario: {}x{} grid, {} obstacles, {} agents",
            self.width,
            self.height,
            self.obstacles.len(),
            num_agents
        );
        Ok(problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_problem_is_valid() {
        let seed = [0u8; 32];
        let mut rng = StdRng::from_seed(seed);

        let scenario = Scenario::generate(8, 8, 10, &mut rng);
        assert_eq!(scenario.obstacles.len(), 10);

        let problem = scenario.generate_problem(4, &mut rng).unwrap();
        assert_eq!(problem.validate(), Ok(()));
        assert_eq!(problem.num_agents(), 4);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let seed = [7u8; 32];
        let first = Scenario::generate(6, 6, 8, &mut StdRng::from_seed(seed))
            .generate_problem(3, &mut StdRng::from_seed(seed))
            .unwrap();
        let second = Scenario::generate(6, 6, 8, &mut StdRng::from_seed(seed))
            .generate_problem(3, &mut StdRng::from_seed(seed))
            .unwrap();

        assert_eq!(first.starts, second.starts);
        assert_eq!(first.goals, second.goals);
        assert_eq!(first.obstacles, second.obstacles);
    }

    #[test]
    fn test_too_many_agents() {
        let seed = [1u8; 32];
        let mut rng = StdRng::from_seed(seed);
        let scenario = Scenario::generate(2, 2, 2, &mut rng);
        assert!(scenario.generate_problem(3, &mut rng).is_err());
    }
}
