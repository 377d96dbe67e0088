mod cbsta;

pub use cbsta::CBSTA;

use thiserror::Error;

use crate::common::Solution;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error("no collision-free plan exists for any tried task assignment")]
    NoSolution,
    #[error("planning was cancelled")]
    Cancelled,
}

pub trait Solver {
    fn solve(&mut self) -> Result<Solution, SolveError>;
}
