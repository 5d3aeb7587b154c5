//! Error types for the solver.

use thiserror::Error;

/// Errors surfaced to the caller of the solver.
///
/// Rejected moves are not errors: evaluators report them as `None` or
/// `false` and leave the candidate untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// The problem definition is inconsistent.
    #[error("invalid problem: {0}")]
    InvalidProblem(String),
    /// The requested capability is not implemented by this objective.
    #[error("not supported: {0}")]
    Unsupported(&'static str),
    /// Some visits cannot be served by any tour within the capacity limits.
    #[error("{} visit(s) cannot be placed within the capacity limits", unplaced.len())]
    Infeasible { unplaced: Vec<usize> },
}
