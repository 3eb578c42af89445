use thiserror::Error;

use crate::core::GraphError;
use crate::matching::SolverError;

/// Fatal failures while threading the reference through a flower.
///
/// None of these are recoverable locally: each one means the graph handed to
/// the core is inconsistent, and a partially threaded reference would poison
/// every deeper level.
#[derive(Error, Debug)]
pub enum ThreadError {
    /// Inconsistent parent linkage, odd stub counts, missing events
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    /// The matching strategy could not produce a valid perfect matching
    #[error("Matching solver failed: {0}")]
    SolverFailure(#[from] SolverError),

    /// A second reference adjacency, or an end consumed twice
    #[error("Duplicate resolution: {0}")]
    DuplicateResolution(String),
}

impl ThreadError {
    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionViolation(message.into())
    }

    pub(crate) fn duplicate(message: impl Into<String>) -> Self {
        Self::DuplicateResolution(message.into())
    }
}

impl From<GraphError> for ThreadError {
    fn from(error: GraphError) -> Self {
        match error {
            GraphError::CapAlreadyAdjacent(_) => Self::DuplicateResolution(error.to_string()),
            other => Self::PreconditionViolation(other.to_string()),
        }
    }
}
