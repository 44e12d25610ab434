//! Error types shared by the loaders and the solver.

use thiserror::Error;

/// Errors reported by instance loading and by a solve call.
///
/// A solve either returns a complete tour or one of these; there is no
/// partial result.
#[derive(Error, Debug)]
pub enum SolverError {
    /// Zero points, malformed coordinates or an unusable distance matrix.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The DP table for this many points is larger than the configured ceiling allows.
    #[error("Capacity exceeded: {points} points requested, at most {max} supported")]
    CapacityExceeded { points: usize, max: usize },
    /// Backtracking found a state with no valid predecessor. Indicates a solver defect.
    #[error("Reconstruction failure: no predecessor for point {point} in mask {mask:#b}")]
    ReconstructionFailure { mask: usize, point: usize },
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SolverError {
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        SolverError::InvalidInput(message.into())
    }
}

pub type Result<T> = std::result::Result<T, SolverError>;
