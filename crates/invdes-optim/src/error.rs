use invdes_compute::DispatchError;
use invdes_core::DerivativeError;
use invdes_materials::MaterialError;
use thiserror::Error;

use crate::history::OptimizationHistory;

/// Failure of one objective-and-gradient evaluation.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Remote evaluation failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Derivative computation failed: {0}")]
    Derivative(#[from] DerivativeError),

    #[error("Material evaluation failed: {0}")]
    Material(#[from] MaterialError),

    #[error("Gradient has {found} entries but there are {expected} parameters")]
    GradientShape { expected: usize, found: usize },

    #[error("{0}")]
    Problem(String),
}

/// Errors raised by the optimisation loop.
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// The objective failed at `step`. `history` holds every step recorded
    /// before the failure and can be passed to a resumed run.
    #[error("Evaluation failed at step {step}: {source}")]
    Evaluation {
        step: usize,
        source: EvaluationError,
        history: Box<OptimizationHistory>,
    },

    /// The update from the last record could not be computed, typically
    /// because a resumed history was written by another rule. `history` is
    /// returned untouched.
    #[error("Cannot compute step {step}: {reason}")]
    Update {
        step: usize,
        reason: Box<OptimizeError>,
        history: Box<OptimizationHistory>,
    },

    #[error("Invalid optimiser state: {0}")]
    InvalidState(String),

    #[error("Invalid optimiser configuration: {0}")]
    Config(String),
}

/// Checkpoint read or write failure.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checkpoint encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}
