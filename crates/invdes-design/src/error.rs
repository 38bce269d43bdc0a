use invdes_compute::DispatchError;
use thiserror::Error;

/// Errors from design-space exploration.
#[derive(Debug, Error)]
pub enum DesignError {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Invalid method configuration: {0}")]
    InvalidMethod(String),

    #[error("Invalid sampler: {0}")]
    InvalidSampler(String),

    #[error("{method} does not support parameter '{name}'")]
    Unsupported { method: &'static str, name: String },

    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    #[error("Batch evaluation failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Surrogate model failed: {0}")]
    Surrogate(String),

    #[error("Config error: {0}")]
    Config(String),
}
