//! # Invdes Optim
//!
//! Gradient-based optimisation on top of the adjoint derivatives of
//! `invdes-core`.
//!
//! ## Modules
//!
//! - [`transform`]: Pure update rules (Adam, SGD, momentum).
//! - [`history`]: Append-only history of evaluated steps and JSON checkpoints.
//! - [`optimizer`]: The resumable evaluate → transform → record loop.
//! - [`adjoint`]: Objective and gradient through external forward/adjoint solves.
//! - [`config`]: TOML configuration.
//!
//! A run is resumed from any recorded history, complete or partial, without
//! re-evaluating earlier steps:
//!
//! ```no_run
//! # use invdes_optim::{Optimizer, OptimizationHistory, Sgd};
//! # fn objective(p: &ndarray::Array1<f64>, _: &mut invdes_compute::TaskNamer)
//! #     -> Result<invdes_optim::Evaluation, invdes_optim::EvaluationError> {
//! #     Ok(invdes_optim::Evaluation::new(-p.dot(p), -2.0 * p))
//! # }
//! let optimizer = Optimizer::new(Sgd { learning_rate: 0.1 }, 10);
//! let history = OptimizationHistory::load(std::path::Path::new("history.json")).unwrap();
//! let history = optimizer.continue_run(&mut objective, history, 5).unwrap();
//! ```

pub mod adjoint;
pub mod config;
pub mod direction;
pub mod error;
pub mod history;
pub mod optimizer;
pub mod transform;

pub use adjoint::{AdjointObjective, AdjointProblem, ForwardOutcome, PathBinding, StructureBinding};
pub use config::{load_config, OptimizerConfig, RuleConfig};
pub use direction::Direction;
pub use error::{EvaluationError, OptimizeError, PersistenceError};
pub use history::{Diagnostics, OptimizationHistory, StepRecord};
pub use optimizer::{Evaluation, LoopPhase, Objective, Optimizer, OptimizerLoop};
pub use transform::{Adam, GradientTransform, Momentum, Sgd, TransformState};
