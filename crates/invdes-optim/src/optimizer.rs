//! The resumable optimisation loop.
//!
//! A run moves through [`LoopPhase::Initialized`] (history seeded, nothing
//! evaluated yet), [`LoopPhase::Running`] (step `k` recorded) and finally
//! [`LoopPhase::Completed`]. Each transition evaluates the objective at the
//! next point, appends a [`StepRecord`], writes an optional checkpoint and
//! calls the progress callback.

use std::path::PathBuf;

use invdes_compute::TaskNamer;
use ndarray::Array1;

use crate::direction::Direction;
use crate::error::{EvaluationError, OptimizeError};
use crate::history::{Diagnostics, OptimizationHistory, StepRecord};
use crate::transform::GradientTransform;

/// Result of evaluating the objective at one parameter vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub objective: f64,
    pub gradient: Array1<f64>,
    pub diagnostics: Diagnostics,
}

impl Evaluation {
    /// An evaluation with no penalty.
    pub fn new(objective: f64, gradient: Array1<f64>) -> Self {
        Self {
            objective,
            gradient,
            diagnostics: Diagnostics {
                post_process: objective,
                ..Diagnostics::default()
            },
        }
    }
}

/// Objective value and gradient at a parameter vector.
///
/// Evaluations may block on batches of solver jobs; `namer` issues the names
/// for those jobs and is owned by the run.
pub trait Objective {
    fn evaluate(&mut self, params: &Array1<f64>, namer: &mut TaskNamer) -> Result<Evaluation, EvaluationError>;
}

impl<F> Objective for F
where
    F: FnMut(&Array1<f64>, &mut TaskNamer) -> Result<Evaluation, EvaluationError>,
{
    fn evaluate(&mut self, params: &Array1<f64>, namer: &mut TaskNamer) -> Result<Evaluation, EvaluationError> {
        self(params, namer)
    }
}

/// Where a run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// Seeded and ready to evaluate the next step.
    Initialized,
    /// Step `step` has been recorded and more remain.
    Running { step: usize },
    Completed,
}

/// Run settings plus the installed update rule.
pub struct Optimizer {
    transform: Box<dyn GradientTransform>,
    num_steps: usize,
    direction: Direction,
    history_path: Option<PathBuf>,
    task_prefix: String,
}

impl Optimizer {
    pub fn new(transform: impl GradientTransform + 'static, num_steps: usize) -> Self {
        Self::from_boxed(Box::new(transform), num_steps)
    }

    pub fn from_boxed(transform: Box<dyn GradientTransform>, num_steps: usize) -> Self {
        Self {
            transform,
            num_steps,
            direction: Direction::default(),
            history_path: None,
            task_prefix: "invdes".into(),
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Write a checkpoint to `path` after every step.
    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = Some(path.into());
        self
    }

    pub fn with_task_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.task_prefix = prefix.into();
        self
    }

    pub fn transform(&self) -> &dyn GradientTransform {
        self.transform.as_ref()
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Seed a fresh run at `initial_params`.
    pub fn start(&self, initial_params: Array1<f64>) -> OptimizerLoop<'_> {
        let state = self.transform.init(initial_params.len());
        let history = OptimizationHistory::new(initial_params, state);
        OptimizerLoop::new(self, history, self.num_steps)
    }

    /// Seed a run from an earlier, possibly partial, history and take
    /// `num_steps` further steps.
    pub fn resume(&self, history: OptimizationHistory, num_steps: usize) -> OptimizerLoop<'_> {
        let target = history.len() + num_steps;
        OptimizerLoop::new(self, history, target)
    }

    /// Run `num_steps` steps from `initial_params`.
    pub fn run(
        &self,
        objective: &mut dyn Objective,
        initial_params: Array1<f64>,
    ) -> Result<OptimizationHistory, OptimizeError> {
        self.start(initial_params).run_to_completion(objective, &mut |_| {})
    }

    pub fn run_with_callback(
        &self,
        objective: &mut dyn Objective,
        initial_params: Array1<f64>,
        callback: &mut dyn FnMut(&OptimizationHistory),
    ) -> Result<OptimizationHistory, OptimizeError> {
        self.start(initial_params).run_to_completion(objective, callback)
    }

    /// Continue `history` for `num_steps` more steps.
    pub fn continue_run(
        &self,
        objective: &mut dyn Objective,
        history: OptimizationHistory,
        num_steps: usize,
    ) -> Result<OptimizationHistory, OptimizeError> {
        self.resume(history, num_steps)
            .run_to_completion(objective, &mut |_| {})
    }
}

/// One run in progress. Owns its history and task namer.
pub struct OptimizerLoop<'a> {
    optimizer: &'a Optimizer,
    history: OptimizationHistory,
    namer: TaskNamer,
    target: usize,
    phase: LoopPhase,
}

impl<'a> OptimizerLoop<'a> {
    fn new(optimizer: &'a Optimizer, history: OptimizationHistory, target: usize) -> Self {
        let namer = TaskNamer::with_counter(optimizer.task_prefix.clone(), history.tasks_issued());
        let phase = if history.len() >= target {
            LoopPhase::Completed
        } else {
            LoopPhase::Initialized
        };
        Self {
            optimizer,
            history,
            namer,
            target,
            phase,
        }
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn history(&self) -> &OptimizationHistory {
        &self.history
    }

    pub fn into_history(self) -> OptimizationHistory {
        self.history
    }

    /// Evaluate and record the next step.
    ///
    /// On failure the step is not recorded and the error carries the history
    /// so far, including any task names the failed evaluation consumed. Does nothing once the run is complete.
    pub fn step(mut self, objective: &mut dyn Objective) -> Result<Self, OptimizeError> {
        if self.phase == LoopPhase::Completed {
            return Ok(self);
        }
        let step = self.history.len();
        let optimizer = self.optimizer;
        let (params, state) = match self.history.next_point(optimizer.transform(), optimizer.direction) {
            Ok(point) => point,
            Err(reason) => {
                return Err(OptimizeError::Update {
                    step,
                    reason: Box::new(reason),
                    history: Box::new(self.history),
                })
            }
        };

        let evaluation = match evaluate_checked(objective, &params, &mut self.namer) {
            Ok(evaluation) => evaluation,
            Err(source) => {
                // names handed out before the failure stay reserved
                self.history.note_tasks_issued(self.namer.issued());
                return Err(OptimizeError::Evaluation {
                    step,
                    source,
                    history: Box::new(self.history),
                })
            }
        };

        log::info!(
            "step {step}: objective = {:.6e}, |grad| = {:.3e}, penalty = {:.3e}, post-process = {:.6e}",
            evaluation.objective,
            norm(&evaluation.gradient),
            evaluation.diagnostics.penalty,
            evaluation.diagnostics.post_process,
        );

        let record = StepRecord {
            step,
            params,
            objective: evaluation.objective,
            gradient: evaluation.gradient,
            state,
            diagnostics: evaluation.diagnostics,
        };
        self.history.push(record, self.namer.issued());

        if let Some(path) = &optimizer.history_path {
            if let Err(e) = self.history.save(path) {
                log::error!("Failed to write checkpoint {}: {e}", path.display());
            }
        }

        self.phase = if self.history.len() >= self.target {
            LoopPhase::Completed
        } else {
            LoopPhase::Running { step }
        };
        Ok(self)
    }

    /// Step until complete, calling `callback` with the history after each
    /// recorded step.
    pub fn run_to_completion(
        mut self,
        objective: &mut dyn Objective,
        callback: &mut dyn FnMut(&OptimizationHistory),
    ) -> Result<OptimizationHistory, OptimizeError> {
        while self.phase != LoopPhase::Completed {
            self = self.step(objective)?;
            callback(&self.history);
        }
        Ok(self.history)
    }
}

fn evaluate_checked(
    objective: &mut dyn Objective,
    params: &Array1<f64>,
    namer: &mut TaskNamer,
) -> Result<Evaluation, EvaluationError> {
    let evaluation = objective.evaluate(params, namer)?;
    if evaluation.gradient.len() != params.len() {
        return Err(EvaluationError::GradientShape {
            expected: params.len(),
            found: evaluation.gradient.len(),
        });
    }
    Ok(evaluation)
}

fn norm(v: &Array1<f64>) -> f64 {
    v.dot(v).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Sgd;
    use ndarray::array;

    fn quadratic(params: &Array1<f64>, _: &mut TaskNamer) -> Result<Evaluation, EvaluationError> {
        // maximum at x = 1
        let x = params[0];
        Ok(Evaluation::new(-(x - 1.0) * (x - 1.0), array![-2.0 * (x - 1.0)]))
    }

    #[test]
    fn test_phases() {
        let optimizer = Optimizer::new(Sgd { learning_rate: 0.25 }, 2);
        let mut objective = quadratic;
        let run = optimizer.start(array![0.0]);
        assert_eq!(run.phase(), LoopPhase::Initialized);
        let run = run.step(&mut objective).unwrap();
        assert_eq!(run.phase(), LoopPhase::Running { step: 0 });
        let run = run.step(&mut objective).unwrap();
        assert_eq!(run.phase(), LoopPhase::Completed);
        assert_eq!(run.history().len(), 2);
        // x0 = 0, g = 2, x1 = 0.5
        assert_eq!(run.history().records()[1].params, array![0.5]);
    }

    #[test]
    fn test_zero_steps_is_complete() {
        let optimizer = Optimizer::new(Sgd { learning_rate: 0.1 }, 0);
        let history = optimizer.run(&mut quadratic, array![0.0]).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_gradient_shape_checked() {
        let optimizer = Optimizer::new(Sgd { learning_rate: 0.1 }, 3);
        let mut bad = |_: &Array1<f64>, _: &mut TaskNamer| {
            Ok::<_, EvaluationError>(Evaluation::new(0.0, array![1.0, 2.0]))
        };
        let err = optimizer.run(&mut bad, array![0.0]).unwrap_err();
        assert!(matches!(
            err,
            OptimizeError::Evaluation {
                step: 0,
                source: EvaluationError::GradientShape { expected: 1, found: 2 },
                ..
            }
        ));
    }
}
