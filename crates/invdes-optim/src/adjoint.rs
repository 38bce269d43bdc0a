//! Objective and gradient through external forward and adjoint solves.
//!
//! The solver is a black box, so the reverse pass is written by hand: the
//! forward batch yields primal fields, the problem post-processes them into an
//! objective and the adjoint sources, the adjoint batch yields adjoint fields,
//! and each differentiable structure turns the field pair into derivatives
//! with respect to its parameter paths. [`PathBinding`]s chain those back
//! onto the optimisation parameters.

use invdes_compute::{dispatch_ordered, BatchDispatcher, TaskNamer};
use invdes_core::derivative::structure_derivatives;
use invdes_core::{Bound, DerivativeContext, DerivativeInputs, Differentiable, FieldSolution, ParamPath};
use invdes_materials::PermittivityModel;
use ndarray::Array1;

use crate::error::EvaluationError;
use crate::history::Diagnostics;
use crate::optimizer::{Evaluation, Objective};

/// What the problem makes of the forward fields.
pub struct ForwardOutcome<S> {
    /// Raw figure of merit.
    pub post_process: f64,
    pub penalty: f64,
    /// Gradient of `penalty` with respect to the parameters, if any.
    pub penalty_gradient: Option<Array1<f64>>,
    /// One adjoint simulation per forward simulation, in the same order.
    pub adjoint: Vec<S>,
}

/// One optimisation parameter's contribution to a structure path.
///
/// `d objective / d params[param_index] += scale * d objective / d path`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathBinding {
    pub path: ParamPath,
    pub param_index: usize,
    pub scale: f64,
}

impl PathBinding {
    pub fn new(path: ParamPath, param_index: usize) -> Self {
        Self {
            path,
            param_index,
            scale: 1.0,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }
}

/// A differentiable structure inside one simulation.
pub struct StructureBinding {
    /// Index of the forward/adjoint simulation pair this structure lives in.
    pub simulation: usize,
    pub geometry: Box<dyn Differentiable>,
    pub medium: Box<dyn PermittivityModel>,
    pub background: Box<dyn PermittivityModel>,
    pub sim_bounds: Bound,
    pub frequency: f64,
    pub bindings: Vec<PathBinding>,
}

/// A parameterised adjoint problem.
pub trait AdjointProblem {
    type Simulation;

    /// Forward simulations for `params`.
    fn forward(&self, params: &Array1<f64>) -> Result<Vec<Self::Simulation>, EvaluationError>;

    /// Objective pieces and adjoint simulations from the forward fields.
    fn post_process(
        &self,
        params: &Array1<f64>,
        fields: &[FieldSolution],
    ) -> Result<ForwardOutcome<Self::Simulation>, EvaluationError>;

    /// Differentiable structures at `params`.
    fn structures(&self, params: &Array1<f64>) -> Result<Vec<StructureBinding>, EvaluationError>;
}

/// [`Objective`] evaluating `post_process - penalty` and its gradient.
pub struct AdjointObjective<P, D> {
    problem: P,
    dispatcher: D,
    element_size: Option<f64>,
}

impl<P, D> AdjointObjective<P, D>
where
    P: AdjointProblem,
    D: BatchDispatcher<P::Simulation, FieldSolution>,
{
    pub fn new(problem: P, dispatcher: D) -> Self {
        Self {
            problem,
            dispatcher,
            element_size: None,
        }
    }

    /// Override the surface element size inferred from the field grid.
    pub fn with_element_size(mut self, element_size: f64) -> Self {
        self.element_size = Some(element_size);
        self
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }

    fn run_batch(
        &self,
        simulations: Vec<P::Simulation>,
        namer: &mut TaskNamer,
        suffix: &str,
        tasks: &mut Vec<String>,
    ) -> Result<Vec<FieldSolution>, EvaluationError> {
        let jobs: Vec<(String, P::Simulation)> = simulations
            .into_iter()
            .map(|sim| (namer.next_with_suffix(suffix), sim))
            .collect();
        tasks.extend(jobs.iter().map(|(name, _)| name.clone()));
        Ok(dispatch_ordered(&self.dispatcher, jobs)?)
    }

    fn structure_gradient(
        &self,
        structure: &StructureBinding,
        forward: &[FieldSolution],
        adjoint: &[FieldSolution],
        gradient: &mut Array1<f64>,
    ) -> Result<(), EvaluationError> {
        let (fwd, adj) = match (forward.get(structure.simulation), adjoint.get(structure.simulation)) {
            (Some(fwd), Some(adj)) => (fwd, adj),
            _ => {
                return Err(EvaluationError::Problem(format!(
                    "structure refers to simulation {} but only {} were run",
                    structure.simulation,
                    forward.len()
                )))
            }
        };

        let inputs = DerivativeInputs {
            paths: structure.bindings.iter().map(|b| b.path.clone()).collect(),
            e_fwd: fwd.e.clone(),
            e_adj: adj.e.clone(),
            d_fwd: fwd.d.clone(),
            d_adj: adj.d.clone(),
            eps_in: structure.medium.eps_model(structure.frequency)?,
            eps_out: structure.background.eps_model(structure.frequency)?,
            bounds: structure.geometry.bounding_box(),
            sim_bounds: structure.sim_bounds,
            frequency: structure.frequency,
            eps_approx: false,
        };
        let mut ctx = DerivativeContext::new(inputs)?;
        if let Some(size) = self.element_size {
            ctx = ctx.with_element_size(size);
        }

        let derivatives = structure_derivatives(structure.geometry.as_ref(), &ctx)?;
        let num_params = gradient.len();
        for binding in &structure.bindings {
            let value = derivatives.get(&binding.path).ok_or_else(|| {
                EvaluationError::Problem(format!("no derivative returned for '{}'", binding.path))
            })?;
            let slot = gradient.get_mut(binding.param_index).ok_or_else(|| {
                EvaluationError::Problem(format!(
                    "path '{}' bound to parameter {} of {num_params}",
                    binding.path, binding.param_index
                ))
            })?;
            *slot += binding.scale * value;
        }
        Ok(())
    }
}

impl<P, D> Objective for AdjointObjective<P, D>
where
    P: AdjointProblem,
    D: BatchDispatcher<P::Simulation, FieldSolution>,
{
    fn evaluate(&mut self, params: &Array1<f64>, namer: &mut TaskNamer) -> Result<Evaluation, EvaluationError> {
        let mut tasks = Vec::new();

        let forward_sims = self.problem.forward(params)?;
        let forward = self.run_batch(forward_sims, namer, "fwd", &mut tasks)?;

        let outcome = self.problem.post_process(params, &forward)?;
        if outcome.adjoint.len() != forward.len() {
            return Err(EvaluationError::Problem(format!(
                "{} adjoint simulations for {} forward simulations",
                outcome.adjoint.len(),
                forward.len()
            )));
        }
        let adjoint = self.run_batch(outcome.adjoint, namer, "adj", &mut tasks)?;

        let mut gradient = Array1::zeros(params.len());
        for structure in self.problem.structures(params)? {
            self.structure_gradient(&structure, &forward, &adjoint, &mut gradient)?;
        }

        if let Some(penalty_gradient) = &outcome.penalty_gradient {
            if penalty_gradient.len() != params.len() {
                return Err(EvaluationError::GradientShape {
                    expected: params.len(),
                    found: penalty_gradient.len(),
                });
            }
            gradient -= penalty_gradient;
        }

        Ok(Evaluation {
            objective: outcome.post_process - outcome.penalty,
            gradient,
            diagnostics: Diagnostics {
                penalty: outcome.penalty,
                post_process: outcome.post_process,
                tasks,
            },
        })
    }
}
