//! Sampling methods. Each implements [`SweepMethod`]; [`Method`] is the
//! configurable tagged union over all of them.

pub mod bayes;
pub mod genetic;
pub mod grid;
pub mod random;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::DesignError;
use crate::parameter::{Arguments, Parameter};

pub use bayes::{Acquisition, MethodBayOpt};
pub use genetic::MethodGenAlg;
pub use grid::MethodGrid;
pub use random::{MethodMonteCarlo, MethodRandom, MethodRandomCustom};

/// Evaluates batches of argument sets. Results come back in the order the
/// arguments were given, whether evaluated locally or dispatched remotely.
pub trait Evaluator {
    fn evaluate(&mut self, batch: &[Arguments]) -> Result<Vec<f64>, DesignError>;
}

/// One strategy for exploring a design space.
pub trait SweepMethod {
    fn name(&self) -> &'static str;

    /// Check that this method can explore `parameters`.
    fn validate(&self, _parameters: &[Parameter]) -> Result<(), DesignError> {
        Ok(())
    }

    /// Evaluate points of the design space, returned in evaluation order.
    /// Any evaluation failure aborts the whole sweep.
    fn run(
        &self,
        parameters: &[Parameter],
        evaluator: &mut dyn Evaluator,
    ) -> Result<Vec<(Arguments, f64)>, DesignError>;
}

/// Any supported sampling method.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Method {
    Grid(MethodGrid),
    MonteCarlo(MethodMonteCarlo),
    Random(MethodRandom),
    /// Holds a sampler object and so cannot be read from configuration.
    #[serde(skip)]
    RandomCustom(MethodRandomCustom),
    Bayesian(MethodBayOpt),
    Genetic(MethodGenAlg),
}

impl Method {
    fn inner(&self) -> &dyn SweepMethod {
        match self {
            Method::Grid(m) => m,
            Method::MonteCarlo(m) => m,
            Method::Random(m) => m,
            Method::RandomCustom(m) => m,
            Method::Bayesian(m) => m,
            Method::Genetic(m) => m,
        }
    }
}

impl SweepMethod for Method {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn validate(&self, parameters: &[Parameter]) -> Result<(), DesignError> {
        self.inner().validate(parameters)
    }

    fn run(
        &self,
        parameters: &[Parameter],
        evaluator: &mut dyn Evaluator,
    ) -> Result<Vec<(Arguments, f64)>, DesignError> {
        self.inner().run(parameters, evaluator)
    }
}

/// Evaluate `batch` and pair every argument set with its result.
pub(crate) fn evaluate_batch(
    evaluator: &mut dyn Evaluator,
    batch: Vec<Arguments>,
) -> Result<Vec<(Arguments, f64)>, DesignError> {
    let values = evaluator.evaluate(&batch)?;
    if values.len() != batch.len() {
        return Err(DesignError::Evaluation(format!(
            "{} results for {} argument sets",
            values.len(),
            batch.len()
        )));
    }
    Ok(batch.into_iter().zip(values).collect())
}

/// Map each row of unit samples through the parameters.
pub(crate) fn arguments_from_unit(parameters: &[Parameter], samples: &Array2<f64>) -> Vec<Arguments> {
    samples
        .rows()
        .into_iter()
        .map(|row| {
            let mut args = Arguments::new();
            for (parameter, &u) in parameters.iter().zip(row.iter()) {
                args.push(parameter.name(), parameter.select_from_01(u));
            }
            args
        })
        .collect()
}

/// Bounds of every parameter, or [`DesignError::Unsupported`] for a
/// non-numeric one.
pub(crate) fn numeric_bounds(
    method: &'static str,
    parameters: &[Parameter],
) -> Result<Vec<(f64, f64)>, DesignError> {
    parameters
        .iter()
        .map(|p| {
            p.bounds().ok_or_else(|| DesignError::Unsupported {
                method,
                name: p.name().to_string(),
            })
        })
        .collect()
}
