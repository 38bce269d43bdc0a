use serde::{Deserialize, Serialize};

use super::{evaluate_batch, Evaluator, SweepMethod};
use crate::error::DesignError;
use crate::parameter::{Arguments, ParamValue, Parameter};

/// Largest grid [`MethodGrid`] will enumerate.
pub const MAX_GRID_POINTS: usize = 1_000_000;

/// Every combination of the parameters' grid values, last parameter varying
/// fastest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodGrid {}

impl MethodGrid {
    /// Number of grid points, checked against [`MAX_GRID_POINTS`].
    pub fn size(&self, parameters: &[Parameter]) -> Result<usize, DesignError> {
        if parameters.is_empty() {
            return Ok(0);
        }
        let mut total = 1usize;
        for parameter in parameters {
            total = total
                .checked_mul(parameter.grid_len()?)
                .filter(|&n| n <= MAX_GRID_POINTS)
                .ok_or_else(|| {
                    DesignError::InvalidMethod(format!("grid has more than {MAX_GRID_POINTS} points"))
                })?;
        }
        Ok(total)
    }

    pub fn sample(&self, parameters: &[Parameter]) -> Result<Vec<Arguments>, DesignError> {
        let total = self.size(parameters)?;
        let axes: Vec<Vec<ParamValue>> = parameters
            .iter()
            .map(Parameter::sample_grid)
            .collect::<Result<_, _>>()?;
        if total == 0 {
            return Ok(Vec::new());
        }

        let mut out = Vec::with_capacity(total);
        let mut index = vec![0usize; axes.len()];
        for _ in 0..total {
            let mut args = Arguments::new();
            for (k, parameter) in parameters.iter().enumerate() {
                args.push(parameter.name(), axes[k][index[k]].clone());
            }
            out.push(args);

            // odometer increment
            for k in (0..axes.len()).rev() {
                index[k] += 1;
                if index[k] < axes[k].len() {
                    break;
                }
                index[k] = 0;
            }
        }
        Ok(out)
    }
}

impl SweepMethod for MethodGrid {
    fn name(&self) -> &'static str {
        "grid"
    }

    fn validate(&self, parameters: &[Parameter]) -> Result<(), DesignError> {
        self.size(parameters).map(|_| ())
    }

    fn run(
        &self,
        parameters: &[Parameter],
        evaluator: &mut dyn Evaluator,
    ) -> Result<Vec<(Arguments, f64)>, DesignError> {
        let batch = self.sample(parameters)?;
        evaluate_batch(evaluator, batch)
    }
}
