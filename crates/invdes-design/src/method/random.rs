//! Methods that evaluate independently sampled points.

use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::{arguments_from_unit, evaluate_batch, Evaluator, SweepMethod};
use crate::error::DesignError;
use crate::parameter::{Arguments, Parameter};
use crate::sampler::{latin_hypercube, uniform, validate_unit_samples, UnitSampler};

pub(crate) fn default_seed() -> u64 {
    1
}

fn default_true() -> bool {
    true
}

/// Latin-hypercube sampling, deterministic for a given seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodMonteCarlo {
    pub num_points: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl MethodMonteCarlo {
    pub fn new(num_points: usize) -> Self {
        Self {
            num_points,
            seed: default_seed(),
        }
    }

    pub fn sample(&self, parameters: &[Parameter]) -> Vec<Arguments> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let samples = latin_hypercube(self.num_points, parameters.len(), &mut rng);
        arguments_from_unit(parameters, &samples)
    }
}

impl SweepMethod for MethodMonteCarlo {
    fn name(&self) -> &'static str {
        "monte_carlo"
    }

    fn validate(&self, _parameters: &[Parameter]) -> Result<(), DesignError> {
        check_num_points(self.num_points)
    }

    fn run(
        &self,
        parameters: &[Parameter],
        evaluator: &mut dyn Evaluator,
    ) -> Result<Vec<(Arguments, f64)>, DesignError> {
        evaluate_batch(evaluator, self.sample(parameters))
    }
}

/// Independent uniform sampling. Less sample-efficient than
/// [`MethodMonteCarlo`], and says so unless `monte_carlo_warning` is off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodRandom {
    pub num_points: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_true")]
    pub monte_carlo_warning: bool,
}

impl MethodRandom {
    pub fn new(num_points: usize) -> Self {
        Self {
            num_points,
            seed: default_seed(),
            monte_carlo_warning: true,
        }
    }

    pub fn sample(&self, parameters: &[Parameter]) -> Vec<Arguments> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let samples = uniform(self.num_points, parameters.len(), &mut rng);
        arguments_from_unit(parameters, &samples)
    }
}

impl SweepMethod for MethodRandom {
    fn name(&self) -> &'static str {
        "random"
    }

    fn validate(&self, _parameters: &[Parameter]) -> Result<(), DesignError> {
        check_num_points(self.num_points)
    }

    fn run(
        &self,
        parameters: &[Parameter],
        evaluator: &mut dyn Evaluator,
    ) -> Result<Vec<(Arguments, f64)>, DesignError> {
        if self.monte_carlo_warning {
            log::warn!(
                "Uniform random sampling usually needs more points than Monte Carlo (Latin \
                 hypercube) sampling; consider the monte_carlo method, or set \
                 monte_carlo_warning = false to silence this warning"
            );
        }
        evaluate_batch(evaluator, self.sample(parameters))
    }
}

/// Sampling with a user-supplied [`UnitSampler`], validated before use.
pub struct MethodRandomCustom {
    pub num_points: usize,
    sampler: Box<dyn UnitSampler>,
}

impl MethodRandomCustom {
    /// Probe size used to check a sampler on construction.
    const PROBE_POINTS: usize = 30;

    pub fn new(num_points: usize, sampler: Box<dyn UnitSampler>) -> Result<Self, DesignError> {
        check_num_points(num_points)?;
        let probe = sampler.random(Self::PROBE_POINTS);
        validate_unit_samples(&probe, Self::PROBE_POINTS, probe.ncols())?;
        Ok(Self { num_points, sampler })
    }

    pub fn sample(&self, parameters: &[Parameter]) -> Result<Vec<Arguments>, DesignError> {
        let samples = self.sampler.random(self.num_points);
        validate_unit_samples(&samples, self.num_points, parameters.len())?;
        Ok(arguments_from_unit(parameters, &samples))
    }
}

impl fmt::Debug for MethodRandomCustom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRandomCustom")
            .field("num_points", &self.num_points)
            .finish_non_exhaustive()
    }
}

impl SweepMethod for MethodRandomCustom {
    fn name(&self) -> &'static str {
        "random_custom"
    }

    fn validate(&self, parameters: &[Parameter]) -> Result<(), DesignError> {
        let probe = self.sampler.random(1);
        if probe.ncols() != parameters.len() {
            return Err(DesignError::InvalidSampler(format!(
                "sampler has {} dimensions but the design space has {}",
                probe.ncols(),
                parameters.len()
            )));
        }
        Ok(())
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

fn check_num_points(num_points: usize) -> Result<(), DesignError> {
    if num_points == 0 {
        return Err(DesignError::InvalidMethod("num_points must be positive".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::{ParameterFloat, ParameterInt};
    use ndarray::Array2;

    fn params() -> Vec<Parameter> {
        vec![
            Parameter::Float(ParameterFloat::new("x", (-1.0, 1.0))),
            Parameter::Int(ParameterInt::new("n", (0, 5))),
        ]
    }

    /// Always returns the same fixed row.
    struct FixedSampler(Vec<f64>);

    impl UnitSampler for FixedSampler {
        fn random(&self, n: usize) -> Array2<f64> {
            Array2::from_shape_fn((n, self.0.len()), |(_, j)| self.0[j])
        }
    }

    #[test]
    fn test_monte_carlo_is_seeded() {
        let method = MethodMonteCarlo::new(10);
        assert_eq!(method.sample(&params()), method.sample(&params()));
        let other = MethodMonteCarlo { seed: 2, ..method.clone() };
        assert_ne!(method.sample(&params()), other.sample(&params()));
    }

    #[test]
    fn test_samples_stay_in_domain() {
        for args in MethodRandom::new(50).sample(&params()) {
            let x = args.float("x").unwrap();
            let n = args.int("n").unwrap();
            assert!((-1.0..=1.0).contains(&x));
            assert!((0..=5).contains(&n));
        }
    }

    #[test]
    fn test_custom_sampler_validated() {
        assert!(MethodRandomCustom::new(4, Box::new(FixedSampler(vec![0.5, 1.5]))).is_err());

        let method = MethodRandomCustom::new(4, Box::new(FixedSampler(vec![1.0, 0.52]))).unwrap();
        assert!(method.validate(&params()).is_ok());
        let points = method.sample(&params()).unwrap();
        assert_eq!(points.len(), 4);
        assert_eq!(points[0].float("x"), Some(1.0));
        // 0 - 0.5 + 0.52 * 6 = 2.62 -> 3
        assert_eq!(points[0].int("n"), Some(3));

        let wrong_dims = MethodRandomCustom::new(4, Box::new(FixedSampler(vec![0.5]))).unwrap();
        assert!(wrong_dims.validate(&params()).is_err());
    }
}
