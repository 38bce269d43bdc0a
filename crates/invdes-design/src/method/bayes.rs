//! Bayesian optimisation with a Gaussian-process surrogate.
//!
//! The surrogate works in the unit hypercube with a Matérn-5/2 kernel on
//! standardised targets. Its length scale is the one on a fixed grid that
//! maximises the log marginal likelihood. Each proposal maximises the
//! acquisition function over seeded random candidates.

use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::random::default_seed;
use super::{evaluate_batch, numeric_bounds, Evaluator, SweepMethod};
use crate::error::DesignError;
use crate::parameter::{Arguments, Parameter};

const LENGTH_SCALES: [f64; 7] = [0.05, 0.1, 0.2, 0.35, 0.5, 1.0, 2.0];
const JITTER: f64 = 1e-6;

/// Acquisition function used to pick the next point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Acquisition {
    /// Upper confidence bound `μ + κσ`.
    #[default]
    Ucb,
    /// Expected improvement.
    Ei,
    /// Probability of improvement.
    Poi,
}

/// Bayesian optimisation: `initial_iter` random points, then `n_iter`
/// sequential proposals. Maximises the evaluation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodBayOpt {
    pub initial_iter: usize,
    pub n_iter: usize,
    #[serde(default)]
    pub acq_func: Acquisition,
    #[serde(default = "default_kappa")]
    pub kappa: f64,
    #[serde(default)]
    pub xi: f64,
    #[serde(default = "default_candidates")]
    pub num_candidates: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_kappa() -> f64 {
    2.5
}

fn default_candidates() -> usize {
    1000
}

impl MethodBayOpt {
    pub fn new(initial_iter: usize, n_iter: usize) -> Self {
        Self {
            initial_iter,
            n_iter,
            acq_func: Acquisition::default(),
            kappa: default_kappa(),
            xi: 0.0,
            num_candidates: default_candidates(),
            seed: default_seed(),
        }
    }

    pub fn with_acquisition(mut self, acq_func: Acquisition) -> Self {
        self.acq_func = acq_func;
        self
    }

    fn acquisition(&self, mean: f64, std: f64, best: f64) -> f64 {
        match self.acq_func {
            Acquisition::Ucb => mean + self.kappa * std,
            Acquisition::Ei => {
                let improvement = mean - best - self.xi;
                if std <= 1e-12 {
                    return improvement.max(0.0);
                }
                let z = improvement / std;
                improvement * normal_cdf(z) + std * normal_pdf(z)
            }
            Acquisition::Poi => {
                let improvement = mean - best - self.xi;
                if std <= 1e-12 {
                    return if improvement > 0.0 { 1.0 } else { 0.0 };
                }
                normal_cdf(improvement / std)
            }
        }
    }

    /// Candidate maximising the acquisition under `gp`.
    fn propose(&self, gp: &GaussianProcess, dims: usize, best: f64, rng: &mut StdRng) -> Vec<f64> {
        let mut chosen = random_point(dims, rng);
        let mut chosen_score = f64::NEG_INFINITY;
        for _ in 0..self.num_candidates {
            let candidate = random_point(dims, rng);
            let (mean, std) = gp.predict(&candidate);
            let score = self.acquisition(mean, std, best);
            if score > chosen_score {
                chosen_score = score;
                chosen = candidate;
            }
        }
        log::debug!("Bayesian proposal {chosen:?} (acquisition {chosen_score:.4e})");
        chosen
    }
}

impl SweepMethod for MethodBayOpt {
    fn name(&self) -> &'static str {
        "bayesian"
    }

    fn validate(&self, parameters: &[Parameter]) -> Result<(), DesignError> {
        numeric_bounds(self.name(), parameters)?;
        if self.initial_iter == 0 {
            return Err(DesignError::InvalidMethod("initial_iter must be positive".into()));
        }
        if self.n_iter > 0 && self.num_candidates == 0 {
            return Err(DesignError::InvalidMethod("num_candidates must be positive".into()));
        }
        if !(self.kappa.is_finite() && self.kappa >= 0.0 && self.xi.is_finite()) {
            return Err(DesignError::InvalidMethod("kappa and xi must be finite, kappa >= 0".into()));
        }
        Ok(())
    }

    fn run(
        &self,
        parameters: &[Parameter],
        evaluator: &mut dyn Evaluator,
    ) -> Result<Vec<(Arguments, f64)>, DesignError> {
        self.validate(parameters)?;
        let bounds = numeric_bounds(self.name(), parameters)?;
        let dims = parameters.len();
        let mut rng = StdRng::seed_from_u64(self.seed);

        // points are registered at their rounded values
        let mut xs: Vec<Vec<f64>> = Vec::new();
        let mut ys: Vec<f64> = Vec::new();

        let mut initial = Vec::with_capacity(self.initial_iter);
        for _ in 0..self.initial_iter {
            let (args, unit) = snap(parameters, &bounds, &random_point(dims, &mut rng));
            initial.push(args);
            xs.push(unit);
        }
        let mut out = evaluate_batch(evaluator, initial)?;
        ys.extend(out.iter().map(|(_, y)| *y));

        for _ in 0..self.n_iter {
            let gp = GaussianProcess::fit(&xs, &ys)?;
            let best = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let proposal = self.propose(&gp, dims, best, &mut rng);
            let (args, unit) = snap(parameters, &bounds, &proposal);

            let mut result = evaluate_batch(evaluator, vec![args])?;
            if let Some((args, y)) = result.pop() {
                xs.push(unit);
                ys.push(y);
                out.push((args, y));
            }
        }
        Ok(out)
    }
}

fn random_point(dims: usize, rng: &mut StdRng) -> Vec<f64> {
    (0..dims).map(|_| rng.gen::<f64>()).collect()
}

/// Arguments for a unit-cube point, with integer parameters rounded and
/// clamped, and the unit coordinates of the value actually used.
fn snap(parameters: &[Parameter], bounds: &[(f64, f64)], unit: &[f64]) -> (Arguments, Vec<f64>) {
    let mut args = Arguments::new();
    let mut snapped = Vec::with_capacity(unit.len());
    for ((parameter, &(lo, hi)), &u) in parameters.iter().zip(bounds).zip(unit) {
        let raw = lo + u * (hi - lo);
        let value = parameter.from_numeric(raw);
        let used = value.as_ref().and_then(|v| v.as_f64()).unwrap_or(raw);
        snapped.push(if hi > lo { (used - lo) / (hi - lo) } else { 0.0 });
        if let Some(value) = value {
            args.push(parameter.name(), value);
        }
    }
    (args, snapped)
}

fn normal_pdf(z: f64) -> f64 {
    (-0.5 * z * z).exp() / (2.0 * PI).sqrt()
}

fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Abramowitz and Stegun 7.1.26; absolute error below 1.5e-7.
fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

fn matern52(r: f64, length_scale: f64) -> f64 {
    let s = 5.0_f64.sqrt() * r / length_scale;
    (1.0 + s + s * s / 3.0) * (-s).exp()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f64>().sqrt()
}

/// Zero-mean GP on standardised targets.
struct GaussianProcess {
    xs: Vec<Vec<f64>>,
    lower: DMatrix<f64>,
    alpha: DVector<f64>,
    length_scale: f64,
    y_mean: f64,
    y_scale: f64,
}

impl GaussianProcess {
    fn fit(xs: &[Vec<f64>], ys: &[f64]) -> Result<Self, DesignError> {
        let n = ys.len();
        if n == 0 {
            return Err(DesignError::Surrogate("no observations".into()));
        }
        let y_mean = ys.iter().sum::<f64>() / n as f64;
        let var = ys.iter().map(|y| (y - y_mean).powi(2)).sum::<f64>() / n as f64;
        let y_scale = if var.sqrt() > 1e-12 { var.sqrt() } else { 1.0 };
        let y = DVector::from_iterator(n, ys.iter().map(|v| (v - y_mean) / y_scale));
        if !y.iter().all(|v| v.is_finite()) {
            return Err(DesignError::Surrogate("non-finite evaluation result".into()));
        }

        let mut best: Option<(f64, Self)> = None;
        for &length_scale in &LENGTH_SCALES {
            let k = DMatrix::from_fn(n, n, |i, j| {
                let jitter = if i == j { JITTER } else { 0.0 };
                matern52(distance(&xs[i], &xs[j]), length_scale) + jitter
            });
            let Some(chol) = k.cholesky() else { continue };
            let alpha = chol.solve(&y);
            let lower = chol.l();
            let log_det: f64 = lower.diagonal().iter().map(|d| d.ln()).sum::<f64>() * 2.0;
            let lml = -0.5 * y.dot(&alpha) - 0.5 * log_det - 0.5 * n as f64 * (2.0 * PI).ln();
            if best.as_ref().map_or(true, |(b, _)| lml > *b) {
                let gp = Self {
                    xs: xs.to_vec(),
                    lower,
                    alpha,
                    length_scale,
                    y_mean,
                    y_scale,
                };
                best = Some((lml, gp));
            }
        }
        best.map(|(_, gp)| gp)
            .ok_or_else(|| DesignError::Surrogate("kernel matrix is not positive definite".into()))
    }

    /// Posterior mean and standard deviation at `x`.
    fn predict(&self, x: &[f64]) -> (f64, f64) {
        let k = DVector::from_iterator(
            self.xs.len(),
            self.xs.iter().map(|xi| matern52(distance(xi, x), self.length_scale)),
        );
        let mean = k.dot(&self.alpha) * self.y_scale + self.y_mean;
        let var = match self.lower.solve_lower_triangular(&k) {
            Some(v) => (1.0 + JITTER - v.dot(&v)).max(0.0),
            None => 0.0,
        };
        (mean, var.sqrt() * self.y_scale)
    }
}
