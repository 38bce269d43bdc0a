//! Samplers of the unit hypercube.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::DesignError;

/// A source of `(n, d)` samples with every value in `[0, 1]`.
pub trait UnitSampler: Send + Sync {
    fn random(&self, n: usize) -> Array2<f64>;
}

/// Latin hypercube: each of the `n` equal strata of every dimension holds
/// exactly one sample.
pub fn latin_hypercube(n: usize, d: usize, rng: &mut StdRng) -> Array2<f64> {
    let mut samples = Array2::zeros((n, d));
    let mut strata: Vec<usize> = (0..n).collect();
    for j in 0..d {
        strata.shuffle(rng);
        for (i, &stratum) in strata.iter().enumerate() {
            let jitter: f64 = rng.gen();
            samples[[i, j]] = (stratum as f64 + jitter) / n as f64;
        }
    }
    samples
}

/// Independent uniform samples.
pub fn uniform(n: usize, d: usize, rng: &mut StdRng) -> Array2<f64> {
    Array2::from_shape_simple_fn((n, d), || rng.gen())
}

/// Check that `samples` has shape `(n, d)` and lies inside the unit cube.
pub fn validate_unit_samples(samples: &Array2<f64>, n: usize, d: usize) -> Result<(), DesignError> {
    if samples.dim() != (n, d) {
        return Err(DesignError::InvalidSampler(format!(
            "expected samples of shape ({n}, {d}), got {:?}",
            samples.dim()
        )));
    }
    if let Some(bad) = samples.iter().find(|u| !(0.0..=1.0).contains(*u)) {
        return Err(DesignError::InvalidSampler(format!(
            "sample value {bad} lies outside [0, 1]"
        )));
    }
    Ok(())
}
