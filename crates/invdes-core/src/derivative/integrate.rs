use num_complex::Complex64;

use crate::derivative::DerivativeError;
use crate::types::{Axis, Bound, ScalarFieldArray};

/// Trapezoid weights for `coords` clipped into `[lo, hi]`.
///
/// Samples outside the bounds collapse onto the boundary and get zero
/// measure. A single-sample axis is not integrated and has weight one.
fn trapezoid_weights(coords: &[f64], lo: f64, hi: f64) -> Vec<f64> {
    let n = coords.len();
    if n == 1 {
        return vec![1.0];
    }
    let clipped: Vec<f64> = coords.iter().map(|c| c.clamp(lo, hi)).collect();
    let mut weights = vec![0.0; n];
    for i in 0..n - 1 {
        let half = 0.5 * (clipped[i + 1] - clipped[i]);
        weights[i] += half;
        weights[i + 1] += half;
    }
    weights
}

impl ScalarFieldArray {
    /// Integrate over the part of the grid inside `bounds`.
    ///
    /// Returns one value per frequency.
    pub fn integrate_within_bounds(&self, bounds: &Bound) -> Result<Vec<Complex64>, DerivativeError> {
        let (min, max) = bounds;
        if (0..3).any(|i| !(min[i] <= max[i])) {
            return Err(DerivativeError::Configuration(format!(
                "integration bounds {bounds:?} are inverted or non-finite"
            )));
        }
        let mut weights = Vec::with_capacity(3);
        for axis in Axis::ALL {
            let coords = self.coords(axis);
            if coords.is_empty() {
                return Err(DerivativeError::Configuration(format!(
                    "field axis '{axis}' has no samples"
                )));
            }
            let i = axis.index();
            weights.push(trapezoid_weights(coords, min[i], max[i]));
        }

        let values = self.values();
        let mut out = vec![Complex64::new(0.0, 0.0); self.frequencies().len()];
        for ((i, j, k, l), v) in values.indexed_iter() {
            let w = weights[0][i] * weights[1][j] * weights[2][k];
            if w != 0.0 {
                out[l] += *v * w;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_integrates_linear_function_exactly() {
        // ∫_0^2 x dx over a y/z-flat grid = 2
        let arr = ScalarFieldArray::from_fn(
            vec![-1.0, 0.0, 1.0, 2.0, 3.0],
            vec![0.0],
            vec![0.0],
            vec![1.0, 2.0],
            |x, _, _, f| Complex64::new(x * f, 0.0),
        )
        .unwrap();
        let bounds = ([0.0, -1.0, -1.0], [2.0, 1.0, 1.0]);
        let out = arr.integrate_within_bounds(&bounds).unwrap();
        assert_eq!(out.len(), 2);
        assert_abs_diff_eq!(out[0].re, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[1].re, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clipping_between_samples() {
        // constant 1 on [0, 4], bounds [1, 3] gives length 2
        let arr = ScalarFieldArray::from_fn(
            vec![0.0, 4.0],
            vec![0.0, 1.0],
            vec![0.0],
            vec![1.0],
            |_, _, _, _| Complex64::new(1.0, 0.0),
        )
        .unwrap();
        let bounds = ([1.0, 0.0, 0.0], [3.0, 1.0, 0.0]);
        let out = arr.integrate_within_bounds(&bounds).unwrap();
        assert_abs_diff_eq!(out[0].re, 2.0, epsilon = 1e-12);
    }
}
