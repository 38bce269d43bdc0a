//! Off-grid interpolation of vector field datasets.
//!
//! Each spatial axis is handled independently. An axis with one sample is
//! constant along that direction; an axis with several samples is linearly
//! interpolated, and queries outside the sampled range take the boundary
//! value. The frequency axis is summed after the spatial interpolation.

use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;

use crate::derivative::DerivativeError;
use crate::types::{Axis, ScalarFieldArray, VectorFieldDataset};

/// Interpolation stencil along one axis: up to two `(index, weight)` pairs.
#[derive(Debug, Clone, Copy)]
struct AxisStencil {
    lo: usize,
    hi: usize,
    w_hi: f64,
}

impl AxisStencil {
    fn pairs(self) -> [(usize, f64); 2] {
        [(self.lo, 1.0 - self.w_hi), (self.hi, self.w_hi)]
    }
}

/// Clamp-to-boundary linear stencil for `q` on `coords`.
fn axis_stencil(axis: &str, coords: &[f64], q: f64) -> Result<AxisStencil, DerivativeError> {
    if coords.is_empty() {
        return Err(DerivativeError::Configuration(format!(
            "field axis '{axis}' has no samples"
        )));
    }
    if !q.is_finite() {
        return Err(DerivativeError::Configuration(format!(
            "non-finite query coordinate along '{axis}'"
        )));
    }
    let n = coords.len();
    if n == 1 || q <= coords[0] {
        return Ok(AxisStencil { lo: 0, hi: 0, w_hi: 0.0 });
    }
    if q >= coords[n - 1] {
        return Ok(AxisStencil { lo: n - 1, hi: n - 1, w_hi: 0.0 });
    }

    // first index with coords[i] > q; 1 <= hi <= n-1 here
    let hi = coords.partition_point(|&c| c <= q);
    let lo = hi - 1;
    let w_hi = (q - coords[lo]) / (coords[hi] - coords[lo]);
    Ok(AxisStencil { lo, hi, w_hi })
}

/// Interpolate one scalar component at `point`, summed over frequency.
pub fn sample_scalar(array: &ScalarFieldArray, point: [f64; 3]) -> Result<Complex64, DerivativeError> {
    let sx = axis_stencil("x", array.coords(Axis::X), point[0])?;
    let sy = axis_stencil("y", array.coords(Axis::Y), point[1])?;
    let sz = axis_stencil("z", array.coords(Axis::Z), point[2])?;
    if array.frequencies().is_empty() {
        return Err(DerivativeError::Configuration(
            "field axis 'f' has no samples".into(),
        ));
    }

    let values = array.values();
    let nf = array.frequencies().len();
    let mut total = Complex64::new(0.0, 0.0);
    for (i, wx) in sx.pairs() {
        if wx == 0.0 {
            continue;
        }
        for (j, wy) in sy.pairs() {
            if wy == 0.0 {
                continue;
            }
            for (k, wz) in sz.pairs() {
                if wz == 0.0 {
                    continue;
                }
                let w = wx * wy * wz;
                for l in 0..nf {
                    total += values[[i, j, k, l]] * w;
                }
            }
        }
    }
    Ok(total)
}

/// Interpolates every component of a [`VectorFieldDataset`] at query points.
#[derive(Debug, Clone, Copy)]
pub struct FieldSampler<'a> {
    dataset: &'a VectorFieldDataset,
}

impl<'a> FieldSampler<'a> {
    pub fn new(dataset: &'a VectorFieldDataset) -> Self {
        Self { dataset }
    }

    /// Sample the x, y and z components at each row of `points` (shape `(N, 3)`).
    ///
    /// Returns an `(N, 3)` array of frequency-summed complex values. All three
    /// components must be present.
    pub fn sample(&self, points: ArrayView2<'_, f64>) -> Result<Array2<Complex64>, DerivativeError> {
        if points.ncols() != 3 {
            return Err(DerivativeError::ShapeMismatch(format!(
                "query points must have shape (N, 3), got {:?}",
                points.dim()
            )));
        }
        let n = points.nrows();
        let mut out = Array2::zeros((n, 3));
        for axis in Axis::ALL {
            let component = self.dataset.component(axis)?;
            for (i, row) in points.outer_iter().enumerate() {
                out[[i, axis.index()]] = sample_scalar(component, [row[0], row[1], row[2]])?;
            }
        }
        Ok(out)
    }
}
