//! Core types shared across the inverse-design pipeline.
//!
//! A field solver returns, per monitor, one [`ScalarFieldArray`] for each
//! Cartesian component of a vector field. Components may live on different
//! (staggered) spatial grids but always share a single frequency axis.

use std::collections::BTreeMap;
use std::fmt;

use ndarray::{Array4, Zip};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::derivative::DerivativeError;

/// Axis-aligned bounding box as `(min_corner, max_corner)`.
pub type Bound = ([f64; 3], [f64; 3]);

/// A Cartesian direction. Also names the component of a vector field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Index of this axis in a `[f64; 3]` position.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

/// One scalar field component sampled on a structured grid.
///
/// Values are stored with shape `(nx, ny, nz, nf)`. Every coordinate axis is
/// strictly increasing.
#[derive(Debug, Clone)]
pub struct ScalarFieldArray {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
    f: Vec<f64>,
    values: Array4<Complex64>,
}

impl ScalarFieldArray {
    /// Build a field array, validating that `values` matches the coordinate
    /// lengths and that every axis is strictly increasing.
    pub fn new(
        x: Vec<f64>,
        y: Vec<f64>,
        z: Vec<f64>,
        f: Vec<f64>,
        values: Array4<Complex64>,
    ) -> Result<Self, DerivativeError> {
        let expected = (x.len(), y.len(), z.len(), f.len());
        if values.dim() != expected {
            return Err(DerivativeError::ShapeMismatch(format!(
                "values have shape {:?} but coordinates imply {:?}",
                values.dim(),
                expected
            )));
        }
        for (name, coords) in [("x", &x), ("y", &y), ("z", &z), ("f", &f)] {
            check_increasing(name, coords)?;
        }
        Ok(Self { x, y, z, f, values })
    }

    /// Sample a closure `value(x, y, z, f)` on the given grid.
    pub fn from_fn(
        x: Vec<f64>,
        y: Vec<f64>,
        z: Vec<f64>,
        f: Vec<f64>,
        value: impl Fn(f64, f64, f64, f64) -> Complex64,
    ) -> Result<Self, DerivativeError> {
        let shape = (x.len(), y.len(), z.len(), f.len());
        let values = Array4::from_shape_fn(shape, |(i, j, k, l)| value(x[i], y[j], z[k], f[l]));
        Self::new(x, y, z, f, values)
    }

    /// Coordinates along a spatial axis.
    pub fn coords(&self, axis: Axis) -> &[f64] {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.f
    }

    pub fn values(&self) -> &Array4<Complex64> {
        &self.values
    }

    /// Element-wise product with another array sampled on the same grid.
    pub fn product(&self, other: &ScalarFieldArray) -> Result<ScalarFieldArray, DerivativeError> {
        if self.x != other.x || self.y != other.y || self.z != other.z || self.f != other.f {
            return Err(DerivativeError::ShapeMismatch(
                "cannot multiply field arrays sampled on different grids".into(),
            ));
        }
        let mut values = self.values.clone();
        Zip::from(&mut values)
            .and(&other.values)
            .for_each(|a, &b| *a *= b);
        Ok(Self {
            x: self.x.clone(),
            y: self.y.clone(),
            z: self.z.clone(),
            f: self.f.clone(),
            values,
        })
    }
}

fn check_increasing(name: &str, coords: &[f64]) -> Result<(), DerivativeError> {
    if coords.iter().any(|c| !c.is_finite()) {
        return Err(DerivativeError::Configuration(format!(
            "axis '{name}' contains non-finite coordinates"
        )));
    }
    if coords.windows(2).any(|w| w[1] <= w[0]) {
        return Err(DerivativeError::Configuration(format!(
            "axis '{name}' must be strictly increasing"
        )));
    }
    Ok(())
}

/// A vector field: one [`ScalarFieldArray`] per Cartesian component.
///
/// All components share one frequency axis; their spatial grids may differ.
#[derive(Debug, Clone)]
pub struct VectorFieldDataset {
    components: BTreeMap<Axis, ScalarFieldArray>,
}

impl VectorFieldDataset {
    pub fn new(
        components: impl IntoIterator<Item = (Axis, ScalarFieldArray)>,
    ) -> Result<Self, DerivativeError> {
        let components: BTreeMap<Axis, ScalarFieldArray> = components.into_iter().collect();
        let mut iter = components.values();
        if let Some(first) = iter.next() {
            if iter.any(|c| c.frequencies() != first.frequencies()) {
                return Err(DerivativeError::Configuration(
                    "all field components must share one frequency axis".into(),
                ));
            }
        }
        Ok(Self { components })
    }

    /// Component along `axis`, or a configuration error if the solver did not
    /// record it.
    pub fn component(&self, axis: Axis) -> Result<&ScalarFieldArray, DerivativeError> {
        self.components.get(&axis).ok_or_else(|| {
            DerivativeError::Configuration(format!("missing field component along {axis}"))
        })
    }

    pub fn components(&self) -> impl Iterator<Item = (Axis, &ScalarFieldArray)> {
        self.components.iter().map(|(axis, arr)| (*axis, arr))
    }

    pub fn frequencies(&self) -> &[f64] {
        self.components
            .values()
            .next()
            .map(|c| c.frequencies())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Per-component product, e.g. forward × adjoint.
    pub fn product(&self, other: &VectorFieldDataset) -> Result<VectorFieldDataset, DerivativeError> {
        let mut components = BTreeMap::new();
        for (axis, arr) in &self.components {
            let rhs = other.component(*axis)?;
            components.insert(*axis, arr.product(rhs)?);
        }
        if other.components.len() != components.len() {
            return Err(DerivativeError::ShapeMismatch(
                "datasets carry different field components".into(),
            ));
        }
        Ok(Self { components })
    }
}

/// Electric and displacement fields recorded by one field monitor.
#[derive(Debug, Clone)]
pub struct FieldSolution {
    pub e: VectorFieldDataset,
    pub d: VectorFieldDataset,
}

/// Intersection of two bounding boxes, or `None` if they are disjoint.
pub fn intersect_bounds(a: &Bound, b: &Bound) -> Option<Bound> {
    let mut min = [0.0; 3];
    let mut max = [0.0; 3];
    for i in 0..3 {
        min[i] = a.0[i].max(b.0[i]);
        max[i] = a.1[i].min(b.1[i]);
        if min[i] > max[i] {
            return None;
        }
    }
    Some((min, max))
}

/// Whether `point` lies inside `bound`, inflated by `tol` on every side.
pub fn bound_contains(bound: &Bound, point: &[f64; 3], tol: f64) -> bool {
    (0..3).all(|i| point[i] >= bound.0[i] - tol && point[i] <= bound.1[i] + tol)
}
