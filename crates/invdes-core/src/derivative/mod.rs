//! Adjoint derivative context and the structure-level derivative dispatch.
//!
//! A [`DerivativeContext`] is built once per forward/adjoint pair and per
//! structure. It is never mutated; composite geometries narrow it with
//! [`DerivativeContext::updated_paths`] before delegating to a child.

pub mod assembly;
pub mod integrate;
pub mod projection;

use std::collections::BTreeMap;
use std::sync::Arc;

use num_complex::Complex64;
use thiserror::Error;

use crate::fields::FieldSampler;
use crate::mesh::SurfaceMesh;
use crate::path::{ParamPath, PathKey};
use crate::types::{bound_contains, intersect_bounds, Axis, Bound, VectorFieldDataset};

pub use assembly::{assemble_sensitivities, BoundaryFields};
pub use projection::project_in_basis;

/// Errors raised while assembling adjoint derivatives.
#[derive(Error, Debug)]
pub enum DerivativeError {
    #[error("Invalid derivative configuration: {0}")]
    Configuration(String),

    #[error("Numerical degeneracy{}: {reason}", element_suffix(.element))]
    NumericalDegeneracy {
        element: Option<usize>,
        reason: String,
    },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
}

fn element_suffix(element: &Option<usize>) -> String {
    element.map(|i| format!(" at element {i}")).unwrap_or_default()
}

/// Real part of the vector-Jacobian product, keyed by parameter path.
pub type DerivativeMap = BTreeMap<ParamPath, f64>;

/// A shape whose boundary sensitivities can be mapped onto its parameters.
pub trait Differentiable {
    /// Discretise the boundary into elements of roughly `element_size`.
    fn surface_mesh(&self, element_size: f64) -> Result<SurfaceMesh, DerivativeError>;

    /// Derivatives for every path in `ctx.paths()`, relative to this geometry.
    fn compute_derivatives(&self, ctx: &DerivativeContext) -> Result<DerivativeMap, DerivativeError>;

    /// Axis-aligned bounding box.
    fn bounding_box(&self) -> Bound;
}

/// Raw inputs for one structure's derivative evaluation.
#[derive(Debug, Clone)]
pub struct DerivativeInputs {
    pub paths: Vec<ParamPath>,
    pub e_fwd: VectorFieldDataset,
    pub e_adj: VectorFieldDataset,
    pub d_fwd: VectorFieldDataset,
    pub d_adj: VectorFieldDataset,
    pub eps_in: Complex64,
    pub eps_out: Complex64,
    /// Bounds of the structure.
    pub bounds: Bound,
    /// Bounds of the simulation domain.
    pub sim_bounds: Bound,
    pub frequency: f64,
    pub eps_approx: bool,
}

#[derive(Debug)]
struct FieldPayload {
    e_fwd: VectorFieldDataset,
    e_adj: VectorFieldDataset,
    d_fwd: VectorFieldDataset,
    d_adj: VectorFieldDataset,
    e_der_map: VectorFieldDataset,
    d_der_map: VectorFieldDataset,
}

/// Immutable bundle of fields, permittivities and bounds for one structure.
///
/// The field payload is shared between narrowed copies.
#[derive(Debug, Clone)]
pub struct DerivativeContext {
    paths: Vec<ParamPath>,
    fields: Arc<FieldPayload>,
    eps_in: Complex64,
    eps_out: Complex64,
    bounds: Bound,
    bounds_intersect: Option<Bound>,
    frequency: f64,
    eps_approx: bool,
    element_size: Option<f64>,
}

impl DerivativeContext {
    pub fn new(inputs: DerivativeInputs) -> Result<Self, DerivativeError> {
        for (name, eps) in [("eps_in", inputs.eps_in), ("eps_out", inputs.eps_out)] {
            if !eps.re.is_finite() || !eps.im.is_finite() || eps.norm() == 0.0 {
                return Err(DerivativeError::NumericalDegeneracy {
                    element: None,
                    reason: format!("{name} = {eps} is zero or non-finite"),
                });
            }
        }
        if !inputs.frequency.is_finite() || inputs.frequency <= 0.0 {
            return Err(DerivativeError::Configuration(format!(
                "frequency must be positive and finite, got {}",
                inputs.frequency
            )));
        }
        for (name, ds) in [
            ("E_fwd", &inputs.e_fwd),
            ("E_adj", &inputs.e_adj),
            ("D_fwd", &inputs.d_fwd),
            ("D_adj", &inputs.d_adj),
        ] {
            if ds.is_empty() {
                return Err(DerivativeError::Configuration(format!(
                    "{name} has no field components"
                )));
            }
        }

        let e_der_map = inputs.e_fwd.product(&inputs.e_adj)?;
        let d_der_map = inputs.d_fwd.product(&inputs.d_adj)?;
        let bounds_intersect = intersect_bounds(&inputs.bounds, &inputs.sim_bounds);
        if bounds_intersect.is_none() {
            log::warn!("structure lies entirely outside the simulation domain; its derivatives are zero");
        }

        Ok(Self {
            paths: inputs.paths,
            fields: Arc::new(FieldPayload {
                e_fwd: inputs.e_fwd,
                e_adj: inputs.e_adj,
                d_fwd: inputs.d_fwd,
                d_adj: inputs.d_adj,
                e_der_map,
                d_der_map,
            }),
            eps_in: inputs.eps_in,
            eps_out: inputs.eps_out,
            bounds: inputs.bounds,
            bounds_intersect,
            frequency: inputs.frequency,
            eps_approx: inputs.eps_approx,
            element_size: None,
        })
    }

    pub fn paths(&self) -> &[ParamPath] {
        &self.paths
    }

    pub fn eps_in(&self) -> Complex64 {
        self.eps_in
    }

    pub fn eps_out(&self) -> Complex64 {
        self.eps_out
    }

    pub fn bounds(&self) -> &Bound {
        &self.bounds
    }

    pub fn bounds_intersect(&self) -> Option<&Bound> {
        self.bounds_intersect.as_ref()
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn eps_approx(&self) -> bool {
        self.eps_approx
    }

    pub fn e_fwd(&self) -> &VectorFieldDataset {
        &self.fields.e_fwd
    }

    pub fn e_adj(&self) -> &VectorFieldDataset {
        &self.fields.e_adj
    }

    pub fn d_fwd(&self) -> &VectorFieldDataset {
        &self.fields.d_fwd
    }

    pub fn d_adj(&self) -> &VectorFieldDataset {
        &self.fields.d_adj
    }

    /// Forward × adjoint electric field, per component.
    pub fn e_der_map(&self) -> &VectorFieldDataset {
        &self.fields.e_der_map
    }

    /// Forward × adjoint displacement field, per component.
    pub fn d_der_map(&self) -> &VectorFieldDataset {
        &self.fields.d_der_map
    }

    /// `eps_in - eps_out`
    pub fn delta_eps(&self) -> Complex64 {
        self.eps_in - self.eps_out
    }

    /// `1/eps_in - 1/eps_out`
    pub fn delta_eps_inv(&self) -> Complex64 {
        self.eps_in.inv() - self.eps_out.inv()
    }

    /// Copy of this context restricted to `paths`. Fields are shared.
    pub fn updated_paths(&self, paths: Vec<ParamPath>) -> Self {
        Self {
            paths,
            ..self.clone()
        }
    }

    /// Copy flagged to use the structure and background permittivities
    /// directly, as composite geometries do for their children.
    pub fn with_eps_approx(&self, eps_approx: bool) -> Self {
        Self {
            eps_approx,
            ..self.clone()
        }
    }

    /// Copy with an explicit surface element size.
    pub fn with_element_size(&self, element_size: f64) -> Self {
        Self {
            element_size: Some(element_size),
            ..self.clone()
        }
    }

    /// Element size for surface meshes.
    ///
    /// Defaults to the smallest coordinate step found in the forward E
    /// dataset.
    pub fn surface_element_size(&self) -> Result<f64, DerivativeError> {
        if let Some(size) = self.element_size {
            if !(size.is_finite() && size > 0.0) {
                return Err(DerivativeError::Configuration(format!(
                    "surface element size must be positive, got {size}"
                )));
            }
            return Ok(size);
        }

        let mut smallest = f64::INFINITY;
        for (_, component) in self.fields.e_fwd.components() {
            for axis in Axis::ALL {
                for w in component.coords(axis).windows(2) {
                    smallest = smallest.min(w[1] - w[0]);
                }
            }
        }
        if smallest.is_finite() {
            Ok(smallest)
        } else {
            Err(DerivativeError::Configuration(
                "cannot infer a surface element size from single-sample field data; set one explicitly".into(),
            ))
        }
    }

    /// Per-element boundary sensitivities for `mesh`.
    ///
    /// Elements whose centres fall outside the part of the structure inside
    /// the simulation domain contribute zero.
    pub fn grad_surfaces(&self, mesh: &SurfaceMesh) -> Result<Vec<Complex64>, DerivativeError> {
        mesh.validate()?;

        let centres = mesh.centres.view();
        let fields = BoundaryFields {
            e_fwd: FieldSampler::new(&self.fields.e_fwd).sample(centres)?,
            e_adj: FieldSampler::new(&self.fields.e_adj).sample(centres)?,
            d_fwd: FieldSampler::new(&self.fields.d_fwd).sample(centres)?,
            d_adj: FieldSampler::new(&self.fields.d_adj).sample(centres)?,
        };
        if self.eps_approx {
            log::debug!(
                "assembling with approximate permittivities eps_in={}, eps_out={}",
                self.eps_in,
                self.eps_out
            );
        }

        let mut sensitivities =
            assemble_sensitivities(mesh, &fields, self.delta_eps(), self.delta_eps_inv())?;

        let Some(clip) = self.bounds_intersect else {
            return Ok(vec![Complex64::new(0.0, 0.0); mesh.len()]);
        };
        let tol = bounds_tolerance(&clip);
        for (i, s) in sensitivities.iter_mut().enumerate() {
            let c = [mesh.centres[[i, 0]], mesh.centres[[i, 1]], mesh.centres[[i, 2]]];
            if !bound_contains(&clip, &c, tol) {
                *s = Complex64::new(0.0, 0.0);
            }
        }
        Ok(sensitivities)
    }

    /// Derivative with respect to a uniform interior permittivity: the
    /// forward × adjoint E product integrated over the structure's part of
    /// the domain, summed over components and frequencies.
    pub fn grad_volume(&self) -> Result<Complex64, DerivativeError> {
        let Some(clip) = self.bounds_intersect else {
            return Ok(Complex64::new(0.0, 0.0));
        };
        let mut total = Complex64::new(0.0, 0.0);
        for (_, component) in self.fields.e_der_map.components() {
            total += component.integrate_within_bounds(&clip)?.iter().sum::<Complex64>();
        }
        Ok(total)
    }
}

fn bounds_tolerance(bound: &Bound) -> f64 {
    let scale = bound
        .0
        .iter()
        .chain(bound.1.iter())
        .fold(1.0_f64, |acc, v| acc.max(v.abs()));
    1e-9 * scale
}

/// Path prefix for geometry parameters of a structure.
pub const GEOMETRY_KEY: &str = "geometry";
/// Path prefix for medium parameters of a structure.
pub const MEDIUM_KEY: &str = "medium";
/// Field name of the interior permittivity under [`MEDIUM_KEY`].
pub const PERMITTIVITY_KEY: &str = "permittivity";

/// Derivatives of a structure (geometry + uniform medium) for every path in
/// `ctx.paths()`.
///
/// Paths under `geometry` are stripped of that prefix and delegated to the
/// geometry; `medium.permittivity` is the volume derivative.
pub fn structure_derivatives(
    geometry: &dyn Differentiable,
    ctx: &DerivativeContext,
) -> Result<DerivativeMap, DerivativeError> {
    let mut geometry_paths = Vec::new();
    let mut out = DerivativeMap::new();

    for path in ctx.paths() {
        match path.split_first() {
            Some((PathKey::Field(head), rest)) if head == GEOMETRY_KEY => geometry_paths.push(rest),
            Some((PathKey::Field(head), rest))
                if head == MEDIUM_KEY && rest.head_field() == Some(PERMITTIVITY_KEY) && rest.len() == 1 =>
            {
                out.insert(path.clone(), ctx.grad_volume()?.re);
            }
            _ => {
                return Err(DerivativeError::Configuration(format!(
                    "unsupported structure parameter path '{path}'"
                )))
            }
        }
    }

    if !geometry_paths.is_empty() {
        let prefix = ParamPath::field(GEOMETRY_KEY);
        let child = ctx.updated_paths(geometry_paths);
        for (path, value) in geometry.compute_derivatives(&child)? {
            out.insert(path.prefixed(&prefix), value);
        }
    }
    Ok(out)
}
