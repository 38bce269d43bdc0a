//! # Invdes Core
//!
//! The numerical backbone of the adjoint inverse-design stack. This crate turns
//! forward and adjoint field solutions into sensitivities of a scalar
//! objective with respect to the boundaries of dielectric structures.
//!
//! ## Architecture
//!
//! Field solvers are external: they hand back [`types::VectorFieldDataset`]s
//! sampled on a (possibly staggered) structured grid. The
//! [`fields::FieldSampler`] interpolates those datasets at the centres of the
//! surface elements produced by a [`derivative::Differentiable`] geometry, and
//! the [`derivative::DerivativeContext`] assembles the discretised adjoint
//! shape derivative on top.
//!
//! ## Modules
//!
//! - [`types`]: Field datasets, bounds and field-monitor solutions.
//! - [`mesh`]: Surface meshes carrying area and an orthonormal frame per element.
//! - [`path`]: Paths naming differentiable parameters (`geometry.centre[0]`).
//! - [`vector`]: Small 3-vector helpers.
//! - [`fields`]: Off-grid interpolation of vector field datasets.
//! - [`derivative`]: Derivative context, basis projection and sensitivity assembly.

pub mod derivative;
pub mod fields;
pub mod mesh;
pub mod path;
pub mod types;
pub mod vector;

pub use derivative::{DerivativeContext, DerivativeError, DerivativeInputs, DerivativeMap, Differentiable};
pub use fields::FieldSampler;
pub use mesh::{SurfaceElement, SurfaceMesh};
pub use path::{ParamPath, PathKey};
pub use types::{Axis, Bound, FieldSolution, ScalarFieldArray, VectorFieldDataset};
