//! Composite geometries and the serialisable [`Geometry`] enum.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use invdes_core::mesh::SurfaceMesh;
use invdes_core::{Bound, DerivativeContext, DerivativeError, DerivativeMap, Differentiable, ParamPath, PathKey};

use crate::primitives::{Cuboid, Cylinder, Sphere};
use crate::triangle_mesh::TriangleMesh;

/// Any differentiable geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Cuboid(Cuboid),
    Sphere(Sphere),
    Cylinder(Cylinder),
    TriangleMesh(TriangleMesh),
    Group(GeometryGroup),
}

impl Geometry {
    fn inner(&self) -> &dyn Differentiable {
        match self {
            Geometry::Cuboid(g) => g,
            Geometry::Sphere(g) => g,
            Geometry::Cylinder(g) => g,
            Geometry::TriangleMesh(g) => g,
            Geometry::Group(g) => g,
        }
    }
}

impl Differentiable for Geometry {
    fn surface_mesh(&self, element_size: f64) -> Result<SurfaceMesh, DerivativeError> {
        self.inner().surface_mesh(element_size)
    }

    fn compute_derivatives(&self, ctx: &DerivativeContext) -> Result<DerivativeMap, DerivativeError> {
        self.inner().compute_derivatives(ctx)
    }

    fn bounding_box(&self) -> Bound {
        self.inner().bounding_box()
    }
}

/// A union of non-overlapping geometries sharing one medium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryGroup {
    pub geometries: Vec<Geometry>,
}

impl GeometryGroup {
    const KEY: &'static str = "geometries";

    pub fn new(geometries: Vec<Geometry>) -> Self {
        Self { geometries }
    }

    /// Group `geometries[i].<rest>` paths by child index.
    fn child_paths(&self, paths: &[ParamPath]) -> Result<BTreeMap<usize, Vec<ParamPath>>, DerivativeError> {
        let mut grouped: BTreeMap<usize, Vec<ParamPath>> = BTreeMap::new();
        for path in paths {
            let keys = path.keys();
            let index = match keys {
                [PathKey::Field(name), PathKey::Index(i), ..] if name == Self::KEY => *i,
                _ => {
                    return Err(DerivativeError::Configuration(format!(
                        "unsupported geometry group path '{path}'"
                    )))
                }
            };
            if index >= self.geometries.len() {
                return Err(DerivativeError::Configuration(format!(
                    "path '{path}' refers to geometry {index} but the group has {}",
                    self.geometries.len()
                )));
            }
            let rest = path
                .split_first()
                .and_then(|(_, rest)| rest.split_first().map(|(_, rest)| rest))
                .unwrap_or_default();
            grouped.entry(index).or_default().push(rest);
        }
        Ok(grouped)
    }
}

impl Differentiable for GeometryGroup {
    fn surface_mesh(&self, element_size: f64) -> Result<SurfaceMesh, DerivativeError> {
        let meshes = self
            .geometries
            .iter()
            .map(|g| g.surface_mesh(element_size))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SurfaceMesh::concat(&meshes))
    }

    /// Paths: `geometries[i].<child path>`. Each child is evaluated with a
    /// context narrowed to its own paths.
    fn compute_derivatives(&self, ctx: &DerivativeContext) -> Result<DerivativeMap, DerivativeError> {
        let mut out = DerivativeMap::new();
        for (index, paths) in self.child_paths(ctx.paths())? {
            log::debug!("delegating {} path(s) to geometry {index}", paths.len());
            let prefix = ParamPath::field(Self::KEY).with_index(index);
            let child_ctx = ctx.updated_paths(paths).with_eps_approx(true);
            for (path, value) in self.geometries[index].compute_derivatives(&child_ctx)? {
                out.insert(path.prefixed(&prefix), value);
            }
        }
        Ok(out)
    }

    fn bounding_box(&self) -> Bound {
        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];
        for g in &self.geometries {
            let (lo, hi) = g.bounding_box();
            for i in 0..3 {
                min[i] = min[i].min(lo[i]);
                max[i] = max[i].max(hi[i]);
            }
        }
        (min, max)
    }
}
