//! Closed triangle meshes as differentiable geometries.
//!
//! Each triangle is split into `m²` congruent sub-triangles so that no edge
//! exceeds the requested element size. Normals follow the triangle winding
//! (counter-clockwise seen from outside).

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use invdes_core::mesh::{SurfaceElement, SurfaceMesh};
use invdes_core::vector::{cross, dot, norm, normalise, sub};
use invdes_core::{Bound, DerivativeContext, DerivativeError, DerivativeMap, Differentiable};

use crate::parsers::obj::{parse_obj, ObjMesh};
use crate::parsers::ParseError;
use crate::sensitivity::{
    boundary_derivatives, check_element_size, divisions, unknown_path, ElementBudget, ParamSlot,
};
use crate::placement::Placement;

/// A closed, outward-oriented triangle mesh with a rigid translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<[usize; 3]>,
    /// Offset applied to every vertex.
    #[serde(default)]
    pub translation: [f64; 3],
}

impl From<ObjMesh> for TriangleMesh {
    fn from(mesh: ObjMesh) -> Self {
        Self {
            vertices: mesh.vertices,
            faces: mesh.faces,
            translation: [0.0; 3],
        }
    }
}

impl TriangleMesh {
    pub fn from_obj(content: &str) -> Result<Self, ParseError> {
        Ok(parse_obj(content)?.into())
    }

    /// A copy with `placement` applied to the vertices. Mirroring placements
    /// also reverse the winding so normals stay outward.
    pub fn placed(&self, placement: &Placement) -> Result<Self, DerivativeError> {
        let (linear, offset) = placement.affine()?;
        let vertices = self
            .vertices
            .iter()
            .map(|&v| -> [f64; 3] { (linear * Vector3::from(v) + offset).into() })
            .collect();
        let faces = if linear.determinant() < 0.0 {
            self.faces.iter().map(|&[a, b, c]| [a, c, b]).collect()
        } else {
            self.faces.clone()
        };
        Ok(Self {
            vertices,
            faces,
            translation: self.translation,
        })
    }

    fn corners(&self, face: &[usize; 3]) -> [[f64; 3]; 3] {
        face.map(|i| {
            let v = self.vertices[i];
            [
                v[0] + self.translation[0],
                v[1] + self.translation[1],
                v[2] + self.translation[2],
            ]
        })
    }

    /// Enclosed volume by the divergence theorem. Negative for an
    /// inward-oriented mesh.
    pub fn signed_volume(&self) -> f64 {
        self.faces
            .iter()
            .map(|f| {
                let [a, b, c] = self.corners(f);
                dot(&a, &cross(&b, &c)) / 6.0
            })
            .sum()
    }

    pub fn surface_area(&self) -> f64 {
        self.faces
            .iter()
            .map(|f| {
                let [a, b, c] = self.corners(f);
                0.5 * norm(&cross(&sub(&b, &a), &sub(&c, &a)))
            })
            .sum()
    }
}

impl Differentiable for TriangleMesh {
    fn surface_mesh(&self, element_size: f64) -> Result<SurfaceMesh, DerivativeError> {
        check_element_size(element_size)?;
        if self.faces.is_empty() {
            return Err(DerivativeError::Configuration("triangle mesh has no faces".into()));
        }
        let mut budget = ElementBudget::default();
        let mut elements = Vec::new();

        for (fi, face) in self.faces.iter().enumerate() {
            if face.iter().any(|&i| i >= self.vertices.len()) {
                return Err(DerivativeError::Configuration(format!(
                    "triangle {fi} references a missing vertex"
                )));
            }
            let [a, b, c] = self.corners(face);
            let (ab, ac) = (sub(&b, &a), sub(&c, &a));
            let n_raw = cross(&ab, &ac);
            let degenerate = || DerivativeError::NumericalDegeneracy {
                element: Some(fi),
                reason: "triangle has zero area".into(),
            };
            let normal = normalise(&n_raw).ok_or_else(degenerate)?;
            let perp1 = normalise(&ab).ok_or_else(degenerate)?;
            let perp2 = cross(&normal, &perp1);

            let longest = norm(&ab).max(norm(&ac)).max(norm(&sub(&c, &b)));
            let m = divisions(longest, element_size)?;
            budget.take(m, m)?;
            let area = 0.5 * norm(&n_raw) / (m * m) as f64;
            let inv = 1.0 / m as f64;
            let point = |s: f64, t: f64| {
                [
                    a[0] + s * ab[0] + t * ac[0],
                    a[1] + s * ab[1] + t * ac[1],
                    a[2] + s * ab[2] + t * ac[2],
                ]
            };
            let element = |centre| SurfaceElement {
                centre,
                area,
                normal,
                perp1,
                perp2,
            };

            for i in 0..m {
                for j in 0..m - i {
                    let (fi_, fj) = (i as f64, j as f64);
                    elements.push(element(point((fi_ + 1.0 / 3.0) * inv, (fj + 1.0 / 3.0) * inv)));
                    if i + j + 1 < m {
                        elements.push(element(point((fi_ + 2.0 / 3.0) * inv, (fj + 2.0 / 3.0) * inv)));
                    }
                }
            }
        }
        Ok(SurfaceMesh::from_elements(&elements))
    }

    /// Paths: `translation[k]`.
    fn compute_derivatives(&self, ctx: &DerivativeContext) -> Result<DerivativeMap, DerivativeError> {
        let mesh = self.surface_mesh(ctx.surface_element_size()?)?;
        boundary_derivatives(&mesh, ctx, |path, el| {
            let slot = ParamSlot::parse(path)?;
            match slot.name {
                "translation" => Ok(el.normal[slot.component(path)?]),
                _ => Err(unknown_path(path)),
            }
        })
    }

    fn bounding_box(&self) -> Bound {
        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];
        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v[i] + self.translation[i]);
                max[i] = max[i].max(v[i] + self.translation[i]);
            }
        }
        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::obj::cube_obj;
    use approx::assert_relative_eq;

    #[test]
    fn test_cube_mesh_is_outward_and_closed() {
        let mesh = TriangleMesh::from_obj(&cube_obj(0.5)).unwrap();
        assert_relative_eq!(mesh.signed_volume(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(mesh.surface_area(), 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_subdivision_preserves_area_and_normals() {
        let mesh = TriangleMesh::from_obj(&cube_obj(0.5)).unwrap();
        let surface = mesh.surface_mesh(0.3).unwrap();
        surface.validate().unwrap();
        assert_relative_eq!(surface.total_area(), 6.0, epsilon = 1e-10);
        // every element's normal points away from the cube centre
        for el in surface.elements() {
            assert!(dot(&el.centre, &el.normal) > 0.0);
        }
        // longest edge sqrt(2) at size 0.3 needs m = 5 per triangle
        assert_eq!(surface.len(), 12 * 25);
    }

    #[test]
    fn test_mirror_keeps_orientation() {
        let mesh = TriangleMesh::from_obj(&cube_obj(0.5)).unwrap();
        let mirror = Placement {
            scale: Some([-1.0, 1.0, 1.0]),
            ..Placement::default()
        };
        let mirrored = mesh.placed(&mirror).unwrap();
        assert_relative_eq!(mirrored.signed_volume(), 1.0, epsilon = 1e-12);
        for el in mirrored.surface_mesh(0.5).unwrap().elements() {
            assert!(dot(&el.centre, &el.normal) > 0.0);
        }
    }

    #[test]
    fn test_placement_scales_and_moves_mesh() {
        let mesh = TriangleMesh::from_obj(&cube_obj(0.5)).unwrap();
        let placement = Placement {
            scale: Some([2.0, 1.0, 3.0]),
            rotate: Some(([1.0, 1.0, 0.0], 40.0)),
            translate: Some([0.0, 4.0, 0.0]),
        };
        let placed = mesh.placed(&placement).unwrap();
        assert_relative_eq!(placed.signed_volume(), 6.0, epsilon = 1e-10);
        let (min, max) = placed.bounding_box();
        assert_relative_eq!(0.5 * (min[1] + max[1]), 4.0, epsilon = 1e-10);
    }

    #[test]
    fn test_degenerate_triangle_is_reported() {
        let mesh = TriangleMesh {
            vertices: vec![[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            faces: vec![[0, 1, 2]],
            translation: [0.0; 3],
        };
        let err = mesh.surface_mesh(1.0).unwrap_err();
        assert!(matches!(
            err,
            DerivativeError::NumericalDegeneracy { element: Some(0), .. }
        ));
    }

    #[test]
    fn test_translation_moves_bounds() {
        let mut mesh = TriangleMesh::from_obj(&cube_obj(0.5)).unwrap();
        mesh.translation = [1.0, 0.0, -1.0];
        assert_eq!(mesh.bounding_box(), ([0.5, -0.5, -1.5], [1.5, 0.5, -0.5]));
    }
}
