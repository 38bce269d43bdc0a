//! Surface meshes used for boundary sensitivities.
//!
//! Each element is a small planar patch with a centre, an area, a unit
//! outward normal and two unit tangents. The three directions form an
//! orthonormal frame per element.

use ndarray::{Array1, Array2, ArrayView1};

use crate::derivative::DerivativeError;
use crate::vector::{dot, norm};

/// Tolerance on unit length and orthogonality of the element frames.
pub const FRAME_TOLERANCE: f64 = 1e-6;

/// A single surface element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceElement {
    pub centre: [f64; 3],
    pub area: f64,
    pub normal: [f64; 3],
    pub perp1: [f64; 3],
    pub perp2: [f64; 3],
}

/// An ordered collection of surface elements stored column-wise.
///
/// `centres`, `normals`, `perps1` and `perps2` have shape `(N, 3)`;
/// `areas` has shape `(N,)`.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    pub centres: Array2<f64>,
    pub areas: Array1<f64>,
    pub normals: Array2<f64>,
    pub perps1: Array2<f64>,
    pub perps2: Array2<f64>,
}

impl SurfaceMesh {
    pub fn empty() -> Self {
        Self::from_elements(&[])
    }

    /// Pack a list of elements into column storage.
    pub fn from_elements(elements: &[SurfaceElement]) -> Self {
        let n = elements.len();
        let mut centres = Array2::zeros((n, 3));
        let mut normals = Array2::zeros((n, 3));
        let mut perps1 = Array2::zeros((n, 3));
        let mut perps2 = Array2::zeros((n, 3));
        let mut areas = Array1::zeros(n);

        for (i, el) in elements.iter().enumerate() {
            areas[i] = el.area;
            for k in 0..3 {
                centres[[i, k]] = el.centre[k];
                normals[[i, k]] = el.normal[k];
                perps1[[i, k]] = el.perp1[k];
                perps2[[i, k]] = el.perp2[k];
            }
        }

        Self {
            centres,
            areas,
            normals,
            perps1,
            perps2,
        }
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn element(&self, i: usize) -> SurfaceElement {
        let row = |a: &Array2<f64>| [a[[i, 0]], a[[i, 1]], a[[i, 2]]];
        SurfaceElement {
            centre: row(&self.centres),
            area: self.areas[i],
            normal: row(&self.normals),
            perp1: row(&self.perps1),
            perp2: row(&self.perps2),
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = SurfaceElement> + '_ {
        (0..self.len()).map(move |i| self.element(i))
    }

    pub fn total_area(&self) -> f64 {
        self.areas.sum()
    }

    /// Concatenate several meshes, preserving order.
    pub fn concat(meshes: &[SurfaceMesh]) -> SurfaceMesh {
        let all: Vec<SurfaceElement> = meshes.iter().flat_map(|m| m.elements()).collect();
        Self::from_elements(&all)
    }

    /// Check the mesh before assembly.
    ///
    /// An empty mesh or inconsistent array shapes are configuration errors;
    /// non-unit or non-orthogonal frames and negative or non-finite areas are
    /// numerical degeneracies.
    pub fn validate(&self) -> Result<(), DerivativeError> {
        let n = self.len();
        if n == 0 {
            return Err(DerivativeError::Configuration("surface mesh has no elements".into()));
        }
        for (name, arr) in [
            ("centres", &self.centres),
            ("normals", &self.normals),
            ("perps1", &self.perps1),
            ("perps2", &self.perps2),
        ] {
            if arr.dim() != (n, 3) {
                return Err(DerivativeError::Configuration(format!(
                    "surface mesh '{name}' has shape {:?}, expected ({n}, 3)",
                    arr.dim()
                )));
            }
        }

        for i in 0..n {
            let el = self.element(i);
            if !el.area.is_finite() || el.area < 0.0 {
                return Err(DerivativeError::NumericalDegeneracy {
                    element: Some(i),
                    reason: format!("invalid area {}", el.area),
                });
            }
            if el.centre.iter().any(|c| !c.is_finite()) {
                return Err(DerivativeError::NumericalDegeneracy {
                    element: Some(i),
                    reason: "non-finite centre".into(),
                });
            }
            for (name, v) in [("normal", &el.normal), ("perp1", &el.perp1), ("perp2", &el.perp2)] {
                if (norm(v) - 1.0).abs() > FRAME_TOLERANCE {
                    return Err(DerivativeError::NumericalDegeneracy {
                        element: Some(i),
                        reason: format!("{name} is not a unit vector (|v| = {:.3e})", norm(v)),
                    });
                }
            }
            let pairs = [
                (dot(&el.normal, &el.perp1), "normal·perp1"),
                (dot(&el.normal, &el.perp2), "normal·perp2"),
                (dot(&el.perp1, &el.perp2), "perp1·perp2"),
            ];
            for (d, name) in pairs {
                if d.abs() > FRAME_TOLERANCE {
                    return Err(DerivativeError::NumericalDegeneracy {
                        element: Some(i),
                        reason: format!("basis is not orthogonal ({name} = {d:.3e})"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Row `i` of the normals.
    pub fn normal(&self, i: usize) -> ArrayView1<'_, f64> {
        self.normals.row(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_element(area: f64) -> SurfaceElement {
        SurfaceElement {
            centre: [0.0, 0.0, 0.0],
            area,
            normal: [0.0, 0.0, 1.0],
            perp1: [1.0, 0.0, 0.0],
            perp2: [0.0, 1.0, 0.0],
        }
    }

    #[test]
    fn test_round_trip_elements() {
        let el = flat_element(2.5);
        let mesh = SurfaceMesh::from_elements(&[el, el]);
        assert_eq!(mesh.len(), 2);
        assert_eq!(mesh.element(1), el);
        assert!((mesh.total_area() - 5.0).abs() < 1e-12);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_empty_mesh_is_configuration_error() {
        let err = SurfaceMesh::empty().validate().unwrap_err();
        assert!(matches!(err, DerivativeError::Configuration(_)));
    }

    #[test]
    fn test_non_orthogonal_basis_is_degenerate() {
        let mut el = flat_element(1.0);
        el.perp1 = [0.0, 0.6, 0.8];
        let err = SurfaceMesh::from_elements(&[el]).validate().unwrap_err();
        assert!(matches!(
            err,
            DerivativeError::NumericalDegeneracy { element: Some(0), .. }
        ));
    }
}
