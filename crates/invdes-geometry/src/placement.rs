//! Positioning imported meshes in the simulation frame.
//!
//! Vertices are scaled about the origin, rotated about the origin and then
//! shifted. A placement with an odd number of negative scale factors mirrors
//! the mesh, so [`TriangleMesh::placed`](crate::TriangleMesh::placed) swaps
//! the winding to keep normals outward.

use nalgebra::{Matrix3, Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};

use invdes_core::DerivativeError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    /// Per-axis scale factors.
    pub scale: Option<[f64; 3]>,
    /// Rotation axis and right-handed angle in degrees.
    pub rotate: Option<([f64; 3], f64)>,
    pub translate: Option<[f64; 3]>,
}

impl Placement {
    pub fn is_identity(&self) -> bool {
        self.scale.is_none() && self.rotate.is_none() && self.translate.is_none()
    }

    /// Linear part and offset of the placement.
    pub(crate) fn affine(&self) -> Result<(Matrix3<f64>, Vector3<f64>), DerivativeError> {
        let bad = |reason: String| DerivativeError::Configuration(format!("invalid mesh placement: {reason}"));

        let mut linear = Matrix3::identity();
        if let Some(factors) = self.scale {
            if factors.iter().any(|f| !f.is_finite() || *f == 0.0) {
                return Err(bad(format!("scale factors {factors:?} must be finite and non-zero")));
            }
            linear = Matrix3::from_diagonal(&Vector3::from(factors));
        }
        if let Some((axis, degrees)) = self.rotate {
            let axis = Vector3::from(axis);
            if !(axis.norm() > 0.0) || !degrees.is_finite() {
                return Err(bad(format!("cannot rotate {degrees} degrees about {axis:?}")));
            }
            let rotation = Rotation3::from_axis_angle(&Unit::new_normalize(axis), degrees.to_radians());
            linear = rotation.matrix() * linear;
        }
        let offset = Vector3::from(self.translate.unwrap_or([0.0; 3]));
        if offset.iter().any(|x| !x.is_finite()) {
            return Err(bad(format!("translation {offset:?} must be finite")));
        }
        Ok((linear, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn place(placement: &Placement, p: [f64; 3]) -> [f64; 3] {
        let (linear, offset) = placement.affine().unwrap();
        (linear * Vector3::from(p) + offset).into()
    }

    #[test]
    fn test_scale_rotate_translate_order() {
        let placement = Placement {
            scale: Some([2.0, 1.0, 1.0]),
            rotate: Some(([0.0, 0.0, 1.0], 90.0)),
            translate: Some([0.0, 0.0, 5.0]),
        };
        let p = place(&placement, [1.0, 0.0, 0.0]);
        assert_abs_diff_eq!(p[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p[1], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p[2], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_placements_rejected() {
        let flat = Placement {
            scale: Some([1.0, 0.0, 1.0]),
            ..Placement::default()
        };
        assert!(flat.affine().is_err());
        let no_axis = Placement {
            rotate: Some(([0.0; 3], 30.0)),
            ..Placement::default()
        };
        assert!(no_axis.affine().is_err());
        assert!(Placement::default().is_identity());
    }

    #[test]
    fn test_deserialise_partial() {
        let placement: Placement = serde_json::from_str(r#"{"translate": [1.0, 2.0, 3.0]}"#).unwrap();
        assert_eq!(placement.translate, Some([1.0, 2.0, 3.0]));
        assert!(placement.scale.is_none());
    }
}
