//! Discretised adjoint shape derivative.
//!
//! For element `i` with area `dA`, normal `n` and tangents `t1`, `t2`:
//!
//! ```text
//! s_i = dA * ( -Δ(1/ε) (D_fwd·n)(D_adj·n)
//!              + Δε [ (E_fwd·t1)(E_adj·t1) + (E_fwd·t2)(E_adj·t2) ] )
//! ```
//!
//! with `Δε = ε_in - ε_out` and `Δ(1/ε) = 1/ε_in - 1/ε_out`. The normal
//! component of D and the tangential components of E are the ones continuous
//! across the interface, so these are the only pairings used.

use ndarray::Array2;
use num_complex::Complex64;

use crate::derivative::{project_in_basis, DerivativeError};
use crate::mesh::SurfaceMesh;

/// Forward and adjoint fields sampled at the element centres, each `(N, 3)`.
#[derive(Debug, Clone)]
pub struct BoundaryFields {
    pub e_fwd: Array2<Complex64>,
    pub e_adj: Array2<Complex64>,
    pub d_fwd: Array2<Complex64>,
    pub d_adj: Array2<Complex64>,
}

/// Per-element sensitivities for `mesh` given the sampled boundary fields.
pub fn assemble_sensitivities(
    mesh: &SurfaceMesh,
    fields: &BoundaryFields,
    delta_eps: Complex64,
    delta_eps_inv: Complex64,
) -> Result<Vec<Complex64>, DerivativeError> {
    let normals = mesh.normals.view();
    let perps1 = mesh.perps1.view();
    let perps2 = mesh.perps2.view();

    let d_fwd_norm = project_in_basis(fields.d_fwd.view(), normals)?;
    let d_adj_norm = project_in_basis(fields.d_adj.view(), normals)?;
    let e_fwd_perp1 = project_in_basis(fields.e_fwd.view(), perps1)?;
    let e_adj_perp1 = project_in_basis(fields.e_adj.view(), perps1)?;
    let e_fwd_perp2 = project_in_basis(fields.e_fwd.view(), perps2)?;
    let e_adj_perp2 = project_in_basis(fields.e_adj.view(), perps2)?;

    let out = (0..mesh.len())
        .map(|i| {
            let d_norm = d_fwd_norm[i] * d_adj_norm[i];
            let e_tan = e_fwd_perp1[i] * e_adj_perp1[i] + e_fwd_perp2[i] * e_adj_perp2[i];
            (-delta_eps_inv * d_norm + delta_eps * e_tan) * mesh.areas[i]
        })
        .collect();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::SurfaceElement;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    fn unit_z_mesh() -> SurfaceMesh {
        SurfaceMesh::from_elements(&[SurfaceElement {
            centre: [0.0, 0.0, 0.0],
            area: 1.0,
            normal: [0.0, 0.0, 1.0],
            perp1: [1.0, 0.0, 0.0],
            perp2: [0.0, 1.0, 0.0],
        }])
    }

    #[test]
    fn test_normal_displacement_term() {
        let d = array![[c(0.0), c(0.0), c(2.0)]];
        let zero = Array2::zeros((1, 3));
        let fields = BoundaryFields {
            e_fwd: zero.clone(),
            e_adj: zero,
            d_fwd: d.clone(),
            d_adj: d,
        };
        let (eps_in, eps_out) = (c(4.0), c(1.0));
        let s = assemble_sensitivities(
            &unit_z_mesh(),
            &fields,
            eps_in - eps_out,
            eps_in.inv() - eps_out.inv(),
        )
        .unwrap();
        assert_abs_diff_eq!(s[0].re, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s[0].im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tangential_electric_term() {
        // only E_x and E_y pair with the tangents; E_z is normal and ignored
        let e = array![[c(1.0), c(2.0), c(10.0)]];
        let zero = Array2::zeros((1, 3));
        let fields = BoundaryFields {
            e_fwd: e.clone(),
            e_adj: e,
            d_fwd: zero.clone(),
            d_adj: zero,
        };
        let s = assemble_sensitivities(&unit_z_mesh(), &fields, c(3.0), c(-0.75)).unwrap();
        assert_abs_diff_eq!(s[0].re, 3.0 * (1.0 + 4.0), epsilon = 1e-12);
    }

    #[test]
    fn test_equal_permittivity_gives_zero() {
        let e = array![[c(1.0), c(1.0), c(1.0)]];
        let fields = BoundaryFields {
            e_fwd: e.clone(),
            e_adj: e.clone(),
            d_fwd: e.clone(),
            d_adj: e,
        };
        let s = assemble_sensitivities(&unit_z_mesh(), &fields, c(0.0), c(0.0)).unwrap();
        assert_eq!(s[0], c(0.0));
    }
}
