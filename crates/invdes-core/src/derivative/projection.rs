use ndarray::{Array1, ArrayView2};
use num_complex::Complex64;

use crate::derivative::DerivativeError;

/// Project sampled vector fields onto per-element basis vectors.
///
/// `fields` and `basis` both have shape `(N, 3)`; the result holds
/// `Σ_k basis[i, k] * fields[i, k]` for each row `i`.
pub fn project_in_basis(
    fields: ArrayView2<'_, Complex64>,
    basis: ArrayView2<'_, f64>,
) -> Result<Array1<Complex64>, DerivativeError> {
    if fields.dim() != basis.dim() || fields.ncols() != 3 {
        return Err(DerivativeError::ShapeMismatch(format!(
            "cannot project fields of shape {:?} onto basis of shape {:?}",
            fields.dim(),
            basis.dim()
        )));
    }
    Ok(fields
        .outer_iter()
        .zip(basis.outer_iter())
        .map(|(f, b)| f[0] * b[0] + f[1] * b[1] + f[2] * b[2])
        .collect())
}
