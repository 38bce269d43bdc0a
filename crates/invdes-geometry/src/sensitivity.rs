//! Mapping surface sensitivities onto parameter paths.
//!
//! If a unit change of parameter `p` moves boundary point `x` by `∂x/∂p`, the
//! derivative of the objective is `Σ_i s_i (∂x_i/∂p · n_i)`, where `s_i` is
//! the element sensitivity from [`DerivativeContext::grad_surfaces`].

use invdes_core::mesh::{SurfaceElement, SurfaceMesh};
use invdes_core::{DerivativeContext, DerivativeError, DerivativeMap, ParamPath, PathKey};

/// A parameter slot such as `radius` or `centre[1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSlot<'a> {
    pub name: &'a str,
    pub index: Option<usize>,
}

impl<'a> ParamSlot<'a> {
    /// Parse a path of the form `name` or `name[i]`.
    pub fn parse(path: &'a ParamPath) -> Result<Self, DerivativeError> {
        match path.keys() {
            [PathKey::Field(name)] => Ok(Self { name, index: None }),
            [PathKey::Field(name), PathKey::Index(i)] => Ok(Self {
                name,
                index: Some(*i),
            }),
            _ => Err(unknown_path(path)),
        }
    }

    /// Component index in `0..3` for vector parameters.
    pub fn component(&self, path: &ParamPath) -> Result<usize, DerivativeError> {
        match self.index {
            Some(k) if k < 3 => Ok(k),
            _ => Err(unknown_path(path)),
        }
    }
}

pub fn unknown_path(path: &ParamPath) -> DerivativeError {
    DerivativeError::Configuration(format!("unsupported geometry parameter path '{path}'"))
}

/// Derivatives for `ctx.paths()` given the boundary mesh and the normal
/// velocity of each element under each parameter.
pub fn boundary_derivatives<F>(
    mesh: &SurfaceMesh,
    ctx: &DerivativeContext,
    normal_velocity: F,
) -> Result<DerivativeMap, DerivativeError>
where
    F: Fn(&ParamPath, &SurfaceElement) -> Result<f64, DerivativeError>,
{
    let mut out = DerivativeMap::new();
    if ctx.paths().is_empty() {
        return Ok(out);
    }

    let sensitivities = ctx.grad_surfaces(mesh)?;
    for path in ctx.paths() {
        let mut total = 0.0;
        for (el, s) in mesh.elements().zip(&sensitivities) {
            let v = normal_velocity(path, &el)?;
            total += s.re * v;
        }
        out.insert(path.clone(), total);
    }
    Ok(out)
}

/// Most elements one call to `surface_mesh` may produce.
pub const MAX_ELEMENTS: usize = 10_000_000;

fn too_many_elements() -> DerivativeError {
    DerivativeError::Configuration(format!(
        "discretisation would exceed {MAX_ELEMENTS} surface elements; increase the element size"
    ))
}

/// Number of divisions of a length, at least one.
pub fn divisions(length: f64, element_size: f64) -> Result<usize, DerivativeError> {
    let n = (length / element_size).ceil();
    if !(n <= MAX_ELEMENTS as f64) {
        return Err(too_many_elements());
    }
    Ok((n as usize).max(1))
}

/// Running element count for one discretisation, capped at [`MAX_ELEMENTS`].
#[derive(Debug, Default)]
pub struct ElementBudget {
    used: usize,
}

impl ElementBudget {
    /// Account for a block of `rows * cols` elements.
    pub fn take(&mut self, rows: usize, cols: usize) -> Result<(), DerivativeError> {
        self.used = rows
            .checked_mul(cols)
            .and_then(|n| self.used.checked_add(n))
            .filter(|&n| n <= MAX_ELEMENTS)
            .ok_or_else(too_many_elements)?;
        Ok(())
    }

    pub fn used(&self) -> usize {
        self.used
    }
}

pub fn check_element_size(element_size: f64) -> Result<(), DerivativeError> {
    if element_size.is_finite() && element_size > 0.0 {
        Ok(())
    } else {
        Err(DerivativeError::Configuration(format!(
            "surface element size must be positive, got {element_size}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divisions_rounds_up() {
        assert_eq!(divisions(1.0, 0.3).unwrap(), 4);
        assert_eq!(divisions(0.0, 0.3).unwrap(), 1);
    }

    #[test]
    fn test_element_cap() {
        assert!(divisions(1.0, 1e-12).is_err());
        assert!(divisions(f64::INFINITY, 0.1).is_err());

        let mut budget = ElementBudget::default();
        budget.take(1000, 1000).unwrap();
        budget.take(3, 3).unwrap();
        assert_eq!(budget.used(), 1_000_009);
        assert!(budget.take(MAX_ELEMENTS, 1).is_err());
        assert!(budget.take(usize::MAX, 2).is_err());
    }
}
