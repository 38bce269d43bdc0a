//! Integration tests for the adjoint boundary sensitivity.
//!
//! - Closed-form element sensitivity for a pure normal-D interface
//! - Single-sample field axes behave as constants
//! - Planar interface: assembled sensitivity matches a finite difference of
//!   the interface objective
//! - Dielectric slab in a parallel-plate capacitor: moving the slab face
//!   changes the capacitance as the closed form predicts, for fields normal
//!   and tangential to the face
//! - Structure-level dispatch of geometry and medium paths

use approx::{assert_abs_diff_eq, assert_relative_eq};
use num_complex::Complex64;

use invdes_core::derivative::structure_derivatives;
use invdes_core::mesh::{SurfaceElement, SurfaceMesh};
use invdes_core::types::{Axis, Bound, ScalarFieldArray, VectorFieldDataset};
use invdes_core::{DerivativeContext, DerivativeError, DerivativeInputs, DerivativeMap, Differentiable, ParamPath};

// ─────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────

const SIM_BOUNDS: Bound = ([-10.0, -10.0, -10.0], [10.0, 10.0, 10.0]);

/// A dataset whose components are constant, each on a single-sample grid.
fn constant_dataset(value: [f64; 3]) -> VectorFieldDataset {
    VectorFieldDataset::new(Axis::ALL.map(|axis| {
        let v = value[axis.index()];
        let arr = ScalarFieldArray::from_fn(vec![0.0], vec![0.0], vec![0.0], vec![1.0], move |_, _, _, _| {
            Complex64::new(v, 0.0)
        })
        .unwrap();
        (axis, arr)
    }))
    .unwrap()
}

type FieldFn = fn(f64, f64, f64) -> [Complex64; 3];

/// Sample an analytic vector field on a coarse grid. Linear fields are
/// reproduced exactly by the interpolator.
fn sampled_dataset(field: FieldFn) -> VectorFieldDataset {
    let grid = vec![-1.0, 0.0, 1.0, 2.0];
    VectorFieldDataset::new(Axis::ALL.map(|axis| {
        let arr = ScalarFieldArray::from_fn(grid.clone(), grid.clone(), grid.clone(), vec![1.0], |x, y, z, _| {
            field(x, y, z)[axis.index()]
        })
        .unwrap();
        (axis, arr)
    }))
    .unwrap()
}

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn e_fwd(x: f64, y: f64, z: f64) -> [Complex64; 3] {
    [c(1.0 + x, 0.2 * z), c(2.0 - y, 0.0), c(0.5 + z, -0.1 * x)]
}
fn e_adj(x: f64, y: f64, z: f64) -> [Complex64; 3] {
    [c(0.5 - 0.3 * z, 0.0), c(1.0 + x + y, 0.1), c(z, 0.0)]
}
fn d_fwd(x: f64, y: f64, z: f64) -> [Complex64; 3] {
    [c(x, 0.0), c(y, 0.0), c(3.0 + x - 0.5 * z, 0.2)]
}
fn d_adj(x: f64, y: f64, z: f64) -> [Complex64; 3] {
    [c(0.0, 0.0), c(1.0, 0.0), c(1.5 - y + z, -0.3 * y)]
}

fn unit_element(centre: [f64; 3]) -> SurfaceElement {
    SurfaceElement {
        centre,
        area: 1.0,
        normal: [0.0, 0.0, 1.0],
        perp1: [1.0, 0.0, 0.0],
        perp2: [0.0, 1.0, 0.0],
    }
}

// ─────────────────────────────────────────────────────────────
// Closed-form cases
// ─────────────────────────────────────────────────────────────

#[test]
fn test_normal_displacement_sensitivity_is_three() {
    let d = constant_dataset([0.0, 0.0, 2.0]);
    let e = constant_dataset([0.0, 0.0, 0.0]);
    let ctx = DerivativeContext::new(DerivativeInputs {
        paths: vec![],
        e_fwd: e.clone(),
        e_adj: e,
        d_fwd: d.clone(),
        d_adj: d,
        eps_in: c(4.0, 0.0),
        eps_out: c(1.0, 0.0),
        bounds: ([-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]),
        sim_bounds: SIM_BOUNDS,
        frequency: 1.0,
        eps_approx: false,
    })
    .unwrap();

    assert_relative_eq!(ctx.delta_eps().re, 3.0);
    assert_relative_eq!(ctx.delta_eps_inv().re, -0.75);

    let mesh = SurfaceMesh::from_elements(&[unit_element([0.0, 0.0, 0.0])]);
    let s = ctx.grad_surfaces(&mesh).unwrap();
    assert_eq!(s.len(), 1);
    assert_abs_diff_eq!(s[0].re, 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(s[0].im, 0.0, epsilon = 1e-12);
}

#[test]
fn test_single_sample_axis_is_constant_everywhere() {
    let d = constant_dataset([0.0, 0.0, 2.0]);
    let e = constant_dataset([0.0, 0.0, 0.0]);
    let ctx = DerivativeContext::new(DerivativeInputs {
        paths: vec![],
        e_fwd: e.clone(),
        e_adj: e,
        d_fwd: d.clone(),
        d_adj: d,
        eps_in: c(4.0, 0.0),
        eps_out: c(1.0, 0.0),
        bounds: SIM_BOUNDS,
        sim_bounds: SIM_BOUNDS,
        frequency: 1.0,
        eps_approx: false,
    })
    .unwrap();

    // far from the single sample at the origin
    let mesh = SurfaceMesh::from_elements(&[unit_element([7.5, -3.0, 9.0]), unit_element([-9.0, 0.1, 0.0])]);
    let s = ctx.grad_surfaces(&mesh).unwrap();
    for v in s {
        assert_abs_diff_eq!(v.re, 3.0, epsilon = 1e-12);
    }
}

#[test]
fn test_degenerate_permittivity_is_rejected() {
    let e = constant_dataset([1.0, 0.0, 0.0]);
    let err = DerivativeContext::new(DerivativeInputs {
        paths: vec![],
        e_fwd: e.clone(),
        e_adj: e.clone(),
        d_fwd: e.clone(),
        d_adj: e,
        eps_in: c(0.0, 0.0),
        eps_out: c(1.0, 0.0),
        bounds: SIM_BOUNDS,
        sim_bounds: SIM_BOUNDS,
        frequency: 1.0,
        eps_approx: false,
    })
    .unwrap_err();
    assert!(matches!(err, DerivativeError::NumericalDegeneracy { element: None, .. }));
}

// ─────────────────────────────────────────────────────────────
// Finite-difference validation on a planar interface
// ─────────────────────────────────────────────────────────────

fn linear_context(bounds: Bound) -> DerivativeContext {
    DerivativeContext::new(linear_inputs(bounds)).unwrap()
}

/// Boundary integrand for an interface with normal +z.
fn interface_density(ctx: &DerivativeContext, x: f64, y: f64, z: f64) -> Complex64 {
    let (ef, ea, df, da) = (e_fwd(x, y, z), e_adj(x, y, z), d_fwd(x, y, z), d_adj(x, y, z));
    -ctx.delta_eps_inv() * df[2] * da[2] + ctx.delta_eps() * (ef[0] * ea[0] + ef[1] * ea[1])
}

/// Interface objective `J(h) = ∫_0^1 ∫_0^1 ∫_0^h w dz dy dx`, integrated
/// exactly with 3-point Gauss–Legendre in each direction.
fn interface_objective(ctx: &DerivativeContext, h: f64) -> Complex64 {
    let s = (0.6_f64).sqrt();
    let nodes = [-s, 0.0, s];
    let weights = [5.0 / 9.0, 8.0 / 9.0, 5.0 / 9.0];
    let mut total = c(0.0, 0.0);
    for (a, wa) in nodes.iter().zip(weights) {
        for (b, wb) in nodes.iter().zip(weights) {
            for (g, wg) in nodes.iter().zip(weights) {
                let x = 0.5 * (a + 1.0);
                let y = 0.5 * (b + 1.0);
                let z = 0.5 * h * (g + 1.0);
                total += interface_density(ctx, x, y, z) * (wa * wb * wg * 0.5 * 0.5 * 0.5 * h);
            }
        }
    }
    total
}

fn top_face_mesh(h: f64, n: usize) -> SurfaceMesh {
    let step = 1.0 / n as f64;
    let mut elements = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            let mut el = unit_element([(i as f64 + 0.5) * step, (j as f64 + 0.5) * step, h]);
            el.area = step * step;
            elements.push(el);
        }
    }
    SurfaceMesh::from_elements(&elements)
}

#[test]
fn test_planar_interface_matches_finite_difference() {
    let h = 0.5;
    let ctx = linear_context(([0.0, 0.0, 0.0], [1.0, 1.0, h]));

    let delta = 1e-4;
    let fd = (interface_objective(&ctx, h + delta) - interface_objective(&ctx, h - delta)) / (2.0 * delta);

    let mut previous_error = f64::INFINITY;
    for n in [4, 10, 20] {
        let total: Complex64 = ctx.grad_surfaces(&top_face_mesh(h, n)).unwrap().iter().sum();
        let error = (total - fd).norm() / fd.norm();
        assert!(error <= previous_error + 1e-12, "error grew at n = {n}: {error}");
        previous_error = error;
    }
    assert!(previous_error < 1e-2, "relative error {previous_error}");
}

#[test]
fn test_elements_outside_domain_contribute_nothing() {
    let ctx = DerivativeContext::new(DerivativeInputs {
        sim_bounds: ([-10.0, -10.0, -10.0], [0.5, 10.0, 10.0]),
        ..linear_inputs(([0.0, 0.0, 0.0], [1.0, 1.0, 0.5]))
    })
    .unwrap();
    let mesh = SurfaceMesh::from_elements(&[unit_element([0.25, 0.5, 0.5]), unit_element([0.75, 0.5, 0.5])]);
    let s = ctx.grad_surfaces(&mesh).unwrap();
    assert!(s[0].norm() > 0.0);
    assert_eq!(s[1], c(0.0, 0.0));
}

/// Context for a unit-area slab of height `h` with uniform fields.
fn uniform_context(e: [f64; 3], d: [f64; 3], eps_in: f64, eps_out: f64, h: f64) -> DerivativeContext {
    DerivativeContext::new(DerivativeInputs {
        paths: vec![],
        e_fwd: constant_dataset(e),
        e_adj: constant_dataset(e),
        d_fwd: constant_dataset(d),
        d_adj: constant_dataset(d),
        eps_in: c(eps_in, 0.0),
        eps_out: c(eps_out, 0.0),
        bounds: ([0.0, 0.0, 0.0], [1.0, 1.0, h]),
        sim_bounds: SIM_BOUNDS,
        frequency: 1.0,
        eps_approx: false,
    })
    .unwrap()
}

fn central_difference(f: impl Fn(f64) -> f64, x: f64) -> f64 {
    let delta = 1e-5;
    (f(x + delta) - f(x - delta)) / (2.0 * delta)
}

#[test]
fn test_capacitor_slab_matches_closed_form() {
    // unit plates, unit gap, slab filling 0 <= z <= h, unit voltage
    let (eps_in, eps_out, h) = (4.0, 1.0, 0.5);

    // plates normal to z: layers in series, D continuous across the face
    let capacitance_series = |h: f64| 1.0 / (h / eps_in + (1.0 - h) / eps_out);
    let d0 = capacitance_series(h);
    let ctx = uniform_context([0.0, 0.0, d0 / eps_out], [0.0, 0.0, d0], eps_in, eps_out, h);
    let total: Complex64 = ctx.grad_surfaces(&top_face_mesh(h, 4)).unwrap().iter().sum();
    assert_relative_eq!(total.re, central_difference(capacitance_series, h), max_relative = 1e-6);
    assert_relative_eq!(total.re, 1.92, max_relative = 1e-12);

    // plates normal to x: layers in parallel, E tangential and continuous
    let capacitance_parallel = |h: f64| eps_in * h + eps_out * (1.0 - h);
    let ctx = uniform_context([1.0, 0.0, 0.0], [eps_out, 0.0, 0.0], eps_in, eps_out, h);
    let total: Complex64 = ctx.grad_surfaces(&top_face_mesh(h, 4)).unwrap().iter().sum();
    assert_relative_eq!(total.re, central_difference(capacitance_parallel, h), max_relative = 1e-6);
    assert_relative_eq!(total.re, 3.0, max_relative = 1e-12);
}

fn linear_inputs(bounds: Bound) -> DerivativeInputs {
    DerivativeInputs {
        paths: vec![],
        e_fwd: sampled_dataset(e_fwd),
        e_adj: sampled_dataset(e_adj),
        d_fwd: sampled_dataset(d_fwd),
        d_adj: sampled_dataset(d_adj),
        eps_in: c(2.25, 0.1),
        eps_out: c(1.0, 0.0),
        bounds,
        sim_bounds: SIM_BOUNDS,
        frequency: 1.0,
        eps_approx: false,
    }
}

// ─────────────────────────────────────────────────────────────
// Structure dispatch
// ─────────────────────────────────────────────────────────────

/// A unit square at height `h`, parameterised by that height.
struct Slab {
    h: f64,
}

impl Differentiable for Slab {
    fn surface_mesh(&self, element_size: f64) -> Result<SurfaceMesh, DerivativeError> {
        Ok(top_face_mesh(self.h, (1.0 / element_size).ceil() as usize))
    }

    fn compute_derivatives(&self, ctx: &DerivativeContext) -> Result<DerivativeMap, DerivativeError> {
        let mesh = self.surface_mesh(ctx.surface_element_size()?)?;
        let total: Complex64 = ctx.grad_surfaces(&mesh)?.iter().sum();
        Ok(ctx.paths().iter().map(|p| (p.clone(), total.re)).collect())
    }

    fn bounding_box(&self) -> Bound {
        ([0.0, 0.0, 0.0], [1.0, 1.0, self.h])
    }
}

#[test]
fn test_structure_dispatch_prefixes_geometry_paths() {
    let slab = Slab { h: 0.5 };
    let paths: Vec<ParamPath> = vec!["geometry.h".parse().unwrap(), "medium.permittivity".parse().unwrap()];
    let ctx = DerivativeContext::new(DerivativeInputs {
        paths,
        ..linear_inputs(slab.bounding_box())
    })
    .unwrap()
    .with_element_size(0.05);

    let grads = structure_derivatives(&slab, &ctx).unwrap();
    assert_eq!(grads.len(), 2);
    assert!(grads.contains_key(&"geometry.h".parse::<ParamPath>().unwrap()));

    let volume = ctx.grad_volume().unwrap();
    assert_relative_eq!(grads[&"medium.permittivity".parse::<ParamPath>().unwrap()], volume.re);
}

#[test]
fn test_structure_dispatch_rejects_unknown_paths() {
    let slab = Slab { h: 0.5 };
    let ctx = DerivativeContext::new(DerivativeInputs {
        paths: vec!["medium.conductivity".parse().unwrap()],
        ..linear_inputs(slab.bounding_box())
    })
    .unwrap();
    let err = structure_derivatives(&slab, &ctx).unwrap_err();
    assert!(matches!(err, DerivativeError::Configuration(_)));
}
