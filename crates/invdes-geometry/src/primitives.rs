//! Parametric primitives with analytic surface meshes.
//!
//! Each primitive tiles its boundary into surface elements carrying an
//! outward normal and a right-handed tangent frame, and knows how its
//! boundary moves under each of its parameters.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use invdes_core::mesh::{SurfaceElement, SurfaceMesh};
use invdes_core::vector::scale;
use invdes_core::{Axis, Bound, DerivativeContext, DerivativeError, DerivativeMap, Differentiable};

use crate::sensitivity::{
    boundary_derivatives, check_element_size, divisions, unknown_path, ElementBudget, ParamSlot,
};

fn unit(axis: usize) -> [f64; 3] {
    let mut v = [0.0; 3];
    v[axis] = 1.0;
    v
}

fn combine(a: &[f64; 3], wa: f64, b: &[f64; 3], wb: f64) -> [f64; 3] {
    [
        wa * a[0] + wb * b[0],
        wa * a[1] + wb * b[1],
        wa * a[2] + wb * b[2],
    ]
}

/// An axis-aligned box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cuboid {
    /// Centre position.
    pub centre: [f64; 3],
    /// Full side lengths along x, y, z.
    pub size: [f64; 3],
}

impl Cuboid {
    pub fn new(centre: [f64; 3], size: [f64; 3]) -> Self {
        Self { centre, size }
    }
}

impl Differentiable for Cuboid {
    /// Each face is tiled into rectangles no larger than `element_size`.
    fn surface_mesh(&self, element_size: f64) -> Result<SurfaceMesh, DerivativeError> {
        check_element_size(element_size)?;
        let mut budget = ElementBudget::default();
        let mut elements = Vec::new();

        for k in 0..3 {
            let u = (k + 1) % 3;
            let v = (k + 2) % 3;
            let nu = divisions(self.size[u], element_size)?;
            let nv = divisions(self.size[v], element_size)?;
            budget.take(nu, 2 * nv)?;
            let du = self.size[u] / nu as f64;
            let dv = self.size[v] / nv as f64;

            for sign in [1.0, -1.0] {
                let mut normal = [0.0; 3];
                normal[k] = sign;
                // e_u × e_v = e_k, swapped on the negative face
                let (perp1, perp2) = if sign > 0.0 {
                    (unit(u), unit(v))
                } else {
                    (unit(v), unit(u))
                };
                for i in 0..nu {
                    for j in 0..nv {
                        let mut centre = self.centre;
                        centre[k] += sign * 0.5 * self.size[k];
                        centre[u] += -0.5 * self.size[u] + (i as f64 + 0.5) * du;
                        centre[v] += -0.5 * self.size[v] + (j as f64 + 0.5) * dv;
                        elements.push(SurfaceElement {
                            centre,
                            area: du * dv,
                            normal,
                            perp1,
                            perp2,
                        });
                    }
                }
            }
        }
        Ok(SurfaceMesh::from_elements(&elements))
    }

    /// Paths: `centre[k]`, `size[k]`.
    fn compute_derivatives(&self, ctx: &DerivativeContext) -> Result<DerivativeMap, DerivativeError> {
        let mesh = self.surface_mesh(ctx.surface_element_size()?)?;
        boundary_derivatives(&mesh, ctx, |path, el| {
            let slot = ParamSlot::parse(path)?;
            let k = slot.component(path)?;
            match slot.name {
                "centre" => Ok(el.normal[k]),
                // the two faces normal to k each move by half the change in size
                "size" => Ok(0.5 * el.normal[k].abs()),
                _ => Err(unknown_path(path)),
            }
        })
    }

    fn bounding_box(&self) -> Bound {
        let mut min = [0.0; 3];
        let mut max = [0.0; 3];
        for i in 0..3 {
            min[i] = self.centre[i] - 0.5 * self.size[i];
            max[i] = self.centre[i] + 0.5 * self.size[i];
        }
        (min, max)
    }
}

/// A sphere defined by its centre and radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub centre: [f64; 3],
    pub radius: f64,
}

impl Sphere {
    pub fn new(centre: [f64; 3], radius: f64) -> Self {
        Self { centre, radius }
    }
}

impl Differentiable for Sphere {
    /// Latitude/longitude patches with exact spherical areas.
    fn surface_mesh(&self, element_size: f64) -> Result<SurfaceMesh, DerivativeError> {
        check_element_size(element_size)?;
        if !(self.radius > 0.0) {
            return Err(DerivativeError::Configuration(format!(
                "sphere radius must be positive, got {}",
                self.radius
            )));
        }
        let r = self.radius;
        let n_theta = divisions(PI * r, element_size)?.max(2);
        let n_phi = divisions(2.0 * PI * r, element_size)?.max(3);
        ElementBudget::default().take(n_theta, n_phi)?;
        let d_theta = PI / n_theta as f64;
        let d_phi = 2.0 * PI / n_phi as f64;

        let mut elements = Vec::with_capacity(n_theta * n_phi);
        for i in 0..n_theta {
            let (t0, t1) = (i as f64 * d_theta, (i + 1) as f64 * d_theta);
            let theta = 0.5 * (t0 + t1);
            let area = r * r * (t0.cos() - t1.cos()) * d_phi;
            let (st, ct) = theta.sin_cos();
            for j in 0..n_phi {
                let phi = (j as f64 + 0.5) * d_phi;
                let (sp, cp) = phi.sin_cos();
                let normal = [st * cp, st * sp, ct];
                elements.push(SurfaceElement {
                    centre: combine(&self.centre, 1.0, &normal, r),
                    area,
                    normal,
                    perp1: [ct * cp, ct * sp, -st],
                    perp2: [-sp, cp, 0.0],
                });
            }
        }
        Ok(SurfaceMesh::from_elements(&elements))
    }

    /// Paths: `centre[k]`, `radius`.
    fn compute_derivatives(&self, ctx: &DerivativeContext) -> Result<DerivativeMap, DerivativeError> {
        let mesh = self.surface_mesh(ctx.surface_element_size()?)?;
        boundary_derivatives(&mesh, ctx, |path, el| {
            let slot = ParamSlot::parse(path)?;
            match (slot.name, slot.index) {
                ("centre", _) => Ok(el.normal[slot.component(path)?]),
                ("radius", None) => Ok(1.0),
                _ => Err(unknown_path(path)),
            }
        })
    }

    fn bounding_box(&self) -> Bound {
        let r = self.radius;
        let c = self.centre;
        ([c[0] - r, c[1] - r, c[2] - r], [c[0] + r, c[1] + r, c[2] + r])
    }
}

/// A circular cylinder aligned with a Cartesian axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cylinder {
    /// Centre of the cylinder (midway between the caps).
    pub centre: [f64; 3],
    pub radius: f64,
    /// Length along `axis`.
    pub length: f64,
    pub axis: Axis,
}

impl Cylinder {
    pub fn new(centre: [f64; 3], radius: f64, length: f64, axis: Axis) -> Self {
        Self {
            centre,
            radius,
            length,
            axis,
        }
    }
}

impl Differentiable for Cylinder {
    /// Side patches in (angle, length) and annular sectors on each cap.
    fn surface_mesh(&self, element_size: f64) -> Result<SurfaceMesh, DerivativeError> {
        check_element_size(element_size)?;
        if !(self.radius > 0.0) || self.length < 0.0 {
            return Err(DerivativeError::Configuration(format!(
                "cylinder needs a positive radius and non-negative length, got r={}, L={}",
                self.radius, self.length
            )));
        }
        let a = self.axis.index();
        let (eu, ev, ea) = (unit((a + 1) % 3), unit((a + 2) % 3), unit(a));
        let r = self.radius;
        let half = 0.5 * self.length;

        let n_phi = divisions(2.0 * PI * r, element_size)?.max(3);
        let n_len = divisions(self.length, element_size)?;
        let n_rad = divisions(r, element_size)?;
        let mut budget = ElementBudget::default();
        budget.take(n_phi, n_len)?;
        budget.take(n_phi, 2 * n_rad)?;
        let d_phi = 2.0 * PI / n_phi as f64;
        let d_len = self.length / n_len as f64;
        let d_rad = r / n_rad as f64;

        let mut elements = Vec::new();
        for j in 0..n_phi {
            let phi = (j as f64 + 0.5) * d_phi;
            let (sp, cp) = phi.sin_cos();
            let radial = combine(&eu, cp, &ev, sp);
            let azimuthal = combine(&eu, -sp, &ev, cp);

            for l in 0..n_len {
                let offset = -half + (l as f64 + 0.5) * d_len;
                let centre = combine(&combine(&self.centre, 1.0, &radial, r), 1.0, &ea, offset);
                elements.push(SurfaceElement {
                    centre,
                    area: r * d_phi * d_len,
                    normal: radial,
                    perp1: azimuthal,
                    perp2: ea,
                });
            }

            for m in 0..n_rad {
                let (r0, r1) = (m as f64 * d_rad, (m + 1) as f64 * d_rad);
                let rm = 0.5 * (r0 + r1);
                let area = 0.5 * (r1 * r1 - r0 * r0) * d_phi;
                for sign in [1.0, -1.0] {
                    let centre = combine(&combine(&self.centre, 1.0, &radial, rm), 1.0, &ea, sign * half);
                    let (perp1, perp2) = if sign > 0.0 { (eu, ev) } else { (ev, eu) };
                    elements.push(SurfaceElement {
                        centre,
                        area,
                        normal: scale(&ea, sign),
                        perp1,
                        perp2,
                    });
                }
            }
        }
        Ok(SurfaceMesh::from_elements(&elements))
    }

    /// Paths: `centre[k]`, `radius`, `length`.
    fn compute_derivatives(&self, ctx: &DerivativeContext) -> Result<DerivativeMap, DerivativeError> {
        let a = self.axis.index();
        let mesh = self.surface_mesh(ctx.surface_element_size()?)?;
        boundary_derivatives(&mesh, ctx, |path, el| {
            let slot = ParamSlot::parse(path)?;
            let axial = el.normal[a];
            match (slot.name, slot.index) {
                ("centre", _) => Ok(el.normal[slot.component(path)?]),
                // side elements only: their normals have no axial component
                ("radius", None) => Ok((1.0 - axial * axial).max(0.0).sqrt()),
                ("length", None) => Ok(0.5 * axial.abs()),
                _ => Err(unknown_path(path)),
            }
        })
    }

    fn bounding_box(&self) -> Bound {
        let a = self.axis.index();
        let mut min = [0.0; 3];
        let mut max = [0.0; 3];
        for i in 0..3 {
            let extent = if i == a { 0.5 * self.length } else { self.radius };
            min[i] = self.centre[i] - extent;
            max[i] = self.centre[i] + extent;
        }
        (min, max)
    }
}
