//! # Invdes Geometry
//!
//! Differentiable shapes for the adjoint inverse-design stack. This crate
//! provides:
//!
//! - **Primitives** ([`primitives`]): Cuboids, spheres and cylinders with
//!   analytic surface meshes.
//! - **Triangle meshes** ([`triangle_mesh`]): Closed meshes imported from
//!   `.obj` files, differentiable in their translation.
//! - **Groups** ([`group`]): Composite geometries that delegate to their
//!   children, plus the serialisable [`Geometry`] enum.
//! - **Parsers** ([`parsers`]): Wavefront `.obj` import.
//! - **Placement** ([`placement`]): Scale, rotate and shift imported meshes.
//!
//! Every shape implements [`invdes_core::Differentiable`]: it discretises its
//! boundary into surface elements and maps the per-element sensitivities onto
//! its parameter paths through the normal velocity of each element.

pub mod group;
pub mod parsers;
pub mod primitives;
pub mod placement;
pub mod sensitivity;
pub mod triangle_mesh;

pub use group::{Geometry, GeometryGroup};
pub use primitives::{Cuboid, Cylinder, Sphere};
pub use placement::Placement;
pub use triangle_mesh::TriangleMesh;
