//! # Invdes Materials
//!
//! Permittivity evaluators for the inverse-design stack. Every material
//! implements [`PermittivityModel`](provider::PermittivityModel), a pure
//! function from frequency (Hz) to complex relative permittivity.
//!
//! ## Available models
//!
//! | Model | Module | Form |
//! |-------|--------|------|
//! | Non-dispersive medium | [`medium`] | `ε + iσ/(ωε₀)` |
//! | Lorentz oscillators | [`dispersive`] | `ε∞ + Σ Δε f₀² / (f₀² − 2ifδ − f²)` |
//! | Drude | [`dispersive`] | `ε∞ − Σ f_p² / (f² + ifδ)` |
//! | Tabulated data | [`tabulated`] | natural cubic splines in frequency |
//!
//! The [`Material`](provider::Material) enum wraps all of them for TOML/JSON
//! configuration.

pub mod constants;
pub mod dispersive;
pub mod medium;
pub mod provider;
pub mod spline;
pub mod tabulated;

pub use provider::{Material, MaterialError, PermittivityModel};
