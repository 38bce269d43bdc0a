//! # Invdes Design
//!
//! Derivative-free exploration of a design space. A [`DesignSpace`] pairs a
//! list of [`Parameter`]s with a [`Method`]:
//!
//! | Method | Points evaluated |
//! |--------|------------------|
//! | [`MethodGrid`] | every combination of the parameter grids |
//! | [`MethodMonteCarlo`] | Latin-hypercube samples |
//! | [`MethodRandom`] | independent uniform samples |
//! | [`MethodRandomCustom`] | samples from a user [`UnitSampler`] |
//! | [`MethodBayOpt`] | Gaussian-process guided proposals |
//! | [`MethodGenAlg`] | a steady-state genetic population |
//!
//! Sweeps run either through a local function ([`DesignSpace::run`]) or a
//! [`BatchDispatcher`](invdes_compute::BatchDispatcher)
//! ([`DesignSpace::run_batch`]); methods see the same ordered results either
//! way.

pub mod config;
pub mod design;
pub mod error;
pub mod method;
pub mod parameter;
pub mod result;
pub mod sampler;

pub use config::DesignSpaceConfig;
pub use design::DesignSpace;
pub use error::DesignError;
pub use method::{
    Acquisition, Evaluator, Method, MethodBayOpt, MethodGenAlg, MethodGrid, MethodMonteCarlo, MethodRandom,
    MethodRandomCustom, SweepMethod,
};
pub use parameter::{Arguments, ParamValue, Parameter, ParameterAny, ParameterFloat, ParameterInt};
pub use result::SamplingResult;
pub use sampler::UnitSampler;
