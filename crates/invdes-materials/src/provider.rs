//! Permittivity model trait and the configurable [`Material`] enum.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispersive::{Drude, Lorentz};
use crate::medium::Medium;
use crate::tabulated::Tabulated;

/// Errors from permittivity models.
#[derive(Debug, Error)]
pub enum MaterialError {
    #[error("Frequency {frequency:e} Hz is outside the data range [{min:e}, {max:e}] Hz")]
    OutOfRange { frequency: f64, min: f64, max: f64 },

    #[error("Invalid frequency: {0}")]
    InvalidFrequency(f64),

    #[error("Data error: {0}")]
    DataError(String),
}

/// A pure map from frequency (Hz) to complex relative permittivity.
pub trait PermittivityModel: Send + Sync {
    /// Human-readable name of this material.
    fn name(&self) -> &str;

    /// Frequencies over which the model is valid, if limited.
    fn frequency_range(&self) -> Option<(f64, f64)> {
        None
    }

    /// Complex relative permittivity at `frequency`.
    fn eps_model(&self, frequency: f64) -> Result<Complex64, MaterialError>;

    /// Complex refractive index `n + ik = sqrt(ε)`.
    fn refractive_index(&self, frequency: f64) -> Result<Complex64, MaterialError> {
        Ok(self.eps_model(frequency)?.sqrt())
    }
}

/// Reject non-positive or non-finite frequencies and those outside `range`.
pub(crate) fn check_frequency(frequency: f64, range: Option<(f64, f64)>) -> Result<(), MaterialError> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return Err(MaterialError::InvalidFrequency(frequency));
    }
    if let Some((min, max)) = range {
        if frequency < min || frequency > max {
            return Err(MaterialError::OutOfRange { frequency, min, max });
        }
    }
    Ok(())
}

/// Any supported material, as written in configuration files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Material {
    Medium(Medium),
    Lorentz(Lorentz),
    Drude(Drude),
    Tabulated(Tabulated),
}

impl Material {
    fn inner(&self) -> &dyn PermittivityModel {
        match self {
            Material::Medium(m) => m,
            Material::Lorentz(m) => m,
            Material::Drude(m) => m,
            Material::Tabulated(m) => m,
        }
    }
}

impl PermittivityModel for Material {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn frequency_range(&self) -> Option<(f64, f64)> {
        self.inner().frequency_range()
    }

    fn eps_model(&self, frequency: f64) -> Result<Complex64, MaterialError> {
        self.inner().eps_model(frequency)
    }
}
