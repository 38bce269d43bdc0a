//! Tabulated permittivity interpolated with natural cubic splines in
//! frequency.
//!
//! Evaluation outside the tabulated range is an error rather than an
//! extrapolation.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::provider::{check_frequency, MaterialError, PermittivityModel};
use crate::spline::CubicSpline;

/// Raw table as written in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabulatedData {
    pub name: String,
    /// Strictly increasing frequencies (Hz).
    pub frequencies: Vec<f64>,
    pub eps_real: Vec<f64>,
    pub eps_imag: Vec<f64>,
}

/// Spline-interpolated tabulated material.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TabulatedData", into = "TabulatedData")]
pub struct Tabulated {
    data: TabulatedData,
    spline_real: CubicSpline,
    spline_imag: CubicSpline,
}

impl Tabulated {
    pub fn new(data: TabulatedData) -> Result<Self, MaterialError> {
        let spline_real = CubicSpline::new(data.frequencies.clone(), data.eps_real.clone())?;
        let spline_imag = CubicSpline::new(data.frequencies.clone(), data.eps_imag.clone())?;
        Ok(Self {
            data,
            spline_real,
            spline_imag,
        })
    }

    pub fn data(&self) -> &TabulatedData {
        &self.data
    }
}

impl TryFrom<TabulatedData> for Tabulated {
    type Error = MaterialError;

    fn try_from(data: TabulatedData) -> Result<Self, Self::Error> {
        Self::new(data)
    }
}

impl From<Tabulated> for TabulatedData {
    fn from(t: Tabulated) -> Self {
        t.data
    }
}

impl PermittivityModel for Tabulated {
    fn name(&self) -> &str {
        &self.data.name
    }

    fn frequency_range(&self) -> Option<(f64, f64)> {
        Some(self.spline_real.domain())
    }

    fn eps_model(&self, frequency: f64) -> Result<Complex64, MaterialError> {
        check_frequency(frequency, self.frequency_range())?;
        Ok(Complex64::new(
            self.spline_real.evaluate(frequency),
            self.spline_imag.evaluate(frequency),
        ))
    }
}
