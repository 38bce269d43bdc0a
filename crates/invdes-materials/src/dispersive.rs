//! Pole-based dispersive models.
//!
//! Frequencies are in Hz, with `e^{-iωt}` time dependence so that lossy
//! materials have `Im ε > 0`.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::provider::{check_frequency, MaterialError, PermittivityModel};

/// One Lorentz oscillator: strength `delta_eps`, resonance `frequency`
/// and damping `delta` (Hz).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LorentzPole {
    pub delta_eps: f64,
    pub frequency: f64,
    pub delta: f64,
}

/// `ε(f) = ε∞ + Σ Δε f₀² / (f₀² − 2ifδ − f²)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lorentz {
    #[serde(default = "default_lorentz_name")]
    pub name: String,
    pub eps_inf: f64,
    pub poles: Vec<LorentzPole>,
}

fn default_lorentz_name() -> String {
    "lorentz".into()
}

impl PermittivityModel for Lorentz {
    fn name(&self) -> &str {
        &self.name
    }

    fn eps_model(&self, frequency: f64) -> Result<Complex64, MaterialError> {
        check_frequency(frequency, None)?;
        let f = frequency;
        let mut eps = Complex64::new(self.eps_inf, 0.0);
        for pole in &self.poles {
            let f0_sq = pole.frequency * pole.frequency;
            let denom = Complex64::new(f0_sq - f * f, -2.0 * f * pole.delta);
            eps += pole.delta_eps * f0_sq / denom;
        }
        Ok(eps)
    }
}

/// One Drude term: plasma frequency and damping (Hz).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrudePole {
    pub plasma_frequency: f64,
    pub delta: f64,
}

/// `ε(f) = ε∞ − Σ f_p² / (f² + ifδ)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drude {
    #[serde(default = "default_drude_name")]
    pub name: String,
    pub eps_inf: f64,
    pub poles: Vec<DrudePole>,
}

fn default_drude_name() -> String {
    "drude".into()
}

impl PermittivityModel for Drude {
    fn name(&self) -> &str {
        &self.name
    }

    fn eps_model(&self, frequency: f64) -> Result<Complex64, MaterialError> {
        check_frequency(frequency, None)?;
        let f = frequency;
        let mut eps = Complex64::new(self.eps_inf, 0.0);
        for pole in &self.poles {
            let denom = Complex64::new(f * f, f * pole.delta);
            eps -= pole.plasma_frequency * pole.plasma_frequency / denom;
        }
        Ok(eps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lorentz_static_limit() {
        // far below resonance ε → ε∞ + Δε
        let material = Lorentz {
            name: "test".into(),
            eps_inf: 2.0,
            poles: vec![LorentzPole {
                delta_eps: 1.5,
                frequency: 1e15,
                delta: 1e13,
            }],
        };
        let eps = material.eps_model(1e9).unwrap();
        assert_relative_eq!(eps.re, 3.5, max_relative = 1e-9);
        assert!(eps.im > 0.0);
    }

    #[test]
    fn test_drude_is_metallic_below_plasma_frequency() {
        let material = Drude {
            name: "metal".into(),
            eps_inf: 1.0,
            poles: vec![DrudePole {
                plasma_frequency: 2e15,
                delta: 1e13,
            }],
        };
        let eps = material.eps_model(5e14).unwrap();
        assert!(eps.re < 0.0);
        assert!(eps.im > 0.0);
    }
}
