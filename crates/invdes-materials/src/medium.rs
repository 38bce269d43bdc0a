use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::constants::{angular, EPSILON_0};
use crate::provider::{check_frequency, MaterialError, PermittivityModel};

/// Non-dispersive medium with optional DC conductivity (S/m).
///
/// `ε(f) = permittivity + i σ / (2πf ε₀)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medium {
    #[serde(default = "default_name")]
    pub name: String,
    pub permittivity: f64,
    #[serde(default)]
    pub conductivity: f64,
}

fn default_name() -> String {
    "medium".into()
}

impl Medium {
    pub fn new(permittivity: f64) -> Self {
        Self {
            name: default_name(),
            permittivity,
            conductivity: 0.0,
        }
    }

    pub fn with_conductivity(mut self, conductivity: f64) -> Self {
        self.conductivity = conductivity;
        self
    }

    pub fn vacuum() -> Self {
        Self {
            name: "vacuum".into(),
            ..Self::new(1.0)
        }
    }
}

impl PermittivityModel for Medium {
    fn name(&self) -> &str {
        &self.name
    }

    fn eps_model(&self, frequency: f64) -> Result<Complex64, MaterialError> {
        check_frequency(frequency, None)?;
        let loss = self.conductivity / (angular(frequency) * EPSILON_0);
        Ok(Complex64::new(self.permittivity, loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_conductivity_gives_positive_loss() {
        let m = Medium::new(4.0).with_conductivity(1.0);
        let f = 1e9;
        let eps = m.eps_model(f).unwrap();
        assert_relative_eq!(eps.re, 4.0);
        assert_relative_eq!(eps.im, 1.0 / (2.0 * std::f64::consts::PI * f * EPSILON_0));
    }

    #[test]
    fn test_vacuum_is_unity() {
        assert_eq!(Medium::vacuum().eps_model(1e14).unwrap(), Complex64::new(1.0, 0.0));
    }
}
