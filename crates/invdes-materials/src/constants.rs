//! Physical constants in SI units.

/// Vacuum permittivity (F/m).
pub const EPSILON_0: f64 = 8.854_187_812_8e-12;

/// Speed of light in vacuum (m/s).
pub const C_0: f64 = 299_792_458.0;

/// Angular frequency for a frequency in Hz.
pub fn angular(frequency: f64) -> f64 {
    2.0 * std::f64::consts::PI * frequency
}

/// Frequency (Hz) of a vacuum wavelength given in metres.
pub fn frequency_from_wavelength(wavelength: f64) -> f64 {
    C_0 / wavelength
}
