//! Physical constants and the thermodynamic parameters of a run
//!
//! Units: energies in eV, lengths in nm, dipole moments in e*nm,
//! temperatures in K, fields in V/nm (so that E.p is in eV).

use crate::error::{DipoleError, Result};
use nalgebra::Vector2;
use std::f64::consts::PI;

/// Vacuum permittivity in e^2 / (eV nm)
pub const EPS0: f64 = 0.0552713;

/// Boltzmann constant in eV / K
pub const BOLTZMANN: f64 = 8.617e-5;

/// Inverse temperature, external field and coupling prefactor.
///
/// Only changed between runs through the explicit setters.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParameters {
    beta: f64,
    field: Vector2<f64>,
    k_units: f64,
    eps_rel: f64,
}

impl SimulationParameters {
    pub fn new(temperature: f64, eps_rel: f64) -> Result<Self> {
        if !(eps_rel.is_finite() && eps_rel > 0.0) {
            return Err(DipoleError::InvalidConfiguration(format!(
                "relative permittivity must be positive, got {eps_rel}"
            )));
        }
        Ok(Self {
            beta: inverse_temperature(temperature)?,
            field: Vector2::zeros(),
            k_units: coupling_prefactor(eps_rel),
            eps_rel,
        })
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn temperature(&self) -> f64 {
        1.0 / (BOLTZMANN * self.beta)
    }

    pub fn set_temperature(&mut self, temperature: f64) -> Result<()> {
        self.beta = inverse_temperature(temperature)?;
        Ok(())
    }

    pub fn field(&self) -> Vector2<f64> {
        self.field
    }

    pub fn set_field(&mut self, field: Vector2<f64>) -> Result<()> {
        if !(field.x.is_finite() && field.y.is_finite()) {
            return Err(DipoleError::NumericDegeneracy(format!(
                "external field must be finite, got [{}, {}]",
                field.x, field.y
            )));
        }
        self.field = field;
        Ok(())
    }

    /// 1 / (4 pi eps0 eps_rel)
    pub fn k_units(&self) -> f64 {
        self.k_units
    }

    pub fn eps_rel(&self) -> f64 {
        self.eps_rel
    }
}

/// beta = 1 / (k_B T); rejects temperatures that leave beta undefined
pub fn inverse_temperature(temperature: f64) -> Result<f64> {
    if !temperature.is_finite() || temperature <= 0.0 {
        return Err(DipoleError::NumericDegeneracy(format!(
            "temperature must be positive and finite, got {temperature}"
        )));
    }
    Ok(1.0 / (BOLTZMANN * temperature))
}

pub fn coupling_prefactor(eps_rel: f64) -> f64 {
    0.25 / (PI * EPS0 * eps_rel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_temperature_round_trip() {
        let mut params = SimulationParameters::new(300.0, 1.5).unwrap();
        assert_relative_eq!(params.temperature(), 300.0, max_relative = 1e-12);
        assert_relative_eq!(params.beta(), 1.0 / (BOLTZMANN * 300.0));

        params.set_temperature(45.0).unwrap();
        assert_relative_eq!(params.temperature(), 45.0, max_relative = 1e-12);
    }

    #[test]
    fn test_coupling_prefactor() {
        let params = SimulationParameters::new(300.0, 1.0).unwrap();
        assert_relative_eq!(params.k_units(), 1.0 / (4.0 * PI * EPS0), max_relative = 1e-14);
        assert_relative_eq!(coupling_prefactor(2.0), 0.5 * params.k_units(), max_relative = 1e-14);
    }

    #[test]
    fn test_non_positive_temperature_fails_fast() {
        for t in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                SimulationParameters::new(t, 1.0),
                Err(DipoleError::NumericDegeneracy(_))
            ));
        }

        let mut params = SimulationParameters::new(100.0, 1.0).unwrap();
        assert!(params.set_temperature(0.0).is_err());
        // A failed update leaves the previous value in place
        assert_relative_eq!(params.temperature(), 100.0, max_relative = 1e-12);
    }

    #[test]
    fn test_invalid_permittivity() {
        assert!(matches!(
            SimulationParameters::new(100.0, 0.0),
            Err(DipoleError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_field_update() {
        let mut params = SimulationParameters::new(100.0, 1.0).unwrap();
        assert_eq!(params.field(), Vector2::zeros());
        params.set_field(Vector2::new(0.0, 10.0)).unwrap();
        assert_eq!(params.field(), Vector2::new(0.0, 10.0));
        assert!(params.set_field(Vector2::new(f64::NAN, 0.0)).is_err());
    }
}
