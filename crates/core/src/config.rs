//! Solver configuration
//!
//! Every constant the iteration depends on is passed in explicitly so that solves
//! stay independent of each other and testable in isolation. Defaults reproduce
//! the standard Businger-Dyer surface layer with a Kanda et al. (2007) thermal
//! roughness model.

use serde::{Deserialize, Serialize};

use crate::error::FluxError;

/// Physical constants used by the surface-layer relations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalConstants {
    /// von Kármán constant κ
    pub von_karman: f64,
    /// Gravitational acceleration g (m/s²)
    pub gravity: f64,
    /// Dynamic viscosity of air μ (Pa·s)
    pub dynamic_viscosity: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            von_karman: 0.4,
            gravity: 9.81,
            dynamic_viscosity: 1.81e-5,
        }
    }
}

/// Stability-function constants
///
/// Stable branch: ψ = -β·ζ. Unstable branch: x = (1 - γ·ζ)^(1/4).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConstants {
    /// β, slope of the linear stable-regime correction
    pub stable_coefficient: f64,
    /// γ, coefficient inside the unstable-regime fourth root
    pub unstable_coefficient: f64,
}

impl Default for StabilityConstants {
    fn default() -> Self {
        Self {
            stable_coefficient: 5.0,
            unstable_coefficient: 16.0,
        }
    }
}

/// How stability is treated during iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StabilityMode {
    /// Full Monin-Obukhov iteration, ζ = z/L every step
    #[default]
    MoninObukhov,
    /// ζ forced to zero; reproduces the neutral log profile
    Neutral,
}

/// Thermal roughness model: `kB⁻¹ = a·Re*^(1/4) - b`, `z_0t = z_0m·exp(-kB⁻¹)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KbInverse {
    /// a
    pub coefficient: f64,
    /// b
    pub offset: f64,
}

impl Default for KbInverse {
    fn default() -> Self {
        // Kanda et al. (2007) bluff-body urban fit
        Self {
            coefficient: 1.29,
            offset: 2.0,
        }
    }
}

impl KbInverse {
    /// Brutsaert (1982) bluff-rough form, a = 2.46
    pub fn brutsaert() -> Self {
        Self {
            coefficient: 2.46,
            offset: 2.0,
        }
    }
}

/// Configuration for one [`crate::solver::FluxSolver`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Converged when `|ΔQ_H| ≤ relative_tolerance·|Q_H|`
    pub relative_tolerance: f64,
    /// ... or when `|ΔQ_H| ≤ absolute_tolerance` (W/m²)
    pub absolute_tolerance: f64,
    /// Iteration cap; reaching it yields a non-converged result, not an error
    pub max_iterations: usize,
    /// κ, g, μ
    pub constants: PhysicalConstants,
    /// β, γ
    pub stability: StabilityConstants,
    /// Monin-Obukhov or forced-neutral iteration
    pub stability_mode: StabilityMode,
    /// `d_0` = fraction·`h_0`
    pub displacement_fraction: f64,
    /// `z_0t` model
    pub thermal_roughness: KbInverse,
    /// Denominators at or below this are treated as collapsed
    pub denominator_epsilon: f64,
    /// Minimum |L| (m) before forming ζ = z/L
    pub obukhov_length_floor: f64,
    /// Minimum |`Q_H`| (W/m²) before forming L
    pub flux_floor: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            relative_tolerance: 1e-3,
            absolute_tolerance: 1e-3,
            max_iterations: 100,
            constants: PhysicalConstants::default(),
            stability: StabilityConstants::default(),
            stability_mode: StabilityMode::MoninObukhov,
            displacement_fraction: 2.0 / 3.0,
            thermal_roughness: KbInverse::default(),
            denominator_epsilon: 1e-6,
            obukhov_length_floor: 1e-3,
            flux_floor: 1e-3,
        }
    }
}

impl SolverConfig {
    /// Default configuration with ζ forced to zero
    pub fn neutral() -> Self {
        Self::default().with_stability_mode(StabilityMode::Neutral)
    }

    /// Set the relative tolerance on successive `Q_H` estimates
    pub fn with_relative_tolerance(mut self, tolerance: f64) -> Self {
        self.relative_tolerance = tolerance;
        self
    }

    /// Set the absolute tolerance on successive `Q_H` estimates (W/m²)
    pub fn with_absolute_tolerance(mut self, tolerance: f64) -> Self {
        self.absolute_tolerance = tolerance;
        self
    }

    /// Set the iteration cap
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the stability treatment
    pub fn with_stability_mode(mut self, mode: StabilityMode) -> Self {
        self.stability_mode = mode;
        self
    }

    /// Set the physical constants
    pub fn with_constants(mut self, constants: PhysicalConstants) -> Self {
        self.constants = constants;
        self
    }

    /// Set the stability-function constants
    pub fn with_stability(mut self, stability: StabilityConstants) -> Self {
        self.stability = stability;
        self
    }

    /// Set the displacement height fraction
    pub fn with_displacement_fraction(mut self, fraction: f64) -> Self {
        self.displacement_fraction = fraction;
        self
    }

    /// Set the thermal roughness model
    pub fn with_thermal_roughness(mut self, model: KbInverse) -> Self {
        self.thermal_roughness = model;
        self
    }

    /// Set the minimum |`Q_H`| before L is formed
    pub fn with_flux_floor(mut self, floor: f64) -> Self {
        self.flux_floor = floor;
        self
    }

    /// Check every field is usable
    ///
    /// # Errors
    ///
    /// Returns [`FluxError::InvalidConfig`] for the first field that is
    /// non-finite, non-positive where it must be positive, or out of range.
    pub fn validate(&self) -> Result<(), FluxError> {
        let positive = [
            ("relative_tolerance", self.relative_tolerance),
            ("absolute_tolerance", self.absolute_tolerance),
            ("constants.von_karman", self.constants.von_karman),
            ("constants.gravity", self.constants.gravity),
            ("constants.dynamic_viscosity", self.constants.dynamic_viscosity),
            ("stability.stable_coefficient", self.stability.stable_coefficient),
            ("stability.unstable_coefficient", self.stability.unstable_coefficient),
            ("denominator_epsilon", self.denominator_epsilon),
            ("obukhov_length_floor", self.obukhov_length_floor),
            ("flux_floor", self.flux_floor),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(FluxError::InvalidConfig { field, value });
            }
        }

        if self.max_iterations == 0 {
            return Err(FluxError::InvalidConfig {
                field: "max_iterations",
                value: 0.0,
            });
        }

        if !(0.0..1.0).contains(&self.displacement_fraction) {
            return Err(FluxError::InvalidConfig {
                field: "displacement_fraction",
                value: self.displacement_fraction,
            });
        }

        let kb = self.thermal_roughness;
        for (field, value) in [
            ("thermal_roughness.coefficient", kb.coefficient),
            ("thermal_roughness.offset", kb.offset),
        ] {
            if !value.is_finite() {
                return Err(FluxError::InvalidConfig { field, value });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SolverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.constants.von_karman, 0.4);
        assert_eq!(config.stability_mode, StabilityMode::MoninObukhov);
    }

    #[test]
    fn test_neutral_preset() {
        let config = SolverConfig::neutral();
        assert_eq!(config.stability_mode, StabilityMode::Neutral);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_iteration_cap_rejected() {
        let config = SolverConfig::default().with_max_iterations(0);
        assert!(matches!(
            config.validate(),
            Err(FluxError::InvalidConfig {
                field: "max_iterations",
                ..
            })
        ));
    }

    #[test]
    fn test_non_positive_tolerance_rejected() {
        let config = SolverConfig::default().with_relative_tolerance(0.0);
        assert!(matches!(
            config.validate(),
            Err(FluxError::InvalidConfig {
                field: "relative_tolerance",
                ..
            })
        ));
    }

    #[test]
    fn test_displacement_fraction_range() {
        assert!(SolverConfig::default()
            .with_displacement_fraction(0.0)
            .validate()
            .is_ok());
        assert!(SolverConfig::default()
            .with_displacement_fraction(1.0)
            .validate()
            .is_err());
        assert!(SolverConfig::default()
            .with_displacement_fraction(-0.1)
            .validate()
            .is_err());
    }

    #[test]
    fn test_builder_chain() {
        let config = SolverConfig::default()
            .with_absolute_tolerance(0.01)
            .with_thermal_roughness(KbInverse::brutsaert())
            .with_flux_floor(0.5)
            .with_stability(StabilityConstants {
                stable_coefficient: 4.7,
                unstable_coefficient: 15.0,
            })
            .with_constants(PhysicalConstants {
                von_karman: 0.41,
                ..PhysicalConstants::default()
            });
        assert_eq!(config.absolute_tolerance, 0.01);
        assert_eq!(config.thermal_roughness.coefficient, 2.46);
        assert_eq!(config.flux_floor, 0.5);
        assert_eq!(config.stability.stable_coefficient, 4.7);
        assert_eq!(config.constants.von_karman, 0.41);
        assert!(config.validate().is_ok());
    }
}
