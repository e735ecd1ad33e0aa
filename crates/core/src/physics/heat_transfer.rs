//! Bulk heat transfer coefficient and sensible heat flux
//!
//! ```text
//! C_H = κ² / {[ln(z/z_0m) - ψ_m(ζ)] · [ln(z/z_0t) - ψ_h(ζ)]}
//! Q_H = ρ · c_p · C_H · u_r · (T_lst - T_air)
//! ```
//!
//! The molecular term enters through `z_0t`, which depends on the roughness
//! Reynolds number built from u* and the kinematic viscosity ν = μ/ρ.

use crate::error::{Singularity, UnstableQuantity};
use crate::physics::drag::corrected_log_ratio;
use crate::physics::roughness::RoughnessParameters;
use crate::physics::stability::StabilityCorrection;

/// Kinematic viscosity ν = μ/ρ (m²/s)
#[inline]
pub fn kinematic_viscosity(dynamic_viscosity: f64, air_density: f64) -> f64 {
    dynamic_viscosity / air_density
}

/// Bulk heat transfer coefficient `C_H`
///
/// # Errors
///
/// Reports [`UnstableQuantity::HeatTransferDenominator`] if either corrected
/// log factor is at or below `epsilon`.
pub fn heat_transfer_coefficient(
    roughness: &RoughnessParameters,
    correction: &StabilityCorrection,
    von_karman: f64,
    epsilon: f64,
) -> Result<f64, Singularity> {
    let momentum = corrected_log_ratio(
        roughness.momentum_log_ratio(),
        correction.psi_m,
        epsilon,
        UnstableQuantity::HeatTransferDenominator,
    )?;
    let heat = corrected_log_ratio(
        roughness.heat_log_ratio(),
        correction.psi_h,
        epsilon,
        UnstableQuantity::HeatTransferDenominator,
    )?;
    Ok(von_karman * von_karman / (momentum * heat))
}

/// Sensible heat flux `Q_H` (W/m², positive upward)
#[inline]
pub fn sensible_heat_flux(
    air_density: f64,
    specific_heat: f64,
    heat_transfer_coefficient: f64,
    wind_speed: f64,
    temperature_difference: f64,
) -> f64 {
    air_density * specific_heat * heat_transfer_coefficient * wind_speed * temperature_difference
}

/// Aerodynamic resistance to heat transfer `r_a` = 1/(`C_H`·`u_r`) (s/m)
#[inline]
pub fn aerodynamic_resistance(heat_transfer_coefficient: f64, wind_speed: f64) -> f64 {
    1.0 / (heat_transfer_coefficient * wind_speed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KbInverse, StabilityConstants};
    use approx::assert_relative_eq;

    fn urban() -> RoughnessParameters {
        let mut params = RoughnessParameters {
            z_0m: 0.5,
            z_0t: 0.5,
            d_0: 10.0 / 3.0,
            z: 10.0 - 10.0 / 3.0,
        };
        let nu = kinematic_viscosity(1.81e-5, 1.2);
        params
            .refresh_thermal_roughness(0.463273, nu, &KbInverse::default())
            .unwrap();
        params
    }

    #[test]
    fn test_neutral_coefficient_and_flux() {
        let c_h = heat_transfer_coefficient(&urban(), &StabilityCorrection::NEUTRAL, 0.4, 1e-6).unwrap();
        assert_relative_eq!(c_h, 0.0041316, max_relative = 1e-3);

        let q_h = sensible_heat_flux(1.2, 1005.0, c_h, 3.0, 5.0);
        assert_relative_eq!(q_h, 74.74, max_relative = 1e-3);
    }

    #[test]
    fn test_heat_coefficient_below_drag_coefficient() {
        // z_0t < z_0m makes heat transfer less efficient than momentum transfer
        let params = urban();
        let c_h = heat_transfer_coefficient(&params, &StabilityCorrection::NEUTRAL, 0.4, 1e-6).unwrap();
        let c_d = crate::physics::drag::neutral_drag_coefficient(params.momentum_log_ratio(), 0.4);
        assert!(c_h < c_d);
    }

    #[test]
    fn test_unstable_correction_enhances_transfer() {
        let params = urban();
        let neutral = heat_transfer_coefficient(&params, &StabilityCorrection::NEUTRAL, 0.4, 1e-6).unwrap();
        let unstable = StabilityCorrection::evaluate(-0.05, &StabilityConstants::default());
        let enhanced = heat_transfer_coefficient(&params, &unstable, 0.4, 1e-6).unwrap();
        assert!(enhanced > neutral);
    }

    #[test]
    fn test_collapsed_heat_denominator_is_signaled() {
        let params = urban();
        let correction = StabilityCorrection {
            regime: crate::physics::stability::StabilityRegime::Unstable,
            psi_m: 0.0,
            psi_h: params.heat_log_ratio(),
        };
        let err = heat_transfer_coefficient(&params, &correction, 0.4, 1e-6).unwrap_err();
        assert_eq!(err.quantity, UnstableQuantity::HeatTransferDenominator);
    }

    #[test]
    fn test_flux_sign_follows_temperature_difference() {
        assert!(sensible_heat_flux(1.2, 1005.0, 0.004, 3.0, 5.0) > 0.0);
        assert!(sensible_heat_flux(1.2, 1005.0, 0.004, 3.0, -5.0) < 0.0);
        assert_eq!(sensible_heat_flux(1.2, 1005.0, 0.004, 3.0, 0.0), 0.0);
    }

    #[test]
    fn test_aerodynamic_resistance() {
        assert_relative_eq!(aerodynamic_resistance(0.004, 2.5), 100.0, max_relative = 1e-12);
    }
}
