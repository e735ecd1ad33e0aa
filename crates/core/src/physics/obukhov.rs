//! Obukhov length and the stability parameter
//!
//! ```text
//! L = -(ρ · c_p · u*³ · T_air) / (κ · g · Q_H)
//! ζ = z / L
//! ```
//!
//! L needs `Q_H` and `Q_H` needs L (through ζ and `C_H`), so the solver feeds in
//! the previous iteration's flux. Two guards keep the cycle finite:
//! - |`Q_H`| below `flux_floor` is a degenerate (near-neutral) state and is
//!   reported instead of divided by
//! - |L| below `obukhov_length_floor` is clamped, keeping its sign, before ζ is formed

use crate::config::SolverConfig;
use crate::error::{Singularity, UnstableQuantity};

/// Obukhov length L (m) from the current friction velocity and flux estimate
///
/// Negative when the surface heats the air (`Q_H` > 0), positive when it cools it.
///
/// # Arguments
///
/// * `air_density` - ρ (kg/m³)
/// * `specific_heat` - `c_p` (J/(kg·K))
/// * `u_star` - Friction velocity (m/s)
/// * `air_temperature` - `T_air` (K)
/// * `sensible_heat_flux` - Previous `Q_H` estimate (W/m²)
/// * `config` - Supplies κ, g and both floors
///
/// # Errors
///
/// Reports [`UnstableQuantity::ObukhovLength`] with the offending flux when
/// |`Q_H`| < `flux_floor` or `Q_H` is not finite.
pub fn obukhov_length(
    air_density: f64,
    specific_heat: f64,
    u_star: f64,
    air_temperature: f64,
    sensible_heat_flux: f64,
    config: &SolverConfig,
) -> Result<f64, Singularity> {
    if !sensible_heat_flux.is_finite() || sensible_heat_flux.abs() < config.flux_floor {
        return Err(Singularity::new(
            UnstableQuantity::ObukhovLength,
            sensible_heat_flux,
        ));
    }

    let constants = &config.constants;
    let numerator = air_density * specific_heat * u_star.powi(3) * air_temperature;
    let length = -numerator / (constants.von_karman * constants.gravity * sensible_heat_flux);

    Ok(apply_length_floor(length, config.obukhov_length_floor))
}

/// Clamp |L| to at least `floor`, keeping the sign (zero counts as positive)
#[inline]
pub fn apply_length_floor(length: f64, floor: f64) -> f64 {
    if length.abs() < floor {
        floor.copysign(length)
    } else {
        length
    }
}

/// Stability parameter ζ = z / L
///
/// L must already be floored; see [`apply_length_floor`].
#[inline]
pub fn stability_parameter(z: f64, obukhov_length: f64) -> f64 {
    z / obukhov_length
}
