//! Air density and humidity helpers
//!
//! Used to derive ρ for a [`crate::core_types::PixelObservation`] from station
//! pressure, and the specific humidities the latent heat model needs.
//!
//! # Scientific References
//!
//! - Bolton, D. (1980). "The computation of equivalent potential temperature."
//!   Monthly Weather Review 108:1046-1053.

/// Gas constant for dry air (J/(kg·K))
pub const GAS_CONSTANT_DRY_AIR: f64 = 287.05;

/// Reference vapour pressure at 0°C (hPa)
const REFERENCE_VAPOUR_PRESSURE: f64 = 6.113;

/// Ratio of gas constants, dry air / water vapour
const EPSILON: f64 = 0.622;

const KELVIN_OFFSET: f64 = 273.15;

/// Air density ρ (kg/m³) from temperature (K) and pressure (hPa)
#[inline]
pub fn air_density(temperature: f64, pressure_hpa: f64) -> f64 {
    pressure_hpa * 100.0 / (GAS_CONSTANT_DRY_AIR * temperature)
}

/// Vapour pressure (hPa) over water at a temperature in K (Bolton 1980)
///
/// Pass the dew point for actual vapour pressure, the air temperature for saturation.
#[inline]
pub fn vapour_pressure(temperature: f64) -> f64 {
    let t_c = temperature - KELVIN_OFFSET;
    REFERENCE_VAPOUR_PRESSURE * (17.67 * t_c / (t_c + 243.5)).exp()
}

/// Specific humidity (kg/kg) for a vapour pressure and total pressure, both in hPa
#[inline]
pub fn specific_humidity(vapour_pressure_hpa: f64, pressure_hpa: f64) -> f64 {
    EPSILON * vapour_pressure_hpa / (pressure_hpa - 0.378 * vapour_pressure_hpa)
}

/// Saturation specific humidity (kg/kg) at a temperature (K) and pressure (hPa)
#[inline]
pub fn saturation_specific_humidity(temperature: f64, pressure_hpa: f64) -> f64 {
    specific_humidity(vapour_pressure(temperature), pressure_hpa)
}
