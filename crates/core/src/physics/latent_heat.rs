//! Two-source latent heat flux
//!
//! Companion to the sensible heat solve: once `C_H` has converged, the aerodynamic
//! resistance `r_a` = 1/(`C_H`·`u_r`) drives a resistance model that splits
//! evapotranspiration into canopy transpiration and bare-soil evaporation.
//!
//! ```text
//! c_sw   = θ / θ_max
//! r_st   = r_min/c_sw + ((r_max - r_min)/c_sw)·(1 - tanh(S_d/c_sd))
//! r_c    = r_st / LAI
//! r_soil = a·(θ_max/θ)^b + c
//! T      = ρ·(q_sat(T_air) - q_a) / (r_a + r_c)
//! E      = ρ·(q_sat(T_lst) - q_a) / (r_a + r_soil)
//! Q_E    = (T + E)·L_v
//! ```
//!
//! # Scientific References
//!
//! - Wang, K. and Dickinson, R.E. (2012). "A review of global terrestrial
//!   evapotranspiration." Reviews of Geophysics 50.

use serde::{Deserialize, Serialize};

use super::moisture::{air_density, saturation_specific_humidity};
use crate::core_types::{Kelvin, WattsPerSquareMeter};
use crate::error::FluxError;

/// Resistance-model constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatentHeatModel {
    /// Minimum stomatal resistance (s/m)
    pub stomatal_resistance_min: f64,
    /// Maximum stomatal resistance (s/m)
    pub stomatal_resistance_max: f64,
    /// Shortwave half-saturation scale `c_sd` (W/m²)
    pub shortwave_scale: f64,
    /// Soil resistance a, b, c
    pub soil_coefficients: (f64, f64, f64),
    /// Latent heat of vaporization (J/kg)
    pub latent_heat_vaporization: f64,
}

impl Default for LatentHeatModel {
    fn default() -> Self {
        Self {
            stomatal_resistance_min: 1e2,
            stomatal_resistance_max: 1e4,
            shortwave_scale: 25.0,
            soil_coefficients: (3.5, 2.3, 433.5),
            latent_heat_vaporization: 2.5e6,
        }
    }
}

/// Per-pixel inputs beyond the sensible heat observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatentHeatInputs {
    /// Dew point temperature
    pub dew_point: Kelvin,
    /// Station pressure (hPa)
    pub pressure_hpa: f64,
    /// Volumetric soil moisture θ (m³/m³)
    pub soil_moisture: f64,
    /// Saturation (maximum) soil moisture `θ_max` over the domain (m³/m³)
    pub soil_moisture_max: f64,
    /// Downward shortwave radiation `S_d`
    pub shortwave_down: WattsPerSquareMeter,
    /// Leaf area index (m²/m²)
    pub leaf_area_index: f64,
}

impl LatentHeatInputs {
    fn validate(&self) -> Result<(), FluxError> {
        let positive = [
            ("pressure_hpa", self.pressure_hpa),
            ("soil_moisture", self.soil_moisture),
            ("soil_moisture_max", self.soil_moisture_max),
            ("leaf_area_index", self.leaf_area_index),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(FluxError::InvalidInput { field, value });
            }
        }
        if !self.shortwave_down.is_finite() {
            return Err(FluxError::InvalidInput {
                field: "shortwave_down",
                value: *self.shortwave_down,
            });
        }
        Ok(())
    }
}

/// Latent heat flux split by source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatentHeatFlux {
    /// Canopy transpiration part
    pub transpiration: WattsPerSquareMeter,
    /// Bare-soil evaporation part
    pub evaporation: WattsPerSquareMeter,
    /// Canopy resistance `r_c` (s/m)
    pub canopy_resistance: f64,
    /// Soil resistance `r_soil` (s/m)
    pub soil_resistance: f64,
}

impl LatentHeatFlux {
    /// `Q_E`
    pub fn total(&self) -> WattsPerSquareMeter {
        self.transpiration + self.evaporation
    }
}

impl LatentHeatModel {
    /// Latent heat flux for one pixel
    ///
    /// # Arguments
    ///
    /// * `surface_temperature` - `T_lst`
    /// * `air_temperature` - `T_air`
    /// * `inputs` - Humidity, soil and canopy state
    /// * `aerodynamic_resistance` - `r_a` from the converged sensible heat solve (s/m)
    ///
    /// # Errors
    ///
    /// Returns [`FluxError::InvalidInput`] for non-positive pressure, soil moisture,
    /// LAI or aerodynamic resistance.
    pub fn flux(
        &self,
        surface_temperature: Kelvin,
        air_temperature: Kelvin,
        inputs: &LatentHeatInputs,
        aerodynamic_resistance: f64,
    ) -> Result<LatentHeatFlux, FluxError> {
        inputs.validate()?;
        if !aerodynamic_resistance.is_finite() || aerodynamic_resistance <= 0.0 {
            return Err(FluxError::InvalidInput {
                field: "aerodynamic_resistance",
                value: aerodynamic_resistance,
            });
        }

        let p = inputs.pressure_hpa;
        let q_air = saturation_specific_humidity(*inputs.dew_point, p);
        let q_sat_air = saturation_specific_humidity(*air_temperature, p);
        let q_sat_surface = saturation_specific_humidity(*surface_temperature, p);
        let rho = air_density(*air_temperature, p);

        let soil_fraction = inputs.soil_moisture / inputs.soil_moisture_max;
        let light_limit = 1.0 - (*inputs.shortwave_down / self.shortwave_scale).tanh();
        let stomatal = self.stomatal_resistance_min / soil_fraction
            + ((self.stomatal_resistance_max - self.stomatal_resistance_min) / soil_fraction)
                * light_limit;
        let canopy_resistance = stomatal / inputs.leaf_area_index;

        let (a, b, c) = self.soil_coefficients;
        let soil_resistance = a * (inputs.soil_moisture_max / inputs.soil_moisture).powf(b) + c;

        let transpiration = rho * (q_sat_air - q_air) / (aerodynamic_resistance + canopy_resistance);
        let evaporation = rho * (q_sat_surface - q_air) / (aerodynamic_resistance + soil_resistance);

        Ok(LatentHeatFlux {
            transpiration: WattsPerSquareMeter::new(transpiration * self.latent_heat_vaporization),
            evaporation: WattsPerSquareMeter::new(evaporation * self.latent_heat_vaporization),
            canopy_resistance,
            soil_resistance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn inputs(shortwave: f64) -> LatentHeatInputs {
        LatentHeatInputs {
            dew_point: Kelvin::new(290.0),
            pressure_hpa: 1013.25,
            soil_moisture: 0.25,
            soil_moisture_max: 0.45,
            shortwave_down: WattsPerSquareMeter::new(shortwave),
            leaf_area_index: 2.0,
        }
    }

    fn r_a() -> f64 {
        1.0 / (0.00442 * 3.0)
    }

    #[test]
    fn test_daytime_partition() {
        let flux = LatentHeatModel::default()
            .flux(Kelvin::new(305.0), Kelvin::new(300.0), &inputs(600.0), r_a())
            .unwrap();
        assert_relative_eq!(flux.canopy_resistance, 90.0, max_relative = 1e-6);
        assert_relative_eq!(flux.soil_resistance, 447.027, max_relative = 1e-5);
        assert_relative_eq!(*flux.transpiration, 180.14, max_relative = 1e-3);
        assert_relative_eq!(*flux.evaporation, 99.27, max_relative = 1e-3);
        assert_relative_eq!(*flux.total(), 279.41, max_relative = 1e-3);
    }

    #[test]
    fn test_darkness_closes_stomata() {
        let model = LatentHeatModel::default();
        let day = model
            .flux(Kelvin::new(305.0), Kelvin::new(300.0), &inputs(600.0), r_a())
            .unwrap();
        let night = model
            .flux(Kelvin::new(305.0), Kelvin::new(300.0), &inputs(0.0), r_a())
            .unwrap();
        assert!(night.canopy_resistance > day.canopy_resistance);
        assert!(*night.transpiration < *day.transpiration);
        assert_eq!(night.evaporation, day.evaporation, "soil path is light-independent");
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let model = LatentHeatModel::default();
        let mut bad = inputs(600.0);
        bad.leaf_area_index = 0.0;
        assert!(matches!(
            model.flux(Kelvin::new(305.0), Kelvin::new(300.0), &bad, r_a()),
            Err(FluxError::InvalidInput {
                field: "leaf_area_index",
                ..
            })
        ));

        assert!(matches!(
            model.flux(Kelvin::new(305.0), Kelvin::new(300.0), &inputs(600.0), f64::INFINITY),
            Err(FluxError::InvalidInput {
                field: "aerodynamic_resistance",
                ..
            })
        ));
    }
}
