//! Per-pixel solver input

use serde::{Deserialize, Serialize};

use super::land_cover::LandCoverClass;
use super::units::{Kelvin, KelvinDelta, Meters, MetersPerSecond};
use crate::error::FluxError;

/// Standard near-surface air density (kg/m³)
pub const DEFAULT_AIR_DENSITY: f64 = 1.2;

/// Specific heat of dry air at constant pressure (J/(kg·K))
pub const DEFAULT_SPECIFIC_HEAT: f64 = 1005.0;

/// Everything one solve needs to know about one pixel at one timestep
///
/// Immutable once built. `T_lst` comes from the satellite land-surface
/// temperature product, `T_air` from the air-temperature model and `u_r` from the
/// nearest wind observation, interpolated by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelObservation {
    /// Land surface temperature `T_lst`
    pub surface_temperature: Kelvin,
    /// Air temperature `T_air` at the reference height
    pub air_temperature: Kelvin,
    /// Wind speed `u_r` at the reference height
    pub wind_speed: MetersPerSecond,
    /// Air density ρ (kg/m³)
    pub air_density: f64,
    /// Specific heat of air `c_p` (J/(kg·K))
    pub specific_heat: f64,
    /// Land-cover class of the pixel
    pub land_cover: LandCoverClass,
    /// Roughness-element (canopy/building) height `h_0`
    pub element_height: Meters,
    /// Reference measurement height `z_r`
    pub reference_height: Meters,
}

impl PixelObservation {
    /// Build an observation with standard air properties and the class's typical
    /// element height and default reference height
    pub fn new(
        land_cover: LandCoverClass,
        surface_temperature: Kelvin,
        air_temperature: Kelvin,
        wind_speed: MetersPerSecond,
    ) -> Self {
        Self {
            surface_temperature,
            air_temperature,
            wind_speed,
            air_density: DEFAULT_AIR_DENSITY,
            specific_heat: DEFAULT_SPECIFIC_HEAT,
            land_cover,
            element_height: land_cover.typical_element_height(),
            reference_height: land_cover.default_reference_height(),
        }
    }

    /// Set air density (kg/m³)
    pub fn with_air_density(mut self, air_density: f64) -> Self {
        self.air_density = air_density;
        self
    }

    /// Set specific heat of air (J/(kg·K))
    pub fn with_specific_heat(mut self, specific_heat: f64) -> Self {
        self.specific_heat = specific_heat;
        self
    }

    /// Set roughness-element height `h_0`
    pub fn with_element_height(mut self, element_height: Meters) -> Self {
        self.element_height = element_height;
        self
    }

    /// Set reference measurement height `z_r`
    pub fn with_reference_height(mut self, reference_height: Meters) -> Self {
        self.reference_height = reference_height;
        self
    }

    /// `T_lst - T_air`; positive when the surface heats the air
    pub fn temperature_difference(&self) -> KelvinDelta {
        self.surface_temperature - self.air_temperature
    }

    /// Reject inputs the numerics cannot work with
    ///
    /// This is not a plausibility check: a 350 K surface under a 250 K sky passes.
    /// It only catches values that would turn into NaN or a division by zero.
    ///
    /// # Errors
    ///
    /// Returns [`FluxError::InvalidInput`] naming the first offending field.
    pub fn validate(&self) -> Result<(), FluxError> {
        let positive = [
            ("surface_temperature", *self.surface_temperature),
            ("air_temperature", *self.air_temperature),
            ("wind_speed", *self.wind_speed),
            ("air_density", self.air_density),
            ("specific_heat", self.specific_heat),
            ("reference_height", *self.reference_height),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(FluxError::InvalidInput { field, value });
            }
        }

        let h_0 = *self.element_height;
        if !h_0.is_finite() || h_0 < 0.0 {
            return Err(FluxError::InvalidInput {
                field: "element_height",
                value: h_0,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urban_pixel() -> PixelObservation {
        PixelObservation::new(
            LandCoverClass::DevelopedLowIntensity,
            Kelvin::new(305.0),
            Kelvin::new(300.0),
            MetersPerSecond::new(3.0),
        )
    }

    #[test]
    fn test_defaults_follow_land_cover() {
        let obs = urban_pixel();
        assert_eq!(*obs.element_height, 5.0);
        assert_eq!(*obs.reference_height, 10.0);
        assert_eq!(obs.air_density, DEFAULT_AIR_DENSITY);
        assert_eq!(obs.specific_heat, DEFAULT_SPECIFIC_HEAT);
        assert_eq!(obs.temperature_difference().value(), 5.0);
        assert!(obs.validate().is_ok());
    }

    #[test]
    fn test_defaults_solve_for_every_class() {
        let solver = crate::FluxSolver::default();
        for class in LandCoverClass::ALL {
            let obs = PixelObservation::new(
                class,
                Kelvin::new(305.0),
                Kelvin::new(300.0),
                MetersPerSecond::new(3.0),
            );
            let result = solver
                .solve(&obs)
                .unwrap_or_else(|e| panic!("{class} with default heights: {e}"));
            assert!(result.converged, "{class}");
            assert!(result.state.sensible_heat_flux > 0.0, "{class}");
        }
    }

    #[test]
    fn test_tall_canopy_raises_reference_height() {
        let obs = PixelObservation::new(
            LandCoverClass::EvergreenForest,
            Kelvin::new(305.0),
            Kelvin::new(300.0),
            MetersPerSecond::new(3.0),
        );
        assert_eq!(*obs.element_height, 18.0);
        assert_eq!(*obs.reference_height, 36.0);
    }

    #[test]
    fn test_builder_overrides() {
        let obs = urban_pixel()
            .with_air_density(1.1)
            .with_specific_heat(1006.0)
            .with_element_height(Meters::new(8.0))
            .with_reference_height(Meters::new(30.0));
        assert_eq!(obs.air_density, 1.1);
        assert_eq!(obs.specific_heat, 1006.0);
        assert_eq!(*obs.element_height, 8.0);
        assert_eq!(*obs.reference_height, 30.0);
    }

    #[test]
    fn test_validate_rejects_calm_wind() {
        let mut obs = urban_pixel();
        obs.wind_speed = MetersPerSecond::new(0.0);
        match obs.validate() {
            Err(FluxError::InvalidInput { field, .. }) => assert_eq!(field, "wind_speed"),
            other => panic!("expected invalid wind speed, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_non_finite_density() {
        let obs = urban_pixel().with_air_density(f64::NAN);
        assert!(matches!(
            obs.validate(),
            Err(FluxError::InvalidInput {
                field: "air_density",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_negative_element_height() {
        let mut obs = urban_pixel();
        obs.element_height = Meters::from(-1.0);
        assert!(matches!(
            obs.validate(),
            Err(FluxError::InvalidInput {
                field: "element_height",
                ..
            })
        ));
    }
}
