//! Surface roughness geometry
//!
//! Maps a pixel's land cover and roughness-element height to the lengths the
//! log-profile relations need:
//!
//! ```text
//! z_0m  momentum roughness length      (roughness table, per land-cover class)
//! d_0   zero-plane displacement        d_0 = f·h_0
//! z     effective reference height     z = z_r - d_0
//! z_0t  thermal roughness length       z_0t = z_0m·exp(-kB⁻¹)
//!       kB⁻¹ = max(a·Re*^(1/4) - b, 0),  Re* = z_0m·u*/ν
//! ```
//!
//! `z_0m`, `d_0` and z are fixed for a pixel. `z_0t` depends on u*, so the solver
//! refreshes it every iteration.
//!
//! # Scientific References
//!
//! - Brutsaert, W. (1982). "Evaporation into the Atmosphere." Reidel.
//! - Kanda, M. et al. (2007). "Roughness lengths for momentum and heat derived
//!   from outdoor urban scale models." J. Applied Meteorology and Climatology
//!   46:1067-1079.

use serde::{Deserialize, Serialize};

use crate::config::{KbInverse, SolverConfig};
use crate::core_types::{PixelObservation, RoughnessTable};
use crate::error::{FluxError, Singularity, UnstableQuantity};

/// Roughness lengths and heights for one pixel (all in meters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoughnessParameters {
    /// Momentum roughness length `z_0m`
    pub z_0m: f64,
    /// Thermal roughness length `z_0t`
    pub z_0t: f64,
    /// Zero-plane displacement height `d_0`
    pub d_0: f64,
    /// Height above displacement, z = `z_r` - `d_0`
    pub z: f64,
}

impl RoughnessParameters {
    /// Derive the static geometry of a pixel
    ///
    /// `z_0t` starts out equal to `z_0m` until the first friction velocity is known.
    ///
    /// # Errors
    ///
    /// - [`FluxError::MissingRoughness`] if the class is not in the table
    /// - [`FluxError::InvalidInput`] if the tabulated `z_0m` is not positive
    /// - [`FluxError::InvalidGeometry`] if z ≤ 0 or z ≤ `z_0m`
    pub fn derive(
        obs: &PixelObservation,
        table: &RoughnessTable,
        config: &SolverConfig,
    ) -> Result<Self, FluxError> {
        let z_0m = *table
            .momentum_roughness(obs.land_cover)
            .ok_or(FluxError::MissingRoughness(obs.land_cover))?;
        if !z_0m.is_finite() || z_0m <= 0.0 {
            return Err(FluxError::InvalidInput {
                field: "z_0m",
                value: z_0m,
            });
        }

        let d_0 = displacement_height(*obs.element_height, config.displacement_fraction);
        let z = *obs.reference_height - d_0;
        if z <= 0.0 || z <= z_0m {
            return Err(FluxError::InvalidGeometry {
                class: obs.land_cover,
                reference_height: *obs.reference_height,
                displacement_height: d_0,
            });
        }

        Ok(Self {
            z_0m,
            z_0t: z_0m,
            d_0,
            z,
        })
    }

    /// Recompute `z_0t` for a new friction velocity
    ///
    /// # Errors
    ///
    /// Reports a [`UnstableQuantity::ThermalRoughness`] singularity if `z_0t`
    /// underflows to zero or is not finite.
    pub fn refresh_thermal_roughness(
        &mut self,
        u_star: f64,
        kinematic_viscosity: f64,
        model: &KbInverse,
    ) -> Result<(), Singularity> {
        let z_0t = thermal_roughness_length(self.z_0m, u_star, kinematic_viscosity, model);
        if !z_0t.is_finite() || z_0t <= 0.0 {
            return Err(Singularity::new(UnstableQuantity::ThermalRoughness, z_0t));
        }
        self.z_0t = z_0t;
        Ok(())
    }

    /// ln(z / `z_0m`), the neutral momentum log-profile factor
    #[inline]
    pub fn momentum_log_ratio(&self) -> f64 {
        (self.z / self.z_0m).ln()
    }

    /// ln(z / `z_0t`), the neutral heat log-profile factor
    #[inline]
    pub fn heat_log_ratio(&self) -> f64 {
        (self.z / self.z_0t).ln()
    }
}

/// Zero-plane displacement `d_0` = f·`h_0`
#[inline]
pub fn displacement_height(element_height: f64, fraction: f64) -> f64 {
    fraction * element_height
}

/// Roughness Reynolds number Re* = `z_0m`·u*/ν
#[inline]
pub fn roughness_reynolds(z_0m: f64, u_star: f64, kinematic_viscosity: f64) -> f64 {
    z_0m * u_star / kinematic_viscosity
}

/// Thermal roughness length `z_0t` from the `kB⁻¹` parameterization
///
/// `kB⁻¹` is floored at zero, so `z_0t` never exceeds `z_0m`.
pub fn thermal_roughness_length(
    z_0m: f64,
    u_star: f64,
    kinematic_viscosity: f64,
    model: &KbInverse,
) -> f64 {
    let re_star = roughness_reynolds(z_0m, u_star.max(0.0), kinematic_viscosity);
    let kb_inverse = (model.coefficient * re_star.powf(0.25) - model.offset).max(0.0);
    z_0m * (-kb_inverse).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Kelvin, LandCoverClass, Meters, MetersPerSecond};
    use approx::assert_relative_eq;

    fn pixel(class: LandCoverClass, h_0: f64, z_r: f64) -> PixelObservation {
        PixelObservation::new(
            class,
            Kelvin::new(305.0),
            Kelvin::new(300.0),
            MetersPerSecond::new(3.0),
        )
        .with_element_height(Meters::new(h_0))
        .with_reference_height(Meters::new(z_r))
    }

    #[test]
    fn test_low_intensity_urban_geometry() {
        let params = RoughnessParameters::derive(
            &pixel(LandCoverClass::DevelopedLowIntensity, 5.0, 10.0),
            &RoughnessTable::default(),
            &SolverConfig::default(),
        )
        .unwrap();

        assert_eq!(params.z_0m, 0.5);
        assert_relative_eq!(params.d_0, 10.0 / 3.0, max_relative = 1e-12);
        assert_relative_eq!(params.z, 10.0 - 10.0 / 3.0, max_relative = 1e-12);
        assert_eq!(params.z_0t, params.z_0m);
        assert_relative_eq!(params.momentum_log_ratio(), (40.0_f64 / 3.0).ln(), max_relative = 1e-12);
    }

    #[test]
    fn test_reference_below_displacement_is_invalid_for_every_class() {
        let table = RoughnessTable::default();
        let config = SolverConfig::default();
        for class in LandCoverClass::ALL {
            // d_0 = 2/3 · 15 = 10 = z_r
            let at = RoughnessParameters::derive(&pixel(class, 15.0, 10.0), &table, &config);
            assert!(
                matches!(at, Err(FluxError::InvalidGeometry { class: c, .. }) if c == class),
                "{class}: z_r == d_0 must be invalid geometry, got {at:?}"
            );

            let below = RoughnessParameters::derive(&pixel(class, 30.0, 10.0), &table, &config);
            assert!(
                matches!(below, Err(FluxError::InvalidGeometry { .. })),
                "{class}: z_r < d_0 must be invalid geometry, got {below:?}"
            );
        }
    }

    #[test]
    fn test_reference_inside_roughness_sublayer_is_invalid() {
        // z = 10 - 9.8 = 0.2 m < z_0m = 1.5 m
        let result = RoughnessParameters::derive(
            &pixel(LandCoverClass::DevelopedHighIntensity, 14.7, 10.0),
            &RoughnessTable::default(),
            &SolverConfig::default(),
        );
        assert!(matches!(result, Err(FluxError::InvalidGeometry { .. })));
    }

    #[test]
    fn test_missing_and_non_positive_roughness() {
        let obs = pixel(LandCoverClass::Grassland, 0.5, 10.0);
        let config = SolverConfig::default();

        let missing = RoughnessParameters::derive(&obs, &RoughnessTable::empty(), &config);
        assert_eq!(missing, Err(FluxError::MissingRoughness(LandCoverClass::Grassland)));

        let zero_table = RoughnessTable::empty().with_class(LandCoverClass::Grassland, Meters::ZERO);
        let zero = RoughnessParameters::derive(&obs, &zero_table, &config);
        assert!(matches!(zero, Err(FluxError::InvalidInput { field: "z_0m", .. })));
    }

    #[test]
    fn test_thermal_roughness_below_momentum_roughness() {
        let model = KbInverse::default();
        let nu = 1.81e-5 / 1.2;
        let z_0t = thermal_roughness_length(0.5, 0.46, nu, &model);
        assert!(z_0t > 0.0 && z_0t < 0.5);

        // Re* ≈ 15 350, kB⁻¹ ≈ 12.3
        let re = roughness_reynolds(0.5, 0.46, nu);
        let expected = 0.5 * (-(1.29 * re.powf(0.25) - 2.0)).exp();
        assert_relative_eq!(z_0t, expected, max_relative = 1e-12);
    }

    #[test]
    fn test_thermal_roughness_shrinks_as_friction_velocity_grows() {
        let model = KbInverse::default();
        let nu = 1.5e-5;
        let slow = thermal_roughness_length(0.5, 0.2, nu, &model);
        let fast = thermal_roughness_length(0.5, 0.8, nu, &model);
        assert!(fast < slow);
    }

    #[test]
    fn test_calm_limit_keeps_thermal_equal_to_momentum() {
        // Re* = 0 → kB⁻¹ = -b floored to 0
        let z_0t = thermal_roughness_length(0.1, 0.0, 1.5e-5, &KbInverse::default());
        assert_eq!(z_0t, 0.1);
    }

    #[test]
    fn test_refresh_guards_underflow() {
        let mut params = RoughnessParameters {
            z_0m: 1.0,
            z_0t: 1.0,
            d_0: 0.0,
            z: 10.0,
        };
        // Absurd coefficient drives exp(-kB⁻¹) to zero
        let model = KbInverse {
            coefficient: 1e6,
            offset: 0.0,
        };
        let err = params.refresh_thermal_roughness(0.5, 1.5e-5, &model).unwrap_err();
        assert_eq!(err.quantity, UnstableQuantity::ThermalRoughness);
        assert_eq!(params.z_0t, 1.0, "failed refresh leaves state untouched");

        params
            .refresh_thermal_roughness(0.5, 1.5e-5, &KbInverse::default())
            .unwrap();
        assert!(params.z_0t < 1.0);
    }
}
