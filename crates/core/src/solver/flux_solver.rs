//! Fixed-point Monin-Obukhov iteration for one pixel
//!
//! # Iteration
//!
//! The seed (iteration 0) is the neutral log profile:
//!
//! ```text
//! u*_0 = κ·u_r / ln(z/z_0m),  ζ_0 = 0,  Q_H,0 = ρ·c_p·C_H,neutral·u_r·ΔT
//! ```
//!
//! Every following iteration k recomputes, in order:
//!
//! ```text
//! 1. z_0t          from u*_(k-1)
//! 2. C_D           from ψ_m(ζ_(k-1))
//! 3. u*_k        = √C_D · u_r
//! 4. L_k           from u*_k and Q_H,(k-1)
//! 5. ζ_k         = z / L_k            (held at zero in neutral mode)
//! 6. C_H           from ψ_m(ζ_k), ψ_h(ζ_k)
//! 7. Q_H,k
//! ```
//!
//! and stops once |Δ`Q_H`| ≤ max(`absolute_tolerance`, `relative_tolerance`·|`Q_H`|).
//!
//! # Termination
//!
//! - Converged: `Ok` with `converged == true`
//! - Iteration cap reached: `Ok` with `converged == false`, carrying the last state
//! - Guarded singularity or bad input: `Err`, naming the quantity and iteration
//!
//! The loop is bounded by `max_iterations`, so every call terminates.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace, warn};

use crate::config::{SolverConfig, StabilityMode};
use crate::core_types::{MetersPerSecond, PixelObservation, RoughnessTable, WattsPerSquareMeter};
use crate::error::{FluxError, Singularity, UnstableQuantity};
use crate::physics::latent_heat::{LatentHeatFlux, LatentHeatInputs, LatentHeatModel};
use crate::physics::{
    aerodynamic_resistance, drag_coefficient, friction_velocity, heat_transfer_coefficient,
    kinematic_viscosity, neutral_drag_coefficient, neutral_friction_velocity, obukhov_length,
    sensible_heat_flux, stability_parameter, RoughnessParameters, StabilityCorrection,
    StabilityRegime,
};

/// Coupled unknowns after one iteration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationState {
    /// Friction velocity u* (m/s)
    pub u_star: f64,
    /// Stability parameter ζ = z/L
    pub zeta: f64,
    /// Obukhov length L (m); infinite in the neutral limit
    pub obukhov_length: f64,
    /// Drag coefficient `C_D`
    pub drag_coefficient: f64,
    /// Bulk heat transfer coefficient `C_H`
    pub heat_transfer_coefficient: f64,
    /// Sensible heat flux `Q_H` (W/m²)
    pub sensible_heat_flux: f64,
    /// Thermal roughness length `z_0t` used for this iteration (m)
    pub thermal_roughness: f64,
    /// Iteration index (0 = seed)
    pub iteration: usize,
    /// Regime the heat transfer coefficient was evaluated in
    pub regime: StabilityRegime,
}

impl IterationState {
    fn check_seed(&self) -> Result<(), FluxError> {
        if !self.u_star.is_finite() || self.u_star <= 0.0 {
            return Err(FluxError::InvalidInput {
                field: "seed.u_star",
                value: self.u_star,
            });
        }
        for (field, value) in [
            ("seed.zeta", self.zeta),
            ("seed.sensible_heat_flux", self.sensible_heat_flux),
        ] {
            if !value.is_finite() {
                return Err(FluxError::InvalidInput { field, value });
            }
        }
        Ok(())
    }
}

/// Terminal result of one solve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceResult {
    /// Whether the tolerance was met within the iteration cap
    pub converged: bool,
    /// Final (best available) state
    pub state: IterationState,
    /// Iterations performed, not counting the seed
    pub iterations: usize,
    /// Roughness geometry, with `z_0t` from the final iteration
    pub roughness: RoughnessParameters,
    /// |Δ`Q_H`| between the last two iterations (W/m²)
    pub last_change: f64,
    /// Reference wind speed the pixel was solved for
    pub wind_speed: MetersPerSecond,
}

impl ConvergenceResult {
    /// Final `Q_H`
    pub fn sensible_heat_flux(&self) -> WattsPerSquareMeter {
        WattsPerSquareMeter::from(self.state.sensible_heat_flux)
    }

    /// Aerodynamic resistance to heat transfer `r_a` = 1/(`C_H`·`u_r`) (s/m)
    pub fn aerodynamic_resistance(&self) -> f64 {
        aerodynamic_resistance(self.state.heat_transfer_coefficient, *self.wind_speed)
    }

    /// Warning for a result that hit the iteration cap, `None` if converged
    pub fn non_convergence_warning(&self) -> Option<NonConvergenceWarning> {
        (!self.converged).then_some(NonConvergenceWarning {
            iterations: self.iterations,
            last_change: self.last_change,
            sensible_heat_flux: self.state.sensible_heat_flux,
        })
    }

    /// Latent heat flux driven by this result's aerodynamic resistance
    ///
    /// # Errors
    ///
    /// Returns [`FluxError::InvalidInput`] for unusable moisture or canopy inputs.
    pub fn latent_heat_flux(
        &self,
        model: &LatentHeatModel,
        obs: &PixelObservation,
        inputs: &LatentHeatInputs,
    ) -> Result<LatentHeatFlux, FluxError> {
        model.flux(
            obs.surface_temperature,
            obs.air_temperature,
            inputs,
            self.aerodynamic_resistance(),
        )
    }
}

/// Non-fatal report that the iteration cap was reached
///
/// The caller decides whether the best estimate is good enough to keep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonConvergenceWarning {
    /// Iterations performed
    pub iterations: usize,
    /// Last |Δ`Q_H`| (W/m²)
    pub last_change: f64,
    /// Best available `Q_H` (W/m²)
    pub sensible_heat_flux: f64,
}

impl fmt::Display for NonConvergenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sensible heat flux did not converge after {} iterations \
             (last change {:.3e} W/m², estimate {:.2} W/m²)",
            self.iterations, self.last_change, self.sensible_heat_flux
        )
    }
}

/// Monin-Obukhov sensible heat flux solver
///
/// Holds only read-only configuration and the roughness table, so one solver
/// can be shared across rayon workers.
#[derive(Debug, Clone)]
pub struct FluxSolver {
    config: SolverConfig,
    table: RoughnessTable,
}

impl Default for FluxSolver {
    fn default() -> Self {
        Self {
            config: SolverConfig::default(),
            table: RoughnessTable::nlcd(),
        }
    }
}

impl FluxSolver {
    /// Create a solver
    ///
    /// # Errors
    ///
    /// Returns [`FluxError::InvalidConfig`] if the configuration does not validate.
    pub fn new(config: SolverConfig, table: &RoughnessTable) -> Result<Self, FluxError> {
        config.validate()?;
        Ok(Self {
            config,
            table: table.clone(),
        })
    }

    /// Solver configuration
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Neutral seed state (iteration 0) for a pixel
    ///
    /// # Errors
    ///
    /// Same input and geometry errors as [`FluxSolver::solve`]; seed singularities
    /// are reported at iteration 0.
    pub fn neutral_seed(&self, obs: &PixelObservation) -> Result<IterationState, FluxError> {
        obs.validate()?;
        let mut roughness = RoughnessParameters::derive(obs, &self.table, &self.config)?;
        self.seed_state(obs, &mut roughness)
    }

    /// Solve one pixel from the neutral seed
    ///
    /// # Errors
    ///
    /// - [`FluxError::InvalidInput`] or [`FluxError::MissingRoughness`] for bad inputs
    /// - [`FluxError::InvalidGeometry`] if the reference height does not clear `d_0`
    /// - [`FluxError::NumericalInstability`] when a guarded quantity collapses
    pub fn solve(&self, obs: &PixelObservation) -> Result<ConvergenceResult, FluxError> {
        obs.validate()?;
        let mut roughness = RoughnessParameters::derive(obs, &self.table, &self.config)?;
        let seed = self.seed_state(obs, &mut roughness)?;
        self.iterate(obs, roughness, seed)
    }

    /// Solve one pixel starting from a previous state
    ///
    /// Used to continue a time series and to check that a converged state is a
    /// fixed point. Only u*, ζ and `Q_H` of the seed are read.
    ///
    /// # Errors
    ///
    /// As [`FluxSolver::solve`], plus [`FluxError::InvalidInput`] for a seed with
    /// non-positive u* or non-finite ζ or `Q_H`.
    pub fn solve_with_seed(
        &self,
        obs: &PixelObservation,
        seed: &IterationState,
    ) -> Result<ConvergenceResult, FluxError> {
        obs.validate()?;
        seed.check_seed()?;
        let roughness = RoughnessParameters::derive(obs, &self.table, &self.config)?;
        let seed = IterationState {
            iteration: 0,
            ..*seed
        };
        self.iterate(obs, roughness, seed)
    }

    fn seed_state(
        &self,
        obs: &PixelObservation,
        roughness: &mut RoughnessParameters,
    ) -> Result<IterationState, FluxError> {
        let kappa = self.config.constants.von_karman;
        let wind = *obs.wind_speed;
        let ln_m = roughness.momentum_log_ratio();

        let u_star = neutral_friction_velocity(wind, ln_m, kappa);
        let nu = kinematic_viscosity(self.config.constants.dynamic_viscosity, obs.air_density);
        roughness
            .refresh_thermal_roughness(u_star, nu, &self.config.thermal_roughness)
            .map_err(|s| s.at(0))?;

        let c_h = heat_transfer_coefficient(
            roughness,
            &StabilityCorrection::NEUTRAL,
            kappa,
            self.config.denominator_epsilon,
        )
        .map_err(|s| s.at(0))?;
        let q_h = sensible_heat_flux(
            obs.air_density,
            obs.specific_heat,
            c_h,
            wind,
            obs.temperature_difference().value(),
        );

        Ok(IterationState {
            u_star,
            zeta: 0.0,
            obukhov_length: f64::INFINITY,
            drag_coefficient: neutral_drag_coefficient(ln_m, kappa),
            heat_transfer_coefficient: c_h,
            sensible_heat_flux: q_h,
            thermal_roughness: roughness.z_0t,
            iteration: 0,
            regime: StabilityRegime::Unstable,
        })
    }

    fn step(
        &self,
        obs: &PixelObservation,
        roughness: &mut RoughnessParameters,
        previous: &IterationState,
    ) -> Result<IterationState, Singularity> {
        let config = &self.config;
        let kappa = config.constants.von_karman;
        let eps = config.denominator_epsilon;
        let wind = *obs.wind_speed;

        let nu = kinematic_viscosity(config.constants.dynamic_viscosity, obs.air_density);
        roughness.refresh_thermal_roughness(previous.u_star, nu, &config.thermal_roughness)?;

        let prior = self.correction(previous.zeta);
        let c_d = drag_coefficient(roughness.momentum_log_ratio(), prior.psi_m, kappa, eps)?;
        let u_star = friction_velocity(c_d, wind)?;

        let (obukhov, zeta) = match config.stability_mode {
            StabilityMode::Neutral => (f64::INFINITY, 0.0),
            StabilityMode::MoninObukhov => {
                let length = obukhov_length(
                    obs.air_density,
                    obs.specific_heat,
                    u_star,
                    *obs.air_temperature,
                    previous.sensible_heat_flux,
                    config,
                )?;
                (length, stability_parameter(roughness.z, length))
            }
        };

        let correction = self.correction(zeta);
        let c_h = heat_transfer_coefficient(roughness, &correction, kappa, eps)?;
        let q_h = sensible_heat_flux(
            obs.air_density,
            obs.specific_heat,
            c_h,
            wind,
            obs.temperature_difference().value(),
        );
        if !q_h.is_finite() {
            return Err(Singularity::new(UnstableQuantity::SensibleHeatFlux, q_h));
        }

        Ok(IterationState {
            u_star,
            zeta,
            obukhov_length: obukhov,
            drag_coefficient: c_d,
            heat_transfer_coefficient: c_h,
            sensible_heat_flux: q_h,
            thermal_roughness: roughness.z_0t,
            iteration: previous.iteration + 1,
            regime: correction.regime,
        })
    }

    fn correction(&self, zeta: f64) -> StabilityCorrection {
        match self.config.stability_mode {
            StabilityMode::Neutral => StabilityCorrection::NEUTRAL,
            StabilityMode::MoninObukhov => StabilityCorrection::evaluate(zeta, &self.config.stability),
        }
    }

    fn converged(&self, change: f64, q_h: f64) -> bool {
        let tolerance = self
            .config
            .absolute_tolerance
            .max(self.config.relative_tolerance * q_h.abs());
        change <= tolerance
    }

    fn iterate(
        &self,
        obs: &PixelObservation,
        mut roughness: RoughnessParameters,
        seed: IterationState,
    ) -> Result<ConvergenceResult, FluxError> {
        let mut state = seed;
        let mut last_change = f64::INFINITY;

        for iteration in 1..=self.config.max_iterations {
            let next = self.step(obs, &mut roughness, &state).map_err(|s| {
                debug!(
                    class = %obs.land_cover,
                    iteration,
                    quantity = %s.quantity,
                    value = s.value,
                    "Solve diverged"
                );
                s.at(iteration)
            })?;

            last_change = (next.sensible_heat_flux - state.sensible_heat_flux).abs();
            trace!(
                iteration,
                u_star = next.u_star,
                zeta = next.zeta,
                obukhov_length = next.obukhov_length,
                c_h = next.heat_transfer_coefficient,
                q_h = next.sensible_heat_flux,
                delta = last_change,
                "MOST iteration"
            );
            state = next;

            if self.converged(last_change, state.sensible_heat_flux) {
                debug!(
                    class = %obs.land_cover,
                    iterations = iteration,
                    q_h = state.sensible_heat_flux,
                    "Solve converged"
                );
                return Ok(ConvergenceResult {
                    converged: true,
                    state,
                    iterations: iteration,
                    roughness,
                    last_change,
                    wind_speed: obs.wind_speed,
                });
            }
        }

        let result = ConvergenceResult {
            converged: false,
            state,
            iterations: self.config.max_iterations,
            roughness,
            last_change,
            wind_speed: obs.wind_speed,
        };
        if let Some(warning) = result.non_convergence_warning() {
            warn!(class = %obs.land_cover, "{warning}");
        }
        Ok(result)
    }
}
