//! Surface-layer physics components
//!
//! Each module is one link of the Monin-Obukhov dependency cycle
//! u* → L → ζ → ψ → `C_H` → `Q_H` → L. The components are pure functions of their
//! inputs; guarded singularities come back as [`crate::error::Singularity`] and
//! the solver attaches the iteration index.

pub mod drag;
pub mod friction_velocity;
pub mod heat_transfer;
pub mod latent_heat;
pub mod moisture;
pub mod obukhov;
pub mod roughness;
pub mod stability;

pub use drag::{drag_coefficient, neutral_drag_coefficient};
pub use friction_velocity::{friction_velocity, neutral_friction_velocity};
pub use heat_transfer::{
    aerodynamic_resistance, heat_transfer_coefficient, kinematic_viscosity, sensible_heat_flux,
};
pub use latent_heat::{LatentHeatFlux, LatentHeatInputs, LatentHeatModel};
pub use obukhov::{obukhov_length, stability_parameter};
pub use roughness::RoughnessParameters;
pub use stability::{StabilityCorrection, StabilityRegime};
