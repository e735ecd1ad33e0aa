//! Sensible Heat Flux Core Library
//!
//! Estimates the turbulent sensible heat flux `Q_H` leaving each pixel of a
//! land-surface-temperature scene, using Monin-Obukhov Similarity Theory (MOST).
//!
//! The friction velocity, Obukhov length, stability parameter, heat transfer
//! coefficient and flux depend on each other in a cycle. [`FluxSolver`] resolves
//! it by bounded fixed-point iteration, switching between stable and unstable
//! stability functions from the sign of ζ at every step.
//!
//! ## Layout
//!
//! - [`core_types`]: unit newtypes, land cover, per-pixel observations
//! - [`config`]: solver tolerances and physical constants
//! - [`physics`]: roughness, stability, drag, Obukhov length, heat transfer,
//!   plus the latent heat companion model
//! - [`solver`]: single-pixel solve, rayon batch, time-series continuation
//! - [`error`]: per-pixel failure taxonomy
//!
//! Solves share nothing mutable: a batch is one `par_iter` over pixels.

pub mod config;
pub mod core_types;
pub mod error;
pub mod physics;
pub mod solver;

// Re-export core types
pub use core_types::{
    Celsius, Kelvin, KelvinDelta, LandCoverClass, Meters, MetersPerSecond, PixelObservation,
    RoughnessTable, WattsPerSquareMeter,
};

pub use config::{KbInverse, PhysicalConstants, SolverConfig, StabilityConstants, StabilityMode};
pub use error::{FailureKind, FluxError, UnstableQuantity};
pub use physics::{LatentHeatFlux, LatentHeatInputs, LatentHeatModel};
pub use physics::{RoughnessParameters, StabilityCorrection, StabilityRegime};
pub use solver::{
    solve_batch, solve_series, solve_series_batch, BatchReport, BatchSummary, ConvergenceResult,
    FluxSolver, IterationState, NonConvergenceWarning,
};
