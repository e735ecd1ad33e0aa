//! Sensible heat flux solver
//!
//! [`FluxSolver`] runs the fixed-point iteration for one pixel. [`solve_batch`]
//! fans a scene out over rayon and [`solve_series`] walks one pixel through time
//! with warm starts.
//!
//! # Example
//!
//! ```rust
//! use heatflux_core::core_types::{Kelvin, LandCoverClass, MetersPerSecond, PixelObservation};
//! use heatflux_core::solver::FluxSolver;
//!
//! let obs = PixelObservation::new(
//!     LandCoverClass::DevelopedLowIntensity,
//!     Kelvin::new(305.0),
//!     Kelvin::new(300.0),
//!     MetersPerSecond::new(3.0),
//! );
//! let result = FluxSolver::default().solve(&obs).expect("valid pixel");
//! assert!(result.converged);
//! assert!(*result.sensible_heat_flux() > 0.0);
//! ```

mod batch;
mod flux_solver;
mod series;

pub use batch::{solve_batch, BatchReport, BatchSummary};
pub use flux_solver::{ConvergenceResult, FluxSolver, IterationState, NonConvergenceWarning};
pub use series::{solve_series, solve_series_batch};
