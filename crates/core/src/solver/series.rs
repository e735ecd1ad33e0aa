//! Time-series continuation
//!
//! Successive timesteps of one pixel change slowly, so each step starts from the
//! previous converged state instead of the neutral seed. After a failure or a
//! non-converged step the next one falls back to the neutral seed.

use rayon::prelude::*;
use tracing::debug;

use super::flux_solver::{ConvergenceResult, FluxSolver, IterationState};
use crate::core_types::PixelObservation;
use crate::error::FluxError;

/// Solve one pixel's time series in order, warm-starting each step
pub fn solve_series(
    solver: &FluxSolver,
    series: &[PixelObservation],
) -> Vec<Result<ConvergenceResult, FluxError>> {
    let mut previous: Option<IterationState> = None;

    series
        .iter()
        .enumerate()
        .map(|(step, obs)| {
            let result = match &previous {
                Some(seed) => solver.solve_with_seed(obs, seed),
                None => solver.solve(obs),
            };
            previous = match &result {
                Ok(r) if r.converged => Some(r.state),
                _ => {
                    debug!(step, "Series step not converged, next step uses the neutral seed");
                    None
                }
            };
            result
        })
        .collect()
}

/// Solve many pixel time series in parallel (one rayon task per pixel)
pub fn solve_series_batch(
    solver: &FluxSolver,
    pixels: &[Vec<PixelObservation>],
) -> Vec<Vec<Result<ConvergenceResult, FluxError>>> {
    pixels
        .par_iter()
        .map(|series| solve_series(solver, series))
        .collect()
}
