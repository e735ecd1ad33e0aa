//! Parallel per-pixel solves
//!
//! Pixels are independent, so a scene is solved with a plain rayon `par_iter`
//! over the observations. Results come back in input order and one pixel's
//! failure never affects another.

use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use tracing::info;

use super::flux_solver::{ConvergenceResult, FluxSolver};
use crate::core_types::PixelObservation;
use crate::error::{FailureKind, FluxError};

/// Outcome of every pixel in a batch, indexed like the input
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// One entry per input pixel, same order
    pub results: Vec<Result<ConvergenceResult, FluxError>>,
    /// Counts by outcome
    pub summary: BatchSummary,
}

impl BatchReport {
    /// Build a report (and its summary) from per-pixel results
    pub fn from_results(results: Vec<Result<ConvergenceResult, FluxError>>) -> Self {
        let summary = BatchSummary::from_results(&results);
        Self { results, summary }
    }

    /// Converged results with their pixel index
    pub fn converged(&self) -> impl Iterator<Item = (usize, &ConvergenceResult)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(index, result)| match result {
                Ok(r) if r.converged => Some((index, r)),
                _ => None,
            })
    }

    /// Failed pixels with their index and error
    pub fn failures(&self) -> impl Iterator<Item = (usize, &FluxError)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(index, result)| result.as_ref().err().map(|e| (index, e)))
    }
}

/// Batch-level counts of converged, non-converged and failed pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Pixels submitted
    pub total: usize,
    /// Met the tolerance
    pub converged: usize,
    /// Reached the iteration cap
    pub not_converged: usize,
    /// Reference height did not clear the displacement height
    pub invalid_geometry: usize,
    /// Diverged on a guarded singularity
    pub numerical_instability: usize,
    /// Rejected inputs (bad values, missing roughness)
    pub invalid_input: usize,
    /// Mean `Q_H` over converged pixels (W/m²)
    pub mean_sensible_heat_flux: Option<f64>,
}

impl BatchSummary {
    /// Tally a slice of per-pixel results
    pub fn from_results(results: &[Result<ConvergenceResult, FluxError>]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        let mut flux_sum = 0.0;

        for result in results {
            match result {
                Ok(r) if r.converged => {
                    summary.converged += 1;
                    flux_sum += r.state.sensible_heat_flux;
                }
                Ok(_) => summary.not_converged += 1,
                Err(e) => match e.kind() {
                    FailureKind::InvalidGeometry => summary.invalid_geometry += 1,
                    FailureKind::NumericalInstability => summary.numerical_instability += 1,
                    FailureKind::InvalidInput => summary.invalid_input += 1,
                },
            }
        }

        if summary.converged > 0 {
            summary.mean_sensible_heat_flux = Some(flux_sum / summary.converged as f64);
        }
        summary
    }

    /// Pixels that ended in an error
    pub fn failed(&self) -> usize {
        self.invalid_geometry + self.numerical_instability + self.invalid_input
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pixels: {} converged, {} not converged, {} failed \
             ({} invalid geometry, {} numerical instability, {} invalid input)",
            self.total,
            self.converged,
            self.not_converged,
            self.failed(),
            self.invalid_geometry,
            self.numerical_instability,
            self.invalid_input
        )?;
        if let Some(mean) = self.mean_sensible_heat_flux {
            write!(f, ", mean Q_H {mean:.2} W/m²")?;
        }
        Ok(())
    }
}

/// Solve every pixel in parallel
pub fn solve_batch(solver: &FluxSolver, observations: &[PixelObservation]) -> BatchReport {
    info!(pixels = observations.len(), "Starting batch solve");

    let results: Vec<_> = observations.par_iter().map(|obs| solver.solve(obs)).collect();
    let report = BatchReport::from_results(results);

    info!(
        converged = report.summary.converged,
        not_converged = report.summary.not_converged,
        failed = report.summary.failed(),
        "Batch solve finished"
    );
    report
}
