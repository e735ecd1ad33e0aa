//! Momentum drag coefficient
//!
//! ```text
//! C_D = κ² / [ln(z/z_0m) - ψ_m(ζ)]²
//! ```
//!
//! Under strong instability `ψ_m` grows toward ln(z/`z_0m`) and the bracket
//! collapses. The bracket is rejected once it drops to the configured epsilon:
//! a negative bracket would square back into a plausible-looking but meaningless
//! coefficient.

use crate::error::{Singularity, UnstableQuantity};

/// Stability-corrected log-profile factor, ln(z/z0) - ψ
///
/// # Errors
///
/// Reports `quantity` if the factor is not finite or not above `epsilon`.
#[inline]
pub fn corrected_log_ratio(
    log_ratio: f64,
    psi: f64,
    epsilon: f64,
    quantity: UnstableQuantity,
) -> Result<f64, Singularity> {
    let factor = log_ratio - psi;
    if !factor.is_finite() || factor <= epsilon {
        return Err(Singularity::new(quantity, factor));
    }
    Ok(factor)
}

/// Drag coefficient `C_D`
///
/// # Arguments
///
/// * `momentum_log_ratio` - ln(z/`z_0m`)
/// * `psi_m` - Momentum stability correction
/// * `von_karman` - κ
/// * `epsilon` - Smallest acceptable denominator
///
/// # Errors
///
/// Reports [`UnstableQuantity::DragDenominator`] when ln(z/`z_0m`) - `ψ_m` ≤ epsilon.
pub fn drag_coefficient(
    momentum_log_ratio: f64,
    psi_m: f64,
    von_karman: f64,
    epsilon: f64,
) -> Result<f64, Singularity> {
    let denominator = corrected_log_ratio(
        momentum_log_ratio,
        psi_m,
        epsilon,
        UnstableQuantity::DragDenominator,
    )?;
    Ok((von_karman / denominator).powi(2))
}

/// Neutral drag coefficient κ² / ln²(z/`z_0m`)
#[inline]
pub fn neutral_drag_coefficient(momentum_log_ratio: f64, von_karman: f64) -> f64 {
    (von_karman / momentum_log_ratio).powi(2)
}
