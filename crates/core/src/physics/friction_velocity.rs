//! Friction velocity
//!
//! u* = √`C_D` · `u_r`

use crate::error::{Singularity, UnstableQuantity};

/// Friction velocity from the drag coefficient and the reference wind speed
///
/// # Errors
///
/// Reports [`UnstableQuantity::FrictionVelocity`] if the result is not finite or
/// not positive (a bad `C_D` propagated from upstream).
pub fn friction_velocity(drag_coefficient: f64, wind_speed: f64) -> Result<f64, Singularity> {
    let u_star = drag_coefficient.sqrt() * wind_speed;
    if !u_star.is_finite() || u_star <= 0.0 {
        return Err(Singularity::new(UnstableQuantity::FrictionVelocity, u_star));
    }
    Ok(u_star)
}

/// Neutral log-wind-profile estimate u* = κ·`u_r` / ln(z/`z_0m`), the usual seed
#[inline]
pub fn neutral_friction_velocity(wind_speed: f64, momentum_log_ratio: f64, von_karman: f64) -> f64 {
    von_karman * wind_speed / momentum_log_ratio
}
