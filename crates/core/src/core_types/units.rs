//! Semantic unit types for the surface-flux inputs and outputs
//!
//! Newtype wrappers keep temperatures, heights, wind speeds and fluxes from being
//! mixed up at the API boundary (e.g. passing a Celsius air temperature where the
//! solver expects Kelvin, or a reference height where a canopy height belongs).
//!
//! # Design Philosophy
//! - All quantities are `f64`: the solver takes logarithms of small roughness
//!   lengths and cubes friction velocity, so single precision is not enough
//! - Inner arithmetic of the solver works on raw `f64` via `Deref`
//! - Total ordering via `Ord` (NaN sorts above everything, as `total_cmp` does)
//! - Validated constructors; `From<f64>` is unchecked and meant for deserialized data
//!
//! # Usage
//! ```
//! use heatflux_core::core_types::units::{Celsius, Kelvin};
//!
//! let air = Celsius::new(26.85);
//! let kelvin: Kelvin = air.into();
//! assert!((*kelvin - 300.0).abs() < 1e-9);
//!
//! let surface = Kelvin::new(305.0);
//! let delta = surface - kelvin;
//! assert!((delta.value() - 5.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Deref, Mul, Neg, Sub};

/// Compare f64 values with total ordering
#[inline]
fn f64_total_cmp(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

// ============================================================================
// TEMPERATURE TYPES
// ============================================================================

/// Temperature in degrees Celsius
///
/// Only used at the edges (station data is usually reported in Celsius);
/// the solver itself works in Kelvin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Celsius(f64);

impl Eq for Celsius {}

impl PartialOrd for Celsius {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Celsius {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Celsius {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Celsius {
    /// Celsius to Kelvin conversion offset (0°C = 273.15 K)
    const CELSIUS_KELVIN_OFFSET: f64 = 273.15;

    /// Create a new Celsius temperature. Asserts value >= absolute zero (-273.15°C).
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(
            value >= -Self::CELSIUS_KELVIN_OFFSET,
            "Celsius::new: value is below absolute zero (-273.15°C)"
        );
        Celsius(value)
    }

    /// Convert to Kelvin
    #[inline]
    #[must_use]
    pub fn to_kelvin(self) -> Kelvin {
        Kelvin(self.0 + Self::CELSIUS_KELVIN_OFFSET)
    }
}

impl From<Celsius> for Kelvin {
    fn from(c: Celsius) -> Kelvin {
        c.to_kelvin()
    }
}

impl From<f64> for Celsius {
    fn from(v: f64) -> Self {
        Celsius(v)
    }
}

impl fmt::Display for Celsius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}°C", self.0)
    }
}

/// Absolute temperature in Kelvin
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Kelvin(f64);

impl Eq for Kelvin {}

impl PartialOrd for Kelvin {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Kelvin {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Kelvin {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Kelvin {
    /// Create a new Kelvin temperature. Asserts value >= absolute zero (0 K).
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(value >= 0.0, "Kelvin::new: value is below absolute zero (0 K)");
        Kelvin(value)
    }

    /// Convert to Celsius
    #[inline]
    #[must_use]
    pub fn to_celsius(self) -> Celsius {
        Celsius(self.0 - Celsius::CELSIUS_KELVIN_OFFSET)
    }
}

impl From<Kelvin> for Celsius {
    fn from(k: Kelvin) -> Celsius {
        k.to_celsius()
    }
}

impl From<f64> for Kelvin {
    fn from(v: f64) -> Self {
        Kelvin(v)
    }
}

impl From<Kelvin> for f64 {
    fn from(k: Kelvin) -> f64 {
        k.0
    }
}

impl Sub for Kelvin {
    type Output = KelvinDelta;

    fn sub(self, rhs: Kelvin) -> KelvinDelta {
        KelvinDelta(self.0 - rhs.0)
    }
}

impl Add<KelvinDelta> for Kelvin {
    type Output = Kelvin;

    fn add(self, rhs: KelvinDelta) -> Kelvin {
        Kelvin(self.0 + rhs.0)
    }
}

impl fmt::Display for Kelvin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} K", self.0)
    }
}

/// Temperature difference in Kelvin
///
/// Positive when the first operand is warmer. For `T_lst - T_air` a positive
/// delta means the surface heats the air (unstable surface layer).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct KelvinDelta(f64);

impl KelvinDelta {
    /// Create a temperature delta (any sign)
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        KelvinDelta(value)
    }

    /// Get the raw f64 value
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Neg for KelvinDelta {
    type Output = KelvinDelta;

    fn neg(self) -> KelvinDelta {
        KelvinDelta(-self.0)
    }
}

impl Mul<f64> for KelvinDelta {
    type Output = KelvinDelta;

    fn mul(self, rhs: f64) -> KelvinDelta {
        KelvinDelta(self.0 * rhs)
    }
}

impl fmt::Display for KelvinDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+.2} K", self.0)
    }
}

// ============================================================================
// LENGTH AND VELOCITY
// ============================================================================

/// Length in meters (heights, roughness lengths)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Meters(f64);

impl Eq for Meters {}

impl PartialOrd for Meters {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Meters {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Meters {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Meters {
    /// Zero length
    pub const ZERO: Meters = Meters(0.0);

    /// Create a new length. Asserts value is non-negative.
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(value >= 0.0, "Meters::new: length cannot be negative");
        Meters(value)
    }
}

impl From<f64> for Meters {
    fn from(v: f64) -> Self {
        Meters(v)
    }
}

impl From<Meters> for f64 {
    fn from(m: Meters) -> f64 {
        m.0
    }
}

impl Mul<f64> for Meters {
    type Output = Meters;

    fn mul(self, rhs: f64) -> Meters {
        Meters(self.0 * rhs)
    }
}

impl fmt::Display for Meters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} m", self.0)
    }
}

/// Speed in meters per second
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MetersPerSecond(f64);

impl Eq for MetersPerSecond {}

impl PartialOrd for MetersPerSecond {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetersPerSecond {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for MetersPerSecond {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl MetersPerSecond {
    /// Create a new speed. Asserts value is non-negative.
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(value >= 0.0, "MetersPerSecond::new: speed cannot be negative");
        MetersPerSecond(value)
    }
}

impl From<f64> for MetersPerSecond {
    fn from(v: f64) -> Self {
        MetersPerSecond(v)
    }
}

impl fmt::Display for MetersPerSecond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} m/s", self.0)
    }
}

// ============================================================================
// FLUX
// ============================================================================

/// Energy flux density in W/m²
///
/// Sign convention: positive is upward (surface to atmosphere).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct WattsPerSquareMeter(f64);

impl Eq for WattsPerSquareMeter {}

impl PartialOrd for WattsPerSquareMeter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WattsPerSquareMeter {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for WattsPerSquareMeter {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl WattsPerSquareMeter {
    /// Create a flux (any sign)
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        WattsPerSquareMeter(value)
    }
}

impl From<f64> for WattsPerSquareMeter {
    fn from(v: f64) -> Self {
        WattsPerSquareMeter(v)
    }
}

impl Add for WattsPerSquareMeter {
    type Output = WattsPerSquareMeter;

    fn add(self, rhs: WattsPerSquareMeter) -> WattsPerSquareMeter {
        WattsPerSquareMeter(self.0 + rhs.0)
    }
}

impl fmt::Display for WattsPerSquareMeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} W/m²", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_celsius_kelvin_round_trip() {
        let c = Celsius::new(26.85);
        let k = c.to_kelvin();
        assert!((*k - 300.0).abs() < 1e-9);
        assert!((*k.to_celsius() - 26.85).abs() < 1e-9);
    }

    #[test]
    fn test_kelvin_difference_sign() {
        let surface = Kelvin::new(295.0);
        let air = Kelvin::new(300.0);
        let delta = surface - air;
        assert!(delta.value() < 0.0, "cool surface gives negative delta");
        assert_eq!((-delta).value(), 5.0);
        assert_eq!(*(air + delta), 295.0);
    }

    #[test]
    #[should_panic(expected = "below absolute zero")]
    fn test_kelvin_rejects_negative() {
        let _ = Kelvin::new(-1.0);
    }

    #[test]
    #[should_panic(expected = "cannot be negative")]
    fn test_meters_rejects_negative() {
        let _ = Meters::new(-0.5);
    }

    #[test]
    fn test_total_ordering_handles_nan() {
        let nan = WattsPerSquareMeter::from(f64::NAN);
        let flux = WattsPerSquareMeter::new(120.0);
        assert!(flux < nan);
        assert_eq!(flux.max(WattsPerSquareMeter::new(-3.0)), flux);
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(Kelvin::new(300.0).to_string(), "300.00 K");
        assert_eq!(KelvinDelta::new(5.0).to_string(), "+5.00 K");
        assert_eq!(WattsPerSquareMeter::new(85.123).to_string(), "85.12 W/m²");
        assert_eq!(Meters::new(0.5).to_string(), "0.500 m");
    }
}
