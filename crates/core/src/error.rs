//! Per-pixel failure taxonomy
//!
//! Every failure is local to one pixel's solve. Batch code records the error next
//! to the pixel index and keeps going.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core_types::LandCoverClass;

/// Quantity whose evaluation hit a guarded singularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnstableQuantity {
    /// `ln(z/z_0m) - ψ_m` collapsed to zero or went negative
    DragDenominator,
    /// `ln(z/z_0m) - ψ_m` or `ln(z/z_0t) - ψ_h` collapsed inside `C_H`
    HeatTransferDenominator,
    /// `z_0t` underflowed to zero or became non-finite
    ThermalRoughness,
    /// `u*` came out non-finite or non-positive
    FrictionVelocity,
    /// `Q_H` too close to zero to form the Obukhov length
    ObukhovLength,
    /// `Q_H` came out non-finite
    SensibleHeatFlux,
}

impl fmt::Display for UnstableQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnstableQuantity::DragDenominator => "drag coefficient denominator",
            UnstableQuantity::HeatTransferDenominator => "heat transfer coefficient denominator",
            UnstableQuantity::ThermalRoughness => "thermal roughness length",
            UnstableQuantity::FrictionVelocity => "friction velocity",
            UnstableQuantity::ObukhovLength => "Obukhov length",
            UnstableQuantity::SensibleHeatFlux => "sensible heat flux",
        };
        f.write_str(name)
    }
}

/// A guarded singularity reported by one of the physics components
///
/// Components don't know which iteration they are running in; the solver turns
/// this into [`FluxError::NumericalInstability`] with [`Singularity::at`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Singularity {
    /// What blew up
    pub quantity: UnstableQuantity,
    /// Offending value
    pub value: f64,
}

impl Singularity {
    /// New singularity report
    pub fn new(quantity: UnstableQuantity, value: f64) -> Self {
        Self { quantity, value }
    }

    /// Attach the iteration index
    pub fn at(self, iteration: usize) -> FluxError {
        FluxError::NumericalInstability {
            quantity: self.quantity,
            iteration,
            value: self.value,
        }
    }
}

/// Errors that end a single pixel's solve
#[derive(Debug, Clone, PartialEq)]
pub enum FluxError {
    /// Reference height at or below the displacement height (z = `z_r` - `d_0` ≤ 0),
    /// or so close to it that z ≤ `z_0m` and the log profile is undefined
    InvalidGeometry {
        /// Land-cover class of the pixel
        class: LandCoverClass,
        /// `z_r` (m)
        reference_height: f64,
        /// `d_0` (m)
        displacement_height: f64,
    },
    /// A guarded division or logarithm hit its singularity
    NumericalInstability {
        /// What blew up
        quantity: UnstableQuantity,
        /// Iteration index (0 = seeding)
        iteration: usize,
        /// Offending value (denominator, flux, ...)
        value: f64,
    },
    /// Input value the numerics cannot use (NaN, zero wind, ...)
    InvalidInput {
        /// Field name
        field: &'static str,
        /// Offending value
        value: f64,
    },
    /// Class has no entry in the roughness table
    MissingRoughness(LandCoverClass),
    /// Solver configuration out of range
    InvalidConfig {
        /// Field name
        field: &'static str,
        /// Offending value
        value: f64,
    },
}

/// Coarse failure category used for batch accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// [`FluxError::InvalidGeometry`]
    InvalidGeometry,
    /// [`FluxError::NumericalInstability`]
    NumericalInstability,
    /// Bad inputs, missing roughness or bad configuration
    InvalidInput,
}

impl FluxError {
    /// Category for summaries
    pub fn kind(&self) -> FailureKind {
        match self {
            FluxError::InvalidGeometry { .. } => FailureKind::InvalidGeometry,
            FluxError::NumericalInstability { .. } => FailureKind::NumericalInstability,
            FluxError::InvalidInput { .. }
            | FluxError::MissingRoughness(_)
            | FluxError::InvalidConfig { .. } => FailureKind::InvalidInput,
        }
    }
}

impl fmt::Display for FluxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FluxError::InvalidGeometry {
                class,
                reference_height,
                displacement_height,
            } => write!(
                f,
                "Invalid geometry for {class}: reference height {reference_height:.3} m \
                 does not clear displacement height {displacement_height:.3} m"
            ),
            FluxError::NumericalInstability {
                quantity,
                iteration,
                value,
            } => write!(
                f,
                "Numerical instability in {quantity} at iteration {iteration} (value {value:e})"
            ),
            FluxError::InvalidInput { field, value } => {
                write!(f, "Invalid input {field}: {value}")
            }
            FluxError::MissingRoughness(class) => {
                write!(f, "No roughness length for land-cover class {class}")
            }
            FluxError::InvalidConfig { field, value } => {
                write!(f, "Invalid solver configuration {field}: {value}")
            }
        }
    }
}

impl std::error::Error for FluxError {}
