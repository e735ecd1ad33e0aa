//! Core types and utilities

pub mod land_cover;
pub mod observation;
pub mod units;

pub use land_cover::{LandCoverClass, RoughnessTable};
pub use observation::PixelObservation;
pub use units::*;
