//! Land-cover classification and the aerodynamic roughness lookup
//!
//! Classes follow the National Land Cover Database (NLCD) legend, which is what the
//! land-cover ingestion step hands to the flux core. The roughness table is the
//! only place land-cover data enters the physics: each class maps to a momentum
//! roughness length `z_0m`.
//!
//! # Scientific References
//!
//! - Wieringa, J. (1993). "Representative roughness parameters for homogeneous
//!   terrain." Boundary-Layer Meteorology 63:323-363.
//! - Grimmond, C.S.B. and Oke, T.R. (1999). "Aerodynamic properties of urban areas
//!   derived from analysis of surface form." J. Applied Meteorology 38:1262-1292.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::units::Meters;

/// Standard anemometer/screen reference height (m)
pub const STANDARD_REFERENCE_HEIGHT: f64 = 10.0;

/// NLCD land-cover class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LandCoverClass {
    /// 11 - Open water
    OpenWater,
    /// 12 - Perennial ice/snow
    PerennialIceSnow,
    /// 21 - Developed, open space (parks, large-lot housing)
    DevelopedOpenSpace,
    /// 22 - Developed, low intensity (single-family housing)
    DevelopedLowIntensity,
    /// 23 - Developed, medium intensity
    DevelopedMediumIntensity,
    /// 24 - Developed, high intensity (apartments, commercial cores)
    DevelopedHighIntensity,
    /// 31 - Barren land (rock, sand, clay)
    BarrenLand,
    /// 41 - Deciduous forest
    DeciduousForest,
    /// 42 - Evergreen forest
    EvergreenForest,
    /// 43 - Mixed forest
    MixedForest,
    /// 52 - Shrub/scrub
    ShrubScrub,
    /// 71 - Grassland/herbaceous
    Grassland,
    /// 81 - Pasture/hay
    PastureHay,
    /// 82 - Cultivated crops
    CultivatedCrops,
    /// 90 - Woody wetlands
    WoodyWetlands,
    /// 95 - Emergent herbaceous wetlands
    EmergentHerbaceousWetlands,
}

impl LandCoverClass {
    /// Every class, in NLCD code order
    pub const ALL: [LandCoverClass; 16] = [
        Self::OpenWater,
        Self::PerennialIceSnow,
        Self::DevelopedOpenSpace,
        Self::DevelopedLowIntensity,
        Self::DevelopedMediumIntensity,
        Self::DevelopedHighIntensity,
        Self::BarrenLand,
        Self::DeciduousForest,
        Self::EvergreenForest,
        Self::MixedForest,
        Self::ShrubScrub,
        Self::Grassland,
        Self::PastureHay,
        Self::CultivatedCrops,
        Self::WoodyWetlands,
        Self::EmergentHerbaceousWetlands,
    ];

    /// Parse an NLCD integer code. Returns `None` for codes outside the legend
    /// (including 0 / 250 no-data fill values).
    pub fn from_nlcd_code(code: u8) -> Option<Self> {
        let class = match code {
            11 => Self::OpenWater,
            12 => Self::PerennialIceSnow,
            21 => Self::DevelopedOpenSpace,
            22 => Self::DevelopedLowIntensity,
            23 => Self::DevelopedMediumIntensity,
            24 => Self::DevelopedHighIntensity,
            31 => Self::BarrenLand,
            41 => Self::DeciduousForest,
            42 => Self::EvergreenForest,
            43 => Self::MixedForest,
            52 => Self::ShrubScrub,
            71 => Self::Grassland,
            81 => Self::PastureHay,
            82 => Self::CultivatedCrops,
            90 => Self::WoodyWetlands,
            95 => Self::EmergentHerbaceousWetlands,
            _ => return None,
        };
        Some(class)
    }

    /// NLCD integer code for this class
    pub const fn nlcd_code(self) -> u8 {
        match self {
            Self::OpenWater => 11,
            Self::PerennialIceSnow => 12,
            Self::DevelopedOpenSpace => 21,
            Self::DevelopedLowIntensity => 22,
            Self::DevelopedMediumIntensity => 23,
            Self::DevelopedHighIntensity => 24,
            Self::BarrenLand => 31,
            Self::DeciduousForest => 41,
            Self::EvergreenForest => 42,
            Self::MixedForest => 43,
            Self::ShrubScrub => 52,
            Self::Grassland => 71,
            Self::PastureHay => 81,
            Self::CultivatedCrops => 82,
            Self::WoodyWetlands => 90,
            Self::EmergentHerbaceousWetlands => 95,
        }
    }

    /// Typical roughness-element height `h_0` for the class
    ///
    /// Used when no canopy/building height raster is available for a pixel.
    /// Built-up classes use mean building height, vegetated classes canopy height.
    pub const fn typical_element_height(self) -> Meters {
        let h = match self {
            Self::OpenWater | Self::PerennialIceSnow => 0.0,
            Self::BarrenLand => 0.2,
            Self::Grassland | Self::PastureHay | Self::EmergentHerbaceousWetlands => 0.5,
            Self::CultivatedCrops => 1.0,
            Self::ShrubScrub => 1.5,
            Self::DevelopedOpenSpace => 2.0,
            Self::DevelopedLowIntensity => 5.0,
            Self::DevelopedMediumIntensity => 10.0,
            Self::WoodyWetlands => 12.0,
            Self::DeciduousForest => 15.0,
            Self::MixedForest => 16.0,
            Self::EvergreenForest => 18.0,
            Self::DevelopedHighIntensity => 20.0,
        };
        Meters::new(h)
    }

    /// Default reference height `z_r` for the class
    ///
    /// 10 m over low surfaces, raised to the blending height 2·`h_0` over tall
    /// canopies and buildings so the reference level stays above the
    /// displacement height.
    pub fn default_reference_height(self) -> Meters {
        Meters::new((2.0 * *self.typical_element_height()).max(STANDARD_REFERENCE_HEIGHT))
    }
}

impl fmt::Display for LandCoverClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OpenWater => "open water",
            Self::PerennialIceSnow => "perennial ice/snow",
            Self::DevelopedOpenSpace => "developed, open space",
            Self::DevelopedLowIntensity => "developed, low intensity",
            Self::DevelopedMediumIntensity => "developed, medium intensity",
            Self::DevelopedHighIntensity => "developed, high intensity",
            Self::BarrenLand => "barren land",
            Self::DeciduousForest => "deciduous forest",
            Self::EvergreenForest => "evergreen forest",
            Self::MixedForest => "mixed forest",
            Self::ShrubScrub => "shrub/scrub",
            Self::Grassland => "grassland/herbaceous",
            Self::PastureHay => "pasture/hay",
            Self::CultivatedCrops => "cultivated crops",
            Self::WoodyWetlands => "woody wetlands",
            Self::EmergentHerbaceousWetlands => "emergent herbaceous wetlands",
        };
        write!(f, "{name} ({})", self.nlcd_code())
    }
}

/// Momentum roughness length lookup keyed by land-cover class
///
/// Built once and shared read-only by every solve (and every rayon worker).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoughnessTable {
    lengths: FxHashMap<LandCoverClass, f64>,
}

impl RoughnessTable {
    /// Empty table; every lookup fails until classes are added
    pub fn empty() -> Self {
        Self {
            lengths: FxHashMap::default(),
        }
    }

    /// Published aerodynamic roughness lengths for the NLCD legend
    ///
    /// Values in meters. Urban classes after Grimmond and Oke (1999), rural
    /// classes after the Davenport-Wieringa classification.
    pub fn nlcd() -> Self {
        let mut lengths = FxHashMap::default();
        for class in LandCoverClass::ALL {
            let z_0m = match class {
                LandCoverClass::OpenWater => 0.0002,
                LandCoverClass::PerennialIceSnow => 0.001,
                LandCoverClass::BarrenLand => 0.01,
                LandCoverClass::Grassland | LandCoverClass::EmergentHerbaceousWetlands => 0.03,
                LandCoverClass::PastureHay => 0.05,
                LandCoverClass::CultivatedCrops => 0.1,
                LandCoverClass::ShrubScrub => 0.15,
                LandCoverClass::DevelopedOpenSpace => 0.2,
                LandCoverClass::DevelopedLowIntensity | LandCoverClass::WoodyWetlands => 0.5,
                LandCoverClass::DevelopedMediumIntensity => 0.8,
                LandCoverClass::DeciduousForest => 1.0,
                LandCoverClass::MixedForest => 1.1,
                LandCoverClass::EvergreenForest => 1.2,
                LandCoverClass::DevelopedHighIntensity => 1.5,
            };
            lengths.insert(class, z_0m);
        }
        Self { lengths }
    }

    /// Override (or add) the roughness length for one class
    pub fn with_class(mut self, class: LandCoverClass, z_0m: Meters) -> Self {
        self.lengths.insert(class, *z_0m);
        self
    }

    /// Momentum roughness length for a class, if the table has one
    pub fn momentum_roughness(&self, class: LandCoverClass) -> Option<Meters> {
        self.lengths.get(&class).copied().map(Meters::from)
    }

    /// Number of classes in the table
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    /// Whether the table has no classes
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }
}

impl Default for RoughnessTable {
    fn default() -> Self {
        Self::nlcd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nlcd_code_round_trip_for_every_class() {
        for class in LandCoverClass::ALL {
            assert_eq!(LandCoverClass::from_nlcd_code(class.nlcd_code()), Some(class));
        }
    }

    #[test]
    fn test_unknown_codes_rejected() {
        for code in [0_u8, 13, 25, 250, 255] {
            assert_eq!(LandCoverClass::from_nlcd_code(code), None, "code {code}");
        }
    }

    #[test]
    fn test_default_table_covers_every_class_with_positive_length() {
        let table = RoughnessTable::default();
        assert_eq!(table.len(), LandCoverClass::ALL.len());
        for class in LandCoverClass::ALL {
            let z_0m = table
                .momentum_roughness(class)
                .unwrap_or_else(|| panic!("missing {class}"));
            assert!(*z_0m > 0.0, "{class} must have positive z_0m");
        }
    }

    #[test]
    fn test_low_intensity_urban_matches_published_value() {
        let table = RoughnessTable::nlcd();
        let z_0m = table
            .momentum_roughness(LandCoverClass::DevelopedLowIntensity)
            .unwrap();
        assert_eq!(*z_0m, 0.5);
        assert_eq!(*LandCoverClass::DevelopedLowIntensity.typical_element_height(), 5.0);
    }

    #[test]
    fn test_urban_roughness_increases_with_intensity() {
        let table = RoughnessTable::nlcd();
        let get = |c| *table.momentum_roughness(c).unwrap();
        assert!(get(LandCoverClass::DevelopedOpenSpace) < get(LandCoverClass::DevelopedLowIntensity));
        assert!(
            get(LandCoverClass::DevelopedLowIntensity) < get(LandCoverClass::DevelopedMediumIntensity)
        );
        assert!(
            get(LandCoverClass::DevelopedMediumIntensity) < get(LandCoverClass::DevelopedHighIntensity)
        );
    }

    #[test]
    fn test_override_and_empty_table() {
        let table = RoughnessTable::empty();
        assert!(table.is_empty());
        assert!(table.momentum_roughness(LandCoverClass::Grassland).is_none());

        let table = table.with_class(LandCoverClass::Grassland, Meters::new(0.04));
        assert_eq!(*table.momentum_roughness(LandCoverClass::Grassland).unwrap(), 0.04);
    }

    #[test]
    fn test_default_reference_height_clears_canopy() {
        assert_eq!(*LandCoverClass::Grassland.default_reference_height(), 10.0);
        assert_eq!(*LandCoverClass::DevelopedLowIntensity.default_reference_height(), 10.0);
        assert_eq!(*LandCoverClass::DevelopedHighIntensity.default_reference_height(), 40.0);
        for class in LandCoverClass::ALL {
            let z_r = *class.default_reference_height();
            assert!(z_r >= 2.0 * *class.typical_element_height(), "{class}");
        }
    }
}
