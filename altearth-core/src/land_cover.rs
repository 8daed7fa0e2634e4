//! Land-cover classes and fractional distributions over a region.

use crate::errors::{AltEarthError, AltEarthResult};
use crate::FloatValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tolerance used when checking that a distribution sums to one.
pub const FRACTION_TOLERANCE: FloatValue = 1e-6;

/// Land-cover classes tracked by the scenario models
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LandCover {
    Crops,
    Trees,
    Grass,
    Shrub,
    Bare,
    Urban,
    Water,
}

impl LandCover {
    pub const ALL: [LandCover; 7] = [
        LandCover::Crops,
        LandCover::Trees,
        LandCover::Grass,
        LandCover::Shrub,
        LandCover::Bare,
        LandCover::Urban,
        LandCover::Water,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LandCover::Crops => "crops",
            LandCover::Trees => "trees",
            LandCover::Grass => "grass",
            LandCover::Shrub => "shrub",
            LandCover::Bare => "bare",
            LandCover::Urban => "urban",
            LandCover::Water => "water",
        }
    }

    /// Classes counted as vegetation when reporting vegetation loss
    pub fn is_vegetation(&self) -> bool {
        matches!(
            self,
            LandCover::Crops | LandCover::Trees | LandCover::Grass | LandCover::Shrub
        )
    }

    /// Map a Dynamic World class id onto the tracked classes.
    ///
    /// Flooded vegetation is folded into water and snow/ice into bare ground.
    pub fn from_dynamic_world(class_id: u8) -> Option<LandCover> {
        match class_id {
            0 | 3 => Some(LandCover::Water),
            1 => Some(LandCover::Trees),
            2 => Some(LandCover::Grass),
            4 => Some(LandCover::Crops),
            5 => Some(LandCover::Shrub),
            6 => Some(LandCover::Urban),
            7 | 8 => Some(LandCover::Bare),
            _ => None,
        }
    }
}

impl fmt::Display for LandCover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fraction of a region's area covered by each land-cover class.
///
/// Every class is always present (possibly with a zero fraction) so that two
/// distributions over the same region serialise with identical keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandCoverFractions(BTreeMap<LandCover, FloatValue>);

impl Default for LandCoverFractions {
    fn default() -> Self {
        Self::zeros()
    }
}

impl LandCoverFractions {
    /// A distribution with every class set to zero
    pub fn zeros() -> Self {
        Self(LandCover::ALL.iter().map(|class| (*class, 0.0)).collect())
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (LandCover, FloatValue)>,
    {
        let mut fractions = Self::zeros();
        for (class, value) in pairs {
            fractions.set(class, value);
        }
        fractions
    }

    /// Build a normalised distribution from pixel counts keyed by Dynamic World class id.
    ///
    /// Unknown class ids are ignored. Fails if no known class has a positive count.
    pub fn from_class_counts(counts: &BTreeMap<u8, FloatValue>) -> AltEarthResult<Self> {
        let mut fractions = Self::zeros();
        for (class_id, count) in counts {
            if let Some(class) = LandCover::from_dynamic_world(*class_id) {
                fractions.add(class, *count);
            }
        }
        fractions.normalised()
    }

    pub fn get(&self, class: LandCover) -> FloatValue {
        self.0.get(&class).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, class: LandCover, value: FloatValue) {
        self.0.insert(class, value);
    }

    pub fn add(&mut self, class: LandCover, delta: FloatValue) {
        *self.0.entry(class).or_insert(0.0) += delta;
    }

    pub fn total(&self) -> FloatValue {
        self.0.values().sum()
    }

    /// Combined fraction of the vegetated classes
    pub fn vegetation_total(&self) -> FloatValue {
        self.iter()
            .filter(|(class, _)| class.is_vegetation())
            .map(|(_, value)| value)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LandCover, FloatValue)> + '_ {
        self.0.iter().map(|(class, value)| (*class, *value))
    }

    /// Test that all fractions are finite, non-negative and sum to one within tolerance
    pub fn is_normalised(&self) -> bool {
        self.0.values().all(|v| v.is_finite() && *v >= 0.0)
            && (self.total() - 1.0).abs() <= FRACTION_TOLERANCE
    }

    /// Rescale so that the fractions sum to one
    pub fn normalised(&self) -> AltEarthResult<Self> {
        if self.0.values().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(AltEarthError::DataUnavailable(
                "land cover contains negative or non-finite fractions".to_string(),
            ));
        }
        let total = self.total();
        if total <= 0.0 {
            return Err(AltEarthError::DataUnavailable(
                "land cover has no classified area".to_string(),
            ));
        }
        Ok(Self(
            self.0
                .iter()
                .map(|(class, value)| (*class, value / total))
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zeros_contains_every_class() {
        let fractions = LandCoverFractions::zeros();
        assert_eq!(fractions.iter().count(), LandCover::ALL.len());
        assert_eq!(fractions.total(), 0.0);
        assert!(!fractions.is_normalised());
    }

    #[test]
    fn test_from_class_counts_folds_dynamic_world_classes() {
        let counts = BTreeMap::from([
            (0, 50.0),  // water
            (1, 200.0), // trees
            (3, 50.0),  // flooded vegetation
            (4, 500.0), // crops
            (6, 100.0), // built
            (8, 100.0), // snow
            (42, 1000.0),
        ]);
        let fractions = LandCoverFractions::from_class_counts(&counts).unwrap();

        assert!(fractions.is_normalised());
        assert_relative_eq!(fractions.get(LandCover::Water), 0.1);
        assert_relative_eq!(fractions.get(LandCover::Trees), 0.2);
        assert_relative_eq!(fractions.get(LandCover::Crops), 0.5);
        assert_relative_eq!(fractions.get(LandCover::Urban), 0.1);
        assert_relative_eq!(fractions.get(LandCover::Bare), 0.1);
        assert_eq!(fractions.get(LandCover::Grass), 0.0);
    }

    #[test]
    fn test_from_class_counts_rejects_empty_counts() {
        let counts = BTreeMap::from([(99, 10.0)]);
        assert!(matches!(
            LandCoverFractions::from_class_counts(&counts),
            Err(AltEarthError::DataUnavailable(_))
        ));
    }

    #[test]
    fn test_normalised_rejects_negative_fractions() {
        let fractions =
            LandCoverFractions::from_pairs([(LandCover::Crops, 1.2), (LandCover::Bare, -0.2)]);
        assert!(fractions.normalised().is_err());
        assert!(!fractions.is_normalised());
    }

    #[test]
    fn test_vegetation_total() {
        let fractions = LandCoverFractions::from_pairs([
            (LandCover::Crops, 0.3),
            (LandCover::Trees, 0.2),
            (LandCover::Grass, 0.1),
            (LandCover::Shrub, 0.1),
            (LandCover::Urban, 0.2),
            (LandCover::Water, 0.1),
        ]);
        assert_relative_eq!(fractions.vegetation_total(), 0.7);
    }

    #[test]
    fn test_serialises_with_lowercase_keys() {
        let fractions = LandCoverFractions::from_pairs([(LandCover::Urban, 1.0)]);
        let json = serde_json::to_value(&fractions).unwrap();
        assert_eq!(json["urban"], 1.0);
        assert_eq!(json["crops"], 0.0);
        assert_eq!(json.as_object().unwrap().len(), 7);
    }
}
