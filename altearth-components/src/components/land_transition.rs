//! Land transition model
//!
//! Projects a baseline land-cover distribution under climate stress and urban
//! expansion. Area only ever moves between classes, so the projected
//! distribution sums to one whenever the baseline does.

use crate::components::climate_stress::StressVector;
use altearth_core::land_cover::{LandCover, LandCoverFractions};
use altearth_core::FloatValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Classes consumed by urban expansion, in the order they are drawn down
pub const URBAN_DONORS: [LandCover; 3] = [LandCover::Crops, LandCover::Grass, LandCover::Trees];

/// Parameters for the land transition model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LandTransitionParameters {
    /// Fraction of tree cover lost per unit of combined stress
    /// unit: dimensionless
    /// default: 0.1
    pub degradation_rate: FloatValue,
    /// Multiplier on the degradation rate for cropland
    /// default: 1.5
    pub crop_sensitivity: FloatValue,
    /// Share of lost tree cover that becomes grass, the rest becoming shrub
    /// default: 0.6
    pub trees_to_grass_share: FloatValue,
    /// Share of failed cropland that becomes grass, the rest becoming bare
    /// default: 0.4
    pub crops_to_grass_share: FloatValue,
}

impl Default for LandTransitionParameters {
    fn default() -> Self {
        Self {
            degradation_rate: 0.1,
            crop_sensitivity: 1.5,
            trees_to_grass_share: 0.6,
            crops_to_grass_share: 0.4,
        }
    }
}

/// Key used for a class-to-class move in [`LandTransitionResult::transitions`]
pub fn transition_key(from: LandCover, to: LandCover) -> String {
    format!("{from}_to_{to}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandTransitionResult {
    pub projected_fractions: LandCoverFractions,
    /// Fraction of the region moved between each pair of classes.
    /// Only non-zero moves are recorded.
    pub transitions: BTreeMap<String, FloatValue>,
    /// Area of trees and cropland lost to degradation
    /// unit: km²
    pub degraded_area_km2: FloatValue,
    /// Area newly converted to urban
    /// unit: km²
    pub urbanized_area_km2: FloatValue,
    /// unit: km²
    pub total_area_km2: FloatValue,
}

/// Headline changes between a baseline and a projected distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandChangeSummary {
    /// Change in urban cover
    /// unit: percentage points
    pub urban_gain_pct: FloatValue,
    /// Loss of vegetated cover relative to the baseline vegetated cover
    /// unit: %
    pub vegetation_loss_pct: FloatValue,
    /// unit: %
    pub trees_change_pct: FloatValue,
    /// unit: %
    pub crops_change_pct: FloatValue,
}

impl LandChangeSummary {
    pub fn between(baseline: &LandCoverFractions, projected: &LandCoverFractions) -> Self {
        let relative_change = |before: FloatValue, after: FloatValue| {
            if before > 0.0 {
                (after - before) / before * 100.0
            } else {
                0.0
            }
        };

        Self {
            urban_gain_pct: (projected.get(LandCover::Urban) - baseline.get(LandCover::Urban))
                * 100.0,
            vegetation_loss_pct: if baseline.vegetation_total() > 0.0 {
                (baseline.vegetation_total() - projected.vegetation_total())
                    / baseline.vegetation_total()
                    * 100.0
            } else {
                0.0
            },
            trees_change_pct: relative_change(
                baseline.get(LandCover::Trees),
                projected.get(LandCover::Trees),
            ),
            crops_change_pct: relative_change(
                baseline.get(LandCover::Crops),
                projected.get(LandCover::Crops),
            ),
        }
    }
}

/// Running tally of projected cover and the moves that produced it
struct Ledger {
    fractions: LandCoverFractions,
    moves: BTreeMap<(LandCover, LandCover), FloatValue>,
}

impl Ledger {
    /// Move up to `amount` from one class to another, never more than is available.
    /// Returns the amount actually moved.
    fn transfer(&mut self, from: LandCover, to: LandCover, amount: FloatValue) -> FloatValue {
        let amount = amount.min(self.fractions.get(from));
        if amount <= 0.0 {
            return 0.0;
        }
        self.fractions.add(from, -amount);
        self.fractions.add(to, amount);
        *self.moves.entry((from, to)).or_insert(0.0) += amount;
        amount
    }

    fn moved(&self, from: LandCover, to: LandCover) -> FloatValue {
        self.moves.get(&(from, to)).copied().unwrap_or(0.0)
    }
}

/// Rule-based land transition model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandTransition {
    parameters: LandTransitionParameters,
}

impl LandTransition {
    pub fn from_parameters(parameters: LandTransitionParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &LandTransitionParameters {
        &self.parameters
    }

    /// Project `baseline` under the given stress and urban growth.
    ///
    /// Degradation runs first: trees decay to grass and shrub, cropland fails
    /// to grass and bare ground. Urban growth then claims `urban_growth_pct`
    /// of the region from [`URBAN_DONORS`], exhausting each donor before the
    /// next. Demand beyond what the donors hold is not met.
    pub fn compute_transitions(
        &self,
        baseline: &LandCoverFractions,
        stress: &StressVector,
        urban_growth_pct: FloatValue,
        region_area_km2: FloatValue,
    ) -> LandTransitionResult {
        let combined = stress.combined_stress_index;
        if combined <= 0.0 && urban_growth_pct <= 0.0 {
            return LandTransitionResult {
                projected_fractions: baseline.clone(),
                transitions: BTreeMap::new(),
                degraded_area_km2: 0.0,
                urbanized_area_km2: 0.0,
                total_area_km2: region_area_km2,
            };
        }

        let mut ledger = Ledger {
            fractions: baseline.clone(),
            moves: BTreeMap::new(),
        };

        if combined > 0.0 {
            self.degrade(&mut ledger, combined);
        }
        if urban_growth_pct > 0.0 {
            let mut demand = urban_growth_pct / 100.0;
            for donor in URBAN_DONORS {
                if demand <= 0.0 {
                    break;
                }
                demand -= ledger.transfer(donor, LandCover::Urban, demand);
            }
        }

        let degraded = ledger.moved(LandCover::Trees, LandCover::Grass)
            + ledger.moved(LandCover::Trees, LandCover::Shrub)
            + ledger.moved(LandCover::Crops, LandCover::Bare);
        let urbanized: FloatValue = URBAN_DONORS
            .iter()
            .map(|donor| ledger.moved(*donor, LandCover::Urban))
            .sum();

        let Ledger { fractions, moves } = ledger;
        // Transfers conserve the total, so this only removes rounding drift
        let projected_fractions = fractions.normalised().unwrap_or(fractions);

        LandTransitionResult {
            projected_fractions,
            transitions: moves
                .into_iter()
                .filter(|(_, amount)| *amount > 0.0)
                .map(|((from, to), amount)| (transition_key(from, to), amount))
                .collect(),
            degraded_area_km2: degraded * region_area_km2,
            urbanized_area_km2: urbanized * region_area_km2,
            total_area_km2: region_area_km2,
        }
    }

    fn degrade(&self, ledger: &mut Ledger, combined_stress: FloatValue) {
        let p = &self.parameters;
        let rate = num::clamp(combined_stress * p.degradation_rate, 0.0, 1.0);

        let trees_lost = ledger.fractions.get(LandCover::Trees) * rate;
        ledger.transfer(
            LandCover::Trees,
            LandCover::Grass,
            trees_lost * p.trees_to_grass_share,
        );
        ledger.transfer(
            LandCover::Trees,
            LandCover::Shrub,
            trees_lost * (1.0 - p.trees_to_grass_share),
        );

        let crops = ledger.fractions.get(LandCover::Crops);
        let crops_lost = (crops * rate * p.crop_sensitivity).min(crops);
        ledger.transfer(
            LandCover::Crops,
            LandCover::Grass,
            crops_lost * p.crops_to_grass_share,
        );
        ledger.transfer(
            LandCover::Crops,
            LandCover::Bare,
            crops_lost * (1.0 - p.crops_to_grass_share),
        );
    }
}
