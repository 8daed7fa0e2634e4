//! Climate stress model
//!
//! Converts scenario rainfall and temperature deltas, together with the
//! baseline vegetation health, into stress indices in [0, 1].

use altearth_core::baseline::BaselineSnapshot;
use altearth_core::FloatValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Weights of the sub-stresses in the combined stress index.
///
/// The weights sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressWeights {
    pub rainfall: FloatValue,
    pub temperature: FloatValue,
    pub vegetation: FloatValue,
}

impl Default for StressWeights {
    fn default() -> Self {
        Self {
            rainfall: 0.4,
            temperature: 0.3,
            vegetation: 0.3,
        }
    }
}

/// Parameters for the climate stress model
///
/// The defaults are part of the model's contract: changing any of them changes
/// the output of every scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateStressParameters {
    /// Rainfall deficit at which rainfall stress saturates
    /// unit: %
    /// default: 30.0
    pub drought_saturation_pct: FloatValue,
    /// Rainfall surplus per unit of rainfall stress
    /// unit: %
    /// default: 50.0
    pub surplus_scale_pct: FloatValue,
    /// Maximum stress caused by excess rainfall
    /// unit: dimensionless
    /// default: 0.5
    pub surplus_stress_cap: FloatValue,
    /// Warming at which temperature stress saturates
    /// unit: °C
    /// default: 3.0
    pub warming_saturation_c: FloatValue,
    /// Weight of rainfall stress in the vegetation response
    /// default: 0.6
    pub vegetation_rainfall_weight: FloatValue,
    /// Weight of temperature stress in the vegetation response
    /// default: 0.4
    pub vegetation_temperature_weight: FloatValue,
    /// Reduction of vegetation stress per unit of baseline NDVI
    /// default: 0.3
    pub ndvi_resilience: FloatValue,
    pub combined_weights: StressWeights,
}

impl Default for ClimateStressParameters {
    fn default() -> Self {
        Self {
            drought_saturation_pct: 30.0,
            surplus_scale_pct: 50.0,
            surplus_stress_cap: 0.5,
            warming_saturation_c: 3.0,
            vegetation_rainfall_weight: 0.6,
            vegetation_temperature_weight: 0.4,
            ndvi_resilience: 0.3,
            combined_weights: StressWeights::default(),
        }
    }
}

/// Stress indices for one scenario, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressVector {
    pub rainfall_stress: FloatValue,
    pub temperature_stress: FloatValue,
    pub vegetation_stress: FloatValue,
    pub combined_stress_index: FloatValue,
}

impl StressVector {
    /// A vector with no stress in any component
    pub fn zero() -> Self {
        Self {
            rainfall_stress: 0.0,
            temperature_stress: 0.0,
            vegetation_stress: 0.0,
            combined_stress_index: 0.0,
        }
    }

    pub fn level(&self) -> StressLevel {
        StressLevel::classify(self.combined_stress_index)
    }
}

/// Four-way classification of the combined stress index.
///
/// Bucket upper bounds are inclusive: 0.3 is low, 0.6 medium, 0.8 high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressLevel {
    Low,
    Medium,
    High,
    Severe,
}

impl StressLevel {
    pub fn classify(index: FloatValue) -> Self {
        if index <= 0.3 {
            StressLevel::Low
        } else if index <= 0.6 {
            StressLevel::Medium
        } else if index <= 0.8 {
            StressLevel::High
        } else {
            StressLevel::Severe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StressLevel::Low => "low",
            StressLevel::Medium => "medium",
            StressLevel::High => "high",
            StressLevel::Severe => "severe",
        }
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule-based climate stress model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClimateStress {
    parameters: ClimateStressParameters,
}

impl ClimateStress {
    pub fn from_parameters(parameters: ClimateStressParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &ClimateStressParameters {
        &self.parameters
    }

    /// Stress from a change in rainfall.
    ///
    /// Deficits raise stress linearly until `drought_saturation_pct`. Surpluses
    /// also stress vegetation (waterlogging), but more slowly and never beyond
    /// `surplus_stress_cap`.
    pub fn calculate_rainfall_stress(&self, rainfall_delta_pct: FloatValue) -> FloatValue {
        let p = &self.parameters;
        let stress = if rainfall_delta_pct < 0.0 {
            -rainfall_delta_pct / p.drought_saturation_pct
        } else {
            (rainfall_delta_pct / p.surplus_scale_pct).min(p.surplus_stress_cap)
        };
        num::clamp(stress, 0.0, 1.0)
    }

    /// Stress from warming. Cooling gives no stress.
    pub fn calculate_temperature_stress(&self, temperature_delta_c: FloatValue) -> FloatValue {
        num::clamp(
            temperature_delta_c / self.parameters.warming_saturation_c,
            0.0,
            1.0,
        )
    }

    /// Vegetation response to the climate stresses.
    ///
    /// $$ S_v = (w_r S_r + w_t S_t) (1 - k \cdot NDVI) $$
    ///
    /// Healthier vegetation (higher NDVI) is more resilient. NDVI is clamped
    /// to [0, 1] so water and bare ground give no resilience.
    pub fn calculate_vegetation_stress(
        &self,
        rainfall_stress: FloatValue,
        temperature_stress: FloatValue,
        baseline_ndvi: FloatValue,
    ) -> FloatValue {
        let p = &self.parameters;
        let exposure = p.vegetation_rainfall_weight * rainfall_stress
            + p.vegetation_temperature_weight * temperature_stress;
        let resilience = 1.0 - p.ndvi_resilience * num::clamp(baseline_ndvi, 0.0, 1.0);
        num::clamp(exposure * resilience, 0.0, 1.0)
    }

    pub fn calculate_combined_stress(
        &self,
        rainfall_stress: FloatValue,
        temperature_stress: FloatValue,
        vegetation_stress: FloatValue,
    ) -> FloatValue {
        let w = &self.parameters.combined_weights;
        num::clamp(
            w.rainfall * rainfall_stress
                + w.temperature * temperature_stress
                + w.vegetation * vegetation_stress,
            0.0,
            1.0,
        )
    }

    /// Full stress vector for a baseline under the given deltas
    pub fn compute_stress(
        &self,
        baseline: &BaselineSnapshot,
        rainfall_delta_pct: FloatValue,
        temperature_delta_c: FloatValue,
    ) -> StressVector {
        let rainfall_stress = self.calculate_rainfall_stress(rainfall_delta_pct);
        let temperature_stress = self.calculate_temperature_stress(temperature_delta_c);
        let vegetation_stress =
            self.calculate_vegetation_stress(rainfall_stress, temperature_stress, baseline.mean_ndvi);

        StressVector {
            rainfall_stress,
            temperature_stress,
            vegetation_stress,
            combined_stress_index: self.calculate_combined_stress(
                rainfall_stress,
                temperature_stress,
                vegetation_stress,
            ),
        }
    }
}

/// Human-readable warnings about the climate deltas of a scenario
pub fn stress_notes(rainfall_delta_pct: FloatValue, temperature_delta_c: FloatValue) -> Vec<&'static str> {
    let mut notes = vec![];
    if rainfall_delta_pct < -20.0 {
        notes.push("Severe drought conditions");
    } else if rainfall_delta_pct < -10.0 {
        notes.push("Moderate drought conditions");
    }
    if temperature_delta_c > 2.0 {
        notes.push("Extreme temperature increase");
    } else if temperature_delta_c > 1.0 {
        notes.push("Significant warming");
    }
    notes
}
