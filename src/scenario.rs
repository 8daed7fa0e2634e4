//! Scenario identity and results.
//!
//! A scenario is identified by a digest of its validated parameters, so the
//! same request always maps to the same id regardless of process or call order.
//! The id is the key of the scenario cache and of the rendered map tiles.

use altearth_components::components::{stress_notes, StressLevel, StressVector};
use altearth_core::baseline::DataSource;
use altearth_core::cache::CacheKeyed;
use altearth_core::land_cover::LandCoverFractions;
use altearth_core::parameters::ScenarioParameters;
use altearth_core::FloatValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Number of hex characters kept from the digest
pub const SCENARIO_ID_LENGTH: usize = 16;

/// Canonical serialisation of the parameters that determine a scenario.
///
/// Keys are sorted and floats use their shortest round-trip representation,
/// so the output depends only on the parameter values.
pub fn canonical_parameters(parameters: &ScenarioParameters) -> String {
    let fields = BTreeMap::from([
        ("rainfall_delta_pct", json!(parameters.rainfall_delta_pct())),
        ("region_id", json!(parameters.region_id())),
        ("target_year", json!(parameters.target_year())),
        ("temperature_delta_c", json!(parameters.temperature_delta_c())),
        ("urban_growth_pct", json!(parameters.urban_growth_pct())),
    ]);
    json!(fields).to_string()
}

/// Deterministic identifier of the scenario described by `parameters`
pub fn scenario_id(parameters: &ScenarioParameters) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_parameters(parameters).as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..SCENARIO_ID_LENGTH].to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMetadata {
    /// Display name of the region
    pub region: String,
    pub region_id: String,
    pub baseline_year: i32,
    pub target_year: i32,
    /// unit: %
    pub rainfall_delta_pct: FloatValue,
    /// unit: °C
    pub temperature_delta_c: FloatValue,
    /// unit: % of region area
    pub urban_growth_pct: FloatValue,
    pub generated_at: DateTime<Utc>,
}

/// Outcome of the land transition model, as reported to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandTransitionReport {
    /// unit: km²
    pub degraded_area_km2: FloatValue,
    /// unit: km²
    pub urbanized_area_km2: FloatValue,
    /// unit: km²
    pub total_area_km2: FloatValue,
    pub transitions: BTreeMap<String, FloatValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandCoverReport {
    pub baseline: LandCoverFractions,
    pub projected: LandCoverFractions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutputs {
    pub climate_stress: StressVector,
    pub land_transitions: LandTransitionReport,
    pub land_cover: LandCoverReport,
}

/// Headline numbers of a scenario.
///
/// Everything except `cached` and `computation_time_seconds` is a pure
/// function of the scenario parameters and baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioStats {
    /// unit: percentage points
    pub urban_gain_pct: FloatValue,
    /// unit: %
    pub vegetation_loss_pct: FloatValue,
    pub crop_stress_index: FloatValue,
    /// unit: %
    pub trees_change_pct: FloatValue,
    /// unit: %
    pub crops_change_pct: FloatValue,
    pub overall_stress_level: StressLevel,

    pub rainfall_stress_index: FloatValue,
    pub temperature_stress_index: FloatValue,
    pub vegetation_stress_index: FloatValue,
    pub combined_stress_index: FloatValue,

    /// unit: mm / yr
    pub baseline_rainfall_mm: FloatValue,
    /// unit: mm / yr
    pub future_rainfall_mm: FloatValue,
    /// unit: °C
    pub baseline_temp_celsius: FloatValue,
    /// unit: °C
    pub future_temp_celsius: FloatValue,
    /// unit: %
    pub urban_area_baseline_pct: FloatValue,
    /// unit: %
    pub urban_area_future_pct: FloatValue,

    /// Whether this result was served from the cache
    pub cached: bool,
    /// Time taken to produce this response
    /// unit: s
    pub computation_time_seconds: FloatValue,
}

/// Complete result of one simulated scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_id: String,
    pub metadata: ScenarioMetadata,
    pub results: ScenarioOutputs,
    pub stats: ScenarioStats,
    pub tile_url: String,
    pub data_source: DataSource,
}

impl CacheKeyed for ScenarioResult {
    fn cache_key(&self) -> &str {
        &self.scenario_id
    }
}

impl ScenarioResult {
    pub fn stress(&self) -> &StressVector {
        &self.results.climate_stress
    }

    pub fn projected_fractions(&self) -> &LandCoverFractions {
        &self.results.land_cover.projected
    }

    /// Copy of the result with the per-response fields replaced
    pub fn with_delivery(mut self, cached: bool, computation_time_seconds: FloatValue) -> Self {
        self.stats.cached = cached;
        self.stats.computation_time_seconds = computation_time_seconds;
        self
    }

    /// Test whether two results describe the same scenario outcome, ignoring
    /// the per-response fields
    pub fn same_outcome(&self, other: &ScenarioResult) -> bool {
        self.scenario_id == other.scenario_id
            && self.results == other.results
            && self.data_source == other.data_source
            && self.clone().with_delivery(false, 0.0).stats
                == other.clone().with_delivery(false, 0.0).stats
    }

    /// Human-readable report of the scenario
    pub fn summary(&self) -> String {
        let m = &self.metadata;
        let s = &self.stats;
        let mut text = format!(
            "ALTERNATE EARTH FUTURE SCENARIO\n\
             Region: {}\n\
             Timeline: {} → {}\n\
             \n\
             CLIMATE CHANGES:\n\
             - Rainfall: {:.0} → {:.0} mm/year\n\
             - Temperature: {:.1} → {:.1} °C\n\
             \n\
             STRESS ASSESSMENT:\n\
             - Vegetation Stress: {:.2} / 1.0\n\
             - Crop Stress Level: {}\n\
             \n\
             LAND COVER IMPACTS:\n\
             - Vegetation Loss: {:.1}%\n\
             - Urban Expansion: {:.1}%\n\
             - Tree Cover Change: {:.1}%\n\
             - Crop Area Change: {:.1}%\n",
            m.region,
            m.baseline_year,
            m.target_year,
            s.baseline_rainfall_mm,
            s.future_rainfall_mm,
            s.baseline_temp_celsius,
            s.future_temp_celsius,
            s.vegetation_stress_index,
            s.overall_stress_level.as_str().to_uppercase(),
            s.vegetation_loss_pct,
            s.urban_gain_pct,
            s.trees_change_pct,
            s.crops_change_pct,
        );

        let notes = stress_notes(m.rainfall_delta_pct, m.temperature_delta_c);
        if !notes.is_empty() {
            text.push_str("\nWARNINGS:\n");
            for note in notes {
                text.push_str("- ");
                text.push_str(note);
                text.push('\n');
            }
        }

        if self.data_source == DataSource::Mock {
            text.push_str("\nBaseline data is synthetic.\n");
        }
        text.push_str(
            "\nNOTE: This is a SIMULATION, not a prediction.\n\
             It shows one possible future under specified conditions.",
        );
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use altearth_core::regions::RegionCatalog;

    fn parameters(region: &str, rainfall: FloatValue, urban: FloatValue) -> ScenarioParameters {
        ScenarioParameters::new(&RegionCatalog::builtin(), region, 2035, rainfall, 1.2, urban)
            .unwrap()
    }

    #[test]
    fn test_canonical_parameters_are_sorted() {
        let canonical = canonical_parameters(&parameters("test", -15.0, 30.0));
        assert_eq!(
            canonical,
            r#"{"rainfall_delta_pct":-15.0,"region_id":"test","target_year":2035,"temperature_delta_c":1.2,"urban_growth_pct":30.0}"#
        );
    }

    #[test]
    fn test_scenario_id_is_stable_hex() {
        let id = scenario_id(&parameters("test", -15.0, 30.0));
        assert_eq!(id.len(), SCENARIO_ID_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(id, scenario_id(&parameters("test", -15.0, 30.0)));

        let full = format!(
            "{:x}",
            Sha256::digest(canonical_parameters(&parameters("test", -15.0, 30.0)).as_bytes())
        );
        assert_eq!(full.len(), 64);
        assert!(full.starts_with(&id));
    }

    #[test]
    fn test_scenario_id_follows_normalisation() {
        assert_eq!(
            scenario_id(&parameters("Tamil Nadu", -15.0, 30.0)),
            scenario_id(&parameters("tamil-nadu", -15.0, 30.0))
        );
        // -0.0 and 0.0 describe the same scenario
        assert_eq!(
            scenario_id(&parameters("test", -0.0, 0.0)),
            scenario_id(&parameters("test", 0.0, -0.0))
        );
    }

    #[test]
    fn test_scenario_id_distinguishes_parameters() {
        let base = scenario_id(&parameters("test", -15.0, 30.0));
        assert_ne!(base, scenario_id(&parameters("test", -15.0, 30.5)));
        assert_ne!(base, scenario_id(&parameters("test", -14.0, 30.0)));
        assert_ne!(base, scenario_id(&parameters("kerala", -15.0, 30.0)));
    }
}
