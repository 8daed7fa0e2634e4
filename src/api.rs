//! Request and response bodies of the scenario service.
//!
//! These mirror the JSON exchanged with the web front-end:
//!
//! | Route               | Request               | Response                 |
//! |---------------------|-----------------------|--------------------------|
//! | `POST /simulate`    | [`SimulationRequest`] | [`SimulationResponse`]   |
//! | `GET /regions`      |                       | [`RegionsResponse`]      |
//! | `GET /regions/{id}` |                       | [`RegionDetailResponse`] |
//! | `GET /health`       |                       | [`HealthResponse`]       |
//! | `GET /cache/stats`  |                       | [`CacheStatsResponse`]   |
//! | `POST /cache/clear` |                       | [`ClearCacheResponse`]   |
//!
//! Failures are reported as an [`ErrorResponse`].

use crate::scenario::ScenarioResult;
use altearth_core::cache::CacheStats;
use altearth_core::errors::AltEarthError;
use altearth_core::regions::{BoundingBox, Region, RegionCatalog};
use altearth_core::FloatValue;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Target year used when a request does not name one
pub const DEFAULT_TARGET_YEAR: i32 = 2035;

fn default_target_year() -> i32 {
    DEFAULT_TARGET_YEAR
}

/// Unvalidated scenario request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    /// Region name or identifier, e.g. `"Tamil Nadu"` or `"tamilnadu"`
    pub region: String,
    #[serde(default = "default_target_year")]
    pub year: i32,
    /// unit: %
    pub rainfall_delta: FloatValue,
    /// unit: °C
    pub temperature_delta: FloatValue,
    /// unit: % of region area
    #[serde(default)]
    pub urban_growth: FloatValue,
}

impl SimulationRequest {
    pub fn new(
        region: &str,
        year: i32,
        rainfall_delta: FloatValue,
        temperature_delta: FloatValue,
        urban_growth: FloatValue,
    ) -> Self {
        Self {
            region: region.to_string(),
            year,
            rainfall_delta,
            temperature_delta,
            urban_growth,
        }
    }
}

pub type SimulationResponse = ScenarioResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub id: String,
    pub name: String,
    pub bounds: BoundingBox,
    pub description: String,
}

impl From<&Region> for RegionInfo {
    fn from(region: &Region) -> Self {
        Self {
            id: region.id.clone(),
            name: region.name.clone(),
            bounds: region.bbox,
            description: region.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionsResponse {
    pub regions: Vec<RegionInfo>,
    pub count: usize,
}

impl RegionsResponse {
    pub fn from_catalog(catalog: &RegionCatalog) -> Self {
        let regions: Vec<RegionInfo> = catalog.iter().map(RegionInfo::from).collect();
        Self {
            count: regions.len(),
            regions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDetailResponse {
    /// Region as requested by the caller
    pub region: String,
    pub info: RegionInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Name of the configured baseline provider
    pub provider: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedScenario {
    pub scenario_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatsResponse {
    pub entries: usize,
    pub max_size: usize,
    pub ttl_hours: FloatValue,
    pub scenarios: Vec<CachedScenario>,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            entries: stats.entries,
            max_size: stats.max_size,
            ttl_hours: stats.ttl_hours,
            scenarios: stats
                .keys
                .into_iter()
                .map(|scenario_id| CachedScenario { scenario_id })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearCacheResponse {
    pub status: String,
    pub message: String,
    pub cleared_count: usize,
}

impl ClearCacheResponse {
    pub fn cleared(count: usize) -> Self {
        Self {
            status: "ok".to_string(),
            message: "Cache cleared successfully".to_string(),
            cleared_count: count,
        }
    }
}

/// Error body returned for a failed request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error class, e.g. `"InvalidParameter"`
    pub error: String,
    pub message: String,
    pub detail: Value,
}

impl ErrorResponse {
    /// HTTP status code conventionally used for this error
    pub fn status_code(&self) -> u16 {
        match self.error.as_str() {
            "InvalidParameter" => 422,
            "UnknownRegion" => 404,
            _ => 500,
        }
    }
}

impl From<&AltEarthError> for ErrorResponse {
    fn from(error: &AltEarthError) -> Self {
        let detail = match error {
            AltEarthError::InvalidParameter {
                field,
                value,
                min,
                max,
            } => json!({"field": field, "value": value, "min": min, "max": max}),
            AltEarthError::UnknownRegion(region) => json!({"region": region}),
            _ => Value::Null,
        };
        Self {
            error: error.kind().to_string(),
            message: error.to_string(),
            detail,
        }
    }
}
