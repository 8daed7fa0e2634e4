//! Validated scenario parameters.
//!
//! A [`ScenarioParameters`] can only be obtained through [`ScenarioParameters::new`],
//! which resolves the region against a catalog and checks every numeric field
//! against its closed range. Holding a value is therefore proof that it is valid.

use crate::errors::{AltEarthError, AltEarthResult};
use crate::regions::RegionCatalog;
use crate::FloatValue;
use serde::Serialize;

/// Closed interval of accepted values for a numeric parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub min: FloatValue,
    pub max: FloatValue,
}

impl ParameterRange {
    pub const fn new(min: FloatValue, max: FloatValue) -> Self {
        Self { min, max }
    }

    /// NaN and infinities are never contained
    pub fn contains(&self, value: FloatValue) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    fn check(&self, field: &str, value: FloatValue) -> AltEarthResult<FloatValue> {
        if self.contains(value) {
            // Fold -0.0 into 0.0 so both spellings describe the same scenario
            Ok(value + 0.0)
        } else {
            Err(AltEarthError::InvalidParameter {
                field: field.to_string(),
                value,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Target years that can be simulated
pub const TARGET_YEAR_RANGE: ParameterRange = ParameterRange::new(2025.0, 2100.0);
/// Change in annual rainfall
/// unit: %
pub const RAINFALL_DELTA_RANGE: ParameterRange = ParameterRange::new(-50.0, 30.0);
/// Change in mean temperature
/// unit: °C
pub const TEMPERATURE_DELTA_RANGE: ParameterRange = ParameterRange::new(-2.0, 5.0);
/// Urban expansion
/// unit: % of region area
pub const URBAN_GROWTH_RANGE: ParameterRange = ParameterRange::new(0.0, 100.0);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioParameters {
    region_id: String,
    target_year: i32,
    rainfall_delta_pct: FloatValue,
    temperature_delta_c: FloatValue,
    urban_growth_pct: FloatValue,
}

impl ScenarioParameters {
    /// Validate raw request values.
    ///
    /// The region is resolved first (failing with `UnknownRegion`), then each
    /// numeric field is range checked (failing with `InvalidParameter`).
    pub fn new(
        catalog: &RegionCatalog,
        region: &str,
        target_year: i32,
        rainfall_delta_pct: FloatValue,
        temperature_delta_c: FloatValue,
        urban_growth_pct: FloatValue,
    ) -> AltEarthResult<Self> {
        let region_id = catalog.resolve(region)?.id.clone();
        TARGET_YEAR_RANGE.check("year", target_year as FloatValue)?;

        Ok(Self {
            region_id,
            target_year,
            rainfall_delta_pct: RAINFALL_DELTA_RANGE.check("rainfall_delta", rainfall_delta_pct)?,
            temperature_delta_c: TEMPERATURE_DELTA_RANGE
                .check("temperature_delta", temperature_delta_c)?,
            urban_growth_pct: URBAN_GROWTH_RANGE.check("urban_growth", urban_growth_pct)?,
        })
    }

    /// Normalised catalog identifier
    pub fn region_id(&self) -> &str {
        &self.region_id
    }

    pub fn target_year(&self) -> i32 {
        self.target_year
    }

    pub fn rainfall_delta_pct(&self) -> FloatValue {
        self.rainfall_delta_pct
    }

    pub fn temperature_delta_c(&self) -> FloatValue {
        self.temperature_delta_c
    }

    pub fn urban_growth_pct(&self) -> FloatValue {
        self.urban_growth_pct
    }
}
