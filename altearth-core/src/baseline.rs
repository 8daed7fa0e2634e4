//! Baseline land-cover and climate state for a region.
//!
//! Baselines come from a [`BaselineProvider`]. Two providers are bundled:
//!
//! - [`ArchiveProvider`] reads geospatial query results that were exported to
//!   disk (one JSON document per region and year) and reports them as real data.
//! - [`SyntheticProvider`] derives a plausible baseline from nothing but the
//!   region's catalog entry. It never fails and is used as the fallback whenever
//!   real data cannot be obtained.

use crate::errors::{AltEarthError, AltEarthResult};
use crate::land_cover::{LandCover, LandCoverFractions};
use crate::regions::Region;
use crate::FloatValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::path::{Path, PathBuf};

/// Where a baseline came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Observed data from the geospatial service
    Real,
    /// Synthetic stand-in derived from catalog metadata
    Mock,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Real => f.write_str("real"),
            DataSource::Mock => f.write_str("mock"),
        }
    }
}

/// Reference-year state of a region that scenario deltas are applied against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSnapshot {
    pub region_id: String,
    pub baseline_year: i32,
    pub land_cover_fractions: LandCoverFractions,
    /// unit: mm / yr
    pub mean_rainfall_mm: FloatValue,
    /// unit: °C
    pub mean_temperature_c: FloatValue,
    /// Normalised difference vegetation index
    /// unit: dimensionless, in [-1, 1]
    pub mean_ndvi: FloatValue,
    pub source: DataSource,
}

impl BaselineSnapshot {
    /// Check that the snapshot is usable as model input
    pub fn validate(&self) -> AltEarthResult<()> {
        if !self.land_cover_fractions.is_normalised() {
            return Err(AltEarthError::DataUnavailable(format!(
                "land cover fractions for '{}' do not form a distribution (sum = {})",
                self.region_id,
                self.land_cover_fractions.total()
            )));
        }
        if !self.mean_rainfall_mm.is_finite() || self.mean_rainfall_mm < 0.0 {
            return Err(AltEarthError::DataUnavailable(format!(
                "invalid mean rainfall {} for '{}'",
                self.mean_rainfall_mm, self.region_id
            )));
        }
        if !self.mean_temperature_c.is_finite() {
            return Err(AltEarthError::DataUnavailable(format!(
                "invalid mean temperature for '{}'",
                self.region_id
            )));
        }
        if !(-1.0..=1.0).contains(&self.mean_ndvi) {
            return Err(AltEarthError::DataUnavailable(format!(
                "NDVI {} for '{}' is outside [-1, 1]",
                self.mean_ndvi, self.region_id
            )));
        }
        Ok(())
    }
}

/// Source of baseline snapshots.
///
/// Implementations must be idempotent: the same region and year always yield
/// the same snapshot (or the same failure).
#[typetag::serde(tag = "type")]
pub trait BaselineProvider: Debug + Send + Sync {
    /// Short name used in logs and health reports
    fn name(&self) -> &str;

    /// Fetch the baseline of `region` for `year`.
    ///
    /// Fails with `DataUnavailable` if the data cannot be obtained.
    fn fetch_baseline(&self, region: &Region, year: i32) -> AltEarthResult<BaselineSnapshot>;
}

/// Pixel counts of the synthetic land-cover mix, by class
const SYNTHETIC_LAND_COVER: [(LandCover, FloatValue); 6] = [
    (LandCover::Trees, 500.0),
    (LandCover::Grass, 300.0),
    (LandCover::Crops, 700.0),
    (LandCover::Shrub, 200.0),
    (LandCover::Urban, 200.0),
    (LandCover::Bare, 100.0),
];

/// Deterministic baseline generated from a region's bounding box.
///
/// The land-cover mix is fixed. Temperature cools away from the tropics and
/// rainfall falls off with latitude, both evaluated at the box centre.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyntheticProvider {}

impl SyntheticProvider {
    pub fn new() -> Self {
        Self {}
    }

    /// Infallible form of [`BaselineProvider::fetch_baseline`]
    pub fn baseline_for(&self, region: &Region, year: i32) -> BaselineSnapshot {
        let (_, latitude) = region.bbox.centre();
        let abs_lat = latitude.abs().min(90.0);
        let total: FloatValue = SYNTHETIC_LAND_COVER.iter().map(|(_, count)| count).sum();

        BaselineSnapshot {
            region_id: region.id.clone(),
            baseline_year: year,
            land_cover_fractions: LandCoverFractions::from_pairs(
                SYNTHETIC_LAND_COVER
                    .iter()
                    .map(|(class, count)| (*class, count / total)),
            ),
            mean_rainfall_mm: 400.0 + 800.0 * abs_lat.to_radians().cos().powi(2),
            mean_temperature_c: 27.0 - 0.4 * (abs_lat - 15.0).max(0.0),
            mean_ndvi: 0.55,
            source: DataSource::Mock,
        }
    }
}

#[typetag::serde]
impl BaselineProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_baseline(&self, region: &Region, year: i32) -> AltEarthResult<BaselineSnapshot> {
        Ok(self.baseline_for(region, year))
    }
}

/// Baselines exported from the geospatial service.
///
/// Expects `<root>/<region id>/<year>.json` containing the query result, e.g.
///
/// ```json
/// {
///   "land_cover": {"classes": {"1": 500, "2": 300, "4": 700}},
///   "rainfall": {"annual_mean_mm": 1012.5},
///   "temperature": {"mean_celsius": 26.1},
///   "ndvi": {"mean_ndvi": 0.52}
/// }
/// ```
///
/// Land-cover classes are keyed by Dynamic World class id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveProvider {
    pub root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ExportedBaseline {
    land_cover: ExportedLandCover,
    rainfall: ExportedRainfall,
    temperature: ExportedTemperature,
    ndvi: ExportedNdvi,
}

#[derive(Debug, Deserialize)]
struct ExportedLandCover {
    classes: BTreeMap<String, FloatValue>,
}

#[derive(Debug, Deserialize)]
struct ExportedRainfall {
    annual_mean_mm: FloatValue,
}

#[derive(Debug, Deserialize)]
struct ExportedTemperature {
    mean_celsius: FloatValue,
}

#[derive(Debug, Deserialize)]
struct ExportedNdvi {
    mean_ndvi: FloatValue,
}

impl ArchiveProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Location of the export for a region and year
    pub fn path_for(&self, region: &Region, year: i32) -> PathBuf {
        self.root.join(&region.id).join(format!("{year}.json"))
    }

    fn read_export(path: &Path) -> AltEarthResult<ExportedBaseline> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AltEarthError::DataUnavailable(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            AltEarthError::DataUnavailable(format!("cannot decode {}: {e}", path.display()))
        })
    }
}

#[typetag::serde]
impl BaselineProvider for ArchiveProvider {
    fn name(&self) -> &str {
        "archive"
    }

    fn fetch_baseline(&self, region: &Region, year: i32) -> AltEarthResult<BaselineSnapshot> {
        let export = Self::read_export(&self.path_for(region, year))?;

        let counts = export
            .land_cover
            .classes
            .iter()
            .map(|(key, count)| {
                key.trim().parse::<u8>().map(|id| (id, *count)).map_err(|_| {
                    AltEarthError::DataUnavailable(format!("unknown land cover class '{key}'"))
                })
            })
            .collect::<AltEarthResult<BTreeMap<u8, FloatValue>>>()?;

        let snapshot = BaselineSnapshot {
            region_id: region.id.clone(),
            baseline_year: year,
            land_cover_fractions: LandCoverFractions::from_class_counts(&counts)?,
            mean_rainfall_mm: export.rainfall.annual_mean_mm,
            mean_temperature_c: export.temperature.mean_celsius,
            mean_ndvi: export.ndvi.mean_ndvi,
            source: DataSource::Real,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }
}
