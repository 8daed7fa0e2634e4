//! Baseline providers with controllable failure modes
#![allow(dead_code)]

use altearth::engine::{EngineBuilder, SimulationEngine};
use altearth_core::baseline::{BaselineProvider, BaselineSnapshot, DataSource};
use altearth_core::config::EngineConfig;
use altearth_core::errors::{AltEarthError, AltEarthResult};
use altearth_core::land_cover::{LandCover, LandCoverFractions};
use altearth_core::regions::Region;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Always reports the data as unavailable
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FailingProvider {}

#[typetag::serde]
impl BaselineProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    fn fetch_baseline(&self, region: &Region, _year: i32) -> AltEarthResult<BaselineSnapshot> {
        Err(AltEarthError::DataUnavailable(format!(
            "remote service unreachable for {}",
            region.id
        )))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PanickingProvider {}

#[typetag::serde]
impl BaselineProvider for PanickingProvider {
    fn name(&self) -> &str {
        "panicking"
    }

    fn fetch_baseline(&self, _region: &Region, _year: i32) -> AltEarthResult<BaselineSnapshot> {
        panic!("provider bug")
    }
}

/// Returns a real-looking snapshot after a delay, counting every fetch
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SlowProvider {
    pub delay_ms: u64,
    #[serde(skip)]
    pub fetches: Arc<AtomicUsize>,
}

impl SlowProvider {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[typetag::serde]
impl BaselineProvider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    fn fetch_baseline(&self, region: &Region, year: i32) -> AltEarthResult<BaselineSnapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(self.delay_ms));
        Ok(real_snapshot(region, year))
    }
}

/// Returns the same snapshot for every region
#[derive(Debug, Serialize, Deserialize)]
pub struct FixedProvider {
    pub snapshot: BaselineSnapshot,
}

#[typetag::serde]
impl BaselineProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    fn fetch_baseline(&self, _region: &Region, _year: i32) -> AltEarthResult<BaselineSnapshot> {
        Ok(self.snapshot.clone())
    }
}

/// A valid observed baseline that differs from the synthetic one
pub fn real_snapshot(region: &Region, year: i32) -> BaselineSnapshot {
    BaselineSnapshot {
        region_id: region.id.clone(),
        baseline_year: year,
        land_cover_fractions: LandCoverFractions::from_pairs([
            (LandCover::Trees, 0.30),
            (LandCover::Crops, 0.40),
            (LandCover::Grass, 0.10),
            (LandCover::Urban, 0.15),
            (LandCover::Water, 0.05),
        ]),
        mean_rainfall_mm: 950.0,
        mean_temperature_c: 26.5,
        mean_ndvi: 0.62,
        source: DataSource::Real,
    }
}

pub fn engine_with(provider: Arc<dyn BaselineProvider>, timeout_seconds: Option<f64>) -> SimulationEngine {
    let config = EngineConfig {
        fetch_timeout_seconds: timeout_seconds,
        ..EngineConfig::default()
    };
    EngineBuilder::new()
        .with_config(config)
        .with_provider(provider)
        .build()
        .unwrap()
}
