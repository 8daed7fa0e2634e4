//! Simulation engine.
//!
//! Orchestrates one scenario: validate parameters, derive the scenario id,
//! consult the cache and, on a miss, fetch the baseline and run the climate
//! stress and land transition models.
//!
//! ```
//! use altearth::api::SimulationRequest;
//! use altearth::engine::EngineBuilder;
//!
//! let engine = EngineBuilder::new().build().unwrap();
//! let request = SimulationRequest::new("test", 2035, -15.0, 1.2, 30.0);
//!
//! let first = engine.simulate_request(&request).unwrap();
//! let second = engine.simulate_request(&request).unwrap();
//! assert!(!first.stats.cached);
//! assert!(second.stats.cached);
//! assert_eq!(first.scenario_id, second.scenario_id);
//! ```

use crate::api::{
    CacheStatsResponse, ClearCacheResponse, HealthResponse, RegionDetailResponse,
    RegionsResponse, SimulationRequest,
};
use crate::scenario::{
    scenario_id, LandCoverReport, LandTransitionReport, ScenarioMetadata, ScenarioOutputs,
    ScenarioResult, ScenarioStats,
};
use altearth_components::components::{
    ClimateStress, ClimateStressParameters, LandChangeSummary, LandTransition,
    LandTransitionParameters,
};
use altearth_core::baseline::{BaselineProvider, BaselineSnapshot, SyntheticProvider};
use altearth_core::cache::ScenarioCache;
use altearth_core::config::EngineConfig;
use altearth_core::errors::{AltEarthError, AltEarthResult};
use altearth_core::land_cover::LandCover;
use altearth_core::parameters::ScenarioParameters;
use altearth_core::regions::{Region, RegionCatalog};
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// One outstanding provider call, shared by every caller that needs the same
/// baseline while it runs
#[derive(Debug, Default)]
struct PendingFetch {
    result: Mutex<Option<AltEarthResult<BaselineSnapshot>>>,
    ready: Condvar,
}

impl PendingFetch {
    fn publish(&self, result: AltEarthResult<BaselineSnapshot>) {
        let mut slot = self.result.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(result);
        self.ready.notify_all();
    }

    /// `None` if nothing arrived within `timeout`
    fn wait(&self, timeout: Option<Duration>) -> Option<AltEarthResult<BaselineSnapshot>> {
        let slot = self.result.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = match timeout {
            Some(timeout) => {
                self.ready
                    .wait_timeout_while(slot, timeout, |result| result.is_none())
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
            None => self
                .ready
                .wait_while(slot, |result| result.is_none())
                .unwrap_or_else(PoisonError::into_inner),
        };
        slot.as_ref().cloned()
    }
}

/// Provider calls still running, by region id and year
type PendingFetches = Arc<Mutex<HashMap<(String, i32), Arc<PendingFetch>>>>;

/// Build a [`SimulationEngine`].
///
/// Everything not supplied explicitly comes from the [`EngineConfig`]
/// (or its defaults): the cache is created from `config.cache` and the
/// baseline provider from `config.provider`.
pub struct EngineBuilder {
    config: EngineConfig,
    provider: Option<Arc<dyn BaselineProvider>>,
    catalog: Option<Arc<RegionCatalog>>,
    cache: Option<Arc<ScenarioCache<ScenarioResult>>>,
    climate_parameters: ClimateStressParameters,
    land_parameters: LandTransitionParameters,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            provider: None,
            catalog: None,
            cache: None,
            climate_parameters: ClimateStressParameters::default(),
            land_parameters: LandTransitionParameters::default(),
        }
    }

    pub fn with_config(&mut self, config: EngineConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Use `provider` for baselines instead of the configured one
    pub fn with_provider(&mut self, provider: Arc<dyn BaselineProvider>) -> &mut Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_catalog(&mut self, catalog: Arc<RegionCatalog>) -> &mut Self {
        self.catalog = Some(catalog);
        self
    }

    /// Share an existing cache instead of creating one from the configuration
    pub fn with_cache(&mut self, cache: Arc<ScenarioCache<ScenarioResult>>) -> &mut Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_climate_parameters(&mut self, parameters: ClimateStressParameters) -> &mut Self {
        self.climate_parameters = parameters;
        self
    }

    pub fn with_land_parameters(&mut self, parameters: LandTransitionParameters) -> &mut Self {
        self.land_parameters = parameters;
        self
    }

    pub fn build(&self) -> AltEarthResult<SimulationEngine> {
        self.config.validate()?;

        let mut config = self.config.clone();
        if let Some(provider) = &self.provider {
            config.provider = Arc::clone(provider);
        }
        let catalog = self
            .catalog
            .clone()
            .unwrap_or_else(|| Arc::new(RegionCatalog::builtin()));
        let cache = self.cache.clone().unwrap_or_else(|| {
            Arc::new(ScenarioCache::new(
                config.cache.max_size,
                config.cache.ttl(),
            ))
        });

        info!(
            "Simulation engine ready: provider={}, regions={}, cache max_size={}, ttl={}h",
            config.provider.name(),
            catalog.len(),
            cache.max_size(),
            cache.ttl().as_secs_f64() / 3600.0
        );

        Ok(SimulationEngine {
            config,
            catalog,
            cache,
            climate: ClimateStress::from_parameters(self.climate_parameters.clone()),
            land: LandTransition::from_parameters(self.land_parameters.clone()),
            fallback: SyntheticProvider::new(),
            pending: PendingFetches::default(),
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Produces deterministic alternate-future scenarios.
///
/// The engine is `Send + Sync`; concurrent calls share its cache, and
/// concurrent requests for the same scenario are computed once.
#[derive(Debug)]
pub struct SimulationEngine {
    config: EngineConfig,
    catalog: Arc<RegionCatalog>,
    cache: Arc<ScenarioCache<ScenarioResult>>,
    climate: ClimateStress,
    land: LandTransition,
    fallback: SyntheticProvider,
    pending: PendingFetches,
}

impl SimulationEngine {
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &RegionCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &Arc<ScenarioCache<ScenarioResult>> {
        &self.cache
    }

    /// Validate a raw request against the catalog and parameter ranges
    pub fn parameters_for(&self, request: &SimulationRequest) -> AltEarthResult<ScenarioParameters> {
        ScenarioParameters::new(
            &self.catalog,
            &request.region,
            request.year,
            request.rainfall_delta,
            request.temperature_delta,
            request.urban_growth,
        )
    }

    pub fn simulate_request(&self, request: &SimulationRequest) -> AltEarthResult<ScenarioResult> {
        let parameters = self.parameters_for(request)?;
        self.simulate(&parameters)
    }

    /// Produce the scenario described by `parameters`.
    ///
    /// Cached results are returned with `stats.cached` set; the payload is
    /// otherwise identical apart from `computation_time_seconds`. Baseline
    /// failures never surface here: the synthetic baseline is used instead.
    pub fn simulate(&self, parameters: &ScenarioParameters) -> AltEarthResult<ScenarioResult> {
        let started = Instant::now();
        let id = scenario_id(parameters);

        let (result, outcome) = self
            .cache
            .get_or_compute(&id, || self.compute(parameters, &id))?;

        let elapsed = started.elapsed().as_secs_f64();
        debug!("Scenario {id} served ({outcome:?}) in {elapsed:.3}s");
        Ok(result.with_delivery(outcome.is_cached(), elapsed))
    }

    fn compute(&self, parameters: &ScenarioParameters, id: &str) -> AltEarthResult<ScenarioResult> {
        let started = Instant::now();
        let region = self.catalog.resolve(parameters.region_id())?;
        let baseline = self.fetch_baseline(region);

        let stress = self.climate.compute_stress(
            &baseline,
            parameters.rainfall_delta_pct(),
            parameters.temperature_delta_c(),
        );
        let land = self.land.compute_transitions(
            &baseline.land_cover_fractions,
            &stress,
            parameters.urban_growth_pct(),
            region.area_km2(),
        );
        let change =
            LandChangeSummary::between(&baseline.land_cover_fractions, &land.projected_fractions);

        let stats = ScenarioStats {
            urban_gain_pct: change.urban_gain_pct,
            vegetation_loss_pct: change.vegetation_loss_pct,
            crop_stress_index: stress.vegetation_stress,
            trees_change_pct: change.trees_change_pct,
            crops_change_pct: change.crops_change_pct,
            overall_stress_level: stress.level(),
            rainfall_stress_index: stress.rainfall_stress,
            temperature_stress_index: stress.temperature_stress,
            vegetation_stress_index: stress.vegetation_stress,
            combined_stress_index: stress.combined_stress_index,
            baseline_rainfall_mm: baseline.mean_rainfall_mm,
            future_rainfall_mm: baseline.mean_rainfall_mm
                * (1.0 + parameters.rainfall_delta_pct() / 100.0),
            baseline_temp_celsius: baseline.mean_temperature_c,
            future_temp_celsius: baseline.mean_temperature_c + parameters.temperature_delta_c(),
            urban_area_baseline_pct: baseline.land_cover_fractions.get(LandCover::Urban) * 100.0,
            urban_area_future_pct: land.projected_fractions.get(LandCover::Urban) * 100.0,
            cached: false,
            computation_time_seconds: started.elapsed().as_secs_f64(),
        };

        Ok(ScenarioResult {
            scenario_id: id.to_string(),
            metadata: ScenarioMetadata {
                region: region.name.clone(),
                region_id: region.id.clone(),
                baseline_year: baseline.baseline_year,
                target_year: parameters.target_year(),
                rainfall_delta_pct: parameters.rainfall_delta_pct(),
                temperature_delta_c: parameters.temperature_delta_c(),
                urban_growth_pct: parameters.urban_growth_pct(),
                generated_at: Utc::now(),
            },
            results: ScenarioOutputs {
                climate_stress: stress,
                land_transitions: LandTransitionReport {
                    degraded_area_km2: land.degraded_area_km2,
                    urbanized_area_km2: land.urbanized_area_km2,
                    total_area_km2: land.total_area_km2,
                    transitions: land.transitions,
                },
                land_cover: LandCoverReport {
                    baseline: baseline.land_cover_fractions,
                    projected: land.projected_fractions,
                },
            },
            stats,
            tile_url: self.config.tile_url(id),
            data_source: baseline.source,
        })
    }

    /// Baseline of `region` for the configured baseline year.
    ///
    /// Falls back to the synthetic baseline if the provider fails, times out,
    /// panics or returns an unusable snapshot.
    pub fn fetch_baseline(&self, region: &Region) -> BaselineSnapshot {
        let year = self.config.baseline_year;
        match self.fetch_from_provider(region, year) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    "Baseline provider '{}' failed for {}: {e}. Using synthetic baseline",
                    self.config.provider.name(),
                    region.id
                );
                self.fallback.baseline_for(region, year)
            }
        }
    }

    fn fetch_from_provider(&self, region: &Region, year: i32) -> AltEarthResult<BaselineSnapshot> {
        let timeout = self.config.fetch_timeout();
        let snapshot = match self.pending_fetch(region, year)?.wait(timeout) {
            Some(result) => result?,
            None => {
                return Err(AltEarthError::DataUnavailable(format!(
                    "no response within {:?}",
                    timeout.unwrap_or_default()
                )))
            }
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Join the running provider call for this baseline, starting one if
    /// there is none.
    ///
    /// A call that outlives its callers' timeouts keeps its slot until it
    /// returns, so a hung provider holds at most one thread per baseline.
    fn pending_fetch(&self, region: &Region, year: i32) -> AltEarthResult<Arc<PendingFetch>> {
        let key = (region.id.clone(), year);
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(fetch) = pending.get(&key) {
            debug!("Joining running baseline fetch for {} {year}", region.id);
            return Ok(Arc::clone(fetch));
        }

        let fetch = Arc::new(PendingFetch::default());
        let provider = Arc::clone(&self.config.provider);
        let target = region.clone();
        let shared = Arc::clone(&fetch);
        let registry = Arc::clone(&self.pending);
        let slot = key.clone();
        thread::Builder::new()
            .name(format!("baseline-{}", region.id))
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    provider.fetch_baseline(&target, year)
                }))
                .unwrap_or_else(|_| {
                    Err(AltEarthError::DataUnavailable(
                        "provider panicked".to_string(),
                    ))
                });
                registry
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&slot);
                shared.publish(result);
            })
            .map_err(|e| {
                AltEarthError::DataUnavailable(format!("cannot start baseline fetch: {e}"))
            })?;
        pending.insert(key, Arc::clone(&fetch));
        Ok(fetch)
    }

    /// Number of provider calls that have not returned yet
    pub fn pending_fetches(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn regions(&self) -> RegionsResponse {
        RegionsResponse::from_catalog(&self.catalog)
    }

    pub fn region_details(&self, region: &str) -> AltEarthResult<RegionDetailResponse> {
        let info = self.catalog.resolve(region)?;
        Ok(RegionDetailResponse {
            region: region.to_string(),
            info: info.into(),
        })
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "healthy".to_string(),
            provider: self.config.provider.name().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn cache_stats(&self) -> CacheStatsResponse {
        self.cache.stats().into()
    }

    pub fn clear_cache(&self) -> ClearCacheResponse {
        ClearCacheResponse::cleared(self.cache.clear())
    }

    /// Release the engine, clearing its cache.
    ///
    /// Returns the number of scenarios that were cached. A cache shared with
    /// other engines is cleared too.
    pub fn shutdown(self) -> usize {
        let cleared = self.cache.clear();
        info!("Simulation engine shut down");
        cleared
    }
}
