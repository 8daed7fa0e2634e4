//! Deterministic alternate-future scenarios for named regions.
//!
//! Given a region and hypothetical changes in rainfall, temperature and urban
//! extent, the [`engine::SimulationEngine`] produces a reproducible scenario:
//! climate stress indices, projected land cover and the transitions between
//! them. Results are outputs of simple rule-based models under the stated
//! deltas. They are simulations, not forecasts.
//!
//! The models themselves live in `altearth-components`; shared types
//! (parameters, regions, baselines, the cache and configuration) in
//! `altearth-core`.

pub mod api;
pub mod engine;
pub mod scenario;

#[cfg(feature = "python")]
mod python;
