//! Core types and infrastructure for deterministic alternate-future scenarios.
//!
//! This crate holds everything the scenario models and the simulation engine
//! share: validated parameters, the region catalog, baseline snapshots and
//! their providers, the scenario cache and engine configuration.

pub mod baseline;
pub mod cache;
pub mod config;
pub mod land_cover;
pub mod parameters;
pub mod regions;

pub mod errors;

/// Floating point type used throughout the models
pub type FloatValue = f64;
