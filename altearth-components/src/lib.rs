//! Scenario models for alternate futures
//!
//! Both models are pure functions of their inputs and parameters:
//! - climate stress: climate deltas to stress indices
//! - land transition: stress and urban growth to projected land cover
//!
//! Each model has an associated parameters struct whose defaults are the
//! published model constants.

pub mod components;
