mod climate_stress;
mod land_transition;

pub use climate_stress::{
    stress_notes, ClimateStress, ClimateStressParameters, StressLevel, StressVector,
    StressWeights,
};
pub use land_transition::{
    transition_key, LandChangeSummary, LandTransition, LandTransitionParameters,
    LandTransitionResult, URBAN_DONORS,
};
