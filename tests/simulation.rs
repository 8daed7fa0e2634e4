use altearth::api::{SimulationRequest, DEFAULT_TARGET_YEAR};
use altearth::engine::EngineBuilder;
use altearth::scenario::scenario_id;
use altearth_components::components::StressLevel;
use altearth_core::baseline::DataSource;
use altearth_core::errors::AltEarthError;
use altearth_core::land_cover::{LandCover, FRACTION_TOLERANCE};
use approx::assert_abs_diff_eq;
use is_close::is_close;

#[test]
fn test_repeated_request_is_served_from_cache() {
    let engine = EngineBuilder::new().build().unwrap();
    let request = SimulationRequest::new("test", 2035, -15.0, 1.2, 30.0);

    let first = engine.simulate_request(&request).unwrap();
    let second = engine.simulate_request(&request).unwrap();

    assert!(!first.stats.cached);
    assert!(second.stats.cached);
    assert_eq!(first.scenario_id, second.scenario_id);
    assert_eq!(
        first.stats.overall_stress_level,
        second.stats.overall_stress_level
    );
    assert!(first.same_outcome(&second));
    assert_eq!(first.metadata, second.metadata);
}

#[test]
fn test_results_are_deterministic_across_engines() {
    let request = SimulationRequest::new("Maharashtra", 2060, -32.5, 3.7, 12.25);
    let a = EngineBuilder::new()
        .build()
        .unwrap()
        .simulate_request(&request)
        .unwrap();
    let b = EngineBuilder::new()
        .build()
        .unwrap()
        .simulate_request(&request)
        .unwrap();

    assert!(!a.stats.cached);
    assert!(!b.stats.cached);
    assert!(a.same_outcome(&b));
    assert_eq!(
        serde_json::to_value(&a.results).unwrap(),
        serde_json::to_value(&b.results).unwrap()
    );
}

#[test]
fn test_scenario_id_ignores_region_spelling() {
    let engine = EngineBuilder::new().build().unwrap();
    let ids: Vec<String> = ["Tamil Nadu", "tamil-nadu", "TAMILNADU", " tamil_nadu "]
        .iter()
        .map(|region| {
            let request = SimulationRequest::new(region, 2040, -10.0, 1.0, 5.0);
            scenario_id(&engine.parameters_for(&request).unwrap())
        })
        .collect();
    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));

    // Only one scenario was computed for all spellings
    for region in ["Tamil Nadu", "tamil-nadu"] {
        engine
            .simulate_request(&SimulationRequest::new(region, 2040, -10.0, 1.0, 5.0))
            .unwrap();
    }
    assert_eq!(engine.cache_stats().entries, 1);
}

#[test]
fn test_identity_scenario_leaves_land_cover_unchanged() {
    let engine = EngineBuilder::new().build().unwrap();
    let result = engine
        .simulate_request(&SimulationRequest::new("test", 2030, 0.0, 0.0, 0.0))
        .unwrap();

    assert_eq!(result.stats.combined_stress_index, 0.0);
    assert_eq!(result.stats.overall_stress_level, StressLevel::Low);
    assert!(result.results.land_transitions.transitions.is_empty());
    assert_eq!(
        result.results.land_cover.projected,
        result.results.land_cover.baseline
    );
    assert_eq!(result.results.land_transitions.degraded_area_km2, 0.0);
    assert_eq!(result.results.land_transitions.urbanized_area_km2, 0.0);
}

#[test]
fn test_cooling_and_wetting_does_not_degrade() {
    let engine = EngineBuilder::new().build().unwrap();
    let result = engine
        .simulate_request(&SimulationRequest::new("test", 2030, 0.0, -2.0, 0.0))
        .unwrap();
    assert_eq!(result.stats.temperature_stress_index, 0.0);
    assert!(result.results.land_transitions.transitions.is_empty());
}

#[test]
fn test_fractions_are_conserved_across_parameter_space() {
    let engine = EngineBuilder::new().build().unwrap();
    for region in ["test", "Kerala", "California", "Brazil"] {
        for rainfall in [-50.0, -20.0, 0.0, 15.0, 30.0] {
            for temperature in [-2.0, 0.0, 2.5, 5.0] {
                for urban in [0.0, 10.0, 50.0, 100.0] {
                    let result = engine
                        .simulate_request(&SimulationRequest::new(
                            region,
                            2050,
                            rainfall,
                            temperature,
                            urban,
                        ))
                        .unwrap();
                    let projected = result.projected_fractions();
                    assert!(
                        (projected.total() - 1.0).abs() <= FRACTION_TOLERANCE,
                        "{region} {rainfall} {temperature} {urban}: total {}",
                        projected.total()
                    );
                    assert!(projected.iter().all(|(_, value)| value >= 0.0));

                    let stress = result.stress();
                    for index in [
                        stress.rainfall_stress,
                        stress.temperature_stress,
                        stress.vegetation_stress,
                        stress.combined_stress_index,
                    ] {
                        assert!((0.0..=1.0).contains(&index));
                    }
                }
            }
        }
    }
}

#[test]
fn test_urban_growth_reports_area() {
    let engine = EngineBuilder::new().build().unwrap();
    let result = engine
        .simulate_request(&SimulationRequest::new("test", 2035, 0.0, 0.0, 20.0))
        .unwrap();
    let land = &result.results.land_transitions;
    let area = engine.catalog().resolve("test").unwrap().area_km2();

    assert!(is_close!(land.total_area_km2, area));
    assert_abs_diff_eq!(land.urbanized_area_km2, 0.2 * area, epsilon = 1e-6);
    assert_abs_diff_eq!(result.stats.urban_gain_pct, 20.0, epsilon = 1e-9);
    assert_abs_diff_eq!(
        result.projected_fractions().get(LandCover::Urban),
        0.3,
        epsilon = 1e-9
    );
}

#[test]
fn test_out_of_range_requests_are_rejected() {
    let engine = EngineBuilder::new().build().unwrap();

    let cases = [
        (SimulationRequest::new("test", 2101, 0.0, 0.0, 0.0), "year"),
        (SimulationRequest::new("test", 2024, 0.0, 0.0, 0.0), "year"),
        (SimulationRequest::new("test", 2035, -51.0, 0.0, 0.0), "rainfall_delta"),
        (SimulationRequest::new("test", 2035, 0.0, 5.5, 0.0), "temperature_delta"),
        (SimulationRequest::new("test", 2035, 0.0, 0.0, -1.0), "urban_growth"),
        (SimulationRequest::new("test", 2035, f64::NAN, 0.0, 0.0), "rainfall_delta"),
    ];
    for (request, expected_field) in cases {
        match engine.simulate_request(&request) {
            Err(AltEarthError::InvalidParameter { field, .. }) => {
                assert_eq!(field, expected_field)
            }
            other => panic!("expected InvalidParameter for {request:?}, got {other:?}"),
        }
    }
    // Nothing was computed or cached
    assert_eq!(engine.cache_stats().entries, 0);
}

#[test]
fn test_unknown_region_is_rejected() {
    let engine = EngineBuilder::new().build().unwrap();
    let result =
        engine.simulate_request(&SimulationRequest::new("not-a-real-place", 2035, 0.0, 0.0, 0.0));
    assert!(matches!(result, Err(AltEarthError::UnknownRegion(_))));
}

#[test]
fn test_response_json_shape() {
    let engine = EngineBuilder::new().build().unwrap();
    let request: SimulationRequest = serde_json::from_value(serde_json::json!({
        "region": "test",
        "rainfall_delta": -15.0,
        "temperature_delta": 1.2,
        "urban_growth": 30.0
    }))
    .unwrap();
    assert_eq!(request.year, DEFAULT_TARGET_YEAR);

    let result = engine.simulate_request(&request).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["scenario_id"], result.scenario_id.as_str());
    assert_eq!(json["data_source"], "mock");
    assert_eq!(json["metadata"]["region"], "test");
    assert_eq!(json["metadata"]["baseline_year"], 2020);
    assert_eq!(json["metadata"]["target_year"], 2035);
    assert!(json["metadata"]["generated_at"].is_string());

    let stress = &json["results"]["climate_stress"];
    for key in [
        "combined_stress_index",
        "rainfall_stress",
        "temperature_stress",
        "vegetation_stress",
    ] {
        assert!(stress[key].is_f64(), "missing {key}");
    }
    let land = &json["results"]["land_transitions"];
    assert!(land["degraded_area_km2"].is_f64());
    assert!(land["urbanized_area_km2"].is_f64());
    assert!(land["transitions"]["crops_to_urban"].is_f64());

    let stats = &json["stats"];
    assert_eq!(stats["overall_stress_level"], "medium");
    assert_eq!(stats["cached"], false);
    for key in [
        "urban_gain_pct",
        "vegetation_loss_pct",
        "crop_stress_index",
        "trees_change_pct",
        "crops_change_pct",
        "computation_time_seconds",
    ] {
        assert!(stats[key].is_f64(), "missing {key}");
    }
    assert!(json["tile_url"]
        .as_str()
        .unwrap()
        .starts_with(&format!("/tiles/{}/", result.scenario_id)));
}

#[test]
fn test_summary_report() {
    let engine = EngineBuilder::new().build().unwrap();
    let result = engine
        .simulate_request(&SimulationRequest::new("Tamil Nadu", 2035, -25.0, 2.5, 30.0))
        .unwrap();
    let summary = result.summary();

    assert!(summary.starts_with("ALTERNATE EARTH FUTURE SCENARIO"));
    assert!(summary.contains("Region: Tamil Nadu"));
    assert!(summary.contains("Timeline: 2020 → 2035"));
    assert!(summary.contains("Severe drought conditions"));
    assert!(summary.contains("Extreme temperature increase"));
    assert!(summary.contains("SIMULATION, not a prediction"));
    assert_eq!(result.data_source, DataSource::Mock);
}
