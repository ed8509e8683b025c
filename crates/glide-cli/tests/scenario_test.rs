//! Scenario file to report, end to end.

use glide_cli::{RouteReport, Scenario, TerrainSpec};

const SCENARIO: &str = r#"{
    "name": "ridge and restricted area",
    "origin": {"lat": 46.0, "lon": 7.935, "altitude_m": 1200},
    "destination": {"lat": 46.0, "lon": 8.065, "altitude_m": 500},
    "config": {"mode": "both", "safety_height_terrain": 100},
    "settings": {"mc": 1.0, "wind": {"speed_mps": 5.0, "from_deg": 270.0}},
    "terrain": {"type": "flat", "elevation_m": 200.0},
    "airspaces": [
        {
            "name": "R-1",
            "class": "restricted",
            "shape": {"type": "circle", "center": {"lat": 46.0, "lon": 8.0}, "radius_m": 2000.0},
            "floor": {"type": "ground"},
            "ceiling": {"type": "flight_level", "level": 95}
        },
        {
            "name": "INFO",
            "class": "advisory",
            "shape": {"type": "circle", "center": {"lat": 46.0, "lon": 8.0}, "radius_m": 4000.0},
            "floor": {"type": "ground"},
            "ceiling": {"type": "unlimited"}
        }
    ]
}"#;

#[test]
fn test_scenario_parses_all_sections() {
    let scenario = Scenario::from_json(SCENARIO).expect("parse");
    assert_eq!(scenario.name, "ridge and restricted area");
    assert_eq!(scenario.airspaces.len(), 2);
    assert_eq!(scenario.config.safety_height_terrain, 100);
    assert!(matches!(scenario.terrain, TerrainSpec::Flat { .. }));
    assert_eq!(scenario.airspace_set().expect("airspaces").len(), 2);
}

#[test]
fn test_report_detours_around_restricted_area() {
    let scenario = Scenario::from_json(SCENARIO).expect("parse");
    let report = RouteReport::build(&scenario, true).expect("report");

    assert!(!report.direct, "restricted area should force a detour");
    assert!(report.route.len() > 2);
    assert_eq!(report.route[0], scenario.origin);
    assert!(!report.stats.budget_exhausted);

    let reach = report.reach.as_ref().expect("reach requested");
    assert!(reach.fans >= 1);
    assert_eq!(reach.terrain_base_m, Some(200));

    let json = serde_json::to_value(&report).expect("serialize");
    assert!(json["generated_at"].is_string());
    assert_eq!(json["scenario"], "ridge and restricted area");
}

#[test]
fn test_unknown_terrain_type_is_rejected() {
    let text = SCENARIO.replace(r#""type": "flat""#, r#""type": "lidar""#);
    assert!(Scenario::from_json(&text).is_err());
}

#[test]
fn test_bundled_ridge_scenario_loads() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/ridge.json");
    let scenario = Scenario::from_path(&path).expect("load");
    assert_eq!(scenario.ceiling_m, Some(3000));
    assert!(matches!(scenario.terrain, TerrainSpec::Hills { ref hills, .. } if hills.len() == 2));
    let grid = scenario.terrain_grid().expect("build").expect("grid");
    assert!(grid.sample(&scenario.origin.location).is_some());
}
