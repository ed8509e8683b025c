//! End-to-end planner tests: route search around airspace and terrain,
//! solve caching, termination on awkward layouts and the reach footprint.

use glide_core::config::{ReachMode, ReachPolar, RouteMode};
use glide_core::route::{
    AirspaceClearance, Blockage, ClearanceContext, ClearanceOracle, NearbyCandidate, RouteLink,
    RouteLinkBase,
};
use glide_core::{
    AGeoPoint, Airspace, AirspaceAltitude, AirspaceClass, AirspaceShape, Airspaces, FlatProjection,
    GeoBounds, GeoPoint, GlidePolar, GlideSettings, ObstacleSources, RouteError, RoutePlanner,
    RoutePlannerConfig, TerrainGrid, TerrainMap,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

const CENTER: GeoPoint = GeoPoint::new(46.0, 8.0);

fn endpoints(half_span_m: f64) -> (AGeoPoint, AGeoPoint) {
    (
        AGeoPoint::new(CENTER.offset(half_span_m, 270.0), 1_000.0),
        AGeoPoint::new(CENTER.offset(half_span_m, 90.0), 500.0),
    )
}

fn cylinder(name: &str, center: GeoPoint, radius_m: f64, top_m: f64) -> Airspace {
    Airspace {
        name: name.to_string(),
        class: AirspaceClass::Restricted,
        shape: AirspaceShape::Circle { center, radius_m },
        floor: AirspaceAltitude::Ground,
        ceiling: AirspaceAltitude::Msl { meters: top_m },
        active: true,
    }
}

fn flat_terrain(margin_m: f64) -> TerrainGrid {
    let bounds = GeoBounds::from_points([&CENTER])
        .expect("bounds")
        .expand_m(margin_m);
    TerrainGrid::flat(bounds, 0.0)
}

/// Minimum distance from `center` over samples of every route leg.
fn route_clearance(points: &[AGeoPoint], center: &GeoPoint) -> f64 {
    points
        .windows(2)
        .flat_map(|leg| {
            let (a, b) = (leg[0].location, leg[1].location);
            let samples = (a.distance(&b) / 50.0).ceil().max(1.0) as usize;
            (0..=samples).map(move |k| a.lerp(&b, k as f64 / samples as f64))
        })
        .map(|p| p.distance(center))
        .fold(f64::INFINITY, f64::min)
}

/// Wraps an oracle and records every link it is asked about.
struct Recording<O> {
    inner: O,
    calls: Cell<usize>,
    seen: RefCell<HashSet<RouteLinkBase>>,
}

impl<O> Recording<O> {
    fn new(inner: O) -> Self {
        Self {
            inner,
            calls: Cell::new(0),
            seen: RefCell::new(HashSet::new()),
        }
    }
}

impl<O: ClearanceOracle> ClearanceOracle for Recording<O> {
    fn check_clearance(&self, link: &RouteLink, ctx: &ClearanceContext<'_>) -> Option<Blockage> {
        self.calls.set(self.calls.get() + 1);
        self.seen.borrow_mut().insert(*link.base());
        self.inner.check_clearance(link, ctx)
    }

    fn add_nearby(
        &self,
        link: &RouteLink,
        blockage: &Blockage,
        ctx: &ClearanceContext<'_>,
    ) -> Vec<NearbyCandidate> {
        self.inner.add_nearby(link, blockage, ctx)
    }

    fn handles(&self, blockage: &Blockage) -> bool {
        self.inner.handles(blockage)
    }

    fn revision(&self) -> u64 {
        self.inner.revision()
    }
}

#[test]
fn test_no_obstacles_gives_direct_route() {
    let (origin, destination) = endpoints(5_000.0);
    let terrain = flat_terrain(20_000.0);
    let airspaces = Airspaces::new();
    let mut planner = RoutePlanner::default();
    let sources = ObstacleSources {
        terrain: Some(&terrain),
        airspaces: Some(&airspaces),
    };
    planner
        .solve(&origin, &destination, &RoutePlannerConfig::default(), None, sources)
        .expect("solve");
    assert_eq!(planner.solution().points(), &[origin, destination]);
    assert_eq!(planner.stats().links_checked, 1);
}

#[test]
fn test_route_bends_around_restricted_cylinder() {
    let (origin, destination) = endpoints(5_000.0);
    let terrain = flat_terrain(20_000.0);
    let mut airspaces = Airspaces::new();
    airspaces
        .add(cylinder("R1", CENTER, 2_000.0, 2_000.0))
        .expect("valid airspace");

    let mut planner = RoutePlanner::default();
    let sources = ObstacleSources {
        terrain: Some(&terrain),
        airspaces: Some(&airspaces),
    };
    planner
        .solve(&origin, &destination, &RoutePlannerConfig::default(), None, sources)
        .expect("solve");

    let route = planner.solution();
    assert!(route.len() > 2, "expected a detour, got {:?}", route);
    assert_eq!(route.points()[0], origin);
    assert_eq!(route.points()[route.len() - 1], destination);
    let clearance = route_clearance(route.points(), &CENTER);
    assert!(clearance >= 1_990.0, "route passes {:.0} m from the center", clearance);
    assert!(!planner.stats().budget_exhausted);
}

#[test]
fn test_disabled_airspace_avoidance_flies_straight_through() {
    let (origin, destination) = endpoints(5_000.0);
    let mut airspaces = Airspaces::new();
    airspaces
        .add(cylinder("R1", CENTER, 2_000.0, 2_000.0))
        .expect("valid airspace");
    let config = RoutePlannerConfig {
        mode: RouteMode::Terrain,
        ..RoutePlannerConfig::default()
    };
    let mut planner = RoutePlanner::default();
    planner
        .solve(
            &origin,
            &destination,
            &config,
            None,
            ObstacleSources {
                terrain: None,
                airspaces: Some(&airspaces),
            },
        )
        .expect("solve");
    assert!(planner.solution().is_direct());
}

#[test]
fn test_glide_above_airspace_ceiling_stays_direct() {
    let (origin, destination) = endpoints(5_000.0);
    let high_origin = AGeoPoint::new(origin.location, 3_000.0);
    let high_destination = AGeoPoint::new(destination.location, 2_800.0);
    let mut airspaces = Airspaces::new();
    airspaces
        .add(cylinder("LOW", CENTER, 2_000.0, 1_500.0))
        .expect("valid airspace");
    let mut planner = RoutePlanner::default();
    let sources = ObstacleSources {
        terrain: None,
        airspaces: Some(&airspaces),
    };
    planner
        .solve(&high_origin, &high_destination, &RoutePlannerConfig::default(), None, sources)
        .expect("solve");
    assert!(planner.solution().is_direct(), "glide passes above the ceiling");
}

#[test]
fn test_repeat_solve_does_not_query_oracle() {
    let (origin, destination) = endpoints(5_000.0);
    let mut airspaces = Airspaces::new();
    airspaces
        .add(cylinder("R1", CENTER, 2_000.0, 2_000.0))
        .expect("valid airspace");
    let config = RoutePlannerConfig::default();
    let projection =
        FlatProjection::for_pair(&origin.location, &destination.location).expect("projection");
    let oracle = Recording::new(AirspaceClearance::from_airspaces(
        &airspaces,
        &projection,
        &origin,
        &destination,
        &config,
    ));

    let mut planner = RoutePlanner::default();
    assert!(planner
        .solve_with(&origin, &destination, &config, None, &oracle)
        .expect("first solve"));
    let calls = oracle.calls.get();
    let first_route = planner.solution().clone();
    assert!(calls > 0);

    assert!(!planner
        .solve_with(&origin, &destination, &config, None, &oracle)
        .expect("second solve"));
    assert_eq!(oracle.calls.get(), calls);
    assert_eq!(planner.solution(), &first_route);

    let moved = AGeoPoint::new(destination.location, 600.0);
    assert!(planner
        .solve_with(&origin, &moved, &config, None, &oracle)
        .expect("changed destination"));
    assert!(oracle.calls.get() > calls);
}

#[test]
fn test_links_are_checked_at_most_once() {
    let (origin, destination) = endpoints(12_000.0);
    let mut airspaces = Airspaces::new();
    for (i, dx) in [-6_000.0_f64, 0.0, 6_000.0].into_iter().enumerate() {
        let center = CENTER.offset(dx.abs(), if dx < 0.0 { 270.0 } else { 90.0 });
        airspaces
            .add(cylinder(&format!("R{}", i), center, 2_500.0, 3_000.0))
            .expect("valid airspace");
    }
    let config = RoutePlannerConfig::default();
    let projection =
        FlatProjection::for_pair(&origin.location, &destination.location).expect("projection");
    let oracle = Recording::new(AirspaceClearance::from_airspaces(
        &airspaces,
        &projection,
        &origin,
        &destination,
        &config,
    ));
    let mut planner = RoutePlanner::default();
    planner
        .solve_with(&origin, &destination, &config, None, &oracle)
        .expect("solve");
    assert_eq!(oracle.calls.get(), oracle.seen.borrow().len());
    assert_eq!(oracle.calls.get(), planner.stats().links_checked);
}

#[test]
fn test_search_terminates_on_random_layouts() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let (origin, destination) = endpoints(25_000.0);
    let config = RoutePlannerConfig {
        mode: RouteMode::Airspace,
        ..RoutePlannerConfig::default()
    };

    for _ in 0..8 {
        let mut airspaces = Airspaces::new();
        for i in 0..15 {
            let center = CENTER.offset(
                rng.random_range(0.0..20_000.0),
                rng.random_range(0.0..360.0),
            );
            let radius = rng.random_range(500.0..2_500.0);
            airspaces
                .add(cylinder(&format!("C{}", i), center, radius, 5_000.0))
                .expect("valid airspace");
        }

        let mut planner = RoutePlanner::default();
        let sources = ObstacleSources {
            terrain: None,
            airspaces: Some(&airspaces),
        };
        planner
            .solve(&origin, &destination, &config, None, sources)
            .expect("solve");
        let stats = planner.stats();
        assert!(stats.links_checked <= config.tuning.max_links);

        let route = planner.solution();
        assert_eq!(route.points()[0], origin);
        assert_eq!(route.points()[route.len() - 1], destination);
        if !route.is_direct() {
            for airspace in airspaces.iter() {
                let AirspaceShape::Circle { center, radius_m } = airspace.shape else {
                    continue;
                };
                if origin.location.distance(&center) <= radius_m + 400.0
                    || destination.location.distance(&center) <= radius_m + 400.0
                {
                    continue;
                }
                let clearance = route_clearance(route.points(), &center);
                assert!(clearance >= radius_m - 25.0, "{} entered", airspace.name);
            }
        }
    }
}

#[test]
fn test_search_terminates_inside_ring_of_airspace() {
    let (origin, destination) = endpoints(15_000.0);
    let mut airspaces = Airspaces::new();
    for (ring, radius) in [(0, 6_000.0), (1, 9_000.0)] {
        for k in 0..12 {
            let bearing = k as f64 * 30.0 + ring as f64 * 15.0;
            let center = destination.location.offset(radius, bearing);
            airspaces
                .add(cylinder(&format!("RING{}-{}", ring, k), center, 1_800.0, 4_000.0))
                .expect("valid airspace");
        }
    }
    let config = RoutePlannerConfig {
        mode: RouteMode::Airspace,
        ..RoutePlannerConfig::default()
    };
    let mut planner = RoutePlanner::default();
    planner
        .solve(
            &origin,
            &destination,
            &config,
            None,
            ObstacleSources {
                terrain: None,
                airspaces: Some(&airspaces),
            },
        )
        .expect("solve");
    assert!(planner.stats().links_checked <= config.tuning.max_links);
    assert_eq!(planner.solution().points()[0], origin);
}

#[test]
fn test_precondition_violations_are_errors() {
    let (origin, destination) = endpoints(5_000.0);
    let mut planner = RoutePlanner::default();
    let config = RoutePlannerConfig::default();
    let nan = AGeoPoint::new(GeoPoint::new(46.0, f64::NAN), 1_000.0);
    let polar_ice = AGeoPoint::new(GeoPoint::new(95.0, 8.0), 1_000.0);
    let deep = AGeoPoint::new(origin.location, -5_000.0);
    for bad in [nan, polar_ice] {
        let result = planner.solve(&bad, &destination, &config, None, ObstacleSources::default());
        assert!(matches!(result, Err(RouteError::InvalidCoordinate { .. })));
    }
    assert!(matches!(
        planner.solve(&deep, &destination, &config, None, ObstacleSources::default()),
        Err(RouteError::InvalidAltitude(_))
    ));
    assert!(matches!(
        GlidePolar::from_points([(20.0, 0.5), (30.0, 1.5), (40.0, 1.8)], 20.0, 40.0),
        Err(RouteError::InvalidPolar(_))
    ));
}

#[test]
fn test_terrain_intersection_finds_ridge() {
    let bounds = GeoBounds::from_points([&CENTER])
        .expect("bounds")
        .expand_m(20_000.0);
    let projection = FlatProjection::new(CENTER).expect("projection");
    let ridge = TerrainGrid::from_fn(bounds, 100.0, move |p| {
        if projection.project(p).x.abs() < 500 {
            1_200.0
        } else {
            200.0
        }
    });
    let (origin, destination) = endpoints(5_000.0);
    let planner = RoutePlanner::default();
    let config = RoutePlannerConfig::default();

    let hit = planner
        .intersection(&origin, &destination.location, &config, &ridge)
        .expect("valid inputs")
        .expect("ridge in the way");
    let along = origin.location.distance(&hit);
    assert!(along > 4_000.0 && along < 5_200.0, "hit {:.0} m out", along);

    let high = AGeoPoint::new(origin.location, 3_000.0);
    assert_eq!(
        planner
            .intersection(&high, &destination.location, &config, &ridge)
            .expect("valid inputs"),
        None
    );
}

/// Ridge of `top_m` across the x axis, `half_length_m` to either side, on a
/// 200 m plain.
fn ridge(half_length_m: i32, top_m: f64) -> TerrainGrid {
    let bounds = GeoBounds::from_points([&CENTER])
        .expect("bounds")
        .expand_m(25_000.0);
    let projection = FlatProjection::new(CENTER).expect("projection");
    TerrainGrid::from_fn(bounds, 100.0, move |p| {
        let f = projection.project(p);
        if f.x.abs() < 300 && f.y.abs() < half_length_m {
            top_m
        } else {
            200.0
        }
    })
}

/// Lowest height above terrain along the route, with altitude interpolated
/// linearly along each leg.
fn terrain_margin(points: &[AGeoPoint], terrain: &TerrainGrid) -> f64 {
    points
        .windows(2)
        .flat_map(|leg| {
            let (a, b) = (leg[0], leg[1]);
            let samples = (a.location.distance(&b.location) / 25.0).ceil().max(1.0) as usize;
            (0..=samples).map(move |k| {
                let t = k as f64 / samples as f64;
                let altitude = a.altitude_m + (b.altitude_m - a.altitude_m) * t;
                (a.location.lerp(&b.location, t), altitude)
            })
        })
        .map(|(p, altitude)| altitude - terrain.height(&p).unwrap_or(0) as f64)
        .fold(f64::INFINITY, f64::min)
}

#[test]
fn test_route_goes_around_finite_ridge() {
    let (low_origin, destination) = endpoints(5_000.0);
    let origin = AGeoPoint::new(low_origin.location, 1_200.0);
    let terrain = ridge(3_000, 1_500.0);
    let config = RoutePlannerConfig {
        mode: RouteMode::Terrain,
        allow_climb: false,
        ..RoutePlannerConfig::default()
    };
    let mut planner = RoutePlanner::default();
    planner
        .solve(
            &origin,
            &destination,
            &config,
            None,
            ObstacleSources {
                terrain: Some(&terrain),
                airspaces: None,
            },
        )
        .expect("solve");

    let route = planner.solution();
    assert!(route.len() > 2, "expected a detour, got {:?}", route);
    assert_eq!(route.points()[0], origin);
    assert_eq!(route.points()[route.len() - 1], destination);
    let margin = terrain_margin(route.points(), &terrain);
    assert!(
        margin >= config.safety_height_terrain as f64 - 5.0,
        "route comes within {:.0} m of terrain",
        margin
    );
    assert!(!planner.stats().budget_exhausted);
}

#[test]
fn test_unpassable_ridge_without_climb_falls_back_to_direct() {
    let (origin, destination) = endpoints(5_000.0);
    // Too long to go around from 1000 m and too high to cross.
    let terrain = ridge(12_000, 1_500.0);
    let config = RoutePlannerConfig {
        mode: RouteMode::Terrain,
        allow_climb: false,
        ..RoutePlannerConfig::default()
    };
    let mut planner = RoutePlanner::default();
    planner
        .solve(
            &origin,
            &destination,
            &config,
            None,
            ObstacleSources {
                terrain: Some(&terrain),
                airspaces: None,
            },
        )
        .expect("solve");
    assert!(planner.solution().is_direct());
    assert_eq!(planner.solution().points(), &[origin, destination]);
}

#[test]
fn test_new_airspace_set_forces_recompute() {
    let (origin, destination) = endpoints(5_000.0);
    let config = RoutePlannerConfig {
        mode: RouteMode::Airspace,
        ..RoutePlannerConfig::default()
    };
    let mut aside = Airspaces::new();
    aside
        .add(cylinder("A", CENTER.offset(8_000.0, 0.0), 2_000.0, 3_000.0))
        .expect("valid airspace");
    let mut across = Airspaces::new();
    across
        .add(cylinder("B", CENTER, 2_000.0, 3_000.0))
        .expect("valid airspace");

    let mut planner = RoutePlanner::default();
    let solve = |planner: &mut RoutePlanner, airspaces: &Airspaces| {
        planner
            .solve(
                &origin,
                &destination,
                &config,
                None,
                ObstacleSources {
                    terrain: None,
                    airspaces: Some(airspaces),
                },
            )
            .expect("solve")
    };
    assert!(solve(&mut planner, &aside));
    assert!(planner.solution().is_direct());

    assert!(solve(&mut planner, &across), "different airspace must not reuse the old route");
    assert!(planner.solution().len() > 2);
    assert!(!solve(&mut planner, &across));

    let terrain_a = ridge(3_000, 1_500.0);
    let terrain_b = ridge(3_000, 1_500.0);
    let terrain_config = RoutePlannerConfig {
        mode: RouteMode::Terrain,
        ..RoutePlannerConfig::default()
    };
    let with_terrain = |planner: &mut RoutePlanner, terrain: &TerrainGrid| {
        planner
            .solve(
                &origin,
                &destination,
                &terrain_config,
                None,
                ObstacleSources {
                    terrain: Some(terrain),
                    airspaces: None,
                },
            )
            .expect("solve")
    };
    assert!(with_terrain(&mut planner, &terrain_a));
    assert!(with_terrain(&mut planner, &terrain_b));
    assert!(!with_terrain(&mut planner, &terrain_b));
}

#[test]
fn test_route_keeps_lateral_margin_from_airspace() {
    let (origin, destination) = endpoints(5_000.0);
    // Edge 150 m south of the direct line.
    let center = CENTER.offset(2_150.0, 180.0);
    let mut airspaces = Airspaces::new();
    airspaces
        .add(cylinder("NEAR", center, 2_000.0, 3_000.0))
        .expect("valid airspace");
    let config = RoutePlannerConfig {
        mode: RouteMode::Airspace,
        safety_distance_airspace: 300,
        ..RoutePlannerConfig::default()
    };
    let mut planner = RoutePlanner::default();
    planner
        .solve(
            &origin,
            &destination,
            &config,
            None,
            ObstacleSources {
                terrain: None,
                airspaces: Some(&airspaces),
            },
        )
        .expect("solve");

    let route = planner.solution();
    assert!(route.len() > 2, "direct line is inside the margin");
    let clearance = route_clearance(route.points(), &center);
    assert!(clearance >= 2_000.0 + 300.0 - 25.0, "route passes {:.0} m from the center", clearance);
}

fn reach_setup() -> (RoutePlanner, RoutePlannerConfig) {
    // L/D 8 at 20 m/s when flown at MacCready zero.
    let polar = GlidePolar::from_points([(20.0, 2.5), (30.0, 5.0), (40.0, 9.0)], 20.0, 40.0)
        .expect("polar");
    let settings = GlideSettings {
        mc: 0.0,
        ..GlideSettings::default()
    };
    let planner = RoutePlanner::new(polar, settings).expect("planner");
    let config = RoutePlannerConfig {
        safety_height_terrain: 0,
        reach_polar_mode: ReachPolar::Task,
        ..RoutePlannerConfig::default()
    };
    (planner, config)
}

#[test]
fn test_reach_on_flat_terrain_matches_glide_range() {
    let (mut planner, config) = reach_setup();
    let terrain = flat_terrain(30_000.0);
    let origin = AGeoPoint::new(CENTER, 1_000.0);
    assert!(planner
        .solve_reach(&origin, &config, Some(&terrain), true)
        .expect("reach"));
    assert_eq!(planner.terrain_base(), Some(0));

    for k in 0..16 {
        let bearing = k as f64 * 22.5 + 1.0;
        for turning in [false, true] {
            assert!(
                planner.is_inside(&CENTER.offset(7_950.0, bearing), turning),
                "7950 m at {} deg",
                bearing
            );
            assert!(
                !planner.is_inside(&CENTER.offset(8_250.0, bearing), turning),
                "8250 m at {} deg",
                bearing
            );
        }
    }

    let near = AGeoPoint::new(CENTER.offset(4_000.0, 45.0), 0.0);
    let result = planner.find_positive_arrival(&near).expect("solved");
    let direct = result.direct.expect("in range");
    assert!((direct - 500).abs() <= 2, "arrival {}", direct);
    assert_eq!(result.terrain, Some(direct));

    let far = AGeoPoint::new(CENTER.offset(9_000.0, 45.0), 0.0);
    let result = planner.find_positive_arrival(&far).expect("solved");
    assert_eq!(result.direct, None);
    assert_eq!(result.terrain, None);
}

#[test]
fn test_reach_off_keeps_only_terrain_base() {
    let (mut planner, mut config) = reach_setup();
    config.reach_calc_mode = ReachMode::Off;
    let terrain = flat_terrain(30_000.0);
    let origin = AGeoPoint::new(CENTER, 1_000.0);
    assert!(!planner
        .solve_reach(&origin, &config, Some(&terrain), true)
        .expect("reach"));
    assert_eq!(planner.terrain_base(), Some(0));
    assert!(planner.reach_polygons(true).is_empty());
}

#[test]
fn test_terrain_reach_never_exceeds_direct_reach() {
    let (mut planner, config) = reach_setup();
    let bounds = GeoBounds::from_points([&CENTER])
        .expect("bounds")
        .expand_m(30_000.0);
    let mut rng = StdRng::seed_from_u64(42);
    let hills: Vec<(GeoPoint, f64, f64)> = (0..6)
        .map(|_| {
            (
                CENTER.offset(rng.random_range(1_000.0..7_000.0), rng.random_range(0.0..360.0)),
                rng.random_range(300.0..1_500.0),
                rng.random_range(500.0..1_500.0),
            )
        })
        .collect();
    let terrain = TerrainGrid::from_fn(bounds, 100.0, |p| {
        hills
            .iter()
            .map(|(c, h, w)| h * (-(p.distance(c) / w).powi(2)).exp())
            .sum()
    });

    let origin = AGeoPoint::new(CENTER, 1_200.0);
    planner
        .solve_reach(&origin, &config, Some(&terrain), true)
        .expect("reach");
    for _ in 0..200 {
        let dest = AGeoPoint::new(
            CENTER.offset(rng.random_range(0.0..10_000.0), rng.random_range(0.0..360.0)),
            rng.random_range(0.0..600.0),
        );
        let result = planner.find_positive_arrival(&dest).expect("solved");
        if let Some(terrain) = result.terrain {
            let direct = result.direct.expect("terrain reach implies direct reach");
            assert!(terrain <= direct);
            assert!(terrain >= dest.altitude_m.round() as i32);
        }
    }
}
