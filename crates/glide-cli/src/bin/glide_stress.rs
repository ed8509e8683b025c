//! Random airspace layouts solved back to back.
//!
//! Each layout must finish inside the link budget, and any route that is
//! not the direct fallback must stay out of every cylinder the search was
//! asked to avoid. Prints PASS/FAIL per layout and fails the run on any
//! failure.
//!
//! Usage:
//!   cargo run -p glide-cli --bin glide_stress -- --seed 7 --layouts 50

use anyhow::{bail, Result};
use clap::Parser;
use glide_cli::{logging, CliConfig};
use glide_core::config::RouteMode;
use glide_core::{
    AGeoPoint, Airspace, AirspaceAltitude, AirspaceClass, AirspaceShape, Airspaces, GeoPoint,
    ObstacleSources, RoutePlanner, RoutePlannerConfig,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

/// Solve seeded random airspace layouts and check the results
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// RNG seed
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Number of layouts
    #[arg(long, default_value_t = 20)]
    layouts: usize,

    /// Cylinders per layout
    #[arg(long, default_value_t = 15)]
    airspaces: usize,

    /// Distance between origin and destination in meters
    #[arg(long, default_value_t = 50_000.0)]
    span_m: f64,

    /// Center latitude
    #[arg(long, default_value_t = 46.0)]
    lat: f64,

    /// Center longitude
    #[arg(long, default_value_t = 8.0)]
    lon: f64,
}

/// Allowed penetration from projection error, in meters.
const TOLERANCE_M: f64 = 25.0;

fn random_layout(rng: &mut StdRng, center: GeoPoint, span_m: f64, count: usize) -> Result<Airspaces> {
    let mut airspaces = Airspaces::new();
    for i in 0..count {
        let airspace = Airspace {
            name: format!("S{}", i),
            class: AirspaceClass::Restricted,
            shape: AirspaceShape::Circle {
                center: center.offset(
                    rng.random_range(0.0..span_m * 0.4),
                    rng.random_range(0.0..360.0),
                ),
                radius_m: rng.random_range(500.0..(span_m * 0.05).max(600.0)),
            },
            floor: AirspaceAltitude::Ground,
            ceiling: AirspaceAltitude::Unlimited,
            active: true,
        };
        airspaces.add(airspace)?;
    }
    Ok(airspaces)
}

/// Names of cylinders the route enters, ignoring those around an endpoint.
fn violations(points: &[AGeoPoint], airspaces: &Airspaces, margin_m: f64) -> Vec<String> {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    airspaces
        .iter()
        .filter_map(|airspace| {
            let AirspaceShape::Circle { center, radius_m } = airspace.shape else {
                return None;
            };
            let guard = radius_m + margin_m;
            if first.location.distance(&center) <= guard || last.location.distance(&center) <= guard {
                return None;
            }
            let entered = points.windows(2).any(|leg| {
                let (a, b) = (leg[0].location, leg[1].location);
                let samples = (a.distance(&b) / 50.0).ceil().max(1.0) as usize;
                (0..=samples)
                    .any(|k| a.lerp(&b, k as f64 / samples as f64).distance(&center) < radius_m - TOLERANCE_M)
            });
            entered.then(|| airspace.name.clone())
        })
        .collect()
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cli = CliConfig::from_env();
    logging::init(&cli)?;

    let center = GeoPoint::new(args.lat, args.lon);
    let origin = AGeoPoint::new(center.offset(args.span_m / 2.0, 270.0), 1_500.0);
    let destination = AGeoPoint::new(center.offset(args.span_m / 2.0, 90.0), 500.0);
    let mut config = RoutePlannerConfig {
        mode: RouteMode::Airspace,
        ..RoutePlannerConfig::default()
    };
    cli.apply(&mut config);

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut planner = RoutePlanner::default();
    let mut failures = 0;
    let started = Instant::now();

    for layout in 0..args.layouts {
        let airspaces = random_layout(&mut rng, center, args.span_m, args.airspaces)?;
        let t0 = Instant::now();
        planner.solve(
            &origin,
            &destination,
            &config,
            None,
            ObstacleSources {
                terrain: None,
                airspaces: Some(&airspaces),
            },
        )?;
        let elapsed = t0.elapsed();
        let stats = planner.stats();
        let route = planner.solution();

        let mut problems = Vec::new();
        if stats.links_checked > config.tuning.max_links {
            problems.push(format!("{} links over budget", stats.links_checked));
        }
        if !route.is_direct() {
            let entered = violations(route.points(), &airspaces, config.safety_distance_airspace as f64 + 100.0);
            if !entered.is_empty() {
                problems.push(format!("entered {}", entered.join(", ")));
            }
        }

        if problems.is_empty() {
            println!(
                "PASS layout {:3}: {:2} points, {:7.0} m, {:5} links, {:?}{}",
                layout,
                route.len(),
                route.distance_m(),
                stats.links_checked,
                elapsed,
                if stats.budget_exhausted { " (budget exhausted)" } else { "" }
            );
        } else {
            failures += 1;
            println!("FAIL layout {:3}: {}", layout, problems.join("; "));
        }
    }

    println!(
        "{} of {} layouts passed in {:?}",
        args.layouts - failures,
        args.layouts,
        started.elapsed()
    );
    if failures > 0 {
        bail!("{} layouts failed", failures);
    }
    Ok(())
}
