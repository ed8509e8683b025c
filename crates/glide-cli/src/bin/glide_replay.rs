//! Replay a stream of position fixes through one planner.
//!
//! A producer task feeds fixes over a channel; the planner runs on a
//! blocking thread and re-solves route and reach for every fix, printing
//! one JSON line each. Unchanged fixes reuse the previous solution.
//!
//! Usage:
//!   cargo run -p glide-cli --bin glide_replay -- scenario.json --fixes 30

use anyhow::{Context, Result};
use clap::Parser;
use glide_cli::{logging, CliConfig, Scenario};
use glide_core::{AGeoPoint, ObstacleSources, TerrainMap};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;

/// Re-plan along a track toward the scenario destination
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Scenario JSON file
    scenario: PathBuf,

    /// JSON array of fixes; defaults to a straight descent toward the destination
    #[arg(long)]
    track: Option<PathBuf>,

    /// Number of synthesized fixes when no track is given
    #[arg(long, default_value_t = 20)]
    fixes: usize,

    /// Delay between fixes in milliseconds
    #[arg(long, default_value_t = 0)]
    interval_ms: u64,
}

#[derive(Debug, Serialize)]
struct FixReport {
    index: usize,
    position: AGeoPoint,
    recomputed: bool,
    route_points: usize,
    distance_m: f64,
    arrival_m: Option<i32>,
    links_checked: usize,
}

fn synthesize_track(scenario: &Scenario, fixes: usize) -> Vec<AGeoPoint> {
    let n = fixes.max(1);
    let from = scenario.origin;
    let to = scenario.destination;
    (0..n)
        .map(|k| {
            let t = k as f64 / n as f64;
            AGeoPoint::new(
                from.location.lerp(&to.location, t),
                from.altitude_m + (to.altitude_m - from.altitude_m) * t,
            )
        })
        .collect()
}

fn load_track(path: &Path) -> Result<Vec<AGeoPoint>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read track {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse track {}", path.display()))
}

/// Owns the planner and processes fixes until the channel closes.
fn run_planner(scenario: Scenario, mut rx: mpsc::Receiver<(usize, AGeoPoint)>) -> Result<usize> {
    let mut planner = scenario.planner()?;
    let airspaces = scenario.airspace_set()?;
    let terrain = scenario.terrain_grid()?;
    let terrain_ref = terrain.as_ref().map(|t| t as &dyn TerrainMap);

    let mut processed = 0;
    while let Some((index, fix)) = rx.blocking_recv() {
        let recomputed = match planner.solve(
            &fix,
            &scenario.destination,
            &scenario.config,
            scenario.ceiling_m,
            ObstacleSources {
                terrain: terrain_ref,
                airspaces: Some(&airspaces),
            },
        ) {
            Ok(recomputed) => recomputed,
            Err(e) => {
                tracing::warn!("Skipping fix {}: {}", index, e);
                continue;
            }
        };
        planner.solve_reach(&fix, &scenario.config, terrain_ref, true)?;
        let arrival = planner.find_positive_arrival(&scenario.destination)?;

        let report = FixReport {
            index,
            position: fix,
            recomputed,
            route_points: planner.solution().len(),
            distance_m: planner.solution().distance_m(),
            arrival_m: arrival.terrain,
            links_checked: planner.stats().links_checked,
        };
        println!("{}", serde_json::to_string(&report)?);
        processed += 1;
    }
    Ok(processed)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = CliConfig::from_env();
    logging::init(&config)?;

    let mut scenario = Scenario::from_path(&args.scenario)?;
    config.apply(&mut scenario.config);
    let track = match &args.track {
        Some(path) => load_track(path)?,
        None => synthesize_track(&scenario, args.fixes),
    };
    tracing::info!("Replaying {} fixes for '{}'", track.len(), scenario.name);

    let (tx, rx) = mpsc::channel(16);
    let planner = tokio::task::spawn_blocking(move || run_planner(scenario, rx));

    let interval = Duration::from_millis(args.interval_ms);
    for (index, fix) in track.into_iter().enumerate() {
        if tx.send((index, fix)).await.is_err() {
            tracing::warn!("Planner stopped early");
            break;
        }
        if !interval.is_zero() {
            time::sleep(interval).await;
        }
    }
    drop(tx);

    let processed = planner.await.context("planner task panicked")??;
    tracing::info!("Processed {} fixes", processed);
    Ok(())
}
