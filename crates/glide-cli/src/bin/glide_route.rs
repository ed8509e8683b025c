//! Solve one scenario file and print the route report as JSON.
//!
//! Usage:
//!   cargo run -p glide-cli --bin glide_route -- scenario.json --reach

use anyhow::{Context, Result};
use clap::Parser;
use glide_cli::{logging, CliConfig, RouteReport, Scenario};
use std::path::PathBuf;

/// Plan a glide route around terrain and airspace
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Scenario JSON file
    scenario: PathBuf,

    /// Also solve the reach footprint from the origin
    #[arg(long)]
    reach: bool,

    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,

    /// Write the report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = CliConfig::from_env();
    logging::init(&config)?;

    let mut scenario = Scenario::from_path(&args.scenario)?;
    config.apply(&mut scenario.config);
    tracing::info!(
        "Solving '{}' from {:.4},{:.4} to {:.4},{:.4}",
        scenario.name,
        scenario.origin.location.lat,
        scenario.origin.location.lon,
        scenario.destination.location.lat,
        scenario.destination.location.lon
    );

    let report = RouteReport::build(&scenario, args.reach)?;
    if report.stats.budget_exhausted {
        tracing::warn!("Link budget exhausted; report holds the direct fallback");
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    match args.output {
        Some(path) => std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}
