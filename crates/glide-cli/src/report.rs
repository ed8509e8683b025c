//! JSON report for a solved scenario.

use crate::scenario::Scenario;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use glide_core::{AGeoPoint, ObstacleSources, ReachResult, SearchStats, TerrainMap};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ReachSummary {
    pub fans: usize,
    pub terrain_base_m: Option<i32>,
    pub destination_inside: bool,
    pub arrival: ReachResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteReport {
    pub generated_at: DateTime<Utc>,
    pub scenario: String,
    pub route: Vec<AGeoPoint>,
    pub distance_m: f64,
    pub direct: bool,
    pub stats: SearchStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reach: Option<ReachSummary>,
}

impl RouteReport {
    /// Solve `scenario` and, when `with_reach`, the reach footprint from its
    /// origin.
    pub fn build(scenario: &Scenario, with_reach: bool) -> Result<Self> {
        let mut planner = scenario.planner()?;
        let airspaces = scenario.airspace_set()?;
        let terrain = scenario.terrain_grid()?;
        let terrain_ref = terrain.as_ref().map(|t| t as &dyn TerrainMap);

        planner
            .solve(
                &scenario.origin,
                &scenario.destination,
                &scenario.config,
                scenario.ceiling_m,
                ObstacleSources {
                    terrain: terrain_ref,
                    airspaces: Some(&airspaces),
                },
            )
            .context("route solve failed")?;

        let reach = if with_reach {
            planner
                .solve_reach(&scenario.origin, &scenario.config, terrain_ref, true)
                .context("reach solve failed")?;
            Some(ReachSummary {
                fans: planner.reach_fans().len(),
                terrain_base_m: planner.terrain_base(),
                destination_inside: planner.is_inside(&scenario.destination.location, true),
                arrival: planner.find_positive_arrival(&scenario.destination)?,
            })
        } else {
            None
        };

        let route = planner.solution();
        Ok(Self {
            generated_at: Utc::now(),
            scenario: scenario.name.clone(),
            route: route.points().to_vec(),
            distance_m: route.distance_m(),
            direct: route.is_direct(),
            stats: planner.stats().clone(),
            reach,
        })
    }
}
