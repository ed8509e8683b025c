//! Planner configuration snapshot passed to every solve.

use crate::error::{Result, RouteError};
use serde::{Deserialize, Serialize};

/// Which obstacle sources the route search avoids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    None,
    Terrain,
    Airspace,
    #[default]
    Both,
}

/// How the reach footprint is calculated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReachMode {
    /// Only a placeholder footprint; terrain base still tracked.
    Off,
    /// Straight glides from the origin.
    Straight,
    /// Straight glides plus turns around terrain shadows.
    #[default]
    Turning,
}

/// Which MacCready setting the reach polar uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReachPolar {
    #[default]
    Task,
    Safety,
}

/// Configuration for a route solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutePlannerConfig {
    pub mode: RouteMode,
    /// Permit climbs to get over terrain or airspace
    pub allow_climb: bool,
    /// Respect the altitude ceiling passed to the solve
    pub use_ceiling: bool,
    /// Minimum clearance above terrain in meters
    pub safety_height_terrain: i32,
    /// Lateral clearance kept from airspace boundaries in meters
    pub safety_distance_airspace: i32,
    pub reach_calc_mode: ReachMode,
    pub reach_polar_mode: ReachPolar,
    pub tuning: SearchTuning,
    pub reach: ReachTuning,
}

impl Default for RoutePlannerConfig {
    fn default() -> Self {
        Self {
            mode: RouteMode::Both,
            allow_climb: true,
            use_ceiling: false,
            safety_height_terrain: 150,
            safety_distance_airspace: 300,
            reach_calc_mode: ReachMode::Turning,
            reach_polar_mode: ReachPolar::Task,
            tuning: SearchTuning::default(),
            reach: ReachTuning::default(),
        }
    }
}

impl RoutePlannerConfig {
    /// Reject settings the search cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.safety_height_terrain < 0 || self.safety_distance_airspace < 0 {
            return Err(RouteError::InvalidConfig(format!(
                "safety margins must be non-negative, got {} m height and {} m distance",
                self.safety_height_terrain, self.safety_distance_airspace
            )));
        }
        self.tuning.validate()
    }

    pub fn terrain_enabled(&self) -> bool {
        matches!(self.mode, RouteMode::Terrain | RouteMode::Both)
    }

    pub fn airspace_enabled(&self) -> bool {
        matches!(self.mode, RouteMode::Airspace | RouteMode::Both)
    }
}

/// Thresholds that shape candidate generation.
///
/// These affect solution quality, not correctness. [`SearchTuning::validate`]
/// rejects values that would switch off a pruning rule or the link budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchTuning {
    /// Candidate links with a manhattan length below this are dropped
    pub min_step_m: i32,
    /// Maximum angle between a candidate leg and the bearing to the goal
    pub max_deviation_deg: f64,
    /// Number of lateral offsets tried on each side of a terrain hit
    pub terrain_sweep_steps: u32,
    /// Spacing between lateral offsets in meters
    pub terrain_sweep_distance_m: i32,
    /// Extra height added above a terrain hit for climb-over candidates
    pub climb_over_margin_m: i32,
    /// Segments used to approximate circular airspace
    pub airspace_polygon_segments: u32,
    /// Airspace further than this from the direct leg is ignored
    pub airspace_search_margin_m: f64,
    /// Cost multiplier for climbs above the higher endpoint
    pub climb_penalty: f64,
    /// Upper bound on links checked per solve
    pub max_links: usize,
    /// Sample spacing for terrain line scans in meters
    pub terrain_scan_step_m: f64,
}

impl Default for SearchTuning {
    fn default() -> Self {
        Self {
            min_step_m: 250,
            max_deviation_deg: 90.0,
            terrain_sweep_steps: 6,
            terrain_sweep_distance_m: 1_000,
            climb_over_margin_m: 100,
            airspace_polygon_segments: 16,
            airspace_search_margin_m: 20_000.0,
            climb_penalty: 2.0,
            max_links: 5_000,
            terrain_scan_step_m: 100.0,
        }
    }
}

impl SearchTuning {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(RouteError::InvalidConfig(msg));
        if self.min_step_m <= 0 {
            return invalid(format!("min_step_m must be positive, got {}", self.min_step_m));
        }
        if !(self.max_deviation_deg > 0.0 && self.max_deviation_deg <= 180.0) {
            return invalid(format!(
                "max_deviation_deg must be in (0, 180], got {}",
                self.max_deviation_deg
            ));
        }
        if self.max_links == 0 {
            return invalid("max_links must be at least 1".to_string());
        }
        if self.terrain_sweep_distance_m <= 0 {
            return invalid(format!(
                "terrain_sweep_distance_m must be positive, got {}",
                self.terrain_sweep_distance_m
            ));
        }
        if !(self.terrain_scan_step_m.is_finite() && self.terrain_scan_step_m > 0.0) {
            return invalid(format!(
                "terrain_scan_step_m must be positive, got {}",
                self.terrain_scan_step_m
            ));
        }
        if !(self.airspace_search_margin_m.is_finite() && self.airspace_search_margin_m >= 0.0) {
            return invalid(format!(
                "airspace_search_margin_m must be non-negative, got {}",
                self.airspace_search_margin_m
            ));
        }
        if !(self.climb_penalty.is_finite() && self.climb_penalty >= 0.0) {
            return invalid(format!("climb_penalty must be non-negative, got {}", self.climb_penalty));
        }
        Ok(())
    }
}

/// Limits for the reach fan tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReachTuning {
    /// Terrain sample spacing along each ray in meters
    pub ray_step_m: f64,
    /// Maximum nesting of child fans
    pub max_depth: u32,
    /// Maximum number of fans in the tree
    pub max_fans: usize,
    /// Child fans need at least this much height above the glide floor
    pub min_height_m: i32,
    /// Rays never extend further than this
    pub max_range_m: f64,
    /// Minimum spacing between child fan origins in meters
    pub min_gap_m: f64,
}

impl Default for ReachTuning {
    fn default() -> Self {
        Self {
            ray_step_m: 100.0,
            max_depth: 3,
            max_fans: 64,
            min_height_m: 100,
            max_range_m: 250_000.0,
            min_gap_m: 500.0,
        }
    }
}
