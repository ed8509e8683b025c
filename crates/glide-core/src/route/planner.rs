//! Planner facade owning the search state, performance tables and reach.

use crate::airspace::Airspaces;
use crate::config::{ReachMode, ReachPolar, RoutePlannerConfig};
use crate::error::Result;
use crate::geo::{AGeoPoint, GeoPoint};
use crate::polar::{GlidePolar, GlideSettings};
use crate::projection::FlatProjection;
use crate::reach::{FlatTriangleFan, ReachFan, ReachResult};
use crate::route::clearance::{
    AirspaceClearance, ChainedClearance, ClearanceContext, ClearanceOracle, TerrainClearance,
};
use crate::route::link::{Route, RoutePoint};
use crate::route::polars::RoutePolars;
use crate::route::search::{SearchState, SearchStats};
use crate::terrain::TerrainMap;

/// Obstacle data available to a solve. Missing sources are not avoided.
#[derive(Clone, Copy, Default)]
pub struct ObstacleSources<'a> {
    pub terrain: Option<&'a dyn TerrainMap>,
    pub airspaces: Option<&'a Airspaces>,
}

/// Everything a solve result depends on.
#[derive(Debug, Clone, PartialEq)]
struct SolveKey {
    origin: AGeoPoint,
    destination: AGeoPoint,
    config: RoutePlannerConfig,
    ceiling: Option<i32>,
    polar_revision: u64,
    obstacle_revision: u64,
}

pub struct RoutePlanner {
    polar: GlidePolar,
    settings: GlideSettings,
    polar_revision: u64,
    rpolars_route: RoutePolars,
    rpolars_reach: RoutePolars,
    reach: ReachFan,
    search: SearchState,
    solution: Route,
    last_key: Option<SolveKey>,
}

impl Default for RoutePlanner {
    fn default() -> Self {
        let polar = GlidePolar::default();
        let settings = GlideSettings::default();
        Self {
            rpolars_route: RoutePolars::new(&polar, &settings, settings.mc),
            rpolars_reach: RoutePolars::new(&polar, &settings, settings.mc),
            polar,
            settings,
            polar_revision: 0,
            reach: ReachFan::default(),
            search: SearchState::default(),
            solution: Route::default(),
            last_key: None,
        }
    }
}

impl RoutePlanner {
    pub fn new(polar: GlidePolar, settings: GlideSettings) -> Result<Self> {
        let mut planner = Self::default();
        planner.update_polar(polar, settings)?;
        Ok(planner)
    }

    /// Replace the performance model. The next solve always recomputes.
    pub fn update_polar(&mut self, polar: GlidePolar, settings: GlideSettings) -> Result<()> {
        polar.validate()?;
        self.polar = polar;
        self.settings = settings;
        self.rpolars_route = RoutePolars::new(&polar, &settings, settings.mc);
        self.polar_revision = self.polar_revision.wrapping_add(1);
        tracing::debug!(
            "Polar updated: best L/D {:.1}, mc {:.1} m/s",
            polar.best_ld(),
            settings.mc
        );
        Ok(())
    }

    pub fn polar(&self) -> &GlidePolar {
        &self.polar
    }

    pub fn settings(&self) -> &GlideSettings {
        &self.settings
    }

    /// Forget the previous solution and reach footprint.
    pub fn reset(&mut self) {
        self.search.clear();
        self.reach.reset();
        self.solution = Route::default();
        self.last_key = None;
    }

    /// Plan from `origin` to `destination` around the enabled obstacles.
    ///
    /// Returns `Ok(false)` without searching when nothing the result
    /// depends on has changed since the previous solve.
    pub fn solve(
        &mut self,
        origin: &AGeoPoint,
        destination: &AGeoPoint,
        config: &RoutePlannerConfig,
        ceiling: Option<i32>,
        sources: ObstacleSources<'_>,
    ) -> Result<bool> {
        origin.validate()?;
        destination.validate()?;
        config.validate()?;
        let projection = FlatProjection::for_pair(&origin.location, &destination.location)?;

        let terrain = sources
            .terrain
            .filter(|_| config.terrain_enabled())
            .map(TerrainClearance::new);
        let airspace = sources
            .airspaces
            .filter(|_| config.airspace_enabled())
            .map(|airspaces| {
                AirspaceClearance::from_airspaces(airspaces, &projection, origin, destination, config)
            });
        self.solve_with(
            origin,
            destination,
            config,
            ceiling,
            &ChainedClearance::new(terrain, airspace),
        )
    }

    /// Plan against a caller-supplied oracle.
    pub fn solve_with(
        &mut self,
        origin: &AGeoPoint,
        destination: &AGeoPoint,
        config: &RoutePlannerConfig,
        ceiling: Option<i32>,
        oracle: &dyn ClearanceOracle,
    ) -> Result<bool> {
        origin.validate()?;
        destination.validate()?;
        config.validate()?;

        let key = SolveKey {
            origin: *origin,
            destination: *destination,
            config: config.clone(),
            ceiling,
            polar_revision: self.polar_revision,
            obstacle_revision: oracle.revision(),
        };
        if self.last_key.as_ref() == Some(&key) {
            tracing::trace!("Solve inputs unchanged, keeping previous route");
            return Ok(false);
        }

        let projection = FlatProjection::for_pair(&origin.location, &destination.location)?;
        let origin_alt = origin.altitude_m.round() as i32;
        let destination_alt = destination.altitude_m.round() as i32;
        self.rpolars_route
            .set_config(config, origin_alt, destination_alt, ceiling);

        let start = RoutePoint::new(projection.project(&destination.location), destination_alt);
        let goal = RoutePoint::new(projection.project(&origin.location), origin_alt);

        if start.location == goal.location {
            self.search.clear();
            self.solution = Route::direct(*origin, *destination);
        } else {
            let ctx = ClearanceContext {
                projection: &projection,
                polars: &self.rpolars_route,
                config,
            };
            self.solution = match self.search.run(start, goal, oracle, &ctx) {
                Some(path) => Route::from_route_points(&path, &projection, *origin, *destination),
                None => {
                    tracing::warn!(
                        "No obstacle-free route found after {} links, falling back to direct",
                        self.search.stats().links_checked
                    );
                    Route::direct(*origin, *destination)
                }
            };
        }

        self.last_key = Some(key);
        tracing::debug!(
            "Route solved: {} points, {:.0} m, {} links checked",
            self.solution.len(),
            self.solution.distance_m(),
            self.search.stats().links_checked
        );
        Ok(true)
    }

    /// Latest solved route, origin first.
    pub fn solution(&self) -> &Route {
        &self.solution
    }

    pub fn stats(&self) -> &SearchStats {
        self.search.stats()
    }

    /// Build the reach footprint from `origin`.
    ///
    /// With reach off, or `do_solve` false, only the terrain base under the
    /// origin is recorded.
    pub fn solve_reach(
        &mut self,
        origin: &AGeoPoint,
        config: &RoutePlannerConfig,
        terrain: Option<&dyn TerrainMap>,
        do_solve: bool,
    ) -> Result<bool> {
        let mc = match config.reach_polar_mode {
            ReachPolar::Task => self.settings.mc,
            ReachPolar::Safety => self.settings.safety_mc,
        };
        self.rpolars_reach = RoutePolars::new(&self.polar, &self.settings, mc);
        let altitude = origin.altitude_m.round() as i32;
        self.rpolars_reach.set_config(config, altitude, altitude, None);

        let do_solve = do_solve && config.reach_calc_mode != ReachMode::Off;
        let turning = config.reach_calc_mode == ReachMode::Turning;
        self.reach.solve(
            origin,
            &self.rpolars_reach,
            terrain,
            &config.reach,
            do_solve,
            turning,
        )
    }

    /// Arrival altitudes at `destination` from the last reach solve.
    pub fn find_positive_arrival(&self, destination: &AGeoPoint) -> Result<ReachResult> {
        self.reach.find_positive_arrival(destination, &self.rpolars_reach)
    }

    pub fn is_inside(&self, point: &GeoPoint, turning: bool) -> bool {
        self.reach.is_inside(point, turning)
    }

    pub fn reach_polygons(&self, turning: bool) -> Vec<Vec<GeoPoint>> {
        self.reach.polygons(turning)
    }

    pub fn reach_fans(&self) -> &[FlatTriangleFan] {
        self.reach.fans()
    }

    /// Lowest terrain under the reach footprint.
    pub fn terrain_base(&self) -> Option<i32> {
        self.reach.terrain_base()
    }

    /// First point where a straight glide from `origin` toward
    /// `destination` meets terrain plus the safety height.
    ///
    /// `None` when the glide is clear or cannot be flown in that direction.
    pub fn intersection(
        &self,
        origin: &AGeoPoint,
        destination: &GeoPoint,
        config: &RoutePlannerConfig,
        terrain: &dyn TerrainMap,
    ) -> Result<Option<GeoPoint>> {
        origin.validate()?;
        destination.validate()?;
        let projection = FlatProjection::for_pair(&origin.location, destination)?;
        let from = projection.project(&origin.location);
        let to = projection.project(destination);
        let Some(loss) = self.rpolars_route.glide_loss_between(from, to) else {
            return Ok(None);
        };
        let h_origin = origin.altitude_m.round() as i32;
        let hit = terrain.first_intersection(
            &origin.location,
            h_origin,
            destination,
            h_origin.saturating_sub(loss),
            config.safety_height_terrain.max(0),
            config.tuning.terrain_scan_step_m,
        );
        Ok(hit.map(|hit| hit.location))
    }
}
