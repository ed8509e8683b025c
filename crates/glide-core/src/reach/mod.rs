//! Glide reach footprint.
//!
//! The root fan holds every point reachable by a straight glide that stays
//! above terrain. In turning mode, child fans start beside terrain shadows
//! so the footprint also covers ground reachable by flying around a ridge.

mod fan;

pub use fan::FlatTriangleFan;

use crate::config::ReachTuning;
use crate::error::{Result, RouteError};
use crate::geo::{AGeoPoint, GeoPoint};
use crate::projection::{FlatGeoPoint, FlatProjection};
use crate::route::polars::RoutePolars;
use crate::terrain::TerrainMap;
use fan::FanBuilder;
use serde::Serialize;

/// Arrival altitudes at a destination, `None` where it is out of reach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReachResult {
    /// Straight glide from the origin, ignoring terrain
    pub direct: Option<i32>,
    /// Best arrival through the terrain-limited fans, never above `direct`
    pub terrain: Option<i32>,
}

impl ReachResult {
    pub fn is_reachable(&self) -> bool {
        self.terrain.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReachFan {
    projection: Option<FlatProjection>,
    fans: Vec<FlatTriangleFan>,
    terrain_base: Option<i32>,
}

impl ReachFan {
    pub fn reset(&mut self) {
        self.projection = None;
        self.fans.clear();
        self.terrain_base = None;
    }

    pub fn is_solved(&self) -> bool {
        self.projection.is_some()
    }

    /// Rebuild the footprint for `origin`.
    ///
    /// With `do_solve` false only a point placeholder is stored, which still
    /// records the terrain height under the origin. Returns true when a real
    /// footprint was built.
    pub fn solve(
        &mut self,
        origin: &AGeoPoint,
        polars: &RoutePolars,
        terrain: Option<&dyn TerrainMap>,
        tuning: &ReachTuning,
        do_solve: bool,
        turning: bool,
    ) -> Result<bool> {
        origin.validate()?;
        self.reset();
        let projection = FlatProjection::new(origin.location)?;
        let height = origin.altitude_m.round() as i32;
        let local = terrain.and_then(|t| t.height(&origin.location));
        let root = FlatGeoPoint::default();
        self.projection = Some(projection);

        let floor = local.unwrap_or(0).saturating_add(polars.safety_height());
        if !do_solve || height <= floor {
            if do_solve {
                tracing::debug!("Reach origin at {} m is below the glide floor {} m", height, floor);
            }
            self.terrain_base = local;
            self.fans.push(FlatTriangleFan::point(root, height, local));
            return Ok(false);
        }

        let mut builder = FanBuilder {
            projection: &projection,
            polars,
            terrain,
            tuning,
            floor,
            lowest_terrain: local,
        };
        self.fans = builder.build_tree(root, height, turning);
        self.terrain_base = builder.lowest_terrain;
        tracing::debug!(
            "Reach solved with {} fans, terrain base {:?}",
            self.fans.len(),
            self.terrain_base
        );
        Ok(true)
    }

    pub fn fans(&self) -> &[FlatTriangleFan] {
        &self.fans
    }

    pub fn fan_count(&self) -> usize {
        self.fans.len()
    }

    /// Lowest terrain seen under the footprint.
    pub fn terrain_base(&self) -> Option<i32> {
        self.terrain_base
    }

    /// Whether `point` lies in the straight-glide footprint, or anywhere in
    /// the fan tree when `turning`.
    pub fn is_inside(&self, point: &GeoPoint, turning: bool) -> bool {
        let Some(projection) = self.projection else {
            return false;
        };
        let p = projection.project(point);
        if turning {
            self.fans.iter().any(|fan| fan.contains(&p))
        } else {
            self.fans.first().is_some_and(|fan| fan.contains(&p))
        }
    }

    pub fn find_positive_arrival(&self, destination: &AGeoPoint, polars: &RoutePolars) -> Result<ReachResult> {
        let (Some(projection), Some(root)) = (self.projection, self.fans.first()) else {
            return Err(RouteError::ReachNotSolved);
        };
        destination.validate()?;
        let p = projection.project(&destination.location);
        let required = destination.altitude_m.round() as i32;

        let arrival = |fan: &FlatTriangleFan| -> Option<i32> {
            let loss = polars.glide_loss_between(fan.origin(), p)?;
            Some(fan.height() - loss)
        };

        let direct = arrival(root).filter(|h| *h >= required);
        let terrain = self
            .fans
            .iter()
            .filter(|fan| fan.contains(&p))
            .filter_map(arrival)
            .max()
            .and_then(|h| direct.map(|d| h.min(d)))
            .filter(|h| *h >= required);
        Ok(ReachResult { direct, terrain })
    }

    /// Footprint outlines in geographic coordinates.
    pub fn polygons(&self, turning: bool) -> Vec<Vec<GeoPoint>> {
        let Some(projection) = self.projection else {
            return Vec::new();
        };
        let take = if turning { self.fans.len() } else { 1 };
        self.fans
            .iter()
            .take(take)
            .filter(|fan| !fan.is_point())
            .map(|fan| fan.vertices().iter().map(|v| projection.unproject(v)).collect())
            .collect()
    }
}
