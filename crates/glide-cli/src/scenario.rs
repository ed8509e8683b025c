//! Scenario files: endpoints, aircraft, terrain and airspace in one JSON
//! document.

use anyhow::{Context, Result};
use glide_core::airspace::STANDARD_QNH_HPA;
use glide_core::{
    AGeoPoint, Airspace, Airspaces, GeoBounds, GeoPoint, GlidePolar, GlideSettings,
    RoutePlanner, RoutePlannerConfig, TerrainGrid,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Polar given as three `[speed, sink]` samples in m/s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolarSpec {
    pub samples: [[f64; 2]; 3],
    pub v_min: f64,
    pub v_max: f64,
}

impl PolarSpec {
    pub fn build(&self) -> Result<GlidePolar> {
        let [a, b, c] = self.samples;
        let polar = GlidePolar::from_points([(a[0], a[1]), (b[0], b[1]), (c[0], c[1])], self.v_min, self.v_max)?;
        Ok(polar)
    }
}

/// Gaussian hill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hill {
    pub center: GeoPoint,
    pub height_m: f64,
    pub radius_m: f64,
}

impl Hill {
    pub fn elevation_at(&self, point: &GeoPoint) -> f64 {
        let d = point.distance(&self.center) / self.radius_m.max(1.0);
        self.height_m * (-d * d).exp()
    }
}

fn default_margin_m() -> f64 {
    20_000.0
}

fn default_spacing_m() -> f64 {
    100.0
}

fn default_qnh() -> f64 {
    STANDARD_QNH_HPA
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerrainSpec {
    #[default]
    None,
    Flat {
        elevation_m: f64,
        #[serde(default = "default_margin_m")]
        margin_m: f64,
    },
    Hills {
        #[serde(default)]
        base_m: f64,
        hills: Vec<Hill>,
        #[serde(default = "default_margin_m")]
        margin_m: f64,
        #[serde(default = "default_spacing_m")]
        spacing_m: f64,
    },
    Grid {
        bounds: GeoBounds,
        rows: usize,
        cols: usize,
        elevations_m: Vec<f64>,
    },
}

impl TerrainSpec {
    /// Build a grid covering both endpoints plus the margin.
    pub fn build(&self, origin: &GeoPoint, destination: &GeoPoint) -> Result<Option<TerrainGrid>> {
        let around = |margin_m: f64| -> Result<GeoBounds> {
            let bounds = GeoBounds::from_points([origin, destination])
                .context("no endpoints to bound the terrain")?;
            Ok(bounds.expand_m(margin_m))
        };
        let grid = match self {
            TerrainSpec::None => return Ok(None),
            TerrainSpec::Flat {
                elevation_m,
                margin_m,
            } => TerrainGrid::flat(around(*margin_m)?, *elevation_m),
            TerrainSpec::Hills {
                base_m,
                hills,
                margin_m,
                spacing_m,
            } => TerrainGrid::from_fn(around(*margin_m)?, *spacing_m, |p| {
                base_m + hills.iter().map(|h| h.elevation_at(p)).sum::<f64>()
            }),
            TerrainSpec::Grid {
                bounds,
                rows,
                cols,
                elevations_m,
            } => TerrainGrid::new(*bounds, *rows, *cols, elevations_m.clone())
                .context("terrain grid does not match its dimensions")?,
        };
        Ok(Some(grid))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    pub origin: AGeoPoint,
    pub destination: AGeoPoint,
    #[serde(default)]
    pub config: RoutePlannerConfig,
    /// Altitude ceiling in meters, honoured when `config.use_ceiling` is set
    #[serde(default)]
    pub ceiling_m: Option<i32>,
    #[serde(default)]
    pub polar: Option<PolarSpec>,
    #[serde(default)]
    pub settings: GlideSettings,
    #[serde(default)]
    pub terrain: TerrainSpec,
    #[serde(default)]
    pub airspaces: Vec<Airspace>,
    #[serde(default = "default_qnh")]
    pub qnh_hpa: f64,
}

impl Scenario {
    pub fn new(origin: AGeoPoint, destination: AGeoPoint) -> Self {
        Self {
            name: String::new(),
            origin,
            destination,
            config: RoutePlannerConfig::default(),
            ceiling_m: None,
            polar: None,
            settings: GlideSettings::default(),
            terrain: TerrainSpec::None,
            airspaces: Vec::new(),
            qnh_hpa: STANDARD_QNH_HPA,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("failed to parse scenario {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn with_airspace(mut self, airspace: Airspace) -> Self {
        self.airspaces.push(airspace);
        self
    }

    pub fn with_terrain(mut self, terrain: TerrainSpec) -> Self {
        self.terrain = terrain;
        self
    }

    pub fn glide_polar(&self) -> Result<GlidePolar> {
        match &self.polar {
            Some(spec) => spec.build(),
            None => Ok(GlidePolar::default()),
        }
    }

    pub fn planner(&self) -> Result<RoutePlanner> {
        Ok(RoutePlanner::new(self.glide_polar()?, self.settings)?)
    }

    pub fn airspace_set(&self) -> Result<Airspaces> {
        let mut airspaces = Airspaces::new();
        airspaces.set_qnh(self.qnh_hpa);
        for airspace in &self.airspaces {
            airspaces
                .add(airspace.clone())
                .with_context(|| format!("scenario '{}'", self.name))?;
        }
        Ok(airspaces)
    }

    pub fn terrain_grid(&self) -> Result<Option<TerrainGrid>> {
        self.terrain
            .build(&self.origin.location, &self.destination.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_scenario_uses_defaults() {
        let scenario = Scenario::from_json(
            r#"{
                "origin": {"lat": 46.0, "lon": 7.9, "altitude_m": 1500},
                "destination": {"lat": 46.0, "lon": 8.1, "altitude_m": 500}
            }"#,
        )
        .expect("parse");
        assert_eq!(scenario.config, RoutePlannerConfig::default());
        assert_eq!(scenario.terrain, TerrainSpec::None);
        assert!(scenario.terrain_grid().expect("terrain").is_none());
        assert_eq!(scenario.glide_polar().expect("polar"), GlidePolar::default());
    }

    #[test]
    fn hills_raise_terrain_near_their_center() {
        let origin = AGeoPoint::new(GeoPoint::new(46.0, 7.9), 1_500.0);
        let destination = AGeoPoint::new(GeoPoint::new(46.0, 8.1), 500.0);
        let hill = Hill {
            center: GeoPoint::new(46.0, 8.0),
            height_m: 900.0,
            radius_m: 1_000.0,
        };
        let scenario = Scenario::new(origin, destination).with_terrain(TerrainSpec::Hills {
            base_m: 100.0,
            hills: vec![hill.clone()],
            margin_m: 5_000.0,
            spacing_m: 200.0,
        });
        let grid = scenario.terrain_grid().expect("build").expect("grid");
        let peak = grid.sample(&hill.center).expect("inside");
        assert!(peak > 900.0, "peak {}", peak);
        let edge = grid.sample(&origin.location).expect("inside");
        assert!((edge - 100.0).abs() < 1.0);
    }

    #[test]
    fn bad_polar_is_reported() {
        let spec = PolarSpec {
            samples: [[20.0, 0.5], [30.0, 1.5], [40.0, 1.8]],
            v_min: 20.0,
            v_max: 40.0,
        };
        assert!(spec.build().is_err());
    }
}
