//! Terrain elevation lookups.
//!
//! The planner only needs point heights and a straight-line intersection
//! scan. Missing data is never an obstacle: `height` returning `None` lets
//! the search carry on with whatever other sources it has.

use crate::error::{Result, RouteError};
use crate::generation;
use crate::geo::{meters_per_deg_lat, meters_per_deg_lon, GeoBounds, GeoPoint};

/// Largest grid `TerrainGrid::from_fn` will allocate.
const MAX_GENERATED_SAMPLES: usize = 4_000_000;

/// First point along a scan where terrain plus safety reaches the glide line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainIntersection {
    pub location: GeoPoint,
    /// Altitude of the glide line at `location`.
    pub altitude: i32,
    pub terrain_height: i32,
}

/// Elevation source consumed by the planner.
pub trait TerrainMap {
    /// Ground elevation in meters MSL, `None` where there is no data.
    fn height(&self, point: &GeoPoint) -> Option<i32>;

    /// Changes whenever the underlying data changes. Distinct data sets
    /// should never report the same value; the default suits data that is
    /// fixed for the life of the process.
    fn revision(&self) -> u64 {
        0
    }

    /// Scan the straight ground line from `origin` to `destination`.
    ///
    /// The altitude profile is linear from `h_origin` to `h_destination`,
    /// evaluated in integer steps so that equal inputs give equal answers.
    /// Only interior samples are tested; the endpoints belong to the caller.
    fn first_intersection(
        &self,
        origin: &GeoPoint,
        h_origin: i32,
        destination: &GeoPoint,
        h_destination: i32,
        safety: i32,
        step_m: f64,
    ) -> Option<TerrainIntersection> {
        let distance = origin.distance(destination);
        let steps = ((distance / step_m.max(1.0)).ceil() as i64).max(2);
        let dh = h_destination as i64 - h_origin as i64;

        for k in 1..steps {
            let location = origin.lerp(destination, k as f64 / steps as f64);
            let Some(ground) = self.height(&location) else {
                continue;
            };
            let altitude = h_origin as i64 + dh * k / steps;
            if ground as i64 + safety as i64 > altitude {
                return Some(TerrainIntersection {
                    location,
                    altitude: altitude as i32,
                    terrain_height: ground,
                });
            }
        }
        None
    }
}

impl<T: TerrainMap + ?Sized> TerrainMap for &T {
    fn height(&self, point: &GeoPoint) -> Option<i32> {
        (**self).height(point)
    }

    fn revision(&self) -> u64 {
        (**self).revision()
    }
}

/// Regular lat/lon elevation raster with bilinear sampling.
#[derive(Debug, Clone)]
pub struct TerrainGrid {
    bounds: GeoBounds,
    lat_step_deg: f64,
    lon_step_deg: f64,
    rows: usize,
    cols: usize,
    elevations_m: Vec<f64>,
    revision: u64,
}

impl TerrainGrid {
    /// Row-major elevations, row 0 at `bounds.min_lat`.
    pub fn new(bounds: GeoBounds, rows: usize, cols: usize, elevations_m: Vec<f64>) -> Result<Self> {
        let expected = rows.saturating_mul(cols);
        if rows < 2 || cols < 2 || elevations_m.len() != expected {
            return Err(RouteError::TerrainGridSize {
                expected: expected.max(4),
                actual: elevations_m.len(),
            });
        }
        Ok(Self {
            bounds,
            lat_step_deg: (bounds.max_lat - bounds.min_lat) / (rows - 1) as f64,
            lon_step_deg: (bounds.max_lon - bounds.min_lon) / (cols - 1) as f64,
            rows,
            cols,
            elevations_m,
            revision: generation::next(),
        })
    }

    pub fn flat(bounds: GeoBounds, elevation_m: f64) -> Self {
        Self {
            bounds,
            lat_step_deg: bounds.max_lat - bounds.min_lat,
            lon_step_deg: bounds.max_lon - bounds.min_lon,
            rows: 2,
            cols: 2,
            elevations_m: vec![elevation_m; 4],
            revision: generation::next(),
        }
    }

    /// Sample `elevation` on a grid with roughly `spacing_m` between posts.
    pub fn from_fn<F>(bounds: GeoBounds, spacing_m: f64, elevation: F) -> Self
    where
        F: Fn(&GeoPoint) -> f64,
    {
        let (rows, cols) = resolve_grid_dims(&bounds, spacing_m, MAX_GENERATED_SAMPLES);
        let lat_step_deg = (bounds.max_lat - bounds.min_lat) / (rows - 1) as f64;
        let lon_step_deg = (bounds.max_lon - bounds.min_lon) / (cols - 1) as f64;

        let mut elevations_m = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let point = GeoPoint::new(
                    bounds.min_lat + row as f64 * lat_step_deg,
                    bounds.min_lon + col as f64 * lon_step_deg,
                );
                elevations_m.push(elevation(&point));
            }
        }

        Self {
            bounds,
            lat_step_deg,
            lon_step_deg,
            rows,
            cols,
            elevations_m,
            revision: generation::next(),
        }
    }

    pub fn bounds(&self) -> GeoBounds {
        self.bounds
    }

    /// Bilinear elevation, `None` outside the grid.
    pub fn sample(&self, point: &GeoPoint) -> Option<f64> {
        if !point.is_valid() || !self.bounds.contains(point) {
            return None;
        }

        let lat_step = self.lat_step_deg.max(1e-12);
        let lon_step = self.lon_step_deg.max(1e-12);
        let max_y = (self.rows - 1) as f64;
        let max_x = (self.cols - 1) as f64;
        let y = ((point.lat - self.bounds.min_lat) / lat_step).clamp(0.0, max_y);
        let x = ((point.lon - self.bounds.min_lon) / lon_step).clamp(0.0, max_x);

        let y0 = y.floor() as usize;
        let x0 = x.floor() as usize;
        let y1 = (y0 + 1).min(self.rows - 1);
        let x1 = (x0 + 1).min(self.cols - 1);
        let dy = y - y0 as f64;
        let dx = x - x0 as f64;

        let v00 = self.value_at(y0, x0);
        let v10 = self.value_at(y0, x1);
        let v01 = self.value_at(y1, x0);
        let v11 = self.value_at(y1, x1);

        let v0 = v00 + (v10 - v00) * dx;
        let v1 = v01 + (v11 - v01) * dx;
        Some(v0 + (v1 - v0) * dy)
    }

    fn value_at(&self, row: usize, col: usize) -> f64 {
        let idx = row.saturating_mul(self.cols) + col.min(self.cols - 1);
        self.elevations_m.get(idx).copied().unwrap_or(0.0)
    }
}

impl TerrainMap for TerrainGrid {
    fn height(&self, point: &GeoPoint) -> Option<i32> {
        self.sample(point).map(|h| h.round() as i32)
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

fn resolve_grid_dims(bounds: &GeoBounds, spacing_m: f64, max_points: usize) -> (usize, usize) {
    let mid_lat = (bounds.min_lat + bounds.max_lat) / 2.0;
    let meters_lat = meters_per_deg_lat(mid_lat);
    let meters_lon = meters_per_deg_lon(mid_lat).max(1.0);
    let mut spacing = spacing_m.max(5.0);

    loop {
        let rows = (((bounds.max_lat - bounds.min_lat) * meters_lat / spacing).ceil().max(1.0)
            as usize)
            + 1;
        let cols = (((bounds.max_lon - bounds.min_lon) * meters_lon / spacing).ceil().max(1.0)
            as usize)
            + 1;
        let total = rows.saturating_mul(cols);
        if total <= max_points {
            return (rows, cols);
        }
        let scale = ((total as f64) / (max_points as f64)).sqrt().max(1.1);
        spacing *= scale;
    }
}
