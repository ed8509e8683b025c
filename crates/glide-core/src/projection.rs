//! Local flat projection used by the search.
//!
//! All geometric tests run on integer meter coordinates relative to a
//! projection center. The transform is equirectangular with WGS84 scaling at
//! the center latitude, which is accurate enough over the few hundred
//! kilometres a glide search covers.

use crate::error::{Result, RouteError};
use crate::geo::{meters_per_deg_lat, meters_per_deg_lon, normalize_lon, GeoPoint};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Projections closer to the poles than this are rejected.
pub const MAX_PROJECTION_LAT: f64 = 85.0;

/// Endpoints further apart than this do not fit one flat search region.
pub const MAX_REGION_DISTANCE_M: f64 = 1_500_000.0;

/// Integer position in meters: x east, y north.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct FlatGeoPoint {
    pub x: i32,
    pub y: i32,
}

impl FlatGeoPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(&self, other: &FlatGeoPoint) -> i64 {
        (self.x as i64 - other.x as i64).abs() + (self.y as i64 - other.y as i64).abs()
    }

    pub fn distance(&self, other: &FlatGeoPoint) -> f64 {
        (*other - *self).magnitude()
    }

    pub fn magnitude_squared(&self) -> i64 {
        let x = self.x as i64;
        let y = self.y as i64;
        x * x + y * y
    }

    pub fn magnitude(&self) -> f64 {
        (self.magnitude_squared() as f64).sqrt()
    }

    pub fn dot(&self, other: &FlatGeoPoint) -> i64 {
        self.x as i64 * other.x as i64 + self.y as i64 * other.y as i64
    }

    /// z component of the 2D cross product; positive when `other` is to the left.
    pub fn cross(&self, other: &FlatGeoPoint) -> i64 {
        self.x as i64 * other.y as i64 - self.y as i64 * other.x as i64
    }

    pub fn to_f64(self) -> (f64, f64) {
        (self.x as f64, self.y as f64)
    }

    pub fn from_f64(x: f64, y: f64) -> Self {
        Self {
            x: x.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32,
            y: y.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32,
        }
    }
}

impl Add for FlatGeoPoint {
    type Output = FlatGeoPoint;

    fn add(self, rhs: FlatGeoPoint) -> FlatGeoPoint {
        FlatGeoPoint::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

impl Sub for FlatGeoPoint {
    type Output = FlatGeoPoint;

    fn sub(self, rhs: FlatGeoPoint) -> FlatGeoPoint {
        FlatGeoPoint::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

impl Mul<f64> for FlatGeoPoint {
    type Output = FlatGeoPoint;

    fn mul(self, rhs: f64) -> FlatGeoPoint {
        FlatGeoPoint::from_f64(self.x as f64 * rhs, self.y as f64 * rhs)
    }
}

/// Axis-aligned rectangle in flat coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatBoundingBox {
    pub min: FlatGeoPoint,
    pub max: FlatGeoPoint,
}

impl FlatBoundingBox {
    pub fn around(point: FlatGeoPoint) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a FlatGeoPoint>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::around(*first);
        for point in iter {
            bounds.extend(*point);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, point: FlatGeoPoint) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    pub fn expanded(&self, margin: i32) -> Self {
        Self {
            min: self.min - FlatGeoPoint::new(margin, margin),
            max: self.max + FlatGeoPoint::new(margin, margin),
        }
    }

    pub fn contains(&self, point: &FlatGeoPoint) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn overlaps(&self, other: &FlatBoundingBox) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

/// Equirectangular transform around a fixed center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatProjection {
    center: GeoPoint,
    meters_per_lat: f64,
    meters_per_lon: f64,
}

impl FlatProjection {
    pub fn new(center: GeoPoint) -> Result<Self> {
        center.validate()?;
        if center.lat.abs() > MAX_PROJECTION_LAT {
            return Err(RouteError::DegenerateProjection { lat: center.lat });
        }
        Ok(Self {
            center,
            meters_per_lat: meters_per_deg_lat(center.lat),
            meters_per_lon: meters_per_deg_lon(center.lat),
        })
    }

    /// Projection centred between two endpoints of a search.
    pub fn for_pair(a: &GeoPoint, b: &GeoPoint) -> Result<Self> {
        a.validate()?;
        b.validate()?;
        let distance_m = a.distance(b);
        if distance_m > MAX_REGION_DISTANCE_M {
            return Err(RouteError::RegionTooLarge { distance_m });
        }
        Self::new(a.midpoint(b))
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn project_f(&self, point: &GeoPoint) -> (f64, f64) {
        let x = normalize_lon(point.lon - self.center.lon) * self.meters_per_lon;
        let y = (point.lat - self.center.lat) * self.meters_per_lat;
        (x, y)
    }

    pub fn project(&self, point: &GeoPoint) -> FlatGeoPoint {
        let (x, y) = self.project_f(point);
        FlatGeoPoint::from_f64(x, y)
    }

    pub fn unproject_f(&self, x: f64, y: f64) -> GeoPoint {
        GeoPoint {
            lat: self.center.lat + y / self.meters_per_lat,
            lon: normalize_lon(self.center.lon + x / self.meters_per_lon),
        }
    }

    pub fn unproject(&self, point: &FlatGeoPoint) -> GeoPoint {
        self.unproject_f(point.x as f64, point.y as f64)
    }
}
