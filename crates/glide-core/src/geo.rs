//! Geodetic primitives: points, bounds and great-circle helpers.

use crate::error::{Result, RouteError};
use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Altitude range accepted at the planner boundary (meters MSL).
pub const MIN_ALTITUDE_M: f64 = -1_000.0;
pub const MAX_ALTITUDE_M: f64 = 30_000.0;

/// A position on the earth in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && self.lat.abs() <= 90.0
            && self.lon.abs() <= 180.0
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(RouteError::InvalidCoordinate {
                lat: self.lat,
                lon: self.lon,
            })
        }
    }

    /// Great-circle distance in meters (haversine).
    pub fn distance(&self, other: &GeoPoint) -> f64 {
        haversine_distance(self.lat, self.lon, other.lat, other.lon)
    }

    /// Initial bearing towards `other` in degrees, 0 = north, clockwise.
    pub fn bearing(&self, other: &GeoPoint) -> f64 {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let delta_lambda = (other.lon - self.lon).to_radians();

        let x = delta_lambda.sin() * phi2.cos();
        let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

        x.atan2(y).to_degrees().rem_euclid(360.0)
    }

    /// Move `distance_m` along `bearing_deg`.
    pub fn offset(&self, distance_m: f64, bearing_deg: f64) -> GeoPoint {
        let (lat, lon) =
            offset_by_bearing(self.lat, self.lon, distance_m, bearing_deg.to_radians());
        GeoPoint { lat, lon }
    }

    /// Linear interpolation in degrees; fine for the short legs of a scan.
    pub fn lerp(&self, other: &GeoPoint, t: f64) -> GeoPoint {
        let dlon = normalize_lon(other.lon - self.lon);
        GeoPoint {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: normalize_lon(self.lon + dlon * t),
        }
    }

    pub fn midpoint(&self, other: &GeoPoint) -> GeoPoint {
        self.interpolate(other, 0.5)
    }

    /// Point at fraction `t` of the way to `other` along the great circle.
    pub fn interpolate(&self, other: &GeoPoint, t: f64) -> GeoPoint {
        let distance = self.distance(other);
        if distance <= f64::EPSILON {
            return *self;
        }
        self.offset(distance * t, self.bearing(other))
    }
}

/// A position with altitude in meters above mean sea level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AGeoPoint {
    #[serde(flatten)]
    pub location: GeoPoint,
    pub altitude_m: f64,
}

impl AGeoPoint {
    pub const fn new(location: GeoPoint, altitude_m: f64) -> Self {
        Self {
            location,
            altitude_m,
        }
    }

    /// Rejects NaN coordinates and altitudes outside the accepted range.
    pub fn validate(&self) -> Result<()> {
        self.location.validate()?;
        if !self.altitude_m.is_finite()
            || self.altitude_m < MIN_ALTITUDE_M
            || self.altitude_m > MAX_ALTITUDE_M
        {
            return Err(RouteError::InvalidAltitude(self.altitude_m));
        }
        Ok(())
    }
}

/// Axis-aligned latitude/longitude rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    pub fn from_points<'a, I>(points: I) -> Option<GeoBounds>
    where
        I: IntoIterator<Item = &'a GeoPoint>,
    {
        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut min_lon = f64::INFINITY;
        let mut max_lon = f64::NEG_INFINITY;
        for point in points {
            if !point.is_valid() {
                continue;
            }
            min_lat = min_lat.min(point.lat);
            max_lat = max_lat.max(point.lat);
            min_lon = min_lon.min(point.lon);
            max_lon = max_lon.max(point.lon);
        }
        if !min_lat.is_finite() || !min_lon.is_finite() {
            return None;
        }
        Some(GeoBounds {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        })
    }

    /// Grow the rectangle by `margin_m` on every side.
    pub fn expand_m(&self, margin_m: f64) -> GeoBounds {
        let mid_lat = (self.min_lat + self.max_lat) / 2.0;
        // Longitude degrees shrink poleward; pad with the widest edge.
        let widest_lat = self.min_lat.abs().max(self.max_lat.abs()).min(89.0);
        let pad_lat = meters_to_lat(margin_m, mid_lat);
        let pad_lon = meters_to_lon(margin_m, widest_lat);
        GeoBounds {
            min_lat: (self.min_lat - pad_lat).max(-90.0),
            min_lon: self.min_lon - pad_lon,
            max_lat: (self.max_lat + pad_lat).min(90.0),
            max_lon: self.max_lon + pad_lon,
        }
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lon >= self.min_lon
            && point.lon <= self.max_lon
    }

    pub fn intersects(&self, other: &GeoBounds) -> bool {
        self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
            && self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
    }
}

/// Great-circle distance between two points in meters.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Meters per degree of latitude at a given latitude (WGS84 series).
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude (WGS84 series).
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

pub fn meters_to_lat(meters: f64, ref_lat_deg: f64) -> f64 {
    meters / meters_per_deg_lat(ref_lat_deg).max(1e-9)
}

pub fn meters_to_lon(meters: f64, ref_lat_deg: f64) -> f64 {
    meters / meters_per_deg_lon(ref_lat_deg).max(1e-9)
}

/// Offset a position by distance and bearing.
///
/// # Arguments
/// * `lat`, `lon` - Starting position in degrees
/// * `distance_m` - Distance in meters
/// * `bearing_rad` - Bearing in radians (0 = north, π/2 = east)
///
/// # Returns
/// (new_lat, new_lon) in degrees
pub fn offset_by_bearing(lat: f64, lon: f64, distance_m: f64, bearing_rad: f64) -> (f64, f64) {
    if distance_m.abs() <= f64::EPSILON {
        return (lat, lon);
    }

    let lat1 = lat.to_radians();
    let lon1 = lon.to_radians();
    let angular_distance = distance_m / EARTH_RADIUS_M;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let lon2 = normalize_lon((lon1 + y.atan2(x)).to_degrees());

    (lat2.to_degrees(), lon2)
}

/// Wrap a longitude into [-180, 180).
pub fn normalize_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}
