//! Points, links and the solved route.

use crate::geo::{AGeoPoint, GeoPoint};
use crate::projection::{FlatGeoPoint, FlatProjection};
use crate::route::polars::RoutePolars;
use serde::{Deserialize, Serialize};

/// Flat position plus altitude in meters.
///
/// Ordered by x, then y, then altitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoutePoint {
    pub location: FlatGeoPoint,
    pub altitude: i32,
}

impl RoutePoint {
    pub const fn new(location: FlatGeoPoint, altitude: i32) -> Self {
        Self { location, altitude }
    }

    pub fn x(&self) -> i32 {
        self.location.x
    }

    pub fn y(&self) -> i32 {
        self.location.y
    }
}

/// Directed pair in search order: `first` is the destination side,
/// `second` the origin side. Flight goes from `second` to `first`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteLinkBase {
    pub first: RoutePoint,
    pub second: RoutePoint,
}

impl RouteLinkBase {
    pub const fn new(first: RoutePoint, second: RoutePoint) -> Self {
        Self { first, second }
    }

    /// Flight direction vector, origin side to destination side.
    pub fn flight_vector(&self) -> FlatGeoPoint {
        self.first.location - self.second.location
    }

    pub fn is_short(&self, min_manhattan: i32) -> bool {
        self.first.location.manhattan(&self.second.location) < min_manhattan as i64
    }

    pub fn is_self_referential(&self) -> bool {
        self.first.location == self.second.location
    }
}

/// A link with its cached 2D geometry and polar direction bin.
///
/// The cache is filled once in `new`; geometry changes mean a new link.
#[derive(Debug, Clone, Copy)]
pub struct RouteLink {
    base: RouteLinkBase,
    distance: f64,
    inv_distance: f64,
    polar_index: usize,
}

impl RouteLink {
    pub fn new(first: RoutePoint, second: RoutePoint, polars: &RoutePolars) -> Self {
        let base = RouteLinkBase::new(first, second);
        let vector = base.flight_vector();
        let distance = vector.magnitude();
        let inv_distance = if distance > 0.0 { 1.0 / distance } else { 0.0 };
        Self {
            base,
            distance,
            inv_distance,
            polar_index: polars.index(vector.x as f64, vector.y as f64),
        }
    }

    pub fn base(&self) -> &RouteLinkBase {
        &self.base
    }

    pub fn first(&self) -> &RoutePoint {
        &self.base.first
    }

    pub fn second(&self) -> &RoutePoint {
        &self.base.second
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn inv_distance(&self) -> f64 {
        self.inv_distance
    }

    pub fn polar_index(&self) -> usize {
        self.polar_index
    }

    /// Point `t` of the way along the flight, origin side = 0.
    pub fn point_at(&self, t: f64) -> (f64, f64) {
        let (ax, ay) = self.base.second.location.to_f64();
        let (bx, by) = self.base.first.location.to_f64();
        (ax + (bx - ax) * t, ay + (by - ay) * t)
    }
}

/// Solved flight path, origin first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    points: Vec<AGeoPoint>,
}

impl Route {
    pub fn direct(origin: AGeoPoint, destination: AGeoPoint) -> Self {
        Self {
            points: vec![origin, destination],
        }
    }

    pub(crate) fn from_route_points(
        points: &[RoutePoint],
        projection: &FlatProjection,
        origin: AGeoPoint,
        destination: AGeoPoint,
    ) -> Self {
        let last = points.len().saturating_sub(1);
        let points = points
            .iter()
            .enumerate()
            .map(|(i, p)| match i {
                0 => origin,
                i if i == last => destination,
                _ => AGeoPoint::new(projection.unproject(&p.location), p.altitude as f64),
            })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[AGeoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_direct(&self) -> bool {
        self.points.len() <= 2
    }

    pub fn locations(&self) -> impl Iterator<Item = GeoPoint> + '_ {
        self.points.iter().map(|p| p.location)
    }

    /// Total ground distance in meters.
    pub fn distance_m(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].location.distance(&w[1].location))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polar::{GlidePolar, GlideSettings};

    fn rp(x: i32, y: i32, alt: i32) -> RoutePoint {
        RoutePoint::new(FlatGeoPoint::new(x, y), alt)
    }

    #[test]
    fn route_points_order_lexicographically() {
        assert!(rp(0, 5, 9) < rp(1, 0, 0));
        assert!(rp(1, 0, 0) < rp(1, 1, 0));
        assert!(rp(1, 1, 0) < rp(1, 1, 1));
        let a = RouteLinkBase::new(rp(0, 0, 0), rp(5, 5, 5));
        let b = RouteLinkBase::new(rp(0, 0, 0), rp(5, 5, 6));
        assert!(a < b);
    }

    #[test]
    fn link_caches_geometry() {
        let polars = RoutePolars::new(&GlidePolar::default(), &GlideSettings::default(), 1.0);
        let link = RouteLink::new(rp(3_000, 4_000, 500), rp(0, 0, 1_000), &polars);
        assert!((link.distance() - 5_000.0).abs() < 1e-9);
        assert!((link.inv_distance() * 5_000.0 - 1.0).abs() < 1e-12);
        assert_eq!(link.polar_index(), polars.index(3_000.0, 4_000.0));
        assert_eq!(link.point_at(1.0), (3_000.0, 4_000.0));
    }

    #[test]
    fn short_links_by_manhattan() {
        let base = RouteLinkBase::new(rp(0, 0, 0), rp(30, 30, 0));
        assert!(base.is_short(100));
        assert!(!base.is_short(60));
        assert!(RouteLinkBase::new(rp(1, 1, 0), rp(1, 1, 50)).is_self_referential());
    }
}
