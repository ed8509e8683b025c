//! Airspace volumes and the collection the planner queries.

use crate::error::{Result, RouteError};
use crate::generation;
use crate::geo::{GeoBounds, GeoPoint, MIN_ALTITUDE_M};
use serde::{Deserialize, Serialize};

pub const STANDARD_QNH_HPA: f64 = 1013.25;

/// Vertical limit of an airspace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AirspaceAltitude {
    Ground,
    Msl { meters: f64 },
    /// Pressure level in hundreds of feet against 1013.25 hPa.
    FlightLevel { level: u32 },
    Unlimited,
}

impl AirspaceAltitude {
    /// Height in meters MSL for the given QNH.
    pub fn to_msl(&self, qnh_hpa: f64) -> f64 {
        match *self {
            AirspaceAltitude::Ground => MIN_ALTITUDE_M,
            AirspaceAltitude::Msl { meters } => meters,
            AirspaceAltitude::FlightLevel { level } => {
                let pressure_altitude = level as f64 * 100.0 * 0.3048;
                pressure_altitude_to_qnh_altitude(pressure_altitude, qnh_hpa)
            }
            AirspaceAltitude::Unlimited => f64::INFINITY,
        }
    }
}

/// Standard atmosphere: convert a 1013.25 hPa altitude to a QNH altitude.
pub fn pressure_altitude_to_qnh_altitude(pressure_altitude_m: f64, qnh_hpa: f64) -> f64 {
    const K1: f64 = 0.190263;
    const H0: f64 = 44_330.8;
    let ratio = (1.0 - pressure_altitude_m / H0).max(0.0);
    let pressure = STANDARD_QNH_HPA * ratio.powf(1.0 / K1);
    H0 * (1.0 - (pressure / qnh_hpa).powf(K1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AirspaceClass {
    A,
    B,
    C,
    D,
    E,
    Ctr,
    Restricted,
    Prohibited,
    Danger,
    /// Informational only, never avoided.
    Advisory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AirspaceShape {
    Circle { center: GeoPoint, radius_m: f64 },
    Polygon { vertices: Vec<GeoPoint> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airspace {
    pub name: String,
    pub class: AirspaceClass,
    pub shape: AirspaceShape,
    pub floor: AirspaceAltitude,
    pub ceiling: AirspaceAltitude,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Airspace {
    /// Validate airspace configuration.
    /// Returns list of validation errors (empty = valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Name must not be empty".to_string());
        }

        match &self.shape {
            AirspaceShape::Circle { center, radius_m } => {
                if !center.is_valid() {
                    errors.push("Circle center is not a valid coordinate".to_string());
                }
                if !(radius_m.is_finite() && *radius_m > 0.0) {
                    errors.push(format!("Radius must be positive, got {}", radius_m));
                }
            }
            AirspaceShape::Polygon { vertices } => {
                if vertices.iter().any(|v| !v.is_valid()) {
                    errors.push("Polygon has an invalid vertex".to_string());
                }
                if open_ring(vertices).len() < 3 {
                    errors.push("Polygon must have at least 3 vertices".to_string());
                }
            }
        }

        let floor = self.floor.to_msl(STANDARD_QNH_HPA);
        let ceiling = self.ceiling.to_msl(STANDARD_QNH_HPA);
        if floor.is_nan() || ceiling.is_nan() {
            errors.push("Altitude limits must be numbers".to_string());
        } else if floor >= ceiling {
            errors.push(format!(
                "Floor ({:.0} m) must be below ceiling ({:.0} m)",
                floor, ceiling
            ));
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Active airspace the route should avoid.
    pub fn is_obstacle(&self) -> bool {
        self.active && self.class != AirspaceClass::Advisory
    }

    pub fn floor_msl(&self, qnh_hpa: f64) -> f64 {
        self.floor.to_msl(qnh_hpa)
    }

    pub fn ceiling_msl(&self, qnh_hpa: f64) -> f64 {
        self.ceiling.to_msl(qnh_hpa)
    }

    pub fn contains_point(&self, point: &GeoPoint, altitude_m: f64, qnh_hpa: f64) -> bool {
        if altitude_m < self.floor_msl(qnh_hpa) || altitude_m > self.ceiling_msl(qnh_hpa) {
            return false;
        }
        self.contains_horizontal(point)
    }

    pub fn contains_horizontal(&self, point: &GeoPoint) -> bool {
        match &self.shape {
            AirspaceShape::Circle { center, radius_m } => center.distance(point) <= *radius_m,
            AirspaceShape::Polygon { vertices } => {
                // Ray casting: count intersections with polygon edges
                let ring = open_ring(vertices);
                let n = ring.len();
                if n < 3 {
                    return false;
                }
                let mut inside = false;
                let mut j = n - 1;
                for i in 0..n {
                    let (yi, xi) = (ring[i].lat, ring[i].lon);
                    let (yj, xj) = (ring[j].lat, ring[j].lon);
                    if ((yi > point.lat) != (yj > point.lat))
                        && (point.lon < (xj - xi) * (point.lat - yi) / (yj - yi) + xi)
                    {
                        inside = !inside;
                    }
                    j = i;
                }
                inside
            }
        }
    }

    pub fn bounds(&self) -> Option<GeoBounds> {
        match &self.shape {
            AirspaceShape::Circle { center, radius_m } => {
                GeoBounds::from_points([center]).map(|b| b.expand_m(*radius_m))
            }
            AirspaceShape::Polygon { vertices } => GeoBounds::from_points(vertices),
        }
    }

    /// Polygon vertices without a repeated closing point.
    pub fn ring(&self) -> &[GeoPoint] {
        match &self.shape {
            AirspaceShape::Circle { .. } => &[],
            AirspaceShape::Polygon { vertices } => open_ring(vertices),
        }
    }
}

fn open_ring(vertices: &[GeoPoint]) -> &[GeoPoint] {
    match (vertices.first(), vertices.last()) {
        (Some(first), Some(last)) if vertices.len() > 1 && first == last => {
            &vertices[..vertices.len() - 1]
        }
        _ => vertices,
    }
}

/// Airspace database snapshot handed to a solve.
///
/// Construction and every mutation draw a new revision, unique in the
/// process, so the planner can tell whether a previous solution is still
/// valid.
#[derive(Debug, Clone)]
pub struct Airspaces {
    items: Vec<Airspace>,
    qnh_hpa: f64,
    revision: u64,
}

impl Default for Airspaces {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            qnh_hpa: STANDARD_QNH_HPA,
            revision: generation::next(),
        }
    }
}

impl Airspaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validated airspace, returning its index.
    pub fn add(&mut self, airspace: Airspace) -> Result<usize> {
        let reasons = airspace.validate();
        if !reasons.is_empty() {
            return Err(RouteError::InvalidAirspace {
                name: airspace.name,
                reasons,
            });
        }
        self.items.push(airspace);
        self.revision = generation::next();
        Ok(self.items.len() - 1)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.revision = generation::next();
    }

    pub fn set_qnh(&mut self, qnh_hpa: f64) {
        if qnh_hpa.is_finite() && qnh_hpa > 0.0 && qnh_hpa != self.qnh_hpa {
            self.qnh_hpa = qnh_hpa;
            self.revision = generation::next();
        }
    }

    /// Returns false when `index` is out of range.
    pub fn set_active(&mut self, index: usize, active: bool) -> bool {
        match self.items.get_mut(index) {
            Some(item) => {
                if item.active != active {
                    item.active = active;
                    self.revision = generation::next();
                }
                true
            }
            None => false,
        }
    }

    pub fn qnh_hpa(&self) -> f64 {
        self.qnh_hpa
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, index: usize) -> Option<&Airspace> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Airspace> {
        self.items.iter()
    }

    /// Airspaces whose horizontal extent overlaps `bounds`.
    pub fn query_bounds<'a>(
        &'a self,
        bounds: &'a GeoBounds,
    ) -> impl Iterator<Item = (usize, &'a Airspace)> + 'a {
        self.items
            .iter()
            .enumerate()
            .filter(move |(_, a)| a.bounds().is_some_and(|b| b.intersects(bounds)))
    }
}
