//! Error types for the planner.
//!
//! Only precondition violations are errors. A search that finds no avoiding
//! path is a normal outcome and falls back to the direct route.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RouteError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RouteError {
    /// Latitude/longitude is NaN, infinite or out of range.
    #[error("invalid coordinate: lat={lat}, lon={lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("invalid altitude: {0} m")]
    InvalidAltitude(f64),

    /// The flat projection cannot represent this region faithfully.
    #[error("degenerate projection at latitude {lat}")]
    DegenerateProjection { lat: f64 },

    #[error("search region too large: {distance_m:.0} m between endpoints")]
    RegionTooLarge { distance_m: f64 },

    #[error("invalid glide polar: {0}")]
    InvalidPolar(String),

    #[error("invalid airspace '{name}': {}", reasons.join(", "))]
    InvalidAirspace { name: String, reasons: Vec<String> },

    /// Planner tuning that would disable a pruning rule or the link budget.
    #[error("invalid planner config: {0}")]
    InvalidConfig(String),

    #[error("terrain grid expects {expected} samples, got {actual}")]
    TerrainGridSize { expected: usize, actual: usize },

    /// Arrival queries were made before any reach solve.
    #[error("reach footprint has not been solved")]
    ReachNotSolved,
}
