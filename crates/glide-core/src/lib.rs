pub mod airspace;
pub mod config;
pub mod error;
mod generation;
pub mod geo;
pub mod polar;
pub mod projection;
pub mod reach;
pub mod route;
pub mod terrain;

pub use airspace::{Airspace, AirspaceAltitude, AirspaceClass, AirspaceShape, Airspaces};
pub use config::{ReachMode, ReachPolar, ReachTuning, RouteMode, RoutePlannerConfig, SearchTuning};
pub use error::{Result, RouteError};
pub use geo::{haversine_distance, AGeoPoint, GeoBounds, GeoPoint};
pub use polar::{GlidePolar, GlideSettings, Wind};
pub use projection::{FlatBoundingBox, FlatGeoPoint, FlatProjection};
pub use reach::{FlatTriangleFan, ReachFan, ReachResult};
pub use route::{
    ClearanceOracle, ObstacleSources, Route, RoutePlanner, RoutePoint, RoutePolars, SearchStats,
};
pub use terrain::{TerrainGrid, TerrainIntersection, TerrainMap};
