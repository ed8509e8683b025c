//! Obstacle-aware route search.

pub mod astar;
pub mod clearance;
pub mod hull;
pub mod link;
pub mod planner;
pub mod polars;
pub mod search;

pub use clearance::{
    AirspaceClearance, Blockage, ChainedClearance, ClearanceContext, ClearanceOracle,
    NearbyCandidate, ObstacleKind, OpenAir, TerrainClearance,
};
pub use link::{Route, RouteLink, RouteLinkBase, RoutePoint};
pub use planner::{ObstacleSources, RoutePlanner};
pub use polars::{RoutePolars, ROUTEPOLAR_POINTS};
pub use search::{SearchState, SearchStats};
