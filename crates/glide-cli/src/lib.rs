//! Glide CLI - command line tools around the glide route planner.
//!
//! Binaries:
//! - glide_route: solve one scenario file and print a JSON report
//! - glide_replay: feed a stream of position fixes through a planner task
//! - glide_stress: random airspace layouts checked for termination and clearance

pub mod config;
pub mod logging;
pub mod report;
pub mod scenario;

pub use config::CliConfig;
pub use report::{ReachSummary, RouteReport};
pub use scenario::{Hill, PolarSpec, Scenario, TerrainSpec};
