//! Backward best-first search over dynamically generated links.
//!
//! The search starts at the destination and works back toward the aircraft.
//! Links are only created when needed: each expanded node first tries to
//! reach the origin directly, and a blocked attempt asks the oracle for
//! detour points around the obstruction. Three rules keep the candidate set
//! finite: links are never checked twice, short links are dropped, and new
//! points must lie outside the hull of everything explored so far.

use crate::route::astar::AStar;
use crate::route::clearance::{ClearanceContext, ClearanceOracle, NearbyCandidate};
use crate::route::hull::SearchHull;
use crate::route::link::{RouteLink, RouteLinkBase, RoutePoint};
use crate::route::polars::RoutePolars;
use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};

/// Counters for one solve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Links passed to the clearance oracle
    pub links_checked: usize,
    /// Links the aircraft cannot fly at all
    pub links_unachievable: usize,
    pub nodes_expanded: usize,
    pub rejected_short: usize,
    pub rejected_deviation: usize,
    pub rejected_hull: usize,
    pub shortcuts_tried: usize,
    /// The link budget ran out before the origin was reached
    pub budget_exhausted: bool,
}

#[derive(Debug, Default)]
pub struct SearchState {
    astar: AStar,
    links: VecDeque<RouteLink>,
    unique_links: BTreeSet<RouteLinkBase>,
    hull: SearchHull,
    stats: SearchStats,
}

impl SearchState {
    pub fn clear(&mut self) {
        self.astar.clear();
        self.links.clear();
        self.unique_links.clear();
        self.hull.clear();
        self.stats = SearchStats::default();
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Number of distinct links seen during the last run.
    pub fn unique_links(&self) -> usize {
        self.unique_links.len()
    }

    /// Search from `start` (destination) back to `goal` (origin).
    ///
    /// Returns the path in flight order, origin first, or `None` when the
    /// candidates ran out or the link budget was exhausted.
    pub fn run(
        &mut self,
        start: RoutePoint,
        goal: RoutePoint,
        oracle: &dyn ClearanceOracle,
        ctx: &ClearanceContext<'_>,
    ) -> Option<Vec<RoutePoint>> {
        self.clear();
        let polars = ctx.polars;
        let max_links = ctx.config.tuning.max_links;

        self.hull.extend(start.location);
        self.astar.push_start(start, heuristic(polars, &start, &goal));

        while let Some(node) = self.astar.pop() {
            self.stats.nodes_expanded += 1;
            if node.point == goal {
                return Some(self.astar.path_to(&goal));
            }

            self.links.push_back(RouteLink::new(node.point, goal, polars));
            while let Some(link) = self.links.pop_front() {
                if !self.unique_links.insert(*link.base()) {
                    continue;
                }
                let Some(time) = polars.calc_time(&link) else {
                    self.stats.links_unachievable += 1;
                    continue;
                };
                if self.stats.links_checked >= max_links {
                    self.stats.budget_exhausted = true;
                    tracing::warn!(
                        "Route search stopped after {} links without reaching the origin",
                        self.stats.links_checked
                    );
                    self.links.clear();
                    return None;
                }
                self.stats.links_checked += 1;

                match oracle.check_clearance(&link, ctx) {
                    None => {
                        tracing::trace!("clear {:?} <- {:?}", link.first(), link.second());
                        let target = *link.second();
                        let h = heuristic(polars, &target, &goal);
                        if self.astar.relax(*link.first(), target, time, h) {
                            self.queue_shortcut(&link, &goal, ctx);
                        }
                    }
                    Some(blockage) => {
                        tracing::trace!("{:?} blocks link at {:?}", blockage.kind, blockage.point);
                        for candidate in oracle.add_nearby(&link, &blockage, ctx) {
                            if let Some(point) = self.accept_candidate(&link, candidate, &goal, ctx) {
                                self.links
                                    .push_back(RouteLink::new(*link.first(), point, polars));
                            }
                        }
                    }
                }
            }
        }
        None
    }

    /// Try to skip the node the clear link started from by linking its own
    /// predecessor straight to the link's far end.
    fn queue_shortcut(&mut self, link: &RouteLink, goal: &RoutePoint, ctx: &ClearanceContext<'_>) {
        let Some(parent) = self.astar.parent(link.first()) else {
            return;
        };
        let target = *link.second();
        let base = RouteLinkBase::new(parent, target);
        let tuning = &ctx.config.tuning;
        if base.is_self_referential() || base.is_short(tuning.min_step_m) {
            return;
        }
        if deviation_deg(&parent, &target, goal) > tuning.max_deviation_deg {
            return;
        }
        self.stats.shortcuts_tried += 1;
        self.links.push_back(RouteLink::new(parent, target, ctx.polars));
    }

    /// Turn an oracle proposal into a search point, or drop it.
    fn accept_candidate(
        &mut self,
        link: &RouteLink,
        candidate: NearbyCandidate,
        goal: &RoutePoint,
        ctx: &ClearanceContext<'_>,
    ) -> Option<RoutePoint> {
        let node = *link.first();
        let tuning = &ctx.config.tuning;

        let point = if candidate.location == goal.location {
            *goal
        } else {
            let loss = ctx.polars.glide_loss_between(candidate.location, node.location)?;
            let mut altitude = node.altitude.saturating_add(loss);
            if let Some(min) = candidate.min_altitude {
                altitude = altitude.max(min);
            }
            RoutePoint::new(candidate.location, altitude)
        };

        let base = RouteLinkBase::new(node, point);
        if base.is_self_referential() {
            return None;
        }
        if base.is_short(tuning.min_step_m) {
            self.stats.rejected_short += 1;
            return None;
        }
        if deviation_deg(&node, &point, goal) > tuning.max_deviation_deg {
            self.stats.rejected_deviation += 1;
            return None;
        }
        if point != *goal && !self.hull.extend(point.location) {
            self.stats.rejected_hull += 1;
            return None;
        }
        Some(point)
    }
}

/// Lower bound on the remaining time from `from` to `goal`.
fn heuristic(polars: &RoutePolars, from: &RoutePoint, goal: &RoutePoint) -> f64 {
    from.location.distance(&goal.location) * polars.min_slowness()
}

/// Angle between the leg `from → to` and the bearing `from → goal`.
fn deviation_deg(from: &RoutePoint, to: &RoutePoint, goal: &RoutePoint) -> f64 {
    let leg = to.location - from.location;
    let direct = goal.location - from.location;
    if leg.magnitude_squared() == 0 || direct.magnitude_squared() == 0 {
        return 0.0;
    }
    (leg.cross(&direct).abs() as f64)
        .atan2(leg.dot(&direct) as f64)
        .to_degrees()
}
