//! Obstacle clearance oracles.
//!
//! An oracle answers two questions about a link: is it clear, and if not,
//! which nearby points might get around the first obstruction. Oracles are
//! composed with [`ChainedClearance`]; the first one to report a blockage
//! wins and is asked for the detour candidates.

use crate::airspace::{AirspaceShape, Airspaces};
use crate::config::RoutePlannerConfig;
use crate::geo::{AGeoPoint, GeoBounds};
use crate::projection::{FlatBoundingBox, FlatGeoPoint, FlatProjection};
use crate::route::link::{RouteLink, RoutePoint};
use crate::route::polars::RoutePolars;
use crate::terrain::TerrainMap;
use serde::Serialize;
use std::collections::HashMap;
use std::f64::consts::PI;

/// Shared inputs for one solve.
#[derive(Debug, Clone, Copy)]
pub struct ClearanceContext<'a> {
    pub projection: &'a FlatProjection,
    pub polars: &'a RoutePolars,
    pub config: &'a RoutePlannerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleKind {
    Terrain,
    Airspace,
}

/// First obstruction found along a link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blockage {
    /// Where the flight meets the obstacle, at the flight's altitude there.
    pub point: RoutePoint,
    pub kind: ObstacleKind,
    /// Index into the `Airspaces` collection for airspace blockages.
    pub airspace: Option<usize>,
    /// Terrain elevation at the hit for terrain blockages.
    pub obstacle_top: Option<i32>,
}

/// Detour point proposed around a blockage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearbyCandidate {
    pub location: FlatGeoPoint,
    /// Lowest altitude the candidate may be reached at.
    pub min_altitude: Option<i32>,
}

pub trait ClearanceOracle {
    /// `None` when the link is clear.
    fn check_clearance(&self, link: &RouteLink, ctx: &ClearanceContext<'_>) -> Option<Blockage>;

    /// Candidate points that may route around `blockage`.
    fn add_nearby(
        &self,
        link: &RouteLink,
        blockage: &Blockage,
        ctx: &ClearanceContext<'_>,
    ) -> Vec<NearbyCandidate>;

    /// Whether this oracle produced `blockage`.
    fn handles(&self, blockage: &Blockage) -> bool;

    /// Changes whenever the obstacle data changes.
    fn revision(&self) -> u64 {
        0
    }
}

impl<T: ClearanceOracle + ?Sized> ClearanceOracle for &T {
    fn check_clearance(&self, link: &RouteLink, ctx: &ClearanceContext<'_>) -> Option<Blockage> {
        (**self).check_clearance(link, ctx)
    }

    fn add_nearby(
        &self,
        link: &RouteLink,
        blockage: &Blockage,
        ctx: &ClearanceContext<'_>,
    ) -> Vec<NearbyCandidate> {
        (**self).add_nearby(link, blockage, ctx)
    }

    fn handles(&self, blockage: &Blockage) -> bool {
        (**self).handles(blockage)
    }

    fn revision(&self) -> u64 {
        (**self).revision()
    }
}

/// No obstacles at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAir;

impl ClearanceOracle for OpenAir {
    fn check_clearance(&self, _: &RouteLink, _: &ClearanceContext<'_>) -> Option<Blockage> {
        None
    }

    fn add_nearby(&self, _: &RouteLink, _: &Blockage, _: &ClearanceContext<'_>) -> Vec<NearbyCandidate> {
        Vec::new()
    }

    fn handles(&self, _: &Blockage) -> bool {
        false
    }
}

/// An absent source reports no obstacles.
impl<T: ClearanceOracle> ClearanceOracle for Option<T> {
    fn check_clearance(&self, link: &RouteLink, ctx: &ClearanceContext<'_>) -> Option<Blockage> {
        self.as_ref()?.check_clearance(link, ctx)
    }

    fn add_nearby(
        &self,
        link: &RouteLink,
        blockage: &Blockage,
        ctx: &ClearanceContext<'_>,
    ) -> Vec<NearbyCandidate> {
        self.as_ref()
            .map(|oracle| oracle.add_nearby(link, blockage, ctx))
            .unwrap_or_default()
    }

    fn handles(&self, blockage: &Blockage) -> bool {
        self.as_ref().is_some_and(|oracle| oracle.handles(blockage))
    }

    fn revision(&self) -> u64 {
        // A present source at revision 0 must differ from no source.
        self.as_ref().map_or(0, |oracle| oracle.revision().wrapping_add(1))
    }
}

/// Primary oracle first; the secondary only sees links the primary clears.
#[derive(Debug, Clone)]
pub struct ChainedClearance<P, S> {
    primary: P,
    secondary: S,
}

impl<P: ClearanceOracle, S: ClearanceOracle> ChainedClearance<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

impl<P: ClearanceOracle, S: ClearanceOracle> ClearanceOracle for ChainedClearance<P, S> {
    fn check_clearance(&self, link: &RouteLink, ctx: &ClearanceContext<'_>) -> Option<Blockage> {
        self.primary
            .check_clearance(link, ctx)
            .or_else(|| self.secondary.check_clearance(link, ctx))
    }

    fn add_nearby(
        &self,
        link: &RouteLink,
        blockage: &Blockage,
        ctx: &ClearanceContext<'_>,
    ) -> Vec<NearbyCandidate> {
        if self.primary.handles(blockage) {
            self.primary.add_nearby(link, blockage, ctx)
        } else {
            self.secondary.add_nearby(link, blockage, ctx)
        }
    }

    fn handles(&self, blockage: &Blockage) -> bool {
        self.primary.handles(blockage) || self.secondary.handles(blockage)
    }

    fn revision(&self) -> u64 {
        self.primary
            .revision()
            .wrapping_mul(0x9E37_79B9_7F4A_7C15)
            .wrapping_add(self.secondary.revision())
    }
}

/// Terrain clearance along the glide line.
pub struct TerrainClearance<'a> {
    terrain: &'a dyn TerrainMap,
}

impl<'a> TerrainClearance<'a> {
    pub fn new(terrain: &'a dyn TerrainMap) -> Self {
        Self { terrain }
    }

    fn clearance_at(&self, location: FlatGeoPoint, ctx: &ClearanceContext<'_>) -> Option<i32> {
        let ground = self.terrain.height(&ctx.projection.unproject(&location))?;
        Some(ground.saturating_add(ctx.polars.safety_height()))
    }

    /// Altitude at the hit from which a straight glide clears the rest of
    /// the link.
    fn climb_over_height(
        &self,
        link: &RouteLink,
        blockage: &Blockage,
        ctx: &ClearanceContext<'_>,
    ) -> Option<i32> {
        let gradient = ctx.polars.gradient(link.polar_index())?;
        let start = blockage.point.location;
        let end = link.first().location;
        let distance = start.distance(&end);
        let steps = ((distance / ctx.config.tuning.terrain_scan_step_m.max(1.0)).ceil() as usize).max(1);
        let (sx, sy) = start.to_f64();
        let (ex, ey) = end.to_f64();

        let mut required = blockage.obstacle_top?.saturating_add(ctx.polars.safety_height());
        for k in 1..=steps {
            let t = k as f64 / steps as f64;
            let sample = FlatGeoPoint::from_f64(sx + (ex - sx) * t, sy + (ey - sy) * t);
            if let Some(clearance) = self.clearance_at(sample, ctx) {
                let loss = (distance * t * gradient).ceil() as i32;
                required = required.max(clearance.saturating_add(loss));
            }
        }
        Some(required)
    }
}

impl ClearanceOracle for TerrainClearance<'_> {
    fn check_clearance(&self, link: &RouteLink, ctx: &ClearanceContext<'_>) -> Option<Blockage> {
        let (h_start, h_end) = ctx.polars.link_profile(link)?;
        let origin = ctx.projection.unproject(&link.second().location);
        let destination = ctx.projection.unproject(&link.first().location);
        let hit = self.terrain.first_intersection(
            &origin,
            h_start,
            &destination,
            h_end,
            ctx.polars.safety_height(),
            ctx.config.tuning.terrain_scan_step_m,
        )?;
        Some(Blockage {
            point: RoutePoint::new(ctx.projection.project(&hit.location), hit.altitude),
            kind: ObstacleKind::Terrain,
            airspace: None,
            obstacle_top: Some(hit.terrain_height),
        })
    }

    /// Offer a climb over the hit when climbing is allowed, then sweep
    /// sideways for the first clear point on each side.
    fn add_nearby(
        &self,
        link: &RouteLink,
        blockage: &Blockage,
        ctx: &ClearanceContext<'_>,
    ) -> Vec<NearbyCandidate> {
        let tuning = &ctx.config.tuning;
        let mut candidates = Vec::with_capacity(3);

        // The climb goes first: it sits between the two side points and
        // would otherwise fall inside the explored hull.
        if ctx.polars.allow_climb() && blockage.obstacle_top.is_some() {
            if let Some(required) = self.climb_over_height(link, blockage, ctx) {
                candidates.push(NearbyCandidate {
                    location: blockage.point.location,
                    min_altitude: Some(required.saturating_add(tuning.climb_over_margin_m)),
                });
            }
        }

        let (dx, dy) = link.base().flight_vector().to_f64();
        let inv = link.inv_distance();
        if inv > 0.0 {
            let (nx, ny) = (-dy * inv, dx * inv);
            let (bx, by) = blockage.point.location.to_f64();
            for side in [1.0, -1.0] {
                for k in 1..=tuning.terrain_sweep_steps {
                    let offset = side * k as f64 * tuning.terrain_sweep_distance_m as f64;
                    let location = FlatGeoPoint::from_f64(bx + nx * offset, by + ny * offset);
                    match self.clearance_at(location, ctx) {
                        None => {
                            candidates.push(NearbyCandidate {
                                location,
                                min_altitude: None,
                            });
                            break;
                        }
                        Some(required) if required < blockage.point.altitude => {
                            candidates.push(NearbyCandidate {
                                location,
                                min_altitude: Some(required),
                            });
                            break;
                        }
                        Some(_) => {}
                    }
                }
            }
        }

        candidates
    }

    fn handles(&self, blockage: &Blockage) -> bool {
        blockage.kind == ObstacleKind::Terrain
    }

    fn revision(&self) -> u64 {
        self.terrain.revision()
    }
}

/// Cell size of the airspace lookup grid in meters.
const CELL_SIZE_M: f64 = 10_000.0;

/// Link boxes spanning more cells than this scan every airspace instead.
const MAX_QUERY_CELLS: i64 = 256;

#[derive(Debug, Clone)]
enum FlatShape {
    Circle { center: (f64, f64), radius: f64 },
    Polygon { vertices: Vec<(f64, f64)> },
}

#[derive(Debug, Clone)]
struct FlatAirspace {
    index: usize,
    /// Airspace grown by the lateral margin; links must stay out of it.
    shape: FlatShape,
    /// Detour polygon just outside `shape`.
    clearance: Vec<FlatGeoPoint>,
    bounds: FlatBoundingBox,
    floor: f64,
    ceiling: f64,
}

/// Airspace clearance in flat space for one solve.
#[derive(Debug, Clone, Default)]
pub struct AirspaceClearance {
    items: Vec<FlatAirspace>,
    cells: HashMap<(i32, i32), Vec<usize>>,
    revision: u64,
}

impl AirspaceClearance {
    /// Project the obstacles relevant to a search between two endpoints.
    ///
    /// Airspace containing either endpoint, within its lateral margin, is
    /// left out: there is no way around it and avoiding it would only
    /// produce a useless detour.
    pub fn from_airspaces(
        airspaces: &Airspaces,
        projection: &FlatProjection,
        origin: &AGeoPoint,
        destination: &AGeoPoint,
        config: &RoutePlannerConfig,
    ) -> Self {
        let qnh = airspaces.qnh_hpa();
        let tuning = &config.tuning;
        let search_bounds = GeoBounds::from_points([&origin.location, &destination.location])
            .map(|b| b.expand_m(tuning.airspace_search_margin_m));
        let Some(search_bounds) = search_bounds else {
            return Self::default();
        };
        // Links are tested against the shape grown by the lateral margin; the
        // detour ring sits one meter further out so rounded vertices stay clear.
        let margin = config.safety_distance_airspace.max(0) as f64;
        let segments = tuning.airspace_polygon_segments.max(4) as usize;
        let flat_origin = projection.project_f(&origin.location);
        let flat_destination = projection.project_f(&destination.location);

        let mut items = Vec::new();
        for (index, airspace) in airspaces.query_bounds(&search_bounds) {
            if !airspace.is_obstacle() {
                continue;
            }

            let (shape, clearance) = match &airspace.shape {
                AirspaceShape::Circle { center, radius_m } => {
                    let center = projection.project_f(center);
                    let clearance = circle_clearance(center, *radius_m + margin + 1.0, segments);
                    (
                        FlatShape::Circle {
                            center,
                            radius: *radius_m + margin,
                        },
                        clearance,
                    )
                }
                AirspaceShape::Polygon { .. } => {
                    let mut vertices: Vec<(f64, f64)> =
                        airspace.ring().iter().map(|v| projection.project_f(v)).collect();
                    if signed_area(&vertices) < 0.0 {
                        vertices.reverse();
                    }
                    let clearance = polygon_clearance(&vertices, margin + 1.0);
                    let vertices = if margin > 0.0 {
                        offset_ring(&vertices, margin)
                    } else {
                        vertices
                    };
                    (FlatShape::Polygon { vertices }, clearance)
                }
            };

            let floor = airspace.floor_msl(qnh);
            let ceiling = airspace.ceiling_msl(qnh);
            let covers = |flat: (f64, f64), altitude: f64| {
                altitude >= floor && altitude <= ceiling && shape_contains(&shape, flat)
            };
            if airspace.contains_point(&origin.location, origin.altitude_m, qnh)
                || airspace.contains_point(&destination.location, destination.altitude_m, qnh)
                || covers(flat_origin, origin.altitude_m)
                || covers(flat_destination, destination.altitude_m)
            {
                tracing::debug!("Skipping airspace '{}' containing a route endpoint", airspace.name);
                continue;
            }

            let Some(bounds) = FlatBoundingBox::from_points(&clearance) else {
                continue;
            };
            items.push(FlatAirspace {
                index,
                shape,
                clearance,
                bounds,
                floor,
                ceiling,
            });
        }

        let mut cells: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
        for (slot, item) in items.iter().enumerate() {
            let (min, max) = cell_range(&item.bounds);
            for cx in min.0..=max.0 {
                for cy in min.1..=max.1 {
                    cells.entry((cx, cy)).or_default().push(slot);
                }
            }
        }

        tracing::debug!("Airspace clearance prepared with {} obstacle(s)", items.len());
        Self {
            items,
            cells,
            revision: airspaces.revision(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn candidates(&self, bounds: &FlatBoundingBox) -> Vec<usize> {
        let (min, max) = cell_range(bounds);
        let span = (max.0 as i64 - min.0 as i64 + 1) * (max.1 as i64 - min.1 as i64 + 1);
        let mut slots: Vec<usize> = if span > MAX_QUERY_CELLS {
            (0..self.items.len()).collect()
        } else {
            let mut found = Vec::new();
            for cx in min.0..=max.0 {
                for cy in min.1..=max.1 {
                    if let Some(list) = self.cells.get(&(cx, cy)) {
                        found.extend_from_slice(list);
                    }
                }
            }
            found.sort_unstable();
            found.dedup();
            found
        };
        slots.retain(|&slot| self.items[slot].bounds.overlaps(bounds));
        slots
    }
}

impl ClearanceOracle for AirspaceClearance {
    fn check_clearance(&self, link: &RouteLink, ctx: &ClearanceContext<'_>) -> Option<Blockage> {
        if self.items.is_empty() {
            return None;
        }
        let (h_start, h_end) = ctx.polars.link_profile(link)?;
        let a = link.second().location.to_f64();
        let b = link.first().location.to_f64();
        let link_bounds = FlatBoundingBox::from_points([&link.second().location, &link.first().location])?;
        let altitude_at = |t: f64| h_start as f64 + (h_end - h_start) as f64 * t;

        let mut best: Option<(f64, usize)> = None;
        for slot in self.candidates(&link_bounds) {
            let item = &self.items[slot];
            for (t0, t1) in inside_intervals(&item.shape, a, b) {
                let (alt0, alt1) = (altitude_at(t0), altitude_at(t1));
                // Altitude only decreases along a glide.
                if alt0 < item.floor || alt1 > item.ceiling {
                    continue;
                }
                let t_hit = if alt0 <= item.ceiling {
                    t0
                } else {
                    t0 + (t1 - t0) * (alt0 - item.ceiling) / (alt0 - alt1)
                };
                if best.map_or(true, |(t, _)| t_hit < t) {
                    best = Some((t_hit, slot));
                }
                break;
            }
        }

        let (t, slot) = best?;
        let (x, y) = link.point_at(t);
        Some(Blockage {
            point: RoutePoint::new(FlatGeoPoint::from_f64(x, y), altitude_at(t).round() as i32),
            kind: ObstacleKind::Airspace,
            airspace: Some(self.items[slot].index),
            obstacle_top: None,
        })
    }

    /// Outermost detour vertices on each side as seen from the
    /// destination-side end of the link.
    fn add_nearby(
        &self,
        link: &RouteLink,
        blockage: &Blockage,
        _ctx: &ClearanceContext<'_>,
    ) -> Vec<NearbyCandidate> {
        let Some(item) = self
            .items
            .iter()
            .find(|item| Some(item.index) == blockage.airspace)
        else {
            return Vec::new();
        };

        let from = link.first().location;
        let toward = link.second().location - from;
        let mut left: Option<(f64, FlatGeoPoint)> = None;
        let mut right: Option<(f64, FlatGeoPoint)> = None;
        for vertex in &item.clearance {
            if *vertex == from {
                continue;
            }
            let w = *vertex - from;
            let angle = (toward.cross(&w) as f64).atan2(toward.dot(&w) as f64);
            if left.map_or(true, |(best, _)| angle > best) {
                left = Some((angle, *vertex));
            }
            if right.map_or(true, |(best, _)| angle < best) {
                right = Some((angle, *vertex));
            }
        }

        let mut candidates = Vec::with_capacity(2);
        for (_, location) in left.into_iter().chain(right) {
            if candidates
                .iter()
                .all(|c: &NearbyCandidate| c.location != location)
            {
                candidates.push(NearbyCandidate {
                    location,
                    min_altitude: None,
                });
            }
        }
        candidates
    }

    fn handles(&self, blockage: &Blockage) -> bool {
        blockage.kind == ObstacleKind::Airspace
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

fn cell_of(p: &FlatGeoPoint) -> (i32, i32) {
    (
        (p.x as f64 / CELL_SIZE_M).floor() as i32,
        (p.y as f64 / CELL_SIZE_M).floor() as i32,
    )
}

fn cell_range(bounds: &FlatBoundingBox) -> ((i32, i32), (i32, i32)) {
    (cell_of(&bounds.min), cell_of(&bounds.max))
}

/// Regular polygon whose edges stay at least `radius` from the center.
fn circle_clearance(center: (f64, f64), radius: f64, segments: usize) -> Vec<FlatGeoPoint> {
    let outer = radius / (PI / segments as f64).cos();
    (0..segments)
        .map(|k| {
            let angle = 2.0 * PI * k as f64 / segments as f64;
            FlatGeoPoint::from_f64(center.0 + outer * angle.cos(), center.1 + outer * angle.sin())
        })
        .collect()
}

/// Offset a counter-clockwise polygon outward by `margin` with mitred corners.
fn offset_ring(vertices: &[(f64, f64)], margin: f64) -> Vec<(f64, f64)> {
    let n = vertices.len();
    let outward = |i: usize| {
        let (ax, ay) = vertices[i];
        let (bx, by) = vertices[(i + 1) % n];
        let (dx, dy) = (bx - ax, by - ay);
        let len = (dx * dx + dy * dy).sqrt().max(1e-9);
        (dy / len, -dx / len)
    };
    (0..n)
        .map(|i| {
            let n1 = outward((i + n - 1) % n);
            let n2 = outward(i);
            let (mx, my) = (n1.0 + n2.0, n1.1 + n2.1);
            let len = (mx * mx + my * my).sqrt();
            let (ux, uy) = if len > 1e-9 { (mx / len, my / len) } else { n2 };
            // Mitre length, capped for very sharp corners.
            let miter = margin / (ux * n1.0 + uy * n1.1).max(0.3);
            let (vx, vy) = vertices[i];
            (vx + ux * miter, vy + uy * miter)
        })
        .collect()
}

fn polygon_clearance(vertices: &[(f64, f64)], margin: f64) -> Vec<FlatGeoPoint> {
    offset_ring(vertices, margin)
        .into_iter()
        .map(|(x, y)| FlatGeoPoint::from_f64(x, y))
        .collect()
}

fn signed_area(vertices: &[(f64, f64)]) -> f64 {
    let n = vertices.len();
    (0..n)
        .map(|i| {
            let (ax, ay) = vertices[i];
            let (bx, by) = vertices[(i + 1) % n];
            ax * by - bx * ay
        })
        .sum::<f64>()
        / 2.0
}

fn point_in_polygon(vertices: &[(f64, f64)], (px, py): (f64, f64)) -> bool {
    let n = vertices.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = vertices[i];
        let (xj, yj) = vertices[j];
        if ((yi > py) != (yj > py)) && (px < (xj - xi) * (py - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn shape_contains(shape: &FlatShape, (px, py): (f64, f64)) -> bool {
    match shape {
        FlatShape::Circle { center, radius } => {
            let (dx, dy) = (px - center.0, py - center.1);
            dx * dx + dy * dy < radius * radius
        }
        FlatShape::Polygon { vertices } => point_in_polygon(vertices, (px, py)),
    }
}

/// Parameter intervals of segment `a→b` lying strictly inside `shape`.
fn inside_intervals(shape: &FlatShape, a: (f64, f64), b: (f64, f64)) -> Vec<(f64, f64)> {
    const MIN_SPAN: f64 = 1e-6;
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    match shape {
        FlatShape::Circle { center, radius } => {
            let (fx, fy) = (a.0 - center.0, a.1 - center.1);
            let qa = dx * dx + dy * dy;
            let qc = fx * fx + fy * fy - radius * radius;
            if qa <= f64::EPSILON {
                return if qc < 0.0 { vec![(0.0, 1.0)] } else { Vec::new() };
            }
            let qb = 2.0 * (fx * dx + fy * dy);
            let disc = qb * qb - 4.0 * qa * qc;
            if disc <= 0.0 {
                return Vec::new();
            }
            let root = disc.sqrt();
            let t0 = ((-qb - root) / (2.0 * qa)).max(0.0);
            let t1 = ((-qb + root) / (2.0 * qa)).min(1.0);
            if t1 - t0 > MIN_SPAN {
                vec![(t0, t1)]
            } else {
                Vec::new()
            }
        }
        FlatShape::Polygon { vertices } => {
            let n = vertices.len();
            let mut cuts = vec![0.0, 1.0];
            for i in 0..n {
                let p = vertices[i];
                let q = vertices[(i + 1) % n];
                let (ex, ey) = (q.0 - p.0, q.1 - p.1);
                let denom = dx * ey - dy * ex;
                if denom.abs() <= f64::EPSILON {
                    continue;
                }
                let t = ((p.0 - a.0) * ey - (p.1 - a.1) * ex) / denom;
                let u = ((p.0 - a.0) * dy - (p.1 - a.1) * dx) / denom;
                if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
                    cuts.push(t);
                }
            }
            cuts.sort_by(f64::total_cmp);
            cuts.dedup_by(|x, y| (*x - *y).abs() < MIN_SPAN);

            let mut intervals: Vec<(f64, f64)> = Vec::new();
            for pair in cuts.windows(2) {
                let (t0, t1) = (pair[0], pair[1]);
                if t1 - t0 <= MIN_SPAN {
                    continue;
                }
                let tm = (t0 + t1) / 2.0;
                if point_in_polygon(vertices, (a.0 + dx * tm, a.1 + dy * tm)) {
                    match intervals.last_mut() {
                        Some(last) if (last.1 - t0).abs() < MIN_SPAN => last.1 = t1,
                        _ => intervals.push((t0, t1)),
                    }
                }
            }
            intervals
        }
    }
}
