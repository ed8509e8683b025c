//! Star-shaped glide fans stored in an index arena.

use crate::config::ReachTuning;
use crate::projection::{FlatBoundingBox, FlatGeoPoint, FlatProjection};
use crate::route::polars::{RoutePolars, ROUTEPOLAR_POINTS};
use crate::terrain::TerrainMap;
use std::collections::VecDeque;
use std::f64::consts::PI;

/// One fan: a polygon of ray end points around an origin, reachable from
/// the origin at `height` by straight glides.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatTriangleFan {
    origin: FlatGeoPoint,
    height: i32,
    vertices: Vec<FlatGeoPoint>,
    bounds: FlatBoundingBox,
    terrain_base: Option<i32>,
    depth: u32,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl FlatTriangleFan {
    pub(crate) fn point(origin: FlatGeoPoint, height: i32, terrain_base: Option<i32>) -> Self {
        Self {
            origin,
            height,
            vertices: Vec::new(),
            bounds: FlatBoundingBox::around(origin),
            terrain_base,
            depth: 0,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn origin(&self) -> FlatGeoPoint {
        self.origin
    }

    /// Altitude at the fan origin.
    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn vertices(&self) -> &[FlatGeoPoint] {
        &self.vertices
    }

    /// Lowest terrain sampled while building this fan.
    pub fn terrain_base(&self) -> Option<i32> {
        self.terrain_base
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn is_point(&self) -> bool {
        self.vertices.len() < 3
    }

    pub fn contains(&self, p: &FlatGeoPoint) -> bool {
        if self.is_point() {
            return *p == self.origin;
        }
        if !self.bounds.contains(p) {
            return false;
        }
        let (px, py) = p.to_f64();
        let n = self.vertices.len();
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = self.vertices[i].to_f64();
            let (xj, yj) = self.vertices[j].to_f64();
            if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

#[derive(Debug, Clone, Copy)]
struct Ray {
    distance: f64,
    blocked: bool,
}

/// Everything needed to cast rays for one reach solve.
pub(crate) struct FanBuilder<'a> {
    pub projection: &'a FlatProjection,
    pub polars: &'a RoutePolars,
    pub terrain: Option<&'a dyn TerrainMap>,
    pub tuning: &'a ReachTuning,
    /// Glide floor: no ray descends below this altitude.
    pub floor: i32,
    pub lowest_terrain: Option<i32>,
}

impl FanBuilder<'_> {
    /// Build the root fan and, when `turning`, its children.
    pub fn build_tree(&mut self, origin: FlatGeoPoint, height: i32, turning: bool) -> Vec<FlatTriangleFan> {
        let mut fans = Vec::new();
        let (root, rays) = self.build_fan(origin, height, 0, None);
        fans.push(root);

        let mut queue = VecDeque::new();
        queue.push_back((0usize, rays));
        while let Some((index, rays)) = queue.pop_front() {
            if !turning || fans[index].depth >= self.tuning.max_depth {
                continue;
            }
            for (child_origin, child_height) in self.shadow_corners(&fans[index], &rays) {
                if fans.len() >= self.tuning.max_fans {
                    tracing::debug!("Reach fan limit of {} reached", self.tuning.max_fans);
                    return fans;
                }
                let too_close = fans
                    .iter()
                    .any(|f| f.origin.distance(&child_origin) < self.tuning.min_gap_m);
                if too_close {
                    continue;
                }
                let depth = fans[index].depth + 1;
                let (child, child_rays) = self.build_fan(child_origin, child_height, depth, Some(index));
                let child_index = fans.len();
                fans[index].children.push(child_index);
                fans.push(child);
                queue.push_back((child_index, child_rays));
            }
        }
        fans
    }

    fn build_fan(
        &mut self,
        origin: FlatGeoPoint,
        height: i32,
        depth: u32,
        parent: Option<usize>,
    ) -> (FlatTriangleFan, Vec<Ray>) {
        let rays: Vec<Ray> = (0..ROUTEPOLAR_POINTS)
            .map(|i| self.cast(origin, height, i))
            .collect();
        let circumscribe = 1.0 / (PI / ROUTEPOLAR_POINTS as f64).cos();

        let vertices: Vec<FlatGeoPoint> = rays
            .iter()
            .enumerate()
            .map(|(i, ray)| {
                let reach = if ray.blocked || ray.distance <= 0.0 {
                    ray.distance
                } else {
                    ray.distance * circumscribe + 1.0
                };
                along(origin, i, reach)
            })
            .collect();
        let bounds = FlatBoundingBox::from_points(&vertices).unwrap_or_else(|| FlatBoundingBox::around(origin));

        let fan = FlatTriangleFan {
            origin,
            height,
            bounds,
            vertices,
            terrain_base: self.lowest_terrain,
            depth,
            parent,
            children: Vec::new(),
        };
        (fan, rays)
    }

    /// March along bin `index` until the glide meets terrain or the floor.
    fn cast(&mut self, origin: FlatGeoPoint, height: i32, index: usize) -> Ray {
        let Some(gradient) = self.polars.gradient(index).filter(|g| *g > 0.0) else {
            return Ray {
                distance: 0.0,
                blocked: false,
            };
        };
        let available = (height - self.floor) as f64;
        if available <= 0.0 {
            return Ray {
                distance: 0.0,
                blocked: true,
            };
        }
        let range = (available / gradient).min(self.tuning.max_range_m);

        let Some(terrain) = self.terrain else {
            return Ray {
                distance: range,
                blocked: false,
            };
        };
        let step = self.tuning.ray_step_m.max(1.0);
        let steps = (range / step).ceil() as usize;
        let safety = self.polars.safety_height();
        let mut clear = 0.0;
        // The end point sits on the floor by construction and is not sampled.
        for k in 1..steps {
            let s = k as f64 * step;
            let sample = along(origin, index, s);
            let Some(ground) = terrain.height(&self.projection.unproject(&sample)) else {
                clear = s;
                continue;
            };
            self.lowest_terrain = Some(self.lowest_terrain.map_or(ground, |low| low.min(ground)));
            let altitude = height as f64 - gradient * s;
            if (ground + safety) as f64 > altitude {
                return Ray {
                    distance: clear,
                    blocked: true,
                };
            }
            clear = s;
        }
        Ray {
            distance: range,
            blocked: false,
        }
    }

    /// Points beside terrain shadows from which a child fan can look around
    /// the obstacle, with the altitude they are reached at.
    fn shadow_corners(&self, fan: &FlatTriangleFan, rays: &[Ray]) -> Vec<(FlatGeoPoint, i32)> {
        let n = rays.len();
        let mut corners = Vec::new();
        for i in 0..n {
            if !rays[i].blocked {
                continue;
            }
            for j in [(i + 1) % n, (i + n - 1) % n] {
                let neighbour = rays[j];
                if neighbour.distance < rays[i].distance + self.tuning.min_gap_m {
                    continue;
                }
                let Some(gradient) = self.polars.gradient(j) else {
                    continue;
                };
                let s = rays[i].distance.max(self.tuning.min_gap_m);
                let height = fan.height - (gradient * s).ceil() as i32;
                if height - self.floor < self.tuning.min_height_m {
                    continue;
                }
                corners.push((along(fan.origin, j, s), height));
            }
        }
        corners
    }
}

fn along(origin: FlatGeoPoint, index: usize, distance: f64) -> FlatGeoPoint {
    let (sin, cos) = RoutePolars::bearing_for_index(index).to_radians().sin_cos();
    let (x, y) = origin.to_f64();
    FlatGeoPoint::from_f64(x + sin * distance, y + cos * distance)
}
