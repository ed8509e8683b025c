//! Best-first open list over route points.

use crate::route::link::RoutePoint;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Heap entry. Equal f-scores pop in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    f_score: FloatOrd,
    sequence: u64,
    g_score: FloatOrd,
    point: RoutePoint,
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

/// A node popped from the open list with its settled cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expanded {
    pub point: RoutePoint,
    pub g_score: f64,
}

#[derive(Debug, Default)]
pub struct AStar {
    open_set: BinaryHeap<Reverse<OpenEntry>>,
    g_score: HashMap<RoutePoint, f64>,
    came_from: HashMap<RoutePoint, RoutePoint>,
    closed_set: HashSet<RoutePoint>,
    sequence: u64,
}

impl AStar {
    pub fn clear(&mut self) {
        self.open_set.clear();
        self.g_score.clear();
        self.came_from.clear();
        self.closed_set.clear();
        self.sequence = 0;
    }

    pub fn push_start(&mut self, point: RoutePoint, h_score: f64) {
        self.g_score.insert(point, 0.0);
        self.push(point, 0.0, h_score);
    }

    /// Record `to` as reached from `from` if that is strictly cheaper.
    pub fn relax(&mut self, from: RoutePoint, to: RoutePoint, step_cost: f64, h_score: f64) -> bool {
        if self.closed_set.contains(&to) {
            return false;
        }
        let Some(&base) = self.g_score.get(&from) else {
            return false;
        };
        let tentative_g = base + step_cost;
        if tentative_g < self.g_score.get(&to).copied().unwrap_or(f64::INFINITY) {
            self.came_from.insert(to, from);
            self.g_score.insert(to, tentative_g);
            self.push(to, tentative_g, h_score);
            true
        } else {
            false
        }
    }

    /// Next cheapest open node, skipping stale heap entries.
    pub fn pop(&mut self) -> Option<Expanded> {
        while let Some(Reverse(current)) = self.open_set.pop() {
            if self.closed_set.contains(&current.point) {
                continue;
            }
            let best_g = self
                .g_score
                .get(&current.point)
                .copied()
                .unwrap_or(f64::INFINITY);
            if current.g_score.0 > best_g + 1e-9 {
                continue;
            }
            self.closed_set.insert(current.point);
            return Some(Expanded {
                point: current.point,
                g_score: best_g,
            });
        }
        None
    }

    pub fn g(&self, point: &RoutePoint) -> Option<f64> {
        self.g_score.get(point).copied()
    }

    pub fn parent(&self, point: &RoutePoint) -> Option<RoutePoint> {
        self.came_from.get(point).copied()
    }

    pub fn is_closed(&self, point: &RoutePoint) -> bool {
        self.closed_set.contains(point)
    }

    /// Chain from `goal` back to the start node.
    ///
    /// The search runs backward, so this is already in flight order.
    pub fn path_to(&self, goal: &RoutePoint) -> Vec<RoutePoint> {
        let mut path = vec![*goal];
        let mut current = *goal;
        while let Some(prev) = self.came_from.get(&current) {
            path.push(*prev);
            current = *prev;
            if path.len() > self.came_from.len() + 1 {
                break;
            }
        }
        path
    }

    fn push(&mut self, point: RoutePoint, g: f64, h: f64) {
        self.sequence += 1;
        self.open_set.push(Reverse(OpenEntry {
            f_score: FloatOrd(g + h),
            sequence: self.sequence,
            g_score: FloatOrd(g),
            point,
        }));
    }
}
