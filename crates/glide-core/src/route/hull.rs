//! Convex hull of the region a search has already explored.

use crate::projection::FlatGeoPoint;

/// Counter-clockwise hull stored as a plain vertex vector.
#[derive(Debug, Clone, Default)]
pub struct SearchHull {
    vertices: Vec<FlatGeoPoint>,
    scratch: Vec<FlatGeoPoint>,
}

impl SearchHull {
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.scratch.clear();
    }

    pub fn vertices(&self) -> &[FlatGeoPoint] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Inside or on the boundary.
    pub fn contains(&self, p: &FlatGeoPoint) -> bool {
        match self.vertices.len() {
            0 => false,
            1 => self.vertices[0] == *p,
            2 => on_segment(&self.vertices[0], &self.vertices[1], p),
            n => (0..n).all(|i| {
                let a = self.vertices[i];
                let b = self.vertices[(i + 1) % n];
                (b - a).cross(&(*p - a)) >= 0
            }),
        }
    }

    /// Grow the hull to cover `p`. Returns false if `p` was already covered.
    pub fn extend(&mut self, p: FlatGeoPoint) -> bool {
        if self.contains(&p) {
            return false;
        }
        self.scratch.clear();
        self.scratch.extend_from_slice(&self.vertices);
        self.scratch.push(p);
        self.vertices = monotone_chain(&mut self.scratch);
        true
    }
}

fn on_segment(a: &FlatGeoPoint, b: &FlatGeoPoint, p: &FlatGeoPoint) -> bool {
    (*b - *a).cross(&(*p - *a)) == 0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

/// Andrew's monotone chain; collinear points are dropped.
fn monotone_chain(points: &mut [FlatGeoPoint]) -> Vec<FlatGeoPoint> {
    points.sort_unstable();
    let mut unique: Vec<FlatGeoPoint> = Vec::with_capacity(points.len());
    for p in points.iter() {
        if unique.last() != Some(p) {
            unique.push(*p);
        }
    }
    if unique.len() < 3 {
        return unique;
    }

    let turn = |o: &FlatGeoPoint, a: &FlatGeoPoint, b: &FlatGeoPoint| (*a - *o).cross(&(*b - *o));

    let mut hull: Vec<FlatGeoPoint> = Vec::with_capacity(unique.len() * 2);
    for p in &unique {
        while hull.len() >= 2 && turn(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0 {
            hull.pop();
        }
        hull.push(*p);
    }
    let lower_len = hull.len() + 1;
    for p in unique.iter().rev().skip(1) {
        while hull.len() >= lower_len && turn(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0
        {
            hull.pop();
        }
        hull.push(*p);
    }
    hull.pop();

    if hull.len() < 3 {
        // All points collinear: keep the two extremes as a segment.
        let first = unique[0];
        let last = unique[unique.len() - 1];
        return vec![first, last];
    }
    hull
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> FlatGeoPoint {
        FlatGeoPoint::new(x, y)
    }

    #[test]
    fn extend_builds_counter_clockwise_hull() {
        let mut hull = SearchHull::default();
        assert!(hull.extend(p(0, 0)));
        assert!(hull.extend(p(10, 0)));
        assert!(hull.extend(p(10, 10)));
        assert!(hull.extend(p(0, 10)));
        assert_eq!(hull.len(), 4);
        assert!(hull.contains(&p(5, 5)));
        assert!(hull.contains(&p(10, 5)), "boundary counts as inside");
        assert!(!hull.contains(&p(11, 5)));
        assert!(!hull.extend(p(3, 3)), "interior point does not grow the hull");
    }

    #[test]
    fn interior_vertices_are_pruned() {
        let mut hull = SearchHull::default();
        for q in [p(0, 0), p(4, 1), p(10, 0), p(10, 10), p(0, 10)] {
            hull.extend(q);
        }
        assert_eq!(hull.len(), 4);
        assert!(!hull.vertices().contains(&p(4, 1)));
    }

    #[test]
    fn degenerate_hulls() {
        let mut hull = SearchHull::default();
        assert!(!hull.contains(&p(0, 0)));
        hull.extend(p(0, 0));
        assert!(hull.contains(&p(0, 0)));
        hull.extend(p(10, 0));
        assert!(hull.contains(&p(5, 0)));
        assert!(!hull.contains(&p(5, 1)));
        assert!(hull.extend(p(20, 0)));
        assert_eq!(hull.vertices(), &[p(0, 0), p(20, 0)]);
        hull.clear();
        assert!(hull.is_empty());
    }
}
