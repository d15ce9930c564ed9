//! Segment intersection and chain self-collision.

use glam::DVec2;

const RTOL: f64 = 1e-5;
const ATOL: f64 = 1e-8;

/// A 2D line segment from `a` to `b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub a: DVec2,
    pub b: DVec2,
}

impl Segment {
    pub fn new(a: DVec2, b: DVec2) -> Self {
        Self { a, b }
    }

    pub fn min(&self) -> DVec2 {
        self.a.min(self.b)
    }

    pub fn max(&self) -> DVec2 {
        self.a.max(self.b)
    }

    fn bounds_disjoint(&self, other: &Segment) -> bool {
        let (min1, max1) = (self.min(), self.max());
        let (min2, max2) = (other.min(), other.max());
        max1.x < min2.x || max2.x < min1.x || max1.y < min2.y || max2.y < min1.y
    }
}

fn near(a: f64, b: f64) -> bool {
    (a - b).abs() < ATOL + RTOL * b.abs()
}

/// `true` if the segments cross; parallel or collinear segments never do.
pub fn segments_intersect(s1: &Segment, s2: &Segment) -> bool {
    if s1.bounds_disjoint(s2) {
        return false;
    }

    // Solve s1.a + t (s1.b - s1.a) = s2.a + s (s2.b - s2.a) by Cramer's rule.
    let d1 = s1.b - s1.a;
    let d2 = s2.a - s2.b;
    let e = s2.a - s1.a;

    let denom = d1.x * d2.y - d2.x * d1.y;
    if near(denom, 0.0) {
        return false;
    }
    let t = (e.x * d2.y - d2.x * e.y) / denom;
    let s = (d1.x * e.y - e.x * d1.y) / denom;
    (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&s)
}

/// `true` when two non-adjacent links of the polyline through `points` cross.
pub fn polyline_self_intersects(points: &[DVec2]) -> bool {
    let segments: Vec<Segment> = points
        .windows(2)
        .map(|w| Segment::new(w[0], w[1]))
        .collect();

    segments.iter().enumerate().any(|(i, si)| {
        segments
            .iter()
            .skip(i + 2)
            .any(|sj| segments_intersect(si, sj))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(ax: f64, ay: f64, bx: f64, by: f64) -> Segment {
        Segment::new(DVec2::new(ax, ay), DVec2::new(bx, by))
    }

    #[test]
    fn test_crossing_segments() {
        assert!(segments_intersect(&seg(0.0, 0.0, 2.0, 2.0), &seg(0.0, 2.0, 2.0, 0.0)));
        assert!(segments_intersect(&seg(0.0, 0.0, 2.0, 0.0), &seg(1.0, -1.0, 1.0, 1.0)));
    }

    #[test]
    fn test_touching_endpoint_counts() {
        assert!(segments_intersect(&seg(0.0, 0.0, 1.0, 0.0), &seg(1.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn test_disjoint_and_parallel() {
        assert!(!segments_intersect(&seg(0.0, 0.0, 1.0, 0.0), &seg(2.0, -1.0, 2.0, 1.0)));
        assert!(!segments_intersect(&seg(0.0, 0.0, 2.0, 0.0), &seg(0.0, 0.0, 2.0, 0.0)));
        assert!(!segments_intersect(&seg(0.0, 0.0, 2.0, 2.0), &seg(0.0, 1.0, 2.0, 3.0)));
        // Boxes overlap, lines cross outside both segments.
        assert!(!segments_intersect(&seg(0.0, 0.0, 2.0, 2.0), &seg(1.5, 0.0, 2.0, 0.2)));
    }

    #[test]
    fn test_polyline_folded_back_collides() {
        let points = [
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(2.0, 1.0),
            DVec2::new(1.0, -1.0),
        ];
        assert!(polyline_self_intersects(&points));
    }

    #[test]
    fn test_polyline_adjacent_links_ignored() {
        let points = [
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 0.0),
        ];
        assert!(!polyline_self_intersects(&points));
        assert!(!polyline_self_intersects(&points[..1]));
        assert!(!polyline_self_intersects(&[]));
    }
}
