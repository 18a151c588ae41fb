//! Closed-polygon approximation using Ramer-Douglas-Peucker.
//!
//! Reduces a traced boundary to a minimal vertex set within a tolerance,
//! so a clean document outline collapses to exactly its corners.
//! Implemented from scratch (~60 lines) rather than pulling in a
//! geometry crate for one algorithm.
//!
//! Plain RDP assumes an open polyline and always keeps both endpoints,
//! which is wrong for a closed curve traced from an arbitrary start
//! pixel: a start point in the middle of an edge would survive as a
//! phantom vertex. Instead, the curve is split at two mutually distant
//! anchor points, each arc is simplified independently, and a final pass
//! drops any anchor that ended up within tolerance of the chord between
//! its neighbors.

use crate::types::Point;

/// Approximate a closed curve with a simpler polygon.
///
/// Vertices within `epsilon` of the polygon formed by their neighbors
/// are removed. Curves with 3 or fewer points are returned unchanged.
#[must_use = "returns the simplified polygon"]
pub fn approximate_closed(points: &[Point], epsilon: f64) -> Vec<Point> {
    let n = points.len();
    if n <= 3 {
        return points.to_vec();
    }

    // Anchor the split at the point farthest from the trace start; the
    // two anchors are guaranteed to be far apart on the curve.
    let far = farthest_from(points, points[0]);

    let mut kept = vec![false; n];
    kept[0] = true;
    kept[far] = true;

    // Virtual index range [0, far] and [far, n] where index n wraps to 0.
    rdp_arc(points, 0, far, epsilon, &mut kept);
    rdp_arc(points, far, n, epsilon, &mut kept);

    let mut indices: Vec<usize> = (0..n).filter(|&i| kept[i]).collect();

    // Drop anchors (and any other vertex) that sit within tolerance of
    // the chord between their surviving neighbors. One removal at a
    // time, weakest first, so neighbors are re-evaluated.
    while indices.len() > 3 {
        let m = indices.len();
        let mut weakest: Option<(usize, f64)> = None;
        for i in 0..m {
            let prev = points[indices[(i + m - 1) % m]];
            let here = points[indices[i]];
            let next = points[indices[(i + 1) % m]];
            let d = perpendicular_distance(here, prev, next);
            if weakest.is_none_or(|(_, best)| d < best) {
                weakest = Some((i, d));
            }
        }
        match weakest {
            Some((i, d)) if d <= epsilon => {
                indices.remove(i);
            }
            _ => break,
        }
    }

    indices.into_iter().map(|i| points[i]).collect()
}

/// Index of the point farthest from `origin`.
fn farthest_from(points: &[Point], origin: Point) -> usize {
    let mut best = 0;
    let mut best_d = 0.0;
    for (i, p) in points.iter().enumerate() {
        let d = p.distance_squared(origin);
        if d > best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

/// Recursive RDP over the arc of virtual indices `(start, end)`.
///
/// Virtual indices are taken modulo `points.len()`, so `end` may equal
/// `points.len()` to denote the wrap back to the start point.
fn rdp_arc(points: &[Point], start: usize, end: usize, epsilon: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let n = points.len();
    let a = points[start % n];
    let b = points[end % n];

    let mut max_dist = 0.0;
    let mut max_idx = start;
    for i in (start + 1)..end {
        let d = perpendicular_distance(points[i % n], a, b);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > epsilon {
        kept[max_idx % n] = true;
        rdp_arc(points, start, max_idx, epsilon, kept);
        rdp_arc(points, max_idx, end, epsilon, kept);
    }
}

/// Perpendicular distance from `p` to the line through `a` and `b`.
///
/// When `a` and `b` coincide, falls back to the point-to-point distance.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        return p.distance(a);
    }

    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}
