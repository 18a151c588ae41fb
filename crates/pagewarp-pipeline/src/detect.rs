//! Document-boundary search: edge mask to best-guess quadrilateral.
//!
//! Candidates are traced contours sorted by enclosed area, largest
//! first. The first pass accepts the first candidate whose simplified
//! polygon is a convex quadrilateral. If none qualifies, a second pass
//! falls back to the minimum-area rotated rectangle of the largest
//! sufficiently big contour; that result is tagged
//! [`DetectionKind::MinAreaRect`] so callers know it may not hug the
//! true document edges.

use image::GrayImage;

use crate::contour::{self, TracedContour};
use crate::simplify;
use crate::types::{Detection, DetectionKind, Point, Quad, ScanConfig, ScanError};

/// Find the most plausible document quadrilateral in an edge mask.
///
/// # Errors
///
/// Returns [`ScanError::EmptyInput`] for a zero-sized mask and
/// [`ScanError::QuadNotFound`] when no contour encloses at least
/// [`ScanConfig::min_contour_area`] px^2.
pub fn find_document_quad(mask: &GrayImage, config: &ScanConfig) -> Result<Detection, ScanError> {
    if mask.width() == 0 || mask.height() == 0 {
        return Err(ScanError::EmptyInput);
    }

    let mut candidates: Vec<(f64, TracedContour)> = contour::trace(mask)
        .into_iter()
        .map(|c| (c.area(), c))
        .collect();
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

    // First pass: first convex quadrilateral by area wins outright.
    for (area, candidate) in &candidates {
        if *area < config.min_contour_area {
            // Sorted descending, so everything beyond here is noise.
            break;
        }
        let epsilon = config.approx_epsilon_frac * candidate.perimeter();
        let approx = simplify::approximate_closed(candidate.points(), epsilon);
        if approx.len() == 4 {
            let corners = [approx[0], approx[1], approx[2], approx[3]];
            if is_convex(&corners) {
                return Ok(Detection {
                    quad: Quad::new(corners),
                    kind: DetectionKind::ConvexContour,
                });
            }
        }
    }

    // Second pass: no shape filter, just the minimum-area enclosing
    // rotated rectangle of the first sufficiently large contour.
    for (area, candidate) in &candidates {
        if *area < config.min_contour_area {
            continue;
        }
        return Ok(Detection {
            quad: min_area_rect(candidate.points()),
            kind: DetectionKind::MinAreaRect,
        });
    }

    Err(ScanError::QuadNotFound)
}

/// Whether four corners form a convex (non-self-intersecting) polygon.
///
/// Checks that the z components of consecutive edge cross products all
/// share one sign; a zero cross product means a collinear corner and is
/// rejected too.
fn is_convex(corners: &[Point; 4]) -> bool {
    let mut sign = 0i8;
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        let c = corners[(i + 2) % 4];
        let cross = (b.x - a.x).mul_add(c.y - b.y, -((b.y - a.y) * (c.x - b.x)));
        if cross.abs() < 1e-9 {
            return false;
        }
        let s: i8 = if cross > 0.0 { 1 } else { -1 };
        if sign == 0 {
            sign = s;
        } else if s != sign {
            return false;
        }
    }
    true
}

/// Minimum-area enclosing rotated rectangle of a point set.
///
/// Rotating calipers over the convex hull: the minimal rectangle has one
/// side collinear with a hull edge, so trying every edge direction and
/// projecting the hull onto it finds the optimum.
fn min_area_rect(points: &[Point]) -> Quad {
    let hull = convex_hull(points);
    if hull.len() < 3 {
        return bounding_box(points);
    }

    let mut best: Option<(f64, Quad)> = None;
    for i in 0..hull.len() {
        let a = hull[i];
        let b = hull[(i + 1) % hull.len()];
        let len = a.distance(b);
        if len == 0.0 {
            continue;
        }
        // Orthonormal frame aligned with this hull edge.
        let ux = (b.x - a.x) / len;
        let uy = (b.y - a.y) / len;
        let (vx, vy) = (-uy, ux);

        let mut min_u = f64::INFINITY;
        let mut max_u = f64::NEG_INFINITY;
        let mut min_v = f64::INFINITY;
        let mut max_v = f64::NEG_INFINITY;
        for p in &hull {
            let u = p.x.mul_add(ux, p.y * uy);
            let v = p.x.mul_add(vx, p.y * vy);
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let area = (max_u - min_u) * (max_v - min_v);
        if best.as_ref().is_none_or(|(best_area, _)| area < *best_area) {
            let corner = |u: f64, v: f64| {
                Point::new(u.mul_add(ux, v * vx), u.mul_add(uy, v * vy))
            };
            let quad = Quad::new([
                corner(min_u, min_v),
                corner(max_u, min_v),
                corner(max_u, max_v),
                corner(min_u, max_v),
            ]);
            best = Some((area, quad));
        }
    }

    best.map_or_else(|| bounding_box(points), |(_, quad)| quad)
}

/// Axis-aligned bounding box, used when the hull degenerates.
fn bounding_box(points: &[Point]) -> Quad {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in points {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    Quad::new([
        Point::new(min_x, min_y),
        Point::new(max_x, min_y),
        Point::new(max_x, max_y),
        Point::new(min_x, max_y),
    ])
}

/// Convex hull via Andrew's monotone chain, counterclockwise.
fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let cross = |o: Point, a: Point, b: Point| {
        (a.x - o.x).mul_add(b.y - o.y, -((a.y - o.y) * (b.x - o.x)))
    };

    let mut lower: Vec<Point> = Vec::new();
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Point> = Vec::new();
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    // Each chain ends where the other begins.
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}
