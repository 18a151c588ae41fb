//! Contour tracing: closed boundary curves from a binary edge mask.
//!
//! Uses Suzuki-Abe border following via
//! [`imageproc::contours::find_contours`]. Parent/child hierarchy is not
//! needed for document detection, so the result is a flat list. Each
//! traced contour carries its derived enclosed area and perimeter.

use image::GrayImage;

use crate::types::Point;

/// A closed boundary curve traced from an edge mask.
#[derive(Debug, Clone, PartialEq)]
pub struct TracedContour(Vec<Point>);

impl TracedContour {
    /// Create a contour from boundary points in trace order.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Boundary points in trace order. The curve is implicitly closed:
    /// the last point connects back to the first.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Number of boundary points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the contour has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Enclosed area via the shoelace formula.
    #[must_use]
    pub fn area(&self) -> f64 {
        let n = self.0.len();
        if n < 3 {
            return 0.0;
        }
        let mut acc = 0.0;
        for i in 0..n {
            let a = self.0[i];
            let b = self.0[(i + 1) % n];
            acc += a.x.mul_add(b.y, -(b.x * a.y));
        }
        acc.abs() / 2.0
    }

    /// Perimeter of the closed curve.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        let n = self.0.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| self.0[i].distance(self.0[(i + 1) % n]))
            .sum()
    }
}

/// Trace all closed boundary curves in a mask.
///
/// Any nonzero pixel counts as foreground. Contours with fewer than 3
/// points cannot enclose area and are dropped.
#[must_use = "returns the traced contours"]
pub fn trace(mask: &GrayImage) -> Vec<TracedContour> {
    if mask.width() == 0 || mask.height() == 0 {
        return Vec::new();
    }

    let contours: Vec<imageproc::contours::Contour<u32>> =
        imageproc::contours::find_contours(mask);

    contours
        .into_iter()
        .filter(|c| c.points.len() >= 3)
        .map(|c| {
            let points = c
                .points
                .into_iter()
                .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
                .collect();
            TracedContour::new(points)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_contour(side: f64) -> TracedContour {
        TracedContour::new(vec![
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ])
    }

    #[test]
    fn square_area_and_perimeter() {
        let c = square_contour(10.0);
        assert!((c.area() - 100.0).abs() < 1e-12);
        assert!((c.perimeter() - 40.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_contour_has_zero_area() {
        let c = TracedContour::new(vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)]);
        assert!((c.area() - 0.0).abs() < 1e-12);
    }

    #[test]
    fn empty_mask_produces_no_contours() {
        assert!(trace(&GrayImage::new(0, 0)).is_empty());
        assert!(trace(&GrayImage::new(10, 10)).is_empty());
    }

    #[test]
    fn filled_rectangle_is_traced() {
        let mut mask = GrayImage::new(30, 30);
        for y in 5..25 {
            for x in 5..20 {
                mask.put_pixel(x, y, image::Luma([255]));
            }
        }
        let contours = trace(&mask);
        assert!(!contours.is_empty(), "expected a contour around the block");

        let largest = contours
            .iter()
            .max_by(|a, b| a.area().total_cmp(&b.area()));
        let area = largest.map_or(0.0, TracedContour::area);
        // Border following traces the outermost foreground pixels, so the
        // enclosed area is close to (but slightly under) the filled area.
        assert!(
            (200.0..=300.0).contains(&area),
            "unexpected traced area {area}",
        );
    }

    #[test]
    fn faint_nonzero_pixels_count_as_foreground() {
        // The mask arrives Gaussian-softened, so boundary pixels may hold
        // small values. They must still be traced.
        let mut mask = GrayImage::new(20, 20);
        for y in 4..16 {
            for x in 4..16 {
                mask.put_pixel(x, y, image::Luma([2]));
            }
        }
        assert!(!trace(&mask).is_empty());
    }
}
