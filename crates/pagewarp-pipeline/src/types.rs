//! Shared types for the pagewarp scanning pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference masks and
/// binarized rasters without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference the decoded
/// photograph and the rectified color raster without depending on
/// `image` directly.
pub use image::RgbImage;

/// A 2D point in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from the left edge).
    pub x: f64,
    /// Vertical position (pixels from the top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// Four corner points in arbitrary order.
///
/// Produced by detection or supplied by a caller from hand-placed points.
/// Pass through [`crate::order::order_corners`] to obtain an
/// [`OrderedQuad`] before rectification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad([Point; 4]);

impl Quad {
    /// Quads with enclosed area below this are treated as degenerate.
    pub const DEGENERATE_AREA: f64 = 1e-6;

    /// Create a quad from four points in any order.
    #[must_use]
    pub const fn new(points: [Point; 4]) -> Self {
        Self(points)
    }

    /// The four corner points.
    #[must_use]
    pub const fn points(&self) -> &[Point; 4] {
        &self.0
    }

    /// Enclosed area via the shoelace formula.
    ///
    /// Depends on vertex order: a self-intersecting ordering of the same
    /// four points yields a smaller value than the simple polygon.
    #[must_use]
    pub fn area(&self) -> f64 {
        let p = &self.0;
        let mut acc = 0.0;
        for i in 0..4 {
            let j = (i + 1) % 4;
            acc += p[i].x.mul_add(p[j].y, -(p[j].x * p[i].y));
        }
        acc.abs() / 2.0
    }

    /// Whether the enclosed area is (near) zero.
    ///
    /// Collinear-corner cases that still enclose area are caught later by
    /// the homography construction, which has no solution for them.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.area() < Self::DEGENERATE_AREA
    }
}

/// A quad in canonical corner order: top-left, top-right, bottom-right,
/// bottom-left (clockwise).
///
/// Can only be constructed through [`crate::order::order_corners`], so a
/// value of this type carries the ordering invariant at compile time.
/// [`crate::rectify`] requires it; feeding corners in any other order
/// would silently produce a sheared or flipped result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderedQuad([Point; 4]);

impl OrderedQuad {
    /// Crate-internal constructor; `points` must already be in canonical
    /// TL, TR, BR, BL order.
    pub(crate) const fn from_canonical(points: [Point; 4]) -> Self {
        Self(points)
    }

    /// Top-left corner.
    #[must_use]
    pub const fn top_left(&self) -> Point {
        self.0[0]
    }

    /// Top-right corner.
    #[must_use]
    pub const fn top_right(&self) -> Point {
        self.0[1]
    }

    /// Bottom-right corner.
    #[must_use]
    pub const fn bottom_right(&self) -> Point {
        self.0[2]
    }

    /// Bottom-left corner.
    #[must_use]
    pub const fn bottom_left(&self) -> Point {
        self.0[3]
    }

    /// All four corners in canonical order.
    #[must_use]
    pub const fn points(&self) -> &[Point; 4] {
        &self.0
    }

    /// View as an order-agnostic [`Quad`].
    #[must_use]
    pub const fn as_quad(&self) -> Quad {
        Quad(self.0)
    }
}

/// How a detected quadrilateral was obtained.
///
/// The min-area-rect fallback is explicitly coarser than a contour fit
/// and may not hug the true document edges, so callers can use this tag
/// to decide whether to trust the result or ask for manual corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionKind {
    /// A traced contour simplified to a convex quadrilateral.
    ConvexContour,
    /// Minimum-area rotated bounding rectangle of the largest contour.
    MinAreaRect,
    /// Corners supplied by the caller, canonicalized but not detected.
    Manual,
}

/// Result of document-boundary detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// The detected corner points, in no particular order.
    pub quad: Quad,
    /// How the quad was obtained.
    pub kind: DetectionKind,
}

/// How the rectified canvas size is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RectifyPolicy {
    /// Fixed height with a fixed width/height ratio, independent of the
    /// quad. The default is an ISO A-series page at 842 px height.
    FixedAspect {
        /// Output canvas height in pixels. Must be positive.
        target_height: u32,
        /// Output width/height ratio. Must be positive.
        aspect_ratio: f64,
    },
    /// Canvas size computed from the quad's own edge lengths:
    /// width from the longer of the two horizontal edges, height from
    /// the longer of the two vertical edges.
    DerivedFromQuad,
}

impl RectifyPolicy {
    /// Default fixed-aspect output height (A-series page at ~72 dpi).
    pub const DEFAULT_TARGET_HEIGHT: u32 = 842;
    /// Default width/height ratio (210:297, ISO A series).
    pub const DEFAULT_ASPECT_RATIO: f64 = 210.0 / 297.0;
}

impl Default for RectifyPolicy {
    fn default() -> Self {
        Self::FixedAspect {
            target_height: Self::DEFAULT_TARGET_HEIGHT,
            aspect_ratio: Self::DEFAULT_ASPECT_RATIO,
        }
    }
}

/// Configuration for the scanning pipeline.
///
/// All parameters default to the values tuned for photographed A-series
/// documents; see the associated `DEFAULT_*` constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Bilateral filter window size in pixels.
    pub bilateral_window: u32,

    /// Bilateral filter range (intensity) sigma.
    pub bilateral_sigma_color: f32,

    /// Bilateral filter spatial sigma.
    pub bilateral_sigma_spatial: f32,

    /// Fraction around the median intensity used to derive the Canny
    /// thresholds: `low = (1 - f) * median`, `high = (1 + f) * median`.
    pub median_fraction: f64,

    /// Chebyshev radius of the square structuring element used to close
    /// gaps in the edge mask (2 gives a 5x5 square).
    pub closing_radius: u8,

    /// Sigma of the light Gaussian pass applied to the closed edge mask
    /// to soften staircase artifacts before contour tracing.
    pub mask_blur_sigma: f32,

    /// Contours with enclosed area below this (px^2) are noise, not
    /// document candidates.
    pub min_contour_area: f64,

    /// Polygon-approximation tolerance as a fraction of the contour
    /// perimeter.
    pub approx_epsilon_frac: f64,

    /// Number of CLAHE tiles along each axis.
    pub clahe_grid: u32,

    /// CLAHE histogram clip limit (multiple of the uniform bin count).
    pub clahe_clip_limit: f64,

    /// Side length of the neighborhood used for adaptive thresholding.
    pub threshold_block_size: u32,

    /// Constant subtracted from the local weighted mean before
    /// thresholding.
    pub threshold_bias: i16,

    /// How the rectified canvas size is chosen.
    pub policy: RectifyPolicy,
}

impl ScanConfig {
    /// Default bilateral filter window size.
    pub const DEFAULT_BILATERAL_WINDOW: u32 = 9;
    /// Default bilateral range sigma.
    pub const DEFAULT_BILATERAL_SIGMA_COLOR: f32 = 75.0;
    /// Default bilateral spatial sigma.
    pub const DEFAULT_BILATERAL_SIGMA_SPATIAL: f32 = 75.0;
    /// Default median fraction for adaptive Canny thresholds.
    pub const DEFAULT_MEDIAN_FRACTION: f64 = 0.33;
    /// Default closing radius (5x5 square element).
    pub const DEFAULT_CLOSING_RADIUS: u8 = 2;
    /// Default mask-softening sigma (approximates a 3x3 Gaussian).
    pub const DEFAULT_MASK_BLUR_SIGMA: f32 = 0.8;
    /// Default minimum candidate contour area in px^2.
    pub const DEFAULT_MIN_CONTOUR_AREA: f64 = 1000.0;
    /// Default approximation tolerance (2% of perimeter).
    pub const DEFAULT_APPROX_EPSILON_FRAC: f64 = 0.02;
    /// Default CLAHE tile grid (8x8).
    pub const DEFAULT_CLAHE_GRID: u32 = 8;
    /// Default CLAHE clip limit.
    pub const DEFAULT_CLAHE_CLIP_LIMIT: f64 = 2.0;
    /// Default adaptive-threshold neighborhood side length.
    pub const DEFAULT_THRESHOLD_BLOCK_SIZE: u32 = 15;
    /// Default adaptive-threshold bias.
    pub const DEFAULT_THRESHOLD_BIAS: i16 = 10;
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            bilateral_window: Self::DEFAULT_BILATERAL_WINDOW,
            bilateral_sigma_color: Self::DEFAULT_BILATERAL_SIGMA_COLOR,
            bilateral_sigma_spatial: Self::DEFAULT_BILATERAL_SIGMA_SPATIAL,
            median_fraction: Self::DEFAULT_MEDIAN_FRACTION,
            closing_radius: Self::DEFAULT_CLOSING_RADIUS,
            mask_blur_sigma: Self::DEFAULT_MASK_BLUR_SIGMA,
            min_contour_area: Self::DEFAULT_MIN_CONTOUR_AREA,
            approx_epsilon_frac: Self::DEFAULT_APPROX_EPSILON_FRAC,
            clahe_grid: Self::DEFAULT_CLAHE_GRID,
            clahe_clip_limit: Self::DEFAULT_CLAHE_CLIP_LIMIT,
            threshold_block_size: Self::DEFAULT_THRESHOLD_BLOCK_SIZE,
            threshold_bias: Self::DEFAULT_THRESHOLD_BIAS,
            policy: RectifyPolicy::default(),
        }
    }
}

/// Result of running the full scanning pipeline.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// The document corners used for rectification, in canonical order.
    pub corners: OrderedQuad,

    /// How the corners were obtained.
    pub kind: DetectionKind,

    /// Rectified color raster at the canvas size chosen by the policy.
    pub rectified: RgbImage,

    /// Binarized "scanned" raster, same size as `rectified`, with every
    /// pixel either 0 or 255.
    pub binarized: GrayImage,
}

/// Errors that can occur during scanning.
///
/// Every failure is local and terminal for a single pipeline invocation;
/// nothing is retried. Callers branch on the variant to decide whether to
/// keep previous state, prompt for manual corners, or skip rectification.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The input image has zero width or height.
    #[error("input image is empty")]
    EmptyInput,

    /// No contour exceeded the minimum-area threshold.
    #[error("no document contour found above the minimum area")]
    QuadNotFound,

    /// The quad has near-zero area or collinear corners, so no
    /// well-conditioned perspective transform exists.
    #[error("quadrilateral is degenerate (near-zero area or collinear corners)")]
    DegenerateQuad,

    /// A rectify policy with a non-positive height or aspect ratio.
    #[error("invalid rectify policy: {0}")]
    InvalidPolicy(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-12);
        assert!((a.distance_squared(b) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn quad_area_unit_square() {
        let q = Quad::new([
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ]);
        assert!((q.area() - 1.0).abs() < 1e-12);
        assert!(!q.is_degenerate());
    }

    #[test]
    fn quad_area_is_winding_independent() {
        let cw = Quad::new([
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 2.0),
            Point::new(0.0, 2.0),
        ]);
        let ccw = Quad::new([
            Point::new(0.0, 0.0),
            Point::new(0.0, 2.0),
            Point::new(4.0, 2.0),
            Point::new(4.0, 0.0),
        ]);
        assert!((cw.area() - ccw.area()).abs() < 1e-12);
        assert!((cw.area() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn collinear_quad_is_degenerate() {
        let q = Quad::new([
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
            Point::new(3.0, 3.0),
        ]);
        assert!(q.is_degenerate());
    }

    #[test]
    fn config_defaults_match_constants() {
        let config = ScanConfig::default();
        assert_eq!(config.bilateral_window, ScanConfig::DEFAULT_BILATERAL_WINDOW);
        assert!(
            (config.min_contour_area - ScanConfig::DEFAULT_MIN_CONTOUR_AREA).abs() < f64::EPSILON
        );
        assert_eq!(
            config.policy,
            RectifyPolicy::FixedAspect {
                target_height: 842,
                aspect_ratio: 210.0 / 297.0,
            }
        );
    }

    #[test]
    fn config_serde_round_trip() {
        let config = ScanConfig {
            clahe_grid: 4,
            policy: RectifyPolicy::DerivedFromQuad,
            ..ScanConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: ScanConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn detection_kind_distinguishes_fallback() {
        assert_ne!(DetectionKind::ConvexContour, DetectionKind::MinAreaRect);
        assert_ne!(DetectionKind::ConvexContour, DetectionKind::Manual);
    }
}
