//! Preprocessing: intensity image to binary edge mask.
//!
//! Bilateral smoothing, median-adaptive Canny edge detection, a
//! morphological closing to bridge small gaps in the document boundary
//! (shadows, low contrast), and one light Gaussian pass to soften
//! staircase artifacts before contour tracing.

use image::GrayImage;
use imageproc::distance_transform::Norm;

use crate::smooth;
use crate::types::ScanConfig;

/// Minimum allowed Canny threshold.
///
/// On a near-black image the median is 0 and both adaptive thresholds
/// collapse to 0, which would classify every pixel as an edge. Clamping
/// keeps the hysteresis meaningful.
pub const MIN_CANNY_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_CANNY_THRESHOLD > 0.0);

/// Build a binary edge mask from an intensity image.
///
/// An empty input returns an empty mask; the function never fails.
/// Output pixels are nonzero where an edge (or its closed/softened
/// surroundings) was found.
///
/// The Canny thresholds adapt to overall image brightness:
/// `low = (1 - f) * median`, `high = (1 + f) * median` with `f` from
/// [`ScanConfig::median_fraction`], both clamped into `[1, 255]`.
/// The median is the exact histogram median of the smoothed image; its
/// statistical definition is a tunable heuristic, not a contract.
#[must_use = "returns the edge mask"]
pub fn edge_mask(intensity: &GrayImage, config: &ScanConfig) -> GrayImage {
    let (w, h) = intensity.dimensions();
    if w == 0 || h == 0 {
        return GrayImage::new(w, h);
    }

    let smoothed = smooth::bilateral(
        intensity,
        config.bilateral_window,
        config.bilateral_sigma_color,
        config.bilateral_sigma_spatial,
    );

    let median = f64::from(histogram_median(&smoothed));
    let (low, high) = canny_thresholds(median, config.median_fraction);
    let edges = imageproc::edges::canny(&smoothed, low, high);

    let closed = if config.closing_radius == 0 {
        edges
    } else {
        imageproc::morphology::close(&edges, Norm::LInf, config.closing_radius)
    };

    if config.mask_blur_sigma > 0.0 {
        imageproc::filter::gaussian_blur_f32(&closed, config.mask_blur_sigma)
    } else {
        closed
    }
}

/// Derive the Canny hysteresis thresholds from the median intensity.
fn canny_thresholds(median: f64, fraction: f64) -> (f32, f32) {
    let low = ((1.0 - fraction) * median).max(0.0);
    let high = ((1.0 + fraction) * median).min(255.0);
    #[allow(clippy::cast_possible_truncation)]
    let (low, high) = (low as f32, high as f32);
    let high = high.max(MIN_CANNY_THRESHOLD);
    let low = low.max(MIN_CANNY_THRESHOLD).min(high);
    (low, high)
}

/// Exact median intensity from the image histogram.
fn histogram_median(image: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[usize::from(pixel.0[0])] += 1;
    }

    let total: u64 = u64::from(image.width()) * u64::from(image.height());
    if total == 0 {
        return 128;
    }

    let half = total / 2;
    let mut seen = 0u64;
    for (value, &count) in histogram.iter().enumerate() {
        seen += count;
        if seen > half {
            #[allow(clippy::cast_possible_truncation)]
            return value as u8;
        }
    }
    255
}
