//! Edge-preserving smoothing before edge detection.
//!
//! Wraps [`imageproc::filter::bilateral_filter`]: averages each pixel
//! with neighbors that are close both spatially and in intensity, so
//! sensor noise is flattened while the sharp document boundary survives.
//! A plain Gaussian blur would soften the boundary the contour search
//! depends on.

use image::GrayImage;

/// Apply an edge-preserving bilateral filter.
///
/// `window` is the side length of the square neighborhood;
/// `sigma_color` controls how quickly influence falls off with intensity
/// difference, `sigma_spatial` with distance. A zero `window` or an
/// empty image returns the input unchanged.
#[must_use = "returns the smoothed image"]
pub fn bilateral(image: &GrayImage, window: u32, sigma_color: f32, sigma_spatial: f32) -> GrayImage {
    if window == 0 || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }

    imageproc::filter::bilateral_filter(image, window, sigma_color, sigma_spatial)
}
