//! Color-to-intensity conversion.
//!
//! The detection and enhancement stages operate on a single intensity
//! channel. This is the first step for any color input: `RgbImage` in,
//! `GrayImage` out, using the standard luminance weighting
//! `0.299*R + 0.587*G + 0.114*B`.

use image::{GrayImage, RgbImage};

/// Reduce a color image to a single intensity channel.
///
/// An empty input produces an empty output of the same (zero) size.
#[must_use = "returns the intensity image"]
pub fn to_intensity(image: &RgbImage) -> GrayImage {
    image::imageops::grayscale(image)
}
