//! Perspective rectification: flatten an ordered quad onto a canvas.
//!
//! Builds the unique projective transform taking the quad's corners to
//! the canvas corners `(0,0), (w-1,0), (w-1,h-1), (0,h-1)`, the same
//! TL, TR, BR, BL order [`OrderedQuad`] guarantees, then resamples the
//! source through the inverse mapping with bilinear interpolation via
//! [`imageproc::geometric_transformations::warp_into`]. Locations that
//! fall outside the source are filled with black.

use image::{GrayImage, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};

use crate::types::{OrderedQuad, RectifyPolicy, ScanError};

/// Determine the output canvas size for a quad under a policy.
///
/// # Errors
///
/// Returns [`ScanError::InvalidPolicy`] for a non-positive target height
/// or aspect ratio.
pub fn canvas_size(quad: &OrderedQuad, policy: RectifyPolicy) -> Result<(u32, u32), ScanError> {
    match policy {
        RectifyPolicy::FixedAspect {
            target_height,
            aspect_ratio,
        } => {
            if target_height == 0 {
                return Err(ScanError::InvalidPolicy(
                    "target height must be positive".into(),
                ));
            }
            if aspect_ratio <= 0.0 || !aspect_ratio.is_finite() {
                return Err(ScanError::InvalidPolicy(format!(
                    "aspect ratio must be positive and finite, got {aspect_ratio}",
                )));
            }
            let width = (f64::from(target_height) * aspect_ratio).round().max(1.0);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let width = width as u32;
            Ok((width, target_height))
        }
        RectifyPolicy::DerivedFromQuad => {
            let top = quad.top_left().distance(quad.top_right());
            let bottom = quad.bottom_left().distance(quad.bottom_right());
            let left = quad.top_left().distance(quad.bottom_left());
            let right = quad.top_right().distance(quad.bottom_right());
            let width = top.max(bottom).round().max(1.0);
            let height = left.max(right).round().max(1.0);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let (width, height) = (width as u32, height as u32);
            Ok((width, height))
        }
    }
}

/// Rectify a color image.
///
/// # Errors
///
/// [`ScanError::EmptyInput`] for a zero-sized image,
/// [`ScanError::DegenerateQuad`] when the quad encloses (near) zero area
/// or has collinear corners, [`ScanError::InvalidPolicy`] per
/// [`canvas_size`].
pub fn rectify_rgb(
    image: &RgbImage,
    quad: &OrderedQuad,
    policy: RectifyPolicy,
) -> Result<RgbImage, ScanError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ScanError::EmptyInput);
    }
    let (width, height) = canvas_size(quad, policy)?;
    let projection = projection_to_canvas(quad, width, height)?;
    let mut out = RgbImage::new(width, height);
    warp_into(
        image,
        &projection,
        Interpolation::Bilinear,
        image::Rgb([0, 0, 0]),
        &mut out,
    );
    Ok(out)
}

/// Rectify a single-channel intensity image.
///
/// # Errors
///
/// Same as [`rectify_rgb`].
pub fn rectify_gray(
    image: &GrayImage,
    quad: &OrderedQuad,
    policy: RectifyPolicy,
) -> Result<GrayImage, ScanError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ScanError::EmptyInput);
    }
    let (width, height) = canvas_size(quad, policy)?;
    let projection = projection_to_canvas(quad, width, height)?;
    let mut out = GrayImage::new(width, height);
    warp_into(
        image,
        &projection,
        Interpolation::Bilinear,
        image::Luma([0]),
        &mut out,
    );
    Ok(out)
}

/// Homography from the quad corners to the canvas rectangle corners.
#[allow(clippy::cast_possible_truncation)]
fn projection_to_canvas(
    quad: &OrderedQuad,
    width: u32,
    height: u32,
) -> Result<Projection, ScanError> {
    if quad.as_quad().is_degenerate() {
        return Err(ScanError::DegenerateQuad);
    }

    let corner = |p: crate::types::Point| (p.x as f32, p.y as f32);
    let src = [
        corner(quad.top_left()),
        corner(quad.top_right()),
        corner(quad.bottom_right()),
        corner(quad.bottom_left()),
    ];
    #[allow(clippy::cast_precision_loss)]
    let (w, h) = ((width - 1) as f32, (height - 1) as f32);
    let dst = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];

    // No solution exists when three corners are collinear; that is a
    // degenerate quad even if its shoelace area is nonzero.
    Projection::from_control_points(src, dst).ok_or(ScanError::DegenerateQuad)
}
