//! Scan-style enhancement: contrast-limited local equalization followed
//! by adaptive binarization.
//!
//! The result approximates the look of an ink-on-paper scan: lighting
//! gradients are flattened by tiled histogram equalization (with a clip
//! limit so flat regions do not have their noise amplified), then each
//! pixel is thresholded against a Gaussian-weighted local mean minus a
//! small bias.

use image::{GrayImage, RgbImage};

use crate::gray;
use crate::types::{ScanConfig, ScanError};

/// Binarize an intensity image into a black-and-white "scan".
///
/// Every output pixel is exactly 0 or 255.
///
/// # Errors
///
/// Returns [`ScanError::EmptyInput`] for a zero-sized image.
pub fn enhance(image: &GrayImage, config: &ScanConfig) -> Result<GrayImage, ScanError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ScanError::EmptyInput);
    }

    let equalized = clahe(image, config.clahe_grid.max(1), config.clahe_clip_limit);
    Ok(adaptive_threshold(
        &equalized,
        config.threshold_block_size,
        config.threshold_bias,
    ))
}

/// Like [`enhance`], reducing a color image to intensity first.
///
/// # Errors
///
/// Returns [`ScanError::EmptyInput`] for a zero-sized image.
pub fn enhance_rgb(image: &RgbImage, config: &ScanConfig) -> Result<GrayImage, ScanError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ScanError::EmptyInput);
    }
    enhance(&gray::to_intensity(image), config)
}

/// Contrast-limited adaptive histogram equalization.
///
/// The image is divided into a `grid` x `grid` tile grid. Each tile gets
/// a clipped-histogram equalization mapping; every pixel is then remapped
/// through a bilinear blend of the four surrounding tile mappings, which
/// hides the tile seams.
fn clahe(image: &GrayImage, grid: u32, clip_limit: f64) -> GrayImage {
    let (w, h) = image.dimensions();
    let tile_w = w.div_ceil(grid.min(w));
    let tile_h = h.div_ceil(grid.min(h));
    // Tight tile counts: the last row/column of tiles is never empty.
    let tiles_x = w.div_ceil(tile_w);
    let tiles_y = h.div_ceil(tile_h);

    let mut luts: Vec<[u8; 256]> = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(w);
            let y1 = (y0 + tile_h).min(h);
            luts.push(tile_lut(image, (x0, y0), (x1, y1), clip_limit));
        }
    }

    let lut_at = |tx: usize, ty: usize, value: u8| {
        f64::from(luts[ty * tiles_x as usize + tx][usize::from(value)])
    };
    let max_tx = (tiles_x - 1) as usize;
    let max_ty = (tiles_y - 1) as usize;

    GrayImage::from_fn(w, h, |x, y| {
        let value = image.get_pixel(x, y).0[0];

        // Position in tile-center coordinates; border pixels clamp to
        // the nearest tile instead of extrapolating.
        let fx = (f64::from(x) + 0.5) / f64::from(tile_w) - 0.5;
        let fy = (f64::from(y) + 0.5) / f64::from(tile_h) - 0.5;
        let wx = (fx - fx.floor()).clamp(0.0, 1.0);
        let wy = (fy - fy.floor()).clamp(0.0, 1.0);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let tx0 = fx.floor().max(0.0) as usize;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let ty0 = fy.floor().max(0.0) as usize;
        let tx0 = tx0.min(max_tx);
        let ty0 = ty0.min(max_ty);
        let tx1 = (tx0 + 1).min(max_tx);
        let ty1 = (ty0 + 1).min(max_ty);

        let top = lut_at(tx0, ty0, value).mul_add(1.0 - wx, lut_at(tx1, ty0, value) * wx);
        let bottom = lut_at(tx0, ty1, value).mul_add(1.0 - wx, lut_at(tx1, ty1, value) * wx);
        let blended = top.mul_add(1.0 - wy, bottom * wy);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = blended.round().clamp(0.0, 255.0) as u8;
        image::Luma([value])
    })
}

/// Equalization lookup table for one tile, histogram clipped at
/// `clip_limit` times the uniform bin height, excess redistributed
/// evenly.
fn tile_lut(image: &GrayImage, from: (u32, u32), to: (u32, u32), clip_limit: f64) -> [u8; 256] {
    let (x0, y0) = from;
    let (x1, y1) = to;
    let area = u64::from(x1 - x0) * u64::from(y1 - y0);
    if area == 0 {
        // Unreachable with tight tile counts, but an identity mapping is
        // the safe value.
        let mut identity = [0u8; 256];
        for (v, slot) in identity.iter_mut().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            {
                *slot = v as u8;
            }
        }
        return identity;
    }

    let mut histogram = [0.0f64; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            histogram[usize::from(image.get_pixel(x, y).0[0])] += 1.0;
        }
    }

    // Clip and spread the excess fractionally over every bin; integer
    // redistribution would dump small excesses into the low bins and
    // skew near-uniform tiles.
    #[allow(clippy::cast_precision_loss)]
    let area = area as f64;
    let limit = ((clip_limit * area) / 256.0).max(1.0);
    let mut excess = 0.0f64;
    for bin in &mut histogram {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }
    let bonus = excess / 256.0;
    for bin in &mut histogram {
        *bin += bonus;
    }

    let mut lut = [0u8; 256];
    let mut cumulative = 0.0f64;
    for (v, slot) in lut.iter_mut().enumerate() {
        cumulative += histogram[v];
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            *slot = ((255.0 * cumulative) / area).round().clamp(0.0, 255.0) as u8;
        }
    }
    lut
}

/// Per-pixel binarization against a Gaussian-weighted local mean minus a
/// constant bias.
///
/// The local mean is a Gaussian blur whose sigma is derived from the
/// neighborhood side length with the usual kernel-size-to-sigma rule,
/// so `block_size` is comparable to a 15x15 box window.
fn adaptive_threshold(image: &GrayImage, block_size: u32, bias: i16) -> GrayImage {
    #[allow(clippy::cast_precision_loss)]
    let sigma = 0.3f32 * ((block_size.max(3) - 1) as f32).mul_add(0.5, -1.0) + 0.8;
    let mean = imageproc::filter::gaussian_blur_f32(image, sigma.max(0.3));

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let value = i16::from(image.get_pixel(x, y).0[0]);
        let local = i16::from(mean.get_pixel(x, y).0[0]);
        if value > local - bias {
            image::Luma([255])
        } else {
            image::Luma([0])
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_rejected() {
        let result = enhance(&GrayImage::new(0, 0), &ScanConfig::default());
        assert!(matches!(result, Err(ScanError::EmptyInput)));
        let result = enhance_rgb(&RgbImage::new(0, 0), &ScanConfig::default());
        assert!(matches!(result, Err(ScanError::EmptyInput)));
    }

    #[test]
    fn output_is_strictly_two_valued() {
        let img = GrayImage::from_fn(64, 64, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            let value = ((x * 3 + y * 5) % 256) as u8;
            image::Luma([value])
        });
        let bw = enhance(&img, &ScanConfig::default()).unwrap();
        for pixel in bw.pixels() {
            assert!(
                pixel.0[0] == 0 || pixel.0[0] == 255,
                "non-binary value {}",
                pixel.0[0],
            );
        }
    }

    #[test]
    fn uniform_page_comes_out_white() {
        let img = GrayImage::from_pixel(40, 40, image::Luma([180]));
        let bw = enhance(&img, &ScanConfig::default()).unwrap();
        for pixel in bw.pixels() {
            assert_eq!(pixel.0[0], 255);
        }
    }

    #[test]
    fn dark_strokes_come_out_black_on_white() {
        // Bright page with a dark horizontal "text" stroke.
        let mut img = GrayImage::from_pixel(64, 64, image::Luma([210]));
        for x in 8..56 {
            for y in 30..33 {
                img.put_pixel(x, y, image::Luma([40]));
            }
        }
        let bw = enhance(&img, &ScanConfig::default()).unwrap();
        assert_eq!(bw.get_pixel(32, 31).0[0], 0, "stroke must be black");
        assert_eq!(bw.get_pixel(32, 5).0[0], 255, "page must be white");
    }

    #[test]
    fn enhance_rgb_matches_dimensions() {
        let img = RgbImage::from_pixel(30, 20, image::Rgb([200, 190, 180]));
        let bw = enhance_rgb(&img, &ScanConfig::default()).unwrap();
        assert_eq!(bw.dimensions(), (30, 20));
    }

    #[test]
    fn clahe_preserves_dimensions() {
        let img = GrayImage::from_pixel(37, 23, image::Luma([90]));
        let out = clahe(&img, 8, 2.0);
        assert_eq!(out.dimensions(), (37, 23));
    }

    #[test]
    fn clahe_expands_low_contrast_range() {
        let img = GrayImage::from_fn(64, 64, |x, _| {
            #[allow(clippy::cast_possible_truncation)]
            let value = (100 + x % 20) as u8;
            image::Luma([value])
        });
        let out = clahe(&img, 8, 2.0);
        let (before_min, before_max) = (100u8, 119u8);
        let after_min = out.pixels().map(|p| p.0[0]).min().unwrap();
        let after_max = out.pixels().map(|p| p.0[0]).max().unwrap();
        assert!(
            after_max - after_min > before_max - before_min,
            "expected contrast expansion, got {after_min}..{after_max}",
        );
    }

    #[test]
    fn clahe_keeps_uniform_image_near_its_value() {
        // Clipping redistributes a uniform histogram back to (almost)
        // an identity mapping.
        let img = GrayImage::from_pixel(64, 64, image::Luma([128]));
        let out = clahe(&img, 8, 2.0);
        for pixel in out.pixels() {
            let diff = i16::from(pixel.0[0]) - 128;
            assert!(diff.abs() <= 6, "uniform image drifted to {}", pixel.0[0]);
        }
    }

    #[test]
    fn adaptive_threshold_splits_a_step_edge() {
        let img = GrayImage::from_fn(40, 40, |x, _| {
            if x < 20 { image::Luma([60]) } else { image::Luma([200]) }
        });
        let bw = adaptive_threshold(&img, 15, 10);
        // Far from the step both sides are "locally uniform", hence white;
        // just left of the step the local mean is pulled up by the bright
        // side, pushing dark pixels below threshold.
        assert_eq!(bw.get_pixel(19, 20).0[0], 0);
        assert_eq!(bw.get_pixel(25, 20).0[0], 255);
    }
}
