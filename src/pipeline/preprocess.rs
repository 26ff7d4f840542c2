//! Page preprocessing: normalise, deskew, denoise, resize.
//!
//! The output of this stage is a [`PreparedPage`] carrying two images and
//! the transforms that connect them to the original page:
//!
//! * `detect_input` — the denoised, resized image handed to the detection
//!   model, at most `detect_max_side` on its longest edge.
//! * `crop_source` — the full-resolution (deskewed) page that recognition
//!   crops are cut from, so small print is not transcribed from a shrunken
//!   image.
//!
//! `scale` and `rotation_deg` are recorded so detection polygons can be
//! mapped back into original-page space; downstream consumers never see
//! internal coordinates.
//!
//! ## Deskew policy
//!
//! The skew estimate uses a projection-profile search over a binarised
//! edge map: text rows of a well-aligned page produce a spiky horizontal
//! projection, so the candidate angle whose rotated projection has the
//! largest squared-sum wins. Rotation is only applied above
//! `deskew_min_angle` — rotating an already-straight page just smears
//! glyph edges.

use crate::config::ExtractConfig;
use crate::error::PageFailure;
use image::imageops::FilterType;
use image::{imageops, DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::filter::median_filter;
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::gradients::sobel_gradients;
use tracing::debug;

/// Longest edge of the downsampled image used for skew estimation.
const SKEW_ESTIMATE_SIDE: u32 = 512;

/// Skew search range, degrees either side of horizontal.
const SKEW_SEARCH_RANGE: f32 = 15.0;

/// A page transformed into the detector's input contract.
#[derive(Debug)]
pub struct PreparedPage {
    /// Detector input: denoised and resized to `detect_max_side`.
    pub detect_input: RgbImage,
    /// Full-resolution deskewed page; recognition crops come from here.
    pub crop_source: RgbImage,
    /// `detect_input` dimensions = `crop_source` dimensions × `scale`.
    pub scale: f32,
    /// Rotation applied to the page during deskew, in degrees.
    ///
    /// Mapping a point from `crop_source` space back to original-page
    /// space rotates it by `-rotation_deg` about the page center.
    pub rotation_deg: f32,
    /// Original page width in pixels.
    pub orig_width: u32,
    /// Original page height in pixels.
    pub orig_height: u32,
}

/// Transform a rasterised page into the detection stage's input contract.
///
/// Deterministic and free of shared state. Fails only for degenerate
/// input (zero-area image).
pub fn prepare(
    page: usize,
    image: &DynamicImage,
    config: &ExtractConfig,
) -> Result<PreparedPage, PageFailure> {
    let (orig_width, orig_height) = (image.width(), image.height());
    if orig_width == 0 || orig_height == 0 {
        return Err(PageFailure::InvalidImage {
            page,
            detail: "zero-area image".into(),
        });
    }

    // Colour-space normalisation: the rest of the pipeline works on RGB8.
    let mut rgb = image.to_rgb8();

    // Deskew, gated by the minimum-angle threshold.
    let mut rotation_deg = 0.0;
    if config.deskew {
        let skew = estimate_skew_degrees(&imageops::grayscale(&rgb));
        if skew.abs() >= config.deskew_min_angle {
            debug!("Page {}: correcting skew of {:.2} deg", page, skew);
            // rotate_about_center keeps the image dimensions; for the
            // small angles we correct here the corner clipping is
            // negligible.
            rgb = rotate_about_center(
                &rgb,
                (-skew).to_radians(),
                Interpolation::Bilinear,
                Rgb([255, 255, 255]),
            );
            rotation_deg = -skew;
        }
    }

    // Denoise. A 3x3 median knocks out scan speckle without blurring
    // glyph edges the way a gaussian would.
    let denoised = if config.denoise {
        median_filter(&rgb, 1, 1)
    } else {
        rgb.clone()
    };

    // Resize for the detector, recording the scale for back-mapping.
    // Only ever downscale: upscaling adds no information.
    let longest = orig_width.max(orig_height);
    let scale = if longest > config.detect_max_side {
        config.detect_max_side as f32 / longest as f32
    } else {
        1.0
    };
    let detect_input = if scale < 1.0 {
        let w = ((orig_width as f32 * scale).round() as u32).max(1);
        let h = ((orig_height as f32 * scale).round() as u32).max(1);
        imageops::resize(&denoised, w, h, FilterType::Triangle)
    } else {
        denoised
    };

    debug!(
        "Page {}: prepared {}x{} -> detect {}x{} (scale {:.3}, rotation {:.2} deg)",
        page,
        orig_width,
        orig_height,
        detect_input.width(),
        detect_input.height(),
        scale,
        rotation_deg
    );

    Ok(PreparedPage {
        detect_input,
        crop_source: rgb,
        scale,
        rotation_deg,
        orig_width,
        orig_height,
    })
}

/// Estimate the dominant skew angle of page content, in degrees.
///
/// Positive values mean the text lines are rotated clockwise (in image
/// coordinates, y down) relative to horizontal. Returns 0.0 when there is
/// too little edge structure to trust an estimate.
pub fn estimate_skew_degrees(gray: &GrayImage) -> f32 {
    // Work on a small copy: skew is scale-invariant and the search below
    // is O(angles x edge points).
    let longest = gray.width().max(gray.height());
    let small = if longest > SKEW_ESTIMATE_SIDE {
        let s = SKEW_ESTIMATE_SIDE as f32 / longest as f32;
        imageops::resize(
            gray,
            ((gray.width() as f32 * s) as u32).max(1),
            ((gray.height() as f32 * s) as u32).max(1),
            FilterType::Triangle,
        )
    } else {
        gray.clone()
    };

    let points = edge_points(&small);
    if points.len() < 50 {
        return 0.0;
    }

    let cx = small.width() as f32 / 2.0;
    let cy = small.height() as f32 / 2.0;
    let bins = (small.width() + small.height()) as usize + 2;

    // Coarse pass at 1 degree, fine pass at 0.1 degree around the winner.
    let coarse = best_angle(&points, cx, cy, bins, -SKEW_SEARCH_RANGE, SKEW_SEARCH_RANGE, 1.0);
    best_angle(&points, cx, cy, bins, coarse - 1.0, coarse + 1.0, 0.1)
}

/// Collect edge-pixel coordinates from a sobel magnitude map.
fn edge_points(gray: &GrayImage) -> Vec<(f32, f32)> {
    let grads = sobel_gradients(gray);
    let mean: f64 = grads.pixels().map(|p| p.0[0] as f64).sum::<f64>()
        / (grads.width() as f64 * grads.height() as f64).max(1.0);
    let threshold = (mean * 2.0).max(32.0) as u16;

    let mut points = Vec::new();
    for (x, y, p) in grads.enumerate_pixels() {
        if p.0[0] > threshold {
            points.push((x as f32, y as f32));
        }
    }
    // Cap the point count so pathological pages stay cheap.
    if points.len() > 20_000 {
        let stride = points.len() / 20_000 + 1;
        points = points.into_iter().step_by(stride).collect();
    }
    points
}

/// Scan `[lo, hi]` in `step`-degree increments for the angle whose
/// unrotated row projection is spikiest.
fn best_angle(
    points: &[(f32, f32)],
    cx: f32,
    cy: f32,
    bins: usize,
    lo: f32,
    hi: f32,
    step: f32,
) -> f32 {
    let mut best = 0.0_f32;
    let mut best_score = f64::MIN;
    let mut angle = lo;
    while angle <= hi + step / 2.0 {
        let score = projection_score(points, cx, cy, bins, -angle.to_radians());
        if score > best_score {
            best_score = score;
            best = angle;
        }
        angle += step;
    }
    best
}

/// Sum of squared row-histogram counts after rotating points by `theta`.
///
/// Text lines collapse into a few dense rows when the rotation matches
/// the skew, maximising this score.
fn projection_score(points: &[(f32, f32)], cx: f32, cy: f32, bins: usize, theta: f32) -> f64 {
    let (sin, cos) = theta.sin_cos();
    let mut hist = vec![0u32; bins];
    let offset = bins as f32 / 2.0;
    for &(x, y) in points {
        let dx = x - cx;
        let dy = y - cy;
        let row = dx * sin + dy * cos + offset;
        if row >= 0.0 && (row as usize) < bins {
            hist[row as usize] += 1;
        }
    }
    hist.iter().map(|&c| (c as f64) * (c as f64)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn blank_page(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 255, 255])))
    }

    /// Horizontal dark bars on white, like lines of text.
    fn lined_page(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |_, y| {
            if y % 24 < 6 {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        })
    }

    #[test]
    fn zero_area_image_is_invalid() {
        let config = ExtractConfig::default();
        let img = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        let err = prepare(3, &img, &config).unwrap_err();
        assert!(matches!(err, PageFailure::InvalidImage { page: 3, .. }));
    }

    #[test]
    fn large_page_is_downscaled_with_recorded_scale() {
        let config = ExtractConfig::builder().detect_max_side(100).build().unwrap();
        let prepared = prepare(1, &blank_page(400, 200), &config).unwrap();
        assert_eq!(prepared.detect_input.width(), 100);
        assert_eq!(prepared.detect_input.height(), 50);
        assert!((prepared.scale - 0.25).abs() < 1e-4);
        // Crop source stays at full resolution.
        assert_eq!(prepared.crop_source.width(), 400);
    }

    #[test]
    fn small_page_keeps_unit_scale() {
        let config = ExtractConfig::default();
        let prepared = prepare(1, &blank_page(200, 100), &config).unwrap();
        assert_eq!(prepared.scale, 1.0);
        assert_eq!(prepared.detect_input.width(), 200);
    }

    #[test]
    fn blank_page_is_not_rotated() {
        // No edges at all: the estimator must bail out rather than invent
        // an angle from noise.
        let config = ExtractConfig::default();
        let prepared = prepare(1, &blank_page(300, 300), &config).unwrap();
        assert_eq!(prepared.rotation_deg, 0.0);
    }

    #[test]
    fn straight_lines_estimate_near_zero() {
        let angle = estimate_skew_degrees(&lined_page(320, 240));
        assert!(angle.abs() <= 0.5, "expected ~0, got {angle}");
    }

    #[test]
    fn prepare_is_deterministic() {
        let config = ExtractConfig::default();
        let page = blank_page(64, 48);
        let a = prepare(1, &page, &config).unwrap();
        let b = prepare(1, &page, &config).unwrap();
        assert_eq!(a.detect_input.as_raw(), b.detect_input.as_raw());
        assert_eq!(a.scale, b.scale);
        assert_eq!(a.rotation_deg, b.rotation_deg);
    }
}
