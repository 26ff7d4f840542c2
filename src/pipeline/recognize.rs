//! Region recognition: crop each detected region and transcribe it.
//!
//! Crops are cut from the full-resolution `crop_source`, not the shrunken
//! detector input, so the recogniser sees text at page resolution.
//!
//! ## Failure policy
//!
//! Recognition failures are region-scoped: a failed region becomes an
//! empty, zero-confidence span and is tallied, while the rest of the page
//! proceeds. Nothing here ever fails the page.

use crate::engine::OcrBackend;
use crate::geometry::Polygon;
use crate::output::TextSpan;
use crate::pipeline::detect::Region;
use image::{imageops, RgbImage};
use tracing::warn;

/// The recognised spans of one page plus the count of failed regions.
pub struct RecognizedPage {
    /// One span per region, unordered (the assembler orders them).
    pub spans: Vec<TextSpan>,
    /// Regions whose recognition call failed.
    pub failed_regions: usize,
}

/// Recognise every region of a page.
pub fn recognize_regions(
    page: usize,
    backend: &dyn OcrBackend,
    crop_source: &RgbImage,
    regions: &[Region],
) -> RecognizedPage {
    let mut spans = Vec::with_capacity(regions.len());
    let mut failed_regions = 0;

    for (region_idx, region) in regions.iter().enumerate() {
        let crop = crop_region(crop_source, &region.crop_polygon);
        match backend.recognize(&crop) {
            Ok(recognition) => spans.push(TextSpan {
                text: recognition.text,
                confidence: recognition.confidence.clamp(0.0, 1.0),
                bounding_polygon: region.page_polygon.clone(),
            }),
            Err(e) => {
                warn!("Page {} region {}: recognition failed: {}", page, region_idx, e);
                failed_regions += 1;
                spans.push(TextSpan {
                    text: String::new(),
                    confidence: 0.0,
                    bounding_polygon: region.page_polygon.clone(),
                });
            }
        }
    }

    RecognizedPage {
        spans,
        failed_regions,
    }
}

/// Cut the axis-aligned bounding rectangle of `polygon` out of `source`.
///
/// Coordinates are clamped to the image; a degenerate rectangle still
/// yields a 1x1 crop so the backend always receives a valid image.
fn crop_region(source: &RgbImage, polygon: &Polygon) -> RgbImage {
    let rect = polygon.bounding_rect();
    let max_x = source.width().saturating_sub(1);
    let max_y = source.height().saturating_sub(1);

    let x = (rect.x_min.floor().max(0.0) as u32).min(max_x);
    let y = (rect.y_min.floor().max(0.0) as u32).min(max_y);
    let w = ((rect.x_max.ceil() as u32).min(source.width()).saturating_sub(x)).max(1);
    let h = ((rect.y_max.ceil() as u32).min(source.height()).saturating_sub(y)).max(1);

    imageops::crop_imm(source, x, y, w, h).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BackendError, Detection, Recognition};
    use image::Rgb;

    /// Transcribes each crop as its dimensions; fails on 1x1 crops.
    struct SizeEcho;

    impl OcrBackend for SizeEcho {
        fn detect(&self, _image: &RgbImage) -> Result<Vec<Detection>, BackendError> {
            Ok(Vec::new())
        }

        fn recognize(&self, crop: &RgbImage) -> Result<Recognition, BackendError> {
            if crop.width() == 1 && crop.height() == 1 {
                return Err(BackendError::new("degenerate crop"));
            }
            Ok(Recognition {
                text: format!("{}x{}", crop.width(), crop.height()),
                confidence: 0.75,
            })
        }
    }

    fn region(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Region {
        let polygon = Polygon::from_rect(x_min, y_min, x_max, y_max);
        Region {
            page_polygon: polygon.clone(),
            crop_polygon: polygon,
            confidence: 0.9,
        }
    }

    #[test]
    fn crops_match_region_rects() {
        let source = RgbImage::from_pixel(200, 100, Rgb([255, 255, 255]));
        let regions = vec![region(10.0, 20.0, 60.0, 40.0)];
        let result = recognize_regions(1, &SizeEcho, &source, &regions);
        assert_eq!(result.failed_regions, 0);
        assert_eq!(result.spans.len(), 1);
        assert_eq!(result.spans[0].text, "50x20");
        assert_eq!(result.spans[0].confidence, 0.75);
    }

    #[test]
    fn out_of_bounds_region_is_clamped() {
        let source = RgbImage::from_pixel(50, 50, Rgb([255, 255, 255]));
        let regions = vec![region(40.0, 40.0, 90.0, 90.0)];
        let result = recognize_regions(1, &SizeEcho, &source, &regions);
        assert_eq!(result.spans[0].text, "10x10");
    }

    #[test]
    fn failed_region_becomes_empty_span_and_is_tallied() {
        let source = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
        let regions = vec![
            region(0.0, 0.0, 50.0, 20.0),
            // Degenerate region: SizeEcho fails on the resulting 1x1 crop.
            region(99.0, 99.0, 99.0, 99.0),
        ];
        let result = recognize_regions(1, &SizeEcho, &source, &regions);
        assert_eq!(result.spans.len(), 2, "failed region must still appear");
        assert_eq!(result.failed_regions, 1);
        assert_eq!(result.spans[1].text, "");
        assert_eq!(result.spans[1].confidence, 0.0);
    }
}
