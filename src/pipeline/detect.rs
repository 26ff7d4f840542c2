//! Text region detection: a thin wrapper over the opaque detection
//! capability plus the coordinate bookkeeping around it.
//!
//! The backend sees only the resized detector input; everything it
//! reports is mapped back through the recorded preprocessing transforms so
//! that regions carry two polygons:
//!
//! * `page_polygon` — original-page pixel space, the one that appears in
//!   results,
//! * `crop_polygon` — `crop_source` (deskewed, full-resolution) space,
//!   used to cut the recognition crop.

use crate::config::ExtractConfig;
use crate::engine::OcrBackend;
use crate::error::PageFailure;
use crate::geometry::Polygon;
use crate::pipeline::preprocess::PreparedPage;
use tracing::debug;

/// A detected region with polygons for both coordinate spaces.
#[derive(Debug, Clone)]
pub struct Region {
    /// Polygon in original-page pixel space.
    pub page_polygon: Polygon,
    /// Polygon in `crop_source` space.
    pub crop_polygon: Polygon,
    /// Detector confidence in [0, 1].
    pub confidence: f32,
}

/// Run detection on a prepared page and map regions to page space.
///
/// Regions below `min_detection_confidence` are dropped here, before any
/// recognition work is spent on them. An empty page yields an empty vec.
pub fn detect_regions(
    page: usize,
    backend: &dyn OcrBackend,
    prepared: &PreparedPage,
    config: &ExtractConfig,
) -> Result<Vec<Region>, PageFailure> {
    let detections = backend
        .detect(&prepared.detect_input)
        .map_err(|e| PageFailure::Detection {
            page,
            detail: e.to_string(),
        })?;

    let total = detections.len();
    let cx = prepared.orig_width as f32 / 2.0;
    let cy = prepared.orig_height as f32 / 2.0;
    let inverse_rotation = (-prepared.rotation_deg).to_radians();

    let regions: Vec<Region> = detections
        .into_iter()
        .filter(|d| d.confidence >= config.min_detection_confidence)
        .filter(|d| !d.polygon.is_empty())
        .map(|d| {
            // Detector space -> crop_source space: undo the resize.
            let crop_polygon = d.polygon.scaled(1.0 / prepared.scale);
            // crop_source space -> original-page space: undo the deskew
            // rotation, then clamp into the page bounds.
            let page_polygon = crop_polygon
                .rotated_about(cx, cy, inverse_rotation)
                .clamped(prepared.orig_width as f32, prepared.orig_height as f32);
            Region {
                page_polygon,
                crop_polygon,
                confidence: d.confidence.clamp(0.0, 1.0),
            }
        })
        .collect();

    debug!(
        "Page {}: {} detections, {} kept above threshold {:.2}",
        page,
        total,
        regions.len(),
        config.min_detection_confidence
    );

    Ok(regions)
}
