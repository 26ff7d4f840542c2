//! Result assembly: reading order, aggregate confidences, document status.
//!
//! ## Reading order
//!
//! Naive top-to-bottom sorting misorders regions that sit on the same
//! visual line but differ by a few pixels of detection noise. Spans are
//! therefore bucketed into **line bands** first — regions whose vertical
//! centers fall within a tolerance of each other are the same line — and
//! sorted left-to-right within each band. The tolerance is half the
//! median region height, so it adapts to the page's font size.

use crate::error::PageFailure;
use crate::output::{DocumentResult, DocumentStatus, PageResult, TextSpan};
use crate::pipeline::recognize::RecognizedPage;
use tracing::debug;

/// Merge the recognised spans of one page into a [`PageResult`] in
/// reading order.
///
/// A page with zero spans gets confidence 0 and is implicitly flagged
/// blank (no failure marker), distinct from a page that failed outright.
pub fn assemble_page(page: usize, recognized: RecognizedPage) -> PageResult {
    let spans = sort_reading_order(recognized.spans);

    let confidence = if spans.is_empty() {
        0.0
    } else {
        spans.iter().map(|s| s.confidence).sum::<f32>() / spans.len() as f32
    };

    debug!(
        "Page {}: {} spans, {} failed regions, confidence {:.3}",
        page,
        spans.len(),
        recognized.failed_regions,
        confidence
    );

    PageResult {
        page,
        spans,
        confidence: confidence.clamp(0.0, 1.0),
        failed_regions: recognized.failed_regions,
        failure: None,
    }
}

/// Merge per-page results into the final [`DocumentResult`].
///
/// Pages are ordered by index regardless of completion order. The document
/// confidence is the mean of page confidences with blank pages excluded,
/// so legitimately empty pages do not drag the score down; if every page
/// is blank or failed the confidence is 0.
pub fn assemble_document(mut pages: Vec<PageResult>) -> DocumentResult {
    pages.sort_by_key(|p| p.page);

    let scored: Vec<f32> = pages
        .iter()
        .filter(|p| !p.spans.is_empty())
        .map(|p| p.confidence)
        .collect();
    let confidence = if scored.is_empty() {
        0.0
    } else {
        scored.iter().sum::<f32>() / scored.len() as f32
    };

    let status = document_status(&pages);

    DocumentResult {
        pages,
        confidence: confidence.clamp(0.0, 1.0),
        status,
    }
}

/// The aggregate status per the partial-failure policy: `complete` when
/// every page succeeded (with text or legitimately blank), `partial` when
/// at least one page failed, `failed` when nothing succeeded at all.
fn document_status(pages: &[PageResult]) -> DocumentStatus {
    if pages.is_empty() || pages.iter().all(|p| !p.is_success()) {
        return DocumentStatus::Failed;
    }
    if pages.iter().any(|p| !p.is_success()) {
        return DocumentStatus::Partial;
    }
    DocumentStatus::Complete
}

/// Convenience for the orchestrator: a page that failed with `failure`.
pub fn failed_page(page: usize, failure: PageFailure) -> PageResult {
    PageResult::failed(page, failure)
}

/// Sort spans into reading order: line bands top-to-bottom, left-to-right
/// within a band.
fn sort_reading_order(spans: Vec<TextSpan>) -> Vec<TextSpan> {
    if spans.len() < 2 {
        return spans;
    }

    // Half the median region height adapts the band tolerance to the
    // page's font size; the floor guards against degenerate thin regions.
    let mut heights: Vec<f32> = spans
        .iter()
        .map(|s| s.bounding_polygon.bounding_rect().height())
        .collect();
    heights.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let tolerance = (heights[heights.len() / 2] / 2.0).max(1.0);

    let mut keyed: Vec<(usize, f32, f32, TextSpan)> = spans
        .into_iter()
        .map(|s| {
            let rect = s.bounding_polygon.bounding_rect();
            (0, rect.center_y(), rect.x_min, s)
        })
        .collect();
    keyed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    // Walk the y-sorted spans, starting a new band whenever the next
    // vertical center drifts past the tolerance from the running band
    // mean.
    let mut band = 0usize;
    let mut band_center = keyed[0].1;
    let mut band_sum = 0.0_f32;
    let mut band_len = 0u32;
    for entry in keyed.iter_mut() {
        if (entry.1 - band_center).abs() > tolerance {
            band += 1;
            band_sum = 0.0;
            band_len = 0;
        }
        entry.0 = band;
        band_sum += entry.1;
        band_len += 1;
        band_center = band_sum / band_len as f32;
    }

    // Bands top-to-bottom, x left-to-right within a band.
    keyed.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then(a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
    });
    keyed.into_iter().map(|(_, _, _, s)| s).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;

    fn span(text: &str, x_min: f32, y_min: f32, x_max: f32, y_max: f32, conf: f32) -> TextSpan {
        TextSpan {
            text: text.into(),
            confidence: conf,
            bounding_polygon: Polygon::from_rect(x_min, y_min, x_max, y_max),
        }
    }

    fn recognized(spans: Vec<TextSpan>, failed: usize) -> RecognizedPage {
        RecognizedPage {
            spans,
            failed_regions: failed,
        }
    }

    #[test]
    fn same_line_with_jitter_sorts_left_to_right() {
        // Three words on one visual line, vertical centers off by a few
        // pixels of detection noise. Naive y-sort would misorder them.
        let result = assemble_page(
            1,
            recognized(
                vec![
                    span("world", 120.0, 12.0, 200.0, 32.0, 0.9),
                    span("hello", 10.0, 14.0, 100.0, 34.0, 0.9),
                    span("again", 220.0, 10.0, 300.0, 30.0, 0.9),
                ],
                0,
            ),
        );
        assert_eq!(result.text(), "hello\nworld\nagain");
    }

    #[test]
    fn separate_lines_sort_top_to_bottom() {
        let result = assemble_page(
            1,
            recognized(
                vec![
                    span("third", 10.0, 100.0, 90.0, 120.0, 0.9),
                    span("first", 10.0, 10.0, 90.0, 30.0, 0.9),
                    span("second", 10.0, 55.0, 90.0, 75.0, 0.9),
                ],
                0,
            ),
        );
        assert_eq!(result.text(), "first\nsecond\nthird");
    }

    #[test]
    fn two_line_grid_reads_row_major() {
        let result = assemble_page(
            1,
            recognized(
                vec![
                    span("b", 100.0, 10.0, 180.0, 30.0, 0.9),
                    span("d", 100.0, 60.0, 180.0, 80.0, 0.9),
                    span("a", 10.0, 12.0, 90.0, 32.0, 0.9),
                    span("c", 10.0, 58.0, 90.0, 78.0, 0.9),
                ],
                0,
            ),
        );
        assert_eq!(result.text(), "a\nb\nc\nd");
    }

    #[test]
    fn page_confidence_is_mean_including_failed_regions() {
        let result = assemble_page(
            1,
            recognized(
                vec![
                    span("ok", 0.0, 0.0, 10.0, 10.0, 0.8),
                    // A failed region's empty span drags the mean down.
                    span("", 0.0, 20.0, 10.0, 30.0, 0.0),
                ],
                1,
            ),
        );
        assert!((result.confidence - 0.4).abs() < 1e-4);
        assert_eq!(result.failed_regions, 1);
        assert!(result.is_success());
    }

    #[test]
    fn empty_page_is_blank_with_zero_confidence() {
        let result = assemble_page(1, recognized(vec![], 0));
        assert!(result.is_blank());
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn document_confidence_excludes_blank_pages() {
        let with_text = assemble_page(
            1,
            recognized(vec![span("x", 0.0, 0.0, 10.0, 10.0, 0.6)], 0),
        );
        let blank = assemble_page(2, recognized(vec![], 0));
        let doc = assemble_document(vec![blank, with_text]);
        assert!((doc.confidence - 0.6).abs() < 1e-4);
        assert_eq!(doc.status, DocumentStatus::Complete);
        // Pages come back in document order even when passed shuffled.
        assert_eq!(doc.pages[0].page, 1);
        assert_eq!(doc.pages[1].page, 2);
    }

    #[test]
    fn all_blank_document_is_complete_with_zero_confidence() {
        let doc = assemble_document(vec![
            assemble_page(1, recognized(vec![], 0)),
            assemble_page(2, recognized(vec![], 0)),
        ]);
        assert_eq!(doc.confidence, 0.0);
        assert_eq!(doc.status, DocumentStatus::Complete);
    }

    #[test]
    fn one_failed_page_makes_document_partial() {
        let ok = assemble_page(
            1,
            recognized(vec![span("x", 0.0, 0.0, 10.0, 10.0, 0.9)], 0),
        );
        let bad = failed_page(
            2,
            PageFailure::Rasterize {
                page: 2,
                detail: "bad stream".into(),
            },
        );
        let doc = assemble_document(vec![ok, bad]);
        assert_eq!(doc.status, DocumentStatus::Partial);
        assert_eq!(doc.failed_pages(), 1);
        assert_eq!(doc.pages.len(), 2);
    }

    #[test]
    fn all_failed_or_empty_document_is_failed() {
        let doc = assemble_document(vec![failed_page(
            1,
            PageFailure::Timeout { page: 1, secs: 5 },
        )]);
        assert_eq!(doc.status, DocumentStatus::Failed);

        let empty = assemble_document(vec![]);
        assert_eq!(empty.status, DocumentStatus::Failed);
    }
}
