//! Output types for document extraction.
//!
//! [`DocumentResult`] is the stable contract the transport layer
//! serialises into response bodies: ordered pages, each an ordered list of
//! `{text, confidence, boundingPolygon}` spans, plus a document-level
//! confidence and status. Field names and nesting are part of the API;
//! changing them requires a version bump.

use crate::error::PageFailure;
use crate::geometry::Polygon;
use serde::{Deserialize, Serialize};

/// One recognised text span on a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSpan {
    /// Recognised text. Empty for a region whose recognition failed.
    pub text: String,
    /// Recognition confidence in [0, 1]. Zero for a failed region.
    pub confidence: f32,
    /// Bounding polygon in original-page pixel space.
    pub bounding_polygon: Polygon,
}

/// The extraction result for a single page.
///
/// Spans are in reading order (top-to-bottom, left-to-right within a line
/// band). A page that failed carries an empty span list, zero confidence
/// and a [`PageFailure`]; a page that merely contained no text carries an
/// empty span list and no failure (see [`is_blank`](PageResult::is_blank)).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    /// 1-based page index; document order is authoritative.
    pub page: usize,
    /// Recognised spans in reading order.
    pub spans: Vec<TextSpan>,
    /// Arithmetic mean of span confidences; 0 when there are no spans.
    pub confidence: f32,
    /// Regions whose recognition failed and were folded into empty spans.
    pub failed_regions: usize,
    /// Set when the page as a whole failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<PageFailure>,
}

impl PageResult {
    /// A page that failed before producing any spans.
    pub fn failed(page: usize, failure: PageFailure) -> Self {
        Self {
            page,
            spans: Vec::new(),
            confidence: 0.0,
            failed_regions: 0,
            failure: Some(failure),
        }
    }

    /// True for a page that was processed successfully but held no text.
    ///
    /// Distinct from a failed page: a blank page counts as success for the
    /// document status and is excluded from the document confidence mean.
    pub fn is_blank(&self) -> bool {
        self.spans.is_empty() && self.failure.is_none()
    }

    /// True when the page produced at least one span or was legitimately
    /// blank.
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Concatenated span text, one span per line, in reading order.
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Overall outcome of a document extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Every page succeeded (with text or legitimately blank).
    Complete,
    /// At least one page failed or was cut off by the deadline.
    Partial,
    /// No page produced anything usable.
    Failed,
}

/// The extraction result for a whole document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResult {
    /// Per-page results in document order, one entry per discovered page.
    pub pages: Vec<PageResult>,
    /// Mean of page confidences, excluding blank pages.
    pub confidence: f32,
    /// Aggregate status per the partial-failure policy.
    pub status: DocumentStatus,
}

impl DocumentResult {
    /// Number of pages that failed.
    pub fn failed_pages(&self) -> usize {
        self.pages.iter().filter(|p| !p.is_success()).count()
    }

    /// Serialise to the JSON response-body shape.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;

    fn span(text: &str, confidence: f32) -> TextSpan {
        TextSpan {
            text: text.into(),
            confidence,
            bounding_polygon: Polygon::from_rect(0.0, 0.0, 10.0, 10.0),
        }
    }

    #[test]
    fn blank_vs_failed_pages_are_distinct() {
        let blank = PageResult {
            page: 1,
            spans: Vec::new(),
            confidence: 0.0,
            failed_regions: 0,
            failure: None,
        };
        let failed = PageResult::failed(
            2,
            PageFailure::Rasterize {
                page: 2,
                detail: "bad stream".into(),
            },
        );
        assert!(blank.is_blank());
        assert!(blank.is_success());
        assert!(!failed.is_blank());
        assert!(!failed.is_success());
    }

    #[test]
    fn page_text_joins_spans_in_order() {
        let page = PageResult {
            page: 1,
            spans: vec![span("first", 0.9), span("second", 0.8)],
            confidence: 0.85,
            failed_regions: 0,
            failure: None,
        };
        assert_eq!(page.text(), "first\nsecond");
    }

    #[test]
    fn json_contract_field_names() {
        let doc = DocumentResult {
            pages: vec![PageResult {
                page: 1,
                spans: vec![span("hello", 0.9)],
                confidence: 0.9,
                failed_regions: 0,
                failure: None,
            }],
            confidence: 0.9,
            status: DocumentStatus::Complete,
        };
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"boundingPolygon\""), "got: {json}");
        assert!(json.contains("\"failedRegions\""), "got: {json}");
        assert!(json.contains("\"status\":\"complete\""), "got: {json}");
        // Successful pages must not carry a failure field at all.
        assert!(!json.contains("\"failure\""), "got: {json}");
    }

    #[test]
    fn json_round_trips() {
        let doc = DocumentResult {
            pages: vec![PageResult::failed(
                1,
                PageFailure::Timeout { page: 1, secs: 10 },
            )],
            confidence: 0.0,
            status: DocumentStatus::Partial,
        };
        let json = doc.to_json().unwrap();
        let back: DocumentResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.status, DocumentStatus::Partial);
        assert_eq!(back.failed_pages(), 1);
    }
}
