//! Error types for the docr library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`] — **Fatal**: nothing usable can be produced for the
//!   document (unrecognisable bytes, container unreadable, bad config).
//!   Returned as `Err(ExtractError)` from the top-level `extract*`
//!   functions.
//!
//! * [`PageFailure`] — **Non-fatal**: a single page failed (bad page
//!   stream, degenerate raster, deadline hit) but other pages are fine.
//!   Stored inside [`crate::output::PageResult`] so callers can inspect
//!   partial success rather than losing the whole document to one bad
//!   page.
//!
//! Region-level recognition failures sit one level below [`PageFailure`]:
//! they are folded into the page as empty, zero-confidence spans and
//! tallied in [`crate::output::PageResult::failed_regions`], never raised.

use thiserror::Error;

/// All fatal errors returned by the docr library.
///
/// Page-level failures use [`PageFailure`] and are stored in
/// [`crate::output::PageResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input bytes are not a media kind the pipeline can decode.
    #[error("Unsupported document format: {detail}\nFirst bytes: {magic:?}")]
    UnsupportedFormat { detail: String, magic: [u8; 4] },

    /// The container was recognised but cannot be opened at all.
    ///
    /// A corrupt *page* inside an otherwise readable document is recorded
    /// as [`PageFailure::Rasterize`] instead.
    #[error("Corrupt document: {detail}")]
    CorruptDocument { detail: String },

    /// HTTP URL was syntactically valid but the download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The deadline expired before any page could be rasterised.
    ///
    /// Surfaced by the streaming API, which has no result envelope to
    /// carry a `failed` status; the eager API returns an empty `failed`
    /// [`crate::output::DocumentResult`] for the same condition.
    #[error("Extraction timed out after {secs}s before any page was rasterised")]
    Timeout { secs: u64 },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (panicked worker task, runtime failure).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure scoped to a single page.
///
/// Stored alongside [`crate::output::PageResult`] when a page fails; the
/// overall extraction continues. Serialisable because it travels inside
/// the result contract handed to the transport layer.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PageFailure {
    /// The page could not be rasterised (bad content stream etc.).
    #[error("Page {page}: rasterisation failed: {detail}")]
    Rasterize { page: usize, detail: String },

    /// The rasterised page is unusable (zero-area image).
    #[error("Page {page}: invalid image: {detail}")]
    InvalidImage { page: usize, detail: String },

    /// The detection capability failed for the whole page.
    #[error("Page {page}: text detection failed: {detail}")]
    Detection { page: usize, detail: String },

    /// The document deadline expired before this page finished.
    #[error("Page {page}: timed out after {secs}s")]
    Timeout { page: usize, secs: u64 },
}

impl PageFailure {
    /// 1-based index of the page this failure belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageFailure::Rasterize { page, .. }
            | PageFailure::InvalidImage { page, .. }
            | PageFailure::Detection { page, .. }
            | PageFailure::Timeout { page, .. } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_display() {
        let e = ExtractError::UnsupportedFormat {
            detail: "plain text".into(),
            magic: *b"Lore",
        };
        let msg = e.to_string();
        assert!(msg.contains("Unsupported"), "got: {msg}");
    }

    #[test]
    fn document_timeout_display() {
        let e = ExtractError::Timeout { secs: 30 };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn page_failure_reports_page() {
        let f = PageFailure::Rasterize {
            page: 2,
            detail: "bad stream".into(),
        };
        assert_eq!(f.page(), 2);
        assert!(f.to_string().contains("Page 2"));
    }

    #[test]
    fn timeout_display() {
        let f = PageFailure::Timeout { page: 7, secs: 30 };
        assert!(f.to_string().contains("30s"));
        assert_eq!(f.page(), 7);
    }

    #[test]
    fn page_failure_serialises_with_kind_tag() {
        let f = PageFailure::InvalidImage {
            page: 1,
            detail: "zero-area".into(),
        };
        let json = serde_json::to_string(&f).unwrap();
        assert!(json.contains("\"kind\":\"invalidImage\""), "got: {json}");
    }
}
