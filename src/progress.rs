//! Progress-callback trait for per-page extraction events.
//!
//! Inject an `Arc<dyn ExtractProgress>` via
//! [`crate::config::ExtractConfigBuilder::progress`] to receive real-time
//! events as the pipeline works through a document. The callback approach
//! keeps the library agnostic about how the host application communicates:
//! forward events to a channel, a WebSocket, or a log line as you see fit.
//!
//! Methods may be called concurrently from different worker tasks when
//! pages are processed in parallel; implementations must protect shared
//! mutable state accordingly.

/// Called by the extraction pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only
/// override what they care about.
pub trait ExtractProgress: Send + Sync {
    /// Called once after rasterisation, when the page count is known.
    fn on_extract_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page enters preprocessing.
    fn on_page_start(&self, page: usize, total_pages: usize) {
        let _ = (page, total_pages);
    }

    /// Called when a page finishes successfully.
    ///
    /// `span_count` is the number of recognised text spans on the page.
    fn on_page_complete(&self, page: usize, total_pages: usize, span_count: usize) {
        let _ = (page, total_pages, span_count);
    }

    /// Called when a page fails (rasterisation, detection, or deadline).
    fn on_page_error(&self, page: usize, total_pages: usize, error: &str) {
        let _ = (page, total_pages, error);
    }

    /// Called once after all pages have been attempted.
    fn on_extract_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl ExtractProgress for NoopProgress {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Tracking {
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl ExtractProgress for Tracking {
        fn on_page_complete(&self, _page: usize, _total: usize, _spans: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_error(&self, _page: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgress;
        cb.on_extract_start(3);
        cb.on_page_start(1, 3);
        cb.on_page_complete(1, 3, 12);
        cb.on_page_error(2, 3, "boom");
        cb.on_extract_complete(3, 2);
    }

    #[test]
    fn tracking_callback_counts_events() {
        let t = Arc::new(Tracking {
            completes: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        });
        let cb: Arc<dyn ExtractProgress> = t.clone();
        cb.on_page_complete(1, 2, 4);
        cb.on_page_error(2, 2, "deadline");
        assert_eq!(t.completes.load(Ordering::SeqCst), 1);
        assert_eq!(t.errors.load(Ordering::SeqCst), 1);
    }
}
