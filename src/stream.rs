//! Streaming extraction API: emit pages as they complete.
//!
//! ## Why stream?
//!
//! Large scanned documents take a while under a bounded worker pool. A
//! streams-based API lets callers display partial results immediately,
//! wire up progress bars, or persist pages incrementally instead of
//! waiting for the whole [`crate::output::DocumentResult`].
//!
//! Unlike the eager [`crate::extract::extract`], [`extract_stream`]
//! yields [`PageResult`] items as each page finishes. Pages arrive in
//! completion order, not page order — sort by `page` if order matters.
//! Failed pages are yielded too, carrying their failure marker, so the
//! stream always produces exactly one item per page.

use crate::config::ExtractConfig;
use crate::engine::OcrBackend;
use crate::error::ExtractError;
use crate::extract::process_page_with_deadline;
use crate::output::PageResult;
use crate::pipeline::{input, raster};
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::Stream;
use tracing::{info, warn};

/// A boxed stream of page results.
pub type PageStream = Pin<Box<dyn Stream<Item = PageResult> + Send>>;

/// Extract a document, streaming pages as they are ready.
///
/// Rasterisation still happens up front (the page count has to be known
/// before work can fan out), then page work runs with the same bounded
/// concurrency and deadline as the eager path.
///
/// # Returns
/// - `Ok(PageStream)` — one [`PageResult`] per page, completion order
/// - `Err(ExtractError)` — document-scoped failure (unsupported format,
///   unopenable container, or [`ExtractError::Timeout`] when the deadline
///   expires before any page was rasterised)
pub async fn extract_stream(
    bytes: &[u8],
    media_hint: Option<&str>,
    backend: Arc<dyn OcrBackend>,
    config: &ExtractConfig,
) -> Result<PageStream, ExtractError> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(config.timeout_secs);

    let kind = input::sniff_media_kind(bytes, media_hint)?;
    info!("Starting streaming extraction: {:?}, {} bytes", kind, bytes.len());

    // A stream has no status field, so a pre-raster timeout is a hard
    // error here rather than an empty stream a caller could mistake for a
    // zero-page document.
    if tokio::time::Instant::now() >= deadline {
        return Err(ExtractError::Timeout {
            secs: config.timeout_secs,
        });
    }
    let raster_pages =
        match tokio::time::timeout_at(deadline, raster::rasterize(bytes.to_vec(), kind, config))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!("Streaming extraction timed out during rasterisation");
                return Err(ExtractError::Timeout {
                    secs: config.timeout_secs,
                });
            }
        };

    let total_pages = raster_pages.len();
    if let Some(ref cb) = config.progress {
        cb.on_extract_start(total_pages);
    }

    let config = config.clone();
    let concurrency = config.max_concurrent_pages;
    let s = stream::iter(raster_pages.into_iter().map(move |raster_page| {
        let backend = Arc::clone(&backend);
        let config = config.clone();
        async move {
            let page_num = raster_page.index;
            if let Some(ref cb) = config.progress {
                cb.on_page_start(page_num, total_pages);
            }

            let result = match raster_page.image {
                Err(failure) => PageResult::failed(page_num, failure),
                Ok(image) => {
                    process_page_with_deadline(page_num, image, backend, &config, deadline).await
                }
            };

            if let Some(ref cb) = config.progress {
                match &result.failure {
                    None => cb.on_page_complete(page_num, total_pages, result.spans.len()),
                    Some(f) => cb.on_page_error(page_num, total_pages, &f.to_string()),
                }
            }
            result
        }
    }))
    .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}
