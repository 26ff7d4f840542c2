//! Eager (full-document) extraction entry points.
//!
//! This is the orchestrator: it owns the end-to-end control flow,
//! concurrency limits, the overall deadline, and the partial-failure
//! policy. Rasterisation runs first so the page count is known, then
//! page-level work (preprocess → detect → recognize → assemble) fans out
//! with bounded concurrency. Results are collected by page index, so the
//! completion order of concurrent workers never leaks into the output
//! order.
//!
//! The orchestrator is reentrant: concurrent top-level `extract` calls may
//! share one backend, which is why the backend is an `Arc<dyn OcrBackend>`
//! and must be internally synchronised.

use crate::config::ExtractConfig;
use crate::engine::OcrBackend;
use crate::error::{ExtractError, PageFailure};
use crate::output::{DocumentResult, PageResult};
use crate::pipeline::raster::RasterPage;
use crate::pipeline::{assemble, detect, input, preprocess, raster, recognize};
use futures::stream::{self, StreamExt};
use image::DynamicImage;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Extract structured text from a document.
///
/// This is the primary entry point for the library. The transport layer
/// hands over the raw submitted bytes plus an optional media-kind hint
/// (extension or Content-Type) and serialises the returned
/// [`DocumentResult`].
///
/// # Returns
/// `Ok(DocumentResult)` whenever anything page-shaped could be attempted,
/// even if every page failed (check `result.status`).
///
/// # Errors
/// Returns `Err(ExtractError)` only for document-scoped structural
/// failures: bytes of an unsupported or undecodable format, or a PDF
/// container that cannot be opened at all.
pub async fn extract(
    bytes: &[u8],
    media_hint: Option<&str>,
    backend: Arc<dyn OcrBackend>,
    config: &ExtractConfig,
) -> Result<DocumentResult, ExtractError> {
    let start = Instant::now();
    let deadline = start + Duration::from_secs(config.timeout_secs);

    // ── Step 1: Sniff the media kind ─────────────────────────────────────
    let kind = input::sniff_media_kind(bytes, media_hint)?;
    info!("Starting extraction: {:?}, {} bytes", kind, bytes.len());

    // ── Step 2: Rasterise (discovers the page count) ─────────────────────
    let raster_pages =
        match tokio::time::timeout_at(deadline, raster::rasterize(bytes.to_vec(), kind, config))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                // Deadline hit before any page existed: nothing to keep.
                warn!("Extraction timed out during rasterisation");
                return Ok(assemble::assemble_document(Vec::new()));
            }
        };

    let total_pages = raster_pages.len();
    info!(
        "Rasterised {} pages in {}ms",
        total_pages,
        start.elapsed().as_millis()
    );
    if let Some(ref cb) = config.progress {
        cb.on_extract_start(total_pages);
    }

    // ── Step 3: Fan out page work under the deadline ─────────────────────
    let pages = process_pages(raster_pages, backend, config, deadline).await;

    // ── Step 4: Assemble the document ────────────────────────────────────
    let result = assemble::assemble_document(pages);
    let succeeded = result.pages.iter().filter(|p| p.is_success()).count();
    info!(
        "Extraction {:?}: {}/{} pages, confidence {:.3}, {}ms total",
        result.status,
        succeeded,
        total_pages,
        result.confidence,
        start.elapsed().as_millis()
    );
    if let Some(ref cb) = config.progress {
        cb.on_extract_complete(total_pages, succeeded);
    }

    Ok(result)
}

/// Download a document and extract it.
///
/// The original deployment accepted a `file_url` form field next to direct
/// uploads; this mirrors that path. The response Content-Type is used as
/// the media-kind hint.
pub async fn extract_url(
    url: &str,
    backend: Arc<dyn OcrBackend>,
    config: &ExtractConfig,
) -> Result<DocumentResult, ExtractError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.download_timeout_secs))
        .build()
        .map_err(|e| ExtractError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ExtractError::DownloadTimeout {
                url: url.to_string(),
                secs: config.download_timeout_secs,
            }
        } else {
            ExtractError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ExtractError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let hint = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ExtractError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    extract(&bytes, hint.as_deref(), backend, config).await
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a transient tokio runtime internally; do not call from inside
/// an async context.
pub fn extract_sync(
    bytes: &[u8],
    media_hint: Option<&str>,
    backend: Arc<dyn OcrBackend>,
    config: &ExtractConfig,
) -> Result<DocumentResult, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(extract(bytes, media_hint, backend, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Fan page work out over at most `max_concurrent_pages` workers, each
/// bounded by the document deadline.
///
/// Every input page yields exactly one [`PageResult`], failed or not; the
/// caller re-establishes document order by index.
pub(crate) async fn process_pages(
    raster_pages: Vec<RasterPage>,
    backend: Arc<dyn OcrBackend>,
    config: &ExtractConfig,
    deadline: Instant,
) -> Vec<PageResult> {
    let total_pages = raster_pages.len();
    stream::iter(raster_pages.into_iter().map(|raster_page| {
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
    .buffer_unordered(config.max_concurrent_pages)
    .collect()
    .await
}

/// Run one page's pipeline on the blocking pool, bounded by the deadline.
///
/// A page whose turn comes up after the deadline is failed without
/// spawning any work. On expiry mid-page the task is aborted: a blocking
/// task that has not started yet is cancelled outright, while one already
/// inside an inference call runs to completion on its pool thread and its
/// result is discarded.
pub(crate) async fn process_page_with_deadline(
    page_num: usize,
    image: DynamicImage,
    backend: Arc<dyn OcrBackend>,
    config: &ExtractConfig,
    deadline: Instant,
) -> PageResult {
    if Instant::now() >= deadline {
        warn!("Page {}: deadline expired before start", page_num);
        return PageResult::failed(
            page_num,
            PageFailure::Timeout {
                page: page_num,
                secs: config.timeout_secs,
            },
        );
    }

    let cfg = config.clone();
    let mut handle = tokio::task::spawn_blocking(move || {
        process_page_blocking(page_num, image, backend.as_ref(), &cfg)
    });

    match tokio::time::timeout_at(deadline, &mut handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => PageResult::failed(
            page_num,
            PageFailure::Detection {
                page: page_num,
                detail: format!("page worker panicked: {join_err}"),
            },
        ),
        Err(_) => {
            handle.abort();
            warn!("Page {}: deadline expired", page_num);
            PageResult::failed(
                page_num,
                PageFailure::Timeout {
                    page: page_num,
                    secs: config.timeout_secs,
                },
            )
        }
    }
}

/// The synchronous per-page pipeline: preprocess → detect → recognize →
/// assemble. Page-scoped failures become the page's failure marker.
fn process_page_blocking(
    page_num: usize,
    image: DynamicImage,
    backend: &dyn OcrBackend,
    config: &ExtractConfig,
) -> PageResult {
    let prepared = match preprocess::prepare(page_num, &image, config) {
        Ok(p) => p,
        Err(failure) => return PageResult::failed(page_num, failure),
    };

    let regions = match detect::detect_regions(page_num, backend, &prepared, config) {
        Ok(r) => r,
        Err(failure) => return PageResult::failed(page_num, failure),
    };

    let recognized =
        recognize::recognize_regions(page_num, backend, &prepared.crop_source, &regions);

    assemble::assemble_page(page_num, recognized)
}
