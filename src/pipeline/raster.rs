//! Page rasterisation: decode a document into per-page raster images.
//!
//! PDFs go through pdfium; single raster images are decoded with the
//! `image` crate and yield exactly one page.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which uses thread-local
//! state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking thread
//! pool, preventing Tokio worker threads from stalling during CPU-heavy
//! rendering.
//!
//! ## Per-page failure policy
//!
//! A page that fails to render is recorded as a [`PageFailure::Rasterize`]
//! entry rather than aborting the document; the container-level open error
//! is the only fatal case here. This keeps the invariant that the final
//! result has one entry per discovered page.

use crate::config::ExtractConfig;
use crate::error::{ExtractError, PageFailure};
use crate::pipeline::input::MediaKind;
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, info, warn};

/// One rasterised (or failed) page, 1-based index.
#[derive(Debug)]
pub struct RasterPage {
    pub index: usize,
    pub image: Result<DynamicImage, PageFailure>,
}

/// Rasterise a document into its pages.
///
/// The returned vec has one entry per page the container declares, in
/// document order, whether or not each page rendered successfully.
///
/// # Errors
/// * [`ExtractError::UnsupportedFormat`] — raster bytes that do not decode
/// * [`ExtractError::CorruptDocument`] — a PDF container that cannot be
///   opened at all
pub async fn rasterize(
    bytes: Vec<u8>,
    kind: MediaKind,
    config: &ExtractConfig,
) -> Result<Vec<RasterPage>, ExtractError> {
    match kind {
        MediaKind::Pdf => {
            let dpi = config.dpi;
            let max_pixels = config.max_page_pixels;
            tokio::task::spawn_blocking(move || rasterize_pdf_blocking(&bytes, dpi, max_pixels))
                .await
                .map_err(|e| ExtractError::Internal(format!("Raster task panicked: {e}")))?
        }
        _ => decode_single_image(&bytes),
    }
}

/// Decode a single-image document into its one page.
fn decode_single_image(bytes: &[u8]) -> Result<Vec<RasterPage>, ExtractError> {
    let image = image::load_from_memory(bytes).map_err(|e| {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        ExtractError::UnsupportedFormat {
            detail: format!("image decode failed: {e}"),
            magic,
        }
    })?;
    debug!("Decoded raster input: {}x{} px", image.width(), image.height());
    Ok(vec![RasterPage {
        index: 1,
        image: Ok(image),
    }])
}

/// Blocking implementation of PDF rasterisation.
fn rasterize_pdf_blocking(
    bytes: &[u8],
    dpi: u32,
    max_pixels: u32,
) -> Result<Vec<RasterPage>, ExtractError> {
    let pdfium = Pdfium::default();

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| ExtractError::CorruptDocument {
            detail: format!("{e:?}"),
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let mut results = Vec::with_capacity(total_pages);

    for idx in 0..total_pages {
        let page_num = idx + 1;
        let rendered = render_page(&pages, idx, dpi, max_pixels);
        match &rendered {
            Ok(img) => debug!(
                "Rendered page {} -> {}x{} px",
                page_num,
                img.width(),
                img.height()
            ),
            Err(f) => warn!("Skipping page {}: {}", page_num, f),
        }
        results.push(RasterPage {
            index: page_num,
            image: rendered,
        });
    }

    Ok(results)
}

/// Render one page, converting any pdfium error into a page failure.
fn render_page(
    pages: &PdfPages<'_>,
    idx: usize,
    dpi: u32,
    max_pixels: u32,
) -> Result<DynamicImage, PageFailure> {
    let page_num = idx + 1;
    let page = pages.get(idx as u16).map_err(|e| PageFailure::Rasterize {
        page: page_num,
        detail: format!("{e:?}"),
    })?;

    // Page size is in points (1/72 inch); the DPI setting picks the pixel
    // width, capped so an oversized page cannot exhaust memory.
    let width_pts = page.width().value.max(1.0);
    let target_width = ((width_pts * dpi as f32 / 72.0).round() as u32)
        .clamp(1, max_pixels) as i32;

    let render_config = PdfRenderConfig::new()
        .set_target_width(target_width)
        .set_maximum_height(max_pixels as i32);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| PageFailure::Rasterize {
            page: page_num,
            detail: format!("{e:?}"),
        })?;

    Ok(bitmap.as_image())
}
