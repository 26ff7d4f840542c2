//! # docr
//!
//! Extract structured, position-annotated text from scanned documents and
//! images.
//!
//! ## Why this crate?
//!
//! Scanned PDFs and photographed pages carry no text layer, so plain PDF
//! text extraction returns nothing. This crate rasterises each page,
//! cleans it up (deskew, denoise), finds the text regions with an OCR
//! backend, transcribes each region at full resolution, and assembles the
//! results in reading order with confidence scores and page-space bounding
//! polygons.
//!
//! The OCR models themselves live behind the [`OcrBackend`] trait: the
//! pipeline owns orchestration, preprocessing, and coordinate bookkeeping,
//! while detection and recognition are pluggable.
//!
//! ## Pipeline Overview
//!
//! ```text
//! bytes (PDF / PNG / JPEG)
//!  │
//!  ├─ 1. Sniff       magic bytes + optional media-type hint
//!  ├─ 2. Rasterise   PDF pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Preprocess  deskew, denoise, resize for the detector
//!  ├─ 4. Detect      text regions, mapped back to page coordinates
//!  ├─ 5. Recognise   per-region transcription from the full-res page
//!  └─ 6. Assemble    reading order, confidences, document status
//! ```
//!
//! Pages run concurrently under a bounded worker pool and a document-wide
//! deadline; a page that fails or times out is reported in place without
//! aborting its siblings.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docr::{extract, ExtractConfig, OcrBackend};
//! use std::sync::Arc;
//!
//! # fn load_backend() -> Arc<dyn OcrBackend> { unimplemented!() }
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend: Arc<dyn OcrBackend> = load_backend();
//!     let bytes = std::fs::read("scan.pdf")?;
//!
//!     let config = ExtractConfig::builder().dpi(200).build()?;
//!     let result = extract(&bytes, Some("pdf"), backend, &config).await?;
//!
//!     println!("status: {:?}, confidence: {:.2}", result.status, result.confidence);
//!     for page in &result.pages {
//!         println!("--- page {} ---\n{}", page.page, page.text());
//!     }
//!     Ok(())
//! }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractConfig, ExtractConfigBuilder};
pub use engine::{BackendError, Detection, OcrBackend, Recognition};
pub use error::{ExtractError, PageFailure};
pub use extract::{extract, extract_sync, extract_url};
pub use geometry::{Point, Polygon, Rect};
pub use output::{DocumentResult, DocumentStatus, PageResult, TextSpan};
pub use progress::{ExtractProgress, NoopProgress};
pub use stream::{extract_stream, PageStream};
