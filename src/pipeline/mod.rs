//! Pipeline stages for document text extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap
//! implementations (e.g. a different rasterisation backend) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ raster ──▶ preprocess ──▶ detect ──▶ recognize ──▶ assemble
//! (sniff)   (pdfium/    (deskew,      (regions)   (text per     (reading
//!            image)      resize)                   region)       order)
//! ```
//!
//! 1. [`input`]      — sniff the media kind of the submitted bytes
//! 2. [`raster`]     — decode pages to raster images; pdfium work runs in
//!    `spawn_blocking` because it is CPU-bound and not async-safe
//! 3. [`preprocess`] — normalise, deskew, denoise, resize for the detector,
//!    recording the transforms for coordinate back-mapping
//! 4. [`detect`]     — thin wrapper over the opaque detection capability
//! 5. [`recognize`]  — crop each region and transcribe it
//! 6. [`assemble`]   — merge spans into reading order and aggregate
//!    confidences per page and per document

pub mod assemble;
pub mod detect;
pub mod input;
pub mod preprocess;
pub mod raster;
pub mod recognize;
